//! Constant evaluation of parameter defaults and port ranges.
//!
//! Covers what port widths are written with in practice: integer literals
//! (sized and based included), parameter references, arithmetic, shifts,
//! comparisons feeding a ternary, and `$clog2`. Anything else evaluates to
//! `None` and the caller falls back to the source text.

use std::collections::HashMap;
use vspec_common::{Ident, Interner};
use vspec_source::SourceDb;
use vspec_verilog::ast::{BinaryOp, Expr, ModuleDecl, ModuleItem, ParameterDecl, Range, UnaryOp};

/// Parameter values visible in one module.
pub type ConstEnv = HashMap<Ident, i64>;

/// Parses an integer literal: `42`, `1_000`, `8'hFF`, `4'sb1010`, `'d7`.
/// `x`, `z` and `?` digits read as zero.
pub fn parse_literal(text: &str) -> Option<i64> {
    let text: String = text
        .chars()
        .filter(|c| *c != '_' && !c.is_whitespace())
        .collect();

    let Some(tick) = text.find('\'') else {
        return text.parse().ok();
    };
    let after_tick = &text[tick + 1..];
    let after_sign = after_tick
        .strip_prefix(['s', 'S'])
        .unwrap_or(after_tick);
    let mut chars = after_sign.chars();
    let radix = match chars.next()? {
        'b' | 'B' => 2,
        'o' | 'O' => 8,
        'd' | 'D' => 10,
        'h' | 'H' => 16,
        _ => return None,
    };
    let digits: String = chars
        .map(|c| match c {
            'x' | 'X' | 'z' | 'Z' | '?' => '0',
            other => other,
        })
        .collect();
    i64::from_str_radix(&digits, radix).ok()
}

/// Ceiling log2, with `clog2(0) == clog2(1) == 0`.
fn clog2(n: i64) -> i64 {
    if n <= 1 {
        return 0;
    }
    64 - i64::from((n - 1).leading_zeros())
}

fn apply_binary(op: BinaryOp, l: i64, r: i64) -> Option<i64> {
    let shift = || u32::try_from(r).ok().filter(|s| *s < 64);
    let value = match op {
        BinaryOp::Add => l.checked_add(r)?,
        BinaryOp::Sub => l.checked_sub(r)?,
        BinaryOp::Mul => l.checked_mul(r)?,
        BinaryOp::Div => l.checked_div(r)?,
        BinaryOp::Mod => l.checked_rem(r)?,
        BinaryOp::Pow if r < 0 => 0,
        BinaryOp::Pow => l.checked_pow(u32::try_from(r).ok()?)?,
        BinaryOp::Shl | BinaryOp::AShl => l.checked_shl(shift()?)?,
        BinaryOp::Shr => ((l as u64) >> shift()?) as i64,
        BinaryOp::AShr => l >> shift()?,
        BinaryOp::Eq | BinaryOp::CaseEq => i64::from(l == r),
        BinaryOp::Neq | BinaryOp::CaseNeq => i64::from(l != r),
        BinaryOp::Lt => i64::from(l < r),
        BinaryOp::Le => i64::from(l <= r),
        BinaryOp::Gt => i64::from(l > r),
        BinaryOp::Ge => i64::from(l >= r),
        BinaryOp::LogAnd => i64::from(l != 0 && r != 0),
        BinaryOp::LogOr => i64::from(l != 0 || r != 0),
        BinaryOp::BitAnd => l & r,
        BinaryOp::BitOr => l | r,
        BinaryOp::BitXor => l ^ r,
        BinaryOp::BitXnor => !(l ^ r),
    };
    Some(value)
}

/// Evaluates `expr` against `env`. Returns `None` for anything that is not a
/// compile-time integer.
pub fn eval_expr(
    expr: &Expr,
    source_db: &SourceDb,
    interner: &Interner,
    env: &ConstEnv,
) -> Option<i64> {
    let eval = |e: &Expr| eval_expr(e, source_db, interner, env);
    match expr {
        Expr::Literal { span } => parse_literal(source_db.snippet(*span)),
        Expr::Identifier { name, .. } => env.get(name).copied(),
        Expr::Paren { inner, .. } => eval(inner),
        Expr::Unary { op, operand, .. } => {
            let v = eval(operand)?;
            match op {
                UnaryOp::Plus => Some(v),
                UnaryOp::Minus => v.checked_neg(),
                UnaryOp::LogNot => Some(i64::from(v == 0)),
                UnaryOp::BitNot => Some(!v),
                _ => None,
            }
        }
        Expr::Binary { left, op, right, .. } => apply_binary(*op, eval(left)?, eval(right)?),
        Expr::Ternary {
            condition,
            then_expr,
            else_expr,
            ..
        } => {
            if eval(condition)? != 0 {
                eval(then_expr)
            } else {
                eval(else_expr)
            }
        }
        Expr::SystemCall { name, args, .. } if interner.resolve(*name) == "$clog2" => {
            match args.as_slice() {
                [arg] => Some(clog2(eval(arg)?)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Evaluates both bounds of `[msb:lsb]`.
pub fn eval_range(
    range: &Range,
    source_db: &SourceDb,
    interner: &Interner,
    env: &ConstEnv,
) -> Option<(i64, i64)> {
    let msb = eval_expr(&range.msb, source_db, interner, env)?;
    let lsb = eval_expr(&range.lsb, source_db, interner, env)?;
    Some((msb, lsb))
}

/// Collects the defaults of every `parameter` and `localparam` of `module`
/// in declaration order, each evaluated against those before it. Defaults
/// that do not evaluate are left out.
pub fn module_env(module: &ModuleDecl, source_db: &SourceDb, interner: &Interner) -> ConstEnv {
    let mut env = ConstEnv::new();
    let body = module.items.iter().filter_map(|item| match item {
        ModuleItem::ParameterDecl(decl) | ModuleItem::LocalparamDecl(decl) => Some(decl),
        _ => None,
    });
    for decl in module.params.iter().chain(body) {
        bind(decl, source_db, interner, &mut env);
    }
    env
}

fn bind(decl: &ParameterDecl, source_db: &SourceDb, interner: &Interner, env: &mut ConstEnv) {
    for assignment in &decl.assignments {
        let value = assignment
            .value
            .as_ref()
            .and_then(|v| eval_expr(v, source_db, interner, env));
        match value {
            Some(v) => {
                env.insert(assignment.name, v);
            }
            None => {
                env.remove(&assignment.name);
            }
        }
    }
}
