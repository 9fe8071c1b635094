//! Fixed-column Markdown tables for parameters and ports.
//!
//! Cells are padded, never truncated, so an over-long value widens its row
//! instead of being cut. Output is the header, the separator, then the rows
//! joined by newlines with no trailing newline after the last row.

use crate::error::TableError;
use std::fmt::Display;

const PARAM_HEADER: &str = "| Parameter | Default Value | Function |\n";
const PARAM_SEPARATOR: &str = "| :-------: | :-----------: | :------: |\n";
const PORT_HEADER: &str = "|     Port     | Width | Direction | Function |\n";
const PORT_SEPARATOR: &str = "| :----------: | :---: | :-------: | :------: |\n";

/// Left-justifies `text` in a field of `width` characters.
pub fn ljust(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let mut out = String::with_capacity(text.len() + width.saturating_sub(len));
    out.push_str(text);
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
    out
}

/// Centers `text` in a field of `width` characters.
///
/// With `m` padding characters the left side gets `m / 2 + (m & width & 1)`,
/// so an odd extra space goes right for even widths and left for odd widths.
pub fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let pad = width - len;
    let left = pad / 2 + (pad & width & 1);
    let mut out = String::with_capacity(text.len() + pad);
    out.extend(std::iter::repeat(' ').take(left));
    out.push_str(text);
    out.extend(std::iter::repeat(' ').take(pad - left));
    out
}

fn check_lengths(lengths: &[usize]) -> Result<(), TableError> {
    if lengths.windows(2).all(|w| w[0] == w[1]) {
        Ok(())
    } else {
        Err(TableError::LengthMismatch {
            lengths: lengths.to_vec(),
        })
    }
}

fn assemble(header: &str, separator: &str, rows: Vec<String>) -> String {
    let mut table = String::with_capacity(header.len() + separator.len() + rows.len() * 48);
    table.push_str(header);
    table.push_str(separator);
    table.push_str(&rows.join("\n"));
    table
}

/// Renders the parameter table. `functions` defaults to empty descriptions.
///
/// Fails without output if the columns differ in length.
pub fn render_parameter_table<N, D>(
    names: &[N],
    defaults: &[D],
    functions: Option<&[String]>,
) -> Result<String, TableError>
where
    N: AsRef<str>,
    D: Display,
{
    let functions = functions.map_or_else(|| vec![String::new(); names.len()], <[_]>::to_vec);
    check_lengths(&[names.len(), defaults.len(), functions.len()])?;

    let rows = names
        .iter()
        .zip(defaults)
        .zip(&functions)
        .map(|((name, default), function)| {
            format!(
                "| {} | {} | {} |",
                ljust(name.as_ref(), 9),
                center(&default.to_string(), 13),
                ljust(function, 8)
            )
        })
        .collect();
    Ok(assemble(PARAM_HEADER, PARAM_SEPARATOR, rows))
}

/// Renders the port table. `functions` defaults to empty descriptions.
///
/// Fails without output if the columns differ in length.
pub fn render_port_table<N, W, D>(
    names: &[N],
    widths: &[W],
    directions: &[D],
    functions: Option<&[String]>,
) -> Result<String, TableError>
where
    N: AsRef<str>,
    W: Display,
    D: AsRef<str>,
{
    let functions = functions.map_or_else(|| vec![String::new(); names.len()], <[_]>::to_vec);
    check_lengths(&[names.len(), widths.len(), directions.len(), functions.len()])?;

    let rows = names
        .iter()
        .zip(widths)
        .zip(directions)
        .zip(&functions)
        .map(|(((name, width), direction), function)| {
            format!(
                "| {} | {} | {} | {} |",
                center(name.as_ref(), 11),
                center(&width.to_string(), 5),
                center(direction.as_ref(), 9),
                center(function, 8)
            )
        })
        .collect();
    Ok(assemble(PORT_HEADER, PORT_SEPARATOR, rows))
}
