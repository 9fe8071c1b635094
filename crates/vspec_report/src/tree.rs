//! ASCII rendering of an [`InstanceMap`] as an instantiation tree.
//!
//! ```text
//! top (top)
//! ├── u1: A
//! ├── u2: B
//! └── u3: A (reused)
//! ```

use crate::instance_map::InstanceMap;
use std::collections::HashMap;
use std::io;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Encounter count per module type, local to one render.
#[derive(Debug, Default)]
pub struct ReuseCounter {
    seen: HashMap<String, usize>,
}

impl ReuseCounter {
    /// Creates an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more encounter of `module_type` and returns how many
    /// encounters preceded it.
    pub fn record(&mut self, module_type: &str) -> usize {
        let count = self.seen.entry(module_type.to_string()).or_insert(0);
        let before = *count;
        *count += 1;
        before
    }

    /// Encounters of `module_type` so far.
    pub fn count(&self, module_type: &str) -> usize {
        self.seen.get(module_type).copied().unwrap_or(0)
    }
}

/// Renders the tree rooted at `top`. Every line ends with a newline.
///
/// Reused module types are expanded again under each instance; a type that
/// is already an ancestor of the current line is printed but not descended
/// into.
pub fn render_tree(map: &InstanceMap, top: &str) -> String {
    let mut out = format!("{top} (top)\n");
    let mut counter = ReuseCounter::new();
    let mut ancestors = vec![top];
    render_children(map, top, "", &mut ancestors, &mut counter, &mut out);
    out
}

/// Writes [`render_tree`] output to `out`.
pub fn write_tree(out: &mut impl io::Write, map: &InstanceMap, top: &str) -> io::Result<()> {
    out.write_all(render_tree(map, top).as_bytes())
}

fn render_children<'m>(
    map: &'m InstanceMap,
    parent: &str,
    prefix: &str,
    ancestors: &mut Vec<&'m str>,
    counter: &mut ReuseCounter,
    out: &mut String,
) {
    let Some(children) = map.children(parent) else {
        return;
    };
    let last = children.len().saturating_sub(1);
    for (i, (instance, module_type)) in children.iter().enumerate() {
        let is_last = i == last;
        out.push_str(prefix);
        out.push_str(if is_last { LAST_BRANCH } else { BRANCH });
        out.push_str(instance);
        out.push_str(": ");
        out.push_str(module_type);
        if counter.record(module_type) > 0 {
            out.push_str(" (reused)");
        }
        out.push('\n');

        if ancestors.contains(&module_type.as_str()) {
            continue;
        }
        let child_prefix = format!("{prefix}{}", if is_last { SPACE } else { PIPE });
        ancestors.push(module_type);
        render_children(map, module_type, &child_prefix, ancestors, counter, out);
        ancestors.pop();
    }
}
