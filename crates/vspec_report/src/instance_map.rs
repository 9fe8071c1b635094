//! Parent module type to child instances.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vspec_common::{Ident, Interner};
use vspec_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use vspec_verilog::ast::{ModuleDecl, ModuleItem};

/// Ordered mapping from module type to its instances (instance name to
/// instantiated module type). Instance names are unique within a parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceMap {
    entries: IndexMap<String, IndexMap<String, String>>,
}

impl InstanceMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Children of `module`, if it has an entry.
    pub fn children(&self, module: &str) -> Option<&IndexMap<String, String>> {
        self.entries.get(module)
    }

    /// Returns `true` if `module` has an entry (possibly with no children).
    pub fn contains(&self, module: &str) -> bool {
        self.entries.contains_key(module)
    }

    /// Number of parent entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no parent has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parents and their children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, String>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Records `instance: module_type` under `parent`. Returns `false`, leaving
    /// the first record in place, if `parent` already has that instance.
    pub fn insert(&mut self, parent: &str, instance: &str, module_type: &str) -> bool {
        let children = self.entries.entry(parent.to_string()).or_default();
        if children.contains_key(instance) {
            return false;
        }
        children.insert(instance.to_string(), module_type.to_string());
        true
    }

    fn add_parent(&mut self, parent: &str) {
        self.entries.entry(parent.to_string()).or_default();
    }
}

/// Records every instance declared directly in `module` under the module's
/// name. A module without instantiations still gets an (empty) entry.
///
/// A repeated instance name keeps the first record and is reported as a
/// warning.
pub fn build_instance_map(
    module: &ModuleDecl,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> InstanceMap {
    let mut map = InstanceMap::new();
    add_module(&mut map, module, interner, sink);
    map
}

/// Builds a multi-level map starting at `top`: every instantiated module type
/// that has a definition in `modules` gets its own entry, expanded once.
/// Types without a definition are leaves.
///
/// When a module is defined more than once, the first definition wins.
pub fn build_design_map<'a>(
    modules: impl IntoIterator<Item = &'a ModuleDecl>,
    top: &ModuleDecl,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> InstanceMap {
    let mut defs: HashMap<Ident, &ModuleDecl> = HashMap::new();
    for module in modules {
        defs.entry(module.name).or_insert(module);
    }

    let mut map = InstanceMap::new();
    let mut pending = vec![top];
    while let Some(module) = pending.pop() {
        if map.contains(interner.resolve(module.name)) {
            continue;
        }
        add_module(&mut map, module, interner, sink);
        // Reverse so definitions are expanded in instantiation order.
        for inst in instantiations(module).rev() {
            if let Some(def) = defs.get(inst) {
                if !map.contains(interner.resolve(*inst)) {
                    pending.push(*def);
                }
            }
        }
    }
    map
}

fn instantiations(module: &ModuleDecl) -> impl DoubleEndedIterator<Item = &Ident> {
    module.items.iter().filter_map(|item| match item {
        ModuleItem::Instantiation(inst) => Some(&inst.module_name),
        _ => None,
    })
}

fn add_module(
    map: &mut InstanceMap,
    module: &ModuleDecl,
    interner: &Interner,
    sink: &DiagnosticSink,
) {
    let parent = interner.resolve(module.name);
    map.add_parent(parent);
    for item in &module.items {
        let ModuleItem::Instantiation(inst) = item else {
            continue;
        };
        let module_type = interner.resolve(inst.module_name);
        for instance in &inst.instances {
            let name = interner.resolve(instance.name);
            if !map.insert(parent, name, module_type) {
                sink.emit(
                    Diagnostic::warning(
                        DiagnosticCode::DUPLICATE_INSTANCE,
                        format!("instance `{name}` is declared more than once in module `{parent}`"),
                        instance.span,
                    )
                    .with_note("only the first declaration is reported"),
                );
            }
        }
    }
}
