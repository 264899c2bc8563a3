//! The module grouper.
//!
//! Buckets a pruned, sorted definition list into per-package modules,
//! preserving first-appearance order (which is a valid topological order
//! at package granularity, because the input is). Exports collect the
//! emitted names of exported, non-suppressed package-level declarations;
//! imports merge across all of a module's definitions and are gated to
//! packages present in the grouping.

use indexmap::IndexMap;

use jot_ir::{Def, DefKind};

/// A per-package emission bucket.
pub struct Module<'a> {
    pub path: String,
    /// Definitions in emission order.
    pub defs: Vec<&'a Def>,
    /// Exported names, in declaration order.
    pub exports: Vec<String>,
    /// Local alias -> imported package path.
    pub imports: IndexMap<String, String>,
}

impl<'a> Module<'a> {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            defs: Vec::new(),
            exports: Vec::new(),
            imports: IndexMap::new(),
        }
    }

    /// Whether the module is a raw foreign-code file: exactly one
    /// definition, of kind FILE.
    pub fn is_raw_file(&self) -> bool {
        self.defs.len() == 1 && self.defs[0].kind() == DefKind::File
    }
}

/// Whether a definition contributes a name to its module's export object.
/// Methods live in the method table, packages and raw files bind no names,
/// and suppressed definitions emit nothing to export. The entry package
/// additionally exports `main` so the bundle can invoke it.
fn exports_name(def: &Def, entry_path: &str) -> bool {
    match def.kind() {
        DefKind::Func | DefKind::Type | DefKind::Value => {
            if jot_translator::suppressed(def) {
                return false;
            }
            def.exported()
                || (def.kind() == DefKind::Func
                    && def.name() == "main"
                    && def.path() == entry_path)
        }
        _ => false,
    }
}

/// The emitted export name: the `js:` override when present, the source
/// name otherwise. Matches the mangler's choice for exported definitions.
fn export_name(def: &Def) -> String {
    def.meta()
        .js_name
        .clone()
        .unwrap_or_else(|| def.name().to_string())
}

/// Group the sorted definitions of one entry into modules.
pub fn group<'a>(defs: &[&'a Def], entry_path: &str) -> Vec<Module<'a>> {
    let mut modules: IndexMap<String, Module<'a>> = IndexMap::new();

    for &def in defs {
        let module = modules
            .entry(def.path().to_string())
            .or_insert_with(|| Module::new(def.path()));
        module.defs.push(def);

        if exports_name(def, entry_path) {
            module.exports.push(export_name(def));
        }

        // Merge this definition's imports; the first binding of an alias
        // wins.
        for (alias, path) in def.imports() {
            if path != def.path() && !module.imports.contains_key(alias) {
                module.imports.insert(alias.clone(), path.clone());
            }
        }
    }

    // Gate imports to packages that made it into this grouping, so no
    // dangling binding survives.
    let present: Vec<String> = modules.keys().cloned().collect();
    for module in modules.values_mut() {
        module
            .imports
            .retain(|_, path| present.iter().any(|p| p == path));
    }

    modules.into_values().collect()
}
