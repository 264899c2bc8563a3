//! Program loading.
//!
//! The parser / type checker is an external collaborator. Its contract is
//! the `Loader` trait: given entry package paths, produce a `Program` — the
//! indexed collection of every reachable declaration. `JsonLoader` is the
//! concrete loader shipped with the repository; it reads the frontend's
//! JSON exchange format.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use jot_common::LoadError;

use crate::def::{Def, DefId};

/// A parsed, type-checked, indexed program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// Every definition, keyed by ID. Insertion order is the loader's
    /// declaration order and is preserved.
    #[serde(default)]
    pub defs: IndexMap<DefId, Def>,
    /// Entry package paths, in the order the caller requested them.
    #[serde(default)]
    pub entries: Vec<String>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, keyed by its own ID.
    pub fn insert(&mut self, def: Def) {
        self.defs.insert(def.id().clone(), def);
    }

    pub fn get(&self, id: &DefId) -> Option<&Def> {
        self.defs.get(id)
    }
}

/// `Load(paths…) → Program`.
pub trait Loader {
    fn load(&self, paths: &[String]) -> Result<Program, LoadError>;
}

/// Reads a pre-indexed program from the frontend's JSON exchange file and
/// selects the requested entry packages.
#[derive(Debug, Clone)]
pub struct JsonLoader {
    path: PathBuf,
}

impl JsonLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Loader for JsonLoader {
    fn load(&self, paths: &[String]) -> Result<Program, LoadError> {
        let display = self.path.display().to_string();
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| LoadError::new(&display, e.to_string()))?;
        let mut program: Program = serde_json::from_str(&text)
            .map_err(|e| LoadError::new(&display, format!("malformed program: {e}")))?;

        for (id, def) in &program.defs {
            if id != def.id() {
                return Err(LoadError::new(
                    &display,
                    format!("definition keyed {:?} carries id {:?}", id.0, def.id().0),
                ));
            }
        }

        // Entry selection: explicit paths win over the file's own entry
        // list. Each requested path must name a package in the program.
        if !paths.is_empty() {
            for path in paths {
                let known = program.defs.values().any(|d| d.path() == path);
                if !known {
                    return Err(LoadError::new(
                        &display,
                        format!("entry package {path:?} not present in program"),
                    ));
                }
            }
            program.entries = paths.to_vec();
        } else if program.entries.is_empty() {
            return Err(LoadError::new(&display, "no entry packages requested"));
        }

        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::{DefMeta, FuncDef, FuncSig};

    fn program_json() -> String {
        let mut program = Program::new();
        program.insert(Def::Func(FuncDef {
            meta: DefMeta::new("app.main", "main", "app"),
            sig: FuncSig::default(),
            body: Some(vec![]),
        }));
        program.entries = vec!["app".into()];
        serde_json::to_string(&program).unwrap()
    }

    #[test]
    fn json_loader_round_trips_a_program() {
        let dir = std::env::temp_dir().join("jot-ir-loader-test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("program.json");
        std::fs::write(&file, program_json()).unwrap();

        let loader = JsonLoader::new(&file);
        let program = loader.load(&[]).unwrap();
        assert_eq!(program.entries, vec!["app".to_string()]);
        assert!(program.get(&DefId::new("app.main")).is_some());
    }

    #[test]
    fn json_loader_rejects_unknown_entry() {
        let dir = std::env::temp_dir().join("jot-ir-loader-test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("program2.json");
        std::fs::write(&file, program_json()).unwrap();

        let loader = JsonLoader::new(&file);
        let err = loader.load(&["nope".into()]).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
