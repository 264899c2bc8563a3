//! The definition index.
//!
//! A process-scoped immutable view over a `Program`: lookup by stable ID
//! plus the derived entry points (`mains`). Built once after loading;
//! construction validates the loader's invariants.

use jot_common::IndexError;

use crate::def::{Def, DefId, DefKind};
use crate::program::Program;

#[derive(Debug)]
pub struct Index<'a> {
    program: &'a Program,
    mains: Vec<&'a Def>,
}

impl<'a> Index<'a> {
    /// Build the index and validate program invariants: IDs are unique and
    /// self-consistent, import aliases resolve to package definitions,
    /// method receivers are type definitions, and every requested entry
    /// package declares a `main` function.
    pub fn new(program: &'a Program) -> Result<Self, IndexError> {
        for (key, def) in &program.defs {
            if key != def.id() {
                return Err(IndexError::DuplicateId {
                    id: def.id().to_string(),
                });
            }

            for (alias, path) in def.imports() {
                let target = program
                    .defs
                    .values()
                    .any(|d| d.kind() == DefKind::Package && d.path() == path);
                if !target {
                    return Err(IndexError::Invariant {
                        id: def.id().to_string(),
                        message: format!(
                            "import alias {alias:?} targets {path:?}, which is not a package in \
                             the program"
                        ),
                    });
                }
            }

            if let Some(recv) = def.recv() {
                match program.get(recv) {
                    Some(r) if r.kind() == DefKind::Type => {}
                    Some(r) => {
                        return Err(IndexError::Invariant {
                            id: def.id().to_string(),
                            message: format!("receiver {} is a {:?}, not a type", r.id(), r.kind()),
                        });
                    }
                    None => {
                        return Err(IndexError::Invariant {
                            id: def.id().to_string(),
                            message: format!("receiver {recv} is not in the program"),
                        });
                    }
                }
            }
        }

        let mut mains = Vec::with_capacity(program.entries.len());
        for entry in &program.entries {
            let main = program.defs.values().find(|d| {
                d.kind() == DefKind::Func && d.path() == entry.as_str() && d.name() == "main"
            });
            match main {
                Some(def) => mains.push(def),
                None => {
                    return Err(IndexError::MissingMain {
                        path: entry.clone(),
                    });
                }
            }
        }

        Ok(Self { program, mains })
    }

    /// Entry-point functions, in the order the caller supplied entry paths.
    pub fn mains(&self) -> &[&'a Def] {
        &self.mains
    }

    pub fn lookup(&self, id: &DefId) -> Option<&'a Def> {
        self.program.get(id)
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::{DefMeta, FuncDef, FuncSig, MethodDef, PackageDef, ValueDef};

    fn func(id: &str, name: &str, path: &str) -> Def {
        Def::Func(FuncDef {
            meta: DefMeta::new(id, name, path),
            sig: FuncSig::default(),
            body: Some(vec![]),
        })
    }

    #[test]
    fn mains_follow_entry_order() {
        let mut program = Program::new();
        program.insert(func("b.main", "main", "b"));
        program.insert(func("a.main", "main", "a"));
        program.entries = vec!["a".into(), "b".into()];

        let index = Index::new(&program).unwrap();
        let mains: Vec<_> = index.mains().iter().map(|d| d.id().as_str()).collect();
        assert_eq!(mains, vec!["a.main", "b.main"]);
    }

    #[test]
    fn missing_main_is_an_error() {
        let mut program = Program::new();
        program.insert(func("a.helper", "helper", "a"));
        program.entries = vec!["a".into()];

        let err = Index::new(&program).unwrap_err();
        assert_eq!(err, IndexError::MissingMain { path: "a".into() });
    }

    #[test]
    fn import_alias_must_target_a_package() {
        let mut program = Program::new();
        let mut meta = DefMeta::new("a.main", "main", "a");
        meta.imports.insert("b".into(), "b".into());
        program.insert(Def::Func(FuncDef {
            meta,
            sig: FuncSig::default(),
            body: Some(vec![]),
        }));
        program.entries = vec!["a".into()];

        let err = Index::new(&program).unwrap_err();
        assert!(matches!(err, IndexError::Invariant { .. }));

        // Adding the package definition fixes it.
        program.insert(Def::Package(PackageDef {
            meta: DefMeta::new("b", "b", "b"),
        }));
        assert!(Index::new(&program).is_ok());
    }

    #[test]
    fn method_receiver_must_be_a_type() {
        let mut program = Program::new();
        program.insert(func("a.main", "main", "a"));
        program.insert(Def::Value(ValueDef {
            meta: DefMeta::new("a.V", "V", "a"),
            ty: None,
            value: None,
            konst: false,
        }));
        program.insert(Def::Method(MethodDef {
            meta: DefMeta::new("a.V.M", "M", "a"),
            recv: DefId::new("a.V"),
            recv_name: "v".into(),
            sig: FuncSig::default(),
            body: Some(vec![]),
        }));
        program.entries = vec!["a".into()];

        let err = Index::new(&program).unwrap_err();
        assert!(matches!(err, IndexError::Invariant { .. }));
    }
}
