//! Name mangling.
//!
//! Exported names are emitted unchanged so module exports stay addressable
//! by consumers. Unexported names get a package-local suffix so nothing
//! collides after bundling. Method names are qualified by their receiver
//! type. The same functions serve both definition and reference sites.

use jot_ir::{Def, DefId, Index};

/// A short, deterministic package discriminator: the last path segment,
/// sanitized to identifier characters.
pub fn package_disc(path: &str) -> String {
    let base = path.rsplit('/').next().unwrap_or(path);
    let mut out = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// The emitted name of a definition, before receiver qualification:
/// the `js:"<name>"` override when present, the plain name for exported
/// definitions and for `main`, and a `$`-suffixed form otherwise.
fn base_name(def: &Def) -> String {
    if let Some(js_name) = &def.meta().js_name {
        return js_name.clone();
    }
    if def.exported() || def.name() == "main" {
        return def.name().to_string();
    }
    format!("{}${}", def.name(), package_disc(def.path()))
}

/// The emitted (mangled) name of a definition.
///
/// Methods are looked up through the index to qualify by their receiver's
/// emitted name; `index.lookup` is infallible for valid programs because
/// the receiver invariant is checked at index construction.
pub fn mangled_name(index: &Index<'_>, def: &Def) -> String {
    match def.recv() {
        Some(recv) => {
            let recv_name = match index.lookup(recv) {
                Some(recv_def) => base_name(recv_def),
                None => recv.as_str().replace(['.', '/'], "_"),
            };
            format!("{}${}", recv_name, base_name(def))
        }
        None => base_name(def),
    }
}

/// The runtime type tag of a named type: its definition ID.
pub fn type_tag(id: &DefId) -> String {
    id.as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jot_ir::{
        Def, DefFlags, DefMeta, FuncDef, FuncSig, MethodDef, Program, SrcType, TypeDef,
    };

    fn exported(mut meta: DefMeta) -> DefMeta {
        meta.flags |= DefFlags::EXPORTED;
        meta
    }

    fn fixture() -> Program {
        let mut program = Program::new();
        program.insert(Def::Func(FuncDef {
            meta: DefMeta::new("app.main", "main", "app"),
            sig: FuncSig::default(),
            body: Some(vec![]),
        }));
        program.insert(Def::Func(FuncDef {
            meta: exported(DefMeta::new("util.Hello", "Hello", "util")),
            sig: FuncSig::default(),
            body: Some(vec![]),
        }));
        program.insert(Def::Func(FuncDef {
            meta: DefMeta::new("util.helper", "helper", "util"),
            sig: FuncSig::default(),
            body: Some(vec![]),
        }));
        program.insert(Def::Type(TypeDef {
            meta: exported(DefMeta::new("dom.Element", "Element", "dom")),
            ty: SrcType::Struct { fields: vec![] },
            has_methods: true,
        }));
        program.insert(Def::Method(MethodDef {
            meta: exported(DefMeta::new("dom.Element.NodeName", "NodeName", "dom")),
            recv: "dom.Element".into(),
            recv_name: "e".into(),
            sig: FuncSig::default(),
            body: Some(vec![]),
        }));
        program.entries = vec!["app".into()];
        program
    }

    #[test]
    fn exported_names_pass_through() {
        let program = fixture();
        let index = Index::new(&program).unwrap();
        let hello = index.lookup(&"util.Hello".into()).unwrap();
        assert_eq!(mangled_name(&index, hello), "Hello");
    }

    #[test]
    fn unexported_names_get_package_suffix() {
        let program = fixture();
        let index = Index::new(&program).unwrap();
        let helper = index.lookup(&"util.helper".into()).unwrap();
        assert_eq!(mangled_name(&index, helper), "helper$util");
    }

    #[test]
    fn main_is_never_suffixed() {
        let program = fixture();
        let index = Index::new(&program).unwrap();
        let main = index.lookup(&"app.main".into()).unwrap();
        assert_eq!(mangled_name(&index, main), "main");
    }

    #[test]
    fn methods_are_qualified_by_receiver() {
        let program = fixture();
        let index = Index::new(&program).unwrap();
        let method = index.lookup(&"dom.Element.NodeName".into()).unwrap();
        assert_eq!(mangled_name(&index, method), "Element$NodeName");
    }

    #[test]
    fn disc_sanitizes_path_segments() {
        assert_eq!(package_disc("github.com/acme/my-util"), "my_util");
        assert_eq!(package_disc("app"), "app");
    }
}
