//! End-to-end emission scenarios over hand-built programs.

use jot_compiler::Compiler;
use jot_ir::{
    Callee, Def, DefFlags, DefId, DefMeta, Expr, FieldInit, FileDef, FuncDef, FuncSig, MethodDef,
    PackageDef, Program, SrcType, Stmt, TypeDef, ValueDef,
};

fn exported(mut meta: DefMeta) -> DefMeta {
    meta.flags |= DefFlags::EXPORTED;
    meta
}

fn func(meta: DefMeta, body: Vec<Stmt>) -> Def {
    Def::Func(FuncDef {
        meta,
        sig: FuncSig::default(),
        body: Some(body),
    })
}

fn package(path: &str) -> Def {
    Def::Package(PackageDef {
        meta: DefMeta::new(path, path, path),
    })
}

fn compile(program: &Program) -> String {
    let scripts = Compiler::new().compile_program(program).unwrap();
    assert_eq!(scripts.len(), 1);
    scripts.into_iter().next().unwrap().source
}

#[test]
fn minimal_entry() {
    let mut program = Program::new();
    program.insert(func(DefMeta::new("app.main", "main", "app"), vec![]));
    program.entries = vec!["app".into()];

    let source = compile(&program);
    assert!(source.starts_with("(function () {"));
    assert!(source.contains("var pkg = {};"));
    assert!(source.contains("pkg[\"app\"] = (function () {"));
    assert!(source.contains("var main = function () {"));
    assert!(source.contains("return { main: main };"));
    assert!(source.contains("return pkg[\"app\"].main();"));
}

#[test]
fn compilation_is_deterministic() {
    let mut program = Program::new();
    program.insert(package("util"));
    program.insert(func(
        exported(DefMeta::new("util.A", "A", "util")),
        vec![Stmt::ret(vec![Expr::int(1)])],
    ));
    program.insert(func(
        exported(DefMeta::new("util.B", "B", "util")),
        vec![Stmt::ret(vec![Expr::int(2)])],
    ));
    let mut main = DefMeta::new("app.main", "main", "app");
    main.imports.insert("util".into(), "util".into());
    main.deps = vec![DefId::new("util.B"), DefId::new("util.A")];
    program.insert(func(
        main,
        vec![
            Stmt::expr(Expr::call_def("util.A", vec![])),
            Stmt::expr(Expr::call_def("util.B", vec![])),
        ],
    ));
    program.entries = vec!["app".into()];

    let first = compile(&program);
    let second = compile(&program);
    assert_eq!(first, second, "byte-identical output for identical input");
}

#[test]
fn single_import_orders_dependency_first() {
    let mut program = Program::new();
    program.insert(package("b"));
    program.insert(func(
        exported(DefMeta::new("b.Hello", "Hello", "b")),
        vec![Stmt::ret(vec![Expr::str("hi")])],
    ));
    let mut main = DefMeta::new("a.main", "main", "a");
    main.imports.insert("b".into(), "b".into());
    main.deps.push(DefId::new("b.Hello"));
    program.insert(func(
        main,
        vec![Stmt::expr(Expr::call_def("b.Hello", vec![]))],
    ));
    program.entries = vec!["a".into()];

    let source = compile(&program);
    let b_pos = source.find("pkg[\"b\"] = (function () {").unwrap();
    let a_pos = source.find("pkg[\"a\"] = (function () {").unwrap();
    assert!(b_pos < a_pos, "dependency module is defined first");
    assert!(source.contains("var b = pkg[\"b\"];"));
    assert!(source.contains("b.Hello()"));
    assert!(source.contains("return { Hello: Hello };"));
}

#[test]
fn unused_import_is_not_emitted() {
    let mut program = Program::new();
    program.insert(package("b"));
    program.insert(func(
        exported(DefMeta::new("b.Hello", "Hello", "b")),
        vec![],
    ));
    // a imports b but references nothing from it.
    let mut main = DefMeta::new("a.main", "main", "a");
    main.imports.insert("b".into(), "b".into());
    program.insert(func(main, vec![]));
    program.entries = vec!["a".into()];

    let source = compile(&program);
    assert!(!source.contains("pkg[\"b\"]"));
    assert!(!source.contains("var b = "));
}

#[test]
fn unreachable_method_is_absent() {
    let mut program = Program::new();
    program.insert(package("geo"));
    program.insert(Def::Type(TypeDef {
        meta: exported(DefMeta::new("geo.Point", "Point", "geo")),
        ty: SrcType::Struct {
            fields: vec![jot_ir::Field {
                name: "x".into(),
                ty: SrcType::int(32, true),
            }],
        },
        has_methods: true,
    }));
    program.insert(Def::Method(MethodDef {
        meta: exported(DefMeta::new("geo.Point.Norm", "Norm", "geo")),
        recv: DefId::new("geo.Point"),
        recv_name: "p".into(),
        sig: FuncSig::default(),
        body: Some(vec![Stmt::ret(vec![Expr::Selector {
            expr: Box::new(Expr::ident("p")),
            field: "x".into(),
            deref: false,
        }])]),
    }));
    program.insert(Def::Method(MethodDef {
        meta: exported(DefMeta::new("geo.Point.Other", "Other", "geo")),
        recv: DefId::new("geo.Point"),
        recv_name: "p".into(),
        sig: FuncSig::default(),
        body: Some(vec![]),
    }));

    let mut main = DefMeta::new("app.main", "main", "app");
    main.imports.insert("geo".into(), "geo".into());
    main.deps = vec![DefId::new("geo.Point"), DefId::new("geo.Point.Norm")];
    program.insert(func(
        main,
        vec![
            Stmt::Decl {
                names: vec!["p".into()],
                ty: None,
                values: vec![Expr::StructLit {
                    ty: Some(DefId::new("geo.Point")),
                    fields: vec![FieldInit {
                        name: "x".into(),
                        value: Expr::int(3),
                    }],
                }],
            },
            Stmt::expr(Expr::Call {
                callee: Callee::Method {
                    recv: Box::new(Expr::ident("p")),
                    id: DefId::new("geo.Point.Norm"),
                    dynamic: false,
                },
                args: vec![],
                spread: false,
            }),
        ],
    ));
    program.entries = vec!["app".into()];

    let source = compile(&program);
    assert!(source.contains("var Point = function (x) {"));
    assert!(source.contains("var Point$Norm = function (p) {"));
    assert!(source.contains("$mtab[\"geo.Point\"].Norm = Point$Norm;"));
    assert!(source.contains("new geo.Point(3)"));
    assert!(source.contains("$mtab[\"geo.Point\"].Norm(p)"));
    assert!(!source.contains("Other"), "unreachable method is absent");
}

#[test]
fn reachable_method_with_unreachable_receiver_is_pruned() {
    let mut program = Program::new();
    program.insert(package("geo"));
    program.insert(Def::Type(TypeDef {
        meta: exported(DefMeta::new("geo.Point", "Point", "geo")),
        ty: SrcType::Struct { fields: vec![] },
        has_methods: true,
    }));
    program.insert(Def::Method(MethodDef {
        meta: exported(DefMeta::new("geo.Point.Norm", "Norm", "geo")),
        recv: DefId::new("geo.Point"),
        recv_name: "p".into(),
        sig: FuncSig::default(),
        body: Some(vec![]),
    }));

    // The method is pulled in (a conservative interface-call dependency)
    // but its receiver type never is.
    let mut main = DefMeta::new("app.main", "main", "app");
    main.deps = vec![DefId::new("geo.Point.Norm")];
    program.insert(func(main, vec![]));
    program.entries = vec!["app".into()];

    let source = compile(&program);
    assert!(!source.contains("Norm"), "method without receiver is pruned");
    assert!(!source.contains("pkg[\"geo\"]"));
}

#[test]
fn raw_file_module_is_verbatim() {
    let mut program = Program::new();
    program.insert(Def::File(FileDef {
        meta: DefMeta::new("bind.runtime", "runtime", "bind"),
        source: "window.X=1;".into(),
    }));
    let mut main = DefMeta::new("app.main", "main", "app");
    main.deps.push(DefId::new("bind.runtime"));
    program.insert(func(main, vec![]));
    program.entries = vec!["app".into()];

    let source = compile(&program);
    assert!(source.contains("pkg[\"bind\"] = (function () {"));
    assert!(source.contains("window.X=1;"));
    assert!(
        !source.contains("var bind = pkg[\"bind\"];"),
        "raw-file modules get no import bindings"
    );
    let module_start = source.find("pkg[\"bind\"]").unwrap();
    let module_end = source[module_start..].find("})();").unwrap() + module_start;
    assert!(
        !source[module_start..module_end].contains("return {"),
        "raw-file modules export nothing"
    );
}

#[test]
fn rewrite_annotation_substitutes_at_call_site() {
    let mut program = Program::new();
    program.insert(package("dom"));
    let mut create = exported(DefMeta::new("dom.DocCreate", "DocCreate", "dom"));
    create.rewrite = Some("document.createElement($1)".into());
    program.insert(Def::Func(FuncDef {
        meta: create,
        sig: FuncSig::default(),
        body: None,
    }));

    let mut main = DefMeta::new("app.main", "main", "app");
    main.imports.insert("dom".into(), "dom".into());
    main.deps.push(DefId::new("dom.DocCreate"));
    program.insert(func(
        main,
        vec![Stmt::expr(Expr::call_def(
            "dom.DocCreate",
            vec![Expr::str("div")],
        ))],
    ));
    program.entries = vec!["app".into()];

    let source = compile(&program);
    assert!(source.contains("document.createElement(\"div\")"));
    assert!(
        !source.contains("DocCreate"),
        "the annotated function's own body is omitted"
    );
    assert!(!source.contains("$1"), "no residual placeholders");
}

#[test]
fn omitted_definitions_do_not_appear() {
    let mut program = Program::new();
    program.insert(package("util"));
    let mut hidden = exported(DefMeta::new("util.Hidden", "Hidden", "util"));
    hidden.flags |= DefFlags::OMITTED;
    program.insert(Def::Value(ValueDef {
        meta: hidden,
        ty: Some(SrcType::int(32, true)),
        value: None,
        konst: false,
    }));
    program.insert(func(
        exported(DefMeta::new("util.Visible", "Visible", "util")),
        vec![],
    ));

    let mut main = DefMeta::new("app.main", "main", "app");
    main.imports.insert("util".into(), "util".into());
    main.deps = vec![DefId::new("util.Hidden"), DefId::new("util.Visible")];
    program.insert(func(
        main,
        vec![Stmt::expr(Expr::call_def("util.Visible", vec![]))],
    ));
    program.entries = vec!["app".into()];

    let source = compile(&program);
    assert!(!source.contains("Hidden"));
    assert!(source.contains("var Visible = function"));
    assert!(source.contains("return { Visible: Visible };"));
}

#[test]
fn scripts_follow_entry_order() {
    let mut program = Program::new();
    program.insert(func(DefMeta::new("one.main", "main", "one"), vec![]));
    program.insert(func(DefMeta::new("two.main", "main", "two"), vec![]));
    program.entries = vec!["two".into(), "one".into()];

    let scripts = Compiler::new().compile_program(&program).unwrap();
    let paths: Vec<&str> = scripts.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(paths, vec!["two", "one"]);
    assert!(scripts[0].source.contains("return pkg[\"two\"].main();"));
    assert!(scripts[1].source.contains("return pkg[\"one\"].main();"));
}

#[test]
fn import_bindings_resolve_to_earlier_modules() {
    // a -> b -> c: every module's imports refer to modules defined above.
    let mut program = Program::new();
    program.insert(package("b"));
    program.insert(package("c"));
    program.insert(func(
        exported(DefMeta::new("c.Leaf", "Leaf", "c")),
        vec![Stmt::ret(vec![Expr::int(1)])],
    ));
    let mut mid = exported(DefMeta::new("b.Mid", "Mid", "b"));
    mid.imports.insert("c".into(), "c".into());
    mid.deps.push(DefId::new("c.Leaf"));
    program.insert(func(
        mid,
        vec![Stmt::ret(vec![Expr::call_def("c.Leaf", vec![])])],
    ));
    let mut main = DefMeta::new("a.main", "main", "a");
    main.imports.insert("b".into(), "b".into());
    main.deps.push(DefId::new("b.Mid"));
    program.insert(func(
        main,
        vec![Stmt::expr(Expr::call_def("b.Mid", vec![]))],
    ));
    program.entries = vec!["a".into()];

    let source = compile(&program);
    let c_pos = source.find("pkg[\"c\"] =").unwrap();
    let b_pos = source.find("pkg[\"b\"] =").unwrap();
    let a_pos = source.find("pkg[\"a\"] =").unwrap();
    assert!(c_pos < b_pos && b_pos < a_pos);

    let c_binding = source.find("var c = pkg[\"c\"];").unwrap();
    assert!(c_pos < c_binding, "binding follows the module it references");
}
