//! Translation of individual definitions, checked against the printed
//! JavaScript.

use jot_ir::{
    BinaryOp, Builtin, Callee, ContainerKind, Def, DefFlags, DefId, DefMeta, Expr, FuncDef,
    FuncSig, Index, Param, Program, SelectCase, SelectOp, SrcType, Stmt,
};
use jot_jsast as js;
use jot_translator::Translator;

/// Build a single-function program around the given body and translate
/// that function.
fn translate_main(body: Vec<Stmt>) -> String {
    translate_main_with(body, |_| {})
}

fn translate_main_with(body: Vec<Stmt>, add: impl FnOnce(&mut Program)) -> String {
    let mut program = Program::new();
    program.insert(Def::Func(FuncDef {
        meta: DefMeta::new("app.main", "main", "app"),
        sig: FuncSig::default(),
        body: Some(body),
    }));
    add(&mut program);
    program.entries = vec!["app".into()];

    let index = Index::new(&program).unwrap();
    let translator = Translator::new(&index);
    let main = index.lookup(&DefId::new("app.main")).unwrap();
    let translated = translator.translate(main).unwrap();
    js::Program::new(translated.stmts).to_source()
}

#[test]
fn narrow_integer_addition_is_masked() {
    let source = translate_main(vec![Stmt::Decl {
        names: vec!["c".into()],
        ty: None,
        values: vec![Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::ident("a")),
            rhs: Box::new(Expr::ident("b")),
            ty: Some(SrcType::int(8, true)),
        }],
    }]);
    assert!(source.contains("a + b << 24 >> 24"));
}

#[test]
fn unsigned_sixteen_bit_masks_with_and() {
    let source = translate_main(vec![Stmt::Decl {
        names: vec!["c".into()],
        ty: None,
        values: vec![Expr::Binary {
            op: BinaryOp::Mul,
            lhs: Box::new(Expr::ident("a")),
            rhs: Box::new(Expr::ident("b")),
            ty: Some(SrcType::int(16, false)),
        }],
    }]);
    assert!(source.contains("(a * b & 65535)") || source.contains("a * b & 65535"));
}

#[test]
fn thirty_two_bit_multiply_uses_imul() {
    let source = translate_main(vec![Stmt::Decl {
        names: vec!["c".into()],
        ty: None,
        values: vec![Expr::Binary {
            op: BinaryOp::Mul,
            lhs: Box::new(Expr::ident("a")),
            rhs: Box::new(Expr::ident("b")),
            ty: Some(SrcType::int(32, true)),
        }],
    }]);
    assert!(source.contains("Math.imul(a, b)"));
}

#[test]
fn integer_division_truncates() {
    let source = translate_main(vec![Stmt::Decl {
        names: vec!["q".into()],
        ty: None,
        values: vec![Expr::Binary {
            op: BinaryOp::Div,
            lhs: Box::new(Expr::ident("a")),
            rhs: Box::new(Expr::ident("b")),
            ty: Some(SrcType::int(32, true)),
        }],
    }]);
    assert!(source.contains("$div(a, b) | 0"));
}

#[test]
fn float_arithmetic_is_unmasked() {
    let source = translate_main(vec![Stmt::Decl {
        names: vec!["c".into()],
        ty: None,
        values: vec![Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::ident("a")),
            rhs: Box::new(Expr::ident("b")),
            ty: Some(SrcType::Float { width: 64 }),
        }],
    }]);
    assert!(source.contains("var c = a + b;"));
}

#[test]
fn defer_wraps_body_in_try_finally() {
    let source = translate_main(vec![
        Stmt::Defer {
            call: Expr::Call {
                callee: Callee::Builtin {
                    name: Builtin::Println,
                    ty: None,
                },
                args: vec![Expr::str("done")],
                spread: false,
            },
        },
        Stmt::ret(vec![]),
    ]);
    assert!(source.contains("var $defers = [];"));
    assert!(source.contains("$defer($defers, $println, [\"done\"]);"));
    assert!(source.contains("} finally {"));
    assert!(source.contains("$rundefers($defers);"));
}

#[test]
fn go_enqueues_a_continuation() {
    let source = translate_main_with(
        vec![Stmt::Go {
            call: Expr::call_def("app.worker", vec![Expr::int(1)]),
        }],
        |program| {
            program.insert(Def::Func(FuncDef {
                meta: DefMeta::new("app.worker", "worker", "app"),
                sig: FuncSig {
                    params: vec![Param {
                        name: "n".into(),
                        ty: SrcType::int(32, true),
                    }],
                    results: vec![],
                },
                body: Some(vec![]),
            }));
        },
    );
    assert!(source.contains("$go(worker$app, [1]);"));
}

#[test]
fn channel_operations_use_the_runtime() {
    let source = translate_main(vec![
        Stmt::Decl {
            names: vec!["ch".into()],
            ty: None,
            values: vec![Expr::Make {
                ty: SrcType::Chan {
                    elem: Box::new(SrcType::int(32, true)),
                },
                len: Some(Box::new(Expr::int(4))),
                cap: None,
            }],
        },
        Stmt::Send {
            chan: Expr::ident("ch"),
            value: Expr::int(7),
        },
        Stmt::Decl {
            names: vec!["v".into()],
            ty: None,
            values: vec![Expr::Receive {
                chan: Box::new(Expr::ident("ch")),
                comma_ok: false,
                ty: Some(SrcType::int(32, true)),
            }],
        },
    ]);
    assert!(source.contains("var ch = $chan(4);"));
    assert!(source.contains("$send(ch, 7);"));
    assert!(source.contains("var v = $recv(ch, 0);"));
}

#[test]
fn select_probes_cases_in_source_order() {
    let source = translate_main(vec![Stmt::Select {
        cases: vec![
            SelectCase {
                op: SelectOp::Recv {
                    chan: Expr::ident("a"),
                    bind: Some("v".into()),
                    ok: None,
                },
                body: vec![],
            },
            SelectCase {
                op: SelectOp::Send {
                    chan: Expr::ident("b"),
                    value: Expr::int(1),
                },
                body: vec![],
            },
            SelectCase {
                op: SelectOp::Default,
                body: vec![],
            },
        ],
    }]);
    assert!(source.contains("$select(["));
    assert!(source.contains("], true);") || source.contains("], true)"));
    assert!(source.contains("case 0:"));
    assert!(source.contains("case 1:"));
    assert!(source.contains("default:"));
    assert!(source.contains("var v = $recv("));
    assert!(source.contains("$send("));
}

#[test]
fn address_of_local_builds_accessor_pair() {
    let source = translate_main(vec![
        Stmt::Decl {
            names: vec!["x".into()],
            ty: None,
            values: vec![Expr::int(1)],
        },
        Stmt::Decl {
            names: vec!["p".into()],
            ty: None,
            values: vec![Expr::AddrOf {
                expr: Box::new(Expr::ident("x")),
            }],
        },
        Stmt::Assign {
            lhs: vec![Expr::Deref {
                expr: Box::new(Expr::ident("p")),
            }],
            op: None,
            rhs: vec![Expr::int(2)],
            ty: None,
        },
        Stmt::Decl {
            names: vec!["y".into()],
            ty: None,
            values: vec![Expr::Deref {
                expr: Box::new(Expr::ident("p")),
            }],
        },
    ]);
    assert!(source.contains("get: function () {"));
    assert!(source.contains("return x;"));
    assert!(source.contains("set: function ($v) {"));
    assert!(source.contains("p.set(2);"));
    assert!(source.contains("var y = p.get();"));
}

#[test]
fn slice_literal_and_indexing() {
    let source = translate_main(vec![
        Stmt::Decl {
            names: vec!["s".into()],
            ty: None,
            values: vec![Expr::SliceLit {
                elem: SrcType::int(32, true),
                elems: vec![Expr::int(1), Expr::int(2)],
            }],
        },
        Stmt::Decl {
            names: vec!["v".into()],
            ty: None,
            values: vec![Expr::Index {
                expr: Box::new(Expr::ident("s")),
                index: Box::new(Expr::int(0)),
                container: ContainerKind::Slice,
                ty: Some(SrcType::int(32, true)),
            }],
        },
        Stmt::Assign {
            lhs: vec![Expr::Index {
                expr: Box::new(Expr::ident("s")),
                index: Box::new(Expr::int(1)),
                container: ContainerKind::Slice,
                ty: None,
            }],
            op: None,
            rhs: vec![Expr::int(9)],
            ty: None,
        },
    ]);
    assert!(source.contains("var s = $slice([1, 2], 0, 2, 2);"));
    assert!(source.contains("var v = $index(s, 0);"));
    assert!(source.contains("$setindex(s, 1, 9);"));
}

#[test]
fn map_reads_pass_the_zero_value() {
    let source = translate_main(vec![Stmt::Decl {
        names: vec!["v".into(), "ok".into()],
        ty: None,
        values: vec![Expr::Index {
            expr: Box::new(Expr::ident("m")),
            index: Box::new(Expr::str("k")),
            container: ContainerKind::Map,
            ty: Some(SrcType::int(32, true)),
        }],
    }]);
    assert!(source.contains("$mapget2(m, \"k\", 0)"));
    assert!(source.contains("var v = $t0[0];"));
    assert!(source.contains("var ok = $t0[1];"));
}

#[test]
fn range_over_slice_binds_index_and_element() {
    let source = translate_main(vec![Stmt::Range {
        label: None,
        key: Some("i".into()),
        value: Some("v".into()),
        expr: Expr::ident("s"),
        container: ContainerKind::Slice,
        body: vec![],
    }]);
    assert!(source.contains("var $t0 = s;"));
    assert!(source.contains("$t1 < $slen($t0)"));
    assert!(source.contains("var i = $t1;"));
    assert!(source.contains("var v = $index($t0, $t1);"));
}

#[test]
fn switch_cases_break_unless_fallthrough() {
    let source = translate_main(vec![Stmt::Switch {
        label: None,
        init: None,
        tag: Some(Expr::ident("x")),
        cases: vec![
            jot_ir::SwitchCase {
                exprs: vec![Expr::int(1)],
                body: vec![],
                fallthrough: true,
            },
            jot_ir::SwitchCase {
                exprs: vec![Expr::int(2)],
                body: vec![],
                fallthrough: false,
            },
            jot_ir::SwitchCase {
                exprs: vec![],
                body: vec![],
                fallthrough: false,
            },
        ],
    }]);
    let first_case = source.find("case 1:").unwrap();
    let second_case = source.find("case 2:").unwrap();
    let between = &source[first_case..second_case];
    assert!(
        !between.contains("break;"),
        "fallthrough case emits no break"
    );
    assert!(source[second_case..].contains("break;"));
    assert!(source.contains("default:"));
}

#[test]
fn interface_dispatch_goes_through_the_method_table() {
    let source = translate_main_with(
        vec![Stmt::expr(Expr::Call {
            callee: Callee::Method {
                recv: Box::new(Expr::ident("x")),
                id: DefId::new("app.T.String"),
                dynamic: true,
            },
            args: vec![],
            spread: false,
        })],
        |program| {
            program.insert(Def::Type(jot_ir::TypeDef {
                meta: DefMeta::new("app.T", "T", "app"),
                ty: SrcType::Struct { fields: vec![] },
                has_methods: true,
            }));
            program.insert(Def::Method(jot_ir::MethodDef {
                meta: DefMeta::new("app.T.String", "String", "app"),
                recv: DefId::new("app.T"),
                recv_name: "t".into(),
                sig: FuncSig::default(),
                body: Some(vec![]),
            }));
        },
    );
    assert!(source.contains("$icall(x, \"String\", []);"));
}

#[test]
fn rewrite_method_template_uses_receiver() {
    let source = translate_main_with(
        vec![Stmt::expr(Expr::Call {
            callee: Callee::Method {
                recv: Box::new(Expr::ident("plugins")),
                id: DefId::new("app.PluginArray.Item"),
                dynamic: false,
            },
            args: vec![Expr::int(0)],
            spread: false,
        })],
        |program| {
            let mut meta = DefMeta::new("app.PluginArray", "PluginArray", "app");
            meta.flags |= DefFlags::EXPORTED | DefFlags::OMITTED;
            program.insert(Def::Type(jot_ir::TypeDef {
                meta,
                ty: SrcType::Struct { fields: vec![] },
                has_methods: true,
            }));
            let mut meta = DefMeta::new("app.PluginArray.Item", "Item", "app");
            meta.js_name = Some("item".into());
            meta.rewrite = Some("$_.item($1)".into());
            program.insert(Def::Method(jot_ir::MethodDef {
                meta,
                recv: DefId::new("app.PluginArray"),
                recv_name: "p".into(),
                sig: FuncSig::default(),
                body: None,
            }));
        },
    );
    assert!(source.contains("plugins.item(0);"));
}

#[test]
fn multi_value_returns_destructure_through_a_temp() {
    let source = translate_main_with(
        vec![
            Stmt::Decl {
                names: vec!["v".into(), "err".into()],
                ty: None,
                values: vec![Expr::call_def("app.parse", vec![])],
            },
            Stmt::ret(vec![]),
        ],
        |program| {
            program.insert(Def::Func(FuncDef {
                meta: DefMeta::new("app.parse", "parse", "app"),
                sig: FuncSig::default(),
                body: Some(vec![Stmt::ret(vec![Expr::int(1), Expr::Nil])]),
            }));
        },
    );
    assert!(source.contains("var $t0 = parse$app();"));
    assert!(source.contains("var v = $t0[0];"));
    assert!(source.contains("var err = $t0[1];"));
}

#[test]
fn parallel_assignment_swaps_through_temps() {
    let source = translate_main(vec![Stmt::Assign {
        lhs: vec![Expr::ident("a"), Expr::ident("b")],
        op: None,
        rhs: vec![Expr::ident("b"), Expr::ident("a")],
        ty: None,
    }]);
    assert!(source.contains("var $t0 = b;"));
    assert!(source.contains("var $t1 = a;"));
    assert!(source.contains("a = $t0;"));
    assert!(source.contains("b = $t1;"));
}

#[test]
fn suppressed_definitions_translate_to_nothing() {
    let mut program = Program::new();
    let mut meta = DefMeta::new("app.hidden", "hidden", "app");
    meta.flags |= DefFlags::OMITTED;
    program.insert(Def::Func(FuncDef {
        meta,
        sig: FuncSig::default(),
        body: Some(vec![]),
    }));
    program.insert(Def::Func(FuncDef {
        meta: DefMeta::new("app.main", "main", "app"),
        sig: FuncSig::default(),
        body: Some(vec![]),
    }));
    program.entries = vec!["app".into()];

    let index = Index::new(&program).unwrap();
    let translator = Translator::new(&index);
    let hidden = index.lookup(&DefId::new("app.hidden")).unwrap();
    let translated = translator.translate(hidden).unwrap();
    assert!(translated.is_empty());
}
