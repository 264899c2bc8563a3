//! The bundler.
//!
//! Composes an entry's modules into a single JS program: one top-level
//! IIFE that declares the `pkg` registry, injects the runtime helpers the
//! translated code needs, assigns one wrapped module per package, and
//! finishes by invoking the entry's `main`.

use jot_common::{BundleError, CompileError};
use jot_jsast as js;
use jot_translator::{HelperSet, TranslatedDef, Translator};

use crate::group::Module;

struct TranslatedModule<'m, 'a> {
    module: &'m Module<'a>,
    body: Vec<js::Stmt>,
}

/// Bundle one entry's modules into a complete program.
pub fn bundle(
    translator: &Translator<'_>,
    modules: &[Module<'_>],
    entry_path: &str,
) -> Result<js::Program, CompileError> {
    // Translate every module up front: helper collection has to finish
    // before the prelude is emitted.
    let mut helpers = HelperSet::new();
    let mut translated: Vec<TranslatedModule<'_, '_>> = Vec::with_capacity(modules.len());
    for module in modules {
        let mut body = Vec::new();
        for &def in &module.defs {
            if jot_translator::suppressed(def) {
                continue;
            }
            let TranslatedDef {
                stmts,
                helpers: used,
            } = translator.translate(def).map_err(CompileError::from)?;
            helpers.extend(&used);
            body.extend(stmts);
        }
        translated.push(TranslatedModule { module, body });
    }

    let mut body: Vec<js::Stmt> = Vec::new();

    // `var pkg = {};` — the package registry.
    body.push(js::Stmt::var("pkg", js::Expr::Object(vec![])));

    // Runtime prelude: only the helpers actually used, in registry order.
    for helper in helpers.closure() {
        body.push(js::Stmt::Raw(helper.source().to_string()));
    }

    for tm in &translated {
        if tm.body.is_empty() {
            continue;
        }

        if tm.module.is_raw_file() {
            // pkg["path"] = (function () { <verbatim> })();
            body.push(module_assignment(&tm.module.path, tm.body.clone()));
            continue;
        }

        let mut modbody: Vec<js::Stmt> = Vec::new();

        // Import bindings: var <alias> = pkg["<dep-path>"]; sorted by dep
        // path. Bindings to modules that emitted nothing, or that export
        // nothing (raw files define their own interface), are dropped.
        let mut imports: Vec<(&String, &String)> = tm
            .module
            .imports
            .iter()
            .filter(|(_, path)| {
                translated.iter().any(|other| {
                    other.module.path == **path
                        && !other.body.is_empty()
                        && !other.module.exports.is_empty()
                        && !other.module.is_raw_file()
                })
            })
            .collect();
        imports.sort_by(|a, b| a.1.cmp(b.1));
        for (alias, path) in imports {
            modbody.push(js::Stmt::var(
                alias,
                js::Expr::member_str(js::Expr::ident("pkg"), path),
            ));
        }

        modbody.extend(tm.body.clone());

        // return { name: name, ... } for the exported fields.
        let props: Vec<js::Property> = tm
            .module
            .exports
            .iter()
            .map(|name| js::Property::new(name, js::Expr::ident(name)))
            .collect();
        modbody.push(js::Stmt::ret(js::Expr::Object(props)));

        body.push(module_assignment(&tm.module.path, modbody));
    }

    // The entry module must have been emitted; anything else is an
    // internal bug.
    let entry_emitted = translated
        .iter()
        .any(|tm| tm.module.path == entry_path && !tm.body.is_empty());
    if !entry_emitted {
        return Err(CompileError::from(BundleError::new(format!(
            "entry module {entry_path:?} produced no output"
        ))));
    }

    // return pkg["<entry>"].main();
    body.push(js::Stmt::ret(js::Expr::call(
        js::Expr::member(
            js::Expr::member_str(js::Expr::ident("pkg"), entry_path),
            "main",
        ),
        vec![],
    )));

    Ok(js::Program::new(vec![js::Stmt::expr(js::Expr::iife(body))]))
}

/// pkg["<path>"] = (function () { <body> })();
fn module_assignment(path: &str, body: Vec<js::Stmt>) -> js::Stmt {
    js::Stmt::expr(js::Expr::assign(
        js::Expr::member_str(js::Expr::ident("pkg"), path),
        js::Expr::iife(body),
    ))
}
