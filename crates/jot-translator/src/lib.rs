//! The SRC-to-JavaScript translator.
//!
//! `Translator` converts one definition at a time into a JS-AST fragment.
//! It is stateless across calls; all context is the index (for
//! cross-definition lookup) plus a per-call environment tracking temp
//! names and the runtime helpers the fragment uses. The bundler composes
//! the fragments and injects the union of required helpers.
//!
//! Handlers are split by construct family, one `impl` block per file:
//! `expressions`, `statements`, `builtins`, `types`.

pub mod mangle;
pub mod rewrite;
pub mod runtime;

mod builtins;
mod expressions;
mod statements;
mod types;

use jot_common::TranslationError;
use jot_ir::{Def, DefId, FuncSig, Index, MethodDef, Stmt as IrStmt};
use jot_jsast as js;

pub use runtime::{Helper, HelperSet};

/// The output of translating one definition: statements to place in the
/// definition's module, plus the runtime helpers they rely on.
#[derive(Debug, Clone, Default)]
pub struct TranslatedDef {
    pub stmts: Vec<js::Stmt>,
    pub helpers: HelperSet,
}

impl TranslatedDef {
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

/// True when a definition is suppressed at emission: marked omit, or
/// carrying a rewrite template (call sites substitute the template, so the
/// definition itself has no emitted body).
pub fn suppressed(def: &Def) -> bool {
    def.omitted() || def.rewrite().is_some()
}

/// Per-call translation environment.
pub(crate) struct Ctx<'d> {
    /// The definition being translated; errors and import resolution hang
    /// off it.
    pub def: &'d Def,
    pub helpers: HelperSet,
    temps: u32,
}

impl<'d> Ctx<'d> {
    fn new(def: &'d Def) -> Self {
        Self {
            def,
            helpers: HelperSet::new(),
            temps: 0,
        }
    }

    /// A fresh temporary name. SRC identifiers cannot contain `$`, so these
    /// never collide with source-level locals.
    pub fn fresh(&mut self) -> String {
        let name = format!("$t{}", self.temps);
        self.temps += 1;
        name
    }

    pub fn unsupported(&self, construct: impl Into<String>) -> TranslationError {
        TranslationError::Unsupported {
            id: self.def.id().to_string(),
            construct: construct.into(),
        }
    }

    pub fn unresolved(&self, name: impl Into<String>) -> TranslationError {
        TranslationError::UnresolvedIdent {
            id: self.def.id().to_string(),
            name: name.into(),
        }
    }

    pub fn bad_template(&self, message: impl Into<String>) -> TranslationError {
        TranslationError::BadTemplate {
            id: self.def.id().to_string(),
            message: message.into(),
        }
    }
}

pub struct Translator<'a> {
    index: &'a Index<'a>,
}

impl<'a> Translator<'a> {
    pub fn new(index: &'a Index<'a>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &'a Index<'a> {
        self.index
    }

    /// Translate one definition to its JS-AST fragment.
    ///
    /// Suppressed definitions (omit-marked or rewrite-annotated) and bare
    /// package definitions translate to an empty fragment; everything else
    /// produces at least one statement.
    #[tracing::instrument(level = "trace", skip(self, def), fields(id = %def.id()))]
    pub fn translate(&self, def: &Def) -> Result<TranslatedDef, TranslationError> {
        if suppressed(def) {
            tracing::trace!("suppressed at emission");
            return Ok(TranslatedDef::default());
        }

        let mut ctx = Ctx::new(def);
        let stmts = match def {
            Def::Package(_) => vec![],
            Def::Func(f) => {
                let name = mangle::mangled_name(self.index, def);
                let body = f.body.as_deref().unwrap_or(&[]);
                vec![self.function_decl(&mut ctx, &name, &f.sig, None, body)?]
            }
            Def::Method(m) => self.translate_method(&mut ctx, def, m)?,
            Def::Type(t) => self.translate_type(&mut ctx, def, t)?,
            Def::Value(v) => {
                let name = mangle::mangled_name(self.index, def);
                let init = match &v.value {
                    Some(expr) => self.translate_expr(&mut ctx, expr)?,
                    None => match &v.ty {
                        Some(ty) => self.zero_value(&mut ctx, ty)?,
                        None => js::Expr::Null,
                    },
                };
                vec![js::Stmt::var(name, init)]
            }
            Def::File(f) => vec![js::Stmt::Raw(f.source.clone())],
        };

        if stmts.is_empty() && !matches!(def, Def::Package(_)) {
            return Err(TranslationError::EmptyOutput {
                id: def.id().to_string(),
            });
        }

        Ok(TranslatedDef {
            stmts,
            helpers: ctx.helpers,
        })
    }

    /// `var <name> = function (recv?, params...) { body };`
    fn function_decl(
        &self,
        ctx: &mut Ctx<'_>,
        name: &str,
        sig: &FuncSig,
        recv_name: Option<&str>,
        body: &[IrStmt],
    ) -> Result<js::Stmt, TranslationError> {
        let mut params = Vec::with_capacity(sig.params.len() + 1);
        if let Some(recv) = recv_name {
            params.push(recv.to_string());
        }
        params.extend(sig.params.iter().map(|p| p.name.clone()));

        let body = self.translate_fn_body(ctx, body)?;
        Ok(js::Stmt::var(name, js::Expr::func(params, body)))
    }

    /// A method emits its function binding plus a registration in its
    /// receiver's method table, so both concrete calls and interface
    /// dispatch resolve through `$mtab`.
    fn translate_method(
        &self,
        ctx: &mut Ctx<'_>,
        def: &Def,
        m: &MethodDef,
    ) -> Result<Vec<js::Stmt>, TranslationError> {
        let name = mangle::mangled_name(self.index, def);
        let body = m.body.as_deref().unwrap_or(&[]);
        let decl = self.function_decl(ctx, &name, &m.sig, Some(&m.recv_name), body)?;

        ctx.helpers.insert(Helper::Mtab);
        let tag = mangle::type_tag(&m.recv);
        let register = js::Stmt::expr(js::Expr::assign(
            js::Expr::member(
                js::Expr::member_str(js::Expr::ident("$mtab"), tag),
                def.name(),
            ),
            js::Expr::ident(name),
        ));
        Ok(vec![decl, register])
    }

    /// The translated body of a function, with deferred-call support:
    /// bodies containing `defer` are wrapped in `try`/`finally` unwinding a
    /// per-function LIFO stack.
    pub(crate) fn translate_fn_body(
        &self,
        ctx: &mut Ctx<'_>,
        body: &[IrStmt],
    ) -> Result<Vec<js::Stmt>, TranslationError> {
        let stmts = self.translate_stmts(ctx, body)?;
        if !statements::has_defer(body) {
            return Ok(stmts);
        }

        ctx.helpers.insert(Helper::Defer);
        Ok(vec![
            js::Stmt::var("$defers", js::Expr::Array(vec![])),
            js::Stmt::Try {
                block: stmts,
                handler: None,
                finalizer: Some(vec![js::Stmt::expr(js::Expr::call(
                    js::Expr::ident("$rundefers"),
                    vec![js::Expr::ident("$defers")],
                ))]),
            },
        ])
    }

    /// A JS expression referencing a package-level definition from the
    /// current one: the mangled name within the same package, the module
    /// alias member across packages, or the substituted template for
    /// rewrite-annotated values.
    pub(crate) fn def_ref_expr(
        &self,
        ctx: &mut Ctx<'_>,
        id: &DefId,
    ) -> Result<js::Expr, TranslationError> {
        let target = self
            .index
            .lookup(id)
            .ok_or_else(|| ctx.unresolved(id.as_str()))?;

        if let Some(raw) = target.rewrite() {
            let template = rewrite::Template::parse(raw).map_err(|e| ctx.bad_template(e))?;
            let text = template
                .substitute(None, &[])
                .map_err(|e| ctx.bad_template(e))?;
            return Ok(js::Expr::Raw(text));
        }

        if target.path() == ctx.def.path() {
            return Ok(js::Expr::ident(mangle::mangled_name(self.index, target)));
        }

        // Cross-package: resolve through the referencing definition's
        // import table to the module alias.
        let alias = ctx
            .def
            .imports()
            .iter()
            .find(|(_, path)| path.as_str() == target.path())
            .map(|(alias, _)| alias.clone())
            .ok_or_else(|| ctx.unresolved(id.as_str()))?;

        if !target.exported() {
            return Err(ctx.unresolved(id.as_str()));
        }
        Ok(js::Expr::member(
            js::Expr::ident(alias),
            mangle::mangled_name(self.index, target),
        ))
    }
}
