//! Statement translation.
//!
//! Multi-value returns travel as JS arrays and destructure through temps.
//! Blocking operations (`<-ch`, `ch <- v`, `select`) become runtime calls
//! that yield to the scheduler. `defer` pushes onto the per-function stack
//! installed by the function-body wrapper; `go` enqueues a continuation on
//! the run queue.

use jot_common::TranslationError;
use jot_ir::{
    Builtin, Callee, ContainerKind, Expr as IrExpr, SelectCase, SelectOp, Stmt as IrStmt,
};
use jot_jsast as js;

use crate::expressions::deref_read;
use crate::runtime::Helper;
use crate::{Ctx, Translator, mangle};

/// Whether a function body contains a `defer` statement (not counting
/// nested function literals, which install their own stacks).
pub(crate) fn has_defer(body: &[IrStmt]) -> bool {
    body.iter().any(stmt_has_defer)
}

fn stmt_has_defer(stmt: &IrStmt) -> bool {
    match stmt {
        IrStmt::Defer { .. } => true,
        IrStmt::If {
            init, then, els, ..
        } => {
            init.as_deref().is_some_and(stmt_has_defer)
                || has_defer(then)
                || els.as_deref().is_some_and(has_defer)
        }
        IrStmt::For {
            init, post, body, ..
        } => {
            init.as_deref().is_some_and(stmt_has_defer)
                || post.as_deref().is_some_and(stmt_has_defer)
                || has_defer(body)
        }
        IrStmt::Range { body, .. } => has_defer(body),
        IrStmt::Switch { init, cases, .. } => {
            init.as_deref().is_some_and(stmt_has_defer)
                || cases.iter().any(|c| has_defer(&c.body))
        }
        IrStmt::Select { cases } => cases.iter().any(|c| has_defer(&c.body)),
        IrStmt::Block { body } => has_defer(body),
        _ => false,
    }
}

impl<'a> Translator<'a> {
    pub(crate) fn translate_stmts(
        &self,
        ctx: &mut Ctx<'_>,
        stmts: &[IrStmt],
    ) -> Result<Vec<js::Stmt>, TranslationError> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            self.translate_stmt(ctx, stmt, &mut out)?;
        }
        Ok(out)
    }

    fn translate_stmt(
        &self,
        ctx: &mut Ctx<'_>,
        stmt: &IrStmt,
        out: &mut Vec<js::Stmt>,
    ) -> Result<(), TranslationError> {
        match stmt {
            IrStmt::Decl { names, ty, values } => self.translate_decl(ctx, names, ty.as_ref(), values, out),
            IrStmt::Assign { lhs, op, rhs, ty } => {
                self.translate_assign(ctx, lhs, *op, rhs, ty.as_ref(), out)
            }
            IrStmt::IncDec { expr, inc, ty } => self.translate_incdec(ctx, expr, *inc, ty.as_ref(), out),
            IrStmt::ExprStmt { expr } => {
                let expr = self.translate_expr(ctx, expr)?;
                out.push(js::Stmt::expr(expr));
                Ok(())
            }
            IrStmt::Return { values } => {
                let stmt = match values.as_slice() {
                    [] => js::Stmt::Return(None),
                    [value] => js::Stmt::ret(self.translate_expr(ctx, value)?),
                    many => js::Stmt::ret(js::Expr::Array(self.translate_exprs(ctx, many)?)),
                };
                out.push(stmt);
                Ok(())
            }
            IrStmt::If {
                init,
                cond,
                then,
                els,
            } => {
                let mut target = Vec::new();
                if let Some(init) = init {
                    self.translate_stmt(ctx, init, &mut target)?;
                }
                let test = self.translate_expr(ctx, cond)?;
                let then = self.translate_stmts(ctx, then)?;
                let els = match els {
                    Some(els) => Some(self.translate_stmts(ctx, els)?),
                    None => None,
                };
                target.push(js::Stmt::If { test, then, els });
                if target.len() == 1 {
                    out.push(target.pop().unwrap_or(js::Stmt::Empty));
                } else {
                    out.push(js::Stmt::Block(target));
                }
                Ok(())
            }
            IrStmt::For {
                label,
                init,
                cond,
                post,
                body,
            } => self.translate_for(ctx, label.as_deref(), init.as_deref(), cond.as_ref(), post.as_deref(), body, out),
            IrStmt::Range {
                label,
                key,
                value,
                expr,
                container,
                body,
            } => self.translate_range(
                ctx,
                label.as_deref(),
                key.as_deref(),
                value.as_deref(),
                expr,
                *container,
                body,
                out,
            ),
            IrStmt::Switch {
                label,
                init,
                tag,
                cases,
            } => self.translate_switch(ctx, label.as_deref(), init.as_deref(), tag.as_ref(), cases, out),
            IrStmt::Break { label } => {
                out.push(js::Stmt::Break(label.clone()));
                Ok(())
            }
            IrStmt::Continue { label } => {
                out.push(js::Stmt::Continue(label.clone()));
                Ok(())
            }
            IrStmt::Block { body } => {
                let body = self.translate_stmts(ctx, body)?;
                out.push(js::Stmt::Block(body));
                Ok(())
            }
            IrStmt::Defer { call } => {
                ctx.helpers.insert(Helper::Defer);
                let (callee, args) = self.spawn_parts(ctx, call, out)?;
                out.push(js::Stmt::expr(js::Expr::call(
                    js::Expr::ident("$defer"),
                    vec![js::Expr::ident("$defers"), callee, js::Expr::Array(args)],
                )));
                Ok(())
            }
            IrStmt::Go { call } => {
                ctx.helpers.insert(Helper::Sched);
                let (callee, args) = self.spawn_parts(ctx, call, out)?;
                out.push(js::Stmt::expr(js::Expr::call(
                    js::Expr::ident("$go"),
                    vec![callee, js::Expr::Array(args)],
                )));
                Ok(())
            }
            IrStmt::Send { chan, value } => {
                ctx.helpers.insert(Helper::Chan);
                let chan = self.translate_expr(ctx, chan)?;
                let value = self.translate_expr(ctx, value)?;
                out.push(js::Stmt::expr(js::Expr::call(
                    js::Expr::ident("$send"),
                    vec![chan, value],
                )));
                Ok(())
            }
            IrStmt::Select { cases } => self.translate_select(ctx, cases, out),
            IrStmt::Empty => Ok(()),
        }
    }

    // =========================================================================
    // Declarations and assignment
    // =========================================================================

    fn translate_decl(
        &self,
        ctx: &mut Ctx<'_>,
        names: &[String],
        ty: Option<&jot_ir::SrcType>,
        values: &[IrExpr],
        out: &mut Vec<js::Stmt>,
    ) -> Result<(), TranslationError> {
        if values.is_empty() {
            for name in names {
                if name == "_" {
                    continue;
                }
                let zero = match ty {
                    Some(ty) => self.zero_value(ctx, ty)?,
                    None => js::Expr::Null,
                };
                out.push(js::Stmt::Var {
                    name: name.clone(),
                    init: Some(zero),
                });
            }
            return Ok(());
        }

        if names.len() == values.len() {
            for (name, value) in names.iter().zip(values) {
                let value = self.translate_expr(ctx, value)?;
                if name == "_" {
                    out.push(js::Stmt::expr(value));
                } else {
                    out.push(js::Stmt::Var {
                        name: name.clone(),
                        init: Some(value),
                    });
                }
            }
            return Ok(());
        }

        if values.len() == 1 {
            // Destructure a multi-value source through a temp.
            let value = self.translate_multi_source(ctx, &values[0], names.len())?;
            let temp = ctx.fresh();
            out.push(js::Stmt::var(&temp, value));
            for (i, name) in names.iter().enumerate() {
                if name == "_" {
                    continue;
                }
                out.push(js::Stmt::Var {
                    name: name.clone(),
                    init: Some(js::Expr::member_computed(
                        js::Expr::ident(&temp),
                        js::Expr::num(i as f64),
                    )),
                });
            }
            return Ok(());
        }

        Err(ctx.unsupported("declaration arity mismatch"))
    }

    /// A single expression yielding multiple values: a multi-result call,
    /// or one of the comma-ok forms. Map reads have no comma-ok flag of
    /// their own, so the two-name context selects the pair-returning
    /// accessor here.
    fn translate_multi_source(
        &self,
        ctx: &mut Ctx<'_>,
        value: &IrExpr,
        arity: usize,
    ) -> Result<js::Expr, TranslationError> {
        if arity == 2 {
            if let IrExpr::Index {
                expr,
                index,
                container: ContainerKind::Map,
                ty,
            } = value
            {
                ctx.helpers.insert(Helper::MapCore);
                let base = self.translate_expr(ctx, expr)?;
                let idx = self.translate_expr(ctx, index)?;
                let zero = match ty {
                    Some(ty) => self.zero_value(ctx, ty)?,
                    None => js::Expr::Null,
                };
                return Ok(js::Expr::call(
                    js::Expr::ident("$mapget2"),
                    vec![base, idx, zero],
                ));
            }
        }
        self.translate_expr(ctx, value)
    }

    fn translate_assign(
        &self,
        ctx: &mut Ctx<'_>,
        lhs: &[IrExpr],
        op: Option<jot_ir::BinaryOp>,
        rhs: &[IrExpr],
        ty: Option<&jot_ir::SrcType>,
        out: &mut Vec<js::Stmt>,
    ) -> Result<(), TranslationError> {
        if let Some(op) = op {
            let ([target], [operand]) = (lhs, rhs) else {
                return Err(ctx.unsupported("compound assignment arity"));
            };
            let read = self.translate_expr(ctx, target)?;
            let operand = self.translate_expr(ctx, operand)?;
            let value = self.translate_arith(ctx, op, read, operand, self.int_facts(ty));
            return self.assign_target(ctx, target, value, out);
        }

        match (lhs, rhs) {
            ([target], [value]) => {
                let value = self.translate_expr(ctx, value)?;
                self.assign_target(ctx, target, value, out)
            }
            (targets, [value]) => {
                let value = self.translate_multi_source(ctx, value, targets.len())?;
                let temp = ctx.fresh();
                out.push(js::Stmt::var(&temp, value));
                for (i, target) in targets.iter().enumerate() {
                    let element = js::Expr::member_computed(
                        js::Expr::ident(&temp),
                        js::Expr::num(i as f64),
                    );
                    self.assign_target(ctx, target, element, out)?;
                }
                Ok(())
            }
            (targets, values) if targets.len() == values.len() => {
                // Parallel assignment: evaluate every right-hand side
                // before any store, so swaps work.
                let mut temps = Vec::with_capacity(values.len());
                for value in values {
                    let value = self.translate_expr(ctx, value)?;
                    let temp = ctx.fresh();
                    out.push(js::Stmt::var(&temp, value));
                    temps.push(temp);
                }
                for (target, temp) in targets.iter().zip(temps) {
                    self.assign_target(ctx, target, js::Expr::ident(temp), out)?;
                }
                Ok(())
            }
            _ => Err(ctx.unsupported("assignment arity mismatch")),
        }
    }

    /// Store `value` into an lvalue.
    fn assign_target(
        &self,
        ctx: &mut Ctx<'_>,
        target: &IrExpr,
        value: js::Expr,
        out: &mut Vec<js::Stmt>,
    ) -> Result<(), TranslationError> {
        match target {
            IrExpr::Ident { name } if name == "_" => {
                out.push(js::Stmt::expr(value));
                Ok(())
            }
            IrExpr::Ident { name } => {
                out.push(js::Stmt::expr(js::Expr::assign(
                    js::Expr::ident(name.clone()),
                    value,
                )));
                Ok(())
            }
            IrExpr::Deref { expr } => {
                let pointer = self.translate_expr(ctx, expr)?;
                out.push(js::Stmt::expr(js::Expr::call(
                    js::Expr::member(pointer, "set"),
                    vec![value],
                )));
                Ok(())
            }
            IrExpr::Selector { expr, field, deref } => {
                let base = self.translate_expr(ctx, expr)?;
                let base = if *deref { deref_read(base) } else { base };
                out.push(js::Stmt::expr(js::Expr::assign(
                    js::Expr::member(base, field),
                    value,
                )));
                Ok(())
            }
            IrExpr::Index {
                expr,
                index,
                container,
                ..
            } => {
                let base = self.translate_expr(ctx, expr)?;
                let idx = self.translate_expr(ctx, index)?;
                match container {
                    ContainerKind::Map => {
                        ctx.helpers.insert(Helper::MapCore);
                        out.push(js::Stmt::expr(js::Expr::call(
                            js::Expr::ident("$mapset"),
                            vec![base, idx, value],
                        )));
                        Ok(())
                    }
                    ContainerKind::Slice => {
                        ctx.helpers.insert(Helper::SliceCore);
                        out.push(js::Stmt::expr(js::Expr::call(
                            js::Expr::ident("$setindex"),
                            vec![base, idx, value],
                        )));
                        Ok(())
                    }
                    ContainerKind::Array => {
                        out.push(js::Stmt::expr(js::Expr::assign(
                            js::Expr::member_computed(base, idx),
                            value,
                        )));
                        Ok(())
                    }
                    ContainerKind::String => {
                        Err(ctx.unsupported("assignment into a string"))
                    }
                }
            }
            _ => Err(ctx.unsupported("assignment to a non-addressable expression")),
        }
    }

    fn translate_incdec(
        &self,
        ctx: &mut Ctx<'_>,
        expr: &IrExpr,
        inc: bool,
        ty: Option<&jot_ir::SrcType>,
        out: &mut Vec<js::Stmt>,
    ) -> Result<(), TranslationError> {
        let int = self.int_facts(ty);
        let needs_mask = matches!(int, Some((width, _)) if width <= 32);
        if !needs_mask {
            if let IrExpr::Ident { name } = expr {
                out.push(js::Stmt::expr(js::Expr::Update {
                    op: if inc { "++" } else { "--" },
                    arg: Box::new(js::Expr::ident(name.clone())),
                    prefix: false,
                }));
                return Ok(());
            }
        }
        let read = self.translate_expr(ctx, expr)?;
        let op = if inc {
            jot_ir::BinaryOp::Add
        } else {
            jot_ir::BinaryOp::Sub
        };
        let value = self.translate_arith(ctx, op, read, js::Expr::num(1.0), int);
        self.assign_target(ctx, expr, value, out)
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    fn translate_for(
        &self,
        ctx: &mut Ctx<'_>,
        label: Option<&str>,
        init: Option<&IrStmt>,
        cond: Option<&IrExpr>,
        post: Option<&IrStmt>,
        body: &[IrStmt],
        out: &mut Vec<js::Stmt>,
    ) -> Result<(), TranslationError> {
        let mut init_js = Vec::new();
        if let Some(init) = init {
            self.translate_stmt(ctx, init, &mut init_js)?;
        }
        let inline_init = init_js.len() == 1
            && matches!(init_js[0], js::Stmt::Var { .. } | js::Stmt::Expr(_));

        let update = match post {
            Some(post) => {
                let mut post_js = Vec::new();
                self.translate_stmt(ctx, post, &mut post_js)?;
                match post_js.pop() {
                    Some(js::Stmt::Expr(expr)) if post_js.is_empty() => Some(expr),
                    _ => return Err(ctx.unsupported("loop post statement expanding to multiple statements")),
                }
            }
            None => None,
        };

        let test = match cond {
            Some(cond) => Some(self.translate_expr(ctx, cond)?),
            None => None,
        };
        let body = self.translate_stmts(ctx, body)?;

        let loop_init = if inline_init {
            init_js.pop().map(Box::new)
        } else {
            None
        };
        let mut loop_stmt = js::Stmt::For {
            init: loop_init,
            test,
            update,
            body,
        };
        if let Some(label) = label {
            loop_stmt = js::Stmt::Labeled {
                label: label.to_string(),
                body: Box::new(loop_stmt),
            };
        }

        if inline_init || init_js.is_empty() {
            out.push(loop_stmt);
        } else {
            init_js.push(loop_stmt);
            out.push(js::Stmt::Block(init_js));
        }
        Ok(())
    }

    fn translate_range(
        &self,
        ctx: &mut Ctx<'_>,
        label: Option<&str>,
        key: Option<&str>,
        value: Option<&str>,
        expr: &IrExpr,
        container: ContainerKind,
        body: &[IrStmt],
        out: &mut Vec<js::Stmt>,
    ) -> Result<(), TranslationError> {
        let source = ctx.fresh();
        let subject = self.translate_expr(ctx, expr)?;
        out.push(js::Stmt::var(&source, subject));

        let idx = ctx.fresh();
        let mut body_js = Vec::new();
        let bind = |name: Option<&str>| name.filter(|n| *n != "_").map(str::to_string);

        let length: js::Expr;
        match container {
            ContainerKind::Slice => {
                ctx.helpers.insert(Helper::SliceCore);
                length = js::Expr::call(
                    js::Expr::ident("$slen"),
                    vec![js::Expr::ident(&source)],
                );
                if let Some(key) = bind(key) {
                    body_js.push(js::Stmt::var(key, js::Expr::ident(&idx)));
                }
                if let Some(value) = bind(value) {
                    body_js.push(js::Stmt::var(
                        value,
                        js::Expr::call(
                            js::Expr::ident("$index"),
                            vec![js::Expr::ident(&source), js::Expr::ident(&idx)],
                        ),
                    ));
                }
            }
            ContainerKind::Array => {
                length = js::Expr::member(js::Expr::ident(&source), "length");
                if let Some(key) = bind(key) {
                    body_js.push(js::Stmt::var(key, js::Expr::ident(&idx)));
                }
                if let Some(value) = bind(value) {
                    body_js.push(js::Stmt::var(
                        value,
                        js::Expr::member_computed(
                            js::Expr::ident(&source),
                            js::Expr::ident(&idx),
                        ),
                    ));
                }
            }
            ContainerKind::String => {
                length = js::Expr::member(js::Expr::ident(&source), "length");
                if let Some(key) = bind(key) {
                    body_js.push(js::Stmt::var(key, js::Expr::ident(&idx)));
                }
                if let Some(value) = bind(value) {
                    body_js.push(js::Stmt::var(
                        value,
                        js::Expr::call(
                            js::Expr::member(js::Expr::ident(&source), "charCodeAt"),
                            vec![js::Expr::ident(&idx)],
                        ),
                    ));
                }
            }
            ContainerKind::Map => {
                ctx.helpers.insert(Helper::MapIter);
                let entries = ctx.fresh();
                out.push(js::Stmt::var(
                    &entries,
                    js::Expr::call(
                        js::Expr::ident("$mapiter"),
                        vec![js::Expr::ident(&source)],
                    ),
                ));
                length = js::Expr::member(js::Expr::ident(&entries), "length");
                let entry = js::Expr::member_computed(
                    js::Expr::ident(&entries),
                    js::Expr::ident(&idx),
                );
                if let Some(key) = bind(key) {
                    body_js.push(js::Stmt::var(key, js::Expr::member(entry.clone(), "key")));
                }
                if let Some(value) = bind(value) {
                    body_js.push(js::Stmt::var(value, js::Expr::member(entry, "value")));
                }
            }
        }

        body_js.extend(self.translate_stmts(ctx, body)?);
        let mut loop_stmt = js::Stmt::For {
            init: Some(Box::new(js::Stmt::var(&idx, js::Expr::num(0.0)))),
            test: Some(js::Expr::binary("<", js::Expr::ident(&idx), length)),
            update: Some(js::Expr::Update {
                op: "++",
                arg: Box::new(js::Expr::ident(&idx)),
                prefix: false,
            }),
            body: body_js,
        };
        if let Some(label) = label {
            loop_stmt = js::Stmt::Labeled {
                label: label.to_string(),
                body: Box::new(loop_stmt),
            };
        }
        out.push(loop_stmt);
        Ok(())
    }

    fn translate_switch(
        &self,
        ctx: &mut Ctx<'_>,
        label: Option<&str>,
        init: Option<&IrStmt>,
        tag: Option<&IrExpr>,
        cases: &[jot_ir::SwitchCase],
        out: &mut Vec<js::Stmt>,
    ) -> Result<(), TranslationError> {
        if let Some(init) = init {
            self.translate_stmt(ctx, init, out)?;
        }

        let disc = match tag {
            Some(tag) => {
                let temp = ctx.fresh();
                let tag = self.translate_expr(ctx, tag)?;
                out.push(js::Stmt::var(&temp, tag));
                js::Expr::ident(temp)
            }
            None => js::Expr::Bool(true),
        };

        let mut cases_js = Vec::new();
        for case in cases {
            if case.exprs.is_empty() {
                let mut body = self.translate_stmts(ctx, &case.body)?;
                if !case.fallthrough {
                    body.push(js::Stmt::Break(None));
                }
                cases_js.push(js::SwitchCase { test: None, body });
                continue;
            }

            // Multiple case expressions share one body: all but the last
            // emit as empty fall-in labels.
            for expr in &case.exprs[..case.exprs.len() - 1] {
                let test = self.translate_expr(ctx, expr)?;
                cases_js.push(js::SwitchCase {
                    test: Some(test),
                    body: vec![],
                });
            }
            let test = self.translate_expr(ctx, &case.exprs[case.exprs.len() - 1])?;
            let mut body = self.translate_stmts(ctx, &case.body)?;
            if !case.fallthrough {
                body.push(js::Stmt::Break(None));
            }
            cases_js.push(js::SwitchCase {
                test: Some(test),
                body,
            });
        }

        let mut switch_stmt = js::Stmt::Switch {
            disc,
            cases: cases_js,
        };
        if let Some(label) = label {
            switch_stmt = js::Stmt::Labeled {
                label: label.to_string(),
                body: Box::new(switch_stmt),
            };
        }
        out.push(switch_stmt);
        Ok(())
    }

    // =========================================================================
    // Concurrency
    // =========================================================================

    fn translate_select(
        &self,
        ctx: &mut Ctx<'_>,
        cases: &[SelectCase],
        out: &mut Vec<js::Stmt>,
    ) -> Result<(), TranslationError> {
        ctx.helpers.insert(Helper::Select);
        ctx.helpers.insert(Helper::Chan);

        // All channel operands (and send values) are evaluated up front,
        // in source order.
        struct Prepared {
            chan: String,
            value: Option<String>,
        }
        let mut prepared: Vec<Option<Prepared>> = Vec::with_capacity(cases.len());
        let mut has_default = false;
        for case in cases {
            match &case.op {
                SelectOp::Recv { chan, .. } => {
                    let temp = ctx.fresh();
                    let chan = self.translate_expr(ctx, chan)?;
                    out.push(js::Stmt::var(&temp, chan));
                    prepared.push(Some(Prepared {
                        chan: temp,
                        value: None,
                    }));
                }
                SelectOp::Send { chan, value } => {
                    let chan_temp = ctx.fresh();
                    let chan = self.translate_expr(ctx, chan)?;
                    out.push(js::Stmt::var(&chan_temp, chan));
                    let value_temp = ctx.fresh();
                    let value = self.translate_expr(ctx, value)?;
                    out.push(js::Stmt::var(&value_temp, value));
                    prepared.push(Some(Prepared {
                        chan: chan_temp,
                        value: Some(value_temp),
                    }));
                }
                SelectOp::Default => {
                    has_default = true;
                    prepared.push(None);
                }
            }
        }

        // Readiness probes, one per channel case, in source order — the
        // first ready case wins, ties broken by position.
        let mut probes = Vec::new();
        for (case, prep) in cases.iter().zip(&prepared) {
            let Some(prep) = prep else { continue };
            let chan = js::Expr::ident(&prep.chan);
            let ready = match &case.op {
                SelectOp::Recv { .. } => js::Expr::binary(
                    "||",
                    js::Expr::binary(
                        ">",
                        js::Expr::member(js::Expr::member(chan.clone(), "buf"), "length"),
                        js::Expr::num(0.0),
                    ),
                    js::Expr::member(chan, "closed"),
                ),
                SelectOp::Send { .. } => js::Expr::binary(
                    "&&",
                    js::Expr::binary(
                        "<",
                        js::Expr::member(js::Expr::member(chan.clone(), "buf"), "length"),
                        js::Expr::member(chan.clone(), "cap"),
                    ),
                    js::Expr::unary("!", js::Expr::member(chan, "closed")),
                ),
                SelectOp::Default => continue,
            };
            probes.push(js::Expr::func(vec![], vec![js::Stmt::ret(ready)]));
        }

        let chosen = ctx.fresh();
        out.push(js::Stmt::var(
            &chosen,
            js::Expr::call(
                js::Expr::ident("$select"),
                vec![js::Expr::Array(probes), js::Expr::Bool(has_default)],
            ),
        ));

        let mut cases_js = Vec::new();
        let mut probe_index = 0f64;
        for (case, prep) in cases.iter().zip(&prepared) {
            let mut body = Vec::new();
            match (&case.op, prep) {
                (SelectOp::Recv { bind, ok, .. }, Some(prep)) => {
                    let chan = js::Expr::ident(&prep.chan);
                    match (bind.as_deref().filter(|b| *b != "_"), ok.as_deref()) {
                        (bind, Some(ok)) => {
                            let pair = ctx.fresh();
                            body.push(js::Stmt::var(
                                &pair,
                                js::Expr::call(
                                    js::Expr::ident("$recv2"),
                                    vec![chan, js::Expr::Null],
                                ),
                            ));
                            if let Some(bind) = bind {
                                body.push(js::Stmt::var(
                                    bind,
                                    js::Expr::member_computed(
                                        js::Expr::ident(&pair),
                                        js::Expr::num(0.0),
                                    ),
                                ));
                            }
                            body.push(js::Stmt::var(
                                ok,
                                js::Expr::member_computed(
                                    js::Expr::ident(&pair),
                                    js::Expr::num(1.0),
                                ),
                            ));
                        }
                        (Some(bind), None) => {
                            body.push(js::Stmt::var(
                                bind,
                                js::Expr::call(
                                    js::Expr::ident("$recv"),
                                    vec![chan, js::Expr::Null],
                                ),
                            ));
                        }
                        (None, None) => {
                            body.push(js::Stmt::expr(js::Expr::call(
                                js::Expr::ident("$recv"),
                                vec![chan, js::Expr::Null],
                            )));
                        }
                    }
                }
                (SelectOp::Send { .. }, Some(prep)) => {
                    let value = prep.value.clone().unwrap_or_default();
                    body.push(js::Stmt::expr(js::Expr::call(
                        js::Expr::ident("$send"),
                        vec![js::Expr::ident(&prep.chan), js::Expr::ident(value)],
                    )));
                }
                (SelectOp::Default, _) => {
                    let mut default_body = self.translate_stmts(ctx, &case.body)?;
                    default_body.push(js::Stmt::Break(None));
                    cases_js.push(js::SwitchCase {
                        test: None,
                        body: default_body,
                    });
                    continue;
                }
                _ => continue,
            }
            body.extend(self.translate_stmts(ctx, &case.body)?);
            body.push(js::Stmt::Break(None));
            cases_js.push(js::SwitchCase {
                test: Some(js::Expr::num(probe_index)),
                body,
            });
            probe_index += 1.0;
        }

        out.push(js::Stmt::Switch {
            disc: js::Expr::ident(chosen),
            cases: cases_js,
        });
        Ok(())
    }

    /// Decompose a spawned or deferred call into a function value and an
    /// argument array, evaluated now. Receiver-bearing callees may emit a
    /// temp so the receiver is evaluated exactly once.
    fn spawn_parts(
        &self,
        ctx: &mut Ctx<'_>,
        call: &IrExpr,
        out: &mut Vec<js::Stmt>,
    ) -> Result<(js::Expr, Vec<js::Expr>), TranslationError> {
        let IrExpr::Call {
            callee,
            args,
            spread,
        } = call
        else {
            return Err(ctx.unsupported("go/defer of a non-call expression"));
        };
        if *spread {
            return Err(ctx.unsupported("go/defer with argument spread"));
        }

        let args_js = self.translate_exprs(ctx, args)?;
        match callee {
            Callee::Def { id } => {
                let target = self
                    .index
                    .lookup(id)
                    .ok_or_else(|| ctx.unresolved(id.as_str()))?;
                if target.rewrite().is_some() {
                    return Err(ctx.unsupported("go/defer of a rewrite-annotated function"));
                }
                Ok((self.def_ref_expr(ctx, id)?, args_js))
            }
            Callee::Expr { expr } => Ok((self.translate_expr(ctx, expr)?, args_js)),
            Callee::Method { recv, id, dynamic } => {
                let target = self
                    .index
                    .lookup(id)
                    .ok_or_else(|| ctx.unresolved(id.as_str()))?;
                if target.rewrite().is_some() {
                    return Err(ctx.unsupported("go/defer of a rewrite-annotated method"));
                }
                let recv_js = self.translate_expr(ctx, recv)?;
                let temp = ctx.fresh();
                out.push(js::Stmt::var(&temp, recv_js));

                let func = if *dynamic {
                    ctx.helpers.insert(Helper::Imethod);
                    js::Expr::call(
                        js::Expr::ident("$imethod"),
                        vec![js::Expr::ident(&temp), js::Expr::str(target.name())],
                    )
                } else {
                    let recv_ty = target
                        .recv()
                        .ok_or_else(|| ctx.unresolved(id.as_str()))?;
                    ctx.helpers.insert(Helper::Mtab);
                    js::Expr::member(
                        js::Expr::member_str(
                            js::Expr::ident("$mtab"),
                            mangle::type_tag(recv_ty),
                        ),
                        target.name(),
                    )
                };
                let mut full_args = vec![js::Expr::ident(&temp)];
                full_args.extend(args_js);
                Ok((func, full_args))
            }
            Callee::Builtin { name, .. } => {
                let helper = match name {
                    Builtin::Print => {
                        ctx.helpers.insert(Helper::Print);
                        "$print"
                    }
                    Builtin::Println => {
                        ctx.helpers.insert(Helper::Print);
                        "$println"
                    }
                    Builtin::Close => {
                        ctx.helpers.insert(Helper::Chan);
                        "$close"
                    }
                    _ => return Err(ctx.unsupported("go/defer of this builtin")),
                };
                Ok((js::Expr::ident(helper), args_js))
            }
            Callee::Conv { .. } => Err(ctx.unsupported("go/defer of a type conversion")),
        }
    }
}
