//! Expression translation.
//!
//! One handler per SRC expression form. Integer arithmetic is masked to
//! its width for widths narrower than 32 bits (`<< s >> s` signed,
//! `& mask` unsigned), normalized with `| 0` / `>>> 0` at 32 bits, and
//! multiplied through `Math.imul` at exactly 32 bits. Slices, maps,
//! channels and pointer boxes go through the runtime helpers.

use jot_common::TranslationError;
use jot_ir::{Callee, ContainerKind, Def, Expr as IrExpr, SrcType};
use jot_jsast as js;

use crate::runtime::Helper;
use crate::{Ctx, Translator, mangle, rewrite};

impl<'a> Translator<'a> {
    pub(crate) fn translate_expr(
        &self,
        ctx: &mut Ctx<'_>,
        expr: &IrExpr,
    ) -> Result<js::Expr, TranslationError> {
        match expr {
            IrExpr::Bool { value } => Ok(js::Expr::Bool(*value)),
            IrExpr::Int { value } => Ok(js::Expr::num(*value as f64)),
            IrExpr::Float { value } => Ok(js::Expr::num(*value)),
            IrExpr::Str { value } => Ok(js::Expr::str(value.clone())),
            IrExpr::Nil => Ok(js::Expr::Null),
            IrExpr::Ident { name } => Ok(js::Expr::ident(name.clone())),
            IrExpr::DefRef { id } => self.def_ref_expr(ctx, id),
            IrExpr::Unary { op, expr, ty } => self.translate_unary(ctx, *op, expr, ty.as_ref()),
            IrExpr::Binary { op, lhs, rhs, ty } => {
                self.translate_binary(ctx, *op, lhs, rhs, ty.as_ref())
            }
            IrExpr::Call {
                callee,
                args,
                spread,
            } => self.translate_call(ctx, callee, args, *spread),
            IrExpr::Selector { expr, field, deref } => {
                let base = self.translate_expr(ctx, expr)?;
                let base = if *deref { deref_read(base) } else { base };
                Ok(js::Expr::member(base, field))
            }
            IrExpr::Index {
                expr,
                index,
                container,
                ty,
            } => self.translate_index(ctx, expr, index, *container, ty.as_ref()),
            IrExpr::SliceExpr {
                expr,
                lo,
                hi,
                max,
                container,
            } => self.translate_slice_expr(ctx, expr, lo.as_deref(), hi.as_deref(), max.as_deref(), *container),
            IrExpr::StructLit { ty, fields } => self.translate_struct_lit(ctx, ty.as_ref(), fields),
            IrExpr::SliceLit { elems, .. } => {
                ctx.helpers.insert(Helper::SliceCore);
                let n = elems.len();
                let elems = self.translate_exprs(ctx, elems)?;
                Ok(js::Expr::call(
                    js::Expr::ident("$slice"),
                    vec![
                        js::Expr::Array(elems),
                        js::Expr::num(0.0),
                        js::Expr::num(n as f64),
                        js::Expr::num(n as f64),
                    ],
                ))
            }
            IrExpr::ArrayLit { elem, len, elems } => {
                self.translate_array_lit(ctx, elem, *len, elems)
            }
            IrExpr::MapLit { entries, .. } => {
                ctx.helpers.insert(Helper::MapCore);
                let mut pairs = Vec::with_capacity(entries.len());
                for entry in entries {
                    let key = self.translate_expr(ctx, &entry.key)?;
                    let value = self.translate_expr(ctx, &entry.value)?;
                    pairs.push(js::Expr::Array(vec![key, value]));
                }
                Ok(js::Expr::call(
                    js::Expr::ident("$maplit"),
                    vec![js::Expr::Array(pairs)],
                ))
            }
            IrExpr::FuncLit { sig, body } => {
                let params = sig.params.iter().map(|p| p.name.clone()).collect();
                let body = self.translate_fn_body(ctx, body)?;
                Ok(js::Expr::func(params, body))
            }
            IrExpr::Make { ty, len, cap } => {
                self.translate_make(ctx, ty, len.as_deref(), cap.as_deref())
            }
            IrExpr::New { ty } => {
                ctx.helpers.insert(Helper::Ref);
                let zero = self.zero_value(ctx, ty)?;
                Ok(js::Expr::call(js::Expr::ident("$boxref"), vec![zero]))
            }
            IrExpr::AddrOf { expr } => self.translate_addr(ctx, expr),
            IrExpr::Deref { expr } => {
                let pointer = self.translate_expr(ctx, expr)?;
                Ok(deref_read(pointer))
            }
            IrExpr::Receive { chan, comma_ok, ty } => {
                ctx.helpers.insert(Helper::Chan);
                let chan = self.translate_expr(ctx, chan)?;
                let zero = match ty {
                    Some(ty) => self.zero_value(ctx, ty)?,
                    None => js::Expr::Null,
                };
                let helper = if *comma_ok { "$recv2" } else { "$recv" };
                Ok(js::Expr::call(js::Expr::ident(helper), vec![chan, zero]))
            }
            IrExpr::TypeAssert { expr, ty, comma_ok } => {
                self.translate_assert(ctx, expr, ty, *comma_ok)
            }
        }
    }

    pub(crate) fn translate_exprs(
        &self,
        ctx: &mut Ctx<'_>,
        exprs: &[IrExpr],
    ) -> Result<Vec<js::Expr>, TranslationError> {
        exprs
            .iter()
            .map(|e| self.translate_expr(ctx, e))
            .collect()
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn translate_unary(
        &self,
        ctx: &mut Ctx<'_>,
        op: jot_ir::UnaryOp,
        expr: &IrExpr,
        ty: Option<&SrcType>,
    ) -> Result<js::Expr, TranslationError> {
        use jot_ir::UnaryOp;
        let arg = self.translate_expr(ctx, expr)?;
        let int = self.int_facts(ty);
        Ok(match op {
            UnaryOp::Not => js::Expr::unary("!", arg),
            UnaryOp::Neg => match int {
                Some((width, signed)) => {
                    self.mask_int(ctx, js::Expr::unary("-", arg), width, signed, false)
                }
                None => js::Expr::unary("-", arg),
            },
            UnaryOp::BitNot => match int {
                // `~` coerces through 32 bits; above that, use the identity
                // ~x == -x - 1.
                Some((64, _)) => js::Expr::binary(
                    "-",
                    js::Expr::unary("-", arg),
                    js::Expr::num(1.0),
                ),
                Some((width, signed)) => {
                    self.mask_int(ctx, js::Expr::unary("~", arg), width, signed, false)
                }
                None => js::Expr::unary("~", arg),
            },
        })
    }

    fn translate_binary(
        &self,
        ctx: &mut Ctx<'_>,
        op: jot_ir::BinaryOp,
        lhs: &IrExpr,
        rhs: &IrExpr,
        ty: Option<&SrcType>,
    ) -> Result<js::Expr, TranslationError> {
        use jot_ir::BinaryOp::*;
        let l = self.translate_expr(ctx, lhs)?;
        let r = self.translate_expr(ctx, rhs)?;
        Ok(match op {
            LogAnd => js::Expr::binary("&&", l, r),
            LogOr => js::Expr::binary("||", l, r),
            Eq => js::Expr::binary("===", l, r),
            Ne => js::Expr::binary("!==", l, r),
            Lt => js::Expr::binary("<", l, r),
            Le => js::Expr::binary("<=", l, r),
            Gt => js::Expr::binary(">", l, r),
            Ge => js::Expr::binary(">=", l, r),
            _ => self.translate_arith(ctx, op, l, r, self.int_facts(ty)),
        })
    }

    /// Arithmetic with SRC integer semantics. Values of width-w integers
    /// are kept normalized to their range, so only operations that can
    /// leave the range re-mask.
    pub(crate) fn translate_arith(
        &self,
        ctx: &mut Ctx<'_>,
        op: jot_ir::BinaryOp,
        l: js::Expr,
        r: js::Expr,
        int: Option<(u8, bool)>,
    ) -> js::Expr {
        use jot_ir::BinaryOp::*;

        let Some((width, signed)) = int else {
            // Floats, string concatenation, and untyped operands map to the
            // plain JS operator.
            return match op {
                Add => js::Expr::binary("+", l, r),
                Sub => js::Expr::binary("-", l, r),
                Mul => js::Expr::binary("*", l, r),
                Div => js::Expr::binary("/", l, r),
                Rem => js::Expr::binary("%", l, r),
                BitAnd => js::Expr::binary("&", l, r),
                BitOr => js::Expr::binary("|", l, r),
                BitXor => js::Expr::binary("^", l, r),
                AndNot => js::Expr::binary("&", l, js::Expr::unary("~", r)),
                Shl => js::Expr::binary("<<", l, r),
                Shr => js::Expr::binary(">>", l, r),
                _ => unreachable!("comparison handled by caller"),
            };
        };

        match op {
            Add => self.mask_int(ctx, js::Expr::binary("+", l, r), width, signed, false),
            Sub => self.mask_int(ctx, js::Expr::binary("-", l, r), width, signed, false),
            Mul => match width {
                32 => {
                    let product = js::Expr::call(
                        js::Expr::member(js::Expr::ident("Math"), "imul"),
                        vec![l, r],
                    );
                    if signed {
                        product
                    } else {
                        js::Expr::binary(">>>", product, js::Expr::num(0.0))
                    }
                }
                64 => js::Expr::binary("*", l, r),
                _ => self.mask_int(ctx, js::Expr::binary("*", l, r), width, signed, false),
            },
            Div => {
                ctx.helpers.insert(Helper::Div);
                let quotient = js::Expr::call(js::Expr::ident("$div"), vec![l, r]);
                self.mask_int(ctx, quotient, width, signed, false)
            }
            Rem => js::Expr::binary("%", l, r),
            BitAnd => normalize_bitop(js::Expr::binary("&", l, r), width, signed),
            BitOr => normalize_bitop(js::Expr::binary("|", l, r), width, signed),
            BitXor => normalize_bitop(js::Expr::binary("^", l, r), width, signed),
            AndNot => normalize_bitop(
                js::Expr::binary("&", l, js::Expr::unary("~", r)),
                width,
                signed,
            ),
            Shl => match width {
                64 => js::Expr::binary(
                    "*",
                    l,
                    js::Expr::call(
                        js::Expr::member(js::Expr::ident("Math"), "pow"),
                        vec![js::Expr::num(2.0), r],
                    ),
                ),
                _ => self.mask_int(ctx, js::Expr::binary("<<", l, r), width, signed, false),
            },
            Shr => match width {
                64 => {
                    ctx.helpers.insert(Helper::Div);
                    js::Expr::call(
                        js::Expr::ident("$div"),
                        vec![
                            l,
                            js::Expr::call(
                                js::Expr::member(js::Expr::ident("Math"), "pow"),
                                vec![js::Expr::num(2.0), r],
                            ),
                        ],
                    )
                }
                _ if signed => js::Expr::binary(">>", l, r),
                _ => js::Expr::binary(">>>", l, r),
            },
            _ => unreachable!("comparison handled by caller"),
        }
    }

    /// Normalize a value to a w-bit integer. `>>` and `&` coerce through
    /// ToInt32, so narrower masks also truncate fractional inputs.
    pub(crate) fn mask_int(
        &self,
        ctx: &mut Ctx<'_>,
        expr: js::Expr,
        width: u8,
        signed: bool,
        trunc: bool,
    ) -> js::Expr {
        match (width, signed) {
            (8, true) => shift_mask(expr, 24),
            (16, true) => shift_mask(expr, 16),
            (8, false) => js::Expr::binary("&", expr, js::Expr::num(255.0)),
            (16, false) => js::Expr::binary("&", expr, js::Expr::num(65535.0)),
            (32, true) => js::Expr::binary("|", expr, js::Expr::num(0.0)),
            (32, false) => js::Expr::binary(">>>", expr, js::Expr::num(0.0)),
            _ => {
                if trunc {
                    ctx.helpers.insert(Helper::Div);
                    js::Expr::call(js::Expr::ident("$div"), vec![expr, js::Expr::num(1.0)])
                } else {
                    expr
                }
            }
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    pub(crate) fn translate_call(
        &self,
        ctx: &mut Ctx<'_>,
        callee: &Callee,
        args: &[IrExpr],
        spread: bool,
    ) -> Result<js::Expr, TranslationError> {
        // Rewrite-annotated callees substitute their template in place of
        // a normal call.
        let rewrite_target = match callee {
            Callee::Def { id } => self.index.lookup(id).filter(|d| d.rewrite().is_some()),
            Callee::Method { id, .. } => self.index.lookup(id).filter(|d| d.rewrite().is_some()),
            _ => None,
        };
        if let Some(target) = rewrite_target {
            if spread {
                return Err(ctx.unsupported("argument spread into a rewrite-annotated callee"));
            }
            let recv = match callee {
                Callee::Method { recv, .. } => Some(recv.as_ref()),
                _ => None,
            };
            return self.substitute_rewrite(ctx, target, recv, args);
        }

        match callee {
            Callee::Def { id } => {
                let callee = self.def_ref_expr(ctx, id)?;
                self.plain_or_spread_call(ctx, callee, args, spread)
            }
            Callee::Expr { expr } => {
                let callee = self.translate_expr(ctx, expr)?;
                self.plain_or_spread_call(ctx, callee, args, spread)
            }
            Callee::Method { recv, id, dynamic } => {
                self.translate_method_call(ctx, recv, id, *dynamic, args, spread)
            }
            Callee::Builtin { name, ty } => {
                self.translate_builtin(ctx, *name, ty.as_ref(), args, spread)
            }
            Callee::Conv { ty } => self.translate_conv(ctx, ty, args),
        }
    }

    fn substitute_rewrite(
        &self,
        ctx: &mut Ctx<'_>,
        target: &Def,
        recv: Option<&IrExpr>,
        args: &[IrExpr],
    ) -> Result<js::Expr, TranslationError> {
        let raw = target.rewrite().unwrap_or_default();
        let template = rewrite::Template::parse(raw).map_err(|e| ctx.bad_template(e))?;

        let recv_text = match recv {
            Some(recv) => {
                let recv = self.translate_expr(ctx, recv)?;
                Some(js::print_expression(&recv))
            }
            None => None,
        };
        let mut printed = Vec::with_capacity(args.len());
        for arg in args {
            let arg = self.translate_expr(ctx, arg)?;
            printed.push(js::print_expression(&arg));
        }

        let text = template
            .substitute(recv_text.as_deref(), &printed)
            .map_err(|e| ctx.bad_template(e))?;
        Ok(js::Expr::Raw(text))
    }

    fn translate_method_call(
        &self,
        ctx: &mut Ctx<'_>,
        recv: &IrExpr,
        id: &jot_ir::DefId,
        dynamic: bool,
        args: &[IrExpr],
        spread: bool,
    ) -> Result<js::Expr, TranslationError> {
        let target = self
            .index
            .lookup(id)
            .ok_or_else(|| ctx.unresolved(id.as_str()))?;
        let recv_js = self.translate_expr(ctx, recv)?;
        let args_js = self.translate_exprs(ctx, args)?;

        if dynamic {
            if spread {
                return Err(ctx.unsupported("argument spread into an interface method call"));
            }
            // Trampoline lookup keyed on the receiver's runtime type tag.
            ctx.helpers.insert(Helper::Imethod);
            return Ok(js::Expr::call(
                js::Expr::ident("$icall"),
                vec![
                    recv_js,
                    js::Expr::str(target.name()),
                    js::Expr::Array(args_js),
                ],
            ));
        }

        let recv_ty = target
            .recv()
            .ok_or_else(|| ctx.unresolved(id.as_str()))?;
        ctx.helpers.insert(Helper::Mtab);
        let table_entry = js::Expr::member(
            js::Expr::member_str(js::Expr::ident("$mtab"), mangle::type_tag(recv_ty)),
            target.name(),
        );

        if spread {
            let mut leading = vec![recv_js];
            let mut args_js = args_js;
            let last = args_js.pop().ok_or_else(|| {
                ctx.unsupported("spread call with no arguments")
            })?;
            leading.extend(args_js);
            return Ok(self.apply_call(ctx, table_entry, leading, last));
        }

        let mut call_args = vec![recv_js];
        call_args.extend(args_js);
        Ok(js::Expr::call(table_entry, call_args))
    }

    fn plain_or_spread_call(
        &self,
        ctx: &mut Ctx<'_>,
        callee: js::Expr,
        args: &[IrExpr],
        spread: bool,
    ) -> Result<js::Expr, TranslationError> {
        let mut args_js = self.translate_exprs(ctx, args)?;
        if !spread {
            return Ok(js::Expr::call(callee, args_js));
        }
        let last = args_js
            .pop()
            .ok_or_else(|| ctx.unsupported("spread call with no arguments"))?;
        Ok(self.apply_call(ctx, callee, args_js, last))
    }

    /// `f.apply(undefined, [leading...].concat($toarray(last)))`
    pub(crate) fn apply_call(
        &self,
        ctx: &mut Ctx<'_>,
        callee: js::Expr,
        leading: Vec<js::Expr>,
        last_slice: js::Expr,
    ) -> js::Expr {
        ctx.helpers.insert(Helper::ToArray);
        let tail = js::Expr::call(js::Expr::ident("$toarray"), vec![last_slice]);
        let args_array = if leading.is_empty() {
            tail
        } else {
            js::Expr::call(
                js::Expr::member(js::Expr::Array(leading), "concat"),
                vec![tail],
            )
        };
        js::Expr::call(
            js::Expr::member(callee, "apply"),
            vec![js::Expr::ident("undefined"), args_array],
        )
    }

    // =========================================================================
    // Containers
    // =========================================================================

    fn translate_index(
        &self,
        ctx: &mut Ctx<'_>,
        expr: &IrExpr,
        index: &IrExpr,
        container: ContainerKind,
        ty: Option<&SrcType>,
    ) -> Result<js::Expr, TranslationError> {
        let base = self.translate_expr(ctx, expr)?;
        let idx = self.translate_expr(ctx, index)?;
        match container {
            ContainerKind::Slice => {
                ctx.helpers.insert(Helper::SliceCore);
                Ok(js::Expr::call(js::Expr::ident("$index"), vec![base, idx]))
            }
            ContainerKind::Array => Ok(js::Expr::member_computed(base, idx)),
            ContainerKind::String => Ok(js::Expr::call(
                js::Expr::member(base, "charCodeAt"),
                vec![idx],
            )),
            ContainerKind::Map => {
                ctx.helpers.insert(Helper::MapCore);
                let zero = match ty {
                    Some(ty) => self.zero_value(ctx, ty)?,
                    None => js::Expr::Null,
                };
                Ok(js::Expr::call(
                    js::Expr::ident("$mapget"),
                    vec![base, idx, zero],
                ))
            }
        }
    }

    fn translate_slice_expr(
        &self,
        ctx: &mut Ctx<'_>,
        expr: &IrExpr,
        lo: Option<&IrExpr>,
        hi: Option<&IrExpr>,
        max: Option<&IrExpr>,
        container: ContainerKind,
    ) -> Result<js::Expr, TranslationError> {
        let base = self.translate_expr(ctx, expr)?;
        let lo_js = match lo {
            Some(lo) => self.translate_expr(ctx, lo)?,
            None => js::Expr::num(0.0),
        };

        if container == ContainerKind::String {
            let mut args = vec![lo_js];
            if let Some(hi) = hi {
                args.push(self.translate_expr(ctx, hi)?);
            }
            return Ok(js::Expr::call(js::Expr::member(base, "substring"), args));
        }

        ctx.helpers.insert(Helper::Subslice);
        let base = match container {
            ContainerKind::Slice => base,
            ContainerKind::Array => {
                js::Expr::call(js::Expr::ident("$arrslice"), vec![base])
            }
            _ => return Err(ctx.unsupported("slice expression over a map")),
        };
        let hi_js = match hi {
            Some(hi) => self.translate_expr(ctx, hi)?,
            None => js::Expr::Null,
        };
        let max_js = match max {
            Some(max) => self.translate_expr(ctx, max)?,
            None => js::Expr::Null,
        };
        Ok(js::Expr::call(
            js::Expr::ident("$subslice"),
            vec![base, lo_js, hi_js, max_js],
        ))
    }

    fn translate_array_lit(
        &self,
        ctx: &mut Ctx<'_>,
        elem: &SrcType,
        len: u64,
        elems: &[IrExpr],
    ) -> Result<js::Expr, TranslationError> {
        if elems.len() as u64 == len {
            let elems = self.translate_exprs(ctx, elems)?;
            return Ok(js::Expr::Array(elems));
        }

        ctx.helpers.insert(Helper::ZeroArray);
        let zero = self.zero_value(ctx, elem)?;
        let filled = js::Expr::call(
            js::Expr::ident("$zeroarray"),
            vec![
                js::Expr::num(len as f64),
                js::Expr::func(vec![], vec![js::Stmt::ret(zero)]),
            ],
        );
        if elems.is_empty() {
            return Ok(filled);
        }

        // Partial initialization: fill with zeros, then set the leading
        // elements inside a wrapper.
        let mut body = vec![js::Stmt::var("$a", filled)];
        for (i, elem) in elems.iter().enumerate() {
            let value = self.translate_expr(ctx, elem)?;
            body.push(js::Stmt::expr(js::Expr::assign(
                js::Expr::member_computed(js::Expr::ident("$a"), js::Expr::num(i as f64)),
                value,
            )));
        }
        body.push(js::Stmt::ret(js::Expr::ident("$a")));
        Ok(js::Expr::iife(body))
    }

    fn translate_struct_lit(
        &self,
        ctx: &mut Ctx<'_>,
        ty: Option<&jot_ir::DefId>,
        inits: &[jot_ir::FieldInit],
    ) -> Result<js::Expr, TranslationError> {
        let Some(id) = ty else {
            // Anonymous struct literal: a plain object with the written
            // fields.
            let mut props = Vec::with_capacity(inits.len());
            for init in inits {
                let value = self.translate_expr(ctx, &init.value)?;
                props.push(js::Property::new(&init.name, value));
            }
            return Ok(js::Expr::Object(props));
        };

        let def = self
            .index
            .lookup(id)
            .ok_or_else(|| ctx.unresolved(id.as_str()))?;
        let Def::Type(t) = def else {
            return Err(ctx.unresolved(id.as_str()));
        };
        let SrcType::Struct { fields } = self.underlying(&t.ty) else {
            return Err(ctx.unsupported("composite literal of a non-struct named type"));
        };
        let fields = fields.clone();
        let has_methods = t.has_methods;

        // Declared field order, zero-filled where the literal is silent.
        let mut values = Vec::with_capacity(fields.len());
        for field in &fields {
            match inits.iter().find(|i| i.name == field.name) {
                Some(init) => values.push((
                    field.name.clone(),
                    self.translate_expr(ctx, &init.value)?,
                )),
                None => values.push((field.name.clone(), self.zero_value(ctx, &field.ty)?)),
            }
        }

        if has_methods {
            let ctor = self.def_ref_expr(ctx, id)?;
            let args = values.into_iter().map(|(_, v)| v).collect();
            Ok(js::Expr::new_expr(ctor, args))
        } else {
            let mut props: Vec<js::Property> = values
                .into_iter()
                .map(|(name, value)| js::Property::new(name, value))
                .collect();
            props.push(js::Property::new(
                "$type",
                js::Expr::str(mangle::type_tag(id)),
            ));
            Ok(js::Expr::Object(props))
        }
    }

    fn translate_make(
        &self,
        ctx: &mut Ctx<'_>,
        ty: &SrcType,
        len: Option<&IrExpr>,
        cap: Option<&IrExpr>,
    ) -> Result<js::Expr, TranslationError> {
        match self.underlying(ty) {
            SrcType::Slice { elem } => {
                let elem = elem.as_ref().clone();
                ctx.helpers.insert(Helper::MakeSlice);
                let len_js = match len {
                    Some(len) => self.translate_expr(ctx, len)?,
                    None => js::Expr::num(0.0),
                };
                let cap_js = match cap {
                    Some(cap) => self.translate_expr(ctx, cap)?,
                    None => js::Expr::Null,
                };
                let zero = self.zero_value(ctx, &elem)?;
                Ok(js::Expr::call(
                    js::Expr::ident("$makeslice"),
                    vec![
                        len_js,
                        cap_js,
                        js::Expr::func(vec![], vec![js::Stmt::ret(zero)]),
                    ],
                ))
            }
            SrcType::Map { .. } => {
                ctx.helpers.insert(Helper::MapCore);
                Ok(js::Expr::call(js::Expr::ident("$mapmake"), vec![]))
            }
            SrcType::Chan { .. } => {
                ctx.helpers.insert(Helper::Chan);
                let cap_js = match len {
                    Some(cap) => self.translate_expr(ctx, cap)?,
                    None => js::Expr::num(0.0),
                };
                Ok(js::Expr::call(js::Expr::ident("$chan"), vec![cap_js]))
            }
            _ => Err(ctx.unsupported("make of a non-slice, non-map, non-channel type")),
        }
    }

    // =========================================================================
    // Addressability
    // =========================================================================

    /// `&expr`. Addressable expressions produce a `{get, set}` accessor
    /// pair over the original location; non-addressable operands are boxed
    /// around a copy of the value.
    fn translate_addr(
        &self,
        ctx: &mut Ctx<'_>,
        expr: &IrExpr,
    ) -> Result<js::Expr, TranslationError> {
        match expr {
            IrExpr::Ident { name } => Ok(accessor_pair_over_local(name)),
            IrExpr::Selector {
                expr: base,
                field,
                deref,
            } => {
                ctx.helpers.insert(Helper::Ref);
                let base = self.translate_expr(ctx, base)?;
                let base = if *deref { deref_read(base) } else { base };
                Ok(js::Expr::call(
                    js::Expr::ident("$fieldref"),
                    vec![base, js::Expr::str(field.clone())],
                ))
            }
            IrExpr::Index {
                expr: base,
                index,
                container: ContainerKind::Slice,
                ..
            } => {
                ctx.helpers.insert(Helper::Ref);
                let base = self.translate_expr(ctx, base)?;
                let index = self.translate_expr(ctx, index)?;
                Ok(js::Expr::call(
                    js::Expr::ident("$indexref"),
                    vec![base, index],
                ))
            }
            IrExpr::Index {
                expr: base,
                index,
                container: ContainerKind::Array,
                ..
            } => {
                ctx.helpers.insert(Helper::Ref);
                let base = self.translate_expr(ctx, base)?;
                let index = self.translate_expr(ctx, index)?;
                Ok(js::Expr::call(
                    js::Expr::ident("$fieldref"),
                    vec![base, index],
                ))
            }
            // &*p is p.
            IrExpr::Deref { expr } => self.translate_expr(ctx, expr),
            // Composite literals, calls and other rvalues: box a copy.
            other => {
                ctx.helpers.insert(Helper::Ref);
                let value = self.translate_expr(ctx, other)?;
                Ok(js::Expr::call(js::Expr::ident("$boxref"), vec![value]))
            }
        }
    }
}

/// Read through a pointer box.
pub(crate) fn deref_read(pointer: js::Expr) -> js::Expr {
    js::Expr::call(js::Expr::member(pointer, "get"), vec![])
}

/// `{ get: function () { return x; }, set: function ($v) { x = $v; } }` —
/// the variable stays captured by the closures, so writes through the
/// pointer are visible to direct reads.
fn accessor_pair_over_local(name: &str) -> js::Expr {
    js::Expr::Object(vec![
        js::Property::new(
            "get",
            js::Expr::func(vec![], vec![js::Stmt::ret(js::Expr::ident(name))]),
        ),
        js::Property::new(
            "set",
            js::Expr::func(
                vec!["$v".into()],
                vec![js::Stmt::expr(js::Expr::assign(
                    js::Expr::ident(name),
                    js::Expr::ident("$v"),
                ))],
            ),
        ),
    ])
}

fn shift_mask(expr: js::Expr, shift: u8) -> js::Expr {
    js::Expr::binary(
        ">>",
        js::Expr::binary("<<", expr, js::Expr::num(shift as f64)),
        js::Expr::num(shift as f64),
    )
}

fn normalize_bitop(expr: js::Expr, width: u8, signed: bool) -> js::Expr {
    if width == 32 && !signed {
        js::Expr::binary(">>>", expr, js::Expr::num(0.0))
    } else {
        expr
    }
}
