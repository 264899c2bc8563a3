//! Named-type emission, zero values, conversions and type assertions.
//!
//! A named struct type that carries methods becomes a constructor function
//! setting its fields and runtime type tag; methodless named types become
//! plain descriptor objects and their composite literals emit tagged object
//! literals directly. Interfaces emit a descriptor carrying their method
//! name list, used by interface type assertions.

use jot_common::TranslationError;
use jot_ir::{Def, Expr as IrExpr, Field, SrcType, TypeDef};
use jot_jsast as js;

use crate::runtime::Helper;
use crate::{Ctx, Translator, mangle};

impl<'a> Translator<'a> {
    pub(crate) fn translate_type(
        &self,
        ctx: &mut Ctx<'_>,
        def: &Def,
        t: &TypeDef,
    ) -> Result<Vec<js::Stmt>, TranslationError> {
        let name = mangle::mangled_name(self.index, def);
        let tag = mangle::type_tag(def.id());

        let mut stmts = Vec::new();
        match self.underlying(&t.ty) {
            SrcType::Struct { fields } if t.has_methods => {
                stmts.push(self.constructor_decl(&name, &tag, fields));
            }
            SrcType::Interface { methods } => {
                let names = methods
                    .iter()
                    .map(|m| js::Expr::str(m.clone()))
                    .collect::<Vec<_>>();
                stmts.push(js::Stmt::var(
                    &name,
                    js::Expr::Object(vec![js::Property::new("$iface", js::Expr::Array(names))]),
                ));
            }
            _ => {
                stmts.push(js::Stmt::var(
                    &name,
                    js::Expr::Object(vec![js::Property::new("$type", js::Expr::str(&tag))]),
                ));
            }
        }

        if t.has_methods {
            // The method table the type's methods register into.
            ctx.helpers.insert(Helper::Mtab);
            stmts.push(js::Stmt::expr(js::Expr::assign(
                js::Expr::member_str(js::Expr::ident("$mtab"), tag),
                js::Expr::Object(vec![]),
            )));
        }
        Ok(stmts)
    }

    /// `var T = function (f1, f2) { this.f1 = f1; ... this.$type = tag; };`
    fn constructor_decl(&self, name: &str, tag: &str, fields: &[Field]) -> js::Stmt {
        let params: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
        let mut body: Vec<js::Stmt> = fields
            .iter()
            .map(|f| {
                js::Stmt::expr(js::Expr::assign(
                    js::Expr::member(js::Expr::This, &f.name),
                    js::Expr::ident(&f.name),
                ))
            })
            .collect();
        body.push(js::Stmt::expr(js::Expr::assign(
            js::Expr::member(js::Expr::This, "$type"),
            js::Expr::str(tag),
        )));
        js::Stmt::var(name, js::Expr::func(params, body))
    }

    /// Resolve a type through named-type indirection to its structural
    /// underlying type.
    pub(crate) fn underlying<'t>(&self, ty: &'t SrcType) -> &'t SrcType
    where
        'a: 't,
    {
        let mut ty = ty;
        loop {
            match ty {
                SrcType::Named { id } => match self.index.lookup(id) {
                    Some(Def::Type(t)) => ty = &t.ty,
                    _ => return ty,
                },
                other => return other,
            }
        }
    }

    /// Integer width and signedness of a type, resolving named types.
    pub(crate) fn int_facts(&self, ty: Option<&SrcType>) -> Option<(u8, bool)> {
        match self.underlying(ty?) {
            SrcType::Int { width, signed } => Some((*width, *signed)),
            _ => None,
        }
    }

    /// The zero value of a type, as a JS expression.
    pub(crate) fn zero_value(
        &self,
        ctx: &mut Ctx<'_>,
        ty: &SrcType,
    ) -> Result<js::Expr, TranslationError> {
        match ty {
            SrcType::Bool => Ok(js::Expr::Bool(false)),
            SrcType::Int { .. } | SrcType::Float { .. } => Ok(js::Expr::num(0.0)),
            SrcType::String => Ok(js::Expr::str("")),
            SrcType::Slice { .. }
            | SrcType::Map { .. }
            | SrcType::Pointer { .. }
            | SrcType::Func
            | SrcType::Chan { .. }
            | SrcType::Interface { .. } => Ok(js::Expr::Null),
            SrcType::Array { elem, len } => {
                ctx.helpers.insert(Helper::ZeroArray);
                let zero = self.zero_value(ctx, elem)?;
                Ok(js::Expr::call(
                    js::Expr::ident("$zeroarray"),
                    vec![
                        js::Expr::num(*len as f64),
                        js::Expr::func(vec![], vec![js::Stmt::ret(zero)]),
                    ],
                ))
            }
            SrcType::Struct { fields } => {
                let mut props = Vec::with_capacity(fields.len());
                for field in fields {
                    let zero = self.zero_value(ctx, &field.ty)?;
                    props.push(js::Property::new(&field.name, zero));
                }
                Ok(js::Expr::Object(props))
            }
            SrcType::Named { id } => {
                let def = self
                    .index
                    .lookup(id)
                    .ok_or_else(|| ctx.unresolved(id.as_str()))?;
                let Def::Type(t) = def else {
                    return Err(ctx.unresolved(id.as_str()));
                };
                match self.underlying(&t.ty) {
                    SrcType::Struct { fields } if t.has_methods => {
                        let ctor = self.def_ref_expr(ctx, id)?;
                        let mut args = Vec::with_capacity(fields.len());
                        let fields = fields.clone();
                        for field in &fields {
                            args.push(self.zero_value(ctx, &field.ty)?);
                        }
                        Ok(js::Expr::new_expr(ctor, args))
                    }
                    SrcType::Struct { fields } => {
                        let fields = fields.clone();
                        let mut props = Vec::with_capacity(fields.len() + 1);
                        for field in &fields {
                            let zero = self.zero_value(ctx, &field.ty)?;
                            props.push(js::Property::new(&field.name, zero));
                        }
                        props.push(js::Property::new(
                            "$type",
                            js::Expr::str(mangle::type_tag(id)),
                        ));
                        Ok(js::Expr::Object(props))
                    }
                    other => {
                        let other = other.clone();
                        self.zero_value(ctx, &other)
                    }
                }
            }
        }
    }

    /// Type conversion `T(x)`.
    pub(crate) fn translate_conv(
        &self,
        ctx: &mut Ctx<'_>,
        ty: &SrcType,
        args: &[IrExpr],
    ) -> Result<js::Expr, TranslationError> {
        let [arg] = args else {
            return Err(ctx.unsupported("conversion with more than one operand"));
        };
        let value = self.translate_expr(ctx, arg)?;

        match self.underlying(ty) {
            SrcType::Int { width, signed } => {
                let (width, signed) = (*width, *signed);
                Ok(self.mask_int(ctx, value, width, signed, true))
            }
            SrcType::String => match arg {
                // string(b) over a byte slice decodes; string(r) over an
                // integer produces the code point.
                _ if self.is_byte_slice_expr(arg) => {
                    ctx.helpers.insert(Helper::StrBytes);
                    Ok(js::Expr::call(
                        js::Expr::ident("$bytestostring"),
                        vec![value],
                    ))
                }
                _ => Ok(js::Expr::call(
                    js::Expr::member(js::Expr::ident("String"), "fromCharCode"),
                    vec![value],
                )),
            },
            SrcType::Slice { elem } => match self.underlying(elem) {
                SrcType::Int { width: 8, .. } if self.is_string_expr(arg) => {
                    ctx.helpers.insert(Helper::StrBytes);
                    Ok(js::Expr::call(
                        js::Expr::ident("$stringtobytes"),
                        vec![value],
                    ))
                }
                _ => Ok(value),
            },
            // Floats, bools, interfaces, pointers, funcs, named identity
            // conversions: the representation is unchanged.
            _ => Ok(value),
        }
    }

    fn is_byte_slice_expr(&self, expr: &IrExpr) -> bool {
        match self.static_type_of(expr) {
            Some(ty) => matches!(self.underlying(&ty), SrcType::Slice { .. }),
            None => false,
        }
    }

    fn is_string_expr(&self, expr: &IrExpr) -> bool {
        if matches!(expr, IrExpr::Str { .. }) {
            return true;
        }
        match self.static_type_of(expr) {
            Some(ty) => matches!(self.underlying(&ty), SrcType::String),
            None => false,
        }
    }

    /// Best-effort static type of an expression, from the facts the loader
    /// left on the node. Only used to discriminate conversions.
    fn static_type_of(&self, expr: &IrExpr) -> Option<SrcType> {
        match expr {
            IrExpr::Str { .. } => Some(SrcType::String),
            IrExpr::Bool { .. } => Some(SrcType::Bool),
            IrExpr::Binary { ty, .. } | IrExpr::Unary { ty, .. } => ty.clone(),
            IrExpr::SliceLit { elem, .. } => Some(SrcType::slice_of(elem.clone())),
            IrExpr::Index { ty, .. } => ty.clone(),
            IrExpr::Make { ty, .. } => Some(ty.clone()),
            IrExpr::Receive { ty, .. } => ty.clone(),
            IrExpr::TypeAssert { ty, comma_ok, .. } if !comma_ok => Some(ty.clone()),
            _ => None,
        }
    }

    /// Type assertion `x.(T)`.
    pub(crate) fn translate_assert(
        &self,
        ctx: &mut Ctx<'_>,
        expr: &IrExpr,
        ty: &SrcType,
        comma_ok: bool,
    ) -> Result<js::Expr, TranslationError> {
        let value = self.translate_expr(ctx, expr)?;
        match ty {
            SrcType::Named { id } => {
                ctx.helpers.insert(Helper::Assert);
                let tag = js::Expr::str(mangle::type_tag(id));
                if comma_ok {
                    let zero = self.zero_value(ctx, ty)?;
                    Ok(js::Expr::call(
                        js::Expr::ident("$assert2"),
                        vec![value, tag, zero],
                    ))
                } else {
                    Ok(js::Expr::call(js::Expr::ident("$assert"), vec![value, tag]))
                }
            }
            SrcType::Interface { methods } => {
                ctx.helpers.insert(Helper::IfaceAssert);
                let names = js::Expr::Array(
                    methods.iter().map(|m| js::Expr::str(m.clone())).collect(),
                );
                if comma_ok {
                    Ok(js::Expr::call(
                        js::Expr::ident("$iassert2"),
                        vec![value, names, js::Expr::Null],
                    ))
                } else {
                    Ok(js::Expr::call(
                        js::Expr::ident("$iassert"),
                        vec![value, names],
                    ))
                }
            }
            _ => Err(ctx.unsupported("type assertion to an unnamed non-interface type")),
        }
    }
}
