//! Builtin call emission.
//!
//! `len`/`cap` dispatch on the operand's container; `append`, `copy`,
//! `delete` and `close` map onto their runtime helpers; `panic`, `print`
//! and `println` onto the host bindings.

use jot_common::TranslationError;
use jot_ir::{Builtin, Expr as IrExpr, SrcType};
use jot_jsast as js;

use crate::runtime::Helper;
use crate::{Ctx, Translator};

impl<'a> Translator<'a> {
    pub(crate) fn translate_builtin(
        &self,
        ctx: &mut Ctx<'_>,
        name: Builtin,
        ty: Option<&SrcType>,
        args: &[IrExpr],
        spread: bool,
    ) -> Result<js::Expr, TranslationError> {
        if spread && name != Builtin::Append {
            return Err(ctx.unsupported("argument spread into this builtin"));
        }

        match name {
            Builtin::Len => {
                let [arg] = args else {
                    return Err(ctx.unsupported("len arity"));
                };
                let value = self.translate_expr(ctx, arg)?;
                match ty.map(|ty| self.underlying(ty).clone()) {
                    Some(SrcType::String) | Some(SrcType::Array { .. }) => {
                        Ok(js::Expr::member(value, "length"))
                    }
                    Some(SrcType::Map { .. }) => {
                        ctx.helpers.insert(Helper::MapCore);
                        Ok(js::Expr::call(js::Expr::ident("$maplen"), vec![value]))
                    }
                    Some(SrcType::Chan { .. }) => Ok(js::Expr::member(
                        js::Expr::member(value, "buf"),
                        "length",
                    )),
                    // Slices, and untyped operands where the loader left no
                    // fact: the nil-tolerant slice length.
                    _ => {
                        ctx.helpers.insert(Helper::SliceCore);
                        Ok(js::Expr::call(js::Expr::ident("$slen"), vec![value]))
                    }
                }
            }
            Builtin::Cap => {
                let [arg] = args else {
                    return Err(ctx.unsupported("cap arity"));
                };
                let value = self.translate_expr(ctx, arg)?;
                match ty.map(|ty| self.underlying(ty).clone()) {
                    Some(SrcType::Array { .. }) => Ok(js::Expr::member(value, "length")),
                    Some(SrcType::Chan { .. }) => Ok(js::Expr::member(value, "cap")),
                    _ => {
                        ctx.helpers.insert(Helper::SliceCore);
                        Ok(js::Expr::call(js::Expr::ident("$scap"), vec![value]))
                    }
                }
            }
            Builtin::Append => {
                ctx.helpers.insert(Helper::Append);
                let mut args_js = self.translate_exprs(ctx, args)?;
                if spread {
                    let last = args_js
                        .pop()
                        .ok_or_else(|| ctx.unsupported("append with no arguments"))?;
                    return Ok(self.apply_call(
                        ctx,
                        js::Expr::ident("$append"),
                        args_js,
                        last,
                    ));
                }
                Ok(js::Expr::call(js::Expr::ident("$append"), args_js))
            }
            Builtin::Copy => {
                ctx.helpers.insert(Helper::Copy);
                let args_js = self.translate_exprs(ctx, args)?;
                Ok(js::Expr::call(js::Expr::ident("$copy"), args_js))
            }
            Builtin::Delete => {
                ctx.helpers.insert(Helper::MapCore);
                let args_js = self.translate_exprs(ctx, args)?;
                Ok(js::Expr::call(js::Expr::ident("$mapdelete"), args_js))
            }
            Builtin::Panic => {
                ctx.helpers.insert(Helper::Panic);
                let args_js = self.translate_exprs(ctx, args)?;
                Ok(js::Expr::call(js::Expr::ident("$panic"), args_js))
            }
            Builtin::Print => {
                ctx.helpers.insert(Helper::Print);
                let args_js = self.translate_exprs(ctx, args)?;
                Ok(js::Expr::call(js::Expr::ident("$print"), args_js))
            }
            Builtin::Println => {
                ctx.helpers.insert(Helper::Print);
                let args_js = self.translate_exprs(ctx, args)?;
                Ok(js::Expr::call(js::Expr::ident("$println"), args_js))
            }
            Builtin::Close => {
                ctx.helpers.insert(Helper::Chan);
                let args_js = self.translate_exprs(ctx, args)?;
                Ok(js::Expr::call(js::Expr::ident("$close"), args_js))
            }
        }
    }
}
