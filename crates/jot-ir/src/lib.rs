//! Intermediate representation for the jot compiler.
//!
//! This crate defines the data the external frontend (parser + type checker)
//! hands to the compiler:
//! - The definition model (`Def`, `DefId`, `DefKind`) — one entry per named
//!   declaration, with annotations, imports and direct dependencies.
//! - The typed SRC AST (`Expr`, `Stmt`) carried by function, method and
//!   value bodies.
//! - The type model (`SrcType`) with the facts emission needs (integer
//!   widths, map key kinds, named-type tags).
//! - `Program`, the `Loader` trait and `JsonLoader`, the JSON exchange
//!   format reader.
//!
//! Everything here is plain data: no phase of the compiler mutates a
//! `Program` after the loader produces it.

pub mod ast;
pub mod def;
pub mod index;
pub mod program;
pub mod types;

pub use ast::{
    BinaryOp, Builtin, Callee, ContainerKind, Expr, FieldInit, MapEntry, SelectCase, SelectOp,
    Stmt, SwitchCase, UnaryOp,
};
pub use def::{
    Def, DefFlags, DefId, DefKind, DefMeta, FileDef, FuncDef, FuncSig, MethodDef, PackageDef,
    Param, TypeDef, ValueDef,
};
pub use index::Index;
pub use program::{JsonLoader, Loader, Program};
pub use types::{Field, SrcType};
