//! The definition model.
//!
//! A `Def` is the atomic unit of compilation: one named declaration.
//! The loader indexes every declaration of the program as a `Def` with a
//! stable ID, its annotations parsed into fields, its import table, and the
//! IDs of the definitions its body and signature reference directly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::{Expr, Stmt};
use crate::types::SrcType;

/// Globally unique, stable definition identity: `path.name` for
/// package-level declarations, `path.Recv.name` for methods.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefId(pub String);

impl DefId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DefId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which variant a definition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DefKind {
    Package,
    Func,
    Method,
    Type,
    Value,
    File,
}

bitflags::bitflags! {
    /// Per-definition emission flags, parsed by the loader from the
    /// declaration's annotations and visibility.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct DefFlags: u8 {
        /// Visible outside its package.
        const EXPORTED = 1 << 0;
        /// Present for type resolution but emitted nowhere
        /// (`js:"name,omit"`).
        const OMITTED = 1 << 1;
    }
}

/// Fields common to every definition variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefMeta {
    pub id: DefId,
    pub name: String,
    /// Declaring package path.
    pub path: String,
    #[serde(default)]
    pub flags: DefFlags,
    /// `js:"<name>"` — override for the emitted name.
    #[serde(default)]
    pub js_name: Option<String>,
    /// `jsrewrite:"<template>"` — call-site substitution template.
    #[serde(default)]
    pub rewrite: Option<String>,
    /// Local import alias → declaring package path, for every package this
    /// declaration references.
    #[serde(default)]
    pub imports: IndexMap<String, String>,
    /// IDs of the definitions directly referenced by this declaration's
    /// body and signature.
    #[serde(default)]
    pub deps: Vec<DefId>,
}

impl DefMeta {
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: DefId::new(id),
            name: name.into(),
            path: path.into(),
            flags: DefFlags::empty(),
            js_name: None,
            rewrite: None,
            imports: IndexMap::new(),
            deps: Vec::new(),
        }
    }
}

/// A named container. Packages carry no body of their own; they exist so
/// that import aliases resolve to something in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDef {
    pub meta: DefMeta,
}

/// A function signature: parameter names with types, and result types.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FuncSig {
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub results: Vec<SrcType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: SrcType,
}

/// A free function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDef {
    pub meta: DefMeta,
    #[serde(default)]
    pub sig: FuncSig,
    /// Absent for annotated host-API stubs whose bodies translate away.
    #[serde(default)]
    pub body: Option<Vec<Stmt>>,
}

/// A function attached to a named receiver type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub meta: DefMeta,
    /// ID of the receiver type definition.
    pub recv: DefId,
    /// The receiver binding name inside the body (`e` in `func (e *Elem)`).
    pub recv_name: String,
    #[serde(default)]
    pub sig: FuncSig,
    #[serde(default)]
    pub body: Option<Vec<Stmt>>,
}

/// A named type declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub meta: DefMeta,
    /// The declared underlying type.
    pub ty: SrcType,
    /// Whether any method in the program has this type as receiver. Decides
    /// the runtime representation (constructor function vs. plain object).
    #[serde(default)]
    pub has_methods: bool,
}

/// A top-level constant or variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDef {
    pub meta: DefMeta,
    #[serde(default)]
    pub ty: Option<SrcType>,
    /// Initializer; absent means the zero value of `ty`.
    #[serde(default)]
    pub value: Option<Expr>,
    #[serde(default)]
    pub konst: bool,
}

/// A raw foreign-code file: an opaque block of pre-written JavaScript
/// inserted verbatim. Used to bind host APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDef {
    pub meta: DefMeta,
    pub source: String,
}

/// The atomic unit of compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum Def {
    Package(PackageDef),
    Func(FuncDef),
    Method(MethodDef),
    Type(TypeDef),
    Value(ValueDef),
    File(FileDef),
}

impl Def {
    pub fn meta(&self) -> &DefMeta {
        match self {
            Self::Package(d) => &d.meta,
            Self::Func(d) => &d.meta,
            Self::Method(d) => &d.meta,
            Self::Type(d) => &d.meta,
            Self::Value(d) => &d.meta,
            Self::File(d) => &d.meta,
        }
    }

    pub fn id(&self) -> &DefId {
        &self.meta().id
    }

    pub fn name(&self) -> &str {
        &self.meta().name
    }

    /// Declaring package path.
    pub fn path(&self) -> &str {
        &self.meta().path
    }

    pub fn kind(&self) -> DefKind {
        match self {
            Self::Package(_) => DefKind::Package,
            Self::Func(_) => DefKind::Func,
            Self::Method(_) => DefKind::Method,
            Self::Type(_) => DefKind::Type,
            Self::Value(_) => DefKind::Value,
            Self::File(_) => DefKind::File,
        }
    }

    pub fn exported(&self) -> bool {
        self.meta().flags.contains(DefFlags::EXPORTED)
    }

    pub fn omitted(&self) -> bool {
        self.meta().flags.contains(DefFlags::OMITTED)
    }

    /// Local import alias → package path for this declaration.
    pub fn imports(&self) -> &IndexMap<String, String> {
        &self.meta().imports
    }

    /// IDs of the definitions this declaration references directly.
    pub fn deps(&self) -> &[DefId] {
        &self.meta().deps
    }

    /// The receiver type ID, for methods.
    pub fn recv(&self) -> Option<&DefId> {
        match self {
            Self::Method(m) => Some(&m.recv),
            _ => None,
        }
    }

    /// The `jsrewrite` template, when one is attached.
    pub fn rewrite(&self) -> Option<&str> {
        self.meta().rewrite.as_deref()
    }
}
