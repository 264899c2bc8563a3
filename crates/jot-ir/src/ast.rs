//! The typed SRC AST.
//!
//! Bodies arrive from the loader fully resolved: identifiers are split into
//! locals (`Expr::Ident`) and package-level references (`Expr::DefRef`),
//! callees are discriminated (`Callee`), and the nodes whose emission
//! depends on a type fact carry that fact inline.

use serde::{Deserialize, Serialize};

use crate::def::{DefId, FuncSig};
use crate::types::SrcType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Logical not.
    Not,
    /// Bitwise complement.
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    /// `x &^ y` — bit clear.
    AndNot,
    Shl,
    Shr,
    LogAnd,
    LogOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Whether the operator produces a numeric result that may need
    /// width masking.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Sub
                | Self::Mul
                | Self::Div
                | Self::Rem
                | Self::BitAnd
                | Self::BitOr
                | Self::BitXor
                | Self::AndNot
                | Self::Shl
                | Self::Shr
        )
    }
}

/// What an index or range expression operates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Slice,
    Array,
    Map,
    String,
}

/// Builtin functions with dedicated emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Builtin {
    Len,
    Cap,
    Append,
    Copy,
    Delete,
    Panic,
    Print,
    Println,
    Close,
}

/// The resolved callee of a call expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Callee {
    /// A dynamic callee: a function value.
    Expr { expr: Box<Expr> },
    /// Direct call of a package-level function.
    Def { id: DefId },
    /// Method call. `dynamic` is true when the receiver's static type is an
    /// interface and dispatch goes through the runtime method table.
    Method {
        recv: Box<Expr>,
        id: DefId,
        #[serde(default)]
        dynamic: bool,
    },
    /// Builtin call (`len`, `append`, ...). `ty` is the static type of the
    /// principal operand, for builtins whose emission depends on it.
    Builtin {
        name: Builtin,
        #[serde(default)]
        ty: Option<SrcType>,
    },
    /// Type conversion `T(x)`.
    Conv { ty: SrcType },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInit {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Bool {
        value: bool,
    },
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    Str {
        value: String,
    },
    Nil,
    /// A local binding (parameter, local variable, receiver).
    Ident {
        name: String,
    },
    /// A package-level definition reference.
    DefRef {
        id: DefId,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        /// Result type, when masking may apply.
        #[serde(default)]
        ty: Option<SrcType>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        /// Result type, when masking may apply.
        #[serde(default)]
        ty: Option<SrcType>,
    },
    Call {
        callee: Callee,
        #[serde(default)]
        args: Vec<Expr>,
        /// `f(xs...)` — the final argument is spread.
        #[serde(default)]
        spread: bool,
    },
    /// Struct field access. `deref` is set when the base is a pointer and
    /// the access reads through it.
    Selector {
        expr: Box<Expr>,
        field: String,
        #[serde(default)]
        deref: bool,
    },
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
        container: ContainerKind,
        /// Element (or map value) type; maps need it for missing-key zero
        /// values.
        #[serde(default)]
        ty: Option<SrcType>,
    },
    SliceExpr {
        expr: Box<Expr>,
        #[serde(default)]
        lo: Option<Box<Expr>>,
        #[serde(default)]
        hi: Option<Box<Expr>>,
        #[serde(default)]
        max: Option<Box<Expr>>,
        container: ContainerKind,
    },
    /// Composite literal of a (possibly anonymous) struct type.
    StructLit {
        /// Named struct type; `None` for anonymous struct literals.
        #[serde(default)]
        ty: Option<DefId>,
        #[serde(default)]
        fields: Vec<FieldInit>,
    },
    SliceLit {
        elem: SrcType,
        #[serde(default)]
        elems: Vec<Expr>,
    },
    ArrayLit {
        elem: SrcType,
        len: u64,
        #[serde(default)]
        elems: Vec<Expr>,
    },
    MapLit {
        key: SrcType,
        value: SrcType,
        #[serde(default)]
        entries: Vec<MapEntry>,
    },
    FuncLit {
        #[serde(default)]
        sig: FuncSig,
        body: Vec<Stmt>,
    },
    /// `make([]T, len, cap)` / `make(map[K]V)` / `make(chan T, cap)`.
    Make {
        ty: SrcType,
        #[serde(default)]
        len: Option<Box<Expr>>,
        #[serde(default)]
        cap: Option<Box<Expr>>,
    },
    /// `new(T)` — pointer to a fresh zero value.
    New {
        ty: SrcType,
    },
    AddrOf {
        expr: Box<Expr>,
    },
    Deref {
        expr: Box<Expr>,
    },
    /// Channel receive `<-ch`.
    Receive {
        chan: Box<Expr>,
        #[serde(default)]
        comma_ok: bool,
        /// Element type; receives on closed channels yield its zero value.
        #[serde(default)]
        ty: Option<SrcType>,
    },
    /// Type assertion `x.(T)`.
    TypeAssert {
        expr: Box<Expr>,
        ty: SrcType,
        #[serde(default)]
        comma_ok: bool,
    },
}

impl Expr {
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str {
            value: value.into(),
        }
    }

    pub fn int(value: i64) -> Self {
        Self::Int { value }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident { name: name.into() }
    }

    pub fn def_ref(id: impl Into<String>) -> Self {
        Self::DefRef {
            id: DefId::new(id),
        }
    }

    /// Direct call of a package-level function.
    pub fn call_def(id: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: Callee::Def { id: DefId::new(id) },
            args,
            spread: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    /// Empty for the `default` case.
    #[serde(default)]
    pub exprs: Vec<Expr>,
    #[serde(default)]
    pub body: Vec<Stmt>,
    /// Control falls through into the next case.
    #[serde(default)]
    pub fallthrough: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectOp {
    Recv {
        chan: Expr,
        #[serde(default)]
        bind: Option<String>,
        #[serde(default)]
        ok: Option<String>,
    },
    Send {
        chan: Expr,
        value: Expr,
    },
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectCase {
    pub op: SelectOp,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    /// `var a, b = x, y` / `a, b := f()`. With no values, declares zero
    /// values of `ty`.
    Decl {
        names: Vec<String>,
        #[serde(default)]
        ty: Option<SrcType>,
        #[serde(default)]
        values: Vec<Expr>,
    },
    /// Plain or op-assignment. Op-assignment has exactly one operand on
    /// each side; `ty` is its result type, for overflow masking.
    Assign {
        lhs: Vec<Expr>,
        #[serde(default)]
        op: Option<BinaryOp>,
        rhs: Vec<Expr>,
        #[serde(default)]
        ty: Option<SrcType>,
    },
    IncDec {
        expr: Expr,
        inc: bool,
        /// Operand type, for overflow masking on narrow integers.
        #[serde(default)]
        ty: Option<SrcType>,
    },
    ExprStmt {
        expr: Expr,
    },
    Return {
        #[serde(default)]
        values: Vec<Expr>,
    },
    If {
        #[serde(default)]
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Vec<Stmt>,
        #[serde(default)]
        els: Option<Vec<Stmt>>,
    },
    /// Three-clause loop. All clauses optional.
    For {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        init: Option<Box<Stmt>>,
        #[serde(default)]
        cond: Option<Expr>,
        #[serde(default)]
        post: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    /// `for k, v := range x`.
    Range {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        value: Option<String>,
        expr: Expr,
        container: ContainerKind,
        body: Vec<Stmt>,
    },
    Switch {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        init: Option<Box<Stmt>>,
        #[serde(default)]
        tag: Option<Expr>,
        cases: Vec<SwitchCase>,
    },
    Break {
        #[serde(default)]
        label: Option<String>,
    },
    Continue {
        #[serde(default)]
        label: Option<String>,
    },
    Block {
        body: Vec<Stmt>,
    },
    /// Deferred call, run LIFO when the enclosing function returns.
    Defer {
        call: Expr,
    },
    /// Spawn: enqueue the call on the run queue.
    Go {
        call: Expr,
    },
    /// Channel send `ch <- v`.
    Send {
        chan: Expr,
        value: Expr,
    },
    Select {
        cases: Vec<SelectCase>,
    },
    Empty,
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Self::ExprStmt { expr }
    }

    pub fn ret(values: Vec<Expr>) -> Self {
        Self::Return { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_json_shape() {
        let call = Expr::call_def("util.Hello", vec![Expr::str("hi")]);
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["kind"], "call");
        assert_eq!(json["callee"]["kind"], "def");
        assert_eq!(json["callee"]["id"], "util.Hello");
        assert_eq!(json["args"][0]["value"], "hi");
    }

    #[test]
    fn stmt_defaults_omitted_in_json_round_trip() {
        let json = r#"{ "kind": "return" }"#;
        let stmt: Stmt = serde_json::from_str(json).unwrap();
        assert_eq!(stmt, Stmt::Return { values: vec![] });

        let json = r#"{ "kind": "for", "body": [] }"#;
        let stmt: Stmt = serde_json::from_str(json).unwrap();
        match stmt {
            Stmt::For {
                label,
                init,
                cond,
                post,
                body,
            } => {
                assert!(label.is_none() && init.is_none() && cond.is_none() && post.is_none());
                assert!(body.is_empty());
            }
            other => panic!("expected for, got {other:?}"),
        }
    }
}
