//! JavaScript AST model.
//!
//! A tagged-variant tree covering the surface the translator and bundler
//! construct. It is data only; `printer` stringifies a `Program`
//! deterministically. `Raw` variants carry verbatim text for raw-file
//! definitions and runtime helper bodies.

pub mod printer;

pub use printer::{Printer, print_expression};

/// A property key in an object literal.
#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Ident(String),
    Str(String),
}

/// An object literal property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropKey,
    pub value: Expr,
}

impl Property {
    pub fn new(key: impl Into<String>, value: Expr) -> Self {
        Self {
            key: PropKey::Ident(key.into()),
            value,
        }
    }
}

/// A switch case; `test` of `None` is `default:`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    This,
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
        computed: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Assign {
        op: &'static str,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Binary {
        op: &'static str,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: &'static str,
        arg: Box<Expr>,
    },
    Update {
        op: &'static str,
        arg: Box<Expr>,
        prefix: bool,
    },
    Cond {
        test: Box<Expr>,
        cons: Box<Expr>,
        alt: Box<Expr>,
    },
    Function {
        name: Option<String>,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    Array(Vec<Expr>),
    Object(Vec<Property>),
    Seq(Vec<Expr>),
    /// Verbatim expression text, inserted as-is.
    Raw(String),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    pub fn num(value: f64) -> Self {
        Self::Num(value)
    }

    /// `object.name`
    pub fn member(object: Expr, name: impl Into<String>) -> Self {
        Self::Member {
            object: Box::new(object),
            property: Box::new(Self::Ident(name.into())),
            computed: false,
        }
    }

    /// `object["key"]`
    pub fn member_str(object: Expr, key: impl Into<String>) -> Self {
        Self::Member {
            object: Box::new(object),
            property: Box::new(Self::Str(key.into())),
            computed: true,
        }
    }

    /// `object[index]`
    pub fn member_computed(object: Expr, index: Expr) -> Self {
        Self::Member {
            object: Box::new(object),
            property: Box::new(index),
            computed: true,
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn new_expr(callee: Expr, args: Vec<Expr>) -> Self {
        Self::New {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::Assign {
            op: "=",
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn binary(op: &'static str, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: &'static str, arg: Expr) -> Self {
        Self::Unary {
            op,
            arg: Box::new(arg),
        }
    }

    pub fn cond(test: Expr, cons: Expr, alt: Expr) -> Self {
        Self::Cond {
            test: Box::new(test),
            cons: Box::new(cons),
            alt: Box::new(alt),
        }
    }

    /// An anonymous function expression.
    pub fn func(params: Vec<String>, body: Vec<Stmt>) -> Self {
        Self::Function {
            name: None,
            params,
            body,
        }
    }

    /// `(function () { body })()` — the bundler's module wrapper shape.
    pub fn iife(body: Vec<Stmt>) -> Self {
        Self::call(Self::func(vec![], body), vec![])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// `var name = init;` — one declarator per statement.
    Var {
        name: String,
        init: Option<Expr>,
    },
    Return(Option<Expr>),
    If {
        test: Expr,
        then: Vec<Stmt>,
        els: Option<Vec<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Vec<Stmt>,
    },
    ForIn {
        name: String,
        object: Expr,
        body: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    Switch {
        disc: Expr,
        cases: Vec<SwitchCase>,
    },
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expr),
    Try {
        block: Vec<Stmt>,
        /// `(param, body)` of the catch clause.
        handler: Option<(String, Vec<Stmt>)>,
        finalizer: Option<Vec<Stmt>>,
    },
    Block(Vec<Stmt>),
    Empty,
    /// Verbatim statement text, printed line by line at the current
    /// indentation.
    Raw(String),
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Self::Expr(expr)
    }

    pub fn var(name: impl Into<String>, init: Expr) -> Self {
        Self::Var {
            name: name.into(),
            init: Some(init),
        }
    }

    pub fn ret(expr: Expr) -> Self {
        Self::Return(Some(expr))
    }
}

/// A complete JS program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }

    /// Deterministic pretty-printed source text.
    pub fn to_source(&self) -> String {
        let mut printer = Printer::new();
        printer.print_program(self);
        printer.finish()
    }
}
