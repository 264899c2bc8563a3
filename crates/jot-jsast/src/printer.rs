//! Deterministic pretty-printer for the JS AST.
//!
//! Precedence-aware: child expressions are parenthesized exactly when their
//! precedence is below what the parent position requires, so output parses
//! back to the same tree. Function and object expressions at statement
//! start are wrapped in parens.

use crate::{Expr, Program, PropKey, Stmt, SwitchCase};

// Operator precedence levels. Higher binds tighter.
const PREC_SEQ: u8 = 1;
const PREC_ASSIGN: u8 = 2;
const PREC_COND: u8 = 3;
const PREC_LOGICAL_OR: u8 = 4;
const PREC_LOGICAL_AND: u8 = 5;
const PREC_BIT_OR: u8 = 6;
const PREC_BIT_XOR: u8 = 7;
const PREC_BIT_AND: u8 = 8;
const PREC_EQUALITY: u8 = 9;
const PREC_RELATIONAL: u8 = 10;
const PREC_SHIFT: u8 = 11;
const PREC_ADDITIVE: u8 = 12;
const PREC_MULTIPLICATIVE: u8 = 13;
const PREC_UNARY: u8 = 14;
const PREC_POSTFIX: u8 = 15;
const PREC_CALL: u8 = 16;
const PREC_MEMBER: u8 = 17;
const PREC_PRIMARY: u8 = 18;

fn binary_prec(op: &str) -> u8 {
    match op {
        "||" => PREC_LOGICAL_OR,
        "&&" => PREC_LOGICAL_AND,
        "|" => PREC_BIT_OR,
        "^" => PREC_BIT_XOR,
        "&" => PREC_BIT_AND,
        "==" | "!=" | "===" | "!==" => PREC_EQUALITY,
        "<" | ">" | "<=" | ">=" | "instanceof" | "in" => PREC_RELATIONAL,
        "<<" | ">>" | ">>>" => PREC_SHIFT,
        "+" | "-" => PREC_ADDITIVE,
        "*" | "/" | "%" => PREC_MULTIPLICATIVE,
        _ => PREC_PRIMARY,
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Seq(_) => PREC_SEQ,
        Expr::Assign { .. } => PREC_ASSIGN,
        Expr::Cond { .. } => PREC_COND,
        Expr::Binary { op, .. } => binary_prec(op),
        Expr::Unary { .. } => PREC_UNARY,
        Expr::Update { prefix, .. } => {
            if *prefix {
                PREC_UNARY
            } else {
                PREC_POSTFIX
            }
        }
        Expr::Call { .. } | Expr::New { .. } => PREC_CALL,
        Expr::Member { .. } => PREC_MEMBER,
        _ => PREC_PRIMARY,
    }
}

/// True when the expression's leftmost token would be `function` or `{`,
/// which are mis-parsed at statement start.
fn starts_ambiguously(expr: &Expr) -> bool {
    match expr {
        Expr::Function { .. } | Expr::Object(_) => true,
        // A call whose callee is a function expression already prints with
        // the callee parenthesized.
        Expr::Call { callee, .. } => {
            !matches!(**callee, Expr::Function { .. }) && starts_ambiguously(callee)
        }
        Expr::Member { object, .. } => starts_ambiguously(object),
        Expr::Binary { left, .. } => starts_ambiguously(left),
        Expr::Assign { target, .. } => starts_ambiguously(target),
        Expr::Cond { test, .. } => starts_ambiguously(test),
        Expr::Seq(exprs) => exprs.first().is_some_and(starts_ambiguously),
        Expr::Update {
            arg, prefix: false, ..
        } => starts_ambiguously(arg),
        _ => false,
    }
}

/// Print a single expression to text. Used to splice already-translated
/// arguments into rewrite templates.
pub fn print_expression(expr: &Expr) -> String {
    let mut printer = Printer::new();
    printer.print_expr(expr, PREC_SEQ);
    printer.finish()
}

pub struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn write_line(&mut self) {
        self.out.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn increase_indent(&mut self) {
        self.indent += 1;
    }

    fn decrease_indent(&mut self) {
        self.indent -= 1;
    }

    // =========================================================================
    // Program and statements
    // =========================================================================

    pub fn print_program(&mut self, program: &Program) {
        for stmt in &program.body {
            self.print_stmt(stmt);
        }
    }

    fn print_body(&mut self, body: &[Stmt]) {
        self.write("{");
        self.write_line();
        self.increase_indent();
        for stmt in body {
            self.print_stmt(stmt);
        }
        self.decrease_indent();
        self.write_indent();
        self.write("}");
    }

    fn print_stmt(&mut self, stmt: &Stmt) {
        self.write_indent();
        self.print_stmt_bare(stmt);
        self.write_line();
    }

    fn print_stmt_bare(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => {
                if starts_ambiguously(expr) {
                    self.write("(");
                    self.print_expr(expr, PREC_SEQ);
                    self.write(")");
                } else {
                    self.print_expr(expr, PREC_SEQ);
                }
                self.write(";");
            }
            Stmt::Var { name, init } => {
                self.write("var ");
                self.write(name);
                if let Some(init) = init {
                    self.write(" = ");
                    self.print_expr(init, PREC_ASSIGN);
                }
                self.write(";");
            }
            Stmt::Return(arg) => {
                self.write("return");
                if let Some(arg) = arg {
                    self.write(" ");
                    self.print_expr(arg, PREC_SEQ);
                }
                self.write(";");
            }
            Stmt::If { test, then, els } => {
                self.write("if (");
                self.print_expr(test, PREC_SEQ);
                self.write(") ");
                self.print_body(then);
                if let Some(els) = els {
                    self.write(" else ");
                    // `else if` chains print flat.
                    if let [Stmt::If { .. }] = els.as_slice() {
                        self.print_stmt_bare(&els[0]);
                        return;
                    }
                    self.print_body(els);
                }
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                self.write("for (");
                if let Some(init) = init {
                    self.print_for_init(init);
                }
                self.write("; ");
                if let Some(test) = test {
                    self.print_expr(test, PREC_SEQ);
                }
                self.write("; ");
                if let Some(update) = update {
                    self.print_expr(update, PREC_SEQ);
                }
                self.write(") ");
                self.print_body(body);
            }
            Stmt::ForIn { name, object, body } => {
                self.write("for (var ");
                self.write(name);
                self.write(" in ");
                self.print_expr(object, PREC_SEQ);
                self.write(") ");
                self.print_body(body);
            }
            Stmt::While { test, body } => {
                self.write("while (");
                self.print_expr(test, PREC_SEQ);
                self.write(") ");
                self.print_body(body);
            }
            Stmt::Switch { disc, cases } => {
                self.write("switch (");
                self.print_expr(disc, PREC_SEQ);
                self.write(") {");
                self.write_line();
                self.increase_indent();
                for case in cases {
                    self.print_switch_case(case);
                }
                self.decrease_indent();
                self.write_indent();
                self.write("}");
            }
            Stmt::Labeled { label, body } => {
                self.write(label);
                self.write(": ");
                self.print_stmt_bare(body);
            }
            Stmt::Break(label) => {
                self.write("break");
                if let Some(label) = label {
                    self.write(" ");
                    self.write(label);
                }
                self.write(";");
            }
            Stmt::Continue(label) => {
                self.write("continue");
                if let Some(label) = label {
                    self.write(" ");
                    self.write(label);
                }
                self.write(";");
            }
            Stmt::Throw(arg) => {
                self.write("throw ");
                self.print_expr(arg, PREC_SEQ);
                self.write(";");
            }
            Stmt::Try {
                block,
                handler,
                finalizer,
            } => {
                self.write("try ");
                self.print_body(block);
                if let Some((param, body)) = handler {
                    self.write(" catch (");
                    self.write(param);
                    self.write(") ");
                    self.print_body(body);
                }
                if let Some(finalizer) = finalizer {
                    self.write(" finally ");
                    self.print_body(finalizer);
                }
            }
            Stmt::Block(body) => {
                self.print_body(body);
            }
            Stmt::Empty => {
                self.write(";");
            }
            Stmt::Raw(text) => {
                // Verbatim lines, re-indented to the current level.
                let mut first = true;
                for line in text.lines() {
                    if !first {
                        self.write_line();
                        if !line.is_empty() {
                            self.write_indent();
                        }
                    }
                    self.write(line);
                    first = false;
                }
            }
        }
    }

    /// A for-loop init clause: a statement printed without its terminator.
    fn print_for_init(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Var { name, init } => {
                self.write("var ");
                self.write(name);
                if let Some(init) = init {
                    self.write(" = ");
                    self.print_expr(init, PREC_ASSIGN);
                }
            }
            Stmt::Expr(expr) => self.print_expr(expr, PREC_SEQ),
            other => {
                debug_assert!(false, "unsupported for-init statement: {other:?}");
            }
        }
    }

    fn print_switch_case(&mut self, case: &SwitchCase) {
        self.write_indent();
        match &case.test {
            Some(test) => {
                self.write("case ");
                self.print_expr(test, PREC_SEQ);
                self.write(":");
            }
            None => self.write("default:"),
        }
        self.write_line();
        self.increase_indent();
        for stmt in &case.body {
            self.print_stmt(stmt);
        }
        self.decrease_indent();
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn print_expr(&mut self, expr: &Expr, min_prec: u8) {
        let prec = precedence(expr);
        let parens = prec < min_prec;
        if parens {
            self.write("(");
        }
        self.print_expr_bare(expr);
        if parens {
            self.write(")");
        }
    }

    fn print_expr_bare(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(name) => self.write(name),
            Expr::Str(value) => {
                let escaped = escape_string(value);
                self.write(&escaped);
            }
            Expr::Num(value) => {
                let text = format_number(*value);
                self.write(&text);
            }
            Expr::Bool(value) => self.write(if *value { "true" } else { "false" }),
            Expr::Null => self.write("null"),
            Expr::This => self.write("this"),
            Expr::Member {
                object,
                property,
                computed,
            } => {
                // Number literals need parens before `.` to avoid parsing
                // the dot as a decimal point.
                if matches!(**object, Expr::Num(_)) {
                    self.write("(");
                    self.print_expr_bare(object);
                    self.write(")");
                } else {
                    self.print_expr(object, PREC_MEMBER);
                }
                if *computed {
                    self.write("[");
                    self.print_expr(property, PREC_SEQ);
                    self.write("]");
                } else {
                    self.write(".");
                    self.print_expr_bare(property);
                }
            }
            Expr::Call { callee, args } => {
                if matches!(**callee, Expr::Function { .. }) {
                    self.write("(");
                    self.print_expr_bare(callee);
                    self.write(")");
                } else {
                    self.print_expr(callee, PREC_CALL);
                }
                self.print_args(args);
            }
            Expr::New { callee, args } => {
                self.write("new ");
                self.print_expr(callee, PREC_MEMBER);
                self.print_args(args);
            }
            Expr::Assign { op, target, value } => {
                self.print_expr(target, PREC_POSTFIX);
                self.write(" ");
                self.write(op);
                self.write(" ");
                self.print_expr(value, PREC_ASSIGN);
            }
            Expr::Binary { op, left, right } => {
                let prec = binary_prec(op);
                self.print_expr(left, prec);
                self.write(" ");
                self.write(op);
                self.write(" ");
                self.print_expr(right, prec + 1);
            }
            Expr::Unary { op, arg } => {
                self.write(op);
                if op.chars().all(|c| c.is_ascii_alphabetic()) {
                    self.write(" ");
                }
                self.print_expr(arg, PREC_UNARY);
            }
            Expr::Update { op, arg, prefix } => {
                if *prefix {
                    self.write(op);
                    self.print_expr(arg, PREC_UNARY);
                } else {
                    self.print_expr(arg, PREC_POSTFIX);
                    self.write(op);
                }
            }
            Expr::Cond { test, cons, alt } => {
                self.print_expr(test, PREC_COND + 1);
                self.write(" ? ");
                self.print_expr(cons, PREC_ASSIGN);
                self.write(" : ");
                self.print_expr(alt, PREC_ASSIGN);
            }
            Expr::Function { name, params, body } => {
                self.write("function ");
                if let Some(name) = name {
                    self.write(name);
                }
                self.write("(");
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(param);
                }
                self.write(") ");
                self.print_body(body);
            }
            Expr::Array(elems) => {
                self.write("[");
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.print_expr(elem, PREC_ASSIGN);
                }
                self.write("]");
            }
            Expr::Object(props) => {
                if props.is_empty() {
                    self.write("{}");
                    return;
                }
                self.write("{ ");
                for (i, prop) in props.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    match &prop.key {
                        PropKey::Ident(name) => self.write(name),
                        PropKey::Str(value) => {
                            let escaped = escape_string(value);
                            self.write(&escaped);
                        }
                    }
                    self.write(": ");
                    self.print_expr(&prop.value, PREC_ASSIGN);
                }
                self.write(" }");
            }
            Expr::Seq(exprs) => {
                for (i, expr) in exprs.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.print_expr(expr, PREC_ASSIGN);
                }
            }
            Expr::Raw(text) => self.write(text),
        }
    }

    fn print_args(&mut self, args: &[Expr]) {
        self.write("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.print_expr(arg, PREC_ASSIGN);
        }
        self.write(")");
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
