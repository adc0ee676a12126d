use crate::expr::Expr;
use crate::token::Token;
use std::rc::Rc;

/// Shared shape of a named function declaration, a method, a getter, and an
/// anonymous function expression. Wrapped in `Rc` so the interpreter can
/// give several `LoxFunction` runtime values (e.g. a method rebuilt for
/// every `bind()`) a cheap clone of the same declaration instead of a deep
/// copy of the body on every call.
#[derive(Debug)]
pub struct FunctionDecl {
    /// `None` for function expressions (lambdas); `Some` for every other
    /// kind of declaration, including methods and getters.
    pub name: Option<Token>,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Stmt {
    Expression {
        expression: Expr,
    },
    Print {
        expression: Expr,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Block {
        statements: Vec<Stmt>,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
        /// Whether this `while` is the desugared form of a `for` loop.
        is_for: bool,
        /// Whether the `for` loop that produced this `while` had an
        /// increment clause. When both this and `is_for` are true,
        /// `continue` re-runs the increment (the body's second statement)
        /// before re-testing the condition, instead of skipping straight
        /// to the condition check.
        has_increment: bool,
    },
    Function {
        decl: Rc<FunctionDecl>,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Break {
        keyword: Token,
    },
    Continue {
        keyword: Token,
    },
    Class {
        name: Token,
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
        getters: Vec<Rc<FunctionDecl>>,
        static_methods: Vec<Rc<FunctionDecl>>,
        static_getters: Vec<Rc<FunctionDecl>>,
    },
}
