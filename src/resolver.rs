use crate::error;
use crate::expr::{Expr, NodeId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;
use std::collections::HashMap;
use std::rc::Rc;

/// A local variable's lifecycle within one scope, tracked so the resolver
/// can both reject a self-referential initializer (`var a = a;`) and flag
/// a binding that's never read.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum VarState {
    Declared,
    Defined,
    Used,
}

struct ScopeEntry {
    state: VarState,
    token: Token,
}

type Scope = HashMap<String, ScopeEntry>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum FunctionKind {
    None,
    Function,
    Method,
    Initializer,
    StaticInitializer,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ClassKind {
    None,
    Class,
    Derived,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LoopKind {
    None,
    While,
}

/// The single pre-execution pass spec.md §4.2 describes: walks the AST
/// once, records how many enclosing scopes separate each variable
/// reference from its binding, and rejects programs that violate one of
/// the static rules below. Resolution outcomes are reported as errors
/// through `error::error_at_token` (setting the process-wide "had error"
/// flag) rather than returned — the driver checks that flag after
/// `resolve` returns and skips interpretation if it's set, matching the
/// rest of this crate's static-error plumbing in `parser.rs`.
pub struct Resolver {
    scopes: Vec<Scope>,
    resolved: HashMap<NodeId, usize>,
    current_function: FunctionKind,
    current_class: ClassKind,
    current_loop: LoopKind,
    current_super_call: bool,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            resolved: HashMap::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
            current_loop: LoopKind::None,
            current_super_call: false,
        }
    }

    /// Consumes the resolver and hands back the finished distance map.
    pub fn resolve(mut self, statements: &[Stmt]) -> HashMap<NodeId, usize> {
        self.resolve_statements(statements);
        self.resolved
    }

    fn resolve_statements(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression { expression } => self.resolve_expr(expression),
            Stmt::Print { expression } => self.resolve_expr(expression),
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.define(name);
            }
            Stmt::Block { statements } => {
                self.begin_scope();
                self.resolve_statements(statements);
                self.end_scope();
            }
            Stmt::If { condition, then_branch, else_branch } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While { condition, body, .. } => {
                self.resolve_expr(condition);
                let enclosing_loop = self.current_loop;
                self.current_loop = LoopKind::While;
                self.resolve_stmt(body);
                self.current_loop = enclosing_loop;
            }
            Stmt::Function { decl } => {
                if let Some(name) = &decl.name {
                    self.declare(name);
                    self.define(name);
                }
                self.resolve_function(decl, FunctionKind::Function);
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    error::error_at_token(keyword, "Can't return from top-level code.");
                }
                if let Some(value) = value {
                    if matches!(self.current_function, FunctionKind::Initializer | FunctionKind::StaticInitializer) {
                        error::error_at_token(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Break { keyword } | Stmt::Continue { keyword } => {
                if self.current_loop == LoopKind::None {
                    error::error_at_token(keyword, "Illegal continue statement.");
                }
            }
            Stmt::Class { name, superclass, methods, getters, static_methods, static_getters } => {
                self.resolve_class(name, superclass, methods, getters, static_methods, static_getters);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: &Option<Expr>,
        methods: &[Rc<FunctionDecl>],
        getters: &[Rc<FunctionDecl>],
        static_methods: &[Rc<FunctionDecl>],
        static_getters: &[Rc<FunctionDecl>],
    ) {
        self.declare(name);
        self.define(name);

        if let Some(Expr::Variable { name: super_name, .. }) = superclass {
            if super_name.lexeme == name.lexeme {
                error::error_at_token(super_name, "A class can't inherit from itself.");
            }
        }

        let enclosing_class = self.current_class;
        self.current_class = if superclass.is_some() { ClassKind::Derived } else { ClassKind::Class };

        if let Some(superclass) = superclass {
            self.resolve_expr(superclass);
            self.begin_scope();
            self.bind_synthetic("super");
        }

        self.begin_scope();
        self.bind_synthetic("this");

        self.check_duplicate_names(methods, getters);
        self.check_duplicate_names(static_methods, static_getters);

        for method in methods {
            let kind = if is_named(method, "init") { FunctionKind::Initializer } else { FunctionKind::Method };
            self.resolve_function(method, kind);
        }
        for getter in getters {
            self.resolve_function(getter, FunctionKind::Method);
        }
        for method in static_methods {
            if is_named(method, "init") {
                if !method.params.is_empty() {
                    error::error_at_token(
                        method.name.as_ref().expect("static method always carries a name"),
                        "Class static initializer can't have parameters.",
                    );
                }
                self.resolve_function(method, FunctionKind::StaticInitializer);
            } else {
                self.resolve_function(method, FunctionKind::Method);
            }
        }
        for getter in static_getters {
            self.resolve_function(getter, FunctionKind::Method);
        }

        self.end_scope();
        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn check_duplicate_names(&self, methods: &[Rc<FunctionDecl>], getters: &[Rc<FunctionDecl>]) {
        for getter in getters {
            let getter_name = getter.name.as_ref().expect("getter always carries a name");
            if methods.iter().any(|m| m.name.as_ref().is_some_and(|n| n.lexeme == getter_name.lexeme)) {
                error::error_at_token(getter_name, "Duplicate method and getter name.");
            }
        }
    }

    fn resolve_function(&mut self, decl: &Rc<FunctionDecl>, kind: FunctionKind) {
        let enclosing_function = self.current_function;
        let enclosing_loop = self.current_loop;
        let enclosing_super_call = self.current_super_call;
        self.current_function = kind;
        self.current_loop = LoopKind::None;
        self.current_super_call = false;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_statements(&decl.body);
        self.end_scope();

        if kind == FunctionKind::Initializer && self.current_class == ClassKind::Derived && !self.current_super_call {
            error::error_at_token(
                decl.name.as_ref().expect("an initializer always carries a name"),
                "Superclass was not initialized inside subclass initializer.",
            );
        }

        self.current_function = enclosing_function;
        self.current_loop = enclosing_loop;
        self.current_super_call = enclosing_super_call;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if let Some(entry) = scope.get(&name.lexeme) {
                        if entry.state == VarState::Declared {
                            error::error_at_token(name, "Can't read local variable in its own initializer.");
                        }
                    }
                }
                self.resolve_local(*id, name);
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }
            Expr::Call { callee, arguments, .. } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::This { id, keyword } => {
                if self.current_class == ClassKind::None {
                    error::error_at_token(keyword, "Can't use 'this' outside of a class.");
                }
                self.resolve_local(*id, keyword);
            }
            Expr::Super { id, keyword, .. } => {
                if self.current_class != ClassKind::Derived {
                    error::error_at_token(keyword, "Can't use 'super' outside of a derived class.");
                } else if self.current_function == FunctionKind::Initializer && !self.current_super_call {
                    error::error_at_token(
                        keyword,
                        "Can't access property on superclass until 'super' has been called.",
                    );
                }
                self.resolve_local(*id, keyword);
            }
            Expr::SuperCall { id, keyword, arguments } => {
                if self.current_class != ClassKind::Derived {
                    error::error_at_token(keyword, "Can't use 'super' outside of a derived class.");
                } else if self.current_function == FunctionKind::StaticInitializer {
                    error::error_at_token(keyword, "Can't call 'super' inside a static initializer.");
                } else if self.current_function != FunctionKind::Initializer {
                    error::error_at_token(keyword, "Can't call 'super' outside of class initializer.");
                } else if self.current_super_call {
                    error::error_at_token(keyword, "Can't call 'super' more than once inside class initializer.");
                } else {
                    self.current_super_call = true;
                }
                self.resolve_local(*id, keyword);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
            Expr::FunctionExpr(decl) => self.resolve_function(decl, FunctionKind::Function),
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pops the innermost scope, flagging every binding that was never
    /// read. `this`/`super` are inserted already-`Used` via
    /// `bind_synthetic`, so a class body with no explicit use of either
    /// never trips this check on their account.
    fn end_scope(&mut self) {
        let scope = self.scopes.pop().expect("end_scope without a matching begin_scope");
        for entry in scope.values() {
            if entry.state != VarState::Used {
                error::error_at_token(&entry.token, &format!("Unused local variable '{}'.", entry.token.lexeme));
            }
        }
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        if scope.contains_key(&name.lexeme) {
            error::error_at_token(name, "Already a variable with that name in this scope.");
        }
        scope.insert(name.lexeme.clone(), ScopeEntry { state: VarState::Declared, token: name.clone() });
    }

    fn define(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        if let Some(entry) = scope.get_mut(&name.lexeme) {
            entry.state = VarState::Defined;
        }
    }

    /// Pre-populates the current (innermost) scope with `this`/`super`,
    /// already marked `Used` so a class or method that never references
    /// them doesn't trigger the unused-local check.
    fn bind_synthetic(&mut self, name: &str) {
        let scope = self.scopes.last_mut().expect("bind_synthetic called with no open scope");
        scope.insert(name.to_string(), ScopeEntry { state: VarState::Used, token: Token::synthetic(name) });
    }

    fn resolve_local(&mut self, id: NodeId, name: &Token) {
        for (distance, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(entry) = scope.get_mut(&name.lexeme) {
                entry.state = VarState::Used;
                self.resolved.insert(id, distance);
                return;
            }
        }
        // Not found in any scope: treat as a global. The interpreter falls
        // back to the globals frame for any id absent from this map.
    }
}

fn is_named(decl: &Rc<FunctionDecl>, name: &str) -> bool {
    decl.name.as_ref().is_some_and(|n| n.lexeme == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve_source(src: &str) -> HashMap<NodeId, usize> {
        let tokens = Scanner::new(src).scan_tokens();
        let stmts = Parser::new(tokens).parse();
        Resolver::new().resolve(&stmts)
    }

    #[test]
    fn closure_variable_gets_a_nonzero_distance() {
        let map = resolve_source(
            "fun make() { var i = 0; fun next() { i = i + 1; return i; } return next; }",
        );
        assert!(map.values().any(|&d| d > 0));
    }

    #[test]
    fn top_level_self_reference_is_not_flagged_as_an_error() {
        error::reset_had_error();
        resolve_source("var a = a;");
        assert!(!error::had_error());
    }

    #[test]
    fn block_scoped_self_reference_is_rejected() {
        error::reset_had_error();
        resolve_source("{ var a = a; }");
        assert!(error::had_error());
        error::reset_had_error();
    }

    #[test]
    fn this_outside_a_class_is_rejected() {
        error::reset_had_error();
        resolve_source("print this;");
        assert!(error::had_error());
        error::reset_had_error();
    }

    #[test]
    fn derived_initializer_without_super_call_is_rejected() {
        error::reset_had_error();
        resolve_source("class A {} class B < A { init() { this.x = 1; } }");
        assert!(error::had_error());
        error::reset_had_error();
    }

    #[test]
    fn derived_initializer_with_super_call_is_accepted() {
        error::reset_had_error();
        resolve_source("class A { init() {} } class B < A { init() { super(); } }");
        assert!(!error::had_error());
    }

    #[test]
    fn duplicate_method_and_getter_name_is_rejected() {
        error::reset_had_error();
        resolve_source("class C { x() { return 1; } get x { return 2; } }");
        assert!(error::had_error());
        error::reset_had_error();
    }

    #[test]
    fn unused_local_variable_is_rejected() {
        error::reset_had_error();
        resolve_source("{ var a = 1; }");
        assert!(error::had_error());
        error::reset_had_error();
    }

    #[test]
    fn break_outside_a_loop_is_rejected() {
        error::reset_had_error();
        resolve_source("break;");
        assert!(error::had_error());
        error::reset_had_error();
    }
}
