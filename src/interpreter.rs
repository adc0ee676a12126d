use crate::environment::{Environment, SharedEnv};
use crate::error::{LoxSignal, RuntimeError};
use crate::expr::{Expr, NodeId};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::{class_get, instance_get, globals, LoxClass, LoxFunction, Object};
use std::collections::HashMap;
use std::rc::Rc;

/// Walks the resolved AST and realizes its value semantics: control flow,
/// function calls, classes, inheritance, and the `super`/`this` protocol.
/// Consults the resolver's distance map (`locals`) for every variable
/// reference it meets, falling back to the globals frame for anything
/// absent from it — exactly the split spec.md §4.5 describes.
pub struct Interpreter {
    pub globals: SharedEnv,
    environment: SharedEnv,
    locals: HashMap<NodeId, usize>,
}

impl Interpreter {
    pub fn new(locals: HashMap<NodeId, usize>) -> Self {
        let globals_env = Environment::new_global();
        globals(&globals_env);
        Interpreter { globals: Rc::clone(&globals_env), environment: globals_env, locals }
    }

    /// Top-level driver entry point: runs a whole program, stopping and
    /// reporting at the first runtime error. `Return`/`Break`/`Continue`
    /// never reach here in a program the resolver accepted — those are
    /// non-local signals the matching construct (a call frame, a loop)
    /// already consumed.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for statement in statements {
            if let Err(signal) = self.execute(statement) {
                if let LoxSignal::Runtime(err) = signal {
                    crate::error::report_runtime_error(&err);
                }
                return;
            }
        }
    }

    /// Executes `statements` against a fresh environment, restoring the
    /// previously-current one on every exit path — including when a
    /// signal unwinds through `?` — per spec.md §5's resource-scoping
    /// requirement for environment frames.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: SharedEnv) -> Result<(), LoxSignal> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));
        self.environment = previous;
        result
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), LoxSignal> {
        match stmt {
            Stmt::Expression { expression } => {
                self.evaluate(expression)?;
                Ok(())
            }
            Stmt::Print { expression } => {
                let value = self.evaluate(expression)?;
                println!("{value}");
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::Nil,
                };
                self.environment.define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Block { statements } => {
                let scope = Environment::new_enclosing(&self.environment);
                self.execute_block(statements, scope)
            }
            Stmt::If { condition, then_branch, else_branch } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While { condition, body, is_for, has_increment } => {
                self.execute_while(condition, body, *is_for, *has_increment)
            }
            Stmt::Function { decl } => {
                let func = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                let name = decl.name.as_ref().expect("a function statement always carries a name");
                self.environment.define(name.lexeme.clone(), Object::Function(func));
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::Nil,
                };
                Err(LoxSignal::Return(value))
            }
            Stmt::Break { .. } => Err(LoxSignal::Break),
            Stmt::Continue { .. } => Err(LoxSignal::Continue),
            Stmt::Class { name, superclass, methods, getters, static_methods, static_getters } => {
                self.execute_class(name, superclass, methods, getters, static_methods, static_getters)
            }
        }
    }

    /// `continue` inside a desugared `for` loop (`is_for && has_increment`)
    /// must run the increment before the condition is re-tested, even
    /// though the increment lives inside the loop body and the signal
    /// already unwound past it. See spec.md §4.5.
    fn execute_while(&mut self, condition: &Expr, body: &Stmt, is_for: bool, has_increment: bool) -> Result<(), LoxSignal> {
        while self.evaluate(condition)?.is_truthy() {
            match self.execute(body) {
                Ok(()) => {}
                Err(LoxSignal::Break) => break,
                Err(LoxSignal::Continue) => {
                    if is_for && has_increment {
                        if let Stmt::Block { statements } = body {
                            if let Some(increment) = statements.get(1) {
                                self.execute(increment)?;
                            }
                        }
                    }
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_class(
        &mut self,
        name: &Token,
        superclass: &Option<Expr>,
        methods: &[Rc<crate::stmt::FunctionDecl>],
        getters: &[Rc<crate::stmt::FunctionDecl>],
        static_methods: &[Rc<crate::stmt::FunctionDecl>],
        static_getters: &[Rc<crate::stmt::FunctionDecl>],
    ) -> Result<(), LoxSignal> {
        let superclass_obj = match superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Object::Class(class) => Some(class),
                    _ => {
                        let token = superclass_token(expr);
                        return Err(RuntimeError::new(token, "Superclass must be a class.").into());
                    }
                }
            }
            None => None,
        };

        self.environment.define(name.lexeme.clone(), Object::Nil);

        let defining_env = self.environment.clone();
        if let Some(superclass) = &superclass_obj {
            let super_env = Environment::new_enclosing(&self.environment);
            super_env.define("super".to_string(), Object::Class(Rc::clone(superclass)));
            self.environment = super_env;
        }

        let method_table = self.build_method_table(methods, true);
        let getter_table = self.build_method_table(getters, false);
        let static_method_table = self.build_method_table(static_methods, true);
        let static_getter_table = self.build_method_table(static_getters, false);

        let class = LoxClass::new(name.lexeme.clone(), superclass_obj.clone(), method_table, getter_table, static_method_table, static_getter_table);
        LoxClass::run_static_initializer(&class, self)?;

        if superclass_obj.is_some() {
            self.environment = defining_env;
        }

        self.environment.assign(name, Object::Class(class)).map_err(LoxSignal::from)
    }

    fn build_method_table(
        &self,
        decls: &[Rc<crate::stmt::FunctionDecl>],
        initializer_capable: bool,
    ) -> HashMap<String, Rc<LoxFunction>> {
        let mut table = HashMap::new();
        for decl in decls {
            let name = decl.name.as_ref().expect("class members always carry a name");
            let is_initializer = initializer_capable && name.lexeme == "init";
            let func = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), is_initializer);
            table.insert(name.lexeme.clone(), func);
        }
        table
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Object, LoxSignal> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),
            Expr::Binary { left, operator, right } => self.evaluate_binary(left, operator, right),
            Expr::Logical { left, operator, right } => self.evaluate_logical(left, operator, right),
            Expr::Variable { id, name } => self.lookup_variable(*id, name),
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(&self.environment, distance, name, value.clone()),
                    None => self.globals.assign(name, value.clone())?,
                }
                Ok(value)
            }
            Expr::Call { callee, paren, arguments } => self.evaluate_call(callee, paren, arguments),
            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;
                match object {
                    Object::Instance(instance) => instance_get(self, &instance, name),
                    Object::Class(class) => class_get(&class, self, name),
                    _ => Err(RuntimeError::new(name.clone(), "Only instances have properties.").into()),
                }
            }
            Expr::Set { object, name, value } => {
                let object = self.evaluate(object)?;
                match object {
                    Object::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.borrow_mut().set(name, value.clone());
                        Ok(value)
                    }
                    _ => Err(RuntimeError::new(name.clone(), "Only instances have fields.").into()),
                }
            }
            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),
            Expr::Super { id, keyword, method } => self.evaluate_super_get(*id, keyword, method),
            Expr::SuperCall { id, keyword, arguments } => self.evaluate_super_call(*id, keyword, arguments),
            Expr::FunctionExpr(decl) => Ok(Object::Function(LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false))),
        }
    }

    /// Variable/This reads both resolve the same way: a known distance
    /// means `getAt` on the current environment; no entry means fall
    /// through to the globals frame directly.
    fn lookup_variable(&self, id: NodeId, name: &Token) -> Result<Object, LoxSignal> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(Environment::get_at(&self.environment, distance, &name.lexeme)),
            None => Ok(self.globals.get(name)?),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Object, LoxSignal> {
        let right = self.evaluate(right)?;
        match operator.token_type {
            TokenType::MINUS => match right {
                Object::Number(n) => Ok(Object::Number(-n)),
                _ => Err(RuntimeError::new(operator.clone(), "Operand must be a number.").into()),
            },
            TokenType::BANG => Ok(Object::Boolean(!right.is_truthy())),
            _ => unreachable!("parser only ever produces BANG/MINUS unary operators"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Object, LoxSignal> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        use Object::*;
        use TokenType::*;
        match operator.token_type {
            MINUS => numeric(&left, &right, operator, |a, b| Ok(Number(a - b))),
            STAR => numeric(&left, &right, operator, |a, b| Ok(Number(a * b))),
            SLASH => numeric(&left, &right, operator, |a, b| {
                if b == 0.0 {
                    Err(RuntimeError::new(operator.clone(), "Cannot divide by 0."))
                } else {
                    Ok(Number(a / b))
                }
            }),
            PLUS => match (&left, &right) {
                (Number(a), Number(b)) => Ok(Number(a + b)),
                (String(_), _) | (_, String(_)) => Ok(String(format!("{left}{right}"))),
                _ => Err(RuntimeError::new(operator.clone(), "Operands must be numbers.")),
            },
            GREATER => numeric(&left, &right, operator, |a, b| Ok(Boolean(a > b))),
            GREATER_EQUAL => numeric(&left, &right, operator, |a, b| Ok(Boolean(a >= b))),
            LESS => numeric(&left, &right, operator, |a, b| Ok(Boolean(a < b))),
            LESS_EQUAL => numeric(&left, &right, operator, |a, b| Ok(Boolean(a <= b))),
            BANG_EQUAL => Ok(Boolean(!left.lox_eq(&right))),
            EQUAL_EQUAL => Ok(Boolean(left.lox_eq(&right))),
            _ => unreachable!("parser only ever produces arithmetic/comparison/equality binary operators"),
        }
        .map_err(LoxSignal::from)
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Object, LoxSignal> {
        let left = self.evaluate(left)?;
        let short_circuits = if operator.token_type == TokenType::OR { left.is_truthy() } else { !left.is_truthy() };
        if short_circuits {
            Ok(left)
        } else {
            self.evaluate(right)
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Object, LoxSignal> {
        let callee = self.evaluate(callee)?;

        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate(arg)?);
        }

        match callee.arity() {
            Some(arity) if arity != args.len() => {
                Err(RuntimeError::new(paren.clone(), format!("Expected {arity} arguments but got {}.", args.len())).into())
            }
            Some(_) => callee.call(self, args, paren),
            None => Err(RuntimeError::new(paren.clone(), "Can only call functions and classes.").into()),
        }
    }

    /// `super.property`: the resolver fixed `super`'s distance at `id`'s
    /// entry and guarantees `this` sits exactly one frame closer in.
    fn evaluate_super_get(&mut self, id: NodeId, keyword: &Token, method: &Token) -> Result<Object, LoxSignal> {
        let distance = self.locals[&id];
        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Object::Class(class) => class,
            _ => unreachable!("resolver only ever binds 'super' to a class object"),
        };
        let this = Environment::get_at(&self.environment, distance - 1, "this");

        if let Some(getter) = superclass.find_getter(&method.lexeme) {
            return getter.bind(this).call(self, vec![]);
        }
        if let Some(found) = superclass.find_method(&method.lexeme) {
            return Ok(Object::Function(found.bind(this)));
        }
        Err(RuntimeError::new(keyword.clone(), format!("Undefined property '{}'.", method.lexeme)).into())
    }

    fn evaluate_super_call(&mut self, id: NodeId, paren: &Token, arguments: &[Expr]) -> Result<Object, LoxSignal> {
        let distance = self.locals[&id];
        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Object::Class(class) => class,
            _ => unreachable!("resolver only ever binds 'super' to a class object"),
        };
        let this = Environment::get_at(&self.environment, distance - 1, "this");

        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate(arg)?);
        }

        match superclass.find_method("init") {
            Some(init) => {
                if init.arity() != args.len() {
                    return Err(RuntimeError::new(paren.clone(), format!("Expected {} arguments but got {}.", init.arity(), args.len())).into());
                }
                init.bind(this).call(self, args)?;
            }
            None if !args.is_empty() => {
                return Err(RuntimeError::new(paren.clone(), format!("Expected 0 arguments but got {}.", args.len())).into());
            }
            None => {}
        }
        Ok(Object::Nil)
    }
}

fn numeric(
    left: &Object,
    right: &Object,
    operator: &Token,
    op: impl FnOnce(f64, f64) -> Result<Object, RuntimeError>,
) -> Result<Object, RuntimeError> {
    match (left, right) {
        (Object::Number(a), Object::Number(b)) => op(*a, *b),
        _ => Err(RuntimeError::new(operator.clone(), "Operands must be numbers.")),
    }
}

fn superclass_token(expr: &Expr) -> Token {
    match expr {
        Expr::Variable { name, .. } => name.clone(),
        _ => unreachable!("the parser only ever builds a Variable expr for a superclass clause"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn run(src: &str) -> Interpreter {
        let tokens = Scanner::new(src).scan_tokens();
        let stmts = Parser::new(tokens).parse();
        let locals = Resolver::new().resolve(&stmts);
        let mut interpreter = Interpreter::new(locals);
        interpreter.interpret(&stmts);
        interpreter
    }

    fn eval(src: &str) -> Object {
        let tokens = Scanner::new(src).scan_tokens();
        let stmts = Parser::new(tokens).parse();
        let locals = Resolver::new().resolve(&stmts);
        let mut interpreter = Interpreter::new(locals);
        match &stmts[0] {
            Stmt::Expression { expression } => interpreter.evaluate(expression).unwrap(),
            _ => panic!("expected a single expression statement"),
        }
    }

    #[test]
    fn arithmetic_addition() {
        match eval("1 + 2;") {
            Object::Number(n) => assert_eq!(n, 3.0),
            other => panic!("expected a number, got {other:?}"),
        }
    }

    #[test]
    fn string_plus_number_stringifies_and_concatenates() {
        match eval("\"hi\" + 1;") {
            Object::String(s) => assert_eq!(s, "hi1"),
            other => panic!("expected a string, got {other:?}"),
        }
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let tokens = Scanner::new("1 / 0;").scan_tokens();
        let stmts = Parser::new(tokens).parse();
        let locals = Resolver::new().resolve(&stmts);
        let mut interpreter = Interpreter::new(locals);
        match &stmts[0] {
            Stmt::Expression { expression } => {
                let err = interpreter.evaluate(expression).unwrap_err();
                match err {
                    LoxSignal::Runtime(e) => assert_eq!(e.message, "Cannot divide by 0."),
                    other => panic!("expected a runtime error, got {other:?}"),
                }
            }
            _ => panic!("expected a single expression statement"),
        }
    }

    #[test]
    fn closures_capture_by_reference_to_their_frame() {
        let interpreter = run(
            "var results = nil; fun make() { var i = 0; fun next() { i = i + 1; return i; } return next; } var n = make(); results = n() + n() * 10 + n() * 100;",
        );
        match interpreter.globals.get(&Token::synthetic("results")).unwrap() {
            Object::Number(n) => assert_eq!(n, 1.0 + 20.0 + 300.0),
            other => panic!("expected a number, got {other:?}"),
        }
    }

    #[test]
    fn inheritance_super_call_reaches_base_method() {
        let interpreter = run(
            "var log = \"\"; class A { greet() { log = log + \"a\"; } } class B < A { greet() { super.greet(); log = log + \"b\"; } } B().greet();",
        );
        match interpreter.globals.get(&Token::synthetic("log")).unwrap() {
            Object::String(s) => assert_eq!(s, "ab"),
            other => panic!("expected a string, got {other:?}"),
        }
    }

    #[test]
    fn initializer_identity_returns_the_same_instance() {
        let interpreter = run("class C { init(x) { this.x = x; } } var c = C(7); var same = c.init(7);");
        let c = interpreter.globals.get(&Token::synthetic("c")).unwrap();
        let same = interpreter.globals.get(&Token::synthetic("same")).unwrap();
        match (c, same) {
            (Object::Instance(a), Object::Instance(b)) => assert!(Rc::ptr_eq(&a, &b)),
            other => panic!("expected two instances, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_continue_still_runs_the_increment() {
        let interpreter = run(
            "var out = \"\"; for (var i = 0; i < 3; i = i + 1) { if (i == 1) continue; out = out + i; }",
        );
        match interpreter.globals.get(&Token::synthetic("out")).unwrap() {
            Object::String(s) => assert_eq!(s, "02"),
            other => panic!("expected a string, got {other:?}"),
        }
    }
}
