use crate::environment::{Environment, SharedEnv};
use crate::error::LoxSignal;
use crate::interpreter::Interpreter;
use crate::stmt::FunctionDecl;
use crate::value::Object;
use std::rc::Rc;

/// The runtime representation of a function/method/getter declaration:
/// the declaration itself plus the environment frame in effect when it was
/// declared (its closure). Two `LoxFunction`s can share the same
/// `declaration` Rc while differing only in `closure` — that's exactly
/// what `bind` produces for a method looked up on two different instances.
#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: SharedEnv,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: SharedEnv, is_initializer: bool) -> Rc<LoxFunction> {
        Rc::new(LoxFunction { declaration, closure, is_initializer })
    }

    pub fn name(&self) -> &str {
        self.declaration.name.as_ref().map(|t| t.lexeme.as_str()).unwrap_or("anonymous")
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Returns a new callable whose closure is a fresh frame enclosing the
    /// original closure, with `this` defined as `bound_this`. `bound_this`
    /// is an `Object` rather than specifically an instance so the same
    /// machinery binds static methods to their class.
    pub fn bind(&self, bound_this: Object) -> Rc<LoxFunction> {
        let env = Environment::new_enclosing(&self.closure);
        env.define("this".to_string(), bound_this);
        LoxFunction::new(Rc::clone(&self.declaration), env, self.is_initializer)
    }

    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Object>) -> Result<Object, LoxSignal> {
        let scope = Environment::new_enclosing(&self.closure);
        for (param, arg) in self.declaration.params.iter().zip(args) {
            scope.define(param.lexeme.clone(), arg);
        }

        match interpreter.execute_block(&self.declaration.body, scope) {
            Err(LoxSignal::Return(value)) => {
                if self.is_initializer {
                    Ok(Environment::get_at(&self.closure, 0, "this"))
                } else {
                    Ok(value)
                }
            }
            Err(other) => Err(other),
            Ok(()) => {
                if self.is_initializer {
                    Ok(Environment::get_at(&self.closure, 0, "this"))
                } else {
                    Ok(Object::Nil)
                }
            }
        }
    }
}
