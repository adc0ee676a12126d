use crate::error::{LoxSignal, RuntimeError};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::instance::LoxInstance;
use crate::value::{LoxFunction, Object};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// The runtime representation of a class declaration: its name, its
/// optional superclass, and the four method tables spec.md's data model
/// calls for. Static members live on the class itself rather than on a
/// separate "metaclass" instance — the same uniform lookup spec.md asks
/// for is achieved here by letting `bind` attach `this` to any `Object`,
/// including `Object::Class`, not just an instance.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
    getters: HashMap<String, Rc<LoxFunction>>,
    static_methods: HashMap<String, Rc<LoxFunction>>,
    static_getters: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
        getters: HashMap<String, Rc<LoxFunction>>,
        static_methods: HashMap<String, Rc<LoxFunction>>,
        static_getters: HashMap<String, Rc<LoxFunction>>,
    ) -> Rc<LoxClass> {
        Rc::new(LoxClass { name, superclass, methods, getters, static_methods, static_getters })
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.methods
            .get(name)
            .cloned()
            .or_else(|| self.superclass.as_ref().and_then(|s| s.find_method(name)))
    }

    pub fn find_getter(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.getters
            .get(name)
            .cloned()
            .or_else(|| self.superclass.as_ref().and_then(|s| s.find_getter(name)))
    }

    pub fn find_static_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.static_methods
            .get(name)
            .cloned()
            .or_else(|| self.superclass.as_ref().and_then(|s| s.find_static_method(name)))
    }

    pub fn find_static_getter(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.static_getters
            .get(name)
            .cloned()
            .or_else(|| self.superclass.as_ref().and_then(|s| s.find_static_getter(name)))
    }

    /// If there's an `init` method, its arity determines how many
    /// arguments calling the class itself requires; otherwise it's zero.
    pub fn arity(&self) -> usize {
        self.find_method("init").map(|init| init.arity()).unwrap_or(0)
    }

    /// Runs the static initializer, if any, immediately after the class
    /// object is built — bound to the class itself, invoked with zero
    /// arguments (the resolver has already rejected a static initializer
    /// with parameters).
    pub fn run_static_initializer(klass: &Rc<LoxClass>, interpreter: &mut Interpreter) -> Result<(), LoxSignal> {
        if let Some(init) = klass.find_static_method("init") {
            init.bind(Object::Class(Rc::clone(klass))).call(interpreter, vec![])?;
        }
        Ok(())
    }

    /// Allocates a fresh instance, then runs its `init` method (if any)
    /// bound to that instance.
    pub fn instantiate(klass: &Rc<LoxClass>, interpreter: &mut Interpreter, args: Vec<Object>) -> Result<Object, LoxSignal> {
        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(klass))));
        if let Some(init) = klass.find_method("init") {
            init.bind(Object::Instance(Rc::clone(&instance))).call(interpreter, args)?;
        }
        Ok(Object::Instance(instance))
    }
}

/// Property access on a class object itself — the static-member half of
/// spec.md §4.4's "a class is itself an instance-like object so static
/// members are looked up on it." Classes carry no field map of their own,
/// so there's no fields-first step here the way there is in
/// `instance_get`; a static getter is invoked immediately, a static
/// method comes back bound but uncalled.
pub fn class_get(klass: &Rc<LoxClass>, interpreter: &mut Interpreter, name: &Token) -> Result<Object, LoxSignal> {
    if let Some(getter) = klass.find_static_getter(&name.lexeme) {
        let bound = getter.bind(Object::Class(Rc::clone(klass)));
        return bound.call(interpreter, vec![]);
    }

    if let Some(method) = klass.find_static_method(&name.lexeme) {
        let bound = method.bind(Object::Class(Rc::clone(klass)));
        return Ok(Object::Function(bound));
    }

    Err(RuntimeError::new(name.clone(), format!("Undefined property '{}'.", name.lexeme)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_method_walks_up_the_superclass_chain() {
        let base = LoxClass::new(
            "Base".to_string(),
            None,
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
        );
        let derived = LoxClass::new(
            "Derived".to_string(),
            Some(Rc::clone(&base)),
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
        );
        assert!(derived.find_method("greet").is_none());
        assert_eq!(derived.superclass.as_ref().unwrap().name, "Base");
    }

    #[test]
    fn arity_without_init_is_zero() {
        let klass = LoxClass::new(
            "Empty".to_string(),
            None,
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
        );
        assert_eq!(klass.arity(), 0);
    }
}
