use crate::error::{LoxSignal, RuntimeError};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::class::LoxClass;
use crate::value::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

/// The runtime representation of an instance of a user class. Its class
/// link is set once at construction and never changes.
#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Object>,
}

impl Display for LoxInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance { class, fields: HashMap::new() }
    }

    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

/// Property access on an instance: fields first, then a getter (invoked
/// immediately, bound to this instance), then a method (returned as a
/// bound callable, not invoked). A free function rather than a method on
/// `LoxInstance` because binding a getter or method needs an `Object`
/// wrapping the *shared* instance handle, which a `&self` receiver doesn't
/// give us access to.
pub fn instance_get(interpreter: &mut Interpreter, instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Object, LoxSignal> {
    if let Some(value) = instance.borrow().fields.get(&name.lexeme).cloned() {
        return Ok(value);
    }

    let class = Rc::clone(&instance.borrow().class);

    if let Some(getter) = class.find_getter(&name.lexeme) {
        let bound = getter.bind(Object::Instance(Rc::clone(instance)));
        return bound.call(interpreter, vec![]);
    }

    if let Some(method) = class.find_method(&name.lexeme) {
        let bound = method.bind(Object::Instance(Rc::clone(instance)));
        return Ok(Object::Function(bound));
    }

    Err(RuntimeError::new(name.clone(), format!("Undefined property '{}'.", name.lexeme)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    #[test]
    fn fresh_instance_has_no_fields() {
        let klass = LoxClass::new("C".to_string(), None, Map::new(), Map::new(), Map::new(), Map::new());
        let instance = LoxInstance::new(klass);
        assert!(instance.fields.is_empty());
    }
}
