use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope's name -> value table plus a link to its enclosing
/// frame. Frames are reference-counted so that multiple closures can share
/// an enclosing frame and outlive the call that created them; the name map
/// itself uses interior mutability so `define`/`assign` don't need a `&mut
/// Environment` (which would force every closure to hold the only handle).
#[derive(Debug)]
pub struct Environment {
    values: RefCell<HashMap<String, Object>>,
    enclosing: Option<Rc<Environment>>,
}

pub type SharedEnv = Rc<Environment>;

impl Environment {
    /// Constructor for the global scope's environment. Never popped.
    pub fn new_global() -> SharedEnv {
        Rc::new(Environment { values: RefCell::new(HashMap::new()), enclosing: None })
    }

    /// Creates a new local scope nested inside the given outer one.
    pub fn new_enclosing(enclosing: &SharedEnv) -> SharedEnv {
        Rc::new(Environment { values: RefCell::new(HashMap::new()), enclosing: Some(Rc::clone(enclosing)) })
    }

    /// A new variable is always declared in the current innermost scope; a
    /// redefinition of the same name in that scope overwrites it (this is
    /// only reachable for the global frame — the resolver statically
    /// rejects local redeclaration before execution ever sees it).
    pub fn define(&self, name: String, value: Object) {
        self.values.borrow_mut().insert(name, value);
    }

    /// Looks up a name in *this* frame only — no chain walk. This is the
    /// path used for a reference the resolver left unresolved (i.e. a
    /// global), where the interpreter calls this directly on the globals
    /// frame rather than on whatever frame happens to be current.
    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        self.values
            .borrow()
            .get(&name.lexeme)
            .cloned()
            .ok_or_else(|| RuntimeError::new(name.clone(), format!("Undefined variable '{}'.", name.lexeme)))
    }

    /// Symmetric to `get`: assigns in this frame only, erroring if the name
    /// isn't already bound here.
    pub fn assign(&self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        let mut values = self.values.borrow_mut();
        if values.contains_key(&name.lexeme) {
            values.insert(name.lexeme.clone(), value);
            Ok(())
        } else {
            Err(RuntimeError::new(name.clone(), format!("Undefined variable '{}'.", name.lexeme)))
        }
    }

    fn ancestor(env: &SharedEnv, distance: usize) -> SharedEnv {
        let mut current = Rc::clone(env);
        for _ in 0..distance {
            current = Rc::clone(
                current
                    .enclosing
                    .as_ref()
                    .expect("resolver guaranteed this many enclosing frames exist"),
            );
        }
        current
    }

    /// Walks exactly `distance` enclosing links, then reads `name` directly
    /// from that frame. Must succeed — the resolver only ever records a
    /// distance when it found the binding there.
    pub fn get_at(env: &SharedEnv, distance: usize, name: &str) -> Object {
        Environment::ancestor(env, distance)
            .values
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("resolver distance {distance} pointed at a frame with no '{name}' binding"))
    }

    /// Symmetric write at a known distance.
    pub fn assign_at(env: &SharedEnv, distance: usize, name: &Token, value: Object) {
        Environment::ancestor(env, distance).values.borrow_mut().insert(name.lexeme.clone(), value);
    }
}
