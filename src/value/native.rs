use crate::environment::SharedEnv;
use crate::value::Object;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A built-in function: a plain `fn` pointer rather than a closure, since
/// none of the language's natives need to capture anything.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Object]) -> Object,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).field("arity", &self.arity).finish()
    }
}

fn clock(_args: &[Object]) -> Object {
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64();
    Object::Number(timestamp)
}

/// Populates the globals frame with the language's built-in functions.
pub fn globals(env: &SharedEnv) {
    env.define(
        "clock".to_string(),
        Object::Native(std::rc::Rc::new(NativeFunction { name: "clock", arity: 0, func: clock })),
    );
}
