use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use crate::runtime::error::RuntimeResult;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::{Callable, Value};

/// The natives every interpreter starts with.
pub fn builtins() -> Vec<Rc<dyn Callable>> {
    vec![Rc::new(Clock)]
}

/// `clock()`: milliseconds since the Unix epoch.
pub struct Clock;

impl Callable for Clock {
    fn name(&self) -> &str {
        "clock"
    }

    fn arity(&self) -> usize {
        0
    }

    fn call(&self, _interpreter: &mut Interpreter<'_>, _arguments: Vec<Value>) -> RuntimeResult<Value> {
        // A clock set before 1970 reads as zero
        let millis = SystemTime::now().duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_millis() as f64)
            .unwrap_or(0.0);

        Ok(Value::Number(millis))
    }

    fn is_native(&self) -> bool {
        true
    }
}
