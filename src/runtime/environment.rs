use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use crate::compiler::lexer::Token;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::value::Value;


pub type EnvironmentRef = Rc<RefCell<Environment>>;

/// One scope frame. The parent link is shared: every block or call frame created inside
/// this one points at it, and a closure keeps its defining frame alive after the call returns.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvironmentRef>,
}

impl Environment {
    pub fn new_global() -> EnvironmentRef {
        Rc::new(RefCell::new(Environment::default()))
    }

    pub fn new_with_parent(parent: EnvironmentRef) -> EnvironmentRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(parent),
        }))
    }

    pub fn enclosing(&self) -> Option<EnvironmentRef> {
        self.enclosing.as_ref().map(Rc::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Adds a binding to this frame only.
    pub fn define(&mut self, name: &Token, value: Value) -> RuntimeResult<()> {
        if self.values.contains_key(name.source()) {
            return Err(RuntimeError::new(name, format!("Attempt to redefine variable '{}'", name.source())));
        }

        self.values.insert(name.source().to_owned(), value);
        Ok(())
    }

    pub fn get(&self, name: &Token) -> RuntimeResult<Value> {
        if let Some(value) = self.values.get(name.source()) {
            return Ok(value.clone());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),
            None => Err(RuntimeError::new(name, format!("Undefined variable '{}'", name.source()))),
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> RuntimeResult<()> {
        if let Some(slot) = self.values.get_mut(name.source()) {
            *slot = value;
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(RuntimeError::new(name, format!("Undefined variable '{}'", name.source()))),
        }
    }

    // The `*_at` functions trust the resolver. A miss means the resolver computed a wrong
    // distance, which is a bug in this crate and not in the program being run.

    pub fn get_at(this: &EnvironmentRef, distance: usize, name: &Token) -> Value {
        let ancestor = Self::ancestor(this, distance);
        let value = ancestor.borrow().values.get(name.source()).cloned();

        value.unwrap_or_else(|| panic!("Internal interpreter error: '{}' not found at distance {}", name.source(), distance))
    }

    pub fn assign_at(this: &EnvironmentRef, distance: usize, name: &Token, value: Value) {
        let ancestor = Self::ancestor(this, distance);
        let mut ancestor = ancestor.borrow_mut();

        match ancestor.values.get_mut(name.source()) {
            Some(slot) => *slot = value,
            None => panic!("Internal interpreter error: '{}' not found at distance {}", name.source(), distance),
        }
    }

    fn ancestor(this: &EnvironmentRef, distance: usize) -> EnvironmentRef {
        let mut environment = Rc::clone(this);

        for _ in 0..distance {
            let enclosing = environment.borrow().enclosing()
                .expect("Internal interpreter error: scope distance exceeds environment depth");
            environment = enclosing;
        }

        environment
    }
}
