use std::rc::Rc;
use crate::compiler::ast::FunctionDecl;
use crate::runtime::environment::{Environment, EnvironmentRef};
use crate::runtime::error::{RuntimeResult, Unwind};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::value::{Callable, Value};

/// A user-defined function together with the frame it was declared in.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvironmentRef,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvironmentRef) -> Function {
        Function { declaration, closure }
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        self.declaration.name.source()
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter<'_>, arguments: Vec<Value>) -> RuntimeResult<Value> {
        let environment = Environment::new_with_parent(Rc::clone(&self.closure));

        {
            let mut frame = environment.borrow_mut();

            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                frame.define(param, argument)?;
            }
        }

        tracing::trace!(function = self.name(), "call");

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => Ok(Value::Nil),
            Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Error(error)) => Err(error),
        }
    }
}
