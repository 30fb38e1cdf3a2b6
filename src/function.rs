use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::error::Unwind;
use crate::interpreter::Interpreter;
use crate::object::{Callable, Object};

/// A user-defined function or method: the parsed declaration plus the
/// environment it closed over, and whether it is a class's `init` (which
/// must always hand back `this`, even from a bare `return;`).
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<Environment>,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<Environment>, is_initializer: bool) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Creates a new environment nested inside the method's original
    /// closure and binds `this` in it — a closure-within-a-closure. When
    /// the method is later called, that environment becomes the parent of
    /// the call's own environment.
    pub fn bind(&self, instance: Object) -> LoxFunction {
        let environment = Environment::with_enclosing(&self.closure);
        environment.define("this".to_string(), instance);
        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Unwind> {
        let environment = Environment::with_enclosing(&self.closure);
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(param.lexeme.clone(), argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => {
                if self.is_initializer {
                    Ok(self.closure.get_at(0, "this"))
                } else {
                    Ok(Object::Nil)
                }
            }
            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    Ok(self.closure.get_at(0, "this"))
                } else {
                    Ok(value)
                }
            }
            Err(other) => Err(other),
        }
    }
}

/// A builtin implemented in Rust rather than Lox, e.g. `clock`.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: Box<dyn Fn(&[Object]) -> Object>,
}

impl NativeFunction {
    pub fn call(&self, arguments: &[Object]) -> Object {
        (self.func)(arguments)
    }
}

/// Shared call-argument-count/invoke logic for `Callable`, used by the
/// interpreter's `Call` expression handling.
pub fn arity(callable: &Callable) -> usize {
    match callable {
        Callable::Function(f) => f.arity(),
        Callable::Native(n) => n.arity,
        Callable::Class(c) => c.arity(),
    }
}

pub fn call(callable: &Callable, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Unwind> {
    match callable {
        Callable::Function(f) => f.call(interpreter, arguments),
        Callable::Native(n) => Ok(n.call(&arguments)),
        Callable::Class(c) => c.instantiate(interpreter, arguments),
    }
}
