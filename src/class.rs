use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{RuntimeError, Unwind};
use crate::function::LoxFunction;
use crate::interpreter::Interpreter;
use crate::object::{Callable, Object};
use crate::token::Token;

/// A class's behavior: its name, optional superclass, and method table.
/// Field storage lives on `LoxInstance`, not here — "the instance stores
/// the state, the class stores the behavior".
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            methods,
        }
    }

    /// Looks up `name` in this class's own method table, then walks the
    /// superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }
        self.superclass.as_ref().and_then(|sup| sup.find_method(name))
    }

    /// A class's arity is its `init`'s arity, or 0 if it has none.
    pub fn arity(&self) -> usize {
        self.find_method("init").map(|init| init.arity()).unwrap_or(0)
    }

    pub fn instantiate(
        self: &Rc<Self>,
        interpreter: &mut Interpreter,
        arguments: Vec<Object>,
    ) -> Result<Object, Unwind> {
        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(self))));
        if let Some(initializer) = self.find_method("init") {
            let bound = initializer.bind(Object::Instance(Rc::clone(&instance)));
            bound.call(interpreter, arguments)?;
        }
        Ok(Object::Instance(instance))
    }
}

/// A live object: a reference to its class plus a mutable field table.
/// Lox lets code freely create new fields on any instance, so `set` never
/// needs to check whether a key already exists.
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Object>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    /// Instance fields shadow methods: a field hit returns immediately,
    /// otherwise the class (and its superclass chain) is searched and the
    /// method found is bound to `self_obj`.
    pub fn get(&self, name: &Token, self_obj: &Object) -> Result<Object, RuntimeError> {
        if let Some(value) = self.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(method) = self.class.find_method(&name.lexeme) {
            return Ok(Object::Callable(Callable::Function(Rc::new(
                method.bind(self_obj.clone()),
            ))));
        }
        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}
