use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::object::Object;
use crate::token::Token;

/// One lexical scope: a table of bindings plus a link to the scope it is
/// nested in. Environments form a singly-linked chain rooted at `globals`;
/// closures and bound methods share ownership of the chain via `Rc`, which
/// is why `define`/`assign` take `&self`/interior mutability rather than
/// `&mut self` — multiple `LoxFunction`s may hold the same environment.
pub struct Environment {
    values: RefCell<HashMap<String, Object>>,
    enclosing: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            values: RefCell::new(HashMap::new()),
            enclosing: None,
        })
    }

    pub fn with_enclosing(enclosing: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            values: RefCell::new(HashMap::new()),
            enclosing: Some(Rc::clone(enclosing)),
        })
    }

    /// Unconditionally binds `name` in this scope. At global scope this is
    /// what makes `var a = 1; var a = 2;` legal at the REPL: the resolver
    /// never pushes a scope for the top level, so the only place a
    /// redefinition is ever rejected is the resolver's own `declare`.
    pub fn define(&self, name: String, value: Object) {
        self.values.borrow_mut().insert(name, value);
    }

    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(value) = self.values.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(enclosing) = &self.enclosing {
            return enclosing.get(name);
        }
        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    pub fn assign(&self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if self.values.borrow().contains_key(&name.lexeme) {
            self.values.borrow_mut().insert(name.lexeme.clone(), value);
            return Ok(());
        }
        if let Some(enclosing) = &self.enclosing {
            return enclosing.assign(name, value);
        }
        Err(RuntimeError::new(
            name.clone(),
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    /// Follows `enclosing` exactly `distance` times. Only called with a
    /// distance the resolver produced, which guarantees the chain is long
    /// enough.
    fn ancestor(self: &Rc<Self>, distance: usize) -> Rc<Environment> {
        let mut env = Rc::clone(self);
        for _ in 0..distance {
            env = Rc::clone(
                env.enclosing
                    .as_ref()
                    .expect("resolver produced a distance longer than the scope chain"),
            );
        }
        env
    }

    pub fn get_at(self: &Rc<Self>, distance: usize, name: &str) -> Object {
        self.ancestor(distance)
            .values
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("resolver claimed '{name}' exists {distance} scopes out"))
    }

    pub fn assign_at(self: &Rc<Self>, distance: usize, name: &Token, value: Object) {
        self.ancestor(distance)
            .values
            .borrow_mut()
            .insert(name.lexeme.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn token(lexeme: &str) -> Token {
        Token::new(TokenType::Identifier, lexeme, None, 1)
    }

    #[test]
    fn get_walks_enclosing_chain() {
        let globals = Environment::new();
        globals.define("a".to_string(), Object::Number(1.0));
        let block = Environment::with_enclosing(&globals);

        assert!(matches!(block.get(&token("a")), Ok(Object::Number(n)) if n == 1.0));
    }

    #[test]
    fn assign_mutates_nearest_binding_only() {
        let globals = Environment::new();
        globals.define("a".to_string(), Object::Number(1.0));
        let block = Environment::with_enclosing(&globals);
        block.define("a".to_string(), Object::Number(2.0));

        block.assign(&token("a"), Object::Number(3.0)).unwrap();

        assert!(matches!(block.get(&token("a")), Ok(Object::Number(n)) if n == 3.0));
        assert!(matches!(globals.get(&token("a")), Ok(Object::Number(n)) if n == 1.0));
    }

    #[test]
    fn assign_to_undefined_fails() {
        let globals = Environment::new();
        let err = globals.assign(&token("missing"), Object::Nil).unwrap_err();
        assert_eq!(err.message, "Undefined variable 'missing'.");
    }

    #[test]
    fn get_at_and_assign_at_operate_on_the_resolved_scope() {
        let globals = Environment::new();
        let outer = Environment::with_enclosing(&globals);
        outer.define("x".to_string(), Object::Number(1.0));
        let inner = Environment::with_enclosing(&outer);

        assert!(matches!(inner.get_at(1, "x"), Object::Number(n) if n == 1.0));
        inner.assign_at(1, &token("x"), Object::Number(5.0));
        assert!(matches!(inner.get_at(1, "x"), Object::Number(n) if n == 5.0));
    }
}
