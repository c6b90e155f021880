use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared handle to one scope frame.  Closures, call frames and the
/// interpreter all hold these; a frame lives as long as its longest holder.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: local bindings plus a link to the enclosing scope.
///
/// The `enclosing` link is fixed at construction and never re‑parented.
#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Insert or overwrite in this frame only.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// The frame exactly `distance` links outward from `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: EnvRef = current
                .borrow()
                .enclosing
                .clone()
                // panic here because the resolver computed a distance deeper
                // than the runtime chain, which is an interpreter bug
                .unwrap_or_else(|| panic!("No enclosing environment at distance {}", distance));
            current = next;
        }

        current
    }

    /// Read `name` from the frame `distance` links out.  The resolver
    /// guarantees the binding exists there.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Value {
        Self::ancestor(env, distance)
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("Resolved variable '{}' missing at distance {}", name, distance))
    }

    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) {
        Self::ancestor(env, distance)
            .borrow_mut()
            .values
            .insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Environment {
    // Values may point back at this frame through closures; print names only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("enclosing", &self.enclosing.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(lexeme: &str) -> Token {
        Token::identifier(lexeme, 1)
    }

    #[test]
    fn get_walks_enclosing_chain() {
        let global = Environment::new().into_ref();
        global.borrow_mut().define("a", Value::Number(1.0));
        let local = Environment::with_enclosing(Rc::clone(&global)).into_ref();

        assert_eq!(local.borrow().get(&name("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn define_shadows_without_touching_enclosing() {
        let global = Environment::new().into_ref();
        global.borrow_mut().define("a", Value::Number(1.0));
        let local = Environment::with_enclosing(Rc::clone(&global)).into_ref();
        local.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(local.borrow().get(&name("a")).unwrap(), Value::Number(2.0));
        assert_eq!(global.borrow().get(&name("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_updates_the_declaring_frame() {
        let global = Environment::new().into_ref();
        global.borrow_mut().define("a", Value::Nil);
        let local = Environment::with_enclosing(Rc::clone(&global)).into_ref();

        local
            .borrow_mut()
            .assign(&name("a"), Value::Bool(true))
            .unwrap();

        assert_eq!(global.borrow().get(&name("a")).unwrap(), Value::Bool(true));
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let env = Environment::new();
        let err = env.get(&name("missing")).unwrap_err();

        assert_eq!(err.to_string(), "Undefined variable 'missing'.\n[line 1]");
    }

    #[test]
    fn get_at_and_assign_at_skip_intermediate_frames() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("x", Value::Number(1.0));
        let middle = Environment::with_enclosing(Rc::clone(&outer)).into_ref();
        middle.borrow_mut().define("x", Value::Number(2.0));
        let inner = Environment::with_enclosing(Rc::clone(&middle)).into_ref();

        assert_eq!(Environment::get_at(&inner, 2, "x"), Value::Number(1.0));
        assert_eq!(Environment::get_at(&inner, 1, "x"), Value::Number(2.0));

        Environment::assign_at(&inner, 2, &name("x"), Value::Number(9.0));
        assert_eq!(outer.borrow().get(&name("x")).unwrap(), Value::Number(9.0));
        assert_eq!(middle.borrow().get(&name("x")).unwrap(), Value::Number(2.0));
    }
}
