use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// One frame of the lexical environment chain.
///
/// The global frame has no enclosing frame; every other frame has exactly
/// one. Frames are shared (`Rc<RefCell<_>>`) because closures keep their
/// declaration environment alive past the call that created it, and two
/// functions declared in the same block alias the same frame — mutation
/// through one is visible through the other.
#[derive(Debug)]
pub struct Environment<'a> {
    values: HashMap<String, Value<'a>>,
    enclosing: Option<Rc<RefCell<Environment<'a>>>>,
}

impl<'a> Environment<'a> {
    /// The global frame: no enclosing environment.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A local frame chained to `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment<'a>>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Unconditional insert/overwrite in this frame. No existence check:
    /// re-declaration is legal at the global scope.
    pub fn define(&mut self, name: &str, value: Value<'a>) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup: this frame first, then the enclosing chain.
    pub fn get(&self, name: &str, line: usize) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Dynamic assignment: mutates the first frame where the name already
    /// exists. Assignment never creates a binding.
    pub fn assign(&mut self, name: &str, value: Value<'a>, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Read at exactly `distance` enclosing hops. The resolver guarantees
    /// both the frame and the name exist; `None` means the resolver and the
    /// environment chain disagree, which callers surface as an
    /// undefined-variable error.
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Value<'a>> {
        if distance == 0 {
            self.values.get(name).cloned()
        } else {
            self.enclosing
                .as_ref()
                .and_then(|enclosing| enclosing.borrow().get_at(distance - 1, name))
        }
    }

    /// Write at exactly `distance` enclosing hops. See [`get_at`] for the
    /// `None` contract.
    ///
    /// [`get_at`]: Environment::get_at
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value<'a>) -> Option<()> {
        if distance == 0 {
            self.values.insert(name.to_string(), value);
            Some(())
        } else {
            self.enclosing
                .as_ref()
                .and_then(|enclosing| enclosing.borrow_mut().assign_at(distance - 1, name, value))
        }
    }
}

impl<'a> Default for Environment<'a> {
    fn default() -> Self {
        Self::new()
    }
}
