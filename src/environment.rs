use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::LoxError;
use crate::value::Value;

/// A lexical scope frame: a name → value map with an optional parent
/// link. Frames are created per block, per function invocation, and per
/// class body, and stay alive for as long as any closure references
/// them.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Unconditional insert at this scope. Redefinition overwrites
    /// silently; duplicate-declaration checking for locals is the
    /// resolver's job, and globals permit redefinition.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value, LoxError> {
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

    /// Overwrite an existing binding, searching outward. Never defines.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<(), LoxError> {
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

    /// Walk the parent chain exactly `distance` hops. `None` means the
    /// chain is shorter than the resolver promised.
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut current: Rc<RefCell<Environment>> = env.clone();

        for _ in 0..distance {
            let next: Option<Rc<RefCell<Environment>>> = current.borrow().enclosing.clone();

            match next {
                Some(enclosing) => current = enclosing,
                None => return None,
            }
        }

        Some(current)
    }

    /// Read a resolved local at a fixed depth.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        let target: Rc<RefCell<Environment>> = Self::ancestor(env, distance)?;

        let value: Option<Value> = target.borrow().values.get(name).cloned();

        value
    }

    /// Write a resolved local at a fixed depth. Returns `false` when the
    /// frame is missing, which means the resolver and interpreter are
    /// out of sync.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        match Self::ancestor(env, distance) {
            Some(target) => {
                target.borrow_mut().values.insert(name.to_string(), value);
                true
            }

            None => false,
        }
    }
}
