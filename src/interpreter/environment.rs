// File: src/interpreter/environment.rs
//
// Lexical scoping environment for variable management in the interpreter.
// Implements a stack of scopes where inner scopes shadow outer scopes.

use super::value::Value;
use std::collections::HashMap;

/// Variable storage using lexical scoping
///
/// The Environment maintains a stack of scopes. Lookups search from the
/// innermost scope outward, so inner definitions shadow outer ones.
///
/// Function calls do not see their caller's locals: the interpreter switches to
/// a fresh frame (globals + parameter scope) for each call, see
/// [`Environment::call_frame`].
#[derive(Clone, Debug)]
pub struct Environment {
    scopes: Vec<HashMap<String, Value>>,
}

impl Environment {
    /// Create a new environment with a single global scope
    pub fn new() -> Self {
        Environment { scopes: vec![HashMap::new()] }
    }

    /// Push a new scope onto the stack (e.g., entering a block)
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope from the stack. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Get a variable, searching from inner to outer scopes
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Define a new variable in the current (innermost) scope
    pub fn define(&mut self, name: String, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, value);
        }
    }

    /// Set an existing variable, searching from inner to outer scopes.
    /// If not found, creates it in the current scope.
    pub fn set(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.define(name.to_string(), value);
    }

    /// Mutable access to an existing variable for in-place updates
    /// (index assignment, `push`), so shared collections are not copied.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(name))
    }

    /// Names visible from the current scope, used for "did you mean" hints
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.scopes.iter().flat_map(|scope| scope.keys().cloned()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Detaches everything above the global scope and returns it, leaving a
    /// fresh frame (globals + one empty scope) for a function call.
    pub fn call_frame(&mut self) -> Vec<HashMap<String, Value>> {
        let saved = self.scopes.split_off(1);
        self.push_scope();
        saved
    }

    /// Restores the caller's scopes saved by [`Environment::call_frame`]
    pub fn restore_frame(&mut self, saved: Vec<HashMap<String, Value>>) {
        self.scopes.truncate(1);
        self.scopes.extend(saved);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
