//! Lexical scope tracking
//!
//! [`ScopeStack`] maps names to inferred [`Ty`]s. One scope is pushed per
//! function, block, loop and protected region, and popped exactly once when
//! the construct is left. With no scope active, declarations land in the
//! global table (top-level statements of the entry point).

use crate::codegen::types::Ty;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    globals: FxHashMap<String, Ty>,
    scopes: Vec<FxHashMap<String, Ty>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack::default()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Record `name` in the innermost scope, or globally when none is active.
    pub fn declare(&mut self, name: &str, ty: Ty) {
        log::debug!("declare {}: {}", name, ty);
        self.set(name, ty);
    }

    /// Overwrite the type of `name` in the innermost scope (or globally).
    pub fn set(&mut self, name: &str, ty: Ty) {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.to_string(), ty),
            None => self.globals.insert(name.to_string(), ty),
        };
    }

    /// Look `name` up from the innermost scope outward.
    pub fn lookup(&self, name: &str) -> Option<&Ty> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.globals.get(name))
    }

    /// Type of `name`, or [`Ty::Unknown`] when it was never declared.
    pub fn get(&self, name: &str) -> Ty {
        self.lookup(name).cloned().unwrap_or(Ty::Unknown)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Whether `name` is declared in the innermost scope itself.
    pub fn is_declared_in_current(&self, name: &str) -> bool {
        match self.scopes.last() {
            Some(scope) => scope.contains_key(name),
            None => self.globals.contains_key(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", Ty::Int);
        scopes.push_scope();
        scopes.declare("x", Ty::Str);
        assert_eq!(scopes.get("x"), Ty::Str);
        assert!(scopes.is_declared_in_current("x"));
        scopes.pop_scope();
        assert_eq!(scopes.get("x"), Ty::Int);
    }

    #[test]
    fn test_pop_discards_declarations() {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        scopes.declare("tmp", Ty::Float);
        scopes.pop_scope();
        assert!(!scopes.is_declared("tmp"));
        assert_eq!(scopes.get("tmp"), Ty::Unknown);
        assert_eq!(scopes.depth(), 0);
    }

    #[test]
    fn test_set_targets_innermost_scope() {
        let mut scopes = ScopeStack::new();
        scopes.declare("g", Ty::Int);
        scopes.push_scope();
        scopes.set("g", Ty::List);
        assert_eq!(scopes.get("g"), Ty::List);
        assert!(!scopes.is_declared_in_current("missing"));
        scopes.pop_scope();
        assert_eq!(scopes.get("g"), Ty::Int);
    }
}
