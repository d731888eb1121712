//! The lexically scoped type environment.
//!
//! A scope stack of name -> type maps. Lookup walks outward; assignment
//! creates or narrows an entry in the innermost scope. Reads are tracked
//! so the unused-variable check can report locals that are written but
//! never read.

use rustc_hash::FxHashMap;
use trb_common::Span;
use trb_parser::ir::types::TypeExpr;

#[derive(Debug, Clone)]
struct Binding {
    ty: TypeExpr,
    span: Span,
    read: bool,
    /// Parameters are exempt from the unused-variable check.
    is_param: bool,
}

#[derive(Debug, Clone, Default)]
struct Scope {
    bindings: FxHashMap<String, Binding>,
}

/// Scoped local-variable typing state for one method body.
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    scopes: Vec<Scope>,
}

impl TypeEnv {
    #[must_use]
    pub fn new() -> Self {
        TypeEnv {
            scopes: vec![Scope::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope, returning `(name, span)` for every local
    /// that was assigned but never read.
    pub fn pop_scope(&mut self) -> Vec<(String, Span)> {
        let Some(scope) = self.scopes.pop() else {
            return Vec::new();
        };
        let mut unused: Vec<(String, Span)> = scope
            .bindings
            .into_iter()
            .filter(|(_, b)| !b.read && !b.is_param)
            .map(|(name, b)| (name, b.span))
            .collect();
        unused.sort_by_key(|(_, span)| span.start);
        unused
    }

    /// Define or update a local in the innermost scope. If the name exists
    /// in an outer scope, that entry is updated instead (Ruby locals are
    /// method-scoped, not block-scoped).
    pub fn assign(&mut self, name: &str, ty: TypeExpr, span: Span) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(binding) = scope.bindings.get_mut(name) {
                binding.ty = ty;
                return;
            }
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(
                name.to_string(),
                Binding {
                    ty,
                    span,
                    read: false,
                    is_param: false,
                },
            );
        }
    }

    /// Bind a parameter in the innermost scope.
    pub fn bind_param(&mut self, name: &str, ty: TypeExpr, span: Span) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(
                name.to_string(),
                Binding {
                    ty,
                    span,
                    read: false,
                    is_param: true,
                },
            );
        }
    }

    /// Look up a name, walking scopes outward. Marks the binding as read.
    pub fn lookup(&mut self, name: &str) -> Option<TypeExpr> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(binding) = scope.bindings.get_mut(name) {
                binding.read = true;
                return Some(binding.ty.clone());
            }
        }
        None
    }

    /// Whether a name is bound in any scope, without marking it read.
    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .rev()
            .any(|s| s.bindings.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_ty() -> TypeExpr {
        TypeExpr::named("String", Span::dummy())
    }

    #[test]
    fn lookup_walks_scopes_outward() {
        let mut env = TypeEnv::new();
        env.assign("x", string_ty(), Span::dummy());
        env.push_scope();
        assert_eq!(env.lookup("x"), Some(string_ty()));
        assert_eq!(env.lookup("missing"), None);
    }

    #[test]
    fn assignment_in_block_updates_method_local() {
        let mut env = TypeEnv::new();
        env.assign("x", string_ty(), Span::dummy());
        env.push_scope();
        env.assign("x", TypeExpr::named("Integer", Span::dummy()), Span::dummy());
        env.pop_scope();
        assert_eq!(env.lookup("x"), Some(TypeExpr::named("Integer", Span::dummy())));
    }

    #[test]
    fn unused_locals_are_reported_on_pop() {
        let mut env = TypeEnv::new();
        env.push_scope();
        env.assign("used", string_ty(), Span::new(0, 4));
        env.assign("dead", string_ty(), Span::new(10, 14));
        let _ = env.lookup("used");
        let unused = env.pop_scope();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].0, "dead");
    }

    #[test]
    fn params_are_exempt_from_unused_check() {
        let mut env = TypeEnv::new();
        env.push_scope();
        env.bind_param("arg", string_ty(), Span::dummy());
        assert!(env.pop_scope().is_empty());
    }
}
