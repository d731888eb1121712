//! The type-alias registry.
//!
//! Aliases are registered in two phases so that an alias may reference one
//! declared later in the file: first every name is declared, then every
//! target is validated. Cycle detection is a DFS over the alias reference
//! graph; cyclic aliases are rejected and removed so that [`resolve`]
//! always terminates.
//!
//! [`resolve`]: TypeAliasRegistry::resolve

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use trb_parser::TypeAliasDecl;
use trb_parser::ir::types::TypeExpr;

/// Why a registration was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasError {
    /// An alias with this name already exists.
    Duplicate(String),
    /// The alias participates in a reference cycle.
    Cyclic(String),
}

impl std::fmt::Display for AliasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AliasError::Duplicate(name) => write!(f, "type alias `{name}` is already defined"),
            AliasError::Cyclic(name) => {
                write!(f, "type alias `{name}` refers to itself (directly or transitively)")
            }
        }
    }
}

#[derive(Debug, Clone)]
struct AliasEntry {
    generics: Vec<String>,
    target: TypeExpr,
}

/// User-declared type aliases, keyed by name, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TypeAliasRegistry {
    aliases: IndexMap<String, AliasEntry>,
}

impl TypeAliasRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a program's alias table. Two-phase: all names
    /// are visible before any target is validated, so forward references
    /// work. Returns the errors found during validation.
    pub fn from_program(aliases: &IndexMap<String, TypeAliasDecl>) -> (Self, Vec<(String, AliasError)>) {
        let mut registry = Self::new();
        for (name, decl) in aliases {
            registry.aliases.insert(
                name.clone(),
                AliasEntry {
                    generics: decl.generics.iter().map(|g| g.name.clone()).collect(),
                    target: decl.target.clone(),
                },
            );
        }
        let mut errors = Vec::new();
        let cyclic: Vec<String> = registry
            .aliases
            .keys()
            .filter(|name| registry.is_cyclic(name))
            .cloned()
            .collect();
        for name in cyclic {
            registry.aliases.shift_remove(&name);
            errors.push((name.clone(), AliasError::Cyclic(name)));
        }
        (registry, errors)
    }

    /// Register a single alias. Fails on duplicates and on cycles created
    /// by this registration.
    pub fn register(
        &mut self,
        name: &str,
        generics: Vec<String>,
        target: TypeExpr,
    ) -> Result<(), AliasError> {
        if self.aliases.contains_key(name) {
            return Err(AliasError::Duplicate(name.to_string()));
        }
        self.aliases
            .insert(name.to_string(), AliasEntry { generics, target });
        if self.is_cyclic(name) {
            self.aliases.shift_remove(name);
            return Err(AliasError::Cyclic(name.to_string()));
        }
        Ok(())
    }

    /// Whether `name` is a registered alias.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// Number of generic parameters the alias declares.
    #[must_use]
    pub fn arity(&self, name: &str) -> Option<usize> {
        self.aliases.get(name).map(|e| e.generics.len())
    }

    /// DFS from `start` looking for a cycle back to it.
    fn is_cyclic(&self, start: &str) -> bool {
        let mut visited = FxHashSet::default();
        let mut stack = vec![start.to_string()];
        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            if let Some(entry) = self.aliases.get(&name) {
                let mut referenced = Vec::new();
                collect_alias_refs(&entry.target, &self.aliases, &mut referenced);
                if referenced.iter().any(|r| r == start) {
                    return true;
                }
                stack.extend(referenced);
            }
        }
        false
    }

    /// Expand aliases in `ty` transitively, substituting generic
    /// arguments. Terminates for any registry that passed validation.
    #[must_use]
    pub fn resolve(&self, ty: &TypeExpr) -> TypeExpr {
        self.resolve_inner(ty, 0)
    }

    fn resolve_inner(&self, ty: &TypeExpr, depth: u32) -> TypeExpr {
        // Validated registries are acyclic; the guard is for registries
        // mutated after validation.
        if depth > 64 {
            return ty.clone();
        }
        match ty {
            TypeExpr::Named { name, args, span } => {
                let resolved_args: Vec<TypeExpr> = args
                    .iter()
                    .map(|a| self.resolve_inner(a, depth + 1))
                    .collect();
                if let Some(entry) = self.aliases.get(name) {
                    let mut substitution = rustc_hash::FxHashMap::default();
                    for (param, arg) in entry.generics.iter().zip(resolved_args.iter()) {
                        substitution.insert(param.clone(), arg.clone());
                    }
                    let substituted = substitute(&entry.target, &substitution);
                    return self.resolve_inner(&substituted, depth + 1);
                }
                TypeExpr::Named {
                    name: name.clone(),
                    args: resolved_args,
                    span: *span,
                }
            }
            TypeExpr::Union { members, span } => trb_parser::union_of(
                members.iter().map(|m| self.resolve_inner(m, depth + 1)).collect(),
                *span,
            ),
            TypeExpr::Intersection { members, span } => trb_parser::intersection_of(
                members.iter().map(|m| self.resolve_inner(m, depth + 1)).collect(),
                *span,
            ),
            TypeExpr::Function { params, ret, span } => TypeExpr::Function {
                params: params
                    .iter()
                    .map(|p| self.resolve_inner(p, depth + 1))
                    .collect(),
                ret: Box::new(self.resolve_inner(ret, depth + 1)),
                span: *span,
            },
            other => other.clone(),
        }
    }
}

/// Substitute type variables by name.
#[must_use]
pub fn substitute(
    ty: &TypeExpr,
    substitution: &rustc_hash::FxHashMap<String, TypeExpr>,
) -> TypeExpr {
    match ty {
        TypeExpr::TypeVar { name, .. } => substitution
            .get(name)
            .cloned()
            .unwrap_or_else(|| ty.clone()),
        TypeExpr::Named { name, args, span } => TypeExpr::Named {
            name: name.clone(),
            args: args.iter().map(|a| substitute(a, substitution)).collect(),
            span: *span,
        },
        TypeExpr::Union { members, span } => trb_parser::union_of(
            members.iter().map(|m| substitute(m, substitution)).collect(),
            *span,
        ),
        TypeExpr::Intersection { members, span } => trb_parser::intersection_of(
            members.iter().map(|m| substitute(m, substitution)).collect(),
            *span,
        ),
        TypeExpr::Function { params, ret, span } => TypeExpr::Function {
            params: params.iter().map(|p| substitute(p, substitution)).collect(),
            ret: Box::new(substitute(ret, substitution)),
            span: *span,
        },
        other => other.clone(),
    }
}

/// Collect names in `ty` that refer to registered aliases.
fn collect_alias_refs(
    ty: &TypeExpr,
    aliases: &IndexMap<String, AliasEntry>,
    out: &mut Vec<String>,
) {
    match ty {
        TypeExpr::Named { name, args, .. } => {
            if aliases.contains_key(name) {
                out.push(name.clone());
            }
            for arg in args {
                collect_alias_refs(arg, aliases, out);
            }
        }
        TypeExpr::Union { members, .. } | TypeExpr::Intersection { members, .. } => {
            for member in members {
                collect_alias_refs(member, aliases, out);
            }
        }
        TypeExpr::Function { params, ret, .. } => {
            for param in params {
                collect_alias_refs(param, aliases, out);
            }
            collect_alias_refs(ret, aliases, out);
        }
        _ => {}
    }
}
