//! The subtype relation.
//!
//! Nominal where the program declares nominal relationships (class
//! parents, module inclusion), structural where the target is an
//! interface: a class conforms to an interface when it defines every
//! required method with compatible types, whether or not it says
//! `implements`.
//!
//! Union/intersection rules:
//! - `T <: Union(Us)` iff `T <: Ui` for some i; `Union(Ts) <: U` iff all.
//! - `Intersection(Ts) <: U` iff some `Ti <: U`; `T <: Intersection(Us)`
//!   iff `T <: Ui` for all i.

use crate::aliases::TypeAliasRegistry;
use rustc_hash::FxHashMap;
use trb_parser::ir::types::TypeExpr;
use trb_parser::{ClassDecl, ConstantDecl, InterfaceDecl, MethodSig, ModuleDecl, Program};

/// Name-indexed views of the program's declarations, shared by the
/// subtype checker and the solver.
#[derive(Debug, Clone, Default)]
pub struct DeclTable<'p> {
    pub classes: FxHashMap<&'p str, &'p ClassDecl>,
    pub modules: FxHashMap<&'p str, &'p ModuleDecl>,
    pub interfaces: FxHashMap<&'p str, &'p InterfaceDecl>,
    pub constants: FxHashMap<&'p str, &'p ConstantDecl>,
}

impl<'p> DeclTable<'p> {
    #[must_use]
    pub fn build(program: &'p Program) -> Self {
        let mut table = DeclTable::default();
        collect_decls(&program.declarations, &mut table);
        for iface in program.interfaces.values() {
            table.interfaces.entry(iface.name.as_str()).or_insert(iface);
        }
        table
    }

    /// All method signatures an interface requires, parents included.
    #[must_use]
    pub fn interface_methods(&self, name: &str) -> Vec<&'p MethodSig> {
        let mut methods = Vec::new();
        let mut stack = vec![name];
        let mut seen = rustc_hash::FxHashSet::default();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.to_string()) {
                continue;
            }
            if let Some(iface) = self.interfaces.get(current) {
                methods.extend(iface.methods.iter());
                stack.extend(iface.parents.iter().map(String::as_str));
            }
        }
        methods
    }
}

fn collect_decls<'p>(declarations: &'p [trb_parser::Declaration], table: &mut DeclTable<'p>) {
    use trb_parser::Declaration;
    for decl in declarations {
        match decl {
            Declaration::Class(class) => {
                table.classes.insert(class.name.as_str(), class);
                collect_decls(&class.members, table);
            }
            Declaration::Module(module) => {
                table.modules.insert(module.name.as_str(), module);
                collect_decls(&module.members, table);
            }
            Declaration::Interface(iface) => {
                table.interfaces.insert(iface.name.as_str(), iface);
            }
            Declaration::Constant(constant) => {
                table.constants.insert(constant.name.as_str(), constant);
            }
            _ => {}
        }
    }
}

/// Decides `sub <: sup` against one program's declarations.
pub struct SubtypeChecker<'p, 'r> {
    pub table: &'r DeclTable<'p>,
    pub aliases: &'r TypeAliasRegistry,
}

impl<'p, 'r> SubtypeChecker<'p, 'r> {
    #[must_use]
    pub fn new(table: &'r DeclTable<'p>, aliases: &'r TypeAliasRegistry) -> Self {
        SubtypeChecker { table, aliases }
    }

    /// Whether `sub` is a subtype of `sup`.
    #[must_use]
    pub fn is_subtype(&self, sub: &TypeExpr, sup: &TypeExpr) -> bool {
        let sub = self.aliases.resolve(sub);
        let sup = self.aliases.resolve(sup);
        self.is_subtype_resolved(&sub, &sup)
    }

    fn is_subtype_resolved(&self, sub: &TypeExpr, sup: &TypeExpr) -> bool {
        if sub == sup {
            return true;
        }
        // `any` is compatible in both directions; `never` has no values;
        // `void` accepts anything (only meaningful as a return type).
        if sub.is_any() || sup.is_any() || sub.is_never() || sup.is_void() {
            return true;
        }

        // Union/intersection decomposition. Supertype-side union first so
        // that `Integer <: (Integer | nil)` holds.
        if let TypeExpr::Union { members, .. } = sub {
            return members.iter().all(|m| self.is_subtype_resolved(m, sup));
        }
        if let TypeExpr::Union { members, .. } = sup {
            return members.iter().any(|m| self.is_subtype_resolved(sub, m));
        }
        if let TypeExpr::Intersection { members, .. } = sup {
            return members.iter().all(|m| self.is_subtype_resolved(sub, m));
        }
        if let TypeExpr::Intersection { members, .. } = sub {
            return members.iter().any(|m| self.is_subtype_resolved(m, sup));
        }

        match (sub, sup) {
            // A literal widens to its base type.
            (TypeExpr::Literal { value, .. }, _) => {
                let base = TypeExpr::named(value.base_type_name(), sub.span());
                &base == sup || self.is_subtype_resolved(&base, sup)
            }
            (
                TypeExpr::Function {
                    params: sub_params,
                    ret: sub_ret,
                    ..
                },
                TypeExpr::Function {
                    params: sup_params,
                    ret: sup_ret,
                    ..
                },
            ) => {
                sub_params.len() == sup_params.len()
                    // Parameters are contravariant, returns covariant.
                    && sup_params
                        .iter()
                        .zip(sub_params.iter())
                        .all(|(sup_p, sub_p)| self.is_subtype_resolved(sup_p, sub_p))
                    && self.is_subtype_resolved(sub_ret, sup_ret)
            }
            (
                TypeExpr::Named {
                    name: sub_name,
                    args: sub_args,
                    ..
                },
                TypeExpr::Named {
                    name: sup_name,
                    args: sup_args,
                    ..
                },
            ) => {
                if sub_name == sup_name {
                    // Covariant type arguments of matching arity.
                    return sub_args.len() == sup_args.len()
                        && sub_args
                            .iter()
                            .zip(sup_args.iter())
                            .all(|(a, b)| self.is_subtype_resolved(a, b));
                }
                // Structural conformance to an interface.
                if self.table.interfaces.contains_key(sup_name.as_str()) {
                    if let Some(&class) = self.table.classes.get(sub_name.as_str()) {
                        return self.class_conforms_to_interface(class, sup_name);
                    }
                }
                // Nominal: walk parents and included modules.
                self.nominal_ancestor(sub_name, sup_name)
            }
            _ => false,
        }
    }

    /// Walk `sub_name`'s parent chain and included modules looking for
    /// `sup_name`.
    fn nominal_ancestor(&self, sub_name: &str, sup_name: &str) -> bool {
        let mut current = sub_name.to_string();
        let mut hops = 0;
        while let Some(class) = self.table.classes.get(current.as_str()) {
            if class.includes.iter().any(|m| m == sup_name) {
                return true;
            }
            match &class.parent {
                Some(parent) if hops < 32 => {
                    if parent == sup_name {
                        return true;
                    }
                    current = parent.clone();
                    hops += 1;
                }
                _ => break,
            }
        }
        false
    }

    /// Structural check: does `class` define every method the interface
    /// requires, with contravariant parameters and a covariant return?
    #[must_use]
    pub fn class_conforms_to_interface(&self, class: &ClassDecl, interface: &str) -> bool {
        self.table
            .interface_methods(interface)
            .iter()
            .all(|&required| match class.method(&required.name) {
                Some(implementation) => self.method_is_compatible(implementation, required),
                None => false,
            })
    }

    /// Implementation parameters must be supertypes of the interface's
    /// (contravariance); the return must be a subtype (covariance).
    /// Untyped positions are compatible with anything.
    #[must_use]
    pub fn method_is_compatible(
        &self,
        implementation: &trb_parser::FunctionDecl,
        required: &MethodSig,
    ) -> bool {
        if implementation.params.len() != required.params.len() {
            return false;
        }
        let params_ok = required
            .params
            .iter()
            .zip(implementation.params.iter())
            .all(|(req, imp)| match (&req.ty, &imp.ty) {
                (Some(req_ty), Some(imp_ty)) => self.is_subtype(req_ty, imp_ty),
                _ => true,
            });
        let ret_ok = match (&implementation.return_type, &required.return_type) {
            (Some(imp_ret), Some(req_ret)) => self.is_subtype(imp_ret, req_ret),
            _ => true,
        };
        params_ok && ret_ok
    }
}
