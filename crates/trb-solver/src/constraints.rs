//! The constraint checker.
//!
//! Verifies, after inference:
//! - generic arity: every `Name<Args>` supplies as many arguments as the
//!   referenced declaration binds;
//! - generic bounds: each argument satisfies the declared bound;
//! - `implements` clauses: the class defines every method the interface
//!   (and its parents) requires, with contravariant parameter types and a
//!   covariant return type;
//! - intersections never combine two unrelated nominal class types.

use crate::aliases::TypeAliasRegistry;
use crate::subtype::{DeclTable, SubtypeChecker};
use trb_common::diagnostics::{Diagnostic, DiagnosticCategory, codes};
use trb_parser::ir::types::TypeExpr;
use trb_parser::{ClassDecl, Declaration, GenericParam, Program};

/// Run every constraint check over the program.
pub fn check_program(
    program: &Program,
    table: &DeclTable<'_>,
    aliases: &TypeAliasRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut checker = ConstraintChecker {
        table,
        aliases,
        diagnostics,
    };
    checker.check_declarations(&program.declarations);
}

struct ConstraintChecker<'a, 'p> {
    table: &'a DeclTable<'p>,
    aliases: &'a TypeAliasRegistry,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a, 'p> ConstraintChecker<'a, 'p> {
    fn check_declarations(&mut self, declarations: &[Declaration]) {
        for decl in declarations {
            match decl {
                Declaration::Function(func) => {
                    for param in &func.params {
                        if let Some(ty) = &param.ty {
                            self.check_type(ty);
                        }
                    }
                    if let Some(ret) = &func.return_type {
                        self.check_type(ret);
                    }
                }
                Declaration::Class(class) => {
                    self.check_implements(class);
                    for binding in class.ivars.iter().chain(class.cvars.iter()) {
                        self.check_type(&binding.ty);
                    }
                    self.check_declarations(&class.members);
                }
                Declaration::Module(module) => self.check_declarations(&module.members),
                Declaration::Interface(iface) => {
                    for method in &iface.methods {
                        for param in &method.params {
                            if let Some(ty) = &param.ty {
                                self.check_type(ty);
                            }
                        }
                        if let Some(ret) = &method.return_type {
                            self.check_type(ret);
                        }
                    }
                }
                Declaration::TypeAlias(alias) => self.check_type(&alias.target),
                Declaration::Constant(constant) => {
                    if let Some(ty) = &constant.ty {
                        self.check_type(ty);
                    }
                }
                Declaration::Statement(_) => {}
            }
        }
    }

    /// Walk a type expression checking arity, bounds and intersection
    /// sanity.
    fn check_type(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Named { name, args, span } => {
                for arg in args {
                    self.check_type(arg);
                }
                if let Some(generics) = self.generic_params_of(name) {
                    let required = generics.iter().filter(|g| g.default.is_none()).count();
                    if !args.is_empty() && (args.len() < required || args.len() > generics.len()) {
                        self.diagnostics.push(Diagnostic::error(
                            DiagnosticCategory::Resolution,
                            codes::GENERIC_ARITY_MISMATCH,
                            *span,
                            format!(
                                "`{name}` expects {} type argument(s), got {}",
                                generics.len(),
                                args.len()
                            ),
                        ));
                        return;
                    }
                    for (param, arg) in generics.iter().zip(args.iter()) {
                        if let Some(bound) = &param.bound {
                            let checker = SubtypeChecker::new(self.table, self.aliases);
                            if !checker.is_subtype(arg, bound) {
                                self.diagnostics.push(Diagnostic::error(
                                    DiagnosticCategory::Type,
                                    codes::CONSTRAINT_NOT_SATISFIED,
                                    arg.span(),
                                    format!(
                                        "type argument `{arg}` does not satisfy the bound `{bound}` of `{}`",
                                        param.name
                                    ),
                                ));
                            }
                        }
                    }
                }
            }
            TypeExpr::Union { members, .. } => {
                for member in members {
                    self.check_type(member);
                }
            }
            TypeExpr::Intersection { members, span } => {
                for member in members {
                    self.check_type(member);
                }
                // Two unrelated nominal classes cannot both be inhabited.
                let class_names: Vec<&str> = members
                    .iter()
                    .filter_map(|m| match m {
                        TypeExpr::Named { name, .. }
                            if self.table.classes.contains_key(name.as_str()) =>
                        {
                            Some(name.as_str())
                        }
                        _ => None,
                    })
                    .collect();
                if class_names.len() > 1 {
                    self.diagnostics.push(Diagnostic::error(
                        DiagnosticCategory::Type,
                        codes::CLASS_INTERSECTION,
                        *span,
                        format!(
                            "an intersection cannot combine the class types `{}` and `{}`",
                            class_names[0], class_names[1]
                        ),
                    ));
                }
            }
            TypeExpr::Function { params, ret, .. } => {
                for param in params {
                    self.check_type(param);
                }
                self.check_type(ret);
            }
            _ => {}
        }
    }

    fn generic_params_of(&self, name: &str) -> Option<&'p [GenericParam]> {
        if let Some(class) = self.table.classes.get(name) {
            if class.generics.is_empty() {
                return None;
            }
            return Some(&class.generics);
        }
        if let Some(iface) = self.table.interfaces.get(name) {
            if iface.generics.is_empty() {
                return None;
            }
            return Some(&iface.generics);
        }
        None
    }

    /// Check each `implements` clause on a class.
    fn check_implements(&mut self, class: &ClassDecl) {
        for (index, interface) in class.implements.iter().enumerate() {
            let clause_span = class
                .implements_spans
                .get(index.min(class.implements_spans.len().saturating_sub(1)))
                .copied()
                .unwrap_or(class.span);
            if !self.table.interfaces.contains_key(interface.as_str()) {
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticCategory::Resolution,
                    codes::UNDEFINED_INTERFACE,
                    clause_span,
                    format!("undefined interface `{interface}`"),
                ));
                continue;
            }
            let checker = SubtypeChecker::new(self.table, self.aliases);
            for required in self.table.interface_methods(interface) {
                match class.method(&required.name) {
                    None => {
                        self.diagnostics.push(Diagnostic::error(
                            DiagnosticCategory::Resolution,
                            codes::MISSING_INTERFACE_METHOD,
                            clause_span,
                            format!(
                                "class `{}` implements `{interface}` but does not define `{}`",
                                class.name, required.name
                            ),
                        ));
                    }
                    Some(implementation) => {
                        if !checker.method_is_compatible(implementation, required) {
                            self.diagnostics.push(Diagnostic::error(
                                DiagnosticCategory::Resolution,
                                codes::INCOMPATIBLE_INTERFACE_METHOD,
                                implementation.name_span,
                                format!(
                                    "`{}#{}` is not compatible with the signature required by `{interface}`",
                                    class.name, required.name
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }
}
