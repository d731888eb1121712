//! Flow-based type inference.
//!
//! [`Solver::check_program`] walks every declaration, assigns a type to
//! every expression node (memoized by [`NodeId`]), infers method returns
//! from explicit `return` statements plus the implicit value of the last
//! expression, and records diagnostics instead of failing.
//!
//! Laziness: a method's return is computed on first request (a call site
//! may ask before the declaration is visited) and memoized; recursion is
//! cut with an in-progress set that yields `any`.

use crate::aliases::TypeAliasRegistry;
use crate::builtins;
use crate::constraints;
use crate::env::TypeEnv;
use crate::subtype::{DeclTable, SubtypeChecker};
use rustc_hash::{FxHashMap, FxHashSet};
use trb_common::diagnostics::{self, Diagnostic, DiagnosticCategory, codes};
use trb_common::{CompilerOptions, Span, Strictness};
use trb_parser::ir::types::TypeExpr;
use trb_parser::{
    BinOp, Block, BlockArg, ClassDecl, ConstantDecl, Declaration, Expr, ExprKind, FunctionDecl,
    LiteralValue, NodeId, Param, ParamKind, Program, ScopeKind, UnOp, block_terminates,
};

/// The per-node type cache. Keyed by node identity; repeated queries for
/// the same node always return the same type.
#[derive(Debug, Clone, Default)]
pub struct TypeCache {
    map: FxHashMap<NodeId, TypeExpr>,
}

impl TypeCache {
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&TypeExpr> {
        self.map.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Everything the solver learned about one program.
#[derive(Debug, Clone, Default)]
pub struct SolveResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Expression types by node id.
    pub types: TypeCache,
    /// Return types by `FunctionDecl` id (declared or inferred).
    pub method_returns: FxHashMap<NodeId, TypeExpr>,
    /// Constant types by `ConstantDecl` id.
    pub constant_types: FxHashMap<NodeId, TypeExpr>,
}

impl SolveResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Method-body context threaded through expression inference.
struct MethodCtx<'p> {
    class: Option<&'p ClassDecl>,
    /// Types of the values of explicit `return` statements seen so far.
    return_types: Vec<TypeExpr>,
}

impl<'p> MethodCtx<'p> {
    fn top_level() -> Self {
        MethodCtx {
            class: None,
            return_types: Vec::new(),
        }
    }
}

/// The inference engine for one program.
pub struct Solver<'p> {
    program: &'p Program,
    options: CompilerOptions,
    table: DeclTable<'p>,
    aliases: TypeAliasRegistry,
    cache: FxHashMap<NodeId, TypeExpr>,
    method_returns: FxHashMap<NodeId, TypeExpr>,
    constant_types: FxHashMap<NodeId, TypeExpr>,
    in_progress: FxHashSet<NodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'p> Solver<'p> {
    #[must_use]
    pub fn new(program: &'p Program, options: CompilerOptions) -> Self {
        let table = DeclTable::build(program);
        let (aliases, alias_errors) = TypeAliasRegistry::from_program(&program.aliases);
        let mut diagnostics = Vec::new();
        for (_, error) in alias_errors {
            let (name, code) = match &error {
                crate::aliases::AliasError::Cyclic(n) => (n.as_str(), codes::CYCLIC_ALIAS),
                crate::aliases::AliasError::Duplicate(n) => (n.as_str(), codes::DUPLICATE_ALIAS),
            };
            let span = program
                .aliases
                .get(name)
                .map_or(Span::dummy(), |a| a.span);
            diagnostics.push(Diagnostic::error(
                DiagnosticCategory::Resolution,
                code,
                span,
                error.to_string(),
            ));
        }
        Solver {
            program,
            options,
            table,
            aliases,
            cache: FxHashMap::default(),
            method_returns: FxHashMap::default(),
            constant_types: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            diagnostics,
        }
    }

    /// Run inference and all checks over the whole program.
    pub fn check_program(mut self) -> SolveResult {
        // Duplicate top-level declaration names.
        self.check_duplicate_names();

        // Top-level statements share one environment, in source order.
        let mut top_env = TypeEnv::new();
        let mut top_ctx = MethodCtx::top_level();
        for decl in &self.program.declarations {
            self.check_declaration(decl, &mut top_env, &mut top_ctx);
        }

        // Generic arity/bounds and interface conformance.
        constraints::check_program(
            self.program,
            &self.table,
            &self.aliases,
            &mut self.diagnostics,
        );

        if self.options.strictness == Strictness::Permissive {
            for diag in &mut self.diagnostics {
                if matches!(
                    diag.category,
                    DiagnosticCategory::Type | DiagnosticCategory::Resolution
                ) {
                    diag.severity = trb_common::diagnostics::Severity::Warning;
                }
            }
        }
        diagnostics::sort_diagnostics(&mut self.diagnostics);

        tracing::debug!(
            nodes = self.cache.len(),
            diagnostics = self.diagnostics.len(),
            "inference finished"
        );
        SolveResult {
            diagnostics: self.diagnostics,
            types: TypeCache { map: self.cache },
            method_returns: self.method_returns,
            constant_types: self.constant_types,
        }
    }

    fn check_duplicate_names(&mut self) {
        let mut seen: FxHashMap<&str, Span> = FxHashMap::default();
        for decl in &self.program.declarations {
            let Some(name) = decl.name() else { continue };
            if let Some(_first) = seen.get(name) {
                // Reopening a class/module is idiomatic Ruby; only flag
                // non-container duplicates.
                if !matches!(decl, Declaration::Class(_) | Declaration::Module(_)) {
                    self.diagnostics.push(Diagnostic::error(
                        DiagnosticCategory::Resolution,
                        codes::DUPLICATE_DECLARATION,
                        decl.span(),
                        format!("`{name}` is already declared"),
                    ));
                }
            } else {
                seen.insert(name, decl.span());
            }
        }
    }

    fn check_declaration(
        &mut self,
        decl: &'p Declaration,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) {
        match decl {
            Declaration::Function(func) => {
                let _ = self.function_return(func, ctx.class);
            }
            Declaration::Class(class) => self.check_class(class),
            Declaration::Module(module) => {
                let mut module_env = TypeEnv::new();
                let mut module_ctx = MethodCtx::top_level();
                for member in &module.members {
                    self.check_declaration(member, &mut module_env, &mut module_ctx);
                }
            }
            Declaration::Constant(constant) => {
                let _ = self.constant_type(constant, env, ctx);
            }
            Declaration::Statement(expr) => {
                let _ = self.infer_expression(expr, env, ctx);
            }
            Declaration::Interface(_) | Declaration::TypeAlias(_) => {}
        }
    }

    fn check_class(&mut self, class: &'p ClassDecl) {
        let mut class_env = TypeEnv::new();
        let mut class_ctx = MethodCtx {
            class: Some(class),
            return_types: Vec::new(),
        };
        for member in &class.members {
            self.check_declaration(member, &mut class_env, &mut class_ctx);
        }
    }

    fn constant_type(
        &mut self,
        constant: &'p ConstantDecl,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> TypeExpr {
        if let Some(ty) = self.constant_types.get(&constant.id) {
            return ty.clone();
        }
        let value_ty = self.infer_expression(&constant.value, env, ctx);
        let ty = match &constant.ty {
            Some(declared) => {
                if !self.subtypes(&value_ty, declared) {
                    self.diagnostics.push(Diagnostic::error(
                        DiagnosticCategory::Type,
                        codes::TYPE_MISMATCH,
                        constant.value.span,
                        format!(
                            "cannot assign `{value_ty}` to constant `{}` declared as `{declared}`",
                            constant.name
                        ),
                    ));
                }
                declared.clone()
            }
            None => value_ty,
        };
        self.constant_types.insert(constant.id, ty.clone());
        ty
    }

    // ==================== Methods ====================

    /// The return type of a function: declared if annotated, otherwise
    /// inferred from its body. Memoized; recursion yields `any`.
    fn function_return(&mut self, func: &'p FunctionDecl, class: Option<&'p ClassDecl>) -> TypeExpr {
        if let Some(ty) = self.method_returns.get(&func.id) {
            return ty.clone();
        }
        if !self.in_progress.insert(func.id) {
            return TypeExpr::any(Span::dummy());
        }
        let ty = self.infer_function(func, class);
        self.in_progress.remove(&func.id);
        self.method_returns.insert(func.id, ty.clone());
        ty
    }

    fn infer_function(&mut self, func: &'p FunctionDecl, class: Option<&'p ClassDecl>) -> TypeExpr {
        let mut env = TypeEnv::new();
        env.push_scope();
        for param in &func.params {
            let ty = self.param_type(param);
            if param.ty.is_none()
                && self.options.checks.implicit_any
                && !matches!(param.kind, ParamKind::Block)
            {
                let diag = Diagnostic::warning(
                    DiagnosticCategory::Type,
                    codes::IMPLICIT_ANY,
                    param.span,
                    format!("parameter `{}` implicitly has type `any`", param.name),
                );
                self.diagnostics.push(if self.options.strictness == Strictness::Strict {
                    Diagnostic {
                        severity: trb_common::diagnostics::Severity::Error,
                        ..diag
                    }
                } else {
                    diag
                });
            }
            env.bind_param(&param.name, ty, param.span);
        }

        let mut ctx = MethodCtx {
            class,
            return_types: Vec::new(),
        };
        let body_ty = match &func.body {
            Some(body) => self.infer_block_value(body, &mut env, &mut ctx),
            None => TypeExpr::any(Span::dummy()),
        };

        if self.options.checks.unused_vars {
            for (name, span) in env.pop_scope() {
                self.diagnostics.push(Diagnostic::warning(
                    DiagnosticCategory::Type,
                    codes::UNUSED_VARIABLE,
                    span,
                    format!("local variable `{name}` is assigned but never read"),
                ));
            }
        }

        // Constructors are `void` by convention, whatever the body says.
        if func.name == "initialize" {
            return TypeExpr::void(func.span);
        }

        let mut contributions = std::mem::take(&mut ctx.return_types);
        let falls_through = func
            .body
            .as_ref()
            .is_none_or(|body| !block_terminates(body));
        if falls_through {
            contributions.push(body_ty);
        }

        match &func.return_type {
            Some(declared) => {
                // `self` in the declared return means the enclosing class.
                let checked_against = match class {
                    Some(class) => {
                        replace_self(declared, &TypeExpr::named(&class.name, func.span))
                    }
                    None => declared.clone(),
                };
                if !declared.is_void() {
                    for contribution in &contributions {
                        if !self.subtypes(contribution, &checked_against) {
                            self.diagnostics.push(Diagnostic::error(
                                DiagnosticCategory::Type,
                                codes::RETURN_TYPE_MISMATCH,
                                func.return_annotation_span.unwrap_or(func.name_span),
                                format!(
                                    "method `{}` declares return type `{declared}` but returns `{contribution}`",
                                    func.name
                                ),
                            ));
                        }
                    }
                }
                declared.clone()
            }
            None => trb_parser::union_of(contributions, func.span),
        }
    }

    fn param_type(&self, param: &Param) -> TypeExpr {
        let declared = param
            .ty
            .clone()
            .unwrap_or_else(|| TypeExpr::any(param.span));
        match param.kind {
            ParamKind::Splat => TypeExpr::Named {
                name: "Array".to_string(),
                args: vec![declared],
                span: param.span,
            },
            ParamKind::DoubleSplat => TypeExpr::Named {
                name: "Hash".to_string(),
                args: vec![TypeExpr::named("Symbol", param.span), declared],
                span: param.span,
            },
            ParamKind::Block => TypeExpr::named("Proc", param.span),
            _ => declared,
        }
    }

    // ==================== Blocks and expressions ====================

    /// The implicit value of a block: the type of its last statement,
    /// `nil` when empty, `never` when every path terminates.
    fn infer_block_value(
        &mut self,
        block: &'p Block,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> TypeExpr {
        let mut last = TypeExpr::nil(block.span);
        for statement in &block.statements {
            last = self.infer_expression(statement, env, ctx);
        }
        if block_terminates(block) {
            return TypeExpr::never(block.span);
        }
        last
    }

    /// Infer (and cache) the type of one expression.
    fn infer_expression(
        &mut self,
        expr: &'p Expr,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> TypeExpr {
        if let Some(ty) = self.cache.get(&expr.id) {
            return ty.clone();
        }
        let ty = self.infer_expression_uncached(expr, env, ctx);
        self.cache.insert(expr.id, ty.clone());
        ty
    }

    fn infer_expression_uncached(
        &mut self,
        expr: &'p Expr,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> TypeExpr {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Literal(value) => literal_type(value, span),
            ExprKind::Interpolation(parts) => {
                for part in parts {
                    if let trb_parser::InterpolationPart::Expr(inner) = part {
                        let _ = self.infer_expression(inner, env, ctx);
                    }
                }
                TypeExpr::named("String", span)
            }
            ExprKind::VariableRef { name, scope } => self.infer_variable(name, *scope, span, env, ctx),
            ExprKind::Assignment {
                target,
                value,
                declared_type,
                ..
            } => self.infer_assignment(target, value, declared_type.as_ref(), env, ctx),
            ExprKind::Binary { op, left, right } => self.infer_binary(*op, left, right, span, env, ctx),
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.infer_expression(operand, env, ctx);
                match op {
                    UnOp::Not => TypeExpr::bool(span),
                    UnOp::Neg => match operand_ty.widened() {
                        ty if ty.is_named("Integer") || ty.is_named("Float") => ty,
                        _ => TypeExpr::any(span),
                    },
                }
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
                kwargs,
                block,
            } => self.infer_call(
                receiver.as_deref(),
                method,
                args,
                kwargs,
                block.as_deref(),
                span,
                env,
                ctx,
            ),
            ExprKind::SafeNavigation {
                receiver,
                method,
                args,
            } => {
                let receiver_ty = self.infer_expression(receiver, env, ctx);
                for arg in args {
                    let _ = self.infer_expression(arg, env, ctx);
                }
                let non_nil = without_nil(&receiver_ty);
                let result = self.method_return(&non_nil, method, args, None, span, env, ctx);
                if result.is_any() {
                    result
                } else {
                    trb_parser::optional_of(result, span)
                }
            }
            ExprKind::Index { receiver, args } => {
                let receiver_ty = self.infer_expression(receiver, env, ctx);
                for arg in args {
                    let _ = self.infer_expression(arg, env, ctx);
                }
                let resolved = self.aliases.resolve(&receiver_ty);
                builtins::index_result(&resolved)
                    .or_else(|| {
                        self.user_method_return(&resolved, "[]")
                    })
                    .unwrap_or_else(|| TypeExpr::any(span))
            }
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let condition_ty = self.infer_expression(condition, env, ctx);
                if self.options.checks.strict_nil && condition_ty.is_nil() {
                    self.diagnostics.push(Diagnostic::warning(
                        DiagnosticCategory::Type,
                        codes::CONDITION_ALWAYS_NIL,
                        condition.span,
                        "this condition is always `nil`",
                    ));
                }
                let then_ty = self.infer_block_value(then_branch, env, ctx);
                let else_ty = match else_branch {
                    Some(block) => self.infer_block_value(block, env, ctx),
                    None => TypeExpr::nil(span),
                };
                trb_parser::union_of(vec![then_ty, else_ty], span)
            }
            ExprKind::Case {
                scrutinee,
                arms,
                else_branch,
            } => {
                if let Some(scrutinee) = scrutinee {
                    let _ = self.infer_expression(scrutinee, env, ctx);
                }
                let mut branch_types = Vec::new();
                for (patterns, body) in arms {
                    for pattern in patterns {
                        let _ = self.infer_expression(pattern, env, ctx);
                    }
                    branch_types.push(self.infer_block_value(body, env, ctx));
                }
                branch_types.push(match else_branch {
                    Some(block) => self.infer_block_value(block, env, ctx),
                    None => TypeExpr::nil(span),
                });
                trb_parser::union_of(branch_types, span)
            }
            ExprKind::While { condition, body, .. } => {
                let _ = self.infer_expression(condition, env, ctx);
                let _ = self.infer_block_value(body, env, ctx);
                TypeExpr::nil(span)
            }
            ExprKind::Return { value } => {
                let ty = match value {
                    Some(value) => self.infer_expression(value, env, ctx),
                    None => TypeExpr::nil(span),
                };
                ctx.return_types.push(ty);
                TypeExpr::never(span)
            }
            ExprKind::Raise { value } => {
                if let Some(value) = value {
                    let _ = self.infer_expression(value, env, ctx);
                }
                TypeExpr::never(span)
            }
            ExprKind::Lambda { params, body } => {
                env.push_scope();
                let mut param_types = Vec::new();
                for param in params {
                    let ty = self.param_type(param);
                    env.bind_param(&param.name, ty.clone(), param.span);
                    param_types.push(ty);
                }
                let ret = self.infer_block_value(body, env, ctx);
                let _ = env.pop_scope();
                TypeExpr::Function {
                    params: param_types,
                    ret: Box::new(ret),
                    span,
                }
            }
            ExprKind::ArrayLiteral(elements) => {
                let element_types: Vec<TypeExpr> = elements
                    .iter()
                    .map(|e| self.infer_expression(e, env, ctx))
                    .collect();
                let element = if element_types.is_empty() {
                    TypeExpr::any(span)
                } else {
                    trb_parser::union_of(element_types, span)
                };
                TypeExpr::Named {
                    name: "Array".to_string(),
                    args: vec![element],
                    span,
                }
            }
            ExprKind::HashLiteral(entries) => {
                let mut key_types = Vec::new();
                let mut value_types = Vec::new();
                for (key, value) in entries {
                    key_types.push(self.infer_expression(key, env, ctx));
                    value_types.push(self.infer_expression(value, env, ctx));
                }
                let key = if key_types.is_empty() {
                    TypeExpr::any(span)
                } else {
                    trb_parser::union_of(key_types, span)
                };
                let value = if value_types.is_empty() {
                    TypeExpr::any(span)
                } else {
                    trb_parser::union_of(value_types, span)
                };
                TypeExpr::Named {
                    name: "Hash".to_string(),
                    args: vec![key, value],
                    span,
                }
            }
            ExprKind::TypeAssertion { expr: inner, target } => {
                let _ = self.infer_expression(inner, env, ctx);
                target.clone()
            }
            ExprKind::Raw { .. } => TypeExpr::any(span),
        }
    }

    fn infer_variable(
        &mut self,
        name: &'p str,
        scope: ScopeKind,
        span: Span,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> TypeExpr {
        match scope {
            ScopeKind::Local => {
                if name == "self" {
                    return match ctx.class {
                        Some(class) => TypeExpr::named(&class.name, span),
                        None => TypeExpr::any(span),
                    };
                }
                if let Some(ty) = env.lookup(name) {
                    return ty;
                }
                // A bare name may be a receiverless call on the
                // enclosing class.
                if let Some(class) = ctx.class
                    && let Some(method) = class.method(name)
                {
                    return self.function_return(method, Some(class));
                }
                TypeExpr::any(span)
            }
            ScopeKind::Instance => ctx
                .class
                .and_then(|c| c.ivar_type(name))
                .cloned()
                .unwrap_or_else(|| TypeExpr::any(span)),
            ScopeKind::Class => ctx
                .class
                .and_then(|c| c.cvars.iter().find(|b| b.name == name))
                .map(|b| b.ty.clone())
                .unwrap_or_else(|| TypeExpr::any(span)),
            ScopeKind::Global => TypeExpr::any(span),
            ScopeKind::Constant => {
                if let Some(&constant) = self.table.constants.get(name) {
                    let mut const_env = TypeEnv::new();
                    let mut const_ctx = MethodCtx::top_level();
                    return self.constant_type(constant, &mut const_env, &mut const_ctx);
                }
                // A class/module/interface name (or an unknown constant)
                // evaluates to the class object.
                TypeExpr::Named {
                    name: "Class".to_string(),
                    args: vec![TypeExpr::named(name, span)],
                    span,
                }
            }
        }
    }

    fn infer_assignment(
        &mut self,
        target: &'p Expr,
        value: &'p Expr,
        declared_type: Option<&TypeExpr>,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> TypeExpr {
        let value_ty = self.infer_expression(value, env, ctx);
        if let Some(declared) = declared_type
            && !self.subtypes(&value_ty, declared)
        {
            self.diagnostics.push(Diagnostic::error(
                DiagnosticCategory::Type,
                codes::TYPE_MISMATCH,
                value.span,
                format!("cannot assign `{value_ty}` to a variable declared as `{declared}`"),
            ));
        }
        match &target.kind {
            ExprKind::VariableRef {
                name,
                scope: ScopeKind::Local,
            } => {
                let bound = declared_type.cloned().unwrap_or_else(|| value_ty.clone());
                env.assign(name, bound, target.span);
            }
            ExprKind::VariableRef {
                name,
                scope: ScopeKind::Instance,
            } => {
                if let Some(declared) = ctx.class.and_then(|c| c.ivar_type(name))
                    && !self.subtypes(&value_ty, declared)
                {
                    self.diagnostics.push(Diagnostic::error(
                        DiagnosticCategory::Type,
                        codes::TYPE_MISMATCH,
                        value.span,
                        format!(
                            "cannot assign `{value_ty}` to `@{name}` declared as `{declared}`"
                        ),
                    ));
                }
            }
            ExprKind::Index { receiver, args } | ExprKind::MethodCall { receiver: Some(receiver), args, .. } => {
                let _ = self.infer_expression(receiver, env, ctx);
                for arg in args {
                    let _ = self.infer_expression(arg, env, ctx);
                }
            }
            _ => {}
        }
        // Cache the target node too so emitters can ask for it.
        self.cache.insert(target.id, value_ty.clone());
        value_ty
    }

    fn infer_binary(
        &mut self,
        op: BinOp,
        left: &'p Expr,
        right: &'p Expr,
        span: Span,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> TypeExpr {
        let left_ty = self.infer_expression(left, env, ctx);
        let right_ty = self.infer_expression(right, env, ctx);
        let left_res = self.aliases.resolve(&left_ty);
        let right_res = self.aliases.resolve(&right_ty);

        if let Some(result) = builtins::operator_result(op, &left_res, &right_res) {
            return result;
        }
        if left_res.is_any() || right_res.is_any() {
            return TypeExpr::any(span);
        }
        // User-defined operator: a method named like the operator.
        if let Some(result) = self.user_method_return(&left_res, op.symbol()) {
            return result;
        }
        self.diagnostics.push(Diagnostic::error(
            DiagnosticCategory::Type,
            codes::TYPE_MISMATCH,
            span,
            format!("operator `{}` is not defined for `{left_ty}` and `{right_ty}`", op.symbol()),
        ));
        TypeExpr::any(span)
    }

    /// Declared/inferred return of a user-defined method on `receiver`,
    /// if the receiver is a known class or module. Walks included modules
    /// then the parent chain, and substitutes generic arguments and
    /// `self`.
    fn user_method_return(&mut self, receiver: &TypeExpr, method: &str) -> Option<TypeExpr> {
        let TypeExpr::Named { name, args, .. } = receiver else {
            return None;
        };
        let (class, func) = self.find_method(name, method)?;
        let raw = match func.return_type.clone() {
            Some(declared) => declared,
            None => self.function_return(func, class),
        };
        Some(self.instantiate(raw, class, args, receiver))
    }

    /// Resolve a method by name: the class's own methods, then included
    /// modules left-to-right, then the parent chain.
    fn find_method(
        &self,
        type_name: &str,
        method: &str,
    ) -> Option<(Option<&'p ClassDecl>, &'p FunctionDecl)> {
        let mut current = type_name.to_string();
        let mut hops = 0;
        while hops < 32 {
            if let Some(&class) = self.table.classes.get(current.as_str()) {
                if let Some(func) = class.method(method) {
                    return Some((Some(class), func));
                }
                for module_name in &class.includes {
                    if let Some(&module) = self.table.modules.get(module_name.as_str()) {
                        for member in &module.members {
                            if let Declaration::Function(func) = member
                                && func.name == method
                                && !func.singleton
                            {
                                return Some((Some(class), func));
                            }
                        }
                    }
                }
                match &class.parent {
                    Some(parent) => {
                        current = parent.clone();
                        hops += 1;
                    }
                    None => return None,
                }
            } else if let Some(&module) = self.table.modules.get(current.as_str()) {
                for member in &module.members {
                    if let Declaration::Function(func) = member
                        && func.name == method
                        && !func.singleton
                    {
                        return Some((None, func));
                    }
                }
                return None;
            } else {
                return None;
            }
        }
        None
    }

    /// Substitute a method's class generics and `self` for a concrete
    /// receiver.
    fn instantiate(
        &self,
        ty: TypeExpr,
        class: Option<&ClassDecl>,
        type_args: &[TypeExpr],
        receiver: &TypeExpr,
    ) -> TypeExpr {
        let mut substitution = FxHashMap::default();
        if let Some(class) = class {
            for (param, arg) in class.generics.iter().zip(type_args.iter()) {
                substitution.insert(param.name.clone(), arg.clone());
            }
        }
        let substituted = crate::aliases::substitute(&ty, &substitution);
        replace_self(&substituted, receiver)
    }

    #[allow(clippy::too_many_arguments)]
    fn infer_call(
        &mut self,
        receiver: Option<&'p Expr>,
        method: &'p str,
        args: &'p [Expr],
        kwargs: &'p [(String, Expr)],
        block: Option<&'p BlockArg>,
        span: Span,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> TypeExpr {
        // Arguments are always inferred, even when resolution fails, so
        // every node ends up in the cache.
        for arg in args {
            let _ = self.infer_expression(arg, env, ctx);
        }
        for (_, value) in kwargs {
            let _ = self.infer_expression(value, env, ctx);
        }

        match receiver {
            Some(receiver_expr) => {
                let receiver_ty = self.infer_expression(receiver_expr, env, ctx);
                self.method_return(&receiver_ty, method, args, block, span, env, ctx)
            }
            None => {
                // Receiverless: enclosing class, top-level functions,
                // then the kernel catalog.
                if let Some(class) = ctx.class
                    && let Some(func) = class.method(method)
                {
                    self.check_arguments(func, args, kwargs, span);
                    return self.function_return(func, Some(class));
                }
                if let Some(func) = self.program.function(method) {
                    self.check_arguments(func, args, kwargs, span);
                    return self.function_return(func, None);
                }
                if let Some(ty) = builtins::KERNEL_FUNCTIONS.get(method) {
                    if let Some(block_arg) = block {
                        let _ = self.infer_block_arg(block_arg, TypeExpr::any(span), env, ctx);
                    }
                    return ty.clone();
                }
                if let Some(block_arg) = block {
                    let _ = self.infer_block_arg(block_arg, TypeExpr::any(span), env, ctx);
                }
                TypeExpr::any(span)
            }
        }
    }

    /// Resolve `method` on a receiver type and produce the call's type.
    #[allow(clippy::too_many_arguments)]
    fn method_return(
        &mut self,
        receiver_ty: &TypeExpr,
        method: &'p str,
        args: &'p [Expr],
        block: Option<&'p BlockArg>,
        span: Span,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> TypeExpr {
        let resolved = self.aliases.resolve(receiver_ty);
        if resolved.is_any() {
            if let Some(block_arg) = block {
                let _ = self.infer_block_arg(block_arg, TypeExpr::any(span), env, ctx);
            }
            return TypeExpr::any(span);
        }

        // `Class<X>` receivers: `new` and singleton methods.
        if let TypeExpr::Named { name, args: class_args, .. } = &resolved
            && name == "Class"
            && let Some(TypeExpr::Named { name: target, .. }) = class_args.first()
        {
            return self.class_object_call(target.clone(), method, args, span);
        }

        // Container iteration with a block.
        if let Some(block_arg) = block
            && let Some(result) = self.infer_container_iteration(&resolved, method, block_arg, span, env, ctx)
        {
            return result;
        }

        if let Some(result) = self.user_method_return_checked(&resolved, method, args, span) {
            return result;
        }
        if let Some(result) = builtins::method_result(&resolved, method) {
            return result;
        }

        // Unknown method on a known, concretely typed receiver.
        if self.receiver_is_known(&resolved) {
            self.diagnostics.push(Diagnostic::error(
                DiagnosticCategory::Resolution,
                codes::UNDEFINED_NAME,
                span,
                format!("undefined method `{method}` for `{resolved}`"),
            ));
        }
        TypeExpr::any(span)
    }

    /// `Klass.method(...)`: `new` goes through `initialize`, everything
    /// else through `def self.` singleton methods.
    fn class_object_call(
        &mut self,
        target: String,
        method: &'p str,
        args: &'p [Expr],
        span: Span,
    ) -> TypeExpr {
        let Some(class) = self.table.classes.get(target.as_str()).copied() else {
            // Unknown class (e.g. a stdlib exception): `new` yields an
            // instance of it, anything else is `any`.
            if method == "new" {
                return TypeExpr::named(&target, span);
            }
            return TypeExpr::any(span);
        };
        if method == "new" {
            if let Some(init) = class.method("initialize") {
                self.check_arguments(init, args, &[], span);
                // Infer generic arguments from constructor parameters.
                let mut substitution: FxHashMap<String, TypeExpr> = FxHashMap::default();
                for (param, arg) in init.params.iter().zip(args.iter()) {
                    if let Some(TypeExpr::TypeVar { name, .. }) = &param.ty
                        && let Some(arg_ty) = self.cache.get(&arg.id)
                    {
                        substitution.entry(name.clone()).or_insert_with(|| arg_ty.widened());
                    }
                }
                let type_args: Vec<TypeExpr> = class
                    .generics
                    .iter()
                    .map(|g| {
                        substitution
                            .get(&g.name)
                            .cloned()
                            .unwrap_or_else(|| TypeExpr::any(span))
                    })
                    .collect();
                return TypeExpr::Named {
                    name: target,
                    args: type_args,
                    span,
                };
            }
            let type_args = vec![TypeExpr::any(span); class.generics.len()];
            return TypeExpr::Named {
                name: target,
                args: type_args,
                span,
            };
        }
        if let Some(func) = class.singleton_method(method) {
            self.check_arguments(func, args, &[], span);
            let raw = match func.return_type.clone() {
                Some(declared) => declared,
                None => self.function_return(func, Some(class)),
            };
            let receiver = TypeExpr::named(&class.name, span);
            return self.instantiate(raw, Some(class), &[], &receiver);
        }
        TypeExpr::any(span)
    }

    /// User-defined method lookup plus argument compatibility checking.
    fn user_method_return_checked(
        &mut self,
        receiver: &TypeExpr,
        method: &'p str,
        args: &'p [Expr],
        span: Span,
    ) -> Option<TypeExpr> {
        let TypeExpr::Named { name, .. } = receiver else {
            return None;
        };
        let name = name.clone();
        let (_, func) = self.find_method(&name, method)?;
        self.check_arguments(func, args, &[], span);
        self.user_method_return(receiver, method)
    }

    /// Arity and argument-type checks against a resolved declaration.
    fn check_arguments(
        &mut self,
        func: &'p FunctionDecl,
        args: &'p [Expr],
        kwargs: &'p [(String, Expr)],
        span: Span,
    ) {
        let positional: Vec<&Param> = func
            .params
            .iter()
            .filter(|p| {
                matches!(
                    p.kind,
                    ParamKind::Positional | ParamKind::OptionalPositional
                )
            })
            .collect();
        let has_splat = func.params.iter().any(|p| p.kind == ParamKind::Splat);
        let required = positional
            .iter()
            .filter(|p| p.kind == ParamKind::Positional)
            .count();

        if !has_splat && (args.len() < required || args.len() > positional.len()) {
            self.diagnostics.push(Diagnostic::error(
                DiagnosticCategory::Type,
                codes::ARGUMENT_COUNT_MISMATCH,
                span,
                format!(
                    "method `{}` expects {} argument(s), got {}",
                    func.name,
                    if required == positional.len() {
                        required.to_string()
                    } else {
                        format!("{required}..{}", positional.len())
                    },
                    args.len()
                ),
            ));
        }

        for (param, arg) in positional.iter().zip(args.iter()) {
            if let Some(param_ty) = &param.ty
                && let Some(arg_ty) = self.cache.get(&arg.id).cloned()
                && !self.subtypes(&arg_ty, param_ty)
            {
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticCategory::Type,
                    codes::ARGUMENT_TYPE_MISMATCH,
                    arg.span,
                    format!(
                        "argument for `{}` has type `{arg_ty}` but `{param_ty}` is expected",
                        param.name
                    ),
                ));
            }
        }

        // Unknown keywords against declared keyword parameters.
        for (keyword, value) in kwargs {
            let declared = func.params.iter().any(|p| {
                matches!(p.kind, ParamKind::Keyword | ParamKind::OptionalKeyword)
                    && p.name == *keyword
            }) || func.params.iter().any(|p| p.kind == ParamKind::DoubleSplat);
            if !declared {
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticCategory::Type,
                    codes::ARGUMENT_TYPE_MISMATCH,
                    value.span,
                    format!("unknown keyword argument `{keyword}` for `{}`", func.name),
                ));
            }
        }
    }

    /// Block-taking iteration on builtin containers, with element-typed
    /// block parameters.
    fn infer_container_iteration(
        &mut self,
        receiver: &TypeExpr,
        method: &'p str,
        block: &'p BlockArg,
        span: Span,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> Option<TypeExpr> {
        let TypeExpr::Named { name, args, .. } = receiver else {
            return None;
        };
        let element = match (name.as_str(), args.first()) {
            ("Array" | "Range", Some(element)) => element.clone(),
            _ => return None,
        };
        let body_ty = self.infer_block_arg(block, element.clone(), env, ctx);
        let result = match method {
            "map" | "collect" | "flat_map" => TypeExpr::Named {
                name: "Array".to_string(),
                args: vec![body_ty],
                span,
            },
            "select" | "filter" | "reject" | "sort_by" | "each" | "each_with_index" => {
                receiver.clone()
            }
            "find" | "detect" => trb_parser::optional_of(element, span),
            "any?" | "all?" | "none?" | "one?" => TypeExpr::bool(span),
            "count" => TypeExpr::named("Integer", span),
            "sum" | "reduce" | "inject" => body_ty,
            _ => return None,
        };
        Some(result)
    }

    /// Infer a block argument's body with its parameters bound to the
    /// element type; returns the body's value type.
    fn infer_block_arg(
        &mut self,
        block: &'p BlockArg,
        element: TypeExpr,
        env: &mut TypeEnv,
        ctx: &mut MethodCtx<'p>,
    ) -> TypeExpr {
        env.push_scope();
        for (index, param) in block.params.iter().enumerate() {
            let ty = if index == 0 {
                element.clone()
            } else {
                TypeExpr::any(param.span)
            };
            env.bind_param(&param.name, ty, param.span);
        }
        let body_ty = self.infer_block_value(&block.body, env, ctx);
        let _ = env.pop_scope();
        body_ty
    }

    /// Whether a receiver type is concrete enough that a failed method
    /// lookup deserves a diagnostic.
    fn receiver_is_known(&self, ty: &TypeExpr) -> bool {
        match ty {
            TypeExpr::Named { name, .. } => {
                self.table.classes.contains_key(name.as_str())
                    || self.table.modules.contains_key(name.as_str())
            }
            _ => false,
        }
    }

    fn subtypes(&self, sub: &TypeExpr, sup: &TypeExpr) -> bool {
        SubtypeChecker::new(&self.table, &self.aliases).is_subtype(sub, sup)
    }
}

/// Literal-to-type mapping. Literals infer as their base types; literal
/// types only arise from annotations, where they are preserved.
fn literal_type(value: &LiteralValue, span: Span) -> TypeExpr {
    match value {
        LiteralValue::Str(_) => TypeExpr::named("String", span),
        LiteralValue::Int(_) => TypeExpr::named("Integer", span),
        LiteralValue::Float(_) => TypeExpr::named("Float", span),
        LiteralValue::Bool(_) => TypeExpr::bool(span),
        LiteralValue::Symbol(_) => TypeExpr::named("Symbol", span),
        LiteralValue::Nil => TypeExpr::nil(span),
    }
}

/// Remove `nil` from a union (used by safe navigation).
fn without_nil(ty: &TypeExpr) -> TypeExpr {
    match ty {
        TypeExpr::Union { members, span } => trb_parser::union_of(
            members.iter().filter(|m| !m.is_nil()).cloned().collect(),
            *span,
        ),
        other => other.clone(),
    }
}

/// Replace `self` with a concrete receiver type.
fn replace_self(ty: &TypeExpr, receiver: &TypeExpr) -> TypeExpr {
    match ty {
        TypeExpr::SelfType { .. } => receiver.clone(),
        TypeExpr::Named { name, args, span } => TypeExpr::Named {
            name: name.clone(),
            args: args.iter().map(|a| replace_self(a, receiver)).collect(),
            span: *span,
        },
        TypeExpr::Union { members, span } => trb_parser::union_of(
            members.iter().map(|m| replace_self(m, receiver)).collect(),
            *span,
        ),
        TypeExpr::Intersection { members, span } => trb_parser::intersection_of(
            members.iter().map(|m| replace_self(m, receiver)).collect(),
            *span,
        ),
        TypeExpr::Function { params, ret, span } => TypeExpr::Function {
            params: params.iter().map(|p| replace_self(p, receiver)).collect(),
            ret: Box::new(replace_self(ret, receiver)),
            span: *span,
        },
        other => other.clone(),
    }
}

/// Convenience entry point: run the solver over a program.
#[must_use]
pub fn check_program(program: &Program, options: CompilerOptions) -> SolveResult {
    Solver::new(program, options).check_program()
}
