//! Signature (`.rbs`) emission.
//!
//! Walks the IR in source order and prints one signature entry per public
//! declaration. Declared annotations are printed as written (aliases are
//! not expanded); methods without a declared return use the solver's
//! inferred type, falling back to `untyped`.

use trb_parser::ir::types::{TypeExpr, TypeLit};
use trb_parser::{
    AttrKind, ClassDecl, ConstantDecl, Declaration, FunctionDecl, GenericParam, InterfaceDecl,
    MethodSig, ModuleDecl, Param, ParamKind, Program, Visibility,
};
use trb_solver::SolveResult;

/// Emit the `.rbs` signature document for a program.
#[must_use]
pub fn emit_rbs(program: &Program, solved: &SolveResult) -> String {
    let mut writer = RbsWriter {
        out: String::new(),
        indent: 0,
        solved,
    };
    writer.emit_declarations(&program.declarations);
    writer.out
}

struct RbsWriter<'a> {
    out: String,
    indent: usize,
    solved: &'a SolveResult,
}

impl<'a> RbsWriter<'a> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn emit_declarations(&mut self, declarations: &[Declaration]) {
        let mut first = true;
        for decl in declarations {
            if matches!(decl, Declaration::Statement(_)) {
                continue;
            }
            if is_private(decl) {
                continue;
            }
            if !first && self.indent == 0 {
                self.blank();
            }
            first = false;
            match decl {
                Declaration::Function(func) => self.emit_method(func),
                Declaration::Class(class) => self.emit_class(class),
                Declaration::Module(module) => self.emit_module(module),
                Declaration::Interface(iface) => self.emit_interface(iface),
                Declaration::TypeAlias(alias) => {
                    let generics = generic_list(&alias.generics);
                    self.line(&format!(
                        "type {}{} = {}",
                        alias.name,
                        generics,
                        rbs_type(&alias.target)
                    ));
                }
                Declaration::Constant(constant) => self.emit_constant(constant),
                Declaration::Statement(_) => {}
            }
        }
    }

    fn emit_method(&mut self, func: &FunctionDecl) {
        let receiver = if func.singleton { "self." } else { "" };
        let generics = if func.generics.is_empty() {
            String::new()
        } else {
            format!(
                "[{}] ",
                func.generics
                    .iter()
                    .map(|g| g.name.clone())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        let params = self.method_params(&func.params);
        let ret = self.return_type(func);
        self.line(&format!(
            "def {receiver}{}: {generics}({params}){} -> {ret}",
            func.name,
            block_clause(&func.params),
        ));
    }

    fn method_params(&self, params: &[Param]) -> String {
        let mut parts = Vec::new();
        for param in params {
            let ty = param
                .ty
                .as_ref()
                .map_or_else(|| "untyped".to_string(), rbs_type);
            let part = match param.kind {
                ParamKind::Positional => ty,
                ParamKind::OptionalPositional => format!("?{ty}"),
                ParamKind::Keyword => format!("{}: {ty}", param.name),
                ParamKind::OptionalKeyword => format!("?{}: {ty}", param.name),
                ParamKind::Splat => format!("*{ty}"),
                ParamKind::DoubleSplat => format!("**{ty}"),
                ParamKind::Block => continue,
            };
            parts.push(part);
        }
        parts.join(", ")
    }

    fn return_type(&self, func: &FunctionDecl) -> String {
        if let Some(declared) = &func.return_type {
            return rbs_type(declared);
        }
        self.solved
            .method_returns
            .get(&func.id)
            .map_or_else(|| "untyped".to_string(), rbs_type)
    }

    fn emit_class(&mut self, class: &ClassDecl) {
        let mut header = format!("class {}", class.name);
        if !class.generics.is_empty() {
            header.push_str(&generic_list(&class.generics));
        }
        if let Some(parent) = &class.parent {
            header.push_str(&format!(" < {parent}"));
        }
        self.line(&header);
        self.indent += 1;

        for module in &class.includes {
            self.line(&format!("include {module}"));
        }
        for interface in &class.implements {
            self.line(&format!("include {interface}"));
        }
        for binding in &class.ivars {
            self.line(&format!("@{}: {}", binding.name, rbs_type(&binding.ty)));
        }
        for binding in &class.cvars {
            self.line(&format!("@@{}: {}", binding.name, rbs_type(&binding.ty)));
        }
        for attr in &class.attrs {
            let keyword = match attr.kind {
                AttrKind::Reader => "attr_reader",
                AttrKind::Writer => "attr_writer",
                AttrKind::Accessor => "attr_accessor",
            };
            for name in &attr.names {
                let ty = class
                    .ivar_type(name)
                    .map_or_else(|| "untyped".to_string(), rbs_type);
                self.line(&format!("{keyword} {name}: {ty}"));
            }
        }
        self.emit_declarations(&class.members);

        self.indent -= 1;
        self.line("end");
    }

    fn emit_module(&mut self, module: &ModuleDecl) {
        self.line(&format!("module {}", module.name));
        self.indent += 1;
        self.emit_declarations(&module.members);
        self.indent -= 1;
        self.line("end");
    }

    fn emit_interface(&mut self, iface: &InterfaceDecl) {
        let mut header = format!("interface {}", iface.name);
        if !iface.generics.is_empty() {
            header.push_str(&generic_list(&iface.generics));
        }
        self.line(&header);
        self.indent += 1;
        for parent in &iface.parents {
            self.line(&format!("include {parent}"));
        }
        for method in &iface.methods {
            self.emit_method_sig(method);
        }
        self.indent -= 1;
        self.line("end");
    }

    fn emit_method_sig(&mut self, sig: &MethodSig) {
        let params = self.method_params(&sig.params);
        let ret = sig
            .return_type
            .as_ref()
            .map_or_else(|| "untyped".to_string(), rbs_type);
        self.line(&format!(
            "def {}: ({params}){} -> {ret}",
            sig.name,
            block_clause(&sig.params)
        ));
    }

    fn emit_constant(&mut self, constant: &ConstantDecl) {
        let ty = match &constant.ty {
            Some(declared) => rbs_type(declared),
            None => self
                .solved
                .constant_types
                .get(&constant.id)
                .map_or_else(|| "untyped".to_string(), rbs_type),
        };
        self.line(&format!("{}: {ty}", constant.name));
    }
}

fn is_private(decl: &Declaration) -> bool {
    match decl {
        Declaration::Function(func) => func.visibility != Visibility::Public,
        Declaration::Constant(constant) => constant.visibility != Visibility::Public,
        _ => false,
    }
}

/// `[T, U < Bound]` bracket lists for classes, interfaces and aliases.
fn generic_list(generics: &[GenericParam]) -> String {
    if generics.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = generics
        .iter()
        .map(|g| match &g.bound {
            Some(bound) => format!("{} < {}", g.name, rbs_type(bound)),
            None => g.name.clone(),
        })
        .collect();
    format!("[{}]", parts.join(", "))
}

/// The `{ (...) -> ... }` block clause for a block parameter, typed when
/// the parameter carries a function-type annotation.
fn block_clause(params: &[Param]) -> String {
    let Some(block) = params.iter().find(|p| p.kind == ParamKind::Block) else {
        return String::new();
    };
    match &block.ty {
        Some(TypeExpr::Function { params, ret, .. }) => {
            let printed: Vec<String> = params.iter().map(rbs_type).collect();
            format!(" {{ ({}) -> {} }}", printed.join(", "), rbs_type(ret))
        }
        _ => " { (?) -> untyped }".to_string(),
    }
}

/// Print a type expression in RBS syntax.
#[must_use]
pub fn rbs_type(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Named { name, args, .. } => {
            let name = match name.as_str() {
                "any" => "untyped",
                other => other,
            };
            if args.is_empty() {
                name.to_string()
            } else {
                let printed: Vec<String> = args.iter().map(rbs_type).collect();
                format!("{name}[{}]", printed.join(", "))
            }
        }
        TypeExpr::Union { members, .. } => {
            let printed: Vec<String> = members.iter().map(rbs_type).collect();
            format!("({})", printed.join(" | "))
        }
        TypeExpr::Intersection { members, .. } => {
            let printed: Vec<String> = members.iter().map(rbs_type).collect();
            format!("({})", printed.join(" & "))
        }
        TypeExpr::TypeVar { name, .. } => name.clone(),
        TypeExpr::Literal { value, .. } => match value {
            TypeLit::Str(s) => format!("\"{s}\""),
            TypeLit::Int(i) => i.to_string(),
            TypeLit::Bool(b) => b.to_string(),
            TypeLit::Symbol(s) => format!(":{s}"),
        },
        TypeExpr::Function { params, ret, .. } => {
            let printed: Vec<String> = params.iter().map(rbs_type).collect();
            format!("^({}) -> {}", printed.join(", "), rbs_type(ret))
        }
        TypeExpr::SelfType { .. } => "self".to_string(),
    }
}
