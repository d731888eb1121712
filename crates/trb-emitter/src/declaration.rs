//! Declaration (`.d.trb`) emission.
//!
//! Prints the program's public API in trb syntax with full type
//! information and no method bodies, for publishing library type
//! definitions. Private members are omitted; methods without a declared
//! return type get the solver's inferred one.

use trb_parser::{
    AttrKind, ClassDecl, Declaration, FunctionDecl, GenericParam, InterfaceDecl, MethodSig,
    ModuleDecl, Param, ParamKind, Program, Visibility,
};
use trb_solver::SolveResult;

/// Emit the `.d.trb` declaration document for a program.
#[must_use]
pub fn emit_declarations(program: &Program, solved: &SolveResult) -> String {
    let mut writer = DeclWriter {
        out: String::new(),
        indent: 0,
        solved,
    };
    writer.emit_all(&program.declarations);
    writer.out
}

struct DeclWriter<'a> {
    out: String,
    indent: usize,
    solved: &'a SolveResult,
}

impl<'a> DeclWriter<'a> {
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

    fn emit_all(&mut self, declarations: &[Declaration]) {
        let mut first = true;
        for decl in declarations {
            let skip = match decl {
                Declaration::Statement(_) => true,
                Declaration::Function(func) => func.visibility != Visibility::Public,
                Declaration::Constant(constant) => constant.visibility != Visibility::Public,
                _ => false,
            };
            if skip {
                continue;
            }
            if !first && self.indent == 0 {
                self.blank();
            }
            first = false;
            match decl {
                Declaration::Function(func) => self.emit_function(func),
                Declaration::Class(class) => self.emit_class(class),
                Declaration::Module(module) => self.emit_module(module),
                Declaration::Interface(iface) => self.emit_interface(iface),
                Declaration::TypeAlias(alias) => {
                    self.line(&format!(
                        "type {}{} = {}",
                        alias.name,
                        angle_list(&alias.generics),
                        alias.target
                    ));
                }
                Declaration::Constant(constant) => {
                    let ty = constant
                        .ty
                        .clone()
                        .or_else(|| self.solved.constant_types.get(&constant.id).cloned())
                        .map_or_else(|| "any".to_string(), |t| t.to_string());
                    self.line(&format!("{}: {ty}", constant.name));
                }
                Declaration::Statement(_) => {}
            }
        }
    }

    fn emit_function(&mut self, func: &FunctionDecl) {
        let receiver = if func.singleton { "self." } else { "" };
        let ret = func
            .return_type
            .clone()
            .or_else(|| self.solved.method_returns.get(&func.id).cloned());
        let ret = match ret {
            Some(ty) => format!(": {ty}"),
            None => String::new(),
        };
        self.line(&format!(
            "def {receiver}{}{}({}){ret}",
            func.name,
            angle_list(&func.generics),
            params_list(&func.params),
        ));
    }

    fn emit_class(&mut self, class: &ClassDecl) {
        let mut header = format!("class {}{}", class.name, angle_list(&class.generics));
        if let Some(parent) = &class.parent {
            header.push_str(&format!(" < {parent}"));
        }
        self.line(&header);
        self.indent += 1;
        for module in &class.includes {
            self.line(&format!("include {module}"));
        }
        if !class.implements.is_empty() {
            self.line(&format!("implements {}", class.implements.join(", ")));
        }
        for binding in &class.ivars {
            self.line(&format!("@{}: {}", binding.name, binding.ty));
        }
        for binding in &class.cvars {
            self.line(&format!("@@{}: {}", binding.name, binding.ty));
        }
        for attr in &class.attrs {
            let keyword = match attr.kind {
                AttrKind::Reader => "attr_reader",
                AttrKind::Writer => "attr_writer",
                AttrKind::Accessor => "attr_accessor",
            };
            let names: Vec<String> = attr.names.iter().map(|n| format!(":{n}")).collect();
            self.line(&format!("{keyword} {}", names.join(", ")));
        }
        self.emit_all(&class.members);
        self.indent -= 1;
        self.line("end");
    }

    fn emit_module(&mut self, module: &ModuleDecl) {
        self.line(&format!("module {}", module.name));
        self.indent += 1;
        self.emit_all(&module.members);
        self.indent -= 1;
        self.line("end");
    }

    fn emit_interface(&mut self, iface: &InterfaceDecl) {
        self.line(&format!(
            "interface {}{}",
            iface.name,
            angle_list(&iface.generics)
        ));
        self.indent += 1;
        for parent in &iface.parents {
            self.line(&format!("include {parent}"));
        }
        for method in &iface.methods {
            self.emit_sig(method);
        }
        self.indent -= 1;
        self.line("end");
    }

    fn emit_sig(&mut self, sig: &MethodSig) {
        let ret = sig
            .return_type
            .as_ref()
            .map_or_else(String::new, |t| format!(": {t}"));
        if sig.params.is_empty() {
            self.line(&format!("def {}{ret}", sig.name));
        } else {
            self.line(&format!("def {}({}){ret}", sig.name, params_list(&sig.params)));
        }
    }
}

/// `<T, U: Bound>` lists in trb syntax.
fn angle_list(generics: &[GenericParam]) -> String {
    if generics.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = generics
        .iter()
        .map(|g| {
            let mut part = g.name.clone();
            if let Some(bound) = &g.bound {
                part.push_str(&format!(": {bound}"));
            }
            if let Some(default) = &g.default {
                part.push_str(&format!(" = {default}"));
            }
            part
        })
        .collect();
    format!("<{}>", parts.join(", "))
}

fn params_list(params: &[Param]) -> String {
    let parts: Vec<String> = params.iter().map(param_text).collect();
    parts.join(", ")
}

fn param_text(param: &Param) -> String {
    let sigil = match param.kind {
        ParamKind::Splat => "*",
        ParamKind::DoubleSplat => "**",
        ParamKind::Block => "&",
        _ => "",
    };
    let mut text = format!("{sigil}{}", param.name);
    match (&param.ty, param.kind) {
        (Some(ty), _) => {
            text.push_str(&format!(": {ty}"));
            if matches!(param.kind, ParamKind::OptionalPositional) {
                text.push_str(" = ...");
            }
        }
        (None, ParamKind::Keyword) => text.push(':'),
        (None, ParamKind::OptionalKeyword) => text.push_str(": ..."),
        (None, ParamKind::OptionalPositional) => text.push_str(" = ..."),
        _ => {}
    }
    text
}
