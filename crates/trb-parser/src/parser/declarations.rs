//! Declaration and statement parsing.
//!
//! Recognizes `def`, `class`, `module`, `interface`, `type`, constant
//! assignment and top-level expression statements. Annotation spans (the
//! `: T` fragments, generic lists, `implements` clauses) are recorded on
//! the IR so the source-preserving emitter can delete exactly those bytes.

use super::ParserState;
use crate::ir::{
    AttrDecl, AttrKind, ClassDecl, ConstantDecl, Declaration, FunctionDecl, GenericParam,
    InterfaceDecl, MethodSig, ModuleDecl, Param, ParamKind, Program, TypeAliasDecl, VarBinding,
    Visibility,
};
use trb_common::Span;
use trb_common::diagnostics::codes;
use trb_scanner::SyntaxKind;

impl<'a> ParserState<'a> {
    pub(crate) fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        let mut visibility = Visibility::Public;
        self.skip_separators();
        while !self.at_eof() {
            let before = self.current();
            if let Some(decl) = self.parse_declaration(&mut visibility) {
                match &decl {
                    Declaration::TypeAlias(alias) => {
                        program.aliases.insert(alias.name.clone(), alias.clone());
                    }
                    Declaration::Interface(iface) => {
                        program.interfaces.insert(iface.name.clone(), iface.clone());
                    }
                    _ => {}
                }
                program.declarations.push(decl);
            }
            // Guard against a stuck cursor on malformed input.
            if self.current() == before && !self.at_eof() {
                self.recover_to_line_end();
            }
            self.skip_separators();
        }
        program.next_node_id = self.finished_node_count();
        program
    }

    /// Parse one declaration or statement. Returns `None` for visibility
    /// markers (they only mutate `visibility`) and after error recovery.
    pub(crate) fn parse_declaration(
        &mut self,
        visibility: &mut Visibility,
    ) -> Option<Declaration> {
        match self.kind() {
            SyntaxKind::DefKeyword => self
                .parse_def(*visibility)
                .map(Declaration::Function),
            SyntaxKind::ClassKeyword => self.parse_class().map(Declaration::Class),
            SyntaxKind::ModuleKeyword => self.parse_module().map(Declaration::Module),
            SyntaxKind::InterfaceKeyword => self.parse_interface().map(Declaration::Interface),
            SyntaxKind::TypeKeyword if self.nth_kind(1) == SyntaxKind::ConstantName => {
                self.parse_type_alias().map(Declaration::TypeAlias)
            }
            SyntaxKind::PrivateKeyword
            | SyntaxKind::PublicKeyword
            | SyntaxKind::ProtectedKeyword => {
                let marker = self.bump();
                let marked = match marker.kind {
                    SyntaxKind::PrivateKeyword => Visibility::Private,
                    SyntaxKind::ProtectedKeyword => Visibility::Protected,
                    _ => Visibility::Public,
                };
                if self.at(SyntaxKind::DefKeyword) {
                    // `private def foo` applies to this method only.
                    return self.parse_def(marked).map(Declaration::Function);
                }
                *visibility = marked;
                None
            }
            SyntaxKind::ConstantName
                if matches!(
                    self.nth_kind(1),
                    SyntaxKind::EqualsToken | SyntaxKind::ColonToken
                ) =>
            {
                self.parse_constant(*visibility).map(Declaration::Constant)
            }
            _ => Some(Declaration::Statement(self.parse_statement())),
        }
    }

    // ==================== def ====================

    fn parse_def(&mut self, visibility: Visibility) -> Option<FunctionDecl> {
        let def_kw = self.bump();
        let id = self.fresh_id();

        let singleton = if self.at(SyntaxKind::SelfKeyword)
            && self.nth_kind(1) == SyntaxKind::DotToken
        {
            self.bump();
            self.bump();
            true
        } else {
            false
        };

        let (name, name_span) = self.parse_method_name()?;

        let mut generics = Vec::new();
        let mut generics_span = None;
        if self.at(SyntaxKind::LessThanToken) {
            let (list, span) = self.parse_generic_params()?;
            generics = list;
            generics_span = Some(span);
        }
        let scope_mark = self.push_type_vars(&generics);

        let params = if self.at(SyntaxKind::LeftParenToken) {
            self.parse_params()
        } else {
            Vec::new()
        };

        let mut return_type = None;
        let mut return_annotation_span = None;
        if self.at(SyntaxKind::ColonToken) {
            let colon = self.bump();
            match self.parse_type() {
                Some(ty) => {
                    return_annotation_span = Some(Span::new(colon.span.start, self.previous_end()));
                    return_type = Some(ty);
                }
                None => self.recover_to_line_end(),
            }
        }

        let body = if self.declaration_mode {
            None
        } else {
            self.skip_separators();
            let block = self.parse_block(&[SyntaxKind::EndKeyword]);
            self.expect(SyntaxKind::EndKeyword, "`end`");
            Some(block)
        };
        self.type_vars.truncate(scope_mark);

        Some(FunctionDecl {
            id,
            name,
            name_span,
            singleton,
            generics,
            generics_span,
            params,
            return_type,
            return_annotation_span,
            body,
            visibility,
            span: Span::new(def_kw.span.start, self.previous_end()),
        })
    }

    /// Method names: identifiers (optionally `name=` setters), operator
    /// names (`+`, `==`, `<=>`, ...) and the index forms `[]` / `[]=`.
    fn parse_method_name(&mut self) -> Option<(String, Span)> {
        let token = self.current();
        match token.kind {
            SyntaxKind::Identifier => {
                self.bump();
                let mut name = self.token_text(token).to_string();
                let mut span = token.span;
                // Setter definition `def name=(value)`.
                if self.at(SyntaxKind::EqualsToken)
                    && self.nth_kind(1) == SyntaxKind::LeftParenToken
                {
                    let eq = self.bump();
                    name.push('=');
                    span = span.merge(eq.span);
                }
                Some((name, span))
            }
            SyntaxKind::PlusToken
            | SyntaxKind::MinusToken
            | SyntaxKind::StarToken
            | SyntaxKind::StarStarToken
            | SyntaxKind::SlashToken
            | SyntaxKind::PercentToken
            | SyntaxKind::EqualsEqualsToken
            | SyntaxKind::LessThanToken
            | SyntaxKind::LessThanEqualsToken
            | SyntaxKind::GreaterThanToken
            | SyntaxKind::GreaterThanEqualsToken
            | SyntaxKind::SpaceshipToken
            | SyntaxKind::LessThanLessThanToken
            | SyntaxKind::GreaterThanGreaterThanToken => {
                self.bump();
                Some((self.token_text(token).to_string(), token.span))
            }
            SyntaxKind::LeftBracketToken if self.nth_kind(1) == SyntaxKind::RightBracketToken => {
                self.bump();
                let close = self.bump();
                let mut name = "[]".to_string();
                let mut span = token.span.merge(close.span);
                if let Some(eq) = self.eat(SyntaxKind::EqualsToken) {
                    name.push('=');
                    span = span.merge(eq.span);
                }
                Some((name, span))
            }
            _ => {
                self.error(
                    codes::EXPECTED_IDENTIFIER,
                    token.span,
                    "expected a method name after `def`",
                );
                self.recover_to_line_end();
                None
            }
        }
    }

    /// Push the names of `generics` onto the type-variable scope stack.
    /// Returns the mark to truncate back to.
    pub(crate) fn push_type_vars(&mut self, generics: &[GenericParam]) -> usize {
        let mark = self.type_vars.len();
        self.type_vars
            .extend(generics.iter().map(|g| g.name.clone()));
        mark
    }

    /// `<T, U: Bound, V = Default>` after a declaration name.
    fn parse_generic_params(&mut self) -> Option<(Vec<GenericParam>, Span)> {
        let open = self.bump();
        let mut params = Vec::new();
        loop {
            let name_token = self.expect(SyntaxKind::ConstantName, "a generic parameter name")?;
            let name = self.token_text(name_token).to_string();
            let mut bound = None;
            let mut default = None;
            if self.eat(SyntaxKind::ColonToken).is_some() {
                bound = Some(self.parse_type()?);
            }
            if self.eat(SyntaxKind::EqualsToken).is_some() {
                default = Some(self.parse_type()?);
            }
            params.push(GenericParam {
                name,
                bound,
                default,
                span: Span::new(name_token.span.start, self.previous_end()),
            });
            if self.eat(SyntaxKind::CommaToken).is_none() {
                break;
            }
        }
        if !self.eat_type_list_close() {
            let current = self.current();
            self.error(
                codes::UNEXPECTED_TOKEN,
                current.span,
                "expected `>` to close generic parameter list",
            );
            return None;
        }
        Some((params, Span::new(open.span.start, self.previous_end())))
    }

    // ==================== Parameters ====================

    pub(crate) fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        self.bump(); // `(`
        self.skip_separators();
        if self.eat(SyntaxKind::RightParenToken).is_some() {
            return params;
        }
        loop {
            if let Some(param) = self.parse_param() {
                if params.iter().any(|p: &Param| p.name == param.name) {
                    self.error(
                        codes::DUPLICATE_PARAMETER,
                        param.span,
                        format!("duplicate parameter name `{}`", param.name),
                    );
                }
                params.push(param);
            } else {
                // Recover inside the list: skip to the next comma or `)`.
                while !matches!(
                    self.kind(),
                    SyntaxKind::CommaToken
                        | SyntaxKind::RightParenToken
                        | SyntaxKind::EndOfFile
                ) {
                    self.bump();
                }
            }
            self.skip_separators();
            if self.eat(SyntaxKind::CommaToken).is_none() {
                break;
            }
            self.skip_separators();
        }
        self.expect(SyntaxKind::RightParenToken, "`)`");
        params
    }

    fn parse_param(&mut self) -> Option<Param> {
        let start = self.current().span.start;
        let sigil_kind = match self.kind() {
            SyntaxKind::StarToken => Some(ParamKind::Splat),
            SyntaxKind::StarStarToken => Some(ParamKind::DoubleSplat),
            SyntaxKind::AmpersandToken => Some(ParamKind::Block),
            _ => None,
        };
        if let Some(kind) = sigil_kind {
            self.bump();
            let name_token = self.expect(SyntaxKind::Identifier, "a parameter name")?;
            let name = self.token_text(name_token).to_string();
            let (ty, annotation_span) = self.parse_param_annotation();
            return Some(Param {
                name,
                kind,
                ty,
                annotation_span,
                default: None,
                span: Span::new(start, self.previous_end()),
            });
        }

        let name_token = self.expect(SyntaxKind::Identifier, "a parameter name")?;
        let name = self.token_text(name_token).to_string();

        if self.at(SyntaxKind::ColonToken) {
            if self.nth_is_type_start(1) {
                // `name: T` / `name: T = default` - annotated positional.
                let (ty, annotation_span) = self.parse_param_annotation();
                let (kind, default) = if self.eat(SyntaxKind::EqualsToken).is_some() {
                    (ParamKind::OptionalPositional, Some(self.parse_expression()))
                } else {
                    (ParamKind::Positional, None)
                };
                return Some(Param {
                    name,
                    kind,
                    ty,
                    annotation_span,
                    default,
                    span: Span::new(start, self.previous_end()),
                });
            }
            // `name:` - keyword parameter, required or defaulted.
            self.bump();
            let (kind, default) = if matches!(
                self.kind(),
                SyntaxKind::CommaToken | SyntaxKind::RightParenToken | SyntaxKind::Newline
            ) {
                (ParamKind::Keyword, None)
            } else {
                (ParamKind::OptionalKeyword, Some(self.parse_expression()))
            };
            return Some(Param {
                name,
                kind,
                ty: None,
                annotation_span: None,
                default,
                span: Span::new(start, self.previous_end()),
            });
        }

        if self.eat(SyntaxKind::EqualsToken).is_some() {
            let default = self.parse_expression();
            return Some(Param {
                name,
                kind: ParamKind::OptionalPositional,
                ty: None,
                annotation_span: None,
                default: Some(default),
                span: Span::new(start, self.previous_end()),
            });
        }

        Some(Param {
            name,
            kind: ParamKind::Positional,
            ty: None,
            annotation_span: None,
            default: None,
            span: Span::new(start, self.previous_end()),
        })
    }

    /// Parse a `: T` annotation if present. Returns the type and the span
    /// of the whole annotation (colon included) for erasure.
    fn parse_param_annotation(&mut self) -> (Option<crate::ir::types::TypeExpr>, Option<Span>) {
        if !self.at(SyntaxKind::ColonToken) || !self.nth_is_type_start(1) {
            return (None, None);
        }
        let colon = self.bump();
        match self.parse_type() {
            Some(ty) => {
                let span = Span::new(colon.span.start, self.previous_end());
                (Some(ty), Some(span))
            }
            None => (None, None),
        }
    }

    // ==================== class ====================

    fn parse_class(&mut self) -> Option<ClassDecl> {
        let class_kw = self.bump();
        let id = self.fresh_id();
        let (name, _) = self.parse_constant_path()?;

        let mut generics = Vec::new();
        let mut generics_span = None;
        let mut parent = None;

        if self.at(SyntaxKind::LessThanToken) && self.looks_like_generic_list() {
            let (list, span) = self.parse_generic_params()?;
            generics = list;
            generics_span = Some(span);
        }
        if self.eat(SyntaxKind::LessThanToken).is_some() {
            parent = self.parse_constant_path().map(|(n, _)| n);
        }
        let scope_mark = self.push_type_vars(&generics);

        let mut class = ClassDecl {
            id,
            name,
            parent,
            generics,
            generics_span,
            includes: Vec::new(),
            implements: Vec::new(),
            implements_spans: Vec::new(),
            ivars: Vec::new(),
            cvars: Vec::new(),
            attrs: Vec::new(),
            members: Vec::new(),
            span: Span::dummy(),
        };

        let mut visibility = Visibility::Public;
        loop {
            self.skip_separators();
            match self.kind() {
                SyntaxKind::EndKeyword => {
                    self.bump();
                    break;
                }
                SyntaxKind::EndOfFile => {
                    self.error(
                        codes::EXPECTED_END,
                        self.current().span,
                        format!("missing `end` for class `{}`", class.name),
                    );
                    break;
                }
                SyntaxKind::IncludeKeyword => {
                    self.bump();
                    while let Some((module_name, _)) = self.parse_constant_path() {
                        class.includes.push(module_name);
                        if self.eat(SyntaxKind::CommaToken).is_none() {
                            break;
                        }
                    }
                }
                SyntaxKind::ImplementsKeyword => {
                    let clause_start = self.current().span.start;
                    self.bump();
                    while let Some((iface_name, _)) = self.parse_constant_path() {
                        class.implements.push(iface_name);
                        if self.eat(SyntaxKind::CommaToken).is_none() {
                            break;
                        }
                    }
                    class
                        .implements_spans
                        .push(Span::new(clause_start, self.previous_end()));
                }
                SyntaxKind::InstanceVariable
                    if self.nth_kind(1) == SyntaxKind::ColonToken
                        && self.nth_is_type_start(2) =>
                {
                    if let Some(binding) = self.parse_var_binding() {
                        class.ivars.push(binding);
                    }
                }
                SyntaxKind::ClassVariable
                    if self.nth_kind(1) == SyntaxKind::ColonToken
                        && self.nth_is_type_start(2) =>
                {
                    if let Some(binding) = self.parse_var_binding() {
                        class.cvars.push(binding);
                    }
                }
                SyntaxKind::AttrReaderKeyword
                | SyntaxKind::AttrWriterKeyword
                | SyntaxKind::AttrAccessorKeyword => {
                    class.attrs.push(self.parse_attr_decl());
                }
                _ => {
                    let before = self.current();
                    if let Some(member) = self.parse_declaration(&mut visibility) {
                        class.members.push(member);
                    }
                    if self.current() == before && !self.at_eof() {
                        self.recover_to_line_end();
                    }
                }
            }
        }
        self.type_vars.truncate(scope_mark);

        class.span = Span::new(class_kw.span.start, self.previous_end());
        Some(class)
    }

    /// Decide `class Box<T>` (generic list) vs `class Foo < Bar`
    /// (superclass) with bounded lookahead after the `<`.
    fn looks_like_generic_list(&self) -> bool {
        if self.nth_kind(1) != SyntaxKind::ConstantName {
            return false;
        }
        matches!(
            self.nth_kind(2),
            SyntaxKind::GreaterThanToken
                | SyntaxKind::CommaToken
                | SyntaxKind::ColonToken
                | SyntaxKind::EqualsToken
        )
    }

    /// `@name: T` / `@@name: T` declaration line.
    fn parse_var_binding(&mut self) -> Option<VarBinding> {
        let var_token = self.bump();
        let raw = self.token_text(var_token);
        let name = raw.trim_start_matches('@').to_string();
        self.bump(); // `:`
        let ty = self.parse_type()?;
        Some(VarBinding {
            name,
            ty,
            span: Span::new(var_token.span.start, self.previous_end()),
        })
    }

    fn parse_attr_decl(&mut self) -> AttrDecl {
        let keyword = self.bump();
        let kind = match keyword.kind {
            SyntaxKind::AttrReaderKeyword => AttrKind::Reader,
            SyntaxKind::AttrWriterKeyword => AttrKind::Writer,
            _ => AttrKind::Accessor,
        };
        let mut names = Vec::new();
        while let Some(symbol) = self.eat(SyntaxKind::SymbolLiteral) {
            names.push(
                self.token_text(symbol)
                    .trim_start_matches(':')
                    .to_string(),
            );
            if self.eat(SyntaxKind::CommaToken).is_none() {
                break;
            }
        }
        AttrDecl {
            kind,
            names,
            span: Span::new(keyword.span.start, self.previous_end()),
        }
    }

    /// `Outer::Inner` constant paths.
    fn parse_constant_path(&mut self) -> Option<(String, Span)> {
        let first = self.expect(SyntaxKind::ConstantName, "a constant name")?;
        let start = first.span.start;
        let mut name = self.token_text(first).to_string();
        while self.at(SyntaxKind::ColonColonToken)
            && self.nth_kind(1) == SyntaxKind::ConstantName
        {
            self.bump();
            let part = self.bump();
            name.push_str("::");
            name.push_str(self.token_text(part));
        }
        Some((name, Span::new(start, self.previous_end())))
    }

    // ==================== module ====================

    fn parse_module(&mut self) -> Option<ModuleDecl> {
        let module_kw = self.bump();
        let id = self.fresh_id();
        let (name, _) = self.parse_constant_path()?;
        let mut members = Vec::new();
        let mut visibility = Visibility::Public;
        loop {
            self.skip_separators();
            match self.kind() {
                SyntaxKind::EndKeyword => {
                    self.bump();
                    break;
                }
                SyntaxKind::EndOfFile => {
                    self.error(
                        codes::EXPECTED_END,
                        self.current().span,
                        format!("missing `end` for module `{name}`"),
                    );
                    break;
                }
                _ => {
                    let before = self.current();
                    if let Some(member) = self.parse_declaration(&mut visibility) {
                        members.push(member);
                    }
                    if self.current() == before && !self.at_eof() {
                        self.recover_to_line_end();
                    }
                }
            }
        }
        Some(ModuleDecl {
            id,
            name,
            members,
            span: Span::new(module_kw.span.start, self.previous_end()),
        })
    }

    // ==================== interface ====================

    fn parse_interface(&mut self) -> Option<InterfaceDecl> {
        let interface_kw = self.bump();
        let id = self.fresh_id();
        let name_token = self.expect(SyntaxKind::ConstantName, "an interface name")?;
        let name = self.token_text(name_token).to_string();

        let mut generics = Vec::new();
        if self.at(SyntaxKind::LessThanToken) {
            let (list, _) = self.parse_generic_params()?;
            generics = list;
        }
        let scope_mark = self.push_type_vars(&generics);

        let mut parents = Vec::new();
        let mut methods = Vec::new();
        loop {
            self.skip_separators();
            match self.kind() {
                SyntaxKind::EndKeyword => {
                    self.bump();
                    break;
                }
                SyntaxKind::EndOfFile => {
                    self.error(
                        codes::EXPECTED_END,
                        self.current().span,
                        format!("missing `end` for interface `{name}`"),
                    );
                    break;
                }
                SyntaxKind::IncludeKeyword => {
                    self.bump();
                    while let Some((parent, _)) = self.parse_constant_path() {
                        parents.push(parent);
                        if self.eat(SyntaxKind::CommaToken).is_none() {
                            break;
                        }
                    }
                }
                SyntaxKind::DefKeyword => {
                    if let Some(sig) = self.parse_method_sig() {
                        methods.push(sig);
                    }
                }
                _ => {
                    let current = self.current();
                    self.error(
                        codes::UNEXPECTED_TOKEN,
                        current.span,
                        "interfaces may only contain method signatures and `include`",
                    );
                    self.recover_to_line_end();
                }
            }
        }
        self.type_vars.truncate(scope_mark);

        Some(InterfaceDecl {
            id,
            name,
            generics,
            parents,
            methods,
            span: Span::new(interface_kw.span.start, self.previous_end()),
        })
    }

    /// A bodyless method signature: `def name(params): R` / `def name: R`.
    fn parse_method_sig(&mut self) -> Option<MethodSig> {
        let def_kw = self.bump();
        let (name, _) = self.parse_method_name()?;
        let params = if self.at(SyntaxKind::LeftParenToken) {
            self.parse_params()
        } else {
            Vec::new()
        };
        let mut return_type = None;
        if self.eat(SyntaxKind::ColonToken).is_some() {
            return_type = self.parse_type();
        }
        Some(MethodSig {
            name,
            params,
            return_type,
            span: Span::new(def_kw.span.start, self.previous_end()),
        })
    }

    // ==================== type alias & constants ====================

    fn parse_type_alias(&mut self) -> Option<TypeAliasDecl> {
        let type_kw = self.bump();
        let id = self.fresh_id();
        let name_token = self.expect(SyntaxKind::ConstantName, "an alias name")?;
        let name = self.token_text(name_token).to_string();

        let mut generics = Vec::new();
        if self.at(SyntaxKind::LessThanToken) {
            let (list, _) = self.parse_generic_params()?;
            generics = list;
        }
        let scope_mark = self.push_type_vars(&generics);

        self.expect(SyntaxKind::EqualsToken, "`=`")?;
        let target = self.parse_type();
        self.type_vars.truncate(scope_mark);
        let target = match target {
            Some(target) => target,
            None => {
                self.recover_to_line_end();
                return None;
            }
        };

        Some(TypeAliasDecl {
            id,
            name,
            generics,
            target,
            span: Span::new(type_kw.span.start, self.previous_end()),
        })
    }

    fn parse_constant(&mut self, visibility: Visibility) -> Option<ConstantDecl> {
        let name_token = self.bump();
        let id = self.fresh_id();
        let name = self.token_text(name_token).to_string();

        let mut ty = None;
        let mut annotation_span = None;
        if self.at(SyntaxKind::ColonToken) {
            let colon = self.bump();
            ty = self.parse_type();
            if ty.is_some() {
                annotation_span = Some(Span::new(colon.span.start, self.previous_end()));
            }
        }

        self.expect(SyntaxKind::EqualsToken, "`=`")?;
        let value = self.parse_expression();

        Some(ConstantDecl {
            id,
            name,
            ty,
            annotation_span,
            value,
            visibility,
            span: Span::new(name_token.span.start, self.previous_end()),
        })
    }
}
