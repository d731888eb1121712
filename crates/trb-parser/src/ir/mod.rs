//! The IR: a typed tree model of one source file.
//!
//! Nodes are created by the parser, may be replaced wholesale by the
//! optimizer (which produces a new `Program`), and are read by the
//! emitters. After inference completes, nodes are never mutated in place;
//! the solver's per-node type cache is the only mutable side table and it
//! is keyed by [`NodeId`].
//!
//! Every node carries a [`Span`]. Spans nest: a child's span always lies
//! within its parent's. The source-preserving Ruby emitter depends on this
//! to delete exactly the annotation fragments from the original text.

pub mod types;

use indexmap::IndexMap;
use trb_common::Span;
use types::TypeExpr;

/// Identity of an expression node, used to key the solver's type cache.
///
/// Ids are unique within one `Program`. The optimizer mints fresh ids from
/// [`Program::next_node_id`] when it synthesizes nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A parsed source file: declarations in source order plus lookup tables
/// for type aliases and interfaces.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub declarations: Vec<Declaration>,
    /// Type aliases by name, in declaration order.
    pub aliases: IndexMap<String, TypeAliasDecl>,
    /// Interfaces by name, in declaration order.
    pub interfaces: IndexMap<String, InterfaceDecl>,
    /// First id not yet used by any node; the optimizer allocates from here.
    pub next_node_id: u32,
}

impl Program {
    /// Look up a top-level class declaration by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.declarations.iter().find_map(|decl| match decl {
            Declaration::Class(class) if class.name == name => Some(class),
            _ => None,
        })
    }

    /// Look up a top-level function declaration by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.declarations.iter().find_map(|decl| match decl {
            Declaration::Function(func) if func.name == name => Some(func),
            _ => None,
        })
    }
}

/// Member visibility inside a class body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

/// A top-level or class-level declaration.
#[derive(Clone, Debug)]
pub enum Declaration {
    Function(FunctionDecl),
    Class(ClassDecl),
    Module(ModuleDecl),
    Interface(InterfaceDecl),
    TypeAlias(TypeAliasDecl),
    Constant(ConstantDecl),
    /// A bare expression at statement position.
    Statement(Expr),
}

impl Declaration {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Declaration::Function(d) => d.span,
            Declaration::Class(d) => d.span,
            Declaration::Module(d) => d.span,
            Declaration::Interface(d) => d.span,
            Declaration::TypeAlias(d) => d.span,
            Declaration::Constant(d) => d.span,
            Declaration::Statement(e) => e.span,
        }
    }

    /// The declared name, if this declaration introduces one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Function(d) => Some(&d.name),
            Declaration::Class(d) => Some(&d.name),
            Declaration::Module(d) => Some(&d.name),
            Declaration::Interface(d) => Some(&d.name),
            Declaration::TypeAlias(d) => Some(&d.name),
            Declaration::Constant(d) => Some(&d.name),
            Declaration::Statement(_) => None,
        }
    }
}

/// A generic parameter binder: `T`, `T: Bound`, `T = Default`.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericParam {
    pub name: String,
    /// Declared bound, an interface/class name or intersection of them.
    pub bound: Option<TypeExpr>,
    /// Default type argument.
    pub default: Option<TypeExpr>,
    pub span: Span,
}

/// How a parameter binds its argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Positional,
    /// Positional with a default value.
    OptionalPositional,
    Keyword,
    /// Keyword with a default value.
    OptionalKeyword,
    /// `*rest`
    Splat,
    /// `**opts`
    DoubleSplat,
    /// `&blk`
    Block,
}

/// One method parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// Declared type; absent in permissive mode.
    pub ty: Option<TypeExpr>,
    /// Span of the annotation to erase (`: T`, colon included).
    pub annotation_span: Option<Span>,
    pub default: Option<Expr>,
    pub span: Span,
}

/// A method or top-level function.
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub name: String,
    pub name_span: Span,
    /// `def self.name` singleton methods.
    pub singleton: bool,
    pub generics: Vec<GenericParam>,
    /// Span of the `<...>` generic list, erased from runtime output.
    pub generics_span: Option<Span>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    /// Span of the `: T` return annotation, colon included.
    pub return_annotation_span: Option<Span>,
    /// Absent for interface requirements and `.d.trb` input.
    pub body: Option<Block>,
    pub visibility: Visibility,
    pub span: Span,
}

/// A typed instance- or class-variable declaration line (`@name: T`).
/// The whole line is erased from runtime output.
#[derive(Clone, Debug)]
pub struct VarBinding {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `attr_reader` / `attr_writer` / `attr_accessor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrKind {
    Reader,
    Writer,
    Accessor,
}

/// One `attr_*` line inside a class body.
#[derive(Clone, Debug)]
pub struct AttrDecl {
    pub kind: AttrKind,
    /// Attribute names, without the leading `:`.
    pub names: Vec<String>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<String>,
    pub generics: Vec<GenericParam>,
    pub generics_span: Option<Span>,
    /// Included module names, in inclusion order (left-to-right lookup).
    pub includes: Vec<String>,
    /// Implemented interface names.
    pub implements: Vec<String>,
    /// Spans of `implements ...` clause lines, erased from runtime output.
    pub implements_spans: Vec<Span>,
    pub ivars: Vec<VarBinding>,
    pub cvars: Vec<VarBinding>,
    pub attrs: Vec<AttrDecl>,
    /// Member declarations in source order.
    pub members: Vec<Declaration>,
    pub span: Span,
}

impl ClassDecl {
    /// Find an instance method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&FunctionDecl> {
        self.members.iter().find_map(|member| match member {
            Declaration::Function(func) if func.name == name && !func.singleton => Some(func),
            _ => None,
        })
    }

    /// Find a singleton (`def self.`) method by name.
    #[must_use]
    pub fn singleton_method(&self, name: &str) -> Option<&FunctionDecl> {
        self.members.iter().find_map(|member| match member {
            Declaration::Function(func) if func.name == name && func.singleton => Some(func),
            _ => None,
        })
    }

    /// The declared type of an instance variable, if annotated.
    #[must_use]
    pub fn ivar_type(&self, name: &str) -> Option<&TypeExpr> {
        self.ivars.iter().find(|b| b.name == name).map(|b| &b.ty)
    }
}

#[derive(Clone, Debug)]
pub struct ModuleDecl {
    pub id: NodeId,
    pub name: String,
    pub members: Vec<Declaration>,
    pub span: Span,
}

/// A required method signature inside an interface (no body).
#[derive(Clone, Debug)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct InterfaceDecl {
    pub id: NodeId,
    pub name: String,
    pub generics: Vec<GenericParam>,
    /// Parent interfaces pulled in with `include`.
    pub parents: Vec<String>,
    pub methods: Vec<MethodSig>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct TypeAliasDecl {
    pub id: NodeId,
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub target: TypeExpr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ConstantDecl {
    pub id: NodeId,
    pub name: String,
    pub ty: Option<TypeExpr>,
    /// Span of the `: T` annotation, colon included.
    pub annotation_span: Option<Span>,
    pub value: Expr,
    pub visibility: Visibility,
    pub span: Span,
}

/// An ordered statement list. Its value is the value of the last statement;
/// if every path ends in `return`/`raise` the block has a terminator and no
/// implicit value.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub statements: Vec<Expr>,
    pub span: Span,
}

impl Block {
    #[must_use]
    pub fn new(statements: Vec<Expr>, span: Span) -> Self {
        Block { statements, span }
    }

    #[must_use]
    pub fn last(&self) -> Option<&Expr> {
        self.statements.last()
    }
}

/// Literal values in expression position.
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Symbol(String),
    Nil,
}

/// Which namespace a variable reference lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Local,
    Instance,
    Class,
    Global,
    Constant,
}

/// Binary operators with fixed typing rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Spaceship,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Range,
    RangeExclusive,
}

impl BinOp {
    /// The operator's source spelling (also the method name for overloads).
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::Spaceship => "<=>",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Range => "..",
            BinOp::RangeExclusive => "...",
        }
    }

    /// Whether this operator always produces a boolean.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq
        )
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    /// `-x`
    Neg,
    /// `!x` / `not x`
    Not,
}

/// A fragment of an interpolated string.
#[derive(Clone, Debug)]
pub enum InterpolationPart {
    /// Literal text between interpolations (quotes stripped).
    Str(String),
    Expr(Expr),
}

/// A block argument attached to a method call (`{ |x| .. }` / `do .. end`).
#[derive(Clone, Debug)]
pub struct BlockArg {
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
}

/// An expression node.
#[derive(Clone, Debug)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Literal(LiteralValue),
    /// `"a #{b} c"`, alternating text and expression fragments.
    Interpolation(Vec<InterpolationPart>),
    VariableRef {
        name: String,
        scope: ScopeKind,
    },
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
        /// `x: T = ...` local annotation.
        declared_type: Option<TypeExpr>,
        annotation_span: Option<Span>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    MethodCall {
        receiver: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
        block: Option<Box<BlockArg>>,
    },
    /// `receiver&.method(args)`
    SafeNavigation {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// Index access `receiver[args]`.
    Index {
        receiver: Box<Expr>,
        args: Vec<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_branch: Block,
        else_branch: Option<Block>,
        /// True for `unless` (condition is tested negated).
        negated: bool,
    },
    Case {
        scrutinee: Option<Box<Expr>>,
        /// Each arm: the `when` value patterns and the arm body.
        arms: Vec<(Vec<Expr>, Block)>,
        else_branch: Option<Block>,
    },
    While {
        condition: Box<Expr>,
        body: Block,
        /// True for `until` (condition is tested negated).
        negated: bool,
    },
    Return {
        value: Option<Box<Expr>>,
    },
    Raise {
        value: Option<Box<Expr>>,
    },
    Lambda {
        params: Vec<Param>,
        body: Block,
    },
    ArrayLiteral(Vec<Expr>),
    HashLiteral(Vec<(Expr, Expr)>),
    /// `expr as T`; erased from runtime output.
    TypeAssertion {
        expr: Box<Expr>,
        target: TypeExpr,
    },
    /// Syntax the body parser does not understand, passed through verbatim.
    Raw {
        text: String,
    },
}

impl Expr {
    #[must_use]
    pub fn new(id: NodeId, span: Span, kind: ExprKind) -> Self {
        Expr { id, span, kind }
    }

    /// Whether this expression unconditionally transfers control
    /// (`return`/`raise`, or a conditional all of whose branches do).
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        match &self.kind {
            ExprKind::Return { .. } | ExprKind::Raise { .. } => true,
            ExprKind::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => block_terminates(then_branch) && block_terminates(else_branch),
            ExprKind::Case {
                arms,
                else_branch: Some(else_branch),
                ..
            } => arms.iter().all(|(_, body)| block_terminates(body)) && block_terminates(else_branch),
            _ => false,
        }
    }
}

/// Whether a block's last statement is a terminator.
#[must_use]
pub fn block_terminates(block: &Block) -> bool {
    block.statements.iter().any(Expr::is_terminator)
}

impl trb_common::Spanned for Expr {
    fn span(&self) -> Span {
        self.span
    }
}
