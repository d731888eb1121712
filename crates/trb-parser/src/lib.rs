//! Parser and IR types for the trb typed-Ruby compiler.
//!
//! The IR (`ir` module) is the common currency between every later stage:
//! the solver reads it to assign types, the optimizer rewrites it, and all
//! three emitters walk it. The parser (`parser` module) is a single-pass
//! recursive descent over the scanner's token stream; type expressions are
//! parsed by precedence climbing.
//!
//! Parsing never panics and never uses exceptions for control flow: the
//! entry point returns a [`parser::ParseResult`] carrying the program plus
//! any diagnostics, and the caller decides whether parse errors are fatal.

pub mod ir;
pub mod parser;

pub use ir::types::{TypeExpr, TypeLit, intersection_of, optional_of, union_of};
pub use ir::{
    AttrDecl, AttrKind, BinOp, Block, BlockArg, ClassDecl, ConstantDecl, Declaration, Expr,
    ExprKind, FunctionDecl, GenericParam, InterfaceDecl, InterpolationPart, LiteralValue,
    MethodSig, ModuleDecl, NodeId, Param, ParamKind, Program, ScopeKind, TypeAliasDecl, UnOp,
    VarBinding, Visibility, block_terminates,
};
pub use parser::{ParseResult, parse_declaration_program, parse_program};
