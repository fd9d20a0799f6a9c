//! Unfold IR crate.
//!
//! A small functional IR: modules of named functions whose bodies are blocks
//! of variable bindings over calls, tuple literals, field projections and
//! conditionals. Opaque primitive functions with fixed calling conventions
//! live in the same global name table.

pub mod ir;
pub mod parser;
pub mod printer;
pub mod types;
pub mod walk;

pub use ir::{
    Binding, Block, Call, Callee, Definition, Expr, Function, Identifier, Literal, Module, Param,
    PrimFunc,
};
pub use parser::{ParseError, parse_expr, parse_module};
pub use printer::{print_function, print_module};
pub use types::{PrimType, Type};
pub use walk::{ExprWalk, WalkAction};
