//! Passes over unfold IR.
//!
//! - [`unfold_tuples`]: replace tuple values by their fields
//! - [`pipeline`]: Salsa tracked parse and unfold stages with diagnostics

pub mod diagnostic;
pub mod errors;
pub mod pipeline;
pub mod unfold_tuples;

pub use diagnostic::{CompilationPhase, Diagnostic, DiagnosticSeverity};
pub use errors::{UnfoldError, UnfoldErrorKind, UnfoldResult};
pub use pipeline::{
    CompilationResult, SourceProgram, compile, compile_with_diagnostics, parse_program,
    stage_unfold_tuples,
};
pub use unfold_tuples::{
    CallTarget, UnfoldStats, UnfoldTuplesConfig, UnfoldTuplesOutput, unfold_tuples,
    unfold_tuples_with_config,
};
