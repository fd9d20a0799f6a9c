//! Tuple unfolding for a small functional IR.
//!
//! The IR lives in [`ir`], the pass and its Salsa pipeline in [`passes`].

pub use unfold_ir as ir;
pub use unfold_passes as passes;

pub use unfold_passes::{
    CompilationResult, Diagnostic, SourceProgram, UnfoldError, UnfoldStats, UnfoldTuplesConfig,
    UnfoldTuplesOutput, compile, compile_with_diagnostics, unfold_tuples,
    unfold_tuples_with_config,
};
