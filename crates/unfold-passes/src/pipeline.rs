//! Compilation pipeline.
//!
//! The stages are Salsa tracked functions, each cached on its input.
//!
//! ```text
//! SourceProgram
//!     │
//!     ▼
//! parse_program ─► Module
//!     │
//!     ▼
//! stage_unfold_tuples ─► UnfoldTuplesOutput (flattened module + stats)
//!     │
//!     ▼
//! compile ─► Module
//! ```
//!
//! A failing stage accumulates a [`Diagnostic`] and yields `None`; later
//! stages then yield `None` without adding diagnostics of their own.

use std::path::{Path, PathBuf};

use salsa::Accumulator;
use unfold_ir::{Module, parse_module};

use crate::diagnostic::{CompilationPhase, Diagnostic};
use crate::unfold_tuples::{UnfoldTuplesConfig, UnfoldTuplesOutput, unfold_tuples_with_config};

/// A program to compile: its text and the entry function to preserve.
#[salsa::input(debug)]
pub struct SourceProgram {
    #[returns(ref)]
    pub path: PathBuf,
    #[returns(ref)]
    pub text: String,
    #[returns(ref)]
    pub entry_point: String,
}

impl SourceProgram {
    /// Create a program using the default entry function.
    pub fn from_path(db: &dyn salsa::Database, path: impl AsRef<Path>, text: String) -> Self {
        SourceProgram::new(
            db,
            path.as_ref().to_path_buf(),
            text,
            UnfoldTuplesConfig::default().entry_point,
        )
    }
}

/// Result of running the pipeline.
#[derive(Debug)]
pub struct CompilationResult {
    /// The compiled module, if every stage succeeded.
    pub module: Option<Module>,
    /// Diagnostics collected during compilation.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

// =============================================================================
// Pipeline Stages
// =============================================================================

/// Stage 1: Parse the program text.
#[salsa::tracked]
pub fn parse_program(db: &dyn salsa::Database, source: SourceProgram) -> Option<Module> {
    match parse_module(source.text(db)) {
        Ok(module) => Some(module),
        Err(err) => {
            Diagnostic::error(
                CompilationPhase::Parsing,
                format!("{}: {err}", source.path(db).display()),
            )
            .accumulate(db);
            None
        }
    }
}

/// Stage 2: Unfold tuples.
#[salsa::tracked]
pub fn stage_unfold_tuples(
    db: &dyn salsa::Database,
    source: SourceProgram,
) -> Option<UnfoldTuplesOutput> {
    let module = parse_program(db, source)?;
    let config = UnfoldTuplesConfig {
        entry_point: source.entry_point(db).clone(),
    };
    match unfold_tuples_with_config(&module, &config) {
        Ok(output) => Some(output),
        Err(err) => {
            Diagnostic::error(CompilationPhase::Optimization, err.to_string()).accumulate(db);
            None
        }
    }
}

// =============================================================================
// Full Pipeline
// =============================================================================

/// Run the full pipeline on a program.
#[salsa::tracked]
pub fn compile(db: &dyn salsa::Database, source: SourceProgram) -> Option<Module> {
    stage_unfold_tuples(db, source).map(|output| output.module)
}

/// Run compilation and collect the diagnostics of every stage.
pub fn compile_with_diagnostics(
    db: &dyn salsa::Database,
    source: SourceProgram,
) -> CompilationResult {
    let module = compile(db, source);
    let diagnostics = compile::accumulated::<Diagnostic>(db, source)
        .into_iter()
        .cloned()
        .collect();

    CompilationResult {
        module,
        diagnostics,
    }
}
