//! Common test utilities for integration tests.

use std::io::Write;
use std::ops::ControlFlow;
use std::process::{Command, Output};

use tempfile::NamedTempFile;
use unfold::ir::{Callee, Expr, ExprWalk, Function, Module, WalkAction, parse_module};

/// Parse a module fixture, panicking on malformed text.
#[allow(dead_code)]
pub fn module(text: &str) -> Module {
    parse_module(text).unwrap_or_else(|e| panic!("invalid fixture: {e}\n{text}"))
}

/// Every call in `func`, in pre-order, as (callee, argument count).
#[allow(dead_code)]
pub fn call_arities(func: &Function) -> Vec<(Callee, usize)> {
    let mut calls = Vec::new();
    let _ = func.walk_exprs(|expr| {
        if let Expr::Call(call) = expr {
            calls.push((call.callee.clone(), call.args.len()));
        }
        ControlFlow::<(), WalkAction>::Continue(WalkAction::Advance)
    });
    calls
}

/// Run the `unfold` binary on `program` written to a temporary file.
#[allow(dead_code)]
pub fn run_unfold(args: &[&str], program: &str) -> Output {
    let mut temp_file = NamedTempFile::with_suffix(".ufd").expect("Failed to create temp file");
    temp_file
        .write_all(program.as_bytes())
        .expect("Failed to write program");

    Command::new(env!("CARGO_BIN_EXE_unfold"))
        .args(args)
        .arg(temp_file.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute unfold")
}
