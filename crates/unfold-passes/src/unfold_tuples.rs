//! Tuple unfolding pass.
//!
//! Replaces tuple-typed values by their fields wherever the calling
//! convention allows it:
//! - tuple parameters of non-entry functions become one parameter per field
//! - bindings of tuple literals and plain aliases of them are removed
//! - projections on those tuples are replaced by the projected field
//! - tuple arguments of calls to module functions are spread into the call
//!
//! The entry function keeps its signature, and its tuple parameters are not
//! decomposed inside its body either. Primitive functions have a fixed arity;
//! a call that would grow its argument list is rejected.
//!
//! Functions are rewritten independently against the input module and the
//! results are committed together, so the outcome does not depend on the
//! order in which functions are visited.

mod rewrite;
mod scope;

use std::collections::BTreeMap;

use tracing::debug;
use unfold_ir::{Definition, Function, Identifier, Module};

pub use rewrite::{CallTarget, flat_param_name};
pub use scope::TupleScope;

use crate::errors::{UnfoldError, UnfoldResult};
use rewrite::FunctionRewriter;

/// Configuration for tuple unfolding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnfoldTuplesConfig {
    /// Name of the function whose calling convention is kept.
    /// Default: "main"
    pub entry_point: String,
}

impl Default for UnfoldTuplesConfig {
    fn default() -> Self {
        Self {
            entry_point: "main".to_string(),
        }
    }
}

/// Counters describing what the pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UnfoldStats {
    /// Tuple parameters replaced by per-field parameters.
    pub flattened_params: usize,
    /// Tuple-literal and alias bindings removed.
    pub removed_bindings: usize,
    /// Calls whose argument list was expanded.
    pub expanded_calls: usize,
}

impl UnfoldStats {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of running tuple unfolding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnfoldTuplesOutput {
    /// The rewritten module.
    pub module: Module,
    pub stats: UnfoldStats,
}

/// Unfold tuples in `module` using `main` as the entry function.
pub fn unfold_tuples(module: &Module) -> UnfoldResult<Module> {
    unfold_tuples_with_config(module, &UnfoldTuplesConfig::default()).map(|output| output.module)
}

/// Unfold tuples with custom configuration.
pub fn unfold_tuples_with_config(
    module: &Module,
    config: &UnfoldTuplesConfig,
) -> UnfoldResult<UnfoldTuplesOutput> {
    UnfoldTuplesPass::new(module, config).run()
}

struct UnfoldTuplesPass<'a> {
    module: &'a Module,
    config: &'a UnfoldTuplesConfig,
    stats: UnfoldStats,
}

impl<'a> UnfoldTuplesPass<'a> {
    fn new(module: &'a Module, config: &'a UnfoldTuplesConfig) -> Self {
        Self {
            module,
            config,
            stats: UnfoldStats::default(),
        }
    }

    fn run(mut self) -> UnfoldResult<UnfoldTuplesOutput> {
        let (input, config) = (self.module, self.config);
        let entry_name = config.entry_point.as_str();
        let entry = match input.lookup(entry_name) {
            Some(Definition::Function(func)) => func,
            Some(Definition::Prim(_)) => return Err(UnfoldError::entry_not_function(entry_name)),
            None => return Err(UnfoldError::missing_entry(entry_name)),
        };

        let entry = self.rewrite(entry, false)?;

        let mut staged: BTreeMap<Identifier, Function> = BTreeMap::new();
        for func in input.functions() {
            if func.name == entry_name {
                continue;
            }
            let rewritten = self.rewrite(func, true)?;
            staged.insert(func.name.clone(), rewritten);
        }

        let mut module = input.clone();
        module.update_function(entry);
        for func in staged.into_values() {
            module.update_function(func);
        }

        debug!(
            "unfold_tuples: {} params flattened, {} bindings removed, {} calls expanded",
            self.stats.flattened_params, self.stats.removed_bindings, self.stats.expanded_calls
        );
        Ok(UnfoldTuplesOutput {
            module,
            stats: self.stats,
        })
    }

    fn rewrite(&mut self, func: &Function, flatten_params: bool) -> UnfoldResult<Function> {
        let before = self.stats;
        let rewritten = FunctionRewriter::new(self.module, &func.name, &mut self.stats)
            .rewrite_function(func, flatten_params)?;
        debug!(
            "@{}: {} params flattened, {} bindings removed, {} calls expanded",
            func.name,
            self.stats.flattened_params - before.flattened_params,
            self.stats.removed_bindings - before.removed_bindings,
            self.stats.expanded_calls - before.expanded_calls
        );
        Ok(rewritten)
    }
}
