//! Per-function tuple alias tracking.

use std::collections::HashMap;

use tracing::trace;
use unfold_ir::{Expr, Identifier};

/// Tuple variables known within the function currently being rewritten.
///
/// Every tracked variable maps to a canonical variable, and every canonical
/// variable owns the ordered component expressions of its tuple. Alias chains
/// are collapsed when they are registered, so `resolve` never has to follow
/// more than one link.
#[derive(Debug, Default)]
pub struct TupleScope {
    /// Canonical tuple variable -> its components, one per field.
    components: HashMap<Identifier, Vec<Expr>>,
    /// Tracked variable -> canonical tuple variable.
    aliases: HashMap<Identifier, Identifier>,
}

impl TupleScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `var` as a canonical tuple with the given components.
    pub fn register_tuple(&mut self, var: Identifier, components: Vec<Expr>) {
        trace!("tracking %{} with {} components", var, components.len());
        self.aliases.insert(var.clone(), var.clone());
        self.components.insert(var, components);
    }

    /// Make `var` denote the same tuple as `source`.
    ///
    /// Returns `false` and records nothing when `source` is not tracked.
    pub fn register_alias(&mut self, var: Identifier, source: &str) -> bool {
        let Some(canonical) = self.resolve(source).cloned() else {
            return false;
        };
        trace!("aliasing %{} to %{}", var, canonical);
        self.aliases.insert(var, canonical);
        true
    }

    /// The canonical tuple variable `var` denotes, if it is tracked.
    pub fn resolve(&self, var: &str) -> Option<&Identifier> {
        self.aliases.get(var)
    }

    /// Components of a canonical tuple variable.
    pub fn components_of(&self, canonical: &str) -> &[Expr] {
        self.components
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Components of the tuple `var` denotes, if it is tracked.
    pub fn lookup(&self, var: &str) -> Option<&[Expr]> {
        let canonical = self.resolve(var)?;
        Some(self.components_of(canonical))
    }

    pub fn is_tracked(&self, var: &str) -> bool {
        self.aliases.contains_key(var)
    }
}
