//! Recursive expression traversal utilities.
//!
//! # Example
//!
//! ```
//! use std::ops::ControlFlow;
//! use unfold_ir::walk::{ExprWalk, WalkAction};
//! use unfold_ir::{Block, Expr};
//!
//! let block = Block::new(vec![], Expr::get_item(Expr::var("t"), 1));
//!
//! // Check if any projection exists
//! let has_projection = block
//!     .walk_exprs(|expr| match expr {
//!         Expr::GetItem { .. } => ControlFlow::Break(()),
//!         _ => ControlFlow::Continue(WalkAction::Advance),
//!     })
//!     .is_break();
//! assert!(has_projection);
//! ```

use std::ops::ControlFlow;

use crate::{Block, Callee, Expr, Function};

/// Controls whether to descend into children during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Continue walking and descend into sub-expressions.
    Advance,
    /// Skip the sub-expressions of the current expression.
    Skip,
}

/// Pre-order traversal over every expression reachable from a node.
///
/// Binding right-hand sides are visited in program order, followed by the
/// block result.
pub trait ExprWalk {
    fn walk_exprs<B>(
        &self,
        f: impl FnMut(&Expr) -> ControlFlow<B, WalkAction>,
    ) -> ControlFlow<B, ()>;
}

// Internal helpers take `&mut dyn FnMut` to avoid recursion limit issues with impl FnMut
fn walk_expr_internal<B>(
    expr: &Expr,
    f: &mut dyn FnMut(&Expr) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    match f(expr)? {
        WalkAction::Skip => return ControlFlow::Continue(()),
        WalkAction::Advance => {}
    }
    match expr {
        Expr::Var(_) | Expr::Const(_) => {}
        Expr::Tuple(fields) => {
            for field in fields {
                walk_expr_internal(field, f)?;
            }
        }
        Expr::GetItem { tuple, .. } => walk_expr_internal(tuple, f)?,
        Expr::Call(call) => {
            if let Callee::Computed(callee) = &call.callee {
                walk_expr_internal(callee, f)?;
            }
            for arg in &call.args {
                walk_expr_internal(arg, f)?;
            }
        }
        Expr::If {
            cond,
            then_block,
            else_block,
        } => {
            walk_expr_internal(cond, f)?;
            walk_block_internal(then_block, f)?;
            walk_block_internal(else_block, f)?;
        }
    }
    ControlFlow::Continue(())
}

fn walk_block_internal<B>(
    block: &Block,
    f: &mut dyn FnMut(&Expr) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    for binding in &block.bindings {
        walk_expr_internal(&binding.value, f)?;
    }
    walk_expr_internal(&block.result, f)
}

impl ExprWalk for Expr {
    fn walk_exprs<B>(
        &self,
        mut f: impl FnMut(&Expr) -> ControlFlow<B, WalkAction>,
    ) -> ControlFlow<B, ()> {
        walk_expr_internal(self, &mut f)
    }
}

impl ExprWalk for Block {
    fn walk_exprs<B>(
        &self,
        mut f: impl FnMut(&Expr) -> ControlFlow<B, WalkAction>,
    ) -> ControlFlow<B, ()> {
        walk_block_internal(self, &mut f)
    }
}

impl ExprWalk for Function {
    fn walk_exprs<B>(
        &self,
        f: impl FnMut(&Expr) -> ControlFlow<B, WalkAction>,
    ) -> ControlFlow<B, ()> {
        self.body.walk_exprs(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Binding, Callee};

    fn nested_block() -> Block {
        Block::new(
            vec![
                Binding::new("a", Expr::get_item(Expr::var("t"), 0)),
                Binding::new(
                    "r",
                    Expr::call(
                        Callee::global("f"),
                        vec![Expr::var("a"), Expr::Tuple(vec![Expr::int(1)])],
                    ),
                ),
            ],
            Expr::If {
                cond: Box::new(Expr::var("c")),
                then_block: Block::new(vec![], Expr::var("r")),
                else_block: Block::new(vec![], Expr::get_item(Expr::var("u"), 1)),
            },
        )
    }

    #[test]
    fn test_walk_visits_in_program_order() {
        let mut vars = Vec::new();
        let _ = nested_block().walk_exprs(|expr| {
            if let Expr::Var(name) = expr {
                vars.push(name.clone());
            }
            ControlFlow::<(), WalkAction>::Continue(WalkAction::Advance)
        });
        assert_eq!(vars, ["t", "a", "c", "r", "u"]);
    }

    #[test]
    fn test_walk_skip_children() {
        let mut count = 0;
        let _ = nested_block().walk_exprs(|expr| {
            count += 1;
            if matches!(expr, Expr::Call(_) | Expr::If { .. }) {
                ControlFlow::<(), WalkAction>::Continue(WalkAction::Skip)
            } else {
                ControlFlow::Continue(WalkAction::Advance)
            }
        });
        // projection, t, call, conditional
        assert_eq!(count, 4);
    }

    #[test]
    fn test_walk_break_returns_value() {
        let found = nested_block().walk_exprs(|expr| match expr {
            Expr::Const(lit) => ControlFlow::Break(lit.clone()),
            _ => ControlFlow::Continue(WalkAction::Advance),
        });
        assert_eq!(found, ControlFlow::Break(crate::Literal::Int(1)));
    }
}
