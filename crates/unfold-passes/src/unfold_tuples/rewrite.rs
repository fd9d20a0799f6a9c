//! Expression rewriting for tuple unfolding.
//!
//! The traversal takes the input node by reference together with the
//! function's [`TupleScope`] and builds a new node. Nothing in the input
//! module is mutated.

use std::collections::HashSet;

use tracing::debug;
use unfold_ir::{
    Binding, Block, Call, Callee, Definition, Expr, Function, Identifier, Module, Param,
};

use super::UnfoldStats;
use super::scope::TupleScope;
use crate::errors::{UnfoldError, UnfoldResult};

/// How a call's callee may be treated during argument expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    /// A function defined in the module; its signature is rewritten too.
    Decomposable,
    /// A primitive function in the module; its arity must not change.
    FixedArity,
    /// Unknown name or computed callee; arguments are left in place.
    Opaque,
}

impl CallTarget {
    /// Classify `callee` by looking its name up in `module`.
    pub fn classify(module: &Module, callee: &Callee) -> Self {
        match callee.name().and_then(|name| module.lookup(name)) {
            Some(Definition::Function(_)) => CallTarget::Decomposable,
            Some(Definition::Prim(_)) => CallTarget::FixedArity,
            None => CallTarget::Opaque,
        }
    }
}

/// Name of the flat parameter holding field `index` of tuple parameter `param`.
pub fn flat_param_name(param: &str, index: usize) -> Identifier {
    format!("{param}_{index}")
}

/// Rewrites the functions of one module.
///
/// `module` is the input module; it is only used to classify callees, so
/// every function sees the definitions as they were before the pass.
pub(super) struct FunctionRewriter<'a> {
    module: &'a Module,
    stats: &'a mut UnfoldStats,
    /// Function being rewritten, for error messages.
    function: &'a str,
}

impl<'a> FunctionRewriter<'a> {
    pub(super) fn new(module: &'a Module, function: &'a str, stats: &'a mut UnfoldStats) -> Self {
        Self {
            module,
            stats,
            function,
        }
    }

    /// Rewrite `func`. With `flatten_params` unset the signature is copied
    /// through and its tuple parameters stay untracked.
    pub(super) fn rewrite_function(
        &mut self,
        func: &Function,
        flatten_params: bool,
    ) -> UnfoldResult<Function> {
        let mut scope = TupleScope::new();
        let params = if flatten_params {
            self.flatten_params(&func.params, &mut scope)?
        } else {
            func.params.clone()
        };
        let body = self.rewrite_block(&func.body, &mut scope)?;
        Ok(Function {
            name: func.name.clone(),
            params,
            ret_ty: func.ret_ty.clone(),
            body,
        })
    }

    fn flatten_params(
        &mut self,
        params: &[Param],
        scope: &mut TupleScope,
    ) -> UnfoldResult<Vec<Param>> {
        let mut taken: HashSet<Identifier> = params.iter().map(|p| p.name.clone()).collect();
        let mut new_params = Vec::with_capacity(params.len());
        for param in params {
            let Some(fields) = param.ty.tuple_fields() else {
                new_params.push(param.clone());
                continue;
            };
            let flat: Vec<Param> = fields
                .iter()
                .enumerate()
                .map(|(index, ty)| Param::new(flat_param_name(&param.name, index), ty.clone()))
                .collect();
            for flat_param in &flat {
                if !taken.insert(flat_param.name.clone()) {
                    return Err(UnfoldError::flat_param_clash(
                        self.function,
                        &param.name,
                        &flat_param.name,
                    ));
                }
            }
            debug!(
                "@{}: flattening %{} into {} parameters",
                self.function,
                param.name,
                flat.len()
            );
            scope.register_tuple(
                param.name.clone(),
                flat.iter().map(|p| Expr::Var(p.name.clone())).collect(),
            );
            new_params.extend(flat);
            self.stats.flattened_params += 1;
        }
        Ok(new_params)
    }

    fn rewrite_block(&mut self, block: &Block, scope: &mut TupleScope) -> UnfoldResult<Block> {
        let mut bindings = Vec::with_capacity(block.bindings.len());
        for binding in &block.bindings {
            if let Some(binding) = self.rewrite_binding(binding, scope)? {
                bindings.push(binding);
            }
        }
        let result = self.rewrite_expr(&block.result, scope)?;
        Ok(Block::new(bindings, result))
    }

    /// Returns `None` when the binding is absorbed into the scope.
    fn rewrite_binding(
        &mut self,
        binding: &Binding,
        scope: &mut TupleScope,
    ) -> UnfoldResult<Option<Binding>> {
        match &binding.value {
            Expr::Tuple(fields) => {
                // A tracked field would be copied out as a reference to a
                // removed binding.
                let unsupported = fields.iter().enumerate().find_map(|(index, field)| {
                    match field.as_var() {
                        Some(var) if scope.is_tracked(var) => Some((index, "tuple")),
                        _ if !field.is_leaf() => Some((index, field.kind_name())),
                        _ => None,
                    }
                });
                if let Some((index, field_kind)) = unsupported {
                    return Err(UnfoldError::unsupported_tuple_field(
                        self.function,
                        &binding.var,
                        index,
                        field_kind,
                    ));
                }
                scope.register_tuple(binding.var.clone(), fields.clone());
                self.stats.removed_bindings += 1;
                return Ok(None);
            }
            Expr::Var(source) if scope.register_alias(binding.var.clone(), source) => {
                self.stats.removed_bindings += 1;
                return Ok(None);
            }
            _ => {}
        }

        let value = self.rewrite_expr(&binding.value, scope)?;
        Ok(Some(Binding {
            var: binding.var.clone(),
            ty: binding.ty.clone(),
            value,
        }))
    }

    fn rewrite_expr(&mut self, expr: &Expr, scope: &mut TupleScope) -> UnfoldResult<Expr> {
        match expr {
            // A tracked tuple used as a whole value is rebuilt from its
            // components, since its binding no longer exists.
            Expr::Var(name) => Ok(match scope.lookup(name) {
                Some(components) => Expr::Tuple(components.to_vec()),
                None => expr.clone(),
            }),
            Expr::Const(_) => Ok(expr.clone()),
            Expr::Tuple(fields) => Ok(Expr::Tuple(self.rewrite_exprs(fields, scope)?)),
            Expr::GetItem { tuple, index } => self.rewrite_get_item(tuple, *index, scope),
            Expr::Call(call) => self.rewrite_call(call, scope),
            Expr::If {
                cond,
                then_block,
                else_block,
            } => Ok(Expr::If {
                cond: Box::new(self.rewrite_expr(cond, scope)?),
                then_block: self.rewrite_block(then_block, scope)?,
                else_block: self.rewrite_block(else_block, scope)?,
            }),
        }
    }

    fn rewrite_exprs(&mut self, exprs: &[Expr], scope: &mut TupleScope) -> UnfoldResult<Vec<Expr>> {
        exprs
            .iter()
            .map(|expr| self.rewrite_expr(expr, scope))
            .collect()
    }

    fn rewrite_get_item(
        &mut self,
        tuple: &Expr,
        index: usize,
        scope: &mut TupleScope,
    ) -> UnfoldResult<Expr> {
        if let Some(var) = tuple.as_var() {
            if let Some(components) = scope.lookup(var) {
                return components.get(index).cloned().ok_or_else(|| {
                    UnfoldError::projection_out_of_range(self.function, var, index, components.len())
                });
            }
        }
        Ok(Expr::GetItem {
            tuple: Box::new(self.rewrite_expr(tuple, scope)?),
            index,
        })
    }

    fn rewrite_call(&mut self, call: &Call, scope: &mut TupleScope) -> UnfoldResult<Expr> {
        let target = CallTarget::classify(self.module, &call.callee);
        if target == CallTarget::Opaque {
            let callee = match &call.callee {
                Callee::Computed(callee) => {
                    Callee::Computed(Box::new(self.rewrite_expr(callee, scope)?))
                }
                named => named.clone(),
            };
            let args = self.rewrite_exprs(&call.args, scope)?;
            return Ok(Expr::Call(Call { callee, args }));
        }

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            match arg {
                Expr::Var(name) if scope.is_tracked(name) => {
                    args.extend(scope.lookup(name).unwrap_or_default().iter().cloned());
                }
                Expr::Tuple(fields) => args.extend(self.rewrite_exprs(fields, scope)?),
                _ => args.push(self.rewrite_expr(arg, scope)?),
            }
        }

        if target == CallTarget::FixedArity && args.len() > call.args.len() {
            return Err(UnfoldError::illegal_arity_growth(
                self.function,
                call.callee.name().unwrap_or_default(),
                call.args.len(),
                args.len(),
            ));
        }
        if args.len() != call.args.len() {
            self.stats.expanded_calls += 1;
        }

        Ok(Expr::Call(Call {
            callee: call.callee.clone(),
            args,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unfold_ir::{PrimFunc, PrimType, Type, parse_expr};

    fn module_with(defs: Vec<Definition>) -> Module {
        let mut module = Module::new();
        for def in defs {
            module.insert(def);
        }
        module
    }

    fn helper() -> Definition {
        Definition::Function(Function {
            name: "g".into(),
            params: vec![Param::new("x", PrimType::I32), Param::new("y", PrimType::I32)],
            ret_ty: None,
            body: Block::new(vec![], Expr::var("x")),
        })
    }

    fn kernel() -> Definition {
        Definition::Prim(PrimFunc {
            name: "kernel".into(),
            params: vec![PrimType::I32.into()],
            ret_ty: None,
        })
    }

    fn expr(text: &str) -> Expr {
        parse_expr(text).expect("valid expression")
    }

    fn rewrite(module: &Module, scope: &mut TupleScope, text: &str) -> UnfoldResult<Expr> {
        let mut stats = UnfoldStats::default();
        FunctionRewriter::new(module, "test", &mut stats).rewrite_expr(&expr(text), scope)
    }

    fn scope_with_tuple(var: &str, components: &[&str]) -> TupleScope {
        let mut scope = TupleScope::new();
        scope.register_tuple(
            var.into(),
            components.iter().map(|name| Expr::var(*name)).collect(),
        );
        scope
    }

    #[test]
    fn test_classify_callees() {
        let module = module_with(vec![helper(), kernel()]);
        assert_eq!(
            CallTarget::classify(&module, &Callee::global("g")),
            CallTarget::Decomposable
        );
        assert_eq!(
            CallTarget::classify(&module, &Callee::Extern("kernel".into())),
            CallTarget::FixedArity
        );
        assert_eq!(
            CallTarget::classify(&module, &Callee::global("unknown")),
            CallTarget::Opaque
        );
        assert_eq!(
            CallTarget::classify(&module, &Callee::Computed(Box::new(Expr::var("g")))),
            CallTarget::Opaque
        );
    }

    #[test]
    fn test_projection_substitutes_component() {
        let module = Module::new();
        let mut scope = scope_with_tuple("t", &["a", "b"]);
        assert_eq!(rewrite(&module, &mut scope, "%t.1"), Ok(Expr::var("b")));
        // Untracked projections are kept.
        assert_eq!(
            rewrite(&module, &mut scope, "%u.1"),
            Ok(Expr::get_item(Expr::var("u"), 1))
        );
    }

    #[test]
    fn test_projection_out_of_range() {
        let module = Module::new();
        let mut scope = scope_with_tuple("t", &["a", "b"]);
        let err = rewrite(&module, &mut scope, "%t.2").unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::UnfoldErrorKind::ProjectionOutOfRange { index: 2, arity: 2, .. }
        ));
    }

    #[test]
    fn test_call_expansion_preserves_field_order() {
        let module = module_with(vec![helper()]);
        let mut scope = scope_with_tuple("t", &["x", "y", "z"]);
        assert_eq!(
            rewrite(&module, &mut scope, "call @g(%t, 1, (%p, %q))"),
            Ok(expr("call @g(%x, %y, %z, 1, %p, %q)"))
        );
    }

    #[test]
    fn test_opaque_call_keeps_arity() {
        let module = module_with(vec![helper()]);
        let mut scope = scope_with_tuple("t", &["x", "y"]);
        // The tuple is passed whole, rebuilt from its components.
        assert_eq!(
            rewrite(&module, &mut scope, r#"call extern "rt.print"(%t, (%a, %b))"#),
            Ok(expr(r#"call extern "rt.print"((%x, %y), (%a, %b))"#))
        );
        assert_eq!(
            rewrite(&module, &mut scope, "call %f(%t.0)"),
            Ok(expr("call %f(%x)"))
        );
    }

    #[test]
    fn test_fixed_arity_growth_is_rejected() {
        let module = module_with(vec![kernel()]);
        let mut scope = scope_with_tuple("t", &["x", "y"]);
        let err = rewrite(&module, &mut scope, "call @kernel(%t)").unwrap_err();
        assert_eq!(
            err.kind(),
            &crate::UnfoldErrorKind::IllegalArityGrowth {
                function: "test".into(),
                callee: "kernel".into(),
                original: 1,
                expanded: 2,
            }
        );
        // No growth, no error.
        assert_eq!(
            rewrite(&module, &mut scope, "call @kernel(%t.0)"),
            Ok(expr("call @kernel(%x)"))
        );
    }

    #[test]
    fn test_flatten_params_registers_components() {
        let module = Module::new();
        let mut stats = UnfoldStats::default();
        let mut scope = TupleScope::new();
        let params = vec![
            Param::new("a", PrimType::Bool),
            Param::new(
                "q",
                Type::Tuple(vec![PrimType::I32.into(), PrimType::I64.into()]),
            ),
        ];
        let flat = FunctionRewriter::new(&module, "f", &mut stats)
            .flatten_params(&params, &mut scope)
            .unwrap();
        assert_eq!(
            flat,
            vec![
                Param::new("a", PrimType::Bool),
                Param::new("q_0", PrimType::I32),
                Param::new("q_1", PrimType::I64),
            ]
        );
        assert_eq!(
            scope.lookup("q"),
            Some([Expr::var("q_0"), Expr::var("q_1")].as_slice())
        );
        assert_eq!(stats.flattened_params, 1);
    }
}
