//! Core IR structures: modules, functions, blocks, bindings and expressions.
//!
//! Variables are identified by name. Names are expected to be unique within
//! a function, so a name can be used as the identity of the value it binds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Type;

/// Name of a variable, parameter or module-level definition.
pub type Identifier = String;

/// Constant leaf values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Str(String),
}

/// IR expressions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a parameter or a bound variable.
    Var(Identifier),
    /// Constant value.
    Const(Literal),
    /// Tuple literal `(a, b, ...)`.
    Tuple(Vec<Expr>),
    /// Field projection `tuple.index`.
    GetItem { tuple: Box<Expr>, index: usize },
    /// Function call.
    Call(Call),
    /// Two-way conditional; each branch is its own block.
    If {
        cond: Box<Expr>,
        then_block: Block,
        else_block: Block,
    },
}

impl Expr {
    pub fn var(name: impl Into<Identifier>) -> Self {
        Expr::Var(name.into())
    }

    pub fn int(value: i64) -> Self {
        Expr::Const(Literal::Int(value))
    }

    pub fn get_item(tuple: Expr, index: usize) -> Self {
        Expr::GetItem {
            tuple: Box::new(tuple),
            index,
        }
    }

    pub fn call(callee: Callee, args: Vec<Expr>) -> Self {
        Expr::Call(Call { callee, args })
    }

    /// Variable references and constants.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Expr::Var(_) | Expr::Const(_))
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name),
            _ => None,
        }
    }

    /// Short label of the expression kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Var(_) => "variable",
            Expr::Const(_) => "constant",
            Expr::Tuple(_) => "tuple",
            Expr::GetItem { .. } => "projection",
            Expr::Call(_) => "call",
            Expr::If { .. } => "conditional",
        }
    }
}

/// A call expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    pub callee: Callee,
    pub args: Vec<Expr>,
}

/// The target of a call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Callee {
    /// Module-level definition referenced by name: `@name`.
    Global(Identifier),
    /// Symbol resolved at link time: `extern "symbol"`.
    Extern(String),
    /// Callee computed by an expression.
    Computed(Box<Expr>),
}

impl Callee {
    pub fn global(name: impl Into<Identifier>) -> Self {
        Callee::Global(name.into())
    }

    /// The name this callee can be looked up by, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Callee::Global(name) | Callee::Extern(name) => Some(name),
            Callee::Computed(_) => None,
        }
    }
}

/// `var[: ty] = value`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub var: Identifier,
    pub ty: Option<Type>,
    pub value: Expr,
}

impl Binding {
    pub fn new(var: impl Into<Identifier>, value: Expr) -> Self {
        Self {
            var: var.into(),
            ty: None,
            value,
        }
    }
}

/// Sequence of bindings followed by a result expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub bindings: Vec<Binding>,
    pub result: Box<Expr>,
}

impl Block {
    pub fn new(bindings: Vec<Binding>, result: Expr) -> Self {
        Self {
            bindings,
            result: Box::new(result),
        }
    }
}

/// Typed function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    pub name: Identifier,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<Identifier>, ty: impl Into<Type>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Function defined in the module, with a body the passes may rewrite.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Function {
    pub name: Identifier,
    pub params: Vec<Param>,
    pub ret_ty: Option<Type>,
    pub body: Block,
}

/// Low-level function with a fixed calling convention and no visible body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimFunc {
    pub name: Identifier,
    pub params: Vec<Type>,
    pub ret_ty: Option<Type>,
}

/// A module-level definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Definition {
    Function(Function),
    Prim(PrimFunc),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Function(func) => &func.name,
            Definition::Prim(prim) => &prim.name,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Definition::Function(func) => Some(func),
            Definition::Prim(_) => None,
        }
    }
}

/// A whole program: named definitions resolved through a global name table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Module {
    pub definitions: BTreeMap<Identifier, Definition>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a global name to its definition.
    pub fn lookup(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Resolve a global name to a function with a body.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.lookup(name).and_then(Definition::as_function)
    }

    /// All functions with bodies, in name order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.definitions.values().filter_map(Definition::as_function)
    }

    /// Add or replace a definition, returning the previous one.
    pub fn insert(&mut self, definition: Definition) -> Option<Definition> {
        self.definitions
            .insert(definition.name().to_owned(), definition)
    }

    /// Replace the function stored under `func.name`.
    pub fn update_function(&mut self, func: Function) {
        self.insert(Definition::Function(func));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimType;

    fn sample_module() -> Module {
        let mut module = Module::new();
        module.insert(Definition::Function(Function {
            name: "main".into(),
            params: vec![Param::new("x", PrimType::I32)],
            ret_ty: Some(PrimType::I32.into()),
            body: Block::new(vec![], Expr::var("x")),
        }));
        module.insert(Definition::Prim(PrimFunc {
            name: "kernel".into(),
            params: vec![PrimType::I32.into()],
            ret_ty: None,
        }));
        module
    }

    #[test]
    fn test_lookup_distinguishes_functions_and_prims() {
        let module = sample_module();
        assert!(module.function("main").is_some());
        assert!(module.contains("kernel"));
        assert!(module.function("kernel").is_none());
        assert!(module.lookup("missing").is_none());
        assert_eq!(module.functions().count(), 1);
    }

    #[test]
    fn test_update_function_replaces_in_place() {
        let mut module = sample_module();
        let mut main = module.function("main").cloned().unwrap();
        main.params.clear();
        module.update_function(main);
        assert!(module.function("main").unwrap().params.is_empty());
        assert_eq!(module.definitions.len(), 2);
    }

    #[test]
    fn test_callee_name() {
        assert_eq!(Callee::global("f").name(), Some("f"));
        assert_eq!(Callee::Extern("rt.log".into()).name(), Some("rt.log"));
        assert_eq!(Callee::Computed(Box::new(Expr::var("f"))).name(), None);
    }

    #[test]
    fn test_leaf_exprs() {
        assert!(Expr::var("a").is_leaf());
        assert!(Expr::int(3).is_leaf());
        assert!(!Expr::Tuple(vec![]).is_leaf());
        assert!(!Expr::get_item(Expr::var("t"), 0).is_leaf());
    }

    #[test]
    fn test_module_json_shape() {
        let module = sample_module();
        let json = serde_json::to_value(&module).unwrap();
        assert_eq!(json["definitions"]["kernel"]["Prim"]["params"][0]["Prim"], "I32");

        let back: Module = serde_json::from_value(json).unwrap();
        assert_eq!(back, module);
    }
}
