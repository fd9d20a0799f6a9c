//! IR text format printer.
//!
//! Prints modules in the textual format accepted by [`super::parser`].
//! Printing and re-parsing a module yields an equal module.
//!
//! # Example output
//!
//! ```text
//! prim @kernel(tensor<5x7xf32>, i32) -> tensor<5x7xf32>
//!
//! fn @main(%x: i32, %c: bool) -> (i32, i32) {
//!   %t = (%x, 1)
//!   %y: i32 = if %c {
//!     %t.0
//!   } else {
//!     call @kernel(%x)
//!   }
//!   (%y, %x)
//! }
//! ```

use std::fmt::{self, Write};

use crate::{Block, Callee, Definition, Expr, Function, Literal, Module, PrimFunc};

const INDENT: &str = "  ";

/// Printer state: output buffer and current indentation depth.
pub struct PrintState<'a> {
    out: &'a mut dyn Write,
    depth: usize,
}

impl<'a> PrintState<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out, depth: 0 }
    }

    fn indent(&mut self) -> fmt::Result {
        for _ in 0..self.depth {
            self.out.write_str(INDENT)?;
        }
        Ok(())
    }

    pub fn print_definition(&mut self, definition: &Definition) -> fmt::Result {
        match definition {
            Definition::Function(func) => self.print_function(func),
            Definition::Prim(prim) => self.print_prim(prim),
        }
    }

    pub fn print_prim(&mut self, prim: &PrimFunc) -> fmt::Result {
        write!(self.out, "prim @{}(", prim.name)?;
        for (i, ty) in prim.params.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            write!(self.out, "{ty}")?;
        }
        self.out.write_str(")")?;
        if let Some(ret) = &prim.ret_ty {
            write!(self.out, " -> {ret}")?;
        }
        self.out.write_str("\n")
    }

    pub fn print_function(&mut self, func: &Function) -> fmt::Result {
        self.indent()?;
        write!(self.out, "fn @{}(", func.name)?;
        for (i, param) in func.params.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            write!(self.out, "%{}: {}", param.name, param.ty)?;
        }
        self.out.write_str(")")?;
        if let Some(ret) = &func.ret_ty {
            write!(self.out, " -> {ret}")?;
        }
        self.out.write_str(" {\n")?;
        self.print_block_body(&func.body)?;
        self.indent()?;
        self.out.write_str("}\n")
    }

    /// Print the lines of a block one level deeper than the current depth.
    fn print_block_body(&mut self, block: &Block) -> fmt::Result {
        self.depth += 1;
        for binding in &block.bindings {
            self.indent()?;
            write!(self.out, "%{}", binding.var)?;
            if let Some(ty) = &binding.ty {
                write!(self.out, ": {ty}")?;
            }
            self.out.write_str(" = ")?;
            self.print_expr(&binding.value)?;
            self.out.write_str("\n")?;
        }
        self.indent()?;
        self.print_expr(&block.result)?;
        self.out.write_str("\n")?;
        self.depth -= 1;
        Ok(())
    }

    pub fn print_expr(&mut self, expr: &Expr) -> fmt::Result {
        match expr {
            Expr::Var(name) => write!(self.out, "%{name}"),
            Expr::Const(lit) => write!(self.out, "{lit}"),
            Expr::Tuple(fields) => {
                self.out.write_str("(")?;
                self.print_expr_list(fields)?;
                if fields.len() == 1 {
                    self.out.write_str(",")?;
                }
                self.out.write_str(")")
            }
            Expr::GetItem { tuple, index } => {
                self.print_postfix_operand(tuple)?;
                write!(self.out, ".{index}")
            }
            Expr::Call(call) => {
                self.out.write_str("call ")?;
                match &call.callee {
                    Callee::Global(name) => write!(self.out, "@{name}")?,
                    Callee::Extern(symbol) => {
                        self.out.write_str("extern ")?;
                        write_string_lit(self.out, symbol)?;
                    }
                    Callee::Computed(callee) => self.print_postfix_operand(callee)?,
                }
                self.out.write_str("(")?;
                self.print_expr_list(&call.args)?;
                self.out.write_str(")")
            }
            Expr::If {
                cond,
                then_block,
                else_block,
            } => {
                self.out.write_str("if ")?;
                self.print_postfix_operand(cond)?;
                self.out.write_str(" {\n")?;
                self.print_block_body(then_block)?;
                self.indent()?;
                self.out.write_str("} else {\n")?;
                self.print_block_body(else_block)?;
                self.indent()?;
                self.out.write_str("}")
            }
        }
    }

    fn print_expr_list(&mut self, exprs: &[Expr]) -> fmt::Result {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            self.print_expr(expr)?;
        }
        Ok(())
    }

    /// Calls and conditionals need parentheses before `.index`, `(args)` or
    /// a branch body.
    fn print_postfix_operand(&mut self, expr: &Expr) -> fmt::Result {
        if matches!(expr, Expr::Call(_) | Expr::If { .. }) {
            self.out.write_str("(")?;
            self.print_expr(expr)?;
            self.out.write_str(")")
        } else {
            self.print_expr(expr)
        }
    }
}

fn write_string_lit(out: &mut dyn Write, s: &str) -> fmt::Result {
    out.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\t' => out.write_str("\\t")?,
            '\r' => out.write_str("\\r")?,
            _ => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

/// Print a whole module; definitions in name order, separated by blank lines.
pub fn print_module(module: &Module) -> String {
    module.to_string()
}

/// Print a single function definition.
pub fn print_function(func: &Function) -> String {
    func.to_string()
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Str(s) => write_string_lit(f, s),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        PrintState::new(f).print_expr(self)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        PrintState::new(f).print_function(self)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut state = PrintState::new(f);
        for (i, definition) in self.definitions.values().enumerate() {
            if i > 0 {
                state.out.write_str("\n")?;
            }
            state.print_definition(definition)?;
        }
        Ok(())
    }
}
