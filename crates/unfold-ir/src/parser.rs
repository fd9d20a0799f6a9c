//! IR text format parser.
//!
//! Parses the textual format produced by [`super::printer`] back into a
//! [`Module`]. Uses winnow for parsing.
//!
//! A module is a sequence of definitions:
//!
//! ```text
//! // opaque target with a fixed calling convention
//! prim @kernel(tensor<16x16xu8>, i32) -> i32
//!
//! fn @main(%p: (i32, i32)) -> i32 {
//!   %r = call @kernel(%x, %p.1)
//!   %r
//! }
//! ```

use winnow::ascii;
use winnow::combinator::{alt, delimited, opt, preceded, repeat, separated, terminated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};

use crate::{
    Binding, Block, Call, Callee, Definition, Expr, Function, Literal, Module, Param, PrimFunc,
    PrimType, Type,
};

// ============================================================================
// Error type
// ============================================================================

/// Parse error for the IR text format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

fn backtrack<T>() -> ModalResult<T> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

// ============================================================================
// Lexical parsers
// ============================================================================

/// Skip whitespace and `//` line comments.
fn ws(input: &mut &str) -> ModalResult<()> {
    loop {
        take_while(0.., |c: char| c.is_ascii_whitespace())
            .void()
            .parse_next(input)?;
        if !input.starts_with("//") {
            return Ok(());
        }
        take_till(0.., '\n').void().parse_next(input)?;
    }
}

/// Parse an identifier: [a-zA-Z_][a-zA-Z0-9_]*
fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

/// Parse a variable reference: %name
fn var_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded('%', name).parse_next(input)
}

/// Parse a global reference: @name
fn global_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded('@', name).parse_next(input)
}

/// Parse a string literal: "content"
fn string_lit(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut result = String::new();
    loop {
        let c = any.parse_next(input)?;
        match c {
            '"' => break,
            '\\' => {
                let escaped = any.parse_next(input)?;
                match escaped {
                    '"' => result.push('"'),
                    '\\' => result.push('\\'),
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    _ => {
                        result.push('\\');
                        result.push(escaped);
                    }
                }
            }
            _ => result.push(c),
        }
    }
    Ok(result)
}

// ============================================================================
// Types
// ============================================================================

fn prim_type(input: &mut &str) -> ModalResult<PrimType> {
    let name = ident.parse_next(input)?;
    match PrimType::from_name(name) {
        Some(prim) => Ok(prim),
        None => backtrack(),
    }
}

/// Parse `tensor<DIMxDIMxDTYPE>` or `tensor<DTYPE>`.
fn tensor_type(input: &mut &str) -> ModalResult<Type> {
    ("tensor", '<').parse_next(input)?;
    let shape: Vec<u64> =
        repeat(0.., terminated(ascii::dec_uint::<_, u64, _>, 'x')).parse_next(input)?;
    let dtype = prim_type.parse_next(input)?;
    '>'.parse_next(input)?;
    Ok(Type::Tensor { shape, dtype })
}

fn tuple_type(input: &mut &str) -> ModalResult<Type> {
    delimited(
        ('(', ws),
        separated(0.., (ws, parse_type, ws).map(|(_, t, _)| t), ','),
        (ws, ')'),
    )
    .map(Type::Tuple)
    .parse_next(input)
}

fn parse_type(input: &mut &str) -> ModalResult<Type> {
    alt((
        tuple_type,
        tensor_type,
        "object".value(Type::Object),
        prim_type.map(Type::Prim),
    ))
    .parse_next(input)
}

// ============================================================================
// Expressions
// ============================================================================

fn expr(input: &mut &str) -> ModalResult<Expr> {
    alt((if_expr, call_expr, postfix_expr)).parse_next(input)
}

fn primary(input: &mut &str) -> ModalResult<Expr> {
    alt((
        var_name.map(Expr::var),
        "true".value(Expr::Const(Literal::Bool(true))),
        "false".value(Expr::Const(Literal::Bool(false))),
        string_lit.map(|s| Expr::Const(Literal::Str(s))),
        ascii::dec_int::<_, i64, _>.map(Expr::int),
        paren_expr,
    ))
    .parse_next(input)
}

/// Primary expression followed by any number of `.index` projections.
fn postfix_expr(input: &mut &str) -> ModalResult<Expr> {
    let mut expr = primary.parse_next(input)?;
    while let Some(index) = opt(preceded('.', ascii::dec_uint::<_, usize, _>)).parse_next(input)? {
        expr = Expr::get_item(expr, index);
    }
    Ok(expr)
}

/// `()` is the empty tuple, `(e)` groups, `(e,)` and `(e, f, ...)` are tuples.
fn paren_expr(input: &mut &str) -> ModalResult<Expr> {
    ('(', ws).parse_next(input)?;
    if opt(')').parse_next(input)?.is_some() {
        return Ok(Expr::Tuple(Vec::new()));
    }
    let first = expr.parse_next(input)?;
    ws.parse_next(input)?;
    if opt(')').parse_next(input)?.is_some() {
        return Ok(first);
    }
    ','.parse_next(input)?;
    let mut fields = vec![first];
    loop {
        ws.parse_next(input)?;
        if opt(')').parse_next(input)?.is_some() {
            return Ok(Expr::Tuple(fields));
        }
        fields.push(expr.parse_next(input)?);
        ws.parse_next(input)?;
        if opt(')').parse_next(input)?.is_some() {
            return Ok(Expr::Tuple(fields));
        }
        ','.parse_next(input)?;
    }
}

fn callee(input: &mut &str) -> ModalResult<Callee> {
    alt((
        global_name.map(Callee::global),
        preceded(("extern", ws), string_lit).map(Callee::Extern),
        postfix_expr.map(|e| Callee::Computed(Box::new(e))),
    ))
    .parse_next(input)
}

fn arg_list(input: &mut &str) -> ModalResult<Vec<Expr>> {
    delimited(
        ('(', ws),
        separated(0.., (ws, expr, ws).map(|(_, e, _)| e), ','),
        (ws, ')'),
    )
    .parse_next(input)
}

/// Parse `call CALLEE(args)`.
fn call_expr(input: &mut &str) -> ModalResult<Expr> {
    ("call", ws).parse_next(input)?;
    let callee = callee.parse_next(input)?;
    ws.parse_next(input)?;
    let args = arg_list.parse_next(input)?;
    Ok(Expr::Call(Call { callee, args }))
}

/// Parse `if COND { ... } else { ... }`.
fn if_expr(input: &mut &str) -> ModalResult<Expr> {
    ("if", ws).parse_next(input)?;
    let cond = postfix_expr.parse_next(input)?;
    ws.parse_next(input)?;
    let then_block = block.parse_next(input)?;
    (ws, "else", ws).parse_next(input)?;
    let else_block = block.parse_next(input)?;
    Ok(Expr::If {
        cond: Box::new(cond),
        then_block,
        else_block,
    })
}

// ============================================================================
// Blocks and definitions
// ============================================================================

/// Parse `%var[: type] = expr`.
fn binding(input: &mut &str) -> ModalResult<Binding> {
    let var = var_name.parse_next(input)?;
    ws.parse_next(input)?;
    let ty = opt(preceded((':', ws), parse_type)).parse_next(input)?;
    (ws, '=', ws).parse_next(input)?;
    let value = expr.parse_next(input)?;
    Ok(Binding {
        var: var.to_owned(),
        ty,
        value,
    })
}

/// Parse `{ bindings... result }`.
fn block(input: &mut &str) -> ModalResult<Block> {
    ('{', ws).parse_next(input)?;
    let bindings: Vec<Binding> = repeat(0.., terminated(binding, ws)).parse_next(input)?;
    let result = expr.parse_next(input)?;
    (ws, '}').parse_next(input)?;
    Ok(Block::new(bindings, result))
}

fn param_list(input: &mut &str) -> ModalResult<Vec<Param>> {
    delimited(
        ('(', ws),
        separated(
            0..,
            (ws, var_name, ws, ':', ws, parse_type, ws).map(|(_, name, _, _, _, ty, _)| Param {
                name: name.to_owned(),
                ty,
            }),
            ',',
        ),
        (ws, ')'),
    )
    .parse_next(input)
}

fn return_type(input: &mut &str) -> ModalResult<Option<Type>> {
    opt(preceded((ws, "->", ws), parse_type)).parse_next(input)
}

fn function_def(input: &mut &str) -> ModalResult<Function> {
    ("fn", ws).parse_next(input)?;
    let name = global_name.parse_next(input)?;
    ws.parse_next(input)?;
    let params = param_list.parse_next(input)?;
    let ret_ty = return_type.parse_next(input)?;
    ws.parse_next(input)?;
    let body = block.parse_next(input)?;
    Ok(Function {
        name: name.to_owned(),
        params,
        ret_ty,
        body,
    })
}

fn prim_def(input: &mut &str) -> ModalResult<PrimFunc> {
    ("prim", ws).parse_next(input)?;
    let name = global_name.parse_next(input)?;
    ws.parse_next(input)?;
    let params = tuple_type.parse_next(input)?;
    let ret_ty = return_type.parse_next(input)?;
    let Type::Tuple(params) = params else {
        return backtrack();
    };
    Ok(PrimFunc {
        name: name.to_owned(),
        params,
        ret_ty,
    })
}

fn definition(input: &mut &str) -> ModalResult<Definition> {
    alt((
        function_def.map(Definition::Function),
        prim_def.map(Definition::Prim),
    ))
    .parse_next(input)
}

// ============================================================================
// Public API
// ============================================================================

/// Run `parser` over the whole of `input`, rejecting trailing text.
fn parse_complete<'i, O>(
    input: &'i str,
    mut parser: impl Parser<&'i str, O, ErrMode<ContextError>>,
) -> Result<O, ParseError> {
    let mut remaining = input;
    let offset = |remaining: &str| input.len() - remaining.len();
    ws.parse_next(&mut remaining).map_err(|e| ParseError {
        message: format!("lexer error: {}", e),
        offset: offset(remaining),
    })?;
    let output = parser.parse_next(&mut remaining).map_err(|e| ParseError {
        message: format!("parse error: {}", e),
        offset: offset(remaining),
    })?;
    ws.parse_next(&mut remaining).map_err(|e| ParseError {
        message: format!("lexer error: {}", e),
        offset: offset(remaining),
    })?;
    if !remaining.is_empty() {
        return Err(ParseError {
            message: "unexpected trailing input".to_string(),
            offset: offset(remaining),
        });
    }
    Ok(output)
}

/// Parse a module from its textual representation.
pub fn parse_module(input: &str) -> Result<Module, ParseError> {
    let mut remaining = input;
    let mut module = Module::new();
    loop {
        ws.parse_next(&mut remaining).map_err(|e| ParseError {
            message: format!("lexer error: {}", e),
            offset: input.len() - remaining.len(),
        })?;
        if remaining.is_empty() {
            return Ok(module);
        }
        let start = input.len() - remaining.len();
        let def = definition
            .parse_next(&mut remaining)
            .map_err(|e| ParseError {
                message: format!("expected `fn` or `prim` definition: {}", e),
                offset: input.len() - remaining.len(),
            })?;
        if module.contains(def.name()) {
            return Err(ParseError {
                message: format!("duplicate definition @{}", def.name()),
                offset: start,
            });
        }
        module.insert(def);
    }
}

/// Parse a single expression.
pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    parse_complete(input, expr)
}

/// Parse a single type.
pub fn parse_type_str(input: &str) -> Result<Type, ParseError> {
    parse_complete(input, parse_type)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_module;

    #[test]
    fn test_parse_types() {
        assert_eq!(parse_type_str("i32"), Ok(Type::Prim(PrimType::I32)));
        assert_eq!(
            parse_type_str("tensor<16x16xu8>"),
            Ok(Type::Tensor {
                shape: vec![16, 16],
                dtype: PrimType::U8
            })
        );
        assert_eq!(
            parse_type_str("( i32 , (bool, object) )"),
            Ok(Type::Tuple(vec![
                PrimType::I32.into(),
                Type::Tuple(vec![PrimType::Bool.into(), Type::Object]),
            ]))
        );
        assert_eq!(parse_type_str("()"), Ok(Type::unit()));
        assert!(parse_type_str("i33").is_err());
    }

    #[test]
    fn test_parse_tuple_forms() {
        assert_eq!(parse_expr("()"), Ok(Expr::Tuple(vec![])));
        assert_eq!(parse_expr("(%a)"), Ok(Expr::var("a")));
        assert_eq!(parse_expr("(%a,)"), Ok(Expr::Tuple(vec![Expr::var("a")])));
        assert_eq!(
            parse_expr("(%a, -2, true)"),
            Ok(Expr::Tuple(vec![
                Expr::var("a"),
                Expr::int(-2),
                Expr::Const(Literal::Bool(true)),
            ]))
        );
    }

    #[test]
    fn test_parse_projection_chain() {
        assert_eq!(
            parse_expr("%t.1.0"),
            Ok(Expr::get_item(Expr::get_item(Expr::var("t"), 1), 0))
        );
        assert_eq!(
            parse_expr("(call @f()).2"),
            Ok(Expr::get_item(Expr::call(Callee::global("f"), vec![]), 2))
        );
    }

    #[test]
    fn test_parse_callees() {
        assert_eq!(
            parse_expr("call @f(%x, (%a, %b))"),
            Ok(Expr::call(
                Callee::global("f"),
                vec![
                    Expr::var("x"),
                    Expr::Tuple(vec![Expr::var("a"), Expr::var("b")])
                ]
            ))
        );
        assert_eq!(
            parse_expr(r#"call extern "rt.log"(1)"#),
            Ok(Expr::call(Callee::Extern("rt.log".into()), vec![Expr::int(1)]))
        );
        assert_eq!(
            parse_expr("call %f()"),
            Ok(Expr::call(
                Callee::Computed(Box::new(Expr::var("f"))),
                vec![]
            ))
        );
    }

    #[test]
    fn test_parse_module_with_comments() {
        let module = parse_module(
            r#"
// kernels
prim @kernel(tensor<5x7xf32>, i32) -> i32

fn @main(%p: (i32, i32), %c: bool) -> i32 {
  %t: (i32, i32) = (%x, 1) // literal
  %y = if %c {
    %t.0
  } else {
    %a = call @kernel(%x, %p.1)
    %a
  }
  %y
}
"#,
        )
        .expect("should parse");

        assert!(matches!(module.lookup("kernel"), Some(Definition::Prim(p)) if p.params.len() == 2));
        let main = module.function("main").expect("main");
        assert_eq!(main.params.len(), 2);
        assert_eq!(main.body.bindings.len(), 2);
        assert_eq!(main.body.bindings[0].ty.as_ref().map(Type::is_tuple), Some(true));
        assert_eq!(*main.body.result, Expr::var("y"));
    }

    #[test]
    fn test_roundtrip() {
        let text = r#"
prim @kernel(tensor<f32>) -> tensor<f32>

fn @main(%x: i32, %c: bool) -> (i32, i32) {
  %t = (%x, 1)
  %s = "a \"quoted\" string"
  %y: i32 = if (call @pred(%x)) {
    %t.0
  } else {
    call (call @pick(%c))(%x)
  }
  (%y, %x)
}
"#;
        let module = parse_module(text).expect("should parse");
        let printed = print_module(&module);
        let reparsed = parse_module(&printed).expect("printed output should parse");
        assert_eq!(module, reparsed, "round-trip failed:\n{printed}");
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let err = parse_module("fn @f() { 1 }\nprim @f()").unwrap_err();
        assert!(err.message.contains("duplicate definition @f"));
        assert_eq!(err.offset, 14);
    }

    #[test]
    fn test_trailing_input_rejected() {
        let err = parse_expr("%a %b").unwrap_err();
        assert_eq!(err.offset, 3);
    }
}
