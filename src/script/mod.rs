//! The restricted expression language used by filter (`[?(...)]`) and
//! dynamic (`[(...)]`) path segments.
//!
//! Expressions can read the subject node (`@`), its parent (`@parent`), its
//! key (`@property`), its parent's key (`@parentProperty`), its location
//! (`@path`) and named sandbox bindings. There is no assignment, no function
//! call and no access to anything outside the [`Scope`].
pub mod eval;
pub mod expression;
pub mod lexer;
pub mod parser;
pub mod token;

pub use eval::{Operand, Scope, ScriptValue};
pub use expression::{Expression, ExpressionKind};

use crate::errors::JSONPathError;

/// Parse an expression. `offset` is the byte position of `expr` within the
/// enclosing path, used to report error spans against the whole path.
pub fn parse(expr: &str, offset: usize) -> Result<Expression, JSONPathError> {
    let tokens = lexer::lex(expr, offset)?;
    parser::Parser::new().parse(tokens)
}
