use std::{iter::Peekable, vec::IntoIter};

use crate::{
    errors::JSONPathError,
    script::{
        expression::{
            ArithmeticOperator, ComparisonOperator, Expression, ExpressionKind, LogicalOperator,
        },
        token::{Token, TokenType},
    },
};

use TokenType::*;

const EOQ_TOKEN: Token = Token {
    kind: Eoq,
    span: (0, 0),
};

type Tokens = Peekable<IntoIter<Token>>;

const PRECEDENCE_LOWEST: u8 = 1;
const PRECEDENCE_LOGICAL_OR: u8 = 3;
const PRECEDENCE_LOGICAL_AND: u8 = 4;
const PRECEDENCE_EQUALITY: u8 = 5;
const PRECEDENCE_RELATIONAL: u8 = 6;
const PRECEDENCE_ADDITIVE: u8 = 7;
const PRECEDENCE_MULTIPLICATIVE: u8 = 8;
const PRECEDENCE_PREFIX: u8 = 9;

pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Parser
    }

    pub fn parse(&self, tokens: Vec<Token>) -> Result<Expression, JSONPathError> {
        let mut it = tokens.into_iter().peekable();

        if let Some(Token { kind: Eoq, span }) = it.peek() {
            return Err(JSONPathError::syntax(
                String::from("empty expression"),
                *span,
            ));
        }

        let expr = self.parse_expression(&mut it, PRECEDENCE_LOWEST)?;

        match next(&mut it) {
            Token { kind: Eoq, .. } => Ok(expr),
            token => Err(JSONPathError::syntax(
                format!("expected end of expression, found {}", token.kind),
                token.span,
            )),
        }
    }

    fn parse_expression(&self, it: &mut Tokens, precedence: u8) -> Result<Expression, JSONPathError> {
        let mut left = self.parse_prefix_expression(it)?;

        loop {
            let peek_kind = &it.peek().unwrap_or(&EOQ_TOKEN).kind;
            if !is_infix(peek_kind) || self.precedence(peek_kind) <= precedence {
                break;
            }

            left = self.parse_infix_expression(it, left)?;
        }

        Ok(left)
    }

    fn parse_prefix_expression(&self, it: &mut Tokens) -> Result<Expression, JSONPathError> {
        match it.peek().unwrap_or(&EOQ_TOKEN).kind {
            Not => {
                let token = next(it);
                let expression = self.parse_expression(it, PRECEDENCE_PREFIX)?;
                Ok(Expression::new(
                    (token.span.0, expression.span.1),
                    ExpressionKind::Not {
                        expression: Box::new(expression),
                    },
                ))
            }
            Minus => {
                let token = next(it);
                let expression = self.parse_expression(it, PRECEDENCE_PREFIX)?;
                Ok(Expression::new(
                    (token.span.0, expression.span.1),
                    ExpressionKind::Negate {
                        expression: Box::new(expression),
                    },
                ))
            }
            _ => {
                let basic = self.parse_basic_expression(it)?;
                self.parse_postfix_expression(it, basic)
            }
        }
    }

    fn parse_postfix_expression(
        &self,
        it: &mut Tokens,
        mut expr: Expression,
    ) -> Result<Expression, JSONPathError> {
        loop {
            match it.peek().unwrap_or(&EOQ_TOKEN).kind {
                Dot => {
                    next(it); // eat dot
                    match next(it) {
                        Token {
                            kind: Name { value },
                            span,
                        } => {
                            expr = Expression::new(
                                (expr.span.0, span.1),
                                ExpressionKind::Member {
                                    object: Box::new(expr),
                                    name: value.to_string(),
                                },
                            );
                        }
                        token => {
                            return Err(JSONPathError::syntax(
                                format!("expected a member name, found {}", token.kind),
                                token.span,
                            ))
                        }
                    }
                }
                LBracket => {
                    let token = next(it);
                    let index = self.parse_expression(it, PRECEDENCE_LOWEST)?;
                    match next(it) {
                        Token {
                            kind: RBracket,
                            span,
                        } => {
                            expr = Expression::new(
                                (expr.span.0, span.1),
                                ExpressionKind::Index {
                                    object: Box::new(expr),
                                    index: Box::new(index),
                                },
                            );
                        }
                        Token { kind: Eoq, .. } => {
                            return Err(JSONPathError::syntax(
                                String::from("expected ']'"),
                                token.span,
                            ))
                        }
                        token => {
                            return Err(JSONPathError::syntax(
                                format!("expected ']', found {}", token.kind),
                                token.span,
                            ))
                        }
                    }
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_infix_expression(
        &self,
        it: &mut Tokens,
        left: Expression,
    ) -> Result<Expression, JSONPathError> {
        let token = next(it);
        let precedence = self.precedence(&token.kind);
        let right = self.parse_expression(it, precedence)?;
        let span = (left.span.0, right.span.1);
        let left = Box::new(left);
        let right = Box::new(right);

        let kind = match token.kind {
            And => ExpressionKind::Logical {
                left,
                operator: LogicalOperator::And,
                right,
            },
            Or => ExpressionKind::Logical {
                left,
                operator: LogicalOperator::Or,
                right,
            },
            Eq | Ne | StrictEq | StrictNe | Ge | Gt | Le | Lt => ExpressionKind::Comparison {
                left,
                operator: comparison_operator(&token.kind),
                right,
            },
            Plus | Minus | Star | Slash | Percent => ExpressionKind::Arithmetic {
                left,
                operator: arithmetic_operator(&token.kind),
                right,
            },
            _ => {
                return Err(JSONPathError::syntax(
                    format!("unexpected infix operator {}", token.kind),
                    token.span,
                ))
            }
        };

        Ok(Expression::new(span, kind))
    }

    fn parse_grouped_expression(&self, it: &mut Tokens) -> Result<Expression, JSONPathError> {
        let open = next(it); // eat open paren
        let expr = self.parse_expression(it, PRECEDENCE_LOWEST)?;

        match next(it) {
            Token { kind: RParen, .. } => Ok(expr),
            Token { kind: Eoq, .. } => Err(JSONPathError::syntax(
                String::from("unbalanced parentheses, expected ')'"),
                open.span,
            )),
            token => Err(JSONPathError::syntax(
                format!("expected ')', found {}", token.kind),
                token.span,
            )),
        }
    }

    fn parse_basic_expression(&self, it: &mut Tokens) -> Result<Expression, JSONPathError> {
        if let Some(Token { kind: LParen, .. }) = it.peek() {
            return self.parse_grouped_expression(it);
        }

        let token = next(it);
        let kind = match token.kind {
            Undefined => ExpressionKind::Undefined,
            Null => ExpressionKind::Null,
            True => ExpressionKind::True,
            False => ExpressionKind::False,
            Number { ref value } => {
                let value = value.parse::<f64>().map_err(|_| {
                    JSONPathError::syntax(String::from("invalid number literal"), token.span)
                })?;
                ExpressionKind::Number { value }
            }
            DoubleQuoteString { ref value } | SingleQuoteString { ref value } => {
                ExpressionKind::String {
                    value: unescape_string(value, token.span)?,
                }
            }
            Current => ExpressionKind::Current,
            Parent => ExpressionKind::Parent,
            Property => ExpressionKind::Property,
            ParentProperty => ExpressionKind::ParentProperty,
            Path => ExpressionKind::Path,
            Name { ref value } => ExpressionKind::Binding {
                name: value.to_string(),
            },
            Eoq => {
                return Err(JSONPathError::syntax(
                    String::from("unexpected end of expression"),
                    token.span,
                ))
            }
            ref kind => {
                return Err(JSONPathError::syntax(
                    format!("unexpected basic expression token {}", kind),
                    token.span,
                ))
            }
        };

        Ok(Expression::new(token.span, kind))
    }

    fn precedence(&self, kind: &TokenType) -> u8 {
        match kind {
            Or => PRECEDENCE_LOGICAL_OR,
            And => PRECEDENCE_LOGICAL_AND,
            Eq | Ne | StrictEq | StrictNe => PRECEDENCE_EQUALITY,
            Ge | Gt | Le | Lt => PRECEDENCE_RELATIONAL,
            Plus | Minus => PRECEDENCE_ADDITIVE,
            Star | Slash | Percent => PRECEDENCE_MULTIPLICATIVE,
            _ => PRECEDENCE_LOWEST,
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn next(it: &mut Tokens) -> Token {
    it.next().unwrap_or(EOQ_TOKEN)
}

fn is_infix(kind: &TokenType) -> bool {
    matches!(
        kind,
        And | Or
            | Eq
            | Ne
            | StrictEq
            | StrictNe
            | Ge
            | Gt
            | Le
            | Lt
            | Plus
            | Minus
            | Star
            | Slash
            | Percent
    )
}

fn comparison_operator(kind: &TokenType) -> ComparisonOperator {
    match kind {
        Ne => ComparisonOperator::Ne,
        StrictEq => ComparisonOperator::StrictEq,
        StrictNe => ComparisonOperator::StrictNe,
        Ge => ComparisonOperator::Ge,
        Gt => ComparisonOperator::Gt,
        Le => ComparisonOperator::Le,
        Lt => ComparisonOperator::Lt,
        _ => ComparisonOperator::Eq,
    }
}

fn arithmetic_operator(kind: &TokenType) -> ArithmeticOperator {
    match kind {
        Minus => ArithmeticOperator::Subtract,
        Star => ArithmeticOperator::Multiply,
        Slash => ArithmeticOperator::Divide,
        Percent => ArithmeticOperator::Remainder,
        _ => ArithmeticOperator::Add,
    }
}

fn unescape_string(value: &str, span: (usize, usize)) -> Result<String, JSONPathError> {
    let chars = value.chars().collect::<Vec<char>>();
    let length = chars.len();
    let mut rv = String::new();
    let mut index: usize = 0;

    while index < length {
        match chars[index] {
            '\\' => {
                if index + 1 >= length {
                    return Err(JSONPathError::syntax(String::from("invalid escape"), span));
                }

                index += 1;

                match chars[index] {
                    '"' => rv.push('"'),
                    '\'' => rv.push('\''),
                    '\\' => rv.push('\\'),
                    '/' => rv.push('/'),
                    'b' => rv.push('\x08'),
                    'f' => rv.push('\x0C'),
                    'n' => rv.push('\n'),
                    'r' => rv.push('\r'),
                    't' => rv.push('\t'),
                    'u' => {
                        // expect four hex digits
                        let digits = chars
                            .get(index + 1..index + 5)
                            .map(|d| d.iter().collect::<String>())
                            .ok_or_else(|| {
                                JSONPathError::syntax(String::from("invalid \\uXXXX escape"), span)
                            })?;

                        let codepoint = u32::from_str_radix(&digits, 16).map_err(|_| {
                            JSONPathError::syntax(String::from("invalid \\uXXXX escape"), span)
                        })?;

                        let unescaped = char::from_u32(codepoint).ok_or_else(|| {
                            JSONPathError::syntax(String::from("invalid \\uXXXX escape"), span)
                        })?;

                        rv.push(unescaped);
                        index += 4;
                    }
                    _ => {
                        return Err(JSONPathError::syntax(String::from("invalid escape"), span));
                    }
                }
            }
            c => rv.push(c),
        }

        index += 1;
    }

    Ok(rv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::lexer::lex;

    fn parse(expr: &str) -> Result<Expression, JSONPathError> {
        Parser::new().parse(lex(expr, 0)?)
    }

    #[test]
    fn member_comparison() {
        let expr = parse("@.price < 10").unwrap();
        assert_eq!(expr.to_string(), "@.price < 10");
    }

    #[test]
    fn arithmetic_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(expr.to_string(), "(1 + (2 * 3))");
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expr = parse("10 - 2 - 3").unwrap();
        assert_eq!(expr.to_string(), "((10 - 2) - 3)");
    }

    #[test]
    fn logical_binds_looser_than_comparison() {
        let expr = parse("@.a == 1 || @.b > 2 && @.c").unwrap();
        assert_eq!(expr.to_string(), "(@.a == 1 || (@.b > 2 && @.c))");
    }

    #[test]
    fn grouping() {
        let expr = parse("(1 + 2) * 3").unwrap();
        assert_eq!(expr.to_string(), "((1 + 2) * 3)");
    }

    #[test]
    fn index_access() {
        let expr = parse("@['first name']").unwrap();
        assert_eq!(expr.to_string(), "@[\"first name\"]");
    }

    #[test]
    fn prefix_operators() {
        let expr = parse("!@.isbn").unwrap();
        assert_eq!(expr.to_string(), "!@.isbn");
        let expr = parse("-@.n").unwrap();
        assert_eq!(expr.to_string(), "-@.n");
    }

    #[test]
    fn string_escapes() {
        let expr = parse(r"'it\'s'").unwrap();
        assert_eq!(
            expr.kind,
            ExpressionKind::String {
                value: String::from("it's")
            }
        );
    }

    #[test]
    fn unbalanced_parens() {
        let err = parse("(1 + 2").unwrap_err();
        assert_eq!(err.msg, "unbalanced parentheses, expected ')'");
    }

    #[test]
    fn unclosed_index() {
        let err = parse("@[0").unwrap_err();
        assert_eq!(err.msg, "expected ']'");
    }

    #[test]
    fn trailing_tokens() {
        assert!(parse("@.a @.b").is_err());
    }

    #[test]
    fn empty_expression() {
        assert!(parse("  ").is_err());
    }
}
