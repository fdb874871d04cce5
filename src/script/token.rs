use core::fmt;

pub const EOQ: char = '\0';

#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    Eoq,
    Error { msg: Box<str> },

    Current,
    Parent,
    ParentProperty,
    Path,
    Property,

    Dot,
    LBracket,
    LParen,
    Name { value: Box<str> },
    RBracket,
    RParen,

    DoubleQuoteString { value: Box<str> },
    False,
    Null,
    Number { value: Box<str> },
    SingleQuoteString { value: Box<str> },
    True,
    Undefined,

    And,
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
    Minus,
    Ne,
    Not,
    Or,
    Percent,
    Plus,
    Slash,
    Star,
    StrictEq,
    StrictNe,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Eoq => f.write_str("'end of expression'"),
            TokenType::Error { msg } => write!(f, "error: {}", *msg),
            TokenType::Current => f.write_str("'@'"),
            TokenType::Parent => f.write_str("'@parent'"),
            TokenType::ParentProperty => f.write_str("'@parentProperty'"),
            TokenType::Path => f.write_str("'@path'"),
            TokenType::Property => f.write_str("'@property'"),
            TokenType::Dot => f.write_str("'.'"),
            TokenType::LBracket => f.write_str("'['"),
            TokenType::LParen => f.write_str("'('"),
            TokenType::Name { value } => write!(f, "'{}'", *value),
            TokenType::RBracket => f.write_str("']'"),
            TokenType::RParen => f.write_str("')'"),
            TokenType::DoubleQuoteString { value } => write!(f, "'\"{}\"'", *value),
            TokenType::False => f.write_str("'false'"),
            TokenType::Null => f.write_str("'null'"),
            TokenType::Number { value } => write!(f, "{}", *value),
            TokenType::SingleQuoteString { value } => write!(f, "''{}''", *value),
            TokenType::True => f.write_str("'true'"),
            TokenType::Undefined => f.write_str("'undefined'"),
            TokenType::And => f.write_str("'&&'"),
            TokenType::Eq => f.write_str("'=='"),
            TokenType::Ge => f.write_str("'>='"),
            TokenType::Gt => f.write_str("'>'"),
            TokenType::Le => f.write_str("'<='"),
            TokenType::Lt => f.write_str("'<'"),
            TokenType::Minus => f.write_str("'-'"),
            TokenType::Ne => f.write_str("'!='"),
            TokenType::Not => f.write_str("'!'"),
            TokenType::Or => f.write_str("'||'"),
            TokenType::Percent => f.write_str("'%'"),
            TokenType::Plus => f.write_str("'+'"),
            TokenType::Slash => f.write_str("'/'"),
            TokenType::Star => f.write_str("'*'"),
            TokenType::StrictEq => f.write_str("'==='"),
            TokenType::StrictNe => f.write_str("'!=='"),
        }
    }
}

/// An expression token, as produced by the lexer. Spans are byte offsets
/// into the enclosing path expression.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenType,
    pub span: (usize, usize),
}

impl Token {
    pub fn new(kind: TokenType, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: (start, end),
        }
    }
}
