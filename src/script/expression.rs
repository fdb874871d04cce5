use std::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("&&"),
            LogicalOperator::Or => f.write_str("||"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Ge,
    Gt,
    Le,
    Lt,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOperator::Eq => f.write_str("=="),
            ComparisonOperator::Ne => f.write_str("!="),
            ComparisonOperator::StrictEq => f.write_str("==="),
            ComparisonOperator::StrictNe => f.write_str("!=="),
            ComparisonOperator::Ge => f.write_str(">="),
            ComparisonOperator::Gt => f.write_str(">"),
            ComparisonOperator::Le => f.write_str("<="),
            ComparisonOperator::Lt => f.write_str("<"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithmeticOperator::Add => f.write_char('+'),
            ArithmeticOperator::Subtract => f.write_char('-'),
            ArithmeticOperator::Multiply => f.write_char('*'),
            ArithmeticOperator::Divide => f.write_char('/'),
            ArithmeticOperator::Remainder => f.write_char('%'),
        }
    }
}

/// A parsed filter or dynamic-key expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub span: (usize, usize),
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Undefined,
    Null,
    True,
    False,
    Number {
        value: f64,
    },
    String {
        value: String,
    },
    Current,
    Parent,
    Property,
    ParentProperty,
    Path,
    Binding {
        name: String,
    },
    Member {
        object: Box<Expression>,
        name: String,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    Not {
        expression: Box<Expression>,
    },
    Negate {
        expression: Box<Expression>,
    },
    Arithmetic {
        left: Box<Expression>,
        operator: ArithmeticOperator,
        right: Box<Expression>,
    },
    Comparison {
        left: Box<Expression>,
        operator: ComparisonOperator,
        right: Box<Expression>,
    },
    Logical {
        left: Box<Expression>,
        operator: LogicalOperator,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn new(span: (usize, usize), kind: ExpressionKind) -> Self {
        Self { span, kind }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Undefined
                | ExpressionKind::Null
                | ExpressionKind::True
                | ExpressionKind::False
                | ExpressionKind::Number { .. }
                | ExpressionKind::String { .. }
        )
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Undefined => f.write_str("undefined"),
            ExpressionKind::Null => f.write_str("null"),
            ExpressionKind::True => f.write_str("true"),
            ExpressionKind::False => f.write_str("false"),
            ExpressionKind::Number { value } => write!(f, "{value}"),
            ExpressionKind::String { value } => write!(f, "{value:?}"),
            ExpressionKind::Current => f.write_char('@'),
            ExpressionKind::Parent => f.write_str("@parent"),
            ExpressionKind::Property => f.write_str("@property"),
            ExpressionKind::ParentProperty => f.write_str("@parentProperty"),
            ExpressionKind::Path => f.write_str("@path"),
            ExpressionKind::Binding { name } => f.write_str(name),
            ExpressionKind::Member { object, name } => write!(f, "{object}.{name}"),
            ExpressionKind::Index { object, index } => write!(f, "{object}[{index}]"),
            ExpressionKind::Not { expression } => write!(f, "!{expression}"),
            ExpressionKind::Negate { expression } => write!(f, "-{expression}"),
            ExpressionKind::Arithmetic {
                left,
                operator,
                right,
            } => write!(f, "({left} {operator} {right})"),
            ExpressionKind::Comparison {
                left,
                operator,
                right,
            } => write!(f, "{left} {operator} {right}"),
            ExpressionKind::Logical {
                left,
                operator,
                right,
            } => write!(f, "({left} {operator} {right})"),
        }
    }
}
