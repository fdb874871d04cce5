//! Compiled path segments.
use std::fmt::{self, Write};

use itertools::Itertools;

use crate::script::Expression;

/// A type predicate, `@kind()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar,
    Boolean,
    String,
    Undefined,
    Function,
    Number,
    NonFinite,
    Object,
    Array,
    Other,
    Integer,
    Null,
}

impl Kind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scalar" => Some(Kind::Scalar),
            "boolean" => Some(Kind::Boolean),
            "string" => Some(Kind::String),
            "undefined" => Some(Kind::Undefined),
            "function" => Some(Kind::Function),
            "number" => Some(Kind::Number),
            "nonFinite" => Some(Kind::NonFinite),
            "object" => Some(Kind::Object),
            "array" => Some(Kind::Array),
            "other" => Some(Kind::Other),
            "integer" => Some(Kind::Integer),
            "null" => Some(Kind::Null),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kind::Scalar => "scalar",
            Kind::Boolean => "boolean",
            Kind::String => "string",
            Kind::Undefined => "undefined",
            Kind::Function => "function",
            Kind::Number => "number",
            Kind::NonFinite => "nonFinite",
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::Other => "other",
            Kind::Integer => "integer",
            Kind::Null => "null",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}()", self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `$`, re-anchor on the current value with no parent.
    Root,
    /// A member name or array index, `.name`, `['name']` or `[0]`.
    Name(String),
    /// `*`
    Wildcard,
    /// `..`
    Descendant,
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    /// `[a,b,c]`, each alternative traced independently.
    Union(Vec<Segment>),
    /// `[?(expr)]`
    Filter {
        expression: Expression,
        source: String,
        span: (usize, usize),
    },
    /// `[(expr)]`, the expression's value is used as a key.
    Dynamic {
        expression: Expression,
        source: String,
        span: (usize, usize),
    },
    /// `^`
    Parent,
    /// `~`
    PropertyName,
    Kind(Kind),
}

impl Segment {
    /// The text of this segment as it would appear inside square brackets.
    fn bracketed(&self) -> String {
        match self {
            Segment::Root => String::from("$"),
            Segment::Name(name) => {
                if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
                    name.to_owned()
                } else {
                    format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
                }
            }
            Segment::Wildcard => String::from("*"),
            Segment::Slice { start, end, step } => {
                let mut buf = String::new();
                if let Some(start) = start {
                    let _ = write!(buf, "{start}");
                }
                buf.push(':');
                if let Some(end) = end {
                    let _ = write!(buf, "{end}");
                }
                if let Some(step) = step {
                    let _ = write!(buf, ":{step}");
                }
                buf
            }
            Segment::Union(alternatives) => alternatives.iter().map(Segment::bracketed).join(","),
            Segment::Filter { source, .. } => format!("?({source})"),
            Segment::Dynamic { source, .. } => format!("({source})"),
            Segment::Descendant => String::from(".."),
            Segment::Parent => String::from("^"),
            Segment::PropertyName => String::from("~"),
            Segment::Kind(kind) => kind.to_string(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Root => f.write_char('$'),
            Segment::Descendant => f.write_str(".."),
            Segment::Parent => f.write_char('^'),
            Segment::PropertyName => f.write_char('~'),
            Segment::Kind(kind) => write!(f, "{kind}"),
            segment => write!(f, "[{}]", segment.bracketed()),
        }
    }
}

/// Render compiled segments back to path syntax, always starting with `$`.
pub fn segments_to_string(segments: &[Segment]) -> String {
    let body = segments.iter().map(Segment::to_string).join("");
    if body.starts_with('$') {
        body
    } else {
        format!("${body}")
    }
}
