use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum JSONPathErrorType {
    SyntaxError,
    EvalError,
    TypeError,
}

/// An error compiling or evaluating a path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JSONPathError {
    pub kind: JSONPathErrorType,
    pub msg: String,
    pub span: (usize, usize),
}

impl JSONPathError {
    pub fn new(kind: JSONPathErrorType, msg: String, span: (usize, usize)) -> Self {
        Self { kind, msg, span }
    }

    pub fn syntax(msg: String, span: (usize, usize)) -> Self {
        Self {
            kind: JSONPathErrorType::SyntaxError,
            msg,
            span,
        }
    }

    pub fn eval(msg: String, span: (usize, usize)) -> Self {
        Self {
            kind: JSONPathErrorType::EvalError,
            msg,
            span,
        }
    }

    pub fn typ(msg: String, span: (usize, usize)) -> Self {
        Self {
            kind: JSONPathErrorType::TypeError,
            msg,
            span,
        }
    }
}

impl fmt::Display for JSONPathErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JSONPathErrorType::SyntaxError => f.write_str("syntax error:"),
            JSONPathErrorType::EvalError => f.write_str("eval error:"),
            JSONPathErrorType::TypeError => f.write_str("type error:"),
        }
    }
}

impl std::error::Error for JSONPathError {}

impl fmt::Display for JSONPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}..{})",
            self.kind, self.msg, self.span.0, self.span.1
        )
    }
}

/// Errors reported by a [`Model`](crate::model::Model).
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A malformed path, or a failing filter/dynamic expression.
    Path(JSONPathError),
    /// A path that does not resolve to a location that can be written.
    Unresolved { path: String, reason: String },
    /// A document whose root is not an object or array.
    InvalidDocument(String),
    /// A remote-load location that was rejected before any request was made.
    InvalidSource(String),
    /// A remote load was requested while another is still in flight.
    Busy,
    /// The document source failed to produce a document.
    Load(String),
    /// The node shell no longer belongs to the live tree.
    Detached,
    /// A node cannot be attached inside its own subtree.
    Cycle { path: String },
    /// A key that can't address a member of an array.
    InvalidKey(String),
    /// A listener failed while handling a change notification.
    Listener(String),
}

impl std::error::Error for ModelError {}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Path(err) => write!(f, "{err}"),
            ModelError::Unresolved { path, reason } => {
                write!(f, "model#change failed: {reason} '{path}'")
            }
            ModelError::InvalidDocument(msg) => write!(f, "model#load failed: {msg}"),
            ModelError::InvalidSource(location) => write!(
                f,
                "model#loadFrom failed: Please pass a valid URL, instead of {location}"
            ),
            ModelError::Busy => f.write_str(
                "model#loadFrom failed: We're already attempting to load data. Please hold.",
            ),
            ModelError::Load(msg) => write!(f, "model#loadFrom failed: {msg}"),
            ModelError::Detached => f.write_str("node is no longer attached to its model"),
            ModelError::Cycle { path } => {
                write!(f, "cannot attach a node inside its own subtree at '{path}'")
            }
            ModelError::InvalidKey(key) => write!(f, "'{key}' is not a valid array index"),
            ModelError::Listener(msg) => write!(f, "listener error: {msg}"),
        }
    }
}

impl From<JSONPathError> for ModelError {
    fn from(err: JSONPathError) -> Self {
        ModelError::Path(err)
    }
}
