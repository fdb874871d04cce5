//! Change notifications and the handlers that receive them.
use std::{fmt, rc::Rc};

use super::node::Node;
use crate::errors::ModelError;

/// The kind of mutation being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Set,
    Delete,
    /// The whole document was replaced.
    Load,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Op::Set => "set",
            Op::Delete => "delete",
            Op::Load => "load",
        })
    }
}

/// A single change notification.
///
/// `path` is always the canonical path of the location that changed, even
/// when the receiving listener is registered on one of its ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub op: Op,
    pub path: String,
    pub old: Option<Node>,
    pub new: Option<Node>,
}

pub trait Listener {
    fn on_change(&self, change: &Change) -> Result<(), ModelError>;
}

impl<F> Listener for F
where
    F: Fn(&Change) -> Result<(), ModelError>,
{
    fn on_change(&self, change: &Change) -> Result<(), ModelError> {
        self(change)
    }
}

/// A shared, comparable reference to a [`Listener`].
///
/// Handlers compare by identity. Clones of a handler are equal to each other,
/// two handlers wrapping identical closures are not.
#[derive(Clone)]
pub struct Handler(Rc<dyn Listener>);

impl Handler {
    pub fn new(f: impl Fn(&Change) -> Result<(), ModelError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn from_listener(listener: impl Listener + 'static) -> Self {
        Self(Rc::new(listener))
    }

    pub(crate) fn call(&self, change: &Change) -> Result<(), ModelError> {
        self.0.on_change(change)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", self.addr())
    }
}
