//! Walk a document tree against compiled segments.
//!
//! Tracing is a plain recursive descent. The one subtlety is the parent
//! segment, `^`, which can't be resolved by the node that sees it: that node
//! doesn't know its own container. Instead it hands an [`Traced::Up`] marker
//! back to whichever frame descended into it, and that frame resumes tracing
//! the remaining segments against itself.
use std::collections::HashMap;

use lazy_static::lazy_static;
use serde_json::Value;

use crate::{
    element::{Element, ElementKind},
    errors::JSONPathError,
    path::PathKey,
    script::{Expression, Scope},
    segment::{Kind, Segment},
};

lazy_static! {
    static ref NO_BINDINGS: HashMap<String, Value> = HashMap::new();
}

/// A classifier for the `@other()` type predicate. It receives the value, its
/// path, its parent and its key within the parent.
pub type OtherKind<'a, E> = dyn Fn(&E, &[PathKey], Option<&E>, Option<&PathKey>) -> bool + 'a;

/// What a trace terminus produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Matched<E> {
    /// A node from the document.
    Value(E),
    /// The key of the node, requested with `~`. `None` at the root.
    Property(Option<PathKey>),
}

/// A successful trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<E> {
    pub path: Vec<PathKey>,
    pub value: Matched<E>,
    pub parent: Option<E>,
    pub parent_property: Option<PathKey>,
}

impl<E> Match<E> {
    /// The matched node. `None` for property name matches.
    pub fn node(&self) -> Option<&E> {
        match &self.value {
            Matched::Value(e) => Some(e),
            Matched::Property(_) => None,
        }
    }
}

enum Traced<'s, E> {
    Match(Match<E>),
    Up {
        path: Vec<PathKey>,
        rest: &'s [Segment],
    },
}

#[derive(Clone)]
struct Frame<E> {
    value: E,
    path: Vec<PathKey>,
    parent: Option<E>,
    parent_property: Option<PathKey>,
}

pub struct Tracer<'t, E> {
    prevent_eval: bool,
    bindings: &'t HashMap<String, Value>,
    other_kind: Option<&'t OtherKind<'t, E>>,
    on_match: Option<&'t mut dyn FnMut(&Match<E>)>,
}

impl<'t, E: Element> Tracer<'t, E> {
    pub fn new() -> Self {
        Self {
            prevent_eval: false,
            bindings: &NO_BINDINGS,
            other_kind: None,
            on_match: None,
        }
    }

    /// Make filter and dynamic segments an error.
    pub fn prevent_eval(mut self, prevent: bool) -> Self {
        self.prevent_eval = prevent;
        self
    }

    pub fn bindings(mut self, bindings: &'t HashMap<String, Value>) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn other_kind(mut self, classifier: &'t OtherKind<'t, E>) -> Self {
        self.other_kind = Some(classifier);
        self
    }

    /// Called once per match, in document order, as soon as it is found.
    pub fn on_match(mut self, callback: &'t mut dyn FnMut(&Match<E>)) -> Self {
        self.on_match = Some(callback);
        self
    }

    /// Trace `segments` starting at `root`.
    pub fn trace(
        &mut self,
        segments: &[Segment],
        root: E,
        parent: Option<E>,
        parent_property: Option<PathKey>,
    ) -> Result<Vec<Match<E>>, JSONPathError> {
        let frame = Frame {
            value: root,
            path: Vec::new(),
            parent,
            parent_property,
        };

        // Parent markers that bubble all the way up have nowhere to go.
        Ok(self
            .trace_frame(segments, frame)?
            .into_iter()
            .filter_map(|t| match t {
                Traced::Match(m) => Some(m),
                Traced::Up { .. } => None,
            })
            .collect())
    }

    fn trace_frame<'s>(
        &mut self,
        segments: &'s [Segment],
        frame: Frame<E>,
    ) -> Result<Vec<Traced<'s, E>>, JSONPathError> {
        match segments.split_first() {
            None => {
                let m = Match {
                    path: frame.path,
                    value: Matched::Value(frame.value),
                    parent: frame.parent,
                    parent_property: frame.parent_property,
                };
                Ok(vec![self.emit(m)])
            }
            Some((Segment::Parent, rest)) => {
                let mut path = frame.path;
                if path.pop().is_none() {
                    return Ok(Vec::new());
                }
                Ok(vec![Traced::Up { path, rest }])
            }
            Some((Segment::Descendant, rest)) => {
                // Children of this node first, then the same descent one level
                // deeper for every composite child.
                let mut out = self.trace_frame(rest, frame.clone())?;
                for (key, child) in frame.value.entries() {
                    if child.is_composite() {
                        self.descend(key, child, segments, &frame, &mut out)?;
                    }
                }
                Ok(out)
            }
            Some((segment, rest)) => self.step(segment, rest, &frame),
        }
    }

    fn step<'s>(
        &mut self,
        segment: &Segment,
        rest: &'s [Segment],
        frame: &Frame<E>,
    ) -> Result<Vec<Traced<'s, E>>, JSONPathError> {
        let mut out = Vec::new();

        match segment {
            Segment::Root => {
                let anchored = Frame {
                    value: frame.value.clone(),
                    path: frame.path.clone(),
                    parent: None,
                    parent_property: None,
                };
                out = self.trace_frame(rest, anchored)?;
            }
            Segment::Name(name) => {
                self.member(name, rest, frame, &mut out)?;
            }
            Segment::Wildcard => {
                for (key, child) in frame.value.entries() {
                    self.descend(key, child, rest, frame, &mut out)?;
                }
            }
            Segment::Slice { start, end, step } => {
                if let Some(len) = frame.value.len() {
                    for i in slice_indices(len, *start, *end, *step) {
                        if let Some(child) = frame.value.index(i) {
                            self.descend(PathKey::Index(i), child, rest, frame, &mut out)?;
                        }
                    }
                }
            }
            Segment::Union(alternatives) => {
                for alternative in alternatives {
                    out.extend(self.step(alternative, rest, frame)?);
                }
            }
            Segment::Filter {
                expression,
                source,
                span,
            } => {
                if self.prevent_eval {
                    return Err(JSONPathError::eval(
                        String::from("Eval [?(expr)] prevented in JSONPath expression."),
                        *span,
                    ));
                }

                for (key, child) in frame.value.entries() {
                    let mut path = frame.path.clone();
                    path.push(key.clone());
                    let scope = Scope {
                        subject: &child,
                        parent: Some(&frame.value),
                        path: &path,
                        bindings: self.bindings,
                    };

                    if evaluate(&scope, expression, source)?.is_truthy() {
                        self.descend(key, child, rest, frame, &mut out)?;
                    }
                }
            }
            Segment::Dynamic {
                expression,
                source,
                span,
            } => {
                if self.prevent_eval {
                    return Err(JSONPathError::eval(
                        String::from("Eval [(expr)] prevented in JSONPath expression."),
                        *span,
                    ));
                }

                let scope = Scope {
                    subject: &frame.value,
                    parent: frame.parent.as_ref(),
                    path: &frame.path,
                    bindings: self.bindings,
                };
                let key = evaluate(&scope, expression, source)?.to_js_string();
                self.member(&key, rest, frame, &mut out)?;
            }
            Segment::PropertyName => {
                let m = Match {
                    path: frame.path.clone(),
                    value: Matched::Property(frame.parent_property.clone()),
                    parent: frame.parent.clone(),
                    parent_property: None,
                };
                out.push(self.emit(m));
            }
            Segment::Kind(kind) => {
                if self.is_kind(*kind, frame)? {
                    let m = Match {
                        path: frame.path.clone(),
                        value: Matched::Value(frame.value.clone()),
                        parent: frame.parent.clone(),
                        parent_property: frame.parent_property.clone(),
                    };
                    out.push(self.emit(m));
                }
            }
            Segment::Descendant | Segment::Parent => {
                // Only meaningful at the front of the remaining segments, and
                // handled there. A union can't contain them.
            }
        }

        Ok(out)
    }

    fn member<'s>(
        &mut self,
        name: &str,
        rest: &'s [Segment],
        frame: &Frame<E>,
        out: &mut Vec<Traced<'s, E>>,
    ) -> Result<(), JSONPathError> {
        if let Some((key, child)) = frame.value.get(name) {
            self.descend(key, child, rest, frame, out)?;
        }
        Ok(())
    }

    /// Trace `rest` from `child`, then resume any parent markers it hands
    /// back against `frame`, which is the child's container.
    fn descend<'s>(
        &mut self,
        key: PathKey,
        child: E,
        rest: &'s [Segment],
        frame: &Frame<E>,
        out: &mut Vec<Traced<'s, E>>,
    ) -> Result<(), JSONPathError> {
        let mut path = frame.path.clone();
        path.push(key.clone());

        let child_frame = Frame {
            value: child,
            path,
            parent: Some(frame.value.clone()),
            parent_property: Some(key),
        };

        for traced in self.trace_frame(rest, child_frame)? {
            match traced {
                Traced::Match(_) => out.push(traced),
                Traced::Up { path, rest } => {
                    let resumed = Frame {
                        value: frame.value.clone(),
                        path,
                        parent: frame.parent.clone(),
                        parent_property: frame.parent_property.clone(),
                    };
                    out.extend(self.trace_frame(rest, resumed)?);
                }
            }
        }

        Ok(())
    }

    fn is_kind(&self, kind: Kind, frame: &Frame<E>) -> Result<bool, JSONPathError> {
        let value = &frame.value;
        let finite = || value.as_f64().map(f64::is_finite);

        Ok(match kind {
            Kind::Scalar => !value.is_composite(),
            Kind::Boolean => value.kind() == ElementKind::Bool,
            Kind::String => value.kind() == ElementKind::String,
            Kind::Number => value.kind() == ElementKind::Number && finite() == Some(true),
            Kind::NonFinite => value.kind() == ElementKind::Number && finite() == Some(false),
            Kind::Integer => {
                value.kind() == ElementKind::Number
                    && value
                        .as_f64()
                        .map_or(false, |n| n.is_finite() && n.fract() == 0.0)
            }
            Kind::Null => value.kind() == ElementKind::Null,
            // Arrays are objects too.
            Kind::Object => value.is_composite(),
            Kind::Array => value.kind() == ElementKind::Array,
            // Tree nodes are never functions or undefined.
            Kind::Undefined | Kind::Function => false,
            Kind::Other => match self.other_kind {
                Some(classifier) => classifier(
                    value,
                    &frame.path,
                    frame.parent.as_ref(),
                    frame.parent_property.as_ref(),
                ),
                None => {
                    return Err(JSONPathError::typ(
                        String::from("You must supply an otherTypeCallback callback option with the @other() operator."),
                        (0, 0),
                    ))
                }
            },
        })
    }

    fn emit<'s>(&mut self, m: Match<E>) -> Traced<'s, E> {
        if let Some(callback) = self.on_match.as_mut() {
            callback(&m);
        }
        Traced::Match(m)
    }
}

impl<'t, E: Element> Default for Tracer<'t, E> {
    fn default() -> Self {
        Self::new()
    }
}

fn evaluate<E: Element>(
    scope: &Scope<'_, E>,
    expression: &Expression,
    source: &str,
) -> Result<crate::script::Operand<E>, JSONPathError> {
    scope.evaluate(expression).map_err(|err| JSONPathError {
        kind: err.kind,
        msg: format!("jsonPath: {}: {}", err.msg, source),
        span: err.span,
    })
}

/// Indices selected by a slice over a sequence of `len` elements. Negative
/// bounds count from the end, and all bounds are clamped to `0..=len`.
pub fn slice_indices(
    len: usize,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> impl Iterator<Item = usize> {
    let len = len as i64;
    let clamp = |i: i64| {
        if i < 0 {
            (i + len).max(0)
        } else {
            i.min(len)
        }
    };

    let start = clamp(start.unwrap_or(0)) as usize;
    let end = clamp(end.unwrap_or(len)) as usize;
    let step = match step {
        Some(s) if s > 0 => s as usize,
        _ => 1,
    };

    (start..end.max(start)).step_by(step)
}
