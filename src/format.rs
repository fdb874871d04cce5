//! Shape match records into query results.
use std::{fmt, str::FromStr};

use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    element::Element,
    errors::JSONPathError,
    path::{to_path_string, to_pointer, PathKey},
    tracer::{Match, Matched},
};

/// What each query result entry should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum ResultType {
    #[default]
    Value,
    Path,
    Pointer,
    Parent,
    ParentProperty,
    All,
}

impl FromStr for ResultType {
    type Err = JSONPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "value" => Ok(ResultType::Value),
            "path" => Ok(ResultType::Path),
            "pointer" => Ok(ResultType::Pointer),
            "parent" => Ok(ResultType::Parent),
            "parentproperty" => Ok(ResultType::ParentProperty),
            "all" => Ok(ResultType::All),
            _ => Err(JSONPathError::typ(
                format!("unknown result type '{s}'"),
                (0, 0),
            )),
        }
    }
}

impl TryFrom<String> for ResultType {
    type Error = JSONPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResultType::Value => "value",
            ResultType::Path => "path",
            ResultType::Pointer => "pointer",
            ResultType::Parent => "parent",
            ResultType::ParentProperty => "parentProperty",
            ResultType::All => "all",
        })
    }
}

/// A match with its path rendered, as returned for [`ResultType::All`] and
/// handed to per-match callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<E> {
    pub path: String,
    pub pointer: String,
    pub value: Matched<E>,
    pub parent: Option<E>,
    pub parent_property: Option<PathKey>,
}

impl<E: Clone> From<&Match<E>> for Record<E> {
    fn from(m: &Match<E>) -> Self {
        Record {
            path: to_path_string(&m.path),
            pointer: to_pointer(&m.path),
            value: m.value.clone(),
            parent: m.parent.clone(),
            parent_property: m.parent_property.clone(),
        }
    }
}

/// One entry of a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum Output<E> {
    Value(E),
    /// A key, from a `~` match or [`ResultType::ParentProperty`].
    Property(Option<PathKey>),
    Path(String),
    Pointer(String),
    Parent(Option<E>),
    All(Record<E>),
}

impl<E: Element> Output<E> {
    /// This entry as plain JSON.
    pub fn to_value(&self) -> Value {
        match self {
            Output::Value(e) => e.to_value(),
            Output::Property(key) => property_value(key.as_ref()),
            Output::Path(s) | Output::Pointer(s) => Value::String(s.to_owned()),
            Output::Parent(e) => e.as_ref().map_or(Value::Null, Element::to_value),
            Output::All(record) => json!({
                "path": record.path,
                "pointer": record.pointer,
                "value": match &record.value {
                    Matched::Value(e) => e.to_value(),
                    Matched::Property(key) => property_value(key.as_ref()),
                },
                "parent": record.parent.as_ref().map_or(Value::Null, Element::to_value),
                "parentProperty": property_value(record.parent_property.as_ref()),
            }),
        }
    }
}

fn property_value(key: Option<&PathKey>) -> Value {
    match key {
        Some(PathKey::Index(i)) => json!(i),
        Some(PathKey::Name(name)) => json!(name),
        None => Value::Null,
    }
}

/// A formatted query result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<E> {
    List(Vec<Output<E>>),
    /// A lone unwrapped match.
    Single(Output<E>),
    /// No matches, unwrapped.
    Nothing,
}

impl<E> QueryResult<E> {
    pub fn into_vec(self) -> Vec<Output<E>> {
        match self {
            QueryResult::List(outputs) => outputs,
            QueryResult::Single(output) => vec![output],
            QueryResult::Nothing => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            QueryResult::List(outputs) => outputs.is_empty(),
            QueryResult::Single(_) => false,
            QueryResult::Nothing => true,
        }
    }
}

impl<E: Element> QueryResult<E> {
    pub fn to_value(&self) -> Value {
        match self {
            QueryResult::List(outputs) => Value::Array(outputs.iter().map(Output::to_value).collect()),
            QueryResult::Single(output) => output.to_value(),
            QueryResult::Nothing => Value::Null,
        }
    }
}

/// Format a single match.
pub fn format_match<E: Element>(m: &Match<E>, result_type: ResultType) -> Output<E> {
    match result_type {
        ResultType::Value => match &m.value {
            Matched::Value(e) => Output::Value(e.clone()),
            Matched::Property(key) => Output::Property(key.clone()),
        },
        ResultType::Path => Output::Path(to_path_string(&m.path)),
        ResultType::Pointer => Output::Pointer(to_pointer(&m.path)),
        ResultType::Parent => Output::Parent(m.parent.clone()),
        ResultType::ParentProperty => Output::Property(m.parent_property.clone()),
        ResultType::All => Output::All(Record::from(m)),
    }
}

/// Format all matches and apply the wrap and flatten policy.
pub fn format_matches<E: Element>(
    matches: &[Match<E>],
    result_type: ResultType,
    wrap: bool,
    flatten: bool,
) -> QueryResult<E> {
    match matches {
        [] if wrap => QueryResult::List(Vec::new()),
        [] => QueryResult::Nothing,
        [m] if !wrap && !is_array(m) => QueryResult::Single(format_match(m, result_type)),
        _ => {
            let mut outputs = Vec::with_capacity(matches.len());
            for m in matches {
                let output = format_match(m, result_type);
                if flatten {
                    splice(output, &mut outputs);
                } else {
                    outputs.push(output);
                }
            }
            QueryResult::List(outputs)
        }
    }
}

fn is_array<E: Element>(m: &Match<E>) -> bool {
    m.node().map_or(false, |e| e.len().is_some())
}

fn splice<E: Element>(output: Output<E>, outputs: &mut Vec<Output<E>>) {
    match output {
        Output::Value(e) if e.len().is_some() => {
            outputs.extend(e.entries().into_iter().map(|(_, child)| Output::Value(child)))
        }
        Output::Parent(Some(e)) if e.len().is_some() => outputs.extend(
            e.entries()
                .into_iter()
                .map(|(_, child)| Output::Parent(Some(child))),
        ),
        output => outputs.push(output),
    }
}
