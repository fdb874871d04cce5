//! A read-only view of a document tree.
//!
//! The tracer and the expression evaluator only ever see documents through
//! [`Element`], so the same compiled path runs against plain
//! `serde_json::Value` trees and against a live [`Model`](crate::model::Model).
use serde_json::Value;

use crate::path::PathKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

pub trait Element: Clone {
    fn kind(&self) -> ElementKind;

    /// Look up an object member, or an array element when `key` is made of
    /// digits only. Returns the key normalized to a [`PathKey`].
    fn get(&self, key: &str) -> Option<(PathKey, Self)>;

    fn index(&self, index: usize) -> Option<Self>;

    /// Own members in natural order: index order for arrays, insertion order
    /// for objects. Scalars have none.
    fn entries(&self) -> Vec<(PathKey, Self)>;

    /// The number of elements, for arrays only.
    fn len(&self) -> Option<usize>;

    fn as_f64(&self) -> Option<f64>;

    /// A detached copy of this element as plain JSON.
    fn to_value(&self) -> Value;

    /// Identity comparison. Two elements are the same if they are the same
    /// node in the same tree.
    fn is_same(&self, other: &Self) -> bool;

    fn is_composite(&self) -> bool {
        matches!(self.kind(), ElementKind::Array | ElementKind::Object)
    }
}

pub fn kind_of(value: &Value) -> ElementKind {
    match value {
        Value::Null => ElementKind::Null,
        Value::Bool(_) => ElementKind::Bool,
        Value::Number(_) => ElementKind::Number,
        Value::String(_) => ElementKind::String,
        Value::Array(_) => ElementKind::Array,
        Value::Object(_) => ElementKind::Object,
    }
}

impl<'v> Element for &'v Value {
    fn kind(&self) -> ElementKind {
        kind_of(self)
    }

    fn get(&self, key: &str) -> Option<(PathKey, Self)> {
        let value: &'v Value = *self;
        match value {
            Value::Object(map) => map.get(key).map(|v| (PathKey::Name(key.to_owned()), v)),
            Value::Array(array) => PathKey::from(key)
                .as_index()
                .and_then(|i| array.get(i).map(|v| (PathKey::Index(i), v))),
            _ => None,
        }
    }

    fn index(&self, index: usize) -> Option<Self> {
        let value: &'v Value = *self;
        match value {
            Value::Array(array) => array.get(index),
            Value::Object(map) => map.get(&index.to_string()),
            _ => None,
        }
    }

    fn entries(&self) -> Vec<(PathKey, Self)> {
        let value: &'v Value = *self;
        match value {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| (PathKey::Name(k.to_owned()), v))
                .collect(),
            Value::Array(array) => array
                .iter()
                .enumerate()
                .map(|(i, v)| (PathKey::Index(i), v))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn len(&self) -> Option<usize> {
        self.as_array().map(Vec::len)
    }

    fn as_f64(&self) -> Option<f64> {
        Value::as_f64(self)
    }

    fn to_value(&self) -> Value {
        Value::clone(self)
    }

    fn is_same(&self, other: &Self) -> bool {
        std::ptr::eq(*self, *other)
    }
}
