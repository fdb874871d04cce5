//! Live document nodes.
//!
//! Every object and array in a loaded document is held by a [`Shell`]. Shells
//! are shared handles: cloning one gives another view of the same node, and
//! writes through any view are reported to the owning [`Model`]. Scalars are
//! stored inline as plain [`Value`]s.
use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{listener::Op, Model, ModelInner};
use crate::{
    element::{kind_of, Element, ElementKind},
    errors::ModelError,
    path::{to_path_string, PathKey},
};

pub type NodeId = u64;

/// A member of a document tree.
///
/// Inside a model every object and array is a `Shell`. A `Node::Value`
/// holding an object or array is a detached document, it is wrapped when it is
/// attached with [`Shell::set`].
#[derive(Clone)]
pub enum Node {
    Value(Value),
    Shell(Shell),
}

impl Node {
    pub fn as_shell(&self) -> Option<&Shell> {
        match self {
            Node::Shell(shell) => Some(shell),
            Node::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(value) => Some(value),
            Node::Shell(_) => None,
        }
    }

    /// A detached copy of this node as plain JSON.
    pub fn to_value(&self) -> Value {
        match self {
            Node::Value(value) => value.clone(),
            Node::Shell(shell) => shell.to_value(),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Value(value)
    }
}

impl From<Shell> for Node {
    fn from(shell: Shell) -> Self {
        Node::Shell(shell)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Value(a), Node::Value(b)) => a == b,
            (Node::Shell(a), Node::Shell(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Value(value) => write!(f, "{value:?}"),
            Node::Shell(shell) => write!(f, "{shell:?}"),
        }
    }
}

pub(crate) enum Composite {
    Object(IndexMap<String, Node>),
    Array(Vec<Node>),
}

struct ShellInner {
    id: NodeId,
    model: Weak<ModelInner>,
    data: RefCell<Composite>,
}

/// A shared handle to an object or array inside a [`Model`].
#[derive(Clone)]
pub struct Shell {
    inner: Rc<ShellInner>,
}

impl PartialEq for Shell {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shell#{} {}", self.inner.id, self.to_value())
    }
}

impl Shell {
    pub(crate) fn new(id: NodeId, model: Weak<ModelInner>, data: Composite) -> Self {
        Self {
            inner: Rc::new(ShellInner {
                id,
                model,
                data: RefCell::new(data),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    pub fn is_array(&self) -> bool {
        matches!(&*self.inner.data.borrow(), Composite::Array(_))
    }

    pub fn len(&self) -> usize {
        match &*self.inner.data.borrow() {
            Composite::Object(members) => members.len(),
            Composite::Array(elements) => elements.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<PathKey> {
        self.children().into_iter().map(|(key, _)| key).collect()
    }

    /// The member at `key`. Array elements can be addressed with an index or
    /// with a name made of digits.
    pub fn member(&self, key: impl Into<PathKey>) -> Option<Node> {
        let key = key.into();
        match &*self.inner.data.borrow() {
            Composite::Object(members) => members.get(&key.to_name()).cloned(),
            Composite::Array(elements) => key.as_index().and_then(|i| elements.get(i).cloned()),
        }
    }

    pub fn children(&self) -> Vec<(PathKey, Node)> {
        match &*self.inner.data.borrow() {
            Composite::Object(members) => members
                .iter()
                .map(|(k, v)| (PathKey::Name(k.to_owned()), v.clone()))
                .collect(),
            Composite::Array(elements) => elements
                .iter()
                .enumerate()
                .map(|(i, v)| (PathKey::Index(i), v.clone()))
                .collect(),
        }
    }

    pub fn to_value(&self) -> Value {
        match &*self.inner.data.borrow() {
            Composite::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(k, v)| (k.to_owned(), v.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
            Composite::Array(elements) => {
                Value::Array(elements.iter().map(Node::to_value).collect())
            }
        }
    }

    /// This node's location in its model, or `None` once it has been
    /// replaced, deleted or its model has gone.
    pub fn path(&self) -> Option<Vec<PathKey>> {
        self.inner
            .model
            .upgrade()
            .and_then(|model| model.path_of_id(self.id()))
    }

    /// True if `other` is this shell or appears anywhere below it.
    pub fn contains(&self, other: &Shell) -> bool {
        self == other
            || self.children().iter().any(|(_, child)| match child {
                Node::Shell(shell) => shell.contains(other),
                Node::Value(_) => false,
            })
    }

    pub(crate) fn belongs_to(&self, model: &Rc<ModelInner>) -> bool {
        std::ptr::eq(self.inner.model.as_ptr(), Rc::as_ptr(model))
    }

    /// Assign `value` to `key` and notify the model's listeners.
    ///
    /// Setting the index one past the end of an array appends. Indices further
    /// past the end are rejected.
    pub fn set(&self, key: impl Into<PathKey>, value: impl Into<Node>) -> Result<(), ModelError> {
        let (model, path) = self.attached()?;
        let key = self.normalize(key.into())?;
        if let PathKey::Index(index) = key {
            if index > self.len() {
                return Err(ModelError::InvalidKey(index.to_string()));
            }
        }
        let location = child_path(&path, &key);
        let node = value.into();

        // A shell already in this model moves, anything else is copied in.
        let moving = matches!(&node, Node::Shell(shell)
            if shell.belongs_to(&model.inner) && model.inner.path_of_id(shell.id()).is_some());
        if let Node::Shell(shell) = &node {
            if moving && shell.contains(self) {
                return Err(ModelError::Cycle {
                    path: to_path_string(&location),
                });
            }
        }

        let old = self.member(key.clone());
        if let Some(Node::Shell(shell)) = &old {
            model.inner.forget(shell, &location);
        }

        let node = match node {
            Node::Shell(shell) if moving => {
                model.inner.relocate(&shell, location.clone());
                Node::Shell(shell)
            }
            Node::Shell(shell) => model.inner.wrap(shell.to_value(), location.clone()),
            Node::Value(value) => model.inner.wrap(value, location.clone()),
        };

        match &mut *self.inner.data.borrow_mut() {
            Composite::Object(members) => {
                members.insert(key.to_name(), node.clone());
            }
            Composite::Array(elements) => {
                match key.as_index() {
                    Some(index) if index < elements.len() => elements[index] = node.clone(),
                    _ => elements.push(node.clone()),
                }
            }
        }

        model.notify(Op::Set, &location, old, Some(node))
    }

    /// Remove `key` and notify the model's listeners. Later array elements
    /// shift down to fill the gap, and listeners on the shifted indices are
    /// told what their path holds now. Removing a missing key does nothing.
    pub fn delete(&self, key: impl Into<PathKey>) -> Result<(), ModelError> {
        let (model, path) = self.attached()?;
        let key = self.normalize(key.into())?;
        if self.member(key.clone()).is_none() {
            return Ok(());
        }
        let location = child_path(&path, &key);

        let shifted = match key {
            PathKey::Index(start) => model.listened_from(&path, start)?,
            PathKey::Name(_) => Vec::new(),
        };

        let old = match &mut *self.inner.data.borrow_mut() {
            Composite::Object(members) => members.shift_remove(&key.to_name()),
            Composite::Array(elements) => key
                .as_index()
                .filter(|i| *i < elements.len())
                .map(|i| elements.remove(i)),
        };

        if let Some(Node::Shell(shell)) = &old {
            model.inner.forget(shell, &location);
        }

        match key {
            PathKey::Index(start) => {
                for (key, child) in self.children().into_iter().skip(start) {
                    if let Node::Shell(shell) = child {
                        model.inner.relocate(&shell, child_path(&path, &key));
                    }
                }
                model.notify_removal(&location, old, shifted)
            }
            PathKey::Name(_) => model.notify(Op::Delete, &location, old, None),
        }
    }

    /// Append `value` to an array.
    pub fn push(&self, value: impl Into<Node>) -> Result<(), ModelError> {
        if !self.is_array() {
            return Err(ModelError::InvalidKey(self.len().to_string()));
        }
        self.set(self.len(), value)
    }

    fn attached(&self) -> Result<(Model, Vec<PathKey>), ModelError> {
        let inner = self.inner.model.upgrade().ok_or(ModelError::Detached)?;
        let path = inner.path_of_id(self.id()).ok_or(ModelError::Detached)?;
        Ok((Model::from_inner(inner), path))
    }

    fn normalize(&self, key: PathKey) -> Result<PathKey, ModelError> {
        if self.is_array() {
            key.as_index()
                .map(PathKey::Index)
                .ok_or_else(|| ModelError::InvalidKey(key.to_name()))
        } else {
            Ok(PathKey::Name(key.to_name()))
        }
    }
}

pub(crate) fn child_path(path: &[PathKey], key: &PathKey) -> Vec<PathKey> {
    let mut location = path.to_vec();
    location.push(key.clone());
    location
}

impl Element for Node {
    fn kind(&self) -> ElementKind {
        match self {
            Node::Value(value) => kind_of(value),
            Node::Shell(shell) if shell.is_array() => ElementKind::Array,
            Node::Shell(_) => ElementKind::Object,
        }
    }

    fn get(&self, key: &str) -> Option<(PathKey, Self)> {
        let shell = self.as_shell()?;
        if shell.is_array() {
            let index = PathKey::from(key).as_index()?;
            shell.member(index).map(|node| (PathKey::Index(index), node))
        } else {
            shell
                .member(key)
                .map(|node| (PathKey::Name(key.to_owned()), node))
        }
    }

    fn index(&self, index: usize) -> Option<Self> {
        self.as_shell().and_then(|shell| shell.member(index))
    }

    fn entries(&self) -> Vec<(PathKey, Self)> {
        self.as_shell().map(Shell::children).unwrap_or_default()
    }

    fn len(&self) -> Option<usize> {
        self.as_shell()
            .filter(|shell| shell.is_array())
            .map(Shell::len)
    }

    fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    fn to_value(&self) -> Value {
        Node::to_value(self)
    }

    fn is_same(&self, other: &Self) -> bool {
        self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detached_values_are_not_shells() {
        let node = Node::from(json!({"a": 1}));
        assert!(node.as_shell().is_none());
        assert_eq!(node.kind(), ElementKind::Object);
        assert_eq!(node.entries(), Vec::new());
    }

    #[test]
    fn shell_views() {
        let model = Model::new();
        model.load(json!({"a": [1, {"b": 2}], "c": "d"})).unwrap();
        let root = model.root().unwrap();

        assert_eq!(
            root.keys(),
            vec![PathKey::from("a"), PathKey::from("c")]
        );
        let a = root.member("a").unwrap();
        let a = a.as_shell().unwrap();
        assert!(a.is_array());
        assert_eq!(a.len(), 2);
        assert_eq!(a.member("1").unwrap().to_value(), json!({"b": 2}));
        assert_eq!(a.path(), Some(vec![PathKey::from("a")]));
        assert_eq!(Element::len(&Node::Shell(a.clone())), Some(2));
        assert_eq!(root.to_value(), json!({"a": [1, {"b": 2}], "c": "d"}));
    }

    #[test]
    fn array_keys_must_be_indices() {
        let model = Model::new();
        model.load(json!([1, 2])).unwrap();
        let root = model.root().unwrap();
        assert_eq!(
            root.set("x", json!(3)),
            Err(ModelError::InvalidKey(String::from("x")))
        );
        root.set("1", json!(3)).unwrap();
        root.set(2, json!(4)).unwrap();
        assert_eq!(root.to_value(), json!([1, 3, 4]));
    }

    #[test]
    fn array_keys_past_the_end() {
        let model = Model::new();
        model.load(json!([1])).unwrap();
        let root = model.root().unwrap();
        assert_eq!(
            root.set(3, json!(2)),
            Err(ModelError::InvalidKey(String::from("3")))
        );
        assert_eq!(
            root.set(usize::MAX, json!(2)),
            Err(ModelError::InvalidKey(usize::MAX.to_string()))
        );
        assert_eq!(root.to_value(), json!([1]));
    }

    #[test]
    fn array_delete_shifts_paths() {
        let model = Model::new();
        model.load(json!({"a": [{"x": 0}, {"x": 1}, {"x": 2}]})).unwrap();
        let a = model.select("$.a", None).unwrap().unwrap();
        let a = a.as_shell().unwrap();
        let last = a.member(2).unwrap();
        let last = last.as_shell().unwrap().clone();

        a.delete(0).unwrap();
        assert_eq!(a.to_value(), json!([{"x": 1}, {"x": 2}]));
        assert_eq!(
            last.path(),
            Some(vec![PathKey::from("a"), PathKey::Index(1)])
        );
    }

    #[test]
    fn replaced_shells_are_detached() {
        let model = Model::new();
        model.load(json!({"a": {"b": {"c": 1}}})).unwrap();
        let b = model.select("$.a.b", None).unwrap().unwrap();
        let b = b.as_shell().unwrap().clone();

        let root = model.root().unwrap();
        root.set("a", json!(null)).unwrap();
        assert_eq!(b.path(), None);
        assert_eq!(b.set("c", json!(2)), Err(ModelError::Detached));
    }

    #[test]
    fn moving_a_shell_rewrites_its_subtree() {
        let model = Model::new();
        model.load(json!({"a": {"b": {"c": 1}}, "x": {}})).unwrap();
        let b = model.select("$.a.b", None).unwrap().unwrap();
        let x = model.select("$.x", None).unwrap().unwrap();

        x.as_shell().unwrap().set("moved", b.clone()).unwrap();
        assert_eq!(
            b.as_shell().unwrap().path(),
            Some(vec![PathKey::from("x"), PathKey::from("moved")])
        );
        assert_eq!(
            model.select("$.x.moved.c", None).unwrap(),
            Some(Node::from(json!(1)))
        );
    }

    #[test]
    fn replacing_a_parent_with_its_child() {
        let model = Model::new();
        model.load(json!({"a": {"b": {"c": 1}}})).unwrap();
        let b = model.select("$.a.b", None).unwrap().unwrap();
        model.root().unwrap().set("a", b.clone()).unwrap();

        assert_eq!(
            b.as_shell().unwrap().path(),
            Some(vec![PathKey::from("a")])
        );
        assert_eq!(model.root().unwrap().to_value(), json!({"a": {"c": 1}}));
    }

    #[test]
    fn no_cycles() {
        let model = Model::new();
        model.load(json!({"a": {"b": {}}})).unwrap();
        let a = model.select("$.a", None).unwrap().unwrap();
        let b = model.select("$.a.b", None).unwrap().unwrap();
        assert_eq!(
            b.as_shell().unwrap().set("loop", a),
            Err(ModelError::Cycle {
                path: String::from("$['a']['b']['loop']")
            })
        );
    }

    #[test]
    fn shells_from_other_models_are_copied() {
        let (one, two) = (Model::new(), Model::new());
        one.load(json!({"a": {"b": 1}})).unwrap();
        two.load(json!({})).unwrap();

        let a = one.select("$.a", None).unwrap().unwrap();
        two.root().unwrap().set("copy", a.clone()).unwrap();
        let copy = two.select("$.copy", None).unwrap().unwrap();

        assert_ne!(copy, a);
        assert_eq!(copy.to_value(), json!({"b": 1}));
        assert_eq!(
            a.as_shell().unwrap().path(),
            Some(vec![PathKey::from("a")])
        );
    }
}
