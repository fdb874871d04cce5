//! A reactive document store.
//!
//! A [`Model`] owns one document. Paths are subscribed to with a [`Handler`],
//! and every write made through a [`Shell`] is reported to the handlers
//! registered at the written location and at each of its ancestors.
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//!
//! use jsonpath_model::model::{Change, Handler, Model};
//! use serde_json::json;
//!
//! let model = Model::new();
//! model.load(json!({"user": {"name": "Ann"}})).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! let handler = Handler::new(move |change: &Change| {
//!     log.borrow_mut().push(change.path.clone());
//!     Ok(())
//! });
//!
//! model.subscribe("$.user", &handler).unwrap();
//! model.change("$.user.name", json!("Bob"), None).unwrap();
//!
//! assert_eq!(*seen.borrow(), vec!["$['user']['name']"]);
//! ```
//!
//! The store is single threaded. Handlers run synchronously, on the caller's
//! turn, and may subscribe, unsubscribe or write to the model themselves.
pub mod listener;
pub mod named;
pub mod node;
mod registry;
pub mod source;

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    rc::Rc,
};

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde_json::Value;

pub use listener::{Change, Handler, Listener, Op};
pub use node::{Node, NodeId, Shell};
pub use source::{DocumentSource, LoadRequest, Location, MemorySource};

use crate::{
    compiler::compile,
    element::Element,
    errors::ModelError,
    path::{to_path_string, PathKey},
    segment::Segment,
    tracer::{Match, Matched, Tracer},
};
use node::{child_path, Composite};
use registry::Registry;

/// A reactive document store. Clones share the same document and listeners.
#[derive(Clone, Default)]
pub struct Model {
    pub(crate) inner: Rc<ModelInner>,
}

#[derive(Default)]
pub(crate) struct ModelInner {
    root: RefCell<Option<Shell>>,
    /// The current location of every attached shell.
    paths: RefCell<HashMap<NodeId, Vec<PathKey>>>,
    registry: RefCell<Registry>,
    /// The handler that caused the write being reported, if any.
    origin: RefCell<Option<Handler>>,
    reload_due: Cell<bool>,
    loading: Cell<bool>,
    next_id: Cell<NodeId>,
}

impl ModelInner {
    pub(crate) fn path_of_id(&self, id: NodeId) -> Option<Vec<PathKey>> {
        self.paths.borrow().get(&id).cloned()
    }

    /// Build shells for `value`, children first, so every child is recorded
    /// at its final location before its container exists.
    pub(crate) fn wrap(self: &Rc<Self>, value: Value, path: Vec<PathKey>) -> Node {
        match value {
            Value::Object(map) => {
                let members = map
                    .into_iter()
                    .map(|(k, v)| {
                        let location = child_path(&path, &PathKey::Name(k.clone()));
                        (k, self.wrap(v, location))
                    })
                    .collect::<IndexMap<_, _>>();
                self.install(Composite::Object(members), path)
            }
            Value::Array(array) => {
                let elements = array
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| self.wrap(v, child_path(&path, &PathKey::Index(i))))
                    .collect();
                self.install(Composite::Array(elements), path)
            }
            scalar => Node::Value(scalar),
        }
    }

    fn install(self: &Rc<Self>, data: Composite, path: Vec<PathKey>) -> Node {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.paths.borrow_mut().insert(id, path);
        Node::Shell(Shell::new(id, Rc::downgrade(self), data))
    }

    /// Record `shell` and its subtree at a new location.
    pub(crate) fn relocate(&self, shell: &Shell, path: Vec<PathKey>) {
        for (key, child) in shell.children() {
            if let Node::Shell(child) = child {
                self.relocate(&child, child_path(&path, &key));
            }
        }
        self.paths.borrow_mut().insert(shell.id(), path);
    }

    /// Drop `shell` and its subtree from the side table. Shells that have
    /// since been attached somewhere outside `location` are left alone.
    pub(crate) fn forget(&self, shell: &Shell, location: &[PathKey]) {
        let attached_here = self
            .paths
            .borrow()
            .get(&shell.id())
            .map_or(false, |path| path.starts_with(location));

        if !attached_here {
            return;
        }

        self.paths.borrow_mut().remove(&shell.id());
        for (_, child) in shell.children() {
            if let Node::Shell(child) = child {
                self.forget(&child, location);
            }
        }
    }
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_inner(inner: Rc<ModelInner>) -> Self {
        Self { inner }
    }

    /// Replace the document.
    ///
    /// Every registered path is re-notified with [`Op::Load`] on the next
    /// [`tick`](Model::tick).
    pub fn load(&self, document: Value) -> Result<(), ModelError> {
        let Node::Shell(root) = self.inner.wrap(document, Vec::new()) else {
            return Err(ModelError::InvalidDocument(String::from(
                "the document root must be an object or an array",
            )));
        };

        let previous = self.inner.root.replace(Some(root));
        if let Some(previous) = previous {
            self.inner.forget(&previous, &[]);
        }

        debug!(
            "loaded document with {} nodes",
            self.inner.paths.borrow().len()
        );

        self.inner.reload_due.set(true);
        Ok(())
    }

    /// Run deferred work, currently the notification that follows a load.
    pub fn tick(&self) -> Result<(), ModelError> {
        if self.inner.reload_due.replace(false) {
            self.notify_load()?;
        }
        Ok(())
    }

    pub fn has_pending_work(&self) -> bool {
        self.inner.reload_due.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.root.borrow().is_some()
    }

    pub fn root(&self) -> Option<Shell> {
        self.inner.root.borrow().clone()
    }

    /// The first node matched by `path`. See [`select_all`](Model::select_all).
    pub fn select(&self, path: &str, from: Option<&str>) -> Result<Option<Node>, ModelError> {
        Ok(self.select_all(path, from)?.into_iter().next())
    }

    /// All nodes matched by `path`, relative to the first match of `from` if
    /// it resolves and to the document root otherwise.
    ///
    /// Property name matches (`~`) yield the key as a string or number.
    pub fn select_all(&self, path: &str, from: Option<&str>) -> Result<Vec<Node>, ModelError> {
        let start = match from {
            Some(from) => self.select(from, None)?,
            None => None,
        };

        let matches = match start.or_else(|| self.root().map(Node::Shell)) {
            Some(node) => self.trace(path, node)?,
            None => return Ok(Vec::new()),
        };

        Ok(matches
            .into_iter()
            .map(|m| match m.value {
                Matched::Value(node) => node,
                Matched::Property(key) => Node::Value(match key {
                    Some(PathKey::Index(i)) => Value::from(i),
                    Some(PathKey::Name(name)) => Value::String(name),
                    None => Value::Null,
                }),
            })
            .collect())
    }

    fn trace(&self, path: &str, node: Node) -> Result<Vec<Match<Node>>, ModelError> {
        let segments = compile(path)?;
        Ok(Tracer::new().trace(&segments, node, None, None)?)
    }

    /// The canonical path of the first match of `query`.
    fn resolve(&self, query: &str) -> Result<Option<String>, ModelError> {
        let matches = match self.root() {
            Some(root) => self.trace(query, Node::Shell(root))?,
            None => return Ok(None),
        };
        Ok(matches.first().map(|m| to_path_string(&m.path)))
    }

    /// The canonical path of a node, if it is an attached shell.
    pub fn path_of(&self, node: &Node) -> Option<String> {
        self.path_array_of(node).map(|path| to_path_string(&path))
    }

    pub fn path_array_of(&self, node: &Node) -> Option<Vec<PathKey>> {
        match node {
            Node::Shell(shell) if shell.belongs_to(&self.inner) => self.inner.path_of_id(shell.id()),
            _ => None,
        }
    }

    /// Listen for changes at, or below, the first location `path` resolves
    /// to. A path that doesn't resolve yet is retried on every change.
    pub fn subscribe(&self, path: &str, handler: &Handler) -> Result<(), ModelError> {
        self.inner
            .registry
            .borrow_mut()
            .remove_pending(path, handler);

        match self.resolve(path)? {
            Some(canonical) => {
                self.inner
                    .registry
                    .borrow_mut()
                    .add(canonical, path, handler.clone());
            }
            None => self
                .inner
                .registry
                .borrow_mut()
                .add_pending(path, handler.clone()),
        }
        Ok(())
    }

    pub fn unsubscribe(&self, path: &str, handler: &Handler) -> Result<(), ModelError> {
        self.inner
            .registry
            .borrow_mut()
            .remove_pending(path, handler);

        if let Some(canonical) = self.resolve(path)? {
            self.inner.registry.borrow_mut().remove(&canonical, handler);
        }
        Ok(())
    }

    /// Write `value` at an existing location.
    ///
    /// `path` must resolve, and its last segment must be a single name or
    /// index. Listeners equal to `origin` are not told about this write.
    pub fn change(
        &self,
        path: &str,
        value: impl Into<Node>,
        origin: Option<&Handler>,
    ) -> Result<(), ModelError> {
        let (container, key) = match self.locate(path) {
            Ok(target) => target,
            Err(err) => {
                warn!("{err}");
                return Err(err);
            }
        };

        let previous = self.inner.origin.replace(origin.cloned());
        let rv = container.set(key, value);
        *self.inner.origin.borrow_mut() = previous;
        rv
    }

    fn locate(&self, path: &str) -> Result<(Shell, String), ModelError> {
        let unresolved = |reason: &str| ModelError::Unresolved {
            path: path.to_owned(),
            reason: reason.to_owned(),
        };

        let segments = compile(path)?;
        let (key, parent) = match segments.split_last() {
            Some((Segment::Name(key), parent)) => (key, parent),
            _ => return Err(unresolved("path does not end with a name or index")),
        };

        let root = self.root().ok_or_else(|| unresolved("nothing loaded"))?;
        let container = Tracer::new()
            .trace(parent, Node::Shell(root), None, None)?
            .into_iter()
            .find_map(|m| match m.value {
                Matched::Value(Node::Shell(shell)) => Some(shell),
                _ => None,
            })
            .ok_or_else(|| unresolved("could not find the parent of"))?;

        if Element::get(&Node::Shell(container.clone()), key).is_none() {
            return Err(unresolved("path does not resolve"));
        }

        Ok((container, key.to_owned()))
    }

    /// Promote pending subscriptions whose query resolves now.
    fn promote_pending(&self) {
        if !self.inner.registry.borrow().has_pending() {
            return;
        }
        let pending = self.inner.registry.borrow_mut().take_pending();
        for entry in pending {
            match self.resolve(&entry.query) {
                Ok(Some(canonical)) => {
                    debug!("listener for '{}' resolved to {canonical}", entry.query);
                    self.inner
                        .registry
                        .borrow_mut()
                        .add(canonical, &entry.query, entry.handler);
                }
                _ => self
                    .inner
                    .registry
                    .borrow_mut()
                    .add_pending(&entry.query, entry.handler),
            }
        }
    }

    fn notify_load(&self) -> Result<(), ModelError> {
        self.promote_pending();

        let paths = self.inner.registry.borrow().paths();
        for path in paths {
            let new = self.select(&path, None)?;
            let change = Change {
                op: Op::Load,
                path: path.clone(),
                old: None,
                new,
            };
            self.dispatch(&path, &change)?;
        }
        Ok(())
    }

    /// Report a write at `location` to the listeners at that location and at
    /// each of its ancestors, then to listeners inside any subtree the write
    /// orphaned.
    pub(crate) fn notify(
        &self,
        op: Op,
        location: &[PathKey],
        old: Option<Node>,
        new: Option<Node>,
    ) -> Result<(), ModelError> {
        self.promote_pending();

        let changed = to_path_string(location);
        let change = Change {
            op,
            path: changed.clone(),
            old: old.clone(),
            new: new.clone(),
        };

        self.walk(location, &change)?;

        let was_composite = old.as_ref().map_or(false, Element::is_composite);
        let is_composite = new.as_ref().map_or(false, Element::is_composite);
        if op == Op::Delete || (was_composite && !is_composite) {
            if let Some(Node::Shell(orphaned)) = old {
                let mut seen = HashSet::new();
                self.cascade(&orphaned, location, &mut seen)?;
            }
        }

        Ok(())
    }

    /// Report the removal of an array element. The removal itself is walked as
    /// usual, then each of `shifted` (a listened path at or after the removed
    /// index with its value beforehand) hears what it holds now.
    pub(crate) fn notify_removal(
        &self,
        location: &[PathKey],
        old: Option<Node>,
        shifted: Vec<(String, Option<Node>)>,
    ) -> Result<(), ModelError> {
        self.promote_pending();

        let change = Change {
            op: Op::Delete,
            path: to_path_string(location),
            old,
            new: None,
        };
        self.walk(location, &change)?;

        for (path, old) in shifted {
            let new = self.select(&path, None)?;
            if new == old {
                continue;
            }
            let op = if new.is_some() { Op::Set } else { Op::Delete };
            let change = Change {
                op,
                path: path.clone(),
                old,
                new,
            };
            self.dispatch(&path, &change)?;
        }
        Ok(())
    }

    /// Listened paths at or below element `start` onwards of the array at
    /// `array`, with their current values.
    pub(crate) fn listened_from(
        &self,
        array: &[PathKey],
        start: usize,
    ) -> Result<Vec<(String, Option<Node>)>, ModelError> {
        let prefix = to_path_string(array);
        let paths = self.inner.registry.borrow().paths();
        paths
            .into_iter()
            .filter(|path| element_index(path, &prefix).map_or(false, |i| i >= start))
            .map(|path| {
                let value = self.select(&path, None)?;
                Ok((path, value))
            })
            .collect()
    }

    fn walk(&self, location: &[PathKey], change: &Change) -> Result<(), ModelError> {
        for depth in (0..=location.len()).rev() {
            self.dispatch(&to_path_string(&location[..depth]), change)?;
        }
        Ok(())
    }

    /// Tell listeners inside an orphaned subtree that their node is gone.
    /// Each path hears about it once, with its last known value.
    fn cascade(
        &self,
        shell: &Shell,
        path: &[PathKey],
        seen: &mut HashSet<String>,
    ) -> Result<(), ModelError> {
        for (key, child) in shell.children() {
            let location = child_path(path, &key);
            let canonical = to_path_string(&location);

            let listened = self.inner.registry.borrow().contains(&canonical);
            if listened && seen.insert(canonical.clone()) {
                let change = Change {
                    op: Op::Delete,
                    path: canonical.clone(),
                    old: Some(child.clone()),
                    new: None,
                };
                self.dispatch(&canonical, &change)?;
            }

            if let Node::Shell(child) = &child {
                self.cascade(child, &location, seen)?;
            }
        }
        Ok(())
    }

    fn dispatch(&self, path: &str, change: &Change) -> Result<(), ModelError> {
        let handlers = self.inner.registry.borrow().handlers(path);
        let origin = self.inner.origin.borrow().clone();

        for handler in handlers {
            if origin.as_ref() == Some(&handler) {
                continue;
            }
            trace!("{} {} -> listener at {path}", change.op, change.path);
            handler.call(change)?;
        }
        Ok(())
    }
}

/// The element index `path` passes through directly below `array`.
fn element_index(path: &str, array: &str) -> Option<usize> {
    let rest = path.strip_prefix(array)?.strip_prefix('[')?;
    let (digits, _) = rest.split_once(']')?;
    digits.parse().ok()
}
