//! Loading a document from somewhere else.
//!
//! The store never fetches anything itself. A [`DocumentSource`] is handed a
//! [`LoadRequest`] and resolves to an already parsed document, which is then
//! loaded as if by [`Model::load`].
use std::{collections::HashMap, fmt, rc::Rc};

use futures::future::{self, FutureExt, LocalBoxFuture};
use log::debug;
use serde_json::Value;
use url::Url;

use super::{Model, ModelInner};
use crate::errors::ModelError;

/// Where to load a document from.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Absolute(Url),
    /// Anything without a scheme, resolved by the source.
    Relative(String),
}

impl Location {
    pub fn parse(location: &str) -> Result<Self, ModelError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ModelError::InvalidSource(location.to_owned()));
        }

        if location.contains("://") {
            Url::parse(location)
                .map(Location::Absolute)
                .map_err(|_| ModelError::InvalidSource(location.to_owned()))
        } else {
            Ok(Location::Relative(location.to_owned()))
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Absolute(url) => write!(f, "{url}"),
            Location::Relative(path) => f.write_str(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub location: Location,
    /// An HTTP style method name, `GET` unless the caller says otherwise.
    pub method: String,
}

pub trait DocumentSource {
    fn fetch(&self, request: LoadRequest) -> LocalBoxFuture<'_, Result<Value, ModelError>>;
}

/// A source serving documents from memory, keyed by location.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    documents: HashMap<String, Value>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: &str, document: Value) -> &mut Self {
        self.documents.insert(location.to_owned(), document);
        self
    }
}

impl DocumentSource for MemorySource {
    fn fetch(&self, request: LoadRequest) -> LocalBoxFuture<'_, Result<Value, ModelError>> {
        let rv = self
            .documents
            .get(&request.location.to_string())
            .cloned()
            .ok_or_else(|| ModelError::Load(format!("404 {} not found", request.location)));
        future::ready(rv).boxed_local()
    }
}

/// Marks a model as loading until dropped.
struct LoadGuard {
    model: Rc<ModelInner>,
}

impl LoadGuard {
    fn acquire(model: &Rc<ModelInner>) -> Result<Self, ModelError> {
        if model.loading.replace(true) {
            return Err(ModelError::Busy);
        }
        Ok(Self {
            model: model.clone(),
        })
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.model.loading.set(false);
    }
}

impl Model {
    /// Fetch a document from `source` and load it.
    ///
    /// The location is validated, and the model marked busy, before this
    /// returns. Calling again while the returned future is alive fails with
    /// [`ModelError::Busy`] and leaves the first load alone.
    pub fn load_from<'a, S>(
        &'a self,
        source: &'a S,
        location: &str,
        method: Option<&str>,
    ) -> LocalBoxFuture<'a, Result<(), ModelError>>
    where
        S: DocumentSource + ?Sized,
    {
        let request = match Location::parse(location) {
            Ok(location) => LoadRequest {
                location,
                method: method.unwrap_or("GET").to_ascii_uppercase(),
            },
            Err(err) => return future::ready(Err(err)).boxed_local(),
        };

        let guard = match LoadGuard::acquire(&self.inner) {
            Ok(guard) => guard,
            Err(err) => return future::ready(Err(err)).boxed_local(),
        };

        async move {
            debug!("{} {}", request.method, request.location);
            let document = source.fetch(request).await;
            drop(guard);
            self.load(document?)
        }
        .boxed_local()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.get()
    }
}
