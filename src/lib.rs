//! A JSONPath-style path compiler and evaluator, and a reactive document store
//! addressed with the same paths.
//!
//! ## Queries
//!
//! Compile and run a path against any `serde_json::Value` with [`find`], or
//! configure a query with [`QueryOptions`] and run it with [`JSONPath`].
//!
//! ```
//! use jsonpath_model::{find, JSONPathError};
//! use serde_json::json;
//!
//! fn main() -> Result<(), JSONPathError> {
//!     let data = json!({"a": [{"b": 1}, {"b": 2}], "c": {"b": 3}});
//!
//!     for m in find("$..b", &data)? {
//!         println!("{} {:?}", jsonpath_model::to_path_string(&m.path), m.node());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Output from the example above:
//!
//! ```text
//! $['a'][0]['b'] Some(Number(1))
//! $['a'][1]['b'] Some(Number(2))
//! $['c']['b'] Some(Number(3))
//! ```
//!
//! Beyond member names, wildcards, slices and unions, paths support
//! recursive descent (`..`), filters (`[?(@.price < 10)]`), computed keys
//! (`[(@.length - 1)]`), the parent of a match (`^`), the key of a match (`~`)
//! and type predicates (`@string()`, `@integer()`, ...).
//!
//! Compiled paths are cached, so compiling the same expression twice is cheap.
//!
//! ## Models
//!
//! A [`Model`] holds a document and tells subscribed handlers when a path
//! they're interested in changes. See the [`model`] module.
pub mod binding;
pub mod compiler;
pub mod element;
pub mod errors;
pub mod format;
pub mod jsonpath;
pub mod model;
pub mod path;
pub mod script;
pub mod segment;
pub mod tracer;

pub use binding::Binding;
pub use compiler::compile;
pub use element::Element;
pub use errors::JSONPathError;
pub use errors::JSONPathErrorType;
pub use errors::ModelError;
pub use format::Output;
pub use format::QueryResult;
pub use format::ResultType;
pub use jsonpath::find;
pub use jsonpath::find_values;
pub use jsonpath::query;
pub use jsonpath::JSONPath;
pub use jsonpath::MatchKind;
pub use jsonpath::QueryOptions;
pub use jsonpath::QueryPath;
pub use model::Model;
pub use path::to_path_string;
pub use path::to_pointer;
pub use path::PathKey;
pub use segment::Segment;
pub use tracer::Match;
