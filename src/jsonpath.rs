//! The query entry point.
//!
//! A query is configured with [`QueryOptions`], the serializable part of the
//! configuration, plus a document and optional callbacks set on [`JSONPath`].
//!
//! ```
//! use jsonpath_model::{JSONPath, QueryOptions, ResultType};
//! use serde_json::json;
//!
//! let data = json!({"store": {"book": [{"price": 8.95}, {"price": 12.99}]}});
//! let options = QueryOptions {
//!     result_type: ResultType::Path,
//!     ..QueryOptions::from("$..book[?(@.price < 10)]")
//! };
//! let result = JSONPath::new(options).document(&data).run().unwrap().unwrap();
//! assert_eq!(result.to_value(), json!(["$['store']['book'][0]"]));
//! ```
use std::{collections::HashMap, fmt};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    compiler::compile,
    element::Element,
    errors::JSONPathError,
    format::{format_match, format_matches, Output, QueryResult, Record, ResultType},
    path::{to_path_string, PathKey},
    tracer::{Match, Matched, OtherKind, Tracer},
};

/// A path, either as an expression or as an array of keys below the root.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QueryPath {
    Expression(String),
    Keys(Vec<PathKey>),
}

impl QueryPath {
    pub fn to_expression(&self) -> String {
        match self {
            QueryPath::Expression(expr) => expr.to_owned(),
            QueryPath::Keys(keys) => match keys.split_first() {
                Some((PathKey::Name(root), rest)) if root == "$" => to_path_string(rest),
                _ => to_path_string(keys),
            },
        }
    }
}

impl From<&str> for QueryPath {
    fn from(expr: &str) -> Self {
        QueryPath::Expression(expr.to_owned())
    }
}

impl From<String> for QueryPath {
    fn from(expr: String) -> Self {
        QueryPath::Expression(expr)
    }
}

impl From<Vec<PathKey>> for QueryPath {
    fn from(keys: Vec<PathKey>) -> Self {
        QueryPath::Keys(keys)
    }
}

impl From<&[PathKey]> for QueryPath {
    fn from(keys: &[PathKey]) -> Self {
        QueryPath::Keys(keys.to_vec())
    }
}

/// Query configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryOptions {
    pub path: Option<QueryPath>,
    pub result_type: ResultType,
    /// Splice array results into the result list.
    pub flatten: bool,
    /// Always return a list, even for zero or one matches.
    pub wrap: bool,
    /// Make filter and dynamic segments an error.
    #[serde(alias = "preventEval")]
    pub prevent_dynamic_evaluation: bool,
    /// Evaluate as soon as [`JSONPath::run`] is called. When false, `run`
    /// does nothing and [`JSONPath::evaluate`] must be called explicitly.
    #[serde(alias = "autostart")]
    pub auto_run: bool,
    /// Names visible to filter and dynamic expressions.
    pub sandbox: HashMap<String, Value>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            path: None,
            result_type: ResultType::Value,
            flatten: false,
            wrap: true,
            prevent_dynamic_evaluation: false,
            auto_run: true,
            sandbox: HashMap::new(),
        }
    }
}

impl From<&str> for QueryOptions {
    fn from(expr: &str) -> Self {
        Self {
            path: Some(QueryPath::from(expr)),
            ..Default::default()
        }
    }
}

/// Whether a per-match callback is seeing a node or a property name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Value,
    Property,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Value => f.write_str("value"),
            MatchKind::Property => f.write_str("property"),
        }
    }
}

type Callback<'c, E> = dyn FnMut(&Output<E>, MatchKind, &Record<E>) + 'c;

pub struct JSONPath<'c, E> {
    options: QueryOptions,
    document: Option<E>,
    parent: Option<E>,
    parent_property: Option<PathKey>,
    callback: Option<Box<Callback<'c, E>>>,
    other_kind: Option<Box<OtherKind<'c, E>>>,
}

impl<'c, E: Element> JSONPath<'c, E> {
    pub fn new(options: QueryOptions) -> Self {
        Self {
            options,
            document: None,
            parent: None,
            parent_property: None,
            callback: None,
            other_kind: None,
        }
    }

    /// A query with default options.
    pub fn query(path: impl Into<QueryPath>) -> Self {
        Self::new(QueryOptions {
            path: Some(path.into()),
            ..Default::default()
        })
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn document(mut self, document: E) -> Self {
        self.document = Some(document);
        self
    }

    /// The container of the document, reported as the parent of matches at
    /// the document root.
    pub fn parent(mut self, parent: E) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The key of the document within its parent.
    pub fn parent_property(mut self, key: impl Into<PathKey>) -> Self {
        self.parent_property = Some(key.into());
        self
    }

    /// Called with each formatted match as soon as it is found.
    pub fn callback(mut self, callback: impl FnMut(&Output<E>, MatchKind, &Record<E>) + 'c) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// The classifier for `@other()`.
    pub fn other_kind(
        mut self,
        classifier: impl Fn(&E, &[PathKey], Option<&E>, Option<&PathKey>) -> bool + 'c,
    ) -> Self {
        self.other_kind = Some(Box::new(classifier));
        self
    }

    /// Evaluate the query if it is set to run automatically, otherwise do
    /// nothing and return `None`.
    pub fn run(&mut self) -> Result<Option<QueryResult<E>>, JSONPathError> {
        if self.options.auto_run {
            self.evaluate().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Evaluate the query with the stored path and document. Returns
    /// [`QueryResult::Nothing`] when either is missing.
    pub fn evaluate(&mut self) -> Result<QueryResult<E>, JSONPathError> {
        let (path, document) = match (&self.options.path, &self.document) {
            (Some(path), Some(document)) => (path.to_expression(), document.clone()),
            _ => return Ok(QueryResult::Nothing),
        };

        let segments = compile(&path)?;
        let result_type = self.options.result_type;
        let callback = &mut self.callback;
        let mut on_match = |m: &Match<E>| {
            if let Some(callback) = callback.as_mut() {
                let kind = match m.value {
                    Matched::Value(_) => MatchKind::Value,
                    Matched::Property(_) => MatchKind::Property,
                };
                callback(&format_match(m, result_type), kind, &Record::from(m));
            }
        };

        let mut tracer = Tracer::new()
            .prevent_eval(self.options.prevent_dynamic_evaluation)
            .bindings(&self.options.sandbox)
            .on_match(&mut on_match);

        if let Some(classifier) = self.other_kind.as_deref() {
            tracer = tracer.other_kind(classifier);
        }

        let matches = tracer.trace(
            &segments,
            document,
            self.parent.clone(),
            self.parent_property.clone(),
        )?;

        Ok(format_matches(
            &matches,
            result_type,
            self.options.wrap,
            self.options.flatten,
        ))
    }

    /// Replace the stored path and document, then evaluate.
    pub fn evaluate_with(
        &mut self,
        path: impl Into<QueryPath>,
        document: E,
    ) -> Result<QueryResult<E>, JSONPathError> {
        self.options.path = Some(path.into());
        self.document = Some(document);
        self.evaluate()
    }
}

/// Evaluate `expr` against `document` with default options.
pub fn query<E: Element>(expr: &str, document: E) -> Result<QueryResult<E>, JSONPathError> {
    JSONPath::query(expr).document(document).evaluate()
}

/// All matches of `expr` in `value`.
pub fn find<'v>(expr: &str, value: &'v Value) -> Result<Vec<Match<&'v Value>>, JSONPathError> {
    let segments = compile(expr)?;
    Tracer::new().trace(&segments, value, None, None)
}

/// The nodes matched by `expr` in `value`. Property name matches are skipped.
pub fn find_values<'v>(expr: &str, value: &'v Value) -> Result<Vec<&'v Value>, JSONPathError> {
    Ok(find(expr, value)?
        .into_iter()
        .filter_map(|m| match m.value {
            Matched::Value(v) => Some(v),
            Matched::Property(_) => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_from_json() {
        let options: QueryOptions = serde_json::from_value(json!({
            "path": "$.a",
            "resultType": "PATH",
            "wrap": false,
            "preventEval": true,
            "autostart": false,
            "sandbox": {"limit": 3},
        }))
        .unwrap();

        assert_eq!(options.path, Some(QueryPath::from("$.a")));
        assert_eq!(options.result_type, ResultType::Path);
        assert!(!options.wrap);
        assert!(!options.flatten);
        assert!(options.prevent_dynamic_evaluation);
        assert!(!options.auto_run);
        assert_eq!(options.sandbox.get("limit"), Some(&json!(3)));
    }

    #[test]
    fn unknown_result_type_is_rejected() {
        let options = serde_json::from_value::<QueryOptions>(json!({"resultType": "nodes"}));
        assert!(options.is_err());
    }

    #[test]
    fn path_arrays() {
        let options: QueryOptions =
            serde_json::from_value(json!({"path": ["$", "store", "book", 0]})).unwrap();
        let path = options.path.unwrap();
        assert_eq!(path.to_expression(), "$['store']['book'][0]");
        assert_eq!(
            QueryPath::from(vec![PathKey::from("a"), PathKey::Index(1)]).to_expression(),
            "$['a'][1]"
        );
    }

    #[test]
    fn auto_run_off() {
        let data = json!({"a": 1});
        let other = json!({"b": 2});
        let mut query = JSONPath::new(QueryOptions {
            auto_run: false,
            ..QueryOptions::from("$.a")
        })
        .document(&data);

        assert_eq!(query.run().unwrap(), None);
        assert_eq!(query.evaluate().unwrap().to_value(), json!([1]));

        assert_eq!(
            query.evaluate_with("$.b", &other).unwrap().to_value(),
            json!([2])
        );
    }

    #[test]
    fn missing_document() {
        let mut query: JSONPath<&Value> = JSONPath::query("$.a");
        assert_eq!(query.evaluate().unwrap(), QueryResult::Nothing);
    }

    #[test]
    fn callbacks_see_each_match() {
        let data = json!({"a": {"x": 1}, "b": {"x": 2}});
        let mut seen = Vec::new();
        JSONPath::query("$.*.x~")
            .document(&data)
            .callback(|output, kind, record| {
                seen.push((output.to_value(), kind.to_string(), record.path.clone()))
            })
            .run()
            .unwrap();

        assert_eq!(
            seen,
            vec![
                (json!("x"), String::from("property"), String::from("$['a']['x']")),
                (json!("x"), String::from("property"), String::from("$['b']['x']")),
            ]
        );
    }

    #[test]
    fn sandbox_bindings() {
        let data = json!([1, 5, 10]);
        let options = QueryOptions {
            sandbox: HashMap::from([(String::from("min"), json!(4))]),
            ..QueryOptions::from("$[?(@ > min)]")
        };
        let result = JSONPath::new(options).document(&data).evaluate().unwrap();
        assert_eq!(result.to_value(), json!([5, 10]));
    }

    #[test]
    fn parent_options_seed_the_root() {
        let outer = json!({"inner": {"a": 1}});
        let inner = &outer["inner"];
        let options = QueryOptions {
            result_type: ResultType::ParentProperty,
            ..QueryOptions::from("$.a^")
        };
        let result = JSONPath::new(options)
            .document(inner)
            .parent(&outer)
            .parent_property("inner")
            .evaluate()
            .unwrap();
        assert_eq!(result.to_value(), json!(["inner"]));
    }

    #[test]
    fn find_helpers() {
        let data = json!({"a": 1, "b": {"a": 2}});
        assert_eq!(find_values("$..a", &data).unwrap(), vec![&json!(1), &json!(2)]);
        assert_eq!(find("$..a", &data).unwrap().len(), 2);
    }
}
