//! Binding declarations.
//!
//! A UI layer ties a control to a location in a model with a short
//! declaration:
//!
//! - `{users::$.name}` reads `$.name` from the model named `users`.
//! - `[users::$.name]` does the same and also writes changes back.
//! - `$.name` reads from the default model, whose name is empty.
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{errors::JSONPathError, model::named, model::Model};

lazy_static! {
    static ref DECLARATION: Regex =
        Regex::new(r"^([\{\[])?(?:([^\{\[\}\]\.\$@#:\?\(\)]*)::)?(.*?)([\}\]])?$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The name of the model, empty for the default model.
    pub model: String,
    pub path: String,
    /// True for `[...]` declarations.
    pub two_way: bool,
}

impl Binding {
    pub fn parse(declaration: &str) -> Result<Self, JSONPathError> {
        let caps = DECLARATION
            .captures(declaration)
            .ok_or_else(|| delimiter_error(declaration, "{ or ["))?;

        let start = caps.get(1).map(|m| m.as_str());
        let end = caps.get(4).map(|m| m.as_str());

        match (start, end) {
            (None, None) | (Some("{"), Some("}")) | (Some("["), Some("]")) => (),
            (Some("{"), _) => return Err(delimiter_error(declaration, "}")),
            (Some(_), _) => return Err(delimiter_error(declaration, "]")),
            (None, Some("}")) => return Err(delimiter_error(declaration, "{")),
            (None, Some(_)) => return Err(delimiter_error(declaration, "[")),
        }

        Ok(Binding {
            model: caps
                .get(2)
                .map(|m| m.as_str().to_owned())
                .unwrap_or_default(),
            path: caps
                .get(3)
                .map(|m| m.as_str().trim().to_owned())
                .unwrap_or_default(),
            two_way: start == Some("["),
        })
    }

    /// The named model this binding reads from, created if necessary.
    pub fn model(&self) -> Model {
        named::get_or_create(&self.model)
    }
}

fn delimiter_error(declaration: &str, expected: &str) -> JSONPathError {
    JSONPathError::syntax(
        format!(
            "Path specified without the proper start or end delimiters in '{declaration}'. Expected '{expected}'."
        ),
        (0, declaration.len()),
    )
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = if self.two_way { ('[', ']') } else { ('{', '}') };
        write!(f, "{open}{}::{}{close}", self.model, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn one_way() {
        assert_eq!(
            Binding::parse("{users::$.name}"),
            Ok(Binding {
                model: String::from("users"),
                path: String::from("$.name"),
                two_way: false,
            })
        );
    }

    #[test]
    fn two_way() {
        let binding = Binding::parse("[form::$.items[0].title]").unwrap();
        assert_eq!(binding.model, "form");
        assert_eq!(binding.path, "$.items[0].title");
        assert!(binding.two_way);
        assert_eq!(binding.to_string(), "[form::$.items[0].title]");
    }

    #[test]
    fn default_model() {
        assert_eq!(
            Binding::parse("$.name"),
            Ok(Binding {
                model: String::new(),
                path: String::from("$.name"),
                two_way: false,
            })
        );
        assert_eq!(Binding::parse("{$.a}").unwrap().model, "");
    }

    #[test]
    fn missing_end() {
        let err = Binding::parse("{users::$.name").unwrap_err();
        assert_eq!(
            err.msg,
            "Path specified without the proper start or end delimiters in '{users::$.name'. Expected '}'."
        );
    }

    #[test]
    fn missing_start() {
        let err = Binding::parse("users::$.name]").unwrap_err();
        assert!(err.msg.ends_with("Expected '['."));
    }

    #[test]
    fn mismatched() {
        let err = Binding::parse("[users::$.name}").unwrap_err();
        assert!(err.msg.ends_with("Expected ']'."));
    }

    #[test]
    fn resolves_named_models() {
        let binding = Binding::parse("{binding-test::$.a}").unwrap();
        binding.model().load(json!({"a": 1})).unwrap();
        assert_eq!(
            named::get("binding-test")
                .unwrap()
                .select(&binding.path, None)
                .unwrap()
                .map(|node| node.to_value()),
            Some(json!(1))
        );
    }
}
