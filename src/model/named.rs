//! Models shared by name.
//!
//! Binding declarations refer to models by name (`{users::$.name}`). This is
//! the registry those names resolve against. Models are single threaded, so
//! each thread has its own set.
use std::{cell::RefCell, collections::HashMap};

use super::Model;

thread_local! {
    static MODELS: RefCell<HashMap<String, Model>> = RefCell::new(HashMap::new());
}

/// The model called `name`, created empty if it doesn't exist yet.
pub fn get_or_create(name: &str) -> Model {
    MODELS.with(|models| {
        models
            .borrow_mut()
            .entry(name.to_owned())
            .or_default()
            .clone()
    })
}

pub fn get(name: &str) -> Option<Model> {
    MODELS.with(|models| models.borrow().get(name).cloned())
}

pub fn remove(name: &str) -> Option<Model> {
    MODELS.with(|models| models.borrow_mut().remove(name))
}

pub fn names() -> Vec<String> {
    MODELS.with(|models| {
        let mut names = models.borrow().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    })
}

pub fn clear() {
    MODELS.with(|models| models.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shared_by_name() {
        clear();
        let users = get_or_create("users");
        users.load(json!({"name": "Ann"})).unwrap();

        let again = get("users").unwrap();
        assert_eq!(
            again.select("$.name", None).unwrap().unwrap().to_value(),
            json!("Ann")
        );
        assert!(get("nope").is_none());

        get_or_create("accounts");
        assert_eq!(names(), vec!["accounts", "users"]);

        assert!(remove("users").is_some());
        assert!(get("users").is_none());
        clear();
        assert!(names().is_empty());
    }
}
