use jsonpath_model::{errors::JSONPathError, query};
use serde_json::{json, Value};

macro_rules! query_tests {
    ($($name:ident: $value:expr,)*) => {
    mod query {
        use super::*;
        $(
            #[test]
            fn $name() -> Result<(), JSONPathError> {
                let (path, data, expected): (&str, Value, Value) = $value;
                assert_eq!(query(path, &data)?.to_value(), expected);
                Ok(())
            }
        )*
        }
    }
}

query_tests! {
    root: ("$", json!({"a": 1}), json!([{"a": 1}])),
    name: ("$.a", json!({"a": 1, "b": 2}), json!([1])),
    missing_name: ("$.x", json!({"a": 1}), json!([])),
    index: ("$[1]", json!(["a", "b", "c"]), json!(["b"])),
    index_out_of_range: ("$[9]", json!(["a"]), json!([])),
    wildcard_array: ("$[*]", json!([10, 20, 30]), json!([10, 20, 30])),
    wildcard_object: ("$.*", json!({"a": 1, "b": [2]}), json!([1, [2]])),
    wildcard_scalar: ("$.a.*", json!({"a": 1}), json!([])),
    negative_slice: ("$[-2:]", json!([1, 2, 3, 4, 5]), json!([4, 5])),
    empty_slice: ("$[1:1]", json!([1, 2, 3]), json!([])),
    slice_with_step: ("$[::2]", json!([0, 1, 2, 3, 4]), json!([0, 2, 4])),
    slice_past_end: ("$[1:99]", json!([0, 1, 2]), json!([1, 2])),
    slice_of_object: ("$[0:1]", json!({"0": "a"}), json!([])),
    union_of_names: ("$['a','c']", json!({"a": 1, "b": 2, "c": 3}), json!([1, 3])),
    union_of_indices: ("$[2,0]", json!(["x", "y", "z"]), json!(["z", "x"])),
    descendant_names: ("$..a", json!({"a": 1, "b": {"a": 2}}), json!([1, 2])),
    descendant_in_arrays: ("$..id", json!([{"id": 1}, [{"id": 2}]]), json!([1, 2])),
    descendant_wildcard: ("$..*", json!({"a": {"b": 1}}), json!([{"b": 1}, 1])),
    parent: ("$.b.a^", json!({"a": 1, "b": {"a": 2}}), json!([{"a": 2}])),
    parent_of_each: ("$.items[*].id^", json!({"items": [{"id": 1}, {"id": 2}]}), json!([{"id": 1}, {"id": 2}])),
    grandparent: ("$.a.b.c^^", json!({"a": {"b": {"c": 1}}}), json!([{"b": {"c": 1}}])),
    parent_of_root: ("$^", json!({"a": 1}), json!([])),
    property_names: ("$.*~", json!({"a": 1, "b": 2}), json!(["a", "b"])),
    property_indices: ("$[*]~", json!(["x", "y"]), json!([0, 1])),
    filter_less_than: (
        "$.book[?(@.price < 10)].title",
        json!({"book": [{"title": "a", "price": 8}, {"title": "b", "price": 12}]}),
        json!(["a"])
    ),
    filter_existence: (
        "$.book[?(@.isbn)].title",
        json!({"book": [{"title": "a"}, {"title": "b", "isbn": "x"}]}),
        json!(["b"])
    ),
    filter_logical: (
        "$[?(@.a > 1 && @.a < 4)].a",
        json!([{"a": 1}, {"a": 2}, {"a": 3}, {"a": 4}]),
        json!([2, 3])
    ),
    filter_on_object_members: (
        "$[?(@property != 'b')]",
        json!({"a": 1, "b": 2, "c": 3}),
        json!([1, 3])
    ),
    filter_string_equality: (
        "$[?(@.kind === 'cat')].name",
        json!([{"kind": "cat", "name": "Tom"}, {"kind": "dog", "name": "Rex"}]),
        json!(["Tom"])
    ),
    filter_parent: (
        "$.a[?(@parent.min < @)]",
        json!({"a": {"min": 2, "x": 1, "y": 3}}),
        json!([3])
    ),
    dynamic_last_element: ("$[(@.length - 1)]", json!([1, 2, 3]), json!([3])),
    dynamic_name: ("$.a[(@.key)]", json!({"a": {"key": "b", "b": 7}}), json!([7])),
    string_predicate: ("$.*@string()", json!({"a": "x", "b": 1}), json!(["x"])),
    integer_predicate: ("$[*]@integer()", json!([1, 1.5, "2"]), json!([1])),
    number_predicate: ("$[*]@number()", json!([1, 1.5, "2"]), json!([1, 1.5])),
    null_predicate: ("$.*@null()", json!({"a": null, "b": 0}), json!([null])),
    boolean_predicate: ("$..*@boolean()", json!({"a": [true, 1], "b": false}), json!([false, true])),
    array_predicate: ("$.*@array()", json!({"a": [], "b": {}}), json!([[]])),
    object_predicate_includes_arrays: ("$.*@object()", json!({"a": [], "b": {}, "c": 1}), json!([[], {}])),
    scalar_predicate: ("$.*@scalar()", json!({"a": [], "b": "s", "c": 1}), json!(["s", 1])),
    nested_root: ("$.a.$.b", json!({"a": {"b": 1}}), json!([1])),
}

#[test]
fn canonical_paths_find_the_same_node() -> Result<(), JSONPathError> {
    let data = json!({"a": [{"b c": 1}, {"it's": [true]}], "d": {"0": null}});
    for m in jsonpath_model::find("$..*", &data)? {
        let canonical = jsonpath_model::to_path_string(&m.path);
        let again = jsonpath_model::find_values(&canonical, &data)?;
        assert_eq!(again, vec![*m.node().unwrap()], "{canonical}");
    }
    Ok(())
}
