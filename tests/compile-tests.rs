use jsonpath_model::{compile, errors::JSONPathError, segment::segments_to_string};

macro_rules! compile_tests {
    ($($name:ident: $value:expr,)*) => {
    mod compile {
        use super::*;
        $(
            #[test]
            fn $name() -> Result<(), JSONPathError> {
                let (input, expected) = $value;
                let segments = compile(input)?;
                assert_eq!(segments_to_string(&segments), expected);
                Ok(())
            }
        )*
        }
    }
}

compile_tests! {
    just_root: ("$", "$"),
    shorthand_name: ("$.foo", "$['foo']"),
    implicit_root: ("foo.bar", "$['foo']['bar']"),
    bracketed_name_single_quotes: ("$['foo']", "$['foo']"),
    bracketed_name_double_quotes: ("$[\"foo\"]", "$['foo']"),
    bracketed_name_with_space: ("$['foo bar']", "$['foo bar']"),
    bracketed_index: ("$[1]", "$[1]"),
    dotted_index: ("$.1", "$[1]"),
    slice: ("$[1:-1]", "$[1:-1]"),
    slice_with_step: ("$[1:-1:2]", "$[1:-1:2]"),
    slice_with_empty_start: ("$[:-1]", "$[:-1]"),
    slice_with_empty_stop: ("$[1:]", "$[1:]"),
    shorthand_wild: ("$.*", "$[*]"),
    bracketed_wild: ("$[*]", "$[*]"),
    union: ("$[1,2]", "$[1,2]"),
    union_of_names: ("$['some', \"thing\"]", "$['some','thing']"),
    union_with_slice: ("$[0,2:]", "$[0,2:]"),
    recursive_name: ("$..foo", "$..['foo']"),
    recursive_wild: ("$..*", "$..[*]"),
    triple_dot: ("$...foo", "$..['foo']"),
    filter: ("$.some[?(@.thing == 7)]", "$['some'][?(@.thing == 7)]"),
    dynamic: ("$[(@.length - 1)]", "$[(@.length - 1)]"),
    parent: ("$.a.b^", "$['a']['b']^"),
    property_name: ("$.*~", "$[*]~"),
    type_predicate: ("$..*@string()", "$..[*]@string()"),
    name_then_type_predicate: ("$.a@number()", "$['a']@number()"),
    nested_root: ("$.a.$.b", "$['a']$['b']"),
}
