use jsonpath_model::{compile, errors::JSONPathErrorType, find, script, JSONPath, QueryOptions};
use serde_json::json;

mod errors {
    use super::*;

    #[test]
    #[should_panic(expected = "empty path expression")]
    fn empty_path() {
        compile("").unwrap();
    }

    #[test]
    #[should_panic(expected = "unexpected end of path after '.'")]
    fn trailing_dot() {
        compile("$.a.").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected ']'")]
    fn unclosed_bracketed_segment() {
        compile("$[1, 3").unwrap();
    }

    #[test]
    #[should_panic(expected = "unexpected ']'")]
    fn unopened_bracketed_segment() {
        compile("$.a]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected ')'")]
    fn mismatched_closer() {
        compile("$[?(@.a]").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected '''")]
    fn unclosed_quote() {
        compile("$['a]").unwrap();
    }

    #[test]
    #[should_panic(expected = "empty bracketed segment")]
    fn empty_brackets() {
        compile("$[]").unwrap();
    }

    #[test]
    #[should_panic(expected = "slice step must not be negative")]
    fn negative_slice_step() {
        compile("$[::-1]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unbalanced parentheses, expected ')'")]
    fn unbalanced_parens_in_expression() {
        script::parse("(@.a == 1", 0).unwrap();
    }

    #[test]
    #[should_panic(expected = "expected ')'")]
    fn unbalanced_parens_in_filter() {
        compile("$[?((@.a == 1)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "empty expression")]
    fn empty_filter() {
        compile("$[?()]").unwrap();
    }

    #[test]
    #[should_panic(expected = "assignment is not allowed, did you mean '=='?")]
    fn assignment_in_filter() {
        compile("$[?(@.a = 1)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "unknown subject reference '@nope'")]
    fn unknown_subject_reference() {
        compile("$[?(@nope)]").unwrap();
    }

    #[test]
    #[should_panic(expected = "jsonPath: x is not defined: @.a < x")]
    fn undefined_sandbox_name() {
        find("$[?(@.a < x)]", &json!([{"a": 1}])).unwrap();
    }

    #[test]
    #[should_panic(expected = "Cannot read properties of undefined (reading 'c')")]
    fn member_of_undefined() {
        find("$[?(@.b.c)]", &json!([{"a": 1}])).unwrap();
    }

    #[test]
    #[should_panic(expected = "Eval [?(expr)] prevented in JSONPath expression.")]
    fn prevented_filter() {
        let options = QueryOptions {
            prevent_dynamic_evaluation: true,
            ..QueryOptions::from("$[?(@.a)]")
        };
        let data = json!([{"a": 1}]);
        JSONPath::new(options).document(&data).evaluate().unwrap();
    }

    #[test]
    #[should_panic(expected = "Eval [(expr)] prevented in JSONPath expression.")]
    fn prevented_dynamic_key() {
        let options = QueryOptions {
            prevent_dynamic_evaluation: true,
            ..QueryOptions::from("$[(@.length - 1)]")
        };
        let data = json!([1]);
        JSONPath::new(options).document(&data).evaluate().unwrap();
    }

    #[test]
    #[should_panic(expected = "You must supply an otherTypeCallback callback option with the @other() operator.")]
    fn other_without_classifier() {
        find("$.*@other()", &json!({"a": 1})).unwrap();
    }

    #[test]
    fn error_kinds_and_spans() {
        let err = compile("$.a[?(@.b = 1)]").unwrap_err();
        assert_eq!(err.kind, JSONPathErrorType::SyntaxError);

        let err = find("$[?(@.b.c)]", &json!([{}])).unwrap_err();
        assert_eq!(err.kind, JSONPathErrorType::TypeError);

        let options = QueryOptions {
            prevent_dynamic_evaluation: true,
            ..QueryOptions::from("$.a[?(@.b)]")
        };
        let data = json!({"a": [{"b": 1}]});
        let err = JSONPath::new(options)
            .document(&data)
            .evaluate()
            .unwrap_err();
        assert_eq!(err.kind, JSONPathErrorType::EvalError);
        assert_eq!(err.span, (4, 10));
    }
}
