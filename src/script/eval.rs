use std::{cmp::Ordering, collections::HashMap};

use serde_json::{Map, Value};

use crate::{
    element::{Element, ElementKind},
    errors::JSONPathError,
    path::{to_path_string, PathKey},
    script::expression::{
        ArithmeticOperator, ComparisonOperator, Expression, ExpressionKind, LogicalOperator,
    },
};

/// A value produced while evaluating an expression that is not a node of the
/// document being queried.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

impl From<&Value> for ScriptValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => ScriptValue::Null,
            Value::Bool(b) => ScriptValue::Bool(*b),
            Value::Number(n) => ScriptValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => ScriptValue::String(s.to_owned()),
            Value::Array(a) => ScriptValue::Array(a.clone()),
            Value::Object(o) => ScriptValue::Object(o.clone()),
        }
    }
}

impl ScriptValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptValue::Undefined | ScriptValue::Null => false,
            ScriptValue::Bool(b) => *b,
            ScriptValue::Number(n) => !(n.is_nan() || *n == 0.0),
            ScriptValue::String(s) => !s.is_empty(),
            ScriptValue::Array(_) | ScriptValue::Object(_) => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            ScriptValue::Undefined => f64::NAN,
            ScriptValue::Null => 0.0,
            ScriptValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            ScriptValue::Number(n) => *n,
            ScriptValue::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            ScriptValue::Array(a) if a.is_empty() => 0.0,
            ScriptValue::Array(_) | ScriptValue::Object(_) => f64::NAN,
        }
    }

    /// String conversion with JavaScript rules, as used for `+` concatenation
    /// and for dynamic keys.
    pub fn to_js_string(&self) -> String {
        match self {
            ScriptValue::Undefined => String::from("undefined"),
            ScriptValue::Null => String::from("null"),
            ScriptValue::Bool(b) => b.to_string(),
            ScriptValue::Number(n) => number_to_string(*n),
            ScriptValue::String(s) => s.to_owned(),
            ScriptValue::Array(a) => a
                .iter()
                .map(|v| match v {
                    Value::Null => String::new(),
                    v => ScriptValue::from(v).to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            ScriptValue::Object(_) => String::from("[object Object]"),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "null",
            _ => "value",
        }
    }
}

fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        String::from("NaN")
    } else if n.is_infinite() {
        if n > 0.0 {
            String::from("Infinity")
        } else {
            String::from("-Infinity")
        }
    } else if n == 0.0 {
        String::from("0")
    } else {
        n.to_string()
    }
}

/// The result of evaluating a (sub) expression. Document nodes stay nodes so
/// member access can keep navigating without copying subtrees.
#[derive(Debug, Clone)]
pub enum Operand<E> {
    Element(E),
    Value(ScriptValue),
}

impl<E: Element> Operand<E> {
    /// Scalars from the document become plain values, composites stay nodes.
    fn normalize(self) -> Self {
        match self {
            Operand::Element(e) if !e.is_composite() => {
                Operand::Value(ScriptValue::from(&e.to_value()))
            }
            op => op,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Operand::Element(e) => match e.kind() {
                ElementKind::Array | ElementKind::Object => true,
                _ => ScriptValue::from(&e.to_value()).is_truthy(),
            },
            Operand::Value(v) => v.is_truthy(),
        }
    }

    pub fn to_script_value(&self) -> ScriptValue {
        match self {
            Operand::Element(e) => ScriptValue::from(&e.to_value()),
            Operand::Value(v) => v.clone(),
        }
    }

    pub fn to_js_string(&self) -> String {
        self.to_script_value().to_js_string()
    }

    fn to_number(&self) -> f64 {
        self.to_script_value().to_number()
    }
}

/// What an expression can see: the subject node, its parent, its location
/// and the caller's sandbox bindings. Nothing else is reachable.
pub struct Scope<'a, E> {
    pub subject: &'a E,
    pub parent: Option<&'a E>,
    pub path: &'a [PathKey],
    pub bindings: &'a HashMap<String, Value>,
}

impl<'a, E: Element> Scope<'a, E> {
    pub fn evaluate(&self, expr: &Expression) -> Result<Operand<E>, JSONPathError> {
        match &expr.kind {
            ExpressionKind::Undefined => Ok(Operand::Value(ScriptValue::Undefined)),
            ExpressionKind::Null => Ok(Operand::Value(ScriptValue::Null)),
            ExpressionKind::True => Ok(Operand::Value(ScriptValue::Bool(true))),
            ExpressionKind::False => Ok(Operand::Value(ScriptValue::Bool(false))),
            ExpressionKind::Number { value } => Ok(Operand::Value(ScriptValue::Number(*value))),
            ExpressionKind::String { value } => {
                Ok(Operand::Value(ScriptValue::String(value.to_owned())))
            }
            ExpressionKind::Current => Ok(Operand::Element(self.subject.clone())),
            ExpressionKind::Parent => Ok(match self.parent {
                Some(parent) => Operand::Element(parent.clone()),
                None => Operand::Value(ScriptValue::Null),
            }),
            ExpressionKind::Property => Ok(Operand::Value(key_value(self.path.last()))),
            ExpressionKind::ParentProperty => Ok(Operand::Value(key_value(
                self.path.len().checked_sub(2).and_then(|i| self.path.get(i)),
            ))),
            ExpressionKind::Path => Ok(Operand::Value(ScriptValue::String(to_path_string(
                self.path,
            )))),
            ExpressionKind::Binding { name } => match self.bindings.get(name) {
                Some(value) => Ok(Operand::Value(ScriptValue::from(value))),
                None => Err(JSONPathError::eval(
                    format!("{name} is not defined"),
                    expr.span,
                )),
            },
            ExpressionKind::Member { object, name } => {
                let object = self.evaluate(object)?;
                member(object, name, expr.span)
            }
            ExpressionKind::Index { object, index } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                member(object, &index.to_js_string(), expr.span)
            }
            ExpressionKind::Not { expression } => Ok(Operand::Value(ScriptValue::Bool(
                !self.evaluate(expression)?.is_truthy(),
            ))),
            ExpressionKind::Negate { expression } => Ok(Operand::Value(ScriptValue::Number(
                -self.evaluate(expression)?.to_number(),
            ))),
            ExpressionKind::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                match (operator, left.is_truthy()) {
                    (LogicalOperator::And, false) | (LogicalOperator::Or, true) => Ok(left),
                    _ => self.evaluate(right),
                }
            }
            ExpressionKind::Comparison {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?.normalize();
                let right = self.evaluate(right)?.normalize();
                Ok(Operand::Value(ScriptValue::Bool(compare(
                    &left, *operator, &right,
                ))))
            }
            ExpressionKind::Arithmetic {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(Operand::Value(arithmetic(&left, *operator, &right)))
            }
        }
    }
}

fn key_value(key: Option<&PathKey>) -> ScriptValue {
    match key {
        Some(PathKey::Index(i)) => ScriptValue::Number(*i as f64),
        Some(PathKey::Name(name)) => ScriptValue::String(name.to_owned()),
        None => ScriptValue::Null,
    }
}

fn member<E: Element>(
    object: Operand<E>,
    name: &str,
    span: (usize, usize),
) -> Result<Operand<E>, JSONPathError> {
    match object {
        Operand::Element(e) => match e.kind() {
            ElementKind::Array | ElementKind::Object => {
                if name == "length" && e.kind() == ElementKind::Array {
                    return Ok(Operand::Value(ScriptValue::Number(
                        e.len().unwrap_or_default() as f64,
                    )));
                }
                Ok(match e.get(name) {
                    Some((_, child)) => Operand::Element(child),
                    None => Operand::Value(ScriptValue::Undefined),
                })
            }
            _ => member(Operand::Value(ScriptValue::from(&e.to_value())), name, span),
        },
        Operand::Value(value) => match value {
            ScriptValue::Undefined | ScriptValue::Null => Err(JSONPathError::typ(
                format!(
                    "Cannot read properties of {} (reading '{}')",
                    value.type_name(),
                    name
                ),
                span,
            )),
            ScriptValue::String(s) => Ok(Operand::Value(if name == "length" {
                ScriptValue::Number(s.encode_utf16().count() as f64)
            } else {
                PathKey::from(name)
                    .as_index()
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| ScriptValue::String(c.to_string()))
                    .unwrap_or(ScriptValue::Undefined)
            })),
            ScriptValue::Array(a) => Ok(Operand::Value(if name == "length" {
                ScriptValue::Number(a.len() as f64)
            } else {
                PathKey::from(name)
                    .as_index()
                    .and_then(|i| a.get(i))
                    .map(ScriptValue::from)
                    .unwrap_or(ScriptValue::Undefined)
            })),
            ScriptValue::Object(o) => Ok(Operand::Value(
                o.get(name)
                    .map(ScriptValue::from)
                    .unwrap_or(ScriptValue::Undefined),
            )),
            _ => Ok(Operand::Value(ScriptValue::Undefined)),
        },
    }
}

fn compare<E: Element>(left: &Operand<E>, operator: ComparisonOperator, right: &Operand<E>) -> bool {
    match operator {
        ComparisonOperator::StrictEq => strict_equals(left, right),
        ComparisonOperator::StrictNe => !strict_equals(left, right),
        ComparisonOperator::Eq => loose_equals(left, right),
        ComparisonOperator::Ne => !loose_equals(left, right),
        ComparisonOperator::Lt => matches!(relational(left, right), Some(Ordering::Less)),
        ComparisonOperator::Le => matches!(
            relational(left, right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ComparisonOperator::Gt => matches!(relational(left, right), Some(Ordering::Greater)),
        ComparisonOperator::Ge => matches!(
            relational(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

fn strict_equals<E: Element>(left: &Operand<E>, right: &Operand<E>) -> bool {
    match (left, right) {
        (Operand::Element(a), Operand::Element(b)) => a.is_same(b),
        (Operand::Value(a), Operand::Value(b)) => match (a, b) {
            (ScriptValue::Number(a), ScriptValue::Number(b)) => a == b,
            (a, b) => a == b,
        },
        _ => false,
    }
}

fn loose_equals<E: Element>(left: &Operand<E>, right: &Operand<E>) -> bool {
    match (left, right) {
        (Operand::Value(a), Operand::Value(b)) => match (a, b) {
            (
                ScriptValue::Undefined | ScriptValue::Null,
                ScriptValue::Undefined | ScriptValue::Null,
            ) => true,
            (ScriptValue::Undefined | ScriptValue::Null, _)
            | (_, ScriptValue::Undefined | ScriptValue::Null) => false,
            (ScriptValue::Number(_), ScriptValue::String(_))
            | (ScriptValue::String(_), ScriptValue::Number(_))
            | (ScriptValue::Bool(_), _)
            | (_, ScriptValue::Bool(_)) => a.to_number() == b.to_number(),
            _ => a == b,
        },
        _ => strict_equals(left, right),
    }
}

fn relational<E: Element>(left: &Operand<E>, right: &Operand<E>) -> Option<Ordering> {
    let a = left.to_script_value();
    let b = right.to_script_value();
    match (&a, &b) {
        (ScriptValue::String(a), ScriptValue::String(b)) => Some(a.cmp(b)),
        _ => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn arithmetic<E: Element>(
    left: &Operand<E>,
    operator: ArithmeticOperator,
    right: &Operand<E>,
) -> ScriptValue {
    let a = left.to_script_value();
    let b = right.to_script_value();

    if operator == ArithmeticOperator::Add {
        let stringy = |v: &ScriptValue| {
            matches!(
                v,
                ScriptValue::String(_) | ScriptValue::Array(_) | ScriptValue::Object(_)
            )
        };
        if stringy(&a) || stringy(&b) {
            return ScriptValue::String(format!("{}{}", a.to_js_string(), b.to_js_string()));
        }
    }

    let (x, y) = (a.to_number(), b.to_number());
    ScriptValue::Number(match operator {
        ArithmeticOperator::Add => x + y,
        ArithmeticOperator::Subtract => x - y,
        ArithmeticOperator::Multiply => x * y,
        ArithmeticOperator::Divide => x / y,
        ArithmeticOperator::Remainder => x % y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse;
    use serde_json::json;

    fn eval(expr: &str, subject: &Value) -> Result<ScriptValue, JSONPathError> {
        let bindings = HashMap::from([(String::from("limit"), json!(10))]);
        let path = vec![PathKey::from("store"), PathKey::Index(0)];
        let scope = Scope {
            subject: &subject,
            parent: None,
            path: &path,
            bindings: &bindings,
        };
        let expr = parse(expr, 0)?;
        Ok(scope.evaluate(&expr)?.to_script_value())
    }

    #[test]
    fn member_access_and_comparison() {
        let data = json!({"price": 8.95});
        assert_eq!(eval("@.price < 10", &data), Ok(ScriptValue::Bool(true)));
        assert_eq!(eval("@.price > limit", &data), Ok(ScriptValue::Bool(false)));
    }

    #[test]
    fn missing_member_is_undefined() {
        let data = json!({"a": 1});
        assert_eq!(eval("@.isbn", &data), Ok(ScriptValue::Undefined));
        assert_eq!(eval("!@.isbn", &data), Ok(ScriptValue::Bool(true)));
    }

    #[test]
    fn reading_through_undefined_is_an_error() {
        let data = json!({"a": 1});
        let err = eval("@.b.c", &data).unwrap_err();
        assert_eq!(err.msg, "Cannot read properties of undefined (reading 'c')");
    }

    #[test]
    fn unknown_identifier() {
        let data = json!({});
        let err = eval("nope == 1", &data).unwrap_err();
        assert_eq!(err.msg, "nope is not defined");
    }

    #[test]
    fn array_length() {
        let data = json!([1, 2, 3]);
        assert_eq!(eval("@.length - 1", &data), Ok(ScriptValue::Number(2.0)));
        assert_eq!(eval("'abc'.length", &data), Ok(ScriptValue::Number(3.0)));
    }

    #[test]
    fn loose_and_strict_equality() {
        let data = json!({"n": 1, "s": "1"});
        assert_eq!(eval("@.n == @.s", &data), Ok(ScriptValue::Bool(true)));
        assert_eq!(eval("@.n === @.s", &data), Ok(ScriptValue::Bool(false)));
        assert_eq!(eval("null == undefined", &data), Ok(ScriptValue::Bool(true)));
        assert_eq!(eval("null === undefined", &data), Ok(ScriptValue::Bool(false)));
    }

    #[test]
    fn string_concatenation() {
        let data = json!({"n": 2});
        assert_eq!(
            eval("'item' + @.n", &data),
            Ok(ScriptValue::String(String::from("item2")))
        );
        assert_eq!(eval("@.n + 1", &data), Ok(ScriptValue::Number(3.0)));
    }

    #[test]
    fn logical_operators_yield_operands() {
        let data = json!({"a": "x"});
        assert_eq!(
            eval("@.b || @.a", &data),
            Ok(ScriptValue::String(String::from("x")))
        );
        assert_eq!(eval("@.b && @.a", &data), Ok(ScriptValue::Undefined));
    }

    #[test]
    fn subject_references() {
        let data = json!(null);
        assert_eq!(eval("@property", &data), Ok(ScriptValue::Number(0.0)));
        assert_eq!(
            eval("@parentProperty", &data),
            Ok(ScriptValue::String(String::from("store")))
        );
        assert_eq!(
            eval("@path", &data),
            Ok(ScriptValue::String(String::from("$['store'][0]")))
        );
    }

    #[test]
    fn composites_compare_by_identity() {
        let data = json!({"a": {"x": 1}});
        assert_eq!(eval("@.a === @.a", &data), Ok(ScriptValue::Bool(true)));
        assert_eq!(eval("@ === @.a", &data), Ok(ScriptValue::Bool(false)));
    }

    #[test]
    fn number_strings() {
        assert_eq!(ScriptValue::Number(1.0).to_js_string(), "1");
        assert_eq!(ScriptValue::Number(1.5).to_js_string(), "1.5");
        assert_eq!(ScriptValue::Number(-0.0).to_js_string(), "0");
        assert_eq!(ScriptValue::Number(f64::NAN).to_js_string(), "NaN");
    }
}
