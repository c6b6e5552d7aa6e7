use serde_json::{Number, Value};

use crate::predicate::Predicate;
use crate::schema::ResolvedPath;
use crate::value::{parse_date, TypedValue};

impl Predicate {
    /// Evaluate against a JSON record. Relations are nested objects; a to-many
    /// relation (array) matches when any element does. A missing or null
    /// relation behaves like an outer join: its fields read as null.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Predicate::IsNull { path } => field_values(record, path).iter().any(Option::is_none),
            Predicate::IsNotNull { path } => field_values(record, path).iter().any(Option::is_some),
            Predicate::Equals { path, value } => field_values(record, path)
                .into_iter()
                .flatten()
                .any(|v| value_eq(value, v)),
            Predicate::And(children) => children.iter().all(|c| c.matches(record)),
            Predicate::Or(children) => children.iter().any(|c| c.matches(record)),
        }
    }
}

fn field_values<'a>(record: &'a Value, path: &ResolvedPath) -> Vec<Option<&'a Value>> {
    let mut out = Vec::new();
    collect(record, &path.relations, &path.field, &mut out);
    out
}

fn collect<'a>(node: &'a Value, hops: &[String], field: &str, out: &mut Vec<Option<&'a Value>>) {
    let Some((hop, rest)) = hops.split_first() else {
        out.push(node.get(field).filter(|v| !v.is_null()));
        return;
    };
    match node.get(hop) {
        Some(Value::Array(items)) if !items.is_empty() => {
            for item in items {
                collect(item, rest, field, out);
            }
        }
        None | Some(Value::Null) | Some(Value::Array(_)) => out.push(None),
        Some(other) => collect(other, rest, field, out),
    }
}

fn value_eq(expected: &TypedValue, actual: &Value) -> bool {
    match (expected, actual) {
        (TypedValue::Text(s), Value::String(a)) => s == a,
        (TypedValue::Bool(b), Value::Bool(a)) => b == a,
        (TypedValue::Number(n), Value::Number(a)) => number_eq(n, a),
        (TypedValue::Number(n), Value::String(a)) => a.parse::<Number>().is_ok_and(|a| number_eq(n, &a)),
        (TypedValue::Date(d), Value::String(a)) => parse_date(a).as_ref() == Some(d),
        (TypedValue::Enum { member, .. }, Value::String(a)) => member == a,
        _ => false,
    }
}

// Integers compare exactly; f64 would merge neighbours above 2^53.
fn number_eq(x: &Number, y: &Number) -> bool {
    if x.is_f64() || y.is_f64() {
        return match (x.as_f64(), y.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
            _ => false,
        };
    }
    match (x.as_i64(), y.as_i64()) {
        (Some(a), Some(b)) => a == b,
        _ => x.as_u64().is_some() && x.as_u64() == y.as_u64(),
    }
}
