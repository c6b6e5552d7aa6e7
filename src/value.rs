use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Number;

use crate::errors::CompileError;
use crate::schema::{DeclaredKind, EnumType};

/// An argument after coercion to its field's declared kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    Text(String),
    Bool(bool),
    Number(Number),
    Date(DateTime<Utc>),
    Enum { enumeration: String, member: String },
}

/// Convert a raw textual argument into a value of `kind`.
pub fn coerce(raw: &str, kind: &DeclaredKind) -> Result<TypedValue, CompileError> {
    match kind {
        DeclaredKind::String => Ok(TypedValue::Text(raw.to_string())),
        DeclaredKind::Boolean => parse_bool(raw).map(TypedValue::Bool),
        DeclaredKind::Number => parse_number(raw).map(TypedValue::Number),
        DeclaredKind::Date => parse_date(raw)
            .map(TypedValue::Date)
            .ok_or_else(|| CompileError::coercion(raw, "date")),
        DeclaredKind::Enumeration(e) => enum_member(raw, e).map(|member| TypedValue::Enum {
            enumeration: e.name.clone(),
            member,
        }),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Result<bool, CompileError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(CompileError::coercion(raw, "boolean")),
    }
}

fn parse_number(raw: &str) -> Result<Number, CompileError> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(Number::from(u));
    }
    // from_f64 rejects NaN and infinities
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| CompileError::coercion(raw, "number"))
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as midnight UTC.
pub(crate) fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// Canonical lookup first, then case-insensitive member name.
fn enum_member(raw: &str, e: &EnumType) -> Result<String, CompileError> {
    let declared = |name: &str| {
        e.members
            .iter()
            .find(|m| m.eq_ignore_ascii_case(name))
            .cloned()
    };
    e.canonical
        .as_ref()
        .and_then(|lookup| lookup.lookup(raw))
        .and_then(|name| declared(&name))
        .or_else(|| declared(raw))
        .ok_or_else(|| CompileError::coercion(raw, e.name.clone()))
}
