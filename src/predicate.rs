use itertools::Itertools;
use serde::Serialize;

use crate::ast::Connective;
use crate::schema::ResolvedPath;
use crate::value::TypedValue;

/// Compiled boolean expression handed to the execution backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    IsNull { path: ResolvedPath },
    IsNotNull { path: ResolvedPath },
    Equals { path: ResolvedPath, value: TypedValue },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn combine(connective: Connective, children: Vec<Predicate>) -> Self {
        match connective {
            Connective::And => Predicate::And(children),
            Connective::Or => Predicate::Or(children),
        }
    }

    /// Every resolved path the predicate tests, left to right.
    pub fn paths(&self) -> Vec<&ResolvedPath> {
        match self {
            Predicate::IsNull { path }
            | Predicate::IsNotNull { path }
            | Predicate::Equals { path, .. } => vec![path],
            Predicate::And(children) | Predicate::Or(children) => {
                children.iter().flat_map(Predicate::paths).collect()
            }
        }
    }

    /// Canonical form: nested same-connective groups flattened, single-child
    /// groups unwrapped, children sorted. Logically equivalent predicates that
    /// differ only in AND/OR ordering or grouping normalize to equal values.
    pub fn normalized(self) -> Self {
        match self {
            Predicate::And(children) => Self::normalize_group(Connective::And, children),
            Predicate::Or(children) => Self::normalize_group(Connective::Or, children),
            leaf => leaf,
        }
    }

    fn normalize_group(connective: Connective, children: Vec<Predicate>) -> Self {
        let mut flat = Vec::with_capacity(children.len());
        for child in children.into_iter().map(Predicate::normalized) {
            match (connective, child) {
                (Connective::And, Predicate::And(inner)) | (Connective::Or, Predicate::Or(inner)) => {
                    flat.extend(inner)
                }
                (_, other) => flat.push(other),
            }
        }
        if flat.len() == 1 {
            if let Some(only) = flat.pop() {
                return only;
            }
        }
        let sorted = flat
            .into_iter()
            .sorted_by_cached_key(|p| serde_json::to_string(p).unwrap_or_default())
            .collect();
        Self::combine(connective, sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DeclaredKind;
    use pretty_assertions::assert_eq;

    fn path(field: &str) -> ResolvedPath {
        ResolvedPath {
            root: "Sbom".into(),
            relations: vec![],
            field: field.into(),
            kind: DeclaredKind::String,
        }
    }

    fn eq(field: &str, v: &str) -> Predicate {
        Predicate::Equals {
            path: path(field),
            value: TypedValue::Text(v.into()),
        }
    }

    #[test]
    fn normalization_ignores_order_and_grouping() {
        let a = Predicate::And(vec![
            eq("a", "1"),
            Predicate::And(vec![eq("b", "2"), Predicate::IsNull { path: path("c") }]),
        ]);
        let b = Predicate::And(vec![
            Predicate::IsNull { path: path("c") },
            eq("b", "2"),
            eq("a", "1"),
        ]);
        assert_ne!(a, b);
        assert_eq!(a.normalized(), b.normalized());
    }

    #[test]
    fn normalization_keeps_connectives_apart() {
        let mixed = Predicate::Or(vec![Predicate::And(vec![eq("a", "1"), eq("b", "2")]), eq("c", "3")]);
        let flattened = Predicate::Or(vec![eq("a", "1"), eq("b", "2"), eq("c", "3")]);
        assert_ne!(mixed.normalized(), flattened.normalized());
    }

    #[test]
    fn single_child_groups_unwrap() {
        assert_eq!(Predicate::Or(vec![eq("a", "1")]).normalized(), eq("a", "1"));
    }

    #[test]
    fn paths_in_order() {
        let p = Predicate::Or(vec![eq("a", "1"), Predicate::IsNotNull { path: path("b") }]);
        let fields: Vec<&str> = p.paths().iter().map(|p| p.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "b"]);
    }
}
