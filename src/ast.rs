use std::fmt;

use serde::{Deserialize, Serialize};

/// AND / OR connective joining sibling nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connective {
    And,
    Or,
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connective::And => f.write_str("AND"),
            Connective::Or => f.write_str("OR"),
        }
    }
}

/// A single `selector op arguments` test, e.g. `status=eq=FAILED`.
///
/// `None` in `arguments` is the null sentinel: a literal absence of value,
/// distinct from the string `"null"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub selector: String,
    pub operator: String,
    pub arguments: Vec<Option<String>>,
}

/// Query tree as handed over by the filter-language parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Logical {
        connective: Connective,
        children: Vec<Node>,
    },
    Comparison(Comparison),
}

impl Node {
    pub fn and(children: Vec<Node>) -> Self {
        Node::Logical {
            connective: Connective::And,
            children,
        }
    }

    pub fn or(children: Vec<Node>) -> Self {
        Node::Logical {
            connective: Connective::Or,
            children,
        }
    }

    /// Comparison with string arguments.
    pub fn comparison<I, S>(selector: &str, operator: &str, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Node::Comparison(Comparison {
            selector: selector.to_string(),
            operator: operator.to_string(),
            arguments: arguments.into_iter().map(|a| Some(a.into())).collect(),
        })
    }

    /// Comparison whose single argument is the null sentinel.
    pub fn comparison_null(selector: &str, operator: &str) -> Self {
        Node::Comparison(Comparison {
            selector: selector.to_string(),
            operator: operator.to_string(),
            arguments: vec![None],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn reads_parser_json() {
        let doc = json!({
            "type": "logical",
            "connective": "and",
            "children": [
                { "type": "comparison", "selector": "status", "operator": "=eq=", "arguments": ["FAILED"] },
                { "type": "comparison", "selector": "result", "operator": "=eq=", "arguments": [null] }
            ]
        });
        let node: Node = serde_json::from_value(doc).unwrap();
        assert_eq!(
            node,
            Node::and(vec![
                Node::comparison("status", "=eq=", ["FAILED"]),
                Node::comparison_null("result", "=eq="),
            ])
        );
    }
}
