use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

use crate::ast::Connective;

// Errors caused by the query itself. Deterministic for a given AST and schema,
// so callers report them back to the client instead of retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    // The selector does not name a field reachable from the root type
    #[error("cannot resolve selector '{selector}': {reason}")]
    UnresolvedSelector { selector: String, reason: String },

    // Operator symbol missing from the registry, or an argument shape the rule does not define
    #[error("unsupported operator '{operator}' on '{selector}': {detail}")]
    UnsupportedOperator {
        operator: String,
        selector: String,
        detail: String,
    },

    // A raw argument that does not convert to the field's declared kind
    #[error("unknown value: {argument} for {target}")]
    TypeCoercion { argument: String, target: String },

    // AND/OR node without children
    #[error("{connective} node has no children")]
    EmptyNode { connective: Connective },
}

impl CompileError {
    pub(crate) fn coercion(argument: impl Into<String>, target: impl Into<String>) -> Self {
        CompileError::TypeCoercion {
            argument: argument.into(),
            target: target.into(),
        }
    }
}

// Defects in the schema provider. Never the client's fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown entity type '{0}'")]
    UnknownEntity(String),

    #[error("relation '{entity}.{field}' targets unknown entity '{target}'")]
    DanglingRelation {
        entity: String,
        field: String,
        target: String,
    },

    #[error("field '{entity}.{field}' references undeclared enumeration '{enumeration}'")]
    UnknownEnumeration {
        entity: String,
        field: String,
        enumeration: String,
    },

    #[error("invalid schema document: {0}")]
    Invalid(String),
}

// Everything `Compiler::compile` can fail with
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("schema provider failure: {0}")]
    Schema(#[from] SchemaError),
}

impl Error {
    /// True when the query is at fault and the request layer should answer 4xx.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Compile(_))
    }

    /// HTTP status class the request layer maps this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Compile(_) => 400,
            Error::Schema(_) => 500,
        }
    }

    pub fn as_compile(&self) -> Option<&CompileError> {
        match self {
            Error::Compile(e) => Some(e),
            Error::Schema(_) => None,
        }
    }
}

// Type alias for results that use `Error` as the error type
pub type Result<T> = std::result::Result<T, Error>;
