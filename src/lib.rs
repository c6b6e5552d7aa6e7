pub mod ast;
pub mod compiler;
pub mod context;
pub mod errors;
pub mod operators; // plugin model
pub mod predicate;
pub mod schema;
pub mod value;
mod eval;

use crate::errors::Result;

pub use ast::{Comparison, Connective, Node};
pub use compiler::Compiler;
pub use context::CompileContext;
pub use errors::{CompileError, Error, SchemaError};
pub use operators::{OperatorRule, Registry};
pub use predicate::Predicate;
pub use schema::{DeclaredKind, PathResolver, ResolvedPath, Schema};
pub use value::TypedValue;

/// Convenience: compile against `root` with the builtin operators.
pub fn compile<R: PathResolver>(resolver: &R, root: &str, node: &Node) -> Result<Predicate> {
    Compiler::new(resolver).compile(&CompileContext::new(root), node)
}
