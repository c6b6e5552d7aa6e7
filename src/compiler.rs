use tracing::{debug, trace};

use crate::ast::{Comparison, Connective, Node};
use crate::context::CompileContext;
use crate::errors::{CompileError, Error, Result};
use crate::predicate::Predicate;
use crate::schema::{PathResolver, ResolveError};

/// Turns query trees into predicates.
///
/// Holds only the schema provider. Root type and operators arrive with each
/// call in a [`CompileContext`], so one compiler can serve any number of
/// concurrent compiles.
#[derive(Debug, Clone)]
pub struct Compiler<R> {
    resolver: R,
}

impl<R: PathResolver> Compiler<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Compile `node` against the context's root type. The first failure in a
    /// left-to-right walk is returned and nothing partial survives it.
    pub fn compile(&self, ctx: &CompileContext, node: &Node) -> Result<Predicate> {
        match self.visit(ctx, node) {
            Ok(predicate) => {
                debug!(root = ctx.root(), "compiled query");
                Ok(predicate)
            }
            Err(error) => {
                debug!(root = ctx.root(), %error, "query failed to compile");
                Err(error)
            }
        }
    }

    fn visit(&self, ctx: &CompileContext, node: &Node) -> Result<Predicate> {
        match node {
            Node::Logical {
                connective,
                children,
            } => self.visit_logical(ctx, *connective, children),
            Node::Comparison(cmp) => self.visit_comparison(ctx, cmp),
        }
    }

    fn visit_logical(
        &self,
        ctx: &CompileContext,
        connective: Connective,
        children: &[Node],
    ) -> Result<Predicate> {
        trace!(%connective, children = children.len(), "visit: logical node");
        if children.is_empty() {
            return Err(CompileError::EmptyNode { connective }.into());
        }
        let compiled = children
            .iter()
            .map(|child| self.visit(ctx, child))
            .collect::<Result<Vec<_>>>()?;
        Ok(Predicate::combine(connective, compiled))
    }

    fn visit_comparison(&self, ctx: &CompileContext, cmp: &Comparison) -> Result<Predicate> {
        trace!(
            selector = %cmp.selector,
            operator = %cmp.operator,
            arguments = cmp.arguments.len(),
            "visit: comparison node"
        );

        // Operator first: an unknown operator is reported even when the selector is bad too.
        let rule = ctx
            .registry()
            .get(&cmp.operator)
            .ok_or_else(|| CompileError::UnsupportedOperator {
                operator: cmp.operator.clone(),
                selector: cmp.selector.clone(),
                detail: "operator is not registered".into(),
            })?;

        let path = self
            .resolver
            .resolve(ctx.root(), &cmp.selector)
            .map_err(|e| match e {
                ResolveError::Unresolved(reason) => Error::Compile(CompileError::UnresolvedSelector {
                    selector: cmp.selector.clone(),
                    reason,
                }),
                ResolveError::Schema(schema) => Error::Schema(schema),
            })?;

        Ok(rule.build(&cmp.operator, &path, &cmp.arguments)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SchemaError;
    use crate::operators::{OperatorRule, Registry};
    use crate::schema::fixtures::sbom_schema;
    use crate::schema::{ResolvedPath, Schema};
    use crate::value::TypedValue;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn compile(node: &Node) -> Result<Predicate> {
        Compiler::new(sbom_schema()).compile(&CompileContext::new("Sbom"), node)
    }

    #[test]
    fn enum_equality_through_relation() {
        let p = compile(&Node::comparison("generationRequest.status", "=eq=", ["failed"])).unwrap();
        let Predicate::Equals { path, value } = p else {
            panic!("expected equals, got {p:?}");
        };
        assert_eq!(path.relations, vec!["generationRequest".to_string()]);
        assert_eq!(
            value,
            TypedValue::Enum {
                enumeration: "SbomGenerationStatus".into(),
                member: "FAILED".into()
            }
        );
    }

    #[test]
    fn nested_logical_nodes() {
        let node = Node::or(vec![
            Node::and(vec![
                Node::comparison("buildId", "==", ["ABC"]),
                Node::comparison("generationRequest.result", "=isnull=", ["false"]),
            ]),
            Node::comparison_null("rootPurl", "=eq="),
        ]);
        let Predicate::Or(children) = compile(&node).unwrap() else {
            panic!("expected OR");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[0], Predicate::And(inner) if inner.len() == 2));
        assert!(matches!(&children[1], Predicate::IsNull { path } if path.field == "rootPurl"));
    }

    #[test]
    fn empty_logical_node() {
        let err = compile(&Node::and(vec![])).unwrap_err();
        assert_eq!(
            err,
            Error::Compile(CompileError::EmptyNode {
                connective: Connective::And
            })
        );
        // nested empties are found too
        let err = compile(&Node::or(vec![
            Node::comparison("buildId", "==", ["A"]),
            Node::or(vec![]),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::EmptyNode { .. })));
    }

    #[test]
    fn first_failure_wins() {
        let node = Node::and(vec![
            Node::comparison("nope", "=eq=", ["x"]),
            Node::comparison("buildId", "=bogus=", ["x"]),
        ]);
        assert!(matches!(
            compile(&node).unwrap_err(),
            Error::Compile(CompileError::UnresolvedSelector { selector, .. }) if selector == "nope"
        ));
    }

    #[test]
    fn unknown_operator_beats_unresolved_selector() {
        let err = compile(&Node::comparison("nope", "=gt=", ["1"])).unwrap_err();
        assert!(matches!(
            err,
            Error::Compile(CompileError::UnsupportedOperator { operator, .. }) if operator == "=gt="
        ));
    }

    #[test]
    fn unresolved_selector_never_reaches_the_rule() {
        struct Counting(Arc<AtomicUsize>);
        impl OperatorRule for Counting {
            fn symbols(&self) -> &'static [&'static str] {
                &["=count="]
            }
            fn build(
                &self,
                _: &str,
                path: &ResolvedPath,
                _: &[Option<String>],
            ) -> std::result::Result<Predicate, CompileError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Predicate::IsNotNull { path: path.clone() })
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = CompileContext::with_registry("Sbom", Registry::new().with(Counting(calls.clone())));
        let compiler = Compiler::new(sbom_schema());

        let err = compiler
            .compile(&ctx, &Node::comparison("generationRequest.nope", "=count=", ["x"]))
            .unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::UnresolvedSelector { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        compiler
            .compile(&ctx, &Node::comparison("buildId", "=count=", ["x"]))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn schema_defects_stay_out_of_the_compile_taxonomy() {
        let compiler = Compiler::new(Schema::new());
        let err = compiler
            .compile(&CompileContext::new("Sbom"), &Node::comparison("id", "=eq=", ["1"]))
            .unwrap_err();
        assert_eq!(err, Error::Schema(SchemaError::UnknownEntity("Sbom".into())));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn custom_registry_replaces_builtins() {
        let ctx = CompileContext::with_registry("Sbom", Registry::new());
        let err = Compiler::new(sbom_schema())
            .compile(&ctx, &Node::comparison("buildId", "=eq=", ["A"]))
            .unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::UnsupportedOperator { .. })));
    }
}
