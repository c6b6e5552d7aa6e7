use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::errors::CompileError;
use crate::predicate::Predicate;
use crate::schema::ResolvedPath;

/// Trait for pluggable operator rules used by the compiler.
///
/// A rule validates its own argument count and coerces arguments against
/// the resolved path's declared kind.
pub trait OperatorRule: Send + Sync {
    /// Every symbol this rule answers to, e.g. `["=eq=", "=="]`.
    fn symbols(&self) -> &'static [&'static str];

    /// `symbol` is the spelling the query used; rules only need it for errors.
    fn build(
        &self,
        symbol: &str,
        path: &ResolvedPath,
        arguments: &[Option<String>],
    ) -> Result<Predicate, CompileError>;
}

/// Thread-safe operator registry. Clones share storage until one of them
/// registers a rule.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn OperatorRule>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(builtins::IsNull);
        registry.register(builtins::Equal);
        registry
    }

    pub fn register<R: OperatorRule + 'static>(&mut self, rule: R) {
        let rule: Arc<dyn OperatorRule> = Arc::new(rule);
        let map = Arc::make_mut(&mut self.inner);
        for symbol in rule.symbols() {
            map.insert(*symbol, rule.clone());
        }
    }

    /// Builder form of [`Registry::register`].
    pub fn with<R: OperatorRule + 'static>(mut self, rule: R) -> Self {
        self.register(rule);
        self
    }

    pub fn get(&self, symbol: &str) -> Option<Arc<dyn OperatorRule>> {
        self.inner.get(symbol).cloned()
    }

    pub fn symbols(&self) -> Vec<&'static str> {
        self.inner.keys().copied().sorted().collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("symbols", &self.symbols())
            .finish()
    }
}

fn unsupported(symbol: &str, path: &ResolvedPath, detail: impl Into<String>) -> CompileError {
    CompileError::UnsupportedOperator {
        operator: symbol.to_string(),
        selector: path.selector(),
        detail: detail.into(),
    }
}

/// The one argument both builtins accept; anything else is an unsupported shape.
fn single_argument<'a>(
    symbol: &str,
    path: &ResolvedPath,
    arguments: &'a [Option<String>],
) -> Result<Option<&'a str>, CompileError> {
    match arguments {
        [only] => Ok(only.as_deref()),
        [] => Err(unsupported(symbol, path, "expects exactly one argument, got none")),
        many => Err(unsupported(
            symbol,
            path,
            format!("expects exactly one argument, got {}", many.len()),
        )),
    }
}

pub mod builtins {
    use super::*;
    use crate::value::{coerce, parse_bool};

    /// `=isnull=true` / `=isnull=false`.
    pub struct IsNull;
    impl OperatorRule for IsNull {
        fn symbols(&self) -> &'static [&'static str] { &["=isnull="] }

        fn build(
            &self,
            symbol: &str,
            path: &ResolvedPath,
            arguments: &[Option<String>],
        ) -> Result<Predicate, CompileError> {
            let raw = single_argument(symbol, path, arguments)?
                .ok_or_else(|| CompileError::coercion("<null>", "boolean"))?;
            let path = path.clone();
            Ok(if parse_bool(raw)? {
                Predicate::IsNull { path }
            } else {
                Predicate::IsNotNull { path }
            })
        }
    }

    /// Equality. A null argument compiles to a null check, not to `= NULL`.
    pub struct Equal;
    impl OperatorRule for Equal {
        fn symbols(&self) -> &'static [&'static str] { &["=eq=", "=="] }

        fn build(
            &self,
            symbol: &str,
            path: &ResolvedPath,
            arguments: &[Option<String>],
        ) -> Result<Predicate, CompileError> {
            match single_argument(symbol, path, arguments)? {
                None => Ok(Predicate::IsNull { path: path.clone() }),
                Some(raw) => Ok(Predicate::Equals {
                    path: path.clone(),
                    value: coerce(raw, &path.kind)?,
                }),
            }
        }
    }
}
