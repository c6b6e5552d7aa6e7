use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;

/// Domain-specific name lookup for an enumeration, consulted before plain
/// member-name matching. Returns the member name the raw text stands for.
#[derive(Clone)]
pub struct CanonicalLookup(Arc<dyn Fn(&str) -> Option<String> + Send + Sync>);

impl CanonicalLookup {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn lookup(&self, raw: &str) -> Option<String> {
        (self.0)(raw)
    }

    fn from_aliases(aliases: &BTreeMap<String, String>) -> Self {
        let folded: BTreeMap<String, String> = aliases
            .iter()
            .map(|(alias, member)| (alias.to_lowercase(), member.clone()))
            .collect();
        Self::new(move |raw| folded.get(&raw.to_lowercase()).cloned())
    }
}

impl fmt::Debug for CanonicalLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CanonicalLookup(..)")
    }
}

/// An enumeration as the coercer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<String>,
    #[serde(skip)]
    pub canonical: Option<CanonicalLookup>,
}

// Lookup functions have no identity; two enum types are the same when their
// declarations are.
impl PartialEq for EnumType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.members == other.members
    }
}

impl Eq for EnumType {}

/// Declared value kind of a resolved field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "enumeration", rename_all = "snake_case")]
pub enum DeclaredKind {
    String,
    Boolean,
    Number,
    Date,
    Enumeration(EnumType),
}

impl fmt::Display for DeclaredKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredKind::String => f.write_str("string"),
            DeclaredKind::Boolean => f.write_str("boolean"),
            DeclaredKind::Number => f.write_str("number"),
            DeclaredKind::Date => f.write_str("date"),
            DeclaredKind::Enumeration(e) => f.write_str(&e.name),
        }
    }
}

/// Typed field location reached from a root entity, possibly across relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    pub root: String,
    /// Relation fields traversed, in order, before reaching `field`.
    pub relations: Vec<String>,
    pub field: String,
    pub kind: DeclaredKind,
}

impl ResolvedPath {
    /// Dotted form relative to the root, e.g. `generationRequest.status`.
    pub fn selector(&self) -> String {
        self.segments().collect::<Vec<_>>().join(".")
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.relations
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.field.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The selector does not name a field on the root type.
    Unresolved(String),
    /// The provider itself is broken; not the query's fault.
    Schema(SchemaError),
}

impl From<SchemaError> for ResolveError {
    fn from(e: SchemaError) -> Self {
        ResolveError::Schema(e)
    }
}

/// Schema provider seam. Must be a pure function of `(root, selector)`.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, root: &str, selector: &str) -> Result<ResolvedPath, ResolveError>;
}

impl<T: PathResolver + ?Sized> PathResolver for Arc<T> {
    fn resolve(&self, root: &str, selector: &str) -> Result<ResolvedPath, ResolveError> {
        (**self).resolve(root, selector)
    }
}

impl<T: PathResolver + ?Sized> PathResolver for &T {
    fn resolve(&self, root: &str, selector: &str) -> Result<ResolvedPath, ResolveError> {
        (**self).resolve(root, selector)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldDef {
    String,
    Boolean,
    Number,
    Date,
    Enumeration { name: String },
    Relation { target: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityDef {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
}

impl EntityDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, def: FieldDef) -> Self {
        self.fields.insert(name.to_string(), def);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnumDef {
    pub members: Vec<String>,
    /// Alternative spellings mapped to member names; becomes the canonical lookup.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(skip)]
    canonical: Option<CanonicalLookup>,
}

/// In-memory entity catalog, usually loaded from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schema {
    #[serde(default)]
    entities: BTreeMap<String, EntityDef>,
    #[serde(default)]
    enumerations: BTreeMap<String, EnumDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(doc: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(doc).map_err(|e| SchemaError::Invalid(e.to_string()))
    }

    pub fn entity(mut self, name: &str, def: EntityDef) -> Self {
        self.entities.insert(name.to_string(), def);
        self
    }

    pub fn enumeration<I, S>(mut self, name: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let def = self.enumerations.entry(name.to_string()).or_default();
        def.members = members.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a canonical-name function to a declared enumeration. It takes
    /// precedence over any JSON aliases.
    pub fn with_canonical_lookup<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        let def = self.enumerations.entry(name.to_string()).or_default();
        def.canonical = Some(CanonicalLookup::new(f));
        self
    }

    pub fn has_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    fn enum_type(&self, entity: &str, field: &str, name: &str) -> Result<EnumType, SchemaError> {
        let def = self
            .enumerations
            .get(name)
            .ok_or_else(|| SchemaError::UnknownEnumeration {
                entity: entity.to_string(),
                field: field.to_string(),
                enumeration: name.to_string(),
            })?;
        let canonical = match (&def.canonical, def.aliases.is_empty()) {
            (Some(lookup), _) => Some(lookup.clone()),
            (None, false) => Some(CanonicalLookup::from_aliases(&def.aliases)),
            (None, true) => None,
        };
        Ok(EnumType {
            name: name.to_string(),
            members: def.members.clone(),
            canonical,
        })
    }

    fn declared_kind(&self, entity: &str, field: &str, def: &FieldDef) -> Result<DeclaredKind, ResolveError> {
        Ok(match def {
            FieldDef::String => DeclaredKind::String,
            FieldDef::Boolean => DeclaredKind::Boolean,
            FieldDef::Number => DeclaredKind::Number,
            FieldDef::Date => DeclaredKind::Date,
            FieldDef::Enumeration { name } => {
                DeclaredKind::Enumeration(self.enum_type(entity, field, name)?)
            }
            FieldDef::Relation { target } => {
                return Err(ResolveError::Unresolved(format!(
                    "'{field}' is a relation to '{target}', not a field"
                )))
            }
        })
    }
}

impl PathResolver for Schema {
    fn resolve(&self, root: &str, selector: &str) -> Result<ResolvedPath, ResolveError> {
        let mut entity_name = root;
        let mut entity = self
            .entities
            .get(root)
            .ok_or_else(|| SchemaError::UnknownEntity(root.to_string()))?;

        let segments: Vec<&str> = selector.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ResolveError::Unresolved("empty path segment".into()));
        }
        let Some((field, hops)) = segments.split_last() else {
            return Err(ResolveError::Unresolved("empty selector".into()));
        };

        let mut relations = Vec::with_capacity(hops.len());
        for (i, hop) in hops.iter().enumerate() {
            match entity.fields.get(*hop) {
                Some(FieldDef::Relation { target }) => {
                    entity = self.entities.get(target).ok_or_else(|| SchemaError::DanglingRelation {
                        entity: entity_name.to_string(),
                        field: hop.to_string(),
                        target: target.clone(),
                    })?;
                    entity_name = target.as_str();
                    relations.push(hop.to_string());
                }
                Some(_) => {
                    return Err(ResolveError::Unresolved(format!(
                        "'{hop}' on '{entity_name}' is not a relation; cannot traverse into '{}'",
                        segments[i + 1..].join(".")
                    )))
                }
                None => {
                    return Err(ResolveError::Unresolved(format!(
                        "'{entity_name}' has no field '{hop}'"
                    )))
                }
            }
        }

        let def = entity
            .fields
            .get(*field)
            .ok_or_else(|| ResolveError::Unresolved(format!("'{entity_name}' has no field '{field}'")))?;
        let kind = self.declared_kind(entity_name, field, def)?;

        Ok(ResolvedPath {
            root: root.to_string(),
            relations,
            field: field.to_string(),
            kind,
        })
    }
}
