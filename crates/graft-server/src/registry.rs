// SPDX-License-Identifier: Apache-2.0

//! Field-to-resolver dispatch table.
//!
//! The builder collects declared field coordinates and resolver bindings, then validates both
//! directions in one pass: every declared field has exactly one resolver and every resolver
//! serves exactly one declared field. All violations are reported together. A successful build
//! yields a frozen [`Registry`] that is shared read-only across request tasks.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use graft_api::ApiError;
use graft_core::{ErrorCode, ExitCode, FieldName, TypeName};
use graft_model::{EntitySchema, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::auth::Actor;

pub const QUERY_TYPE: &str = "Query";
pub const MUTATION_TYPE: &str = "Mutation";

/// `Type.field`, the key of the dispatch table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldCoordinate {
    pub type_name: TypeName,
    pub field: FieldName,
}

impl FieldCoordinate {
    #[must_use]
    pub fn new(type_name: TypeName, field: FieldName) -> Self {
        Self { type_name, field }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let (type_part, field_part) = raw
            .split_once('.')
            .ok_or_else(|| format!("field coordinate `{raw}` must be `Type.field`"))?;
        let type_name = TypeName::new(type_part).map_err(|e| e.to_string())?;
        let field = FieldName::new(field_part).map_err(|e| e.to_string())?;
        Ok(Self { type_name, field })
    }

    /// Whether this is a `Query` or `Mutation` field, callable without a parent object.
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self.type_name.as_str(), QUERY_TYPE | MUTATION_TYPE)
    }
}

impl Display for FieldCoordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field)
    }
}

impl FromStr for FieldCoordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldCoordinate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldCoordinate> for String {
    fn from(value: FieldCoordinate) -> Self {
        value.to_string()
    }
}

/// Per-call inputs handed to a resolver.
pub struct ResolveContext<'a> {
    pub actor: &'a Actor,
    pub registry: &'a Registry,
    pub coordinate: &'a FieldCoordinate,
    /// The object this field is read from; `None` for root fields.
    pub parent: Option<&'a Record>,
}

pub trait Resolver: Send + Sync {
    fn resolve(&self, ctx: &ResolveContext<'_>, args: &Map<String, Value>)
        -> Result<Value, ApiError>;
}

struct Binding {
    handle: String,
    target: FieldCoordinate,
    resolver: Arc<dyn Resolver>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryViolation {
    /// A declared field nothing resolves.
    MissingResolver { field: FieldCoordinate },
    /// A resolver bound to a field nobody declared.
    OrphanResolver {
        handle: String,
        target: FieldCoordinate,
    },
    /// A declared field with more than one resolver.
    DuplicateResolver {
        field: FieldCoordinate,
        handles: Vec<String>,
    },
    /// One resolver handle bound to more than one field.
    AmbiguousResolver {
        handle: String,
        targets: Vec<FieldCoordinate>,
    },
}

impl RegistryViolation {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingResolver { .. } => ErrorCode::MissingResolver,
            Self::OrphanResolver { .. } | Self::AmbiguousResolver { .. } => {
                ErrorCode::OrphanResolver
            }
            Self::DuplicateResolver { .. } => ErrorCode::DuplicateResolver,
        }
    }
}

impl Display for RegistryViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingResolver { field } => write!(f, "MissingResolver({field})"),
            Self::OrphanResolver { handle, target } => {
                write!(f, "OrphanResolver({handle} -> {target})")
            }
            Self::DuplicateResolver { field, handles } => {
                write!(f, "DuplicateResolver({field}: {})", handles.join(", "))
            }
            Self::AmbiguousResolver { handle, targets } => {
                let targets: Vec<String> = targets.iter().map(ToString::to_string).collect();
                write!(f, "AmbiguousResolver({handle}: {})", targets.join(", "))
            }
        }
    }
}

/// Combined report of every violation found while building a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryError {
    pub violations: Vec<RegistryViolation>,
}

impl RegistryError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        ExitCode::Validation
    }

    #[must_use]
    pub fn missing(&self) -> Vec<&FieldCoordinate> {
        self.violations
            .iter()
            .filter_map(|v| match v {
                RegistryViolation::MissingResolver { field } => Some(field),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn orphans(&self) -> Vec<&str> {
        self.violations
            .iter()
            .filter_map(|v| match v {
                RegistryViolation::OrphanResolver { handle, .. } => Some(handle.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "registry validation failed with {} violation(s):",
            self.violations.len()
        )?;
        for v in &self.violations {
            write!(f, " {v};")?;
        }
        Ok(())
    }
}

impl std::error::Error for RegistryError {}

#[derive(Default)]
pub struct RegistryBuilder {
    declared: BTreeSet<FieldCoordinate>,
    entities: BTreeMap<TypeName, EntitySchema>,
    bindings: Vec<Binding>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, field: FieldCoordinate) -> &mut Self {
        self.declared.insert(field);
        self
    }

    /// Declares every field of `schema` as `Type.field` and keeps the schema for lookups.
    pub fn declare_entity(&mut self, schema: EntitySchema) -> &mut Self {
        for spec in schema.fields() {
            self.declared.insert(FieldCoordinate::new(
                schema.type_name().clone(),
                spec.name.clone(),
            ));
        }
        self.entities.insert(schema.type_name().clone(), schema);
        self
    }

    pub fn bind(
        &mut self,
        handle: impl Into<String>,
        target: FieldCoordinate,
        resolver: Arc<dyn Resolver>,
    ) -> &mut Self {
        self.bindings.push(Binding {
            handle: handle.into(),
            target,
            resolver,
        });
        self
    }

    /// Validates totality and exclusivity and freezes the table.
    ///
    /// Every violation is logged and returned; none stops the scan early.
    pub fn build(self) -> Result<Arc<Registry>, RegistryError> {
        let mut by_field: BTreeMap<&FieldCoordinate, Vec<&Binding>> = BTreeMap::new();
        let mut by_handle: BTreeMap<&str, BTreeSet<&FieldCoordinate>> = BTreeMap::new();
        for binding in &self.bindings {
            by_field.entry(&binding.target).or_default().push(binding);
            by_handle
                .entry(binding.handle.as_str())
                .or_default()
                .insert(&binding.target);
        }

        let mut violations = Vec::new();
        for field in &self.declared {
            match by_field.get(field) {
                None => violations.push(RegistryViolation::MissingResolver {
                    field: field.clone(),
                }),
                Some(bound) if bound.len() == 1 => {}
                Some(bound) => {
                    let mut handles: Vec<String> = bound.iter().map(|b| b.handle.clone()).collect();
                    handles.sort();
                    violations.push(RegistryViolation::DuplicateResolver {
                        field: field.clone(),
                        handles,
                    });
                }
            }
        }
        for binding in &self.bindings {
            if !self.declared.contains(&binding.target) {
                violations.push(RegistryViolation::OrphanResolver {
                    handle: binding.handle.clone(),
                    target: binding.target.clone(),
                });
            }
        }
        for (handle, targets) in &by_handle {
            if targets.len() > 1 {
                violations.push(RegistryViolation::AmbiguousResolver {
                    handle: (*handle).to_string(),
                    targets: targets.iter().map(|t| (*t).clone()).collect(),
                });
            }
        }

        if !violations.is_empty() {
            for v in &violations {
                error!(code = %v.code(), violation = %v, "registry violation");
            }
            return Err(RegistryError { violations });
        }

        let declared = self.declared.len();
        let dispatch: BTreeMap<FieldCoordinate, Binding> = self
            .bindings
            .into_iter()
            .map(|b| (b.target.clone(), b))
            .collect();
        info!(
            fields = declared,
            entities = self.entities.len(),
            "resolver registry frozen"
        );
        Ok(Arc::new(Registry {
            dispatch,
            entities: self.entities,
        }))
    }
}

/// Frozen dispatch table. Read-only after build; share it through `Arc`.
pub struct Registry {
    dispatch: BTreeMap<FieldCoordinate, Binding>,
    entities: BTreeMap<TypeName, EntitySchema>,
}

impl Registry {
    #[must_use]
    pub fn len(&self) -> usize {
        self.dispatch.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dispatch.is_empty()
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &FieldCoordinate> {
        self.dispatch.keys()
    }

    #[must_use]
    pub fn handle_for(&self, field: &FieldCoordinate) -> Option<&str> {
        self.dispatch.get(field).map(|b| b.handle.as_str())
    }

    #[must_use]
    pub fn entity(&self, type_name: &TypeName) -> Option<&EntitySchema> {
        self.entities.get(type_name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.values()
    }

    /// Dispatches a root field call. Object fields only resolve beneath a parent and are
    /// reported as unknown here.
    pub fn dispatch(
        &self,
        actor: &Actor,
        field: &FieldCoordinate,
        args: &Map<String, Value>,
    ) -> Result<Value, ApiError> {
        if !field.is_root() {
            let coordinate = field.to_string();
            return Err(ApiError::new(
                ErrorCode::UnknownField,
                format!("`{coordinate}` is not a root field"),
                serde_json::json!({"field": coordinate, "reason": "not_a_root_field"}),
            ));
        }
        self.call(actor, field, None, args)
    }

    /// Resolves every field declared on the record's type, stored or computed, through its
    /// resolver and returns a record holding the resolved values.
    pub fn resolve_fields(&self, actor: &Actor, record: &Record) -> Result<Record, ApiError> {
        if !self.entities.contains_key(&record.type_name) {
            return Err(ApiError::internal(format!(
                "no schema registered for `{}`",
                record.type_name
            )));
        }
        let no_args = Map::new();
        let mut fields = Map::new();
        for coordinate in self
            .dispatch
            .keys()
            .filter(|c| c.type_name == record.type_name)
        {
            let value = self.call(actor, coordinate, Some(record), &no_args)?;
            fields.insert(coordinate.field.to_string(), value);
        }
        Ok(Record::new(
            record.type_name.clone(),
            record.local_id.clone(),
            fields,
        ))
    }

    fn call(
        &self,
        actor: &Actor,
        field: &FieldCoordinate,
        parent: Option<&Record>,
        args: &Map<String, Value>,
    ) -> Result<Value, ApiError> {
        let binding = self
            .dispatch
            .get(field)
            .ok_or_else(|| ApiError::unknown_field(&field.to_string()))?;
        let ctx = ResolveContext {
            actor,
            registry: self,
            coordinate: field,
            parent,
        };
        binding.resolver.resolve(&ctx, args)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("fields", &self.dispatch.len())
            .field("entities", &self.entities.len())
            .finish()
    }
}
