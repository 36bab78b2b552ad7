// SPDX-License-Identifier: Apache-2.0

//! Schema declarations and the bundled `User`/`Post` graph served by default.

use std::path::Path;
use std::sync::Arc;

use graft_api::ApiError;
use graft_core::{FieldName, TypeName};
use graft_model::{EntitySchema, FieldKind, FieldSpec, Record, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::registry::{
    FieldCoordinate, Registry, RegistryBuilder, RegistryError, ResolveContext, Resolver,
};
use crate::resolvers::{bind_standard, GraphServices, RootFields};
use crate::store::DataStore;

/// Declared surface of a graph: entity types plus every additional field coordinate (root
/// fields and computed fields). Loaded from JSON by the server and by `graft registry check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDeclaration {
    pub types: Vec<EntitySchema>,
    #[serde(default)]
    pub fields: Vec<FieldCoordinate>,
}

#[derive(Debug)]
pub enum DeclarationError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for DeclarationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "declaration read failed: {msg}"),
            Self::Parse(msg) => write!(f, "declaration parse failed: {msg}"),
            Self::Invalid(msg) => write!(f, "invalid declaration: {msg}"),
        }
    }
}

impl std::error::Error for DeclarationError {}

impl From<graft_core::Error> for DeclarationError {
    fn from(value: graft_core::Error) -> Self {
        Self::Invalid(value.to_string())
    }
}

impl From<ValidationError> for DeclarationError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value.to_string())
    }
}

impl SchemaDeclaration {
    pub fn from_json_str(raw: &str) -> Result<Self, DeclarationError> {
        serde_json::from_str(raw).map_err(|e| DeclarationError::Parse(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, DeclarationError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DeclarationError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &TypeName> {
        self.types.iter().map(EntitySchema::type_name)
    }

    /// Declares every entity field and every extra coordinate on `builder`.
    pub fn declare(&self, builder: &mut RegistryBuilder) {
        for schema in &self.types {
            builder.declare_entity(schema.clone());
        }
        for field in &self.fields {
            builder.declare(field.clone());
        }
    }

    /// The bundled graph: `User` and `Post`, their root fields, and `User.displayName`.
    pub fn demo() -> Result<Self, DeclarationError> {
        let types = vec![user_schema()?, post_schema()?];
        let mut fields = Vec::new();
        for schema in &types {
            let roots = RootFields::for_type(schema.type_name())?;
            fields.extend(roots.all().into_iter().cloned());
        }
        fields.push(FieldCoordinate::new(
            TypeName::new(USER)?,
            FieldName::new(DISPLAY_NAME)?,
        ));
        Ok(Self { types, fields })
    }
}

pub const USER: &str = "User";
pub const POST: &str = "Post";
pub const DISPLAY_NAME: &str = "displayName";

fn field(name: &str) -> graft_core::Result<FieldName> {
    FieldName::new(name)
}

fn schema(type_name: &str, fields: Vec<FieldSpec>) -> Result<EntitySchema, DeclarationError> {
    Ok(EntitySchema::new(TypeName::new(type_name)?, fields)?)
}

fn user_schema() -> Result<EntitySchema, DeclarationError> {
    schema(
        USER,
        vec![
            FieldSpec::required(field("name")?, FieldKind::String),
            FieldSpec::required(field("email")?, FieldKind::String),
            FieldSpec::optional(field("age")?, FieldKind::Int),
            FieldSpec::optional(field("nickname")?, FieldKind::String),
            FieldSpec::optional(field("createdAt")?, FieldKind::String).read_only(),
        ],
    )
}

fn post_schema() -> Result<EntitySchema, DeclarationError> {
    schema(
        POST,
        vec![
            FieldSpec::required(field("title")?, FieldKind::String),
            FieldSpec::optional(field("body")?, FieldKind::String),
            FieldSpec::required(field("authorId")?, FieldKind::Id).read_only(),
            FieldSpec::optional(field("score")?, FieldKind::Int),
            FieldSpec::optional(field("published")?, FieldKind::Bool),
            FieldSpec::optional(field("rating")?, FieldKind::Float),
            FieldSpec::optional(field("meta")?, FieldKind::Json),
        ],
    )
}

/// `User.displayName`: the nickname when set, else the name.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayNameResolver;

impl Resolver for DisplayNameResolver {
    fn resolve(&self, ctx: &ResolveContext<'_>, _args: &Map<String, Value>) -> Result<Value, ApiError> {
        let parent = ctx.parent.ok_or_else(|| {
            ApiError::internal(format!("{} resolved without a parent", ctx.coordinate))
        })?;
        let pick = |name: &str| parent.field(name).filter(|v| v.is_string()).cloned();
        Ok(pick("nickname")
            .or_else(|| pick("name"))
            .unwrap_or(Value::Null))
    }
}

/// Declares `declaration`, binds the standard resolvers of every declared type plus the computed
/// fields this crate ships, and freezes the result.
pub fn build_registry(
    declaration: &SchemaDeclaration,
    services: &Arc<GraphServices>,
) -> Result<Arc<Registry>, RegistryError> {
    let mut builder = RegistryBuilder::new();
    declaration.declare(&mut builder);
    for schema in &declaration.types {
        if let Err(e) = bind_standard(&mut builder, schema, services) {
            tracing::error!(type_name = %schema.type_name(), error = %e, "standard bindings skipped");
        }
        if schema.type_name().as_str() == USER {
            if let Ok(f) = FieldName::new(DISPLAY_NAME) {
                builder.bind(
                    "computed:User.displayName",
                    FieldCoordinate::new(schema.type_name().clone(), f),
                    Arc::new(DisplayNameResolver),
                );
            }
        }
    }
    builder.build()
}

/// Inserts a small fixed data set into `store`.
pub fn seed(store: &dyn DataStore) -> Result<Vec<Record>, ApiError> {
    let user = TypeName::new(USER).map_err(|e| ApiError::internal(e.to_string()))?;
    let post = TypeName::new(POST).map_err(|e| ApiError::internal(e.to_string()))?;
    let users = [
        ("1", json!({"name": "Ada", "email": "ada@example.org", "age": 36, "createdAt": "2024-01-01"})),
        ("2", json!({"name": "Grace", "email": "grace@example.org", "age": 45, "nickname": "Amazing Grace", "createdAt": "2024-01-02"})),
        ("3", json!({"name": "Linus", "email": "linus@example.org", "createdAt": "2024-01-03"})),
    ];
    let posts = [
        ("1", json!({"title": "Compilers", "authorId": "1", "score": 10, "published": true})),
        ("2", json!({"title": "Borrowing", "authorId": "2", "score": 7, "published": false, "meta": {"tags": ["rust"]}})),
        ("3", json!({"title": "Actors", "authorId": "2", "published": true, "rating": 4.5})),
        ("4", json!({"title": "Kernels", "authorId": "3", "score": 7})),
    ];
    let mut stored = Vec::new();
    for (type_name, rows) in [(&user, &users[..]), (&post, &posts[..])] {
        for (local_id, fields) in rows {
            let fields = fields.as_object().cloned().unwrap_or_default();
            stored.push(store.insert(Record::new(type_name.clone(), *local_id, fields))?);
        }
    }
    Ok(stored)
}
