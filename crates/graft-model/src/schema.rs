// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use graft_core::{FieldName, TypeName};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ValidationError;

/// Field name reserved for the store-managed local id.
pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Id,
    String,
    Int,
    Float,
    Bool,
    Json,
}

impl FieldKind {
    /// Whether a concrete (non-null) JSON value is acceptable for this kind.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Id | Self::String => value.is_string(),
            Self::Int => value.is_i64(),
            Self::Float => value.is_number(),
            Self::Bool => value.is_boolean(),
            Self::Json => !value.is_null(),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: FieldName,
    pub kind: FieldKind,
    pub nullable: bool,
    pub updatable: bool,
    pub required_on_create: bool,
}

impl FieldSpec {
    /// Non-null, must be supplied on create, may be changed by updates.
    #[must_use]
    pub fn required(name: FieldName, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            updatable: true,
            required_on_create: true,
        }
    }

    /// Nullable, optional on create, may be changed or cleared by updates.
    #[must_use]
    pub fn optional(name: FieldName, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
            updatable: true,
            required_on_create: false,
        }
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.updatable = false;
        self
    }
}

/// Field metadata of one entity type; the input of every merge and create validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntitySchemaRepr", into = "EntitySchemaRepr")]
pub struct EntitySchema {
    type_name: TypeName,
    fields: BTreeMap<String, FieldSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntitySchemaRepr {
    type_name: TypeName,
    fields: Vec<FieldSpec>,
}

impl EntitySchema {
    pub fn new(type_name: TypeName, fields: Vec<FieldSpec>) -> Result<Self, ValidationError> {
        let mut by_name = BTreeMap::new();
        for spec in fields {
            if spec.name.as_str() == ID_FIELD {
                return Err(ValidationError(format!(
                    "{type_name}: field `{ID_FIELD}` is managed by the store and cannot be declared"
                )));
            }
            let key = spec.name.as_str().to_string();
            if by_name.insert(key.clone(), spec).is_some() {
                return Err(ValidationError(format!(
                    "{type_name}: duplicate field `{key}`"
                )));
            }
        }
        Ok(Self {
            type_name,
            fields: by_name,
        })
    }

    #[must_use]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values().filter(|f| f.required_on_create)
    }
}

impl TryFrom<EntitySchemaRepr> for EntitySchema {
    type Error = ValidationError;

    fn try_from(value: EntitySchemaRepr) -> Result<Self, Self::Error> {
        Self::new(value.type_name, value.fields)
    }
}

impl From<EntitySchema> for EntitySchemaRepr {
    fn from(value: EntitySchema) -> Self {
        Self {
            type_name: value.type_name,
            fields: value.fields.into_values().collect(),
        }
    }
}
