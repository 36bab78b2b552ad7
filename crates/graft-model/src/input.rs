// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One field of an update input.
///
/// In typed input structs, pair it with `#[serde(default, skip_serializing_if =
/// "UpdateValue::is_absent")]`: a missing key deserializes to `Absent`, JSON `null` to `Null`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpdateValue<T = Value> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> UpdateValue<T> {
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub const fn as_ref(&self) -> UpdateValue<&T> {
        match self {
            Self::Absent => UpdateValue::Absent,
            Self::Null => UpdateValue::Null,
            Self::Value(v) => UpdateValue::Value(v),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for UpdateValue<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            None => Self::Null,
            Some(value) => Self::Value(value),
        })
    }
}

impl<T: Serialize> Serialize for UpdateValue<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Absent | Self::Null => serializer.serialize_none(),
            Self::Value(v) => serializer.serialize_some(v),
        }
    }
}

/// Sparse update input keyed by field name. Keys not present are `Absent`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateInput {
    fields: BTreeMap<String, UpdateValue>,
}

impl UpdateInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let fields = object
            .iter()
            .map(|(k, v)| {
                let value = if v.is_null() {
                    UpdateValue::Null
                } else {
                    UpdateValue::Value(v.clone())
                };
                (k.clone(), value)
            })
            .collect();
        Self { fields }
    }

    #[must_use]
    pub fn set(mut self, field: &str, value: Value) -> Self {
        let entry = if value.is_null() {
            UpdateValue::Null
        } else {
            UpdateValue::Value(value)
        };
        self.fields.insert(field.to_string(), entry);
        self
    }

    #[must_use]
    pub fn clear(mut self, field: &str) -> Self {
        self.fields.insert(field.to_string(), UpdateValue::Null);
        self
    }

    #[must_use]
    pub fn get(&self, field: &str) -> UpdateValue<&Value> {
        self.fields
            .get(field)
            .map_or(UpdateValue::Absent, UpdateValue::as_ref)
    }

    /// Explicitly present fields in name order.
    pub fn present(&self) -> impl Iterator<Item = (&str, &UpdateValue)> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_absent())
            .map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }
}

impl<'de> Deserialize<'de> for UpdateInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_json_object(&object))
    }
}

/// Create input: field values keyed by name; an explicit JSON `null` is kept as such.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreateInput {
    fields: Map<String, Value>,
}

impl CreateInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_json_object(object: Map<String, Value>) -> Self {
        Self { fields: object }
    }

    #[must_use]
    pub fn with(mut self, field: &str, value: Value) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}
