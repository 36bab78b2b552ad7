// SPDX-License-Identifier: Apache-2.0

use std::cmp::Ordering;

use graft_core::{canonical, FieldName, TypeName};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ValidationError;

/// A sortable scalar. Variant order defines cross-type order: `Null < Bool < Int < Text`.
///
/// Floats are not sortable keys; order by an integer or text representation instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SortValue {
    /// Converts a JSON field value. Returns `None` for floats, arrays and objects.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Position of a node inside an ordered sequence: the primary sort value, then the node's
/// unique local id so that duplicates in the primary column still give a total order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderKey {
    #[serde(rename = "p")]
    pub primary: SortValue,
    #[serde(rename = "t")]
    pub tiebreak: String,
}

impl OrderKey {
    #[must_use]
    pub fn new(primary: SortValue, tiebreak: impl Into<String>) -> Self {
        Self {
            primary,
            tiebreak: tiebreak.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Ordering definition of a paginated list: which type, which field, which direction.
///
/// The tiebreak always follows the primary direction. `sort_field = None` orders by local id
/// alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortOrder {
    pub source: TypeName,
    pub sort_field: Option<FieldName>,
    pub direction: SortDirection,
}

impl SortOrder {
    #[must_use]
    pub fn by_id(source: TypeName) -> Self {
        Self {
            source,
            sort_field: None,
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn by_field(source: TypeName, field: FieldName, direction: SortDirection) -> Self {
        Self {
            source,
            sort_field: Some(field),
            direction,
        }
    }

    #[must_use]
    pub fn compare(&self, a: &OrderKey, b: &OrderKey) -> Ordering {
        let natural = a.cmp(b);
        match self.direction {
            SortDirection::Asc => natural,
            SortDirection::Desc => natural.reverse(),
        }
    }

    /// Builds the order key of a record from its local id and field map.
    pub fn key_for(
        &self,
        local_id: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<OrderKey, ValidationError> {
        let primary = match &self.sort_field {
            None => SortValue::Null,
            Some(field) => {
                let raw = fields.get(field.as_str()).unwrap_or(&Value::Null);
                SortValue::from_json(raw).ok_or_else(|| {
                    ValidationError(format!("field `{field}` holds a value that is not sortable"))
                })?
            }
        };
        Ok(OrderKey::new(primary, local_id))
    }

    /// Short stable digest of this ordering. Cursors carry it so that a cursor issued under
    /// one ordering is rejected under another.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        match canonical::fingerprint(self, 8) {
            Ok(hex) => hex,
            // Serializing this struct cannot fail; fall back to the readable form anyway.
            Err(_) => format!(
                "{}.{}.{}",
                self.source,
                self.sort_field.as_ref().map_or("id", FieldName::as_str),
                self.direction.as_str()
            ),
        }
    }
}
