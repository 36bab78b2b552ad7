// SPDX-License-Identifier: Apache-2.0

use graft_core::TypeName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{GlobalId, Patch, ValidationError};

/// A stored entity: its type, its raw local id and its field values.
///
/// The store keeps the local id; the global id is derived whenever the record crosses the API
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Record {
    pub type_name: TypeName,
    pub local_id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new(type_name: TypeName, local_id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            type_name,
            local_id: local_id.into(),
            fields,
        }
    }

    pub fn global_id(&self) -> Result<GlobalId, ValidationError> {
        GlobalId::new(self.type_name.clone(), self.local_id.clone())
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Applies a validated patch. A patch built for another type is refused.
    pub fn apply(&mut self, patch: &Patch) -> Result<(), ValidationError> {
        if patch.type_name() != &self.type_name {
            return Err(ValidationError(format!(
                "patch for `{}` cannot be applied to a `{}` record",
                patch.type_name(),
                self.type_name
            )));
        }
        patch.apply_to(&mut self.fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{merge_update, EntitySchema, FieldKind, FieldSpec, UpdateInput};
    use graft_core::FieldName;
    use serde_json::json;

    fn post_schema() -> EntitySchema {
        EntitySchema::new(
            TypeName::new("Post").expect("type"),
            vec![
                FieldSpec::required(FieldName::new("title").expect("f"), FieldKind::String),
                FieldSpec::optional(FieldName::new("summary").expect("f"), FieldKind::String),
            ],
        )
        .expect("schema")
    }

    #[test]
    fn apply_sets_and_clears_fields() {
        let mut record = Record::new(
            TypeName::new("Post").expect("type"),
            "7",
            json!({"title": "old", "summary": "s"})
                .as_object()
                .cloned()
                .expect("object"),
        );
        let input = UpdateInput::new().set("title", json!("new")).clear("summary");
        let patch = merge_update(&post_schema(), &input).expect("patch");
        record.apply(&patch).expect("apply");
        assert_eq!(record.field("title"), Some(&json!("new")));
        assert_eq!(record.field("summary"), Some(&Value::Null));
        assert_eq!(record.global_id().expect("id").to_string(), "Post:7");
    }

    #[test]
    fn apply_refuses_patch_of_another_type() {
        let mut record = Record::new(TypeName::new("User").expect("type"), "1", Map::new());
        let patch = merge_update(&post_schema(), &UpdateInput::new()).expect("patch");
        assert!(record.apply(&patch).is_err());
    }
}
