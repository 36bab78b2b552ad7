// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use graft_core::TypeName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum PatchOp {
    Set(Value),
    Clear,
}

/// Validated field changes for one entity. Produced only by the merge and create validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patch {
    type_name: TypeName,
    ops: BTreeMap<String, PatchOp>,
}

impl Patch {
    pub(crate) fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            ops: BTreeMap::new(),
        }
    }

    pub(crate) fn push(&mut self, field: &str, op: PatchOp) {
        self.ops.insert(field.to_string(), op);
    }

    #[must_use]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&PatchOp> {
        self.ops.get(field)
    }

    #[must_use]
    pub fn is_cleared(&self, field: &str) -> bool {
        matches!(self.ops.get(field), Some(PatchOp::Clear))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatchOp)> {
        self.ops.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Writes the changes into a record's field map. Cleared fields are stored as `null`.
    pub fn apply_to(&self, record: &mut Map<String, Value>) {
        for (field, op) in &self.ops {
            let value = match op {
                PatchOp::Set(v) => v.clone(),
                PatchOp::Clear => Value::Null,
            };
            record.insert(field.clone(), value);
        }
    }
}
