// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

use graft_core::{TypeName, GLOBAL_ID_DELIMITER};
use serde::{Deserialize, Serialize};

use crate::ValidationError;

pub const LOCAL_ID_MAX_LEN: usize = 512;

/// Decoded global object identifier: which type, and which row of that type.
///
/// The local id is opaque to this crate. It may contain the delimiter; only the first
/// delimiter in an encoded identifier separates the two parts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalId {
    type_name: TypeName,
    local_id: String,
}

impl GlobalId {
    pub fn new(type_name: TypeName, local_id: impl Into<String>) -> Result<Self, ValidationError> {
        let local_id = local_id.into();
        if local_id.is_empty() {
            return Err(ValidationError("local id must not be empty".to_string()));
        }
        if local_id.len() > LOCAL_ID_MAX_LEN {
            return Err(ValidationError(format!(
                "local id exceeds max length {LOCAL_ID_MAX_LEN}"
            )));
        }
        Ok(Self {
            type_name,
            local_id,
        })
    }

    /// Validates both parts from raw strings.
    pub fn parse_parts(type_name: &str, local_id: &str) -> Result<Self, ValidationError> {
        Self::new(TypeName::new(type_name)?, local_id)
    }

    #[must_use]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    #[must_use]
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    #[must_use]
    pub fn into_parts(self) -> (TypeName, String) {
        (self.type_name, self.local_id)
    }
}

/// Human-readable `Type:local` form for logs. Not the wire encoding.
impl Display for GlobalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.type_name, GLOBAL_ID_DELIMITER, self.local_id)
    }
}
