// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Reserved separator between the type tag and the local id inside a global identifier.
pub const GLOBAL_ID_DELIMITER: char = ':';
pub const NAME_MAX_LEN: usize = 64;

/// Schema type name (`User`, `Post`). Follows GraphQL name rules, so it can never contain the
/// global id delimiter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName(String);

/// Schema field name (`email`, `updateUser`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldName(String);

impl TypeName {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_name("type_name", &value)?;
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FieldName {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_name("field_name", &value)?;
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_name(kind: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidIdentifier {
            kind,
            value: value.to_owned(),
            reason: "must not be empty",
        });
    }

    if value.len() > NAME_MAX_LEN {
        return Err(Error::InvalidIdentifier {
            kind,
            value: value.to_owned(),
            reason: "must be at most 64 characters",
        });
    }

    let mut chars = value.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::InvalidIdentifier {
            kind,
            value: value.to_owned(),
            reason: "must match [_A-Za-z][_0-9A-Za-z]*",
        });
    }

    Ok(())
}

macro_rules! impl_name_traits {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self> {
                Self::new(value)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_name_traits!(TypeName);
impl_name_traits!(FieldName);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_rejects_delimiter_and_leading_digit() {
        assert!(TypeName::new("User:Admin").is_err());
        assert!(TypeName::new("9Lives").is_err());
        assert!(TypeName::new("").is_err());
        assert!(TypeName::new("_Internal").is_ok());
    }

    #[test]
    fn field_name_length_is_bounded() {
        assert!(FieldName::new("a".repeat(NAME_MAX_LEN)).is_ok());
        let err = FieldName::new("a".repeat(NAME_MAX_LEN + 1)).expect_err("too long");
        assert!(err.to_string().contains("at most 64"));
    }
}
