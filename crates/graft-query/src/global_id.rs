// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use graft_core::{sha256, ErrorCode, TypeName, GLOBAL_ID_DELIMITER};
use graft_model::{GlobalId, LOCAL_ID_MAX_LEN};

const CHECKSUM_LEN: usize = 4;
pub const MAX_GLOBAL_ID_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdErrorCode {
    TooLong,
    InvalidAlphabet,
    Truncated,
    ChecksumMismatch,
    NotUtf8,
    MissingDelimiter,
    InvalidTypeName,
    InvalidLocalId,
    UnknownType,
}

impl IdErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TooLong => "too_long",
            Self::InvalidAlphabet => "invalid_alphabet",
            Self::Truncated => "truncated",
            Self::ChecksumMismatch => "checksum_mismatch",
            Self::NotUtf8 => "not_utf8",
            Self::MissingDelimiter => "missing_delimiter",
            Self::InvalidTypeName => "invalid_type_name",
            Self::InvalidLocalId => "invalid_local_id",
            Self::UnknownType => "unknown_type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdError {
    pub code: IdErrorCode,
    pub message: String,
}

impl IdError {
    #[must_use]
    pub fn new(code: IdErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Every identifier failure surfaces as `InvalidIdentifier`; `code` only refines the reason.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        ErrorCode::InvalidIdentifier
    }
}

impl std::fmt::Display for IdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for IdError {}

/// Encodes and decodes opaque global identifiers.
///
/// Wire form: URL-safe base64 without padding over `checksum(4) ++ "Type:localId"`, where the
/// checksum is the first four bytes of the SHA-256 of the text part. Decoding only accepts
/// types the codec was built with.
#[derive(Debug, Clone, Default)]
pub struct IdCodec {
    known_types: BTreeSet<TypeName>,
}

impl IdCodec {
    #[must_use]
    pub fn new(known_types: impl IntoIterator<Item = TypeName>) -> Self {
        Self {
            known_types: known_types.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn is_known(&self, type_name: &TypeName) -> bool {
        self.known_types.contains(type_name)
    }

    pub fn known_types(&self) -> impl Iterator<Item = &TypeName> {
        self.known_types.iter()
    }

    pub fn encode(&self, id: &GlobalId) -> Result<String, IdError> {
        if !self.is_known(id.type_name()) {
            return Err(IdError::new(
                IdErrorCode::UnknownType,
                format!("type `{}` is not a known type", id.type_name()),
            ));
        }
        Ok(encode_unchecked(id))
    }

    /// Validates raw parts and encodes them.
    pub fn encode_parts(&self, type_name: &str, local_id: &str) -> Result<String, IdError> {
        let type_name = TypeName::new(type_name)
            .map_err(|e| IdError::new(IdErrorCode::InvalidTypeName, e.to_string()))?;
        let id = GlobalId::new(type_name, local_id)
            .map_err(|e| IdError::new(IdErrorCode::InvalidLocalId, e.to_string()))?;
        self.encode(&id)
    }

    pub fn decode(&self, opaque: &str) -> Result<GlobalId, IdError> {
        let id = decode_unchecked(opaque)?;
        if !self.is_known(id.type_name()) {
            return Err(IdError::new(
                IdErrorCode::UnknownType,
                format!("type `{}` is not a known type", id.type_name()),
            ));
        }
        Ok(id)
    }

    /// Decodes and requires a specific type, as node lookups scoped to one type do.
    pub fn decode_as(&self, opaque: &str, expected: &TypeName) -> Result<GlobalId, IdError> {
        let id = self.decode(opaque)?;
        if id.type_name() != expected {
            return Err(IdError::new(
                IdErrorCode::UnknownType,
                format!("expected a `{expected}` identifier, got `{}`", id.type_name()),
            ));
        }
        Ok(id)
    }
}

/// Encodes without checking the type against a registry.
#[must_use]
pub fn encode_unchecked(id: &GlobalId) -> String {
    let text = id.to_string();
    let digest = sha256(text.as_bytes());
    let mut raw = Vec::with_capacity(CHECKSUM_LEN + text.len());
    raw.extend_from_slice(digest.prefix(CHECKSUM_LEN));
    raw.extend_from_slice(text.as_bytes());
    URL_SAFE_NO_PAD.encode(raw)
}

/// Decodes and verifies structure and checksum, without checking the type against a registry.
pub fn decode_unchecked(opaque: &str) -> Result<GlobalId, IdError> {
    if opaque.len() > MAX_GLOBAL_ID_LEN {
        return Err(IdError::new(
            IdErrorCode::TooLong,
            format!("identifier exceeds max length {MAX_GLOBAL_ID_LEN}"),
        ));
    }
    if let Some(bad) = opaque
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(IdError::new(
            IdErrorCode::InvalidAlphabet,
            format!("character {bad:?} is outside the url-safe alphabet"),
        ));
    }
    let raw = URL_SAFE_NO_PAD
        .decode(opaque)
        .map_err(|e| IdError::new(IdErrorCode::Truncated, e.to_string()))?;
    if raw.len() <= CHECKSUM_LEN {
        return Err(IdError::new(IdErrorCode::Truncated, "identifier is too short"));
    }
    let (checksum, text) = raw.split_at(CHECKSUM_LEN);
    if sha256(text).prefix(CHECKSUM_LEN) != checksum {
        return Err(IdError::new(
            IdErrorCode::ChecksumMismatch,
            "identifier checksum mismatch",
        ));
    }
    let text = std::str::from_utf8(text)
        .map_err(|e| IdError::new(IdErrorCode::NotUtf8, e.to_string()))?;
    let Some((type_part, local_part)) = text.split_once(GLOBAL_ID_DELIMITER) else {
        return Err(IdError::new(
            IdErrorCode::MissingDelimiter,
            format!("identifier has no `{GLOBAL_ID_DELIMITER}` delimiter"),
        ));
    };
    let type_name = TypeName::new(type_part)
        .map_err(|e| IdError::new(IdErrorCode::InvalidTypeName, e.to_string()))?;
    if local_part.len() > LOCAL_ID_MAX_LEN {
        return Err(IdError::new(
            IdErrorCode::InvalidLocalId,
            format!("local id exceeds max length {LOCAL_ID_MAX_LEN}"),
        ));
    }
    GlobalId::new(type_name, local_part)
        .map_err(|e| IdError::new(IdErrorCode::InvalidLocalId, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IdCodec {
        IdCodec::new([
            TypeName::new("User").expect("type"),
            TypeName::new("Post").expect("type"),
        ])
    }

    #[test]
    fn known_value_is_stable() {
        let encoded = codec().encode_parts("User", "42").expect("encode");
        assert_eq!(encoded, "kz45VFVzZXI6NDI");
        let decoded = codec().decode(&encoded).expect("decode");
        assert_eq!(decoded.type_name().as_str(), "User");
        assert_eq!(decoded.local_id(), "42");
    }

    #[test]
    fn only_first_delimiter_splits() {
        let encoded = codec().encode_parts("Post", "a:b:c").expect("encode");
        let decoded = codec().decode(&encoded).expect("decode");
        assert_eq!(decoded.local_id(), "a:b:c");
    }

    #[test]
    fn unknown_type_is_rejected_both_ways() {
        let id = GlobalId::parse_parts("Invoice", "1").expect("id");
        let err = codec().encode(&id).expect_err("unknown on encode");
        assert_eq!(err.code, IdErrorCode::UnknownType);
        let err = codec().decode(&encode_unchecked(&id)).expect_err("unknown on decode");
        assert_eq!(err.code, IdErrorCode::UnknownType);
    }

    #[test]
    fn missing_delimiter_is_reported_after_checksum() {
        let text = b"User42";
        let mut raw = sha256(text).prefix(CHECKSUM_LEN).to_vec();
        raw.extend_from_slice(text);
        let err = decode_unchecked(&URL_SAFE_NO_PAD.encode(raw)).expect_err("no delimiter");
        assert_eq!(err.code, IdErrorCode::MissingDelimiter);
    }

    #[test]
    fn decode_as_requires_expected_type() {
        let encoded = codec().encode_parts("User", "1").expect("encode");
        let post = TypeName::new("Post").expect("type");
        assert!(codec().decode_as(&encoded, &post).is_err());
        let user = TypeName::new("User").expect("type");
        assert!(codec().decode_as(&encoded, &user).is_ok());
    }
}
