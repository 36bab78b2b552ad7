// SPDX-License-Identifier: Apache-2.0

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use graft_core::ErrorCode;
use graft_model::{OrderKey, SortOrder};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;
const CURSOR_VERSION_V1: &str = "v1";
pub const MAX_CURSOR_TOKEN_LEN: usize = 1024;
const MAX_CURSOR_PAYLOAD_PART_LEN: usize = 900;
const MAX_CURSOR_SIG_PART_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CursorErrorCode {
    InvalidFormat,
    UnsupportedVersion,
    InvalidSignature,
    InvalidPayload,
    OrderMismatch,
    InvalidSecret,
}

impl CursorErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::UnsupportedVersion => "unsupported_version",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidPayload => "invalid_payload",
            Self::OrderMismatch => "order_mismatch",
            Self::InvalidSecret => "invalid_secret",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorError {
    pub code: CursorErrorCode,
    pub message: String,
}

impl CursorError {
    #[must_use]
    pub fn new(code: CursorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self.code {
            CursorErrorCode::InvalidSecret => ErrorCode::Internal,
            _ => ErrorCode::InvalidCursor,
        }
    }
}

impl std::fmt::Display for CursorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for CursorError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct CursorPayload {
    ord: String,
    key: OrderKey,
}

/// Signs and verifies opaque pagination cursors.
///
/// Token form: `v1.<payload>.<sig>`. The payload carries the order key and the fingerprint of
/// the ordering that produced it; the signature is HMAC-SHA256 over the payload part. Cursors
/// hold no server-side state, so any process sharing the secret can resume a page.
#[derive(Clone)]
pub struct CursorCodec {
    secret: Vec<u8>,
}

impl std::fmt::Debug for CursorCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorCodec")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl CursorCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, CursorError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(CursorError::new(
                CursorErrorCode::InvalidSecret,
                "cursor secret must not be empty",
            ));
        }
        Ok(Self { secret })
    }

    pub fn encode(&self, order: &SortOrder, key: &OrderKey) -> Result<String, CursorError> {
        let payload = CursorPayload {
            ord: order.fingerprint(),
            key: key.clone(),
        };
        let payload_bytes = serde_json::to_vec(&payload)
            .map_err(|e| CursorError::new(CursorErrorCode::InvalidPayload, e.to_string()))?;
        let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);
        if payload_part.len() > MAX_CURSOR_PAYLOAD_PART_LEN {
            return Err(CursorError::new(
                CursorErrorCode::InvalidPayload,
                "order key too large for a cursor",
            ));
        }
        let sig_part = URL_SAFE_NO_PAD.encode(self.sign(payload_part.as_bytes())?);
        Ok(format!("{CURSOR_VERSION_V1}.{payload_part}.{sig_part}"))
    }

    /// Verifies the signature before parsing the payload, then checks the ordering fingerprint.
    pub fn decode(&self, token: &str, order: &SortOrder) -> Result<OrderKey, CursorError> {
        if token.len() > MAX_CURSOR_TOKEN_LEN {
            return Err(CursorError::new(
                CursorErrorCode::InvalidFormat,
                "cursor exceeds max length",
            ));
        }
        let (payload_part, sig_part) = parse_cursor_parts(token)?;
        if payload_part.len() > MAX_CURSOR_PAYLOAD_PART_LEN || sig_part.len() > MAX_CURSOR_SIG_PART_LEN
        {
            return Err(CursorError::new(
                CursorErrorCode::InvalidFormat,
                "cursor part exceeds max length",
            ));
        }

        let expected = URL_SAFE_NO_PAD
            .decode(sig_part)
            .map_err(|e| CursorError::new(CursorErrorCode::InvalidFormat, e.to_string()))?;
        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        mac.verify_slice(&expected).map_err(|_| {
            CursorError::new(
                CursorErrorCode::InvalidSignature,
                "cursor signature mismatch",
            )
        })?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|e| CursorError::new(CursorErrorCode::InvalidFormat, e.to_string()))?;
        let payload: CursorPayload = serde_json::from_slice(&payload_bytes)
            .map_err(|e| CursorError::new(CursorErrorCode::InvalidPayload, e.to_string()))?;

        if payload.ord != order.fingerprint() {
            return Err(CursorError::new(
                CursorErrorCode::OrderMismatch,
                format!(
                    "cursor was issued for a different ordering of `{}`",
                    order.source
                ),
            ));
        }
        Ok(payload.key)
    }

    fn mac(&self) -> Result<HmacSha256, CursorError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| CursorError::new(CursorErrorCode::InvalidSecret, e.to_string()))
    }

    fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, CursorError> {
        let mut mac = self.mac()?;
        mac.update(bytes);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn parse_cursor_parts(token: &str) -> Result<(&str, &str), CursorError> {
    let parts: Vec<&str> = token.split('.').collect();
    match parts.as_slice() {
        [version, payload, sig] if *version == CURSOR_VERSION_V1 => Ok((payload, sig)),
        [version, _, _] => Err(CursorError::new(
            CursorErrorCode::UnsupportedVersion,
            format!("unsupported cursor version: {version}"),
        )),
        _ => Err(CursorError::new(
            CursorErrorCode::InvalidFormat,
            "invalid cursor format",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::{FieldName, TypeName};
    use graft_model::{SortDirection, SortValue};

    fn order() -> SortOrder {
        SortOrder::by_field(
            TypeName::new("User").expect("type"),
            FieldName::new("age").expect("field"),
            SortDirection::Asc,
        )
    }

    #[test]
    fn roundtrip_keeps_key() {
        let codec = CursorCodec::new(b"secret".to_vec()).expect("codec");
        let key = OrderKey::new(SortValue::Int(30), "u7");
        let token = codec.encode(&order(), &key).expect("encode");
        assert!(token.starts_with("v1."));
        assert_eq!(codec.decode(&token, &order()).expect("decode"), key);
    }

    #[test]
    fn other_secret_fails_signature() {
        let a = CursorCodec::new(b"a".to_vec()).expect("codec");
        let b = CursorCodec::new(b"b".to_vec()).expect("codec");
        let token = a
            .encode(&order(), &OrderKey::new(SortValue::Null, "1"))
            .expect("encode");
        let err = b.decode(&token, &order()).expect_err("foreign secret");
        assert_eq!(err.code, CursorErrorCode::InvalidSignature);
        assert_eq!(err.error_code(), ErrorCode::InvalidCursor);
    }

    #[test]
    fn empty_secret_is_rejected() {
        let err = CursorCodec::new(Vec::new()).expect_err("empty");
        assert_eq!(err.code, CursorErrorCode::InvalidSecret);
    }

    #[test]
    fn debug_output_hides_secret() {
        let codec = CursorCodec::new(b"hunter2".to_vec()).expect("codec");
        assert!(!format!("{codec:?}").contains("hunter2"));
    }
}
