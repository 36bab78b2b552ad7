use std::fmt::{self, Write as _};

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::Result;

/// SHA-256 digest. Identifier checksums use a prefix of it; ordering fingerprints use its hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Leading `n` bytes, clamped to the digest length.
    #[must_use]
    pub fn prefix(&self, n: usize) -> &[u8] {
        &self.0[..n.min(self.0.len())]
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        hex(&self.0)
    }

    /// Lowercase hex of the leading `n` bytes.
    #[must_use]
    pub fn short_hex(self, n: usize) -> String {
        hex(self.prefix(n))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
}

#[must_use]
pub fn sha256(bytes: &[u8]) -> Hash256 {
    let mut out = [0_u8; 32];
    out.copy_from_slice(&Sha256::digest(bytes));
    Hash256(out)
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    sha256(bytes).to_hex()
}

/// JSON bytes with object keys sorted at every depth, independent of how the map was built.
pub fn stable_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut tree = serde_json::to_value(value)?;
    sort_keys(&mut tree);
    Ok(serde_json::to_vec(&tree)?)
}

pub fn stable_json_hash<T: Serialize>(value: &T) -> Result<Hash256> {
    Ok(sha256(&stable_json_bytes(value)?))
}

/// Short fingerprint of a value's canonical form: `bytes` leading digest bytes as hex.
pub fn fingerprint<T: Serialize>(value: &T, bytes: usize) -> Result<String> {
    Ok(stable_json_hash(value)?.short_hex(bytes))
}

fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, mut child) in entries {
                sort_keys(&mut child);
                map.insert(key, child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}
