pub mod canonical;

pub use canonical::{sha256, sha256_hex, Hash256};
