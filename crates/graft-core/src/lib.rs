#![forbid(unsafe_code)]
//! Shared primitives for the graft workspace: the error-code taxonomy, validated schema names
//! and canonical hashing.

mod domain;
mod errors;
mod types;

pub use domain::canonical;
pub use domain::{sha256, sha256_hex, Hash256};
pub use errors::{Error, ErrorCode, ExitCode, MachineError, Result, ERROR_CODES};
pub use types::{FieldName, TypeName, GLOBAL_ID_DELIMITER, NAME_MAX_LEN};

pub const CRATE_NAME: &str = "graft-core";

pub const ENV_GRAFT_LOG_JSON: &str = "GRAFT_LOG_JSON";
