#![forbid(unsafe_code)]
//! Data model of the graft API layer: global identifiers, ordering keys, entity field metadata,
//! mutation inputs and the validated patches produced from them.

mod error;
mod global_id;
mod input;
mod merge;
mod order;
mod patch;
mod record;
mod schema;

pub use error::ValidationError;
pub use global_id::{GlobalId, LOCAL_ID_MAX_LEN};
pub use input::{CreateInput, UpdateInput, UpdateValue};
pub use merge::{merge_update, validate_create, FieldViolation, MergeError, ViolationKind};
pub use order::{OrderKey, SortDirection, SortOrder, SortValue};
pub use patch::{Patch, PatchOp};
pub use record::Record;
pub use schema::{EntitySchema, FieldKind, FieldSpec, ID_FIELD};

pub const CRATE_NAME: &str = "graft-model";
