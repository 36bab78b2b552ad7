#![forbid(unsafe_code)]
//! API boundary types of graft: the structured error shape and its HTTP mapping, argument
//! parsing from JSON field arguments, and wire rendering of nodes and connections.

mod dto;
pub mod error_mapping;
mod errors;
mod openapi;
pub mod params;
pub mod wire;

pub use dto::{ApiResponseEnvelope, EntityTypeDto, GraphRequestDto, HealthDto, SchemaDto};
pub use errors::ApiError;
pub use openapi::openapi_v1_spec;
pub use params::{parse_page_args, parse_sort_order};

pub const CRATE_NAME: &str = "graft-api";
