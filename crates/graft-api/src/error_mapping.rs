// SPDX-License-Identifier: Apache-2.0

use graft_core::ErrorCode;

use crate::ApiError;

pub const API_ERROR_SCHEMA_REF: &str = "#/components/schemas/ApiError";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiErrorMapping {
    pub status_code: u16,
    pub schema_ref: &'static str,
}

#[must_use]
pub const fn status_for(code: ErrorCode) -> u16 {
    match code {
        ErrorCode::InvalidIdentifier
        | ErrorCode::InvalidCursor
        | ErrorCode::InvalidArguments
        | ErrorCode::PageSizeExceeded => 400,
        ErrorCode::FieldNotUpdatable
        | ErrorCode::NullNotAllowed
        | ErrorCode::MissingRequiredField
        | ErrorCode::InvalidValue
        | ErrorCode::UnknownField => 422,
        ErrorCode::Unauthorized => 403,
        ErrorCode::NotFound => 404,
        _ => 500,
    }
}

#[must_use]
pub fn map_error(error: &ApiError) -> ApiErrorMapping {
    ApiErrorMapping {
        status_code: status_for(error.code),
        schema_ref: API_ERROR_SCHEMA_REF,
    }
}
