// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use graft_api::error_mapping::map_error;
use graft_api::{
    openapi_v1_spec, ApiError, ApiResponseEnvelope, EntityTypeDto, GraphRequestDto, HealthDto,
    SchemaDto,
};
use graft_core::ErrorCode;
use serde_json::json;
use tracing::{debug, error};

use crate::auth::Actor;
use crate::registry::{FieldCoordinate, Registry};
use crate::resolvers::GraphServices;

/// Header carrying the caller identity; takes precedence over `actor` in the request body.
pub const ACTOR_HEADER: &str = "x-graft-actor";
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub services: Arc<GraphServices>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/v1/openapi.json", get(openapi_handler))
        .route("/v1/schema", get(schema_handler))
        .route("/v1/graph", post(graph_handler))
        .with_state(state)
}

pub(crate) fn api_error_response(err: ApiError) -> Response {
    let mapping = map_error(&err);
    let status =
        StatusCode::from_u16(mapping.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(code = %err.code, message = %err.message, "request failed");
    }
    (status, Json(err)).into_response()
}

async fn healthz_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthDto {
        status: "ok".to_string(),
        fields: state.registry.len(),
    })
}

async fn openapi_handler() -> impl IntoResponse {
    Json(openapi_v1_spec())
}

async fn schema_handler(State(state): State<AppState>) -> impl IntoResponse {
    let types = state
        .registry
        .entities()
        .map(|schema| EntityTypeDto {
            name: schema.type_name().to_string(),
            fields: schema.fields().cloned().collect(),
        })
        .collect();
    let coordinates = state.registry.coordinates().map(ToString::to_string).collect();
    Json(ApiResponseEnvelope {
        data: SchemaDto { types, coordinates },
    })
}

async fn graph_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    match dispatch_body(&state, &headers, &body) {
        Ok(data) => (StatusCode::OK, Json(ApiResponseEnvelope { data })).into_response(),
        Err(err) => api_error_response(err),
    }
}

fn dispatch_body(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<serde_json::Value, ApiError> {
    if body.len() > MAX_BODY_BYTES {
        return Err(ApiError::new(
            ErrorCode::InvalidArguments,
            "request body too large",
            json!({"max_bytes": MAX_BODY_BYTES}),
        ));
    }
    let request: GraphRequestDto = serde_json::from_slice(body).map_err(|e| {
        ApiError::new(
            ErrorCode::InvalidArguments,
            "malformed graph request",
            json!({"reason": e.to_string()}),
        )
    })?;
    let field = FieldCoordinate::parse(&request.field)
        .map_err(|_| ApiError::invalid_param("field", &request.field))?;
    let actor = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Actor::new)
        .or_else(|| request.actor.as_deref().map(Actor::new))
        .unwrap_or_else(Actor::anonymous);
    debug!(field = %field, actor = %actor, "dispatching graph request");
    state.registry.dispatch(&actor, &field, &request.args)
}
