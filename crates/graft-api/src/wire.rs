// SPDX-License-Identifier: Apache-2.0

use graft_model::Record;
use graft_query::{Connection, IdCodec};
use serde_json::{Map, Value};

use crate::ApiError;

pub const ID_KEY: &str = "id";
pub const TYPENAME_KEY: &str = "__typename";

/// Renders a stored record as an API node: its opaque global id, its type name, then its fields.
/// The raw local id never leaves the server.
pub fn render_record(record: &Record, ids: &IdCodec) -> Result<Value, ApiError> {
    let global_id = record.global_id()?;
    let mut out = Map::with_capacity(record.fields.len() + 2);
    out.insert(ID_KEY.to_string(), Value::String(ids.encode(&global_id)?));
    out.insert(
        TYPENAME_KEY.to_string(),
        Value::String(record.type_name.to_string()),
    );
    for (name, value) in &record.fields {
        out.insert(name.clone(), value.clone());
    }
    Ok(Value::Object(out))
}

pub fn render_connection(page: Connection<Record>, ids: &IdCodec) -> Result<Value, ApiError> {
    let rendered = page.try_map(|record| render_record(&record, ids))?;
    serde_json::to_value(rendered).map_err(|e| ApiError::internal(e.to_string()))
}
