// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::sync::Arc;

use graft_api::{parse_sort_order, ApiError};
use graft_core::{canonical, ErrorCode, MachineError};
use graft_query::db::SqliteSource;
use graft_query::{FetchQuery, IdCodec, IdError, ScanDirection};
use graft_server::{build_app_state, MemoryStore, SchemaDeclaration, ServerConfig, StartupError};
use rusqlite::Connection;
use serde_json::{json, Map, Value};

use crate::{CliError, OutputMode};

pub(crate) fn emit_ok(output_mode: OutputMode, payload: Value) -> Result<(), CliError> {
    if output_mode.quiet {
        return Ok(());
    }
    if output_mode.json {
        let bytes =
            canonical::stable_json_bytes(&payload).map_err(|e| CliError::internal(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| CliError::internal(e.to_string()))?;
        println!("{text}");
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).map_err(|e| CliError::internal(e.to_string()))?
        );
    }
    Ok(())
}

fn api_failure(err: &ApiError) -> CliError {
    CliError::validation(MachineError::new(err.code, &err.message))
}

fn load_declaration(path: Option<&Path>) -> Result<SchemaDeclaration, CliError> {
    match path {
        Some(path) => SchemaDeclaration::from_path(path),
        None => SchemaDeclaration::demo(),
    }
    .map_err(|e| CliError::validation(MachineError::new(ErrorCode::InvalidArguments, &e.to_string())))
}

fn id_failure(err: &IdError) -> CliError {
    CliError::validation(
        MachineError::new(err.error_code(), &err.to_string()).with_detail("reason", err.code.as_str()),
    )
}

fn declared_ids(path: Option<&Path>) -> Result<IdCodec, CliError> {
    let declaration = load_declaration(path)?;
    Ok(IdCodec::new(declaration.type_names().cloned()))
}

pub(crate) fn run_id_encode(
    type_name: &str,
    local_id: &str,
    declaration: Option<&Path>,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let ids = declared_ids(declaration)?;
    let opaque = ids
        .encode_parts(type_name, local_id)
        .map_err(|e| id_failure(&e))?;
    if output_mode.json {
        emit_ok(
            output_mode,
            json!({"command": "id encode", "id": opaque, "type_name": type_name, "local_id": local_id}),
        )
    } else {
        if !output_mode.quiet {
            println!("{opaque}");
        }
        Ok(())
    }
}

pub(crate) fn run_id_decode(
    opaque: &str,
    declaration: Option<&Path>,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let ids = declared_ids(declaration)?;
    let id = ids.decode(opaque).map_err(|e| id_failure(&e))?;
    emit_ok(
        output_mode,
        json!({"command": "id decode", "type_name": id.type_name(), "local_id": id.local_id()}),
    )
}

pub(crate) fn run_registry_check(
    declaration: Option<&Path>,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let declaration = load_declaration(declaration)?;
    match build_app_state(
        &ServerConfig::default(),
        &declaration,
        Arc::new(MemoryStore::new()),
    ) {
        Ok(state) => {
            let coordinates: Vec<String> =
                state.registry.coordinates().map(ToString::to_string).collect();
            emit_ok(
                output_mode,
                json!({
                    "command": "registry check",
                    "status": "ok",
                    "types": declaration.types.len(),
                    "fields": coordinates,
                }),
            )
        }
        Err(StartupError::Registry(report)) => {
            let code = report
                .violations
                .first()
                .map_or(ErrorCode::Internal, |v| v.code());
            let listed: Vec<String> = report.violations.iter().map(ToString::to_string).collect();
            Err(CliError::validation(
                MachineError::new(code, "registry declaration is inconsistent")
                    .with_detail("violations", &listed.join("; "))
                    .with_detail("count", &report.violations.len().to_string()),
            ))
        }
        Err(other) => Err(CliError::internal(other.to_string())),
    }
}

pub(crate) struct ExplainListArgs {
    pub(crate) type_name: String,
    pub(crate) sort_by: Option<String>,
    pub(crate) direction: &'static str,
    pub(crate) backward: bool,
    pub(crate) limit: usize,
    pub(crate) declaration: Option<PathBuf>,
}

pub(crate) fn run_explain_list(
    args: &ExplainListArgs,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let declaration = load_declaration(args.declaration.as_deref())?;
    let schema = declaration
        .types
        .iter()
        .find(|s| s.type_name().as_str() == args.type_name)
        .ok_or_else(|| {
            CliError::validation(
                MachineError::new(ErrorCode::InvalidArguments, "type is not declared")
                    .with_detail("type", &args.type_name),
            )
        })?;

    let mut sort_args = Map::new();
    if let Some(field) = &args.sort_by {
        sort_args.insert("sortBy".to_string(), Value::String(field.clone()));
    }
    sort_args.insert(
        "direction".to_string(),
        Value::String(args.direction.to_string()),
    );
    let order = parse_sort_order(&sort_args, schema).map_err(|e| api_failure(&e))?;

    let conn = Connection::open_in_memory().map_err(|e| CliError::internal(e.to_string()))?;
    SqliteSource::create_table(&conn, schema).map_err(|e| CliError::internal(e.to_string()))?;
    let source = SqliteSource::new(&conn, schema);
    let query = FetchQuery {
        order,
        scan: if args.backward {
            ScanDirection::Reverse
        } else {
            ScanDirection::Forward
        },
        boundary: None,
        limit: args.limit.saturating_add(1),
    };
    let plan = source
        .explain_query_plan(&query)
        .map_err(|e| CliError::internal(e.to_string()))?;
    emit_ok(
        output_mode,
        json!({
            "command": "explain-list",
            "type": schema.type_name(),
            "ordering": query.order.fingerprint(),
            "plan": plan,
        }),
    )
}
