// SPDX-License-Identifier: Apache-2.0

//! SQLite keyset source. One table per entity type, named after the type, with a
//! `local_id TEXT PRIMARY KEY` column and one column per declared field.

use graft_core::TypeName;
use graft_model::{EntitySchema, FieldKind, Record, SortDirection, SortOrder, SortValue};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Number};

use crate::{FetchQuery, OrderedSource, ScanDirection, SourceError, SourceRow};

pub const LOCAL_ID_COLUMN: &str = "local_id";

pub struct SqliteSource<'c> {
    conn: &'c Connection,
    schema: &'c EntitySchema,
}

impl<'c> SqliteSource<'c> {
    #[must_use]
    pub fn new(conn: &'c Connection, schema: &'c EntitySchema) -> Self {
        Self { conn, schema }
    }

    fn type_name(&self) -> &TypeName {
        self.schema.type_name()
    }

    /// Creates the table for `schema` plus a `(field, local_id)` index for every scalar field,
    /// so keyset pages can seek instead of scan.
    pub fn create_table(conn: &Connection, schema: &EntitySchema) -> Result<(), SourceError> {
        let table = schema.type_name().as_str();
        let mut columns = vec![format!("\"{LOCAL_ID_COLUMN}\" TEXT PRIMARY KEY")];
        let mut indexes = Vec::new();
        for spec in schema.fields() {
            let sql_type = match spec.kind {
                FieldKind::Int | FieldKind::Bool => "INTEGER",
                FieldKind::Float => "REAL",
                FieldKind::Id | FieldKind::String | FieldKind::Json => "TEXT",
            };
            columns.push(format!("\"{}\" {sql_type}", spec.name));
            if spec.kind != FieldKind::Json {
                indexes.push(format!(
                    "CREATE INDEX IF NOT EXISTS \"idx_{table}_{field}\" ON \"{table}\"(\"{field}\", \"{LOCAL_ID_COLUMN}\")",
                    field = spec.name
                ));
            }
        }
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" ({});",
            columns.join(", ")
        );
        for index in indexes {
            sql.push_str(&index);
            sql.push(';');
        }
        conn.execute_batch(&sql)
            .map_err(|e| SourceError::new(e.to_string()))
    }

    /// Inserts or replaces a record. Fields the schema does not declare are refused.
    pub fn insert(&self, record: &Record) -> Result<(), SourceError> {
        if record.type_name != *self.type_name() {
            return Err(SourceError::new(format!(
                "`{}` record cannot be stored in the `{}` table",
                record.type_name,
                self.type_name()
            )));
        }
        let mut columns = vec![format!("\"{LOCAL_ID_COLUMN}\"")];
        let mut params = vec![Value::Text(record.local_id.clone())];
        for (name, value) in &record.fields {
            let spec = self.schema.field(name).ok_or_else(|| {
                SourceError::new(format!("field `{name}` is not declared on `{}`", self.type_name()))
            })?;
            columns.push(format!("\"{name}\""));
            params.push(json_to_sql(spec.kind, value));
        }
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO \"{}\" ({}) VALUES ({placeholders})",
            record.type_name,
            columns.join(", ")
        );
        self.conn
            .execute(&sql, params_from_iter(params.iter()))
            .map(|_| ())
            .map_err(|e| SourceError::new(e.to_string()))
    }

    pub fn explain_query_plan(&self, query: &FetchQuery) -> Result<Vec<String>, SourceError> {
        let (sql, params) = self.build_sql(query)?;
        let explain_sql = format!("EXPLAIN QUERY PLAN {sql}");
        let mut stmt = self
            .conn
            .prepare_cached(&explain_sql)
            .map_err(|e| SourceError::new(e.to_string()))?;
        let mut lines = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(3))
            .map_err(|e| SourceError::new(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SourceError::new(e.to_string()))?;
        lines.sort();
        Ok(lines)
    }

    fn build_sql(&self, query: &FetchQuery) -> Result<(String, Vec<Value>), SourceError> {
        if query.order.source != *self.type_name() {
            return Err(SourceError::new(format!(
                "ordering over `{}` cannot be served by the `{}` table",
                query.order.source,
                self.type_name()
            )));
        }
        let ascending = matches!(
            (query.order.direction, query.scan),
            (SortDirection::Asc, ScanDirection::Forward)
                | (SortDirection::Desc, ScanDirection::Reverse)
        );
        let (cmp, dir) = if ascending { (">", "ASC") } else { ("<", "DESC") };
        let id = format!("\"{LOCAL_ID_COLUMN}\"");

        let mut sql = format!("SELECT * FROM \"{}\"", self.type_name());
        let mut params = Vec::new();
        match &query.order.sort_field {
            None => {
                if let Some(boundary) = &query.boundary {
                    sql.push_str(&format!(" WHERE {id} {cmp} ?"));
                    params.push(Value::Text(boundary.tiebreak.clone()));
                }
                sql.push_str(&format!(" ORDER BY {id} {dir}"));
            }
            Some(field) => {
                let f = format!("\"{field}\"");
                if let Some(boundary) = &query.boundary {
                    // NULL sorts lowest, matching SortValue.
                    let clause = match (&boundary.primary, ascending) {
                        (SortValue::Null, true) => {
                            format!("({f} IS NOT NULL OR ({f} IS NULL AND {id} > ?))")
                        }
                        (SortValue::Null, false) => format!("({f} IS NULL AND {id} < ?)"),
                        (primary, true) => {
                            params.push(sort_to_sql(primary));
                            params.push(sort_to_sql(primary));
                            format!("({f} > ? OR ({f} = ? AND {id} > ?))")
                        }
                        (primary, false) => {
                            params.push(sort_to_sql(primary));
                            params.push(sort_to_sql(primary));
                            format!("({f} < ? OR {f} IS NULL OR ({f} = ? AND {id} < ?))")
                        }
                    };
                    params.push(Value::Text(boundary.tiebreak.clone()));
                    sql.push_str(" WHERE ");
                    sql.push_str(&clause);
                }
                sql.push_str(&format!(" ORDER BY {f} {dir}, {id} {dir}"));
            }
        }
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(
            i64::try_from(query.limit).unwrap_or(i64::MAX),
        ));
        Ok((sql, params))
    }
}

impl OrderedSource for SqliteSource<'_> {
    type Node = Record;

    fn fetch_ordered(&self, query: &FetchQuery) -> Result<Vec<SourceRow<Record>>, SourceError> {
        let (sql, params) = self.build_sql(query)?;
        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .map_err(|e| SourceError::new(e.to_string()))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let raw = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut local_id = String::new();
                let mut fields = Map::new();
                for (idx, name) in names.iter().enumerate() {
                    let value = row.get_ref(idx)?;
                    if name == LOCAL_ID_COLUMN {
                        local_id = row.get(idx)?;
                        continue;
                    }
                    let kind = self.schema.field(name).map(|spec| spec.kind);
                    let json = sql_to_json(kind, value).map_err(|reason| {
                        rusqlite::Error::FromSqlConversionFailure(
                            idx,
                            value.data_type(),
                            format!("column `{name}`: {reason}").into(),
                        )
                    })?;
                    fields.insert(name.clone(), json);
                }
                Ok((local_id, fields))
            })
            .map_err(|e| SourceError::new(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SourceError::new(e.to_string()))?;

        raw.into_iter()
            .map(|(local_id, fields)| {
                let key = query
                    .order
                    .key_for(&local_id, &fields)
                    .map_err(|e| SourceError::new(e.to_string()))?;
                Ok(SourceRow {
                    key,
                    node: Record::new(self.type_name().clone(), local_id, fields),
                })
            })
            .collect()
    }

    fn total_count(&self, order: &SortOrder) -> Result<Option<u64>, SourceError> {
        let _ = order;
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", self.type_name());
        let n: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| SourceError::new(e.to_string()))?;
        Ok(Some(u64::try_from(n).unwrap_or(0)))
    }
}

fn sort_to_sql(value: &SortValue) -> Value {
    match value {
        SortValue::Null => Value::Null,
        SortValue::Bool(b) => Value::Integer(i64::from(*b)),
        SortValue::Int(i) => Value::Integer(*i),
        SortValue::Text(s) => Value::Text(s.clone()),
    }
}

/// Json fields are stored as their serialized text; every other kind maps to its SQLite type.
fn json_to_sql(kind: FieldKind, value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        _ if kind == FieldKind::Json => Value::Text(value.to_string()),
        serde_json::Value::Bool(b) => Value::Integer(i64::from(*b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Real))
            .unwrap_or(Value::Null),
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Value::Text(value.to_string()),
    }
}

/// Inverse of `json_to_sql` for a declared column. Undeclared columns decode by storage class.
fn sql_to_json(kind: Option<FieldKind>, value: ValueRef<'_>) -> Result<serde_json::Value, String> {
    let json = match (kind, value) {
        (_, ValueRef::Null) => serde_json::Value::Null,
        (Some(FieldKind::Bool), ValueRef::Integer(i)) => serde_json::Value::Bool(i != 0),
        (Some(FieldKind::Json), ValueRef::Text(bytes)) => {
            serde_json::from_slice(bytes).map_err(|e| e.to_string())?
        }
        (Some(FieldKind::Float), ValueRef::Integer(i)) => Number::from_f64(i as f64)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        (_, ValueRef::Integer(i)) => serde_json::Value::from(i),
        (_, ValueRef::Real(f)) => {
            Number::from_f64(f).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        (_, ValueRef::Text(bytes)) => serde_json::Value::String(
            std::str::from_utf8(bytes)
                .map_err(|e| e.to_string())?
                .to_owned(),
        ),
        (_, ValueRef::Blob(_)) => return Err("blob columns are not supported".to_string()),
    };
    Ok(json)
}
