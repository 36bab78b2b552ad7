// SPDX-License-Identifier: Apache-2.0

use graft_model::{OrderKey, Record, SortDirection, SortOrder};

/// Which way a source walks its ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// In the ordering's own direction.
    Forward,
    /// Against it; used for backward pages.
    Reverse,
}

/// One bounded read from an ordered source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    pub order: SortOrder,
    pub scan: ScanDirection,
    /// Exclusive: only rows strictly past this key, in scan direction, are returned.
    pub boundary: Option<OrderKey>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow<N> {
    pub key: OrderKey,
    pub node: N,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceError {}

/// Data behind a connection field.
///
/// `fetch_ordered` returns at most `query.limit` rows in scan order, every one strictly past
/// `query.boundary`.
pub trait OrderedSource {
    type Node;

    fn fetch_ordered(&self, query: &FetchQuery) -> Result<Vec<SourceRow<Self::Node>>, SourceError>;

    /// Total size of the ordered set, when the source can compute it cheaply.
    fn total_count(&self, order: &SortOrder) -> Result<Option<u64>, SourceError> {
        let _ = order;
        Ok(None)
    }
}

/// Keys every record of `order.source` and sorts them by natural key order.
pub fn keyed_records<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    order: &SortOrder,
) -> Result<Vec<SourceRow<Record>>, SourceError> {
    let mut rows = records
        .into_iter()
        .filter(|record| record.type_name == order.source)
        .map(|record| {
            let key = order
                .key_for(&record.local_id, &record.fields)
                .map_err(|e| SourceError::new(e.to_string()))?;
            Ok(SourceRow {
                key,
                node: record.clone(),
            })
        })
        .collect::<Result<Vec<_>, SourceError>>()?;
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(rows)
}

/// Answers `query` from rows already sorted by natural key order.
#[must_use]
pub fn scan_sorted<N: Clone>(rows: &[SourceRow<N>], query: &FetchQuery) -> Vec<SourceRow<N>> {
    let ascending = matches!(
        (query.order.direction, query.scan),
        (SortDirection::Asc, ScanDirection::Forward) | (SortDirection::Desc, ScanDirection::Reverse)
    );
    if ascending {
        let start = query
            .boundary
            .as_ref()
            .map_or(0, |b| rows.partition_point(|r| r.key <= *b));
        rows[start..].iter().take(query.limit).cloned().collect()
    } else {
        let end = query
            .boundary
            .as_ref()
            .map_or(rows.len(), |b| rows.partition_point(|r| r.key < *b));
        rows[..end].iter().rev().take(query.limit).cloned().collect()
    }
}

/// In-memory source over a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<Record>,
}

impl MemorySource {
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn remove(&mut self, local_id: &str) -> Option<Record> {
        let idx = self.records.iter().position(|r| r.local_id == local_id)?;
        Some(self.records.remove(idx))
    }
}

impl OrderedSource for MemorySource {
    type Node = Record;

    fn fetch_ordered(&self, query: &FetchQuery) -> Result<Vec<SourceRow<Record>>, SourceError> {
        let rows = keyed_records(&self.records, &query.order)?;
        Ok(scan_sorted(&rows, query))
    }

    fn total_count(&self, order: &SortOrder) -> Result<Option<u64>, SourceError> {
        let n = self
            .records
            .iter()
            .filter(|r| r.type_name == order.source)
            .count();
        Ok(Some(n as u64))
    }
}
