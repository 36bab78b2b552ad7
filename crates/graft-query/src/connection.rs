// SPDX-License-Identifier: Apache-2.0

//! Cursor-based connection resolution.
//!
//! Pages are keyset pages: a cursor names the last key a client saw, and the next page starts
//! strictly past it. One extra row is fetched as a sentinel to decide whether another page
//! exists, then dropped.
//!
//! Consistency under concurrent writes is best-effort. No snapshot is held between requests,
//! so a row inserted before the cursor position is never seen by a client already past it, a
//! row deleted ahead of the cursor is simply skipped, and a row whose sort value changes may be
//! seen twice or not at all.

use graft_core::ErrorCode;
use graft_model::SortOrder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    CursorCodec, CursorError, FetchQuery, OrderedSource, PageArgs, PageLimits, PageRequest,
    ScanDirection, SourceError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<N> {
    pub node: N,
    pub cursor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    pub edges: Vec<Edge<N>>,
    pub page_info: PageInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl<N> Connection<N> {
    /// Converts every node, keeping cursors and page info.
    pub fn try_map<M, E>(self, mut f: impl FnMut(N) -> Result<M, E>) -> Result<Connection<M>, E> {
        let edges = self
            .edges
            .into_iter()
            .map(|edge| {
                Ok(Edge {
                    node: f(edge.node)?,
                    cursor: edge.cursor,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Connection {
            edges,
            page_info: self.page_info,
            total_count: self.total_count,
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.edges.iter().map(|e| &e.node)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    InvalidArguments(String),
    PageSizeExceeded { requested: usize, max: usize },
    Cursor(CursorError),
    Source(SourceError),
}

impl ConnectionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArguments(_) => ErrorCode::InvalidArguments,
            Self::PageSizeExceeded { .. } => ErrorCode::PageSizeExceeded,
            Self::Cursor(e) => e.error_code(),
            Self::Source(_) => ErrorCode::Internal,
        }
    }
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArguments(msg) => f.write_str(msg),
            Self::PageSizeExceeded { requested, max } => {
                write!(f, "requested page size {requested} exceeds maximum {max}")
            }
            Self::Cursor(e) => write!(f, "invalid cursor: {e}"),
            Self::Source(e) => write!(f, "source failure: {e}"),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cursor(e) => Some(e),
            Self::Source(e) => Some(e),
            Self::InvalidArguments(_) | Self::PageSizeExceeded { .. } => None,
        }
    }
}

impl From<CursorError> for ConnectionError {
    fn from(value: CursorError) -> Self {
        Self::Cursor(value)
    }
}

impl From<SourceError> for ConnectionError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

/// Stateless connection resolver. Safe to share across requests.
#[derive(Debug, Clone)]
pub struct ConnectionResolver {
    cursors: CursorCodec,
    limits: PageLimits,
    include_total_count: bool,
}

impl ConnectionResolver {
    #[must_use]
    pub fn new(cursors: CursorCodec, limits: PageLimits) -> Self {
        Self {
            cursors,
            limits,
            include_total_count: false,
        }
    }

    #[must_use]
    pub fn with_total_count(mut self, enabled: bool) -> Self {
        self.include_total_count = enabled;
        self
    }

    #[must_use]
    pub fn limits(&self) -> &PageLimits {
        &self.limits
    }

    #[must_use]
    pub fn cursors(&self) -> &CursorCodec {
        &self.cursors
    }

    pub fn resolve<S>(
        &self,
        source: &S,
        order: &SortOrder,
        args: &PageArgs,
    ) -> Result<Connection<S::Node>, ConnectionError>
    where
        S: OrderedSource + ?Sized,
    {
        let request = args.resolve(&self.limits)?;
        self.resolve_request(source, order, &request)
    }

    /// Resolves an already validated request. Edges are always in `order`, also for backward
    /// pages, which are fetched reversed and flipped back.
    ///
    /// Forward pages report `has_previous_page = false` and backward pages report
    /// `has_next_page = false`; only the sentinel side is computed.
    pub fn resolve_request<S>(
        &self,
        source: &S,
        order: &SortOrder,
        request: &PageRequest,
    ) -> Result<Connection<S::Node>, ConnectionError>
    where
        S: OrderedSource + ?Sized,
    {
        let boundary = request
            .cursor()
            .map(|token| self.cursors.decode(token, order))
            .transpose()?;
        let size = request.size();
        let backward = request.is_backward();
        let query = FetchQuery {
            order: order.clone(),
            scan: if backward {
                ScanDirection::Reverse
            } else {
                ScanDirection::Forward
            },
            boundary,
            limit: size.saturating_add(1),
        };

        let mut rows = source.fetch_ordered(&query)?;
        let has_more = rows.len() > size;
        if has_more {
            rows.truncate(size);
        }
        if backward {
            rows.reverse();
        }

        let edges = rows
            .into_iter()
            .map(|row| {
                Ok(Edge {
                    cursor: self.cursors.encode(order, &row.key)?,
                    node: row.node,
                })
            })
            .collect::<Result<Vec<_>, CursorError>>()?;

        let page_info = PageInfo {
            has_next_page: !backward && has_more,
            has_previous_page: backward && has_more,
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
        };
        let total_count = if self.include_total_count {
            source.total_count(order)?
        } else {
            None
        };

        debug!(
            source = %order.source,
            ordering = %order.fingerprint(),
            backward,
            size,
            edges = edges.len(),
            has_more,
            "resolved connection page"
        );
        Ok(Connection {
            edges,
            page_info,
            total_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_page_serializes_null_cursors_and_omits_count() {
        let conn: Connection<u8> = Connection {
            edges: Vec::new(),
            page_info: PageInfo::default(),
            total_count: None,
        };
        assert_eq!(
            serde_json::to_value(&conn).expect("json"),
            json!({
                "edges": [],
                "pageInfo": {
                    "hasNextPage": false,
                    "hasPreviousPage": false,
                    "startCursor": null,
                    "endCursor": null
                }
            })
        );
    }

    #[test]
    fn try_map_keeps_cursors() {
        let conn = Connection {
            edges: vec![Edge {
                node: 1_u8,
                cursor: "c".to_string(),
            }],
            page_info: PageInfo::default(),
            total_count: Some(1),
        };
        let mapped: Connection<String> = conn
            .try_map(|n| Ok::<_, ()>(n.to_string()))
            .expect("map");
        assert_eq!(mapped.edges[0].node, "1");
        assert_eq!(mapped.edges[0].cursor, "c");
        assert_eq!(mapped.total_count, Some(1));
    }
}
