#![forbid(unsafe_code)]
//! Wire codecs and pagination for the graft API layer: opaque global identifiers, signed
//! cursors, page arguments and the connection resolver with its source collaborators.

mod connection;
mod cursor;
pub mod db;
mod global_id;
mod limits;
mod page;
mod source;

pub use connection::{Connection, ConnectionError, ConnectionResolver, Edge, PageInfo};
pub use cursor::{CursorCodec, CursorError, CursorErrorCode, MAX_CURSOR_TOKEN_LEN};
pub use db::SqliteSource;
pub use global_id::{
    decode_unchecked, encode_unchecked, IdCodec, IdError, IdErrorCode, MAX_GLOBAL_ID_LEN,
};
pub use limits::{PageLimits, DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE};
pub use page::{PageArgs, PageRequest};
pub use source::{
    keyed_records, scan_sorted, FetchQuery, MemorySource, OrderedSource, ScanDirection,
    SourceError, SourceRow,
};

pub const CRATE_NAME: &str = "graft-query";
