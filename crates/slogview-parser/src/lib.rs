//! # slogview-parser
//!
//! Rebuilds users, sessions, syncs and link loads from a central-model
//! session log.
//!
//! ## Pipeline
//!
//! 1. [`patterns`] holds one text pattern per [`EventKind`].
//! 2. [`Scanner`] runs one full-text pass per kind.
//! 3. [`SessionIndex`] correlates the passes through the session token:
//!    headers, then terminators, then sync markers, then link loads.
//! 4. [`record_projection`] and [`tabular_projection`] flatten the index for
//!    storage and charting.
//!
//! ```rust,ignore
//! use slogview_parser::{read_log, LogEncoding, SessionIndex, tabular_projection};
//!
//! let text = read_log(path, LogEncoding::Auto)?;
//! let index = SessionIndex::build(&text);
//! for row in tabular_projection(&index) {
//!     println!("{} {} -> {}", row.user, row.start, row.end);
//! }
//! ```

pub mod duration;
pub mod error;
pub mod index;
pub mod patterns;
pub mod projection;
pub mod scanner;
pub mod source;
pub mod types;

pub use duration::Elapsed;
pub use error::{ParseError, SourceError, Stage};
pub use index::{BuildOptions, SessionIndex};
pub use patterns::{format_timestamp, parse_timestamp, EventKind};
pub use projection::{
    record_projection, tabular_projection, LinkRecord, SessionRecord, SyncRecord, TimelineRow,
    UserRecords,
};
pub use scanner::{HeaderMatch, LinkLoadMatch, RawMatch, Scanner, SyncMarker, TerminatorMatch};
pub use source::{decode_log, read_log, LogEncoding};
pub use types::{Diagnostic, LinkLoad, Session, SyncEvent, User};

use std::path::Path;

/// Read a log file and build its session index.
pub fn parse_log(
    path: &Path,
    encoding: LogEncoding,
    options: BuildOptions,
) -> Result<SessionIndex, SourceError> {
    let text = read_log(path, encoding)?;
    Ok(SessionIndex::build_with(&text, options))
}
