//! # rtprep-records
//!
//! Record model and record files for rtprep.
//!
//! - [`Record`]: an ordered, tag-addressed dataset with nested sequences
//! - [`RecordStore`]: read/write seam, with a JSON document implementation
//! - [`RecordPatterns`]: case-insensitive file-name globs and directory walking

pub mod error;
pub mod record;
pub mod store;
pub mod tag;
pub mod walk;

pub use error::RecordError;
pub use record::{Element, Record, Value, Vr};
pub use store::{JsonRecordStore, RecordStore};
pub use tag::{Tag, tags};
pub use walk::{Depth, RecordKind, RecordPatterns};
