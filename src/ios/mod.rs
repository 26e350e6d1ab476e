#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! IOS-style configuration handling: parsing, querying and device
//! identification.

/// Device roles, submitted files and per-device records.
pub mod device;
/// Indentation-driven statement tree.
pub mod parser;
/// Pattern search and child inspection over a parsed tree.
pub mod query;
/// Matching files to device roles.
pub mod resolver;

pub use device::{DeviceRecord, Role, SubmissionFile};
pub use parser::{CommentPolicy, ConfigDocument, ParseOptions, Statement, StatementId};
pub use query::{Pattern, QueryError};
pub use resolver::{DeviceMap, DeviceResolver};
