//! License → active-ingredient table: record shapes, sources, the
//! load-once cache, and the CSV builder that produces the table file.

pub mod builder;
pub mod cache;
pub mod source;
pub mod table;

use thiserror::Error;

pub use cache::{LicenseTableCache, TableStatus, WaitPolicy};
pub use source::{FileSource, HttpSource, LicenseSource};
pub use table::{LicenseRecord, LicenseTable, RecordInfo};

#[derive(Error, Debug)]
pub enum LicenseDbError {
    #[error("License table read failed ({0}): {1}")]
    Read(String, String),

    #[error("License table parse failed: {0}")]
    Parse(String),

    #[error("License table request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("License table request returned HTTP {0}")]
    Status(u16),

    #[error("License table build failed: {0}")]
    Build(String),
}
