pub mod config;
pub mod license_db; // License → actives table: sources, cache, CSV builder
pub mod logging;
pub mod matching; // Normalize, expand, match, verdict
pub mod models;

pub use license_db::{LicenseTableCache, TableStatus, WaitPolicy};
pub use matching::{evaluate, AllergyChecker, CheckError, Evaluation, ReferenceData, Verdict};
pub use models::AllergyEntry;
