//! Matching-and-verification engine.
//!
//! Raw inputs flow through normalization and license key resolution, an
//! optional license lookup, synonym/brand expansion, allergy and risk-group
//! matching, and finally the fail-safe verdict.

pub mod engine;
pub mod expand;
pub mod license;
pub mod matcher;
pub mod messages;
pub mod normalize;
pub mod reference;
pub mod types;
pub mod verdict;

pub use engine::{evaluate, AllergyChecker};
pub use reference::{BrandMap, ReferenceData, SynonymMap};
pub use types::*;
