pub mod allergy;
pub mod allergy_list;
pub mod enums;
pub mod risk_group;

pub use allergy::*;
pub use risk_group::*;
