//! Hostcover Core: domain models, error taxonomy, the tier resolver and
//! the collaborator traits consumed by the transition engine.

pub mod error;
pub mod models;
pub mod repository;
pub mod tier;

pub use error::{CoverageError, CoverageResult};
pub use tier::{TierAssignment, resolve};
