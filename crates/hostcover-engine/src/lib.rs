//! Hostcover Engine: approve, reject and delete coverage tracks with
//! tier recomputation, audit and host notification.

pub mod config;
pub mod error;
mod locks;
pub mod payload;
pub mod service;
pub mod transition;

pub use config::EngineConfig;
pub use error::PreconditionError;
pub use service::CoverageService;
pub use transition::TransitionPlan;
