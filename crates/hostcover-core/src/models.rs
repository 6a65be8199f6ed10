//! Domain models for host coverage.
//!
//! These are the types shared by the engine and the store crates.

pub mod audit;
pub mod history;
pub mod host;
pub mod notification;
pub mod track;
