//! SurrealDB implementations of the `hostcover-core` collaborator traits.

mod emitter;
mod host;

pub use emitter::SurrealAuditEmitter;
pub use host::SurrealHostStore;
