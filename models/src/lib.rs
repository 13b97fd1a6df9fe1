//! Domain models for Harbormaster.
//!
//! This crate contains pure data structures representing the core
//! concepts in server coordination. Models have no business logic - they're
//! just data that can be passed between layers and across the wire.
//!
//! ## Architecture
//!
//! - **models** (this crate): Pure data structures
//! - **coord-core**: Business logic operating on models
//! - **harbormaster**: Application wiring everything together
//!
//! This layered architecture keeps concerns separated and makes testing easier.

pub mod app_signature;
pub mod error;
pub mod lock_record;
pub mod scope;
pub mod server_handle;
pub mod server_identity;

pub use app_signature::AppSignature;
pub use error::model_error::ModelError;
pub use lock_record::LockRecord;
pub use scope::CoordinationScope;
pub use server_handle::ServerHandle;
pub use server_handle::builder::ServerHandleBuilder;
pub use server_identity::ServerIdentity;

#[cfg(test)]
mod tests;
