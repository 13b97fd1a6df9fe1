//! Shared building blocks for Harbormaster.
//!
//! This crate holds the small types every other layer leans on: error
//! source locations and HTTP status categorization. Nothing in here
//! performs I/O or holds state.
//!
//! ## Architecture
//!
//! - **common** (this crate): Leaf utilities with no dependencies on the rest
//!   of the workspace
//! - **models**: Pure data structures for coordination state
//! - **coord-core**: Business logic operating on models
//! - **harbormaster**: Application wiring everything together

pub mod error;
pub mod http_status;

pub use error::error_location::ErrorLocation;
pub use http_status::HttpStatusCode;
