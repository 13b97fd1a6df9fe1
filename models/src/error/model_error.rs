use common::ErrorLocation;

use thiserror::Error;

/// Validation failures raised while assembling or parsing model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Required Field Error: {field} {location}")]
    MissingField {
        field: &'static str,
        location: ErrorLocation,
    },

    #[error("Invalid Value Error: {what}: {reason} {location}")]
    InvalidValue {
        what: &'static str,
        reason: String,
        location: ErrorLocation,
    },
}
