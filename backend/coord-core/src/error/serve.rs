use common::ErrorLocation;

use models::ModelError;

use std::error::Error as StdError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ServeError {
    /// The address was claimed by someone else between probing and binding.
    /// Recoverable: the orchestrator runs conflict recovery on this one.
    #[error("Port Conflict Error: {message} {location}")]
    PortConflict {
        message: String,
        location: ErrorLocation,
    },

    /// Bind failed for a reason that is not a conflict. Fatal.
    #[error("Bind Error: {message} {location}")]
    Bind {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Conflict recovery ran out of options. Fatal.
    #[error("Conflict Recovery Exhausted: {message} {location}")]
    Exhausted {
        message: String,
        location: ErrorLocation,
    },

    #[error("Handle Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ModelError> for ServeError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        ServeError::Validation {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
