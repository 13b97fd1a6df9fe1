use common::ErrorLocation;

use coord_core::error::CoordError;
use coord_core::error::config::SettingsError;
use coord_core::error::serve::ServeError;

use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by the harbormaster binary itself.
///
/// Coordination and settings failures bubble up from coord-core; anything
/// the binary trips over on its own (directories, logging, signals) lands
/// in the `Harbor` variant.
#[derive(Debug, Error)]
pub enum HarborError {
    /// Error from this binary's own startup plumbing
    #[error("Harbormaster Error: {message} {location}")]
    Harbor {
        message: String,
        location: ErrorLocation,
    },

    /// Error from coord-core operations (probing, launching, adoption)
    #[error("Coordination Error: {message} {location}")]
    Coordination {
        message: String,
        location: ErrorLocation,
    },

    /// Error loading or validating settings
    #[error("Settings Error: {message} {location}")]
    Settings {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoordError> for HarborError {
    #[track_caller]
    fn from(error: CoordError) -> Self {
        HarborError::Coordination {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ServeError> for HarborError {
    #[track_caller]
    fn from(error: ServeError) -> Self {
        HarborError::Coordination {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<SettingsError> for HarborError {
    #[track_caller]
    fn from(error: SettingsError) -> Self {
        HarborError::Settings {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
