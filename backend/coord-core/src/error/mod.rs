pub mod config;
pub mod serve;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordError {
    #[error(transparent)]
    Serve(#[from] serve::ServeError),

    #[error(transparent)]
    Settings(#[from] config::SettingsError),
}
