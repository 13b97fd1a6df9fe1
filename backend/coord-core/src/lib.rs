pub mod config;
pub mod error;
pub mod identity;
pub mod lockstore;
pub mod orchestrator;
pub mod probe;
pub mod server;

#[cfg(test)]
mod tests;

pub const APP_NAME: &str = "harbormaster";
pub const API_SERVER_HOSTNAME: &str = "127.0.0.1";
pub const API_SERVER_BASE_URL: &str = const_format::concatcp!("http://", API_SERVER_HOSTNAME);
pub const DEFAULT_PREFERRED_PORT: u16 = 4000;
