// Everything the binary uses lives here so integration tests can reach it

pub mod error;
pub mod logger;
pub mod routes;

#[cfg(test)]
mod tests;
