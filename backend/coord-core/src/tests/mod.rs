mod config;
mod identity;
mod probe;
