mod orchestrator;
mod probe;
mod server;
