//! The serving side: application assembly and socket ownership.

pub mod app;
pub mod launcher;

pub use app::{RouteFactory, ServerMeta, build_app};
pub use launcher::{ListeningServer, listen};
