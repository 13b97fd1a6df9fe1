//! Read-only probing of ports and candidate servers.
//!
//! Everything in here observes without mutating: a transient bind to test
//! availability, short-timeout HTTP requests to test liveness and
//! identity. Probes never propagate errors - an unreachable or confusing
//! peer is simply "not alive" / "no identity".

pub mod health;
pub mod port;

pub use health::ProbeClient;
pub use port::{find_free_port, is_port_busy};
