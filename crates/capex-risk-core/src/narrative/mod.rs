//! Boundary with the external commentary generator.
//!
//! The core never talks to the generator itself. It defines the request
//! payload, the capabilities a caller plugs in (service and cache) and a
//! deterministic local narrative used whenever the service fails.

pub mod fallback;
pub mod payload;
pub mod service;
