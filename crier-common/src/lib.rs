//! Shared plumbing for the crier workspace.
//!
//! Today this is only the [`observability`] module: a single place where the
//! binary wires up `tracing` so that every crate logs through the same
//! rolling file sink. Kept deliberately small so every other crate can depend
//! on it without pulling anything heavy along.

pub mod observability;

pub use observability::{init_logging, LogConfig, LogFormat};
