//! Migrates map applications and layers from a legacy installation into the current schema.
//!
//! The [transform] module holds the pure conversion of single documents, [migrate] drives a run
//! against the source and target [client::HostApi]s.

pub mod client;
pub mod conf;
pub mod error;
pub mod migrate;
pub mod model;
pub mod postprocess;
pub mod transform;
