//! `actfind` crate (library surface).
//!
//! The primary entrypoint for end users is the `actfind` binary. This facade exists to support
//! embedding and to give callers one stable path to the core types and the local backends
//! without depending on internal crate layout.

pub use actfind_core as core;
pub use actfind_local as local;
