//! Library entrypoint for am32-release-skip.
//!
//! The primary interface is the `release-skip` binary. This lib target exists
//! to expose the pipeline stages to integration tests.

pub mod config;
pub mod output;
pub mod release;
pub mod report;
pub mod skip;
pub mod targets;
