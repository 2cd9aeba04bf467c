//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod clear;
pub mod init;
pub mod lookup;
pub mod query;
pub mod serve;
pub mod state;
pub mod status;
pub mod sync;
pub mod version;
