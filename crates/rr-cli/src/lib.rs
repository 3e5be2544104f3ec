//! run-remote CLI library
//!
//! Argument handling, environment options, the deployment driver and
//! console output for the `run-remote` binary.

pub mod args;
pub mod commands;
pub mod options;
pub mod output;
