//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration file, fills in
//! defaults for anything the file leaves out, and validates the result
//! before any device is opened.

pub mod config;
