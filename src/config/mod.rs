//! Configuration module for the content validation gate.
//!
//! This module handles loading the TOML configuration that maps handlers to
//! input filters and declares input filter specs.

mod config;

pub use config::{Config, RouteValidationConfig, RouteValidationSpec};
