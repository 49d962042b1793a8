//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the generator workspace."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Configuration loading and logging setup shared by the glass-line profile
//! generator binaries.

pub mod config;
pub mod logging;

pub use config::{AppConfig, GenerationConfig, LoggingConfig, MachineConfig, OutputConfig};
pub use logging::{init_tracing, LogFormat};
