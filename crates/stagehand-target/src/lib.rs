//! Target descriptor resolution and staging plan parsing for Stagehand.
//!
//! This crate defines the key every staged artifact is filed under: the
//! `(architecture, operating system, configuration)` triple held by
//! `TargetDescriptor`. The configuration part is a `ConfigurationExpr` so that
//! multi-configuration generators can defer it until install time. It also
//! parses the optional TOML staging plan (`StagingPlan`) that lists build units
//! and overrides the built-in defaults.

pub mod configuration;
pub mod descriptor;
pub mod os;
pub mod plan;

pub use configuration::{ConfigurationExpr, DEFAULT_CONFIGURATION};
pub use descriptor::{validate_component, ResolverInput, TargetDescriptor};
pub use os::{HostFamily, OperatingSystem, PlatformFlags};
pub use plan::{
    parse_plan_file, parse_plan_str, ClassifySection, InstallSection, PoolsSection, StagingPlan,
    TargetSection, UnitEntry, DEFAULT_MARKER, DEFAULT_MAX_ASCENT,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("failed to read plan file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse plan: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported plan_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("unknown operating system: '{0}' (expected windows, darwin, linux, qnx or unknown)")]
    UnknownOs(String),
    #[error("architecture must not be empty")]
    EmptyArchitecture,
    #[error("invalid {what} '{value}': must be a single path component")]
    InvalidComponent { what: &'static str, value: String },
    #[error("unit entry #{0} has an empty source_dir or output_dir")]
    EmptyUnitPath(usize),
}
