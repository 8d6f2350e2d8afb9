//! Artifact staging pipeline for Stagehand.
//!
//! This crate implements discovery, classification, deduplication and
//! deployment of build outputs into the flat
//! `<prefix>/<architecture>/<os>/<configuration>/` layout. The `Stager` context
//! fixes the target descriptor and install root once and then runs the
//! pipeline for each build unit; many units share one destination directory.

pub mod classify;
pub mod collect;
pub mod dedup;
pub mod deploy;
pub mod root;
pub mod stager;

pub use classify::{ArtifactKind, Classification, Classifier, Exclusion};
pub use collect::{collect_candidates, Candidate, InstallManifest, Provenance, UnitPaths};
pub use dedup::dedup;
pub use deploy::{Deployer, FileFailure, InstalledFile, StageReport};
pub use root::resolve_install_root;
pub use stager::{AnnounceGuard, Stager, StagerOptions};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("target error: {0}")]
    Target(#[from] stagehand_target::TargetError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unit output directory does not exist: {}", .0.display())]
    MissingOutputDir(PathBuf),
    #[error("cannot create destination directory {}: {source}", path.display())]
    DestinationUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
}
