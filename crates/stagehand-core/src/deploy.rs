use crate::{ArtifactKind, Candidate, Provenance, StageError};
use serde::Serialize;
use stagehand_target::HostFamily;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct InstalledFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: ArtifactKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub error: String,
}

/// Outcome of staging one unit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageReport {
    pub unit: String,
    pub destination: PathBuf,
    pub installed: Vec<InstalledFile>,
    /// Shared-pool files already present at the destination.
    pub up_to_date: Vec<PathBuf>,
    /// Candidates dropped by exclusion or classified as skip.
    pub skipped: usize,
    pub failures: Vec<FileFailure>,
}

impl StageReport {
    pub fn installed_count(&self) -> usize {
        self.installed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Copies classified candidates into one flat destination directory.
///
/// The directory is shared with every other unit staged for the same target.
/// Writes go to a temporary file next to the destination which is then
/// renamed over it, so concurrent writers of the same name resolve to
/// last-writer-wins with no torn files. Shared-pool files that already exist
/// are left alone; two racing writers may both copy, which is harmless only
/// because shared-pool content is identical across units.
#[derive(Debug, Clone)]
pub struct Deployer {
    dest_dir: PathBuf,
    family: HostFamily,
}

impl Deployer {
    pub fn new(dest_dir: impl Into<PathBuf>, family: HostFamily) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            family,
        }
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Deploy every `(candidate, kind)` pair. Skips are counted; per-file
    /// failures are recorded and do not stop the remaining files.
    pub fn deploy(
        &self,
        unit: &str,
        items: &[(Candidate, ArtifactKind)],
    ) -> Result<StageReport, StageError> {
        fs::create_dir_all(&self.dest_dir).map_err(|source| StageError::DestinationUnavailable {
            path: self.dest_dir.clone(),
            source,
        })?;

        let mut report = StageReport {
            unit: unit.to_owned(),
            destination: self.dest_dir.clone(),
            ..StageReport::default()
        };

        for (candidate, kind) in items {
            if *kind == ArtifactKind::Skip {
                report.skipped += 1;
                continue;
            }
            let Some(file_name) = candidate.file_name() else {
                report.skipped += 1;
                continue;
            };
            let destination = self.dest_dir.join(file_name);

            if candidate.provenance == Provenance::SharedData && destination.exists() {
                debug!("Up-to-date: {}", destination.display());
                report.up_to_date.push(destination);
                continue;
            }

            match self.install_file(&candidate.source, &destination, *kind) {
                Ok(()) => {
                    info!("Installing: {}", destination.display());
                    report.installed.push(InstalledFile {
                        source: candidate.source.clone(),
                        destination,
                        kind: *kind,
                    });
                }
                Err(e) => {
                    warn!(
                        "failed to install {} -> {}: {e}",
                        candidate.source.display(),
                        destination.display()
                    );
                    report.failures.push(FileFailure {
                        source: candidate.source.clone(),
                        destination,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Installed {} file(s) to {}",
            report.installed_count(),
            self.dest_dir.display()
        );
        Ok(report)
    }

    fn install_file(&self, source: &Path, destination: &Path, kind: ArtifactKind) -> io::Result<()> {
        let mut reader = File::open(source)?;
        let mut tmp = NamedTempFile::new_in(&self.dest_dir)?;
        io::copy(&mut reader, tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        fs::set_permissions(tmp.path(), self.permissions_for(source, kind)?)?;
        tmp.persist(destination).map_err(|e| e.error)?;
        Ok(())
    }

    /// POSIX targets get a mode from the artifact kind; Windows targets keep
    /// whatever the source had, as a plain copy would.
    fn permissions_for(&self, source: &Path, kind: ArtifactKind) -> io::Result<fs::Permissions> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if self.family == HostFamily::Posix {
                return Ok(fs::Permissions::from_mode(kind.posix_mode()));
            }
        }
        #[cfg(not(unix))]
        let _ = kind;
        Ok(fs::metadata(source)?.permissions())
    }
}
