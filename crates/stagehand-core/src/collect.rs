use crate::StageError;
use serde::Serialize;
use stagehand_target::{HostFamily, PoolsSection, UnitEntry};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Where a candidate was found. Declaration order is dedup precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    UnitOutput,
    UnitData,
    SharedData,
    PlatformLibPool,
}

/// A reference to an existing file that may be staged. Sources are never
/// modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub source: PathBuf,
    /// Path below the provenance root it was found in.
    pub relative: PathBuf,
    pub provenance: Provenance,
}

impl Candidate {
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.source.file_name()
    }
}

/// Candidates for one unit, ordered by provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallManifest {
    pub candidates: Vec<Candidate>,
}

impl InstallManifest {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    pub fn count(&self, provenance: Provenance) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.provenance == provenance)
            .count()
    }

    fn extend(&mut self, root: &Path, files: Vec<PathBuf>, provenance: Provenance) {
        for source in files {
            let relative = source
                .strip_prefix(root)
                .map_or_else(|_| source.clone(), Path::to_path_buf);
            self.candidates.push(Candidate {
                source,
                relative,
                provenance,
            });
        }
    }
}

impl<'a> IntoIterator for &'a InstallManifest {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// A build unit: its source directory and the tree its build produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitPaths {
    pub name: Option<String>,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl UnitPaths {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.source_dir
                .file_name()
                .map_or_else(|| self.source_dir.display().to_string(), |n| {
                    n.to_string_lossy().into_owned()
                })
        })
    }
}

impl From<&UnitEntry> for UnitPaths {
    fn from(entry: &UnitEntry) -> Self {
        Self {
            name: entry.name.clone(),
            source_dir: entry.source_dir.clone(),
            output_dir: entry.output_dir.clone(),
        }
    }
}

/// Regular files below `root`, sorted by path. Symlinks to files count;
/// symlinked directories are not entered.
fn walk_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        let ty = entry.file_type();
        let is_file = ty.is_file()
            || (ty.is_symlink() && fs::metadata(entry.path()).is_ok_and(|m| m.is_file()));
        if is_file {
            files.push(entry.into_path());
        }
    }
    files
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
}

/// Gather every candidate for `unit`, concatenated in provenance order:
/// unit output, unit data, shared data, and (Windows only) the platform
/// library pool. Missing optional roots contribute nothing.
pub fn collect_candidates(
    unit: &UnitPaths,
    pools: &PoolsSection,
    family: HostFamily,
) -> Result<InstallManifest, StageError> {
    if !unit.output_dir.is_dir() {
        return Err(StageError::MissingOutputDir(unit.output_dir.clone()));
    }

    let mut manifest = InstallManifest::default();

    manifest.extend(
        &unit.output_dir,
        walk_files(&unit.output_dir),
        Provenance::UnitOutput,
    );

    let data_dir = unit.source_dir.join("data");
    if data_dir.is_dir() {
        manifest.extend(&data_dir, walk_files(&data_dir), Provenance::UnitData);
    }

    if let Some(shared) = pools
        .shared_data
        .iter()
        .map(|rel| unit.source_dir.join(rel))
        .find(|dir| dir.is_dir())
    {
        debug!("shared data pool: {}", shared.display());
        manifest.extend(&shared, walk_files(&shared), Provenance::SharedData);
    }

    if family == HostFamily::Windows {
        let ext = family.shared_library_extension();
        for dir in pools.platform_libs.iter().map(|rel| unit.source_dir.join(rel)) {
            if !dir.is_dir() {
                continue;
            }
            let libs: Vec<PathBuf> = walk_files(&dir)
                .into_iter()
                .filter(|p| has_extension(p, ext))
                .collect();
            if !libs.is_empty() {
                debug!("platform library pool: {} ({} file(s))", dir.display(), libs.len());
                manifest.extend(&dir, libs, Provenance::PlatformLibPool);
                break;
            }
        }
    }

    debug!(
        "collected {} candidate(s) for {}: output={} data={} shared={} platform={}",
        manifest.len(),
        unit.display_name(),
        manifest.count(Provenance::UnitOutput),
        manifest.count(Provenance::UnitData),
        manifest.count(Provenance::SharedData),
        manifest.count(Provenance::PlatformLibPool),
    );
    Ok(manifest)
}
