use crate::Candidate;
use serde::Serialize;
use stagehand_target::{ClassifySection, HostFamily};
use std::collections::BTreeSet;
use std::path::{Component, Path};
use tracing::warn;

/// What a candidate is deployed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    DataFile,
    SharedLibrary,
    Executable,
    Skip,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DataFile => "data",
            Self::SharedLibrary => "shared-library",
            Self::Executable => "executable",
            Self::Skip => "skip",
        }
    }

    /// Mode applied on POSIX targets.
    pub fn posix_mode(self) -> u32 {
        match self {
            Self::Executable => 0o755,
            Self::DataFile | Self::SharedLibrary | Self::Skip => 0o644,
        }
    }
}

/// Why a candidate was dropped before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// Object files, archives, import libraries, debug and incremental-link files.
    IntermediateArtifact,
    /// Headers, sources and generic text.
    SourceText,
    /// Generator bookkeeping such as `Makefile` or `CMakeCache.txt`.
    Housekeeping,
    /// Lives under a generator-internal directory.
    BuildInternals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub kind: ArtifactKind,
    pub excluded: Option<Exclusion>,
}

impl Classification {
    fn kind(kind: ArtifactKind) -> Self {
        Self {
            kind,
            excluded: None,
        }
    }

    fn excluded(why: Exclusion) -> Self {
        Self {
            kind: ArtifactKind::Skip,
            excluded: Some(why),
        }
    }
}

const INTERMEDIATE_EXTENSIONS: &[&str] = &[
    "o", "obj", "a", "lib", "exp", "pdb", "ilk", "idb", "iobj", "ipdb", "pch", "gch", "d",
    "tlog", "lastbuildstate", "recipe",
];

const SOURCE_TEXT_EXTENSIONS: &[&str] = &[
    "h", "hh", "hpp", "hxx", "cuh", "inl", "c", "cc", "cpp", "cxx", "cu", "txt", "md", "cmake",
    "make", "mk", "ninja", "log",
];

const HOUSEKEEPING_NAMES: &[&str] = &[
    "CMakeCache.txt",
    "Makefile",
    "cmake_install.cmake",
    "CTestTestfile.cmake",
    "CPackConfig.cmake",
    "CPackSourceConfig.cmake",
    "install_manifest.txt",
    "compile_commands.json",
    "build.ninja",
    "rules.ninja",
    ".ninja_deps",
    ".ninja_log",
];

const INTERNAL_DIRS: &[&str] = &["CMakeFiles", "CMakeScripts", ".cmake", "Testing"];

/// Extension-based data whitelist.
const DATA_EXTENSIONS: &[&str] = &[
    "fatbin", "cubin", "bin", "ptx", "ppm", "pgm", "pbm", "pnm", "raw",
];

fn normalize_ext(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Classification policy for one target family.
#[derive(Debug, Clone)]
pub struct Classifier {
    family: HostFamily,
    data_extensions: BTreeSet<String>,
    excluded_extensions: BTreeSet<String>,
}

impl Classifier {
    pub fn new(family: HostFamily, extra: &ClassifySection) -> Self {
        let data_extensions = DATA_EXTENSIONS
            .iter()
            .map(|e| (*e).to_owned())
            .chain(extra.extra_data_extensions.iter().map(|e| normalize_ext(e)))
            .collect();
        let excluded_extensions = INTERMEDIATE_EXTENSIONS
            .iter()
            .chain(SOURCE_TEXT_EXTENSIONS)
            .map(|e| (*e).to_owned())
            .chain(extra.extra_excluded_extensions.iter().map(|e| normalize_ext(e)))
            .collect();
        Self {
            family,
            data_extensions,
            excluded_extensions,
        }
    }

    pub fn family(&self) -> HostFamily {
        self.family
    }

    /// Classify a collected candidate. Permission bits are only probed for
    /// extensionless files on POSIX targets.
    pub fn classify(&self, candidate: &Candidate) -> Classification {
        self.classify_path(&candidate.source, &candidate.relative)
    }

    /// Classify `source`; `relative` is its path below the provenance root and
    /// is what the build-internals check looks at.
    pub fn classify_path(&self, source: &Path, relative: &Path) -> Classification {
        if let Some(why) = self.exclusion(relative) {
            return Classification::excluded(why);
        }
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let executable_bit = if self.family == HostFamily::Posix && extension.is_none() {
            match probe_executable(source) {
                Ok(bit) => bit,
                Err(e) => {
                    warn!("cannot stat {}: {e}", source.display());
                    false
                }
            }
        } else {
            false
        };

        Classification::kind(self.kind_for(&name, extension.as_deref(), executable_bit))
    }

    /// Exclusion filter, applied before classification.
    pub fn exclusion(&self, relative: &Path) -> Option<Exclusion> {
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(parent) = relative.parent() {
            let internal = parent.components().any(|c| match c {
                Component::Normal(part) => {
                    let part = part.to_string_lossy();
                    INTERNAL_DIRS.contains(&part.as_ref()) || part.ends_with(".dir")
                }
                _ => false,
            });
            if internal {
                return Some(Exclusion::BuildInternals);
            }
        }

        if HOUSEKEEPING_NAMES.contains(&name.as_str()) {
            return Some(Exclusion::Housekeeping);
        }

        let ext = relative
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())?;
        if INTERMEDIATE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Exclusion::IntermediateArtifact)
        } else if SOURCE_TEXT_EXTENSIONS.contains(&ext.as_str())
            || self.excluded_extensions.contains(&ext)
        {
            Some(Exclusion::SourceText)
        } else {
            None
        }
    }

    /// Pure classification of a file that survived exclusion. `extension` is
    /// lower-case without the dot.
    pub fn kind_for(&self, name: &str, extension: Option<&str>, executable_bit: bool) -> ArtifactKind {
        let lib_ext = self.family.shared_library_extension();
        match extension {
            Some(ext) if self.data_extensions.contains(ext) => ArtifactKind::DataFile,
            Some(ext) if ext == lib_ext => ArtifactKind::SharedLibrary,
            Some("exe") if self.family == HostFamily::Windows => ArtifactKind::Executable,
            Some(_) if self.family == HostFamily::Posix && is_versioned_so(name) => {
                ArtifactKind::SharedLibrary
            }
            None if self.family == HostFamily::Posix && executable_bit => ArtifactKind::Executable,
            _ => ArtifactKind::Skip,
        }
    }
}

/// `libfoo.so.1`, `libfoo.so.1.2.3`
fn is_versioned_so(name: &str) -> bool {
    name.split_once(".so.").is_some_and(|(stem, version)| {
        !stem.is_empty()
            && !version.is_empty()
            && version.split('.').all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
    })
}

#[cfg(unix)]
fn probe_executable(path: &Path) -> std::io::Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o111 != 0)
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn probe_executable(_path: &Path) -> std::io::Result<bool> {
    Ok(false)
}
