use crate::InstallManifest;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Collapse the manifest to unique source files, keeping the first
/// occurrence. Identity is the source path with its directory canonicalized,
/// so the same file reached through two relative routes is collapsed while a
/// symlink and its target stay distinct (`libfoo.so -> libfoo.so.1`).
/// Distinct sources that share a file name are all kept; they overwrite each
/// other at the destination.
pub fn dedup(manifest: InstallManifest) -> InstallManifest {
    let mut seen: HashSet<PathBuf> = HashSet::with_capacity(manifest.len());
    let candidates = manifest
        .candidates
        .into_iter()
        .filter(|c| seen.insert(identity(&c.source)))
        .collect();
    InstallManifest { candidates }
}

/// Canonical parent joined with the final component, which is not followed.
fn identity(source: &Path) -> PathBuf {
    match (source.parent(), source.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => parent
            .canonicalize()
            .map_or_else(|_| source.to_path_buf(), |p| p.join(name)),
        _ => source.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Candidate, Provenance};
    use std::fs;

    fn candidate(source: PathBuf, provenance: Provenance) -> Candidate {
        let relative = PathBuf::from(source.file_name().unwrap());
        Candidate {
            source,
            relative,
            provenance,
        }
    }

    #[test]
    fn first_seen_wins() {
        let manifest = InstallManifest {
            candidates: vec![
                candidate(PathBuf::from("/x/a.ptx"), Provenance::UnitOutput),
                candidate(PathBuf::from("/x/a.ptx"), Provenance::SharedData),
                candidate(PathBuf::from("/x/b.ptx"), Provenance::UnitData),
            ],
        };
        let out = dedup(manifest);
        assert_eq!(out.len(), 2);
        assert_eq!(out.candidates[0].provenance, Provenance::UnitOutput);
        assert_eq!(out.candidates[1].source, PathBuf::from("/x/b.ptx"));
    }

    #[test]
    fn same_name_different_source_is_kept() {
        let manifest = InstallManifest {
            candidates: vec![
                candidate(PathBuf::from("/unit/data/lena.pgm"), Provenance::UnitData),
                candidate(PathBuf::from("/common/data/lena.pgm"), Provenance::SharedData),
            ],
        };
        assert_eq!(dedup(manifest).len(), 2);
    }

    #[test]
    fn dotdot_routes_to_same_file_collapse() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("Common/data");
        fs::create_dir_all(&data).unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(data.join("x.raw"), b"1").unwrap();

        let direct = data.join("x.raw");
        let roundabout = dir.path().join("a/b/../../Common/data/x.raw");
        let manifest = InstallManifest {
            candidates: vec![
                candidate(direct.clone(), Provenance::UnitData),
                candidate(roundabout, Provenance::SharedData),
            ],
        };
        let out = dedup(manifest);
        assert_eq!(out.len(), 1);
        assert_eq!(out.candidates[0].source, direct);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_and_its_target_are_both_kept() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("libfoo.so.1");
        let link = dir.path().join("libfoo.so");
        fs::write(&real, b"elf").unwrap();
        std::os::unix::fs::symlink("libfoo.so.1", &link).unwrap();

        let manifest = InstallManifest {
            candidates: vec![
                candidate(link.clone(), Provenance::UnitOutput),
                candidate(real.clone(), Provenance::UnitOutput),
            ],
        };
        let out = dedup(manifest);
        assert_eq!(out.len(), 2);
        assert_eq!(out.candidates[0].source, link);
        assert_eq!(out.candidates[1].source, real);
    }

    #[test]
    fn preserves_order() {
        let names = ["c", "a", "b", "a", "c"];
        let manifest = InstallManifest {
            candidates: names
                .iter()
                .map(|n| candidate(PathBuf::from(format!("/p/{n}")), Provenance::UnitOutput))
                .collect(),
        };
        let out: Vec<_> = dedup(manifest)
            .iter()
            .map(|c| c.source.to_string_lossy().into_owned())
            .collect();
        assert_eq!(out, vec!["/p/c", "/p/a", "/p/b"]);
    }
}
