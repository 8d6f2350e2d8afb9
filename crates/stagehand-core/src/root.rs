use std::path::{Path, PathBuf};
use tracing::debug;

/// Find the top of the build tree: the nearest ancestor of `build_dir`
/// (inclusive) holding `marker`, climbing at most `max_ascent` levels.
///
/// Falls back to `build_dir` unchanged when no marker is found, so a
/// sub-unit never nests the install output inside its own build directory
/// unless there is genuinely nothing above it.
pub fn resolve_install_root(build_dir: &Path, marker: &str, max_ascent: usize) -> PathBuf {
    let start = build_dir
        .canonicalize()
        .unwrap_or_else(|_| build_dir.to_path_buf());

    let mut current = start.as_path();
    for depth in 0..=max_ascent {
        if current.join(marker).is_file() {
            debug!("install root {} (found {marker} {depth} level(s) up)", current.display());
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) if parent != current && !parent.as_os_str().is_empty() => {
                current = parent;
            }
            _ => break,
        }
    }

    debug!(
        "no {marker} within {max_ascent} level(s) of {}; using it as install root",
        build_dir.display()
    );
    build_dir.to_path_buf()
}
