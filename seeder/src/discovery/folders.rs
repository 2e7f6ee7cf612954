//! Seed folder discovery.
//!
//! For every model source `L` and location `S`, both `L/S` and `L/../S` are
//! probed. Paths are resolved lexically (no symlink resolution), then kept if
//! they name an existing directory.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Locations probed next to every model source.
pub const SEED_LOCATIONS: [&str; 2] = ["data", "csv"];

/// The nested and the sibling candidate for one source/location pair.
pub fn candidate_paths(source: &str, location: &str) -> [PathBuf; 2] {
    let source = Path::new(source);
    [source.join(location), source.join("..").join(location)]
}

/// Resolve `path` against `base` and fold `.`/`..` components.
pub fn normalize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Collect the existing seed folders for the given sources.
///
/// The result is deduplicated and keeps discovery order. No sources, or no
/// existing candidate, yields an empty list.
pub async fn resolve_folders<S: AsRef<str>>(
    sources: &[String],
    locations: &[S],
) -> io::Result<Vec<PathBuf>> {
    let mut folders: Vec<PathBuf> = Vec::new();
    if sources.is_empty() {
        return Ok(folders);
    }

    let cwd = std::env::current_dir()?;
    for source in sources {
        for location in locations {
            for candidate in candidate_paths(source, location.as_ref()) {
                let folder = normalize(&candidate, &cwd);
                if folders.contains(&folder) || !is_dir(&folder).await {
                    continue;
                }
                folders.push(folder);
            }
        }
    }

    Ok(folders)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
