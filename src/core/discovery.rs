use indicatif::ProgressBar;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid source path: {path} does not exist")]
    Missing { path: String },

    #[error("Invalid source path: {path} is not a directory")]
    NotADirectory { path: String },
}

/// Lowercase each extension and make sure it carries its leading dot.
pub fn extension_set<S: AsRef<str>>(extensions: &[S]) -> HashSet<String> {
    extensions
        .iter()
        .map(|ext| ext.as_ref().trim().to_lowercase())
        .filter(|ext| !ext.is_empty() && ext != ".")
        .map(|ext| {
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{ext}")
            }
        })
        .collect()
}

/// Dotted, lowercased suffix of `path`, if it has one.
fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Recursively collect files under `root` whose extension is in `extensions`,
/// then shuffle them once.
///
/// An empty result is not an error; the caller decides how to report it.
pub fn discover_media<R>(
    root: &Path,
    extensions: &HashSet<String>,
    rng: &mut R,
    progress: &ProgressBar,
) -> Result<Vec<PathBuf>, DiscoveryError>
where
    R: Rng + ?Sized,
{
    if !root.exists() {
        return Err(DiscoveryError::Missing {
            path: root.to_string_lossy().to_string(),
        });
    }
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory {
            path: root.to_string_lossy().to_string(),
        });
    }

    let mut candidates = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        progress.tick();

        // Follows symlinks, so a link to a media file counts as that file.
        if !entry.path().is_file() {
            continue;
        }
        if let Some(ext) = dotted_extension(entry.path()) {
            if extensions.contains(&ext) {
                candidates.push(entry.into_path());
            }
        }
    }

    candidates.shuffle(rng);
    Ok(candidates)
}
