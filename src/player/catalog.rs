use std::io;
use std::path::{Path, PathBuf};

/// Entries the Finder and netatalk drop into shared folders.
const OS_ARTIFACTS: &[&str] = &[".DS_Store", ".AppleDouble"];

/// Subtitles are picked up by the player next to the movie; partial files
/// belong to downloads still in progress.
const EXCLUDED_SUFFIXES: &[&str] = &[".srt", ".part"];

/// Whether a directory entry name should be offered as a movie.
pub fn is_playable(name: &str) -> bool {
    !OS_ARTIFACTS.contains(&name) && !EXCLUDED_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// List the movies in `dir`, sorted by name.
///
/// The directory is read on every call, so the result always reflects the
/// filesystem at call time. A directory that cannot be read is an error,
/// never an empty list.
pub fn list_movies(dir: &Path) -> io::Result<Vec<String>> {
    let mut movies = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!("Skipping non UTF-8 entry in {}: {:?}", dir.display(), entry.file_name());
            continue;
        };
        if is_playable(&name) {
            movies.push(name);
        }
    }
    movies.sort();
    Ok(movies)
}

/// [`list_movies`] on the blocking thread pool, for callers on the runtime.
pub async fn read_movies(dir: PathBuf) -> io::Result<Vec<String>> {
    tokio::task::spawn_blocking(move || list_movies(&dir))
        .await
        .map_err(io::Error::other)?
}
