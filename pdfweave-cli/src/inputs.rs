//! Input path expansion and file loading.

use std::io;
use std::path::{Path, PathBuf};

use pdfweave::error::{Result, WeaveError};
use pdfweave::sources::SourceInput;

/// Expand glob patterns into paths, keeping the pattern order.
///
/// Plain paths are patterns too and resolve to themselves. Matches of one
/// pattern come back in the order `glob` yields them (sorted by path).
///
/// # Errors
///
/// Returns an error if:
/// - A pattern is malformed (`InvalidConfig`)
/// - A pattern matches nothing (`Io` with `NotFound`)
/// - A matched entry cannot be read (`Io`)
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns.into_iter() {
        let paths = collect_paths_for_pattern(pattern.as_ref())?;
        if paths.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no file matches '{}'", pattern.as_ref()),
            )
            .into());
        }
        resolved_paths.extend(paths);
    }

    Ok(resolved_paths)
}

fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .map_err(|err| WeaveError::invalid_config(format!("Invalid pattern '{pattern}': {err}")))?;

    let mut resolved_paths = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| WeaveError::from(io::Error::from(err)))?;
        resolved_paths.push(path);
    }

    Ok(resolved_paths)
}

/// Read a file into a [`SourceInput`] named after the file.
///
/// # Errors
///
/// Returns an `Io` error naming the path if it cannot be read.
pub async fn read_input(path: &Path) -> Result<SourceInput> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| io::Error::new(err.kind(), format!("{}: {err}", path.display())))?;
    Ok(SourceInput::new(display_name(path), bytes))
}

/// File name of `path`, or the whole path when it has none.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
