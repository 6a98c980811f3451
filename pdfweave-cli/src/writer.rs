//! Output file writing.
//!
//! Composed documents arrive as finished byte buffers. They are written
//! atomically: to a temporary file next to the target, then renamed, so an
//! interrupted run never leaves a truncated PDF behind.

use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use pdfweave::error::{Result, WeaveError};
use pdfweave::utils::format_file_size;
use tokio::task;

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Writes output buffers to disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputWriter {
    overwrite: bool,
}

impl OutputWriter {
    /// Create a writer; `overwrite` allows replacing existing files.
    pub fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    /// Write `bytes` to `path` atomically.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if:
    /// - The file exists and overwriting is off
    /// - The parent directory does not exist or is not writable
    /// - Writing or renaming fails
    pub async fn write(&self, path: &Path, bytes: Vec<u8>) -> Result<WriteStatistics> {
        if !self.overwrite && tokio::fs::try_exists(path).await? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "output file already exists: {} (use --force to overwrite)",
                    path.display()
                ),
            )
            .into());
        }

        let path_buf = path.to_path_buf();
        let stats = task::spawn_blocking(move || {
            let start = Instant::now();
            let temp_path = temp_path_for(&path_buf);

            let written = write_file(&temp_path, &bytes)
                .and_then(|()| std::fs::rename(&temp_path, &path_buf));
            if let Err(err) = written {
                let _ = std::fs::remove_file(&temp_path);
                return Err(WeaveError::from(err));
            }

            Ok(WriteStatistics {
                write_time: start.elapsed(),
                file_size: bytes.len() as u64,
                output_path: path_buf,
            })
        })
        .await??;

        tracing::debug!(
            path = %stats.output_path.display(),
            bytes = stats.file_size,
            "wrote output"
        );
        Ok(stats)
    }
}

/// Resolve an output `name` inside `dir`.
///
/// The name must be a single plain file name, so outputs never land outside
/// `dir`.
///
/// # Errors
///
/// Returns `InvalidConfig` for names that contain path separators or are
/// `.`/`..`.
pub fn output_path_in(dir: &Path, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(file_name)), None) if file_name == name => Ok(dir.join(file_name)),
        _ => Err(WeaveError::invalid_config(format!(
            "Output name '{name}' must be a plain file name"
        ))),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}
