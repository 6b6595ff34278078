//! Atomic file write operations using temp-and-rename strategy.
//!
//! A destination is either fully replaced or left exactly as it was: content
//! goes to a temporary file in the destination's directory, is synced, and
//! only then renamed over the destination.

use crate::utils::fs::dirs::ensure_dir;
use anyhow::{Context, Result};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically writes a stream of lines to a file.
///
/// Each line is written followed by `\n`. The stream is consumed completely
/// before the destination is touched: if it yields an error, the temporary
/// file is discarded, the destination keeps its previous content, and the
/// stream's error is returned.
///
/// Returns the number of lines written.
///
/// # Examples
///
/// ```rust,no_run
/// use sitegen::utils::fs::atomic_write_lines;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let lines = ["<p>one</p>", "<p>two</p>"].map(|l| Ok::<_, std::io::Error>(l.to_string()));
/// let written = atomic_write_lines(Path::new("web/index.html"), lines)?;
/// assert_eq!(written, 2);
/// # Ok(())
/// # }
/// ```
pub fn atomic_write_lines<I, E>(path: &Path, lines: I) -> Result<usize>
where
    I: IntoIterator<Item = std::result::Result<String, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let temp = create_temp(path)?;
    let mut writer = BufWriter::new(temp);
    let mut count = 0;

    for line in lines {
        // Dropping the writer on error removes the temp file.
        let line = line.with_context(|| format!("Failed to render: {}", path.display()))?;
        writeln!(writer, "{line}")
            .with_context(|| format!("Failed to write to temp file for: {}", path.display()))?;
        count += 1;
    }

    let temp = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("Failed to flush temp file for: {}", path.display()))?;
    persist(temp, path)?;

    tracing::debug!("Wrote {} lines to {}", count, path.display());
    Ok(count)
}

fn create_temp(path: &Path) -> Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    NamedTempFile::new_in(parent).with_context(|| {
        format!(
            "Failed to create temp file in: {}\n\nCheck file permissions and that the directory exists",
            parent.display()
        )
    })
}

fn persist(temp: NamedTempFile, path: &Path) -> Result<()> {
    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_lines() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("deep").join("nested").join("page.html");

        let lines = vec!["<p>a</p>", "<p>b</p>"]
            .into_iter()
            .map(|l| Ok::<_, std::io::Error>(l.to_string()));
        assert_eq!(atomic_write_lines(&file, lines).unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "<p>a</p>\n<p>b</p>\n");
    }

    #[test]
    fn test_failed_stream_leaves_destination_untouched() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("page.html");
        std::fs::write(&file, "previous").unwrap();

        let lines = vec![
            Ok("new first line".to_string()),
            Err(std::io::Error::other("render failed")),
            Ok("never written".to_string()),
        ];
        let err = atomic_write_lines(&file, lines).unwrap_err();
        assert!(format!("{err:#}").contains("render failed"));

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "previous");
        let leftovers: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temp file should have been removed");
    }

    #[test]
    fn test_failed_stream_does_not_create_destination() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("out").join("page.html");

        let lines = vec![Err::<String, _>(std::io::Error::other("boom"))];
        assert!(atomic_write_lines(&file, lines).is_err());
        assert!(!file.exists());
    }
}
