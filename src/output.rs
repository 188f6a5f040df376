//! Result tables: CSV, UTF-8 with a byte-order mark so spreadsheet tools
//! pick up the encoding.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// UTF-8 byte-order mark written before the header row.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Errors raised while writing a result table.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// The output directory or file could not be created.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A record could not be encoded as CSV.
    #[error("failed to encode CSV for {}: {source}", path.display())]
    Csv {
        /// Output path.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },
}

/// A row type with a fixed column layout.
///
/// `HEADERS` must list the serialized field names in declaration order.
pub trait TableRecord: Serialize {
    /// Column names of the header row.
    const HEADERS: &'static [&'static str];
}

/// Encode `records` as CSV into `writer`, prefixed with the BOM.
///
/// The header row comes from [`TableRecord::HEADERS`], so an empty table
/// still carries its columns.
///
/// # Errors
///
/// Returns the CSV encoder's error, which wraps I/O failures.
pub fn write_csv<W: Write, R: TableRecord>(mut writer: W, records: &[R]) -> Result<(), csv::Error> {
    writer.write_all(UTF8_BOM)?;
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(R::HEADERS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write `records` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`OutputError`] if the directory, file or CSV encoding fails.
pub fn write_table<R: TableRecord>(path: &Path, records: &[R]) -> Result<(), OutputError> {
    let io_err = |source: std::io::Error| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    write_csv(std::io::BufWriter::new(file), records).map_err(|source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), rows = records.len(), "result table written");
    Ok(())
}

/// First `max_chars` characters of `text` followed by `...`.
///
/// The ellipsis is always appended, matching the snippet columns of every
/// result table.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
