use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed workbook {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("Sheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },
    /// Another writer published between our read and our commit.
    #[error("{} changed while appending", .path.display())]
    Changed { path: PathBuf },
    /// The writer lock file is held by another append, possibly in another process.
    #[error("{} is locked by another writer", .path.display())]
    Locked { path: PathBuf },
    #[error("Refusing to overwrite source workbook {}", .path.display())]
    SameFile { path: PathBuf },
    #[error("Failed to append to '{table}' after {attempts} attempts: {cause}")]
    Contention {
        table: String,
        attempts: u32,
        cause: String,
    },
}

impl TableError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TableError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TableError::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
