//! Read and append access to workbook files shared by independent writers.
//!
//! Appends never edit the file in place. Each attempt takes the directory's
//! writer lock for the file, reads the latest content, adds the row, writes
//! the whole image to a temp file next to the destination and renames it over
//! the destination. Writers in other processes take the same lock, so no two
//! read-modify-rename cycles on one file overlap. A destination that changed
//! under a writer that skipped the lock is still detected before the rename,
//! and the attempt is retried from a fresh read.

use crate::error::TableError;
use crate::unique::materialize_email;
use crate::workbook::{decode, encode, DocumentFormat, Row, Workbook};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, error, info, warn};

lazy_static! {
    static ref APPEND_LOCKS: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>> =
        Mutex::new(HashMap::new());
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// One key per file, however the caller spelled its path.
fn lock_key(path: &Path) -> PathBuf {
    match (std::fs::canonicalize(parent_dir(path)), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// In-process queue for appends to one file. The registry entry is dropped
/// with the last handle.
struct PathLock {
    key: PathBuf,
    lock: Arc<tokio::sync::Mutex<()>>,
}

fn path_lock(path: &Path) -> PathLock {
    let key = lock_key(path);
    let mut locks = APPEND_LOCKS.lock().unwrap_or_else(|p| p.into_inner());
    let lock = Arc::clone(locks.entry(key.clone()).or_default());
    PathLock { key, lock }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        let mut locks = APPEND_LOCKS.lock().unwrap_or_else(|p| p.into_inner());
        // Held by the registry and by us only.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}

/// Exclusive advisory lock on `.<file>.lock` beside the workbook.
///
/// The lock file is never renamed or removed, so every writer locks the same
/// inode. Released when dropped.
struct WriterLock {
    _file: File,
}

impl WriterLock {
    fn lock_path(dest: &Path) -> PathBuf {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        parent_dir(dest).join(format!(".{}.lock", name))
    }

    fn try_acquire(dest: &Path) -> Result<Self, TableError> {
        let dir = parent_dir(dest);
        std::fs::create_dir_all(dir).map_err(|e| TableError::io(dir, e))?;
        let path = Self::lock_path(dest);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| TableError::io(&path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
            if result != 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == ErrorKind::WouldBlock {
                    return Err(TableError::Locked { path });
                }
                return Err(TableError::io(&path, err));
            }
        }

        debug!("Took writer lock {}", path.display());
        Ok(Self { _file: file })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Column whose values are rewritten into unique e-mail addresses.
    pub transform_column: Option<String>,
    /// Where to persist the rewritten workbook. Must not be the source.
    pub out_path: Option<PathBuf>,
}

impl ReadOptions {
    pub fn unique(column: impl Into<String>) -> Self {
        Self {
            transform_column: Some(column.into()),
            out_path: None,
        }
    }

    pub fn write_to(mut self, out_path: impl Into<PathBuf>) -> Self {
        self.out_path = Some(out_path.into());
        self
    }
}

/// What the destination must still contain for a commit to go ahead.
enum Precondition {
    Any,
    Unchanged(Option<Vec<u8>>),
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableStore {
    policy: RetryPolicy,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Load the data rows of a sheet (`None` = first sheet), header excluded.
    ///
    /// A document without any sheet (an empty file) has no rows.
    pub async fn read_rows(
        &self,
        path: &Path,
        sheet: Option<&str>,
        options: &ReadOptions,
    ) -> Result<Vec<Row>, TableError> {
        if let Some(out) = &options.out_path {
            if same_file(path, out) {
                return Err(TableError::SameFile {
                    path: path.to_path_buf(),
                });
            }
        }

        let format = DocumentFormat::for_path(path);
        let bytes = fs::read(path)
            .await
            .map_err(|e| TableError::io(path, e))?;
        let mut workbook = decode(format, path, &bytes)?;
        if workbook.sheets.is_empty() && (sheet.is_none() || format == DocumentFormat::Csv) {
            debug!("{} holds no sheet; no rows", path.display());
            return Ok(Vec::new());
        }
        let index = workbook
            .position(format, sheet)
            .ok_or_else(|| TableError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: sheet.unwrap_or("<first>").to_string(),
            })?;

        if let Some(column) = &options.transform_column {
            let selected = &mut workbook.sheets[index];
            match selected.column_index(column) {
                Some(col) => {
                    for row in &mut selected.rows {
                        if row.len() <= col {
                            row.resize(col + 1, String::new());
                        }
                        row[col] = materialize_email(&row[col]);
                    }
                    debug!(
                        "Materialized {} value(s) in column '{}' of '{}'",
                        selected.rows.len(),
                        column,
                        selected.name
                    );
                }
                None => debug!(
                    "No '{}' column in '{}'; nothing rewritten",
                    column, selected.name
                ),
            }
        }

        if let Some(out) = &options.out_path {
            let out_format = DocumentFormat::for_path(out);
            let image = match out_format {
                DocumentFormat::Json => workbook.clone(),
                DocumentFormat::Csv => Workbook {
                    sheets: vec![workbook.sheets[index].clone()],
                },
            };
            let bytes = encode(out_format, out, &image)?;
            publish(out.clone(), bytes, Precondition::Any).await?;
            info!("Wrote rewritten workbook to {}", out.display());
        }

        Ok(workbook.sheets[index].data_rows())
    }

    /// Rows as bare value lists, the shape data-driven scenarios consume.
    pub async fn data_rows(
        &self,
        path: &Path,
        sheet: Option<&str>,
    ) -> Result<Vec<Vec<String>>, TableError> {
        let rows = self.read_rows(path, sheet, &ReadOptions::default()).await?;
        Ok(rows.into_iter().map(Row::into_values).collect())
    }

    /// Append one row, creating the file and sheet (with `header`) as needed.
    ///
    /// A busy writer lock, transient failures and concurrent modification are
    /// retried from a fresh read; exhausting the policy is a hard error.
    pub async fn append_row(
        &self,
        path: &Path,
        sheet: &str,
        header: &[&str],
        values: &[&str],
    ) -> Result<(), TableError> {
        let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
        let values: Vec<String> = values.iter().map(|s| s.to_string()).collect();

        let queue = path_lock(path);
        let _turn = queue.lock.lock().await;

        let attempts = self.policy.max_attempts.max(1);
        let mut last_cause = String::new();
        for attempt in 1..=attempts {
            match try_append(path, sheet, &header, &values).await {
                Ok(row_count) => {
                    info!(
                        "Appended row {} to '{}' in {}",
                        row_count,
                        sheet,
                        path.display()
                    );
                    return Ok(());
                }
                Err(e) => {
                    if matches!(e, TableError::Locked { .. }) {
                        debug!("{} (attempt {}/{})", e, attempt, attempts);
                    } else {
                        warn!(
                            "Append to '{}' in {} failed (attempt {}/{}): {}",
                            sheet,
                            path.display(),
                            attempt,
                            attempts,
                            e
                        );
                    }
                    last_cause = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        error!("Giving up appending to '{}' in {}", sheet, path.display());
        Err(TableError::Contention {
            table: format!("{}#{}", path.display(), sheet),
            attempts,
            cause: last_cause,
        })
    }
}

async fn try_append(
    path: &Path,
    sheet: &str,
    header: &[String],
    values: &[String],
) -> Result<usize, TableError> {
    let path_buf = path.to_path_buf();
    let sheet = sheet.to_string();
    let header = header.to_vec();
    let values = values.to_vec();
    tokio::task::spawn_blocking(move || append_locked(&path_buf, &sheet, &header, &values))
        .await
        .map_err(|e| TableError::io(path, std::io::Error::other(e)))?
}

/// One read-modify-publish cycle under the writer lock. Returns the sheet's
/// new data row count.
fn append_locked(
    path: &Path,
    sheet: &str,
    header: &[String],
    values: &[String],
) -> Result<usize, TableError> {
    let _writer = WriterLock::try_acquire(path)?;

    let format = DocumentFormat::for_path(path);
    let snapshot = match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(TableError::io(path, e)),
    };

    let mut workbook = match &snapshot {
        Some(bytes) => decode(format, path, bytes)?,
        None => Workbook::default(),
    };
    let target = workbook.sheet_or_create(format, sheet, header);
    target.rows.push(values.to_vec());
    let row_count = target.rows.len();

    let bytes = encode(format, path, &workbook)?;
    commit(path, &bytes, Precondition::Unchanged(snapshot))?;
    Ok(row_count)
}

async fn publish(
    dest: PathBuf,
    bytes: Vec<u8>,
    precondition: Precondition,
) -> Result<(), TableError> {
    let task_dest = dest.clone();
    tokio::task::spawn_blocking(move || commit(&task_dest, &bytes, precondition))
        .await
        .map_err(|e| TableError::io(dest, std::io::Error::other(e)))?
}

/// Write `bytes` to a temp file beside `dest`, then rename it into place.
///
/// The temp file is removed on every early return, so a partial image is
/// never promoted.
fn commit(dest: &Path, bytes: &[u8], precondition: Precondition) -> Result<(), TableError> {
    let dir = parent_dir(dest);
    std::fs::create_dir_all(dir).map_err(|e| TableError::io(dir, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".shopcheck-append-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| TableError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| TableError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| TableError::io(tmp.path(), e))?;

    if let Precondition::Unchanged(expected) = precondition {
        let current = match std::fs::read(dest) {
            Ok(current) => Some(current),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(TableError::io(dest, e)),
        };
        if current != expected {
            return Err(TableError::Changed {
                path: dest.to_path_buf(),
            });
        }
    }

    match tmp.persist(dest) {
        Ok(_) => Ok(()),
        Err(e) => {
            warn!(
                "Atomic rename onto {} failed ({}); overwriting in place",
                dest.display(),
                e.error
            );
            std::fs::copy(e.file.path(), dest).map_err(|err| TableError::io(dest, err))?;
            Ok(())
        }
    }
}
