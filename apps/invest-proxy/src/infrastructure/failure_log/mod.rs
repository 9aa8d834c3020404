//! File-backed Failure Log
//!
//! Appends failure records to a plain-text file opened in append mode. Each
//! record is written with a single `write_all` while holding the lock, so
//! records from concurrent requests never interleave. The file is never
//! rotated or truncated here.
//!
//! The append is synchronous on the calling task. A record is on disk before
//! the failing request is answered, and the lock covers one short write, so
//! no blocking pool hand-off is used.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::application::ports::{FailureLogError, FailureLogPort};
use crate::domain::upstream::FailureRecord;
use crate::infrastructure::metrics::record_upstream_failure;

/// Append-only failure log file.
#[derive(Debug)]
pub struct FileFailureLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileFailureLog {
    /// Open (or create) the log at `path`.
    ///
    /// # Errors
    ///
    /// Returns `FailureLogError::Open` if the file cannot be opened for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FailureLogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| FailureLogError::Open {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Location of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FailureLogPort for FileFailureLog {
    fn record(&self, record: &FailureRecord) -> Result<(), FailureLogError> {
        record_upstream_failure(record.kind);

        let text = record.to_string();
        let mut file = self.file.lock();
        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| FailureLogError::Write(e.to_string()))
    }
}
