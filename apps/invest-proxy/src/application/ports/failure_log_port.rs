//! Failure Log Port (Driven Port)
//!
//! Append-only sink for diagnostic records of unsuccessful upstream calls.

use parking_lot::Mutex;

use crate::domain::upstream::FailureRecord;

/// Failure log write error.
#[derive(Debug, thiserror::Error)]
pub enum FailureLogError {
    /// The log file could not be opened.
    #[error("failed to open failure log {path}: {message}")]
    Open {
        /// Log file path.
        path: String,
        /// Underlying I/O error.
        message: String,
    },

    /// A record could not be appended.
    #[error("failed to append failure record: {0}")]
    Write(String),
}

/// Port for recording failures.
///
/// Implementations must append each record atomically with respect to
/// concurrent callers.
pub trait FailureLogPort: Send + Sync {
    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns `FailureLogError` if the record could not be stored.
    fn record(&self, record: &FailureRecord) -> Result<(), FailureLogError>;
}

/// In-memory failure log for testing.
#[derive(Debug, Default)]
pub struct InMemoryFailureLog {
    records: Mutex<Vec<FailureRecord>>,
}

impl InMemoryFailureLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records appended so far.
    #[must_use]
    pub fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().clone()
    }
}

impl FailureLogPort for InMemoryFailureLog {
    fn record(&self, record: &FailureRecord) -> Result<(), FailureLogError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::upstream::UpstreamErrorKind;
    use chrono::Utc;

    #[test]
    fn in_memory_log_keeps_append_order() {
        let log = InMemoryFailureLog::new();
        for status in [401, 429] {
            let record = FailureRecord {
                timestamp: Utc::now(),
                request_uri: "/".to_string(),
                status,
                transport_error: String::new(),
                kind: UpstreamErrorKind::classify(status).unwrap(),
                url: "https://upstream.test/openapi/portfolio".to_string(),
                params: Vec::new(),
                body: None,
                response: String::new(),
            };
            log.record(&record).unwrap();
        }

        let statuses: Vec<u16> = log.records().iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![401, 429]);
    }
}
