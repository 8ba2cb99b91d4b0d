//! Durable event log backed by a JSON-lines file
//!
//! Each accepted event is written as `{"seq":N,"event":{...}}` followed by a
//! newline and synced before the append returns. Opening the file replays
//! every record to rebuild the in-memory index.

use super::LogIndex;
use crate::error::{LogError, Result};
use crate::traits::EventLog;
use crate::types::{Event, EventQuery};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize, Deserialize)]
struct LogRecord {
    seq: u64,
    event: Event,
}

/// Append-only file log
pub struct JsonlEventLog {
    path: PathBuf,
    writer: Mutex<File>,
    index: RwLock<LogIndex>,
}

impl JsonlEventLog {
    /// Open or create a log at `path`
    ///
    /// A trailing record cut off mid-write (no terminating newline) is
    /// dropped and the file truncated to the last complete record. Any other
    /// unreadable record fails with [`LogError::Corrupt`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let mut index = LogIndex::default();
        let mut valid_len = 0usize;
        let mut torn_tail = false;

        for (line_no, line) in contents.split_inclusive('\n').enumerate() {
            let complete = line.ends_with('\n');
            let body = line.trim_end();
            if body.is_empty() {
                valid_len += line.len();
                continue;
            }

            let record: LogRecord = match serde_json::from_str(body) {
                Ok(record) => record,
                Err(e) if !complete => {
                    warn!(line = line_no + 1, error = %e, "Dropping torn record at end of event log");
                    torn_tail = true;
                    break;
                }
                Err(e) => {
                    return Err(LogError::Corrupt {
                        line: line_no + 1,
                        reason: e.to_string(),
                    })
                }
            };

            let expected = index.len() as u64 + 1;
            if record.seq != expected {
                return Err(LogError::Corrupt {
                    line: line_no + 1,
                    reason: format!("sequence {} where {} was expected", record.seq, expected),
                });
            }
            if index.contains(&record.event.id) {
                return Err(LogError::Corrupt {
                    line: line_no + 1,
                    reason: format!("duplicate event id {}", record.event.id),
                });
            }

            index.push(record.event);
            valid_len += line.len();
        }

        if torn_tail {
            let file = OpenOptions::new().write(true).open(&path)?;
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
        } else if !contents.is_empty() && !contents.ends_with('\n') {
            // Last record parsed but lost its newline; terminate it before appending
            let mut file = OpenOptions::new().append(true).open(&path)?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }

        let writer = OpenOptions::new().create(true).append(true).open(&path)?;

        info!(path = %path.display(), events = index.len(), "Opened event log");

        Ok(Self {
            path,
            writer: Mutex::new(writer),
            index: RwLock::new(index),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Immutable view of the current events
    pub fn snapshot(&self) -> Arc<Vec<Event>> {
        self.index.read().snapshot()
    }
}

#[async_trait]
impl EventLog for JsonlEventLog {
    async fn append(&self, event: Event) -> Result<u64> {
        // Appends are serialized on the writer; readers only wait for the final push.
        // The write and sync block the calling task on purpose: the record must be
        // on disk before the sequence is returned, and no await happens under the lock.
        let mut writer = self.writer.lock();

        let sequence = {
            let index = self.index.read();
            index.ensure_unique(&event.id)?;
            index.len() as u64 + 1
        };

        let record = LogRecord { seq: sequence, event };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let start = writer.metadata()?.len();
        if let Err(e) = writer.write_all(line.as_bytes()).and_then(|_| writer.sync_data()) {
            // Leave no partial record behind for the next open to trip over
            if let Err(truncate_err) = writer.set_len(start) {
                warn!(error = %truncate_err, "Failed to roll back partial event log record");
            }
            return Err(e.into());
        }

        let pushed = self.index.write().push(record.event);
        debug!(sequence = pushed, "Appended event to log file");
        Ok(pushed)
    }

    async fn events(&self) -> Result<Vec<Event>> {
        Ok(self.snapshot().as_ref().clone())
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<Event>> {
        let snapshot = self.snapshot();
        Ok(snapshot.iter().filter(|e| query.matches(e)).cloned().collect())
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.index.read().contains(id))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.index.read().len())
    }
}
