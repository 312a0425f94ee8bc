use midi_core::{LedgerError, LedgerEvent, SlotNumber, TransactionHash};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One committed transaction's worth of events, keyed by transaction hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// The transaction that emitted these events
    pub transaction_hash: TransactionHash,

    /// The slot the transaction committed in
    pub slot: SlotNumber,

    /// Timestamp when the transaction was processed (Unix seconds)
    pub timestamp: u64,

    /// Events in emission order
    pub events: Vec<LedgerEvent>,
}

/// A basic file-based append-only event log
///
/// Each committed transaction is appended as a length-prefixed bincode frame.
/// External observers replay the file to consume the full event history; the
/// ledger itself never reads it back.
pub struct FileEventLog {
    /// Path to the log file
    path: Arc<Mutex<PathBuf>>,

    /// File handle for writing
    file: Arc<Mutex<Option<BufWriter<File>>>>,
}

impl FileEventLog {
    /// Create a new file-based event log
    pub fn new() -> Self {
        Self {
            path: Arc::new(Mutex::new(PathBuf::new())),
            file: Arc::new(Mutex::new(None)),
        }
    }

    /// Open (or create) the log file at `path` for appending
    pub fn init(&self, path: &Path) -> Result<(), LedgerError> {
        let mut file_guard = self
            .file
            .lock()
            .map_err(|e| LedgerError::EventLog(format!("Failed to acquire lock: {}", e)))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .map_err(|e| LedgerError::EventLog(format!("Failed to open log file: {}", e)))?;

        *file_guard = Some(BufWriter::new(file));

        let mut path_guard = self
            .path
            .lock()
            .map_err(|e| LedgerError::EventLog(format!("Failed to acquire path lock: {}", e)))?;
        *path_guard = path.to_path_buf();

        Ok(())
    }

    /// Append one committed transaction's record
    pub fn append(&self, record: &EventRecord) -> Result<(), LedgerError> {
        let mut file_guard = self
            .file
            .lock()
            .map_err(|e| LedgerError::EventLog(format!("Failed to acquire lock: {}", e)))?;

        let file = file_guard
            .as_mut()
            .ok_or_else(|| LedgerError::EventLog("Log has not been initialized".to_string()))?;

        let serialized = bincode::serialize(record)?;

        // Write the entry length and data
        let entry_len = serialized.len() as u64;
        file.write_all(&entry_len.to_le_bytes())?;
        file.write_all(&serialized)?;
        file.flush()?;

        Ok(())
    }

    /// Replay every record in the log file, in append order
    pub fn replay(&self) -> Result<Vec<EventRecord>, LedgerError> {
        let path_guard = self
            .path
            .lock()
            .map_err(|e| LedgerError::EventLog(format!("Failed to acquire path lock: {}", e)))?;

        if path_guard.as_os_str().is_empty() {
            return Err(LedgerError::EventLog(
                "Log has not been initialized".to_string(),
            ));
        }

        let file = File::open(path_guard.as_path())?;
        let mut reader = BufReader::new(file);
        let mut records = Vec::new();

        loop {
            let mut len_bytes = [0u8; 8];
            match reader.read_exact(&mut len_bytes) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let entry_len = u64::from_le_bytes(len_bytes) as usize;
            let mut entry = vec![0u8; entry_len];
            reader.read_exact(&mut entry)?;

            records.push(bincode::deserialize(&entry)?);
        }

        Ok(records)
    }
}

impl Default for FileEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midi_core::AccountId;

    fn record(slot: SlotNumber) -> EventRecord {
        EventRecord {
            transaction_hash: [slot as u8; 32],
            slot,
            timestamp: 1000 + slot,
            events: vec![LedgerEvent::Transfer {
                from: None,
                to: Some(AccountId::new([9; 32])),
                token_id: slot + 1,
            }],
        }
    }

    #[test]
    fn test_append_and_replay_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        let log = FileEventLog::new();
        log.init(&path).unwrap();
        log.append(&record(0)).unwrap();
        log.append(&record(1)).unwrap();
        log.append(&record(2)).unwrap();

        let replayed = log.replay().unwrap();
        assert_eq!(replayed, vec![record(0), record(1), record(2)]);
    }

    #[test]
    fn test_append_before_init_fails() {
        let log = FileEventLog::new();
        let err = log.append(&record(0)).unwrap_err();
        assert!(matches!(err, LedgerError::EventLog(_)));
    }

    #[test]
    fn test_replay_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        let log = FileEventLog::new();
        log.init(&path).unwrap();
        assert!(log.replay().unwrap().is_empty());
    }
}
