//! JSONL transcript writer for conversation events.
//!
//! Each [`ConversationEvent`] becomes one JSON object per line. Object
//! payloads are merged with `type`, `seq` and an RFC 3339 `timestamp`;
//! any other payload is nested under `data`.

use relay_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

struct Sink {
    writer: BufWriter<File>,
    seq: u64,
}

/// JSONL conversation logger.
///
/// Thread-safe via a `Mutex`; flushed after every line and on `Drop`.
pub struct JsonlConversationLogger {
    sink: Mutex<Sink>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Create (or truncate) the transcript file, creating parent
    /// directories as needed.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::open(path.as_ref(), false)
    }

    /// Open the transcript file for appending, so several runs share it.
    pub fn append(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::open(path.as_ref(), true)
    }

    fn open(path: &Path, append: bool) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;

        Ok(Self {
            sink: Mutex::new(Sink {
                writer: BufWriter::new(file),
                seq: 0,
            }),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        sink.seq += 1;

        let record = match event.payload {
            serde_json::Value::Object(mut map) => {
                map.insert("type".to_string(), event.event_type.into());
                map.insert("seq".to_string(), sink.seq.into());
                map.insert("timestamp".to_string(), timestamp.into());
                serde_json::Value::Object(map)
            }
            other => serde_json::json!({
                "type": event.event_type,
                "seq": sink.seq,
                "timestamp": timestamp,
                "data": other,
            }),
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Err(e) = writeln!(sink.writer, "{}", line).and_then(|_| sink.writer.flush()) {
            warn!(path = %self.path.display(), "Could not write conversation log: {}", e);
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_object_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.conversation.jsonl");
        let logger = JsonlConversationLogger::create(&path).unwrap();

        logger.log(ConversationEvent::new(
            "conversation_started",
            json!({"task": "Check the balance", "tools": ["getAvailableMargin"]}),
        ));
        logger.log(ConversationEvent::new(
            "tool_call",
            json!({"turn": 1, "tool": "getAvailableMargin", "arguments": {}}),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0]["type"], "conversation_started");
        assert_eq!(records[0]["seq"], 1);
        assert_eq!(records[0]["task"], "Check the balance");
        assert_eq!(records[1]["type"], "tool_call");
        assert_eq!(records[1]["seq"], 2);
        assert_eq!(records[1]["tool"], "getAvailableMargin");

        let timestamp = records[0]["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_non_object_payload_goes_under_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scalar.jsonl");
        let logger = JsonlConversationLogger::create(&path).unwrap();

        logger.log(ConversationEvent::new("outcomes_sent", json!([1, 2])));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["type"], "outcomes_sent");
        assert_eq!(records[0]["data"], json!([1, 2]));
    }

    #[test]
    fn test_create_truncates_append_keeps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.jsonl");

        let logger = JsonlConversationLogger::create(&path).unwrap();
        logger.log(ConversationEvent::new("conversation_started", json!({})));
        drop(logger);

        let logger = JsonlConversationLogger::append(&path).unwrap();
        logger.log(ConversationEvent::new("conversation_started", json!({})));
        drop(logger);
        assert_eq!(read_lines(&path).len(), 2);

        let logger = JsonlConversationLogger::create(&path).unwrap();
        assert_eq!(logger.path(), path.as_path());
        drop(logger);
        assert!(read_lines(&path).is_empty());
    }

    #[test]
    fn test_create_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        assert!(JsonlConversationLogger::create(blocker.join("run.jsonl")).is_err());
    }
}
