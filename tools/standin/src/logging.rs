//! JSONL event log for stand-in activity.
//!
//! Nothing is written unless a logger has been installed with
//! [`init_event_log`]. Follows the `OnceLock<Mutex<Option<…>>>` slot pattern.

use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent<'a> {
    pub level: &'a str,
    pub event_type: &'a str,
    pub payload: Value,
}

pub struct JsonlLogger {
    sink: Mutex<Box<dyn Write + Send>>,
    pub max_payload_bytes: usize,
}

impl JsonlLogger {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }

    /// A logger writing into memory, plus a handle for reading the lines back.
    pub fn in_memory() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::new(buffer.clone()), buffer)
    }

    pub fn append(&self, event: &LogEvent<'_>) -> io::Result<()> {
        let truncated = truncate_json(event.payload.clone(), self.max_payload_bytes);
        let line = serde_json::to_string(&LogEvent {
            level: event.level,
            event_type: event.event_type,
            payload: truncated,
        })?;

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(line.as_bytes())?;
        sink.write_all(b"\n")?;
        sink.flush()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

static EVENT_LOG: OnceLock<Mutex<Option<Arc<JsonlLogger>>>> = OnceLock::new();

fn event_log_slot() -> &'static Mutex<Option<Arc<JsonlLogger>>> {
    EVENT_LOG.get_or_init(|| Mutex::new(None))
}

pub fn init_event_log(logger: JsonlLogger) {
    *event_log_slot()
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(logger));
}

pub fn clear_event_log() {
    *event_log_slot()
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

/// Appends `event` to the installed logger, if any. Write failures are dropped.
pub fn emit_event(event: LogEvent<'_>) {
    let guard = event_log_slot()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(logger) = guard.as_ref() {
        let logger = Arc::clone(logger);
        drop(guard);
        let _ = logger.append(&event);
    }
}

fn truncate_json(value: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&value).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return value;
    }
    let mut cut = max_bytes.saturating_sub(3);
    while !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    Value::String(format!("{}...", &rendered[..cut]))
}
