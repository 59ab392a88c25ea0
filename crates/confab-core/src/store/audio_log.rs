//! Audio log store — persisted mapping from synthesized text to the
//! produced audio artifact path.
//!
//! Lookup key is the literal message text; the most recently recorded path
//! wins. A miss is an expected outcome (trigger fresh synthesis), never an
//! error.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::EngineError;
use crate::types::AudioLogEntry;

/// Append-only synthesis cache log.
pub struct AudioLogStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AudioLogStore {
    /// Open (or create the parent directory for) a store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(AudioLogStore {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing JSONL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record that `message` was synthesized to `audio_path`.
    pub fn record(&self, message: &str, audio_path: &str) -> Result<AudioLogEntry, EngineError> {
        let entry = AudioLogEntry::new(message, audio_path);
        let line = serde_json::to_string(&entry)?;

        let _guard = self.write_lock.lock().unwrap();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;

        debug!(path = %audio_path, "recorded audio log entry");
        Ok(entry)
    }

    /// The most recently recorded path for an exact text match.
    ///
    /// `Ok(None)` on a miss — callers treat that as "synthesize fresh".
    pub fn lookup(&self, message: &str) -> Result<Option<String>, EngineError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut found = None;
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AudioLogEntry>(line) {
                // Later lines are newer; keep overwriting
                Ok(entry) if entry.message == message => found = Some(entry.audio_path),
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "skipping unparsable audio log line");
                }
            }
        }
        Ok(found)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
