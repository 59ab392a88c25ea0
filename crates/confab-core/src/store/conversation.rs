//! Conversation store — append-only persisted log of conversation turns.
//!
//! File format: JSONL, one turn per line:
//! `{"role":"user","message":"hello","timestamp":"..."}`
//!
//! Turns are immutable once written; `clear()` is the only deletion path.
//! Persistence errors propagate — an adapter must never silently build
//! context from a store it could not read.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::EngineError;
use crate::types::{ConversationTurn, Role};

/// Append-only conversation log with ordered reads.
pub struct ConversationStore {
    path: PathBuf,
    /// Single-writer discipline: appends and clears are serialized so turn
    /// ordering within one exchange (user then assistant) is preserved.
    write_lock: Mutex<()>,
}

impl ConversationStore {
    /// Open (or create the parent directory for) a store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(ConversationStore {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing JSONL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one immutable turn, stamped with the current time.
    pub fn append(&self, role: Role, message: &str) -> Result<ConversationTurn, EngineError> {
        let turn = ConversationTurn::new(role, message);
        let line = serde_json::to_string(&turn)?;

        let _guard = self.write_lock.lock().unwrap();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;

        debug!(role = %turn.role, chars = message.len(), "appended conversation turn");
        Ok(turn)
    }

    /// The most recent `count` turns, in **chronological** (oldest-first)
    /// order. Fewer if the log is shorter. Corrupt lines are skipped.
    pub fn last_n(&self, count: usize) -> Result<Vec<ConversationTurn>, EngineError> {
        let turns = self.read_all()?;
        let start = turns.len().saturating_sub(count);
        Ok(turns[start..].to_vec())
    }

    /// Number of stored turns.
    pub fn len(&self) -> Result<usize, EngineError> {
        Ok(self.read_all()?.len())
    }

    /// Whether the log holds no turns.
    pub fn is_empty(&self) -> Result<bool, EngineError> {
        Ok(self.len()? == 0)
    }

    /// Delete all turns. Idempotent — clearing an empty or missing log
    /// succeeds.
    pub fn clear(&self) -> Result<(), EngineError> {
        let _guard = self.write_lock.lock().unwrap();
        std::fs::File::create(&self.path)?;
        debug!(path = %self.path.display(), "cleared conversation store");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<ConversationTurn>, EngineError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut turns = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ConversationTurn>(line) {
                Ok(turn) => turns.push(turn),
                Err(e) => {
                    // Tolerate a torn trailing line or manual edits.
                    warn!(error = %e, "skipping unparsable conversation line");
                }
            }
        }
        Ok(turns)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
