//! Per-stage audit logs.
//!
//! Every stage writes a plain-text log next to its checkpoint, one line per
//! employee describing the decision taken for that record. The same lines
//! are echoed through `tracing` so library users get process logs without
//! reading the artifacts.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::EngineResult;

/// Collects the audit lines of one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageLog {
    stage: &'static str,
    lines: Vec<String>,
}

impl StageLog {
    /// Creates an empty log for the named stage.
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            lines: Vec::new(),
        }
    }

    /// Appends one audit line and echoes it to `tracing`.
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!(stage = self.stage, "{line}");
        self.lines.push(line);
    }

    /// The accumulated lines, in insertion order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Writes the log next to a checkpoint file and returns the log path.
    pub fn write_beside(&self, checkpoint: &Path) -> EngineResult<PathBuf> {
        let path = log_path_for(checkpoint);
        let mut content = self.lines.join("\n");
        content.push('\n');
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

/// The audit log path for a checkpoint: same stem, `_log.txt` suffix.
pub fn log_path_for(checkpoint: &Path) -> PathBuf {
    let stem = checkpoint
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stage");
    checkpoint.with_file_name(format!("{stem}_log.txt"))
}
