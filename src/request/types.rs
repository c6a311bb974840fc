//! Request types
//!
//! The raw records the host sends vary by source: field names differ per tool
//! and per lifecycle event. All of that variance is resolved once, at
//! normalization time; downstream code only ever sees these types and never
//! inspects raw JSON by field name again.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;

/// The supported action categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Writing or editing a file
    FileWrite,
    /// Running a shell command
    ShellCommand,
    /// Spawning a sub-agent
    AgentSpawn,
    /// Session starting up
    SessionStart,
    /// Session shutting down
    SessionStop,
    /// User submitting a prompt
    PromptSubmit,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::FileWrite => write!(f, "FileWrite"),
            ActionKind::ShellCommand => write!(f, "ShellCommand"),
            ActionKind::AgentSpawn => write!(f, "AgentSpawn"),
            ActionKind::SessionStart => write!(f, "SessionStart"),
            ActionKind::SessionStop => write!(f, "SessionStop"),
            ActionKind::PromptSubmit => write!(f, "PromptSubmit"),
        }
    }
}

/// Kind-specific payload fields
///
/// Optional fields stay optional: a missing `content` is represented as
/// `None`, never defaulted to an empty string, so rules can tell "absent"
/// from "empty".
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPayload {
    FileWrite {
        /// Target path as the host supplied it
        path: String,
        /// New content, absent for edits described only by diff
        content: Option<String>,
    },
    ShellCommand {
        command: String,
        description: Option<String>,
    },
    AgentSpawn {
        /// Requested sub-agent identity (e.g. "code-reviewer")
        agent_type: String,
        /// Team the spawn should be accounted under; absence is meaningful
        /// (the governor denies unlabelled spawns)
        team_label: Option<String>,
    },
    /// SessionStart / SessionStop carry no payload the engine acts on
    SessionEvent {
        reason: Option<String>,
    },
    PromptSubmit {
        prompt: String,
    },
}

/// Ambient fields available regardless of kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    /// Working directory of the session
    pub cwd: Option<PathBuf>,
    /// Session identifier
    pub session_id: Option<String>,
    /// Path to the session transcript log, if the host provided one
    pub transcript_path: Option<PathBuf>,
    /// Unrecognized top-level fields, preserved verbatim for rules that
    /// know about them
    pub extra: HashMap<String, Value>,
}

/// A normalized, immutable action request
///
/// Constructed once per invocation by [`normalize`](super::normalize);
/// payload fields are never renamed or coerced afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub payload: ActionPayload,
    pub context: RequestContext,
}

impl ActionRequest {
    /// The shell command string, if this is a shell-command action
    pub fn command(&self) -> Option<&str> {
        match &self.payload {
            ActionPayload::ShellCommand { command, .. } => Some(command),
            _ => None,
        }
    }

    /// The target path, if this is a file-write action
    pub fn target_path(&self) -> Option<&str> {
        match &self.payload {
            ActionPayload::FileWrite { path, .. } => Some(path),
            _ => None,
        }
    }
}
