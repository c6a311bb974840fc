//! Request normalizer
//!
//! Converts the host's raw JSON record into a typed [`ActionRequest`]. The
//! record shape varies per event: tool-call events carry `tool_name` and
//! `tool_input`, lifecycle events carry only an event discriminator. This is
//! the single place in the engine allowed to look up raw fields by name.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use super::types::{ActionKind, ActionPayload, ActionRequest, RequestContext};

/// Failure to determine a kind or a structurally required payload field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("record has no recognizable event discriminator")]
    NoKind,
    #[error("unknown event '{0}'")]
    UnknownEvent(String),
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("missing required field '{field}' for {kind}")]
    MissingField { kind: &'static str, field: &'static str },
    #[error("record is not a JSON object")]
    NotAnObject,
}

/// Top-level fields consumed by the normalizer; everything else is preserved
/// under `context.extra`.
const KNOWN_FIELDS: &[&str] = &[
    "hook_event_name",
    "event",
    "tool_name",
    "tool_input",
    "cwd",
    "session_id",
    "transcript_path",
    "prompt",
    "reason",
];

/// Normalize a raw record into an [`ActionRequest`].
pub fn normalize(raw: &Value) -> Result<ActionRequest, NormalizationError> {
    let obj = raw.as_object().ok_or(NormalizationError::NotAnObject)?;

    let event = obj
        .get("hook_event_name")
        .or_else(|| obj.get("event"))
        .and_then(Value::as_str)
        .ok_or(NormalizationError::NoKind)?;

    let context = build_context(obj);

    let (kind, payload) = match event {
        "PreToolUse" | "PostToolUse" => {
            let tool = obj
                .get("tool_name")
                .and_then(Value::as_str)
                .ok_or(NormalizationError::MissingField {
                    kind: "tool event",
                    field: "tool_name",
                })?;
            let input = obj.get("tool_input").cloned().unwrap_or(Value::Null);
            normalize_tool(tool, &input)?
        }
        "UserPromptSubmit" => {
            let prompt = obj
                .get("prompt")
                .and_then(Value::as_str)
                .ok_or(NormalizationError::MissingField {
                    kind: "UserPromptSubmit",
                    field: "prompt",
                })?;
            (
                ActionKind::PromptSubmit,
                ActionPayload::PromptSubmit {
                    prompt: prompt.to_string(),
                },
            )
        }
        "SessionStart" => (
            ActionKind::SessionStart,
            ActionPayload::SessionEvent {
                reason: opt_string(obj.get("reason")),
            },
        ),
        "SessionEnd" | "Stop" => (
            ActionKind::SessionStop,
            ActionPayload::SessionEvent {
                reason: opt_string(obj.get("reason")),
            },
        ),
        other => return Err(NormalizationError::UnknownEvent(other.to_string())),
    };

    Ok(ActionRequest {
        kind,
        payload,
        context,
    })
}

/// Map a tool-call event to a kind and payload.
fn normalize_tool(
    tool: &str,
    input: &Value,
) -> Result<(ActionKind, ActionPayload), NormalizationError> {
    match tool {
        "Write" | "Edit" | "MultiEdit" | "NotebookEdit" => {
            let path = input
                .get("file_path")
                .or_else(|| input.get("path"))
                .and_then(Value::as_str)
                .ok_or(NormalizationError::MissingField {
                    kind: "FileWrite",
                    field: "file_path",
                })?;
            // Edits carry new_string rather than full content; both are
            // interesting to advisory matchers.
            let content = input
                .get("content")
                .or_else(|| input.get("new_string"))
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok((
                ActionKind::FileWrite,
                ActionPayload::FileWrite {
                    path: path.to_string(),
                    content,
                },
            ))
        }
        "Bash" => {
            let command = input
                .get("command")
                .and_then(Value::as_str)
                .ok_or(NormalizationError::MissingField {
                    kind: "ShellCommand",
                    field: "command",
                })?;
            Ok((
                ActionKind::ShellCommand,
                ActionPayload::ShellCommand {
                    command: command.to_string(),
                    description: opt_string(input.get("description")),
                },
            ))
        }
        "Task" => {
            let agent_type = input
                .get("subagent_type")
                .and_then(Value::as_str)
                .ok_or(NormalizationError::MissingField {
                    kind: "AgentSpawn",
                    field: "subagent_type",
                })?;
            let team_label = input
                .get("team_name")
                .or_else(|| input.get("team_label"))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            Ok((
                ActionKind::AgentSpawn,
                ActionPayload::AgentSpawn {
                    agent_type: agent_type.to_string(),
                    team_label,
                },
            ))
        }
        other => Err(NormalizationError::UnknownTool(other.to_string())),
    }
}

fn build_context(obj: &serde_json::Map<String, Value>) -> RequestContext {
    let extra: HashMap<String, Value> = obj
        .iter()
        .filter(|(k, _)| !KNOWN_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    RequestContext {
        cwd: obj.get("cwd").and_then(Value::as_str).map(PathBuf::from),
        session_id: opt_string(obj.get("session_id")),
        transcript_path: obj
            .get("transcript_path")
            .and_then(Value::as_str)
            .map(PathBuf::from),
        extra,
    }
}

fn opt_string(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str).map(str::to_string)
}
