//! Decisions and the wire protocol
//!
//! The engine's single output: a verdict, an optional reason, and zero or
//! more advisories. Serialized as one JSON record on stdout; hosts that key
//! off process exit codes instead use [`Decision::exit_code`].

use serde::{Deserialize, Serialize};

/// Exit code signalling "block this action" to exit-code-driven hosts
pub const EXIT_BLOCK: i32 = 2;
/// Exit code signalling "proceed"
pub const EXIT_PROCEED: i32 = 0;

/// Terminal verdict for an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Proceed (including advisory-only outcomes)
    Allow,
    /// Refuse
    Deny,
    /// Proceed only with user confirmation
    Ask,
}

/// The engine's decision for one action request
///
/// Created fresh per invocation, emitted once, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    /// Human-readable policy reason; always present for deny/ask
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Non-blocking messages, additive to any verdict
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<String>,
}

impl Decision {
    pub fn allow(advisories: Vec<String>) -> Self {
        Self {
            verdict: Verdict::Allow,
            reason: None,
            advisories,
        }
    }

    pub fn deny(reason: impl Into<String>, advisories: Vec<String>) -> Self {
        Self {
            verdict: Verdict::Deny,
            reason: Some(reason.into()),
            advisories,
        }
    }

    pub fn ask(reason: impl Into<String>, advisories: Vec<String>) -> Self {
        Self {
            verdict: Verdict::Ask,
            reason: Some(reason.into()),
            advisories,
        }
    }

    /// Exit-status convention for hosts that do not parse the record:
    /// 0 = proceed, 2 = block. Advisories never affect the code.
    pub fn exit_code(&self) -> i32 {
        match self.verdict {
            Verdict::Allow => EXIT_PROCEED,
            Verdict::Deny | Verdict::Ask => EXIT_BLOCK,
        }
    }

    /// Render the wire record.
    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
