//! Review-gate rule
//!
//! Merge/publish-like commands (merging, pushing a branch out) are only
//! admitted once the external review tool reports the branch fully reviewed
//! against its base. When the tool is not installed at all the rule fails
//! open — a documented, accepted weak point, on the grounds that an optional
//! binary's absence must not brick every merge.

use crate::core::EngineResult;
use crate::request::{ActionKind, ActionRequest};
use crate::state::StateSnapshot;

use super::protected_refs::parse_git_invocations;
use super::{FailurePolicy, Rule, RuleOutcome};

/// Verbs that publish or integrate work and therefore need a finished review
const PUBLISH_VERBS: &[&str] = &["merge", "push"];

pub struct ReviewGateRule {
    /// Base branch the review range is computed against
    base_branch: String,
}

impl ReviewGateRule {
    pub fn new(base_branch: impl Into<String>) -> Self {
        Self {
            base_branch: base_branch.into(),
        }
    }
}

impl Rule for ReviewGateRule {
    fn name(&self) -> &str {
        "review-gate"
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::FailOpen
    }

    fn evaluate(
        &self,
        request: &ActionRequest,
        snapshot: &StateSnapshot<'_>,
    ) -> EngineResult<RuleOutcome> {
        if request.kind != ActionKind::ShellCommand {
            return Ok(RuleOutcome::Pass);
        }

        let command = match request.command() {
            Some(c) => c,
            None => return Ok(RuleOutcome::Pass),
        };

        let is_publish = parse_git_invocations(command)
            .iter()
            .any(|inv| PUBLISH_VERBS.contains(&inv.verb.as_str()));
        if !is_publish {
            return Ok(RuleOutcome::Pass);
        }

        let branch = match snapshot.current_branch() {
            Some(b) => b.to_string(),
            None => return Ok(self.on_missing_state("current branch")),
        };

        // Publishing the base itself is the protected-refs rule's business
        if branch == self.base_branch {
            return Ok(RuleOutcome::Pass);
        }

        let range = format!("{}..{}", self.base_branch, branch);
        let status = match snapshot.review_status(&range) {
            Some(s) => s,
            // Review tool not installed: accepted fail-open
            None => return Ok(self.on_missing_state("external review status")),
        };

        if status.is_fully_reviewed() {
            Ok(RuleOutcome::Pass)
        } else {
            Ok(RuleOutcome::Deny(format!(
                "review-gate: branch '{}' is not fully reviewed against '{}' \
                 ({} reviewed, {} unreviewed, {} stale); finish the review first",
                branch, self.base_branch, status.reviewed, status.unreviewed, status.stale
            )))
        }
    }
}
