//! Resource governor
//!
//! Caps the number of concurrently active spawned agents across all teams.
//! Two independent checks share this rule because they share the same
//! state adapter:
//! - visibility: a spawn without a team label is denied outright — an agent
//!   the membership files cannot account for is a gap in the accounting,
//!   whatever the current count is
//! - the cap: sum of active members across every membership file must stay
//!   below the configured maximum
//!
//! The cap is soft by design. Membership files are written by other
//! processes; two near-simultaneous spawns can each read a count one below
//! the cap and both be admitted, overshooting by one. The engine takes no
//! locks over those files, so this read-then-decide race stays. Do not
//! "fix" it by adding locking here — the contract is best-effort
//! backpressure, and hosts rely on that.

use crate::core::EngineResult;
use crate::request::{ActionKind, ActionPayload, ActionRequest};
use crate::state::StateSnapshot;

use super::{FailurePolicy, Rule, RuleOutcome};

pub struct ResourceGovernorRule {
    max_active_agents: usize,
}

impl ResourceGovernorRule {
    pub fn new(max_active_agents: usize) -> Self {
        Self { max_active_agents }
    }
}

impl Rule for ResourceGovernorRule {
    fn name(&self) -> &str {
        "resource-governor"
    }

    fn failure_policy(&self) -> FailurePolicy {
        // A missing team directory means no agents were ever spawned
        FailurePolicy::FailOpen
    }

    fn evaluate(
        &self,
        request: &ActionRequest,
        snapshot: &StateSnapshot<'_>,
    ) -> EngineResult<RuleOutcome> {
        if request.kind != ActionKind::AgentSpawn {
            return Ok(RuleOutcome::Pass);
        }

        let (agent_type, team_label) = match &request.payload {
            ActionPayload::AgentSpawn {
                agent_type,
                team_label,
            } => (agent_type, team_label),
            _ => return Ok(RuleOutcome::Pass),
        };

        // Visibility precondition, checked before the count on purpose:
        // it must fire even when the numeric cap would already deny
        if team_label.is_none() {
            return Ok(RuleOutcome::Deny(format!(
                "resource-governor: spawn of '{}' has no team label; unlabelled \
                 agents cannot be counted against the concurrency cap — add a \
                 team label to the spawn request",
                agent_type
            )));
        }

        let active = match snapshot.total_active_agents() {
            Some(n) => n,
            None => return Ok(self.on_missing_state("team-membership directory")),
        };

        if active >= self.max_active_agents {
            return Ok(RuleOutcome::Deny(format!(
                "resource-governor: {} agents already active (cap {}); wait for \
                 one to finish before spawning '{}'",
                active, self.max_active_agents, agent_type
            )));
        }

        Ok(RuleOutcome::Pass)
    }
}
