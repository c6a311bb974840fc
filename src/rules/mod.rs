//! Admission rules
//!
//! Contains:
//! - `RuleOutcome` - what a rule concluded about a request
//! - `FailurePolicy` - declared behavior when required state is absent
//! - `Rule` trait - the contract every rule implements
//! - concrete rules: branch naming, protected refs, delegation provenance,
//!   review gate, resource governor, advisory matchers
//!
//! Rules are pure: they read external facts only through the
//! [`StateSnapshot`](crate::state::StateSnapshot) and never mutate anything.

mod advisory;
mod branch;
mod delegation;
mod governor;
mod protected_refs;
mod review;

pub use advisory::{default_advisories, AdvisoryMatcher, AdvisoryRule};
pub use branch::BranchNamingRule;
pub use delegation::DelegationRule;
pub use governor::ResourceGovernorRule;
pub use protected_refs::ProtectedRefsRule;
pub use review::ReviewGateRule;

use crate::core::EngineResult;
use crate::request::ActionRequest;
use crate::state::StateSnapshot;

/// What a rule concluded about a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// No opinion; evaluation continues
    Pass,
    /// Explicit allow; evaluation continues (only to accumulate advisories)
    Allow,
    /// Terminal refusal with a human-readable reason
    Deny(String),
    /// Terminal, but asking the user for confirmation rather than refusing
    Ask(String),
    /// Non-blocking message; appended and evaluation continues
    Advise(String),
}

impl RuleOutcome {
    /// Terminal outcomes stop the chain
    pub fn is_terminal(&self) -> bool {
        matches!(self, RuleOutcome::Deny(_) | RuleOutcome::Ask(_))
    }
}

/// Declared behavior when a snapshot value the rule needs is absent
///
/// Every rule must pick one. This used to be an ad hoc decision buried in
/// each rule's code paths and was the most common source of inconsistent
/// behavior; making it a declared field keeps the choice reviewable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Treat absence as no opinion (e.g. an optional external tool)
    FailOpen,
    /// Treat absence as a denial (e.g. missing provenance evidence)
    FailSecure,
}

/// The contract every admission rule implements
///
/// `evaluate` returns `Err` only for genuinely unexpected internal failures;
/// *expected* absence of state is handled inside the rule via
/// [`Rule::on_missing_state`]. The chain converts an `Err` through the same
/// declared policy, so a buggy rule can never crash an invocation.
pub trait Rule: Send + Sync {
    /// Stable rule name, used in reasons and logs
    fn name(&self) -> &str;

    /// Declared fail-open/fail-secure policy
    fn failure_policy(&self) -> FailurePolicy;

    /// Evaluate the rule against a request and snapshot
    fn evaluate(
        &self,
        request: &ActionRequest,
        snapshot: &StateSnapshot<'_>,
    ) -> EngineResult<RuleOutcome>;

    /// Resolve absent state through the declared policy
    fn on_missing_state(&self, what: &str) -> RuleOutcome {
        match self.failure_policy() {
            FailurePolicy::FailOpen => {
                tracing::debug!("{}: {} unavailable, failing open", self.name(), what);
                RuleOutcome::Pass
            }
            FailurePolicy::FailSecure => RuleOutcome::Deny(format!(
                "{}: required state unavailable ({}); refusing to proceed without it",
                self.name(),
                what
            )),
        }
    }
}
