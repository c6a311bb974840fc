//! Chain executor
//!
//! A `Chain` is the ordered list of rules bound to one action kind. Order is
//! the policy: the first terminal outcome (`Deny`/`Ask`) wins and nothing
//! downstream can waive it, so reordering rules is a policy change, not a
//! refactor. Chains are built once at startup and read-only afterwards.

use std::sync::Arc;

use crate::decision::Decision;
use crate::request::{ActionKind, ActionRequest};
use crate::rules::{FailurePolicy, Rule, RuleOutcome};
use crate::state::StateSnapshot;

/// Named, ordered rule sequence for one action kind
pub struct Chain {
    name: String,
    kind: ActionKind,
    rules: Vec<Arc<dyn Rule>>,
}

impl Chain {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            rules: Vec::new(),
        }
    }

    /// Append a rule; declaration order is evaluation order.
    pub fn with_rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate the chain.
    ///
    /// Rules run in declared order. `Advise` accumulates and continues;
    /// `Pass`/`Allow` continue; the first `Deny`/`Ask` stops the chain and
    /// becomes the verdict, carrying the advisories gathered so far. A chain
    /// that runs to completion allows.
    ///
    /// A rule that errors internally never crashes the invocation: the error
    /// is logged and mapped through the rule's declared failure policy —
    /// fail-open rules are skipped as if they passed, fail-secure rules deny.
    pub fn evaluate(&self, request: &ActionRequest, snapshot: &StateSnapshot<'_>) -> Decision {
        let mut advisories = Vec::new();

        for rule in &self.rules {
            let outcome = match rule.evaluate(request, snapshot) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(
                        "rule '{}' in chain '{}' failed internally: {}",
                        rule.name(),
                        self.name,
                        e
                    );
                    match rule.failure_policy() {
                        FailurePolicy::FailOpen => RuleOutcome::Pass,
                        FailurePolicy::FailSecure => RuleOutcome::Deny(format!(
                            "{}: internal error while evaluating; refusing to proceed",
                            rule.name()
                        )),
                    }
                }
            };

            match outcome {
                RuleOutcome::Pass | RuleOutcome::Allow => {}
                RuleOutcome::Advise(message) => {
                    advisories.push(message);
                }
                RuleOutcome::Deny(reason) => {
                    tracing::info!(
                        "chain '{}' denied by '{}': {}",
                        self.name,
                        rule.name(),
                        reason
                    );
                    return Decision::deny(reason, advisories);
                }
                RuleOutcome::Ask(reason) => {
                    tracing::info!(
                        "chain '{}' escalated to ask by '{}': {}",
                        self.name,
                        rule.name(),
                        reason
                    );
                    return Decision::ask(reason, advisories);
                }
            }
        }

        Decision::allow(advisories)
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("rules", &self.rule_names())
            .finish()
    }
}
