//! Branch-naming rule
//!
//! Working branches must look like `type/ticket-id-description` — lowercase,
//! hyphenated, with a closed set of type tokens (e.g. `feat/eng-4-add-x`).
//! Protected branches are exempt here; they are governed by the
//! protected-refs rule instead. Detached HEAD and non-repo states are also
//! exempt, since there is no branch name to validate.

use regex::Regex;

use crate::core::{EngineError, EngineResult};
use crate::request::{ActionKind, ActionRequest};
use crate::state::StateSnapshot;

use super::{FailurePolicy, Rule, RuleOutcome};

pub struct BranchNamingRule {
    pattern: Regex,
    protected: Vec<String>,
    /// For the remediation hint in deny reasons
    types_hint: String,
}

impl BranchNamingRule {
    pub fn new(branch_types: &[String], protected: &[String]) -> EngineResult<Self> {
        if branch_types.is_empty() {
            return Err(EngineError::InvalidConfig(
                "branch-naming rule needs at least one branch type token".into(),
            ));
        }

        let alternation = branch_types.join("|");
        let pattern = Regex::new(&format!(
            r"^(?:{})/[a-z0-9]+(?:-[a-z0-9]+)+$",
            alternation
        ))
        .map_err(|e| EngineError::InvalidConfig(format!("branch pattern: {}", e)))?;

        Ok(Self {
            pattern,
            protected: protected.to_vec(),
            types_hint: alternation,
        })
    }
}

impl Rule for BranchNamingRule {
    fn name(&self) -> &str {
        "branch-naming"
    }

    fn failure_policy(&self) -> FailurePolicy {
        // No branch (detached HEAD, not a repo) means nothing to validate
        FailurePolicy::FailOpen
    }

    fn evaluate(
        &self,
        request: &ActionRequest,
        snapshot: &StateSnapshot<'_>,
    ) -> EngineResult<RuleOutcome> {
        if !matches!(
            request.kind,
            ActionKind::FileWrite | ActionKind::ShellCommand
        ) {
            return Ok(RuleOutcome::Pass);
        }

        let branch = match snapshot.current_branch() {
            Some(b) => b,
            None => return Ok(self.on_missing_state("current branch")),
        };

        if self.protected.iter().any(|p| p == branch) {
            return Ok(RuleOutcome::Pass);
        }

        if self.pattern.is_match(branch) {
            return Ok(RuleOutcome::Pass);
        }

        Ok(RuleOutcome::Deny(format!(
            "branch-naming: branch '{}' does not match the required \
             <type>/<ticket>-<description> shape (lowercase, hyphenated, \
             type one of: {}); rename it, e.g. `git branch -m feat/eng-4-add-x`",
            branch, self.types_hint
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testutil::{shell_request, spawn_request, StubGit};

    fn rule() -> BranchNamingRule {
        let types: Vec<String> = ["feat", "fix", "chore", "docs", "refactor", "test", "perf", "ci"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        BranchNamingRule::new(&types, &["main".to_string(), "master".to_string()]).unwrap()
    }

    fn eval(rule: &BranchNamingRule, git: &StubGit, cmd: &str) -> RuleOutcome {
        let snapshot = StateSnapshot::new(git, None, None);
        rule.evaluate(&shell_request(cmd), &snapshot).unwrap()
    }

    #[test]
    fn test_well_formed_branch_passes() {
        let git = StubGit::on_branch("feat/eng-4-add-x");
        assert_eq!(eval(&rule(), &git, "git commit -m x"), RuleOutcome::Pass);
    }

    #[test]
    fn test_malformed_branch_denied_with_hint() {
        let git = StubGit::on_branch("my-fix");
        match eval(&rule(), &git, "git commit -m x") {
            RuleOutcome::Deny(reason) => {
                assert!(reason.contains("my-fix"));
                assert!(reason.contains("<type>/<ticket>-<description>"));
            }
            other => panic!("expected Deny, got {:?}", other),
        }
    }

    #[test]
    fn test_uppercase_denied() {
        let git = StubGit::on_branch("feat/ENG-4-add-x");
        assert!(matches!(
            eval(&rule(), &git, "git commit"),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_unknown_type_token_denied() {
        let git = StubGit::on_branch("wip/eng-4-add-x");
        assert!(matches!(
            eval(&rule(), &git, "git commit"),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_protected_branch_exempt() {
        let git = StubGit::on_branch("main");
        assert_eq!(eval(&rule(), &git, "git commit"), RuleOutcome::Pass);
    }

    #[test]
    fn test_detached_head_exempt() {
        let git = StubGit::detached();
        assert_eq!(eval(&rule(), &git, "git commit"), RuleOutcome::Pass);
    }

    #[test]
    fn test_other_kinds_not_governed() {
        let git = StubGit::on_branch("my-fix");
        let snapshot = StateSnapshot::new(&git, None, None);
        let outcome = rule()
            .evaluate(&spawn_request("reviewer", Some("alpha")), &snapshot)
            .unwrap();
        assert_eq!(outcome, RuleOutcome::Pass);
    }
}
