//! Protected-ref rule
//!
//! Denies shell commands that would mutate a protected ref. Detection is by
//! name match over the command text, never by executing anything:
//! - verbs that rewrite the current branch (commit, reset, rebase, merge,
//!   commit --amend) are denied while the current branch is protected
//! - verbs that target a named ref (push, update-ref, branch -D) are denied
//!   when a protected name appears among their arguments
//!
//! Read-only verbs pass unconditionally.

use crate::core::EngineResult;
use crate::request::{ActionKind, ActionRequest};
use crate::state::StateSnapshot;

use super::{FailurePolicy, Rule, RuleOutcome};

/// One `git <verb> ...` invocation found inside a command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GitInvocation {
    pub verb: String,
    pub args: Vec<String>,
}

/// Extract every git invocation from a (possibly compound) command line.
///
/// Splits on shell separators, skips env-var prefixes and `git -C/-c`
/// global flags. Best-effort text analysis; quoting is not interpreted.
pub(crate) fn parse_git_invocations(command: &str) -> Vec<GitInvocation> {
    let mut invocations = Vec::new();

    for segment in command.split(&['&', ';', '|', '\n'][..]) {
        let tokens: Vec<&str> = segment.split_whitespace().collect();

        // Skip leading env assignments (FOO=bar git push ...)
        let mut idx = 0;
        while idx < tokens.len() && tokens[idx].contains('=') {
            idx += 1;
        }

        if tokens.get(idx) != Some(&"git") {
            continue;
        }
        idx += 1;

        // Skip global flags and their arguments
        while idx < tokens.len() && tokens[idx].starts_with('-') {
            if tokens[idx] == "-C" || tokens[idx] == "-c" {
                idx += 2;
            } else {
                idx += 1;
            }
        }

        if let Some(verb) = tokens.get(idx) {
            invocations.push(GitInvocation {
                verb: verb.to_string(),
                args: tokens[idx + 1..].iter().map(|t| t.to_string()).collect(),
            });
        }
    }

    invocations
}

/// Verbs that never mutate refs
const READ_ONLY_VERBS: &[&str] = &[
    "status", "log", "diff", "show", "fetch", "rev-parse", "rev-list", "blame", "grep",
    "ls-files", "ls-remote", "describe", "shortlog", "stash", "remote", "config",
];

/// Verbs that rewrite the branch currently checked out
const CURRENT_BRANCH_VERBS: &[&str] = &["commit", "reset", "rebase", "merge", "cherry-pick"];

/// Verbs that act on a ref named in their arguments
const NAMED_REF_VERBS: &[&str] = &["push", "update-ref", "branch"];

pub struct ProtectedRefsRule {
    protected: Vec<String>,
}

impl ProtectedRefsRule {
    pub fn new(protected: &[String]) -> Self {
        Self {
            protected: protected.to_vec(),
        }
    }

    fn is_protected(&self, name: &str) -> bool {
        // Also match remote-qualified forms like origin/main
        self.protected.iter().any(|p| {
            p == name
                || name
                    .rsplit_once('/')
                    .map(|(_, tail)| tail == p)
                    .unwrap_or(false)
        })
    }

    fn check_invocation(
        &self,
        inv: &GitInvocation,
        current_branch: Option<&str>,
    ) -> Option<String> {
        if READ_ONLY_VERBS.contains(&inv.verb.as_str()) {
            return None;
        }

        if CURRENT_BRANCH_VERBS.contains(&inv.verb.as_str()) {
            if let Some(branch) = current_branch {
                if self.is_protected(branch) {
                    return Some(format!(
                        "protected-refs: `git {}` would modify protected branch '{}'; \
                         create a working branch first",
                        inv.verb, branch
                    ));
                }
            }
        }

        if NAMED_REF_VERBS.contains(&inv.verb.as_str()) {
            // `git branch` without a mutating flag is a read-only listing
            if inv.verb == "branch"
                && !inv.args.iter().any(|a| {
                    matches!(
                        a.as_str(),
                        "-D" | "-d" | "-m" | "-M" | "-f" | "--delete" | "--force" | "--move"
                    )
                })
            {
                return None;
            }

            for arg in &inv.args {
                let name = arg.trim_start_matches('+');
                if name.starts_with('-') {
                    continue;
                }
                // Refspecs target their destination side: `HEAD:main` pushes
                // to main, `:main` deletes it on the remote
                let dst = name.split_once(':').map(|(_, d)| d).unwrap_or(name);
                if self.is_protected(dst) {
                    return Some(format!(
                        "protected-refs: `git {}` targets protected ref '{}'",
                        inv.verb, arg
                    ));
                }
            }
        }

        None
    }
}

impl Rule for ProtectedRefsRule {
    fn name(&self) -> &str {
        "protected-refs"
    }

    fn failure_policy(&self) -> FailurePolicy {
        // Name matching over the command text works without any git state;
        // only the current-branch checks need the snapshot
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

        let invocations = parse_git_invocations(command);
        if invocations.is_empty() {
            return Ok(RuleOutcome::Pass);
        }

        let branch = snapshot.current_branch();
        for inv in &invocations {
            if let Some(reason) = self.check_invocation(inv, branch) {
                return Ok(RuleOutcome::Deny(reason));
            }
        }

        Ok(RuleOutcome::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testutil::{shell_request, StubGit};

    fn rule() -> ProtectedRefsRule {
        ProtectedRefsRule::new(&["main".to_string(), "master".to_string()])
    }

    fn eval(git: &StubGit, cmd: &str) -> RuleOutcome {
        let snapshot = StateSnapshot::new(git, None, None);
        rule().evaluate(&shell_request(cmd), &snapshot).unwrap()
    }

    #[test]
    fn test_push_to_protected_denied() {
        let git = StubGit::on_branch("main");
        assert!(matches!(
            eval(&git, "git push origin main"),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_push_to_feature_allowed() {
        let git = StubGit::on_branch("feat/eng-4-add-x");
        assert_eq!(
            eval(&git, "git push origin feat/eng-4-add-x"),
            RuleOutcome::Pass
        );
    }

    #[test]
    fn test_forced_push_remote_qualified_denied() {
        let git = StubGit::on_branch("feat/eng-4-add-x");
        assert!(matches!(
            eval(&git, "git push --force origin/main"),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_commit_on_protected_branch_denied() {
        let git = StubGit::on_branch("main");
        match eval(&git, "git commit -m 'quick fix'") {
            RuleOutcome::Deny(reason) => assert!(reason.contains("main")),
            other => panic!("expected Deny, got {:?}", other),
        }
    }

    #[test]
    fn test_commit_on_feature_branch_allowed() {
        let git = StubGit::on_branch("feat/eng-4-add-x");
        assert_eq!(eval(&git, "git commit -m ok"), RuleOutcome::Pass);
    }

    #[test]
    fn test_read_only_verbs_always_pass() {
        let git = StubGit::on_branch("main");
        for cmd in [
            "git status",
            "git log --oneline main",
            "git diff main..HEAD",
            "git show main",
            "git branch",
        ] {
            assert_eq!(eval(&git, cmd), RuleOutcome::Pass, "cmd: {}", cmd);
        }
    }

    #[test]
    fn test_refspec_push_to_protected_denied() {
        let git = StubGit::on_branch("feat/eng-4-add-x");
        assert!(matches!(
            eval(&git, "git push origin HEAD:main"),
            RuleOutcome::Deny(_)
        ));
        // Destination side decides; pushing *from* main elsewhere is fine
        assert_eq!(
            eval(&git, "git push origin main:feat/eng-4-add-x"),
            RuleOutcome::Pass
        );
    }

    #[test]
    fn test_remote_delete_of_protected_denied() {
        let git = StubGit::on_branch("feat/eng-4-add-x");
        assert!(matches!(
            eval(&git, "git push origin :main"),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_branch_long_form_delete_denied() {
        let git = StubGit::on_branch("feat/eng-4-add-x");
        assert!(matches!(
            eval(&git, "git branch --delete --force main"),
            RuleOutcome::Deny(_)
        ));
        assert!(matches!(
            eval(&git, "git branch --move main old-main"),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_branch_delete_protected_denied() {
        let git = StubGit::on_branch("feat/eng-4-add-x");
        assert!(matches!(
            eval(&git, "git branch -D main"),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_compound_command_scanned() {
        let git = StubGit::on_branch("feat/eng-4-add-x");
        assert!(matches!(
            eval(&git, "cargo test && git push origin main"),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_non_git_command_passes() {
        let git = StubGit::on_branch("main");
        assert_eq!(eval(&git, "ls -la"), RuleOutcome::Pass);
    }

    #[test]
    fn test_no_branch_info_fails_open_for_name_checks() {
        let git = StubGit::detached();
        // Name match still applies without branch state
        assert!(matches!(
            eval(&git, "git push origin main"),
            RuleOutcome::Deny(_)
        ));
        // Current-branch checks fail open
        assert_eq!(eval(&git, "git commit -m x"), RuleOutcome::Pass);
    }

    #[test]
    fn test_parse_git_invocations() {
        let invs = parse_git_invocations("GIT_TRACE=1 git -C /repo push origin main");
        assert_eq!(invs.len(), 1);
        assert_eq!(invs[0].verb, "push");
        assert_eq!(invs[0].args, vec!["origin", "main"]);

        let invs = parse_git_invocations("echo hi; git status && git commit -m x");
        assert_eq!(invs.len(), 2);
        assert_eq!(invs[0].verb, "status");
        assert_eq!(invs[1].verb, "commit");
    }
}
