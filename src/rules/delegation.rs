//! Delegation/provenance rule
//!
//! Mutations under guarded paths must be preceded by a delegated sub-task:
//! the session transcript has to contain a spawn-evidence marker before the
//! action is admitted. An explicit allow-list bypasses the requirement
//! regardless of transcript content.
//!
//! This is the integrity guarantee of the whole workflow, and the one rule
//! that must never fail open: an unreadable transcript is a denial, full
//! stop.

use glob::Pattern;

use crate::core::{EngineError, EngineResult};
use crate::request::{ActionKind, ActionRequest, ActionPayload};
use crate::state::StateSnapshot;

use super::{FailurePolicy, Rule, RuleOutcome};

pub struct DelegationRule {
    guarded: Vec<Pattern>,
    allow_list: Vec<Pattern>,
    spawn_markers: Vec<String>,
}

impl DelegationRule {
    pub fn new(
        guarded: &[String],
        allow_list: &[String],
        spawn_markers: &[String],
    ) -> EngineResult<Self> {
        let compile = |globs: &[String]| -> EngineResult<Vec<Pattern>> {
            globs
                .iter()
                .map(|g| {
                    Pattern::new(g)
                        .map_err(|e| EngineError::InvalidConfig(format!("glob '{}': {}", g, e)))
                })
                .collect()
        };

        Ok(Self {
            guarded: compile(guarded)?,
            allow_list: compile(allow_list)?,
            spawn_markers: spawn_markers.to_vec(),
        })
    }

    /// Candidate paths this request touches.
    ///
    /// For shell commands this is a best-effort scan of path-shaped tokens;
    /// quoting is not interpreted.
    fn candidate_paths<'r>(&self, request: &'r ActionRequest) -> Vec<&'r str> {
        match &request.payload {
            ActionPayload::FileWrite { path, .. } => vec![path.as_str()],
            ActionPayload::ShellCommand { command, .. } => command
                .split_whitespace()
                .filter(|t| !t.starts_with('-') && (t.contains('/') || t.contains('.')))
                .collect(),
            _ => vec![],
        }
    }

    /// Match a path against a pattern set, with and without repo-relative
    /// normalization.
    ///
    /// Hosts usually send absolute paths while the globs are repo-relative.
    /// When the repo root is known it is stripped; when it is not (git
    /// unavailable), every trailing component slice of an absolute path is
    /// tried instead, erring toward guarding rather than missing.
    fn matches_any(patterns: &[Pattern], path: &str, repo_root: Option<&str>) -> bool {
        let relative = repo_root
            .and_then(|root| path.strip_prefix(root))
            .map(|p| p.trim_start_matches('/'));
        let trimmed = path.trim_start_matches("./");

        patterns.iter().any(|pat| {
            if pat.matches(trimmed) || relative.map(|r| pat.matches(r)).unwrap_or(false) {
                return true;
            }
            if trimmed.starts_with('/') {
                return trimmed
                    .match_indices('/')
                    .any(|(i, _)| pat.matches(&trimmed[i + 1..]));
            }
            false
        })
    }
}

impl Rule for DelegationRule {
    fn name(&self) -> &str {
        "delegation"
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::FailSecure
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

        let repo_root = snapshot.repo_root().map(|p| p.to_string_lossy().to_string());
        let repo_root = repo_root.as_deref();

        let guarded_paths: Vec<&str> = self
            .candidate_paths(request)
            .into_iter()
            .filter(|p| Self::matches_any(&self.guarded, p, repo_root))
            .collect();

        if guarded_paths.is_empty() {
            return Ok(RuleOutcome::Pass);
        }

        // Allow-list bypass, regardless of transcript state
        if guarded_paths
            .iter()
            .all(|p| Self::matches_any(&self.allow_list, p, repo_root))
        {
            return Ok(RuleOutcome::Pass);
        }

        let lines = match snapshot.transcript_lines() {
            Some(lines) => lines,
            // The single fail-secure path in the rule set
            None => return Ok(self.on_missing_state("session transcript")),
        };

        let has_evidence = lines
            .iter()
            .any(|line| self.spawn_markers.iter().any(|m| line.contains(m.as_str())));

        if has_evidence {
            Ok(RuleOutcome::Pass)
        } else {
            Ok(RuleOutcome::Deny(format!(
                "delegation: '{}' is a guarded path and no sub-task spawn was found \
                 in the transcript; delegate this change to a sub-agent first",
                guarded_paths.join("', '")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testutil::{shell_request, write_request, StubGit};
    use std::io::Write;
    use std::path::PathBuf;

    fn rule() -> DelegationRule {
        DelegationRule::new(
            &["src/**".to_string(), "crates/**".to_string()],
            &["src/generated/**".to_string()],
            &["\"subagent_type\"".to_string()],
        )
        .unwrap()
    }

    fn transcript(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_guarded_write_with_evidence_allowed() {
        let git = StubGit::detached();
        let log = transcript(&[r#"{"tool":"Task","input":{"subagent_type":"coder"}}"#]);
        let snapshot = StateSnapshot::new(&git, Some(log.path().to_path_buf()), None);

        let outcome = rule()
            .evaluate(&write_request("src/main.rs", None), &snapshot)
            .unwrap();
        assert_eq!(outcome, RuleOutcome::Pass);
    }

    #[test]
    fn test_guarded_write_without_evidence_denied() {
        let git = StubGit::detached();
        let log = transcript(&[r#"{"tool":"Read","input":{}}"#]);
        let snapshot = StateSnapshot::new(&git, Some(log.path().to_path_buf()), None);

        match rule()
            .evaluate(&write_request("src/main.rs", None), &snapshot)
            .unwrap()
        {
            RuleOutcome::Deny(reason) => assert!(reason.contains("src/main.rs")),
            other => panic!("expected Deny, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_transcript_fails_secure() {
        let git = StubGit::detached();
        let snapshot = StateSnapshot::new(
            &git,
            Some(PathBuf::from("/nonexistent/transcript.jsonl")),
            None,
        );

        assert!(matches!(
            rule()
                .evaluate(&write_request("src/main.rs", None), &snapshot)
                .unwrap(),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_no_transcript_path_fails_secure() {
        let git = StubGit::detached();
        let snapshot = StateSnapshot::new(&git, None, None);

        assert!(matches!(
            rule()
                .evaluate(&write_request("src/main.rs", None), &snapshot)
                .unwrap(),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_allow_list_bypasses_missing_transcript() {
        let git = StubGit::detached();
        let snapshot = StateSnapshot::new(&git, None, None);

        let outcome = rule()
            .evaluate(&write_request("src/generated/schema.rs", None), &snapshot)
            .unwrap();
        assert_eq!(outcome, RuleOutcome::Pass);
    }

    #[test]
    fn test_unguarded_path_not_governed() {
        let git = StubGit::detached();
        let snapshot = StateSnapshot::new(&git, None, None);

        let outcome = rule()
            .evaluate(&write_request("README.md", None), &snapshot)
            .unwrap();
        assert_eq!(outcome, RuleOutcome::Pass);
    }

    #[test]
    fn test_shell_command_touching_guarded_path() {
        let git = StubGit::detached();
        let snapshot = StateSnapshot::new(&git, None, None);

        assert!(matches!(
            rule()
                .evaluate(&shell_request("sed -i s/a/b/ src/lib.rs"), &snapshot)
                .unwrap(),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_absolute_path_guarded_without_repo_root() {
        // No repo root to strip; the trailing components must still hit
        let git = StubGit::detached();
        let snapshot = StateSnapshot::new(&git, None, None);

        assert!(matches!(
            rule()
                .evaluate(
                    &write_request("/work/repo/src/widget.rs", None),
                    &snapshot
                )
                .unwrap(),
            RuleOutcome::Deny(_)
        ));
    }

    #[test]
    fn test_absolute_path_allow_listed_without_repo_root() {
        let git = StubGit::detached();
        let snapshot = StateSnapshot::new(&git, None, None);

        let outcome = rule()
            .evaluate(
                &write_request("/work/repo/src/generated/schema.rs", None),
                &snapshot,
            )
            .unwrap();
        assert_eq!(outcome, RuleOutcome::Pass);
    }

    #[test]
    fn test_dot_slash_prefix_normalized() {
        let git = StubGit::detached();
        let log = transcript(&["no evidence here"]);
        let snapshot = StateSnapshot::new(&git, Some(log.path().to_path_buf()), None);

        assert!(matches!(
            rule()
                .evaluate(&write_request("./src/main.rs", None), &snapshot)
                .unwrap(),
            RuleOutcome::Deny(_)
        ));
    }
}
