//! Git state adapter
//!
//! Shells out to `git` for branch facts and to the optional `git-review`
//! binary for review status. Everything here is read-only: the adapter never
//! stages, commits or touches refs.

use std::path::PathBuf;
use std::process::Command;

use regex::Regex;

/// Review progress for a diff range, as reported by the external review tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewState {
    pub reviewed: usize,
    pub unreviewed: usize,
    pub stale: usize,
}

impl ReviewState {
    /// True when nothing is left unreviewed and nothing went stale.
    pub fn is_fully_reviewed(&self) -> bool {
        self.unreviewed == 0 && self.stale == 0
    }
}

/// Read-only view of version-control state
///
/// `None` consistently means "unavailable" (not a repo, detached HEAD, tool
/// not installed), never "empty".
pub trait GitAdapter: Send + Sync {
    /// Current branch name; `None` for detached HEAD or outside a repo
    fn current_branch(&self) -> Option<String>;

    /// Repository root; `None` outside a repo
    fn repo_root(&self) -> Option<PathBuf>;

    /// Review status for a diff range via the external review tool;
    /// `None` when the tool is not installed or gave no usable answer
    fn review_status(&self, range: &str) -> Option<ReviewState>;
}

/// Adapter backed by the `git` and `git-review` CLIs
pub struct CliGitAdapter {
    /// Directory git commands run in
    working_dir: PathBuf,
}

impl CliGitAdapter {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    fn git(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.working_dir)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        String::from_utf8(output.stdout)
            .ok()
            .map(|s| s.trim().to_string())
    }

    /// Detect the default branch: origin/HEAD, then main, then master.
    pub fn detect_default_branch(&self) -> Option<String> {
        if let Some(symbolic) = self.git(&["symbolic-ref", "refs/remotes/origin/HEAD"]) {
            if let Some(branch) = symbolic.strip_prefix("refs/remotes/origin/") {
                return Some(branch.to_string());
            }
        }

        for candidate in ["main", "master"] {
            if self.git(&["rev-parse", "--verify", candidate]).is_some() {
                return Some(candidate.to_string());
            }
        }

        None
    }
}

impl GitAdapter for CliGitAdapter {
    fn current_branch(&self) -> Option<String> {
        let name = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        // rev-parse prints the literal "HEAD" when detached
        if name.is_empty() || name == "HEAD" {
            return None;
        }
        Some(name)
    }

    fn repo_root(&self) -> Option<PathBuf> {
        self.git(&["rev-parse", "--show-toplevel"]).map(PathBuf::from)
    }

    fn review_status(&self, range: &str) -> Option<ReviewState> {
        if validate_git_ref(range).is_err() {
            tracing::debug!("refusing to pass invalid ref '{}' to git-review", range);
            return None;
        }

        let output = Command::new("git-review")
            .arg("status")
            .arg(range)
            .current_dir(&self.working_dir)
            .output();

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                // Tool not installed; callers fail open by contract.
                tracing::debug!("git-review unavailable: {}", e);
                return None;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_review_status(&stdout)
    }
}

/// Validate a git ref to prevent shell injection (only for user-supplied refs).
pub fn validate_git_ref(ref_str: &str) -> Result<(), String> {
    if ref_str.is_empty() {
        return Err("empty git ref".to_string());
    }

    for ch in ref_str.chars() {
        if !ch.is_alphanumeric()
            && !matches!(
                ch,
                '-' | '_' | '/' | '.' | '~' | '^' | '@' | ':' | '{' | '}'
            )
        {
            return Err(format!("invalid character in git ref: '{}'", ch));
        }
    }

    Ok(())
}

/// Parse the review tool's progress summary.
///
/// Understands the summary block:
/// ```text
///   Reviewed:   3/5 (60.0%)
///   Unreviewed: 1
///   Stale:      1
/// ```
/// and the "No changes to review" case (trivially fully reviewed).
fn parse_review_status(stdout: &str) -> Option<ReviewState> {
    if stdout.contains("No changes to review") {
        return Some(ReviewState {
            reviewed: 0,
            unreviewed: 0,
            stale: 0,
        });
    }

    let reviewed_re = Regex::new(r"Reviewed:\s+(\d+)").ok()?;
    let unreviewed_re = Regex::new(r"Unreviewed:\s+(\d+)").ok()?;
    let stale_re = Regex::new(r"Stale:\s+(\d+)").ok()?;

    let grab = |re: &Regex| -> Option<usize> {
        re.captures(stdout)?.get(1)?.as_str().parse().ok()
    };

    Some(ReviewState {
        reviewed: grab(&reviewed_re)?,
        unreviewed: grab(&unreviewed_re)?,
        stale: grab(&stale_re)?,
    })
}
