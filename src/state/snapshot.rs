//! Per-invocation state snapshot
//!
//! Rules read external facts through this snapshot rather than hitting
//! adapters directly. Each fact is fetched at most once per invocation and
//! memoized; nothing is ever cached across invocations, so every new request
//! sees fresh branch and membership state.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::git::{GitAdapter, ReviewState};
use super::teams;
use super::transcript;

/// Lazily populated, memoized view of external state for one invocation
///
/// Every accessor returns `Option`: `None` means the underlying fact is
/// unavailable, which each rule resolves through its declared failure
/// policy. An empty `Vec` or map is a present-but-empty fact, never `None`.
pub struct StateSnapshot<'a> {
    git: &'a dyn GitAdapter,
    transcript_path: Option<PathBuf>,
    team_dir: Option<PathBuf>,

    current_branch: OnceCell<Option<String>>,
    repo_root: OnceCell<Option<PathBuf>>,
    transcript_lines: OnceCell<Option<Vec<String>>>,
    team_member_counts: OnceCell<Option<HashMap<String, usize>>>,
}

impl<'a> StateSnapshot<'a> {
    pub fn new(
        git: &'a dyn GitAdapter,
        transcript_path: Option<PathBuf>,
        team_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            git,
            transcript_path,
            team_dir,
            current_branch: OnceCell::new(),
            repo_root: OnceCell::new(),
            transcript_lines: OnceCell::new(),
            team_member_counts: OnceCell::new(),
        }
    }

    /// Current branch; `None` for detached HEAD or outside a repository
    pub fn current_branch(&self) -> Option<&str> {
        self.current_branch
            .get_or_init(|| self.git.current_branch())
            .as_deref()
    }

    /// Repository root; `None` outside a repository
    pub fn repo_root(&self) -> Option<&Path> {
        self.repo_root
            .get_or_init(|| self.git.repo_root())
            .as_deref()
    }

    /// Transcript lines; `None` when no path was provided or the log is
    /// unreadable
    pub fn transcript_lines(&self) -> Option<&[String]> {
        self.transcript_lines
            .get_or_init(|| {
                let path = self.transcript_path.as_deref()?;
                match transcript::read_lines(path) {
                    Ok(lines) => Some(lines),
                    Err(e) => {
                        tracing::debug!("{}", e);
                        None
                    }
                }
            })
            .as_deref()
    }

    /// Active member counts per team; `None` when the team directory does
    /// not exist at all
    pub fn team_member_counts(&self) -> Option<&HashMap<String, usize>> {
        self.team_member_counts
            .get_or_init(|| {
                let dir = self.team_dir.as_deref()?;
                teams::team_member_counts(dir)
            })
            .as_ref()
    }

    /// Sum of active members across all teams; `None` when the team
    /// directory is missing
    pub fn total_active_agents(&self) -> Option<usize> {
        self.team_member_counts()
            .map(|counts| counts.values().sum())
    }

    /// Review status for a diff range, via the external review tool.
    ///
    /// Not memoized: different rules may ask about different ranges, and in
    /// practice at most one rule per chain consults this.
    pub fn review_status(&self, range: &str) -> Option<ReviewState> {
        self.git.review_status(range)
    }
}
