//! State adapters and the per-invocation snapshot
//!
//! Read-only accessors for the external facts rules may consult:
//! - `git` - current branch, repo root, external review status
//! - `transcript` - session transcript log
//! - `teams` - team-membership files for the spawn governor
//! - `snapshot` - lazy, memoized view over all of the above
//!
//! Adapters never mutate external state. Every accessor distinguishes
//! "absent" from "empty"; rules resolve absence through their declared
//! failure policy, never by treating it as false.

pub mod git;
pub mod snapshot;
pub mod teams;
pub mod transcript;

pub use git::{CliGitAdapter, GitAdapter, ReviewState};
pub use snapshot::StateSnapshot;
pub use teams::{active_count, list_team_configs, team_member_counts};
pub use transcript::{read_lines, TranscriptUnavailable};
