//! Engine configuration
//!
//! Everything tunable about the default chains, deserializable from JSON so
//! a host can ship a config file, with defaults matching the stock policy.
//! Configuration is read once at startup; chains built from it are never
//! mutated afterwards.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the admission engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Soft cap on concurrently active spawned agents
    #[serde(default = "default_max_active_agents")]
    pub max_active_agents: usize,

    /// Branches exempt from the naming rule and guarded against mutation
    #[serde(default = "default_protected_branches")]
    pub protected_branches: Vec<String>,

    /// Base branch review ranges are computed against
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Allowed `<type>` tokens for working-branch names
    #[serde(default = "default_branch_types")]
    pub branch_types: Vec<String>,

    /// Globs for paths that require delegation evidence before mutation
    #[serde(default = "default_guarded_paths")]
    pub guarded_paths: Vec<String>,

    /// Globs exempt from the delegation requirement regardless of transcript
    #[serde(default)]
    pub delegation_allow_list: Vec<String>,

    /// Substrings that count as spawn evidence in the transcript
    #[serde(default = "default_spawn_markers")]
    pub spawn_markers: Vec<String>,

    /// Directory of team-membership files; `None` disables the count
    /// (the governor then fails open)
    #[serde(default)]
    pub team_dir: Option<PathBuf>,
}

fn default_max_active_agents() -> usize {
    3
}

fn default_protected_branches() -> Vec<String> {
    vec!["main".to_string(), "master".to_string()]
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_branch_types() -> Vec<String> {
    ["feat", "fix", "chore", "docs", "refactor", "test", "perf", "ci"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_guarded_paths() -> Vec<String> {
    vec!["src/**".to_string(), "crates/**".to_string()]
}

fn default_spawn_markers() -> Vec<String> {
    vec!["\"subagent_type\"".to_string()]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_active_agents: default_max_active_agents(),
            protected_branches: default_protected_branches(),
            base_branch: default_base_branch(),
            branch_types: default_branch_types(),
            guarded_paths: default_guarded_paths(),
            delegation_allow_list: Vec::new(),
            spawn_markers: default_spawn_markers(),
            team_dir: None,
        }
    }
}

impl EngineConfig {
    /// Set the team-membership directory
    pub fn with_team_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.team_dir = Some(dir.into());
        self
    }

    /// Set the agent concurrency cap
    pub fn with_max_active_agents(mut self, cap: usize) -> Self {
        self.max_active_agents = cap;
        self
    }

    /// Set the delegation allow-list globs
    pub fn with_delegation_allow_list(mut self, globs: Vec<String>) -> Self {
        self.delegation_allow_list = globs;
        self
    }
}
