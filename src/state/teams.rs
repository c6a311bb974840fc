//! Team-membership adapter
//!
//! Each spawned agent team keeps a JSON config listing its members; the
//! resource governor sums active members across every team to enforce the
//! concurrency cap. Error handling is deliberately lopsided:
//! - a missing team directory means no agents were ever spawned (fail-open)
//! - an individual unreadable file is skipped and counted as zero
//!
//! The files are written by other processes while we read them; see the
//! governor for why that race is accepted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One member of a team config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    #[serde(default)]
    pub agent_type: Option<String>,
    /// Whether the member is currently running
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A team-membership file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

/// List team config files (`*.json`) under the team directory.
///
/// Returns `None` when the directory itself does not exist — distinct from
/// an existing-but-empty directory, which returns `Some(vec![])`.
pub fn list_team_configs(dir: &Path) -> Option<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).ok()?;

    let mut configs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();

    // Stable ordering so two reads of the same directory agree
    configs.sort();
    Some(configs)
}

/// Count active members in one team config file.
pub fn active_count(config_path: &Path) -> Result<usize, String> {
    let content = std::fs::read_to_string(config_path)
        .map_err(|e| format!("{}: {}", config_path.display(), e))?;

    let config: TeamConfig = serde_json::from_str(&content)
        .map_err(|e| format!("{}: {}", config_path.display(), e))?;

    Ok(config.members.iter().filter(|m| m.active).count())
}

/// Active member counts per team, keyed by team name (file stem as fallback).
///
/// `None` when the directory is missing entirely. Unreadable individual files
/// are logged and skipped.
pub fn team_member_counts(dir: &Path) -> Option<HashMap<String, usize>> {
    let configs = list_team_configs(dir)?;

    let mut counts = HashMap::new();
    for path in configs {
        match active_count(&path) {
            Ok(count) => {
                let team = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                counts.insert(team, count);
            }
            Err(e) => {
                // Treated as zero rather than failing the whole read
                tracing::debug!("skipping unreadable team config: {}", e);
            }
        }
    }

    Some(counts)
}
