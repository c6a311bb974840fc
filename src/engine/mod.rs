//! The admission engine
//!
//! Ties the pipeline together: raw record -> normalizer -> chain executor
//! (reading state through the snapshot) -> decision. The engine owns the
//! chain configuration (built once at startup) and the git adapter; each
//! `run` builds a fresh snapshot so no state leaks between invocations.

mod config;

pub use config::EngineConfig;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::chain::Chain;
use crate::core::EngineResult;
use crate::decision::Decision;
use crate::request::{normalize, ActionKind, ActionRequest, NormalizationError};
use crate::rules::{
    default_advisories, BranchNamingRule, DelegationRule, ProtectedRefsRule,
    ResourceGovernorRule, ReviewGateRule, Rule,
};
use crate::state::{CliGitAdapter, GitAdapter, StateSnapshot};

pub struct Engine {
    config: EngineConfig,
    chains: HashMap<ActionKind, Chain>,
    git: Box<dyn GitAdapter>,
}

impl Engine {
    /// Build an engine with the stock chains and a CLI git adapter rooted at
    /// the current directory.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let cwd = std::env::current_dir()?;
        Self::with_adapter(config, Box::new(CliGitAdapter::new(cwd)))
    }

    /// Build an engine with an explicit git adapter (used by tests).
    pub fn with_adapter(config: EngineConfig, git: Box<dyn GitAdapter>) -> EngineResult<Self> {
        let chains = build_default_chains(&config)?;
        Ok(Self {
            config,
            chains,
            git,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The chain bound to a kind, if any.
    pub fn chain_for(&self, kind: ActionKind) -> Option<&Chain> {
        self.chains.get(&kind)
    }

    /// Run one invocation: normalize, snapshot, evaluate.
    ///
    /// A record too malformed to evaluate fails open — a broken integration
    /// must never itself become a blocking outage — but the problem is
    /// surfaced as an advisory so it does not pass silently.
    pub fn run(&self, raw: &Value) -> Decision {
        let request = match normalize(raw) {
            Ok(request) => request,
            // Tools outside the governed set (Read, Grep, ...) are not
            // malformed input; they just carry no admission policy
            Err(NormalizationError::UnknownTool(tool)) => {
                tracing::debug!("tool '{}' is not governed; allowing", tool);
                return Decision::allow(vec![]);
            }
            Err(e) => {
                tracing::warn!("failing open on unnormalizable input: {}", e);
                return Decision::allow(vec![format!(
                    "input record could not be evaluated ({}); admission checks were skipped",
                    e
                )]);
            }
        };

        self.decide(&request)
    }

    /// Evaluate an already-normalized request.
    pub fn decide(&self, request: &ActionRequest) -> Decision {
        let chain = match self.chains.get(&request.kind) {
            Some(chain) => chain,
            // Kinds with no configured chain (session lifecycle) proceed
            None => return Decision::allow(vec![]),
        };

        let snapshot = StateSnapshot::new(
            self.git.as_ref(),
            request.context.transcript_path.clone(),
            self.config.team_dir.clone(),
        );

        tracing::debug!("evaluating {} via chain '{}'", request.kind, chain.name());
        chain.evaluate(request, &snapshot)
    }
}

/// Build the stock chains.
///
/// The literal ordering below *is* the enforcement policy (first terminal
/// outcome wins); treat any reordering as a policy change and test it as
/// such.
fn build_default_chains(config: &EngineConfig) -> EngineResult<HashMap<ActionKind, Chain>> {
    let branch_naming: Arc<dyn Rule> = Arc::new(BranchNamingRule::new(
        &config.branch_types,
        &config.protected_branches,
    )?);
    let protected_refs: Arc<dyn Rule> =
        Arc::new(ProtectedRefsRule::new(&config.protected_branches));
    let delegation: Arc<dyn Rule> = Arc::new(DelegationRule::new(
        &config.guarded_paths,
        &config.delegation_allow_list,
        &config.spawn_markers,
    )?);
    let review_gate: Arc<dyn Rule> = Arc::new(ReviewGateRule::new(config.base_branch.clone()));
    let governor: Arc<dyn Rule> = Arc::new(ResourceGovernorRule::new(config.max_active_agents));

    let advisories: Vec<Arc<dyn Rule>> = default_advisories()?
        .into_iter()
        .map(|rule| Arc::new(rule) as Arc<dyn Rule>)
        .collect();

    let mut file_write = Chain::new("file-write", ActionKind::FileWrite)
        .with_rule(Arc::clone(&delegation))
        .with_rule(Arc::clone(&branch_naming));
    for advisory in &advisories {
        file_write = file_write.with_rule(Arc::clone(advisory));
    }

    let mut shell = Chain::new("shell-command", ActionKind::ShellCommand)
        .with_rule(Arc::clone(&protected_refs))
        .with_rule(Arc::clone(&branch_naming))
        .with_rule(Arc::clone(&delegation))
        .with_rule(Arc::clone(&review_gate));
    for advisory in &advisories {
        shell = shell.with_rule(Arc::clone(advisory));
    }

    let spawn = Chain::new("agent-spawn", ActionKind::AgentSpawn).with_rule(governor);

    let mut prompt = Chain::new("prompt-submit", ActionKind::PromptSubmit);
    for advisory in &advisories {
        prompt = prompt.with_rule(Arc::clone(advisory));
    }

    let mut chains = HashMap::new();
    chains.insert(ActionKind::FileWrite, file_write);
    chains.insert(ActionKind::ShellCommand, shell);
    chains.insert(ActionKind::AgentSpawn, spawn);
    chains.insert(ActionKind::PromptSubmit, prompt);
    Ok(chains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Verdict;
    use serde_json::json;

    use crate::rules::testutil::StubGit;

    fn engine_on_branch(branch: &str) -> Engine {
        Engine::with_adapter(
            EngineConfig::default(),
            Box::new(StubGit::on_branch(branch)),
        )
        .unwrap()
    }

    #[test]
    fn test_chain_order_is_the_declared_policy() {
        let engine = engine_on_branch("main");
        let shell = engine.chain_for(ActionKind::ShellCommand).unwrap();
        assert_eq!(
            shell.rule_names(),
            vec![
                "protected-refs",
                "branch-naming",
                "delegation",
                "review-gate",
                "advisory-credentials",
                "advisory-panic-prone",
                "advisory-navigation",
            ]
        );
    }

    #[test]
    fn test_unnormalizable_input_fails_open_with_advisory() {
        let engine = engine_on_branch("main");
        let decision = engine.run(&json!({"no": "discriminator"}));
        assert_eq!(decision.verdict, Verdict::Allow);
        assert_eq!(decision.advisories.len(), 1);
        assert!(decision.advisories[0].contains("could not be evaluated"));
    }

    #[test]
    fn test_ungoverned_tool_allows_quietly() {
        let engine = engine_on_branch("main");
        let decision = engine.run(&json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Read",
            "tool_input": {"file_path": "src/lib.rs"},
        }));
        assert_eq!(decision.verdict, Verdict::Allow);
        assert!(decision.advisories.is_empty());
    }

    #[test]
    fn test_session_lifecycle_has_no_chain_and_allows() {
        let engine = engine_on_branch("main");
        let decision = engine.run(&json!({"hook_event_name": "SessionStart"}));
        assert_eq!(decision.verdict, Verdict::Allow);
        assert!(decision.advisories.is_empty());
    }

    #[test]
    fn test_commit_on_malformed_branch_denied() {
        let engine = engine_on_branch("my-fix");
        let decision = engine.run(&json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "git commit -m x"},
        }));
        assert_eq!(decision.verdict, Verdict::Deny);
        assert!(decision.reason.unwrap().contains("<type>/<ticket>-<description>"));
    }

    #[test]
    fn test_push_to_main_denied_before_branch_naming_runs() {
        // protected-refs is first in the shell chain; its reason wins
        let engine = engine_on_branch("main");
        let decision = engine.run(&json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "git push origin main"},
        }));
        assert_eq!(decision.verdict, Verdict::Deny);
        assert!(decision.reason.unwrap().starts_with("protected-refs:"));
    }
}
