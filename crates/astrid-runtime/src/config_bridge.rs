//! Bridge from `astrid_config::Config` to the domain types the runtime,
//! permission manager, and LLM provider are built from.
//!
//! Keeping this conversion in one place means the CLI and any other
//! embedder translate a loaded `Config` into domain types exactly once.

use astrid_approval::request::PermissionScope;
use astrid_approval::PermissionManager;
use astrid_config::{ApprovalScopeConfig, Config, RunConfig};
use astrid_llm::ProviderConfig;

use crate::runtime::RuntimeConfig;

/// Convert config into the [`RuntimeConfig`] an [`crate::AgentRuntime`] is built with.
#[must_use]
pub fn to_runtime_config(cfg: &Config) -> RuntimeConfig {
    RuntimeConfig {
        run: cfg.run.clone(),
        context: cfg.context.clone(),
        retry: cfg.retry.clone(),
    }
}

/// Convert a run config and an externally-sourced API key into a
/// [`ProviderConfig`]. The key is not part of `RunConfig`; callers resolve
/// it from the environment or a secrets store before calling this.
#[must_use]
pub fn to_provider_config(run: &RunConfig, api_key: impl Into<String>) -> ProviderConfig {
    ProviderConfig::new(api_key, run.model.clone()).temperature(run.temperature)
}

fn to_permission_scope(scope: ApprovalScopeConfig) -> PermissionScope {
    match scope {
        ApprovalScopeConfig::Always => PermissionScope::Always,
        ApprovalScopeConfig::Session => PermissionScope::Session,
        ApprovalScopeConfig::Once => PermissionScope::Once,
        ApprovalScopeConfig::Never => PermissionScope::Never,
    }
}

/// Build a [`PermissionManager`] from config's allow/block lists and
/// per-tool scope overrides.
pub async fn to_permission_manager(cfg: &Config) -> PermissionManager {
    let manager = PermissionManager::new(to_permission_scope(cfg.permissions.default_scope));

    for tool in &cfg.permissions.allowlist {
        manager.allow(tool.clone()).await;
    }
    for tool in &cfg.permissions.blocklist {
        manager.block(tool.clone()).await;
    }
    for (tool, overrides) in &cfg.permissions.per_tool {
        if let Some(scope) = overrides.scope {
            manager.set_tool_scope(tool.clone(), to_permission_scope(scope)).await;
        }
    }

    manager
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_config_carries_run_and_context_sections_through() {
        let mut cfg = Config::default();
        cfg.run.max_iterations = 42;
        let runtime_config = to_runtime_config(&cfg);
        assert_eq!(runtime_config.run.max_iterations, 42);
    }

    #[test]
    fn provider_config_carries_model_and_temperature() {
        let mut cfg = Config::default();
        cfg.run.model = "claude-sonnet-4-20250514".to_owned();
        cfg.run.temperature = 0.3;
        let provider_config = to_provider_config(&cfg.run, "sk-test");
        assert_eq!(provider_config.model, "claude-sonnet-4-20250514");
        assert!((provider_config.temperature - 0.3).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn permission_manager_blocks_configured_tools() {
        let mut cfg = Config::default();
        cfg.permissions.blocklist.push("rm_rf".to_owned());
        let manager = to_permission_manager(&cfg).await;
        let result = manager
            .check_permission("rm_rf", &serde_json::json!({}), astrid_core::RiskLevel::Low)
            .await;
        assert!(!result.is_allowed());
    }
}
