//! Shared scaffolding for scenario tests (SPEC_FULL §8's worked examples).

use std::path::PathBuf;
use std::sync::Arc;

use astrid_approval::request::PermissionScope;
use astrid_approval::PermissionManager;
use astrid_audit::AuditLog;
use astrid_config::{ContextConfig, RetrySection, RunConfig};
use astrid_events::EventBus;
use astrid_hooks::HookManager;
use astrid_llm::EchoProvider;
use astrid_runtime::{AgentRuntime, RuntimeConfig};
use astrid_storage::MemorySessionStore;
use astrid_tools::ToolRegistry;

/// Build a runtime wired to a fresh `EchoProvider` and the given tool registry.
#[must_use]
pub fn build_runtime(provider: EchoProvider, tools: ToolRegistry) -> Arc<AgentRuntime<EchoProvider>> {
    let config = RuntimeConfig {
        run: RunConfig::default(),
        context: ContextConfig::default(),
        retry: RetrySection::default(),
    };
    Arc::new(AgentRuntime::new(
        Arc::new(provider),
        Arc::new(tools),
        Arc::new(PermissionManager::new(PermissionScope::Always)),
        Arc::new(HookManager::new()),
        Arc::new(MemorySessionStore::new()),
        Arc::new(EventBus::new()),
        Arc::new(AuditLog::in_memory()),
        PathBuf::from("."),
        config,
    ))
}
