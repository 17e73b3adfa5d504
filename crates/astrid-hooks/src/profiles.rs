//! Hook profiles - predefined hook configurations.

use serde::{Deserialize, Serialize};

use crate::hook::{Hook, HookEvent, HookFailureMode, HookHandler};

/// A profile containing a set of hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookProfile {
    /// Profile name.
    pub name: String,
    /// Profile description.
    pub description: String,
    /// Hooks in this profile.
    pub hooks: Vec<Hook>,
}

impl HookProfile {
    /// Create a new hook profile.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            hooks: Vec::new(),
        }
    }

    /// Add a hook to the profile.
    #[must_use]
    pub fn with_hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Create a minimal profile with no hooks.
    #[must_use]
    pub fn minimal() -> Self {
        Self::new("minimal", "Minimal profile with no hooks")
    }

    /// Create a logging profile that logs iteration and tool-call events.
    #[must_use]
    pub fn logging() -> Self {
        Self::new("logging", "Profile that logs iteration and tool events to stdout")
            .with_hook(
                Hook::new(HookEvent::BeforeIteration)
                    .with_name("log-iteration-start")
                    .with_handler(HookHandler::Command {
                        command: "echo".to_string(),
                        args: vec!["[astrid] iteration starting: $ASTRID_SESSION_ID".to_string()],
                        env: std::collections::HashMap::new(),
                        working_dir: None,
                    })
                    .with_fail_action(HookFailureMode::Ignore),
            )
            .with_hook(
                Hook::new(HookEvent::BeforeTool)
                    .with_name("log-tool-call")
                    .with_handler(HookHandler::Command {
                        command: "echo".to_string(),
                        args: vec!["[astrid] tool call: $ASTRID_HOOK_DATA".to_string()],
                        env: std::collections::HashMap::new(),
                        working_dir: None,
                    })
                    .with_fail_action(HookFailureMode::Ignore),
            )
    }

    /// Create a security profile that blocks dangerous tool names before
    /// they execute.
    #[must_use]
    pub fn security() -> Self {
        Self::new(
            "security",
            "Profile that blocks known-dangerous tools before execution",
        )
        .with_hook(
            Hook::new(HookEvent::BeforeTool)
                .with_name("block-dangerous-tools")
                .with_description("Block execution of potentially dangerous tools")
                .with_handler(HookHandler::Command {
                    command: "sh".to_string(),
                    args: vec![
                        "-c".to_string(),
                        r#"
                        TOOL=$(echo "$ASTRID_HOOK_DATA" | grep -o '"tool_name":"[^"]*"' | cut -d'"' -f4)
                        case "$TOOL" in
                            rm|sudo|chmod|chown|mkfs|dd)
                                echo "block: dangerous tool '$TOOL' blocked by security policy"
                                ;;
                            *)
                                echo "continue"
                                ;;
                        esac
                        "#
                        .to_string(),
                    ],
                    env: std::collections::HashMap::new(),
                    working_dir: None,
                })
                .with_fail_action(HookFailureMode::Fail)
                .with_timeout(5),
        )
    }

    /// Create a development profile with debugging helpers.
    #[must_use]
    pub fn development() -> Self {
        Self::new(
            "development",
            "Profile for development with debugging helpers",
        )
        .with_hook(
            Hook::new(HookEvent::BeforeTool)
                .with_name("debug-tool-calls")
                .with_handler(HookHandler::Command {
                    command: "sh".to_string(),
                    args: vec![
                        "-c".to_string(),
                        r#"echo "[debug] tool call at $(date): $ASTRID_HOOK_DATA" >> /tmp/astrid-debug.log"#.to_string(),
                    ],
                    env: std::collections::HashMap::new(),
                    working_dir: None,
                })
                .with_fail_action(HookFailureMode::Ignore),
        )
        .with_hook(
            Hook::new(HookEvent::AfterTool)
                .with_name("debug-tool-results")
                .with_handler(HookHandler::Command {
                    command: "sh".to_string(),
                    args: vec![
                        "-c".to_string(),
                        r#"echo "[debug] tool result at $(date): $ASTRID_HOOK_DATA" >> /tmp/astrid-debug.log"#.to_string(),
                    ],
                    env: std::collections::HashMap::new(),
                    working_dir: None,
                })
                .with_fail_action(HookFailureMode::Ignore),
        )
    }
}

/// Get a profile by name.
#[must_use]
pub fn get_profile(name: &str) -> Option<HookProfile> {
    match name {
        "minimal" => Some(HookProfile::minimal()),
        "logging" => Some(HookProfile::logging()),
        "security" => Some(HookProfile::security()),
        "development" => Some(HookProfile::development()),
        _ => None,
    }
}

/// List available built-in profile names.
#[must_use]
pub fn available_profiles() -> Vec<&'static str> {
    vec!["minimal", "logging", "security", "development"]
}
