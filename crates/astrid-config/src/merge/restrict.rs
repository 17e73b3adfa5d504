use super::enforce::{
    block_workspace_expansion, clamp_max_int, enforce_mode_tighten, union_string_arrays,
};

/// Enforce that the workspace layer can only **tighten** permission and
/// budget fields relative to `baseline`, never loosen them. Call this after
/// merging the workspace layer but before final deserialization.
///
/// `baseline` is the merged config *before* the workspace layer was applied.
/// This ensures enforcement works even when no user config file exists: the
/// defaults serve as the baseline.
pub fn enforce_restrictions(
    merged: &mut toml::Value,
    baseline: &toml::Value,
    workspace_layer: &toml::Value,
) {
    // Loop limits: workspace can only shrink them.
    clamp_max_int(
        merged,
        baseline,
        workspace_layer,
        &["run", "max_iterations"],
        "run.max_iterations",
    );
    clamp_max_int(
        merged,
        baseline,
        workspace_layer,
        &["run", "max_execution_ms"],
        "run.max_execution_ms",
    );
    clamp_max_int(
        merged,
        baseline,
        workspace_layer,
        &["run", "max_tool_calls"],
        "run.max_tool_calls",
    );
    clamp_max_int(
        merged,
        baseline,
        workspace_layer,
        &["run", "max_input_messages"],
        "run.max_input_messages",
    );
    clamp_max_int(
        merged,
        baseline,
        workspace_layer,
        &["run", "error_handling", "max_consecutive_errors"],
        "run.error_handling.max_consecutive_errors",
    );

    // Default approval scope: cannot move toward a more permissive scope.
    enforce_mode_tighten(
        merged,
        baseline,
        workspace_layer,
        &["permissions", "default_scope"],
        "permissions.default_scope",
        &["never", "once", "session", "always"],
    );

    // Default risk: cannot move toward a less cautious classification.
    enforce_mode_tighten(
        merged,
        baseline,
        workspace_layer,
        &["permissions", "default_risk"],
        "permissions.default_risk",
        &["critical", "high", "medium", "low"],
    );

    // Blocklist: union only, workspace cannot un-block a tool.
    union_string_arrays(
        merged,
        baseline,
        workspace_layer,
        &["permissions", "blocklist"],
        "permissions.blocklist",
    );

    // Allowlist: workspace cannot add entries beyond the baseline.
    block_workspace_expansion(
        merged,
        baseline,
        workspace_layer,
        &["permissions", "allowlist"],
        "permissions.allowlist",
    );

    // Retry ceilings: workspace can only lower them.
    clamp_max_int(
        merged,
        baseline,
        workspace_layer,
        &["retry", "llm_max_attempts"],
        "retry.llm_max_attempts",
    );
    clamp_max_int(
        merged,
        baseline,
        workspace_layer,
        &["retry", "tool_max_attempts"],
        "retry.tool_max_attempts",
    );

    // Context thresholds: workspace can only make compaction more eager.
    clamp_max_int(
        merged,
        baseline,
        workspace_layer,
        &["context", "tool_pair_cap"],
        "context.tool_pair_cap",
    );
    clamp_max_int(
        merged,
        baseline,
        workspace_layer,
        &["context", "result_size_threshold_bytes"],
        "context.result_size_threshold_bytes",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toml_val(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_workspace_cannot_raise_max_iterations() {
        let baseline = toml_val("[run]\nmax_iterations = 10\n");
        let workspace = toml_val("[run]\nmax_iterations = 999\n");
        let mut merged = toml_val("[run]\nmax_iterations = 999\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        assert_eq!(merged["run"]["max_iterations"].as_integer(), Some(10));
    }

    #[test]
    fn test_workspace_can_lower_max_iterations() {
        let baseline = toml_val("[run]\nmax_iterations = 10\n");
        let workspace = toml_val("[run]\nmax_iterations = 3\n");
        let mut merged = toml_val("[run]\nmax_iterations = 3\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        assert_eq!(merged["run"]["max_iterations"].as_integer(), Some(3));
    }

    #[test]
    fn test_workspace_cannot_escalate_default_scope() {
        let baseline = toml_val("[permissions]\ndefault_scope = \"once\"\n");
        let workspace = toml_val("[permissions]\ndefault_scope = \"always\"\n");
        let mut merged = toml_val("[permissions]\ndefault_scope = \"always\"\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        assert_eq!(
            merged["permissions"]["default_scope"].as_str(),
            Some("once")
        );
    }

    #[test]
    fn test_workspace_can_tighten_default_scope() {
        let baseline = toml_val("[permissions]\ndefault_scope = \"always\"\n");
        let workspace = toml_val("[permissions]\ndefault_scope = \"never\"\n");
        let mut merged = toml_val("[permissions]\ndefault_scope = \"never\"\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        assert_eq!(
            merged["permissions"]["default_scope"].as_str(),
            Some("never")
        );
    }

    #[test]
    fn test_workspace_cannot_lower_default_risk() {
        let baseline = toml_val("[permissions]\ndefault_risk = \"high\"\n");
        let workspace = toml_val("[permissions]\ndefault_risk = \"low\"\n");
        let mut merged = toml_val("[permissions]\ndefault_risk = \"low\"\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        assert_eq!(merged["permissions"]["default_risk"].as_str(), Some("high"));
    }

    #[test]
    fn test_workspace_cannot_remove_blocklist_entry() {
        let baseline = toml_val("[permissions]\nblocklist = [\"rm\", \"curl\"]\n");
        let workspace = toml_val("[permissions]\nblocklist = [\"rm\"]\n");
        let mut merged = toml_val("[permissions]\nblocklist = [\"rm\"]\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        let blocklist: Vec<&str> = merged["permissions"]["blocklist"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(blocklist.contains(&"curl"));
    }

    #[test]
    fn test_workspace_can_add_blocklist_entry() {
        let baseline = toml_val("[permissions]\nblocklist = [\"rm\"]\n");
        let workspace = toml_val("[permissions]\nblocklist = [\"rm\", \"curl\"]\n");
        let mut merged = toml_val("[permissions]\nblocklist = [\"rm\", \"curl\"]\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        let blocklist: Vec<&str> = merged["permissions"]["blocklist"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(blocklist.len(), 2);
    }

    #[test]
    fn test_workspace_cannot_expand_allowlist() {
        let baseline = toml_val("[permissions]\nallowlist = [\"read_file\"]\n");
        let workspace = toml_val("[permissions]\nallowlist = [\"read_file\", \"exec_shell\"]\n");
        let mut merged = toml_val("[permissions]\nallowlist = [\"read_file\", \"exec_shell\"]\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        let allowlist: Vec<&str> = merged["permissions"]["allowlist"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(allowlist, vec!["read_file"]);
    }

    #[test]
    fn test_workspace_cannot_raise_retry_attempts() {
        let baseline = toml_val("[retry]\nllm_max_attempts = 3\n");
        let workspace = toml_val("[retry]\nllm_max_attempts = 50\n");
        let mut merged = toml_val("[retry]\nllm_max_attempts = 50\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        assert_eq!(merged["retry"]["llm_max_attempts"].as_integer(), Some(3));
    }

    #[test]
    fn test_workspace_cannot_raise_tool_pair_cap() {
        let baseline = toml_val("[context]\ntool_pair_cap = 10\n");
        let workspace = toml_val("[context]\ntool_pair_cap = 1000\n");
        let mut merged = toml_val("[context]\ntool_pair_cap = 1000\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        assert_eq!(merged["context"]["tool_pair_cap"].as_integer(), Some(10));
    }

    #[test]
    fn test_untouched_fields_are_left_alone() {
        let baseline = toml_val("[run]\nmax_iterations = 10\nmodel = \"claude\"\n");
        let workspace = toml_val("[run]\nmodel = \"claude\"\n");
        let mut merged = toml_val("[run]\nmax_iterations = 10\nmodel = \"claude\"\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);

        assert_eq!(merged["run"]["max_iterations"].as_integer(), Some(10));
    }
}
