//! List directory tool — lists immediate children of a directory.

use std::fmt::Write;
use std::path::PathBuf;

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};
use serde_json::Value;

/// Built-in tool for listing directory contents.
pub struct ListDirectoryTool;

#[async_trait::async_trait]
impl BuiltinTool for ListDirectoryTool {
    fn name(&self) -> &'static str {
        "list_directory"
    }

    fn description(&self) -> &'static str {
        "Lists the immediate contents of a directory. Directories are suffixed with `/`."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list (defaults to workspace root)"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let dir = args
            .get("path")
            .and_then(Value::as_str)
            .map_or_else(|| ctx.workspace_root.clone(), PathBuf::from);

        if !dir.exists() {
            return Err(ToolError::PathNotFound(dir.display().to_string()));
        }

        let mut read_dir = tokio::fs::read_dir(&dir).await?;
        let mut entries = Vec::new();

        while let Some(entry) = read_dir.next_entry().await? {
            let file_type = entry.file_type().await?;
            let name = entry.file_name().to_string_lossy().to_string();
            entries.push(if file_type.is_dir() {
                format!("{name}/")
            } else {
                name
            });
        }

        entries.sort();

        if entries.is_empty() {
            return Ok(format!("{} is empty", dir.display()));
        }

        let mut output = String::new();
        for entry in &entries {
            let _ = writeln!(output, "{entry}");
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx_with_root(root: &std::path::Path) -> ToolContext {
        ToolContext::new(root.to_path_buf())
    }

    #[tokio::test]
    async fn test_list_directory_basic() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let ctx = ctx_with_root(dir.path());
        let result = ListDirectoryTool
            .execute(serde_json::json!({}), &ctx)
            .await
            .unwrap();

        assert!(result.contains("a.txt"));
        assert!(result.contains("sub/"));
    }

    #[tokio::test]
    async fn test_list_directory_empty() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_root(dir.path());
        let result = ListDirectoryTool
            .execute(serde_json::json!({}), &ctx)
            .await
            .unwrap();

        assert!(result.contains("is empty"));
    }

    #[tokio::test]
    async fn test_list_directory_not_found() {
        let ctx = ctx_with_root(&std::env::temp_dir());
        let result = ListDirectoryTool
            .execute(
                serde_json::json!({"path": "/nonexistent/astrid/path"}),
                &ctx,
            )
            .await;

        assert!(result.is_err());
    }
}
