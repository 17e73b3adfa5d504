//! Grep tool — searches file contents with a regular expression.

use std::fmt::Write;
use std::path::PathBuf;

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};
use serde_json::Value;
use walkdir::WalkDir;

/// Maximum number of matching lines returned before truncation.
const MAX_MATCHES: usize = 500;

/// Built-in tool for searching file contents.
pub struct GrepTool;

#[async_trait::async_trait]
impl BuiltinTool for GrepTool {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn description(&self) -> &'static str {
        "Searches file contents for a regular expression. Optionally restrict the search to \
         files matching a glob. Returns matching lines prefixed with `path:line_number:`."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regular expression to search for"
                },
                "path": {
                    "type": "string",
                    "description": "Directory to search in (defaults to workspace root)"
                },
                "glob": {
                    "type": "string",
                    "description": "Glob filter restricting which files are searched"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let pattern = args
            .get("pattern")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("pattern is required".into()))?;

        let search_dir = args
            .get("path")
            .and_then(Value::as_str)
            .map_or_else(|| ctx.workspace_root.clone(), PathBuf::from);

        if !search_dir.exists() {
            return Err(ToolError::PathNotFound(search_dir.display().to_string()));
        }

        let regex = regex::Regex::new(pattern)
            .map_err(|e| ToolError::InvalidArguments(format!("Invalid pattern: {e}")))?;

        let glob_filter = args
            .get("glob")
            .and_then(Value::as_str)
            .map(|g| {
                globset::GlobBuilder::new(g)
                    .literal_separator(false)
                    .build()
                    .map(|g| g.compile_matcher())
                    .map_err(|e| ToolError::InvalidArguments(format!("Invalid glob: {e}")))
            })
            .transpose()?;

        let search_dir = search_dir
            .canonicalize()
            .map_err(|_| ToolError::PathNotFound(search_dir.display().to_string()))?;

        let mut output = String::new();
        let mut match_count = 0usize;

        'walk: for entry in WalkDir::new(&search_dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || e.file_name().to_str().is_none_or(|s| !s.starts_with('.'))
            })
        {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }

            let rel_path = entry.path().strip_prefix(&search_dir).unwrap_or(entry.path());
            if let Some(glob) = &glob_filter
                && !glob.is_match(rel_path)
            {
                continue;
            }

            let Ok(content) = std::fs::read_to_string(entry.path()) else {
                continue;
            };

            for (line_no, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    let _ = writeln!(output, "{}:{}:{}", entry.path().display(), line_no + 1, line);
                    match_count += 1;
                    if match_count >= MAX_MATCHES {
                        let _ = writeln!(output, "\n(truncated at {MAX_MATCHES} matches)");
                        break 'walk;
                    }
                }
            }
        }

        if match_count == 0 {
            return Ok(format!("No matches for \"{pattern}\""));
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
    async fn test_grep_finds_matches() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn main() {}\nfn helper() {}\n").unwrap();

        let ctx = ctx_with_root(dir.path());
        let result = GrepTool
            .execute(serde_json::json!({"pattern": "fn main"}), &ctx)
            .await
            .unwrap();

        assert!(result.contains("a.rs:1:"));
        assert!(!result.contains("a.rs:2:"));
    }

    #[tokio::test]
    async fn test_grep_no_matches() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "nothing here").unwrap();

        let ctx = ctx_with_root(dir.path());
        let result = GrepTool
            .execute(serde_json::json!({"pattern": "zzz_not_found"}), &ctx)
            .await
            .unwrap();

        assert!(result.contains("No matches"));
    }

    #[tokio::test]
    async fn test_grep_glob_filter() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "needle").unwrap();
        std::fs::write(dir.path().join("b.txt"), "needle").unwrap();

        let ctx = ctx_with_root(dir.path());
        let result = GrepTool
            .execute(
                serde_json::json!({"pattern": "needle", "glob": "*.rs"}),
                &ctx,
            )
            .await
            .unwrap();

        assert!(result.contains("a.rs"));
        assert!(!result.contains("b.txt"));
    }

    #[tokio::test]
    async fn test_grep_invalid_pattern() {
        let ctx = ctx_with_root(&std::env::temp_dir());
        let result = GrepTool
            .execute(serde_json::json!({"pattern": "(unclosed"}), &ctx)
            .await;

        assert!(result.is_err());
    }
}
