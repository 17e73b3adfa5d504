//! In-process memory plugins: `WorkingMemoryPlugin` and
//! `InContextMemoryPlugin`.
//!
//! Both implement [`MemoryPlugin`], the in-process equivalent of the
//! pluggable context contributor the `ContextManager` consults during
//! assembly and compaction. Entries are stored in a `dashmap::DashMap`
//! guarded per-field by the same shared-concurrent-store idiom
//! `astrid_tools::ToolContext` uses for its own mutable state.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use astrid_core::ToolDescriptor;

/// The highest priority value; entries at this priority are "critical" and
/// are only evicted in a second compaction pass, after every non-critical
/// entry has already been considered.
pub const CRITICAL_PRIORITY: u32 = u32::MAX;

/// A key tier, encoded as a dotted prefix on the entry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// `raw.*` — unprocessed tool output, cleaned up in bulk.
    Raw,
    /// `summary.*` — condensed content.
    Summary,
    /// `findings.*` — durable conclusions.
    Findings,
}

impl Tier {
    /// The dotted prefix this tier's keys carry.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Raw => "raw.",
            Self::Summary => "summary.",
            Self::Findings => "findings.",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        if key.starts_with(Self::Raw.prefix()) {
            Some(Self::Raw)
        } else if key.starts_with(Self::Summary.prefix()) {
            Some(Self::Summary)
        } else if key.starts_with(Self::Findings.prefix()) {
            Some(Self::Findings)
        } else {
            None
        }
    }
}

/// Lifecycle scope controlling when an entry is eligible for automatic
/// clearing by the embedder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    /// Cleared when the session ends.
    Session,
    /// Persists until the associated plan completes.
    Plan,
    /// Never auto-cleared.
    Persistent,
    /// Cleared once every listed task id has completed.
    Task {
        /// Task ids this entry is tied to.
        ids: Vec<String>,
    },
}

/// One stored memory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Dotted, case-sensitive key.
    pub key: String,
    /// Stored value.
    pub value: String,
    /// Scope governing automatic clearing.
    pub scope: Scope,
    /// Eviction priority; higher survives longer. `CRITICAL_PRIORITY` marks
    /// the entry as second-pass-only.
    pub priority: u32,
    /// Pinned entries are never evicted by `compact`.
    pub pinned: bool,
    /// Human-readable summary of what this entry holds, rendered alongside
    /// its key in the plugin content listing.
    pub description: Option<String>,
    /// Task ids this entry is needed for, independent of `scope`.
    pub needed_for_tasks: Vec<String>,
    /// Monotonic access counter, used as the recency component of the
    /// eviction order.
    pub last_access: u64,
}

impl MemoryEntry {
    fn size_bytes(&self) -> usize {
        self.value.len()
    }

    fn tier(&self) -> Option<Tier> {
        Tier::from_key(&self.key)
    }

    fn is_critical(&self) -> bool {
        self.priority == CRITICAL_PRIORITY
    }
}

/// Serializable snapshot of a memory plugin's state, round-tripped through
/// session persistence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemoryPluginState {
    /// All entries, keyed by their dotted key.
    pub entries: Vec<MemoryEntry>,
}

/// The in-process plugin contract consulted by `ContextManager` during
/// assembly and compaction.
pub trait MemoryPlugin: Send + Sync {
    /// The plugin's registration name.
    fn name(&self) -> &str;

    /// A short preamble describing how the model should use this plugin's
    /// tools, rendered into the assembled system context.
    fn instructions(&self) -> String;

    /// Rendered content block (e.g. a key+description listing), or `None`
    /// if the plugin has nothing to contribute this turn.
    fn content(&self) -> Option<String>;

    /// Estimated token size of `content()`, cached until the next mutation.
    fn token_size(&self, estimate: &dyn Fn(&str) -> u64) -> u64;

    /// Whether this plugin currently has anything eligible for compaction.
    fn is_compactable(&self) -> bool;

    /// Evict entries until `target` tokens are freed, or only critical
    /// entries remain. Returns the number of tokens actually freed.
    fn compact(&self, target_tokens: u64, estimate: &dyn Fn(&str) -> u64) -> u64;

    /// Tool descriptors this plugin contributes to the registry.
    fn tool_descriptors(&self) -> Vec<ToolDescriptor>;

    /// Serializable state for session persistence.
    fn state(&self) -> Value;

    /// Restore state previously returned by `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if `state` cannot be deserialized into this
    /// plugin's state shape.
    fn restore_state(&self, state: Value) -> Result<(), String>;
}

/// Shared entry store used by both memory plugins. A plain struct rather
/// than a trait default method, since the two plugins differ only in name
/// and in whether `cleanup_raw` is exposed.
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
    access_clock: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            access_clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.access_clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Insert or overwrite an entry.
    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        scope: Scope,
        priority: u32,
        pinned: bool,
        needed_for_tasks: Vec<String>,
        description: Option<String>,
    ) {
        let last_access = self.tick();
        let key = key.into();
        self.entries.insert(
            key.clone(),
            MemoryEntry {
                key,
                value: value.into(),
                scope,
                priority,
                pinned,
                description,
                needed_for_tasks,
                last_access,
            },
        );
    }

    /// Retrieve a single entry by exact key, bumping its access time.
    #[must_use]
    pub fn retrieve(&self, key: &str) -> Option<MemoryEntry> {
        let last_access = self.tick();
        self.entries.get_mut(key).map(|mut e| {
            e.last_access = last_access;
            e.clone()
        })
    }

    /// Retrieve every entry matching `keys` exactly, a `*` glob pattern, or
    /// (when `tier` is set and `keys` is empty) an entire tier.
    #[must_use]
    pub fn retrieve_batch(&self, keys: &[String], glob: Option<&str>, tier: Option<Tier>) -> Vec<MemoryEntry> {
        let last_access = self.tick();
        let key_set: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let mut out = Vec::new();
        for mut entry in self.entries.iter_mut() {
            let matches = if let Some(pattern) = glob {
                glob_match(pattern, &entry.key)
            } else if !key_set.is_empty() {
                key_set.contains(entry.key.as_str())
            } else if let Some(t) = tier {
                entry.tier() == Some(t)
            } else {
                false
            };
            if matches {
                entry.last_access = last_access;
                out.push(entry.clone());
            }
        }
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    /// List all keys, optionally filtered to one tier.
    #[must_use]
    pub fn list(&self, tier: Option<Tier>) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| tier.is_none_or(|t| e.tier() == Some(t)))
            .map(|e| e.key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Remove a single entry by exact key. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every entry under the `raw.` tier.
    pub fn cleanup_raw(&self) -> usize {
        let raw_keys: Vec<String> = self.list(Some(Tier::Raw));
        for key in &raw_keys {
            self.entries.remove(key);
        }
        raw_keys.len()
    }

    fn total_tokens(&self, estimate: &dyn Fn(&str) -> u64) -> u64 {
        self.entries.iter().map(|e| estimate(&e.value)).sum()
    }

    fn has_evictable(&self) -> bool {
        self.entries.iter().any(|e| !e.pinned)
    }

    /// Evict entries ordered by `(pinned asc, priority asc, last_access
    /// asc, size desc)`, skipping pinned entries always and critical
    /// entries until a second pass, until `target` tokens are freed.
    fn compact(&self, target_tokens: u64, estimate: &dyn Fn(&str) -> u64) -> u64 {
        let mut freed = 0u64;
        for allow_critical in [false, true] {
            if freed >= target_tokens {
                break;
            }
            let mut candidates: Vec<MemoryEntry> = self
                .entries
                .iter()
                .filter(|e| !e.pinned && (allow_critical || !e.is_critical()))
                .map(|e| e.clone())
                .collect();
            candidates.sort_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then(a.last_access.cmp(&b.last_access))
                    .then(b.size_bytes().cmp(&a.size_bytes()))
            });
            for entry in candidates {
                if freed >= target_tokens {
                    break;
                }
                let tokens = estimate(&entry.value);
                if self.entries.remove(&entry.key).is_some() {
                    freed = freed.saturating_add(tokens);
                }
            }
        }
        freed
    }

    fn snapshot(&self) -> MemoryPluginState {
        MemoryPluginState {
            entries: self.entries.iter().map(|e| e.clone()).collect(),
        }
    }

    fn restore(&self, snapshot: MemoryPluginState) {
        self.entries.clear();
        let mut max_access = 0;
        for entry in snapshot.entries {
            max_access = max_access.max(entry.last_access);
            self.entries.insert(entry.key.clone(), entry);
        }
        self.access_clock.store(max_access + 1, Ordering::Relaxed);
    }

    /// Render a key+description listing for plugin content.
    fn render_listing(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let mut lines: Vec<String> = self
            .entries
            .iter()
            .map(|e| match &e.description {
                Some(description) => format!("- {}: {} ({} bytes)", e.key, description, e.size_bytes()),
                None => format!("- {} ({} bytes)", e.key, e.size_bytes()),
            })
            .collect();
        lines.sort();
        Some(lines.join("\n"))
    }
}

/// `*`-only glob match against a dotted key. Any other glob metacharacter
/// is treated as a literal.
fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }
    let mut rest = key;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !rest.starts_with(part) {
                return false;
            }
            rest = &rest[part.len()..];
        } else if i == parts.len() - 1 {
            if !rest.ends_with(part) {
                return false;
            }
        } else if let Some(pos) = rest.find(part) {
            rest = &rest[pos + part.len()..];
        } else {
            return false;
        }
    }
    true
}

fn store_tool_descriptor(plugin_name: &str) -> ToolDescriptor {
    ToolDescriptor::new(
        format!("{plugin_name}.store"),
        "Store a value in memory under a dotted key.",
    )
    .with_schema(serde_json::json!({
        "type": "object",
        "properties": {
            "key": {"type": "string"},
            "value": {"type": "string"},
            "tier": {"type": "string", "enum": ["raw", "summary", "findings"]},
            "priority": {"type": "integer"},
            "pinned": {"type": "boolean"},
            "neededForTasks": {"type": "array", "items": {"type": "string"}},
        },
        "required": ["key", "value"],
    }))
}

fn retrieve_tool_descriptor(plugin_name: &str) -> ToolDescriptor {
    ToolDescriptor::new(
        format!("{plugin_name}.retrieve"),
        "Retrieve a single value from memory by exact key.",
    )
    .with_schema(serde_json::json!({
        "type": "object",
        "properties": {"key": {"type": "string"}},
        "required": ["key"],
    }))
}

fn retrieve_batch_tool_descriptor(plugin_name: &str) -> ToolDescriptor {
    ToolDescriptor::new(
        format!("{plugin_name}.retrieve-batch"),
        "Retrieve values by exact keys, a `*` glob pattern, or an entire tier.",
    )
    .with_schema(serde_json::json!({
        "type": "object",
        "properties": {
            "keys": {"type": "array", "items": {"type": "string"}},
            "glob": {"type": "string"},
            "tier": {"type": "string", "enum": ["raw", "summary", "findings"]},
        },
    }))
}

fn list_tool_descriptor(plugin_name: &str) -> ToolDescriptor {
    ToolDescriptor::new(
        format!("{plugin_name}.list"),
        "List stored keys, optionally filtered to one tier.",
    )
    .with_schema(serde_json::json!({
        "type": "object",
        "properties": {"tier": {"type": "string", "enum": ["raw", "summary", "findings"]}},
    }))
}

fn delete_tool_descriptor(plugin_name: &str) -> ToolDescriptor {
    ToolDescriptor::new(
        format!("{plugin_name}.delete"),
        "Delete a single entry by exact key.",
    )
    .with_schema(serde_json::json!({
        "type": "object",
        "properties": {"key": {"type": "string"}},
        "required": ["key"],
    }))
}

/// Plugin backing durable, model-directed notes that survive compaction
/// unless explicitly evicted.
pub struct InContextMemoryPlugin {
    store: MemoryStore,
}

impl Default for InContextMemoryPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl InContextMemoryPlugin {
    /// Construct an empty in-context memory plugin.
    #[must_use]
    pub fn new() -> Self {
        Self { store: MemoryStore::new() }
    }

    /// Direct access to the underlying store, used by the `store`/`retrieve`
    /// family of tools wired up by the tool registry.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl MemoryPlugin for InContextMemoryPlugin {
    fn name(&self) -> &str {
        "in_context_memory"
    }

    fn instructions(&self) -> String {
        "Use in_context_memory.store to save findings the model should keep seeing every turn; \
         use in_context_memory.retrieve / retrieve-batch / list to read them back."
            .to_owned()
    }

    fn content(&self) -> Option<String> {
        self.store.render_listing()
    }

    fn token_size(&self, estimate: &dyn Fn(&str) -> u64) -> u64 {
        self.content().map(|c| estimate(&c)).unwrap_or(0)
    }

    fn is_compactable(&self) -> bool {
        self.store.has_evictable()
    }

    fn compact(&self, target_tokens: u64, estimate: &dyn Fn(&str) -> u64) -> u64 {
        self.store.compact(target_tokens, estimate)
    }

    fn tool_descriptors(&self) -> Vec<ToolDescriptor> {
        vec![
            store_tool_descriptor(self.name()),
            retrieve_tool_descriptor(self.name()),
            retrieve_batch_tool_descriptor(self.name()),
            list_tool_descriptor(self.name()),
            delete_tool_descriptor(self.name()),
        ]
    }

    fn state(&self) -> Value {
        serde_json::to_value(self.store.snapshot()).unwrap_or(Value::Null)
    }

    fn restore_state(&self, state: Value) -> Result<(), String> {
        let snapshot: MemoryPluginState =
            serde_json::from_value(state).map_err(|e| e.to_string())?;
        self.store.restore(snapshot);
        Ok(())
    }
}

/// Plugin backing large or disposable working state (e.g. offloaded tool
/// results), with an additional bulk `cleanup_raw` operation.
pub struct WorkingMemoryPlugin {
    store: MemoryStore,
}

impl Default for WorkingMemoryPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkingMemoryPlugin {
    /// Construct an empty working memory plugin.
    #[must_use]
    pub fn new() -> Self {
        Self { store: MemoryStore::new() }
    }

    /// Direct access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Bulk-delete every entry under the `raw.` tier. Returns how many
    /// entries were removed.
    pub fn cleanup_raw(&self) -> usize {
        self.store.cleanup_raw()
    }
}

impl MemoryPlugin for WorkingMemoryPlugin {
    fn name(&self) -> &str {
        "working_memory"
    }

    fn instructions(&self) -> String {
        "Use working_memory.store for large or disposable intermediate results (tier raw/summary/findings); \
         working_memory.cleanup-raw bulk-deletes everything under raw."
            .to_owned()
    }

    fn content(&self) -> Option<String> {
        self.store.render_listing()
    }

    fn token_size(&self, estimate: &dyn Fn(&str) -> u64) -> u64 {
        self.content().map(|c| estimate(&c)).unwrap_or(0)
    }

    fn is_compactable(&self) -> bool {
        self.store.has_evictable()
    }

    fn compact(&self, target_tokens: u64, estimate: &dyn Fn(&str) -> u64) -> u64 {
        self.store.compact(target_tokens, estimate)
    }

    fn tool_descriptors(&self) -> Vec<ToolDescriptor> {
        vec![
            store_tool_descriptor(self.name()),
            retrieve_tool_descriptor(self.name()),
            retrieve_batch_tool_descriptor(self.name()),
            list_tool_descriptor(self.name()),
            delete_tool_descriptor(self.name()),
            ToolDescriptor::new(
                format!("{}.cleanup-raw", self.name()),
                "Bulk-delete every entry under the raw. tier.",
            ),
        ]
    }

    fn state(&self) -> Value {
        serde_json::to_value(self.store.snapshot()).unwrap_or(Value::Null)
    }

    fn restore_state(&self, state: Value) -> Result<(), String> {
        let snapshot: MemoryPluginState =
            serde_json::from_value(state).map_err(|e| e.to_string())?;
        self.store.restore(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(s: &str) -> u64 {
        s.len() as u64
    }

    #[test]
    fn store_and_retrieve_round_trips() {
        let plugin = WorkingMemoryPlugin::new();
        plugin.store().store("raw.output_1", "hello", Scope::Session, 1, false, vec![], None);
        let got = plugin.store().retrieve("raw.output_1").unwrap();
        assert_eq!(got.value, "hello");
    }

    #[test]
    fn glob_retrieve_batch_matches_prefix() {
        let plugin = WorkingMemoryPlugin::new();
        plugin.store().store("raw.a", "1", Scope::Session, 1, false, vec![], None);
        plugin.store().store("raw.b", "2", Scope::Session, 1, false, vec![], None);
        plugin.store().store("summary.c", "3", Scope::Session, 1, false, vec![], None);

        let batch = plugin.store().retrieve_batch(&[], Some("raw.*"), None);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn cleanup_raw_removes_only_raw_tier() {
        let plugin = WorkingMemoryPlugin::new();
        plugin.store().store("raw.a", "1", Scope::Session, 1, false, vec![], None);
        plugin.store().store("summary.b", "2", Scope::Session, 1, false, vec![], None);

        let removed = plugin.cleanup_raw();

        assert_eq!(removed, 1);
        assert_eq!(plugin.store().list(None), vec!["summary.b".to_owned()]);
    }

    #[test]
    fn compact_skips_pinned_entries() {
        let plugin = WorkingMemoryPlugin::new();
        plugin.store().store("raw.pinned", "x".repeat(100).as_str(), Scope::Session, 1, true, vec![], None);
        plugin.store().store("raw.evictable", "y".repeat(10).as_str(), Scope::Session, 1, false, vec![], None);

        let freed = plugin.compact(5, &estimate);

        assert_eq!(freed, 10);
        assert!(plugin.store().retrieve("raw.pinned").is_some());
        assert!(plugin.store().retrieve("raw.evictable").is_none());
    }

    #[test]
    fn compact_defers_critical_entries_to_second_pass() {
        let plugin = InContextMemoryPlugin::new();
        plugin.store().store("findings.critical", "c".repeat(20).as_str(), Scope::Persistent, CRITICAL_PRIORITY, false, vec![], None);
        plugin.store().store("findings.normal", "n".repeat(5).as_str(), Scope::Session, 1, false, vec![], None);

        let freed = plugin.compact(10, &estimate);

        assert!(freed >= 10);
        assert!(plugin.store().retrieve("findings.normal").is_none());
    }

    #[test]
    fn render_listing_includes_description_when_present() {
        let plugin = WorkingMemoryPlugin::new();
        plugin.store().store(
            "raw.tool_result.search.abcd1234",
            "x".repeat(2048),
            Scope::Session,
            0,
            false,
            vec![],
            Some("Result of search(\"rust\")".to_owned()),
        );
        plugin.store().store("raw.no_description", "y", Scope::Session, 0, false, vec![], None);

        let listing = plugin.content().unwrap();

        assert!(listing.contains("raw.tool_result.search.abcd1234: Result of search(\"rust\") (2048 bytes)"));
        assert!(listing.contains("raw.no_description (1 bytes)"));
    }
}
