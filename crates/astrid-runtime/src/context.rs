//! Token budget tracking and conversation compaction.
//!
//! `ContextManager` decides, once per iteration, whether the assembled
//! conversation fits the model's effective context cap and, if not,
//! delegates to a pluggable [`CompactionStrategy`].

use std::sync::Arc;

use astrid_config::{CompactionStrategyName, ContextConfig};
use astrid_core::conversation::{ContentBlock, ConversationItem};
use astrid_core::ids::ToolCallId;

use crate::memory::{InContextMemoryPlugin, Scope, WorkingMemoryPlugin};

/// Estimates token cost for text and images. The default implementation
/// approximates `ceil(chars / 3.5)` for text and a tile-based model for
/// images; callers needing tighter fidelity to a specific provider's
/// tokenizer can swap in their own.
pub trait TokenEstimator: Send + Sync {
    /// Estimated token cost of `text`.
    fn estimate_text(&self, text: &str) -> u64;

    /// Estimated token cost of an image at the given detail level. `tiles`
    /// is `None` when the image's dimensions are unknown.
    fn estimate_image(&self, detail: astrid_core::conversation::ImageDetail, tiles: Option<u64>) -> u64;
}

/// `ceil(chars / 3.5)` for text; `85 + 170*tiles` for high-detail images
/// (fixed 85 for low detail, 1000 when dimensions are unknown).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTokenEstimator;

impl TokenEstimator for DefaultTokenEstimator {
    fn estimate_text(&self, text: &str) -> u64 {
        let chars = text.chars().count() as f64;
        (chars / 3.5).ceil() as u64
    }

    fn estimate_image(&self, detail: astrid_core::conversation::ImageDetail, tiles: Option<u64>) -> u64 {
        use astrid_core::conversation::ImageDetail as Detail;
        match (detail, tiles) {
            (Detail::Low, _) => 85,
            (_, None) => 1000,
            (Detail::High | Detail::Auto, Some(tiles)) => 85 + 170 * tiles,
        }
    }
}

fn estimate_block(estimator: &dyn TokenEstimator, block: &ContentBlock) -> u64 {
    match block {
        ContentBlock::InputText { text } | ContentBlock::OutputText { text } => {
            estimator.estimate_text(text)
        },
        ContentBlock::InputImage { detail, .. } => estimator.estimate_image(*detail, None),
        ContentBlock::ToolUse { raw_arguments, name, .. } => {
            estimator.estimate_text(name) + estimator.estimate_text(raw_arguments)
        },
        ContentBlock::ToolResult { content, .. } => estimator.estimate_text(content),
        ContentBlock::Thinking { text, .. } => estimator.estimate_text(text),
    }
}

/// Estimated token cost of a single conversation item.
#[must_use]
pub fn estimate_item(estimator: &dyn TokenEstimator, item: &ConversationItem) -> u64 {
    match item {
        ConversationItem::Message { content, .. } => {
            content.iter().map(|b| estimate_block(estimator, b)).sum()
        },
        ConversationItem::Reasoning { text, .. } => {
            text.as_deref().map(|t| estimator.estimate_text(t)).unwrap_or(0)
        },
        ConversationItem::CompactionMarker { summary, .. } => estimator.estimate_text(summary),
    }
}

/// Estimated token cost of an entire conversation.
#[must_use]
pub fn estimate_conversation(estimator: &dyn TokenEstimator, items: &[ConversationItem]) -> u64 {
    items.iter().map(|i| estimate_item(estimator, i)).sum()
}

/// The result of one `compact` invocation.
#[derive(Debug, Clone, Default)]
pub struct CompactionOutcome {
    /// Tokens freed by this pass.
    pub freed: u64,
    /// Conversation items removed.
    pub messages_removed: usize,
    /// Names of plugins compacted during this pass.
    pub plugins_compacted: Vec<String>,
    /// Human-readable trace of what happened, in order.
    pub log: Vec<String>,
}

/// The result of one `consolidate` invocation.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationOutcome {
    /// Whether consolidation performed any mutation.
    pub performed: bool,
    /// Net token delta; negative means tokens were freed.
    pub tokens_changed: i64,
    /// Human-readable trace of actions taken.
    pub actions: Vec<String>,
}

/// Plugins and conversation state a [`CompactionStrategy`] is allowed to
/// mutate, bundled so strategies share one mutation surface rather than
/// threading each piece through separately.
pub struct CompactionContext<'a> {
    /// The live conversation. Strategies remove items via
    /// `Vec::remove`/`retain`, never by splitting a tool-call pair.
    pub conversation: &'a mut Vec<ConversationItem>,
    /// In-context memory plugin, compacted first by `DefaultRolling`.
    pub in_context_memory: Option<&'a InContextMemoryPlugin>,
    /// Working memory plugin, compacted second by `DefaultRolling` and used
    /// as the offload target by `AlgorithmicToolOffload`.
    pub working_memory: Option<&'a WorkingMemoryPlugin>,
}

/// A pluggable conversation/plugin compaction algorithm.
pub trait CompactionStrategy: Send + Sync {
    /// The strategy's registration name, also used in `CompactionStart`
    /// events.
    fn name(&self) -> &'static str;

    /// Fraction of `effective-cap` at which `ContextManager::assemble`
    /// invokes this strategy.
    fn threshold(&self) -> f64;

    /// Free at least `target_tokens`, mutating `ctx` as needed. May free
    /// less than requested; the caller re-estimates and fails
    /// `ContextOverflow` if still over cap.
    fn compact(
        &self,
        ctx: &mut CompactionContext<'_>,
        target_tokens: u64,
        estimator: &dyn TokenEstimator,
        cfg: &ContextConfig,
    ) -> CompactionOutcome;

    /// Idempotent housekeeping run after every iteration, independent of
    /// threshold breach. The default implementation is a no-op.
    fn consolidate(&self, _ctx: &mut CompactionContext<'_>) -> ConsolidationOutcome {
        ConsolidationOutcome::default()
    }
}

/// Pairs of (tool-use item index, tool-result item index, id) found in
/// `conversation`, in tool-use order. An item may contain at most one
/// `ToolUse`/`ToolResult` block per the constructors in
/// `astrid_core::conversation`, so one item maps to at most one pair.
fn find_tool_pairs(conversation: &[ConversationItem]) -> Vec<(usize, usize, ToolCallId)> {
    let mut use_index: std::collections::HashMap<ToolCallId, usize> = std::collections::HashMap::new();
    for (idx, item) in conversation.iter().enumerate() {
        for id in item.tool_use_ids() {
            use_index.insert(id.clone(), idx);
        }
    }
    let mut pairs = Vec::new();
    for (idx, item) in conversation.iter().enumerate() {
        for id in item.tool_result_ids() {
            if let Some(&use_idx) = use_index.get(id) {
                pairs.push((use_idx, idx, id.clone()));
            }
        }
    }
    pairs.sort_by_key(|(use_idx, _, _)| *use_idx);
    pairs
}

fn is_tool_paired(item: &ConversationItem) -> bool {
    !item.tool_use_ids().is_empty() || !item.tool_result_ids().is_empty()
}

/// Remove conversation items oldest-first, preferring items that are not
/// part of a tool-call pair, then whole pairs (never splitting one), until
/// `target_tokens` are freed or nothing removable remains.
fn remove_oldest_preserving_pairs(
    conversation: &mut Vec<ConversationItem>,
    target_tokens: u64,
    estimator: &dyn TokenEstimator,
) -> (u64, usize) {
    let mut freed = 0u64;
    let mut removed = 0usize;

    let mut unpaired_indices: Vec<usize> = conversation
        .iter()
        .enumerate()
        .filter(|(_, item)| !is_tool_paired(item))
        .map(|(i, _)| i)
        .collect();
    unpaired_indices.sort_unstable();

    let mut to_remove: std::collections::HashSet<usize> = std::collections::HashSet::new();
    for idx in unpaired_indices {
        if freed >= target_tokens {
            break;
        }
        freed += estimate_item(estimator, &conversation[idx]);
        to_remove.insert(idx);
        removed += 1;
    }

    if freed < target_tokens {
        for (use_idx, result_idx, _) in find_tool_pairs(conversation) {
            if freed >= target_tokens {
                break;
            }
            if to_remove.contains(&use_idx) || to_remove.contains(&result_idx) {
                continue;
            }
            freed += estimate_item(estimator, &conversation[use_idx]);
            freed += estimate_item(estimator, &conversation[result_idx]);
            to_remove.insert(use_idx);
            to_remove.insert(result_idx);
            removed += 2;
        }
    }

    let mut indices: Vec<usize> = to_remove.into_iter().collect();
    indices.sort_unstable();
    for idx in indices.into_iter().rev() {
        conversation.remove(idx);
    }

    (freed, removed)
}

/// Compacts plugins in priority order (in-context memory, then working
/// memory), then removes oldest conversation items preferring non-paired
/// items before whole tool-call pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRolling;

impl CompactionStrategy for DefaultRolling {
    fn name(&self) -> &'static str {
        "default_rolling"
    }

    fn threshold(&self) -> f64 {
        0.70
    }

    fn compact(
        &self,
        ctx: &mut CompactionContext<'_>,
        target_tokens: u64,
        estimator: &dyn TokenEstimator,
        _cfg: &ContextConfig,
    ) -> CompactionOutcome {
        let mut outcome = CompactionOutcome::default();
        let mut remaining = target_tokens;

        if let Some(plugin) = ctx.in_context_memory {
            if remaining > 0 && plugin.is_compactable() {
                let freed = plugin.compact(remaining, &|s| estimator.estimate_text(s));
                if freed > 0 {
                    outcome.freed += freed;
                    remaining = remaining.saturating_sub(freed);
                    outcome.plugins_compacted.push(plugin.name().to_owned());
                    outcome.log.push(format!("freed {freed} tokens from in_context_memory"));
                }
            }
        }

        if let Some(plugin) = ctx.working_memory {
            if remaining > 0 && plugin.is_compactable() {
                let freed = plugin.compact(remaining, &|s| estimator.estimate_text(s));
                if freed > 0 {
                    outcome.freed += freed;
                    remaining = remaining.saturating_sub(freed);
                    outcome.plugins_compacted.push(plugin.name().to_owned());
                    outcome.log.push(format!("freed {freed} tokens from working_memory"));
                }
            }
        }

        if remaining > 0 {
            let (freed, removed) = remove_oldest_preserving_pairs(ctx.conversation, remaining, estimator);
            outcome.freed += freed;
            outcome.messages_removed += removed;
            if removed > 0 {
                outcome.log.push(format!("removed {removed} oldest conversation items, freeing {freed} tokens"));
            }
        }

        outcome
    }
}

fn sanitize_for_key(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if out.is_empty() {
        out = "unnamed".to_owned();
    }
    out
}

fn arg_summary(raw_arguments: &str) -> String {
    const MAX_LEN: usize = 40;
    let collapsed: String = raw_arguments.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_LEN {
        collapsed.chars().take(MAX_LEN).collect::<String>() + "..."
    } else {
        collapsed
    }
}

/// Offloads oversized tool results to working memory, removing the
/// `ToolUse`/`ToolResult` pair, then caps the number of retained pairs
/// before falling back to rolling-window removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlgorithmicToolOffload;

impl AlgorithmicToolOffload {
    fn offload_oversized_results(
        &self,
        ctx: &mut CompactionContext<'_>,
        estimator: &dyn TokenEstimator,
        size_threshold_bytes: u64,
    ) -> (u64, usize) {
        let Some(working_memory) = ctx.working_memory else {
            return (0, 0);
        };

        let mut freed = 0u64;
        let mut removed = 0usize;
        let mut to_remove: Vec<usize> = Vec::new();

        let tool_calls: Vec<(usize, ToolCallId, String, String)> = ctx
            .conversation
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| match item {
                ConversationItem::Message { content, .. } => content.iter().find_map(|b| match b {
                    ContentBlock::ToolUse { id, name, raw_arguments, .. } => {
                        Some((idx, id.clone(), name.clone(), raw_arguments.clone()))
                    },
                    _ => None,
                }),
                _ => None,
            })
            .collect();

        for (use_idx, id, name, raw_arguments) in tool_calls {
            let result_idx = ctx.conversation.iter().position(|item| match item {
                ConversationItem::Message { content, .. } => content.iter().any(|b| matches!(
                    b,
                    ContentBlock::ToolResult { tool_use_id, .. } if *tool_use_id == id
                )),
                _ => false,
            });
            let Some(result_idx) = result_idx else { continue };

            let result_content = match &ctx.conversation[result_idx] {
                ConversationItem::Message { content, .. } => content.iter().find_map(|b| match b {
                    ContentBlock::ToolResult { tool_use_id, content, .. } if *tool_use_id == id => {
                        Some(content.clone())
                    },
                    _ => None,
                }),
                _ => None,
            };
            let Some(result_content) = result_content else { continue };

            if (result_content.len() as u64) <= size_threshold_bytes {
                continue;
            }

            let key = format!(
                "raw.tool_result.{}.{}",
                sanitize_for_key(&name),
                &id.to_string()[..id.to_string().len().min(8)]
            );
            let description = format!("Result of {}({})", name, arg_summary(&raw_arguments));
            working_memory.store().store(
                key.clone(),
                result_content.clone(),
                Scope::Session,
                0,
                false,
                Vec::new(),
                Some(description),
            );

            freed += estimator.estimate_text(&result_content);
            freed += estimator.estimate_text(&name) + estimator.estimate_text(&raw_arguments);
            to_remove.push(use_idx);
            to_remove.push(result_idx);
            removed += 2;
        }

        to_remove.sort_unstable();
        to_remove.dedup();
        for idx in to_remove.into_iter().rev() {
            ctx.conversation.remove(idx);
        }

        (freed, removed)
    }

    fn cap_retained_pairs(&self, conversation: &mut Vec<ConversationItem>, cap: u32, estimator: &dyn TokenEstimator) -> (u64, usize) {
        let pairs = find_tool_pairs(conversation);
        if pairs.len() <= cap as usize {
            return (0, 0);
        }
        let excess = pairs.len() - cap as usize;
        let mut freed = 0u64;
        let mut removed = 0usize;
        let mut to_remove: Vec<usize> = Vec::new();
        for (use_idx, result_idx, _) in pairs.into_iter().take(excess) {
            freed += estimate_item(estimator, &conversation[use_idx]);
            freed += estimate_item(estimator, &conversation[result_idx]);
            to_remove.push(use_idx);
            to_remove.push(result_idx);
            removed += 2;
        }
        to_remove.sort_unstable();
        for idx in to_remove.into_iter().rev() {
            conversation.remove(idx);
        }
        (freed, removed)
    }
}

impl CompactionStrategy for AlgorithmicToolOffload {
    fn name(&self) -> &'static str {
        "algorithmic_tool_offload"
    }

    fn threshold(&self) -> f64 {
        0.75
    }

    fn compact(
        &self,
        ctx: &mut CompactionContext<'_>,
        target_tokens: u64,
        estimator: &dyn TokenEstimator,
        cfg: &ContextConfig,
    ) -> CompactionOutcome {
        let mut outcome = CompactionOutcome::default();
        let mut remaining = target_tokens;

        let (freed, removed) = self.offload_oversized_results(ctx, estimator, cfg.result_size_threshold_bytes);
        outcome.freed += freed;
        outcome.messages_removed += removed;
        remaining = remaining.saturating_sub(freed);
        if removed > 0 {
            outcome.plugins_compacted.push("working_memory".to_owned());
            outcome.log.push(format!("offloaded {removed} oversized tool results, freeing {freed} tokens"));
        }

        if remaining > 0 {
            let (freed, removed) = self.cap_retained_pairs(ctx.conversation, cfg.tool_pair_cap, estimator);
            outcome.freed += freed;
            outcome.messages_removed += removed;
            remaining = remaining.saturating_sub(freed);
            if removed > 0 {
                outcome.log.push(format!("capped retained tool pairs, removing {removed} items"));
            }
        }

        if remaining > 0 {
            let (freed, removed) = remove_oldest_preserving_pairs(ctx.conversation, remaining, estimator);
            outcome.freed += freed;
            outcome.messages_removed += removed;
            if removed > 0 {
                outcome.log.push(format!("fell back to rolling-window removal of {removed} items"));
            }
        }

        outcome
    }
}

/// Construct the compaction strategy named by configuration.
#[must_use]
pub fn strategy_for(name: CompactionStrategyName) -> Box<dyn CompactionStrategy> {
    match name {
        CompactionStrategyName::DefaultRolling => Box::new(DefaultRolling),
        CompactionStrategyName::AlgorithmicToolOffload => Box::new(AlgorithmicToolOffload),
    }
}

/// Running token-budget statistics, snapshotted after each `assemble` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextStats {
    /// Estimated tokens in the last assembled context.
    pub last_total_tokens: u64,
    /// Configured effective cap.
    pub effective_cap: u64,
    /// Whether the last assembly crossed the warning threshold.
    pub warned: bool,
    /// Whether the last assembly triggered compaction.
    pub compacted: bool,
}

/// The fully assembled context for one iteration.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// Immutable system instructions.
    pub system_instructions: String,
    /// Plugin-contributed instruction preambles, in plugin order.
    pub plugin_instructions: Vec<String>,
    /// The (possibly just-compacted) conversation.
    pub conversation: Vec<ConversationItem>,
    /// Plugin-contributed content blocks, as `(plugin name, content)`.
    pub plugin_content: Vec<(String, String)>,
    /// Total estimated tokens across every component above.
    pub total_tokens: u64,
}

/// Maintains the token budget and drives compaction.
pub struct ContextManager {
    effective_cap: u64,
    warning_threshold: f64,
    strategy: Box<dyn CompactionStrategy>,
    estimator: Box<dyn TokenEstimator>,
    config: ContextConfig,
    stats: ContextStats,
}

impl ContextManager {
    /// Construct a manager for a model with `effective_cap` tokens
    /// available for the assembled context (i.e. `model-context-limit -
    /// reserved-output`), using the strategy and thresholds named in
    /// `config`.
    #[must_use]
    pub fn new(effective_cap: u64, config: ContextConfig) -> Self {
        let strategy = strategy_for(config.compaction_strategy_name);
        Self {
            effective_cap,
            warning_threshold: config.warning_threshold,
            strategy,
            estimator: Box::new(DefaultTokenEstimator),
            config,
            stats: ContextStats { effective_cap, ..ContextStats::default() },
        }
    }

    /// Override the token estimator (e.g. for tests needing deterministic
    /// counts, or a provider-specific tokenizer).
    #[must_use]
    pub fn with_estimator(mut self, estimator: Box<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Most recent assembly statistics.
    #[must_use]
    pub fn stats(&self) -> ContextStats {
        self.stats
    }

    /// Assemble the context for the next iteration, compacting if the
    /// configured strategy's threshold is crossed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RuntimeError::ContextOverflow`] if compaction could
    /// not bring the context back under `effective_cap`.
    pub fn assemble(
        &mut self,
        system_instructions: &str,
        plugin_instructions: Vec<String>,
        mut conversation: Vec<ConversationItem>,
        plugins: &[Arc<dyn crate::memory::MemoryPlugin>],
        in_context_memory: Option<&InContextMemoryPlugin>,
        working_memory: Option<&WorkingMemoryPlugin>,
    ) -> crate::RuntimeResult<AssembledContext> {
        let system_tokens = self.estimator.estimate_text(system_instructions);
        let plugin_instruction_tokens: u64 = plugin_instructions
            .iter()
            .map(|s| self.estimator.estimate_text(s))
            .sum();
        let plugin_content: Vec<(String, String)> = plugins
            .iter()
            .filter_map(|p| p.content().map(|c| (p.name().to_owned(), c)))
            .collect();
        let plugin_content_tokens: u64 = plugin_content
            .iter()
            .map(|(_, c)| self.estimator.estimate_text(c))
            .sum();
        let conversation_tokens = estimate_conversation(self.estimator.as_ref(), &conversation);

        let mut current = system_tokens + plugin_instruction_tokens + conversation_tokens + plugin_content_tokens;
        self.stats.warned = (current as f64) > self.warning_threshold * (self.effective_cap as f64);
        self.stats.compacted = false;

        if (current as f64) > self.warning_threshold * (self.effective_cap as f64)
            && (current as f64) > self.strategy.threshold() * (self.effective_cap as f64)
        {
            let target = current.saturating_sub((self.warning_threshold * self.effective_cap as f64) as u64);
            let mut ctx = CompactionContext {
                conversation: &mut conversation,
                in_context_memory,
                working_memory,
            };
            let _outcome = self.strategy.compact(&mut ctx, target, self.estimator.as_ref(), &self.config);
            self.stats.compacted = true;

            let conversation_tokens = estimate_conversation(self.estimator.as_ref(), &conversation);
            let plugin_content_tokens: u64 = plugins
                .iter()
                .filter_map(|p| p.content())
                .map(|c| self.estimator.estimate_text(&c))
                .sum();
            current = system_tokens + plugin_instruction_tokens + conversation_tokens + plugin_content_tokens;
        }

        self.stats.last_total_tokens = current;

        if current > self.effective_cap {
            return Err(crate::RuntimeError::ContextOverflow {
                current,
                max: self.effective_cap,
            });
        }

        let plugin_content: Vec<(String, String)> = plugins
            .iter()
            .filter_map(|p| p.content().map(|c| (p.name().to_owned(), c)))
            .collect();

        Ok(AssembledContext {
            system_instructions: system_instructions.to_owned(),
            plugin_instructions,
            conversation,
            plugin_content,
            total_tokens: current,
        })
    }

    /// Run each plugin/strategy's idempotent post-iteration housekeeping.
    pub fn consolidate(
        &self,
        conversation: &mut Vec<ConversationItem>,
        in_context_memory: Option<&InContextMemoryPlugin>,
        working_memory: Option<&WorkingMemoryPlugin>,
    ) -> ConsolidationOutcome {
        let mut ctx = CompactionContext { conversation, in_context_memory, working_memory };
        self.strategy.consolidate(&mut ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrid_core::ids::ToolCallId;
    use crate::memory::MemoryPlugin;

    fn cfg() -> ContextConfig {
        ContextConfig::default()
    }

    #[test]
    fn assembly_under_warning_threshold_returns_as_is() {
        let mut mgr = ContextManager::new(10_000, cfg());
        let conversation = vec![ConversationItem::user_text("hello")];
        let result = mgr
            .assemble("be helpful", vec![], conversation, &[], None, None)
            .unwrap();
        assert!(!mgr.stats().compacted);
        assert!(result.total_tokens > 0);
    }

    #[test]
    fn default_rolling_removes_oldest_unpaired_items_first() {
        let mut conversation = vec![ConversationItem::user_text("x".repeat(2000))];
        for _ in 0..5 {
            conversation.push(ConversationItem::user_text("short"));
        }
        let mut mgr = ContextManager::new(120, cfg());
        let result = mgr
            .assemble("sys", vec![], conversation, &[], None, None)
            .unwrap();
        assert!(mgr.stats().compacted);
        assert!(result.conversation.len() < 6);
    }

    #[test]
    fn default_rolling_never_splits_a_tool_pair() {
        let id = ToolCallId::new();
        let conversation = vec![
            ConversationItem::Message {
                role: astrid_core::conversation::Role::Assistant,
                content: vec![ContentBlock::ToolUse {
                    id: id.clone(),
                    name: "add".to_owned(),
                    raw_arguments: "{}".repeat(500),
                    parsed_arguments: None,
                }],
            },
            ConversationItem::tool_result(id, "3", false),
        ];
        let mut mgr = ContextManager::new(50, cfg());
        let result = mgr
            .assemble("sys", vec![], conversation, &[], None, None)
            .unwrap();
        assert!(result.conversation.len() == 0 || result.conversation.len() == 2);
    }

    #[test]
    fn context_overflow_fails_when_compaction_is_insufficient() {
        let conversation = vec![ConversationItem::user_text("x".repeat(10_000))];
        let mut mgr = ContextManager::new(5, cfg());
        let result = mgr.assemble("sys", vec![], conversation, &[], None, None);
        assert!(matches!(result, Err(crate::RuntimeError::ContextOverflow { .. })));
    }

    #[test]
    fn algorithmic_tool_offload_moves_oversized_result_to_working_memory() {
        let working_memory = WorkingMemoryPlugin::new();
        let id = ToolCallId::new();
        let conversation = vec![
            ConversationItem::Message {
                role: astrid_core::conversation::Role::Assistant,
                content: vec![ContentBlock::ToolUse {
                    id: id.clone(),
                    name: "search".to_owned(),
                    raw_arguments: "{\"q\":\"rust\"}".to_owned(),
                    parsed_arguments: None,
                }],
            },
            ConversationItem::tool_result(id, "x".repeat(2048), false),
        ];

        let mut config = cfg();
        config.compaction_strategy_name = CompactionStrategyName::AlgorithmicToolOffload;
        let mut mgr = ContextManager::new(40, config);
        let result = mgr
            .assemble("sys", vec![], conversation, &[], None, Some(&working_memory))
            .unwrap();

        assert!(result.conversation.is_empty());
        assert!(!working_memory.store().list(None).is_empty());
    }

    fn offload_conversation(result_bytes: usize) -> (WorkingMemoryPlugin, AssembledContext) {
        let working_memory = WorkingMemoryPlugin::new();
        let id = ToolCallId::new();
        let conversation = vec![
            ConversationItem::Message {
                role: astrid_core::conversation::Role::Assistant,
                content: vec![ContentBlock::ToolUse {
                    id: id.clone(),
                    name: "search".to_owned(),
                    raw_arguments: "{\"q\":\"rust\"}".to_owned(),
                    parsed_arguments: None,
                }],
            },
            ConversationItem::tool_result(id, "x".repeat(result_bytes), false),
        ];

        let mut config = cfg();
        config.compaction_strategy_name = CompactionStrategyName::AlgorithmicToolOffload;
        let mut mgr = ContextManager::new(40, config);
        let result = mgr
            .assemble("sys", vec![], conversation, &[], None, Some(&working_memory))
            .unwrap();
        (working_memory, result)
    }

    #[test]
    fn result_exactly_at_byte_threshold_is_not_offloaded() {
        let threshold = cfg().result_size_threshold_bytes as usize;
        let (working_memory, _) = offload_conversation(threshold);
        assert!(working_memory.store().list(None).is_empty());
    }

    #[test]
    fn result_one_byte_over_threshold_is_offloaded() {
        let threshold = cfg().result_size_threshold_bytes as usize;
        let (working_memory, _) = offload_conversation(threshold + 1);
        assert_eq!(working_memory.store().list(None).len(), 1);
    }

    #[test]
    fn offloaded_entry_carries_a_result_of_call_description() {
        let threshold = cfg().result_size_threshold_bytes as usize;
        let (working_memory, _) = offload_conversation(threshold + 1);
        let content = working_memory.content().unwrap();
        assert!(content.contains("Result of search({\"q\":\"rust\"})"));
    }
}
