//! Three oversized tool-result pairs pushed past the warning threshold: the
//! algorithmic tool-offload strategy moves each result into working memory
//! and the conversation drops back under budget.

use astrid_config::{CompactionStrategyName, ContextConfig};
use astrid_core::conversation::{ContentBlock, ConversationItem, Role};
use astrid_core::ids::ToolCallId;
use astrid_runtime::{ContextManager, WorkingMemoryPlugin};

fn tool_pair(result_bytes: usize) -> [ConversationItem; 2] {
    let id = ToolCallId::new();
    [
        ConversationItem::Message {
            role: Role::Assistant,
            content: vec![ContentBlock::ToolUse {
                id: id.clone(),
                name: "search".to_owned(),
                raw_arguments: "{\"q\":\"rust\"}".to_owned(),
                parsed_arguments: None,
            }],
        },
        ConversationItem::tool_result(id, "x".repeat(result_bytes), false),
    ]
}

#[test]
fn oversized_tool_results_move_to_working_memory_and_context_drops_under_cap() {
    let mut conversation = Vec::new();
    for _ in 0..3 {
        conversation.extend(tool_pair(5 * 1024));
    }

    let mut config = ContextConfig::default();
    config.compaction_strategy_name = CompactionStrategyName::AlgorithmicToolOffload;

    let effective_cap = 2_000;
    let mut manager = ContextManager::new(effective_cap, config);
    let working_memory = WorkingMemoryPlugin::new();

    let assembled = manager
        .assemble("sys", vec![], conversation, &[], None, Some(&working_memory))
        .unwrap();

    assert!(manager.stats().compacted);
    assert!((assembled.total_tokens as f64) < 0.70 * (effective_cap as f64));
    assert_eq!(working_memory.store().list(None).len(), 3);
}
