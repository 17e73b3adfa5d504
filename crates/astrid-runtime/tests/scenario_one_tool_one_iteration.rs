//! `add(2, 3)` tool-use followed by a text-only reply: two iterations, and
//! the conversation holds a matched tool-use/tool-result pair.

mod support;

use astrid_core::conversation::{ContentBlock, ConversationItem, Role};
use astrid_llm::{EchoProvider, EchoScript};
use astrid_runtime::{AgentSession, CancelSignal};
use astrid_tools::demo::AddTool;
use astrid_tools::ToolRegistry;

#[tokio::test]
async fn tool_call_then_final_answer_takes_two_iterations() {
    let provider = EchoProvider::new().with_script(vec![
        EchoScript::CallTool { name: "add".to_owned(), arguments: serde_json::json!({"a": 2, "b": 3}) },
        EchoScript::Fixed("5".to_owned()),
    ]);
    let mut tools = ToolRegistry::new();
    tools.register(Box::new(AddTool));
    let runtime = support::build_runtime(provider, tools);
    let mut session = AgentSession::new("You are a calculator.");

    let answer = runtime.run(&mut session, "What is 2+3?", CancelSignal::new(), None).await.unwrap();

    assert_eq!(answer, "5");
    assert_eq!(session.execution.iteration(), 2);
    assert_eq!(session.execution.tool_calls(), 1);

    let conversation = &session.document.conversation;
    assert_eq!(conversation.len(), 4);
    assert!(matches!(conversation[0], ConversationItem::Message { role: Role::User, .. }));
    let ConversationItem::Message { role: Role::Assistant, content } = &conversation[1] else {
        panic!("expected assistant tool-use message");
    };
    let ContentBlock::ToolUse { id: use_id, name, .. } = &content[0] else {
        panic!("expected a tool-use block");
    };
    assert_eq!(name, "add");

    let ConversationItem::Message { role: Role::User, content } = &conversation[2] else {
        panic!("expected a tool-result message");
    };
    let ContentBlock::ToolResult { tool_use_id, content: result_text, is_error, .. } = &content[0] else {
        panic!("expected a tool-result block");
    };
    assert_eq!(tool_use_id, use_id);
    assert_eq!(result_text, "5");
    assert!(!is_error);

    assert!(matches!(conversation[3], ConversationItem::Message { role: Role::Assistant, .. }));
}
