//! Regardless of how many tool round-trips a run takes, every tool-use
//! block in the final conversation has a matching tool-result block.

mod support;

use astrid_core::unpaired_tool_call_ids;
use astrid_llm::{EchoProvider, EchoScript};
use astrid_runtime::{AgentSession, CancelSignal};
use astrid_tools::demo::{AddTool, EchoTool};
use astrid_tools::ToolRegistry;

#[tokio::test]
async fn every_tool_use_has_a_matching_tool_result_after_multiple_round_trips() {
    let provider = EchoProvider::new().with_script(vec![
        EchoScript::CallTool { name: "add".to_owned(), arguments: serde_json::json!({"a": 1, "b": 1}) },
        EchoScript::CallTool { name: "echo".to_owned(), arguments: serde_json::json!({"message": "ping"}) },
        EchoScript::Fixed("done".to_owned()),
    ]);
    let mut tools = ToolRegistry::new();
    tools.register(Box::new(AddTool));
    tools.register(Box::new(EchoTool));
    let runtime = support::build_runtime(provider, tools);
    let mut session = AgentSession::new("You use tools as needed.");

    let answer = runtime.run(&mut session, "do some things", CancelSignal::new(), None).await.unwrap();

    assert_eq!(answer, "done");
    assert_eq!(session.execution.tool_calls(), 2);
    assert!(unpaired_tool_call_ids(&session.document.conversation).is_empty());
}
