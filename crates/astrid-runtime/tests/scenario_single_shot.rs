//! Input "Hello", no tools: one iteration, final text "Hi!", zero tool calls.

mod support;

use astrid_llm::{EchoProvider, EchoScript};
use astrid_runtime::{AgentSession, CancelSignal};
use astrid_tools::ToolRegistry;

#[tokio::test]
async fn single_shot_completes_in_one_iteration() {
    let provider = EchoProvider::new().with_script(vec![EchoScript::Fixed("Hi!".to_owned())]);
    let runtime = support::build_runtime(provider, ToolRegistry::new());
    let mut session = AgentSession::new("You are a helpful assistant.");

    let answer = runtime.run(&mut session, "Hello", CancelSignal::new(), None).await.unwrap();

    assert_eq!(answer, "Hi!");
    assert_eq!(session.execution.iteration(), 1);
    assert_eq!(session.execution.tool_calls(), 0);
}
