//! Astrid CLI - thin demonstration binary for the agent runtime.
//!
//! Wires an [`astrid_llm::EchoProvider`] and the reference demo tools
//! (`echo`, `add`, `sleep`) into [`astrid_runtime::AgentRuntime`] and
//! drives either a single prompt or an interactive REPL. No network
//! access, no API key: this binary exists to exercise the loop end to
//! end, not to be a production agent client.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use astrid_approval::request::PermissionScope;
use astrid_approval::PermissionManager;
use astrid_audit::AuditLog;
use astrid_config::Config;
use astrid_events::EventBus;
use astrid_hooks::HookManager;
use astrid_llm::EchoProvider;
use astrid_runtime::{AgentRuntime, AgentSession, CancelSignal, RuntimeConfig};
use astrid_storage::MemorySessionStore;
use astrid_tools::demo::{AddTool, EchoTool, SleepTool};
use astrid_tools::ToolRegistry;
use clap::{Parser, Subcommand};

/// Astrid - thin demonstration agent runtime client.
#[derive(Parser)]
#[command(name = "astrid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workspace root used to resolve `.astrid/config.toml` layers.
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single prompt to completion and print the final answer.
    Run {
        /// The user message to send.
        prompt: String,
    },
    /// Start an interactive REPL against the demo runtime.
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolved = Config::load(cli.workspace.as_deref()).context("loading configuration")?;
    let cfg = resolved.config;
    init_tracing(&cfg.logging);

    let runtime = build_runtime(&cfg)?;
    let mut session = AgentSession::new(cfg.run.instructions.clone().unwrap_or_else(|| {
        "You are a helpful assistant running in the Astrid demo runtime.".to_owned()
    }));

    match cli.command {
        Commands::Run { prompt } => {
            let answer = runtime.run(&mut session, prompt, CancelSignal::new(), None).await?;
            println!("{answer}");
        },
        Commands::Chat => run_chat(&runtime, &mut session).await?,
    }

    Ok(())
}

fn init_tracing(logging: &astrid_config::LoggingSection) {
    let filter = tracing_subscriber::EnvFilter::try_new(&logging.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if logging.format == "json" {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    if let Err(error) = result {
        eprintln!("tracing already initialized: {error}");
    }
}

fn build_runtime(cfg: &Config) -> Result<Arc<AgentRuntime<EchoProvider>>> {
    let mut tools = ToolRegistry::with_defaults();
    tools.register(Box::new(EchoTool));
    tools.register(Box::new(AddTool));
    tools.register(Box::new(SleepTool));

    let permissions = Arc::new(PermissionManager::new(to_permission_scope(cfg.permissions.default_scope)));
    let runtime_config = RuntimeConfig { run: cfg.run.clone(), context: cfg.context.clone(), retry: cfg.retry.clone() };

    Ok(Arc::new(AgentRuntime::new(
        Arc::new(EchoProvider::new()),
        Arc::new(tools),
        permissions,
        Arc::new(HookManager::new()),
        Arc::new(MemorySessionStore::new()),
        Arc::new(EventBus::new()),
        Arc::new(AuditLog::in_memory()),
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        runtime_config,
    )))
}

fn to_permission_scope(scope: astrid_config::ApprovalScopeConfig) -> PermissionScope {
    match scope {
        astrid_config::ApprovalScopeConfig::Always => PermissionScope::Always,
        astrid_config::ApprovalScopeConfig::Session => PermissionScope::Session,
        astrid_config::ApprovalScopeConfig::Once => PermissionScope::Once,
        astrid_config::ApprovalScopeConfig::Never => PermissionScope::Never,
    }
}

async fn run_chat(runtime: &Arc<AgentRuntime<EchoProvider>>, session: &mut AgentSession) -> Result<()> {
    println!("astrid demo chat. Type 'exit' to quit.");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.read_line(&mut line).context("reading stdin")? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }
        match runtime.run(session, line.to_owned(), CancelSignal::new(), None).await {
            Ok(answer) => println!("{answer}"),
            Err(error) => eprintln!("error: {error}"),
        }
    }
    Ok(())
}
