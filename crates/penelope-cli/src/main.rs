//! Penelope command line
//!
//! Runs chat turns against the two-pass orchestrator or a hosted assistant,
//! either one-shot or as a REPL, and manages hosted assistants.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{
    Agent, AgentBuilder, AssistantConfig, AssistantRunner, HistoryStore, JsonFileHistoryStore, LlmProvider,
    MemoryHistoryStore, SessionId, TurnResponse,
};
use agent_runtime::{AbacusProvider, AssistantsClient, NewAssistant, OpenAiConfig, OpenAiProvider};
use penelope::{PENELOPE_PROMPT, PenelopeConfig, SUMMARY_PROMPT, build_tools};

#[derive(Parser, Debug)]
#[command(name = "penelope")]
#[command(about = "Penelope, a crypto research assistant", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    /// How turns are processed
    #[arg(long, value_enum, default_value_t = Mode::Chat)]
    mode: Mode,

    /// Decision-pass backend in chat mode
    #[arg(long, value_enum, default_value_t = Backend::Openai)]
    backend: Backend,

    /// Resume a conversation
    #[arg(long)]
    session: Option<String>,

    /// Persist history as JSON files in this directory
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Hosted assistant to run in assistant mode
    #[arg(long)]
    assistant_id: Option<String>,

    /// Question to answer; starts a REPL when omitted
    input: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Decision pass, tool dispatch, summarizing pass
    Chat,
    /// Hosted assistant threads with polling
    Assistant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Openai,
    Abacus,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage hosted assistants
    #[command(subcommand)]
    Assistants(AssistantsCommand),
}

#[derive(Subcommand, Debug)]
enum AssistantsCommand {
    List,
    /// Create an assistant carrying Penelope's persona and tools
    Create {
        name: String,
        #[arg(long)]
        model: Option<String>,
    },
    Delete {
        id: String,
    },
}

/// The two ways a turn can be processed
enum Runner {
    Chat(Agent),
    Assistant(AssistantRunner),
}

impl Runner {
    async fn turn(&self, session: &SessionId, input: &str) -> TurnResponse {
        match self {
            Self::Chat(agent) => agent.process_input(session, input).await,
            Self::Assistant(runner) => runner.process_input(session, input).await,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    if let Some(Command::Assistants(command)) = args.command {
        manage_assistants(command).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = PenelopeConfig::from_env()?;
    let history = history_store(args.history_dir.clone().or_else(|| config.history_dir.clone()));
    let session = args.session.clone().map_or_else(SessionId::new, SessionId::from_string);
    info!(%session, mode = ?args.mode, "Starting Penelope");

    let runner = match args.mode {
        Mode::Chat => Runner::Chat(chat_agent(&config, args.backend, history).await?),
        Mode::Assistant => {
            let assistant_id = args
                .assistant_id
                .clone()
                .or_else(|| config.assistant_id.clone())
                .context("assistant mode needs --assistant-id or PENELOPE_ASSISTANT_ID")?;
            let backend = Arc::new(AssistantsClient::from_env()?);
            let tools = Arc::new(build_tools(&config)?);
            Runner::Assistant(
                AssistantRunner::new(backend, tools, AssistantConfig::new(assistant_id)).with_history(history),
            )
        }
    };

    if let Some(input) = args.input {
        let response = runner.turn(&session, &input).await;
        print_response(&response);
        return Ok(if response.success { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    repl(&runner, &session).await?;
    Ok(ExitCode::SUCCESS)
}

fn history_store(dir: Option<PathBuf>) -> Arc<dyn HistoryStore> {
    match dir {
        Some(dir) => Arc::new(JsonFileHistoryStore::new(dir)),
        None => Arc::new(MemoryHistoryStore::new()),
    }
}

async fn chat_agent(config: &PenelopeConfig, backend: Backend, history: Arc<dyn HistoryStore>) -> anyhow::Result<Agent> {
    let decider: Arc<dyn LlmProvider> = match backend {
        Backend::Openai => Arc::new(OpenAiProvider::from_env()?),
        Backend::Abacus => Arc::new(AbacusProvider::from_env()?),
    };

    match decider.health_check().await {
        Ok(true) => info!(provider = decider.name(), "Connected to decision backend"),
        Ok(false) | Err(_) => warn!(provider = decider.name(), "Decision backend not reachable, turns will fail"),
    }

    let mut builder = AgentBuilder::new()
        .provider(decider)
        .tools(build_tools(config)?)
        .history(history)
        .system_prompt(PENELOPE_PROMPT)
        .summary_prompt(SUMMARY_PROMPT)
        .model(&config.openai_model)
        .summary_model(&config.openai_model)
        .native_tools(backend == Backend::Openai);

    match OpenAiConfig::perplexity_from_env() {
        Ok(perplexity) => {
            builder = builder
                .summarizer(Arc::new(OpenAiProvider::from_config(perplexity)?))
                .summary_model(&config.perplexity_model);
        }
        Err(_) => warn!("PERPLEXITY_API_KEY not set, summarizing with the decision backend"),
    }

    Ok(builder.build()?)
}

async fn repl(runner: &Runner, session: &SessionId) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }

        print_response(&runner.turn(session, input).await);
    }

    Ok(())
}

fn print_response(response: &TurnResponse) {
    if response.success {
        println!("{}", response.response);
    } else {
        eprintln!("{}", response.error.as_deref().unwrap_or(response.response.as_str()));
    }
}

async fn manage_assistants(command: AssistantsCommand) -> anyhow::Result<()> {
    let client = AssistantsClient::from_env()?;

    match command {
        AssistantsCommand::List => {
            for assistant in client.list_assistants().await? {
                println!(
                    "{}\t{}\t{}",
                    assistant.id,
                    assistant.name.as_deref().unwrap_or("-"),
                    assistant.model
                );
            }
        }
        AssistantsCommand::Create { name, model } => {
            let config = PenelopeConfig::from_env()?;
            let tools = build_tools(&config)?;
            let created = client
                .create_assistant(&NewAssistant {
                    name,
                    model: model.unwrap_or_else(|| config.openai_model.clone()),
                    instructions: PENELOPE_PROMPT.into(),
                    tools: tools.schemas(),
                })
                .await?;
            println!("{}", created.id);
        }
        AssistantsCommand::Delete { id } => {
            let deleted = client.delete_assistant(&id).await?;
            println!("{id}: {}", if deleted { "deleted" } else { "not deleted" });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_chat_with_openai() {
        let args = Args::try_parse_from(["penelope", "price of sol?"]).unwrap();
        assert_eq!(args.mode, Mode::Chat);
        assert_eq!(args.backend, Backend::Openai);
        assert_eq!(args.input.as_deref(), Some("price of sol?"));
    }

    #[test]
    fn test_assistant_mode_flags() {
        let args = Args::try_parse_from([
            "penelope",
            "--mode",
            "assistant",
            "--assistant-id",
            "asst_123",
            "--session",
            "abc",
        ])
        .unwrap();
        assert_eq!(args.mode, Mode::Assistant);
        assert_eq!(args.assistant_id.as_deref(), Some("asst_123"));
        assert!(args.input.is_none());
    }

    #[test]
    fn test_assistants_subcommand() {
        let args = Args::try_parse_from(["penelope", "assistants", "delete", "asst_123"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Assistants(AssistantsCommand::Delete { ref id })) if id == "asst_123"
        ));
    }
}
