use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nero_agent::config::{load_config, AgentConfig};
use nero_agent::history;
use nero_agent::llm::prompts::ConversationTemplates;
use nero_agent::llm::tools::{ToolRegistry, ToolResult};
use nero_agent::router;
use nero_agent::{ConfirmOutcome, Conversation, RecordStore};
use serde::Deserialize;
use serde_json::Value;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory for saved orders (overrides NERO_ORDERS_DIR)
    #[arg(long)]
    orders_dir: Option<PathBuf>,

    /// Check-in history file (overrides NERO_WELLNESS_LOG)
    #[arg(long)]
    wellness_log: Option<PathBuf>,

    /// Directory for captured sales leads (overrides NERO_LEADS_DIR)
    #[arg(long)]
    leads_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a conversation feed from stdin.
    ///
    /// JSON lines `{"name": ..., "arguments": {...}}` are function calls,
    /// `/confirm`, `/reset` and `/summary` are commands, anything else is a
    /// user utterance.
    Run {
        /// Service tag: chat, coffee, wellness or sdr
        #[arg(long)]
        service: Option<String>,

        /// Room metadata JSON carrying the service tag
        #[arg(long, conflicts_with = "service")]
        metadata: Option<String>,
    },
    /// Print the context a new check-in would start with
    Context,
    /// Print the check-in history
    History,
    /// List saved orders
    Orders,
    /// Print the function definitions offered to the LLM for a service
    Tools {
        #[arg(long)]
        service: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    log::info!("🚀 Starting with args: {:?}", args);

    let mut config: AgentConfig = load_config().context("Failed to load configuration")?;
    if let Some(dir) = args.orders_dir {
        config.store.orders_dir = dir;
    }
    if let Some(log_path) = args.wellness_log {
        config.store.wellness_log = log_path;
    }
    if let Some(dir) = args.leads_dir {
        config.store.leads_dir = dir;
    }

    let store = Arc::new(RecordStore::new(config.store.clone()));

    match args.command {
        Command::Run { service, metadata } => {
            let conversation = match metadata {
                Some(metadata) => {
                    Conversation::from_metadata(&metadata, store, config.context_max_messages)
                }
                None => Conversation::start(service.as_deref(), store, config.context_max_messages),
            };
            run_feed(conversation, io::stdin().lock())
        }
        Command::Context => {
            println!("{}", history::context_from_store(&store));
            Ok(())
        }
        Command::History => {
            let history = store.load_history();
            println!(
                "{}",
                serde_json::to_string_pretty(&history).context("Failed to render history")?
            );
            Ok(())
        }
        Command::Orders => {
            for order in store.load_orders() {
                println!(
                    "{}",
                    serde_json::to_string(&order).context("Failed to render order")?
                );
            }
            Ok(())
        }
        Command::Tools { service } => {
            let persona = router::route(service.as_deref());
            let registry = ToolRegistry::for_persona(persona);
            println!(
                "{}",
                serde_json::to_string_pretty(&registry.get_tool_definitions())
                    .context("Failed to render tool definitions")?
            );
            Ok(())
        }
    }
}

/// Drive one conversation from a line-oriented feed
fn run_feed(mut conversation: Conversation, input: impl BufRead) -> Result<()> {
    println!("persona: {}", conversation.persona().name());
    if let Some(context) = conversation.opening_context() {
        println!("context: {}", context);
    }

    for line in input.lines() {
        let line = line.context("Failed to read conversation feed")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/confirm" => match conversation.confirm() {
                Ok(ConfirmOutcome::Saved { path, summary }) => {
                    println!("saved: {} ({})", summary, path.display())
                }
                Ok(ConfirmOutcome::AlreadySaved(path)) => {
                    println!("already saved: {}", path.display())
                }
                Ok(ConfirmOutcome::Incomplete(missing)) => {
                    println!("agent: {}", ConversationTemplates::incomplete(&missing))
                }
                Ok(ConfirmOutcome::NothingToSave) => println!("nothing to save"),
                Err(e) => {
                    log::error!("❌ Save failed: {}", e);
                    println!("agent: {}", ConversationTemplates::save_failed("details"));
                }
            },
            "/reset" => {
                conversation.reset();
                println!("reset");
            }
            "/summary" => println!("summary: {}", conversation.summary()),
            _ if line.starts_with('{') => {
                let call: FunctionCall = match serde_json::from_str(line) {
                    Ok(call) => call,
                    Err(e) => {
                        log::warn!("Skipping malformed function call: {}", e);
                        continue;
                    }
                };
                match conversation.call_tool(&call.name, call.arguments) {
                    Ok(ToolResult::Success(Some(text))) => println!("agent: {}", text),
                    Ok(ToolResult::Success(None)) => println!("ok"),
                    Ok(ToolResult::Escalation(details)) => println!("escalation: {}", details),
                    Err(e) => println!("tool error: {}", e),
                }
            }
            utterance => {
                let updated = conversation.hear(utterance);
                if !updated.is_empty() {
                    println!("heard: {}", updated.join(", "));
                }
            }
        }
    }

    log::debug!("{}", conversation.transcript().summary());
    println!("agent: {}", ConversationTemplates::goodbye());
    Ok(())
}
