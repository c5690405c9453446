//! Conversation CLI subcommands.

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;

use dialogue_core::history::ConversationHistory;
use dialogue_core::sidecar::Publisher;
use dialogue_infra::dapr::DaprClient;
use dialogue_types::config::ServiceConfig;
use dialogue_types::conversation::{ConversationMessage, HistoryEntry};

/// Author of conversation openers.
pub const DEFAULT_AUTHOR: &str = "God";

#[derive(Subcommand)]
pub enum ChatCommand {
    /// Publish an opening message to get the agents talking.
    Start {
        /// Message text.
        message: String,

        /// Author name; no agent with this name will be chosen to answer.
        #[arg(long = "as", default_value = DEFAULT_AUTHOR)]
        author: String,
    },

    /// Print the shared conversation history.
    History {
        /// Only show the last N entries.
        #[arg(long)]
        last: Option<usize>,
    },
}

pub async fn handle_chat_command(cmd: ChatCommand, config: &ServiceConfig, json: bool) -> Result<()> {
    let client = DaprClient::new(&config.sidecar, &config.runtime)?;
    match cmd {
        ChatCommand::Start { message, author } => {
            let message = ConversationMessage {
                name: author,
                message,
            };
            client
                .publish(
                    &config.runtime.conversations_topic,
                    &serde_json::to_value(&message)?,
                )
                .await
                .with_context(|| {
                    format!(
                        "Failed to publish to '{}'",
                        config.runtime.conversations_topic
                    )
                })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&message)?);
            } else {
                println!(
                    "  {} {}: {}",
                    style("->").green(),
                    style(&message.name).cyan().bold(),
                    message.message
                );
            }
            Ok(())
        }
        ChatCommand::History { last } => {
            let entries = ConversationHistory::new(client)
                .load()
                .await
                .context("Failed to read conversation history")?;
            let entries = tail(entries, last);

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("  {} The conversation has not started yet.", style("i").blue().bold());
                return Ok(());
            }
            for entry in &entries {
                println!("  {}", render_entry(entry));
            }
            Ok(())
        }
    }
}

fn tail(mut entries: Vec<HistoryEntry>, last: Option<usize>) -> Vec<HistoryEntry> {
    match last {
        Some(n) => entries.split_off(entries.len().saturating_sub(n)),
        None => entries,
    }
}

/// One history line: `[Name, 12 ml] message`.
fn render_entry(entry: &HistoryEntry) -> String {
    match &entry.agent {
        Some(agent) => format!(
            "[{}, {} ml] {}",
            style(&agent.name).cyan(),
            agent.tea_amount_ml,
            entry.message
        ),
        None => format!("[{}] {}", style("?").dim(), entry.message),
    }
}
