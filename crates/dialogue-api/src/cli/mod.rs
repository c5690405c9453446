//! CLI definitions for the `dialogue` binary.
//!
//! Two subcommands run the services; the rest are operator tools that talk
//! to the local sidecar (`dialogue agent register`, `dialogue chat start`).

pub mod agent;
pub mod chat;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Tea-party dialogue services and tools.
#[derive(Parser)]
#[command(name = "dialogue", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a TOML config file (defaults to ./dialogue.toml).
    #[arg(long, global = true, env = "DIALOGUE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the orchestrator: agent registry and conversation routing.
    Orchestrator {
        /// Port to listen on.
        #[arg(short, long, default_value = "5300")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// Run the generator: LLM replies for routed turns.
    Generator {
        /// Port to listen on.
        #[arg(short, long, default_value = "5400")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// Manage tea-party agents.
    Agent {
        #[command(subcommand)]
        action: agent::AgentCommand,
    },

    /// Start or inspect the conversation.
    Chat {
        #[command(subcommand)]
        action: chat::ChatCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Cli {
    /// Default log level for the chosen verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_orchestrator_defaults() {
        let cli = Cli::try_parse_from(["dialogue", "orchestrator"]).unwrap();
        match cli.command {
            Commands::Orchestrator { port, host } => {
                assert_eq!(port, 5300);
                assert_eq!(host, "0.0.0.0");
            }
            _ => panic!("expected orchestrator"),
        }
    }

    #[test]
    fn parses_generator_port() {
        let cli = Cli::try_parse_from(["dialogue", "generator", "--port", "6000"]).unwrap();
        assert!(matches!(cli.command, Commands::Generator { port: 6000, .. }));
    }

    #[test]
    fn verbosity_maps_to_level() {
        let cli = Cli::try_parse_from(["dialogue", "-vv", "chat", "history"]).unwrap();
        assert_eq!(cli.log_level(), "trace");
        let cli = Cli::try_parse_from(["dialogue", "--quiet", "chat", "history"]).unwrap();
        assert_eq!(cli.log_level(), "error");
    }

    #[test]
    fn parses_chat_start_with_author() {
        let cli =
            Cli::try_parse_from(["dialogue", "chat", "start", "Tea, anyone?", "--as", "Alice"])
                .unwrap();
        match cli.command {
            Commands::Chat {
                action: chat::ChatCommand::Start { message, author },
            } => {
                assert_eq!(message, "Tea, anyone?");
                assert_eq!(author, "Alice");
            }
            _ => panic!("expected chat start"),
        }
    }

    #[test]
    fn chat_start_defaults_to_god() {
        let cli = Cli::try_parse_from(["dialogue", "chat", "start", "Begin"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Chat { action: chat::ChatCommand::Start { ref author, .. } } if author == "God"
        ));
    }

    #[test]
    fn agent_register_requires_tea() {
        assert!(
            Cli::try_parse_from(["dialogue", "agent", "register", "--name", "Hare", "--description", "a hare"])
                .is_err()
        );
        let cli = Cli::try_parse_from([
            "dialogue", "agent", "register", "--name", "Hare", "--description", "a hare", "--tea", "250",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Agent { action: agent::AgentCommand::Register { tea: 250, .. } }
        ));
    }
}
