//! Agent CLI subcommands.
//!
//! `register` publishes a new agent on the agents topic, so the orchestrator
//! stores it exactly like an update coming from the generator. `list` reads
//! the live registry straight from the state store.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use dialogue_core::registry::AgentRegistry;
use dialogue_core::sidecar::Publisher;
use dialogue_infra::dapr::DaprClient;
use dialogue_types::agent::Agent;
use dialogue_types::config::ServiceConfig;

/// Agent subcommands.
#[derive(Subcommand)]
pub enum AgentCommand {
    /// Add an agent to the tea party.
    Register {
        /// Display name; turns authored under this name are not routed back to it.
        #[arg(long)]
        name: String,

        /// Character description fed into every prompt.
        #[arg(long)]
        description: String,

        /// Tea budget in millilitres.
        #[arg(long)]
        tea: u32,

        /// Explicit agent id (a UUIDv7 is generated otherwise).
        #[arg(long)]
        id: Option<String>,
    },

    /// List agents that still have tea.
    #[command(alias = "ls")]
    List,
}

/// Handle an agent subcommand.
pub async fn handle_agent_command(cmd: AgentCommand, config: &ServiceConfig, json: bool) -> Result<()> {
    let client = DaprClient::new(&config.sidecar, &config.runtime)?;
    match cmd {
        AgentCommand::Register {
            name,
            description,
            tea,
            id,
        } => {
            let agent = build_agent(id, name, description, tea)?;
            register_agent(&client, config, agent, json).await
        }
        AgentCommand::List => list_agents(&client, config, json).await,
    }
}

fn build_agent(id: Option<String>, name: String, description: String, tea: u32) -> Result<Agent> {
    if name.trim().is_empty() {
        bail!("Agent name must not be empty");
    }
    if tea == 0 {
        bail!("An agent needs some tea to join (--tea must be above 0)");
    }
    Ok(Agent {
        id: id.unwrap_or_else(|| Uuid::now_v7().to_string()),
        name,
        description,
        tea_amount_ml: tea,
    })
}

async fn register_agent(
    client: &DaprClient,
    config: &ServiceConfig,
    agent: Agent,
    json: bool,
) -> Result<()> {
    let payload = serde_json::to_value(&agent)?;
    client
        .publish(&config.runtime.agents_topic, &payload)
        .await
        .with_context(|| format!("Failed to publish agent to '{}'", config.runtime.agents_topic))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&agent)?);
    } else {
        println!();
        println!(
            "  {} Registered '{}' with {} ml of tea",
            style("ok").green(),
            style(&agent.name).cyan(),
            agent.tea_amount_ml,
        );
        println!("     id: {}", style(&agent.id).dim());
        println!();
    }
    Ok(())
}

async fn list_agents(client: &DaprClient, config: &ServiceConfig, json: bool) -> Result<()> {
    let registry = AgentRegistry::new(client.clone(), config.registry.atomic_writes);
    let agents = registry
        .live_agents()
        .await
        .context("Failed to read the agent registry")?;

    if json {
        let result = serde_json::json!({
            "agents": agents,
            "count": agents.len(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if agents.is_empty() {
        println!();
        println!("  {} No agents at the table.", style("i").blue().bold());
        println!("     Add one with: dialogue agent register --name <name> --description <text> --tea <ml>");
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Tea (ml)").fg(Color::White),
        Cell::new("Description").fg(Color::White),
        Cell::new("Id").fg(Color::White),
    ]);
    for agent in &agents {
        table.add_row(vec![
            Cell::new(&agent.name).fg(Color::Cyan),
            Cell::new(agent.tea_amount_ml),
            Cell::new(&agent.description),
            Cell::new(&agent.id).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  Agents at the table ({})", agents.len());
    println!();
    println!("{table}");
    println!();
    Ok(())
}
