//! Line-oriented console driver for the lead engine
//!
//! Every input line is `<agent-id>[@username] <event>` where the event is a
//! slash command (`/start`, `/getnewlead`, ...), `contact <phone>` or
//! `press <callback-data>`. Operator lines are `stats`, `leads` and `quit`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use leadq_engine::api::callback_payload;
use leadq_engine::config::StoreBackend;
use leadq_engine::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Console driver for the lead assignment engine", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the configured backend)
    #[arg(short, long)]
    database: Option<String>,

    /// JSON file with table fixtures, e.g. {"leads": [[...], ...], "team": [[...], ...]}
    #[arg(short, long)]
    fixtures: Option<PathBuf>,

    /// Load a small built-in set of leads and team members
    #[arg(long)]
    demo: bool,

    /// Response deadline in seconds (overrides the configuration)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level (overridden by RUST_LOG)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Table fixtures keyed by table name
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct Fixtures(HashMap<String, Vec<Vec<String>>>);

fn demo_fixtures(config: &LeadEngineConfig) -> Fixtures {
    let table = |rows: &[&[&str]]| -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    };

    let mut tables = HashMap::new();
    tables.insert(
        config.store.leads_sheet.clone(),
        table(&[
            &["LeadID", "Name", "Phone", "OtherInfo", "Status", "AssignedTo"],
            &["3", "Priya Shah", "+91 98200 00003", "Asked for pricing", "", ""],
            &["1", "Marco Rossi", "+39 333 000 0001", "", "", ""],
            &["2", "Lena Vogel", "+49 151 0000002", "Call after 5pm", "Interested", "demo"],
            &["", "Walk-in", "+1 555 0100", "", "", ""],
        ]),
    );
    tables.insert(
        config.store.team_sheet.clone(),
        table(&[
            &["Phone Number", "Telegram Name"],
            &["+1 555 0001", "Alice"],
            &["+1 555 0002", "Bob"],
        ]),
    );
    Fixtures(tables)
}

fn load_config(args: &Args) -> Result<LeadEngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<LeadEngineConfig>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => LeadEngineConfig::default(),
    };

    if let Some(path) = &args.database {
        config.store.backend = StoreBackend::Sqlite;
        config.store.database_path = path.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.dispatch.response_timeout = Duration::from_secs(secs);
    }

    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

/// Split `<agent-id>[@username] <event>` into a chat user and the event text
fn parse_line(line: &str) -> Option<(ChatUser, &str)> {
    let (who, rest) = line.trim().split_once(char::is_whitespace)?;
    let (id, username) = match who.split_once('@') {
        Some((id, username)) => (id, Some(username)),
        None => (who, None),
    };
    if id.is_empty() {
        return None;
    }
    Some((ChatUser::new(AgentId::from(id), username), rest.trim()))
}

fn to_inbound(event: &str) -> Inbound {
    if let Some(phone) = event.strip_prefix("contact ") {
        Inbound::Contact {
            phone: phone.trim().to_string(),
        }
    } else if let Some(data) = event.strip_prefix("press ") {
        Inbound::Callback(data.trim().to_string())
    } else {
        Inbound::Message(event.to_string())
    }
}

fn print_message(prefix: &str, agent_id: &AgentId, message: &OutboundMessage) {
    println!("{} [{}]", prefix, agent_id);
    for line in message.text.lines() {
        println!("    {}", line);
    }
    for choice in &message.choices {
        println!("    [{}] press {}", choice.label(), callback_payload(*choice, agent_id));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&args)?;
    let (notifier, mut deliveries) = ChannelNotifier::new();

    let mut server = LeadEngineServerBuilder::new()
        .with_config(config.clone())
        .with_notifier(Arc::new(notifier))
        .build()
        .await
        .context("building lead server")?;

    let mut fixtures = Vec::new();
    if args.demo {
        fixtures.push(demo_fixtures(&config));
    }
    if let Some(path) = &args.fixtures {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixtures {}", path.display()))?;
        fixtures.push(serde_json::from_str::<Fixtures>(&raw).context("parsing fixtures")?);
    }
    for Fixtures(tables) in fixtures {
        for (sheet, rows) in tables {
            server.seed_sheet(&sheet, &rows).await?;
        }
    }

    server.start().await?;

    let printer = tokio::spawn(async move {
        while let Some(delivery) = deliveries.recv().await {
            print_message("📨", &delivery.agent_id, &delivery.message);
        }
    });

    println!("lead console ready: `<agent-id>[@username] /start`, `contact <phone>`, `press <data>`; `stats`, `leads`, `quit`");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            "stats" => {
                let stats = server.supervisor_api().get_stats().await;
                println!("{}", serde_json::to_string_pretty(&stats)?);
                continue;
            }
            "leads" => {
                match server.supervisor_api().list_leads().await {
                    Ok(leads) => {
                        for lead in leads {
                            println!(
                                "  row {:>3}  {:<10} {:<20} {:<24} {}",
                                lead.row,
                                lead.lead_id.as_str(),
                                lead.name,
                                lead.status.as_str(),
                                lead.assigned_to.unwrap_or_default()
                            );
                        }
                    }
                    Err(e) => error!("Failed to read leads: {}", e),
                }
                continue;
            }
            _ => {}
        }

        let Some((user, event)) = parse_line(line) else {
            println!("expected `<agent-id>[@username] <event>`");
            continue;
        };

        if let Some(reply) = server.handler().handle(&user, to_inbound(event)).await {
            print_message("💬", &user.id, &reply);
        }
    }

    info!("Shutting down");
    server.stop().await?;
    printer.abort();
    Ok(())
}
