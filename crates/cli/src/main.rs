use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use voyage_agents::ConciergeAgent;
use voyage_core::{
    is_exit_command, render_history, PartialDayPolicy, PlanningPolicy, RecallPolicy,
    ReferenceData, EXAMPLE_REQUEST, FAREWELL, GREETING,
};
use voyage_observability::{init_tracing, AppMetrics};
use voyage_storage::{Store, TripHistoryRepository};

#[derive(Debug, Parser)]
#[command(name = "voyage")]
#[command(about = "Conversational trip planner")]
struct Cli {
    #[arg(long, env = "VOYAGE_DATASET", default_value = "data/travel_dataset.json")]
    dataset: PathBuf,

    #[arg(
        long,
        env = "VOYAGE_DATABASE_URL",
        default_value = "sqlite://travel_memory.db"
    )]
    database_url: String,

    /// Keep trip history only for the lifetime of this process.
    #[arg(long)]
    in_memory: bool,

    #[arg(long, env = "VOYAGE_SEED")]
    seed: Option<u64>,

    /// What happens to a day's leftover slots when a theme has too few matches.
    #[arg(long, env = "VOYAGE_PARTIAL_DAY", default_value = "keep")]
    partial_day: String,

    #[arg(long, env = "VOYAGE_RECALL", default_value = "regenerate")]
    recall: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat,
    Ask {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Cities,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("voyage_cli");
    let cli = Cli::parse();

    let reference = Arc::new(
        ReferenceData::load(&cli.dataset)
            .with_context(|| format!("failed loading dataset from {}", cli.dataset.display()))?,
    );

    let metrics = AppMetrics::shared();

    match &cli.command {
        Command::Cities => {
            for city in reference.cities() {
                println!(
                    "{} ({} hotels, {} attractions)",
                    city.city,
                    city.hotels.len(),
                    city.attractions.len()
                );
            }
        }
        Command::History { limit } => {
            let store = open_store(&cli.database_url, cli.in_memory).await?;
            let trips = store.recent_trips(*limit).await?;
            println!("{}", render_history(&trips));
        }
        Command::Ask { text, json } => {
            let mut agent = build_agent(&cli, reference, metrics.clone()).await?;
            let reply = agent.handle_message(&text.join(" ")).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                println!("{}", reply.reply_text);
            }
        }
        Command::Chat => {
            let agent = build_agent(&cli, reference, metrics.clone()).await?;
            run_chat(agent).await?;
        }
    }

    debug!(metrics = ?metrics.snapshot(), "session finished");

    Ok(())
}

async fn run_chat(mut agent: ConciergeAgent<Store>) -> Result<()> {
    println!("{GREETING}");
    println!("{EXAMPLE_REQUEST}");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\nYou: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let message = line?;
        let message = message.trim();

        if is_exit_command(message) {
            println!("{FAREWELL}");
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = agent.handle_message(message).await?;
        println!("\n{}", reply.reply_text);
    }

    Ok(())
}

async fn build_agent(
    cli: &Cli,
    reference: Arc<ReferenceData>,
    metrics: Arc<AppMetrics>,
) -> Result<ConciergeAgent<Store>> {
    let policy = PlanningPolicy {
        partial_day: cli
            .partial_day
            .parse::<PartialDayPolicy>()
            .map_err(anyhow::Error::msg)
            .context("invalid --partial-day value")?,
        recall: cli
            .recall
            .parse::<RecallPolicy>()
            .map_err(anyhow::Error::msg)
            .context("invalid --recall value")?,
        ..PlanningPolicy::default()
    };

    let store = open_store(&cli.database_url, cli.in_memory).await?;
    let agent = ConciergeAgent::new(reference, policy, Arc::new(store), metrics);

    Ok(match cli.seed {
        Some(seed) => agent.with_seed(seed),
        None => agent,
    })
}

async fn open_store(database_url: &str, in_memory: bool) -> Result<Store> {
    if in_memory {
        debug!("using in-memory trip history");
        return Ok(Store::memory());
    }

    Store::sqlite(database_url)
        .await
        .with_context(|| format!("failed opening trip history at {database_url}"))
}
