//! `evees`: store content, manage perspectives, resolve and explore them

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evees_cli::{App, EveesConfig, NewPerspective, explore_json};
use evees_core::{ContentAddress, SearchFilter};
use evees_logging::EveesSubscriberBuilder;
use evees_resolve::CancellationToken;
use tracing::{debug, warn};

#[derive(Parser, Debug)]
#[command(name = "evees", version, about = "Resolve perspectives into content-addressed documents")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short, default_value = "evees.toml")]
    config: PathBuf,

    /// Override the configured data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Cancel resolution after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a text object and print its address
    PutText { text: String },

    /// Store a text node linking to existing objects, in order
    PutNode {
        text: String,
        links: Vec<String>,
    },

    /// Create a perspective pointing at an existing object
    CreatePerspective {
        #[arg(long)]
        name: String,
        #[arg(long)]
        context: String,
        #[arg(long)]
        creator: String,
        /// Creation time in Unix millis (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
        #[arg(long)]
        head: String,
    },

    /// Point a perspective at a new head
    SetHead { id: String, head: String },

    /// Resolve one perspective
    Resolve {
        id: String,
        #[arg(long)]
        levels: Option<u32>,
        #[arg(long)]
        entities: Option<bool>,
    },

    /// Resolve every perspective matching a filter
    Explore {
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        creator: Option<String>,
        #[arg(long)]
        origin: Option<String>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
        /// Identity the search is performed as
        #[arg(long)]
        caller: Option<String>,
        #[arg(long)]
        levels: Option<u32>,
        #[arg(long)]
        entities: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = EveesConfig::load(&cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }

    let _log_guard = EveesSubscriberBuilder::new()
        .with_config(config.log.clone())
        .try_init()?;
    debug!(config = ?cli.config, "Loaded configuration");

    let app = App::open(&config)
        .await
        .context("failed to open stores")?;
    let cancel = cancellation(cli.timeout_ms);

    let output = match cli.command {
        Command::PutText { text } => app.put_text(&text).await?.to_string(),
        Command::PutNode { text, links } => {
            let links = links.into_iter().map(ContentAddress::from).collect();
            app.put_node(&text, links).await?.to_string()
        }
        Command::CreatePerspective {
            name,
            context,
            creator,
            timestamp,
            head,
        } => app
            .create_perspective(NewPerspective {
                name,
                context,
                creator_id: creator,
                timestamp,
                head: head.into(),
            })
            .await?
            .to_string(),
        Command::SetHead { id, head } => {
            app.set_head(&id.into(), head.into()).await?;
            String::from("ok")
        }
        Command::Resolve {
            id,
            levels,
            entities,
        } => {
            let result = app
                .resolve(&id.into(), app.options(levels, entities), &cancel)
                .await?;
            serde_json::to_string_pretty(&result)?
        }
        Command::Explore {
            context,
            creator,
            origin,
            text,
            offset,
            limit,
            caller,
            levels,
            entities,
        } => {
            let filter = SearchFilter {
                context,
                creator_id: creator,
                origin,
                text,
                offset,
                limit,
            };
            let hits = app
                .explore(&filter, app.options(levels, entities), caller.as_deref(), &cancel)
                .await?;
            serde_json::to_string_pretty(&explore_json(&hits)?)?
        }
    };

    println!("{output}");
    Ok(())
}

/// Token cancelled on Ctrl-C or when the timeout elapses
fn cancellation(timeout_ms: Option<u64>) -> CancellationToken {
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    if let Some(ms) = timeout_ms {
        let on_timeout = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            warn!(timeout_ms = ms, "Timed out, cancelling");
            on_timeout.cancel();
        });
    }

    cancel
}
