mod pipeline;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use psireg_core::EntityKind;
use tracing_subscriber::EnvFilter;

use crate::pipeline::{Pipeline, ScrapeOptions};

#[derive(Debug, Parser)]
#[command(name = "psireg")]
#[command(about = "Daily snapshots of the pharmacy regulator's public register")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape one or all registers and write today's snapshot
    Scrape {
        /// Register to scrape
        #[arg(long, value_enum, default_value_t = KindArg::All)]
        kind: KindArg,

        /// Snapshot date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Allow a first pharmacy run with no earlier snapshot to compare against
        #[arg(long)]
        bootstrap: bool,

        /// Replace a snapshot already written for this date
        #[arg(long)]
        force: bool,
    },
    /// Report pharmacies added and removed since the previous snapshot
    Diff {
        /// Snapshot date to compare (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Pharmacy,
    Pharmacist,
    Assistant,
    All,
}

impl KindArg {
    fn kinds(self) -> Vec<EntityKind> {
        match self {
            KindArg::Pharmacy => vec![EntityKind::Pharmacy],
            KindArg::Pharmacist => vec![EntityKind::Pharmacist],
            KindArg::Assistant => vec![EntityKind::Assistant],
            KindArg::All => EntityKind::ALL.to_vec(),
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = psireg_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pipeline = Pipeline::from_config(&config).context("failed to build register client")?;

    match cli.command {
        Commands::Scrape {
            kind,
            date,
            bootstrap,
            force,
        } => {
            let options = ScrapeOptions {
                date: date.unwrap_or_else(today),
                bootstrap,
                force,
            };
            for kind in kind.kinds() {
                let summary = pipeline
                    .scrape(kind, &options)
                    .await
                    .with_context(|| format!("{kind} scrape for {} failed", options.date))?;
                tracing::info!(
                    %kind,
                    records = summary.records,
                    skipped = summary.skipped,
                    lost_pages = ?summary.lost_pages,
                    events = summary.events.len(),
                    path = %summary.snapshot.display(),
                    "scrape complete"
                );
                for line in &summary.events {
                    println!("{line}");
                }
            }
        }
        Commands::Diff { date } => {
            let date = date.unwrap_or_else(today);
            let lines = pipeline
                .diff(date)
                .with_context(|| format!("pharmacy diff for {date} failed"))?;
            for line in lines {
                println!("{line}");
            }
        }
    }

    Ok(())
}
