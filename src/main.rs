//! Command line entry point: harvest every draw in a date range to disk.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use lotto_history::{Config, DrawQuery, LotteryHarvester};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lotto-history")]
#[command(about = "Fetch historical lottery draw results and save them to disk")]
struct Cli {
    /// JSON configuration file (defaults apply for anything missing)
    #[arg(long)]
    config: Option<PathBuf>,

    /// First day of the range, YYYY-MM-DD
    #[arg(long, default_value = "2000-01-01")]
    start_date: NaiveDate,

    /// Last day of the range, YYYY-MM-DD (default: today)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Game name to enumerate draws for (default: from config)
    #[arg(long)]
    game: Option<String>,

    /// Maximum concurrent draw requests
    #[arg(long)]
    workers: Option<usize>,

    /// Directory the artifacts are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> lotto_history::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(workers) = self.workers {
            config.dispatch.worker_count = workers;
        }
        if let Some(dir) = &self.output_dir {
            config.output.output_dir = dir.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lotto_history=info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Harvest aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> lotto_history::Result<ExitCode> {
    let config = cli.load_config()?;
    let query = DrawQuery::new(
        cli.start_date,
        cli.end_date
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
        cli.game.clone().unwrap_or_else(|| config.api.game_name.clone()),
    );

    let harvester = LotteryHarvester::new(config)?;
    let report = harvester.run(&query).await?;

    println!("{}", "-".repeat(50));
    println!("Successfully fetched {} lotteries", report.state.success_count);
    println!("Failed to fetch {} lotteries", report.state.failure_count);
    println!("{}", "-".repeat(50));

    if report.artifacts.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(
            failed = report.artifacts.failed_count(),
            "Some artifacts could not be written"
        );
        Ok(ExitCode::FAILURE)
    }
}
