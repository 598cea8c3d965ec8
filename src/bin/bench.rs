//! Benchmark runner: repeated leader-election iterations with cold-start
//! and failover latency collection.
//!
//! Run: cargo run --bin bench -- --iterations 5 --participants 3

use clap::Parser;
use dotenv::dotenv;
use election_bench::{ElectionConfig, Harness, InMemoryHive};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bench", about = "Leader-election failover benchmark")]
struct Args {
    /// Number of election iterations to run.
    #[arg(long, default_value_t = 5)]
    iterations: u32,

    /// Participants per iteration.
    #[arg(long, default_value_t = 3)]
    participants: usize,

    /// Run number of the first iteration, for metrics correlation.
    #[arg(long, default_value_t = 1)]
    run_offset: u32,

    /// Keep stale nodes and the death-timestamp slot from a previous run.
    #[arg(long)]
    skip_cleanup: bool,

    /// Override the cold-start metrics file.
    #[arg(long)]
    cold_start_file: Option<PathBuf>,

    /// Override the failover metrics file.
    #[arg(long)]
    failover_file: Option<PathBuf>,

    /// Override the death-timestamp file.
    #[arg(long)]
    death_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ElectionConfig::from_env();
    if let Some(path) = args.cold_start_file {
        config.cold_start_file = path;
    }
    if let Some(path) = args.failover_file {
        config.failover_file = path;
    }
    if let Some(path) = args.death_file {
        config.death_file = path;
    }

    println!(
        "Starting leader election benchmark - {} iterations, {} participants",
        args.iterations, args.participants
    );
    println!("=========================================");

    let harness = Harness::new(InMemoryHive::new(), config.clone(), args.participants);
    let reports = harness
        .run(args.iterations, args.run_offset, !args.skip_cleanup)
        .await?;

    for report in &reports {
        println!(
            "Run {}: {} crash, {} failover, {} fatal, {} aborted ({} ms)",
            report.run_no,
            report.crashes(),
            report.failovers(),
            report.fatal_errors.len(),
            report.aborted,
            report.elapsed.as_millis()
        );
    }

    println!("=========================================");
    println!(
        "Done. Cold-start data: {}, failover data: {}",
        config.cold_start_file.display(),
        config.failover_file.display()
    );
    Ok(())
}
