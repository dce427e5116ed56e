use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jobsift_match::MatchEngine;
use jobsift_sources::{HttpListingFetcher, SourceRegistry};
use jobsift_store::{PgProfileStore, PgStore};
use jobsift_sync::{Scheduler, SyncConfig, SyncCoordinator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "jobsift")]
#[command(about = "Job listing sync and match pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one sync cycle across all configured sources.
    Sync,
    /// Retire active postings whose last sync is older than the cutoff.
    Cleanup {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Rank active postings against a candidate profile.
    Match {
        user_id: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Run the interval scheduler until interrupted.
    Schedule,
    /// Apply database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobsift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = SyncConfig::from_env();
    tracing::info!(sources = %config.sources_path.display(), "loaded configuration");
    let store = Arc::new(
        PgStore::connect(&config.database_url)
            .await
            .context("connecting to database")?,
    );

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => {
            let coordinator = build_coordinator(&config, store)?;
            let summary = coordinator.sync_all().await;
            println!(
                "sync complete: sources_ok={} sources_failed={} created={}",
                summary.success_count,
                summary.failure_count,
                summary.created_total()
            );
        }
        Commands::Cleanup { days } => {
            let coordinator = build_coordinator(&config, store)?;
            let affected = coordinator.cleanup_inactive(days).await?;
            println!("cleanup complete: {affected} postings retired");
        }
        Commands::Match { user_id, limit } => {
            let profiles = Arc::new(PgProfileStore::new(store.pool().clone()));
            let engine = MatchEngine::new(store, profiles);
            let matches = engine.find_matches(&user_id, limit).await?;
            if matches.is_empty() {
                println!("no matches for {user_id}");
            }
            for (idx, result) in matches.iter().enumerate() {
                println!(
                    "{:>2}. [{:>5.1}] {} @ {} ({})",
                    idx + 1,
                    result.score,
                    result.posting.title,
                    result.posting.company,
                    result.posting.source_name
                );
                if !result.reasons.is_empty() {
                    println!("      {}", result.reasons.join("; "));
                }
            }
        }
        Commands::Schedule => {
            let coordinator = Arc::new(build_coordinator(&config, store)?);
            let scheduler = Scheduler::new(coordinator, config.scheduler_config());
            scheduler.start().await?;
            println!("scheduler running; press ctrl-c to stop");
            tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
            scheduler.stop().await?;
        }
        Commands::Migrate => {
            store.run_migrations().await.context("running migrations")?;
            println!("migrations applied");
        }
    }

    Ok(())
}

fn build_coordinator(config: &SyncConfig, store: Arc<PgStore>) -> Result<SyncCoordinator> {
    let registry = SourceRegistry::load(&config.sources_path)?;
    let fetcher = Arc::new(HttpListingFetcher::new(config.http_config())?);
    Ok(SyncCoordinator::new(registry, fetcher, store))
}
