mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "vidit")]
#[command(about = "Fetch, rank and deduplicate news from configured sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one fetch pass over every active source.
    Fetch {
        /// Rank without writing anything and print the top items.
        #[arg(long)]
        dry_run: bool,
        /// Number of items printed by `--dry-run`.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Recompute scores for every stored item.
    Rescore,
    /// Delete stored near-duplicates, keeping the best-scored of each group.
    Dedup,
    /// Apply pending database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = vidit_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = vidit_db::PoolConfig::from_app_config(&config);
    let pool = vidit_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Fetch { dry_run, limit } => {
            commands::run_fetch(pool, &config, dry_run, limit).await?;
        }
        Commands::Rescore => commands::run_rescore(pool, &config).await?,
        Commands::Dedup => commands::run_dedup(pool, &config).await?,
        Commands::Migrate => commands::run_migrate(&pool).await?,
    }

    Ok(())
}
