use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sdg_core::model::UserId;
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

mod commands;
mod db;

#[derive(Parser)]
#[command(name = "sdg", about = "Play and author SDG learning modules")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database URL or file path
    #[arg(long, global = true, env = "SDG_DB_URL", default_value = "sqlite://sdg.sqlite3")]
    db: String,

    /// Learner whose progress is read and written
    #[arg(long, global = true, env = "SDG_USER_ID", default_value = "local-user")]
    user: UserId,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the demo goal if it is missing
    Seed,
    /// List goals with the learner's progress
    Goals,
    /// Print a goal's content tree as JSON
    Export(commands::catalog::ExportArgs),
    /// Play a module in the terminal
    Play(commands::play::PlayArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose.
    let fallback = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_url = db::normalize_sqlite_url(&cli.db);
    db::prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::System)
        .await
        .with_context(|| format!("opening {db_url}"))?;
    tracing::debug!(db = %db_url, user = %cli.user, "storage ready");

    match cli.command {
        Commands::Seed => commands::catalog::seed(&app).await,
        Commands::Goals => commands::catalog::goals(&app, &cli.user).await,
        Commands::Export(args) => commands::catalog::export(&app, args).await,
        Commands::Play(args) => commands::play::run(&app, cli.user, args).await,
    }
}
