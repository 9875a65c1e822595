use anyhow::Context;
use clap::Parser;
use trivia_api::db;
use trivia_api::server::app::{run_server, AppState};
use trivia_api::settings::Settings;
use trivia_api::telemetry::init_tracing;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on, overrides BIND_ADDR
    #[clap(long)]
    bind: Option<String>,
    /// Database path, overrides DB_PATH
    #[clap(long)]
    db_path: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }
    if let Some(db_path) = cli.db_path {
        settings.db_path = db_path;
    }

    let pool = db::init(&settings.db_path)
        .await
        .with_context(|| format!("Cannot open database at {}", settings.db_path))?;
    let state = AppState::new(pool, settings.questions_per_page);
    run_server(state, &settings.bind_addr).await
}
