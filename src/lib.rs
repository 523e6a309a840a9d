use anyhow::{Context, Result};

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod messages;
pub mod order;
pub mod parser;
pub mod system_info;
pub mod template;

#[doc(hidden)]
pub mod tests {
    pub mod util;
}

pub use api::{router as api_router, ApiConfig};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use order::{compose_lines, order_totals, OrderDraft, OrderError, OrderLine};
pub use parser::{parse_line, parse_order_text, ParsedLine};
pub use system_info::get_system_info;
pub use template::render_message;

// ──────────────────────────────────────────────────────────────
// Application setup
// ──────────────────────────────────────────────────────────────

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

async fn open_database(config: &Config) -> Result<db::Database> {
    let db_url = db::prepare_sqlite_url(&config.db_url);
    tracing::info!("Connecting to database at: {}", &db_url);

    let pool = db::connect_db(&db_url, config.max_connections).await?;
    let db = db::Database::new(pool);
    db.migrate().await?;

    tracing::info!("Database connection successful.");
    Ok(db)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn serve(config: Config) -> Result<()> {
    let db = open_database(&config).await?;
    let app = api::router(
        db,
        api::ApiConfig {
            rate_limit_per_second: config.rate_limit_per_second,
        },
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;
    Ok(())
}

/// Entry point shared by the binary: load configuration, then run the
/// selected command.
pub async fn run(cli: Cli) -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("Starting restock API...");
            serve(config).await
        }
        Commands::Token(command) => {
            let db = open_database(&config).await?;
            println!("{}", commands::run_token_command(&db, command).await?);
            Ok(())
        }
        Commands::Parse(args) => {
            let output = commands::run_parse_command(&args)?;
            if !output.is_empty() {
                println!("{output}");
            }
            Ok(())
        }
    }
}
