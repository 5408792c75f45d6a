use std::fmt::Write as _;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cleanit_backend_runtime::{telemetry, BackendServices, SESSION_SWEEP_INTERVAL};
use cleanit_config::load as load_config;
use cleanit_users::{can_access_admin_ui, main_screen, permissions_for, Role};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "cleanit-backend")]
#[command(about = "CleanIT backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
    /// Print the role/permission table
    Permissions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::Migrate => migrate().await,
        Commands::Permissions => {
            print!("{}", render_permission_table());
            Ok(())
        }
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting CleanIT backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let sweeper = services.spawn_session_sweeper(SESSION_SWEEP_INTERVAL);
    let app = services.router();

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(cleanit_backend_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    sweeper.abort();
    info!("backend shut down");
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;

    BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    println!("Migrations applied to {}", config.database.url);
    Ok(())
}

fn render_permission_table() -> String {
    let mut out = String::new();

    for role in Role::ALL {
        let _ = writeln!(
            out,
            "{role} (main screen: {}, admin ui: {})",
            main_screen(role).as_str(),
            if can_access_admin_ui(role) { "yes" } else { "no" }
        );
        for permission in permissions_for(role) {
            let _ = writeln!(out, "  - {}", permission.as_str());
        }
    }

    out
}
