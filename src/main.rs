//! Sidecar - external tool orchestration for editors
//!
//! Runs linters, formatters and other command-line tools against files and
//! merges their results into diagnostics, formatted text and more.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sidecar::app::App;
use sidecar::cli::{Cli, Commands, commands};

fn main() {
    // Quiet by default; RUST_LOG=sidecar=debug for verbose output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sidecar=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!(
                r#"{{"success":false,"error":"Failed to create runtime: {}"}}"#,
                e
            );
            std::process::exit(1);
        }
    };
    let result = runtime.block_on(async_main());

    if let Err(e) = result {
        // Errors go out as JSON for consistent machine consumption
        let response = serde_json::json!({
            "success": false,
            "error": e.to_string()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&response)
                .unwrap_or_else(|_| { format!(r#"{{"success":false,"error":"{}"}}"#, e) })
        );
        std::process::exit(2);
    }
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = cli
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let app = App::new(cli.root, format)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;

    match cli.command {
        Commands::Check(args) => commands::check::execute(args, &app).await,
        Commands::Fmt(args) => commands::fmt::execute(args, &app).await,
        Commands::Doctor(args) => commands::doctor::execute(args, &app).await,
    }
}
