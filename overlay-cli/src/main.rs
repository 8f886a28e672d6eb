//! # Overlay
//!
//! Command line front end for overlay project documents.

use clap::Parser;
use overlay_cli::CliArgs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "overlay_cli=info,overlay_renderer=info,overlay_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    tracing::debug!("Parsed arguments: {:?}", args);

    overlay_cli::run(args).await
}
