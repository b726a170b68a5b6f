use clap::Parser;
use tracing::info;

use inkwell_core::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    inkwell_core::util::init_logging();

    let cli = Cli::parse();
    info!("Opening Inkwell workspace at {}", cli.project.display());

    inkwell_core::cli::run(cli).await
}
