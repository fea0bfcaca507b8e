//! dlshelf command-line entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dlshelf_cli::{Cli, CliError, Commands, handlers, resolve_settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads DLSHELF_* and before RUST_LOG is consulted
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let settings = resolve_settings(&cli.settings)?;

    match cli.command {
        Some(Commands::Simulate { step_ms, json }) => {
            handlers::simulate::execute(settings, step_ms, json).await?;
        }
        Some(Commands::RenderIcon {
            progress,
            indeterminate,
            size,
            out,
        }) => {
            let size = size.unwrap_or_else(|| settings.effective_icon_size());
            handlers::render_icon::execute(size, progress, indeterminate, &out)?;
        }
        Some(Commands::Settings) => {
            handlers::settings::execute(&settings)?;
        }
        None => {
            // No subcommand: run the default scenario
            handlers::simulate::execute(settings, handlers::simulate::DEFAULT_STEP_MS, false)
                .await?;
        }
    }

    Ok(())
}
