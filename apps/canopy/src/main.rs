//! # Canopy
//!
//! Entry point: parse the command line, set up logging, dispatch.
//!
//! ```bash
//! canopy species
//! canopy chave --species neem --forest-type moist
//! canopy score --species teak --simulate --seed 7
//! canopy init && canopy ingest --device esp32-01 --species neem --sensor readings.json
//! RUST_LOG=debug canopy serve --api-key s3cret --simulate-interval 5
//! ```

use canopy::cli::{self, Cli, Commands};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "canopy=info,canopy_core=info,tower_http=info,warn";
const VERBOSE_FILTER: &str = "canopy=debug,canopy_core=debug,tower_http=debug,info";

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let default_filter = if args.verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> cli::CliResult {
    let catalog = cli::load_catalog(args.catalog.as_deref())?;

    match &args.command {
        Commands::Species => cli::cmd_species(&catalog, args.json),
        Commands::Chave(chave) => cli::cmd_chave(&catalog, chave, args.json),
        Commands::Score(score) => cli::cmd_score(&catalog, score, args.json),
        Commands::Init { force } => cli::cmd_init(&args.database, *force),
        Commands::Ingest {
            device,
            species,
            sensor,
        } => cli::cmd_ingest(&args.database, &catalog, device, species, sensor, args.json).map(|_| ()),
        Commands::History { device, limit } => {
            cli::cmd_history(&args.database, device, *limit, args.json)
        }
        Commands::Serve(serve) => cli::cmd_serve(&args.database, catalog, serve).await,
    }
}
