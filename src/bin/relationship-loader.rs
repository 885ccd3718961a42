//! # Relationship Loader CLI
//!
//! Command-line interface for bulk-loading an edge list into a remote
//! relationship-graph authorization store. Reads one `source_id,target_id`
//! pair per input line, batches them, and writes each batch concurrently.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use relationship_loader::config::{MalformedPolicy, TransportSecurity, WriteErrorPolicy};
use relationship_loader::{
    GrpcRelationshipStore, IngestPipeline, LoaderConfig, LoaderError, LoaderResult,
};

#[derive(Parser, Debug)]
#[command(name = "relationship-loader")]
#[command(about = "Bulk-load an edge list into a relationship-graph authorization store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Input edge-list file (one `source_id,target_id` pair per line)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Configuration file path (default: ./relationship-loader.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store gRPC endpoint (e.g. "http://localhost:50051")
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Bearer credential presented to the store
    #[arg(short, long)]
    token: Option<String>,

    /// Use TLS for the store channel
    #[arg(long)]
    tls: bool,

    /// Records per write batch
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Maximum concurrent write requests
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Skip malformed input lines instead of aborting the run
    #[arg(long)]
    skip_malformed: bool,

    /// Keep dispatching batches after a write failure and report at the end
    #[arg(long)]
    continue_on_error: bool,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply_overrides(&self, config: &mut LoaderConfig) {
        if let Some(ref input) = self.input {
            config.ingest.input = Some(input.clone());
        }
        if let Some(ref endpoint) = self.endpoint {
            config.store.endpoint = endpoint.clone();
        }
        if let Some(ref token) = self.token {
            config.store.token = Some(token.clone());
        }
        if self.tls {
            config.store.security = TransportSecurity::Tls;
        }
        if let Some(batch_size) = self.batch_size {
            config.ingest.batch_size = batch_size;
        }
        if let Some(max_in_flight) = self.max_in_flight {
            config.ingest.max_in_flight = Some(max_in_flight);
        }
        if self.skip_malformed {
            config.ingest.on_malformed = MalformedPolicy::Skip;
        }
        if self.continue_on_error {
            config.ingest.on_write_error = WriteErrorPolicy::Continue;
        }
    }
}

#[tokio::main]
async fn main() -> LoaderResult<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level; progress lines are
    // emitted at info.
    let log_level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load configuration with precedence: flags > env > config file > defaults
    let mut config = if let Some(ref config_path) = cli.config {
        LoaderConfig::load_from_file(config_path)?
    } else {
        LoaderConfig::load()?
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    let input = config.ingest.input.clone().ok_or_else(|| {
        LoaderError::config_error("no input file given (pass FILE or set ingest.input)")
    })?;

    info!(
        endpoint = %config.store.endpoint,
        input = %input.display(),
        batch_size = config.ingest.batch_size,
        max_in_flight = ?config.ingest.max_in_flight,
        "Relationship loader starting"
    );

    let store = GrpcRelationshipStore::connect(&config.store, &config.schema).await?;
    let pipeline = IngestPipeline::new(Arc::new(store), config.ingest.clone());
    let report = pipeline.run_file(&input).await?;

    // Under the continue policy failed batches do not abort the run, but the
    // load is still incomplete.
    if report.batches_failed > 0 {
        return Err(LoaderError::PartialFailure {
            failed: report.batches_failed,
            dispatched: report.batches_dispatched,
        });
    }

    Ok(())
}
