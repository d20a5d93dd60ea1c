//! NuBot application bootstrap and command dispatch.

use std::io::BufRead;
use std::sync::Arc;

use nubot_core::{NubotConfig, Result};
use nubot_index::open_index;
use nubot_pipeline::{PipelineResources, RagPipeline};
use nubot_tracking::{MlflowTracker, NoopTracker, RunTracker};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command};

/// The NuBot CLI application.
pub struct NubotApp {
    config: NubotConfig,
    version: String,
}

impl NubotApp {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = NubotConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// Create with an explicit configuration.
    pub fn new(config: NubotConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &NubotConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(Command::Version) => {
                println!("nubot {}", self.version);
                Ok(())
            }
            Some(Command::Serve { port }) => self.handle_serve(port).await,
            Some(Command::Ask { query }) => self.handle_ask(query).await,
            None => self.handle_ask(None).await,
        }
    }

    /// Answer one question and print the reply to stdout.
    async fn handle_ask(&self, query: Option<String>) -> Result<()> {
        let query = match query {
            Some(query) => query,
            None => read_query_from_stdin()?,
        };

        let pipeline = self.build_pipeline().await?;
        let answer = pipeline.answer(&query).await?;
        println!("{answer}");
        Ok(())
    }

    /// Run the HTTP query service until stopped.
    async fn handle_serve(&self, port: Option<u16>) -> Result<()> {
        let pipeline = Arc::new(self.build_pipeline().await?);
        let host = &self.config.server.host;
        let port = port.unwrap_or(self.config.server.port);
        nubot_api::serve(pipeline, host, port).await
    }

    /// Assemble the pipeline from configuration.
    ///
    /// Loading the serialized index is a startup precondition: a missing
    /// or corrupt index fails here, before any query is accepted.
    async fn build_pipeline(&self) -> Result<RagPipeline> {
        let resources = Arc::new(PipelineResources::new(self.config.clone()));

        let embedder = resources.embeddings().await?;
        let index_path = self.config.index_path()?;
        let index = open_index(&index_path, embedder, self.config.index.top_k)?;

        let tracker: Arc<dyn RunTracker> = match self.config.tracking.uri.as_deref() {
            Some(uri) if !uri.is_empty() => {
                let tracker =
                    MlflowTracker::connect(uri, &self.config.tracking.experiment).await?;
                info!(uri, experiment = %self.config.tracking.experiment, "run tracking enabled");
                Arc::new(tracker)
            }
            _ => {
                info!("no tracking server configured, runs will not be recorded");
                Arc::new(NoopTracker::new())
            }
        };

        Ok(RagPipeline::new(Arc::new(index), tracker, resources))
    }
}

/// Read one line of free-text query from standard input.
fn read_query_from_stdin() -> Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// ============================================================================
// Tests
// ============================================================================
