//! Command-line options shared by the binaries.

use clap::Args;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{FrontendConfig, TransportKind};
use crate::error::ConfigError;

/// Flags override the matching entries of the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct FrontendArgs {
    /// TOML configuration file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// How queries reach the backend
    #[arg(long, value_enum)]
    pub transport: Option<TransportKind>,

    /// Backend URL, or the worker script for the worker transport
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Interpreter command line for the worker transport
    #[arg(long, value_delimiter = ' ', allow_hyphen_values = true)]
    pub worker_command: Option<Vec<String>>,

    /// Activity display cutoff in μCi
    #[arg(long)]
    pub cutoff: Option<String>,

    /// Decay level in μCi
    #[arg(long)]
    pub decay: Option<String>,

    /// Isotope abundance table: IAEA or IUPAC
    #[arg(long)]
    pub abundance: Option<String>,
}

impl FrontendArgs {
    pub fn load_config(&self) -> Result<FrontendConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => FrontendConfig::load(path)?,
            None => FrontendConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut FrontendConfig) {
        if let Some(kind) = self.transport {
            config.transport.kind = kind;
        }
        if let Some(endpoint) = &self.endpoint {
            config.transport.endpoint = Some(endpoint.clone());
        }
        if let Some(command) = &self.worker_command {
            config.transport.worker_command = command.clone();
        }
        if let Some(cutoff) = &self.cutoff {
            config.session.cutoff = Some(cutoff.clone());
        }
        if let Some(decay) = &self.decay {
            config.session.decay = Some(decay.clone());
        }
        if let Some(abundance) = &self.abundance {
            config.session.abundance = Some(abundance.clone());
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
