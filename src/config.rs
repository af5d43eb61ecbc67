//! Session settings derived from the launch parameters, and the front-end
//! configuration file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// Default display cutoff and decay level, in μCi.
pub const DEFAULT_CUTOFF: f64 = 0.0005;

/// 1 μCi in Bq.
pub const BQ_PER_MICROCURIE: f64 = 37000.0;

/// Isotope abundance table used by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Abundance {
    #[default]
    #[serde(rename = "IAEA")]
    Iaea,
    #[serde(rename = "IUPAC")]
    Iupac,
}

impl Abundance {
    /// `NIST` is the old name for the IUPAC table and is still accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "IAEA" => Some(Abundance::Iaea),
            "IUPAC" | "NIST" => Some(Abundance::Iupac),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Abundance::Iaea => "IAEA",
            Abundance::Iupac => "IUPAC",
        }
    }
}

impl fmt::Display for Abundance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw launch parameters. The literal `null` means "not given".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LaunchParams {
    pub cutoff: Option<String>,
    pub decay: Option<String>,
    pub abundance: Option<String>,
}

/// Settings fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub cutoff: f64,
    pub decay_level: f64,
    pub abundance: Abundance,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            decay_level: DEFAULT_CUTOFF,
            abundance: Abundance::Iaea,
        }
    }
}

fn given(raw: Option<&str>) -> Option<&str> {
    raw.filter(|v| *v != "null")
}

/// Blank text counts as zero; negative and non-finite levels are rejected.
fn parse_level(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

impl SessionConfig {
    /// Parse the launch parameters, falling back to defaults. Every rejected
    /// value produces a warning message for the results area.
    pub fn from_launch(params: &LaunchParams) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();

        let cutoff = match given(params.cutoff.as_deref()) {
            None => DEFAULT_CUTOFF,
            Some(raw) => parse_level(raw).unwrap_or_else(|| {
                warnings.push(format!(
                    "cutoff={raw} should be floating point μCi; default is {DEFAULT_CUTOFF}."
                ));
                DEFAULT_CUTOFF
            }),
        };

        let decay_default = if cutoff > 0.0 { cutoff } else { DEFAULT_CUTOFF };
        let decay_level = match given(params.decay.as_deref()) {
            None => decay_default,
            Some(raw) => match parse_level(raw) {
                Some(level) if level > 0.0 => level,
                Some(_) => decay_default,
                None => {
                    warnings.push(format!(
                        "decay={raw} should be floating point μCi; default is cutoff."
                    ));
                    decay_default
                }
            },
        };

        let abundance = match given(params.abundance.as_deref()) {
            None => Abundance::Iaea,
            Some(raw) => Abundance::parse(raw).unwrap_or_else(|| {
                warnings.push(format!(
                    "abundance={raw} should be IUPAC or IAEA; default is IAEA"
                ));
                Abundance::Iaea
            }),
        };

        (
            Self {
                cutoff,
                decay_level,
                abundance,
            },
            warnings,
        )
    }

    pub fn cutoff_bq(&self) -> f64 {
        self.cutoff * BQ_PER_MICROCURIE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    #[default]
    HttpJson,
    HttpForm,
    Worker,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::HttpJson => "http-json",
            TransportKind::HttpForm => "http-form",
            TransportKind::Worker => "worker",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            TransportKind::HttpJson => "http://localhost:8008/api/calculate",
            TransportKind::HttpForm => "http://localhost:8008/cgi-bin/nact.py",
            TransportKind::Worker => "scripts/nact_worker.py",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    pub endpoint: Option<String>,
    /// Interpreter command line for the worker transport. The endpoint, when
    /// set, is appended as the script argument.
    pub worker_command: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            endpoint: None,
            worker_command: vec!["python3".to_string(), "-u".to_string()],
        }
    }
}

impl TransportConfig {
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.kind.default_endpoint().to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub transport: TransportConfig,
    pub session: LaunchParams,
    pub server: ServerConfig,
}

impl FrontendConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.kind == TransportKind::Worker && self.transport.worker_command.is_empty()
        {
            return Err(ConfigError::MissingWorkerCommand);
        }
        Ok(())
    }
}
