use thiserror::Error;

/// Failures inside a transport. They never reach the caller of
/// `Transport::submit`; each one is turned into a failure response.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("worker I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker failed: {0}")]
    Worker(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum QueryError {
    #[error("form has no time_off field")]
    MissingTimeOff,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("worker transport needs a non-empty worker_command")]
    MissingWorkerCommand,
}

#[derive(Error, Debug, PartialEq)]
pub enum ControllerError {
    #[error("calculator is not ready yet")]
    NotReady,
}
