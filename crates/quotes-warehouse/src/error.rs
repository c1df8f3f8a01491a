use chrono::NaiveDate;
use thiserror::Error;

/// Failure to assemble the run [`Config`](crate::Config) from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// The database could not be reached; fatal for the whole run.
#[derive(Error, Debug)]
#[error("failed to connect to {target}: {source}")]
pub struct ConnectionError {
    pub target: String,
    #[source]
    pub source: tokio_postgres::Error,
}

/// Failure to extract one symbol's prices. Isolated to that symbol.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network failure or non-2xx status.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Well-formed payload without a time series, e.g. a quota notice.
    #[error("API error: {0}")]
    ApiError(String),

    /// Payload that could not be reshaped into rows.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // the request URL carries the API key
        FetchError::Transport(err.without_url())
    }
}

/// Failure to load one dataset. The dataset's transaction is rolled back.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("row [{symbol}] {date} rejected: {reason}")]
    Rejected {
        date: NaiveDate,
        symbol: String,
        reason: String,
    },
}
