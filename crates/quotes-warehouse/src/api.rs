use crate::error::{FetchError, LoadError};
use crate::schema::stock::prices::QuoteRow;
use async_trait::async_trait;

pub use reqwest::Client as HttpClient;
pub use tokio_postgres::Client as PgClient;

/// Extract-load framework.
///
/// The pipeline is split into two seams, so that the orchestration never depends on a particular
/// quote vendor or storage engine;
///
/// 1. [`Fetch`] - how a symbol's daily prices are **extracted** and reshaped into rows.
/// 2. [`Warehouse`] - how those rows are **loaded** into durable storage.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch every daily row the upstream currently serves for `symbol`.
    async fn fetch(&self, symbol: &str) -> Result<Vec<QuoteRow>, FetchError>;
}

/// Storage that accepts quote rows with upsert-or-ignore semantics on `(date, symbol)`.
#[async_trait]
pub trait Warehouse: Send {
    /// Create the target table if it is missing. Safe to call on every run.
    async fn ensure_schema(&mut self) -> Result<(), LoadError>;

    /// Insert `rows` as one unit, skipping rows whose `(date, symbol)` already exists.
    ///
    /// Returns the number of rows actually inserted. On error nothing from `rows` is kept.
    async fn upsert(&mut self, rows: &[QuoteRow]) -> Result<usize, LoadError>;

    /// Release the underlying connection.
    async fn close(self);
}
