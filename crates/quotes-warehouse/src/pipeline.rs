use crate::api::{Fetch, Warehouse};
use crate::error::{ConnectionError, LoadError};
use crate::schema::stock::prices::Dataset;
use std::future::Future;
use tracing::{debug, error, info, trace};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every fetched dataset was attempted; `failed` of them were rolled back.
    Completed { loaded: usize, failed: usize },
    Aborted(Abort),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abort {
    /// No database connection; nothing was fetched.
    Connection,
    /// Every symbol failed to fetch; nothing was loaded.
    NoData,
}

/// Sequential extract-load over a fixed list of symbols.
///
/// A symbol that fails to fetch, or a dataset that fails to load, is logged and skipped; only a
/// missing connection or an empty fetch stage stop the run early.
pub struct Pipeline<F> {
    fetcher: F,
    symbols: Vec<String>,
}

impl<F: Fetch> Pipeline<F> {
    pub fn new(fetcher: F, symbols: Vec<String>) -> Self {
        Self { fetcher, symbols }
    }

    /// Run the whole pipeline. `connect` is awaited first; the warehouse it yields is closed
    /// exactly once before returning, whatever happened in between.
    pub async fn run<W, C>(&self, connect: C) -> Outcome
    where
        W: Warehouse,
        C: Future<Output = Result<W, ConnectionError>>,
    {
        info!("--- extract-load pipeline started ---");

        let mut warehouse = match connect.await {
            Ok(warehouse) => warehouse,
            Err(e) => {
                error!("database connection failed, aborting: {e}");
                return Outcome::Aborted(Abort::Connection);
            }
        };

        let datasets = self.extract().await;
        if datasets.is_empty() {
            error!("no data was fetched, aborting");
            warehouse.close().await;
            return Outcome::Aborted(Abort::NoData);
        }

        let mut loaded = 0;
        let mut failed = 0;
        for dataset in &datasets {
            match load(&mut warehouse, dataset).await {
                Ok(_) => loaded += 1,
                Err(e) => {
                    error!("[{}] load failed, batch rolled back: {e}", dataset.symbol);
                    failed += 1;
                }
            }
        }

        warehouse.close().await;
        info!("--- pipeline finished: {loaded} loaded, {failed} failed ---");
        Outcome::Completed { loaded, failed }
    }

    /// Fetch every symbol in order, keeping the successes.
    async fn extract(&self) -> Vec<Dataset> {
        info!("fetching daily prices for {:?}", self.symbols);
        let mut datasets = Vec::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            match self.fetcher.fetch(symbol).await {
                Ok(rows) => {
                    info!("[{symbol}] {} rows fetched", rows.len());
                    datasets.push(Dataset {
                        symbol: symbol.clone(),
                        rows,
                    });
                }
                Err(e) => {
                    error!("[{symbol}] fetch failed, skipping: {e}");
                    continue;
                }
            }
        }
        debug!("{} of {} symbols fetched", datasets.len(), self.symbols.len());
        datasets
    }
}

/// Make sure the table exists, then upsert one dataset as a single unit.
async fn load<W: Warehouse>(warehouse: &mut W, dataset: &Dataset) -> Result<usize, LoadError> {
    trace!("[{}] ensuring schema", dataset.symbol);
    warehouse.ensure_schema().await?;

    info!("[{}] loading {} rows", dataset.symbol, dataset.rows.len());
    let inserted = warehouse.upsert(&dataset.rows).await?;
    info!(
        "[{}] load finished: {inserted} inserted, {} skipped",
        dataset.symbol,
        dataset.rows.len().saturating_sub(inserted)
    );
    Ok(inserted)
}
