use crate::api::{PgClient, Warehouse};
use crate::config::Config;
use crate::error::{ConnectionError, LoadError};
use crate::schema::stock::prices::QuoteRow;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::NoTls;
use tokio_stream::{self as stream, StreamExt};
use tracing::{debug, error, info, trace};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// PostgreSQL: raw_stock_data
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Width of the `symbol` column.
pub const SYMBOL_WIDTH: usize = 10;

pub static SCHEMA_QUERY: &str = "
    CREATE TABLE IF NOT EXISTS raw_stock_data (
        id SERIAL PRIMARY KEY,
        date DATE,
        symbol VARCHAR(10),
        open NUMERIC,
        high NUMERIC,
        low NUMERIC,
        close NUMERIC,
        volume BIGINT,
        UNIQUE (date, symbol)
    )
";

pub static INSERT_QUERY: &str = "
    INSERT INTO raw_stock_data (date, symbol, open, high, low, close, volume)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (date, symbol) DO NOTHING
";

/// Reject rows the table cannot hold, before they reach the server.
pub fn check_row(row: &QuoteRow) -> Result<(), LoadError> {
    let reason = if row.symbol.is_empty() {
        "empty symbol".to_string()
    } else if row.symbol.chars().count() > SYMBOL_WIDTH {
        format!("symbol longer than {SYMBOL_WIDTH} characters")
    } else if row.volume < 0 {
        format!("negative volume {}", row.volume)
    } else {
        return Ok(());
    };

    Err(LoadError::Rejected {
        date: row.date,
        symbol: row.symbol.clone(),
        reason,
    })
}

/// A [`Warehouse`] over one `tokio_postgres` connection.
pub struct PgWarehouse {
    client: PgClient,
    driver: JoinHandle<()>,
}

impl PgWarehouse {
    /// Connect with the database fields of `config`.
    pub async fn connect(config: &Config) -> Result<Self, ConnectionError> {
        Self::open(config.pg_config(), config.db_target()).await
    }

    /// Connect with explicit connection parameters; `target` only names the database in logs.
    pub async fn open(
        pg_config: tokio_postgres::Config,
        target: String,
    ) -> Result<Self, ConnectionError> {
        debug!("establishing PostgreSQL connection to {target}");
        let (client, conn) = match pg_config.connect(NoTls).await {
            Ok(pair) => pair,
            Err(e) => {
                error!("failed to connect to {target}: {e}");
                return Err(ConnectionError { target, source: e });
            }
        };

        // handle connection
        let driver = tokio::spawn(async move {
            if let Err(e) = conn.await {
                error!("connection error: {}", e);
            }
        });
        info!("connected to {target}");

        Ok(Self { client, driver })
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn ensure_schema(&mut self) -> Result<(), LoadError> {
        self.client.batch_execute(SCHEMA_QUERY).await.map_err(|e| {
            error!("failed to create raw_stock_data: {e}");
            e
        })?;
        trace!("raw_stock_data is present");
        Ok(())
    }

    async fn upsert(&mut self, rows: &[QuoteRow]) -> Result<usize, LoadError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let time = std::time::Instant::now();

        // preprocess pg query as transaction
        let query = self.client.prepare(INSERT_QUERY).await?;
        let transaction = self.client.transaction().await?;

        // iterate over the rows; the first failure abandons the whole batch
        let mut inserted = 0;
        let mut stream = stream::iter(rows);
        while let Some(row) = stream.next().await {
            let result = match check_row(row) {
                Ok(()) => transaction
                    .execute(
                        &query,
                        &[
                            &row.date,
                            &row.symbol,
                            &row.open,
                            &row.high,
                            &row.low,
                            &row.close,
                            &row.volume,
                        ],
                    )
                    .await
                    .map_err(LoadError::from),
                Err(e) => Err(e),
            };

            match result {
                Ok(n) => inserted += n as usize,
                Err(e) => {
                    error!("[{}] {} insertion error: {e}", row.symbol, row.date);
                    if let Err(rb) = transaction.rollback().await {
                        error!("[{}] rollback failed: {rb}", row.symbol);
                    }
                    return Err(e);
                }
            }
        }

        // commit the transaction to the database
        transaction.commit().await.map_err(|e| {
            error!("failed to commit transaction for raw_stock_data");
            e
        })?;

        debug!(
            "[{}] {} of {} rows inserted. Elapsed time: {} ms",
            rows[0].symbol,
            inserted,
            rows.len(),
            time.elapsed().as_millis()
        );

        Ok(inserted)
    }

    async fn close(self) {
        drop(self.client);
        if let Err(e) = self.driver.await {
            error!("connection task failed: {e}");
        }
        debug!("PostgreSQL connection released");
    }
}
