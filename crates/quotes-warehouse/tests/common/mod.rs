#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use quotes_warehouse::error::{FetchError, LoadError};
use quotes_warehouse::pg::check_row;
use quotes_warehouse::{Fetch, QuoteRow, Warehouse};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

pub fn row(symbol: &str, day: u32) -> QuoteRow {
    QuoteRow {
        date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        symbol: symbol.to_string(),
        open: Decimal::new(10_000 + day as i64, 2),
        high: Decimal::new(10_500 + day as i64, 2),
        low: Decimal::new(9_500 + day as i64, 2),
        close: Decimal::new(10_200 + day as i64, 2),
        volume: 1_000 * day as i64,
    }
}

pub fn rows(symbol: &str, days: std::ops::RangeInclusive<u32>) -> Vec<QuoteRow> {
    days.map(|day| row(symbol, day)).collect()
}

// -------------------------------------------------------------------------------------------------

/// Serves canned rows per symbol; symbols without a script fail with a real transport error.
#[derive(Default)]
pub struct ScriptedFetch {
    scripts: HashMap<String, Vec<QuoteRow>>,
    quota_exceeded: Vec<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFetch {
    pub fn serve(mut self, symbol: &str, rows: Vec<QuoteRow>) -> Self {
        self.scripts.insert(symbol.to_string(), rows);
        self
    }

    pub fn quota_exceeded(mut self, symbol: &str) -> Self {
        self.quota_exceeded.push(symbol.to_string());
        self
    }

    /// Handle on the symbols requested so far, usable after the fetcher is moved.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    async fn fetch(&self, symbol: &str) -> Result<Vec<QuoteRow>, FetchError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        if self.quota_exceeded.iter().any(|s| s == symbol) {
            return Err(FetchError::ApiError(
                "Our standard API rate limit is 25 requests per day.".to_string(),
            ));
        }
        match self.scripts.get(symbol) {
            Some(rows) => Ok(rows.clone()),
            None => {
                let err = reqwest::Client::new()
                    .get("http://127.0.0.1:1/query")
                    .send()
                    .await
                    .unwrap_err();
                Err(FetchError::from(err))
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[derive(Default, Debug)]
pub struct Tables {
    pub schema_created: bool,
    pub ensure_schema_calls: usize,
    pub upsert_calls: usize,
    pub closed: usize,
    pub rows: BTreeMap<(NaiveDate, String), QuoteRow>,
}

impl Tables {
    pub fn count(&self, symbol: &str) -> usize {
        self.rows.keys().filter(|(_, s)| s == symbol).count()
    }
}

/// In-memory stand-in for `raw_stock_data` with the same upsert-or-ignore and rollback rules.
#[derive(Clone, Default)]
pub struct MemoryWarehouse {
    pub tables: Arc<Mutex<Tables>>,
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn ensure_schema(&mut self) -> Result<(), LoadError> {
        let mut tables = self.tables.lock().unwrap();
        tables.ensure_schema_calls += 1;
        tables.schema_created = true;
        Ok(())
    }

    async fn upsert(&mut self, rows: &[QuoteRow]) -> Result<usize, LoadError> {
        let mut tables = self.tables.lock().unwrap();
        tables.upsert_calls += 1;
        assert!(tables.schema_created, "upsert before ensure_schema");

        // stage, then commit all at once
        let mut staged = tables.rows.clone();
        let mut inserted = 0;
        for row in rows {
            check_row(row)?;
            let key = (row.date, row.symbol.clone());
            if !staged.contains_key(&key) {
                staged.insert(key, row.clone());
                inserted += 1;
            }
        }
        tables.rows = staged;
        Ok(inserted)
    }

    async fn close(self) {
        self.tables.lock().unwrap().closed += 1;
    }
}
