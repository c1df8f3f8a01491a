use crate::api::{Fetch, HttpClient};
use crate::config::Config;
use crate::error::FetchError;
use crate::schema::common::{convert_date_type, strip_label_prefix};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tracing::{debug, error, trace};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Daily prices from Alpha Vantage, per symbol
//
// API Documentation: https://www.alphavantage.co/documentation/#daily
//
////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct AlphaVantage {
    http_client: HttpClient,
    url: String,
    api_key: String,
}

impl AlphaVantage {
    pub fn new(http_client: HttpClient, config: &Config) -> Self {
        Self {
            http_client,
            url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl Fetch for AlphaVantage {
    /// One compact `TIME_SERIES_DAILY` request; no retries, no pagination.
    async fn fetch(&self, symbol: &str) -> Result<Vec<QuoteRow>, FetchError> {
        debug!("fetching daily prices for [{symbol}]");
        let response = self
            .http_client
            .get(&self.url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "compact"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("[{symbol}] price request failed: {e}");
                FetchError::Transport(e)
            })?
            .error_for_status()
            .map_err(|e| {
                let e = e.without_url();
                error!("[{symbol}] price request rejected: {e}");
                FetchError::Transport(e)
            })?
            .bytes()
            .await?;

        // error check the deserialization
        trace!("deserializing price data for [{symbol}]");
        let de = serde_json::from_slice::<DailySeries>(&response).map_err(|e| {
            error!("[{symbol}] deserialization error: {e}");
            FetchError::Malformed(format!("undecodable response body: {e}"))
        })?;

        let rows = reshape(symbol, de)?;
        debug!("[{symbol}] {} rows fetched", rows.len());
        Ok(rows)
    }
}

/// Flatten the nested `date -> {label -> value}` series into one row per date, ordered by date.
pub fn reshape(symbol: &str, de: DailySeries) -> Result<Vec<QuoteRow>, FetchError> {
    let Some(series) = de.series else {
        let note = de.diagnostic();
        error!("[{symbol}] API error: {note}");
        return Err(FetchError::ApiError(note));
    };

    series
        .iter()
        .map(|(date, fields)| QuoteRow::from_fields(symbol, date, fields))
        .collect()
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Output
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

/// One symbol's price for one day. `(date, symbol)` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

impl QuoteRow {
    fn from_fields(
        symbol: &str,
        date: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<Self, FetchError> {
        let fields: HashMap<&str, &str> = fields
            .iter()
            .map(|(label, value)| (strip_label_prefix(label), value.trim()))
            .collect();

        let field = |name: &str| {
            fields.get(name).copied().ok_or_else(|| {
                FetchError::Malformed(format!("[{symbol}] {date} is missing \"{name}\""))
            })
        };
        let price = |name: &str| -> Result<Decimal, FetchError> {
            let value = field(name)?;
            Decimal::from_str(value).map_err(|e| {
                FetchError::Malformed(format!("[{symbol}] {date} {name} = {value:?}: {e}"))
            })
        };

        let volume = field("volume")?;
        let volume = volume
            .parse::<u64>()
            .ok()
            .and_then(|v| i64::try_from(v).ok())
            .ok_or_else(|| {
                FetchError::Malformed(format!("[{symbol}] {date} volume = {volume:?}"))
            })?;

        Ok(Self {
            date: convert_date_type(date)
                .map_err(|e| FetchError::Malformed(format!("[{symbol}] date {date:?}: {e}")))?,
            symbol: symbol.to_string(),
            open: price("open")?,
            high: price("high")?,
            low: price("low")?,
            close: price("close")?,
            volume,
        })
    }
}

/// The full batch of rows from one successful fetch of one symbol.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub symbol: String,
    pub rows: Vec<QuoteRow>,
}

///////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Input: Alpha Vantage
//
///////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, Debug)]
pub struct DailySeries {
    #[serde(rename = "Time Series (Daily)")]
    pub series: Option<BTreeMap<String, BTreeMap<String, String>>>,

    // quota notices and errors arrive in place of the series
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
}

impl DailySeries {
    fn diagnostic(&self) -> String {
        self.note
            .as_ref()
            .or(self.information.as_ref())
            .or(self.error_message.as_ref())
            .cloned()
            .unwrap_or_else(|| "time series key not found".to_string())
    }
}
