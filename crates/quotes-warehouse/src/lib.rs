pub mod api;
pub mod config;
pub mod error;
pub mod pg;
pub mod pipeline;
pub mod schema;

pub use crate::api::{Fetch, Warehouse};
pub use crate::config::Config;
pub use crate::pg::PgWarehouse;
pub use crate::pipeline::{Abort, Outcome, Pipeline};
pub use crate::schema::stock::prices::{AlphaVantage, Dataset, QuoteRow};
