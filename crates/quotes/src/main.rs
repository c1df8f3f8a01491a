use anyhow::Result;
use clap::Parser;
use cli::Cli;
use dotenv::dotenv;
use quotes_warehouse::error::ConfigError;
use quotes_warehouse::{AlphaVantage, Config, Outcome, PgWarehouse, Pipeline};
use tracing::{debug, error, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;

fn preprocess(trace_level: Level) -> Result<()> {
    dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    preprocess(cli.trace.into())?;
    trace!("Command line input recorded: {cli:#?}");

    run(Config::from_env()).await
}

/// Every run ends normally; aborts and configuration errors are only logged.
async fn run(config: Result<Config, ConfigError>) -> Result<()> {
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error, nothing to run: {e}");
            return Ok(());
        }
    };
    debug!("Configuration loaded: {config:?}");

    let http_client = reqwest::ClientBuilder::new().build()?;
    let fetcher = AlphaVantage::new(http_client, &config);
    let pipeline = Pipeline::new(fetcher, config.symbols.clone());

    match pipeline.run(PgWarehouse::connect(&config)).await {
        Outcome::Completed { loaded, failed } => {
            debug!("run completed: {loaded} datasets loaded, {failed} failed")
        }
        Outcome::Aborted(reason) => debug!("run aborted: {reason:?}"),
    }

    Ok(())
}
