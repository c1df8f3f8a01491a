use clap::{Parser, ValueEnum};
use tracing::Level;

/// Fetch daily prices for the configured symbols and upsert them into PostgreSQL.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Sets the level of tracing
    #[arg(long, default_value = "INFO", ignore_case = true)]
    pub trace: TraceLevel,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum TraceLevel {
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<TraceLevel> for Level {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::WARN => Level::WARN,
            TraceLevel::ERROR => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_defaults_to_info() {
        let cli = Cli::try_parse_from(["quotes"]).unwrap();
        assert_eq!(cli.trace, TraceLevel::INFO);
    }

    #[test]
    fn trace_level_is_parsed() {
        let cli = Cli::try_parse_from(["quotes", "--trace", "DEBUG"]).unwrap();
        assert_eq!(Level::from(cli.trace), Level::DEBUG);
        assert!(Cli::try_parse_from(["quotes", "--trace", "LOUD"]).is_err());
    }
}
