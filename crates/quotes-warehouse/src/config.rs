use crate::error::ConfigError;
use std::fmt;

pub const DB_HOST: &str = "localhost";
pub const DB_PORT: u16 = 5432;
pub const API_URL: &str = "https://www.alphavantage.co/query";
pub const SYMBOLS: [&str; 3] = ["AAPL", "MSFT", "GOOGL"];

/// Everything a run needs, read once at start-up and handed to the collaborators.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_host: String,
    pub db_port: u16,
    pub symbols: Vec<String>,
}

impl Config {
    /// Read the configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub(crate) fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| match lookup(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::Missing(name)),
        };

        let api_url = lookup("API_URL").unwrap_or_else(|| API_URL.to_string());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "API_URL",
                reason: format!("expected an http(s) URL, received: {api_url}"),
            });
        }

        Ok(Self {
            api_key: required("API_KEY")?,
            api_url,
            db_user: required("DB_USER")?,
            db_password: required("DB_PASSWORD")?,
            db_name: required("DB_NAME")?,
            db_host: DB_HOST.to_string(),
            db_port: DB_PORT,
            symbols: SYMBOLS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Connection parameters for [`tokio_postgres`].
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.db_host)
            .port(self.db_port)
            .dbname(&self.db_name)
            .user(&self.db_user)
            .password(&self.db_password);
        config
    }

    /// `dbname on host:port`, for log lines.
    pub fn db_target(&self) -> String {
        format!("{} on {}:{}", self.db_name, self.db_host, self.db_port)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"***")
            .field("api_url", &self.api_url)
            .field("db_user", &self.db_user)
            .field("db_password", &"***")
            .field("db_name", &self.db_name)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("symbols", &self.symbols)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const COMPLETE: [(&str, &str); 4] = [
        ("API_KEY", "demo"),
        ("DB_USER", "etl"),
        ("DB_PASSWORD", "hunter2"),
        ("DB_NAME", "markets"),
    ];

    #[test]
    fn reads_required_variables_and_fixed_constants() {
        let config = Config::from_lookup(env(&COMPLETE)).unwrap();
        assert_eq!(config.api_key, "demo");
        assert_eq!(config.db_name, "markets");
        assert_eq!(config.db_host, "localhost");
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.api_url, API_URL);
        assert_eq!(config.symbols, vec!["AAPL", "MSFT", "GOOGL"]);
        assert_eq!(config.db_target(), "markets on localhost:5432");
    }

    #[test]
    fn missing_variable_is_named() {
        let err = Config::from_lookup(env(&COMPLETE[..3])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DB_NAME")));

        let mut blank = COMPLETE.to_vec();
        blank[0] = ("API_KEY", "  ");
        let err = Config::from_lookup(env(&blank)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("API_KEY")));
    }

    #[test]
    fn api_url_can_be_overridden() {
        let mut pairs = COMPLETE.to_vec();
        pairs.push(("API_URL", "http://127.0.0.1:8080/query"));
        let config = Config::from_lookup(env(&pairs)).unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:8080/query");

        pairs.pop();
        pairs.push(("API_URL", "ftp://example.com"));
        let err = Config::from_lookup(env(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "API_URL", .. }));
    }

    #[test]
    fn secrets_are_redacted_from_debug() {
        let config = Config::from_lookup(env(&COMPLETE)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("demo"));
        assert!(debug.contains("markets"));
    }
}
