//! CLI configuration file and logging setup.

use std::path::Path;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use period_engine::{PeriodError, ResolveOptions, TableOptions, TimeFrame};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub resolve: ResolveConfig,
    pub table: TableConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveConfig {
    pub default_range: String,
    pub timezone: String,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    pub hidden_channels: Vec<String>,
    pub highlight_share: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.resolve_options()?;
        Ok(config)
    }

    pub fn resolve_options(&self) -> Result<ResolveOptions, PeriodError> {
        let default_frame = self
            .resolve
            .default_range
            .parse::<TimeFrame>()
            .map_err(|e| PeriodError::Config(format!("resolve.default_range: {e}")))?;
        let timezone = self
            .resolve
            .timezone
            .parse::<Tz>()
            .map_err(|_| {
                PeriodError::Config(format!(
                    "resolve.timezone: {}",
                    PeriodError::InvalidTimezone(format!("'{}'", self.resolve.timezone))
                ))
            })?;
        Ok(ResolveOptions {
            default_frame,
            timezone,
        })
    }

    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            hidden_channels: self.table.hidden_channels.clone(),
            highlight_share: self.table.highlight_share,
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            default_range: TimeFrame::default().as_token().to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        let defaults = TableOptions::default();
        Self {
            hidden_channels: defaults.hidden_channels,
            highlight_share: defaults.highlight_share,
        }
    }
}

impl LoggingConfig {
    /// Install the global subscriber, writing to stderr. `RUST_LOG` wins over
    /// the configured level.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
            _ => {
                fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "pretty".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve_to_last_12_months_utc() {
        let options = Config::default().resolve_options().unwrap();
        assert_eq!(options, ResolveOptions::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [resolve]
            default_range = "last-30-days"
            "#,
        )
        .unwrap();
        let options = config.resolve_options().unwrap();
        assert_eq!(options.default_frame, TimeFrame::Last30Days);
        assert_eq!(options.timezone, chrono_tz::UTC);
        assert_eq!(config.table_options(), TableOptions::default());
    }

    #[test]
    fn test_table_section() {
        let config: Config = toml::from_str(
            r#"
            [table]
            hidden_channels = ["Internal"]
            highlight_share = 50
            "#,
        )
        .unwrap();
        let table = config.table_options();
        assert_eq!(table.hidden_channels, vec!["Internal".to_string()]);
        assert_eq!(table.highlight_share, Decimal::from(50));
    }

    #[test]
    fn test_invalid_timezone_is_config_error() {
        let config: Config = toml::from_str(
            r#"
            [resolve]
            timezone = "Mars/Olympus"
            "#,
        )
        .unwrap();
        let err = config.resolve_options().unwrap_err();
        assert!(matches!(err, PeriodError::Config(_)));
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn test_invalid_default_range_is_config_error() {
        let config: Config = toml::from_str(
            r#"
            [resolve]
            default_range = "forever"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.resolve_options(),
            Err(PeriodError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let parsed: Result<Config, _> = toml::from_str("[resolve]\nrange = \"x\"\n");
        assert!(parsed.is_err());
    }
}
