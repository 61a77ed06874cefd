//! Typed screener configuration.
//!
//! Built from any [`ConfigPort`] after [`validate_config`] has passed, with
//! defaults for every optional key. Secrets may be written as `env:NAME` and
//! are resolved at load time.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::domain::config_validation::{read_indicator_weights, read_ranking_weights, validate_config};
use crate::domain::error::ScreenerError;
use crate::domain::momentum::MomentumSettings;
use crate::domain::portfolio::{PortfolioSettings, DEFAULT_NEGATIVE_WEIGHT};
use crate::domain::rank_filter::Side;
use crate::domain::ranking::RankingWeights;
use crate::domain::trend::{TrendSettings, TrendThresholds};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_STOCK_LIMIT: usize = 5000;
pub const DEFAULT_INDEXES: [&str; 4] = ["DJIA", "QQQ", "SPY", "IWM"];
const ENV_PREFIX: &str = "env:";
/// Longest accepted history window, 50 years.
pub const MAX_PERIOD_DAYS: u32 = 50 * 365;

pub fn side_section(side: Side) -> String {
    format!("stock_filters.{}", side.key())
}

pub fn trend_section(side: Side) -> String {
    format!("{}.trend_detection", side_section(side))
}

pub fn weights_section(side: Side) -> String {
    format!("{}.indicator_weights", trend_section(side))
}

pub fn thresholds_section(side: Side) -> String {
    format!("{}.thresholds", trend_section(side))
}

/// Converts a history window such as `6mo`, `1y` or `90d` to calendar days.
pub fn parse_period(raw: &str) -> Result<u32, String> {
    let raw = raw.trim().to_lowercase();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("period '{raw}' has no unit (use d, mo or y)"))?;
    let (number, unit) = raw.split_at(split);
    let count: u32 = number
        .parse()
        .map_err(|_| format!("period '{raw}' must start with a number"))?;
    let days_per_unit = match unit {
        "d" => 1,
        "mo" => 30,
        "y" => 365,
        other => return Err(format!("unknown period unit '{other}' (use d, mo or y)")),
    };
    if count == 0 {
        return Err(format!("period '{raw}' must be positive"));
    }
    count
        .checked_mul(days_per_unit)
        .filter(|days| *days <= MAX_PERIOD_DAYS)
        .ok_or_else(|| format!("period '{raw}' exceeds {MAX_PERIOD_DAYS} days"))
}

/// A credential value. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    /// Resolves `env:NAME` through `lookup`; any other value is taken literally.
    pub fn resolve<F>(raw: &str, section: &str, key: &str, lookup: F) -> Result<Self, ScreenerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match raw.trim().strip_prefix(ENV_PREFIX) {
            Some(name) => lookup(name.trim()).map(Secret).ok_or_else(|| {
                ScreenerError::invalid(
                    section,
                    key,
                    format!("environment variable {} is not set", name.trim()),
                )
            }),
            None => Ok(Secret(raw.trim().to_string())),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SideFilter {
    pub side: Side,
    pub rank_condition: f64,
    pub trend: TrendSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailConfig {
    pub recipients: Vec<String>,
    pub sender: String,
    pub password: Secret,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub financial_modeling_prep_key: Secret,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
    pub stock_scores: PathBuf,
    pub investing_stocks: PathBuf,
    pub short_stocks: PathBuf,
    pub portfolio_file: PathBuf,
    pub price_data: PathBuf,
    pub fundamentals: PathBuf,
    pub outbox: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub stock_limit: usize,
    pub workers: usize,
    pub weights: RankingWeights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerConfig {
    pub email: EmailConfig,
    pub long: SideFilter,
    pub short: SideFilter,
    pub analysis: AnalysisConfig,
    pub api: ApiConfig,
    pub paths: PathsConfig,
    pub portfolio: PortfolioSettings,
    pub logging: LoggingConfig,
    pub market_indexes: Vec<String>,
    pub momentum: MomentumSettings,
}

impl ScreenerConfig {
    /// Validates and loads, reading `env:` secrets from the process environment.
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        Self::from_port_with_env(config, |name| std::env::var(name).ok())
    }

    pub fn from_port_with_env<F>(config: &dyn ConfigPort, lookup: F) -> Result<Self, ScreenerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        validate_config(config)?;

        let secret = |section: &str, key: &str| -> Result<Option<Secret>, ScreenerError> {
            config
                .get_string(section, key)
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| Secret::resolve(&raw, section, key, &lookup))
                .transpose()
        };
        let required_secret = |section: &str, key: &str| -> Result<Secret, ScreenerError> {
            secret(section, key)?.ok_or_else(|| ScreenerError::missing(section, key))
        };
        let string = |section: &str, key: &str| config.get_string(section, key).unwrap_or_default();

        let email = EmailConfig {
            recipients: config.get_list("email", "recipients"),
            sender: string("email", "sender"),
            password: required_secret("email", "password")?,
            smtp: SmtpConfig {
                server: string("email.smtp", "server"),
                port: u16::try_from(config.get_int("email.smtp", "port", 0))
                    .map_err(|_| ScreenerError::invalid("email.smtp", "port", "port out of range"))?,
            },
        };

        let api = ApiConfig {
            financial_modeling_prep_key: required_secret("api.financial_modeling_prep", "key")?,
        };

        let path = |key: &str, default: &str| {
            PathBuf::from(config.get_string("paths", key).unwrap_or_else(|| default.to_string()))
        };
        let paths = PathsConfig {
            stock_scores: path("stock_scores", ""),
            investing_stocks: path("investing_stocks", ""),
            short_stocks: path("short_stocks", ""),
            portfolio_file: path("portfolio_file", ""),
            price_data: path("price_data", "data/prices"),
            fundamentals: path("fundamentals", "data/fundamentals.csv"),
            outbox: path("outbox", "outbox"),
        };

        let default_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let analysis = AnalysisConfig {
            stock_limit: config.get_int("analysis", "stock_limit", DEFAULT_STOCK_LIMIT as i64) as usize,
            workers: config.get_int("analysis", "workers", default_workers as i64) as usize,
            weights: read_ranking_weights(config),
        };

        let portfolio = PortfolioSettings {
            exclude: config
                .get_list("portfolio", "exclude_stocks")
                .into_iter()
                .map(|t| t.to_uppercase())
                .collect::<BTreeSet<_>>(),
            negative_weight: config.get_double("portfolio", "negative_weight", DEFAULT_NEGATIVE_WEIGHT),
        };

        let logging = LoggingConfig {
            level: config
                .get_string("logging", "level")
                .unwrap_or_else(|| LoggingConfig::default().level),
            format: match config.get_string("logging", "format").as_deref().map(str::trim) {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let mut market_indexes = config.get_list("market", "indexes");
        if market_indexes.is_empty() {
            market_indexes = DEFAULT_INDEXES.iter().map(|s| s.to_string()).collect();
        }

        let m = MomentumSettings::default();
        let momentum = MomentumSettings {
            lookback_months: config.get_int("momentum", "lookback_months", i64::from(m.lookback_months)) as u32,
            history_months: config.get_int("momentum", "history_months", i64::from(m.history_months)) as u32,
            top_sectors: config.get_int("momentum", "top_sectors", m.top_sectors as i64) as usize,
            stocks_per_sector: config.get_int("momentum", "stocks_per_sector", m.stocks_per_sector as i64)
                as usize,
            risk_free_rate: config
                .get_string("momentum", "risk_free_rate")
                .and_then(|raw| raw.trim().parse::<f64>().ok()),
        };

        Ok(ScreenerConfig {
            email,
            long: read_side(config, Side::Long)?,
            short: read_side(config, Side::Short)?,
            analysis,
            api,
            paths,
            portfolio,
            logging,
            market_indexes,
            momentum,
        })
    }

    pub fn side(&self, side: Side) -> &SideFilter {
        match side {
            Side::Long => &self.long,
            Side::Short => &self.short,
        }
    }
}

fn read_side(config: &dyn ConfigPort, side: Side) -> Result<SideFilter, ScreenerError> {
    let trend = trend_section(side);
    let thresholds = thresholds_section(side);
    let defaults = TrendSettings::default();
    let d = TrendThresholds::default();

    let history_days = match config.get_string(&thresholds, "price_data_period") {
        Some(raw) => parse_period(&raw)
            .map_err(|reason| ScreenerError::invalid(&thresholds, "price_data_period", reason))?,
        None => d.history_days,
    };

    Ok(SideFilter {
        side,
        rank_condition: config.get_double(&side_section(side), "rank_condition", 0.0),
        trend: TrendSettings {
            lookback_period: config.get_int(&trend, "lookback_period", defaults.lookback_period as i64)
                as usize,
            min_score: config.get_double(&trend, "min_score", defaults.min_score),
            weights: read_indicator_weights(config, side),
            thresholds: TrendThresholds {
                volume_ratio: config.get_double(&thresholds, "volume_ratio", d.volume_ratio),
                rsi_lower: config.get_double(&thresholds, "rsi_lower", d.rsi_lower),
                rsi_upper: config.get_double(&thresholds, "rsi_upper", d.rsi_upper),
                history_days,
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use std::collections::HashMap;

    const CONFIG: &str = r#"
[email]
recipients = a@example.com
sender = screener@example.com
password = env:SMTP_PASSWORD

[email.smtp]
server = smtp.example.com
port = 587

[stock_filters.long]
rank_condition = 750

[stock_filters.long.trend_detection]
lookback_period = 3
min_score = 0.7

[stock_filters.long.trend_detection.thresholds]
price_data_period = 1y
rsi_upper = 75

[stock_filters.short]
rank_condition = 4000

[api.financial_modeling_prep]
key = literal-key

[paths]
stock_scores = out/scores.csv
investing_stocks = out/long.csv
short_stocks = out/short.csv
portfolio_file = in/portfolio.csv

[portfolio]
exclude_stocks = spy, QQQ

[logging]
format = json
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn load(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<ScreenerConfig, ScreenerError> {
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        ScreenerConfig::from_port_with_env(&adapter, lookup)
    }

    #[test]
    fn parse_period_units() {
        assert_eq!(parse_period("6mo"), Ok(180));
        assert_eq!(parse_period("1y"), Ok(365));
        assert_eq!(parse_period(" 90d "), Ok(90));
        assert!(parse_period("6").is_err());
        assert!(parse_period("6w").is_err());
        assert!(parse_period("mo").is_err());
        assert!(parse_period("0d").is_err());
    }

    #[test]
    fn parse_period_rejects_oversized_windows() {
        assert_eq!(parse_period("50y"), Ok(MAX_PERIOD_DAYS));
        assert!(parse_period("51y").is_err());
        assert!(parse_period("99999999y").is_err());
        // does not fit in u32
        assert!(parse_period("99999999999d").is_err());
    }

    #[test]
    fn section_names_follow_nesting() {
        assert_eq!(side_section(Side::Long), "stock_filters.long");
        assert_eq!(
            weights_section(Side::Short),
            "stock_filters.short.trend_detection.indicator_weights"
        );
        assert_eq!(
            thresholds_section(Side::Long),
            "stock_filters.long.trend_detection.thresholds"
        );
    }

    #[test]
    fn secret_resolves_env_reference() {
        let secret = Secret::resolve("env:TOKEN", "api", "key", env(&[("TOKEN", "s3cret")])).unwrap();
        assert_eq!(secret.expose(), "s3cret");
    }

    #[test]
    fn secret_missing_env_is_invalid() {
        let err = Secret::resolve("env:TOKEN", "api", "key", env(&[])).unwrap_err();
        assert!(matches!(err, ScreenerError::ConfigInvalid { key, .. } if key == "key"));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(****)");
    }

    #[test]
    fn loads_typed_config_with_defaults() {
        let config = load(CONFIG, env(&[("SMTP_PASSWORD", "pw")])).unwrap();

        assert_eq!(config.email.recipients, vec!["a@example.com"]);
        assert_eq!(config.email.password.expose(), "pw");
        assert_eq!(config.email.smtp.port, 587);
        assert_eq!(config.api.financial_modeling_prep_key.expose(), "literal-key");

        assert_eq!(config.long.rank_condition, 750.0);
        assert_eq!(config.long.trend.lookback_period, 3);
        assert_eq!(config.long.trend.min_score, 0.7);
        assert_eq!(config.long.trend.thresholds.history_days, 365);
        assert_eq!(config.long.trend.thresholds.rsi_upper, 75.0);
        assert_eq!(config.long.trend.thresholds.rsi_lower, 40.0);
        assert_eq!(config.short.trend, TrendSettings::default());
        assert_eq!(config.side(Side::Short).rank_condition, 4000.0);

        assert!(config.portfolio.is_excluded("SPY"));
        assert!(config.portfolio.is_excluded("QQQ"));
        assert_eq!(config.portfolio.negative_weight, 10.0);

        assert_eq!(config.analysis.stock_limit, DEFAULT_STOCK_LIMIT);
        assert!(config.analysis.workers >= 1);
        assert_eq!(config.paths.price_data, PathBuf::from("data/prices"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.market_indexes, vec!["DJIA", "QQQ", "SPY", "IWM"]);
        assert_eq!(config.momentum, MomentumSettings::default());
    }

    #[test]
    fn momentum_section_overrides_defaults() {
        let content = format!("{CONFIG}\n[momentum]\nrisk_free_rate = 4.25\ntop_sectors = 3\nlookback_months = 6\n");
        let config = load(&content, env(&[("SMTP_PASSWORD", "pw")])).unwrap();
        assert_eq!(config.momentum.risk_free_rate, Some(4.25));
        assert_eq!(config.momentum.top_sectors, 3);
        assert_eq!(config.momentum.lookback_months, 6);
        assert_eq!(config.momentum.stocks_per_sector, 10);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = load(CONFIG, env(&[("SMTP_PASSWORD", "pw-value")])).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("pw-value"));
        assert!(!rendered.contains("literal-key"));
    }

    #[test]
    fn unset_password_env_fails_load() {
        let err = load(CONFIG, env(&[])).unwrap_err();
        assert!(matches!(err, ScreenerError::ConfigInvalid { section, .. } if section == "email"));
    }

    #[test]
    fn invalid_config_fails_before_typing() {
        let err = load(&CONFIG.replace("rank_condition = 750", "rank_condition = 9000"), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ScreenerError::ConfigInvalid { key, .. } if key == "rank_condition"));
    }
}
