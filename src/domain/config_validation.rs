//! Configuration validation.
//!
//! Validates required sections and value ranges before any command runs.
//! Indicator weights are checked here so a mis-weighted side never reaches
//! the trend scorer.

use crate::domain::config::{
    parse_period, side_section, thresholds_section, trend_section, weights_section,
};
use crate::domain::error::ScreenerError;
use crate::domain::momentum::MomentumSettings;
use crate::domain::rank_filter::Side;
use crate::domain::ranking::RankingWeights;
use crate::domain::trend::{IndicatorWeights, TrendSettings, TrendThresholds, WEIGHT_TOLERANCE};
use crate::ports::config_port::ConfigPort;

pub const REQUIRED_PATHS: [&str; 4] = ["stock_scores", "investing_stocks", "short_stocks", "portfolio_file"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_email(config)?;
    validate_rank_conditions(config)?;
    for side in Side::ALL {
        validate_trend_detection(config, side)?;
        validate_indicator_weights(config, side)?;
        validate_thresholds(config, side)?;
    }
    validate_api(config)?;
    validate_paths(config)?;
    validate_analysis(config)?;
    validate_portfolio(config)?;
    validate_momentum(config)?;
    Ok(())
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, ScreenerError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ScreenerError::missing(section, key)),
    }
}

/// Reads a float that, when present, must parse and be finite.
fn number(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, ScreenerError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ScreenerError::invalid(
            section,
            key,
            format!("'{raw}' is not a finite number"),
        )),
    }
}

fn integer(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<i64, ScreenerError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ScreenerError::invalid(section, key, format!("'{raw}' is not an integer")))
}

fn require_section(config: &dyn ConfigPort, section: &str) -> Result<(), ScreenerError> {
    if config.has_section(section) {
        Ok(())
    } else {
        Err(ScreenerError::missing(section, "*"))
    }
}

fn validate_email(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if config.get_list("email", "recipients").is_empty() {
        return Err(ScreenerError::missing("email", "recipients"));
    }
    require(config, "email", "sender")?;
    require(config, "email", "password")?;
    require(config, "email.smtp", "server")?;

    require(config, "email.smtp", "port")?;
    let port = integer(config, "email.smtp", "port", 0)?;
    if !(1..=65535).contains(&port) {
        return Err(ScreenerError::invalid(
            "email.smtp",
            "port",
            "port must be between 1 and 65535",
        ));
    }
    Ok(())
}

fn validate_rank_conditions(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let mut thresholds = [0.0; 2];
    for (slot, side) in thresholds.iter_mut().zip(Side::ALL) {
        let section = side_section(side);
        require(config, &section, "rank_condition")?;
        let value = number(config, &section, "rank_condition", 0.0)?;
        if value <= 0.0 {
            return Err(ScreenerError::invalid(
                &section,
                "rank_condition",
                "rank_condition must be a positive number",
            ));
        }
        *slot = value;
    }

    let [long, short] = thresholds;
    if long >= short {
        return Err(ScreenerError::invalid(
            &side_section(Side::Short),
            "rank_condition",
            format!("short rank_condition ({short}) must exceed long rank_condition ({long})"),
        ));
    }
    Ok(())
}

fn validate_trend_detection(config: &dyn ConfigPort, side: Side) -> Result<(), ScreenerError> {
    let section = trend_section(side);
    let defaults = TrendSettings::default();

    let lookback = integer(config, &section, "lookback_period", defaults.lookback_period as i64)?;
    if lookback < 1 {
        return Err(ScreenerError::invalid(
            &section,
            "lookback_period",
            "lookback_period must be at least 1",
        ));
    }

    let min_score = number(config, &section, "min_score", defaults.min_score)?;
    if !(0.0..=1.0).contains(&min_score) {
        return Err(ScreenerError::invalid(
            &section,
            "min_score",
            "min_score must be between 0 and 1",
        ));
    }
    Ok(())
}

/// Reads the side's weights, falling back to defaults per key.
pub fn read_indicator_weights(config: &dyn ConfigPort, side: Side) -> IndicatorWeights {
    let section = weights_section(side);
    let d = IndicatorWeights::default();
    IndicatorWeights {
        price_ma: config.get_double(&section, "price_ma", d.price_ma),
        volume: config.get_double(&section, "volume", d.volume),
        momentum: config.get_double(&section, "momentum", d.momentum),
        macd: config.get_double(&section, "macd", d.macd),
        bollinger: config.get_double(&section, "bollinger", d.bollinger),
    }
}

fn validate_indicator_weights(config: &dyn ConfigPort, side: Side) -> Result<(), ScreenerError> {
    let section = weights_section(side);
    for (name, default) in IndicatorWeights::default().entries() {
        number(config, &section, name, default)?;
    }
    let weights = read_indicator_weights(config, side);

    if let Some((name, _)) = weights.entries().iter().find(|(_, w)| *w < 0.0) {
        return Err(ScreenerError::invalid(&section, name, "weight must be non-negative"));
    }
    if !weights.is_normalized() {
        return Err(ScreenerError::invalid(
            &section,
            "*",
            format!(
                "indicator weights must sum to 1.0 (got {:.6}, tolerance {WEIGHT_TOLERANCE})",
                weights.sum()
            ),
        ));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort, side: Side) -> Result<(), ScreenerError> {
    let section = thresholds_section(side);
    let d = TrendThresholds::default();

    let volume_ratio = number(config, &section, "volume_ratio", d.volume_ratio)?;
    if volume_ratio <= 0.0 {
        return Err(ScreenerError::invalid(
            &section,
            "volume_ratio",
            "volume_ratio must be positive",
        ));
    }

    let lower = number(config, &section, "rsi_lower", d.rsi_lower)?;
    let upper = number(config, &section, "rsi_upper", d.rsi_upper)?;
    if lower < 0.0 || upper > 100.0 || lower >= upper {
        return Err(ScreenerError::invalid(
            &section,
            "rsi_lower",
            "rsi bounds must satisfy 0 <= rsi_lower < rsi_upper <= 100",
        ));
    }

    if let Some(raw) = config.get_string(&section, "price_data_period") {
        parse_period(&raw)
            .map_err(|reason| ScreenerError::invalid(&section, "price_data_period", reason))?;
    }
    Ok(())
}

fn validate_api(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    require(config, "api.financial_modeling_prep", "key")?;
    Ok(())
}

fn validate_paths(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    for key in REQUIRED_PATHS {
        require(config, "paths", key)?;
    }
    Ok(())
}

/// Reads `[analysis.weights]`, falling back to defaults per key.
pub fn read_ranking_weights(config: &dyn ConfigPort) -> RankingWeights {
    let d = RankingWeights::default();
    let section = "analysis.weights";
    RankingWeights {
        roce_growth: config.get_double(section, "roce_growth", d.roce_growth),
        roce_current_year: config.get_double(section, "roce_current_year", d.roce_current_year),
        operating_margin_growth: config.get_double(
            section,
            "operating_margin_growth",
            d.operating_margin_growth,
        ),
        operating_margin_current_year: config.get_double(
            section,
            "operating_margin_current_year",
            d.operating_margin_current_year,
        ),
        revenue_growth_current_year: config.get_double(
            section,
            "revenue_growth_current_year",
            d.revenue_growth_current_year,
        ),
    }
}

fn validate_analysis(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if integer(config, "analysis", "stock_limit", 1)? < 1 {
        return Err(ScreenerError::invalid(
            "analysis",
            "stock_limit",
            "stock_limit must be at least 1",
        ));
    }
    if integer(config, "analysis", "workers", 1)? < 1 {
        return Err(ScreenerError::invalid(
            "analysis",
            "workers",
            "workers must be at least 1",
        ));
    }

    for (name, default) in RankingWeights::default().entries() {
        number(config, "analysis.weights", name, default)?;
    }
    let weights = read_ranking_weights(config);
    if let Some((name, _)) = weights.entries().iter().find(|(_, w)| *w < 0.0) {
        return Err(ScreenerError::invalid("analysis.weights", name, "weight must be non-negative"));
    }
    if !weights.is_normalized() {
        return Err(ScreenerError::invalid(
            "analysis.weights",
            "*",
            format!("ranking weights must sum to 1.0 (got {:.6})", weights.sum()),
        ));
    }
    Ok(())
}

fn validate_portfolio(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    require_section(config, "portfolio")?;
    let negative_weight = number(
        config,
        "portfolio",
        "negative_weight",
        crate::domain::portfolio::DEFAULT_NEGATIVE_WEIGHT,
    )?;
    if negative_weight < 1.0 {
        return Err(ScreenerError::invalid(
            "portfolio",
            "negative_weight",
            "negative_weight must be at least 1",
        ));
    }
    Ok(())
}

/// Longest momentum history accepted, in 30-day months.
const MAX_MOMENTUM_MONTHS: i64 = 600;

fn validate_momentum(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let section = "momentum";
    let d = MomentumSettings::default();

    number(config, section, "risk_free_rate", 0.0)?;

    let lookback = integer(config, section, "lookback_months", i64::from(d.lookback_months))?;
    let history = integer(config, section, "history_months", i64::from(d.history_months))?;
    if !(1..=MAX_MOMENTUM_MONTHS).contains(&lookback) {
        return Err(ScreenerError::invalid(
            section,
            "lookback_months",
            format!("lookback_months must be between 1 and {MAX_MOMENTUM_MONTHS}"),
        ));
    }
    if !(lookback..=MAX_MOMENTUM_MONTHS).contains(&history) {
        return Err(ScreenerError::invalid(
            section,
            "history_months",
            format!("history_months must be between lookback_months and {MAX_MOMENTUM_MONTHS}"),
        ));
    }

    for (key, default) in [("top_sectors", d.top_sectors), ("stocks_per_sector", d.stocks_per_sector)] {
        if integer(config, section, key, default as i64)? < 1 {
            return Err(ScreenerError::invalid(section, key, format!("{key} must be at least 1")));
        }
    }
    Ok(())
}
