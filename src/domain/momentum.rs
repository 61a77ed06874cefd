//! Momentum allocation tools.
//!
//! - Dual momentum: US equities (SPY) against international equities (VEU)
//!   over twelve months, with bonds (AGG) when US equities do not beat the
//!   risk-free rate.
//! - Sector momentum: the SPDR sector ETFs ranked by trailing return and by
//!   return per unit of annualised volatility.
//! - Leading-sector stocks: the largest companies of the strongest sectors,
//!   ranked by the same momentum measure.

use std::fmt;

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::domain::error::ScreenerError;
use crate::domain::indicator::calculate_roc;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::ranking::CompanyProfile;
use crate::ports::data_port::DataPort;

pub const US_EQUITY: &str = "SPY";
pub const INTERNATIONAL_EQUITY: &str = "VEU";
pub const AGGREGATE_BONDS: &str = "AGG";

/// Calendar days behind the dual momentum returns.
pub const DUAL_MOMENTUM_DAYS: u32 = 365;
pub const MIN_MOMENTUM_BARS: usize = 20;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Largest companies of a sector considered before momentum is measured.
pub const SECTOR_CANDIDATES: usize = 50;

pub const SECTOR_ETFS: [(&str, &str); 11] = [
    ("XLY", "Consumer Discretionary"),
    ("XLP", "Consumer Staples"),
    ("XLE", "Energy"),
    ("XLF", "Financials"),
    ("XLV", "Healthcare"),
    ("XLI", "Industrials"),
    ("XLB", "Materials"),
    ("XLK", "Technology"),
    ("XLU", "Utilities"),
    ("XLRE", "Real Estate"),
    ("XLC", "Communication Services"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct MomentumSettings {
    /// Months between the latest close and the reference close.
    pub lookback_months: u32,
    /// Months of history fetched per symbol.
    pub history_months: u32,
    pub top_sectors: usize,
    pub stocks_per_sector: usize,
    /// Annual risk-free yield in percent, usually the 1-month T-bill.
    pub risk_free_rate: Option<f64>,
}

impl Default for MomentumSettings {
    fn default() -> Self {
        MomentumSettings {
            lookback_months: 3,
            history_months: 12,
            top_sectors: 2,
            stocks_per_sector: 10,
            risk_free_rate: None,
        }
    }
}

impl MomentumSettings {
    fn history_days(&self) -> i64 {
        i64::from(self.history_months) * 30 + 10
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    UsEquity,
    International,
    Bonds,
}

impl Allocation {
    pub fn ticker(self) -> &'static str {
        match self {
            Allocation::UsEquity => US_EQUITY,
            Allocation::International => INTERNATIONAL_EQUITY,
            Allocation::Bonds => AGGREGATE_BONDS,
        }
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Allocation::UsEquity => "SP500",
            Allocation::International => "International",
            Allocation::Bonds => "Aggregate Bonds",
        };
        write!(f, "{label} - {}", self.ticker())
    }
}

/// Absolute momentum first, then relative momentum.
pub fn choose_allocation(us_return: f64, international_return: f64, risk_free_rate: f64) -> Allocation {
    if us_return - risk_free_rate > 0.0 {
        if us_return > international_return {
            Allocation::UsEquity
        } else {
            Allocation::International
        }
    } else {
        Allocation::Bonds
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DualMomentum {
    pub us_return: f64,
    pub international_return: f64,
    pub risk_free_rate: f64,
    pub allocation: Allocation,
}

/// Percent change from the first to the last close of the window.
pub fn window_return(ticker: &str, bars: &[OhlcvBar]) -> Result<f64, ScreenerError> {
    if bars.len() < 2 {
        return Err(ScreenerError::InsufficientHistory {
            ticker: ticker.to_string(),
            bars: bars.len(),
            minimum: 2,
        });
    }
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    Ok(calculate_roc(&closes, closes.len() - 1).latest().unwrap_or(0.0))
}

pub fn dual_momentum(
    data: &dyn DataPort,
    as_of: NaiveDate,
    risk_free_rate: f64,
) -> Result<DualMomentum, ScreenerError> {
    let start = as_of - Duration::days(i64::from(DUAL_MOMENTUM_DAYS));
    let us_return = window_return(US_EQUITY, &data.fetch_ohlcv(US_EQUITY, start, as_of)?)?;
    let international_return = window_return(
        INTERNATIONAL_EQUITY,
        &data.fetch_ohlcv(INTERNATIONAL_EQUITY, start, as_of)?,
    )?;
    let allocation = choose_allocation(us_return, international_return, risk_free_rate);
    tracing::info!(us_return, international_return, risk_free_rate, %allocation, "dual momentum");
    Ok(DualMomentum {
        us_return,
        international_return,
        risk_free_rate,
        allocation,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    /// Percent return over the lookback.
    pub total_return: f64,
    /// Lookback return divided by annualised volatility; 0 without volatility.
    pub risk_adjusted: f64,
}

/// Momentum over `months` (30-day months) ending at the last bar.
///
/// The reference close is the bar whose date is nearest the target date,
/// the earliest on a tie. Volatility is the population standard deviation
/// of every daily return in `bars`, annualised over 252 trading days.
pub fn momentum(ticker: &str, bars: &[OhlcvBar], months: u32) -> Result<Momentum, ScreenerError> {
    let Some(last) = bars.last().filter(|_| bars.len() >= MIN_MOMENTUM_BARS) else {
        return Err(ScreenerError::InsufficientHistory {
            ticker: ticker.to_string(),
            bars: bars.len(),
            minimum: MIN_MOMENTUM_BARS,
        });
    };
    let target = last.date - Duration::days(i64::from(months) * 30);
    let anchor = bars
        .iter()
        .enumerate()
        .min_by_key(|(_, b)| (b.date - target).num_days().abs())
        .map(|(i, _)| i)
        .unwrap_or(0);

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let period = closes.len() - 1 - anchor;
    let total_return = if period == 0 {
        0.0
    } else {
        calculate_roc(&closes, period).latest().unwrap_or(0.0)
    };

    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    let volatility = if returns.is_empty() {
        0.0
    } else {
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
    };
    let risk_adjusted = if volatility > 0.0 {
        (total_return / 100.0) / volatility
    } else {
        0.0
    };

    Ok(Momentum {
        total_return,
        risk_adjusted,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorMomentum {
    pub symbol: String,
    pub sector: String,
    pub momentum: Momentum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockMomentum {
    pub ticker: String,
    pub market_cap: f64,
    pub momentum: Momentum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorLeaders {
    pub sector: String,
    pub symbol: String,
    /// Best return first.
    pub stocks: Vec<StockMomentum>,
}

fn by_return_desc(a: &Momentum, b: &Momentum) -> std::cmp::Ordering {
    b.total_return.total_cmp(&a.total_return)
}

fn measure(
    data: &dyn DataPort,
    ticker: &str,
    as_of: NaiveDate,
    settings: &MomentumSettings,
) -> Result<Momentum, ScreenerError> {
    let start = as_of - Duration::days(settings.history_days());
    let bars = data.fetch_ohlcv(ticker, start, as_of)?;
    momentum(ticker, &bars, settings.lookback_months)
}

/// Sector ETFs sorted by return, best first. ETFs without usable history
/// are logged and left out; none at all is `NoData`.
pub fn sector_momentum(
    data: &dyn DataPort,
    as_of: NaiveDate,
    settings: &MomentumSettings,
    pool: &ThreadPool,
) -> Result<Vec<SectorMomentum>, ScreenerError> {
    let mut sectors: Vec<SectorMomentum> = pool.install(|| {
        SECTOR_ETFS
            .par_iter()
            .filter_map(|(symbol, sector)| match measure(data, symbol, as_of, settings) {
                Ok(momentum) => Some(SectorMomentum {
                    symbol: symbol.to_string(),
                    sector: sector.to_string(),
                    momentum,
                }),
                Err(e) => {
                    tracing::warn!(%symbol, %sector, error = %e, "skipping sector");
                    None
                }
            })
            .collect()
    });
    if sectors.is_empty() {
        return Err(ScreenerError::NoData {
            ticker: "sector ETFs".into(),
        });
    }
    sectors.sort_by(|a, b| by_return_desc(&a.momentum, &b.momentum).then_with(|| a.symbol.cmp(&b.symbol)));
    Ok(sectors)
}

pub fn top_risk_adjusted(sectors: &[SectorMomentum]) -> Option<&SectorMomentum> {
    sectors
        .iter()
        .max_by(|a, b| a.momentum.risk_adjusted.total_cmp(&b.momentum.risk_adjusted))
}

/// Momentum of the largest companies in each of the strongest sectors.
///
/// `sectors` must already be sorted best first. Companies are matched to a
/// sector by name, taken by market cap, and the first `stocks_per_sector`
/// with usable history are kept.
pub fn leading_sector_stocks(
    sectors: &[SectorMomentum],
    companies: &[CompanyProfile],
    data: &dyn DataPort,
    as_of: NaiveDate,
    settings: &MomentumSettings,
    pool: &ThreadPool,
) -> Vec<SectorLeaders> {
    sectors
        .iter()
        .take(settings.top_sectors)
        .map(|leader| {
            let mut members: Vec<&CompanyProfile> = companies
                .iter()
                .filter(|c| c.sector.trim().eq_ignore_ascii_case(&leader.sector))
                .collect();
            members.sort_by(|a, b| b.market_cap.total_cmp(&a.market_cap).then_with(|| a.ticker.cmp(&b.ticker)));
            members.truncate(SECTOR_CANDIDATES);

            let measured: Vec<Option<StockMomentum>> = pool.install(|| {
                members
                    .par_iter()
                    .map(|company| match measure(data, &company.ticker, as_of, settings) {
                        Ok(momentum) => Some(StockMomentum {
                            ticker: company.ticker.clone(),
                            market_cap: company.market_cap,
                            momentum,
                        }),
                        Err(e) => {
                            tracing::debug!(ticker = %company.ticker, error = %e, "no momentum");
                            None
                        }
                    })
                    .collect()
            });
            let mut stocks: Vec<StockMomentum> = measured
                .into_iter()
                .flatten()
                .take(settings.stocks_per_sector)
                .collect();
            stocks.sort_by(|a, b| by_return_desc(&a.momentum, &b.momentum).then_with(|| a.ticker.cmp(&b.ticker)));
            tracing::info!(sector = %leader.sector, stocks = stocks.len(), "sector leaders measured");

            SectorLeaders {
                sector: leader.sector.clone(),
                symbol: leader.symbol.clone(),
                stocks,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::screen::build_pool;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(n)
    }

    fn bars(ticker: &str, closes: &[f64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                ticker: ticker.into(),
                date: day(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
            })
            .collect()
    }

    struct Prices(HashMap<String, Vec<OhlcvBar>>);

    impl DataPort for Prices {
        fn fetch_ohlcv(
            &self,
            ticker: &str,
            start_date: NaiveDate,
            end_date: NaiveDate,
        ) -> Result<Vec<OhlcvBar>, ScreenerError> {
            self.0
                .get(ticker)
                .map(|b| {
                    b.iter()
                        .filter(|b| b.date >= start_date && b.date <= end_date)
                        .cloned()
                        .collect()
                })
                .ok_or_else(|| ScreenerError::NoData {
                    ticker: ticker.to_string(),
                })
        }
    }

    fn linear(ticker: &str, from: f64, step: f64, n: usize) -> Vec<OhlcvBar> {
        let closes: Vec<f64> = (0..n).map(|i| from + step * i as f64).collect();
        bars(ticker, &closes)
    }

    #[test]
    fn allocation_rules() {
        assert_eq!(choose_allocation(12.0, 8.0, 5.0), Allocation::UsEquity);
        assert_eq!(choose_allocation(12.0, 15.0, 5.0), Allocation::International);
        assert_eq!(choose_allocation(12.0, 12.0, 5.0), Allocation::International);
        assert_eq!(choose_allocation(4.0, 20.0, 5.0), Allocation::Bonds);
        assert_eq!(choose_allocation(5.0, 1.0, 5.0), Allocation::Bonds);
    }

    #[test]
    fn allocation_labels() {
        assert_eq!(Allocation::UsEquity.to_string(), "SP500 - SPY");
        assert_eq!(Allocation::International.to_string(), "International - VEU");
        assert_eq!(Allocation::Bonds.to_string(), "Aggregate Bonds - AGG");
    }

    #[test]
    fn window_return_uses_first_and_last_close() {
        let b = bars("SPY", &[100.0, 90.0, 130.0, 125.0]);
        assert_relative_eq!(window_return("SPY", &b).unwrap(), 25.0, epsilon = 1e-12);
        assert!(matches!(
            window_return("SPY", &b[..1]),
            Err(ScreenerError::InsufficientHistory { minimum: 2, .. })
        ));
    }

    #[test]
    fn momentum_anchors_on_nearest_date() {
        // 120 daily bars; 90 days before the last is index 29
        let b = linear("XLK", 100.0, 1.0, 120);
        let m = momentum("XLK", &b, 3).unwrap();
        assert_relative_eq!(m.total_return, (219.0 - 129.0) / 129.0 * 100.0, epsilon = 1e-9);
        assert!(m.risk_adjusted > 0.0);
    }

    #[test]
    fn momentum_falls_back_to_oldest_bar() {
        let b = linear("XLE", 50.0, -0.5, 30);
        let m = momentum("XLE", &b, 3).unwrap();
        assert_relative_eq!(m.total_return, (35.5 - 50.0) / 50.0 * 100.0, epsilon = 1e-9);
        assert!(m.risk_adjusted < 0.0);
    }

    #[test]
    fn flat_prices_have_no_risk_adjusted_return() {
        let m = momentum("XLU", &bars("XLU", &[40.0; 25]), 3).unwrap();
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.risk_adjusted, 0.0);
    }

    #[test]
    fn momentum_needs_twenty_bars() {
        let err = momentum("XLB", &linear("XLB", 10.0, 1.0, 19), 3).unwrap_err();
        assert!(matches!(err, ScreenerError::InsufficientHistory { bars: 19, minimum: 20, .. }));
    }

    #[test]
    fn momentum_volatility_is_annualised_population_std() {
        // alternating +10% / -10% moves
        let mut closes = vec![100.0];
        for i in 0..24 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last * 1.1 } else { last * 0.9 });
        }
        let b = bars("XLF", &closes);
        let m = momentum("XLF", &b, 3).unwrap();
        let vol = 0.1 * TRADING_DAYS_PER_YEAR.sqrt();
        assert_relative_eq!(m.risk_adjusted, m.total_return / 100.0 / vol, epsilon = 1e-9);
    }

    #[test]
    fn dual_momentum_reads_both_funds() {
        let end = day(364);
        let data = Prices(HashMap::from([
            ("SPY".to_string(), linear("SPY", 100.0, 0.1, 365)),
            ("VEU".to_string(), linear("VEU", 50.0, 0.01, 365)),
        ]));
        let dual = dual_momentum(&data, end, 4.5).unwrap();
        assert_relative_eq!(dual.us_return, 36.4, epsilon = 1e-9);
        assert_eq!(dual.allocation, Allocation::UsEquity);

        let missing = Prices(HashMap::from([("SPY".to_string(), linear("SPY", 100.0, 0.1, 365))]));
        assert!(matches!(
            dual_momentum(&missing, end, 4.5),
            Err(ScreenerError::NoData { ticker }) if ticker == "VEU"
        ));
    }

    #[test]
    fn sectors_sorted_by_return_and_missing_skipped() {
        let data = Prices(HashMap::from([
            ("XLK".to_string(), linear("XLK", 100.0, 1.0, 120)),
            ("XLE".to_string(), linear("XLE", 100.0, -0.2, 120)),
            ("XLV".to_string(), linear("XLV", 100.0, 0.3, 120)),
            ("XLU".to_string(), linear("XLU", 100.0, 0.3, 5)),
        ]));
        let pool = build_pool(2).unwrap();
        let sectors = sector_momentum(&data, day(119), &MomentumSettings::default(), &pool).unwrap();

        let order: Vec<&str> = sectors.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(order, vec!["XLK", "XLV", "XLE"]);
        assert_eq!(sectors[0].sector, "Technology");
        // the slower, steadier climb wins per unit of volatility
        assert_eq!(top_risk_adjusted(&sectors).unwrap().symbol, "XLV");
    }

    #[test]
    fn no_sector_history_is_no_data() {
        let pool = build_pool(1).unwrap();
        let err = sector_momentum(&Prices(HashMap::new()), day(0), &MomentumSettings::default(), &pool)
            .unwrap_err();
        assert!(matches!(err, ScreenerError::NoData { .. }));
    }

    #[test]
    fn leaders_come_from_top_sectors_by_market_cap() {
        let company = |ticker: &str, sector: &str, market_cap: f64| CompanyProfile {
            ticker: ticker.into(),
            sector: sector.into(),
            market_cap,
            price: 10.0,
        };
        let companies = vec![
            company("BIG", "Technology", 3e12),
            company("MID", "technology", 1e11),
            company("TINY", "Technology", 1e8),
            company("NOHIST", "Technology", 2e12),
            company("DOC", "Healthcare", 5e11),
            company("OIL", "Energy", 9e11),
        ];
        let data = Prices(HashMap::from([
            ("BIG".to_string(), linear("BIG", 100.0, 0.1, 120)),
            ("MID".to_string(), linear("MID", 100.0, 0.5, 120)),
            ("TINY".to_string(), linear("TINY", 100.0, 2.0, 120)),
            ("DOC".to_string(), linear("DOC", 100.0, 0.2, 120)),
            ("OIL".to_string(), linear("OIL", 100.0, 0.9, 120)),
        ]));
        let sectors = vec![
            SectorMomentum {
                symbol: "XLK".into(),
                sector: "Technology".into(),
                momentum: Momentum { total_return: 9.0, risk_adjusted: 1.0 },
            },
            SectorMomentum {
                symbol: "XLV".into(),
                sector: "Healthcare".into(),
                momentum: Momentum { total_return: 4.0, risk_adjusted: 2.0 },
            },
            SectorMomentum {
                symbol: "XLE".into(),
                sector: "Energy".into(),
                momentum: Momentum { total_return: 1.0, risk_adjusted: 0.5 },
            },
        ];
        let settings = MomentumSettings {
            stocks_per_sector: 2,
            ..MomentumSettings::default()
        };
        let pool = build_pool(2).unwrap();

        let leaders = leading_sector_stocks(&sectors, &companies, &data, day(119), &settings, &pool);

        assert_eq!(leaders.len(), 2);
        assert_eq!(leaders[0].symbol, "XLK");
        // NOHIST has no prices, TINY falls outside the two largest with history
        let tech: Vec<&str> = leaders[0].stocks.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(tech, vec!["MID", "BIG"]);
        assert_eq!(leaders[1].stocks.len(), 1);
        assert_eq!(leaders[1].stocks[0].ticker, "DOC");
    }
}
