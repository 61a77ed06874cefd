//! Screening pipeline: fundamental ranking, per-side rank filter, trend
//! scoring and exclusion, plus the inputs of the weekly rebalance.
//!
//! Per-stock work runs on a bounded rayon pool. Results are collected in
//! input order so a run is deterministic for identical inputs.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::domain::config::SideFilter;
use crate::domain::error::ScreenerError;
use crate::domain::market::{index_status, IndexStatus, REGIME_PERIODS};
use crate::domain::portfolio::{exclude_tickers, weighted_variance, Portfolio, PortfolioSettings};
use crate::domain::rank_filter::{self, Side};
use crate::domain::ranking::{
    compute_metrics, is_screenable_symbol, latest_year, rank_universe, AnnualStatement,
    CompanyProfile, RankedStock, RankingWeights,
};
use crate::domain::trend::{detect_trend, TrendSignal};
use crate::ports::data_port::DataPort;
use crate::ports::fundamentals_port::FundamentalsPort;

/// Calendar days of price history behind the rebalance variance.
pub const REBALANCE_HISTORY_DAYS: u32 = 30;

/// One row of the investing / short candidate files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCandidate {
    pub ticker: String,
    pub side: String,
    pub roce_growth_rank: f64,
    pub roce_current_year_rank: f64,
    pub operating_margin_growth_rank: f64,
    pub operating_margin_current_year_rank: f64,
    pub revenue_growth_current_year_rank: f64,
    pub final_rank: f64,
    pub ma_score: f64,
    pub volume_score: f64,
    pub momentum_score: f64,
    pub macd_score: f64,
    pub bb_score: f64,
    pub trend_strength: f64,
    pub signal: String,
    pub confidence: f64,
    pub factors: String,
    pub price_picked: f64,
    pub date: NaiveDate,
}

impl StockCandidate {
    pub fn new(
        stock: &RankedStock,
        side: Side,
        signal: &TrendSignal,
        price_picked: f64,
        date: NaiveDate,
    ) -> Self {
        let b = &signal.breakdown;
        StockCandidate {
            ticker: stock.ticker.clone(),
            side: side.to_string(),
            roce_growth_rank: stock.roce_growth_rank,
            roce_current_year_rank: stock.roce_current_year_rank,
            operating_margin_growth_rank: stock.operating_margin_growth_rank,
            operating_margin_current_year_rank: stock.operating_margin_current_year_rank,
            revenue_growth_current_year_rank: stock.revenue_growth_current_year_rank,
            final_rank: stock.final_rank,
            ma_score: b.ma_score,
            volume_score: b.volume_score,
            momentum_score: b.momentum_score,
            macd_score: b.macd_score,
            bb_score: b.bb_score,
            trend_strength: signal.strength,
            signal: signal.signal_type.to_string(),
            confidence: signal.confidence,
            factors: signal.factors_label(),
            price_picked,
            date,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenResult {
    pub long: Vec<StockCandidate>,
    pub short: Vec<StockCandidate>,
}

impl ScreenResult {
    pub fn side(&self, side: Side) -> &[StockCandidate] {
        match side {
            Side::Long => &self.long,
            Side::Short => &self.short,
        }
    }
}

pub fn build_pool(workers: usize) -> Result<ThreadPool, ScreenerError> {
    ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("screen-worker-{i}"))
        .build()
        .map_err(|e| ScreenerError::WorkerPool {
            reason: e.to_string(),
        })
}

/// The rebalance analysis runs on Mondays unless forced.
pub fn is_rebalance_day(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Mon
}

fn history_start(as_of: NaiveDate, days: u32) -> NaiveDate {
    as_of - Duration::days(i64::from(days))
}

/// Ranks the fundamentals universe. Companies whose statements cannot be
/// fetched are skipped with a warning.
pub fn rank_stocks(
    fundamentals: &dyn FundamentalsPort,
    stock_limit: usize,
    weights: &RankingWeights,
    pool: &ThreadPool,
) -> Result<Vec<RankedStock>, ScreenerError> {
    let companies: Vec<CompanyProfile> = fundamentals
        .list_companies(stock_limit)?
        .into_iter()
        .filter(|c| is_screenable_symbol(&c.ticker))
        .take(stock_limit)
        .collect();
    tracing::info!(companies = companies.len(), "ranking universe");

    let with_statements: Vec<(CompanyProfile, Vec<AnnualStatement>)> = pool.install(|| {
        companies
            .into_par_iter()
            .filter_map(|company| match fundamentals.annual_statements(&company.ticker) {
                Ok(statements) => Some((company, statements)),
                Err(e) => {
                    tracing::warn!(ticker = %company.ticker, error = %e, "skipping company");
                    None
                }
            })
            .collect()
    });

    let Some(current_year) = latest_year(with_statements.iter().map(|(_, s)| s.as_slice())) else {
        return Err(ScreenerError::NoData {
            ticker: "fundamentals".into(),
        });
    };

    let metrics = with_statements
        .into_iter()
        .map(|(company, statements)| {
            let values = compute_metrics(&statements, current_year);
            (company, values)
        })
        .collect();

    let ranked = rank_universe(metrics, weights);
    tracing::info!(ranked = ranked.len(), current_year, "ranking complete");
    Ok(ranked)
}

/// Rank filter then trend scoring for one side. Stocks without enough
/// history or whose data cannot be fetched are logged and skipped.
pub fn screen_side(
    ranked: &[RankedStock],
    filter: &SideFilter,
    data: &dyn DataPort,
    as_of: NaiveDate,
    pool: &ThreadPool,
) -> Vec<StockCandidate> {
    let side = filter.side;
    let survivors = rank_filter::apply(ranked, |s| s.final_rank, filter.rank_condition, side);
    tracing::info!(%side, survivors = survivors.len(), threshold = filter.rank_condition, "rank filter applied");

    let start = history_start(as_of, filter.trend.thresholds.history_days);
    let direction = side.trend_direction();

    let mut candidates: Vec<StockCandidate> = pool.install(|| {
        survivors
            .par_iter()
            .filter_map(|stock| {
                let scored = data
                    .fetch_ohlcv(&stock.ticker, start, as_of)
                    .and_then(|bars| {
                        let signal = detect_trend(&stock.ticker, &bars, &filter.trend, direction)?;
                        Ok(signal.map(|s| (s, bars.last().map(|b| b.close).unwrap_or(stock.price))))
                    });
                match scored {
                    Ok(Some((signal, price))) => {
                        Some(StockCandidate::new(stock, side, &signal, price, as_of))
                    }
                    Ok(None) => None,
                    Err(e) => {
                        tracing::warn!(ticker = %stock.ticker, %side, error = %e, "skipping stock");
                        None
                    }
                }
            })
            .collect()
    });

    candidates.sort_by(|a, b| a.final_rank.total_cmp(&b.final_rank));
    tracing::info!(%side, candidates = candidates.len(), "trend scoring complete");
    candidates
}

/// Runs both sides and removes excluded tickers from the output.
pub fn screen(
    ranked: &[RankedStock],
    sides: [&SideFilter; 2],
    settings: &PortfolioSettings,
    data: &dyn DataPort,
    as_of: NaiveDate,
    pool: &ThreadPool,
) -> ScreenResult {
    let mut result = ScreenResult::default();
    for filter in sides {
        let candidates = screen_side(ranked, filter, data, as_of, pool);
        let kept = exclude_tickers(candidates, |c| c.ticker.as_str(), settings);
        match filter.side {
            Side::Long => result.long = kept,
            Side::Short => result.short = kept,
        }
    }
    result
}

/// Regime status of each index over the longest moving average window.
pub fn market_overview(data: &dyn DataPort, indexes: &[String], as_of: NaiveDate) -> Vec<IndexStatus> {
    let longest = REGIME_PERIODS.iter().copied().max().unwrap_or(200);
    // calendar days covering the trading-day window
    let start = history_start(as_of, (longest * 2) as u32);
    indexes
        .iter()
        .map(|ticker| {
            let bars = data.fetch_ohlcv(ticker, start, as_of).unwrap_or_else(|e| {
                tracing::warn!(%ticker, error = %e, "index history unavailable");
                Vec::new()
            });
            index_status(ticker, &bars)
        })
        .collect()
}

/// Downside-weighted variance of each non-excluded holding. Holdings
/// without price history are left out.
pub fn portfolio_variances(
    portfolio: &Portfolio,
    settings: &PortfolioSettings,
    data: &dyn DataPort,
    as_of: NaiveDate,
    history_days: u32,
    pool: &ThreadPool,
) -> HashMap<String, f64> {
    let start = history_start(as_of, history_days);
    pool.install(|| {
        portfolio
            .holdings
            .par_iter()
            .filter(|h| !settings.is_excluded(&h.symbol))
            .filter_map(|h| match data.fetch_ohlcv(&h.symbol, start, as_of) {
                Ok(bars) => weighted_variance(&bars, settings.negative_weight)
                    .map(|v| (h.symbol.clone(), v)),
                Err(e) => {
                    tracing::warn!(symbol = %h.symbol, error = %e, "no price history for holding");
                    None
                }
            })
            .collect()
    })
}
