//! Current holdings, ticker exclusion and the downside-penalised rebalance.

use std::collections::{BTreeSet, HashMap};

use super::error::ScreenerError;
use super::ohlcv::OhlcvBar;

pub const DEFAULT_NEGATIVE_WEIGHT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub market_value: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Portfolio {
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new(holdings: Vec<Holding>) -> Self {
        Portfolio { holdings }
    }

    pub fn total_value(&self) -> f64 {
        self.holdings.iter().map(|h| h.market_value).sum()
    }

    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSettings {
    pub exclude: BTreeSet<String>,
    pub negative_weight: f64,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        PortfolioSettings {
            exclude: BTreeSet::new(),
            negative_weight: DEFAULT_NEGATIVE_WEIGHT,
        }
    }
}

impl PortfolioSettings {
    /// Tickers are compared without regard to ASCII case.
    pub fn is_excluded(&self, ticker: &str) -> bool {
        let ticker = ticker.trim();
        self.exclude.iter().any(|e| e.eq_ignore_ascii_case(ticker))
    }
}

/// Drops every item whose ticker is excluded.
pub fn exclude_tickers<T, F>(items: Vec<T>, ticker_of: F, settings: &PortfolioSettings) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    items
        .into_iter()
        .filter(|item| !settings.is_excluded(ticker_of(item)))
        .collect()
}

/// Mean daily range `(high - low) / open`, with down days multiplied by
/// `negative_weight`. Each range is rounded to four decimals first.
/// `None` for an empty series.
pub fn weighted_variance(bars: &[OhlcvBar], negative_weight: f64) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    let total: f64 = bars
        .iter()
        .map(|bar| {
            let range = (bar.range_pct() * 1e4).round() / 1e4;
            if bar.is_down_day() {
                range * negative_weight
            } else {
                range
            }
        })
        .sum();
    Some(total / bars.len() as f64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionChange {
    pub symbol: String,
    pub current_pct: f64,
    pub ideal_pct: f64,
    pub cash_change: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedHolding {
    pub symbol: String,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RebalancePlan {
    pub total_value: f64,
    pub excluded: Vec<ExcludedHolding>,
    /// Sorted by cash change, largest purchase first.
    pub changes: Vec<PositionChange>,
    pub sharpe_improvement: f64,
}

impl RebalancePlan {
    pub fn net_cash_change(&self) -> f64 {
        self.changes.iter().map(|c| c.cash_change).sum()
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Proposes target weights that allocate inversely to each holding's share
/// of total downside-weighted variance.
///
/// `variances` maps symbol to [`weighted_variance`]. Holdings with no
/// positive variance keep their current weight.
///
/// Current weights are whole percentages. Targets are scaled to the summed
/// current weight of the scored holdings and rounded, cash changes are
/// rounded to whole currency units, and the last scored row absorbs the
/// rounding residual.
pub fn rebalance(
    portfolio: &Portfolio,
    variances: &HashMap<String, f64>,
    settings: &PortfolioSettings,
) -> Result<RebalancePlan, ScreenerError> {
    let total_value = portfolio.total_value();
    if portfolio.holdings.is_empty() || total_value <= 0.0 {
        return Err(ScreenerError::NoData {
            ticker: "portfolio".into(),
        });
    }
    let pct_of = |value: f64| value / total_value * 100.0;

    let (excluded, active): (Vec<&Holding>, Vec<&Holding>) = portfolio
        .holdings
        .iter()
        .partition(|h| settings.is_excluded(&h.symbol));

    let scored: Vec<(&Holding, f64)> = active
        .iter()
        .filter_map(|h| {
            variances
                .get(&h.symbol)
                .copied()
                .filter(|v| *v > 0.0 && v.is_finite())
                .map(|v| (*h, v))
        })
        .collect();

    let scored_pct: f64 = scored.iter().map(|(h, _)| pct_of(h.market_value).round()).sum();
    let variance_total: f64 = scored.iter().map(|(_, v)| v).sum();
    let equal_share = 1.0 / scored.len().max(1) as f64;
    let inverse: Vec<f64> = scored
        .iter()
        .map(|(_, v)| equal_share / (v / variance_total))
        .collect();
    let inverse_total: f64 = inverse.iter().sum();

    let mut ideal: HashMap<&str, f64> = HashMap::new();
    for ((h, _), inv) in scored.iter().zip(&inverse) {
        ideal.insert(h.symbol.as_str(), (inv / inverse_total * scored_pct).round());
    }

    let mut changes: Vec<PositionChange> = active
        .iter()
        .map(|h| {
            let current_pct = pct_of(h.market_value).round();
            let ideal_pct = ideal.get(h.symbol.as_str()).copied().unwrap_or(current_pct);
            let cash_change = if ideal.contains_key(h.symbol.as_str()) {
                ((ideal_pct - current_pct) / 100.0 * total_value).round()
            } else {
                0.0
            };
            PositionChange {
                symbol: h.symbol.clone(),
                current_pct,
                ideal_pct,
                cash_change,
            }
        })
        .collect();

    let residual: f64 = changes.iter().map(|c| c.cash_change).sum();
    if let Some(last) = changes.iter_mut().rev().find(|c| ideal.contains_key(c.symbol.as_str())) {
        last.cash_change -= residual;
        last.ideal_pct = (last.current_pct + pct_of(last.cash_change)).round();
    }

    let current: Vec<f64> = changes.iter().map(|c| c.current_pct).collect();
    let target: Vec<f64> = changes.iter().map(|c| c.ideal_pct).collect();
    let sharpe_improvement = match (sample_std(&current), sample_std(&target)) {
        (Some(cur), Some(tgt)) if tgt > 1e-9 => (cur / tgt - 1.0) * 100.0,
        _ => 0.0,
    };

    changes.sort_by(|a, b| {
        b.cash_change
            .total_cmp(&a.cash_change)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    tracing::debug!(
        holdings = portfolio.holding_count(),
        excluded = excluded.len(),
        scored = scored.len(),
        "rebalance computed"
    );

    Ok(RebalancePlan {
        total_value,
        excluded: excluded
            .into_iter()
            .map(|h| ExcludedHolding {
                symbol: h.symbol.clone(),
                pct: pct_of(h.market_value),
            })
            .collect(),
        changes,
        sharpe_improvement,
    })
}
