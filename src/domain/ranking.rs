//! Fundamental ranking of the stock universe.
//!
//! Yearly ROCE, operating margin and revenue growth are derived from annual
//! statements. Growth metrics are the regression slope of a yearly series
//! weighted by its r². Five metric ranks are combined into a weighted score
//! and the universe is ordered by that score, rank 1 first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::trend::WEIGHT_TOLERANCE;

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProfile {
    pub ticker: String,
    pub sector: String,
    pub market_cap: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnualStatement {
    pub year: i32,
    pub revenue: f64,
    pub operating_income: f64,
    pub total_assets: f64,
    pub total_current_liabilities: f64,
}

impl AnnualStatement {
    pub fn capital_employed(&self) -> f64 {
        self.total_assets - self.total_current_liabilities
    }
}

/// Percent metrics for one fiscal year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearlyMetrics {
    pub year: i32,
    pub roce: Option<f64>,
    pub operating_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
}

/// The five ranked metrics of a company. `None` ranks last.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricValues {
    pub roce_growth: Option<f64>,
    pub roce_current_year: Option<f64>,
    pub operating_margin_growth: Option<f64>,
    pub operating_margin_current_year: Option<f64>,
    pub revenue_growth_current_year: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingWeights {
    pub roce_growth: f64,
    pub roce_current_year: f64,
    pub operating_margin_growth: f64,
    pub operating_margin_current_year: f64,
    pub revenue_growth_current_year: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            roce_growth: 0.25,
            roce_current_year: 0.20,
            operating_margin_growth: 0.20,
            operating_margin_current_year: 0.20,
            revenue_growth_current_year: 0.15,
        }
    }
}

impl RankingWeights {
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("roce_growth", self.roce_growth),
            ("roce_current_year", self.roce_current_year),
            ("operating_margin_growth", self.operating_margin_growth),
            ("operating_margin_current_year", self.operating_margin_current_year),
            ("revenue_growth_current_year", self.revenue_growth_current_year),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.entries().iter().map(|(_, w)| w).sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_TOLERANCE
    }
}

/// One row of the stock scores file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStock {
    pub ticker: String,
    pub sector: String,
    pub market_cap: f64,
    pub price: f64,
    pub roce_growth: Option<f64>,
    pub roce_current_year: Option<f64>,
    pub operating_margin_growth: Option<f64>,
    pub operating_margin_current_year: Option<f64>,
    pub revenue_growth_current_year: Option<f64>,
    pub roce_growth_rank: f64,
    pub roce_current_year_rank: f64,
    pub operating_margin_growth_rank: f64,
    pub operating_margin_current_year_rank: f64,
    pub revenue_growth_current_year_rank: f64,
    pub final_score: f64,
    pub final_rank: f64,
}

/// Symbols with class or exchange suffixes (`BRK.B`, `LSE:VOD`) are skipped.
pub fn is_screenable_symbol(ticker: &str) -> bool {
    !ticker.is_empty() && !ticker.contains('.') && !ticker.contains(':')
}

fn percent_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !numerator.is_finite() || !denominator.is_finite() {
        None
    } else {
        Some(numerator / denominator * 100.0)
    }
}

/// Per-year metrics in ascending year order. Duplicate years keep the last
/// statement given. Revenue growth needs the immediately preceding year.
pub fn yearly_metrics(statements: &[AnnualStatement]) -> Vec<YearlyMetrics> {
    let by_year: BTreeMap<i32, &AnnualStatement> =
        statements.iter().map(|s| (s.year, s)).collect();

    let mut previous: Option<&AnnualStatement> = None;
    let mut out = Vec::with_capacity(by_year.len());
    for (&year, &s) in &by_year {
        let revenue_growth = previous
            .filter(|p| p.year == year - 1)
            .and_then(|p| percent_ratio(s.revenue - p.revenue, p.revenue));
        out.push(YearlyMetrics {
            year,
            roce: percent_ratio(s.operating_income, s.capital_employed()),
            operating_margin: percent_ratio(s.operating_income, s.revenue),
            revenue_growth,
        });
        previous = Some(s);
    }
    out
}

/// Least-squares slope of `(x, y)` multiplied by r².
///
/// `None` with fewer than two points or when every x is equal. A flat series
/// has r² = 0 and scores 0.
pub fn weighted_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let r_squared = if syy == 0.0 {
        0.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };
    Some(slope * r_squared)
}

fn series_growth<F>(metrics: &[YearlyMetrics], value: F) -> Option<f64>
where
    F: Fn(&YearlyMetrics) -> Option<f64>,
{
    let points: Vec<(f64, f64)> = metrics
        .iter()
        .filter_map(|m| value(m).map(|v| (f64::from(m.year), v)))
        .collect();
    weighted_slope(&points)
}

/// Metric values for one company, with `current_year` being the latest
/// fiscal year seen anywhere in the universe.
pub fn compute_metrics(statements: &[AnnualStatement], current_year: i32) -> MetricValues {
    let yearly = yearly_metrics(statements);
    let current = yearly.iter().find(|m| m.year == current_year);

    MetricValues {
        roce_growth: series_growth(&yearly, |m| m.roce),
        roce_current_year: current.and_then(|m| m.roce),
        operating_margin_growth: series_growth(&yearly, |m| m.operating_margin),
        operating_margin_current_year: current.and_then(|m| m.operating_margin),
        revenue_growth_current_year: current.and_then(|m| m.revenue_growth),
    }
}

/// Latest fiscal year across all statement sets.
pub fn latest_year<'a, I>(statement_sets: I) -> Option<i32>
where
    I: IntoIterator<Item = &'a [AnnualStatement]>,
{
    statement_sets
        .into_iter()
        .flat_map(|set| set.iter().map(|s| s.year))
        .max()
}

/// Descending min-rank: the highest value gets 1, ties share the lowest
/// rank, missing values all rank `valid + 1`.
pub fn rank_descending(values: &[Option<f64>]) -> Vec<f64> {
    let valid: Vec<f64> = values.iter().flatten().copied().collect();
    let missing_rank = valid.len() as f64 + 1.0;
    values
        .iter()
        .map(|v| match v {
            Some(v) => 1.0 + valid.iter().filter(|other| *other > v).count() as f64,
            None => missing_rank,
        })
        .collect()
}

/// Ascending min-rank: the lowest value gets 1.
pub fn rank_ascending(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|v| 1.0 + values.iter().filter(|other| *other < v).count() as f64)
        .collect()
}

/// Ranks `values` separately within each group.
fn rank_within_groups(groups: &[&str], values: &[Option<f64>]) -> Vec<f64> {
    let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, group) in groups.iter().enumerate() {
        members.entry(*group).or_default().push(i);
    }

    let mut ranks = vec![0.0; values.len()];
    for indices in members.values() {
        let group_values: Vec<Option<f64>> = indices.iter().map(|&i| values[i]).collect();
        for (&i, rank) in indices.iter().zip(rank_descending(&group_values)) {
            ranks[i] = rank;
        }
    }
    ranks
}

fn metric_column<F>(companies: &[(CompanyProfile, MetricValues)], value: F) -> Vec<Option<f64>>
where
    F: Fn(&MetricValues) -> Option<f64>,
{
    companies.iter().map(|(_, m)| value(m)).collect()
}

/// Ranks the universe and returns it ordered by final rank, then ticker.
pub fn rank_universe(
    companies: Vec<(CompanyProfile, MetricValues)>,
    weights: &RankingWeights,
) -> Vec<RankedStock> {
    let column = |f: fn(&MetricValues) -> Option<f64>| metric_column(&companies, f);
    let sectors: Vec<&str> = companies.iter().map(|(p, _)| p.sector.as_str()).collect();

    let roce_growth = rank_descending(&column(|m| m.roce_growth));
    let margin_growth = rank_descending(&column(|m| m.operating_margin_growth));
    let revenue_growth = rank_descending(&column(|m| m.revenue_growth_current_year));
    let roce_current = rank_within_groups(&sectors, &column(|m| m.roce_current_year));
    let margin_current = rank_within_groups(&sectors, &column(|m| m.operating_margin_current_year));

    let scores: Vec<f64> = (0..companies.len())
        .map(|i| {
            weights.roce_growth * roce_growth[i]
                + weights.roce_current_year * roce_current[i]
                + weights.operating_margin_growth * margin_growth[i]
                + weights.operating_margin_current_year * margin_current[i]
                + weights.revenue_growth_current_year * revenue_growth[i]
        })
        .collect();
    let final_ranks = rank_ascending(&scores);

    let mut ranked: Vec<RankedStock> = companies
        .into_iter()
        .enumerate()
        .map(|(i, (profile, metrics))| RankedStock {
            ticker: profile.ticker,
            sector: profile.sector,
            market_cap: profile.market_cap,
            price: profile.price,
            roce_growth: metrics.roce_growth,
            roce_current_year: metrics.roce_current_year,
            operating_margin_growth: metrics.operating_margin_growth,
            operating_margin_current_year: metrics.operating_margin_current_year,
            revenue_growth_current_year: metrics.revenue_growth_current_year,
            roce_growth_rank: roce_growth[i],
            roce_current_year_rank: roce_current[i],
            operating_margin_growth_rank: margin_growth[i],
            operating_margin_current_year_rank: margin_current[i],
            revenue_growth_current_year_rank: revenue_growth[i],
            final_score: scores[i],
            final_rank: final_ranks[i],
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.final_rank
            .total_cmp(&b.final_rank)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    ranked
}
