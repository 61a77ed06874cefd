//! Plain-text report bodies for the stock analysis and portfolio rebalance
//! notifications.

use chrono::NaiveDate;

use crate::domain::market::IndexStatus;
use crate::domain::momentum::{top_risk_adjusted, DualMomentum, SectorLeaders, SectorMomentum};
use crate::domain::portfolio::RebalancePlan;
use crate::domain::screen::{ScreenResult, StockCandidate};

const INTERVAL_LABELS: [&str; 3] = ["Near  - 1 Month", "Med   - 3 Month", "Long  - 1 Year "];

pub fn stock_analysis_subject(date: NaiveDate) -> String {
    format!("{} Stock Analysis", date.format("%Y-%m-%d"))
}

pub fn rebalance_subject(date: NaiveDate) -> String {
    format!("{} Portfolio Rebalance", date.format("%Y-%m-%d"))
}

pub fn momentum_subject(date: NaiveDate) -> String {
    format!("{} Momentum", date.format("%Y-%m-%d"))
}

/// `1234567` → `1,234,567`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}

fn market_lines(market: &[IndexStatus]) -> Vec<String> {
    let mut lines = Vec::new();
    for status in market {
        lines.push(format!("Index: {}", status.ticker));
        for (label, regime) in INTERVAL_LABELS.iter().zip(status.regimes) {
            lines.push(format!("  {label} ------- {regime}"));
        }
        lines.push(String::new());
    }
    lines
}

fn candidate_table(candidates: &[StockCandidate]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<6} {:>6} {:>6} {:>6} {:>6}",
        "TKR", "ROCE", "COEF", "RANK", "STR"
    )];
    for c in candidates {
        lines.push(format!(
            "{:<6} {:>6.0} {:>6.0} {:>6.0} {:>6.2}",
            c.ticker, c.roce_current_year_rank, c.roce_growth_rank, c.final_rank, c.trend_strength
        ));
    }
    lines
}

fn side_block(title: &str, empty_label: &str, candidates: &[StockCandidate]) -> Vec<String> {
    let mut lines = vec![title.to_string(), "-".repeat(15)];
    if candidates.is_empty() {
        lines.push(format!("No {empty_label} positions identified today."));
        return lines;
    }
    lines.extend(candidate_table(candidates));
    lines.push(String::new());
    lines.push(format!("Total: {}", candidates.len()));
    let avg = candidates.iter().map(|c| c.final_rank).sum::<f64>() / candidates.len() as f64;
    lines.push(format!("Avg Rank: {avg:.0}"));
    lines
}

pub fn format_stock_analysis(date: NaiveDate, market: &[IndexStatus], result: &ScreenResult) -> String {
    let mut body = vec![
        format!("Stock Analysis - {}", date.format("%b %d, %Y")),
        "=".repeat(35),
        String::new(),
        "MARKET ANALYSIS".to_string(),
        "-".repeat(15),
    ];
    body.extend(market_lines(market));
    if market.is_empty() {
        body.push(String::new());
    }

    body.extend(side_block("LONG POSITIONS", "long", &result.long));
    body.push(String::new());
    body.extend(side_block("SHORT POSITIONS", "short", &result.short));

    body.push(String::new());
    body.push("-".repeat(35));
    body.push("Auto-generated report - Do not reply".to_string());
    body.join("\n")
}

pub fn format_portfolio_rebalance(date: NaiveDate, plan: &RebalancePlan) -> String {
    let rule = "-".repeat(40);
    let mut body = vec![
        "Portfolio Rebalance Analysis".to_string(),
        "=".repeat(40),
        format!("Date: {}", date.format("%Y-%m-%d")),
        format!("Value: ${}", group_thousands(plan.total_value.round() as i64)),
        String::new(),
        "Excluded Positions:".to_string(),
        rule.clone(),
    ];
    for excluded in &plan.excluded {
        body.push(format!("{:<6} {:.0}%", excluded.symbol, excluded.pct.round()));
    }

    body.push(String::new());
    body.push(format!("Sharpe Improvement: {:.1}%", plan.sharpe_improvement));
    body.push(String::new());
    body.push("Required Changes:".to_string());
    body.push(rule.clone());
    body.push(format!("{:<6} {:>11} {:>12}", "Stock", "Cur->Tgt", "Change"));
    body.push(rule.clone());
    for change in &plan.changes {
        let pct = format!(
            "{:.0} -> {:.0}%",
            change.current_pct.trunc(),
            change.ideal_pct.trunc()
        );
        body.push(format!(
            "{:<6} {:>11} {:>12}",
            change.symbol,
            pct,
            group_thousands(change.cash_change as i64)
        ));
    }
    body.push(rule);
    body.push(format!(
        "{:<6} {:>11} {:>12}",
        "Total",
        "",
        group_thousands(plan.net_cash_change().round() as i64)
    ));
    body.join("\n")
}

pub fn format_momentum(
    date: NaiveDate,
    dual: Option<&DualMomentum>,
    sectors: &[SectorMomentum],
    leaders: &[SectorLeaders],
) -> String {
    let rule = "-".repeat(40);
    let mut body = vec![
        format!("Momentum Analysis - {}", date.format("%b %d, %Y")),
        "=".repeat(40),
        String::new(),
        "DUAL MOMENTUM".to_string(),
        rule.clone(),
    ];
    match dual {
        Some(d) => {
            body.push(format!("SP500 12-month return: {:.2}%", d.us_return));
            body.push(format!("International 12-month return: {:.2}%", d.international_return));
            body.push(format!("Risk-free return: {:.2}%", d.risk_free_rate));
            body.push(format!("Recommended investment: {}", d.allocation));
        }
        None => body.push("No risk-free rate available, allocation skipped.".to_string()),
    }

    body.push(String::new());
    body.push("SECTOR MOMENTUM".to_string());
    body.push(rule.clone());
    body.push(format!("{:<5} {:<24} {:>9} {:>9}", "ETF", "Sector", "Return", "Risk-Adj"));
    for s in sectors {
        body.push(format!(
            "{:<5} {:<24} {:>8.2}% {:>9.2}",
            s.symbol, s.sector, s.momentum.total_return, s.momentum.risk_adjusted
        ));
    }
    if let Some(top) = sectors.first() {
        body.push(format!("Top by return: {} ({})", top.sector, top.symbol));
    }
    if let Some(top) = top_risk_adjusted(sectors) {
        body.push(format!("Top risk-adjusted: {} ({})", top.sector, top.symbol));
    }

    for leader in leaders {
        body.push(String::new());
        body.push(format!("{} ({})", leader.sector.to_uppercase(), leader.symbol));
        body.push(rule.clone());
        if leader.stocks.is_empty() {
            body.push("No stocks with enough history.".to_string());
            continue;
        }
        for stock in &leader.stocks {
            body.push(format!(
                "{:<6} {:>8.2}% {:>9.2}",
                stock.ticker, stock.momentum.total_return, stock.momentum.risk_adjusted
            ));
        }
    }

    body.push(String::new());
    body.push(rule);
    body.push("Auto-generated report - Do not reply".to_string());
    body.join("\n")
}
