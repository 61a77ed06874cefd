//! Brokerage positions export reader.
//!
//! The export starts with three preamble lines, then a header row. Only
//! `Equity` rows are kept; market values look like `$1,234.56`.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::domain::error::ScreenerError;
use crate::domain::portfolio::{Holding, Portfolio};

const PREAMBLE_LINES: usize = 3;
const SYMBOL: &str = "Symbol";
const SECURITY_TYPE: &str = "Security Type";
const MARKET_VALUE: &str = "Mkt Val (Market Value)";

/// `"$1,234.56"` → `1234.56`. Blank or `--` values are `None`.
pub fn parse_money(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.parse().ok()
}

fn column(headers: &StringRecord, name: &str) -> Result<usize, ScreenerError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| ScreenerError::NoData {
            ticker: format!("portfolio column '{name}'"),
        })
}

pub fn read_portfolio<P: AsRef<Path>>(path: P) -> Result<Portfolio, ScreenerError> {
    let content = fs::read_to_string(path.as_ref())?;
    parse_portfolio(&content)
}

pub fn parse_portfolio(content: &str) -> Result<Portfolio, ScreenerError> {
    let body: String = content
        .lines()
        .skip(PREAMBLE_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());
    let headers = rdr.headers()?.clone();
    let symbol_idx = column(&headers, SYMBOL)?;
    let type_idx = column(&headers, SECURITY_TYPE)?;
    let value_idx = column(&headers, MARKET_VALUE)?;

    let mut holdings = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.get(type_idx).map(str::trim) != Some("Equity") {
            continue;
        }
        let Some(symbol) = record.get(symbol_idx).map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        match record.get(value_idx).and_then(parse_money) {
            Some(market_value) => holdings.push(Holding {
                symbol: symbol.to_uppercase(),
                market_value,
            }),
            None => tracing::warn!(%symbol, "unreadable market value, holding skipped"),
        }
    }

    tracing::debug!(holdings = holdings.len(), "portfolio loaded");
    Ok(Portfolio::new(holdings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EXPORT: &str = "\
\"Positions for account Individual as of 06:00 PM ET, 2024/06/03\"
\"\"
\"\"
\"Symbol\",\"Description\",\"Qty (Quantity)\",\"Mkt Val (Market Value)\",\"Security Type\"
\"AAPL\",\"APPLE INC\",\"10\",\"$1,905.00\",\"Equity\"
\"SPY\",\"SPDR S&P 500\",\"5\",\"$2,650.50\",\"Equity\"
\"SWVXX\",\"MONEY FUND\",\"100\",\"$100.00\",\"Cash and Money Market\"
\"BAD\",\"BROKEN\",\"1\",\"--\",\"Equity\"
\"Account Total\",\"--\",\"--\",\"$4,655.50\"
";

    #[test]
    fn parse_money_strips_symbols() {
        assert_eq!(parse_money("$1,234.56"), Some(1234.56));
        assert_eq!(parse_money(" 42 "), Some(42.0));
        assert_eq!(parse_money("--"), None);
        assert_eq!(parse_money(""), None);
    }

    #[test]
    fn keeps_only_equities_with_values() {
        let portfolio = parse_portfolio(EXPORT).unwrap();
        let symbols: Vec<&str> = portfolio.holdings.iter().map(|h| h.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "SPY"]);
        assert!((portfolio.total_value() - 4555.5).abs() < 1e-9);
    }

    #[test]
    fn missing_column_is_reported() {
        let content = "a\nb\nc\nSymbol,Security Type\nAAPL,Equity\n";
        let err = parse_portfolio(content).unwrap_err();
        assert!(matches!(err, ScreenerError::NoData { .. }));
    }

    #[test]
    fn reads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{EXPORT}").unwrap();
        let portfolio = read_portfolio(file.path()).unwrap();
        assert_eq!(portfolio.holding_count(), 2);
    }
}
