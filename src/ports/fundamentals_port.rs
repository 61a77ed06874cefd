//! Fundamentals provider port trait.

use crate::domain::error::ScreenerError;
use crate::domain::ranking::{AnnualStatement, CompanyProfile};

pub trait FundamentalsPort: Send + Sync {
    /// The screenable universe, in provider order, at most `limit` companies.
    fn list_companies(&self, limit: usize) -> Result<Vec<CompanyProfile>, ScreenerError>;

    /// Annual income statement / balance sheet figures, any order.
    fn annual_statements(&self, ticker: &str) -> Result<Vec<AnnualStatement>, ScreenerError>;
}
