//! Fundamentals from a single CSV file, one row per company and fiscal year:
//! `ticker,sector,market_cap,price,year,revenue,operating_income,total_assets,total_current_liabilities`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::domain::error::ScreenerError;
use crate::domain::ranking::{AnnualStatement, CompanyProfile};
use crate::ports::fundamentals_port::FundamentalsPort;

#[derive(Debug, Deserialize)]
struct FundamentalsRow {
    ticker: String,
    sector: String,
    market_cap: f64,
    price: f64,
    year: i32,
    revenue: f64,
    operating_income: f64,
    total_assets: f64,
    total_current_liabilities: f64,
}

pub struct FundamentalsCsvAdapter {
    companies: Vec<CompanyProfile>,
    statements: HashMap<String, Vec<AnnualStatement>>,
}

impl FundamentalsCsvAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScreenerError> {
        let rdr = csv::Reader::from_path(path.as_ref())?;
        Self::from_reader(rdr)
    }

    pub fn from_string(content: &str) -> Result<Self, ScreenerError> {
        Self::from_reader(csv::Reader::from_reader(content.as_bytes()))
    }

    fn from_reader<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Self, ScreenerError> {
        let mut companies = Vec::new();
        let mut statements: HashMap<String, Vec<AnnualStatement>> = HashMap::new();

        for row in rdr.deserialize::<FundamentalsRow>() {
            let row = row?;
            let ticker = row.ticker.trim().to_uppercase();
            if !statements.contains_key(&ticker) {
                companies.push(CompanyProfile {
                    ticker: ticker.clone(),
                    sector: row.sector.trim().to_string(),
                    market_cap: row.market_cap,
                    price: row.price,
                });
            }
            statements.entry(ticker).or_default().push(AnnualStatement {
                year: row.year,
                revenue: row.revenue,
                operating_income: row.operating_income,
                total_assets: row.total_assets,
                total_current_liabilities: row.total_current_liabilities,
            });
        }

        tracing::debug!(companies = companies.len(), "fundamentals loaded");
        Ok(Self {
            companies,
            statements,
        })
    }
}

impl FundamentalsPort for FundamentalsCsvAdapter {
    fn list_companies(&self, limit: usize) -> Result<Vec<CompanyProfile>, ScreenerError> {
        Ok(self.companies.iter().take(limit).cloned().collect())
    }

    fn annual_statements(&self, ticker: &str) -> Result<Vec<AnnualStatement>, ScreenerError> {
        self.statements
            .get(ticker)
            .cloned()
            .ok_or_else(|| ScreenerError::NoData {
                ticker: ticker.to_string(),
            })
    }
}
