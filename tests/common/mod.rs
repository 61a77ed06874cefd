#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Mutex;
pub use trendscreen::domain::error::ScreenerError;
pub use trendscreen::domain::ohlcv::OhlcvBar;
use trendscreen::domain::ranking::{AnnualStatement, CompanyProfile};
use trendscreen::ports::data_port::DataPort;
use trendscreen::ports::fundamentals_port::FundamentalsPort;
use trendscreen::ports::notifier_port::{Notification, NotifierPort};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(ScreenerError::DataFetch {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| b.date >= start_date && b.date <= end_date)
                .cloned()
                .collect()),
            None => Err(ScreenerError::NoData {
                ticker: ticker.to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MockFundamentalsPort {
    pub companies: Vec<CompanyProfile>,
    pub statements: HashMap<String, Vec<AnnualStatement>>,
}

impl MockFundamentalsPort {
    pub fn with_company(mut self, ticker: &str, sector: &str, statements: Vec<AnnualStatement>) -> Self {
        self.companies.push(CompanyProfile {
            ticker: ticker.to_string(),
            sector: sector.to_string(),
            market_cap: 1e9,
            price: 50.0,
        });
        self.statements.insert(ticker.to_string(), statements);
        self
    }
}

impl FundamentalsPort for MockFundamentalsPort {
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

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: bool,
}

impl NotifierPort for RecordingNotifier {
    fn send(&self, notification: &Notification) -> Result<(), ScreenerError> {
        if self.fail {
            return Err(ScreenerError::Delivery {
                reason: "relay unavailable".into(),
            });
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Four fiscal years where a higher `quality` improves every metric.
pub fn statements(quality: f64) -> Vec<AnnualStatement> {
    (0..4)
        .map(|k| {
            let k = k as f64;
            let revenue = 1_000.0 * (1.0 + 0.02 * quality).powf(k);
            AnnualStatement {
                year: 2020 + k as i32,
                revenue,
                operating_income: revenue * (0.05 + 0.01 * quality * (k + 1.0)),
                total_assets: 2_000.0,
                total_current_liabilities: 500.0,
            }
        })
        .collect()
}

/// Bars ending on `end`, one per calendar day.
pub fn bars_ending(ticker: &str, end: NaiveDate, closes: &[f64], volumes: &[i64]) -> Vec<OhlcvBar> {
    let n = closes.len() as i64;
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| OhlcvBar {
            ticker: ticker.to_string(),
            date: end - Duration::days(n - 1 - i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        })
        .collect()
}

/// A choppy base followed by a rise with a late volume spike.
pub fn breakout(ticker: &str, end: NaiveDate) -> Vec<OhlcvBar> {
    let mut closes: Vec<f64> = (0..40)
        .map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 })
        .collect();
    closes.extend([100.6, 101.0, 101.3, 101.5, 101.8, 101.9]);
    let mut volumes = vec![1_000; closes.len()];
    let n = volumes.len();
    volumes[n - 2] = 5_000;
    bars_ending(ticker, end, &closes, &volumes)
}

/// A steady decline.
pub fn decline(ticker: &str, end: NaiveDate) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..46).map(|i| 200.0 - i as f64).collect();
    bars_ending(ticker, end, &closes, &vec![1_000; closes.len()])
}
