//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_store::{read_records, write_records};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::fundamentals_csv::FundamentalsCsvAdapter;
use crate::adapters::outbox_notifier::OutboxNotifier;
use crate::adapters::portfolio_csv::read_portfolio;
use crate::domain::config::ScreenerConfig;
use crate::domain::config_validation::{read_indicator_weights, read_ranking_weights, validate_config};
use crate::domain::error::ScreenerError;
use crate::domain::momentum::{dual_momentum, leading_sector_stocks, sector_momentum};
use crate::domain::portfolio::rebalance;
use crate::domain::rank_filter::Side;
use crate::domain::ranking::RankedStock;
use crate::domain::report::{
    format_momentum, format_portfolio_rebalance, format_stock_analysis, momentum_subject,
    rebalance_subject, stock_analysis_subject,
};
use crate::domain::screen::{
    build_pool, is_rebalance_day, market_overview, portfolio_variances, rank_stocks, screen,
    REBALANCE_HISTORY_DAYS,
};
use crate::domain::trend::score_trend;
use crate::logging::init_logging;
use crate::ports::data_port::DataPort;
use crate::ports::fundamentals_port::FundamentalsPort;
use crate::ports::notifier_port::{Notification, NotifierPort};

#[derive(Parser, Debug)]
#[command(name = "trendscreen", about = "Fundamental and trend stock screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank the fundamentals universe and write the stock scores file
    Rank {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Screen ranked stocks for long and short candidates
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        /// Run the portfolio rebalance analysis regardless of weekday
        #[arg(long)]
        rebalance: bool,
        /// Re-rank before screening instead of reading the scores file
        #[arg(long)]
        rank: bool,
        /// As-of date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Portfolio rebalance analysis only
    Rebalance {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the trend breakdown for one ticker
    Score {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long, value_enum, default_value_t = SideArg::Long)]
        side: SideArg,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Dual momentum allocation, sector ETF momentum and leading-sector stocks
    Momentum {
        #[arg(short, long)]
        config: PathBuf,
        /// Annual risk-free yield in percent, overrides [momentum] risk_free_rate
        #[arg(long)]
        risk_free_rate: Option<f64>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideArg {
    Long,
    Short,
}

impl From<SideArg> for Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Long => Side::Long,
            SideArg::Short => Side::Short,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Rank { config } => run_rank(&config),
        Command::Screen {
            config,
            rebalance,
            rank,
            date,
        } => run_screen(&config, rebalance, rank, as_of(date)),
        Command::Rebalance { config, date } => run_rebalance(&config, as_of(date)),
        Command::Validate { config } => run_validate(&config),
        Command::Score {
            config,
            ticker,
            side,
            date,
        } => run_score(&config, &ticker, side.into(), as_of(date)),
        Command::Momentum {
            config,
            risk_free_rate,
            date,
        } => run_momentum(&config, risk_free_rate, as_of(date)),
    }
}

fn as_of(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

fn fail(e: &ScreenerError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// Parses, validates and resolves the configuration, then starts logging.
fn load_screener_config(path: &Path) -> Result<ScreenerConfig, ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    let config = ScreenerConfig::from_port(&adapter).map_err(|e| fail(&e))?;
    init_logging(&config.logging);
    Ok(config)
}

fn rank_and_store(config: &ScreenerConfig) -> Result<Vec<RankedStock>, ScreenerError> {
    let fundamentals = FundamentalsCsvAdapter::from_file(&config.paths.fundamentals)?;
    let pool = build_pool(config.analysis.workers)?;
    let ranked = rank_stocks(
        &fundamentals,
        config.analysis.stock_limit,
        &config.analysis.weights,
        &pool,
    )?;
    write_records(&config.paths.stock_scores, &ranked)?;
    Ok(ranked)
}

fn run_rank(config_path: &Path) -> ExitCode {
    let config = match load_screener_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match rank_and_store(&config) {
        Ok(ranked) => {
            println!(
                "Ranked {} stocks -> {}",
                ranked.len(),
                config.paths.stock_scores.display()
            );
            for stock in ranked.iter().take(10) {
                println!(
                    "  {:>6.0}  {:<6} {:<24} score {:.1}",
                    stock.final_rank, stock.ticker, stock.sector, stock.final_score
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Sends a report. Delivery problems are logged and do not fail the run.
fn deliver(notifier: &dyn NotifierPort, config: &ScreenerConfig, subject: String, body: String) {
    let notification = Notification {
        subject,
        body,
        recipients: config.email.recipients.clone(),
    };
    if let Err(e) = notifier.send(&notification) {
        tracing::error!(subject = %notification.subject, error = %e, "report delivery failed");
        eprintln!("warning: {e}");
    }
}

fn screen_pipeline(
    config: &ScreenerConfig,
    force_rebalance: bool,
    rerank: bool,
    date: NaiveDate,
) -> Result<(), ScreenerError> {
    let ranked: Vec<RankedStock> = if rerank {
        rank_and_store(config)?
    } else {
        read_records(&config.paths.stock_scores)?
    };
    if ranked.is_empty() {
        return Err(ScreenerError::NoData {
            ticker: "stock scores".into(),
        });
    }
    eprintln!("Screening {} ranked stocks as of {}", ranked.len(), date);

    let data = CsvAdapter::new(config.paths.price_data.clone());
    let pool = build_pool(config.analysis.workers)?;
    let result = screen(
        &ranked,
        [&config.long, &config.short],
        &config.portfolio,
        &data,
        date,
        &pool,
    );

    write_records(&config.paths.investing_stocks, &result.long)?;
    write_records(&config.paths.short_stocks, &result.short)?;
    println!(
        "Long candidates: {} -> {}",
        result.long.len(),
        config.paths.investing_stocks.display()
    );
    println!(
        "Short candidates: {} -> {}",
        result.short.len(),
        config.paths.short_stocks.display()
    );

    let market = market_overview(&data, &config.market_indexes, date);
    let notifier = OutboxNotifier::new(config.paths.outbox.clone(), config.email.sender.clone());
    deliver(
        &notifier,
        config,
        stock_analysis_subject(date),
        format_stock_analysis(date, &market, &result),
    );

    if force_rebalance || is_rebalance_day(date) {
        rebalance_pipeline(config, &data, &notifier, date)?;
    } else {
        tracing::info!(%date, "not a rebalance day, skipping portfolio analysis");
    }
    Ok(())
}

fn rebalance_pipeline(
    config: &ScreenerConfig,
    data: &dyn DataPort,
    notifier: &dyn NotifierPort,
    date: NaiveDate,
) -> Result<(), ScreenerError> {
    let portfolio = read_portfolio(&config.paths.portfolio_file)?;
    let pool = build_pool(config.analysis.workers)?;
    let variances = portfolio_variances(
        &portfolio,
        &config.portfolio,
        data,
        date,
        REBALANCE_HISTORY_DAYS,
        &pool,
    );
    let plan = rebalance(&portfolio, &variances, &config.portfolio)?;

    println!(
        "Rebalance: {} holdings, {} changes, Sharpe improvement {:.1}%",
        portfolio.holding_count(),
        plan.changes.len(),
        plan.sharpe_improvement
    );
    deliver(
        notifier,
        config,
        rebalance_subject(date),
        format_portfolio_rebalance(date, &plan),
    );
    Ok(())
}

fn run_screen(config_path: &Path, force_rebalance: bool, rerank: bool, date: NaiveDate) -> ExitCode {
    let config = match load_screener_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match screen_pipeline(&config, force_rebalance, rerank, date) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_rebalance(config_path: &Path, date: NaiveDate) -> ExitCode {
    let config = match load_screener_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data = CsvAdapter::new(config.paths.price_data.clone());
    let notifier = OutboxNotifier::new(config.paths.outbox.clone(), config.email.sender.clone());
    match rebalance_pipeline(&config, &data, &notifier, date) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        return fail(&e);
    }

    println!("Configuration OK: {}", config_path.display());
    for side in Side::ALL {
        let weights = read_indicator_weights(&adapter, side);
        println!("  {side} indicator weights sum: {:.4}", weights.sum());
    }
    println!(
        "  ranking weights sum: {:.4}",
        read_ranking_weights(&adapter).sum()
    );
    ExitCode::SUCCESS
}

fn run_score(config_path: &Path, ticker: &str, side: Side, date: NaiveDate) -> ExitCode {
    let config = match load_screener_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let filter = config.side(side);
    let ticker = ticker.to_uppercase();
    let start = date - chrono::Duration::days(i64::from(filter.trend.thresholds.history_days));
    let data = CsvAdapter::new(config.paths.price_data.clone());

    let bars = match data.fetch_ohlcv(&ticker, start, date) {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };
    let breakdown = match score_trend(&ticker, &bars, &filter.trend, side.trend_direction()) {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };

    println!("{ticker} ({side}) as of {date}, {} bars", bars.len());
    for (name, value) in breakdown.entries() {
        println!("  {name:<10} {value:.2}");
    }
    let total = breakdown.total();
    println!("  {:<10} {total:.2}", "total");
    let verdict = if total >= filter.trend.min_score {
        "signal"
    } else {
        "no signal"
    };
    println!("  min_score {:.2}: {verdict}", filter.trend.min_score);
    ExitCode::SUCCESS
}

fn momentum_pipeline(
    config: &ScreenerConfig,
    risk_free_rate: Option<f64>,
    date: NaiveDate,
) -> Result<(), ScreenerError> {
    let data = CsvAdapter::new(config.paths.price_data.clone());
    let pool = build_pool(config.analysis.workers)?;
    let settings = &config.momentum;

    let dual = match risk_free_rate.or(settings.risk_free_rate) {
        Some(rate) if rate.is_finite() => Some(dual_momentum(&data, date, rate)?),
        Some(rate) => {
            return Err(ScreenerError::invalid(
                "momentum",
                "risk_free_rate",
                format!("'{rate}' is not a finite number"),
            ))
        }
        None => {
            tracing::warn!("no risk-free rate configured, skipping dual momentum");
            None
        }
    };
    if let Some(d) = &dual {
        println!(
            "Dual momentum: SPY {:.2}%, VEU {:.2}%, risk-free {:.2}% -> {}",
            d.us_return, d.international_return, d.risk_free_rate, d.allocation
        );
    }

    let sectors = sector_momentum(&data, date, settings, &pool)?;
    for s in &sectors {
        println!(
            "  {:<5} {:<24} {:>8.2}% {:>7.2}",
            s.symbol, s.sector, s.momentum.total_return, s.momentum.risk_adjusted
        );
    }

    let fundamentals = FundamentalsCsvAdapter::from_file(&config.paths.fundamentals)?;
    let companies = fundamentals.list_companies(config.analysis.stock_limit)?;
    let leaders = leading_sector_stocks(&sectors, &companies, &data, date, settings, &pool);
    for leader in &leaders {
        let top = leader.stocks.first().map(|s| s.ticker.as_str()).unwrap_or("-");
        println!("Leading sector {} ({}): top stock {top}", leader.sector, leader.symbol);
    }

    let notifier = OutboxNotifier::new(config.paths.outbox.clone(), config.email.sender.clone());
    deliver(
        &notifier,
        config,
        momentum_subject(date),
        format_momentum(date, dual.as_ref(), &sectors, &leaders),
    );
    Ok(())
}

fn run_momentum(config_path: &Path, risk_free_rate: Option<f64>, date: NaiveDate) -> ExitCode {
    let config = match load_screener_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match momentum_pipeline(&config, risk_free_rate, date) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}
