//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::security_csv::read_securities_file;
use crate::adapters::sharesight::{SharesightClient, SharesightConfig};
use crate::adapters::yahoo_adapter::YahooPriceAdapter;
use crate::domain::allocation::{build_allocation, Allocation};
use crate::domain::cadence::Cadence;
use crate::domain::config_validation::{validate_schedule_config, validate_sharesight_config};
use crate::domain::enrichment::fill_missing_fields;
use crate::domain::error::DcaError;
use crate::domain::scheduler::{
    plan_orders, schedule_and_submit, ScheduleReport, ScheduleRequest, DEFAULT_FIXED_FEE,
    DEFAULT_MARKET,
};
use crate::domain::security::SecurityRow;
use crate::ports::config_port::ConfigPort;
use crate::ports::fundamentals_port::FundamentalsLookup;
use crate::ports::order_port::OrderSubmission;
use crate::ports::portfolio_port::PortfolioDirectory;
use crate::ports::price_port::PriceLookup;

pub const DEFAULT_TOTAL_CAPITAL: f64 = 100_000.0;

#[derive(Parser, Debug)]
#[command(
    name = "valuedca",
    about = "Value-weighted portfolio builder and periodic buy scheduler for Sharesight"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all portfolios
    ListPortfolios,
    /// List holdings of a portfolio
    ListHoldings { portfolio_id: i64 },
    /// Create a new portfolio
    CreatePortfolio { name: String },
    /// Delete a portfolio
    DeletePortfolio { portfolio_id: i64 },
    /// Build a value-weighted portfolio from a CSV and optionally schedule its buys
    BuildPortfolio {
        file: PathBuf,
        #[command(flatten)]
        schedule: ScheduleArgs,
        /// Preview the orders without submitting them
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Schedule values; anything left unset is prompted for.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ScheduleArgs {
    #[arg(long)]
    pub portfolio_id: Option<i64>,
    #[arg(long)]
    pub capital: Option<f64>,
    /// First buy date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last possible buy date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// weekly, monthly, quarterly, semi-annual or annual
    #[arg(long)]
    pub cadence: Option<Cadence>,
}

/// Schedule settings that come from the config file rather than prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDefaults {
    pub total_capital: f64,
    pub fixed_fee: f64,
    pub market: String,
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = match cli.command {
        Command::ListPortfolios => connect(&config).and_then(|c| run_list_portfolios(&c)),
        Command::ListHoldings { portfolio_id } => {
            connect(&config).and_then(|c| run_list_holdings(&c, portfolio_id))
        }
        Command::CreatePortfolio { name } => connect(&config).and_then(|c| {
            c.create_portfolio(&name)?;
            println!("Portfolio created successfully.");
            Ok(ExitCode::SUCCESS)
        }),
        Command::DeletePortfolio { portfolio_id } => connect(&config).and_then(|c| {
            c.delete_portfolio(portfolio_id)?;
            println!("Portfolio deleted successfully.");
            Ok(ExitCode::SUCCESS)
        }),
        Command::BuildPortfolio {
            file,
            schedule,
            dry_run,
            yes,
        } => run_build_portfolio(&config, &file, &schedule, dry_run, yes),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, ExitCode> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn connect(config: &dyn ConfigPort) -> Result<SharesightClient, DcaError> {
    validate_sharesight_config(config)?;
    SharesightClient::connect(SharesightConfig::from_config(config)?)
}

fn run_list_portfolios(directory: &dyn PortfolioDirectory) -> Result<ExitCode, DcaError> {
    let portfolios = directory.list_portfolios()?;
    println!("Your Portfolios:");
    for p in &portfolios {
        println!("- {} (ID: {})", p.name, p.id);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_list_holdings(
    directory: &dyn PortfolioDirectory,
    portfolio_id: i64,
) -> Result<ExitCode, DcaError> {
    let holdings = directory.list_holdings(portfolio_id)?;
    println!("Holdings in portfolio {portfolio_id}:");
    for h in &holdings {
        if h.market.is_empty() {
            println!("- {} ({} - ID: {})", h.name, h.code, h.id);
        } else {
            println!("- {} ({}.{} - ID: {})", h.name, h.code, h.market, h.id);
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn build_schedule_defaults(config: &dyn ConfigPort) -> Result<ScheduleDefaults, DcaError> {
    validate_schedule_config(config)?;
    Ok(ScheduleDefaults {
        total_capital: config.get_double("schedule", "total_capital", DEFAULT_TOTAL_CAPITAL),
        fixed_fee: config.get_double("schedule", "fixed_fee", DEFAULT_FIXED_FEE),
        market: config
            .get_string("schedule", "market")
            .unwrap_or_else(|| DEFAULT_MARKET.to_string())
            .to_uppercase(),
    })
}

pub fn build_price_lookup(config: &dyn ConfigPort) -> Result<Box<dyn PriceLookup>, DcaError> {
    let source = config
        .get_string("prices", "source")
        .unwrap_or_else(|| "yahoo".to_string())
        .to_lowercase();
    let market = config
        .get_string("schedule", "market")
        .unwrap_or_else(|| DEFAULT_MARKET.to_string())
        .to_uppercase();

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_string("prices", "csv_dir")
                .ok_or_else(|| DcaError::ConfigMissing {
                    section: "prices".to_string(),
                    key: "csv_dir".to_string(),
                })?;
            tracing::info!(%dir, "using CSV price files");
            Ok(Box::new(CsvPriceAdapter::new(PathBuf::from(dir), &market)))
        }
        "yahoo" => Ok(Box::new(YahooPriceAdapter::new(&symbol_suffix(config))?)),
        other => Err(DcaError::ConfigInvalid {
            section: "prices".to_string(),
            key: "source".to_string(),
            reason: format!("unknown price source '{other}'"),
        }),
    }
}

fn symbol_suffix(config: &dyn ConfigPort) -> String {
    config
        .get_string("prices", "symbol_suffix")
        .unwrap_or_else(|| ".AX".to_string())
}

/// Yahoo fundamentals source, or `None` when `[fundamentals] lookup` is off.
pub fn build_fundamentals_lookup(
    config: &dyn ConfigPort,
) -> Result<Option<Box<dyn FundamentalsLookup>>, DcaError> {
    if !config.get_bool("fundamentals", "lookup", true) {
        tracing::info!("fundamentals lookup disabled; using CSV values only");
        return Ok(None);
    }
    Ok(Some(Box::new(YahooPriceAdapter::new(&symbol_suffix(config))?)))
}

/// Fill the fields the CSV leaves empty, then score and weight the rows.
pub fn prepare_allocation(
    rows: Vec<SecurityRow>,
    fundamentals: Option<&dyn FundamentalsLookup>,
) -> Result<Allocation, DcaError> {
    let rows = match fundamentals {
        Some(lookup) => fill_missing_fields(rows, lookup),
        None => rows,
    };
    build_allocation(rows)
}

fn run_build_portfolio(
    config: &dyn ConfigPort,
    file: &Path,
    args: &ScheduleArgs,
    dry_run: bool,
    yes: bool,
) -> Result<ExitCode, DcaError> {
    let defaults = build_schedule_defaults(config)?;
    let rows = read_securities_file(file)?;
    let fundamentals = build_fundamentals_lookup(config)?;
    let allocation = prepare_allocation(rows, fundamentals.as_deref())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_allocation(&allocation, &mut out)?;

    let stdin = io::stdin();
    let mut input = stdin.lock();

    let question = if dry_run {
        "Do you want to preview the trade schedule?"
    } else {
        "Do you want to push the trades to Sharesight?"
    };
    if !yes && !confirm(question, false, &mut input, &mut out)? {
        return Ok(ExitCode::SUCCESS);
    }

    let request = resolve_schedule_request(args, &defaults, &mut input, &mut out)?;
    let prices = build_price_lookup(config)?;

    let report = if dry_run {
        run_schedule_pipeline(&allocation, &request, prices.as_ref(), None, &mut out)?
    } else {
        let client = connect(config)?;
        run_schedule_pipeline(
            &allocation,
            &request,
            prices.as_ref(),
            Some(&client as &dyn OrderSubmission),
            &mut out,
        )?
    };

    if report.has_failures() {
        Ok(ExitCode::from(3))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Schedule the allocation's buys and print the outcome.
///
/// With no submission port the schedule is only planned.
pub fn run_schedule_pipeline(
    allocation: &Allocation,
    request: &ScheduleRequest,
    prices: &dyn PriceLookup,
    orders: Option<&dyn OrderSubmission>,
    out: &mut dyn Write,
) -> Result<ScheduleReport, DcaError> {
    let (rows, weights) = allocation.split();
    if request.start_date > request.end_date {
        tracing::warn!(
            start = %request.start_date,
            end = %request.end_date,
            "start date is after end date; nothing to schedule"
        );
    }

    let report = match orders {
        Some(port) => schedule_and_submit(request, &rows, &weights, prices, port)?,
        None => {
            let report = plan_orders(request, &rows, &weights, prices)?;
            print_planned_orders(&report, out)?;
            report
        }
    };

    print_summary(&report, orders.is_none(), out)?;
    Ok(report)
}

pub fn print_allocation(allocation: &Allocation, out: &mut dyn Write) -> Result<(), DcaError> {
    writeln!(
        out,
        "{:<8} {:>10} {:>10} {:>8} {:>10} {:>8} {:>8}",
        "Ticker", "Value", "Price", "Yield%", "Stability%", "Score", "Weight%"
    )?;
    for e in &allocation.entries {
        let fmt_opt = |v: Option<f64>, scale: f64| match v {
            Some(v) => format!("{:.2}", v * scale),
            None => "-".to_string(),
        };
        writeln!(
            out,
            "{:<8} {:>10.2} {:>10} {:>8} {:>10} {:>8.4} {:>8.2}",
            e.row.ticker,
            e.row.value,
            fmt_opt(e.row.price, 1.0),
            fmt_opt(e.row.yield_pct, 1.0),
            fmt_opt(e.row.stability, 100.0),
            e.value_score,
            e.weight * 100.0,
        )?;
    }
    Ok(())
}

fn print_planned_orders(report: &ScheduleReport, out: &mut dyn Write) -> Result<(), DcaError> {
    writeln!(out, "\nPlanned orders:")?;
    for t in &report.tickers {
        for o in &t.submitted {
            writeln!(
                out,
                "  {}  {} {} x {:.4} @ {:.2} = {:.2}",
                o.unique_identifier,
                o.transaction_type,
                o.ticker,
                o.quantity,
                o.price,
                o.gross_value()
            )?;
        }
    }
    Ok(())
}

fn print_summary(report: &ScheduleReport, dry_run: bool, out: &mut dyn Write) -> Result<(), DcaError> {
    let verb = if dry_run { "planned" } else { "submitted" };
    writeln!(
        out,
        "\n=== Schedule Summary ({} dates, capital split {} ways per ticker) ===",
        report.dates.len(),
        report.buy_orders
    )?;
    for t in &report.tickers {
        writeln!(
            out,
            "  {:<8} {} {}, {} skipped, {} failed",
            t.ticker,
            t.submitted_count(),
            verb,
            t.skipped_count(),
            t.failed_count()
        )?;
        for s in &t.skipped {
            writeln!(out, "      skipped {}: {}", s.date, s.reason)?;
        }
        for f in &t.failed {
            writeln!(out, "      failed {}: {}", f.order.unique_identifier, f.reason)?;
        }
    }
    writeln!(
        out,
        "Total: {} {}, {} skipped, {} failed",
        report.submitted_count(),
        verb,
        report.skipped_count(),
        report.failed_count()
    )?;
    Ok(())
}

/// Yes/no question; an empty answer takes `default`.
pub fn confirm(
    question: &str,
    default: bool,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<bool, DcaError> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    loop {
        let answer = prompt_line(&format!("{question} {hint}"), input, out)?;
        match answer.to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(out, "Please answer y or n.")?,
        }
    }
}

fn prompt_line(prompt: &str, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<String, DcaError> {
    write!(out, "{prompt} ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(DcaError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed while prompting",
        )));
    }
    Ok(line.trim().to_string())
}

/// Prompt until `parse` accepts the answer; an empty answer takes `default`.
fn prompt_value<T, F>(
    prompt: &str,
    default: Option<T>,
    parse: F,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<T, DcaError>
where
    T: std::fmt::Display + Clone,
    F: Fn(&str) -> Result<T, String>,
{
    let full = match &default {
        Some(d) => format!("{prompt} [{d}]:"),
        None => format!("{prompt}:"),
    };
    loop {
        let answer = prompt_line(&full, input, out)?;
        if answer.is_empty() {
            if let Some(d) = &default {
                return Ok(d.clone());
            }
        }
        match parse(&answer) {
            Ok(v) => return Ok(v),
            Err(msg) => writeln!(out, "Error: {msg}")?,
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("'{s}' is not a YYYY-MM-DD date"))
}

/// Fill the schedule from flags, prompting for whatever is missing.
pub fn resolve_schedule_request(
    args: &ScheduleArgs,
    defaults: &ScheduleDefaults,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<ScheduleRequest, DcaError> {
    let portfolio_id = match args.portfolio_id {
        Some(id) => id,
        None => prompt_value(
            "Enter portfolio ID",
            None,
            |s| s.parse::<i64>().map_err(|_| format!("'{s}' is not a valid integer")),
            input,
            out,
        )?,
    };
    let total_capital = match args.capital {
        Some(c) => c,
        None => prompt_value(
            "Enter total capital",
            Some(defaults.total_capital),
            |s| match s.parse::<f64>() {
                Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
                _ => Err(format!("'{s}' is not a positive amount")),
            },
            input,
            out,
        )?,
    };
    let start_date = match args.start {
        Some(d) => d,
        None => prompt_value("Enter start date (YYYY-MM-DD)", None, parse_date, input, out)?,
    };
    let end_date = match args.end {
        Some(d) => d,
        None => prompt_value("Enter end date (YYYY-MM-DD)", None, parse_date, input, out)?,
    };
    let cadence = match args.cadence {
        Some(c) => c,
        None => prompt_value(
            "Enter periodic buy (weekly/monthly/quarterly/semi-annual/annual)",
            None,
            |s| s.parse::<Cadence>().map_err(|e| e.to_string()),
            input,
            out,
        )?,
    };

    let request = ScheduleRequest {
        total_capital,
        start_date,
        end_date,
        portfolio_id,
        cadence,
        fixed_fee: defaults.fixed_fee,
        market: defaults.market.clone(),
    };
    request.validate()?;
    Ok(request)
}
