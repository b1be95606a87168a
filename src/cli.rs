//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    parse_date, read_double, validate_policy_config, validate_simulation_config,
};
use crate::domain::error::PolicysimError;
use crate::domain::metrics::Metrics;
use crate::domain::policy::{build_policy, policy_names, Policy};
use crate::domain::runner::SimulationResult;
use crate::domain::simulation::{parse_policy_list, resolve_policies, SimulationConfig, SECTION};
use crate::domain::state::StartingPosition;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "policysim", about = "Trading policy simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate one policy and write its report
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        policy: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Simulate several policies on the same prices and compare them
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated policy tags (default: [simulation] policies)
        #[arg(short, long)]
        policies: Option<String>,
        /// Directory for per-policy reports
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// List registered policies
    ListPolicies,
    /// Validate a simulation configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// A finished run with its metrics.
#[derive(Debug, Clone)]
pub struct PolicyOutcome {
    pub result: SimulationResult,
    pub metrics: Metrics,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            policy,
            output,
            ticker,
        } => run_single(&config, &policy, output.as_ref(), ticker.as_deref()),
        Command::Compare {
            config,
            policies,
            output_dir,
            ticker,
        } => run_compare(
            &config,
            policies.as_deref(),
            output_dir.as_ref(),
            ticker.as_deref(),
        ),
        Command::ListPolicies => run_list_policies(),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PolicysimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Load and validate the config file, then build the run configuration.
fn prepare(
    config_path: &PathBuf,
    ticker_override: Option<&str>,
) -> Result<(FileConfigAdapter, SimulationConfig), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    let sim = validate_simulation_config(&adapter)
        .and_then(|()| build_simulation_config(&adapter, ticker_override))
        .map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        })?;
    Ok((adapter, sim))
}

fn run_single(
    config_path: &PathBuf,
    policy: &str,
    output_path: Option<&PathBuf>,
    ticker_override: Option<&str>,
) -> ExitCode {
    // Stage 1: Load and validate config
    let (adapter, mut sim) = match prepare(config_path, ticker_override) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    sim.policies = vec![policy.trim().to_lowercase()];

    // Stage 2: Fetch prices and simulate
    let data_port = CsvAdapter::new(sim.data_dir.clone());
    let outcome = match run_simulations(&data_port, &adapter, &sim) {
        Ok(mut outcomes) => match outcomes.pop() {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
            None => {
                eprintln!("error: no policy to run");
                return ExitCode::from(4);
            }
        },
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Print console summary to stderr
    print_summary(&outcome);

    // Stage 4: Write report
    let output = output_path.cloned().unwrap_or_else(|| {
        PathBuf::from(format!("{}_{}.csv", sim.ticker, outcome.result.tag))
    });
    match write_report(&CsvReportAdapter::new(), &outcome, &output) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            (&e).into()
        }
    }
}

fn run_compare(
    config_path: &PathBuf,
    policies_override: Option<&str>,
    output_dir: Option<&PathBuf>,
    ticker_override: Option<&str>,
) -> ExitCode {
    let (adapter, mut sim) = match prepare(config_path, ticker_override) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    if let Some(list) = policies_override {
        sim.policies = match parse_policy_list(list) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
    }

    let data_port = CsvAdapter::new(sim.data_dir.clone());
    let results = match run_simulations(&data_port, &adapter, &sim) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut outcomes = Vec::with_capacity(results.len());
    let mut first_error = None;
    for (name, result) in sim.policies.iter().zip(results) {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                eprintln!("warning: skipping {} ({})", name, e);
                first_error.get_or_insert(e);
            }
        }
    }

    if outcomes.is_empty() {
        return match first_error {
            Some(e) => (&e).into(),
            None => ExitCode::from(4),
        };
    }

    println!("{}", format_comparison_table(&outcomes));

    if let Some(dir) = output_dir {
        let reporter = CsvReportAdapter::new();
        for outcome in &outcomes {
            let path = dir.join(format!("{}_{}.csv", sim.ticker, outcome.result.tag));
            if let Err(e) = write_report(&reporter, outcome, &path) {
                eprintln!("error: failed to write report: {e}");
                return (&e).into();
            }
        }
        eprintln!("\nReports written to: {}", dir.display());
    }

    ExitCode::SUCCESS
}

fn run_list_policies() -> ExitCode {
    for name in policy_names() {
        println!("{}", name);
    }
    eprintln!("{} policies registered", policy_names().len());
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let (adapter, sim) = match prepare(config_path, None) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    if let Err(e) = validate_policy_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("\nSimulation:");
    eprintln!("  ticker:   {}", sim.ticker);
    eprintln!("  window:   {} to {}", sim.start_date, sim.end_date);
    eprintln!("  data:     {}", sim.data_dir.display());
    eprintln!(
        "  position: {} shares @ {:.2}, cash {:.2}",
        sim.start.shares, sim.start.avg_cost, sim.start.cash
    );

    eprintln!("\nPolicies:");
    for name in &sim.policies {
        match build_policy(name, &adapter) {
            Ok(policy) => eprintln!("  {}: {}", name, policy.display_name()),
            Err(e) => {
                eprintln!("  error: {e}");
                return (&e).into();
            }
        }
    }

    let known = policy_names();
    for section in adapter.sections() {
        if section != SECTION && !known.contains(&section.as_str()) {
            eprintln!("  warning: section [{section}] is not used by any policy");
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

pub fn build_simulation_config(
    adapter: &dyn ConfigPort,
    ticker_override: Option<&str>,
) -> Result<SimulationConfig, PolicysimError> {
    let ticker = match ticker_override {
        Some(t) => t.trim().to_uppercase(),
        None => adapter
            .get_string(SECTION, "ticker")
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PolicysimError::ConfigMissing {
                section: SECTION.into(),
                key: "ticker".into(),
            })?,
    };

    let start_date = parse_date(adapter.get_string(SECTION, "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(adapter.get_string(SECTION, "end_date").as_deref(), "end_date")?;

    let start = StartingPosition::new(
        read_double(adapter, SECTION, "shares", 0.0)?,
        read_double(adapter, SECTION, "avg_price", 0.0)?,
        read_double(adapter, SECTION, "cash", 0.0)?,
    );

    let initial_investment = adapter
        .get_double(SECTION, "initial_investment")
        .map_err(|_| PolicysimError::ConfigInvalid {
            section: SECTION.into(),
            key: "initial_investment".into(),
            reason: "initial_investment must be a number".into(),
        })?;

    Ok(SimulationConfig {
        ticker,
        start_date,
        end_date,
        data_dir: adapter
            .get_string(SECTION, "data_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data")),
        start,
        initial_investment,
        policies: resolve_policies(adapter)?,
    })
}

/// Fetch prices once and run every configured policy over them in parallel.
/// The outer error covers data and setup failures; per-policy failures are
/// returned in place, in `sim.policies` order.
pub fn run_simulations(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    sim: &SimulationConfig,
) -> Result<Vec<Result<PolicyOutcome, PolicysimError>>, PolicysimError> {
    let policies = sim.build_policies(config)?;

    let prices = data_port.fetch_prices(&sim.ticker, sim.start_date, sim.end_date)?;
    eprintln!(
        "Running {} {}: {} ticks, {} to {}",
        policies.len(),
        if policies.len() == 1 { "policy" } else { "policies" },
        prices.len(),
        sim.start_date,
        sim.end_date,
    );

    let runner = sim.runner(&prices)?;
    Ok(runner
        .run_all(&policies)
        .into_iter()
        .map(|result| {
            let result = result?;
            let metrics = Metrics::from_result(&result)?;
            Ok(PolicyOutcome { result, metrics })
        })
        .collect())
}

pub fn write_report(
    reporter: &dyn ReportPort,
    outcome: &PolicyOutcome,
    path: &Path,
) -> Result<(), PolicysimError> {
    reporter.write(&outcome.result, &outcome.metrics, path)
}

fn print_summary(outcome: &PolicyOutcome) {
    let m = &outcome.metrics;
    eprintln!("\n=== {} ===", outcome.result.policy);
    eprintln!("Initial Investment: {:.2}", outcome.result.initial_investment);
    eprintln!("Final Value:        {:.2}", m.final_value);
    eprintln!("Total Return:       {:.2}%", m.total_return * 100.0);
    eprintln!("CAGR:               {:.2}%", m.cagr * 100.0);
    eprintln!("Max Drawdown:       {:.2}", m.max_drawdown);
    eprintln!("Sharpe Ratio:       {:.2}", m.sharpe_ratio);
    eprintln!("Sortino Ratio:      {:.2}", m.sortino_ratio);
    eprintln!("Calmar Ratio:       {:.2}", m.calmar_ratio);
    eprintln!("Trades:             {}", outcome.result.trades.len());
}

pub fn format_comparison_table(outcomes: &[PolicyOutcome]) -> String {
    let mut out = format!(
        "{:<36} {:>12} {:>9} {:>12} {:>8} {:>8} {:>9} {:>7}",
        "policy", "final_value", "return%", "max_dd", "sharpe", "sortino", "cagr%", "trades"
    );
    for outcome in outcomes {
        let m = &outcome.metrics;
        out.push_str(&format!(
            "\n{:<36} {:>12.2} {:>9.2} {:>12.2} {:>8.2} {:>8.2} {:>9.2} {:>7}",
            outcome.result.policy,
            m.final_value,
            m.total_return * 100.0,
            m.max_drawdown,
            m.sharpe_ratio,
            m.sortino_ratio,
            m.cagr * 100.0,
            outcome.result.trades.len(),
        ));
    }
    out
}
