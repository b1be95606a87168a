//! CLI integration tests.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - Config parsing (build_simulation_config)
//! - Validate, run and compare against real INI and CSV files on disk
//! - Report files written by the run pipeline

mod common;

use clap::Parser;
use common::*;
use policysim::adapters::file_config_adapter::FileConfigAdapter;
use policysim::cli::{self, Cli, Command};
use policysim::domain::error::PolicysimError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const PRICES_CSV: &str = "Date,Open,High,Low,Close,Adj Close,Volume\n\
2024-01-02,99.0,101.0,98.0,100.0,100.0,1000\n\
2024-01-03,99.0,101.0,94.0,95.0,95.0,1000\n\
2024-01-04,95.0,96.0,88.0,89.0,89.0,1000\n\
2024-01-05,89.0,93.0,88.0,92.0,92.0,1000\n\
2024-01-08,92.0,96.0,91.0,95.0,95.0,1000\n";

/// Temp dir holding `AAPL.csv` plus a config pointing at it.
fn setup(extra: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("AAPL.csv"), PRICES_CSV).unwrap();
    let ini = format!(
        "[simulation]\nticker = aapl\nstart_date = 2024-01-01\nend_date = 2024-01-31\ndata_dir = {}\nshares = 10\navg_price = 100\ncash = 0\n{}",
        dir.path().display(),
        extra
    );
    let config_path = dir.path().join("policysim.ini");
    fs::write(&config_path, ini).unwrap();
    (dir, config_path)
}

mod arguments {
    use super::*;

    #[test]
    fn parses_run() {
        let cli = Cli::try_parse_from([
            "policysim", "run", "-c", "sim.ini", "-p", "dca", "-o", "out.csv",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                config,
                policy,
                output,
                ticker,
            } => {
                assert_eq!(config, PathBuf::from("sim.ini"));
                assert_eq!(policy, "dca");
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert!(ticker.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_compare_with_policy_list() {
        let cli = Cli::try_parse_from([
            "policysim",
            "compare",
            "--config",
            "sim.ini",
            "--policies",
            "dca,buy_and_hold",
            "--ticker",
            "MSFT",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Compare { policies: Some(ref p), ticker: Some(ref t), .. }
                if p == "dca,buy_and_hold" && t == "MSFT"
        ));
    }

    #[test]
    fn parses_list_policies_and_validate() {
        let cli = Cli::try_parse_from(["policysim", "list-policies"]).unwrap();
        assert!(matches!(cli.command, Command::ListPolicies));
        let cli = Cli::try_parse_from(["policysim", "validate", "-c", "sim.ini"]).unwrap();
        assert!(matches!(cli.command, Command::Validate { .. }));
    }

    #[test]
    fn run_requires_policy() {
        assert!(Cli::try_parse_from(["policysim", "run", "-c", "sim.ini"]).is_err());
    }
}

mod config_loading {
    use super::*;

    const FULL_INI: &str = r#"
[simulation]
ticker = aapl
start_date = 2023-01-01
end_date = 2023-12-31
data_dir = /srv/prices
shares = 10
avg_price = 150.0
cash = 250
initial_investment = 2000
policies = stop_loss_rebuy, DCA
"#;

    #[test]
    fn build_simulation_config_full() {
        let adapter = FileConfigAdapter::from_string(FULL_INI).unwrap();
        let sim = cli::build_simulation_config(&adapter, None).unwrap();

        assert_eq!(sim.ticker, "AAPL");
        assert_eq!(sim.start_date, date(2023, 1, 1));
        assert_eq!(sim.end_date, date(2023, 12, 31));
        assert_eq!(sim.data_dir, PathBuf::from("/srv/prices"));
        assert!((sim.start.shares - 10.0).abs() < f64::EPSILON);
        assert!((sim.start.avg_cost - 150.0).abs() < f64::EPSILON);
        assert!((sim.start.cash - 250.0).abs() < f64::EPSILON);
        assert_eq!(sim.initial_investment, Some(2000.0));
        assert_eq!(sim.policies, vec!["stop_loss_rebuy", "dca"]);
    }

    #[test]
    fn build_simulation_config_defaults() {
        let ini = "[simulation]\nticker = MSFT\nstart_date = 2023-01-01\nend_date = 2023-06-30\nshares = 5\navg_price = 300\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let sim = cli::build_simulation_config(&adapter, None).unwrap();

        assert_eq!(sim.data_dir, PathBuf::from("data"));
        assert!((sim.start.cash - 0.0).abs() < f64::EPSILON);
        assert!(sim.initial_investment.is_none());
        assert_eq!(sim.policies.len(), 5);
    }

    #[test]
    fn ticker_override_wins() {
        let adapter = FileConfigAdapter::from_string(FULL_INI).unwrap();
        let sim = cli::build_simulation_config(&adapter, Some("tsla")).unwrap();
        assert_eq!(sim.ticker, "TSLA");
    }

    #[test]
    fn missing_ticker_is_reported() {
        let ini = "[simulation]\nstart_date = 2023-01-01\nend_date = 2023-06-30\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_simulation_config(&adapter, None).unwrap_err();
        assert!(matches!(err, PolicysimError::ConfigMissing { key, .. } if key == "ticker"));
    }

    #[test]
    fn malformed_cash_is_reported() {
        let ini = "[simulation]\nticker = MSFT\nstart_date = 2023-01-01\nend_date = 2023-06-30\nshares = 5\navg_price = 300\ncash = 1,000\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_simulation_config(&adapter, None).unwrap_err();
        assert!(matches!(err, PolicysimError::ConfigInvalid { key, .. } if key == "cash"));
    }

    #[test]
    fn invalid_date_is_reported() {
        let ini = "[simulation]\nticker = MSFT\nstart_date = 01/01/2023\nend_date = 2023-06-30\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let err = cli::build_simulation_config(&adapter, None).unwrap_err();
        assert!(matches!(err, PolicysimError::ConfigInvalid { key, .. } if key == "start_date"));
    }
}

mod commands {
    use super::*;

    fn run_command(command: Command) -> ExitCode {
        cli::run(Cli { command })
    }

    #[test]
    fn validate_accepts_good_config() {
        let (_dir, config) = setup("policies = stop_loss_rebuy, dca\n");
        assert_eq!(run_command(Command::Validate { config }), ExitCode::SUCCESS);
    }

    #[test]
    fn validate_rejects_bad_policy_parameter() {
        let (_dir, config) = setup(
            "policies = partial_stop_loss_rebuy\n\n[partial_stop_loss_rebuy]\nsell_ratio = 2\n",
        );
        assert_eq!(run_command(Command::Validate { config }), ExitCode::from(2));
    }

    #[test]
    fn validate_rejects_malformed_policy_parameter() {
        let (_dir, config) =
            setup("policies = stop_loss_rebuy\n\n[stop_loss_rebuy]\nstop_loss_pct = -3%\n");
        assert_eq!(run_command(Command::Validate { config }), ExitCode::from(2));
    }

    #[test]
    fn validate_rejects_unknown_policy() {
        let (_dir, config) = setup("policies = momentum\n");
        assert_eq!(run_command(Command::Validate { config }), ExitCode::from(4));
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let code = run_command(Command::Validate {
            config: PathBuf::from("/nonexistent/policysim.ini"),
        });
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn run_writes_series_and_metrics() {
        let (dir, config) = setup("");
        let output = dir.path().join("stop.csv");

        let code = run_command(Command::Run {
            config,
            policy: "stop_loss_rebuy".into(),
            output: Some(output.clone()),
            ticker: None,
        });
        assert_eq!(code, ExitCode::SUCCESS);

        let series = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = series.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[3].starts_with("2024-01-04,890.0000,sell,"));
        assert!(lines[5].starts_with("2024-01-08,890.0000,buy,"));

        let metrics = fs::read_to_string(dir.path().join("stop.metrics.csv")).unwrap();
        assert!(metrics.contains("final_value,890.000000"));
        assert!(metrics.contains("trades,2"));
    }

    #[test]
    fn run_unknown_policy_exits_4() {
        let (dir, config) = setup("");
        let code = run_command(Command::Run {
            config,
            policy: "momentum".into(),
            output: Some(dir.path().join("out.csv")),
            ticker: None,
        });
        assert_eq!(code, ExitCode::from(4));
    }

    #[test]
    fn run_missing_price_file_exits_3() {
        let (dir, config) = setup("");
        let code = run_command(Command::Run {
            config,
            policy: "dca".into(),
            output: Some(dir.path().join("out.csv")),
            ticker: Some("MSFT".into()),
        });
        assert_eq!(code, ExitCode::from(3));
    }

    #[test]
    fn run_rejects_cash_start_for_full_stop_loss() {
        let (dir, config) = setup("");
        let ini = fs::read_to_string(&config)
            .unwrap()
            .replace("cash = 0", "cash = 100");
        fs::write(&config, ini).unwrap();

        let code = run_command(Command::Run {
            config,
            policy: "stop_loss_rebuy".into(),
            output: Some(dir.path().join("out.csv")),
            ticker: None,
        });
        assert_eq!(code, ExitCode::from(5));
    }

    #[test]
    fn compare_writes_one_report_per_policy() {
        let (dir, config) = setup("");
        let out = dir.path().join("reports");
        fs::create_dir(&out).unwrap();

        let code = run_command(Command::Compare {
            config,
            policies: Some("buy_and_hold, stop_loss_rebuy, dca".into()),
            output_dir: Some(out.clone()),
            ticker: None,
        });
        assert_eq!(code, ExitCode::SUCCESS);

        for tag in ["buy_and_hold", "stop_loss_rebuy", "dca"] {
            assert!(Path::new(&out.join(format!("AAPL_{tag}.csv"))).exists(), "{tag}");
            assert!(out.join(format!("AAPL_{tag}.metrics.csv")).exists(), "{tag}");
        }
    }

    #[test]
    fn compare_skips_failing_policies() {
        let (dir, config) = setup("");
        let ini = fs::read_to_string(&config)
            .unwrap()
            .replace("cash = 0", "cash = 100");
        fs::write(&config, ini).unwrap();

        let code = run_command(Command::Compare {
            config,
            policies: Some("buy_and_hold,stop_loss_rebuy".into()),
            output_dir: Some(dir.path().to_path_buf()),
            ticker: None,
        });
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(dir.path().join("AAPL_buy_and_hold.csv").exists());
        assert!(!dir.path().join("AAPL_stop_loss_rebuy.csv").exists());
    }

    #[test]
    fn list_policies_succeeds() {
        assert_eq!(run_command(Command::ListPolicies), ExitCode::SUCCESS);
    }
}

mod table {
    use super::*;

    #[test]
    fn comparison_table_has_row_per_outcome() {
        let port = MockDataPort::new().with_ticks("AAPL", make_ticks(&[100.0, 95.0, 89.0]));
        let config = FileConfigAdapter::from_string("[simulation]\n").unwrap();
        let sim = sample_config(&["buy_and_hold", "stop_loss_rebuy"]);
        let outcomes: Vec<cli::PolicyOutcome> = cli::run_simulations(&port, &config, &sim)
            .unwrap()
            .into_iter()
            .map(|o| o.unwrap())
            .collect();

        let table = cli::format_comparison_table(&outcomes);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("policy"));
        assert!(lines[1].starts_with("Buy & Hold"));
        assert!(lines[2].starts_with("Stop Loss & Rebuy Strategy"));
    }
}
