//! `delivery` — delivery % report over daily stock CSV exports.

mod render;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, ValueEnum};
use delivery_core::{Config, DateRange, Period};
use delivery_ingestion::{merge, CsvLoader};
use delivery_metrics::Report;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    Text,
    /// The full report as JSON.
    Json,
    /// All aggregate rows as one CSV stream.
    Csv,
}

/// Delivery Percentage Dashboard
#[derive(Parser, Debug)]
#[command(name = "delivery")]
#[command(about = "Delivery % metrics from daily stock trading CSVs")]
#[command(version)]
pub struct Cli {
    /// CSV files to load
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Spike threshold (%)
    #[arg(long, value_name = "PCT")]
    pub spike_threshold: Option<f64>,

    /// Net value spike threshold (crores)
    #[arg(long, value_name = "CRORE")]
    pub net_value_threshold: Option<f64>,

    /// Period tables to show (repeatable): daily, weekly, monthly, quarterly, half-yearly, yearly
    #[arg(long = "period", value_name = "PERIOD")]
    pub periods: Vec<Period>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Load the configuration file (if any) and apply command-line overrides.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)
                .with_context(|| format!("failed to load config '{}'", path.display()))?,
            None => Config::default(),
        };

        if let Some(pct) = self.spike_threshold {
            config.alerts.spike_threshold_pct = pct;
        }
        if let Some(crore) = self.net_value_threshold {
            config.alerts.net_value_threshold_crore = crore;
        }
        if !self.periods.is_empty() {
            config.report.periods = self.periods.clone();
        }
        if self.from.is_some() || self.to.is_some() {
            let base = config.report.date_range;
            config.report.date_range =
                DateRange::new(self.from.or(base.from), self.to.or(base.to));
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn init_logging(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    if cli.files.is_empty() {
        bail!("upload at least one CSV to begin");
    }
    let config = cli.resolve_config()?;

    let loader = CsvLoader::new(&config.ingest);
    let mut loaded = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let file = loader
            .load_path(path)
            .with_context(|| format!("failed to load '{}'", path.display()))?;
        loaded.push(file);
    }

    let dataset = merge(loaded);
    info!(records = dataset.len(), symbols = dataset.symbols().len(), "dataset ready");

    let report = Report::build(&dataset, &config).context("failed to build report")?;

    match cli.format {
        OutputFormat::Text => render::write_text(out, &report)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => render::write_csv(&mut *out, &report)?,
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    run(&cli, &mut io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    const CANONICAL_CSV: &str = "\
symbol,date,traded_qty,deliverable_qty,delivery_pct,open
TCS,2024-01-01,1000000,800000,80,1000
TCS,2024-01-02,1000000,100000,10,1000
INFY,2024-01-02,2000000,500000,25,1500
";

    // Exchange-style headers; the TCS row repeats a date already loaded.
    const EXCHANGE_CSV: &str = "\
Symbol,Series,Date,Open Price,Total Traded Quantity,Deliverable Qty,% Dly Qt to Traded Qty
TCS,EQ,02-Jan-2024,1,999,999,100.00
INFY,EQ,08-Jan-2024,1500,\"10,00,000\",\"9,00,000\",90.00
";

    const CONFIG_JSON: &str = r#"{
        "alerts": { "spike_threshold_pct": 80.0, "net_value_threshold_crore": 10.0 },
        "report": { "periods": ["daily", "weekly"] }
    }"#;

    fn write_fixtures(dir: &Path) -> (String, String, String) {
        let write = |name: &str, body: &str| {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            path.display().to_string()
        };
        (
            write("canonical.csv", CANONICAL_CSV),
            write("exchange.csv", EXCHANGE_CSV),
            write("delivery.json", CONFIG_JSON),
        )
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("delivery").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_arguments() {
        let cli = parse(&[
            "a.csv",
            "b.csv",
            "--from",
            "2024-01-01",
            "--period",
            "monthly",
            "--period",
            "2h",
            "--format",
            "json",
            "-vv",
        ]);
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(cli.periods, vec![Period::Monthly, Period::HalfYearly]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_overrides_apply() {
        let cli = parse(&["a.csv", "--spike-threshold", "60", "--net-value-threshold", "5", "--to", "2024-03-31"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.alerts.spike_threshold_pct, 60.0);
        assert_eq!(config.alerts.net_value_threshold_crore, 5.0);
        assert_eq!(config.report.date_range.to, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(config.report.periods.len(), 6);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = parse(&["a.csv", "--spike-threshold", "150"]);
        assert!(cli.resolve_config().is_err());

        let cli = parse(&["a.csv", "--from", "2024-02-01", "--to", "2024-01-01"]);
        assert!(cli.resolve_config().is_err());
    }

    #[test]
    fn test_no_files() {
        let cli = parse(&[]);
        let err = run(&cli, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("at least one CSV"));
    }

    #[test]
    fn test_bad_period_rejected() {
        let result = Cli::try_parse_from(["delivery", "a.csv", "--period", "fortnightly"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_pipeline_from_files() {
        let dir = TempDir::new().unwrap();
        let (canonical, exchange, config_path) = write_fixtures(dir.path());

        let cli = parse(&[canonical.as_str(), exchange.as_str(), "--config", config_path.as_str()]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.report.periods, vec![Period::Daily, Period::Weekly]);

        let loader = CsvLoader::new(&config.ingest);
        let files: Vec<_> = cli
            .files
            .iter()
            .map(|path| loader.load_path(path).unwrap())
            .collect();
        assert_eq!(files[0].records.len(), 3);
        assert_eq!(files[1].records.len(), 2);

        let dataset = merge(files);
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.symbols(), vec!["INFY", "TCS"]);

        let report = Report::build(&dataset, &config).unwrap();
        assert_eq!(report.summary.total_days, 3);
        assert_eq!(report.spikes.len(), 2);

        let mut text = Vec::new();
        render::write_text(&mut text, &report).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.contains("Average Delivery % (Overall): 51.25"));
        assert!(text.contains("Max Delivery %:               90.00"));
        assert!(text.contains("Date range:                   2024-01-01 to 2024-01-08"));
        assert!(text.contains("2 spike(s) >= 80%"));
        assert!(text.contains("== Weekly Delivery %"));
        assert!(!text.contains("== Monthly Delivery %"));
        // 900k * 1500 = 135 crore, above the 10 crore threshold.
        assert!(text.contains("135.00*"));

        let mut csv_out = Vec::new();
        render::write_csv(&mut csv_out, &report).unwrap();
        let csv_out = String::from_utf8(csv_out).unwrap();
        let lines: Vec<&str> = csv_out.lines().collect();
        // Header, four daily rows, three weekly rows.
        assert_eq!(lines.len(), 8);
        assert!(lines[1].starts_with("daily,2024-01-02,INFY,2000000,500000"));
        assert!(lines[4].starts_with("daily,2024-01-02,TCS,1000000,100000"));
        assert!(lines[5].starts_with("weekly,2024-01-01,INFY,2000000,500000"));
        assert!(lines[6].starts_with("weekly,2024-01-08,INFY,1000000,900000"));
        assert!(lines[7].starts_with("weekly,2024-01-01,TCS,2000000,900000"));
    }

    #[test]
    fn test_run_writes_json_report() {
        let dir = TempDir::new().unwrap();
        let (canonical, exchange, config_path) = write_fixtures(dir.path());

        let cli = parse(&[
            canonical.as_str(),
            exchange.as_str(),
            "--config",
            config_path.as_str(),
            "--format",
            "json",
        ]);
        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["summary"]["total_symbols"], 2);
        assert_eq!(json["net_value_threshold_crore"], 10.0);
        assert_eq!(json["tables"].as_array().unwrap().len(), 2);
        assert_eq!(json["tables"][1]["period"], "weekly");
    }

    #[test]
    fn test_run_applies_date_override() {
        let dir = TempDir::new().unwrap();
        let (canonical, exchange, config_path) = write_fixtures(dir.path());

        let cli = parse(&[
            canonical.as_str(),
            exchange.as_str(),
            "--config",
            config_path.as_str(),
            "--from",
            "2024-01-08",
            "--format",
            "csv",
        ]);
        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("daily,2024-01-08,INFY"));
        assert!(lines[2].starts_with("weekly,2024-01-08,INFY"));
    }

    #[test]
    fn test_run_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.csv").display().to_string();
        let err = run(&parse(&[path.as_str()]), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }
}
