//! Command implementations for the weather collector CLI
//!
//! This module contains logging setup, configuration loading, the command
//! dispatch and the end-of-run reporting.

use crate::cli::args::{Args, CollectArgs, Commands};
use crate::collector::{Collector, RunSummary};
use crate::config::Config;
use crate::loader::{ClickHouseSink, DryRunSink};
use crate::models::{ForecastRow, ObservationRow};
use crate::schema::all_statements;
use crate::wfs::WfsClient;

use anyhow::{Context, Result};
use chrono::{SubsecRound, Utc};
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Main command runner for the weather collector
pub async fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;

    info!("Starting weather collector");
    debug!("Command line arguments: {:?}", args);

    args.validate()?;

    match args.command() {
        Commands::Schema => {
            println!("{}", schema_script());
            Ok(())
        }
        Commands::InitDb => {
            let config = load_configuration(&args)?;
            init_database(&config).await
        }
        Commands::Collect(collect) => {
            let config = load_configuration(&args)?;
            let summary = collect_weather(&args, &collect, &config).await?;
            print_summary(&summary, collect.dry_run);
            Ok(())
        }
    }
}

/// Set up logging on stderr.
///
/// `RUST_LOG` wins over the verbosity flags. Colours are only used when
/// stderr is a terminal, so cron mail and journald stay plain.
fn setup_logging(args: &Args) -> Result<()> {
    use std::io::IsTerminal;
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wcollect={}", log_level)));
    let ansi = std::io::stderr().is_terminal();

    // Errors only, one line each
    let quiet_layer = args.quiet.then(|| {
        fmt::layer()
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(std::io::stderr)
            .compact()
    });

    // Elapsed time since start, same clock as the progress bar
    let run_layer = (!args.quiet).then(|| {
        fmt::layer()
            .with_target(false)
            .with_ansi(ansi)
            .with_timer(fmt::time::uptime())
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(quiet_layer)
        .with(run_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load the configuration file named on the command line, or the default one
fn load_configuration(args: &Args) -> Result<Config> {
    let path = args
        .config_file
        .clone()
        .unwrap_or_else(Config::default_config_path);

    info!("Using config file: {}", path.display());

    let config = Config::from_file(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    debug!("Loaded configuration for {} locations", config.locations.len());

    Ok(config)
}

/// Run one collection pass over every configured location
async fn collect_weather(
    args: &Args,
    collect: &CollectArgs,
    config: &Config,
) -> Result<RunSummary> {
    let feed = WfsClient::new(&config.service_url)?;
    let progress = create_progress_bar(config.locations.len(), args.show_progress())?;
    let now = Utc::now().trunc_subsecs(0);
    let database = &config.clickhouse.database;

    let summary = if collect.dry_run {
        info!("Performing dry run - nothing will be written to the database");
        Collector::new(&feed, &DryRunSink, database)
            .with_progress(progress)
            .run(&config.locations, now)
            .await?
    } else {
        let sink = ClickHouseSink::connect(&config.clickhouse)
            .await
            .context("Failed to connect to ClickHouse")?;
        debug!("Writing to {}", sink.url());

        Collector::new(&feed, &sink, database)
            .with_progress(progress)
            .run(&config.locations, now)
            .await?
    };

    Ok(summary)
}

/// Create both tables in the configured database
async fn init_database(config: &Config) -> Result<()> {
    let sink = ClickHouseSink::connect(&config.clickhouse)
        .await
        .context("Failed to connect to ClickHouse")?;

    sink.create_table::<ObservationRow>().await?;
    sink.create_table::<ForecastRow>().await?;

    println!(
        "{} {}",
        "Tables ready in database".bright_green().bold(),
        config.clickhouse.database.bright_white().bold()
    );
    Ok(())
}

/// DDL for both tables as one script
fn schema_script() -> String {
    all_statements()
        .iter()
        .map(|statement| format!("{};", statement))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn create_progress_bar(locations: usize, visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(locations as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Print the human-readable run report
fn print_summary(summary: &RunSummary, dry_run: bool) {
    let title = if dry_run {
        "Dry run complete (nothing written)"
    } else {
        "Weather collection complete"
    };

    println!("\n{}", title.bright_green().bold());
    println!(
        "  {} {}",
        "Locations:".bright_cyan(),
        summary.locations.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Observation rows:".bright_cyan(),
        summary.observation_rows
    );
    println!("  {} {}", "Forecast rows:".bright_cyan(), summary.forecast_rows);
    println!(
        "  {} {}",
        "Time:".bright_cyan(),
        HumanDuration(summary.elapsed)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args_with_config(path: &str) -> Args {
        Args::try_parse_from(["wcollect", "--config", path]).unwrap()
    }

    #[test]
    fn test_load_configuration_from_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"clickhouse": {"address": ["db:8123"], "database": "weather"},
                 "locations": ["Helsinki"]}"#,
        )
        .unwrap();

        let args = args_with_config(file.path().to_str().unwrap());
        let config = load_configuration(&args).unwrap();

        assert_eq!(config.locations, vec!["Helsinki"]);
        assert_eq!(config.clickhouse.database, "weather");
    }

    #[test]
    fn test_load_configuration_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{}").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let error = load_configuration(&args_with_config(&path)).unwrap_err();
        assert!(format!("{:#}", error).contains(&path));
    }

    #[test]
    fn test_logging_installs_once() {
        let args = Args::try_parse_from(["wcollect", "-vv", "schema"]).unwrap();

        assert!(setup_logging(&args).is_ok());

        let error = setup_logging(&args).unwrap_err();
        assert!(error.to_string().contains("Failed to initialize logging"));
    }

    #[test]
    fn test_schema_script() {
        let script = schema_script();

        assert_eq!(script.matches("CREATE TABLE IF NOT EXISTS").count(), 2);
        assert!(script.contains("observations"));
        assert!(script.contains("forecasts"));
        assert!(script.ends_with(';'));
    }

    #[test]
    fn test_progress_bar_hidden_when_quiet() {
        assert!(create_progress_bar(3, false).unwrap().is_hidden());
        assert_eq!(create_progress_bar(3, true).unwrap().length(), Some(3));
    }

    #[tokio::test]
    async fn test_dry_run_with_unreachable_service_fails_at_first_location() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"clickhouse": {"address": ["db:8123"], "database": "weather"},
                 "locations": ["Helsinki", "Tampere"],
                 "service_url": "http://127.0.0.1:1/wfs"}"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "wcollect",
            "--quiet",
            "--config",
            file.path().to_str().unwrap(),
            "collect",
            "--dry-run",
        ])
        .unwrap();
        let config = load_configuration(&args).unwrap();
        let collect = CollectArgs { dry_run: true };

        let error = collect_weather(&args, &collect, &config).await.unwrap_err();
        assert!(
            error
                .to_string()
                .contains("failed to collect observations for location 'Helsinki'")
        );
    }
}
