#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line NYC 311 window reports.
//!
//! ```text
//! nyc311 summary [--days 7] [--today 2024-03-15]
//! nyc311 borough <name|slug> [--from 2024-03-01 --to 2024-03-07] [--days 7]
//! nyc311 boroughs [--days 7]
//! nyc311 zip <ZIP> [--limit 500]
//! ```
//!
//! Every subcommand accepts `--config <path.toml>` and `--json`. The
//! `NYC311_APP_TOKEN` environment variable overrides the configured app
//! token. Logging is controlled by `RUST_LOG` and shares the terminal with
//! the fetch progress bars.

mod output;
mod progress;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use nyc311_dashboard::report::WindowReport;
use nyc311_dashboard::{Dashboard, DashboardConfig, SelectionOutcome};
use nyc311_source_models::{Borough, DimensionFilter, Window, WindowError, ZipCode};

use crate::progress::FetchBar;

/// Environment variable holding the Socrata app token.
const APP_TOKEN_ENV: &str = "NYC311_APP_TOKEN";

#[derive(Parser)]
#[command(name = "nyc311", about = "NYC 311 service-request window reports")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Citywide report for the last N completed days vs the N days before
    Summary {
        #[command(flatten)]
        range: TrailingArgs,
    },
    /// Report for one borough
    Borough {
        /// Borough name or slug (e.g. "bronx", "staten-island")
        name: String,
        /// First day of an explicit range
        #[arg(long, requires = "to", conflicts_with = "days")]
        from: Option<NaiveDate>,
        /// Last day of an explicit range (inclusive)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        #[command(flatten)]
        range: TrailingArgs,
    },
    /// Per-borough totals, fetched concurrently
    Boroughs {
        #[command(flatten)]
        range: TrailingArgs,
    },
    /// Newest reports filed in one ZIP code
    Zip {
        /// Five-digit ZIP code
        zip: ZipCode,
        /// Number of records to fetch (defaults to the config value)
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Args)]
struct TrailingArgs {
    /// Number of completed days to cover (defaults to the config value)
    #[arg(long)]
    days: Option<u32>,
    /// Treat this date as today instead of the local date
    #[arg(long)]
    today: Option<NaiveDate>,
}

impl TrailingArgs {
    fn window(&self, default_days: u32) -> Result<Window, WindowError> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        Window::trailing_days(today, self.days.unwrap_or(default_days))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = progress::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    }
    .with_app_token(std::env::var(APP_TOKEN_ENV).ok());

    if config.client.app_token.is_none() {
        log::warn!("No app token configured; requests share the anonymous rate limit");
    }

    let default_days = config.default_days;
    let dashboard = Dashboard::connect(&config)?.with_progress(Arc::new(move |label: &str| {
        FetchBar::spawn(&multi, label)
    }));

    match cli.command {
        Commands::Summary { range } => {
            let window = range.window(default_days)?;
            let outcome = dashboard.select(window, None).await?;
            print_outcome(&outcome, cli.json)?;
        }
        Commands::Borough {
            name,
            from,
            to,
            range,
        } => {
            let Some(borough) = Borough::parse_loose(&name) else {
                return Err(format!(
                    "unknown borough '{name}' (expected one of: {})",
                    Borough::ALL
                        .iter()
                        .map(|b| b.slug())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
                .into());
            };
            let window = match (from, to) {
                (Some(from), Some(to)) => Window::days(from, to)?,
                _ => range.window(default_days)?,
            };
            let outcome = dashboard
                .select(window, Some(DimensionFilter::borough(borough)))
                .await?;
            print_outcome(&outcome, cli.json)?;
        }
        Commands::Boroughs { range } => {
            let window = range.window(default_days)?;
            let rows = dashboard.borough_summaries(&window).await?;

            if cli.json {
                let json: Vec<_> = rows
                    .iter()
                    .map(|(borough, result)| match result {
                        Ok(summary) => serde_json::to_value(summary),
                        Err(e) => Ok(serde_json::json!({
                            "borough": borough,
                            "error": e.to_string(),
                        })),
                    })
                    .collect::<Result<_, _>>()?;
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("{window}\n");
                print!("{}", output::render_boroughs(&rows));
            }

            if rows.iter().all(|(_, result)| result.is_err()) {
                return Err("every borough fetch failed".into());
            }
        }
        Commands::Zip { zip, limit } => {
            let report = dashboard.lookup_zip(zip, limit).await?;
            if let Some(reason) = &report.fetch.interrupted {
                eprintln!(
                    "warning: lookup is incomplete ({} records kept): {reason}",
                    report.total
                );
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::render_zip(&report));
            }
        }
    }

    Ok(())
}

fn print_outcome(
    outcome: &SelectionOutcome,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let SelectionOutcome::Applied(report) = outcome else {
        return Err("selection was superseded".into());
    };
    warn_if_partial(report);

    if json {
        println!("{}", serde_json::to_string_pretty(report.as_ref())?);
    } else {
        print!("{}", output::render_report(report));
    }
    Ok(())
}

fn warn_if_partial(report: &WindowReport) {
    for (which, summary) in [("current", &report.current), ("prior", &report.prior)] {
        if let Some(reason) = &summary.interrupted {
            eprintln!(
                "warning: {which} window is incomplete ({} records kept): {reason}",
                summary.records
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn trailing_window_uses_config_default() {
        let range = TrailingArgs {
            days: None,
            today: Some(date("2024-03-15")),
        };
        let window = range.window(7).unwrap();
        assert_eq!(window, Window::days(date("2024-03-08"), date("2024-03-14")).unwrap());
    }

    #[test]
    fn parses_borough_with_explicit_range() {
        let cli = Cli::try_parse_from([
            "nyc311",
            "borough",
            "staten-island",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-07",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        let Commands::Borough { name, from, to, .. } = cli.command else {
            panic!("expected borough subcommand");
        };
        assert_eq!(name, "staten-island");
        assert_eq!(from, Some(date("2024-03-01")));
        assert_eq!(to, Some(date("2024-03-07")));
    }

    #[test]
    fn parses_zip_lookup() {
        let cli = Cli::try_parse_from(["nyc311", "zip", "11372", "--limit", "1000"]).unwrap();
        let Commands::Zip { zip, limit } = cli.command else {
            panic!("expected zip subcommand");
        };
        assert_eq!(zip.as_str(), "11372");
        assert_eq!(limit, Some(1000));
    }

    #[test]
    fn rejects_malformed_zip() {
        for zip in ["1137", "113721", "abcde"] {
            assert!(Cli::try_parse_from(["nyc311", "zip", zip]).is_err());
        }
    }

    #[test]
    fn explicit_range_conflicts_with_days() {
        assert!(
            Cli::try_parse_from([
                "nyc311",
                "borough",
                "bronx",
                "--from",
                "2024-03-01",
                "--to",
                "2024-03-07",
                "--days",
                "3",
            ])
            .is_err()
        );
        assert!(
            Cli::try_parse_from(["nyc311", "borough", "bronx", "--from", "2024-03-01"]).is_err()
        );
    }
}
