// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ride-Reporter CLI
//!
//! Thin driver over the core services, one subcommand per operation the
//! desktop shell exposes: connection test, trip fetch, receipt download and
//! merge, report generation, and cache maintenance.

use chrono::NaiveDate;

use ride_reporter::config::Config;
use ride_reporter::cookies::{CookieJar, CookieSource, FileCookieSource};
use ride_reporter::logbuf::LogBuffer;
use ride_reporter::models::{resolve_trip_id, ReportConfig, TripStatistics};
use ride_reporter::services::generate_report;
use ride_reporter::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "Usage: ride-reporter <command>

Commands:
  test                      Verify the cookie set against the rides API
  fetch <start> <end>       Fetch trips in the date range (YYYY-MM-DD)
  receipts <start> <end>    Download and merge receipts for completed trips
  report <start> <end>      Generate the travel-report PDF
  cache-stats               Show cache entry counts and size
  cache-clear               Remove every cached entry";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_buffer = LogBuffer::default();
    init_logging(&log_buffer);

    let config = Config::from_env().expect("Failed to load configuration");
    let state = AppState::new(config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("");

    match command {
        "test" => {
            let status = state.trip_service.api().test_connection(&cookies(&state)?).await;
            println!("{}", status.message);
            if !status.ok {
                std::process::exit(1);
            }
        }
        "fetch" => {
            let (start, end) = date_range(&args)?;
            let records = state
                .trip_service
                .fetch_trips(start, end, &cookies(&state)?)
                .await?;
            println!("Fetched {} trips for {} to {}", records.len(), start, end);
            if let Some(stats) = TripStatistics::compute(&records) {
                println!(
                    "Completed: {} trips, ${:.2} total (${:.2} avg), {} surge, {} scheduled",
                    stats.total_trips,
                    stats.total_cost,
                    stats.avg_cost,
                    stats.surge_trips,
                    stats.scheduled_trips
                );
            }
        }
        "receipts" => {
            let (start, end) = date_range(&args)?;
            let jar = cookies(&state)?;
            let records = state.trip_service.fetch_trips(start, end, &jar).await?;
            let trip_ids: Vec<String> = records
                .iter()
                .filter(|r| r.detail.status.is_completed())
                .map(|r| resolve_trip_id(&r.activity, &r.detail).to_string())
                .collect();
            if trip_ids.is_empty() {
                println!("No completed trips in {} to {}", start, end);
                return Ok(());
            }
            let (merged, individual) = state
                .receipt_service
                .download_and_merge(&trip_ids, &jar, &state.config.output_dir)
                .await?;
            println!(
                "Merged {} receipts into {}",
                individual.len(),
                merged.display()
            );
        }
        "report" => {
            let (start, end) = date_range(&args)?;
            let records = state
                .trip_service
                .fetch_trips(start, end, &cookies(&state)?)
                .await?;

            let report_config = match &state.config.report_config_path {
                Some(path) => ReportConfig::from_file(path)?,
                None => {
                    return Err("Set RIDE_REPORTER_REPORT_CONFIG to a report config file".into())
                }
            };

            let file_name = format!(
                "Travel_Report_{}.pdf",
                chrono::Local::now().format("%Y-%m-%dT%H-%M-%S")
            );
            let output_path = state.config.output_dir.join(file_name);
            let written = generate_report(&records, &report_config, &output_path)?;
            println!("Report written to {}", written.display());
        }
        "cache-stats" => {
            let stats = state.trip_service.cache().stats().await?;
            println!("Cache root: {}", stats.root.display());
            println!("Activity lists: {}", stats.activity_count);
            println!("Trip details:   {}", stats.trip_count);
            println!("Receipts:       {}", stats.receipt_count);
            println!("Total size:     {}", stats.total_size);
        }
        "cache-clear" => {
            state.trip_service.cache().clear().await?;
            println!("Cache cleared");
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Load the cookie jar from the configured export file.
fn cookies(state: &AppState) -> Result<CookieJar, Box<dyn std::error::Error>> {
    let path = state
        .config
        .cookies_path
        .as_ref()
        .ok_or("Set RIDE_REPORTER_COOKIES_FILE to a cookie export file")?;
    Ok(FileCookieSource::new(path).load()?)
}

fn date_range(args: &[String]) -> Result<(NaiveDate, NaiveDate), Box<dyn std::error::Error>> {
    let start = args
        .get(1)
        .ok_or("Missing <start> date (YYYY-MM-DD)")?
        .parse::<NaiveDate>()?;
    let end = args
        .get(2)
        .ok_or("Missing <end> date (YYYY-MM-DD)")?
        .parse::<NaiveDate>()?;
    Ok((start, end))
}

/// Initialize logging: env-filtered console output plus the bounded
/// in-memory buffer the log-export glue reads from.
fn init_logging(buffer: &LogBuffer) {
    let format = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ride_reporter=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .with(buffer.layer())
        .init();
}
