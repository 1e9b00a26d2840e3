//!  Delulu Travel Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! CLI: report round trips priced below Google Flights' "low price" band.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use delulu_fare_watch::{
    find_cheap_offers_streaming, Cabin, CancellationToken, CheapOfferSearch, Currency,
    FailurePolicy, Language, SearchOptions, Session, SessionConfig, Stops, Travelers, TripType,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "delulu-fare-watch")]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Origin cities, comma-separated (e.g. "San Francisco,San Jose")
    #[arg(short, long, value_delimiter = ',', required = true)]
    from: Vec<String>,

    /// Destination cities, comma-separated (e.g. "New York,Philadelphia")
    #[arg(short, long, value_delimiter = ',', required = true)]
    to: Vec<String>,

    /// First departure date (YYYY-MM-DD, or +Nd from today)
    #[arg(short, long, default_value = "+60d")]
    start: String,

    /// Last date of the range (YYYY-MM-DD, or +Nd from today)
    #[arg(short, long, default_value = "+90d")]
    end: String,

    /// Days between departure and return
    #[arg(long, default_value_t = 7)]
    trip_length: u32,

    /// Result language (BCP-47 tag)
    #[arg(long, default_value = "en")]
    lang: Language,

    /// ISO 4217 currency code
    #[arg(long, default_value = "USD")]
    currency: Currency,

    /// Number of adult passengers
    #[arg(short, long, default_value_t = 1)]
    adults: u32,

    /// Stops: any, nonstop, one, two
    #[arg(long, default_value = "any")]
    stops: Stops,

    /// Cabin class: economy, premium_economy, business, first
    #[arg(short, long, default_value = "economy")]
    cabin: Cabin,

    /// Trip type: roundtrip, oneway
    #[arg(long, default_value = "roundtrip")]
    trip: TripType,

    /// Price-graph points checked concurrently
    #[arg(long, default_value_t = CheapOfferSearch::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-query deadline in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Outgoing requests per second
    #[arg(long, default_value_t = 2)]
    qps: u32,

    /// HTTP or SOCKS5 proxy URL
    #[arg(long)]
    proxy: Option<String>,

    /// Log and skip dates whose queries fail instead of aborting
    #[arg(long)]
    skip_failures: bool,

    /// One JSON object per line instead of the text report
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

/// Logs go to stderr so stdout only carries reports.
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Parse YYYY-MM-DD, YYYY/MM/DD or a `+Nd` offset from `today`.
fn parse_date(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    if let Some(days) = s.strip_prefix('+').and_then(|r| r.strip_suffix('d')) {
        let days: u64 = days
            .parse()
            .with_context(|| format!("Invalid day offset: {}", s))?;
        return today
            .checked_add_days(chrono::Days::new(days))
            .with_context(|| format!("Day offset out of range: {}", s));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .with_context(|| format!("Invalid date format: {}. Use YYYY-MM-DD or +Nd", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let started = Instant::now();
    let args = CliArgs::parse();
    setup_logging(args.verbose);
    tracing::debug!("Args: {:?}", args);

    let today = Local::now().date_naive();
    let range_start = parse_date(&args.start, today)?;
    let range_end = parse_date(&args.end, today)?;

    let options = SearchOptions {
        travelers: Travelers::adults(args.adults),
        currency: args.currency,
        cabin: args.cabin,
        stops: args.stops,
        trip: args.trip,
        language: args.lang.clone(),
    };
    let search = CheapOfferSearch::new(
        range_start,
        range_end,
        args.trip_length,
        args.from.iter().map(|s| s.trim().to_string()),
        args.to.iter().map(|s| s.trim().to_string()),
    )
    .options(options)
    .concurrency(args.concurrency)
    .failure_policy(if args.skip_failures {
        FailurePolicy::SkipPoint
    } else {
        FailurePolicy::Abort
    });

    let config = SessionConfig {
        timeout: Duration::from_secs(args.timeout_secs),
        proxy: args.proxy.clone(),
        language: args.lang.clone(),
        queries_per_second: args.qps,
        ..SessionConfig::default()
    };

    tracing::info!(
        "Searching {} -> {} departing {}..{} ({} days)",
        search.src_cities.join(","),
        search.dst_cities.join(","),
        range_start,
        range_end,
        search.trip_length
    );

    let session = Session::new(config)
        .await
        .context("Failed to start session")?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling search");
            on_ctrl_c.cancel();
        }
    });

    let json = args.json;
    let found = find_cheap_offers_streaming(&session, &search, &cancel, |report| {
        if json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!("Failed to encode report: {}", e),
            }
        } else {
            println!("{}", report);
        }
    })
    .await
    .context("Cheap-offer search failed")?;

    tracing::info!("{} cheap offers found", found);
    println!("{:?}", started.elapsed());
    Ok(())
}
