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

//! Offline end-to-end runs of the cheap-offer search over a scripted source.
//!
//! Run with:
//!     cargo test --test t_cheap_offers_e2e


use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use delulu_fare_watch::{
    find_cheap_offers, find_cheap_offers_streaming, CancellationToken, CheapOfferSearch,
    FailurePolicy, FareError, OfferArgs, PriceGraphArgs, SearchOptions, Session, SessionConfig,
    TripType,
};
use scripted_source::{day, offer, session_over, ScriptedSource};

fn search() -> CheapOfferSearch {
    CheapOfferSearch::new(
        day(1),
        day(20),
        7,
        ["San Francisco", "San Jose"],
        ["New York", "Philadelphia"],
    )
}

/// One graph point on Dec 1, best city-level offer SFO-JFK at `best`,
/// typical band 350..=520 for that pair.
fn single_point(best: u32) -> ScriptedSource {
    ScriptedSource::default()
        .with_graph_point(day(1), Some(day(8)), 290)
        .with_offers(
            day(1),
            vec![
                offer(day(1), Some(day(8)), "SJC", "EWR", Some(0)),
                offer(day(1), Some(day(8)), "SFO", "JFK", Some(best)),
                offer(day(1), Some(day(8)), "SJC", "PHL", Some(best + 90)),
                offer(day(1), Some(day(8)), "SFO", "EWR", None),
            ],
        )
        .with_range(day(1), "SFO", "JFK", 350, 520)
}

#[tokio::test]
async fn test_offer_below_low_band_is_reported() {
    let (session, source) = session_over(single_point(312)).await;
    let reports = find_cheap_offers(&session, &search(), &CancellationToken::new())
        .await
        .expect("search should succeed");

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.departure, day(1));
    assert_eq!(report.return_date, Some(day(8)));
    assert_eq!(report.origin.as_str(), "SFO");
    assert_eq!(report.destination.as_str(), "JFK");
    assert_eq!(report.price, 312);
    assert_eq!(report.price_range.low, 350);
    assert!(report.url.starts_with("https://www.google.com/travel/flights/search?tfs="));
    assert!(report.url.contains("&hl=en&curr=USD"));

    let text = report.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, ["2026-12-01 2026-12-08", "price 312", report.url.as_str()]);

    // One city-level query plus one airport-level re-query.
    assert_eq!(source.shopping_calls.load(Ordering::SeqCst), 2);
    assert_eq!(source.probes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_offer_inside_band_is_not_reported() {
    let (session, _) = session_over(single_point(400)).await;
    let reports = find_cheap_offers(&session, &search(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(reports.is_empty());
}

#[tokio::test]
async fn test_price_equal_to_low_is_not_reported() {
    let (session, _) = session_over(single_point(350)).await;
    let reports = find_cheap_offers(&session, &search(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(reports.is_empty());
}

#[tokio::test]
async fn test_missing_price_range_aborts_by_default() {
    let mut source = single_point(312);
    source.ranges.clear();
    let (session, _) = session_over(source).await;

    let err = find_cheap_offers(&session, &search(), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        FareError::MissingPriceRange {
            departure,
            origin,
            destination,
            ..
        } => {
            assert_eq!(departure, day(1));
            assert_eq!(origin.as_str(), "SFO");
            assert_eq!(destination.as_str(), "JFK");
        }
        other => panic!("expected MissingPriceRange, got {other:?}"),
    }
}

#[tokio::test]
async fn test_skip_policy_keeps_going_after_failures() {
    let mut source = single_point(312)
        // Dec 2: no band for the best pair.
        .with_graph_point(day(2), Some(day(9)), 280)
        .with_offers(day(2), vec![offer(day(2), Some(day(9)), "SFO", "PHL", Some(250))])
        // Dec 3: the city-level query fails.
        .with_graph_point(day(3), Some(day(10)), 300);
    source.failing_dates.insert(day(3));
    let (session, _) = session_over(source).await;

    let strict = find_cheap_offers(&session, &search(), &CancellationToken::new()).await;
    assert!(strict.is_err());

    let lenient = search().failure_policy(FailurePolicy::SkipPoint);
    let reports = find_cheap_offers(&session, &lenient, &CancellationToken::new())
        .await
        .expect("failed points should be skipped");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].departure, day(1));
}

#[tokio::test]
async fn test_points_without_priced_offers_are_skipped() {
    let source = ScriptedSource::default()
        .with_graph_point(day(4), Some(day(11)), 310)
        .with_offers(day(4), vec![offer(day(4), Some(day(11)), "SFO", "JFK", Some(0))]);
    let (session, source) = session_over(source).await;

    let reports = find_cheap_offers(&session, &search(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(reports.is_empty());
    // No airport-level re-query without a best offer.
    assert_eq!(source.shopping_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reports_are_sorted_by_departure() {
    let mut source = ScriptedSource::default();
    for d in [9, 3, 6] {
        source = source
            .with_graph_point(day(d), Some(day(d + 7)), 200)
            .with_offers(day(d), vec![offer(day(d), Some(day(d + 7)), "SJC", "EWR", Some(150 + d))])
            .with_range(day(d), "SJC", "EWR", 300, 400);
    }
    let (session, _) = session_over(source).await;

    let reports = find_cheap_offers(&session, &search().concurrency(3), &CancellationToken::new())
        .await
        .unwrap();
    let departures: Vec<_> = reports.iter().map(|r| r.departure).collect();
    assert_eq!(departures, vec![day(3), day(6), day(9)]);
}

#[tokio::test]
async fn test_cities_are_resolved_once_per_session() {
    let source = single_point(312)
        .with_graph_point(day(2), Some(day(9)), 280)
        .with_offers(day(2), vec![offer(day(2), Some(day(9)), "SFO", "JFK", Some(500))])
        .with_range(day(2), "SFO", "JFK", 350, 520);
    let (session, source) = session_over(source).await;

    find_cheap_offers(&session, &search(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(source.city_lookups.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_both_location_kinds_fail_before_network() {
    let (session, source) = session_over(single_point(312)).await;

    let err = OfferArgs::builder(day(1))
        .return_date(day(8))
        .src_cities(["San Francisco"])
        .src_airports(["SFO"])
        .dst_airports(["JFK"])
        .build()
        .unwrap_err();
    assert!(matches!(err, FareError::InvalidArgument(_)));

    let backwards = PriceGraphArgs {
        range_start: day(20),
        range_end: day(1),
        trip_length: 7,
        src_cities: vec!["San Francisco".into()],
        dst_cities: vec!["New York".into()],
        options: SearchOptions::default(),
    };
    let err = session
        .get_price_graph(&backwards, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FareError::InvalidArgument(_)));

    let no_cities = CheapOfferSearch::new(day(1), day(20), 7, Vec::<String>::new(), ["New York"]);
    let err = find_cheap_offers(&session, &no_cities, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FareError::InvalidArgument(_)));

    assert_eq!(source.network_calls(), 0);
}

#[tokio::test]
async fn test_cancellation_yields_no_partial_report() {
    let mut source = single_point(312);
    source.hang_shopping = true;
    let (session, _) = session_over(source).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let mut seen = 0;
    let err = find_cheap_offers_streaming(&session, &search(), &cancel, |_| seen += 1)
        .await
        .unwrap_err();
    assert!(err.is_cancelled(), "got {err:?}");
    assert_eq!(seen, 0);
}

#[tokio::test]
async fn test_cancelled_token_issues_no_queries() {
    let (session, source) = session_over(single_point(312)).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = find_cheap_offers(&session, &search(), &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(source.network_calls(), 0);
}

#[tokio::test]
async fn test_query_deadline_is_reported_as_cancelled() {
    let mut source = single_point(312);
    source.hang_shopping = true;
    let config = SessionConfig {
        timeout: Duration::from_millis(50),
        ..SessionConfig::default()
    };
    let session = Session::with_source(Arc::new(source), config).await.unwrap();

    let err = find_cheap_offers(&session, &search(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FareError::Cancelled(ref m) if m.contains("deadline")), "got {err:?}");
}

#[tokio::test]
async fn test_failed_handshake_is_an_initialization_error() {
    let source = ScriptedSource {
        probe_fails: true,
        ..Default::default()
    };
    let err = Session::with_source(Arc::new(source), SessionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FareError::Initialization(_)));
}

#[tokio::test]
async fn test_handshake_can_be_disabled() {
    let source = Arc::new(ScriptedSource {
        probe_fails: true,
        ..Default::default()
    });
    let config = SessionConfig {
        handshake: false,
        ..SessionConfig::default()
    };
    Session::with_source(source.clone(), config)
        .await
        .expect("no probe without handshake");
    assert_eq!(source.probes.load(Ordering::SeqCst), 0);
}

fn pair_args(from: &str, to: &str) -> OfferArgs {
    OfferArgs::builder(day(1))
        .return_date(day(8))
        .src_airports([from])
        .dst_airports([to])
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_serialized_url_is_deterministic() {
    let (session, source) = session_over(ScriptedSource::default()).await;
    let cancel = CancellationToken::new();

    let first = session.serialize_url(&pair_args("SFO", "JFK"), &cancel).await.unwrap();
    let again = session.serialize_url(&pair_args("SFO", "JFK"), &cancel).await.unwrap();
    assert_eq!(first, again);
    assert!(first.starts_with("https://www.google.com/travel/flights/search?tfs="));

    let other = session.serialize_url(&pair_args("SFO", "EWR"), &cancel).await.unwrap();
    assert_ne!(first, other);

    // Airport-level links never touch the data source.
    assert_eq!(source.network_calls(), 0);
}

#[tokio::test]
async fn test_serialized_url_resolves_cities_once() {
    let (session, source) = session_over(ScriptedSource::default()).await;
    let cancel = CancellationToken::new();
    let args = OfferArgs::builder(day(1))
        .return_date(day(8))
        .src_cities(["San Francisco"])
        .dst_cities(["New York"])
        .build()
        .unwrap();

    let first = session.serialize_url(&args, &cancel).await.unwrap();
    let again = session.serialize_url(&args, &cancel).await.unwrap();
    assert_eq!(first, again);
    assert_ne!(first, session.serialize_url(&pair_args("SFO", "JFK"), &cancel).await.unwrap());
    assert_eq!(source.city_lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalid_url_arguments_are_serialization_errors() {
    let (session, source) = session_over(ScriptedSource::default()).await;
    let mut one_way_with_return = pair_args("SFO", "JFK");
    one_way_with_return.options.trip = TripType::OneWay;

    let err = session
        .serialize_url(&one_way_with_return, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FareError::Serialization(_)), "got {err:?}");
    assert_eq!(source.network_calls(), 0);
}
