// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end pipeline tests: cache-fronted fetch feeding report generation.

use std::sync::Arc;

use chrono::NaiveDate;
use lopdf::Document;
use ride_reporter::cookies::CookieJar;
use ride_reporter::models::ReportConfig;
use ride_reporter::services::{generate_report, CacheStore, RideApiClient, TripService};

mod common;

fn jar() -> CookieJar {
    CookieJar::from_pairs([("sid", "test-session")])
}

fn january() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
}

/// Mock state with two completed January trips.
fn two_trip_state() -> Arc<common::MockState> {
    let state = Arc::new(common::MockState::default());
    *state.activity_pages.lock().unwrap() = vec![common::page(
        vec![
            common::activity("trip-1", "Jan 05, 2024 • 9:30 AM"),
            common::activity("trip-2", "Jan 09, 2024 • 8:00 AM"),
        ],
        None,
    )];
    {
        let mut trips = state.trips.lock().unwrap();
        trips.insert(
            "trip-1".to_string(),
            common::trip_node("trip-1", "COMPLETED", "$10.00", &["1 First St", "2 Second Ave"]),
        );
        trips.insert(
            "trip-2".to_string(),
            common::trip_node("trip-2", "COMPLETED", "$5.50", &["2 Second Ave", "1 First St"]),
        );
    }
    state
}

#[tokio::test]
async fn test_fetch_trips_populates_both_cache_namespaces() {
    let state = two_trip_state();
    let base_url = common::spawn_mock_api(state.clone()).await;
    let root = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(root.path());
    let service = TripService::new(RideApiClient::with_base_url(base_url), cache.clone());

    let (start, end) = january();
    let records = service.fetch_trips(start, end, &jar()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].activity.uuid, "trip-1");
    assert_eq!(records[1].activity.uuid, "trip-2");
    assert_eq!(records[0].detail.fare, "$10.00");

    // One list fetch, one detail fetch per activity.
    assert_eq!(state.activities_call_count(), 1);
    assert_eq!(state.trip_call_count(), 2);

    // Both namespaces are populated.
    assert!(cache
        .get_activities("2024-01-01_2024-01-31")
        .await
        .unwrap()
        .is_some());
    assert!(cache.get_trip("trip-1").await.unwrap().is_some());
    assert!(cache.get_trip("trip-2").await.unwrap().is_some());
}

#[tokio::test]
async fn test_second_fetch_is_served_entirely_from_cache() {
    let state = two_trip_state();
    let base_url = common::spawn_mock_api(state.clone()).await;
    let root = tempfile::tempdir().unwrap();
    let service = TripService::new(
        RideApiClient::with_base_url(base_url),
        CacheStore::new(root.path()),
    );

    let (start, end) = january();
    service.fetch_trips(start, end, &jar()).await.unwrap();
    let records = service.fetch_trips(start, end, &jar()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(state.activities_call_count(), 1, "list served from cache");
    assert_eq!(state.trip_call_count(), 2, "details served from cache");
}

#[tokio::test]
async fn test_detail_cache_hit_skips_only_cached_trips() {
    let state = two_trip_state();
    let base_url = common::spawn_mock_api(state.clone()).await;
    let root = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(root.path());
    let service = TripService::new(RideApiClient::with_base_url(base_url), cache.clone());

    // Pre-seed one trip detail; the other must still be fetched.
    let seeded: ride_reporter::models::TripDetail = serde_json::from_value(
        common::trip_node("trip-1", "COMPLETED", "$10.00", &["1 First St", "2 Second Ave"])
            ["trip"]
            .clone(),
    )
    .unwrap();
    cache.put_trip("trip-1", &seeded).await.unwrap();

    let (start, end) = january();
    let records = service.fetch_trips(start, end, &jar()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(state.trip_call_count(), 1, "only the uncached detail is fetched");
}

#[tokio::test]
async fn test_end_to_end_report_from_fetched_trips() {
    let state = two_trip_state();
    let base_url = common::spawn_mock_api(state.clone()).await;
    let root = tempfile::tempdir().unwrap();
    let service = TripService::new(
        RideApiClient::with_base_url(base_url),
        CacheStore::new(root.path()),
    );

    let (start, end) = january();
    let records = service.fetch_trips(start, end, &jar()).await.unwrap();

    let out = tempfile::tempdir().unwrap();
    let output_path = out.path().join("january.pdf");
    let config = ReportConfig {
        name: "Jordan Rider".to_string(),
        ..ReportConfig::default()
    };
    generate_report(&records, &config, &output_path).unwrap();

    let doc = Document::load(&output_path).unwrap();
    let text = doc.extract_text(&[1]).unwrap();

    // Report period matches the two trip dates, total is their sum.
    assert!(text.contains("01/05/24"), "period start missing: {}", text);
    assert!(text.contains("01/09/24"), "period end missing: {}", text);
    assert!(text.contains("$15.50"), "total missing: {}", text);
}
