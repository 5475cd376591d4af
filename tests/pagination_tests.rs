// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity feed pagination tests.
//!
//! These tests verify that:
//! 1. Pages are concatenated in order while tokens keep arriving
//! 2. An empty page terminates pagination even when a token is present
//! 3. Auth-shaped HTTP failures surface as authentication errors

use std::sync::Arc;

use chrono::NaiveDate;
use ride_reporter::cookies::CookieJar;
use ride_reporter::services::RideApiClient;

mod common;

fn jar() -> CookieJar {
    CookieJar::from_pairs([("sid", "test-session")])
}

fn range() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
}

#[tokio::test]
async fn test_pages_concatenate_in_order() {
    let state = Arc::new(common::MockState::default());
    *state.activity_pages.lock().unwrap() = vec![
        common::page(
            vec![
                common::activity("a-1", "Jan 05, 2024 • 9:00 AM"),
                common::activity("a-2", "Jan 06, 2024 • 9:00 AM"),
            ],
            Some("cursor-1"),
        ),
        common::page(
            vec![common::activity("a-3", "Jan 07, 2024 • 9:00 AM")],
            Some("cursor-2"),
        ),
        // Degenerate final page: still carries a token, but is empty and
        // must terminate the loop.
        common::page(vec![], Some("cursor-3")),
    ];

    let base_url = common::spawn_mock_api(state.clone()).await;
    let client = RideApiClient::with_base_url(base_url);

    let (start, end) = range();
    let activities = client.fetch_activities(start, end, &jar()).await.unwrap();

    let uuids: Vec<&str> = activities.iter().map(|a| a.uuid.as_str()).collect();
    assert_eq!(uuids, vec!["a-1", "a-2", "a-3"]);
    assert_eq!(state.activities_call_count(), 3);
}

#[tokio::test]
async fn test_missing_token_stops_after_one_page() {
    let state = Arc::new(common::MockState::default());
    *state.activity_pages.lock().unwrap() = vec![common::page(
        vec![common::activity("a-1", "Jan 05, 2024 • 9:00 AM")],
        None,
    )];

    let base_url = common::spawn_mock_api(state.clone()).await;
    let client = RideApiClient::with_base_url(base_url);

    let (start, end) = range();
    let activities = client.fetch_activities(start, end, &jar()).await.unwrap();

    assert_eq!(activities.len(), 1);
    assert_eq!(state.activities_call_count(), 1);
}

#[tokio::test]
async fn test_empty_range_returns_no_activities() {
    let state = Arc::new(common::MockState::default());

    let base_url = common::spawn_mock_api(state.clone()).await;
    let client = RideApiClient::with_base_url(base_url);

    let (start, end) = range();
    let activities = client.fetch_activities(start, end, &jar()).await.unwrap();

    assert!(activities.is_empty());
    assert_eq!(state.activities_call_count(), 1);
}

#[tokio::test]
async fn test_rejected_cookies_surface_as_authentication_error() {
    let state = Arc::new(common::MockState::default());
    *state.force_status.lock().unwrap() = Some(401);

    let base_url = common::spawn_mock_api(state.clone()).await;
    let client = RideApiClient::with_base_url(base_url);

    let (start, end) = range();
    let err = client.fetch_activities(start, end, &jar()).await.unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_connection_test_classifies_outcomes() {
    // Success: any well-formed activities payload.
    let state = Arc::new(common::MockState::default());
    let base_url = common::spawn_mock_api(state.clone()).await;
    let client = RideApiClient::with_base_url(base_url);
    let status = client.test_connection(&jar()).await;
    assert!(status.ok, "unexpected failure: {}", status.message);

    // Auth failure: 401/403/404 get the log-in-again message.
    for code in [401u16, 403, 404] {
        let state = Arc::new(common::MockState::default());
        *state.force_status.lock().unwrap() = Some(code);
        let base_url = common::spawn_mock_api(state.clone()).await;
        let client = RideApiClient::with_base_url(base_url);

        let status = client.test_connection(&jar()).await;
        assert!(!status.ok);
        assert!(
            status.message.starts_with("Authentication failed"),
            "HTTP {} should classify as auth failure, got: {}",
            code,
            status.message
        );
    }

    // Anything else is a generic connectivity failure.
    let state = Arc::new(common::MockState::default());
    *state.force_status.lock().unwrap() = Some(500);
    let base_url = common::spawn_mock_api(state.clone()).await;
    let client = RideApiClient::with_base_url(base_url);

    let status = client.test_connection(&jar()).await;
    assert!(!status.ok);
    assert!(status.message.starts_with("Connection failed"));
}
