// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rides API client.
//!
//! Handles:
//! - Cursor-paginated activity feed queries over a date range
//! - Per-trip detail queries, normalized into [`TripDetail`]
//! - Authentication smoke-testing with an existing browser cookie set
//!
//! All requests replay the user's browser session cookies; there is no
//! refresh or retry-on-401 logic. A rejected cookie set surfaces as
//! [`AppError::Authentication`] and the user has to log in again.

use chrono::{Duration, Local};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::cookies::CookieJar;
use crate::error::{AppError, Result};
use crate::models::{ActivityRecord, TripDetail};
use crate::time_utils::day_bounds_ms;

const DEFAULT_BASE_URL: &str = "https://riders.uber.com";
const GRAPHQL_PATH: &str = "/graphql";

/// Fixed page size for activity feed requests. Not caller-configurable.
const ACTIVITY_PAGE_SIZE: u32 = 10;

/// The endpoint requires the header to exist but never validates it.
const CSRF_PLACEHOLDER: &str = "x";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACTIVITIES_QUERY: &str = r#"query Activities($cityID: Int, $endTimeMs: Float, $includePast: Boolean = true, $includeUpcoming: Boolean = true, $limit: Int = 5, $nextPageToken: String, $orderTypes: [RVWebCommonActivityOrderType!] = [RIDES, TRAVEL], $profileType: RVWebCommonActivityProfileType = PERSONAL, $startTimeMs: Float) {
  activities(cityID: $cityID) {
    cityID
    past(
      endTimeMs: $endTimeMs
      limit: $limit
      nextPageToken: $nextPageToken
      orderTypes: $orderTypes
      profileType: $profileType
      startTimeMs: $startTimeMs
    ) @include(if: $includePast) {
      activities {
        ...RVWebCommonActivityFragment
        __typename
      }
      nextPageToken
      __typename
    }
    upcoming @include(if: $includeUpcoming) {
      activities {
        ...RVWebCommonActivityFragment
        __typename
      }
      __typename
    }
    __typename
  }
}

fragment RVWebCommonActivityFragment on RVWebCommonActivity {
  buttons {
    isDefault
    startEnhancerIcon
    text
    url
    __typename
  }
  cardURL
  description
  imageURL {
    light
    dark
    __typename
  }
  subtitle
  title
  uuid
  __typename
}"#;

const GET_TRIP_QUERY: &str = r#"query GetTrip($tripUUID: String!) {
  getTrip(tripUUID: $tripUUID) {
    trip {
      beginTripTime
      cityID
      countryID
      disableCanceling
      disableRating
      driver
      dropoffTime
      fare
      isRidepoolTrip
      isScheduledRide
      isSurgeTrip
      isUberReserve
      jobUUID
      marketplace
      paymentProfileUUID
      status
      uuid
      vehicleDisplayName
      vehicleViewID
      waypoints
      __typename
    }
    mapURL
    polandTaxiLicense
    rating
    receipt {
      carYear
      distance
      distanceLabel
      duration
      vehicleType
      __typename
    }
    __typename
  }
}"#;

const TEST_QUERY: &str = r#"query Activities($endTimeMs: Float, $includePast: Boolean = true, $limit: Int = 1, $startTimeMs: Float) {
  activities {
    past(
      endTimeMs: $endTimeMs
      limit: $limit
      startTimeMs: $startTimeMs
    ) @include(if: $includePast) {
      activities {
        uuid
        title
        __typename
      }
      __typename
    }
    __typename
  }
}"#;

/// Rides API client.
#[derive(Clone)]
pub struct RideApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for RideApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RideApiClient {
    /// Create a client against the production rides site.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against an alternate base URL (tests point this at a
    /// local mock).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch all activities in the inclusive `start..=end` calendar range.
    ///
    /// Pages through the feed until the endpoint stops returning a
    /// continuation token. An empty page terminates pagination even if a
    /// token is present, so a degenerate response cannot loop forever.
    pub async fn fetch_activities(
        &self,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
        cookies: &CookieJar,
    ) -> Result<Vec<ActivityRecord>> {
        let (start_ms, end_ms) = day_bounds_ms(&Local, start, end);

        let mut all = Vec::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut variables = serde_json::json!({
                "includePast": true,
                "includeUpcoming": true,
                "limit": ACTIVITY_PAGE_SIZE,
                "startTimeMs": start_ms,
                "endTimeMs": end_ms,
                "orderTypes": ["RIDES", "TRAVEL"],
                "profileType": "PERSONAL",
            });
            if let Some(token) = &next_page_token {
                variables["nextPageToken"] = serde_json::json!(token);
            }

            let data: ActivitiesData = self
                .post_graphql("Activities", ACTIVITIES_QUERY, variables, cookies)
                .await?;

            let page = data.activities.and_then(|a| a.past).unwrap_or_default();
            let raw = page.activities.unwrap_or_default();

            if raw.is_empty() {
                break;
            }

            tracing::debug!(count = raw.len(), "Fetched activity page");
            all.extend(parse_activity_records(raw));

            match page.next_page_token {
                Some(token) if !token.is_empty() => next_page_token = Some(token),
                _ => break,
            }
        }

        tracing::info!(
            count = all.len(),
            start = %start,
            end = %end,
            "Fetched activities"
        );
        Ok(all)
    }

    /// Fetch the full detail record for one trip.
    pub async fn fetch_trip_detail(
        &self,
        trip_uuid: &str,
        cookies: &CookieJar,
    ) -> Result<TripDetail> {
        let variables = serde_json::json!({ "tripUUID": trip_uuid });

        let data: GetTripData = self
            .post_graphql("GetTrip", GET_TRIP_QUERY, variables, cookies)
            .await?;

        Ok(normalize_trip_detail(trip_uuid, data.get_trip))
    }

    /// Validate the cookie set with a one-item query over the trailing
    /// twelve months. Never returns an error: the outcome is always a
    /// [`ConnectionStatus`] the caller can show verbatim.
    pub async fn test_connection(&self, cookies: &CookieJar) -> ConnectionStatus {
        let now = Local::now();
        let year_ago = now - Duration::days(365);

        let variables = serde_json::json!({
            "includePast": true,
            "limit": 1,
            "startTimeMs": year_ago.timestamp_millis(),
            "endTimeMs": now.timestamp_millis(),
        });

        match self
            .post_graphql::<ActivitiesData>("Activities", TEST_QUERY, variables, cookies)
            .await
        {
            Ok(data) if data.activities.is_some() => ConnectionStatus {
                ok: true,
                message: "Successfully connected to the rides API".to_string(),
            },
            Ok(_) => ConnectionStatus {
                ok: false,
                message: "Connected but received an unexpected response. You may not be logged in."
                    .to_string(),
            },
            Err(e) if e.is_auth_error() => ConnectionStatus {
                ok: false,
                message: format!("Authentication failed. {}.", AppError::AUTH_HINT),
            },
            Err(e) => ConnectionStatus {
                ok: false,
                message: format!("Connection failed: {}", e),
            },
        }
    }

    /// POST one GraphQL operation and parse the `data` envelope.
    async fn post_graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
        cookies: &CookieJar,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, GRAPHQL_PATH);
        let payload = serde_json::json!({
            "operationName": operation,
            "variables": variables,
            "query": query,
        });

        let response = self
            .http
            .post(&url)
            .header("x-csrf-token", CSRF_PLACEHOLDER)
            .header(reqwest::header::COOKIE, cookies.header_value())
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let response = check_response(operation, response).await?;

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::Protocol(format!("{} response is not JSON: {}", operation, e)))?;

        body.data
            .ok_or_else(|| AppError::Protocol(format!("{} response has no data", operation)))
    }
}

/// Result of an authentication smoke test.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub ok: bool,
    pub message: String,
}

/// Check response status, classifying auth failures separately.
async fn check_response(
    operation: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // The rides site answers bad cookies with 404 on some routes, so 404 is
    // an auth failure here, not a missing resource.
    if matches!(status.as_u16(), 401 | 403 | 404) {
        tracing::warn!(operation, status = status.as_u16(), "Cookies rejected");
        return Err(AppError::Authentication(format!(
            "HTTP {}. {}",
            status.as_u16(),
            AppError::AUTH_HINT
        )));
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::Network(format!(
        "{} failed with HTTP {}: {}",
        operation, status, body
    )))
}

/// Parse raw activity values, dropping malformed records instead of failing
/// the page.
fn parse_activity_records(raw: Vec<serde_json::Value>) -> Vec<ActivityRecord> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<ActivityRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed activity record");
                None
            }
        })
        .collect()
}

/// Build a [`TripDetail`] from the (possibly sparse) detail response.
///
/// A missing `trip` node degrades to a default record rather than failing;
/// the requested UUID backstops the identifier so the record is never
/// identifier-less.
fn normalize_trip_detail(trip_uuid: &str, node: Option<GetTripNode>) -> TripDetail {
    let node = node.unwrap_or_default();

    let mut detail = match node.trip {
        Some(value) => match serde_json::from_value::<TripDetail>(value) {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!(trip_uuid, error = %e, "Malformed trip node, using defaults");
                TripDetail::default()
            }
        },
        None => {
            tracing::warn!(trip_uuid, "Detail response has no trip node");
            TripDetail::default()
        }
    };

    if detail.uuid.is_empty() {
        detail.uuid = trip_uuid.to_string();
    }

    if let Some(receipt) = node.receipt {
        if let Some(label) = receipt.distance_label {
            detail.distance_label = label;
        }
        if let Some(duration) = receipt.duration.as_ref().and_then(|d| d.as_u64()) {
            detail.duration = duration as u32;
        }
    }
    if node.map_url.is_some() {
        detail.map_url = node.map_url;
    }
    if let Some(rating) = node.rating.as_ref().and_then(|r| r.as_f64()) {
        detail.rating = Some(rating);
    }

    detail
}

// ─── Wire types ──────────────────────────────────────────────────────────────
//
// Every level is optional: the endpoint nulls out whole subtrees freely.

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
}

#[derive(Default, Deserialize)]
struct ActivitiesData {
    activities: Option<ActivitiesNode>,
}

#[derive(Default, Deserialize)]
struct ActivitiesNode {
    past: Option<PastActivities>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PastActivities {
    activities: Option<Vec<serde_json::Value>>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTripData {
    get_trip: Option<GetTripNode>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTripNode {
    trip: Option<serde_json::Value>,
    receipt: Option<ReceiptNode>,
    #[serde(rename = "mapURL")]
    map_url: Option<String>,
    rating: Option<serde_json::Value>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptNode {
    distance_label: Option<String>,
    duration: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripStatus;

    #[test]
    fn test_normalize_missing_trip_node_backstops_uuid() {
        let detail = normalize_trip_detail("trip-1", None);
        assert_eq!(detail.uuid, "trip-1");
        assert_eq!(detail.status, TripStatus::Unknown);
        assert_eq!(detail.fare, "N/A");
        assert!(detail.waypoints.is_empty());
    }

    #[test]
    fn test_normalize_merges_receipt_fields() {
        let node: GetTripNode = serde_json::from_value(serde_json::json!({
            "trip": {
                "uuid": "trip-2",
                "status": "COMPLETED",
                "fare": "$12.34",
                "waypoints": ["A St", "B Ave"],
            },
            "receipt": { "distanceLabel": "5.2 miles", "duration": 1260 },
            "mapURL": "https://maps.example.com/t2",
            "rating": 5.0,
        }))
        .unwrap();

        let detail = normalize_trip_detail("trip-2", Some(node));
        assert_eq!(detail.status, TripStatus::Completed);
        assert_eq!(detail.fare, "$12.34");
        assert_eq!(detail.distance_label, "5.2 miles");
        assert_eq!(detail.duration, 1260);
        assert_eq!(detail.map_url.as_deref(), Some("https://maps.example.com/t2"));
        assert_eq!(detail.rating, Some(5.0));
    }

    #[test]
    fn test_malformed_activity_records_are_dropped() {
        let raw = vec![
            serde_json::json!({"uuid": "a-1", "subtitle": "Jan 5 • 9:00 AM"}),
            serde_json::json!({"title": "no uuid"}),
            serde_json::json!({"uuid": "a-2"}),
        ];
        let records = parse_activity_records(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].uuid, "a-1");
        assert_eq!(records[1].uuid, "a-2");
    }
}
