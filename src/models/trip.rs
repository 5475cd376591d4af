// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Trip detail models.
//!
//! A trip detail is the full per-trip record (fare, waypoints, status, ...)
//! fetched by a separate, more expensive call than the activity feed, and
//! cached independently under the trip identifier.

use serde::{Deserialize, Serialize};

use crate::models::ActivityRecord;

/// Trip lifecycle status. Only `COMPLETED` trips are eligible for receipt
/// download and report rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TripStatus {
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "CANCELED", alias = "CANCELLED")]
    Canceled,
    #[serde(rename = "UNFULFILLED")]
    Unfulfilled,
    /// Any status this version does not know about. Never report-eligible.
    #[default]
    #[serde(other, rename = "UNKNOWN")]
    Unknown,
}

impl TripStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, TripStatus::Completed)
    }
}

/// Normalized full trip record.
///
/// Combines the `trip` and `receipt` nodes of the detail response. Every
/// field has a wire default so a sparse response degrades to a harmless
/// record instead of failing the whole fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetail {
    /// Trip identifier as echoed by the detail endpoint
    #[serde(default)]
    pub uuid: String,
    /// Dispatch job identifier; preferred over `uuid` when present
    #[serde(default, rename = "jobUUID")]
    pub job_uuid: Option<String>,
    #[serde(default)]
    pub status: TripStatus,
    /// Currency-formatted fare string, e.g. `"$12.34"`
    #[serde(default = "default_fare")]
    pub fare: String,
    /// Ordered addresses; index 0 = origin, index 1 = destination
    #[serde(default)]
    pub waypoints: Vec<String>,
    #[serde(default)]
    pub vehicle_display_name: String,
    #[serde(default)]
    pub is_surge_trip: bool,
    #[serde(default)]
    pub is_scheduled_ride: bool,
    /// Distance with embedded unit, e.g. `"5.2 miles"`
    #[serde(default)]
    pub distance_label: String,
    /// Ride duration in seconds
    #[serde(default)]
    pub duration: u32,

    // Passthrough fields, carried for display but unused by the core.
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, rename = "mapURL")]
    pub map_url: Option<String>,
    #[serde(default)]
    pub begin_trip_time: Option<String>,
    #[serde(default)]
    pub dropoff_time: Option<String>,
}

fn default_fare() -> String {
    "N/A".to_string()
}

impl Default for TripDetail {
    fn default() -> Self {
        Self {
            uuid: String::new(),
            job_uuid: None,
            status: TripStatus::Unknown,
            fare: default_fare(),
            waypoints: Vec::new(),
            vehicle_display_name: String::new(),
            is_surge_trip: false,
            is_scheduled_ride: false,
            distance_label: String::new(),
            duration: 0,
            driver: None,
            rating: None,
            map_url: None,
            begin_trip_time: None,
            dropoff_time: None,
        }
    }
}

/// One activity paired with its trip detail, the unit the receipt and
/// report stages consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRecord {
    pub activity: ActivityRecord,
    pub detail: TripDetail,
}

/// Resolve the canonical trip identifier for a record.
///
/// The dispatch `jobUUID` wins when present; otherwise the activity's own
/// `uuid` backstops it. Cache keys, receipt selection, and report rows all
/// go through here so the subsystems never diverge on identity.
pub fn resolve_trip_id<'a>(activity: &'a ActivityRecord, detail: &'a TripDetail) -> &'a str {
    match detail.job_uuid.as_deref() {
        Some(job_uuid) if !job_uuid.is_empty() => job_uuid,
        _ => &activity.uuid,
    }
}

/// Parse the numeric magnitude out of a currency-formatted fare string.
///
/// Strips `$` and thousands separators. Returns `None` for anything that is
/// not a plain number afterwards (`"N/A"`, foreign symbols, empty).
pub fn parse_fare(fare: &str) -> Option<f64> {
    let cleaned: String = fare.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned.trim().parse::<f64>().ok()
}
