// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pre-computed trip statistics for the summary panel.
//!
//! Computed in one pass over the fetched records so the display glue never
//! has to re-derive fares or dates itself.

use serde::{Deserialize, Serialize};

use crate::models::trip::{parse_fare, TripRecord};
use crate::time_utils::parse_subtitle_date;

/// Aggregate statistics over the completed subset of a trip list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripStatistics {
    /// Completed trips only
    pub total_trips: u32,
    /// Sum of parsed fares (unparsable fares count as zero)
    pub total_cost: f64,
    /// Mean fare per completed trip
    pub avg_cost: f64,
    /// Sum of the numeric part of each distance label
    pub total_distance: f64,
    /// Sum of ride durations, seconds
    pub total_duration_secs: u64,
    /// Trips flagged as surge-priced
    pub surge_trips: u32,
    /// Trips booked as scheduled rides
    pub scheduled_trips: u32,
    /// Inclusive calendar-day span between the earliest and latest trip
    /// dates, zero when no subtitle date parses
    pub day_span: u32,
}

impl TripStatistics {
    /// Compute statistics over `records`, or `None` when it contains no
    /// completed trips.
    pub fn compute(records: &[TripRecord]) -> Option<Self> {
        let completed: Vec<&TripRecord> = records
            .iter()
            .filter(|r| r.detail.status.is_completed())
            .collect();

        if completed.is_empty() {
            return None;
        }

        let total_trips = completed.len() as u32;
        let total_cost: f64 = completed
            .iter()
            .map(|r| parse_fare(&r.detail.fare).unwrap_or(0.0))
            .sum();
        let total_distance: f64 = completed
            .iter()
            .map(|r| parse_label_number(&r.detail.distance_label))
            .sum();
        let total_duration_secs: u64 = completed.iter().map(|r| u64::from(r.detail.duration)).sum();
        let surge_trips = completed.iter().filter(|r| r.detail.is_surge_trip).count() as u32;
        let scheduled_trips = completed
            .iter()
            .filter(|r| r.detail.is_scheduled_ride)
            .count() as u32;

        let mut dates: Vec<_> = completed
            .iter()
            .filter_map(|r| parse_subtitle_date(&r.activity.subtitle))
            .collect();
        dates.sort_unstable();
        let day_span = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => (*last - *first).num_days() as u32 + 1,
            _ => 0,
        };

        Some(Self {
            total_trips,
            total_cost,
            avg_cost: total_cost / f64::from(total_trips),
            total_distance,
            total_duration_secs,
            surge_trips,
            scheduled_trips,
            day_span,
        })
    }
}

/// Numeric magnitude embedded in a label like `"5.2 miles"`.
fn parse_label_number(label: &str) -> f64 {
    let digits: String = label
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::{TripDetail, TripStatus};
    use crate::models::ActivityRecord;

    fn record(subtitle: &str, status: TripStatus, fare: &str, surge: bool) -> TripRecord {
        let activity: ActivityRecord = serde_json::from_value(serde_json::json!({
            "uuid": "t",
            "subtitle": subtitle,
        }))
        .unwrap();
        TripRecord {
            activity,
            detail: TripDetail {
                status,
                fare: fare.to_string(),
                distance_label: "2.5 miles".to_string(),
                duration: 600,
                is_surge_trip: surge,
                ..TripDetail::default()
            },
        }
    }

    #[test]
    fn test_compute_over_completed_trips() {
        let records = vec![
            record("Jan 5, 2024 • 9:00 AM", TripStatus::Completed, "$10.00", true),
            record("Jan 9, 2024 • 9:00 AM", TripStatus::Completed, "$5.50", false),
            record("Jan 7, 2024 • 9:00 AM", TripStatus::Canceled, "$99.00", false),
        ];

        let stats = TripStatistics::compute(&records).unwrap();
        assert_eq!(stats.total_trips, 2);
        assert!((stats.total_cost - 15.5).abs() < 1e-9);
        assert!((stats.avg_cost - 7.75).abs() < 1e-9);
        assert!((stats.total_distance - 5.0).abs() < 1e-9);
        assert_eq!(stats.total_duration_secs, 1200);
        assert_eq!(stats.surge_trips, 1);
        assert_eq!(stats.scheduled_trips, 0);
        assert_eq!(stats.day_span, 5);
    }

    #[test]
    fn test_no_completed_trips_is_none() {
        let records = vec![record("Jan 5, 2024 • 9:00 AM", TripStatus::Canceled, "$1.00", false)];
        assert!(TripStatistics::compute(&records).is_none());
    }

    #[test]
    fn test_unparsable_fares_count_as_zero() {
        let records = vec![
            record("Jan 5, 2024 • 9:00 AM", TripStatus::Completed, "N/A", false),
            record("Jan 5, 2024 • 9:00 AM", TripStatus::Completed, "$4.00", false),
        ];
        let stats = TripStatistics::compute(&records).unwrap();
        assert!((stats.total_cost - 4.0).abs() < 1e-9);
    }
}
