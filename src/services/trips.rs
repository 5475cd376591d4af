// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip fetch pipeline.
//!
//! Handles the core workflow:
//! 1. Consult the activity-list cache for the date range
//! 2. On miss, fetch from the rides API and cache the result
//! 3. For each activity, consult the trip-detail cache
//! 4. On miss, fetch the detail and cache it
//! 5. Hand the combined records to the receipt or report stages
//!
//! Cache writes are best-effort: a failed write is logged and the pipeline
//! continues with the data it already has in memory. All detail fetches
//! complete before anything downstream runs, so report row order never
//! depends on fetch completion order.

use futures_util::{StreamExt, TryStreamExt};

use crate::cookies::CookieJar;
use crate::error::Result;
use crate::models::{ActivityRecord, TripDetail, TripRecord};
use crate::services::api::RideApiClient;
use crate::services::cache::CacheStore;

/// Independent per-trip detail fetches in flight at once. Keys are disjoint,
/// so no cross-trip coordination is needed.
const DETAIL_FETCH_CONCURRENCY: usize = 4;

/// Cache-fronted trip retrieval service.
#[derive(Clone)]
pub struct TripService {
    api: RideApiClient,
    cache: CacheStore,
}

impl TripService {
    pub fn new(api: RideApiClient, cache: CacheStore) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &RideApiClient {
        &self.api
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Fetch all trips in the inclusive date range, with their details,
    /// going to the network only for cache misses.
    pub async fn fetch_trips(
        &self,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
        cookies: &CookieJar,
    ) -> Result<Vec<TripRecord>> {
        let key = CacheStore::range_key(start, end);

        // A cached empty list is refetched: an empty range is cheap to
        // re-query and was usually cached before the trips settled.
        let activities = match self.cache.get_activities(&key).await? {
            Some(cached) if !cached.is_empty() => {
                tracing::info!(key = %key, count = cached.len(), "Activity cache hit");
                cached
            }
            _ => {
                let fetched = self.api.fetch_activities(start, end, cookies).await?;
                if let Err(e) = self.cache.put_activities(&key, &fetched).await {
                    tracing::warn!(key = %key, error = %e, "Failed to cache activities, continuing");
                }
                fetched
            }
        };

        // buffered() preserves input order, so the records come back in
        // activity-feed order regardless of which detail lands first.
        futures_util::stream::iter(activities.into_iter().map(move |activity| async move {
            let detail = self.trip_detail(&activity, cookies).await?;
            Ok(TripRecord { activity, detail })
        }))
        .buffered(DETAIL_FETCH_CONCURRENCY)
        .try_collect()
        .await
    }

    /// Cache-or-fetch one trip's detail record. The cache key is the
    /// activity UUID, the only identifier known before the detail exists.
    async fn trip_detail(
        &self,
        activity: &ActivityRecord,
        cookies: &CookieJar,
    ) -> Result<TripDetail> {
        if let Some(detail) = self.cache.get_trip(&activity.uuid).await? {
            tracing::debug!(trip_uuid = %activity.uuid, "Trip detail cache hit");
            return Ok(detail);
        }

        let detail = self.api.fetch_trip_detail(&activity.uuid, cookies).await?;
        if let Err(e) = self.cache.put_trip(&activity.uuid, &detail).await {
            tracing::warn!(
                trip_uuid = %activity.uuid,
                error = %e,
                "Failed to cache trip detail, continuing"
            );
        }
        Ok(detail)
    }
}
