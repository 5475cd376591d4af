// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Ride-Reporter: turn ride-sharing trip history into expense reports
//!
//! This crate authenticates against the rides site with an existing browser
//! session's cookies, retrieves trip activity and detail records over a date
//! range (fronted by a local on-disk cache), downloads and merges PDF
//! receipts, and generates a paginated tabular expense-report PDF with
//! per-trip rows, a monthly total, and signature lines.

pub mod config;
pub mod cookies;
pub mod error;
pub mod logbuf;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{CacheStore, ReceiptService, RideApiClient, TripService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub trip_service: TripService,
    pub receipt_service: ReceiptService,
}

impl AppState {
    /// Wire up the services from a loaded configuration.
    pub fn new(config: Config) -> Self {
        let cache = CacheStore::new(config.cache_root.clone());
        let api = RideApiClient::with_base_url(config.api_base_url.clone());
        Self {
            trip_service: TripService::new(api, cache.clone()),
            receipt_service: ReceiptService::new(config.api_base_url.clone(), cache),
            config,
        }
    }
}
