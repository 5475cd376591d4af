// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod api;
pub mod cache;
pub mod receipts;
pub mod report;
pub mod trips;

pub use api::{ConnectionStatus, RideApiClient};
pub use cache::{CacheStats, CacheStore};
pub use receipts::ReceiptService;
pub use report::{build_report_table, generate_report, ReportRow, ReportTable};
pub use trips::TripService;
