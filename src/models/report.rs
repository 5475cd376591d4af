// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Report configuration and address display-name resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// User-defined substitution of a raw address for a friendly display label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressMapping {
    pub address: String,
    pub display_name: String,
}

/// Identity fields and address mappings consumed at report-generation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    /// Report subject. The only required field.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vendor_number: String,
    #[serde(default)]
    pub purchase_order: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub address_mappings: Vec<AddressMapping>,
    /// Optional JPEG logo drawn in the page header.
    #[serde(default)]
    pub logo_path: Option<PathBuf>,
}

impl ReportConfig {
    /// Load a persisted report configuration (the settings glue writes the
    /// same JSON shape).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| {
            AppError::ReportInput(format!(
                "Invalid report config {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Validate the fields a report cannot be generated without.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ReportInput(
                "Report config is missing the subject name".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve the display string for a raw waypoint address.
///
/// Resolution order: exact match on the mapping's address, then the first
/// mapping (in list order) whose address is a substring of the raw address
/// or vice versa, then the raw address unchanged. First match wins; the
/// result is deterministic for a given mapping list and ordering.
pub fn resolve_display_name<'a>(raw: &'a str, mappings: &'a [AddressMapping]) -> &'a str {
    if mappings.is_empty() {
        return raw;
    }

    if let Some(exact) = mappings.iter().find(|m| m.address == raw) {
        return &exact.display_name;
    }

    mappings
        .iter()
        .find(|m| raw.contains(&m.address) || m.address.contains(raw))
        .map(|m| m.display_name.as_str())
        .unwrap_or(raw)
}
