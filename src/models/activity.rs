// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity feed models.
//!
//! An activity is one calendar-visible entry in the rides activity feed,
//! distinct from the full trip detail record fetched by a separate call.
//! Every field except `uuid` is optional on the wire and defaults to empty.

use serde::{Deserialize, Serialize};

/// One activity feed entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Stable trip identifier (also the trip-detail cache key)
    pub uuid: String,
    /// Display title (e.g. vehicle class)
    #[serde(default)]
    pub title: String,
    /// Free-text date and time, `"Nov 07 \u{2022} 10:30 AM"`. The only source
    /// of the trip date for sorting and display.
    #[serde(default)]
    pub subtitle: String,
    /// Free-text description (fare summary, driver, etc.)
    #[serde(default)]
    pub description: String,
    /// Deep link to the trip card on the rides site
    #[serde(default, rename = "cardURL")]
    pub card_url: String,
    /// Action descriptors attached to the entry
    #[serde(default)]
    pub buttons: Vec<ActivityButton>,
    /// Map thumbnail, light and dark variants
    #[serde(default, rename = "imageURL")]
    pub image_url: Option<ActivityImageUrl>,
}

/// Action descriptor on an activity entry ("View receipt", "Rebook", ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityButton {
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub start_enhancer_icon: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Map thumbnail URL pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityImageUrl {
    #[serde(default)]
    pub light: String,
    #[serde(default)]
    pub dark: String,
}
