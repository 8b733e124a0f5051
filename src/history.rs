//! Classification history.
//!
//! The full history lives as one JSON array under a single store key.
//! Items are immutable; the store supports save, list (newest first),
//! delete-by-id and clear. History is best-effort from the app's point
//! of view: a failed save must not abort the classification flow, and a
//! corrupt stored list reads as empty rather than erroring.

use std::sync::Arc;

use chrono::{Local, TimeZone, Utc};
use log::warn;

use crate::app_response::AppResponse;
use crate::identity::random_suffix;
use crate::local_store::LocalStore;
use crate::models::{Classification, HistoryItem, HistoryItemInput};

pub const HISTORY_KEY: &str = "@history_items";

#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<LocalStore>,
}

fn parse_items(raw: Option<&str>) -> Vec<HistoryItem> {
    match raw {
        Some(json) => match serde_json::from_str::<Vec<HistoryItem>>(json) {
            Ok(items) => items,
            Err(e) => {
                warn!("Stored history is unreadable, treating as empty: {}", e);
                Vec::new()
            }
        },
        None => Vec::new(),
    }
}

impl HistoryStore {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    /// Assigns an id and timestamp to `input`, prepends it to the stored
    /// list and persists the result, all within one store transaction.
    ///
    /// Returns the stored item. Fails with `DatabaseError` when the
    /// store cannot be written; callers treat that as best-effort-failed.
    pub fn save(&self, input: HistoryItemInput) -> Result<HistoryItem, AppResponse> {
        let now = Utc::now().timestamp_millis();
        let item = HistoryItem {
            id: format!("{}-{}", now, random_suffix(6)),
            thumbnail_uri: input.thumbnail_uri,
            original_uri: input.original_uri,
            classification: input.classification,
            confidence: input.confidence,
            class_name: input.class_name,
            timestamp: now,
        };

        let stored = item.clone();
        let mut serialize_failure: Option<AppResponse> = None;
        self.store.update(HISTORY_KEY, |current| {
            let mut items = parse_items(current);
            items.insert(0, stored);
            match serde_json::to_string(&items) {
                Ok(json) => Some(json),
                Err(e) => {
                    serialize_failure = Some(e.into());
                    current.map(str::to_string)
                }
            }
        })?;
        if let Some(failure) = serialize_failure {
            return Err(failure);
        }

        Ok(item)
    }

    /// All stored items, newest first. Never errors: storage failures
    /// and corrupt data both read as an empty history.
    pub fn list(&self) -> Vec<HistoryItem> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not read history, treating as empty: {}", e);
                None
            }
        };
        let mut items = parse_items(raw.as_deref());
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items
    }

    /// Removes the item with the given id. A missing id is a no-op, not
    /// an error.
    pub fn delete_by_id(&self, id: &str) -> Result<(), AppResponse> {
        self.store.update(HISTORY_KEY, |current| {
            let mut items = parse_items(current);
            items.retain(|item| item.id != id);
            match serde_json::to_string(&items) {
                Ok(json) => Some(json),
                Err(e) => {
                    warn!("Could not rewrite history after delete: {}", e);
                    current.map(str::to_string)
                }
            }
        })?;
        Ok(())
    }

    /// Irreversibly removes all stored history.
    pub fn clear(&self) -> Result<(), AppResponse> {
        self.store.remove(HISTORY_KEY)?;
        Ok(())
    }
}

/// Display color for a classification. Fixed four-way mapping used by
/// the history and result screens.
pub fn classification_color(classification: Classification) -> &'static str {
    match classification {
        Classification::Recyclable => "#4CAF50",
        Classification::Compostable => "#8B4513",
        Classification::Landfill => "#757575",
        Classification::Unknown => "#9E9E9E",
    }
}

/// Formats `timestamp` (epoch millis) relative to `now` (epoch millis).
///
/// Under a minute reads "just now"; then whole minutes, hours and days
/// with exact singular forms at 1; a week or older falls back to an
/// absolute `M/D/YYYY` date.
pub fn relative_timestamp(timestamp: i64, now: i64) -> String {
    let diff = now - timestamp;

    if diff < 60_000 {
        return "just now".to_string();
    }

    let minutes = diff / 60_000;
    if minutes < 60 {
        return if minutes == 1 {
            "1 minute ago".to_string()
        } else {
            format!("{} minutes ago", minutes)
        };
    }

    let hours = diff / 3_600_000;
    if hours < 24 {
        return if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        };
    }

    let days = diff / 86_400_000;
    if days < 7 {
        return if days == 1 {
            "1 day ago".to_string()
        } else {
            format!("{} days ago", days)
        };
    }

    match Local.timestamp_millis_opt(timestamp).single() {
        Some(date) => date.format("%-m/%-d/%Y").to_string(),
        None => "unknown date".to_string(),
    }
}
