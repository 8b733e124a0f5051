//! Data model definitions for the offline core.
//!
//! Everything the store persists and everything that crosses the FFI
//! boundary is defined here as a serde-derived type. Field names follow
//! the JSON the mobile shell already speaks: history items use camelCase
//! keys, leaderboard entries use the ranking service's snake_case wire
//! names plus the shell's `name`/`isCurrentUser` extensions.

use serde::{Deserialize, Serialize};

/// Four-way waste classification derived from a predicted object label.
///
/// Serialized in lowercase (`"recyclable"`, `"compostable"`, `"landfill"`,
/// `"unknown"`), which is the form stored in history items and shown by
/// the shell.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Recyclable,
    Compostable,
    Landfill,
    Unknown,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Recyclable => "recyclable",
            Classification::Compostable => "compostable",
            Classification::Landfill => "landfill",
            Classification::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single stored classification event.
///
/// Items are immutable once created; the only mutations the history
/// store supports are deletion by id and a bulk clear. `id` is derived
/// from the creation time and is unique within the store.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// Unique identifier, `<epoch-millis>-<suffix>`.
    pub id: String,
    /// URI of the shell-generated thumbnail for this capture.
    pub thumbnail_uri: String,
    /// URI of the original capture.
    pub original_uri: String,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Raw predicted class label, when the detector returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
}

/// Caller-supplied portion of a history item; `id` and `timestamp` are
/// assigned by the store on save.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItemInput {
    pub thumbnail_uri: String,
    pub original_uri: String,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

/// One record as returned by the ranking service.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteRecord {
    pub user_id: String,
    pub score: i64,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub last_updated: String,
}

/// One row of the leaderboard as consumed by the shell.
///
/// Invariants across any list the core returns: ranks are contiguous
/// starting at 1, scores are non-increasing, and at most one entry is
/// flagged `isCurrentUser`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LeaderboardEntry {
    pub user_id: String,
    /// Human-readable pseudonym. The ranking service keys records by the
    /// derived name, so this mirrors `user_id`.
    #[serde(rename = "name")]
    pub display_name: String,
    pub score: i64,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub last_updated: String,
    #[serde(rename = "isCurrentUser", default)]
    pub is_current_user: bool,
}

/// A single prediction from the hosted detection endpoint.
///
/// Older model versions report `confidence_score` instead of
/// `confidence`; [`Prediction::confidence_value`] resolves whichever is
/// present.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

impl Prediction {
    pub fn confidence_value(&self) -> Option<f64> {
        self.confidence.or(self.confidence_score)
    }
}

/// Response body of the detection endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DetectionOutcome {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

impl DetectionOutcome {
    /// Highest-confidence prediction, or the first one when the endpoint
    /// reports no confidence at all.
    pub fn top_prediction(&self) -> Option<&Prediction> {
        let mut best: Option<&Prediction> = None;
        for p in &self.predictions {
            match best {
                None => best = Some(p),
                Some(b) => {
                    if p.confidence_value().unwrap_or(0.0) > b.confidence_value().unwrap_or(0.0) {
                        best = Some(p);
                    }
                }
            }
        }
        best
    }
}

fn default_ranking_base_url() -> String {
    "https://recyclingleaderboard-production.up.railway.app".to_string()
}

fn default_detector_base_url() -> String {
    "https://detect.roboflow.com".to_string()
}

fn default_detector_model() -> String {
    "trash-recycle-compost-etc-etc".to_string()
}

fn default_detector_version() -> String {
    "1".to_string()
}

/// Configuration for the hosted detection endpoint.
///
/// There is no default API key; detection requests without one are
/// rejected before any network call.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    pub base_url: String,
    pub model: String,
    pub version: String,
    pub api_key: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_detector_base_url(),
            model: default_detector_model(),
            version: default_detector_version(),
            api_key: None,
        }
    }
}

/// App-level configuration, deserialized from the JSON the shell passes
/// to `create_app_with_config`. Every field has a production default.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub ranking_base_url: String,
    pub detector: DetectorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ranking_base_url: default_ranking_base_url(),
            detector: DetectorConfig::default(),
        }
    }
}
