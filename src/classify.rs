//! Waste classification: keyword rules plus the hosted-detector client.
//!
//! The heavy lifting (object detection) happens in a remote model; the
//! core's own logic is the fixed mapping from a predicted label to a
//! recyclability class, the per-material guidance text, and a thin
//! upload client with a bounded timeout.

use std::time::Duration;

use crate::app_response::AppResponse;
use crate::models::{Classification, DetectionOutcome, DetectorConfig};

const RECYCLABLE_KEYWORDS: [&str; 10] = [
    "plastic", "paper", "glass", "metal", "aluminum", "cardboard", "carton", "can", "bottle",
    "tin",
];

const COMPOSTABLE_KEYWORDS: [&str; 7] = [
    "compost", "food", "organic", "fruit", "vegetable", "leaf", "yard",
];

/// Maps a predicted object label to a recyclability class.
///
/// Pure keyword matching over the lowercased label: recyclable-material
/// keywords win over compostable ones, an empty label is `Unknown`, and
/// anything with no keyword at all lands in `Landfill`.
pub fn classify_recyclability(label: &str) -> Classification {
    let lower = label.trim().to_lowercase();
    if lower.is_empty() {
        return Classification::Unknown;
    }
    if RECYCLABLE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Classification::Recyclable;
    }
    if COMPOSTABLE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Classification::Compostable;
    }
    Classification::Landfill
}

/// Disposal guidance for a predicted label. Keyword order matters: the
/// first matching material wins.
pub fn recycling_advice(label: &str) -> &'static str {
    let lower = label.to_lowercase();
    if lower.contains("plastic") {
        return "This item is recyclable in most curbside recycling programs. Please ensure it is clean and dry before recycling.";
    }
    if lower.contains("paper") {
        return "This item is recyclable in curbside recycling programs. Please remove any non-paper components before recycling.";
    }
    if lower.contains("glass") {
        return "This item is recyclable in most curbside recycling programs. Please rinse it out before recycling.";
    }
    if lower.contains("metal") {
        return "This item is recyclable in most curbside recycling programs. Please ensure it is clean before recycling.";
    }
    if lower.contains("cardboard") {
        return "This item is recyclable in curbside recycling programs. Please flatten it and remove any non-cardboard materials before recycling.";
    }
    if lower.contains("shoes") {
        return "Shoes can often be recycled through specialized programs. Please check with local recycling centers for options.";
    }
    if lower.contains("clothing") {
        return "Clothing can be donated or recycled through textile recycling programs. Please ensure items are clean and in good condition.";
    }
    if lower.contains("battery") {
        return "Batteries should be recycled at designated battery recycling locations. Do not dispose of them in regular trash or recycling bins.";
    }
    "Recycling information for this item is not available. Please check with your local recycling program for guidance."
}

const DETECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the hosted detection endpoint. Uploads the captured image
/// as multipart form data and returns the parsed prediction list.
pub struct DetectorClient {
    http: reqwest::blocking::Client,
    config: DetectorConfig,
}

impl DetectorClient {
    pub fn new(config: DetectorConfig) -> Result<Self, AppResponse> {
        let http = reqwest::blocking::Client::builder()
            .timeout(DETECT_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Sends `image` (encoded JPEG/PNG bytes) to the detection model.
    ///
    /// Requires a configured API key; rejects empty payloads before any
    /// network traffic. Timeouts and non-success statuses surface as
    /// `NetworkError` — recoverable, the capture flow shows "no
    /// detections" and moves on.
    pub fn detect(&self, image: &[u8]) -> Result<DetectionOutcome, AppResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppResponse::ValidationError("Detector API key is not configured".to_string())
            })?;

        if image.is_empty() {
            return Err(AppResponse::BadRequest("Empty image payload".to_string()));
        }

        let url = format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            self.config.version
        );

        let part = reqwest::blocking::multipart::Part::bytes(image.to_vec())
            .file_name("image.jpg")
            .mime_str("image/jpeg")?;
        let form = reqwest::blocking::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .query(&[("api_key", api_key)])
            .multipart(form)
            .send()?;

        if !response.status().is_success() {
            return Err(AppResponse::NetworkError(format!(
                "Detection failed with status {}",
                response.status()
            )));
        }

        Ok(response.json::<DetectionOutcome>()?)
    }
}
