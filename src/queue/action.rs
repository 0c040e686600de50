//! Queued actions and their persisted encoding.
//!
//! The persisted form is a JSON array using the same field names the web
//! front end writes (`type`, `url`, `data`, `timestamp`), so a queue captured
//! by either side can be replayed by the other.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SyncError;

/// Kind of deferred network action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A quiz or progress form submitted while offline.
    FormSubmission,
}

impl ActionKind {
    /// Get the display name for this kind.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::FormSubmission => "Form Submission",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A captured, not-yet-delivered submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// What kind of action this is.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Destination URL, absolute or relative to the endpoint base URL.
    #[serde(rename = "url")]
    pub target: String,
    /// Form fields captured at submission time.
    #[serde(rename = "data", default)]
    pub payload: BTreeMap<String, String>,
    /// When the original submission was attempted.
    #[serde(rename = "timestamp")]
    pub captured_at: DateTime<Utc>,
}

impl QueuedAction {
    /// Capture a form submission now.
    #[must_use]
    pub fn form_submission(target: impl Into<String>, payload: BTreeMap<String, String>) -> Self {
        Self {
            kind: ActionKind::FormSubmission,
            target: target.into(),
            payload,
            captured_at: Utc::now(),
        }
    }

    /// Override the capture time.
    #[must_use]
    pub const fn captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = at;
        self
    }
}

/// Serialize a queue for the persistent slot.
///
/// # Errors
///
/// Returns `SyncError::Parse` if serialization fails.
pub fn encode_queue(actions: &[QueuedAction]) -> Result<String, SyncError> {
    Ok(serde_json::to_string(actions)?)
}

/// Parse a persisted queue.
///
/// An absent or malformed value yields an empty queue; a malformed value is
/// logged so it can be diagnosed.
#[must_use]
pub fn decode_queue(raw: Option<&str>) -> Vec<QueuedAction> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match serde_json::from_str(raw) {
        Ok(actions) => actions,
        Err(e) => {
            warn!(error = %e, "persisted offline queue is malformed; treating as empty");
            Vec::new()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quiz_answer() -> QueuedAction {
        let payload = BTreeMap::from([
            ("questionId".to_string(), "42".to_string()),
            ("answer".to_string(), "Paris".to_string()),
        ]);
        QueuedAction::form_submission("/quiz/submit/42/", payload)
    }

    #[test]
    fn test_roundtrip_preserves_values() {
        let first = quiz_answer()
            .captured_at(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        let second = QueuedAction::form_submission("/progress/7/", BTreeMap::new());
        let actions = vec![first, second];

        let raw = encode_queue(&actions).unwrap();
        let decoded = decode_queue(Some(&raw));

        assert_eq!(decoded, actions);
    }

    #[test]
    fn test_persisted_field_names() {
        let action = quiz_answer();
        let value: serde_json::Value =
            serde_json::from_str(&encode_queue(&[action]).unwrap()).unwrap();

        let entry = &value[0];
        assert_eq!(entry["type"], "form_submission");
        assert_eq!(entry["url"], "/quiz/submit/42/");
        assert_eq!(entry["data"]["answer"], "Paris");
        assert!(entry["timestamp"].is_string());
    }

    #[test]
    fn test_decode_browser_written_queue() {
        let raw = r#"[{"type":"form_submission","url":"/quiz/submit/3/",
            "data":{"answer":"42"},"timestamp":"2024-05-01T10:00:00.123Z"}]"#;

        let decoded = decode_queue(Some(raw));

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].target, "/quiz/submit/3/");
        assert_eq!(decoded[0].captured_at.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_decode_absent_or_malformed() {
        assert!(decode_queue(None).is_empty());
        assert!(decode_queue(Some("not json")).is_empty());
        assert!(decode_queue(Some(r#"{"type":"form_submission"}"#)).is_empty());
        assert!(decode_queue(Some("[]")).is_empty());
    }
}
