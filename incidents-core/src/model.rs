//! Incident records and the request payloads that create or change them.
//!
//! Status values form a closed set. Anything outside it fails to
//! deserialize, so invalid values never reach the store.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of an incident description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Lifecycle label attached to an incident.
///
/// Any status may move to any other; no transition graph is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl IncidentStatus {
    /// Every status, in declaration order.
    pub const ALL: [IncidentStatus; 4] = [
        IncidentStatus::Open,
        IncidentStatus::InProgress,
        IncidentStatus::Resolved,
        IncidentStatus::Closed,
    ];

    /// The wire and storage spelling of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "open",
            IncidentStatus::InProgress => "in_progress",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IncidentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IncidentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown incident status: '{s}'"))
    }
}

/// A stored incident, as returned by every read and write operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub description: String,
    pub status: IncidentStatus,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /incidents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncident {
    pub description: String,
    pub source: String,
    /// Falls back to [`IncidentStatus::Open`] when omitted.
    #[serde(default)]
    pub status: Option<IncidentStatus>,
}

impl NewIncident {
    pub fn new(description: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            source: source.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: IncidentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Status the incident is stored with.
    pub fn effective_status(&self) -> IncidentStatus {
        self.status.unwrap_or_default()
    }

    /// Check the description against its length limit. `source` is
    /// unbounded.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_len("description", &self.description, MAX_DESCRIPTION_LEN)
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, max, len });
    }
    Ok(())
}

/// Body of `PATCH /incidents/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: IncidentStatus,
}

/// Query string of `GET /incidents`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub status: Option<IncidentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&IncidentStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let status: IncidentStatus = serde_json::from_str("\"resolved\"").unwrap();
        assert_eq!(status, IncidentStatus::Resolved);
    }

    #[test]
    fn test_status_rejects_unknown_value() {
        assert!(serde_json::from_str::<IncidentStatus>("\"bogus\"").is_err());
        assert!(serde_json::from_str::<IncidentStatus>("\"Open\"").is_err());
        assert!("bogus".parse::<IncidentStatus>().is_err());
    }

    #[test]
    fn test_status_display_matches_from_str() {
        for status in IncidentStatus::ALL {
            assert_eq!(status.to_string().parse::<IncidentStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_new_incident_defaults_to_open() {
        let payload: NewIncident =
            serde_json::from_str(r#"{"description": "disk full", "source": "monitoring"}"#)
                .unwrap();
        assert_eq!(payload.status, None);
        assert_eq!(payload.effective_status(), IncidentStatus::Open);
    }

    #[test]
    fn test_new_incident_explicit_status() {
        let payload: NewIncident = serde_json::from_str(
            r#"{"description": "disk full", "source": "monitoring", "status": "resolved"}"#,
        )
        .unwrap();
        assert_eq!(payload.effective_status(), IncidentStatus::Resolved);
    }

    #[test]
    fn test_new_incident_requires_fields() {
        assert!(serde_json::from_str::<NewIncident>(r#"{"source": "monitoring"}"#).is_err());
        assert!(
            serde_json::from_str::<NewIncident>(r#"{"description": null, "source": "x"}"#)
                .is_err()
        );
        assert!(
            serde_json::from_str::<NewIncident>(
                r#"{"description": "x", "source": "y", "status": "bogus"}"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_validate_rejects_long_description() {
        let payload = NewIncident::new("d".repeat(MAX_DESCRIPTION_LEN + 1), "monitoring");
        assert_eq!(
            payload.validate(),
            Err(ValidationError::TooLong {
                field: "description",
                max: MAX_DESCRIPTION_LEN,
                len: MAX_DESCRIPTION_LEN + 1,
            })
        );
    }

    #[test]
    fn test_validate_accepts_long_source() {
        let payload = NewIncident::new("disk full", "s".repeat(200));
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        let payload = NewIncident::new("é".repeat(MAX_DESCRIPTION_LEN), "monitoring");
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_list_query_without_status() {
        let query: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.status, None);
    }

    proptest! {
        #[test]
        fn prop_description_limit(len in 0usize..1100) {
            let payload = NewIncident::new("d".repeat(len), "monitoring");
            prop_assert_eq!(payload.validate().is_ok(), len <= MAX_DESCRIPTION_LEN);
        }
    }
}
