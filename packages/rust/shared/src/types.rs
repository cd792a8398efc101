//! Core domain types for the GuideVault enrichment pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GuideVaultError, Result};

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// The channel a customer-service session runs on.
///
/// `Voice` is special: the lineage walk stops when it reaches a voice
/// session, which is credited with agent assignment and canonical timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Voice,
    Chat,
    Task,
    Guide,
    /// Any channel this pipeline does not model explicitly.
    #[serde(other)]
    Other,
}

impl Channel {
    /// Whether this session is an originating voice session.
    pub fn is_voice(self) -> bool {
        matches!(self, Self::Voice)
    }

    /// Canonical wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "VOICE",
            Self::Chat => "CHAT",
            Self::Task => "TASK",
            Self::Guide => "GUIDE",
            Self::Other => "OTHER",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionMeta
// ---------------------------------------------------------------------------

/// Contact-level timestamps reported by the session metadata provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionTimestamps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiation: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disconnect: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_to_system: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_paused: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_resumed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<DateTime<Utc>>,
}

/// Agent assignment on a session, including agent-level timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentAssignment {
    /// Identifier of the assigned agent, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_to_agent: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_by_agent: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_contact_work_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_contact_work_end: Option<DateTime<Utc>>,
}

/// Queue placement for a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_caller_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enqueue_timestamp: Option<DateTime<Utc>>,
}

/// Session metadata as returned by the session metadata provider.
///
/// `related_session_id` is the lineage pointer: when a guide is presented
/// mid-transfer, it links the guide session back toward the originating
/// voice session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    /// Unique session identifier.
    pub id: String,
    pub channel: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiation_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentAssignment>,
    #[serde(default)]
    pub timestamps: SessionTimestamps,
    /// Present when the session was part of an outbound campaign.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
}

impl SessionMeta {
    /// Minimal metadata with just an id and channel; everything else absent.
    pub fn bare(id: impl Into<String>, channel: Channel) -> Self {
        Self {
            id: id.into(),
            channel,
            related_session_id: None,
            previous_session_id: None,
            initiation_method: None,
            customer_endpoint: None,
            system_endpoint: None,
            queue: None,
            agent: None,
            timestamps: SessionTimestamps::default(),
            campaign_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AgentProfile
// ---------------------------------------------------------------------------

/// Display identifiers for an agent, from the agent directory provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

// ---------------------------------------------------------------------------
// QuestionEntry
// ---------------------------------------------------------------------------

/// One row of the question lookup table: a `(name, label)` pair discovered
/// in a guide template, plus provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionEntry {
    /// Component name identifying the question (e.g. `WelcomeGuide_Q4`).
    pub name: String,
    /// Display label, after any configured override.
    pub label: String,
    /// Template the pair was extracted from.
    pub template_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_description: Option<String>,
    /// Human-readable extraction timestamp in the configured timezone.
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// GuideSubmission
// ---------------------------------------------------------------------------

/// A completed guide submission: the raw answer payload plus the session
/// that triggered it and an optional action discriminator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideSubmission {
    /// Identifier of the session the guide was presented on.
    pub session_id: String,
    /// Raw answers keyed by answer key; values are scalars or indexed maps.
    pub answers: serde_json::Map<String, serde_json::Value>,
    /// Optional action discriminator selecting the response sub-flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl GuideSubmission {
    /// Parse a contact-flow invocation event into a submission.
    ///
    /// Expected shape (the flow engine's event envelope):
    /// `Details.ContactData.ContactId`, `Details.Parameters.guideResultData`,
    /// and optionally `Details.Parameters.guideAction`.
    pub fn from_flow_event(event: &serde_json::Value) -> Result<Self> {
        let details = event
            .get("Details")
            .ok_or_else(|| GuideVaultError::malformed("event", "missing Details"))?;

        let session_id = details
            .pointer("/ContactData/ContactId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                GuideVaultError::malformed("event", "missing Details.ContactData.ContactId")
            })?
            .to_string();

        let answers = match details.pointer("/Parameters/guideResultData") {
            Some(serde_json::Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(GuideVaultError::malformed(
                    "event",
                    "guideResultData is not an object",
                ));
            }
            None => serde_json::Map::new(),
        };

        let action = details
            .pointer("/Parameters/guideAction")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from);

        Ok(Self {
            session_id,
            answers,
            action,
        })
    }
}

// ---------------------------------------------------------------------------
// ExtractionSummary
// ---------------------------------------------------------------------------

/// Outcome counts returned by an extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Number of `(name, label)` pairs upserted into the lookup table.
    pub questions_written: usize,
    /// Templates walked successfully.
    pub templates_processed: usize,
    /// Templates skipped due to fetch or decode failures.
    pub templates_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_roundtrip() {
        let json = serde_json::to_string(&Channel::Voice).expect("serialize");
        assert_eq!(json, "\"VOICE\"");
        let parsed: Channel = serde_json::from_str("\"CHAT\"").expect("deserialize");
        assert_eq!(parsed, Channel::Chat);
    }

    #[test]
    fn unknown_channel_maps_to_other() {
        let parsed: Channel = serde_json::from_str("\"EMAIL\"").expect("deserialize");
        assert_eq!(parsed, Channel::Other);
        assert!(!parsed.is_voice());
    }

    #[test]
    fn session_meta_optional_fields_absent() {
        let meta = SessionMeta::bare("abc-123", Channel::Guide);
        let json = serde_json::to_string(&meta).expect("serialize");
        assert!(!json.contains("related_session_id"));
        assert!(!json.contains("campaign_id"));

        let parsed: SessionMeta = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.id, "abc-123");
        assert_eq!(parsed.channel, Channel::Guide);
        assert!(parsed.agent.is_none());
    }

    #[test]
    fn submission_from_flow_event() {
        let event = serde_json::json!({
            "Details": {
                "ContactData": { "ContactId": "c-1", "Channel": "GUIDE" },
                "Parameters": {
                    "guideResultData": {
                        "Q1_Answer": "Yes",
                        "Q2_Answer": { "0": "Red", "1": "Blue" }
                    },
                    "guideAction": "Submit"
                }
            }
        });

        let sub = GuideSubmission::from_flow_event(&event).expect("parse event");
        assert_eq!(sub.session_id, "c-1");
        assert_eq!(sub.answers.len(), 2);
        assert_eq!(sub.action.as_deref(), Some("Submit"));
    }

    #[test]
    fn submission_rejects_missing_contact_id() {
        let event = serde_json::json!({ "Details": { "Parameters": {} } });
        let err = GuideSubmission::from_flow_event(&event).unwrap_err();
        assert!(err.to_string().contains("ContactId"));
    }

    #[test]
    fn submission_tolerates_missing_answers() {
        let event = serde_json::json!({
            "Details": { "ContactData": { "ContactId": "c-2" } }
        });
        let sub = GuideSubmission::from_flow_event(&event).expect("parse event");
        assert!(sub.answers.is_empty());
        assert!(sub.action.is_none());
    }
}
