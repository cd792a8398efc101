//! Submission enrichment: normalize answers, resolve lineage, attach
//! metadata and question text, and persist one answer record.
//!
//! Every enrichment step is independently best-effort; only an unusable
//! payload or a failed final write fails the invocation, and even then the
//! entry point answers with a status map rather than an error, because the
//! contact-flow engine expects key-value results, not raised faults.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use guidevault_providers::{AgentDirectory, CampaignDirectory, SessionProvider};
use guidevault_shared::{AppConfig, GuideSubmission, GuideVaultError, Result, SessionMeta};
use guidevault_storage::Storage;
use tracing::{info, instrument, warn};

use crate::lineage;
use crate::normalize::normalize_answer;

/// Suffix convention: `Q1_Answer` keys look up question text under `Q1_Question`.
const ANSWER_SUFFIX: &str = "_Answer";
const QUESTION_SUFFIX: &str = "_Question";

/// Which response sub-flow the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Persist the record; answer with a minimal status map.
    Store,
    /// Persist the record and echo the full enriched mapping back.
    StoreAndRespond,
}

impl Action {
    /// Parse the submission's action discriminator; unknown values default
    /// to the plain store flow (the raw value is still echoed through).
    pub fn from_discriminator(action: Option<&str>) -> Self {
        match action {
            Some(a) if a.eq_ignore_ascii_case("respond") => Self::StoreAndRespond,
            Some(a) if a.eq_ignore_ascii_case("store_respond") => Self::StoreAndRespond,
            _ => Self::Store,
        }
    }
}

/// The enrichment pipeline with its external collaborators.
pub struct EnrichmentPipeline<'a> {
    pub sessions: &'a dyn SessionProvider,
    pub agents: &'a dyn AgentDirectory,
    pub campaigns: &'a dyn CampaignDirectory,
    pub storage: &'a Storage,
    pub config: &'a AppConfig,
}

impl EnrichmentPipeline<'_> {
    /// Entry point for one completed guide submission.
    ///
    /// Always returns a flat response map. On success the map carries
    /// `status = "success"` plus either a minimal key echo or the full
    /// record, depending on the action discriminator; on failure it carries
    /// `status = "error"` and an `error` message.
    #[instrument(skip_all, fields(session_id = %submission.session_id))]
    pub async fn handle_submission(
        &self,
        submission: &GuideSubmission,
    ) -> BTreeMap<String, String> {
        let action = Action::from_discriminator(submission.action.as_deref());

        match self.enrich(submission).await {
            Ok((origin_id, record)) => {
                let mut response = BTreeMap::new();
                response.insert("status".to_string(), "success".to_string());
                match action {
                    Action::Store => {
                        response.insert(
                            self.config.stores.record_key_attr.clone(),
                            origin_id,
                        );
                    }
                    Action::StoreAndRespond => {
                        response.extend(record);
                    }
                }
                response
            }
            Err(e) => {
                warn!(error = %e, "submission could not be enriched");
                BTreeMap::from([
                    ("status".to_string(), "error".to_string()),
                    ("error".to_string(), e.to_string()),
                ])
            }
        }
    }

    /// Assemble and persist the enriched record.
    /// Returns the origin session id (the record key) and the record itself.
    pub async fn enrich(
        &self,
        submission: &GuideSubmission,
    ) -> Result<(String, BTreeMap<String, String>)> {
        if submission.session_id.is_empty() {
            return Err(GuideVaultError::malformed(
                "submission",
                "empty session identifier",
            ));
        }

        // --- Normalize answers (per-key best-effort) ---
        let mut answers: BTreeMap<String, String> = BTreeMap::new();
        let mut malformed_keys = 0usize;
        for (key, raw) in &submission.answers {
            match normalize_answer(raw) {
                Ok(value) => {
                    answers.insert(key.clone(), value);
                }
                Err(e) => {
                    malformed_keys += 1;
                    warn!(key = %key, error = %e, "omitting malformed answer");
                }
            }
        }
        info!(
            normalized = answers.len(),
            malformed = malformed_keys,
            "answers normalized"
        );

        // --- Resolve lineage (best-effort) ---
        let trigger = match self.sessions.get_session(&submission.session_id).await {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(error = %e, "triggering session unavailable, proceeding without metadata");
                None
            }
        };
        let origin = match trigger.clone() {
            Some(meta) => Some(lineage::resolve_origin_from(self.sessions, meta).await),
            None => None,
        };
        let origin_id = origin
            .as_ref()
            .map(|o| o.id.clone())
            .unwrap_or_else(|| submission.session_id.clone());

        // --- Assemble the flat record ---
        let now = Utc::now();
        let mut record: BTreeMap<String, String> = BTreeMap::new();
        record.insert(
            self.config.stores.record_key_attr.clone(),
            origin_id.clone(),
        );
        record.insert("SessionId".to_string(), submission.session_id.clone());

        if let Some(trigger) = &trigger {
            self.apply_trigger_fields(&mut record, trigger);
        }
        if let Some(origin) = &origin {
            self.apply_origin_fields(&mut record, origin).await;
        }

        record.extend(answers.clone());
        self.apply_question_text(&mut record, &answers).await;

        if let Some(action) = &submission.action {
            record.insert("GuideAction".to_string(), action.clone());
        }

        let offset = self.config.timezone.fixed_offset()?;
        let created_at = now
            .with_timezone(&offset)
            .format(&format!(
                "%B %d, %Y %I:%M:%S %p {}",
                self.config.timezone.label
            ))
            .to_string();
        record.insert("CreatedAt".to_string(), created_at);

        let expires_at = (now + Duration::days(365)).timestamp();
        record.insert("ExpiresAt".to_string(), expires_at.to_string());

        // The only step allowed to fail the invocation: a record is written
        // complete or not at all.
        self.storage.put_record(&origin_id, &record, expires_at).await?;

        info!(
            %origin_id,
            fields = record.len(),
            "answer record written"
        );
        Ok((origin_id, record))
    }

    /// Session identifiers, endpoints, and flow metadata come from the
    /// triggering session itself.
    fn apply_trigger_fields(&self, record: &mut BTreeMap<String, String>, trigger: &SessionMeta) {
        insert_opt(record, "PreviousSessionId", trigger.previous_session_id.as_deref());
        insert_opt(record, "RelatedSessionId", trigger.related_session_id.as_deref());
        insert_opt(record, "CustomerEndpoint", trigger.customer_endpoint.as_deref());
        insert_opt(record, "SystemEndpoint", trigger.system_endpoint.as_deref());
        insert_opt(record, "InitiationMethod", trigger.initiation_method.as_deref());
        record.insert("Channel".to_string(), trigger.channel.as_str().to_string());
        if let Some(queue) = &trigger.queue {
            insert_opt(record, "QueueName", queue.name.as_deref());
            insert_opt(record, "OutboundCallerId", queue.outbound_caller_id.as_deref());
        }
    }

    /// Agent, timestamp, and campaign attribution comes from the lineage
    /// origin, which may differ from the triggering session.
    async fn apply_origin_fields(&self, record: &mut BTreeMap<String, String>, origin: &SessionMeta) {
        record.insert(
            "OriginChannel".to_string(),
            origin.channel.as_str().to_string(),
        );

        let ts = &origin.timestamps;
        insert_ts(record, "InitiationTimestamp", ts.initiation);
        insert_ts(record, "DisconnectTimestamp", ts.disconnect);
        insert_ts(record, "ConnectedToSystemTimestamp", ts.connected_to_system);
        insert_ts(record, "LastUpdateTimestamp", ts.last_update);
        insert_ts(record, "LastPausedTimestamp", ts.last_paused);
        insert_ts(record, "LastResumedTimestamp", ts.last_resumed);
        insert_ts(record, "ScheduledTimestamp", ts.scheduled);

        if let Some(queue) = &origin.queue {
            insert_ts(record, "EnqueueTimestamp", queue.enqueue_timestamp);
        }

        if let Some(agent) = &origin.agent {
            insert_ts(record, "ConnectedToAgentTimestamp", agent.connected_to_agent);
            insert_ts(record, "AcceptedByAgentTimestamp", agent.accepted_by_agent);
            insert_ts(
                record,
                "AfterContactWorkStartTimestamp",
                agent.after_contact_work_start,
            );
            insert_ts(
                record,
                "AfterContactWorkEndTimestamp",
                agent.after_contact_work_end,
            );

            if let Some(agent_id) = &agent.id {
                record.insert("AgentId".to_string(), agent_id.clone());
                match self.agents.get_agent(agent_id).await {
                    Ok(profile) => {
                        insert_opt(record, "AgentName", profile.display_name.as_deref());
                        insert_opt(record, "AgentUsername", profile.username.as_deref());
                    }
                    Err(e) => warn!(%agent_id, error = %e, "agent lookup failed"),
                }
            }
        }

        if let Some(campaign_id) = &origin.campaign_id {
            record.insert("CampaignId".to_string(), campaign_id.clone());
            match self.campaigns.get_campaign(campaign_id).await {
                Ok(campaign) => insert_opt(record, "CampaignName", campaign.name.as_deref()),
                Err(e) => warn!(%campaign_id, error = %e, "campaign lookup failed"),
            }
        }
    }

    /// Attach question text for every answer key that has a lookup match.
    /// Missing entries are omitted silently; lookup failures are logged.
    async fn apply_question_text(
        &self,
        record: &mut BTreeMap<String, String>,
        answers: &BTreeMap<String, String>,
    ) {
        for answer_key in answers.keys() {
            let question_key = question_key_for(answer_key);
            match self.storage.get_label(&question_key).await {
                Ok(Some(label)) => {
                    record.insert(question_key, label);
                }
                Ok(None) => {}
                Err(e) => warn!(key = %question_key, error = %e, "question lookup failed"),
            }
        }
    }
}

/// Derive the question-text key for an answer key: the `_Answer` suffix is
/// replaced by `_Question` (keys without the suffix get `_Question` appended).
pub fn question_key_for(answer_key: &str) -> String {
    let prefix = answer_key.strip_suffix(ANSWER_SUFFIX).unwrap_or(answer_key);
    format!("{prefix}{QUESTION_SUFFIX}")
}

fn insert_opt(record: &mut BTreeMap<String, String>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        if !value.is_empty() {
            record.insert(key.to_string(), value.to_string());
        }
    }
}

fn insert_ts(record: &mut BTreeMap<String, String>, key: &str, value: Option<DateTime<Utc>>) {
    if let Some(value) = value {
        record.insert(key.to_string(), value.to_rfc3339());
    }
}
