//! HTTP implementations of the agent directory and campaign directory.

use async_trait::async_trait;
use guidevault_shared::{AgentProfile, GuideVaultError, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{AgentDirectory, CampaignDirectory, build_client, endpoint, get_json};

// ---------------------------------------------------------------------------
// Agent directory
// ---------------------------------------------------------------------------

/// Wire shape of `GET {base}/agents/{id}`.
#[derive(Debug, Deserialize)]
struct AgentRecord {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

impl AgentRecord {
    /// Combine first/last name into a display name, skipping empty parts.
    fn into_profile(self) -> AgentProfile {
        let display_name = match (
            self.first_name.filter(|s| !s.is_empty()),
            self.last_name.filter(|s| !s.is_empty()),
        ) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(one), None) | (None, Some(one)) => Some(one),
            (None, None) => None,
        };
        AgentProfile {
            display_name,
            username: self.username.filter(|s| !s.is_empty()),
        }
    }
}

/// Agent directory backed by a REST API.
pub struct HttpAgentDirectory {
    client: Client,
    base: Url,
}

impl HttpAgentDirectory {
    /// Create a directory client against the given base URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            GuideVaultError::config(format!("invalid agent directory URL {base_url}: {e}"))
        })?;
        Ok(Self {
            client: build_client(timeout_secs)?,
            base,
        })
    }
}

#[async_trait]
impl AgentDirectory for HttpAgentDirectory {
    async fn get_agent(&self, agent_id: &str) -> Result<AgentProfile> {
        let url = endpoint(&self.base, &["agents", agent_id])?;
        debug!(%agent_id, "fetching agent profile");
        let record = get_json::<AgentRecord>(&self.client, url.as_str()).await?;
        Ok(record.into_profile())
    }
}

// ---------------------------------------------------------------------------
// Campaign directory
// ---------------------------------------------------------------------------

/// Metadata for an outbound campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Campaign directory backed by a REST API.
pub struct HttpCampaignDirectory {
    client: Client,
    base: Url,
}

impl HttpCampaignDirectory {
    /// Create a campaign client against the given base URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            GuideVaultError::config(format!("invalid campaign API URL {base_url}: {e}"))
        })?;
        Ok(Self {
            client: build_client(timeout_secs)?,
            base,
        })
    }
}

#[async_trait]
impl CampaignDirectory for HttpCampaignDirectory {
    async fn get_campaign(&self, campaign_id: &str) -> Result<CampaignInfo> {
        let url = endpoint(&self.base, &["campaigns", campaign_id])?;
        debug!(%campaign_id, "fetching campaign metadata");
        get_json::<CampaignInfo>(&self.client, url.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn display_name_joins_parts() {
        let record = AgentRecord {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            username: Some("alovelace".into()),
        };
        let profile = record.into_profile();
        assert_eq!(profile.display_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.username.as_deref(), Some("alovelace"));
    }

    #[test]
    fn display_name_skips_empty_parts() {
        let record = AgentRecord {
            first_name: Some("".into()),
            last_name: Some("Lovelace".into()),
            username: None,
        };
        assert_eq!(
            record.into_profile().display_name.as_deref(),
            Some("Lovelace")
        );

        let record = AgentRecord {
            first_name: None,
            last_name: None,
            username: None,
        };
        assert!(record.into_profile().display_name.is_none());
    }

    #[tokio::test]
    async fn fetches_agent_profile() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/agents/a-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "username": "ghopper"
            })))
            .mount(&server)
            .await;

        let directory = HttpAgentDirectory::new(&server.uri(), 5).expect("build directory");
        let profile = directory.get_agent("a-1").await.expect("get agent");
        assert_eq!(profile.display_name.as_deref(), Some("Grace Hopper"));
    }

    #[tokio::test]
    async fn fetches_campaign_metadata() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/campaigns/cmp-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmp-7",
                "name": "Spring Outreach"
            })))
            .mount(&server)
            .await;

        let directory = HttpCampaignDirectory::new(&server.uri(), 5).expect("build directory");
        let campaign = directory.get_campaign("cmp-7").await.expect("get campaign");
        assert_eq!(campaign.name.as_deref(), Some("Spring Outreach"));
    }

    #[tokio::test]
    async fn missing_agent_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/agents/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let directory = HttpAgentDirectory::new(&server.uri(), 5).expect("build directory");
        assert!(directory.get_agent("ghost").await.unwrap_err().is_not_found());
    }
}
