//! Provider traits and HTTP implementations for GuideVault's external
//! collaborators: the session metadata service, the agent directory, the
//! campaign service, and the template store.
//!
//! The pipeline crates depend only on the traits; the HTTP implementations
//! here are thin `reqwest` wrappers with a configurable base URL, so tests
//! can substitute in-memory fakes.

mod directory;
mod session;
mod templates;

use async_trait::async_trait;
use guidevault_shared::{AgentProfile, GuideVaultError, Result, SessionMeta};
use reqwest::Client;

pub use directory::{CampaignInfo, HttpAgentDirectory, HttpCampaignDirectory};
pub use session::HttpSessionProvider;
pub use templates::{HttpTemplateProvider, TemplateDoc};

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("GuideVault/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Looks up session metadata by session identifier.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Fetch metadata for one session. Fails with
    /// [`GuideVaultError::NotFound`] when the id is unknown.
    async fn get_session(&self, session_id: &str) -> Result<SessionMeta>;
}

/// Resolves agent identifiers into display identifiers.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn get_agent(&self, agent_id: &str) -> Result<AgentProfile>;
}

/// Resolves outbound-campaign identifiers into campaign metadata.
#[async_trait]
pub trait CampaignDirectory: Send + Sync {
    async fn get_campaign(&self, campaign_id: &str) -> Result<CampaignInfo>;
}

/// Lists and fetches guide template documents.
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    /// List all known template identifiers.
    async fn list_templates(&self) -> Result<Vec<String>>;

    /// Fetch one template document, including its component tree.
    async fn get_template(&self, template_id: &str) -> Result<TemplateDoc>;
}

// ---------------------------------------------------------------------------
// HTTP plumbing shared by the implementations
// ---------------------------------------------------------------------------

/// Build a reqwest client with appropriate settings.
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GuideVaultError::Network(format!("failed to build HTTP client: {e}")))
}

/// GET a URL and deserialize the JSON body, mapping 404 to `NotFound`.
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| GuideVaultError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(GuideVaultError::not_found(url.to_string()));
    }
    if !status.is_success() {
        return Err(GuideVaultError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GuideVaultError::Network(format!("{url}: failed to decode body: {e}")))
}

/// Join a base URL with path segments, percent-escaping each segment.
pub(crate) fn endpoint(base: &url::Url, segments: &[&str]) -> Result<url::Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| GuideVaultError::config(format!("base URL cannot have paths: {base}")))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}
