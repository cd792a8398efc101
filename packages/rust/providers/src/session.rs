//! HTTP implementation of the session metadata provider.

use async_trait::async_trait;
use guidevault_shared::{Result, SessionMeta};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{SessionProvider, build_client, endpoint, get_json};

/// Session metadata provider backed by a REST API.
///
/// Expects `GET {base}/sessions/{id}` to return a [`SessionMeta`] JSON body,
/// with 404 for unknown ids.
pub struct HttpSessionProvider {
    client: Client,
    base: Url,
}

impl HttpSessionProvider {
    /// Create a provider against the given base URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            guidevault_shared::GuideVaultError::config(format!(
                "invalid session API URL {base_url}: {e}"
            ))
        })?;
        Ok(Self {
            client: build_client(timeout_secs)?,
            base,
        })
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn get_session(&self, session_id: &str) -> Result<SessionMeta> {
        let url = endpoint(&self.base, &["sessions", session_id])?;
        debug!(%session_id, "fetching session metadata");
        get_json::<SessionMeta>(&self.client, url.as_str()).await
    }
}
