//! HTTP implementation of the guide template provider.

use async_trait::async_trait;
use guidevault_shared::{GuideVaultError, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{TemplateProvider, build_client, endpoint, get_json};

// ---------------------------------------------------------------------------
// TemplateDoc
// ---------------------------------------------------------------------------

/// A guide template document as returned by the template store.
///
/// The component tree may arrive either as inline JSON or as an embedded
/// JSON string (the template store serializes it both ways depending on
/// version); [`TemplateDoc::component_tree`] normalizes the difference.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDoc {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// The raw component tree, possibly string-encoded.
    #[serde(default)]
    pub template: serde_json::Value,
}

impl TemplateDoc {
    /// Decode the component tree, parsing an embedded JSON string if needed.
    pub fn component_tree(&self) -> Result<serde_json::Value> {
        match &self.template {
            serde_json::Value::String(raw) => serde_json::from_str(raw).map_err(|e| {
                GuideVaultError::malformed(
                    "template",
                    format!("{}: embedded template is not valid JSON: {e}", self.id),
                )
            }),
            other => Ok(other.clone()),
        }
    }
}

/// Wire shape of `GET {base}/templates`.
#[derive(Debug, Deserialize)]
struct ListTemplatesResponse {
    templates: Vec<TemplateSummary>,
}

#[derive(Debug, Deserialize)]
struct TemplateSummary {
    id: String,
}

// ---------------------------------------------------------------------------
// HttpTemplateProvider
// ---------------------------------------------------------------------------

/// Template provider backed by a REST API.
pub struct HttpTemplateProvider {
    client: Client,
    base: Url,
}

impl HttpTemplateProvider {
    /// Create a provider against the given base URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            GuideVaultError::config(format!("invalid template API URL {base_url}: {e}"))
        })?;
        Ok(Self {
            client: build_client(timeout_secs)?,
            base,
        })
    }
}

#[async_trait]
impl TemplateProvider for HttpTemplateProvider {
    async fn list_templates(&self) -> Result<Vec<String>> {
        let url = endpoint(&self.base, &["templates"])?;
        debug!("listing templates");
        let response = get_json::<ListTemplatesResponse>(&self.client, url.as_str()).await?;
        Ok(response.templates.into_iter().map(|t| t.id).collect())
    }

    async fn get_template(&self, template_id: &str) -> Result<TemplateDoc> {
        let url = endpoint(&self.base, &["templates", template_id])?;
        debug!(%template_id, "fetching template");
        get_json::<TemplateDoc>(&self.client, url.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn component_tree_inline_json() {
        let doc = TemplateDoc {
            id: "t-1".into(),
            name: None,
            status: None,
            description: None,
            template: serde_json::json!({ "Name": "Q1", "Label": "Did you agree?" }),
        };
        let tree = doc.component_tree().expect("decode tree");
        assert_eq!(tree["Name"], "Q1");
    }

    #[test]
    fn component_tree_embedded_string() {
        let doc = TemplateDoc {
            id: "t-2".into(),
            name: None,
            status: None,
            description: None,
            template: serde_json::Value::String(r#"{"Name":"Q2","Label":"Pick a color"}"#.into()),
        };
        let tree = doc.component_tree().expect("decode tree");
        assert_eq!(tree["Label"], "Pick a color");
    }

    #[test]
    fn component_tree_rejects_bad_string() {
        let doc = TemplateDoc {
            id: "t-3".into(),
            name: None,
            status: None,
            description: None,
            template: serde_json::Value::String("not json {".into()),
        };
        let err = doc.component_tree().unwrap_err();
        assert!(err.to_string().contains("t-3"));
    }

    #[tokio::test]
    async fn lists_and_fetches_templates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/templates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "templates": [ { "id": "t-1" }, { "id": "t-2" } ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/templates/t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "t-1",
                "name": "Welcome Guide",
                "status": "PUBLISHED",
                "template": { "Body": [] }
            })))
            .mount(&server)
            .await;

        let provider = HttpTemplateProvider::new(&server.uri(), 5).expect("build provider");

        let ids = provider.list_templates().await.expect("list templates");
        assert_eq!(ids, vec!["t-1".to_string(), "t-2".to_string()]);

        let doc = provider.get_template("t-1").await.expect("get template");
        assert_eq!(doc.name.as_deref(), Some("Welcome Guide"));
        assert!(doc.component_tree().expect("tree").is_object());
    }

    #[tokio::test]
    async fn missing_template_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/templates/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = HttpTemplateProvider::new(&server.uri(), 5).expect("build provider");
        assert!(
            provider
                .get_template("ghost")
                .await
                .unwrap_err()
                .is_not_found()
        );
    }
}
