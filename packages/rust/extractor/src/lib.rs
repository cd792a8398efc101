//! Template question extraction job.
//!
//! Walks every guide template's component tree, extracts `(name, label)`
//! pairs representing questions, applies configured label overrides, and
//! upserts them into the question lookup table. Runs periodically and on
//! deployment; re-running against unchanged templates is a no-op.

mod tree;

use std::collections::BTreeMap;

use chrono::Utc;
use guidevault_providers::TemplateProvider;
use guidevault_shared::{AppConfig, ExtractionSummary, QuestionEntry, Result};
use guidevault_storage::Storage;
use tracing::{info, instrument, warn};

pub use tree::{ComponentNode, extract_question_pairs};

/// Progress callback for reporting extraction status.
pub trait ExtractionProgress: Send + Sync {
    /// Called after each template is handled (processed or skipped).
    fn template_done(&self, template_id: &str, current: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ExtractionProgress for SilentProgress {
    fn template_done(&self, _template_id: &str, _current: usize, _total: usize) {}
}

/// Run one extraction pass over the given templates.
///
/// `template_ids` selects an explicit template set; when `None`, all
/// templates known to the provider are discovered and processed. A template
/// that cannot be fetched or decoded is skipped and counted, never aborting
/// the run. The resulting pair set is deduplicated across templates before
/// persisting.
#[instrument(skip_all, fields(explicit = template_ids.is_some()))]
pub async fn run_extraction(
    provider: &dyn TemplateProvider,
    storage: &Storage,
    config: &AppConfig,
    template_ids: Option<Vec<String>>,
    progress: &dyn ExtractionProgress,
) -> Result<ExtractionSummary> {
    let ids = match template_ids {
        Some(ids) => ids,
        None => {
            let discovered = provider.list_templates().await?;
            info!(count = discovered.len(), "discovered templates");
            discovered
        }
    };

    if ids.is_empty() {
        warn!("no templates provided or discovered");
        return Ok(ExtractionSummary::default());
    }

    let offset = config.timezone.fixed_offset()?;
    let created_at = Utc::now()
        .with_timezone(&offset)
        .format(&format!("%B %d, %Y %I:%M:%S %p {}", config.timezone.label))
        .to_string();

    let mut summary = ExtractionSummary::default();
    // Keyed by (name, label): the same pair from multiple templates yields
    // one upsert, attributed to the first template that produced it.
    let mut entries: BTreeMap<(String, String), QuestionEntry> = BTreeMap::new();
    let total = ids.len();

    for (i, template_id) in ids.iter().enumerate() {
        match collect_template(provider, config, template_id, &created_at).await {
            Ok(template_entries) => {
                let pair_count = template_entries.len();
                for entry in template_entries {
                    entries
                        .entry((entry.name.clone(), entry.label.clone()))
                        .or_insert(entry);
                }
                summary.templates_processed += 1;
                info!(%template_id, pairs = pair_count, "template processed");
            }
            Err(e) => {
                summary.templates_skipped += 1;
                warn!(%template_id, error = %e, "skipping template");
            }
        }
        progress.template_done(template_id, i + 1, total);
    }

    for entry in entries.values() {
        match storage.upsert_question(entry).await {
            Ok(()) => summary.questions_written += 1,
            Err(e) => warn!(name = %entry.name, error = %e, "question upsert failed"),
        }
    }

    info!(
        questions_written = summary.questions_written,
        templates_processed = summary.templates_processed,
        templates_skipped = summary.templates_skipped,
        "extraction complete"
    );
    Ok(summary)
}

/// Fetch one template and extract its question entries.
async fn collect_template(
    provider: &dyn TemplateProvider,
    config: &AppConfig,
    template_id: &str,
    created_at: &str,
) -> Result<Vec<QuestionEntry>> {
    let doc = provider.get_template(template_id).await?;
    let tree = doc.component_tree()?;
    let root = ComponentNode::from(&tree);
    let pairs = extract_question_pairs(&root, &config.overrides);

    Ok(pairs
        .into_iter()
        .map(|(name, label)| QuestionEntry {
            name,
            label,
            template_id: doc.id.clone(),
            template_name: doc.name.clone(),
            template_status: doc.status.clone(),
            template_description: doc.description.clone(),
            created_at: created_at.to_string(),
        })
        .collect())
}
