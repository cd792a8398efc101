//! Enrichment engine: turns a completed guide submission into one durable,
//! fully-attributed answer record.
//!
//! The pipeline normalizes raw answers, walks session lineage back to the
//! originating voice session, attaches agent/queue/campaign metadata and
//! question text from the lookup table, and persists the record keyed by the
//! origin session id.

pub mod enrich;
pub mod lineage;
pub mod normalize;

pub use enrich::{Action, EnrichmentPipeline, question_key_for};
pub use lineage::{MAX_LINEAGE_HOPS, resolve_origin, resolve_origin_from};
pub use normalize::normalize_answer;
