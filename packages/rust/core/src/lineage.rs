//! Lineage resolution: walking the related-session chain back to the
//! originating voice session.
//!
//! When a guide is presented mid-transfer, the guide session's agent and
//! timestamp metadata belong to a different session than the one that should
//! be credited. The walk follows `related_session_id` pointers until it
//! reaches a voice session, runs out of pointers, or hits the hop bound.

use guidevault_providers::SessionProvider;
use guidevault_shared::SessionMeta;
use tracing::{debug, warn};

/// Maximum sessions fetched per walk. Real transfer chains are shallow;
/// the bound is a safety net against cyclic or corrupt lineage data.
pub const MAX_LINEAGE_HOPS: usize = 5;

/// Resolve the originating session starting from a session id.
///
/// Returns `None` only when even the first fetch fails; any later failure
/// terminates the walk at the last successfully resolved session.
pub async fn resolve_origin(
    provider: &dyn SessionProvider,
    session_id: &str,
) -> Option<SessionMeta> {
    match provider.get_session(session_id).await {
        Ok(meta) => Some(resolve_origin_from(provider, meta).await),
        Err(e) => {
            warn!(%session_id, error = %e, "could not fetch triggering session");
            None
        }
    }
}

/// Resolve the originating session given already-fetched metadata for the
/// starting session (which counts as the first hop).
pub async fn resolve_origin_from(
    provider: &dyn SessionProvider,
    start: SessionMeta,
) -> SessionMeta {
    let mut current = start;

    for hop in 1..MAX_LINEAGE_HOPS {
        debug!(
            hop,
            session = %current.id,
            channel = current.channel.as_str(),
            "lineage hop"
        );

        if current.channel.is_voice() {
            return current;
        }

        let next_id = match &current.related_session_id {
            // A self-referential pointer would loop forever
            Some(id) if *id != current.id => id.clone(),
            _ => return current,
        };

        match provider.get_session(&next_id).await {
            Ok(meta) => current = meta,
            Err(e) => {
                warn!(session = %next_id, error = %e, "lineage walk ended early");
                return current;
            }
        }
    }

    debug!(session = %current.id, "lineage hop bound reached");
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use guidevault_shared::{Channel, GuideVaultError};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSessions {
        sessions: HashMap<String, SessionMeta>,
        fetches: AtomicUsize,
    }

    impl FakeSessions {
        fn new(sessions: Vec<SessionMeta>) -> Self {
            Self {
                sessions: sessions.into_iter().map(|s| (s.id.clone(), s)).collect(),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionProvider for FakeSessions {
        async fn get_session(&self, session_id: &str) -> guidevault_shared::Result<SessionMeta> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.sessions
                .get(session_id)
                .cloned()
                .ok_or_else(|| GuideVaultError::not_found(session_id.to_string()))
        }
    }

    fn linked(id: &str, channel: Channel, related: Option<&str>) -> SessionMeta {
        let mut meta = SessionMeta::bare(id, channel);
        meta.related_session_id = related.map(String::from);
        meta
    }

    #[tokio::test]
    async fn voice_session_is_its_own_origin() {
        let provider = FakeSessions::new(vec![linked("s-1", Channel::Voice, Some("s-0"))]);

        let origin = resolve_origin(&provider, "s-1").await.expect("resolved");
        assert_eq!(origin.id, "s-1");
        // The related pointer is never followed once a voice session is found
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test]
    async fn follows_chain_to_voice() {
        let provider = FakeSessions::new(vec![
            linked("guide", Channel::Guide, Some("task")),
            linked("task", Channel::Task, Some("call")),
            linked("call", Channel::Voice, None),
        ]);

        let origin = resolve_origin(&provider, "guide").await.expect("resolved");
        assert_eq!(origin.id, "call");
        assert_eq!(provider.fetch_count(), 3);
    }

    #[tokio::test]
    async fn voiceless_chain_stops_at_hop_bound() {
        // 10 links, none voice: the walk must stop at the 5th session
        let mut sessions = Vec::new();
        for i in 0..10 {
            let related = (i + 1 < 10).then(|| format!("s-{}", i + 1));
            sessions.push(linked(
                &format!("s-{i}"),
                Channel::Chat,
                related.as_deref(),
            ));
        }
        let provider = FakeSessions::new(sessions);

        let origin = resolve_origin(&provider, "s-0").await.expect("resolved");
        assert_eq!(origin.id, "s-4");
        assert_eq!(provider.fetch_count(), MAX_LINEAGE_HOPS);
    }

    #[tokio::test]
    async fn cyclic_chain_terminates() {
        let provider = FakeSessions::new(vec![
            linked("a", Channel::Chat, Some("b")),
            linked("b", Channel::Chat, Some("a")),
        ]);

        let origin = resolve_origin(&provider, "a").await.expect("resolved");
        // Bounded walk: a → b → a → b → a
        assert_eq!(origin.id, "a");
        assert_eq!(provider.fetch_count(), MAX_LINEAGE_HOPS);
    }

    #[tokio::test]
    async fn self_referential_pointer_stops_immediately() {
        let provider = FakeSessions::new(vec![linked("loop", Channel::Chat, Some("loop"))]);

        let origin = resolve_origin(&provider, "loop").await.expect("resolved");
        assert_eq!(origin.id, "loop");
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_mid_chain_returns_last_resolved() {
        let provider = FakeSessions::new(vec![linked("start", Channel::Chat, Some("missing"))]);

        let origin = resolve_origin(&provider, "start").await.expect("resolved");
        assert_eq!(origin.id, "start");
    }

    #[tokio::test]
    async fn first_fetch_failure_yields_none() {
        let provider = FakeSessions::new(vec![]);
        assert!(resolve_origin(&provider, "ghost").await.is_none());
    }
}
