//! Admission gate and eligibility chain.
//!
//! Collaborators extend the gate by registering predicates; each predicate
//! receives the running vote and the item and returns a possibly-overridden
//! vote. The chain folds left to right in (priority, registration) order,
//! so a later predicate can veto or restore an earlier decision —
//! last-write-wins. That makes registration order load-bearing: a
//! low-priority "always defer" registered late silently overrides an
//! earlier "always admit". Known sharp edge, kept as-is.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use offload_core::models::MediaItem;
use offload_core::OffloadError;
use offload_state::OffloadStateStore;

/// A named vote in the eligibility chain.
#[async_trait]
pub trait EligibilityPredicate: Send + Sync {
    fn name(&self) -> &str;

    /// Receives the running vote and returns the (possibly overridden) vote.
    /// Erroring counts as "no opinion": the running vote stands.
    async fn should_offload(&self, current: bool, item: &MediaItem) -> Result<bool>;
}

/// Decision returned by [`AdmissionGate::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Defer,
}

/// Where a deferred item stands relative to the grace window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingDisposition {
    /// No deferral recorded for this item.
    NotPending,
    /// Deferred and still within the grace window.
    Waiting,
    /// Deferred longer than the grace window; the gating process is
    /// presumed to have silently failed.
    Overdue,
}

struct RegisteredPredicate {
    priority: i32,
    seq: u64,
    predicate: Arc<dyn EligibilityPredicate>,
}

/// Evaluates the eligibility chain for one item and tracks deferrals.
pub struct AdmissionGate {
    chain: RwLock<Vec<RegisteredPredicate>>,
    next_seq: AtomicU64,
    state: Arc<dyn OffloadStateStore>,
    grace_window: Duration,
}

impl AdmissionGate {
    pub fn new(state: Arc<dyn OffloadStateStore>, grace_window: Duration) -> Self {
        Self {
            chain: RwLock::new(Vec::new()),
            next_seq: AtomicU64::new(0),
            state,
            grace_window,
        }
    }

    /// Register a predicate. Lower priorities vote earlier; equal priorities
    /// keep registration order. The fold is last-write-wins (see module docs).
    pub async fn register(&self, predicate: Arc<dyn EligibilityPredicate>, priority: i32) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut chain = self.chain.write().await;
        tracing::debug!(
            predicate = predicate.name(),
            priority,
            "Eligibility predicate registered"
        );
        chain.push(RegisteredPredicate {
            priority,
            seq,
            predicate,
        });
        chain.sort_by_key(|r| (r.priority, r.seq));
    }

    async fn fold_votes(&self, item: &MediaItem) -> bool {
        let chain = self.chain.read().await;
        let mut admit = true;
        for registered in chain.iter() {
            match registered.predicate.should_offload(admit, item).await {
                Ok(vote) => admit = vote,
                Err(e) => {
                    // one misbehaving integration must not block offloading
                    tracing::warn!(
                        predicate = registered.predicate.name(),
                        item_id = %item.id,
                        error = %e,
                        "Eligibility predicate failed, vote unchanged"
                    );
                }
            }
        }
        admit
    }

    /// Evaluate the chain for one item. Deferral inserts or refreshes the
    /// pending entry at the current time.
    pub async fn evaluate(&self, item: &MediaItem) -> Result<Admission, OffloadError> {
        if self.fold_votes(item).await {
            Ok(Admission::Admit)
        } else {
            self.state.pending_upsert(item.id, Utc::now()).await?;
            tracing::debug!(item_id = %item.id, "Item deferred by eligibility chain");
            Ok(Admission::Defer)
        }
    }

    /// External signal: the gating process started for this item.
    pub async fn gating_started(&self, id: Uuid) -> Result<(), OffloadError> {
        self.state.pending_upsert(id, Utc::now()).await
    }

    /// Where the item stands relative to the grace window.
    pub async fn pending_disposition(&self, id: Uuid) -> Result<PendingDisposition, OffloadError> {
        match self.state.pending_get(id).await? {
            None => Ok(PendingDisposition::NotPending),
            Some(deferred_at) => {
                let age = Utc::now().signed_duration_since(deferred_at);
                if age.num_milliseconds() > self.grace_window.as_millis() as i64 {
                    Ok(PendingDisposition::Overdue)
                } else {
                    Ok(PendingDisposition::Waiting)
                }
            }
        }
    }

    /// Remove the pending entry for an item; returns whether one existed.
    pub async fn clear_pending(&self, id: Uuid) -> Result<bool, OffloadError> {
        self.state.pending_remove(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_core::models::MediaType;
    use offload_state::InMemoryStateStore;
    use std::sync::Mutex;

    struct FixedVote {
        name: String,
        vote: Option<bool>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl FixedVote {
        fn new(name: &str, vote: Option<bool>, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                vote,
                log,
            })
        }
    }

    #[async_trait]
    impl EligibilityPredicate for FixedVote {
        fn name(&self) -> &str {
            &self.name
        }

        async fn should_offload(&self, current: bool, _item: &MediaItem) -> Result<bool> {
            self.log.lock().unwrap().push(self.name.clone());
            match self.vote {
                Some(vote) => Ok(vote),
                None => {
                    let _ = current;
                    Err(anyhow::anyhow!("predicate blew up"))
                }
            }
        }
    }

    fn gate() -> (AdmissionGate, Arc<InMemoryStateStore>) {
        let state = Arc::new(InMemoryStateStore::new());
        (
            AdmissionGate::new(state.clone(), Duration::from_secs(5)),
            state,
        )
    }

    fn item() -> MediaItem {
        MediaItem::new("a.jpg", "/tmp/a.jpg", "image/jpeg", MediaType::Image)
    }

    #[tokio::test]
    async fn empty_chain_admits() {
        let (gate, _) = gate();
        assert_eq!(gate.evaluate(&item()).await.unwrap(), Admission::Admit);
    }

    #[tokio::test]
    async fn last_vote_wins() {
        let (gate, _) = gate();
        let log = Arc::new(Mutex::new(Vec::new()));
        gate.register(FixedVote::new("deny", Some(false), log.clone()), 10)
            .await;
        gate.register(FixedVote::new("allow", Some(true), log.clone()), 20)
            .await;

        // the later predicate restores admission set to false by the earlier one
        assert_eq!(gate.evaluate(&item()).await.unwrap(), Admission::Admit);
        assert_eq!(*log.lock().unwrap(), vec!["deny", "allow"]);
    }

    #[tokio::test]
    async fn priority_orders_the_fold() {
        let (gate, _) = gate();
        let log = Arc::new(Mutex::new(Vec::new()));
        // registered in the opposite order of their priorities
        gate.register(FixedVote::new("allow", Some(true), log.clone()), 20)
            .await;
        gate.register(FixedVote::new("deny", Some(false), log.clone()), 10)
            .await;

        assert_eq!(gate.evaluate(&item()).await.unwrap(), Admission::Admit);
        assert_eq!(*log.lock().unwrap(), vec!["deny", "allow"]);
    }

    #[tokio::test]
    async fn equal_priority_keeps_registration_order() {
        let (gate, _) = gate();
        let log = Arc::new(Mutex::new(Vec::new()));
        gate.register(FixedVote::new("first", Some(true), log.clone()), 10)
            .await;
        gate.register(FixedVote::new("second", Some(false), log.clone()), 10)
            .await;

        assert_eq!(gate.evaluate(&item()).await.unwrap(), Admission::Defer);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn erroring_predicate_has_no_opinion() {
        let (gate, _) = gate();
        let log = Arc::new(Mutex::new(Vec::new()));
        gate.register(FixedVote::new("deny", Some(false), log.clone()), 10)
            .await;
        gate.register(FixedVote::new("broken", None, log.clone()), 20)
            .await;

        // the broken predicate must not override the standing deferral
        assert_eq!(gate.evaluate(&item()).await.unwrap(), Admission::Defer);
    }

    #[tokio::test]
    async fn deferral_records_pending_entry() {
        let (gate, state) = gate();
        let log = Arc::new(Mutex::new(Vec::new()));
        gate.register(FixedVote::new("deny", Some(false), log), 10)
            .await;

        let media = item();
        gate.evaluate(&media).await.unwrap();
        assert!(state.pending_get(media.id).await.unwrap().is_some());

        assert!(gate.clear_pending(media.id).await.unwrap());
        assert!(state.pending_get(media.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn gating_started_refreshes_pending() {
        let (gate, state) = gate();
        let id = Uuid::new_v4();
        let stale = Utc::now() - chrono::Duration::seconds(60);
        state.pending_upsert(id, stale).await.unwrap();
        assert_eq!(
            gate.pending_disposition(id).await.unwrap(),
            PendingDisposition::Overdue
        );

        gate.gating_started(id).await.unwrap();
        assert_eq!(
            gate.pending_disposition(id).await.unwrap(),
            PendingDisposition::Waiting
        );
    }

    #[tokio::test]
    async fn disposition_tracks_grace_window() {
        let (gate, state) = gate();
        let id = Uuid::new_v4();
        assert_eq!(
            gate.pending_disposition(id).await.unwrap(),
            PendingDisposition::NotPending
        );

        state.pending_upsert(id, Utc::now()).await.unwrap();
        assert_eq!(
            gate.pending_disposition(id).await.unwrap(),
            PendingDisposition::Waiting
        );

        let overdue = Utc::now() - chrono::Duration::seconds(10);
        state.pending_upsert(id, overdue).await.unwrap();
        assert_eq!(
            gate.pending_disposition(id).await.unwrap(),
            PendingDisposition::Overdue
        );
    }
}
