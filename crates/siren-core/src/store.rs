//! In-memory item registry with serialized per-item mutation.
//!
//! Persistence is an external collaborator; this registry is the seam the
//! mutation API runs against. Transitions on one item are serialized by a
//! per-item mutex so two concurrent callers cannot both succeed against a
//! stale status; transitions on different items share no lock. Snapshots
//! preserve insertion order, which the aggregator's priority list depends
//! on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::EngineError;
use crate::model::item::{Status, WorkItem};

#[derive(Debug, Default)]
pub struct ItemStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<String, Arc<Mutex<WorkItem>>>,
    order: Vec<String>,
}

impl ItemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new item.
    ///
    /// Rejects duplicate ids and items without `created_at` — every stored
    /// item must be usable by the strict classifier path.
    pub fn insert(&self, item: WorkItem) -> Result<(), EngineError> {
        if item.created_at.is_none() {
            return Err(EngineError::MissingRequiredField {
                id: item.id.clone(),
                field: "created_at",
            });
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.items.contains_key(&item.id) {
            return Err(EngineError::DuplicateItem { id: item.id });
        }

        inner.order.push(item.id.clone());
        inner
            .items
            .insert(item.id.clone(), Arc::new(Mutex::new(item)));
        Ok(())
    }

    /// Clone one item out.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<WorkItem> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .items
            .get(id)
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    /// Snapshot all items in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<WorkItem> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .order
            .iter()
            .filter_map(|id| inner.items.get(id))
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply a validated status transition.
    ///
    /// `from` is the caller's expected current status (optimistic check): a
    /// mismatch is a [`EngineError::StatusConflict`], not an invalid
    /// transition, because the requested edge may itself be legal.
    ///
    /// Side effects on success:
    /// - the first transition out of `pending` stamps `first_action_at` if
    ///   unset (first wins);
    /// - a transition into `closed` stamps `resolved_at` if unset;
    /// - a transition into `assigned` records `assignee_id` from `actor`.
    ///
    /// Stamps clamp forward so `created_at <= first_action_at <=
    /// resolved_at` holds even when the caller's clock runs behind.
    pub fn apply_transition(
        &self,
        id: &str,
        from: Status,
        to: Status,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<WorkItem, EngineError> {
        let slot = {
            let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            inner
                .items
                .get(id)
                .cloned()
                .ok_or_else(|| EngineError::ItemNotFound { id: id.to_string() })?
        };

        let mut item = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if item.status != from {
            return Err(EngineError::StatusConflict {
                id: id.to_string(),
                expected: from,
                actual: item.status,
            });
        }

        from.ensure_transition(to)?;

        let created_at = item
            .created_at
            .ok_or_else(|| EngineError::MissingRequiredField {
                id: id.to_string(),
                field: "created_at",
            })?;

        if from == Status::Pending && item.first_action_at.is_none() {
            item.first_action_at = Some(at.max(created_at));
        }

        if to == Status::Closed && item.resolved_at.is_none() {
            let floor = item.first_action_at.unwrap_or(created_at);
            item.resolved_at = Some(at.max(floor));
        }

        if to == Status::Assigned {
            if let Some(actor) = actor {
                item.assignee_id = Some(actor.to_string());
            }
        }

        item.status = to;
        debug!(id, from = %from, to = %to, "applied transition");
        Ok(item.clone())
    }
}
