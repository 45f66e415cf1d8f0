//! Process-wide index of watched fields.
//!
//! Maps `(model, field)` pairs to the rules watching them, plus the set of
//! models with at least one watched field. Built lazily from the rules table
//! on first use and cleared on every rule create, update or delete; the next
//! lookup rebuilds it.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use audit_core::traits::{NotificationRuleRepository, RepoResult};
use audit_core::value_objects::WatchedField;

/// Immutable view of the watched fields
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WatchSnapshot {
    rules_by_field: HashMap<WatchedField, Vec<i64>>,
    models: HashSet<String>,
}

impl WatchSnapshot {
    /// Build from `(target, rule id)` pairs
    pub fn from_targets(targets: impl IntoIterator<Item = (WatchedField, i64)>) -> Self {
        let mut rules_by_field: HashMap<WatchedField, BTreeSet<i64>> = HashMap::new();
        for (target, rule_id) in targets {
            rules_by_field.entry(target).or_default().insert(rule_id);
        }
        let models = rules_by_field.keys().map(|t| t.model.clone()).collect();

        Self {
            rules_by_field: rules_by_field
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            models,
        }
    }

    /// Rules watching a field, ascending
    pub fn rules_for(&self, model: &str, field: &str) -> &[i64] {
        self.rules_by_field
            .get(&WatchedField::new(model, field))
            .map_or(&[], Vec::as_slice)
    }

    pub fn is_watched(&self, model: &str, field: &str) -> bool {
        !self.rules_for(model, field).is_empty()
    }

    /// Whether any field of the model is watched
    pub fn is_model_watched(&self, model: &str) -> bool {
        self.models.contains(model)
    }

    /// Watched fields of a model
    pub fn watched_fields<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rules_by_field
            .keys()
            .filter(move |t| t.model == model)
            .map(|t| t.field.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rules_by_field.is_empty()
    }
}

/// Lazily built, explicitly invalidated watch index
#[derive(Debug, Default)]
pub struct NotificationFieldCache {
    snapshot: RwLock<Option<Arc<WatchSnapshot>>>,
    generation: AtomicU64,
}

impl NotificationFieldCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, rebuilt from the rules table when cleared
    pub async fn snapshot(
        &self,
        rules: &dyn NotificationRuleRepository,
    ) -> RepoResult<Arc<WatchSnapshot>> {
        let cached = self.snapshot.read().clone();
        match cached {
            Some(snapshot) => Ok(snapshot),
            None => self.rebuild(rules).await,
        }
    }

    /// Rebuild from the rules table
    ///
    /// A rebuild that raced with `invalidate` is returned to its caller but
    /// not stored, so the next lookup reads the rules again.
    pub async fn rebuild(
        &self,
        rules: &dyn NotificationRuleRepository,
    ) -> RepoResult<Arc<WatchSnapshot>> {
        let generation = self.generation.load(Ordering::Acquire);
        let targets = rules.list_targets().await?;
        let snapshot = Arc::new(WatchSnapshot::from_targets(targets));

        let mut slot = self.snapshot.write();
        if self.generation.load(Ordering::Acquire) == generation {
            *slot = Some(Arc::clone(&snapshot));
        }
        drop(slot);

        tracing::debug!(
            fields = snapshot.rules_by_field.len(),
            models = snapshot.models.len(),
            "Notification field cache rebuilt"
        );
        Ok(snapshot)
    }

    /// Drop the snapshot; the next lookup rebuilds it
    pub fn invalidate(&self) {
        let mut slot = self.snapshot.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *slot = None;
        drop(slot);
        tracing::debug!("Notification field cache invalidated");
    }

    pub fn is_populated(&self) -> bool {
        self.snapshot.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use audit_core::entities::{NewNotificationRule, NotificationRule};
    use audit_core::error::DomainError;
    use std::sync::atomic::AtomicUsize;

    /// Rules repository serving a fixed target list and counting loads
    struct StaticTargets {
        targets: RwLock<Vec<(WatchedField, i64)>>,
        loads: AtomicUsize,
    }

    impl StaticTargets {
        fn new(targets: Vec<(WatchedField, i64)>) -> Self {
            Self {
                targets: RwLock::new(targets),
                loads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl NotificationRuleRepository for StaticTargets {
        async fn list(&self) -> RepoResult<Vec<NotificationRule>> {
            Ok(Vec::new())
        }
        async fn find_by_id(&self, _id: i64) -> RepoResult<Option<NotificationRule>> {
            Ok(None)
        }
        async fn create(&self, _rule: &NewNotificationRule) -> RepoResult<NotificationRule> {
            Err(DomainError::InternalError("read only".to_string()))
        }
        async fn update(&self, id: i64, _rule: &NewNotificationRule) -> RepoResult<NotificationRule> {
            Err(DomainError::RuleNotFound(id))
        }
        async fn delete(&self, id: i64) -> RepoResult<()> {
            Err(DomainError::RuleNotFound(id))
        }
        async fn list_targets(&self) -> RepoResult<Vec<(WatchedField, i64)>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.targets.read().clone())
        }
    }

    #[test]
    fn test_snapshot_index() {
        let snapshot = WatchSnapshot::from_targets(vec![
            (WatchedField::new("project.task", "priority"), 2),
            (WatchedField::new("project.task", "priority"), 1),
            (WatchedField::new("project.task", "priority"), 2),
            (WatchedField::new("sale.order", "state"), 3),
        ]);
        assert_eq!(snapshot.rules_for("project.task", "priority"), &[1, 2]);
        assert!(snapshot.rules_for("project.task", "name").is_empty());
        assert!(snapshot.is_model_watched("sale.order"));
        assert!(!snapshot.is_model_watched("stock.move"));
        assert_eq!(snapshot.watched_fields("sale.order").collect::<Vec<_>>(), vec!["state"]);
    }

    #[tokio::test]
    async fn test_lazy_build_and_reuse() {
        let repo = StaticTargets::new(vec![(WatchedField::new("project.task", "priority"), 1)]);
        let cache = NotificationFieldCache::new();
        assert!(!cache.is_populated());

        let first = cache.snapshot(&repo).await.unwrap();
        let second = cache.snapshot(&repo).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(repo.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_rebuilds_from_source() {
        let repo = StaticTargets::new(vec![]);
        let cache = NotificationFieldCache::new();
        assert!(cache.snapshot(&repo).await.unwrap().is_empty());

        repo.targets
            .write()
            .push((WatchedField::new("project.task", "priority"), 7));
        // Still the stale snapshot until invalidated
        assert!(cache.snapshot(&repo).await.unwrap().is_empty());

        cache.invalidate();
        assert!(!cache.is_populated());
        let snapshot = cache.snapshot(&repo).await.unwrap();
        assert_eq!(snapshot.rules_for("project.task", "priority"), &[7]);
        assert_eq!(repo.loads.load(Ordering::SeqCst), 2);
    }
}
