//! Active-backend handle and online migration.

use crate::store::{StoreError, StoreKind, TicketStore};
use common::LifecycleState;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("A reload or migration is already in progress")]
    AlreadyLocked,

    #[error("Already using the {0} backend")]
    SameBackend(StoreKind),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owns the active storage backend and swaps it during migration.
///
/// Migration holds the lifecycle lock for its whole duration so no
/// mutating command can interleave; the lock is released on every exit
/// path, success or not.
pub struct StoreManager {
    active: RwLock<Arc<dyn TicketStore>>,
    lifecycle: Arc<LifecycleState>,
}

impl StoreManager {
    pub fn new(initial: Arc<dyn TicketStore>, lifecycle: Arc<LifecycleState>) -> StoreManager {
        StoreManager {
            active: RwLock::new(initial),
            lifecycle,
        }
    }

    /// Current backend; cheap to clone, callers hold no lock afterwards.
    pub async fn active(&self) -> Arc<dyn TicketStore> {
        Arc::clone(&*self.active.read().await)
    }

    pub async fn active_kind(&self) -> StoreKind {
        self.active.read().await.kind()
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleState> {
        &self.lifecycle
    }

    /// Streams every ticket into `target`, preserving ids and action order,
    /// then swaps the active backend. Returns the number migrated.
    pub async fn migrate<B, C>(
        &self,
        target: Arc<dyn TicketStore>,
        on_begin: B,
        on_complete: C,
    ) -> Result<u64, MigrateError>
    where
        B: FnOnce(),
        C: FnOnce(u64),
    {
        let source = self.active().await;
        if source.kind() == target.kind() {
            return Err(MigrateError::SameBackend(target.kind()));
        }

        if !self.lifecycle.lock() {
            return Err(MigrateError::AlreadyLocked);
        }
        on_begin();

        let result = self.run_migration(source, Arc::clone(&target)).await;

        // The lock must be released even on failure or the node deadlocks.
        self.lifecycle.unlock();

        match result {
            Ok(count) => {
                *self.active.write().await = target;
                on_complete(count);
                Ok(count)
            }
            Err(err) => Err(err),
        }
    }

    async fn run_migration(
        &self,
        source: Arc<dyn TicketStore>,
        target: Arc<dyn TicketStore>,
    ) -> Result<u64, MigrateError> {
        let mut count = 0u64;
        for ticket in source.all().await? {
            target.import(ticket).await?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Action, Creator, Ticket};
    use crate::filters::SearchConstraints;
    use crate::models::ticket_actions::ActionKind;
    use crate::models::tickets::TicketStatus;
    use crate::search::SearchPage;
    use crate::store::memory::MemoryStore;
    use crate::store::sql::SqlStore;
    use crate::store::{StoreResult, TicketStore};
    use crate::test_utils::setup_test_db;
    use async_trait::async_trait;
    use uuid::Uuid;

    async fn seed(store: &dyn TicketStore, n: i64) {
        for i in 0..n {
            let mut ticket = Ticket::new(
                Creator::User(Uuid::nil()),
                format!("ticket {i}"),
                1_000 + i,
                None,
            );
            ticket.actions.push(Action {
                kind: ActionKind::Comment,
                message: Some(format!("comment {i}")),
                actor: Creator::Console,
                timestamp: 2_000 + i,
                location: None,
            });
            store.insert(ticket).await.unwrap();
        }
    }

    #[tokio::test]
    async fn migration_preserves_ids_and_action_order() {
        let source = Arc::new(MemoryStore::new());
        seed(source.as_ref(), 5).await;
        let manager = StoreManager::new(source.clone(), LifecycleState::new());

        let target: Arc<dyn TicketStore> = Arc::new(SqlStore::from_connection(
            setup_test_db().await,
            crate::store::StoreKind::Sqlite,
        ));

        let mut began = false;
        let count = manager
            .migrate(Arc::clone(&target), || began = true, |_| {})
            .await
            .unwrap();

        assert!(began);
        assert_eq!(count, 5);
        assert_eq!(target.count().await.unwrap(), 5);
        assert!(!manager.lifecycle().is_locked());
        assert_eq!(manager.active_kind().await, crate::store::StoreKind::Sqlite);

        for id in 1..=5 {
            let before = source.get(id).await.unwrap().unwrap();
            let after = target.get(id).await.unwrap().unwrap();
            assert_eq!(after.id, before.id);
            assert_eq!(
                after.actions.iter().map(|a| a.kind).collect::<Vec<_>>(),
                before.actions.iter().map(|a| a.kind).collect::<Vec<_>>()
            );
        }
    }

    #[tokio::test]
    async fn migration_to_same_backend_kind_is_rejected() {
        let manager = StoreManager::new(Arc::new(MemoryStore::new()), LifecycleState::new());
        let err = manager
            .migrate(Arc::new(MemoryStore::new()), || {}, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::SameBackend(_)));
        assert!(!manager.lifecycle().is_locked());
    }

    #[tokio::test]
    async fn migration_refused_while_locked() {
        let lifecycle = LifecycleState::new();
        lifecycle.lock();
        let manager = StoreManager::new(Arc::new(MemoryStore::new()), Arc::clone(&lifecycle));

        let target: Arc<dyn TicketStore> = Arc::new(SqlStore::from_connection(
            setup_test_db().await,
            crate::store::StoreKind::Sqlite,
        ));
        let err = manager.migrate(target, || {}, |_| {}).await.unwrap_err();
        assert!(matches!(err, MigrateError::AlreadyLocked));
    }

    /// Backend whose import always fails, for the lock-release guarantee.
    struct FailingStore;

    #[async_trait]
    impl TicketStore for FailingStore {
        fn kind(&self) -> crate::store::StoreKind {
            crate::store::StoreKind::Sqlite
        }
        async fn insert(&self, _t: Ticket) -> StoreResult<i64> {
            Err(StoreError::Corrupt("write refused".into()))
        }
        async fn import(&self, _t: Ticket) -> StoreResult<()> {
            Err(StoreError::Corrupt("write refused".into()))
        }
        async fn get(&self, _id: i64) -> StoreResult<Option<Ticket>> {
            Ok(None)
        }
        async fn all(&self) -> StoreResult<Vec<Ticket>> {
            Ok(Vec::new())
        }
        async fn count(&self) -> StoreResult<u64> {
            Ok(0)
        }
        async fn set_status(&self, id: i64, _s: TicketStatus) -> StoreResult<()> {
            Err(StoreError::NotFound(id))
        }
        async fn set_priority(&self, id: i64, _p: crate::domain::Priority) -> StoreResult<()> {
            Err(StoreError::NotFound(id))
        }
        async fn set_assignment(&self, id: i64, _a: crate::domain::Assignment) -> StoreResult<()> {
            Err(StoreError::NotFound(id))
        }
        async fn set_creator_status_update(&self, id: i64, _v: bool) -> StoreResult<()> {
            Err(StoreError::NotFound(id))
        }
        async fn append_action(&self, id: i64, _a: Action) -> StoreResult<()> {
            Err(StoreError::NotFound(id))
        }
        async fn mass_close(&self, _l: i64, _u: i64, _a: Action) -> StoreResult<Vec<i64>> {
            Ok(Vec::new())
        }
        async fn search(
            &self,
            _c: &SearchConstraints,
            _p: usize,
        ) -> StoreResult<SearchPage> {
            Ok(SearchPage::empty())
        }
    }

    #[tokio::test]
    async fn failed_migration_releases_lock_and_keeps_source_active() {
        let source = Arc::new(MemoryStore::new());
        seed(source.as_ref(), 2).await;
        let manager = StoreManager::new(source, LifecycleState::new());

        let err = manager
            .migrate(Arc::new(FailingStore), || {}, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, MigrateError::Store(_)));
        assert!(!manager.lifecycle().is_locked());
        assert_eq!(manager.active_kind().await, crate::store::StoreKind::Memory);
    }
}
