//! Pluggable ticket storage.
//!
//! Backends implement `TicketStore`; the `StoreManager` owns the active
//! backend and drives online migration between backends.

pub mod manager;
pub mod memory;
pub mod sql;

pub use manager::{MigrateError, StoreManager};
pub use memory::MemoryStore;
pub use sql::SqlStore;

use crate::domain::{Action, Assignment, Priority, Ticket};
use crate::filters::SearchConstraints;
use crate::models::tickets::TicketStatus;
use crate::search::SearchPage;
use async_trait::async_trait;
use sea_orm::DbErr;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Ticket not found: {0}")]
    NotFound(i64),

    #[error("Corrupt stored record: {0}")]
    Corrupt(String),
}

/// Backend selector, parsed from the `migrate <target>` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Sqlite,
    Postgres,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StoreKind::Memory => "memory",
            StoreKind::Sqlite => "sqlite",
            StoreKind::Postgres => "postgres",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "sqlite" => Ok(StoreKind::Sqlite),
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

/// Durable ticket CRUD, ID allocation and search execution.
///
/// `insert` allocates and returns the new id without blocking on the rest
/// of the write completing; callers must not assume the full ticket is
/// durable the instant the call returns. `import` is the migration path
/// and is fully awaited.
#[async_trait]
pub trait TicketStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Persists a new ticket, allocating its id. The given ticket carries
    /// the -1 sentinel id; the returned id is what was allocated.
    async fn insert(&self, ticket: Ticket) -> StoreResult<i64>;

    /// Migration insert: preserves the ticket's id and exact action order,
    /// fully awaited.
    async fn import(&self, ticket: Ticket) -> StoreResult<()>;

    async fn get(&self, id: i64) -> StoreResult<Option<Ticket>>;

    /// Every ticket, ascending id. Used by online migration.
    async fn all(&self) -> StoreResult<Vec<Ticket>>;

    async fn count(&self) -> StoreResult<u64>;

    async fn set_status(&self, id: i64, status: TicketStatus) -> StoreResult<()>;

    async fn set_priority(&self, id: i64, priority: Priority) -> StoreResult<()>;

    async fn set_assignment(&self, id: i64, assignment: Assignment) -> StoreResult<()>;

    async fn set_creator_status_update(&self, id: i64, value: bool) -> StoreResult<()>;

    async fn append_action(&self, id: i64, action: Action) -> StoreResult<()>;

    /// Closes every Open ticket with id in `[lower, upper]`, appending the
    /// given action to each. Returns the affected ids.
    async fn mass_close(&self, lower: i64, upper: i64, action: Action) -> StoreResult<Vec<i64>>;

    async fn search(
        &self,
        constraints: &SearchConstraints,
        page_size: usize,
    ) -> StoreResult<SearchPage>;
}
