//! In-memory backend: a shared map plus an atomic id counter.

use crate::domain::{Action, Assignment, Priority, Ticket};
use crate::filters::SearchConstraints;
use crate::models::tickets::TicketStatus;
use crate::search::{self, SearchPage};
use crate::store::{StoreError, StoreKind, StoreResult, TicketStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    tickets: RwLock<HashMap<i64, Ticket>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tickets: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    async fn mutate<F>(&self, id: i64, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Ticket),
    {
        let mut map = self.tickets.write().await;
        let ticket = map.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        f(ticket);
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }

    async fn insert(&self, mut ticket: Ticket) -> StoreResult<i64> {
        let id = self.next_id.fetch_add(1, Ordering::AcqRel);
        ticket.id = id;
        self.tickets.write().await.insert(id, ticket);
        Ok(id)
    }

    async fn import(&self, ticket: Ticket) -> StoreResult<()> {
        let id = ticket.id;
        self.tickets.write().await.insert(id, ticket);
        // Keep allocation ahead of the highest imported id.
        self.next_id.fetch_max(id + 1, Ordering::AcqRel);
        Ok(())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Ticket>> {
        Ok(self.tickets.read().await.get(&id).cloned())
    }

    async fn all(&self) -> StoreResult<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self.tickets.read().await.values().cloned().collect();
        tickets.sort_by_key(|t| t.id);
        Ok(tickets)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.tickets.read().await.len() as u64)
    }

    async fn set_status(&self, id: i64, status: TicketStatus) -> StoreResult<()> {
        self.mutate(id, |t| t.status = status).await
    }

    async fn set_priority(&self, id: i64, priority: Priority) -> StoreResult<()> {
        self.mutate(id, |t| t.priority = priority).await
    }

    async fn set_assignment(&self, id: i64, assignment: Assignment) -> StoreResult<()> {
        self.mutate(id, |t| t.assigned_to = assignment).await
    }

    async fn set_creator_status_update(&self, id: i64, value: bool) -> StoreResult<()> {
        self.mutate(id, |t| t.creator_status_update = value).await
    }

    async fn append_action(&self, id: i64, action: Action) -> StoreResult<()> {
        self.mutate(id, |t| t.actions.push(action)).await
    }

    async fn mass_close(&self, lower: i64, upper: i64, action: Action) -> StoreResult<Vec<i64>> {
        let mut map = self.tickets.write().await;
        let mut closed = Vec::new();
        for (id, ticket) in map.iter_mut() {
            if *id >= lower && *id <= upper && ticket.status == TicketStatus::Open {
                ticket.status = TicketStatus::Closed;
                ticket.actions.push(action.clone());
                closed.push(*id);
            }
        }
        closed.sort_unstable();
        Ok(closed)
    }

    async fn search(
        &self,
        constraints: &SearchConstraints,
        page_size: usize,
    ) -> StoreResult<SearchPage> {
        let now = Utc::now().timestamp();
        let hits: Vec<Ticket> = self
            .tickets
            .read()
            .await
            .values()
            .filter(|t| search::matches(t, constraints, now))
            .cloned()
            .collect();
        Ok(search::paginate(hits, constraints.page, page_size))
    }
}
