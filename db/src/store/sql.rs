//! SQL backend over SeaORM.
//!
//! One implementation covers both the embedded file-backed store (SQLite)
//! and the networked store (Postgres); the connection URL decides which.
//! Schema migrations run at connect.

use crate::domain::{Action, Assignment, Creator, Location, Priority, Ticket};
use crate::filters::{SearchConstraints, Symbol};
use crate::models::{ticket_actions, tickets};
use crate::search::{self, SearchPage};
use crate::store::{StoreError, StoreKind, StoreResult, TicketStore};
use async_trait::async_trait;
use chrono::Utc;
use migration::Migrator;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use sea_orm_migration::MigratorTrait;
use std::collections::HashMap;
use std::path::Path;

pub struct SqlStore {
    db: DatabaseConnection,
    kind: StoreKind,
}

impl SqlStore {
    /// Connects to `path_or_url` and brings the schema up to date.
    ///
    /// A DSN is used as-is; anything else is treated as a SQLite file path
    /// (intermediate directories created, since SQLite won't).
    pub async fn connect(path_or_url: &str) -> StoreResult<SqlStore> {
        let url = if path_or_url.starts_with("sqlite:")
            || path_or_url.starts_with("postgres://")
            || path_or_url.starts_with("postgresql://")
        {
            path_or_url.to_string()
        } else {
            if let Some(parent) = Path::new(path_or_url).parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            format!("sqlite://{path_or_url}?mode=rwc")
        };

        let kind = if url.starts_with("postgres") {
            StoreKind::Postgres
        } else {
            StoreKind::Sqlite
        };

        let db = Database::connect(&url).await?;
        Migrator::up(&db, None).await?;
        Ok(SqlStore { db, kind })
    }

    /// Wraps an existing connection; the schema must already exist.
    pub fn from_connection(db: DatabaseConnection, kind: StoreKind) -> SqlStore {
        SqlStore { db, kind }
    }

    async fn ticket_row(&self, id: i64) -> StoreResult<tickets::Model> {
        tickets::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    /// Column-level pushdown for the constraints the database can check
    /// cheaply; the rest runs through the shared evaluator.
    fn pushdown_condition(constraints: &SearchConstraints) -> Condition {
        let mut condition = Condition::all();
        if let Some(c) = &constraints.status {
            condition = match c.symbol {
                Symbol::NotEquals => condition.add(tickets::Column::Status.ne(c.value)),
                _ => condition.add(tickets::Column::Status.eq(c.value)),
            };
        }
        if let Some(c) = &constraints.priority {
            let level = c.value.level() as i32;
            condition = match c.symbol {
                Symbol::Equals => condition.add(tickets::Column::Priority.eq(level)),
                Symbol::NotEquals => condition.add(tickets::Column::Priority.ne(level)),
                Symbol::LessThan => condition.add(tickets::Column::Priority.lt(level)),
                Symbol::GreaterThan => condition.add(tickets::Column::Priority.gt(level)),
            };
        }
        if let Some(c) = &constraints.creator {
            let encoded = c.value.encode();
            condition = match c.symbol {
                Symbol::NotEquals => condition.add(tickets::Column::Creator.ne(encoded)),
                _ => condition.add(tickets::Column::Creator.eq(encoded)),
            };
        }
        if let Some(c) = &constraints.assigned {
            let encoded = c.value.encode();
            condition = match c.symbol {
                Symbol::NotEquals => condition.add(tickets::Column::AssignedTo.ne(encoded)),
                _ => condition.add(tickets::Column::AssignedTo.eq(encoded)),
            };
        }
        condition
    }

    async fn load_with_actions(&self, condition: Condition) -> StoreResult<Vec<Ticket>> {
        let rows = tickets::Entity::find()
            .filter(condition)
            .order_by_asc(tickets::Column::Id)
            .all(&self.db)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let action_rows = ticket_actions::Entity::find()
            .filter(ticket_actions::Column::TicketId.is_in(ids))
            .order_by_asc(ticket_actions::Column::Id)
            .all(&self.db)
            .await?;

        let mut grouped: HashMap<i64, Vec<ticket_actions::Model>> = HashMap::new();
        for row in action_rows {
            grouped.entry(row.ticket_id).or_default().push(row);
        }

        rows.into_iter()
            .map(|row| {
                let actions = grouped.remove(&row.id).unwrap_or_default();
                to_domain(row, actions)
            })
            .collect()
    }
}

#[async_trait]
impl TicketStore for SqlStore {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    async fn insert(&self, ticket: Ticket) -> StoreResult<i64> {
        let row = tickets::ActiveModel {
            creator: Set(ticket.creator.encode()),
            assigned_to: Set(ticket.assigned_to.encode()),
            priority: Set(ticket.priority.level() as i32),
            status: Set(ticket.status),
            creator_status_update: Set(ticket.creator_status_update),
            ..Default::default()
        };
        let inserted = row.insert(&self.db).await?;
        let id = inserted.id;

        // The id is allocated; the history write completes off the caller's
        // path. A failure here is logged, not surfaced.
        let db = self.db.clone();
        let actions = ticket.actions;
        tokio::spawn(async move {
            for action in actions {
                let row = action_to_active(id, &action);
                if let Err(err) = row.insert(&db).await {
                    log::error!("Failed to persist action for ticket {id}: {err}");
                    break;
                }
            }
        });

        Ok(id)
    }

    async fn import(&self, ticket: Ticket) -> StoreResult<()> {
        let id = ticket.id;
        let row = tickets::ActiveModel {
            id: Set(id),
            creator: Set(ticket.creator.encode()),
            assigned_to: Set(ticket.assigned_to.encode()),
            priority: Set(ticket.priority.level() as i32),
            status: Set(ticket.status),
            creator_status_update: Set(ticket.creator_status_update),
        };
        tickets::Entity::insert(row).exec(&self.db).await?;

        for action in &ticket.actions {
            action_to_active(id, action).insert(&self.db).await?;
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Ticket>> {
        let Some(row) = tickets::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let actions = ticket_actions::Entity::find()
            .filter(ticket_actions::Column::TicketId.eq(id))
            .order_by_asc(ticket_actions::Column::Id)
            .all(&self.db)
            .await?;
        to_domain(row, actions).map(Some)
    }

    async fn all(&self) -> StoreResult<Vec<Ticket>> {
        self.load_with_actions(Condition::all()).await
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(tickets::Entity::find().count(&self.db).await?)
    }

    async fn set_status(&self, id: i64, status: crate::models::tickets::TicketStatus) -> StoreResult<()> {
        let mut active: tickets::ActiveModel = self.ticket_row(id).await?.into();
        active.status = Set(status);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn set_priority(&self, id: i64, priority: Priority) -> StoreResult<()> {
        let mut active: tickets::ActiveModel = self.ticket_row(id).await?.into();
        active.priority = Set(priority.level() as i32);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn set_assignment(&self, id: i64, assignment: Assignment) -> StoreResult<()> {
        let mut active: tickets::ActiveModel = self.ticket_row(id).await?.into();
        active.assigned_to = Set(assignment.encode());
        active.update(&self.db).await?;
        Ok(())
    }

    async fn set_creator_status_update(&self, id: i64, value: bool) -> StoreResult<()> {
        let mut active: tickets::ActiveModel = self.ticket_row(id).await?.into();
        active.creator_status_update = Set(value);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn append_action(&self, id: i64, action: Action) -> StoreResult<()> {
        // Existence check so a bad id surfaces as NotFound, not an FK error.
        self.ticket_row(id).await?;
        action_to_active(id, &action).insert(&self.db).await?;
        Ok(())
    }

    async fn mass_close(&self, lower: i64, upper: i64, action: Action) -> StoreResult<Vec<i64>> {
        use crate::models::tickets::TicketStatus;

        let rows = tickets::Entity::find()
            .filter(
                Condition::all()
                    .add(tickets::Column::Id.gte(lower))
                    .add(tickets::Column::Id.lte(upper))
                    .add(tickets::Column::Status.eq(TicketStatus::Open)),
            )
            .order_by_asc(tickets::Column::Id)
            .all(&self.db)
            .await?;

        let mut closed = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            let mut active: tickets::ActiveModel = row.into();
            active.status = Set(TicketStatus::Closed);
            active.update(&self.db).await?;
            action_to_active(id, &action).insert(&self.db).await?;
            closed.push(id);
        }
        Ok(closed)
    }

    async fn search(
        &self,
        constraints: &SearchConstraints,
        page_size: usize,
    ) -> StoreResult<SearchPage> {
        let candidates = self
            .load_with_actions(Self::pushdown_condition(constraints))
            .await?;
        let now = Utc::now().timestamp();
        let hits: Vec<Ticket> = candidates
            .into_iter()
            .filter(|t| search::matches(t, constraints, now))
            .collect();
        Ok(search::paginate(hits, constraints.page, page_size))
    }
}

fn action_to_active(ticket_id: i64, action: &Action) -> ticket_actions::ActiveModel {
    let (server, world, x, y, z) = match &action.location {
        Some(Location::FromPlayer {
            server,
            world,
            x,
            y,
            z,
        }) => (
            Some(server.clone()),
            Some(world.clone()),
            Some(*x),
            Some(*y),
            Some(*z),
        ),
        Some(Location::FromConsole { server }) => (Some(server.clone()), None, None, None, None),
        None => (None, None, None, None, None),
    };

    ticket_actions::ActiveModel {
        ticket_id: Set(ticket_id),
        kind: Set(action.kind),
        message: Set(action.message.clone()),
        actor: Set(action.actor.encode()),
        epoch_seconds: Set(action.timestamp),
        server: Set(server),
        world: Set(world),
        x: Set(x),
        y: Set(y),
        z: Set(z),
        ..Default::default()
    }
}

fn to_domain(
    row: tickets::Model,
    action_rows: Vec<ticket_actions::Model>,
) -> StoreResult<Ticket> {
    let priority = Priority::from_level(row.priority as u8).ok_or_else(|| {
        StoreError::Corrupt(format!(
            "ticket {} has priority level {}",
            row.id, row.priority
        ))
    })?;

    let actions = action_rows
        .into_iter()
        .map(|a| {
            let location = match (a.server, a.world, a.x, a.y, a.z) {
                (Some(server), Some(world), Some(x), Some(y), Some(z)) => {
                    Some(Location::FromPlayer {
                        server,
                        world,
                        x,
                        y,
                        z,
                    })
                }
                (Some(server), None, ..) => Some(Location::FromConsole { server }),
                _ => None,
            };
            Action {
                kind: a.kind,
                message: a.message,
                actor: Creator::decode(&a.actor),
                timestamp: a.epoch_seconds,
                location,
            }
        })
        .collect();

    Ok(Ticket {
        id: row.id,
        creator: Creator::decode(&row.creator),
        assigned_to: Assignment::decode(&row.assigned_to),
        priority,
        status: row.status,
        creator_status_update: row.creator_status_update,
        actions,
    })
}
