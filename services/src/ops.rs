//! Operational verbs: reload and storage migration.
//!
//! Both hold the lifecycle lock for their whole duration. A reload is the
//! only path that force-cancels detached work, and only after the drain
//! window has expired.

use crate::capabilities::MessageTarget;
use crate::error::{CommandError, CommandResult};
use crate::messages::MessageKey;
use crate::pipeline::CommandPipeline;
use crate::sender::CommandSender;
use db::store::{MemoryStore, SqlStore, StoreKind, TicketStore};
use std::str::FromStr;
use std::sync::Arc;

impl CommandPipeline {
    /// Drain in-flight commands, abort stragglers past the timeout, and
    /// reset transient state. Configuration changes take effect when the
    /// host rebuilds the pipeline afterwards.
    pub(crate) async fn run_reload(&self, sender: &CommandSender) -> CommandResult<()> {
        self.send_to(sender, MessageKey::ReloadStarted, &vec![]).await;
        log::info!("Reload requested by {}", sender.name());

        let lifecycle = Arc::clone(self.store.lifecycle());
        if !lifecycle.lock() {
            return Err(CommandError::Locked);
        }

        if !lifecycle.drain(self.config.reload_timeout).await {
            let aborted = self.tasks.abort_all();
            log::warn!(
                "Reload drain timed out after {:?}; aborted {aborted} background tasks",
                self.config.reload_timeout
            );
            self.send_to(
                sender,
                MessageKey::ReloadLongTask,
                &vec![("aborted", aborted.to_string())],
            )
            .await;
        }

        self.cooldowns.clear();
        lifecycle.unlock();

        self.send_to(sender, MessageKey::ReloadCompleted, &vec![]).await;
        log::info!("Reload complete");
        Ok(())
    }

    /// Copy every ticket into a freshly built backend and swap it in.
    /// `migrate <backend> [dsn]`; without a DSN the configured database
    /// URL is reused.
    pub(crate) async fn run_migrate(
        &self,
        sender: &CommandSender,
        raw: &[String],
    ) -> CommandResult<()> {
        let kind = raw
            .get(1)
            .and_then(|token| StoreKind::from_str(token).ok())
            .ok_or(CommandError::InvalidSyntax)?;
        let dsn = raw
            .get(2)
            .cloned()
            .unwrap_or_else(|| self.config.database_url.clone());

        let target: Arc<dyn TicketStore> = match kind {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::Sqlite | StoreKind::Postgres => Arc::new(SqlStore::connect(&dsn).await?),
        };
        // A DSN pointing at a different engine than the named backend is a
        // user mistake, caught before any data moves.
        if target.kind() != kind {
            return Err(CommandError::InvalidSyntax);
        }

        let target_name = kind.to_string();
        let sender_target = MessageTarget::of(sender);

        let begin_text = self.locale.render(
            MessageKey::MigrateStarted,
            &vec![("backend", target_name.clone())],
        );
        let begin_sink = Arc::clone(&self.sink);
        let begin_target = sender_target.clone();
        let begin_tasks = Arc::clone(&self.tasks);
        let begin_name = target_name.clone();
        let on_begin = move || {
            log::info!("Storage migration to {begin_name} started");
            begin_tasks.spawn(async move {
                begin_sink.send(begin_target, begin_text).await;
            });
        };

        let locale = Arc::clone(&self.locale);
        let done_sink = Arc::clone(&self.sink);
        let done_tasks = Arc::clone(&self.tasks);
        let done_name = target_name.clone();
        let on_complete = move |count: u64| {
            log::info!("Storage migration to {done_name} finished, {count} tickets moved");
            let text = locale.render(
                MessageKey::MigrateCompleted,
                &vec![("backend", done_name), ("count", count.to_string())],
            );
            done_tasks.spawn(async move {
                done_sink.send(sender_target, text).await;
            });
        };

        self.store.migrate(target, on_begin, on_complete).await?;
        Ok(())
    }
}
