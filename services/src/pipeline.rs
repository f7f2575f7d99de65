//! Command execution pipeline.
//!
//! Every command runs the same gauntlet: syntax, lifecycle gate, ticket
//! resolution, then validation, authorization and cooldown checked
//! concurrently, then the verb handler. Any failure short-circuits into a
//! localized warning to the sender; infra failures are additionally logged
//! and reported only as a generic unexpected error.

use crate::capabilities::{
    Directory, LocaleProvider, MessageSink, MessageTarget, PermissionProvider,
};
use crate::cooldown::CooldownTracker;
use crate::error::{CommandError, CommandResult};
use crate::messages::{MessageKey, Params};
use crate::notify::NotificationEngine;
use crate::query;
use crate::sender::CommandSender;
use crate::tasks::TaskSupervisor;
use db::domain::{Action, Assignment, Creator, Location, Priority, Ticket};
use db::models::ticket_actions::ActionKind;
use db::models::tickets::TicketStatus;
use db::store::manager::StoreManager;
use db::store::TicketStore;
use relay::codec::{NotificationBody, TeleportRequest};
use relay::manager::RelayManager;
use std::sync::Arc;
use std::time::Duration;

/// Grants the silent `s.` variants of the mutating verbs.
pub const PERM_SILENCE: &str = "ticket.commandarg.silence";

/// Pipeline settings snapshot, taken from [`common::Config`] at
/// construction. Rebuilding the pipeline applies changed settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub server_name: String,
    pub page_size: usize,
    pub cooldown_enabled: bool,
    pub cooldown: Duration,
    pub unread_updates_enabled: bool,
    pub reload_timeout: Duration,
    pub database_url: String,
}

impl PipelineConfig {
    pub fn from_config(config: &common::Config) -> PipelineConfig {
        PipelineConfig {
            server_name: config.server_name.clone(),
            page_size: config.search_page_size,
            cooldown_enabled: config.cooldown_enabled,
            cooldown: Duration::from_secs(config.cooldown_seconds),
            unread_updates_enabled: config.unread_updates_enabled,
            reload_timeout: Duration::from_secs(config.reload_timeout_seconds),
            database_url: config.database_url.clone(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            server_name: "server".to_string(),
            page_size: 8,
            cooldown_enabled: false,
            cooldown: Duration::from_secs(300),
            unread_updates_enabled: true,
            reload_timeout: Duration::from_secs(30),
            database_url: "sqlite::memory:".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Create,
    Comment,
    Close,
    Reopen,
    Assign,
    SetPriority,
    MassClose,
    View,
    Search,
    Teleport,
    Reload,
    Migrate,
}

impl Verb {
    fn parse(token: &str) -> Option<(Verb, bool)> {
        let lowered = token.to_ascii_lowercase();
        let (name, silent) = match lowered.strip_prefix("s.") {
            Some(rest) => (rest, true),
            None => (lowered.as_str(), false),
        };
        let verb = match name {
            "create" => Verb::Create,
            "comment" => Verb::Comment,
            "close" => Verb::Close,
            "reopen" => Verb::Reopen,
            "assign" => Verb::Assign,
            "setpriority" => Verb::SetPriority,
            "massclose" => Verb::MassClose,
            "view" => Verb::View,
            "search" => Verb::Search,
            "teleport" => Verb::Teleport,
            "reload" => Verb::Reload,
            "migrate" => Verb::Migrate,
            _ => return None,
        };
        Some((verb, silent))
    }

    /// Verbs that target one existing ticket by id.
    fn takes_id(&self) -> bool {
        matches!(
            self,
            Verb::Comment
                | Verb::Close
                | Verb::Reopen
                | Verb::Assign
                | Verb::SetPriority
                | Verb::View
                | Verb::Teleport
        )
    }

    /// Only mutating single-ticket and range verbs have a silent variant.
    fn supports_silence(&self) -> bool {
        matches!(
            self,
            Verb::Create
                | Verb::Comment
                | Verb::Close
                | Verb::Reopen
                | Verb::Assign
                | Verb::SetPriority
                | Verb::MassClose
        )
    }

    /// Permission node; duality verbs split into `.all`/`.own`.
    fn permission(&self) -> &'static str {
        match self {
            Verb::Create => "ticket.command.create",
            Verb::Comment => "ticket.command.comment",
            Verb::Close => "ticket.command.close",
            Verb::Reopen => "ticket.command.reopen",
            Verb::Assign => "ticket.command.assign",
            Verb::SetPriority => "ticket.command.setpriority",
            Verb::MassClose => "ticket.command.massclose",
            Verb::View => "ticket.command.view",
            Verb::Search => "ticket.command.search",
            Verb::Teleport => "ticket.command.teleport",
            Verb::Reload => "ticket.command.reload",
            Verb::Migrate => "ticket.command.migrate",
        }
    }

    fn has_duality(&self) -> bool {
        matches!(self, Verb::Comment | Verb::Close | Verb::View | Verb::Teleport)
    }
}

pub struct CommandPipeline {
    pub(crate) store: Arc<StoreManager>,
    pub(crate) permissions: Arc<dyn PermissionProvider>,
    pub(crate) directory: Arc<dyn Directory>,
    pub(crate) sink: Arc<dyn MessageSink>,
    pub(crate) locale: Arc<dyn LocaleProvider>,
    pub(crate) notify: Arc<NotificationEngine>,
    pub(crate) relay: Arc<RelayManager>,
    pub(crate) cooldowns: Arc<CooldownTracker>,
    pub(crate) tasks: Arc<TaskSupervisor>,
    pub(crate) config: PipelineConfig,
}

impl CommandPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<StoreManager>,
        permissions: Arc<dyn PermissionProvider>,
        directory: Arc<dyn Directory>,
        sink: Arc<dyn MessageSink>,
        locale: Arc<dyn LocaleProvider>,
        notify: Arc<NotificationEngine>,
        relay: Arc<RelayManager>,
        config: PipelineConfig,
    ) -> CommandPipeline {
        CommandPipeline {
            store,
            permissions,
            directory,
            sink,
            locale,
            notify,
            relay,
            cooldowns: Arc::new(CooldownTracker::new()),
            tasks: Arc::new(TaskSupervisor::new()),
            config,
        }
    }

    pub fn cooldowns(&self) -> &Arc<CooldownTracker> {
        &self.cooldowns
    }

    pub fn tasks(&self) -> &Arc<TaskSupervisor> {
        &self.tasks
    }

    /// Run one command. Returns whether it succeeded; failure details have
    /// already been delivered to the sender as a warning.
    pub async fn execute(&self, sender: &CommandSender, raw: &[String]) -> bool {
        match self.run(sender, raw).await {
            Ok(()) => true,
            Err(err) => {
                if !err.is_user_error() {
                    log::error!("Command from {} failed: {err}", sender.name());
                }
                let (key, params) = err.warning();
                self.send_to(sender, key, &params).await;
                false
            }
        }
    }

    async fn run(&self, sender: &CommandSender, raw: &[String]) -> CommandResult<()> {
        let first = raw.first().ok_or(CommandError::InvalidSyntax)?;
        let (verb, silent) = Verb::parse(first).ok_or(CommandError::InvalidSyntax)?;
        if silent && !verb.supports_silence() {
            return Err(CommandError::InvalidSyntax);
        }

        let lifecycle = Arc::clone(self.store.lifecycle());
        let guard = lifecycle.try_enter().ok_or(CommandError::Locked)?;

        // Operational verbs manage the lifecycle themselves; their own job
        // slot is released first so a drain can reach zero.
        match verb {
            Verb::Reload => {
                self.authorize(sender, verb, silent, &Ticket::placeholder()).await?;
                drop(guard);
                return self.run_reload(sender).await;
            }
            Verb::Migrate => {
                self.authorize(sender, verb, silent, &Ticket::placeholder()).await?;
                drop(guard);
                return self.run_migrate(sender, raw).await;
            }
            _ => {}
        }

        let store = self.store.active().await;
        let ticket = if verb.takes_id() {
            let id = raw
                .get(1)
                .and_then(|t| t.parse::<i64>().ok())
                .ok_or(CommandError::InvalidSyntax)?;
            store.get(id).await?.ok_or(CommandError::InvalidId(id))?
        } else {
            Ticket::placeholder()
        };

        let (validated, authorized, cooled) = tokio::join!(
            self.validate(sender, verb, raw, &ticket),
            self.authorize(sender, verb, silent, &ticket),
            self.check_cooldown(sender, verb),
        );
        validated?;
        authorized?;
        cooled?;

        self.dispatch(sender, verb, silent, raw, ticket, &store).await
    }

    /// Structural checks: argument shape and status preconditions. Runs
    /// before any mutation, concurrently with authorization.
    async fn validate(
        &self,
        sender: &CommandSender,
        verb: Verb,
        raw: &[String],
        ticket: &Ticket,
    ) -> CommandResult<()> {
        let args = raw.len();
        let shape_ok = match verb {
            Verb::Create => args >= 2,
            Verb::Comment | Verb::Assign => args >= 3,
            Verb::Close => args >= 2,
            Verb::Reopen | Verb::View | Verb::Teleport => args == 2,
            Verb::SetPriority => args == 3,
            Verb::MassClose => {
                args == 3
                    && match (raw[1].parse::<i64>(), raw[2].parse::<i64>()) {
                        (Ok(lower), Ok(upper)) => lower <= upper,
                        _ => false,
                    }
            }
            Verb::Search => true,
            Verb::Reload | Verb::Migrate => unreachable!("handled before dispatch"),
        };
        if !shape_ok {
            return Err(CommandError::InvalidSyntax);
        }

        match verb {
            Verb::Comment | Verb::Close | Verb::Assign | Verb::SetPriority => {
                if ticket.status != TicketStatus::Open {
                    return Err(CommandError::MustBeOpen);
                }
            }
            Verb::Reopen => {
                if ticket.status != TicketStatus::Closed {
                    return Err(CommandError::MustBeClosed);
                }
            }
            Verb::Teleport => {
                if matches!(sender, CommandSender::Console) {
                    return Err(CommandError::InvalidSyntax);
                }
                let filed_in_world = ticket
                    .actions
                    .first()
                    .and_then(|a| a.location.as_ref())
                    .map(|l| l.world().is_some())
                    .unwrap_or(false);
                if !filed_in_world {
                    return Err(CommandError::InvalidSyntax);
                }
            }
            _ => {}
        }
        if verb == Verb::SetPriority && Priority::parse(&raw[2]).is_none() {
            return Err(CommandError::InvalidSyntax);
        }
        Ok(())
    }

    async fn authorize(
        &self,
        sender: &CommandSender,
        verb: Verb,
        silent: bool,
        ticket: &Ticket,
    ) -> CommandResult<()> {
        let base = verb.permission();
        let allowed = if verb.has_duality() {
            if self.permissions.has(sender, &format!("{base}.all")).await {
                true
            } else {
                self.permissions.has(sender, &format!("{base}.own")).await
                    && ticket.creator == sender.as_creator()
            }
        } else {
            self.permissions.has(sender, base).await
        };
        if !allowed {
            return Err(CommandError::MissingPermission(base.to_string()));
        }
        if silent && !self.permissions.has(sender, PERM_SILENCE).await {
            return Err(CommandError::MissingPermission(PERM_SILENCE.to_string()));
        }
        Ok(())
    }

    async fn check_cooldown(&self, sender: &CommandSender, verb: Verb) -> CommandResult<()> {
        if !self.config.cooldown_enabled {
            return Ok(());
        }
        if !matches!(verb, Verb::Create | Verb::Comment) {
            return Ok(());
        }
        let now = chrono::Utc::now().timestamp();
        if self.cooldowns.under_cooldown(&sender.as_creator(), now) {
            return Err(CommandError::UnderCooldown);
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        sender: &CommandSender,
        verb: Verb,
        silent: bool,
        raw: &[String],
        ticket: Ticket,
        store: &Arc<dyn TicketStore>,
    ) -> CommandResult<()> {
        match verb {
            Verb::Create => self.handle_create(sender, silent, raw, store).await,
            Verb::Comment => self.handle_comment(sender, silent, raw, ticket, store).await,
            Verb::Close => self.handle_close(sender, silent, raw, ticket, store).await,
            Verb::Reopen => self.handle_reopen(sender, silent, ticket, store).await,
            Verb::Assign => self.handle_assign(sender, silent, raw, ticket, store).await,
            Verb::SetPriority => {
                self.handle_set_priority(sender, silent, raw, ticket, store).await
            }
            Verb::MassClose => self.handle_mass_close(sender, silent, raw, store).await,
            Verb::View => self.handle_view(sender, ticket, store).await,
            Verb::Search => self.handle_search(sender, raw, store).await,
            Verb::Teleport => self.handle_teleport(sender, ticket).await,
            Verb::Reload | Verb::Migrate => unreachable!("handled before dispatch"),
        }
    }

    async fn handle_create(
        &self,
        sender: &CommandSender,
        silent: bool,
        raw: &[String],
        store: &Arc<dyn TicketStore>,
    ) -> CommandResult<()> {
        let message = raw[1..].join(" ");
        let now = chrono::Utc::now().timestamp();
        let creator = sender.as_creator();
        let location = self.sender_location(sender).await;
        let ticket = Ticket::new(creator.clone(), message.clone(), now, location);
        let id = store.insert(ticket).await?;

        if self.config.cooldown_enabled {
            self.cooldowns.apply(&creator, now, self.config.cooldown);
        }

        let body = NotificationBody::Create {
            ticket_id: id,
            message,
        };
        let n = self.notify.resolve(sender, &creator, silent, body).await;
        self.notify.dispatch(&n).await;
        Ok(())
    }

    async fn handle_comment(
        &self,
        sender: &CommandSender,
        silent: bool,
        raw: &[String],
        ticket: Ticket,
        store: &Arc<dyn TicketStore>,
    ) -> CommandResult<()> {
        let message = raw[2..].join(" ");
        store
            .append_action(ticket.id, self.action(sender, ActionKind::Comment, Some(message.clone())).await)
            .await?;
        self.refresh_unread(store, &ticket, &sender.as_creator()).await?;

        if self.config.cooldown_enabled {
            let now = chrono::Utc::now().timestamp();
            self.cooldowns.apply(&sender.as_creator(), now, self.config.cooldown);
        }

        let body = NotificationBody::Comment {
            ticket_id: ticket.id,
            message,
        };
        let n = self.notify.resolve(sender, &ticket.creator, silent, body).await;
        self.notify.dispatch(&n).await;
        Ok(())
    }

    async fn handle_close(
        &self,
        sender: &CommandSender,
        silent: bool,
        raw: &[String],
        ticket: Ticket,
        store: &Arc<dyn TicketStore>,
    ) -> CommandResult<()> {
        let message = if raw.len() > 2 {
            Some(raw[2..].join(" "))
        } else {
            None
        };
        let kind = match message {
            Some(_) => ActionKind::CloseWithComment,
            None => ActionKind::CloseWithoutComment,
        };
        store.set_status(ticket.id, TicketStatus::Closed).await?;
        store
            .append_action(ticket.id, self.action(sender, kind, message.clone()).await)
            .await?;
        self.refresh_unread(store, &ticket, &sender.as_creator()).await?;

        let body = match message {
            Some(message) => NotificationBody::CloseWithComment {
                ticket_id: ticket.id,
                message,
            },
            None => NotificationBody::CloseWithoutComment { ticket_id: ticket.id },
        };
        let n = self.notify.resolve(sender, &ticket.creator, silent, body).await;
        self.notify.dispatch(&n).await;
        Ok(())
    }

    async fn handle_reopen(
        &self,
        sender: &CommandSender,
        silent: bool,
        ticket: Ticket,
        store: &Arc<dyn TicketStore>,
    ) -> CommandResult<()> {
        store.set_status(ticket.id, TicketStatus::Open).await?;
        store
            .append_action(ticket.id, self.action(sender, ActionKind::Reopen, None).await)
            .await?;

        let body = NotificationBody::Reopen { ticket_id: ticket.id };
        let n = self.notify.resolve(sender, &ticket.creator, silent, body).await;
        self.notify.dispatch(&n).await;
        Ok(())
    }

    async fn handle_assign(
        &self,
        sender: &CommandSender,
        silent: bool,
        raw: &[String],
        ticket: Ticket,
        store: &Arc<dyn TicketStore>,
    ) -> CommandResult<()> {
        let assignment = parse_assignment_args(&raw[2..]);
        store.set_assignment(ticket.id, assignment.clone()).await?;
        store
            .append_action(
                ticket.id,
                self.action(sender, ActionKind::Assign, Some(assignment.encode())).await,
            )
            .await?;
        self.refresh_unread(store, &ticket, &sender.as_creator()).await?;

        let body = NotificationBody::Assign {
            ticket_id: ticket.id,
            assignment,
        };
        let n = self.notify.resolve(sender, &ticket.creator, silent, body).await;
        self.notify.dispatch(&n).await;
        Ok(())
    }

    async fn handle_set_priority(
        &self,
        sender: &CommandSender,
        silent: bool,
        raw: &[String],
        ticket: Ticket,
        store: &Arc<dyn TicketStore>,
    ) -> CommandResult<()> {
        // Validation already proved this parses.
        let priority = Priority::parse(&raw[2]).ok_or(CommandError::InvalidSyntax)?;
        store.set_priority(ticket.id, priority).await?;
        store
            .append_action(
                ticket.id,
                self.action(sender, ActionKind::SetPriority, Some(priority.to_string())).await,
            )
            .await?;
        self.refresh_unread(store, &ticket, &sender.as_creator()).await?;

        let body = NotificationBody::SetPriority {
            ticket_id: ticket.id,
            priority,
        };
        let n = self.notify.resolve(sender, &ticket.creator, silent, body).await;
        self.notify.dispatch(&n).await;
        Ok(())
    }

    async fn handle_mass_close(
        &self,
        sender: &CommandSender,
        silent: bool,
        raw: &[String],
        store: &Arc<dyn TicketStore>,
    ) -> CommandResult<()> {
        let lower: i64 = raw[1].parse().map_err(|_| CommandError::InvalidSyntax)?;
        let upper: i64 = raw[2].parse().map_err(|_| CommandError::InvalidSyntax)?;
        let action = self.action(sender, ActionKind::MassClose, None).await;
        let closed = store.mass_close(lower, upper, action).await?;

        if self.config.unread_updates_enabled {
            let actor = sender.as_creator();
            for id in &closed {
                if let Some(ticket) = store.get(*id).await? {
                    // The range close left them Closed; the marker still
                    // records the unseen status change for the creator.
                    if ticket.creator.is_user()
                        && ticket.creator != actor
                        && !ticket.creator_status_update
                    {
                        store.set_creator_status_update(*id, true).await?;
                    }
                }
            }
        }

        let body = NotificationBody::MassClose { lower, upper };
        let n = self
            .notify
            .resolve(sender, &Creator::Unresolved, silent, body)
            .await;
        self.notify.dispatch(&n).await;
        Ok(())
    }

    async fn handle_view(
        &self,
        sender: &CommandSender,
        ticket: Ticket,
        store: &Arc<dyn TicketStore>,
    ) -> CommandResult<()> {
        let header: Params = vec![
            ("id", ticket.id.to_string()),
            ("creator", self.creator_name(&ticket.creator).await),
            ("status", ticket.status.to_string()),
            ("priority", ticket.priority.to_string()),
            ("assignment", ticket.assigned_to.encode()),
        ];
        self.send_to(sender, MessageKey::ViewHeader, &header).await;

        for action in &ticket.actions {
            let line: Params = vec![
                ("kind", action.kind.to_string()),
                ("actor", self.creator_name(&action.actor).await),
                ("timestamp", action.timestamp.to_string()),
                ("message", action.message.clone().unwrap_or_default()),
            ];
            self.send_to(sender, MessageKey::ViewAction, &line).await;
        }

        // The creator has now seen the latest state.
        if self.config.unread_updates_enabled
            && ticket.creator_status_update
            && ticket.creator == sender.as_creator()
        {
            store.set_creator_status_update(ticket.id, false).await?;
        }
        Ok(())
    }

    async fn handle_search(
        &self,
        sender: &CommandSender,
        raw: &[String],
        store: &Arc<dyn TicketStore>,
    ) -> CommandResult<()> {
        let input = raw[1..].join(" ");
        let constraints = query::compile(&input, self.directory.as_ref()).await?;
        let page = store.search(&constraints, self.config.page_size).await?;

        let header: Params = vec![
            ("page", page.page.to_string()),
            ("pages", page.total_pages.to_string()),
            ("total", page.total.to_string()),
        ];
        self.send_to(sender, MessageKey::SearchHeader, &header).await;

        for ticket in &page.tickets {
            let line: Params = vec![
                ("id", ticket.id.to_string()),
                ("creator", self.creator_name(&ticket.creator).await),
                ("status", ticket.status.to_string()),
                ("priority", ticket.priority.to_string()),
                ("message", ticket.first_message().to_string()),
            ];
            self.send_to(sender, MessageKey::SearchResult, &line).await;
        }
        Ok(())
    }

    async fn handle_teleport(&self, sender: &CommandSender, ticket: Ticket) -> CommandResult<()> {
        let CommandSender::Player { uuid, .. } = sender else {
            return Err(CommandError::InvalidSyntax);
        };
        // Validation guaranteed a player-filed creation location.
        let location = ticket
            .actions
            .first()
            .and_then(|a| a.location.clone())
            .ok_or(CommandError::InvalidSyntax)?;
        let Location::FromPlayer {
            server,
            world,
            x,
            y,
            z,
        } = &location
        else {
            return Err(CommandError::InvalidSyntax);
        };

        let params: Params = vec![
            ("id", ticket.id.to_string()),
            ("server", server.clone()),
            ("world", world.clone()),
        ];
        if *server == self.config.server_name {
            self.directory.teleport(*uuid, &location).await;
            self.send_to(sender, MessageKey::TeleportLocal, &params).await;
        } else {
            let request = TeleportRequest {
                target: *uuid,
                server: server.clone(),
                world: world.clone(),
                x: *x,
                y: *y,
                z: *z,
            };
            self.relay.publish_teleport(&request).await;
            self.send_to(sender, MessageKey::TeleportCrossServer, &params).await;
        }
        Ok(())
    }

    /// Sets the creator's unseen-change marker after a mutation performed
    /// by someone else on an open ticket. Writes only on an actual change.
    async fn refresh_unread(
        &self,
        store: &Arc<dyn TicketStore>,
        ticket: &Ticket,
        actor: &Creator,
    ) -> CommandResult<()> {
        if !self.config.unread_updates_enabled {
            return Ok(());
        }
        if ticket.status != TicketStatus::Open {
            return Ok(());
        }
        if !ticket.creator.is_user() || ticket.creator == *actor {
            return Ok(());
        }
        if !ticket.creator_status_update {
            store.set_creator_status_update(ticket.id, true).await?;
        }
        Ok(())
    }

    async fn action(
        &self,
        sender: &CommandSender,
        kind: ActionKind,
        message: Option<String>,
    ) -> Action {
        Action {
            kind,
            message,
            actor: sender.as_creator(),
            timestamp: chrono::Utc::now().timestamp(),
            location: self.sender_location(sender).await,
        }
    }

    async fn sender_location(&self, sender: &CommandSender) -> Option<Location> {
        match sender {
            CommandSender::Console => Some(Location::FromConsole {
                server: self.config.server_name.clone(),
            }),
            CommandSender::Player { uuid, .. } => self.directory.location_of(*uuid).await,
        }
    }

    async fn creator_name(&self, creator: &Creator) -> String {
        match creator {
            Creator::Console => "Console".to_string(),
            Creator::Unresolved => "Unknown".to_string(),
            Creator::User(uuid) => match self.directory.session_of(*uuid).await {
                Some(session) => session.name().to_string(),
                None => uuid.to_string(),
            },
        }
    }

    pub(crate) async fn send_to(&self, sender: &CommandSender, key: MessageKey, params: &Params) {
        let text = self.locale.render(key, params);
        self.sink.send(MessageTarget::of(sender), text).await;
    }
}

/// Assignment argument: `nobody`, `console`, `group.<name>`, a single
/// player name, or a free phrase when several words are given.
fn parse_assignment_args(args: &[String]) -> Assignment {
    if args.len() == 1 {
        let arg = &args[0];
        if arg.eq_ignore_ascii_case("nobody") {
            return Assignment::Nobody;
        }
        if arg.eq_ignore_ascii_case("console") {
            return Assignment::Console;
        }
        if let Some(group) = arg.strip_prefix("group.") {
            return Assignment::Group(group.to_string());
        }
        return Assignment::Player(arg.clone());
    }
    Assignment::Phrase(args.join(" "))
}
