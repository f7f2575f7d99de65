//! Notification resolution and delivery.
//!
//! A completed mutation yields a notification intent. The audience flags
//! are resolved once, on the node that performed the action, while both
//! actors are still resolvable; every node then renders its local share of
//! an intent without further permission lookups.

use crate::capabilities::{Directory, LocaleProvider, MessageSink, MessageTarget, PermissionProvider};
use crate::messages::{Audience, MessageKey, Params};
use crate::sender::CommandSender;
use db::domain::{Assignment, Creator, InfoSender};
use relay::codec::{MessageTag, Notification, NotificationBody};
use relay::manager::RelayManager;
use std::sync::Arc;

/// Holders see every broadcast line and opt out of their own confirmations.
pub const PERM_MASS_NOTIFY: &str = "ticket.notify.mass";
/// Creators need this to receive alerts about their own tickets.
pub const PERM_CREATOR_ALERT: &str = "ticket.notify.update";

pub struct NotificationEngine {
    permissions: Arc<dyn PermissionProvider>,
    directory: Arc<dyn Directory>,
    sink: Arc<dyn MessageSink>,
    locale: Arc<dyn LocaleProvider>,
    relay: Arc<RelayManager>,
    proxy_enabled: bool,
}

impl NotificationEngine {
    pub fn new(
        permissions: Arc<dyn PermissionProvider>,
        directory: Arc<dyn Directory>,
        sink: Arc<dyn MessageSink>,
        locale: Arc<dyn LocaleProvider>,
        relay: Arc<RelayManager>,
        proxy_enabled: bool,
    ) -> NotificationEngine {
        NotificationEngine {
            permissions,
            directory,
            sink,
            locale,
            relay,
            proxy_enabled,
        }
    }

    /// Resolve the audience flags for a completed mutation.
    ///
    /// Create and mass-close carry no creator audience: a creator does not
    /// get alerted about filing their own ticket, and range closes alert
    /// nobody individually.
    pub async fn resolve(
        &self,
        sender: &CommandSender,
        creator: &Creator,
        silent: bool,
        body: NotificationBody,
    ) -> Notification {
        let sender_has_mass = self.permissions.has(sender, PERM_MASS_NOTIFY).await;
        let send_sender = !silent || !sender_has_mass;
        let send_mass = !silent;

        let has_creator_audience = !matches!(
            body.tag(),
            MessageTag::Create | MessageTag::MassClose
        );
        let send_creator = has_creator_audience
            && !silent
            && *creator != sender.as_creator()
            && creator.is_user()
            && self.permissions.creator_has(creator, PERM_CREATOR_ALERT).await
            && !self.permissions.creator_has(creator, PERM_MASS_NOTIFY).await;

        Notification {
            sender: sender.to_info(),
            creator: creator.clone(),
            send_creator,
            send_sender,
            send_mass,
            body,
        }
    }

    /// Deliver locally, then publish for other nodes when running behind a
    /// proxy.
    pub async fn dispatch(&self, notification: &Notification) {
        self.deliver(notification, true).await;
        if self.proxy_enabled {
            self.relay.publish_notification(notification).await;
        }
    }

    /// Deliver a relayed intent from another node. The sender confirmation
    /// was already rendered at the origin.
    pub async fn dispatch_remote(&self, notification: &Notification) {
        self.deliver(notification, false).await;
    }

    async fn deliver(&self, notification: &Notification, origin_node: bool) {
        let params = body_params(notification);
        let tag = notification.body.tag();
        let sender_target = info_target(&notification.sender);
        let mut notified: Vec<MessageTarget> = Vec::new();

        if origin_node && notification.send_sender {
            self.render_to(
                sender_target.clone(),
                MessageKey::Verb(tag, Audience::Sender),
                &params,
            )
            .await;
            notified.push(sender_target.clone());
        }

        if notification.send_creator {
            if let Creator::User(uuid) = notification.creator {
                if self.directory.session_of(uuid).await.is_some() {
                    let target = MessageTarget::Player(uuid);
                    if !notified.contains(&target) {
                        self.render_to(
                            target.clone(),
                            MessageKey::Verb(tag, Audience::Creator),
                            &params,
                        )
                        .await;
                        notified.push(target);
                    }
                }
            }
        }

        if notification.send_mass {
            for online in self.directory.online().await {
                if !self.permissions.has(&online, PERM_MASS_NOTIFY).await {
                    continue;
                }
                let target = MessageTarget::of(&online);
                if notified.contains(&target) {
                    continue;
                }
                // The actor's own line comes from the sender audience, even
                // when suppressed by the mass-notify opt-out.
                if origin_node && target == sender_target {
                    continue;
                }
                self.render_to(target.clone(), MessageKey::Verb(tag, Audience::Broadcast), &params)
                    .await;
                notified.push(target);
            }
        }
    }

    async fn render_to(&self, target: MessageTarget, key: MessageKey, params: &Params) {
        let text = self.locale.render(key, params);
        self.sink.send(target, text).await;
    }
}

fn info_target(sender: &InfoSender) -> MessageTarget {
    match sender {
        InfoSender::Console => MessageTarget::Console,
        InfoSender::Player { uuid, .. } => MessageTarget::Player(*uuid),
    }
}

fn info_name(sender: &InfoSender) -> String {
    match sender {
        InfoSender::Console => "Console".to_string(),
        InfoSender::Player { name, .. } => name.clone(),
    }
}

fn assignment_text(assignment: &Assignment) -> String {
    match assignment {
        Assignment::Nobody => "nobody".to_string(),
        Assignment::Console => "console".to_string(),
        Assignment::Player(name) => name.clone(),
        Assignment::Group(name) => format!("group {name}"),
        Assignment::Phrase(text) => text.clone(),
    }
}

/// Named parameters handed to the locale renderer for a given intent.
pub fn body_params(notification: &Notification) -> Params {
    let mut params: Params = vec![("sender", info_name(&notification.sender))];
    if let Some(id) = notification.body.ticket_id() {
        params.push(("id", id.to_string()));
    }
    match &notification.body {
        NotificationBody::Assign { assignment, .. } => {
            params.push(("assignment", assignment_text(assignment)));
        }
        NotificationBody::CloseWithComment { message, .. }
        | NotificationBody::Comment { message, .. }
        | NotificationBody::Create { message, .. } => {
            params.push(("message", message.clone()));
        }
        NotificationBody::SetPriority { priority, .. } => {
            params.push(("priority", priority.to_string()));
        }
        NotificationBody::MassClose { lower, upper } => {
            params.push(("lower", lower.to_string()));
            params.push(("upper", upper.to_string()));
        }
        NotificationBody::CloseWithoutComment { .. } | NotificationBody::Reopen { .. } => {}
    }
    params
}
