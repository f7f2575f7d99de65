//! Locale message keys.
//!
//! The core never renders display text itself; it hands a key plus named
//! parameters to the Locale/Template provider. Key strings are the
//! contract with the string tables.

use relay::MessageTag;

/// Who a verb notification is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Sender,
    Creator,
    Broadcast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    // Warnings sent back to the command issuer.
    WarnInvalidCommand,
    WarnLocked,
    WarnInvalidId,
    WarnMissingPermission,
    WarnUnderCooldown,
    WarnTicketMustBeOpen,
    WarnTicketMustBeClosed,
    WarnUnexpectedError,
    WarnBadSearchQuery,

    /// Per-verb notification, one template per audience.
    Verb(MessageTag, Audience),

    // Read-only output.
    ViewHeader,
    ViewAction,
    SearchHeader,
    SearchResult,
    TeleportLocal,
    TeleportCrossServer,

    // Operational surface.
    ReloadStarted,
    ReloadLongTask,
    ReloadCompleted,
    MigrateStarted,
    MigrateCompleted,
    MigrateSameBackend,
}

impl MessageKey {
    /// Dotted key used to look the template up in the string tables.
    pub fn key(&self) -> String {
        match self {
            MessageKey::WarnInvalidCommand => "ticket.warn.invalid-command".into(),
            MessageKey::WarnLocked => "ticket.warn.locked".into(),
            MessageKey::WarnInvalidId => "ticket.warn.invalid-id".into(),
            MessageKey::WarnMissingPermission => "ticket.warn.no-permission".into(),
            MessageKey::WarnUnderCooldown => "ticket.warn.under-cooldown".into(),
            MessageKey::WarnTicketMustBeOpen => "ticket.warn.must-be-open".into(),
            MessageKey::WarnTicketMustBeClosed => "ticket.warn.must-be-closed".into(),
            MessageKey::WarnUnexpectedError => "ticket.warn.unexpected-error".into(),
            MessageKey::WarnBadSearchQuery => "ticket.warn.bad-search-query".into(),
            MessageKey::Verb(tag, audience) => {
                let verb = match tag {
                    MessageTag::Assign => "assign",
                    MessageTag::CloseWithComment => "close-comment",
                    MessageTag::CloseWithoutComment => "close",
                    MessageTag::MassClose => "mass-close",
                    MessageTag::Comment => "comment",
                    MessageTag::Create => "create",
                    MessageTag::Reopen => "reopen",
                    MessageTag::SetPriority => "set-priority",
                };
                let audience = match audience {
                    Audience::Sender => "sender",
                    Audience::Creator => "creator",
                    Audience::Broadcast => "broadcast",
                };
                format!("ticket.verb.{verb}.{audience}")
            }
            MessageKey::ViewHeader => "ticket.view.header".into(),
            MessageKey::ViewAction => "ticket.view.action".into(),
            MessageKey::SearchHeader => "ticket.search.header".into(),
            MessageKey::SearchResult => "ticket.search.result".into(),
            MessageKey::TeleportLocal => "ticket.teleport.local".into(),
            MessageKey::TeleportCrossServer => "ticket.teleport.cross-server".into(),
            MessageKey::ReloadStarted => "ticket.reload.started".into(),
            MessageKey::ReloadLongTask => "ticket.reload.long-task".into(),
            MessageKey::ReloadCompleted => "ticket.reload.completed".into(),
            MessageKey::MigrateStarted => "ticket.migrate.started".into(),
            MessageKey::MigrateCompleted => "ticket.migrate.completed".into(),
            MessageKey::MigrateSameBackend => "ticket.migrate.same-backend".into(),
        }
    }
}

/// Named template parameters.
pub type Params = Vec<(&'static str, String)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_keys_cover_every_tag_and_audience() {
        let tags = [
            MessageTag::Assign,
            MessageTag::CloseWithComment,
            MessageTag::CloseWithoutComment,
            MessageTag::MassClose,
            MessageTag::Comment,
            MessageTag::Create,
            MessageTag::Reopen,
            MessageTag::SetPriority,
        ];
        let mut keys = std::collections::HashSet::new();
        for tag in tags {
            for audience in [Audience::Sender, Audience::Creator, Audience::Broadcast] {
                assert!(keys.insert(MessageKey::Verb(tag, audience).key()));
            }
        }
        assert_eq!(keys.len(), 24);
    }
}
