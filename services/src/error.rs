//! Command failure taxonomy.
//!
//! User errors are recovered locally and rendered as localized warnings,
//! never logged as server faults. Infra errors are logged and reported to
//! the sender as a generic unexpected error without exposing internals.

use crate::messages::{MessageKey, Params};
use db::store::manager::MigrateError;
use db::store::StoreError;

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Empty or unknown command")]
    InvalidSyntax,

    #[error("A reload or migration is in progress")]
    Locked,

    #[error("No ticket with id {0}")]
    InvalidId(i64),

    #[error("Missing permission {0}")]
    MissingPermission(String),

    #[error("Actor is under cooldown")]
    UnderCooldown,

    #[error("Ticket must be open")]
    MustBeOpen,

    #[error("Ticket must be closed")]
    MustBeClosed,

    #[error("Bad search query: {0}")]
    BadQuery(#[from] crate::query::QueryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Migrate(#[from] MigrateError),
}

impl CommandError {
    /// User errors are the sender's problem; everything else is ours.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            CommandError::Store(_) | CommandError::Migrate(MigrateError::Store(_))
        )
    }

    /// Warning rendered back to the sender.
    pub fn warning(&self) -> (MessageKey, Params) {
        match self {
            CommandError::InvalidSyntax => (MessageKey::WarnInvalidCommand, vec![]),
            CommandError::Locked => (MessageKey::WarnLocked, vec![]),
            CommandError::InvalidId(id) => {
                (MessageKey::WarnInvalidId, vec![("id", id.to_string())])
            }
            CommandError::MissingPermission(perm) => (
                MessageKey::WarnMissingPermission,
                vec![("permission", perm.clone())],
            ),
            CommandError::UnderCooldown => (MessageKey::WarnUnderCooldown, vec![]),
            CommandError::MustBeOpen => (MessageKey::WarnTicketMustBeOpen, vec![]),
            CommandError::MustBeClosed => (MessageKey::WarnTicketMustBeClosed, vec![]),
            CommandError::BadQuery(err) => (
                MessageKey::WarnBadSearchQuery,
                vec![("reason", err.to_string())],
            ),
            CommandError::Migrate(MigrateError::AlreadyLocked) => (MessageKey::WarnLocked, vec![]),
            CommandError::Migrate(MigrateError::SameBackend(kind)) => (
                MessageKey::MigrateSameBackend,
                vec![("backend", kind.to_string())],
            ),
            CommandError::Store(_) | CommandError::Migrate(MigrateError::Store(_)) => {
                (MessageKey::WarnUnexpectedError, vec![])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infra_errors_are_not_user_errors() {
        assert!(CommandError::InvalidId(3).is_user_error());
        assert!(CommandError::UnderCooldown.is_user_error());
        assert!(!CommandError::Store(StoreError::NotFound(1)).is_user_error());
    }

    #[test]
    fn infra_warning_never_exposes_internals() {
        let err = CommandError::Store(StoreError::Corrupt("sql details".into()));
        let (key, params) = err.warning();
        assert_eq!(key, MessageKey::WarnUnexpectedError);
        assert!(params.is_empty());
    }
}
