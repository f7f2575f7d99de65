//! Host-facing seams.
//!
//! The pipeline never talks to a player roster, permission table, or chat
//! channel directly. The embedding node supplies implementations of these
//! traits; tests supply the fakes in [`crate::testing`].

use crate::messages::{MessageKey, Params};
use crate::sender::CommandSender;
use async_trait::async_trait;
use db::domain::{Creator, Location};
use uuid::Uuid;

/// Recipient of a rendered message on this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    Console,
    Player(Uuid),
}

impl MessageTarget {
    pub fn of(sender: &CommandSender) -> MessageTarget {
        match sender {
            CommandSender::Console => MessageTarget::Console,
            CommandSender::Player { uuid, .. } => MessageTarget::Player(*uuid),
        }
    }
}

/// Permission lookups. The console implicitly holds every permission; the
/// provider only needs to answer for players.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn player_has(&self, uuid: Uuid, permission: &str) -> bool;

    async fn has(&self, sender: &CommandSender, permission: &str) -> bool {
        match sender {
            CommandSender::Console => true,
            CommandSender::Player { uuid, .. } => self.player_has(*uuid, permission).await,
        }
    }

    /// Permission check against a stored creator reference. The creator
    /// may be offline, so implementations should consult persistent
    /// permission data rather than a live session.
    async fn creator_has(&self, creator: &Creator, permission: &str) -> bool {
        match creator {
            Creator::Console => true,
            Creator::User(uuid) => self.player_has(*uuid, permission).await,
            Creator::Unresolved => false,
        }
    }
}

/// Player roster and positioning on this node.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Live session for a user, if they are connected to this node.
    async fn session_of(&self, uuid: Uuid) -> Option<CommandSender>;

    /// Everyone connected to this node.
    async fn online(&self) -> Vec<CommandSender>;

    /// Resolve a player name to an identity, online or not.
    async fn resolve_name(&self, name: &str) -> Option<Uuid>;

    /// Current position of a connected player.
    async fn location_of(&self, uuid: Uuid) -> Option<Location>;

    /// Move a connected player. Cross-server moves are handed to the
    /// proxy by the host, not performed here.
    async fn teleport(&self, uuid: Uuid, location: &Location);
}

/// Rendered-message delivery.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, target: MessageTarget, text: String);
}

/// Turns message keys and parameters into display text. Implementations
/// own locale files and formatting; the pipeline never formats prose.
pub trait LocaleProvider: Send + Sync {
    fn render(&self, key: MessageKey, params: &Params) -> String;
}
