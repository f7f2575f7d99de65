//! Cross-node relay: binary notification/teleport codecs and a
//! fire-and-forget broadcast manager with self-echo filtering.

pub mod codec;
pub mod manager;

pub use codec::{
    DecodeError, EncodeError, MessageTag, Notification, NotificationBody, TeleportRequest,
};
pub use manager::{NOTIFICATION_CHANNEL, RelayManager, TELEPORT_CHANNEL};

use uuid::Uuid;

/// Stable random identity for one cluster node, generated at startup and
/// injected into the relay so self-originated echoes can be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn random() -> NodeId {
        NodeId(Uuid::new_v4())
    }
}
