//! Topic-style broadcast relay between cluster nodes.
//!
//! Channels are lazily-created tokio broadcast senders keyed by name, one
//! per wire channel. Delivery is fire-and-forget, at-most-once per node:
//! a dropped frame only affects remote notification display, never ticket
//! state.

use crate::codec::{DecodeError, Notification, TeleportRequest};
use crate::NodeId;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

pub const NOTIFICATION_CHANNEL: &str = "tickets:notifications";
pub const TELEPORT_CHANNEL: &str = "tickets:teleport";

type Channel = String;
type Sender = broadcast::Sender<Bytes>;
type Receiver = broadcast::Receiver<Bytes>;

#[derive(Clone)]
pub struct RelayManager {
    node: NodeId,
    channels: Arc<RwLock<HashMap<Channel, Sender>>>,
}

impl RelayManager {
    pub fn new(node: NodeId) -> RelayManager {
        RelayManager {
            node,
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Subscribes to `channel`, creating it if necessary.
    pub async fn subscribe(&self, channel: &str) -> Receiver {
        let mut map = self.channels.write().await;
        map.entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(100).0)
            .subscribe()
    }

    /// Publishes a raw frame. No-op without subscribers; no ack, no retry.
    pub async fn publish(&self, channel: &str, frame: Bytes) {
        let map = self.channels.read().await;
        if let Some(sender) = map.get(channel) {
            let _ = sender.send(frame);
        }
    }

    /// Encodes a notification intent with this node's identity and fires it.
    /// An unencodable intent is dropped with a warning; delivery is
    /// fire-and-forget either way.
    pub async fn publish_notification(&self, notification: &Notification) {
        match notification.encode(self.node) {
            Ok(frame) => self.publish(NOTIFICATION_CHANNEL, frame).await,
            Err(err) => log::warn!("Dropping unencodable notification: {err}"),
        }
    }

    pub async fn publish_teleport(&self, request: &TeleportRequest) {
        match request.encode() {
            Ok(frame) => self.publish(TELEPORT_CHANNEL, frame).await,
            Err(err) => log::warn!("Dropping unencodable teleport request: {err}"),
        }
    }

    /// Decodes an incoming notification frame.
    ///
    /// Self-originated echoes are discarded first (the node that performed
    /// the action already rendered locally); malformed frames are dropped
    /// and logged. Neither case can crash the listener.
    pub fn handle_notification_frame(&self, frame: &[u8]) -> Option<Notification> {
        match Notification::decode(frame) {
            Ok((origin, _)) if origin == self.node => None,
            Ok((_, notification)) => Some(notification),
            Err(err) => {
                log_drop("notification", err);
                None
            }
        }
    }

    pub fn handle_teleport_frame(&self, frame: &[u8]) -> Option<TeleportRequest> {
        match TeleportRequest::decode(frame) {
            Ok(request) => Some(request),
            Err(err) => {
                log_drop("teleport", err);
                None
            }
        }
    }
}

fn log_drop(channel: &str, err: DecodeError) {
    log::warn!("Dropping malformed {channel} frame: {err}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::domain::{Creator, InfoSender};
    use crate::codec::NotificationBody;
    use tokio::time::{timeout, Duration};

    fn notification(ticket_id: i64) -> Notification {
        Notification {
            sender: InfoSender::Console,
            creator: Creator::Console,
            send_creator: false,
            send_sender: true,
            send_mass: true,
            body: NotificationBody::Reopen { ticket_id },
        }
    }

    #[tokio::test]
    async fn frames_reach_all_subscribers() {
        let relay = RelayManager::new(NodeId::random());
        let mut r1 = relay.subscribe(NOTIFICATION_CHANNEL).await;
        let mut r2 = relay.subscribe(NOTIFICATION_CHANNEL).await;

        relay.publish_notification(&notification(9)).await;

        for receiver in [&mut r1, &mut r2] {
            let frame = timeout(Duration::from_millis(50), receiver.recv())
                .await
                .unwrap()
                .unwrap();
            let (origin, decoded) = Notification::decode(&frame).unwrap();
            assert_eq!(origin, relay.node());
            assert_eq!(decoded, notification(9));
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let relay = RelayManager::new(NodeId::random());
        relay.publish_notification(&notification(1)).await;
    }

    #[test]
    fn self_echo_is_filtered() {
        let node = NodeId::random();
        let relay = RelayManager::new(node);

        let own = notification(5).encode(node).unwrap();
        assert!(relay.handle_notification_frame(&own).is_none());

        let remote = notification(5).encode(NodeId::random()).unwrap();
        assert_eq!(
            relay.handle_notification_frame(&remote),
            Some(notification(5))
        );
    }

    #[test]
    fn malformed_frames_are_dropped_not_panicked() {
        let relay = RelayManager::new(NodeId::random());
        assert!(relay.handle_notification_frame(&[1, 2, 3]).is_none());
        assert!(relay.handle_teleport_frame(&[0xff; 4]).is_none());

        let mut bad_tag = notification(1).encode(NodeId::random()).unwrap().to_vec();
        bad_tag[16] = 99;
        assert!(relay.handle_notification_frame(&bad_tag).is_none());
    }
}
