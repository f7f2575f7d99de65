//! In-memory fakes for the host seams, shared by unit and integration
//! tests.

use crate::capabilities::{Directory, LocaleProvider, MessageSink, MessageTarget, PermissionProvider};
use crate::messages::{MessageKey, Params};
use crate::sender::CommandSender;
use async_trait::async_trait;
use db::domain::Location;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

/// Explicit per-player grants; everything else is denied.
#[derive(Debug, Default)]
pub struct FakePermissions {
    grants: Mutex<HashMap<Uuid, HashSet<String>>>,
}

impl FakePermissions {
    pub fn new() -> FakePermissions {
        FakePermissions::default()
    }

    pub fn grant_player(&self, uuid: Uuid, permission: &str) {
        self.grants
            .lock()
            .unwrap()
            .entry(uuid)
            .or_default()
            .insert(permission.to_string());
    }

    pub fn revoke_player(&self, uuid: Uuid, permission: &str) {
        if let Some(set) = self.grants.lock().unwrap().get_mut(&uuid) {
            set.remove(permission);
        }
    }
}

#[async_trait]
impl PermissionProvider for FakePermissions {
    async fn player_has(&self, uuid: Uuid, permission: &str) -> bool {
        self.grants
            .lock()
            .unwrap()
            .get(&uuid)
            .is_some_and(|set| set.contains(permission))
    }
}

/// Roster fake with explicit name registrations and recorded teleports.
#[derive(Debug, Default)]
pub struct FakeDirectory {
    names: Mutex<HashMap<String, Uuid>>,
    online: Mutex<Vec<CommandSender>>,
    locations: Mutex<HashMap<Uuid, Location>>,
    teleports: Mutex<Vec<(Uuid, Location)>>,
}

impl FakeDirectory {
    pub fn new() -> FakeDirectory {
        FakeDirectory::default()
    }

    /// Register a name for offline resolution.
    pub fn add_known_name(&self, name: &str, uuid: Uuid) {
        self.names
            .lock()
            .unwrap()
            .insert(name.to_ascii_lowercase(), uuid);
    }

    /// Mark a player as connected to this node. Also registers the name.
    pub fn connect(&self, sender: CommandSender) {
        if let CommandSender::Player { uuid, name } = &sender {
            self.add_known_name(name, *uuid);
        }
        self.online.lock().unwrap().push(sender);
    }

    pub fn set_location(&self, uuid: Uuid, location: Location) {
        self.locations.lock().unwrap().insert(uuid, location);
    }

    /// Teleports performed on this node, in order.
    pub fn teleports(&self) -> Vec<(Uuid, Location)> {
        self.teleports.lock().unwrap().clone()
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn session_of(&self, uuid: Uuid) -> Option<CommandSender> {
        self.online
            .lock()
            .unwrap()
            .iter()
            .find(|s| matches!(s, CommandSender::Player { uuid: u, .. } if *u == uuid))
            .cloned()
    }

    async fn online(&self) -> Vec<CommandSender> {
        self.online.lock().unwrap().clone()
    }

    async fn resolve_name(&self, name: &str) -> Option<Uuid> {
        self.names
            .lock()
            .unwrap()
            .get(&name.to_ascii_lowercase())
            .copied()
    }

    async fn location_of(&self, uuid: Uuid) -> Option<Location> {
        self.locations.lock().unwrap().get(&uuid).cloned()
    }

    async fn teleport(&self, uuid: Uuid, location: &Location) {
        self.teleports.lock().unwrap().push((uuid, location.clone()));
    }
}

/// Records every rendered line instead of displaying it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<(MessageTarget, String)>>,
}

impl RecordingSink {
    pub fn new() -> RecordingSink {
        RecordingSink::default()
    }

    pub fn sent(&self) -> Vec<(MessageTarget, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn sent_to(&self, target: &MessageTarget) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, target: MessageTarget, text: String) {
        self.messages.lock().unwrap().push((target, text));
    }
}

/// Renders `key k=v k2=v2` so assertions can match on keys and params
/// without locale files.
#[derive(Debug, Default)]
pub struct PlainLocale;

impl LocaleProvider for PlainLocale {
    fn render(&self, key: MessageKey, params: &Params) -> String {
        let mut text = key.key();
        for (name, value) in params {
            text.push(' ');
            text.push_str(name);
            text.push('=');
            text.push_str(value);
        }
        text
    }
}
