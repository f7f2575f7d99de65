//! Domain types for tickets and the actors that touch them.
//!
//! Every variant set here is a closed enum with a stable string encoding.
//! The encodings are used both for database columns and for the cross-node
//! wire, so they must never change shape for an existing variant. Decoding
//! is total: an unknown creator string degrades to `Creator::Unresolved`
//! rather than failing, since stored references can outlive the accounts
//! they point at.

use crate::models::ticket_actions::ActionKind;
use crate::models::tickets::TicketStatus;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

/// Owner reference for a ticket. Not a live session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Creator {
    Console,
    User(Uuid),
    /// A reference that could not be resolved to a known identity.
    Unresolved,
}

impl Creator {
    pub fn encode(&self) -> String {
        match self {
            Creator::Console => "CONSOLE".to_string(),
            Creator::User(uuid) => format!("USER.{uuid}"),
            Creator::Unresolved => "UNRESOLVED".to_string(),
        }
    }

    pub fn decode(s: &str) -> Creator {
        match s {
            "CONSOLE" => Creator::Console,
            other => match other.strip_prefix("USER.") {
                Some(raw) => Uuid::parse_str(raw)
                    .map(Creator::User)
                    .unwrap_or(Creator::Unresolved),
                None => Creator::Unresolved,
            },
        }
    }

    /// True only for references that can be resolved to a user, i.e. that
    /// may receive a creator alert.
    pub fn is_user(&self) -> bool {
        matches!(self, Creator::User(_))
    }
}

/// Who (or what) a ticket is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assignment {
    Nobody,
    Console,
    Player(String),
    Group(String),
    Phrase(String),
}

impl Assignment {
    pub fn encode(&self) -> String {
        match self {
            Assignment::Nobody => "NOBODY".to_string(),
            Assignment::Console => "CONSOLE".to_string(),
            Assignment::Player(name) => format!("PLAYER.{name}"),
            Assignment::Group(name) => format!("GROUP.{name}"),
            Assignment::Phrase(text) => format!("PHRASE.{text}"),
        }
    }

    pub fn decode(s: &str) -> Assignment {
        if let Some(name) = s.strip_prefix("PLAYER.") {
            Assignment::Player(name.to_string())
        } else if let Some(name) = s.strip_prefix("GROUP.") {
            Assignment::Group(name.to_string())
        } else if let Some(text) = s.strip_prefix("PHRASE.") {
            Assignment::Phrase(text.to_string())
        } else if s == "CONSOLE" {
            Assignment::Console
        } else {
            Assignment::Nobody
        }
    }
}

/// Ticket priority, totally ordered for sort and comparison filters.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Priority {
    Lowest,
    Low,
    Normal,
    High,
    Highest,
}

impl Priority {
    /// Numeric level stored in the database and sent on the wire.
    pub fn level(&self) -> u8 {
        match self {
            Priority::Lowest => 1,
            Priority::Low => 2,
            Priority::Normal => 3,
            Priority::High => 4,
            Priority::Highest => 5,
        }
    }

    pub fn from_level(level: u8) -> Option<Priority> {
        match level {
            1 => Some(Priority::Lowest),
            2 => Some(Priority::Low),
            3 => Some(Priority::Normal),
            4 => Some(Priority::High),
            5 => Some(Priority::Highest),
            _ => None,
        }
    }

    /// Parses either a case-insensitive name or a numeric level.
    pub fn parse(token: &str) -> Option<Priority> {
        if let Ok(level) = token.parse::<u8>() {
            return Priority::from_level(level);
        }
        Priority::from_str(token).ok()
    }
}

/// Where an action was performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    FromPlayer {
        server: String,
        world: String,
        x: i32,
        y: i32,
        z: i32,
    },
    FromConsole {
        server: String,
    },
}

impl Location {
    pub fn server(&self) -> &str {
        match self {
            Location::FromPlayer { server, .. } => server,
            Location::FromConsole { server } => server,
        }
    }

    pub fn world(&self) -> Option<&str> {
        match self {
            Location::FromPlayer { world, .. } => Some(world),
            Location::FromConsole { .. } => None,
        }
    }
}

/// One entry in a ticket's append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub message: Option<String>,
    pub actor: Creator,
    /// Epoch seconds.
    pub timestamp: i64,
    pub location: Option<Location>,
}

impl Action {
    pub fn is_closing(&self) -> bool {
        matches!(
            self.kind,
            ActionKind::CloseWithComment | ActionKind::CloseWithoutComment | ActionKind::MassClose
        )
    }
}

/// A support ticket. `actions[0]` is always the creation action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Assigned by the storage engine at insert; -1 before persistence.
    pub id: i64,
    pub creator: Creator,
    pub assigned_to: Assignment,
    pub priority: Priority,
    pub status: TicketStatus,
    /// Creator has an unseen change.
    pub creator_status_update: bool,
    pub actions: Vec<Action>,
}

impl Ticket {
    /// A not-yet-persisted ticket whose only action is its Open entry.
    pub fn new(creator: Creator, message: String, timestamp: i64, location: Option<Location>) -> Ticket {
        Ticket {
            id: -1,
            creator: creator.clone(),
            assigned_to: Assignment::Nobody,
            priority: Priority::Normal,
            status: TicketStatus::Open,
            creator_status_update: false,
            actions: vec![Action {
                kind: ActionKind::Open,
                message: Some(message),
                actor: creator,
                timestamp,
                location,
            }],
        }
    }

    /// A throwaway empty ticket handed to verbs that do not target one,
    /// so validation and permission code share a uniform shape.
    pub fn placeholder() -> Ticket {
        Ticket {
            id: -1,
            creator: Creator::Unresolved,
            assigned_to: Assignment::Nobody,
            priority: Priority::Normal,
            status: TicketStatus::Open,
            creator_status_update: false,
            actions: Vec::new(),
        }
    }

    /// First-line preview text used in list views.
    pub fn first_message(&self) -> &str {
        self.actions
            .first()
            .and_then(|a| a.message.as_deref())
            .unwrap_or("")
    }

    pub fn created_at(&self) -> i64 {
        self.actions.first().map(|a| a.timestamp).unwrap_or(0)
    }

    /// World of the creation location, if the ticket was filed in one.
    pub fn world(&self) -> Option<&str> {
        self.actions
            .first()
            .and_then(|a| a.location.as_ref())
            .and_then(|l| l.world())
    }

    /// Actors of every closing action, in history order.
    pub fn closers(&self) -> impl Iterator<Item = &Creator> {
        self.actions
            .iter()
            .filter(|a| a.is_closing())
            .map(|a| &a.actor)
    }

    /// Actor of the most recent closing action.
    pub fn last_closer(&self) -> Option<&Creator> {
        self.actions
            .iter()
            .rev()
            .find(|a| a.is_closing())
            .map(|a| &a.actor)
    }
}

/// Lightweight actor projection used when a sender reference crosses node
/// boundaries. May describe an actor who is offline or on another node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoSender {
    Console,
    Player { uuid: Uuid, name: String },
}

impl InfoSender {
    pub fn encode(&self) -> String {
        match self {
            InfoSender::Console => "CONSOLE".to_string(),
            InfoSender::Player { uuid, name } => format!("PLAYER.{name}.{uuid}"),
        }
    }

    pub fn decode(s: &str) -> Option<InfoSender> {
        if s == "CONSOLE" {
            return Some(InfoSender::Console);
        }
        let rest = s.strip_prefix("PLAYER.")?;
        let (name, raw_uuid) = rest.rsplit_once('.')?;
        let uuid = Uuid::parse_str(raw_uuid).ok()?;
        Some(InfoSender::Player {
            uuid,
            name: name.to_string(),
        })
    }

    /// Creator-shaped reference for this actor.
    pub fn as_creator(&self) -> Creator {
        match self {
            InfoSender::Console => Creator::Console,
            InfoSender::Player { uuid, .. } => Creator::User(*uuid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creator_encoding_round_trips() {
        let uuid = Uuid::new_v4();
        for creator in [Creator::Console, Creator::User(uuid), Creator::Unresolved] {
            assert_eq!(Creator::decode(&creator.encode()), creator);
        }
    }

    #[test]
    fn unknown_creator_degrades_to_unresolved() {
        assert_eq!(Creator::decode("USER.not-a-uuid"), Creator::Unresolved);
        assert_eq!(Creator::decode("garbage"), Creator::Unresolved);
    }

    #[test]
    fn assignment_encoding_round_trips() {
        for assignment in [
            Assignment::Nobody,
            Assignment::Console,
            Assignment::Player("steve".into()),
            Assignment::Group("moderators".into()),
            Assignment::Phrase("anyone on call".into()),
        ] {
            assert_eq!(Assignment::decode(&assignment.encode()), assignment);
        }
    }

    #[test]
    fn priority_order_and_levels() {
        assert!(Priority::Highest > Priority::Normal);
        assert!(Priority::Lowest < Priority::Low);
        for level in 1..=5 {
            assert_eq!(Priority::from_level(level).unwrap().level(), level);
        }
        assert!(Priority::from_level(0).is_none());
        assert!(Priority::from_level(6).is_none());
    }

    #[test]
    fn priority_parses_from_name() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("lowest".parse::<Priority>().unwrap(), Priority::Lowest);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn new_ticket_opens_with_creation_action() {
        let ticket = Ticket::new(Creator::Console, "leak in base".into(), 100, None);
        assert_eq!(ticket.id, -1);
        assert_eq!(ticket.actions.len(), 1);
        assert_eq!(ticket.actions[0].kind, ActionKind::Open);
        assert_eq!(ticket.first_message(), "leak in base");
        assert_eq!(ticket.created_at(), 100);
    }

    #[test]
    fn info_sender_round_trips_with_dotted_uuid() {
        let sender = InfoSender::Player {
            uuid: Uuid::new_v4(),
            name: "alex".into(),
        };
        assert_eq!(InfoSender::decode(&sender.encode()), Some(sender));
        assert_eq!(InfoSender::decode("CONSOLE"), Some(InfoSender::Console));
        assert_eq!(InfoSender::decode("PLAYER.alex"), None);
    }

    #[test]
    fn last_closer_tracks_latest_close() {
        let a = Creator::User(Uuid::new_v4());
        let b = Creator::User(Uuid::new_v4());
        let mut ticket = Ticket::new(a.clone(), "m".into(), 1, None);
        ticket.actions.push(Action {
            kind: ActionKind::CloseWithoutComment,
            message: None,
            actor: a.clone(),
            timestamp: 2,
            location: None,
        });
        ticket.actions.push(Action {
            kind: ActionKind::Reopen,
            message: None,
            actor: b.clone(),
            timestamp: 3,
            location: None,
        });
        ticket.actions.push(Action {
            kind: ActionKind::MassClose,
            message: None,
            actor: b.clone(),
            timestamp: 4,
            location: None,
        });
        assert_eq!(ticket.last_closer(), Some(&b));
        assert_eq!(ticket.closers().count(), 2);
    }
}
