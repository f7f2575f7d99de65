use db::domain::{Creator, InfoSender};
use uuid::Uuid;

/// A live command issuer: the console, or a player currently connected to
/// this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSender {
    Console,
    Player { uuid: Uuid, name: String },
}

impl CommandSender {
    /// Creator-shaped reference, for ownership comparisons and storage.
    pub fn as_creator(&self) -> Creator {
        match self {
            CommandSender::Console => Creator::Console,
            CommandSender::Player { uuid, .. } => Creator::User(*uuid),
        }
    }

    /// Node-boundary projection carried in relay frames.
    pub fn to_info(&self) -> InfoSender {
        match self {
            CommandSender::Console => InfoSender::Console,
            CommandSender::Player { uuid, name } => InfoSender::Player {
                uuid: *uuid,
                name: name.clone(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CommandSender::Console => "Console",
            CommandSender::Player { name, .. } => name,
        }
    }
}
