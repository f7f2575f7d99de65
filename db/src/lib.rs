pub mod domain;
pub mod filters;
pub mod models;
pub mod search;
pub mod store;
pub mod test_utils;

pub use domain::{Action, Assignment, Creator, InfoSender, Location, Priority, Ticket};
pub use filters::{Constraint, SearchConstraints, Symbol};
pub use models::ticket_actions::ActionKind;
pub use models::tickets::TicketStatus;
pub use search::SearchPage;
pub use store::{StoreError, StoreKind, TicketStore};
