pub mod ticket_actions;
pub mod tickets;
