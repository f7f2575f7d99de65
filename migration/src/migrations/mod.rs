pub mod m202602140001_create_tickets;
pub mod m202602140002_create_ticket_actions;
