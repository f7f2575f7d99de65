//! Backend-shared search evaluation.
//!
//! Both storage backends funnel through `matches` so that SQL and in-memory
//! search agree on semantics; the SQL backend additionally pushes the cheap
//! column constraints down into the query before evaluating the rest here.

use crate::domain::Ticket;
use crate::filters::SearchConstraints;

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub tickets: Vec<Ticket>,
    /// The page actually returned, clamped into `[1, total_pages]`.
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

impl SearchPage {
    pub fn empty() -> SearchPage {
        SearchPage {
            tickets: Vec::new(),
            page: 1,
            total_pages: 0,
            total: 0,
        }
    }
}

/// Evaluates every present constraint against one ticket; absent fields
/// impose no filter. `now` is epoch seconds, used for the elapsed filter.
pub fn matches(ticket: &Ticket, constraints: &SearchConstraints, now: i64) -> bool {
    if let Some(c) = &constraints.creator {
        if !c.holds_eq(&ticket.creator) {
            return false;
        }
    }
    if let Some(c) = &constraints.assigned {
        if !c.holds_eq(&ticket.assigned_to) {
            return false;
        }
    }
    if let Some(c) = &constraints.priority {
        if !c.holds_ord(&ticket.priority) {
            return false;
        }
    }
    if let Some(c) = &constraints.status {
        if !c.holds_eq(&ticket.status) {
            return false;
        }
    }
    if let Some(c) = &constraints.closed_by {
        let hit = ticket.closers().any(|actor| actor == &c.value);
        let wanted = match c.symbol {
            crate::filters::Symbol::Equals => hit,
            crate::filters::Symbol::NotEquals => !hit,
            _ => false,
        };
        if !wanted {
            return false;
        }
    }
    if let Some(c) = &constraints.last_closed_by {
        match ticket.last_closer() {
            Some(actor) => {
                if !c.holds_eq(actor) {
                    return false;
                }
            }
            None => return false,
        }
    }
    if let Some(c) = &constraints.world {
        match ticket.world() {
            Some(world) => {
                if !c.holds_eq(&world.to_string()) {
                    return false;
                }
            }
            None => return false,
        }
    }
    if let Some(c) = &constraints.elapsed {
        if !c.holds_ord(&(now - ticket.created_at())) {
            return false;
        }
    }
    if let Some(c) = &constraints.keywords {
        if !keywords_match(ticket, &c.value) {
            return false;
        }
    }
    true
}

/// Any alternative must appear, case-insensitively, somewhere in the
/// ticket's open/comment text.
fn keywords_match(ticket: &Ticket, alternatives: &[String]) -> bool {
    let haystacks: Vec<String> = ticket
        .actions
        .iter()
        .filter_map(|a| a.message.as_deref())
        .map(|m| m.to_lowercase())
        .collect();
    alternatives.iter().any(|alt| {
        let needle = alt.to_lowercase();
        haystacks.iter().any(|h| h.contains(&needle))
    })
}

/// Sorts by descending id (the final tiebreak for all search results) and
/// cuts the requested page at `page_size`.
pub fn paginate(mut tickets: Vec<Ticket>, requested_page: usize, page_size: usize) -> SearchPage {
    tickets.sort_by(|a, b| b.id.cmp(&a.id));

    let total = tickets.len();
    if total == 0 || page_size == 0 {
        return SearchPage::empty();
    }

    let total_pages = total.div_ceil(page_size);
    let page = requested_page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let tickets = tickets
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();

    SearchPage {
        tickets,
        page,
        total_pages,
        total,
    }
}
