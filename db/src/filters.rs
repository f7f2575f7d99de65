//! Typed search constraints compiled from the search grammar.
//!
//! One optional constraint per filterable field; absent fields impose no
//! filter. Constraints compare equal when compiled from the same input, so
//! re-running the compiler is idempotent.

use crate::domain::{Assignment, Creator, Priority};
use crate::models::tickets::TicketStatus;

/// Comparison symbol attached to a constraint. Not every symbol is legal
/// for every field; the compiler enforces legality before a constraint is
/// ever constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Symbol::Equals => "=",
            Symbol::NotEquals => "!=",
            Symbol::LessThan => "<",
            Symbol::GreaterThan => ">",
        };
        f.write_str(s)
    }
}

impl Symbol {
    pub fn parse(s: &str) -> Option<Symbol> {
        match s {
            "=" => Some(Symbol::Equals),
            "!=" => Some(Symbol::NotEquals),
            "<" => Some(Symbol::LessThan),
            ">" => Some(Symbol::GreaterThan),
            _ => None,
        }
    }
}

/// A single `(symbol, value)` pair for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint<T> {
    pub symbol: Symbol,
    pub value: T,
}

impl<T> Constraint<T> {
    pub fn eq(value: T) -> Self {
        Self {
            symbol: Symbol::Equals,
            value,
        }
    }

    pub fn ne(value: T) -> Self {
        Self {
            symbol: Symbol::NotEquals,
            value,
        }
    }

    pub fn lt(value: T) -> Self {
        Self {
            symbol: Symbol::LessThan,
            value,
        }
    }

    pub fn gt(value: T) -> Self {
        Self {
            symbol: Symbol::GreaterThan,
            value,
        }
    }

    /// Equality-style evaluation. Ordering symbols never reach here for
    /// equality-only fields; they are rejected at compile time.
    pub fn holds_eq(&self, candidate: &T) -> bool
    where
        T: PartialEq,
    {
        match self.symbol {
            Symbol::Equals => *candidate == self.value,
            Symbol::NotEquals => *candidate != self.value,
            Symbol::LessThan | Symbol::GreaterThan => false,
        }
    }

    /// Full-ordering evaluation.
    pub fn holds_ord(&self, candidate: &T) -> bool
    where
        T: PartialOrd,
    {
        match self.symbol {
            Symbol::Equals => *candidate == self.value,
            Symbol::NotEquals => *candidate != self.value,
            Symbol::LessThan => *candidate < self.value,
            Symbol::GreaterThan => *candidate > self.value,
        }
    }
}

/// Compiled search constraints plus the requested result page.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConstraints {
    pub creator: Option<Constraint<Creator>>,
    pub assigned: Option<Constraint<Assignment>>,
    pub priority: Option<Constraint<Priority>>,
    pub status: Option<Constraint<TicketStatus>>,
    pub closed_by: Option<Constraint<Creator>>,
    pub last_closed_by: Option<Constraint<Creator>>,
    pub world: Option<Constraint<String>>,
    /// Seconds elapsed since creation.
    pub elapsed: Option<Constraint<i64>>,
    /// `||`-separated alternatives; any must appear in the ticket text.
    pub keywords: Option<Constraint<Vec<String>>>,
    pub page: usize,
}

impl Default for SearchConstraints {
    fn default() -> Self {
        Self {
            creator: None,
            assigned: None,
            priority: None,
            status: None,
            closed_by: None,
            last_closed_by: None,
            world: None,
            elapsed: None,
            keywords: None,
            page: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_constraints_hold() {
        let gt = Constraint::gt(Priority::Normal);
        assert!(gt.holds_ord(&Priority::High));
        assert!(!gt.holds_ord(&Priority::Normal));

        let lt = Constraint::lt(Priority::Normal);
        assert!(lt.holds_ord(&Priority::Low));
        assert!(!lt.holds_ord(&Priority::Highest));
    }

    #[test]
    fn equality_constraints_ignore_ordering_symbols() {
        let c = Constraint {
            symbol: Symbol::LessThan,
            value: "overworld".to_string(),
        };
        assert!(!c.holds_eq(&"overworld".to_string()));
    }

    #[test]
    fn symbol_display_matches_grammar() {
        for (sym, text) in [
            (Symbol::Equals, "="),
            (Symbol::NotEquals, "!="),
            (Symbol::LessThan, "<"),
            (Symbol::GreaterThan, ">"),
        ] {
            assert_eq!(sym.to_string(), text);
            assert_eq!(Symbol::parse(text), Some(sym));
        }
        assert_eq!(Symbol::parse(">="), None);
    }
}
