//! Search grammar compiler.
//!
//! Turns raw `key OP value && key OP value` input into typed
//! [`SearchConstraints`]. Every rejection is a [`QueryError`] naming the
//! offending key or value; compilation never panics on user input.
//!
//! Symbol legality is enforced here so the evaluators downstream can
//! assume constraints are well formed: equality-only fields never carry
//! an ordering symbol, and `time` never carries an equality symbol.

use crate::capabilities::Directory;
use db::domain::{Assignment, Creator, Priority};
use db::filters::{Constraint, SearchConstraints, Symbol};
use db::models::tickets::TicketStatus;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("malformed clause '{0}', expected 'key OP value'")]
    Malformed(String),

    #[error("unknown search key '{0}'")]
    UnknownKey(String),

    #[error("unknown operator '{0}'")]
    UnknownSymbol(String),

    #[error("operator '{symbol}' is not valid for '{key}'")]
    IllegalSymbol { key: String, symbol: String },

    #[error("bad value '{value}' for '{key}'")]
    BadValue { key: String, value: String },

    #[error("unknown player '{0}'")]
    UnknownPlayer(String),
}

/// Seconds per unit accepted in `time` values.
fn time_unit_seconds(unit: &str) -> Option<i64> {
    match unit {
        "second" | "seconds" | "s" => Some(1),
        "minute" | "minutes" | "m" => Some(60),
        "hour" | "hours" | "h" => Some(3_600),
        "day" | "days" | "d" => Some(86_400),
        "week" | "weeks" | "w" => Some(604_800),
        "year" | "years" | "y" => Some(31_556_952),
        _ => None,
    }
}

/// Parse one `<integer><unit>` token, e.g. `3day` or `45s`. An amount
/// that would overflow the seconds total is a parse failure, not a wrap.
fn parse_time_token(token: &str) -> Option<i64> {
    if let Ok(seconds) = token.parse::<i64>() {
        return Some(seconds);
    }
    let split = token.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = token.split_at(split);
    let amount: i64 = digits.parse().ok()?;
    amount.checked_mul(time_unit_seconds(unit)?)
}

fn equality_only(key: &str, symbol: Symbol) -> Result<(), QueryError> {
    match symbol {
        Symbol::Equals | Symbol::NotEquals => Ok(()),
        other => Err(QueryError::IllegalSymbol {
            key: key.to_string(),
            symbol: other.to_string(),
        }),
    }
}

async fn resolve_creator(
    directory: &dyn Directory,
    key: &str,
    value: &str,
) -> Result<Creator, QueryError> {
    if value.eq_ignore_ascii_case("console") {
        return Ok(Creator::Console);
    }
    match directory.resolve_name(value).await {
        Some(uuid) => Ok(Creator::User(uuid)),
        None => Err(QueryError::UnknownPlayer(format!("{value} (for '{key}')"))),
    }
}

fn parse_assignment(value: &str) -> Assignment {
    if value.eq_ignore_ascii_case("nobody") {
        Assignment::Nobody
    } else if value.eq_ignore_ascii_case("console") {
        Assignment::Console
    } else {
        Assignment::Player(value.to_string())
    }
}

/// Compile a raw query into constraints. A repeated key overwrites its
/// earlier clause, so the same input always compiles to equal constraints.
pub async fn compile(
    input: &str,
    directory: &dyn Directory,
) -> Result<SearchConstraints, QueryError> {
    let mut constraints = SearchConstraints::default();

    for clause in input.split("&&") {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        let mut tokens = clause.split_whitespace();
        let key = tokens
            .next()
            .ok_or_else(|| QueryError::Malformed(clause.to_string()))?
            .to_ascii_lowercase();
        let raw_symbol = tokens
            .next()
            .ok_or_else(|| QueryError::Malformed(clause.to_string()))?;
        let symbol = Symbol::parse(raw_symbol)
            .ok_or_else(|| QueryError::UnknownSymbol(raw_symbol.to_string()))?;
        let value = tokens.collect::<Vec<_>>().join(" ");
        if value.is_empty() {
            return Err(QueryError::Malformed(clause.to_string()));
        }

        match key.as_str() {
            "creator" => {
                equality_only(&key, symbol)?;
                let target = resolve_creator(directory, &key, &value).await?;
                constraints.creator = Some(Constraint { symbol, value: target });
            }
            "closedby" => {
                equality_only(&key, symbol)?;
                let target = resolve_creator(directory, &key, &value).await?;
                constraints.closed_by = Some(Constraint { symbol, value: target });
            }
            "lastclosedby" => {
                equality_only(&key, symbol)?;
                let target = resolve_creator(directory, &key, &value).await?;
                constraints.last_closed_by = Some(Constraint { symbol, value: target });
            }
            "assignedto" => {
                equality_only(&key, symbol)?;
                constraints.assigned = Some(Constraint {
                    symbol,
                    value: parse_assignment(&value),
                });
            }
            "status" => {
                equality_only(&key, symbol)?;
                let status =
                    TicketStatus::from_str(&value).map_err(|_| QueryError::BadValue {
                        key: key.clone(),
                        value: value.clone(),
                    })?;
                constraints.status = Some(Constraint { symbol, value: status });
            }
            "world" => {
                equality_only(&key, symbol)?;
                constraints.world = Some(Constraint { symbol, value });
            }
            "keywords" => {
                equality_only(&key, symbol)?;
                let alternatives: Vec<String> = value
                    .split("||")
                    .map(|alt| alt.trim().to_string())
                    .filter(|alt| !alt.is_empty())
                    .collect();
                if alternatives.is_empty() {
                    return Err(QueryError::BadValue { key, value });
                }
                constraints.keywords = Some(Constraint {
                    symbol,
                    value: alternatives,
                });
            }
            "priority" => {
                let priority = Priority::parse(&value).ok_or_else(|| QueryError::BadValue {
                    key: key.clone(),
                    value: value.clone(),
                })?;
                constraints.priority = Some(Constraint {
                    symbol,
                    value: priority,
                });
            }
            "time" => {
                if !matches!(symbol, Symbol::LessThan | Symbol::GreaterThan) {
                    return Err(QueryError::IllegalSymbol {
                        key,
                        symbol: symbol.to_string(),
                    });
                }
                let mut total = 0i64;
                for token in value.split_whitespace() {
                    total = parse_time_token(token)
                        .and_then(|seconds| total.checked_add(seconds))
                        .ok_or_else(|| QueryError::BadValue {
                            key: key.clone(),
                            value: value.clone(),
                        })?;
                }
                constraints.elapsed = Some(Constraint {
                    symbol,
                    value: total,
                });
            }
            "page" => {
                if symbol != Symbol::Equals {
                    return Err(QueryError::IllegalSymbol {
                        key,
                        symbol: symbol.to_string(),
                    });
                }
                let page: usize = value.parse().map_err(|_| QueryError::BadValue {
                    key: key.clone(),
                    value: value.clone(),
                })?;
                constraints.page = page.max(1);
            }
            other => return Err(QueryError::UnknownKey(other.to_string())),
        }
    }

    Ok(constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDirectory;
    use uuid::Uuid;

    fn directory_with(name: &str, uuid: Uuid) -> FakeDirectory {
        let directory = FakeDirectory::new();
        directory.add_known_name(name, uuid);
        directory
    }

    #[tokio::test]
    async fn compiles_multi_clause_query() {
        let uuid = Uuid::new_v4();
        let directory = directory_with("Steve", uuid);

        let constraints = compile(
            "creator = Steve && priority > normal && keywords = lava || grief && page = 2",
            &directory,
        )
        .await
        .unwrap();

        assert_eq!(
            constraints.creator,
            Some(Constraint::eq(Creator::User(uuid)))
        );
        assert_eq!(
            constraints.priority,
            Some(Constraint::gt(Priority::Normal))
        );
        assert_eq!(
            constraints.keywords,
            Some(Constraint::eq(vec!["lava".to_string(), "grief".to_string()]))
        );
        assert_eq!(constraints.page, 2);
    }

    #[tokio::test]
    async fn same_input_compiles_equal() {
        let directory = FakeDirectory::new();
        let input = "status != closed && time < 2day 6hour";
        let a = compile(input, &directory).await.unwrap();
        let b = compile(input, &directory).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.elapsed, Some(Constraint::lt(2 * 86_400 + 6 * 3_600)));
    }

    #[tokio::test]
    async fn rejects_ordering_on_equality_only_keys() {
        let directory = FakeDirectory::new();
        for key in ["status", "world", "keywords", "assignedto"] {
            let err = compile(&format!("{key} < x"), &directory).await.unwrap_err();
            assert_eq!(
                err,
                QueryError::IllegalSymbol {
                    key: key.to_string(),
                    symbol: "<".to_string()
                }
            );
        }
    }

    #[tokio::test]
    async fn rejects_equality_on_time() {
        let directory = FakeDirectory::new();
        let err = compile("time = 3day", &directory).await.unwrap_err();
        assert_eq!(
            err,
            QueryError::IllegalSymbol {
                key: "time".to_string(),
                symbol: "=".to_string()
            }
        );
    }

    #[tokio::test]
    async fn rejects_unknown_key_and_player() {
        let directory = FakeDirectory::new();
        assert_eq!(
            compile("flavour = mint", &directory).await.unwrap_err(),
            QueryError::UnknownKey("flavour".to_string())
        );
        assert!(matches!(
            compile("creator = Nobody_Here", &directory).await.unwrap_err(),
            QueryError::UnknownPlayer(_)
        ));
    }

    #[tokio::test]
    async fn console_creator_needs_no_lookup() {
        let directory = FakeDirectory::new();
        let constraints = compile("creator = console", &directory).await.unwrap();
        assert_eq!(
            constraints.creator,
            Some(Constraint::eq(Creator::Console))
        );
    }

    #[tokio::test]
    async fn priority_accepts_names_and_numeric_levels() {
        let directory = FakeDirectory::new();
        let by_name = compile("priority > high", &directory).await.unwrap();
        let by_level = compile("priority > 4", &directory).await.unwrap();
        assert_eq!(by_name.priority, by_level.priority);

        assert_eq!(
            compile("priority = 9", &directory).await.unwrap_err(),
            QueryError::BadValue {
                key: "priority".to_string(),
                value: "9".to_string()
            }
        );
    }

    #[test]
    fn time_tokens_accept_bare_seconds_and_units() {
        assert_eq!(parse_time_token("90"), Some(90));
        assert_eq!(parse_time_token("2week"), Some(1_209_600));
        assert_eq!(parse_time_token("1year"), Some(31_556_952));
        assert_eq!(parse_time_token("fortnight"), None);
    }

    #[test]
    fn overflowing_time_amount_is_a_parse_failure() {
        assert_eq!(parse_time_token("9000000000000000000y"), None);
        assert_eq!(parse_time_token(&format!("{}s", i64::MAX)), Some(i64::MAX));
    }

    #[tokio::test]
    async fn overflowing_time_value_is_rejected_not_wrapped() {
        let directory = FakeDirectory::new();
        let err = compile("time > 9000000000000000000y", &directory)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::BadValue { .. }));

        // Individually valid tokens whose sum overflows fail the same way.
        let huge = format!("time > {0}s {0}s", i64::MAX);
        let err = compile(&huge, &directory).await.unwrap_err();
        assert!(matches!(err, QueryError::BadValue { .. }));
    }
}
