//! Statement-shape checks and LIMIT rewriting for model-authored SQL

use crate::error::ValidationError;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::info;

/// Verbs that may never appear as a whole word in a sandboxed query
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE", "EXEC", "EXECUTE",
    "PRAGMA", "ATTACH", "DETACH",
];

static FORBIDDEN_PATTERN: OnceLock<Regex> = OnceLock::new();
static LIMIT_PATTERN: OnceLock<Regex> = OnceLock::new();

fn forbidden_pattern() -> &'static Regex {
    FORBIDDEN_PATTERN.get_or_init(|| {
        let alternation = FORBIDDEN_KEYWORDS.join("|");
        Regex::new(&format!(r"\b({})\b", alternation)).expect("keyword pattern is a valid regex")
    })
}

fn limit_pattern() -> &'static Regex {
    LIMIT_PATTERN
        .get_or_init(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)\b").expect("limit pattern is a valid regex"))
}

/// Collapse runs of whitespace and upper-case the query
pub fn normalize(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Check that `sql` is a single read-only SELECT statement.
///
/// Rules are applied in order: non-empty, starts with `SELECT`, no
/// forbidden verb as a whole word, and no statement after a semicolon
/// other than one terminal semicolon.
pub fn validate(sql: &str) -> Result<(), ValidationError> {
    let normalized = normalize(sql);

    if normalized.is_empty() {
        return Err(ValidationError::Empty);
    }

    if !normalized.starts_with("SELECT") {
        return Err(ValidationError::NotSelect);
    }

    if let Some(found) = forbidden_pattern().captures(&normalized) {
        return Err(ValidationError::ForbiddenKeyword {
            keyword: found[1].to_string(),
        });
    }

    let trimmed = sql.trim();
    let body = trimmed.strip_suffix(';').unwrap_or(trimmed);
    if body.contains(';') {
        return Err(ValidationError::MultipleStatements);
    }

    Ok(())
}

/// Cap every `LIMIT n` at `max_rows`, or append `LIMIT max_rows` when the
/// query has none. A terminal semicolon is kept at the end.
pub fn enforce_limit(sql: &str, max_rows: usize) -> String {
    let pattern = limit_pattern();

    if pattern.is_match(sql) {
        let rewritten = pattern.replace_all(sql, |caps: &Captures| {
            // Values too large for usize are over the cap by definition
            let requested = caps[1].parse::<usize>().unwrap_or(usize::MAX);
            if requested > max_rows {
                info!("LIMIT adjusted from {} to {}", &caps[1], max_rows);
                format!("LIMIT {}", max_rows)
            } else {
                caps[0].to_string()
            }
        });
        return rewritten.into_owned();
    }

    let trimmed = sql.trim();
    info!("LIMIT {} added to query", max_rows);
    match trimmed.strip_suffix(';') {
        Some(body) => format!("{} LIMIT {};", body.trim_end(), max_rows),
        None => format!("{} LIMIT {}", trimmed, max_rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_select() {
        assert!(validate("SELECT * FROM 'events.csv'").is_ok());
        assert!(validate("  select\n  event_name\tfrom 'events.csv'  ").is_ok());
    }

    #[test]
    fn test_rejects_empty_and_non_select() {
        assert_eq!(validate("   "), Err(ValidationError::Empty));
        assert_eq!(
            validate("WITH x AS (SELECT 1) SELECT * FROM x"),
            Err(ValidationError::NotSelect)
        );
        assert_eq!(
            validate("DELETE FROM 'events.csv'"),
            Err(ValidationError::NotSelect)
        );
    }

    #[test]
    fn test_denylist_every_keyword_any_case() {
        for keyword in FORBIDDEN_KEYWORDS {
            let variants = [
                keyword.to_string(),
                keyword.to_lowercase(),
                keyword
                    .chars()
                    .enumerate()
                    .map(|(i, c)| {
                        if i % 2 == 0 {
                            c.to_ascii_lowercase()
                        } else {
                            c
                        }
                    })
                    .collect::<String>(),
            ];

            for variant in variants {
                let sql = format!("SELECT * FROM 'events.csv' WHERE x = 1 {} y", variant);
                assert_eq!(
                    validate(&sql),
                    Err(ValidationError::ForbiddenKeyword {
                        keyword: keyword.to_string()
                    }),
                    "query containing '{}' should be rejected",
                    variant
                );
            }
        }
    }

    #[test]
    fn test_denylist_ignores_longer_identifiers() {
        assert!(validate("SELECT dropdown_column FROM 'stores.csv'").is_ok());
        assert!(validate("SELECT created_at, updated_by FROM 'stores.csv'").is_ok());
        assert!(validate("SELECT executed FROM 'stores.csv'").is_ok());
        assert!(validate("SELECT insertion_order FROM 'stores.csv'").is_ok());
    }

    #[test]
    fn test_multi_statement_rejection() {
        assert_eq!(
            validate("SELECT 1; SELECT 2"),
            Err(ValidationError::MultipleStatements)
        );
        assert_eq!(
            validate("SELECT 1;x"),
            Err(ValidationError::MultipleStatements)
        );
        assert_eq!(
            validate("SELECT 1;;"),
            Err(ValidationError::MultipleStatements)
        );
        assert!(validate("SELECT 1;").is_ok());
        assert!(validate("SELECT 1;   \n").is_ok());
    }

    #[test]
    fn test_forbidden_verb_after_semicolon_reports_keyword() {
        assert_eq!(
            validate("SELECT 1; DROP TABLE t"),
            Err(ValidationError::ForbiddenKeyword {
                keyword: "DROP".to_string()
            })
        );
    }

    #[test]
    fn test_enforce_limit_appends_when_missing() {
        assert_eq!(
            enforce_limit("SELECT * FROM 't'", 10),
            "SELECT * FROM 't' LIMIT 10"
        );
        assert_eq!(
            enforce_limit("SELECT * FROM 't' ;", 10),
            "SELECT * FROM 't' LIMIT 10;"
        );
    }

    #[test]
    fn test_enforce_limit_caps_large_values() {
        let rewritten = enforce_limit("SELECT * FROM 't' LIMIT 1000", 10);
        assert!(rewritten.contains("LIMIT 10"));
        assert!(!rewritten.contains("LIMIT 1000"));

        let huge = enforce_limit("SELECT * FROM 't' limit 99999999999999999999999", 10);
        assert_eq!(huge, "SELECT * FROM 't' LIMIT 10");
    }

    #[test]
    fn test_enforce_limit_keeps_small_values() {
        assert_eq!(
            enforce_limit("SELECT * FROM 't' LIMIT 5", 10),
            "SELECT * FROM 't' LIMIT 5"
        );
        assert_eq!(
            enforce_limit("SELECT * FROM 't' LIMIT 10;", 10),
            "SELECT * FROM 't' LIMIT 10;"
        );
    }
}
