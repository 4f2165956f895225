//! Recipient query parser.
//!
//! The launcher passes the whole search-box text on every keystroke, e.g.
//! `bob@example.com, sue@example.com, ali`. Everything before the last
//! comma has already been chosen; the last segment is still being typed.
//!
//! - `bob` → pending `bob`
//! - `bob@x.com, sue` → confirmed `[bob@x.com]`, pending `sue`
//! - `nonsense, sue` → invalid `[nonsense]`, pending `sue`
//! - `bob@x.com, ` → confirmed `[bob@x.com]`, pending empty

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Deliberately permissive: rejects only a missing `@` or a domain
/// without a dot.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("valid email pattern")
});

/// Whether `s` looks enough like `local@domain.tld` to be sent to.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

/// A parsed search-box query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipientQuery {
    /// Already-typed segments that are valid addresses, in order.
    pub confirmed: Vec<String>,
    /// Already-typed segments that are not valid addresses, in order.
    pub invalid: Vec<String>,
    /// The trailing segment still being typed. Never validated.
    pub pending: String,
}

impl RecipientQuery {
    /// Whether the user has typed nothing at all.
    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.invalid.is_empty() && self.pending.is_empty()
    }

    /// Whether `address` (lower-cased) is already confirmed.
    pub fn contains(&self, address: &str) -> bool {
        let address = address.to_lowercase();
        self.confirmed.iter().any(|c| *c == address)
    }

    /// Confirmed recipients as the launcher argument prefix,
    /// `"a@x.com, b@y.com, "`, or an empty string.
    pub fn confirmed_prefix(&self) -> String {
        self.confirmed
            .iter()
            .map(|c| format!("{c}, "))
            .collect()
    }
}

/// Split a raw query into confirmed, invalid and pending parts.
///
/// Never fails; the same input always yields the same result.
pub fn parse_query(input: &str) -> RecipientQuery {
    let query = input
        .trim_start_matches(|c: char| c == ',' || c.is_whitespace())
        .trim()
        .to_lowercase();

    let Some((chosen, pending)) = query.rsplit_once(',') else {
        return RecipientQuery {
            pending: query,
            ..RecipientQuery::default()
        };
    };

    let mut parsed = RecipientQuery {
        pending: pending.trim().to_string(),
        ..RecipientQuery::default()
    };

    for segment in chosen.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if is_valid_email(segment) {
            parsed.confirmed.push(segment.to_string());
        } else {
            parsed.invalid.push(segment.to_string());
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_query() {
        let q = parse_query("");
        assert!(q.is_empty());
        assert_eq!(q, RecipientQuery::default());
    }

    #[test]
    fn test_parse_single_pending() {
        let q = parse_query("  Bob ");
        assert!(q.confirmed.is_empty());
        assert_eq!(q.pending, "bob");
    }

    #[test]
    fn test_parse_confirmed_and_pending() {
        let q = parse_query("bob@x.com, sue");
        assert_eq!(q.confirmed, vec!["bob@x.com"]);
        assert!(q.invalid.is_empty());
        assert_eq!(q.pending, "sue");
    }

    #[test]
    fn test_parse_invalid_segment() {
        let q = parse_query("notanemail, sue");
        assert!(q.confirmed.is_empty());
        assert_eq!(q.invalid, vec!["notanemail"]);
        assert_eq!(q.pending, "sue");
    }

    #[test]
    fn test_pending_is_never_validated() {
        let q = parse_query("bob@x.com, not valid yet");
        assert_eq!(q.pending, "not valid yet");
        assert!(q.invalid.is_empty());
    }

    #[test]
    fn test_trailing_comma_leaves_empty_pending() {
        let q = parse_query("Bob@X.com, sue@y.org, ");
        assert_eq!(q.confirmed, vec!["bob@x.com", "sue@y.org"]);
        assert_eq!(q.pending, "");
        assert_eq!(q.confirmed_prefix(), "bob@x.com, sue@y.org, ");
    }

    #[test]
    fn test_leading_separators_and_empty_segments_ignored() {
        let q = parse_query(", bob@x.com,, sue");
        assert_eq!(q.confirmed, vec!["bob@x.com"]);
        assert!(q.invalid.is_empty());
        assert_eq!(q.pending, "sue");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = "a@b.co, nope, c@d.org, ev";
        assert_eq!(parse_query(input), parse_query(input));
    }

    #[test]
    fn test_email_predicate() {
        assert!(is_valid_email("bob@example.com"));
        assert!(is_valid_email("bob.test@mail.example.co.uk"));
        assert!(!is_valid_email("bob"));
        assert!(!is_valid_email("bob@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("bob@@example.com"));
        assert!(!is_valid_email(""));
    }
}
