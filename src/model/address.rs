//! Recipients and RFC 5322 address-list splitting.

use serde::{Deserialize, Serialize};

/// One recipient of a message: an optional display name and an address.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `name = Some("Juan García")`, `email = "juan@ejemplo.com"`
/// - `"user@example.com"` → `name = None`, `email = "user@example.com"`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    /// Human-readable display name, if known.
    pub name: Option<String>,
    /// The bare email address (`user@domain`).
    pub email: String,
}

impl Recipient {
    /// A recipient with a display name.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// A recipient with no known display name.
    pub fn bare(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Parse a single address.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    ///
    /// If parsing fails, the raw string is stored as `email`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Some(angle_start) = trimmed.rfind('<') {
            if let Some(angle_end) = trimmed.rfind('>') {
                if angle_end > angle_start {
                    let email = trimmed[angle_start + 1..angle_end].trim().to_string();
                    let name = unquote(&trimmed[..angle_start]);
                    return Self {
                        name: (!name.is_empty()).then_some(name),
                        email,
                    };
                }
            }
        }

        Self::bare(trimmed)
    }

    /// Parse a comma-separated list of addresses.
    ///
    /// Handles quoted commas: `"Last, First" <a@b.com>, other@c.com`
    pub fn parse_list(raw: &str) -> Vec<Self> {
        let mut results = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut in_angle = false;
        let mut escaped = false;

        for ch in raw.chars() {
            if escaped {
                current.push(ch);
                escaped = false;
                continue;
            }
            match ch {
                '\\' if in_quotes => {
                    escaped = true;
                    current.push(ch);
                }
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(ch);
                }
                '<' if !in_quotes => {
                    in_angle = true;
                    current.push(ch);
                }
                '>' if !in_quotes => {
                    in_angle = false;
                    current.push(ch);
                }
                ',' if !in_quotes && !in_angle => {
                    let recipient = Self::parse(&current);
                    if !recipient.email.is_empty() {
                        results.push(recipient);
                    }
                    current.clear();
                }
                _ => current.push(ch),
            }
        }

        let recipient = Self::parse(&current);
        if !recipient.email.is_empty() {
            results.push(recipient);
        }

        results
    }
}

/// Strip surrounding double-quotes, undo backslash escapes and trim.
fn unquote(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        let mut out = String::with_capacity(trimmed.len());
        let mut chars = trimmed[1..trimmed.len() - 1].chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(ch);
            }
        }
        out.trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => write!(f, "{} <{}>", name, self.email),
            _ => f.write_str(&self.email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_address() {
        let r = Recipient::parse("user@example.com");
        assert_eq!(r.email, "user@example.com");
        assert_eq!(r.name, None);
    }

    #[test]
    fn test_parse_angle_address() {
        let r = Recipient::parse("<user@example.com>");
        assert_eq!(r.email, "user@example.com");
        assert_eq!(r.name, None);
    }

    #[test]
    fn test_parse_name_and_address() {
        let r = Recipient::parse("User One <user1@example.com>");
        assert_eq!(r, Recipient::new("User One", "user1@example.com"));
    }

    #[test]
    fn test_parse_quoted_name_with_escapes() {
        let r = Recipient::parse(r#""Probe, \"Heini\"" <heini@example.com>"#);
        assert_eq!(r.name.as_deref(), Some(r#"Probe, "Heini""#));
        assert_eq!(r.email, "heini@example.com");
    }

    #[test]
    fn test_parse_list_with_quoted_comma() {
        let list = Recipient::parse_list("\"Last, First\" <a@b.com>, other@c.com");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name.as_deref(), Some("Last, First"));
        assert_eq!(list[0].email, "a@b.com");
        assert_eq!(list[1], Recipient::bare("other@c.com"));
    }

    #[test]
    fn test_parse_list_skips_empty_segments() {
        let list = Recipient::parse_list("a@b.com,, ,c@d.com");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Recipient::new("Alice", "alice@example.com").to_string(),
            "Alice <alice@example.com>"
        );
        assert_eq!(
            Recipient::bare("alice@example.com").to_string(),
            "alice@example.com"
        );
    }
}
