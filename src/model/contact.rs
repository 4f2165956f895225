//! Contacts as read from the contact cache.

use serde::{Deserialize, Serialize};

/// What kind of address-book record a contact is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContactKind {
    Person { email: String },
    Company { email: String },
    /// A distribution list; member addresses in address-book order.
    Group { members: Vec<String> },
}

/// A single searchable record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    /// Person, company or group name. May be absent for bare addresses.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(flatten)]
    pub kind: ContactKind,
}

impl Contact {
    pub fn person(name: Option<&str>, email: &str) -> Self {
        Self {
            display_name: name.map(str::to_string),
            nickname: None,
            kind: ContactKind::Person {
                email: email.to_string(),
            },
        }
    }

    pub fn company(name: &str, email: &str) -> Self {
        Self {
            display_name: Some(name.to_string()),
            nickname: None,
            kind: ContactKind::Company {
                email: email.to_string(),
            },
        }
    }

    pub fn group(name: &str, members: &[&str]) -> Self {
        Self {
            display_name: Some(name.to_string()),
            nickname: None,
            kind: ContactKind::Group {
                members: members.iter().map(|m| m.to_string()).collect(),
            },
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ContactKind::Group { .. })
    }

    /// Every address this contact expands to.
    pub fn emails(&self) -> Vec<&str> {
        match &self.kind {
            ContactKind::Person { email } | ContactKind::Company { email } => vec![email.as_str()],
            ContactKind::Group { members } => members.iter().map(String::as_str).collect(),
        }
    }

    /// The address as typed into the query box: the email itself, or the
    /// members of a group joined with `", "`.
    pub fn address(&self) -> String {
        self.emails().join(", ")
    }

    /// Lower-cased matching and deduplication key.
    pub fn key(&self) -> String {
        self.address().to_lowercase()
    }

    /// Display name, falling back to the address.
    pub fn title(&self) -> String {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.address(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_address_joins_members() {
        let g = Contact::group("Team", &["a@x.com", "B@x.com"]);
        assert!(g.is_group());
        assert_eq!(g.address(), "a@x.com, B@x.com");
        assert_eq!(g.key(), "a@x.com, b@x.com");
    }

    #[test]
    fn test_title_falls_back_to_address() {
        let c = Contact::person(None, "bob@example.com");
        assert_eq!(c.title(), "bob@example.com");
        let c = Contact::company("Splendid, Inc.", "info@splendid.com");
        assert_eq!(c.title(), "Splendid, Inc.");
    }

    #[test]
    fn test_deserialize_tagged_kind() {
        let json = r#"[
            {"display_name": "Bob Test", "kind": "person", "email": "bob@example.com"},
            {"display_name": "Team", "kind": "group", "members": ["a@x.com", "b@x.com"]}
        ]"#;
        let contacts: Vec<Contact> = serde_json::from_str(json).expect("parse");
        assert_eq!(contacts[0], Contact::person(Some("Bob Test"), "bob@example.com"));
        assert_eq!(contacts[1].emails(), vec!["a@x.com", "b@x.com"]);
        assert_eq!(contacts[1].nickname, None);
    }
}
