//! Turning a search-box query into launcher suggestions.

use serde::Serialize;

use super::matcher::ContactMatcher;
use super::query::{is_valid_email, parse_query, RecipientQuery};
use crate::model::contact::Contact;

/// One row of the launcher's result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Suggestion {
    /// Nothing typed yet: compose a message with no recipients.
    ComposeEmpty,
    /// A typed segment is not an email address.
    InvalidAddress { address: String },
    /// Compose to the recipients typed so far.
    ComposeTo { recipients: String },
    /// A contact matching the pending token. `argument` is the new query
    /// text (confirmed recipients plus this contact, ready for the next).
    Contact {
        title: String,
        address: String,
        is_group: bool,
        argument: String,
    },
    /// The contact cache is being rebuilt in the background.
    Updating,
}

/// Build suggestions for `input` in display order.
///
/// Invalid segments are listed first so they stay visible while the user
/// keeps typing.
pub fn complete(
    input: &str,
    contacts: &[Contact],
    matcher: &dyn ContactMatcher,
    updating: bool,
) -> Vec<Suggestion> {
    let query = parse_query(input);
    let mut suggestions = suggest(&query, contacts, matcher);
    if updating {
        suggestions.push(Suggestion::Updating);
    }
    suggestions
}

fn suggest(
    query: &RecipientQuery,
    contacts: &[Contact],
    matcher: &dyn ContactMatcher,
) -> Vec<Suggestion> {
    if query.is_empty() {
        return vec![Suggestion::ComposeEmpty];
    }

    let mut suggestions: Vec<Suggestion> = query
        .invalid
        .iter()
        .map(|address| Suggestion::InvalidAddress {
            address: address.clone(),
        })
        .collect();

    let prefix = query.confirmed_prefix();
    let hits = matcher.search(&query.pending, contacts);

    if hits.is_empty() {
        if is_valid_email(&query.pending) || (query.pending.is_empty() && !query.confirmed.is_empty())
        {
            suggestions.push(compose_to(&prefix, &query.pending));
        } else if !query.pending.is_empty() {
            suggestions.push(Suggestion::InvalidAddress {
                address: query.pending.clone(),
            });
            if !query.confirmed.is_empty() {
                suggestions.push(compose_to(&prefix, ""));
            }
        }
        return suggestions;
    }

    let mut shown = 0;
    for hit in &hits {
        let address = hit.contact.address();
        if query.contains(&hit.contact.key()) {
            continue;
        }
        suggestions.push(Suggestion::Contact {
            title: hit.contact.title(),
            argument: format!("{prefix}{address}, "),
            address,
            is_group: hit.contact.is_group(),
        });
        shown += 1;
    }

    if shown == 0 {
        suggestions.push(compose_to(&prefix, ""));
    }
    suggestions
}

/// `ComposeTo` for the confirmed prefix plus an optional last address.
fn compose_to(prefix: &str, last: &str) -> Suggestion {
    let recipients = format!("{prefix}{last}");
    Suggestion::ComposeTo {
        recipients: recipients.trim_end_matches([',', ' ']).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::matcher::FuzzyContactMatcher;

    fn contacts() -> Vec<Contact> {
        vec![
            Contact::person(Some("Bob Test"), "bob@example.com"),
            Contact::person(Some("Sue Test"), "sue@example.com"),
            Contact::group("Team", &["bob@example.com", "sue@example.com"]),
        ]
    }

    fn run(input: &str) -> Vec<Suggestion> {
        complete(input, &contacts(), &FuzzyContactMatcher::default(), false)
    }

    #[test]
    fn test_empty_query_offers_blank_compose() {
        assert_eq!(run(""), vec![Suggestion::ComposeEmpty]);
        assert_eq!(run(" , "), vec![Suggestion::ComposeEmpty]);
    }

    #[test]
    fn test_hits_carry_accumulated_argument() {
        let suggestions = run("bob@example.com, su");
        assert_eq!(
            suggestions,
            vec![Suggestion::Contact {
                title: "Sue Test".to_string(),
                address: "sue@example.com".to_string(),
                is_group: false,
                argument: "bob@example.com, sue@example.com, ".to_string(),
            }]
        );
    }

    #[test]
    fn test_confirmed_hits_are_deduplicated() {
        let suggestions = run("bob@example.com, bob");
        assert_eq!(
            suggestions,
            vec![Suggestion::ComposeTo {
                recipients: "bob@example.com".to_string()
            }]
        );
    }

    #[test]
    fn test_invalid_segments_come_first() {
        let suggestions = run("nope, sue");
        assert_eq!(
            suggestions[0],
            Suggestion::InvalidAddress {
                address: "nope".to_string()
            }
        );
        assert!(matches!(suggestions[1], Suggestion::Contact { .. }));
    }

    #[test]
    fn test_unknown_valid_address_can_be_composed() {
        let suggestions = run("bob@example.com, zed@nowhere.org");
        assert_eq!(
            suggestions,
            vec![Suggestion::ComposeTo {
                recipients: "bob@example.com, zed@nowhere.org".to_string()
            }]
        );
    }

    #[test]
    fn test_trailing_comma_composes_confirmed() {
        let suggestions = run("bob@example.com, ");
        assert_eq!(
            suggestions,
            vec![Suggestion::ComposeTo {
                recipients: "bob@example.com".to_string()
            }]
        );
    }

    #[test]
    fn test_unmatched_pending_is_flagged() {
        let suggestions = run("bob@example.com, qqqq");
        assert_eq!(
            suggestions,
            vec![
                Suggestion::InvalidAddress {
                    address: "qqqq".to_string()
                },
                Suggestion::ComposeTo {
                    recipients: "bob@example.com".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_groups_expand_to_member_list() {
        let suggestions = run("tea");
        assert_eq!(
            suggestions,
            vec![Suggestion::Contact {
                title: "Team".to_string(),
                address: "bob@example.com, sue@example.com".to_string(),
                is_group: true,
                argument: "bob@example.com, sue@example.com, ".to_string(),
            }]
        );
    }

    #[test]
    fn test_updating_notice_is_appended() {
        let suggestions = complete("", &contacts(), &FuzzyContactMatcher::default(), true);
        assert_eq!(suggestions, vec![Suggestion::ComposeEmpty, Suggestion::Updating]);
    }
}
