//! Recipient search: query parsing, contact ranking and suggestions.

pub mod complete;
pub mod matcher;
pub mod query;

pub use complete::{complete, Suggestion};
pub use matcher::{ContactMatcher, FuzzyContactMatcher, ScoredContact, SearchConfig};
pub use query::{is_valid_email, parse_query, RecipientQuery};
