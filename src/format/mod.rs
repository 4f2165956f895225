//! Recipient formatting: client rules, RFC 2047 names and `mailto:` URIs.

pub mod encoded_word;
pub mod mailto;
pub mod rules;

pub use mailto::{EscapePolicy, Formatter, MailtoUrl};
pub use rules::{ClientFormatRules, RuleTable};
