//! Ranking contacts against the pending query token.
//!
//! Scores are tiered so that the obvious hits come first:
//!
//! | match                                   | score |
//! |-----------------------------------------|-------|
//! | name starts with the query              | 100   |
//! | an address starts with the query        | 90    |
//! | a word of the name/nickname starts with | 80    |
//! | substring of name, nickname or address  | 70    |
//! | fuzzy subsequence                       | ≤ 60  |
//!
//! Complexity: O(n) in the number of contacts.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};

use crate::model::contact::Contact;

const SCORE_NAME_PREFIX: i64 = 100;
const SCORE_EMAIL_PREFIX: i64 = 90;
const SCORE_WORD_PREFIX: i64 = 80;
const SCORE_SUBSTRING: i64 = 70;
const SCORE_FUZZY_MAX: i64 = 60;

/// Matching thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Hits scoring below this are dropped.
    pub min_score: i64,
    /// Maximum number of hits returned.
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_score: 30,
            max_results: 50,
        }
    }
}

/// A contact together with its match score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredContact<'a> {
    pub contact: &'a Contact,
    pub score: i64,
}

/// Ranks contacts for a query.
pub trait ContactMatcher {
    /// Matching contacts, best first. Equal scores keep contact order.
    fn search<'a>(&self, query: &str, contacts: &'a [Contact]) -> Vec<ScoredContact<'a>>;
}

/// Prefix/substring tiers with a Skim fuzzy fallback.
pub struct FuzzyContactMatcher {
    config: SearchConfig,
    matcher: SkimMatcherV2,
}

impl FuzzyContactMatcher {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }

    /// Score one contact; `query` must already be lower-case.
    fn score(&self, query: &str, contact: &Contact) -> Option<i64> {
        let name = contact.display_name.as_deref().unwrap_or("").to_lowercase();
        let nickname = contact.nickname.as_deref().unwrap_or("").to_lowercase();
        // Groups are found by name only, not by their members.
        let emails: Vec<String> = if contact.is_group() {
            Vec::new()
        } else {
            contact.emails().iter().map(|e| e.to_lowercase()).collect()
        };

        if name.starts_with(query) {
            return Some(SCORE_NAME_PREFIX);
        }
        if emails.iter().any(|e| e.starts_with(query)) {
            return Some(SCORE_EMAIL_PREFIX);
        }
        if starts_word(&name, query) || starts_word(&nickname, query) {
            return Some(SCORE_WORD_PREFIX);
        }
        if name.contains(query) || nickname.contains(query) || emails.iter().any(|e| e.contains(query)) {
            return Some(SCORE_SUBSTRING);
        }

        std::iter::once(&name)
            .chain(emails.iter())
            .filter(|field| !field.is_empty())
            .filter_map(|field| self.matcher.fuzzy_match(field, query))
            .max()
            .map(|score| score.min(SCORE_FUZZY_MAX))
    }
}

impl Default for FuzzyContactMatcher {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl ContactMatcher for FuzzyContactMatcher {
    fn search<'a>(&self, query: &str, contacts: &'a [Contact]) -> Vec<ScoredContact<'a>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<ScoredContact<'a>> = contacts
            .iter()
            .filter_map(|contact| {
                let score = self.score(&query, contact)?;
                (score >= self.config.min_score).then_some(ScoredContact { contact, score })
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(self.config.max_results);
        hits
    }
}

/// Whether any whitespace-separated word of `text` starts with `query`.
fn starts_word(text: &str, query: &str) -> bool {
    text.split_whitespace().any(|word| word.starts_with(query))
}
