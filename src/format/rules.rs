//! Per-client `mailto:` formatting rules.
//!
//! Email clients disagree about how a `mailto:` URI with several named
//! recipients should look. Each client gets a [`ClientFormatRules`] value;
//! a [`RuleTable`] maps client identifiers (usually bundle IDs, matched as
//! shell-style globs) to rule sets and always carries a default.
//!
//! The built-in table lives in `client_rules.toml` at the crate root and is
//! compiled into the binary. User overrides come from the `[rules]` section
//! of the config file and are tried before the built-in entries.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MailtoError, Result};

const BUILTIN_RULES: &str = include_str!("../../client_rules.toml");

/// Quirk switches for one email client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientFormatRules {
    /// Delimit recipients with `", "` instead of `","`.
    #[serde(rename = "spaces")]
    pub use_spaces: bool,
    /// Include recipient names at all.
    #[serde(rename = "names")]
    pub use_names: bool,
    /// RFC 2047-encode non-ASCII names (and percent-encode the result).
    #[serde(rename = "mime")]
    pub use_mime_encoding: bool,
    /// Fall back to the bare address when a name contains a comma,
    /// instead of quoting the name.
    #[serde(rename = "no_commas")]
    pub escape_commas_in_names: bool,
    /// `mailto:addr` rather than `mailto:?to=addr`.
    #[serde(rename = "inline_to")]
    pub inline_recipients: bool,
}

impl Default for ClientFormatRules {
    fn default() -> Self {
        Self {
            use_spaces: true,
            use_names: true,
            use_mime_encoding: true,
            escape_commas_in_names: false,
            inline_recipients: false,
        }
    }
}

/// One `[[clients]]` entry: a glob and the rules for clients it matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRule {
    pub pattern: String,
    #[serde(flatten)]
    pub rules: ClientFormatRules,
}

/// Serialized shape of a rule table. `default` may be absent in a user
/// override; a complete table must have one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTableConfig {
    pub default: Option<ClientFormatRules>,
    pub clients: Vec<ClientRule>,
}

/// Immutable lookup table from client identifier to rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    clients: Vec<ClientRule>,
    default: ClientFormatRules,
}

impl RuleTable {
    /// Build a table, failing if no default rule set is present.
    pub fn from_config(config: RuleTableConfig) -> Result<Self> {
        let default = config.default.ok_or(MailtoError::MissingDefaultRules)?;
        Ok(Self {
            clients: config.clients,
            default,
        })
    }

    /// Parse a complete table from TOML text.
    pub fn from_toml(origin: &str, text: &str) -> Result<Self> {
        let config: RuleTableConfig =
            toml::from_str(text).map_err(|e| MailtoError::InvalidRules {
                origin: origin.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_config(config)
    }

    /// The table compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml("built-in client_rules.toml", BUILTIN_RULES)
    }

    /// The built-in table with user overrides layered on top.
    pub fn with_overrides(overrides: &RuleTableConfig) -> Result<Self> {
        let builtin = Self::builtin()?;
        let mut clients = overrides.clients.clone();
        clients.extend(builtin.clients);
        Ok(Self {
            clients,
            default: overrides.default.unwrap_or(builtin.default),
        })
    }

    /// Rules for `client`: first matching pattern wins, default otherwise.
    ///
    /// `None` (no client selected) always yields the default.
    pub fn lookup(&self, client: Option<&str>) -> &ClientFormatRules {
        let Some(client) = client else {
            return &self.default;
        };
        match self
            .clients
            .iter()
            .find(|entry| glob_match(&entry.pattern, client))
        {
            Some(entry) => {
                debug!(client, pattern = %entry.pattern, "Matched client rules");
                &entry.rules
            }
            None => {
                debug!(client, "No client-specific rules, using default");
                &self.default
            }
        }
    }

    pub fn default_rules(&self) -> &ClientFormatRules {
        &self.default
    }

    pub fn clients(&self) -> &[ClientRule] {
        &self.clients
    }
}

/// Shell-style wildcard match: `*`, `?`, `[abc]`, `[a-z]` and `[!abc]`.
///
/// Matching is case-sensitive, like bundle identifiers. As in `fnmatch`,
/// only `!` negates a class; `[^a]` matches `^` or `a`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob_match_at(&pattern, &text)
}

fn glob_match_at(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Position of the last `*` and the text index it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    backtrack = Some((p, t));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    t += 1;
                    continue;
                }
                '[' => {
                    if let Some((matched, next)) = match_class(pattern, p, text[t]) {
                        if matched {
                            p = next;
                            t += 1;
                            continue;
                        }
                    } else if text[t] == '[' {
                        // Unterminated class: treat `[` literally
                        p += 1;
                        t += 1;
                        continue;
                    }
                }
                c if c == text[t] => {
                    p += 1;
                    t += 1;
                    continue;
                }
                _ => {}
            }
        }
        match backtrack {
            Some((star_p, star_t)) => {
                backtrack = Some((star_p, star_t + 1));
                p = star_p + 1;
                t = star_t + 1;
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Match `ch` against the class starting at `pattern[start] == '['`.
///
/// Returns whether it matched and the index after the closing `]`, or
/// `None` if the class is unterminated.
fn match_class(pattern: &[char], start: usize, ch: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negated = pattern.get(i) == Some(&'!');
    if negated {
        i += 1;
    }
    let mut matched = false;
    let mut first = true;
    while i < pattern.len() {
        let c = pattern[i];
        if c == ']' && !first {
            return Some((matched != negated, i + 1));
        }
        first = false;
        if pattern.get(i + 1) == Some(&'-') && pattern.get(i + 2).is_some_and(|&e| e != ']') {
            let end = pattern[i + 2];
            if c <= ch && ch <= end {
                matched = true;
            }
            i += 3;
        } else {
            if c == ch {
                matched = true;
            }
            i += 1;
        }
    }
    None
}
