//! `mailto:` URI construction (RFC 6068) and inspection.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::encoded_word::{decode_encoded_words, encode_phrase};
use super::rules::ClientFormatRules;
use crate::model::address::Recipient;

/// Everything but RFC 3986 unreserved characters.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// As [`QUERY_VALUE`], but `@` stays legible.
const QUERY_VALUE_KEEP_AT: &AsciiSet = &QUERY_VALUE.remove(b'@');

/// Characters that end or corrupt a `mailto:` component if left raw.
const URI_DELIMITERS: &AsciiSet = &CONTROLS.add(b'&').add(b'#').add(b'?').add(b'%');

/// How the recipient list is percent-encoded when encoding is required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapePolicy {
    /// Percent-encode `@` as `%40`.
    pub escape_at: bool,
}

impl EscapePolicy {
    fn recipient_set(&self) -> &'static AsciiSet {
        if self.escape_at {
            QUERY_VALUE
        } else {
            QUERY_VALUE_KEEP_AT
        }
    }
}

/// A finished `mailto:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MailtoUrl(String);

impl MailtoUrl {
    /// Wrap an existing URI, e.g. one passed on the command line.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw (still encoded) recipient section: the URI path, or the
    /// value of the first `to=` parameter when the path is empty.
    pub fn recipient_section(&self) -> &str {
        let rest = self.0.strip_prefix("mailto:").unwrap_or(&self.0);
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        if !path.is_empty() {
            return path;
        }
        query
            .into_iter()
            .flat_map(|q| q.split('&'))
            .find_map(|param| param.strip_prefix("to="))
            .unwrap_or("")
    }

    /// Decode the recipient list back into recipients, undoing percent-
    /// and RFC 2047 encoding.
    pub fn recipients(&self) -> Vec<Recipient> {
        let decoded = percent_decode_str(self.recipient_section()).decode_utf8_lossy();
        Recipient::parse_list(&decoded)
            .into_iter()
            .map(|r| Recipient {
                name: r.name.map(|n| decode_encoded_words(&n)),
                email: r.email,
            })
            .collect()
    }

    /// The decoded `subject` parameter, if any.
    pub fn subject(&self) -> Option<String> {
        let (_, query) = self.0.split_once('?')?;
        query
            .split('&')
            .find_map(|param| param.strip_prefix("subject="))
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
    }
}

impl std::fmt::Display for MailtoUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders recipients into a `mailto:` URI for one client's rules.
#[derive(Debug, Clone, Copy)]
pub struct Formatter<'a> {
    rules: &'a ClientFormatRules,
    escape: EscapePolicy,
}

impl<'a> Formatter<'a> {
    pub fn new(rules: &'a ClientFormatRules) -> Self {
        Self {
            rules,
            escape: EscapePolicy::default(),
        }
    }

    pub fn with_escape_policy(mut self, escape: EscapePolicy) -> Self {
        self.escape = escape;
        self
    }

    /// Build the URI.
    ///
    /// `include_names` is the caller's preference and is ANDed with the
    /// client's `use_names` rule.
    pub fn format(
        &self,
        recipients: &[Recipient],
        include_names: bool,
        subject: Option<&str>,
    ) -> MailtoUrl {
        let use_names = self.rules.use_names && include_names;
        let mut needs_quoting = false;

        let tokens: Vec<String> = recipients
            .iter()
            .map(|recipient| {
                let (token, encoded) = self.render(recipient, use_names);
                needs_quoting |= encoded;
                token
            })
            .collect();

        let separator = if self.rules.use_spaces { ", " } else { "," };
        let mut joined = tokens.join(separator);
        joined = if needs_quoting {
            utf8_percent_encode(&joined, self.escape.recipient_set()).to_string()
        } else {
            escape_delimiters(&joined)
        };

        let subject = subject
            .filter(|s| !s.is_empty())
            .map(|s| utf8_percent_encode(s, QUERY_VALUE).to_string());

        let uri = match (self.rules.inline_recipients, subject) {
            (true, None) => format!("mailto:{joined}"),
            (true, Some(subject)) => format!("mailto:{joined}?subject={subject}"),
            (false, None) => format!("mailto:?to={joined}"),
            (false, Some(subject)) => format!("mailto:?to={joined}&subject={subject}"),
        };
        debug!(uri = %uri, recipients = recipients.len(), "Built mailto URI");
        MailtoUrl(uri)
    }

    /// Render one recipient. The flag reports whether MIME encoding fired.
    fn render(&self, recipient: &Recipient, use_names: bool) -> (String, bool) {
        let email = recipient.email.as_str();
        let name = match recipient.name.as_deref() {
            Some(name) if use_names && !name.is_empty() && name != email => name,
            _ => {
                debug!(email, use_names, "Using bare address");
                return (email.to_string(), false);
            }
        };

        let mut encoded = false;
        let mut name = name.to_string();
        if self.rules.use_mime_encoding && !name.is_ascii() {
            name = encode_phrase(&name);
            encoded = true;
        }

        if name.contains(',') {
            if self.rules.escape_commas_in_names {
                debug!(email, "Name contains a comma, using bare address");
                return (email.to_string(), encoded);
            }
            name = quote(&name);
        }

        (format!("{name} <{email}>"), encoded)
    }
}

/// Percent-encode [`URI_DELIMITERS`] only. Spaces and non-ASCII text stay
/// raw for clients that read the list literally.
fn escape_delimiters(list: &str) -> String {
    let mut out = String::with_capacity(list.len());
    let mut buf = [0u8; 4];
    for ch in list.chars() {
        if ch.is_ascii() {
            out.extend(utf8_percent_encode(ch.encode_utf8(&mut buf), URI_DELIMITERS));
        } else {
            out.push(ch);
        }
    }
    out
}

/// RFC 5322 quoted-string.
fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}
