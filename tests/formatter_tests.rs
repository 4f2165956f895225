//! Integration tests for mailto: URI formatting and client rules.

use std::path::Path;

use mailto::format::rules::RuleTableConfig;
use mailto::format::{ClientFormatRules, Formatter, MailtoUrl, RuleTable};
use mailto::model::address::Recipient;
use percent_encoding::percent_decode_str;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Parse a decoded recipient section as a `To:` header with mail-parser.
fn parse_to_header(section: &str) -> Vec<(Option<String>, Option<String>)> {
    let raw = format!("To: {section}\n\n");
    let message = mail_parser::MessageParser::default()
        .parse(raw.as_bytes())
        .expect("parse header");
    message
        .to()
        .and_then(|addr| addr.as_list())
        .map(|list| {
            list.iter()
                .map(|a| (a.name().map(str::to_string), a.address().map(str::to_string)))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_named_recipient_roundtrip() {
    let rules = ClientFormatRules::default();
    let recipients = [Recipient::new("Bob Test", "bob@example.com")];
    let url = Formatter::new(&rules).format(&recipients, true, None);
    assert_eq!(url.as_str(), "mailto:?to=Bob Test <bob@example.com>");
    assert_eq!(url.recipients(), recipients);
}

#[test]
fn test_formatting_is_deterministic() {
    let rules = ClientFormatRules::default();
    let recipients = [
        Recipient::new("Jürgen Probe", "probi@example.com"),
        Recipient::new("Probe, Heinrich, Dr.", "heini@example.com"),
        Recipient::bare("sue@example.com"),
    ];
    let first = Formatter::new(&rules).format(&recipients, true, Some("Hi"));
    let second = Formatter::new(&rules).format(&recipients, true, Some("Hi"));
    assert_eq!(first, second);
}

#[test]
fn test_spaces_rule_controls_separator() {
    let recipients = [
        Recipient::bare("a@example.com"),
        Recipient::bare("b@example.com"),
        Recipient::bare("c@example.com"),
    ];

    let spaced = ClientFormatRules::default();
    assert_eq!(
        Formatter::new(&spaced).format(&recipients, true, None).as_str(),
        "mailto:?to=a@example.com, b@example.com, c@example.com"
    );

    let tight = ClientFormatRules {
        use_spaces: false,
        ..ClientFormatRules::default()
    };
    assert_eq!(
        Formatter::new(&tight).format(&recipients, true, None).as_str(),
        "mailto:?to=a@example.com,b@example.com,c@example.com"
    );
}

#[test]
fn test_mime_names_decode_with_mail_parser() {
    let rules = ClientFormatRules::default();
    let url = Formatter::new(&rules).format(
        &[
            Recipient::new("Jürgen Probe", "probi@example.com"),
            Recipient::new("日本語", "nihongo@example.jp"),
        ],
        true,
        None,
    );

    let section = percent_decode_str(url.recipient_section()).decode_utf8_lossy();
    let parsed = parse_to_header(&section);
    assert_eq!(
        parsed,
        vec![
            (
                Some("Jürgen Probe".to_string()),
                Some("probi@example.com".to_string())
            ),
            (
                Some("日本語".to_string()),
                Some("nihongo@example.jp".to_string())
            ),
        ]
    );

    // Our own inspection agrees
    assert_eq!(
        url.recipients(),
        vec![
            Recipient::new("Jürgen Probe", "probi@example.com"),
            Recipient::new("日本語", "nihongo@example.jp"),
        ]
    );
}

#[test]
fn test_quoted_comma_name_parses_as_one_address() {
    let rules = ClientFormatRules::default();
    let url = Formatter::new(&rules).format(
        &[
            Recipient::new("Probe, Heinrich, Dr.", "heini@example.com"),
            Recipient::bare("sue@example.com"),
        ],
        true,
        None,
    );
    let parsed = parse_to_header(url.recipient_section());
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].0.as_deref(), Some("Probe, Heinrich, Dr."));
    assert_eq!(url.recipients()[0].name.as_deref(), Some("Probe, Heinrich, Dr."));
}

#[test]
fn test_builtin_client_quirks() {
    let table = RuleTable::builtin().expect("builtin rules");
    let recipients = [
        Recipient::new("Bob Test", "bob@example.com"),
        Recipient::new("Jürgen Probe", "probi@example.com"),
    ];

    let airmail = table.lookup(Some("it.bloop.airmail2"));
    assert_eq!(
        Formatter::new(airmail).format(&recipients, true, None).as_str(),
        "mailto:?to=bob@example.com,probi@example.com"
    );

    let mailbox = table.lookup(Some("com.orchestra.Mailbox"));
    assert_eq!(
        Formatter::new(mailbox).format(&recipients, true, None).as_str(),
        "mailto:Bob Test <bob@example.com>, Jürgen Probe <probi@example.com>"
    );

    let unknown = table.lookup(Some("com.apple.mail"));
    assert_eq!(unknown, table.default_rules());
}

#[test]
fn test_user_rules_layer_over_builtin() {
    let text = std::fs::read_to_string(fixture("user_rules.toml")).expect("read fixture");
    let overrides: RuleTableConfig = toml::from_str(&text).expect("parse fixture");
    let table = RuleTable::with_overrides(&overrides).expect("rule table");

    let inline = table.lookup(Some("org.example.Inline2"));
    assert!(inline.inline_recipients);
    assert!(inline.use_spaces);

    // User default replaces the built-in one
    let fallback = table.lookup(Some("com.apple.mail"));
    assert!(!fallback.use_spaces);
    assert!(fallback.escape_commas_in_names);

    // Built-in entries still apply
    assert!(!table.lookup(Some("it.bloop.airmail2")).use_names);

    let url = Formatter::new(fallback).format(
        &[
            Recipient::new("Bob Test", "bob@example.com"),
            Recipient::new("Probe, Heinrich, Dr.", "heini@example.com"),
        ],
        true,
        None,
    );
    assert_eq!(
        url.as_str(),
        "mailto:?to=Bob Test <bob@example.com>,heini@example.com"
    );
}

#[test]
fn test_inspect_foreign_uri() {
    let url = MailtoUrl::new("mailto:bob@example.com?subject=Quarterly%20report&body=x");
    assert_eq!(url.recipients(), vec![Recipient::bare("bob@example.com")]);
    assert_eq!(url.subject().as_deref(), Some("Quarterly report"));
}
