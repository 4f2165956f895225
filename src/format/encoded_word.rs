//! RFC 2047 encoded-words for display names.
//!
//! Encoding picks whichever of the `Q` and `B` forms is shorter, mirroring
//! what most mail user agents do for a UTF-8 phrase. Decoding accepts any
//! charset `encoding_rs` knows about.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

/// Maximum length of one encoded-word, delimiters included (RFC 2047 §2).
const MAX_WORD_LEN: usize = 75;

/// `=?utf-8?q?` + `?=`
const WORD_OVERHEAD: usize = 12;

const MAX_PAYLOAD: usize = MAX_WORD_LEN - WORD_OVERHEAD;

/// Encode `text` as one or more UTF-8 encoded-words separated by a space.
///
/// Example: `"Jürgen Probe"` → `"=?utf-8?q?J=C3=BCrgen_Probe?="`
pub fn encode_phrase(text: &str) -> String {
    let q_len: usize = text.chars().map(q_char_len).sum();
    let b_len = text.len().div_ceil(3) * 4;

    if b_len < q_len {
        encode_b(text)
    } else {
        encode_q(text)
    }
}

fn encode_q(text: &str) -> String {
    let mut words = Vec::new();
    let mut payload = String::new();
    for ch in text.chars() {
        let encoded = q_encode_char(ch);
        if !payload.is_empty() && payload.len() + encoded.len() > MAX_PAYLOAD {
            words.push(format!("=?utf-8?q?{payload}?="));
            payload.clear();
        }
        payload.push_str(&encoded);
    }
    if !payload.is_empty() {
        words.push(format!("=?utf-8?q?{payload}?="));
    }
    words.join(" ")
}

fn encode_b(text: &str) -> String {
    // 45 input bytes → 60 base64 chars, the largest multiple of 3 that fits.
    let max_bytes = MAX_PAYLOAD / 4 * 3;
    let mut words = Vec::new();
    let mut chunk_start = 0;
    let mut chunk_len = 0;
    for ch in text.chars() {
        if chunk_len + ch.len_utf8() > max_bytes {
            let chunk = &text[chunk_start..chunk_start + chunk_len];
            words.push(format!("=?utf-8?b?{}?=", STANDARD.encode(chunk)));
            chunk_start += chunk_len;
            chunk_len = 0;
        }
        chunk_len += ch.len_utf8();
    }
    if chunk_len > 0 {
        let chunk = &text[chunk_start..chunk_start + chunk_len];
        words.push(format!("=?utf-8?b?{}?=", STANDARD.encode(chunk)));
    }
    words.join(" ")
}

/// Characters allowed verbatim in a `Q`-encoded phrase (RFC 2047 §5 rule 3).
fn is_q_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'!' | b'*' | b'+' | b'-' | b'/')
}

fn q_char_len(ch: char) -> usize {
    if ch == ' ' || (ch.is_ascii() && is_q_safe(ch as u8)) {
        1
    } else {
        ch.len_utf8() * 3
    }
}

fn q_encode_char(ch: char) -> String {
    if ch == ' ' {
        return "_".to_string();
    }
    let mut buf = [0u8; 4];
    ch.encode_utf8(&mut buf)
        .bytes()
        .map(|b| {
            if is_q_safe(b) {
                (b as char).to_string()
            } else {
                format!("={b:02X}")
            }
        })
        .collect()
}

/// Decode RFC 2047 encoded words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Tokens that fail to decode are kept as they are.
pub fn decode_encoded_words(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // Whitespace between two adjacent encoded words is dropped (RFC 2047 §6.2)
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];

        if let Some((text, consumed)) = decode_one_word(after_start) {
            result.push_str(&text);
            remaining = &after_start[consumed..];
            last_was_encoded = true;
        } else {
            result.push_str("=?");
            remaining = after_start;
            last_was_encoded = false;
        }
    }

    result.push_str(remaining);
    result
}

/// Decode `charset?encoding?text?=`, returning the text and bytes consumed.
fn decode_one_word(s: &str) -> Option<(String, usize)> {
    let (charset, rest) = s.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let encoded_text = &rest[..end];

    let consumed = charset.len() + 1 + encoding.len() + 1 + end + 2;

    let bytes = match encoding {
        "B" | "b" => STANDARD.decode(encoded_text).ok()?,
        "Q" | "q" => decode_q(encoded_text),
        _ => return None,
    };

    Some((decode_charset(charset, &bytes), consumed))
}

/// Underscores → spaces, `=XX` → byte.
fn decode_q(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(byte) => {
                        result.push(byte);
                        i += 3;
                    }
                    Err(_) => {
                        result.push(b'=');
                        i += 1;
                    }
                }
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    result
}

fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    // RFC 2231 language suffix: utf-8*en
    let label = charset.split('*').next().unwrap_or(charset);
    match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(encoding) => encoding.decode(bytes).0.into_owned(),
        None => {
            warn!(charset = label, "Unknown charset, falling back to UTF-8 lossy");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_prefers_q_for_mostly_ascii() {
        assert_eq!(encode_phrase("Jürgen Probe"), "=?utf-8?q?J=C3=BCrgen_Probe?=");
    }

    #[test]
    fn test_encode_prefers_b_for_mostly_non_ascii() {
        let encoded = encode_phrase("日本語");
        assert_eq!(encoded, "=?utf-8?b?5pel5pys6Kqe?=");
    }

    #[test]
    fn test_encode_q_escapes_commas_and_specials() {
        let encoded = encode_phrase("Müller, Hans_Peter Johann");
        assert!(encoded.starts_with("=?utf-8?q?"));
        assert!(!encoded.contains(','));
        assert!(encoded.contains("=2C"));
        assert!(encoded.contains("=5F"));
    }

    #[test]
    fn test_long_phrase_is_split_into_short_words() {
        let name = "Ünïcödé ".repeat(12);
        let encoded = encode_phrase(name.trim_end());
        let words: Vec<&str> = encoded.split(' ').collect();
        assert!(words.len() > 1);
        for word in &words {
            assert!(word.len() <= MAX_WORD_LEN, "word too long: {word}");
        }
        assert_eq!(decode_encoded_words(&encoded), name.trim_end());
    }

    #[test]
    fn test_decode_base64_encoded_word() {
        assert_eq!(decode_encoded_words("=?UTF-8?B?SG9sYSBtdW5kbw==?="), "Hola mundo");
    }

    #[test]
    fn test_decode_q_encoded_word() {
        assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?caf=E9?="), "café");
    }

    #[test]
    fn test_decode_trailing_escape() {
        assert_eq!(decode_encoded_words("=?utf-8?q?caf=C3=A9?="), "café");
    }

    #[test]
    fn test_decode_mixed_plain_and_encoded() {
        assert_eq!(
            decode_encoded_words("Re: =?UTF-8?Q?caf=C3=A9?= time"),
            "Re: café time"
        );
    }

    #[test]
    fn test_decode_leaves_garbage_alone() {
        assert_eq!(decode_encoded_words("=?broken"), "=?broken");
    }
}
