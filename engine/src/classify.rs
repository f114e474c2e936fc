//! Response classification.
//!
//! Pure functions shared by the cascade: cache-key derivation, response
//! cleanup, and refusal detection. A refusal is a well-formed response whose
//! payload declines to translate; it is classified here but handled by the
//! cascade (advance to the next strategy), never surfaced as an error.

use regex::Regex;
use std::sync::OnceLock;

/// Boilerplate lead-in phrases models like to prepend to translations.
/// Matched case-insensitively against the start of the response.
const BOILERPLATE_PREFIXES: &[&str] = &[
    "here is the translation:",
    "here's the translation:",
    "here is the translated text:",
    "here's the translated text:",
    "the translation is:",
    "translated text:",
    "translation:",
    "sure, here is the translation:",
    "sure! here's the translation:",
];

/// Quote pairs stripped from around a response, one layer per pass.
const QUOTE_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('\u{201c}', '\u{201d}'), // “ ”
    ('\u{2018}', '\u{2019}'), // ‘ ’
    ('\u{300c}', '\u{300d}'), // 「 」
];

static TAG_PATTERN: OnceLock<Regex> = OnceLock::new();
static REFUSAL_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn tag_pattern() -> &'static Regex {
    TAG_PATTERN.get_or_init(|| {
        Regex::new(r"</?[a-zA-Z][a-zA-Z0-9]*(?:\s[^<>]*)?/?>").expect("Invalid tag pattern")
    })
}

fn refusal_patterns() -> &'static Vec<Regex> {
    REFUSAL_PATTERNS.get_or_init(|| {
        vec![
            // Anchored openers: the response starts by declining.
            Regex::new(r"(?i)^i\s+cannot\b").expect("Invalid refusal pattern"),
            Regex::new(r"(?i)^i\s+can't\b").expect("Invalid refusal pattern"),
            Regex::new(r"(?i)^i\s+won't\b").expect("Invalid refusal pattern"),
            Regex::new(r"(?i)^i\s+will\s+not\b").expect("Invalid refusal pattern"),
            Regex::new(r"(?i)^i(?:'m| am)\s+unable\s+to\b").expect("Invalid refusal pattern"),
            Regex::new(r"(?i)^i(?:'m| am)\s+sorry,?\s+but\b").expect("Invalid refusal pattern"),
            Regex::new(r"(?i)^i\s+apologize,?\s+but\b").expect("Invalid refusal pattern"),
            Regex::new(r"(?i)^sorry,?\s+(?:but\s+)?i\s+can(?:not|'t)\b")
                .expect("Invalid refusal pattern"),
            Regex::new(r"(?i)^as\s+an\s+ai\b").expect("Invalid refusal pattern"),
            // Unanchored phrases that only appear in refusals.
            Regex::new(r"(?i)i(?:'m| am)\s+not\s+able\s+to\s+translate")
                .expect("Invalid refusal pattern"),
            Regex::new(r"(?i)cannot\s+assist\s+with\s+(?:that|this)\s+request")
                .expect("Invalid refusal pattern"),
            Regex::new(r"(?i)against\s+my\s+(?:guidelines|content\s+policy)")
                .expect("Invalid refusal pattern"),
        ]
    })
}

/// Derive the semantic identity of a translation request.
///
/// Two requests with identical text/context/instructions are the same
/// request regardless of other metadata. Known limitation: the fixed `|`
/// delimiter is not escaped, so inputs containing `|` at field boundaries
/// can collide; normal prompts do not contain such sequences.
pub fn cache_key(text: &str, context: &str, instructions: &str) -> String {
    format!("{}|{}|{}", instructions, context, text)
}

/// Clean a raw backend response down to the bare translation.
///
/// Strips fenced code-block delimiters, known boilerplate lead-ins,
/// HTML-like tags, and one layer of surrounding quotes per pass, then trims.
/// Passes are applied until the text stops changing, so the function is
/// idempotent: `clean_response(clean_response(x)) == clean_response(x)`.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    // Stripping one artifact can expose another (a quoted boilerplate
    // lead-in, a fence inside quotes). Iterate to a fixpoint: every pass
    // only removes characters, so a changing pass strictly shrinks the
    // text and the loop terminates.
    loop {
        let next = clean_pass(&text);
        if next == text {
            break;
        }
        text = next;
    }

    text
}

fn clean_pass(input: &str) -> String {
    let mut text = input.trim().to_string();

    // Fenced code block: drop the opening fence line and the closing fence.
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.split_once('\n') {
            Some((_lang, body)) => body.to_string(),
            None => rest.to_string(),
        };
    }
    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        text = stripped.to_string();
    }
    text = text.trim().to_string();

    // Boilerplate lead-ins, case-insensitive prefix match.
    let lowered = text.to_lowercase();
    for prefix in BOILERPLATE_PREFIXES {
        if lowered.starts_with(prefix) {
            text = text[prefix.len()..].trim_start().to_string();
            break;
        }
    }

    // HTML-like tags.
    if text.contains('<') {
        text = tag_pattern().replace_all(&text, "").into_owned();
    }

    // One layer of surrounding quotes.
    text = strip_outer_quotes(text.trim()).to_string();

    // Leading blank lines, trailing whitespace.
    text.trim_start_matches(['\n', '\r'])
        .trim()
        .to_string()
}

fn strip_outer_quotes(text: &str) -> &str {
    let mut chars = text.chars();
    let (first, last) = match (chars.next(), text.chars().next_back()) {
        (Some(f), Some(l)) => (f, l),
        _ => return text,
    };
    if text.chars().count() < 2 {
        return text;
    }

    for &(open, close) in QUOTE_PAIRS {
        if first == open && last == close {
            return &text[open.len_utf8()..text.len() - close.len_utf8()];
        }
    }
    text
}

/// Classify a cleaned response as a policy refusal.
///
/// Refusals are successful exchanges with an unacceptable payload: the
/// cascade advances to the next strategy instead of retrying.
pub fn is_refusal(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    refusal_patterns().iter().any(|p| p.is_match(trimmed))
}
