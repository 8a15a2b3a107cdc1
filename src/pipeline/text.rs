//! Text cleanup: deterministic normalisation of record fields.
//!
//! Recipe apps store whatever the user pasted: Windows line endings from a
//! web clipping, zero-width spaces from a blog, trailing tabs from a
//! spreadsheet. These passes run on every field before rendering so the
//! printed page only sees clean, predictable text.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so per-line rules see `\n` only, and
//! invisible characters are stripped before the blank-line test so a line
//! holding just a zero-width space counts as blank.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean a free-text field (notes, description).
///
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 1
/// 5. Trim the whole field
pub fn clean_block(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

/// Clean a single-line field (name, times, servings).
///
/// Internal whitespace runs, including newlines, collapse to one space.
pub fn clean_inline(input: &str) -> String {
    let s = remove_invisible_chars(input);
    RE_WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Split a multi-line field into its non-blank lines, each trimmed.
pub fn split_lines(input: &str) -> Vec<String> {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    s.split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a comma- or newline-separated list (categories).
pub fn split_list(input: &str) -> Vec<String> {
    let s = remove_invisible_chars(input);
    s.split([',', '\n', '\r'])
        .map(clean_inline)
        .filter(|c| !c.is_empty())
        .collect()
}

/// Lowercase ASCII slug for HTML anchors: runs of anything other than
/// `[a-z0-9]` become a single `-`. May be empty for non-Latin names.
pub fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();
    RE_NON_SLUG
        .replace_all(&lower, "-")
        .trim_matches('-')
        .chars()
        .take(48)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static RE_NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
