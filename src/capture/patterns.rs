//! Pattern utilities
//!
//! Pure helpers shared by the classifier and platform heuristic:
//! Shannon entropy over character distributions, shared compiled regexes,
//! and character-class scans. No I/O, no state.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// URL with an explicit scheme (http/https/ftp)
pub static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?|ftp)://[^\s/$.?#].[^\s]*$").expect("valid url regex")
});

/// Bare email address
pub static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Hex color, 3/4/6/8 digit forms
pub static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("valid hex color regex")
});

/// Numeric content: optional sign, integer or decimal, optional thousands separators
pub static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$").expect("valid number regex")
});

/// data: URI prefix for images
pub static DATA_URI_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:image/[a-zA-Z+.-]+;base64,").expect("valid data uri regex"));

/// ANSI escape sequence (CSI form)
pub static ANSI_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid ansi regex"));

/// HTML opening/closing tag
pub static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?(?:div|span|p|a|html|body|head|script|style|img|ul|ol|li|table|tr|td|h[1-6])\b[^>]*>")
        .expect("valid html tag regex")
});

/// Markdown task-list line: `- [ ]` or `- [x]`
pub static MARKDOWN_TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*]\s+\[[ xX]\]\s+").expect("valid task list regex"));

/// Markdown header line
pub static MARKDOWN_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+\S").expect("valid md header regex"));

/// Unix or Windows absolute path shape
pub static ABSOLUTE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:/(?:[\w.@-]+/)*[\w.@-]+/?|[A-Za-z]:\\(?:[\w.@ -]+\\)*[\w.@ -]+\\?)$"#)
        .expect("valid path regex")
});

/// Shannon entropy of the character distribution, in bits per character.
///
/// Empty input yields 0.0. Uniformly distributed printable-random strings
/// (tokens, passwords) land well above 3.5; English prose sits around 4.0
/// over long texts but short prose fragments score lower, which is why the
/// password rule also demands mixed character classes.
pub fn shannon_entropy(content: &str) -> f64 {
    if content.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for ch in content.chars() {
        *counts.entry(ch).or_insert(0) += 1;
        total += 1;
    }

    let total = total as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Character-class summary used by the password heuristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharClasses {
    pub has_upper: bool,
    pub has_lower: bool,
    pub has_digit: bool,
    pub has_symbol: bool,
}

impl CharClasses {
    pub fn all(&self) -> bool {
        self.has_upper && self.has_lower && self.has_digit && self.has_symbol
    }
}

/// Scan content for uppercase/lowercase/digit/symbol presence.
pub fn char_classes(content: &str) -> CharClasses {
    let mut classes = CharClasses::default();
    for ch in content.chars() {
        if ch.is_ascii_uppercase() {
            classes.has_upper = true;
        } else if ch.is_ascii_lowercase() {
            classes.has_lower = true;
        } else if ch.is_ascii_digit() {
            classes.has_digit = true;
        } else if ch.is_ascii_punctuation() {
            classes.has_symbol = true;
        }
    }
    classes
}
