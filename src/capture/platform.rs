//! Source platform heuristic
//!
//! Guesses the class of application a piece of clipboard text came from by
//! scanning for platform-specific textual fingerprints. Best-effort: never
//! fails, degrades to `Unknown` at low confidence.

use regex::Regex;
use std::sync::LazyLock;

use super::patterns::{
    ABSOLUTE_PATH_RE, ANSI_ESCAPE_RE, HTML_TAG_RE, MARKDOWN_HEADER_RE, MARKDOWN_TASK_RE,
};

/// Confidence reported when nothing matched
pub const UNKNOWN_CONFIDENCE: u8 = 20;

/// Confidence when weak indicators accumulate around an editor signal
const EDITOR_BOOST_CONFIDENCE: u8 = 70;

/// Application class a clipboard item likely originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Editor,
    Terminal,
    Browser,
    Notes,
    FileManager,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Editor => "Editor",
            Platform::Terminal => "Terminal",
            Platform::Browser => "Browser",
            Platform::Notes => "Notes",
            Platform::FileManager => "Files",
            Platform::Unknown => "Unknown",
        }
    }
}

/// Outcome of the platform scan: a guess, how sure we are, and which
/// fingerprints fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformGuess {
    pub platform: Platform,
    pub confidence: u8,
    pub indicators: Vec<String>,
}

/// Vim-style write command naming a source file (`:w src/main.rs`)
static EDITOR_WRITE_CMD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^:w[aq]?!?\s+\S+\.(rs|py|js|ts|tsx|jsx|go|c|h|cpp|hpp|java|kt|rb|swift|sh|toml|yaml|yml|json|md)\b")
        .expect("valid write cmd regex")
});

/// Editor launch command naming a source file (`code src/lib.rs`)
static EDITOR_OPEN_CMD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(vim?|nvim|code|subl|nano|emacs|hx)\s+\S+\.\w{1,4}\b")
        .expect("valid open cmd regex")
});

/// Shell prompt at line start (`$ `, `% `, `❯ `, `PS C:\>`).
/// `#` is deliberately absent: it collides with markdown headers.
static SHELL_PROMPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\$|%|❯)\s+\S|^PS [A-Za-z]:\\").expect("valid prompt regex")
});

/// Bare URL anywhere in the content (weak browser hint)
static URL_ANYWHERE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("valid url-anywhere regex"));

/// DOM API references (weak browser/devtools hint)
static DOM_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(document\.|window\.|getElementById|querySelector|addEventListener)")
        .expect("valid dom regex")
});

/// Hashtag at a word boundary (weak notes/social hint)
static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)#[A-Za-z][\w-]*").expect("valid hashtag regex"));

/// Source-file extension token (weak editor/project hint)
static SOURCE_FILE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[\w/-]+\.(rs|py|js|ts|tsx|go|cpp|java|rb|swift)\b")
        .expect("valid source token regex")
});

/// Import/module statement (weak editor/project hint)
static IMPORT_STMT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(use\s+[\w:]+;|import\s+[\w.{}, ]+|from\s+[\w.]+\s+import|#include\s*<)"#)
        .expect("valid import regex")
});

/// Scan content for platform fingerprints. Pure and total.
///
/// Definitive fingerprints are checked in priority order and win outright;
/// weaker signals only accumulate as indicators. When two or more weak
/// editor/project signals pile up without a definitive match, the guess is
/// boosted to Editor at confidence 70. With nothing at all, Unknown at 20.
pub fn detect_platform(content: &str) -> PlatformGuess {
    // Weak signals first so every outcome carries the full indicator trail
    let mut indicators: Vec<String> = Vec::new();
    let mut editor_hints = 0usize;

    if URL_ANYWHERE_RE.is_match(content) {
        indicators.push("url-present".to_string());
    }
    if DOM_TOKEN_RE.is_match(content) {
        indicators.push("dom-reference".to_string());
    }
    if HASHTAG_RE.is_match(content) {
        indicators.push("hashtag".to_string());
    }
    if MARKDOWN_HEADER_RE.is_match(content) {
        indicators.push("markdown-header".to_string());
    }
    if SOURCE_FILE_TOKEN_RE.is_match(content) {
        indicators.push("source-file-token".to_string());
        editor_hints += 1;
    }
    if IMPORT_STMT_RE.is_match(content) {
        indicators.push("import-statement".to_string());
        editor_hints += 1;
    }

    let definitive = |platform: Platform, confidence: u8, fingerprint: &str| {
        let mut all = vec![fingerprint.to_string()];
        all.extend(indicators.iter().cloned());
        PlatformGuess {
            platform,
            confidence,
            indicators: all,
        }
    };

    if EDITOR_WRITE_CMD_RE.is_match(content) {
        return definitive(Platform::Editor, 90, "editor-write-command");
    }
    if EDITOR_OPEN_CMD_RE.is_match(content) {
        return definitive(Platform::Editor, 85, "editor-open-command");
    }
    if ANSI_ESCAPE_RE.is_match(content) {
        return definitive(Platform::Terminal, 85, "ansi-escape");
    }
    if SHELL_PROMPT_RE.is_match(content) {
        return definitive(Platform::Terminal, 80, "shell-prompt");
    }
    if HTML_TAG_RE.is_match(content) {
        return definitive(Platform::Browser, 75, "html-tag");
    }
    if let Some(first_line) = content.lines().next() {
        if ABSOLUTE_PATH_RE.is_match(first_line.trim()) {
            return definitive(Platform::FileManager, 70, "absolute-path");
        }
    }
    if MARKDOWN_TASK_RE.is_match(content) {
        return definitive(Platform::Notes, 75, "markdown-task-list");
    }

    if editor_hints >= 2 {
        return PlatformGuess {
            platform: Platform::Editor,
            confidence: EDITOR_BOOST_CONFIDENCE,
            indicators,
        };
    }

    PlatformGuess {
        platform: Platform::Unknown,
        confidence: UNKNOWN_CONFIDENCE,
        indicators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_write_command() {
        let guess = detect_platform(":w src/main.rs");
        assert_eq!(guess.platform, Platform::Editor);
        assert_eq!(guess.confidence, 90);
        assert!(guess.indicators.contains(&"editor-write-command".to_string()));
    }

    #[test]
    fn test_editor_open_command() {
        let guess = detect_platform("code src/lib.rs");
        assert_eq!(guess.platform, Platform::Editor);
        assert_eq!(guess.confidence, 85);
    }

    #[test]
    fn test_ansi_escape_means_terminal() {
        let guess = detect_platform("\x1b[32mPASS\x1b[0m all tests green");
        assert_eq!(guess.platform, Platform::Terminal);
        assert_eq!(guess.confidence, 85);
    }

    #[test]
    fn test_shell_prompt_means_terminal() {
        let guess = detect_platform("$ cargo build --release");
        assert_eq!(guess.platform, Platform::Terminal);
        assert_eq!(guess.confidence, 80);
    }

    #[test]
    fn test_html_tags_mean_browser() {
        let guess = detect_platform("<div class=\"header\"><span>Hello</span></div>");
        assert_eq!(guess.platform, Platform::Browser);
        assert_eq!(guess.confidence, 75);
    }

    #[test]
    fn test_absolute_path_first_line() {
        let guess = detect_platform("/Users/dev/projects/notes.txt");
        assert_eq!(guess.platform, Platform::FileManager);
        assert_eq!(guess.confidence, 70);
    }

    #[test]
    fn test_markdown_task_list_means_notes() {
        let guess = detect_platform("- [ ] buy milk\n- [x] send invoice");
        assert_eq!(guess.platform, Platform::Notes);
        assert_eq!(guess.confidence, 75);
    }

    #[test]
    fn test_no_match_is_unknown_at_20() {
        let guess = detect_platform("nothing special about this sentence");
        assert_eq!(guess.platform, Platform::Unknown);
        assert_eq!(guess.confidence, UNKNOWN_CONFIDENCE);
    }

    #[test]
    fn test_editor_hints_accumulate_to_boost() {
        // No definitive fingerprint, but a source-file token plus an import
        let guess = detect_platform("see src/retention.rs\nuse std::collections::HashMap;");
        assert_eq!(guess.platform, Platform::Editor);
        assert_eq!(guess.confidence, 70);
        assert!(guess.indicators.contains(&"source-file-token".to_string()));
        assert!(guess.indicators.contains(&"import-statement".to_string()));
    }

    #[test]
    fn test_weak_indicators_recorded_on_definitive_match() {
        let guess = detect_platform("$ open https://example.com/docs");
        assert_eq!(guess.platform, Platform::Terminal);
        assert!(guess.indicators.contains(&"url-present".to_string()));
    }

    #[test]
    fn test_single_url_alone_is_not_definitive() {
        let guess = detect_platform("read https://example.com/article later");
        assert_eq!(guess.platform, Platform::Unknown);
        assert!(guess.indicators.contains(&"url-present".to_string()));
    }

    #[test]
    fn test_detect_platform_never_panics() {
        for input in ["", "\u{0}", "🎉", "\x1b[", "#"] {
            let guess = detect_platform(input);
            assert!(guess.confidence <= 100);
        }
    }
}
