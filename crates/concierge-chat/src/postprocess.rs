//! Reply postprocessor: markdown out, plain text back to the caller.
//!
//! Replies are delivered over SMS, so structural markup is stripped
//! before returning: headings, bullets, emphasis, code delimiters, and
//! runs of blank lines. The transformation is pure and idempotent.

use std::sync::LazyLock;

use regex::Regex;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:#+[ \t]*)+").expect("Invalid heading regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*][ \t]+)+").expect("Invalid bullet regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("Invalid bold regex"));
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\n]*)\*").expect("Invalid italic regex"));
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_\n]*)_").expect("Invalid underscore regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`{1,3}([^`]*)`{1,3}").expect("Invalid code regex"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid blank-run regex"));

/// Strip markdown structure from a reply, leaving the content.
pub fn normalize(text: &str) -> String {
    let text = HEADING.replace_all(text, "");
    let text = BULLET.replace_all(&text, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}
