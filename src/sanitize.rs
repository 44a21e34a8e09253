//! Removal of citation markers from math spans.
//!
//! The RAG service tags retrieved passages with markers such as
//! `📘 [THESIS]`, `📄 [paper.pdf]` or `[Source: paper.pdf]`. In prose they
//! are meaningful and stay. Inside `$$...$$` or `$...$` they break the math
//! typesetter, so they are stripped there.
//!
//! Any `$...$` pair counts as inline math, so `$5 and $10` is treated as a
//! math span. This matches what the service's other clients do.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static DISPLAY_MATH: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)\$\$(.*?)\$\$"));

static INLINE_MATH: LazyLock<Regex> = LazyLock::new(|| compile(r"\$([^$]+)\$"));

// The emoji prefixes are also matched in their cp1252 mojibake form, which is
// how they arrive from backends that mis-declare their encoding.
static THESIS_TAG: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?:(?:📘|\x{F0}\x{178}\x{201C}\x{2DC})\s*)?\[THESIS\]\s*")
});

static DOCUMENT_TAG: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?:📄|\x{F0}\x{178}\x{201C}\x{201E})\s*\[[^\]]+\]\s*"));

static SOURCE_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"\[Source:\s*[^\]]+\]\s*"));

fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => panic!("invalid built-in pattern {pattern:?}: {err}"),
    }
}

/// Strips citation markers from every math span of `content`.
///
/// Display math is cleaned first, then inline math is matched against the
/// result of that pass.
pub fn sanitize(content: &str) -> String {
    let displayed = DISPLAY_MATH.replace_all(content, |caps: &Captures<'_>| {
        format!("$${}$$", strip_tags(&caps[1]))
    });
    INLINE_MATH
        .replace_all(&displayed, |caps: &Captures<'_>| {
            format!("${}$", strip_tags(&caps[1]))
        })
        .into_owned()
}

fn strip_tags(equation: &str) -> String {
    let cleaned = THESIS_TAG.replace_all(equation, "");
    let cleaned = DOCUMENT_TAG.replace_all(&cleaned, "");
    SOURCE_TAG.replace_all(&cleaned, "").into_owned()
}

/// Returns the length of the longest prefix of `content` that contains no
/// unterminated math span.
///
/// While a response is streaming, text past this point may still turn out to
/// be inside math, so a renderer should hold it back.
pub fn settled_len(content: &str) -> usize {
    let mut idx = 0;
    while let Some(offset) = content[idx..].find('$') {
        let start = idx + offset;
        let rest = &content[start..];
        if rest.starts_with("$$") {
            match rest[2..].find("$$") {
                Some(end) => idx = start + 2 + end + 2,
                None => return start,
            }
        } else {
            match rest[1..].find('$') {
                Some(end) => idx = start + 1 + end + 1,
                None => return start,
            }
        }
    }
    content.len()
}
