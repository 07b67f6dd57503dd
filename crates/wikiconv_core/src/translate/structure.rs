use std::sync::LazyLock;

use regex::{Captures, Regex};

const FORMAT_MARKER: &str = "[[WikiText]]";
const CONVERTED_MARKER: &str = "[MarkDown]";
const MAX_HEADING_LEVEL: usize = 6;

static TOC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n?\[\[toc(\|flat)?\]\]").expect("toc regex"));
static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"( *)\[\[#.*?\]\]( *)").expect("anchor regex"));
static UNORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n *(\++)\s+").expect("unordered item regex"));
static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n *(#+)\s+").expect("ordered item regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n *(=+)\s*(.*?)\s*=+").expect("heading regex"));

/// Swap the format fingerprint, drop `[[toc]]` and named anchors.
pub(super) fn remove_misc(buffer: &str) -> String {
    let buffer = buffer.replace(FORMAT_MARKER, CONVERTED_MARKER);
    let buffer = TOC.replace_all(&buffer, "");
    ANCHOR
        .replace_all(&buffer, |caps: &Captures| {
            if caps[1].is_empty() && caps[2].is_empty() {
                ""
            } else {
                " "
            }
        })
        .into_owned()
}

pub(super) fn convert_unordered_lists(buffer: &str) -> String {
    nest_items(buffer, &UNORDERED_ITEM, "* ")
}

// Must run before headings: `#` items would otherwise be ambiguous.
pub(super) fn convert_ordered_lists(buffer: &str) -> String {
    nest_items(buffer, &ORDERED_ITEM, "1. ")
}

pub(super) fn convert_headings(buffer: &str) -> String {
    HEADING
        .replace_all(buffer, |caps: &Captures| {
            let level = caps[1].len().min(MAX_HEADING_LEVEL);
            format!("\n{} {}", "#".repeat(level), &caps[2])
        })
        .into_owned()
}

fn nest_items(buffer: &str, pattern: &Regex, marker: &str) -> String {
    pattern
        .replace_all(buffer, |caps: &Captures| {
            let depth = caps[1].len();
            format!("\n{}{marker}", "  ".repeat(depth.saturating_sub(1)))
        })
        .into_owned()
}
