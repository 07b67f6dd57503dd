use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::fill_location;

static FILE_LINK_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[file:([^|\]]*)\|([^\]]*)\]\]").expect("labeled file link regex")
});
static FILE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[file:([^|\]]*)\]\]").expect("file link regex"));
static EXTERNAL_LINK_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[@?((?:https?|ftp)://[^|\]]*)\|([^\]]*)\]\]")
        .expect("labeled external link regex")
});
static EXTERNAL_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[@?((?:https?|ftp)://[^|\]]*)\]\]").expect("external link regex")
});
static WIKI_LINK_LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^|\]]*)\|([^\]]*)\]\]").expect("labeled wiki link regex")
});
static WIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^|\]]*)\]\]").expect("wiki link regex"));

pub(super) fn convert_file_links(buffer: &str, filelocation: &str) -> String {
    let labeled = FILE_LINK_LABELED.replace_all(buffer, |caps: &Captures| {
        markdown_link(&caps[2], &fill_location(filelocation, &caps[1]))
    });
    FILE_LINK
        .replace_all(&labeled, |caps: &Captures| {
            markdown_link(&caps[1], &fill_location(filelocation, &caps[1]))
        })
        .into_owned()
}

pub(super) fn convert_external_links(buffer: &str) -> String {
    labeled_then_bare(buffer, &EXTERNAL_LINK_LABELED, &EXTERNAL_LINK)
}

/// Whatever `[[...]]` is left after images, files and URLs is a page link.
pub(super) fn convert_wiki_links(buffer: &str) -> String {
    labeled_then_bare(buffer, &WIKI_LINK_LABELED, &WIKI_LINK)
}

fn labeled_then_bare(buffer: &str, labeled: &Regex, bare: &Regex) -> String {
    let buffer = labeled.replace_all(buffer, |caps: &Captures| markdown_link(&caps[2], &caps[1]));
    bare.replace_all(&buffer, |caps: &Captures| markdown_link(&caps[1], &caps[1]))
        .into_owned()
}

fn markdown_link(label: &str, target: &str) -> String {
    format!("[{label}]({target})")
}
