use std::sync::LazyLock;

use regex::Regex;

const PAGE_VARIABLE: &str = "{$page}";
const PROTOCOL_PREFIXES: [&str; 3] = ["http:", "https:", "ftp:"];

static UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)__(.*?)__").expect("underline regex"));
static MONOSPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("monospace regex"));

/// `//` becomes `*` unless it is the separator of an `http:`, `https:` or
/// `ftp:` URL.
pub(super) fn convert_italics(buffer: &str) -> String {
    let bytes = buffer.as_bytes();
    let mut output = String::with_capacity(buffer.len());
    let mut copied = 0usize;
    let mut index = 0usize;
    while index + 1 < bytes.len() {
        if bytes[index] == b'/' && bytes[index + 1] == b'/' && !follows_protocol(&buffer[..index])
        {
            output.push_str(&buffer[copied..index]);
            output.push('*');
            index += 2;
            copied = index;
            continue;
        }
        index += 1;
    }
    output.push_str(&buffer[copied..]);
    output
}

pub(super) fn convert_underline(buffer: &str) -> String {
    UNDERLINE.replace_all(buffer, "_${1}_").into_owned()
}

pub(super) fn convert_monospace(buffer: &str) -> String {
    MONOSPACE.replace_all(buffer, "`${1}`").into_owned()
}

pub(super) fn substitute_variables(buffer: &str, page_name: Option<&str>) -> String {
    buffer.replace(PAGE_VARIABLE, page_name.unwrap_or(""))
}

fn follows_protocol(prefix: &str) -> bool {
    PROTOCOL_PREFIXES
        .iter()
        .any(|protocol| prefix.ends_with(protocol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn italics_skip_url_separators() {
        assert_eq!(convert_italics("//word//"), "*word*");
        assert_eq!(
            convert_italics("see http://a.org and https://b.org or ftp://c.org"),
            "see http://a.org and https://b.org or ftp://c.org"
        );
        assert_eq!(convert_italics("//http://a.org//"), "*http://a.org*");
        assert_eq!(convert_italics("file://x"), "file:*x");
    }

    #[test]
    fn italics_handle_runs_and_multibyte_text() {
        assert_eq!(convert_italics("///"), "*/");
        assert_eq!(convert_italics("http:///"), "http:/*");
        assert_eq!(convert_italics("//é//"), "*é*");
    }

    #[test]
    fn underline_spans_lines() {
        assert_eq!(convert_underline("__a__ and __b\nc__"), "_a_ and _b\nc_");
    }

    #[test]
    fn monospace_becomes_inline_code() {
        assert_eq!(convert_monospace("run {{make all}} now"), "run `make all` now");
        assert_eq!(convert_monospace("{{a\nb}}"), "`a\nb`");
    }

    #[test]
    fn page_variable_defaults_to_empty() {
        assert_eq!(substitute_variables("on {$page}", Some("Home")), "on Home");
        assert_eq!(substitute_variables("on {$page}", None), "on ");
        assert_eq!(substitute_variables("{$other}", Some("Home")), "{$other}");
    }
}
