/// Value of a `name="value"` attribute inside a tag, if present.
///
/// The name must start the tag or follow whitespace, so `width` does not
/// match `maxwidth="..."`. An attribute without a closing quote is absent.
pub fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let mut search_from = 0usize;
    while let Some(found) = tag[search_from..].find(&needle) {
        let start = search_from + found;
        let at_boundary = tag[..start]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace);
        let value_start = start + needle.len();
        if at_boundary {
            let value_len = tag[value_start..].find('"')?;
            return Some(&tag[value_start..value_start + value_len]);
        }
        search_from = value_start;
    }
    None
}
