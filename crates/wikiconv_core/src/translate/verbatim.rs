use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::attributes::attribute;
use super::{Stage, StageContext};

const PLACEHOLDER_PREFIX: &str = "WIKICONVVERBATIM";

static CODE_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\[\[code( +format=".*?")?\]\](.*?)\[\[code\]\]"#).expect("code span regex")
});
static ESCAPE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"``(.*)``").expect("escape span regex"));
static MATH_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\[\[math( +format=".*?")?\]\](.*?)\[\[math\]\]"#).expect("math span regex")
});

/// Placeholder-to-original mapping for spans no rewrite may touch.
///
/// Keys are ASCII letters and digits only, so no later stage can match part
/// of one. Restoration runs newest-first: a span captured later may contain
/// the placeholder of an earlier one.
#[derive(Debug, Default)]
pub struct VerbatimRegistry {
    spans: Vec<(String, String)>,
    next_id: u64,
    unresolved: Vec<String>,
}

impl VerbatimRegistry {
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Placeholders that were no longer present in the buffer at restoration.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Replace every match of `pattern` with a fresh placeholder.
    pub fn protect(&mut self, buffer: &str, pattern: &Regex) -> String {
        pattern
            .replace_all(buffer, |caps: &Captures| self.hold(buffer, caps[0].to_string()))
            .into_owned()
    }

    /// Store `text` under a fresh placeholder that does not occur in `buffer`.
    pub fn hold(&mut self, buffer: &str, text: String) -> String {
        let key = self.mint(buffer);
        self.spans.push((key.clone(), text));
        key
    }

    /// Substitute every placeholder back, consuming the registry's spans.
    pub fn restore(&mut self, buffer: &str) -> String {
        let mut output = buffer.to_string();
        for (key, original) in std::mem::take(&mut self.spans).into_iter().rev() {
            if output.contains(&key) {
                output = output.replace(&key, &original);
            } else {
                self.unresolved.push(key);
            }
        }
        output
    }

    fn mint(&mut self, buffer: &str) -> String {
        loop {
            self.next_id += 1;
            let key = format!("{PLACEHOLDER_PREFIX}{}X", self.next_id);
            if !buffer.contains(&key) && !self.spans.iter().any(|(existing, _)| *existing == key)
            {
                return key;
            }
        }
    }
}

pub(super) fn extract_verbatim(buffer: &str, context: &mut StageContext<'_>) -> String {
    let mut output = buffer.to_string();
    for pattern in [&*CODE_SPAN, &*ESCAPE_SPAN, &*MATH_SPAN] {
        let before = context.registry.len();
        output = context.registry.protect(&output, pattern);
        for (_, original) in &context.registry.spans[before..] {
            context.diagnostics.record(Stage::ExtractVerbatim, original);
        }
    }
    output
}

pub(super) fn restore_verbatim(buffer: &str, context: &mut StageContext<'_>) -> String {
    context.registry.restore(buffer)
}

/// Finished fences go back into the registry so the math and escape stages
/// never see code bodies. `restore_verbatim` runs again after escapes.
pub(super) fn convert_code_blocks(buffer: &str, context: &mut StageContext<'_>) -> String {
    let StageContext {
        registry,
        diagnostics,
        ..
    } = context;
    CODE_SPAN
        .replace_all(buffer, |caps: &Captures| {
            let language = caps
                .get(1)
                .and_then(|format| attribute(format.as_str(), "format"))
                .map(str::to_lowercase)
                .unwrap_or_default();
            let body = caps.get(2).map_or("", |body| body.as_str());
            diagnostics.record(Stage::CodeBlocks, body);
            let fence = format!("```{language}\n{}\n```\n", trim_enclosing_newlines(body));
            registry.hold(buffer, fence)
        })
        .into_owned()
}

pub(super) fn convert_math_blocks(buffer: &str, context: &mut StageContext<'_>) -> String {
    let StageContext {
        registry,
        diagnostics,
        ..
    } = context;
    MATH_SPAN
        .replace_all(buffer, |caps: &Captures| {
            let body = caps.get(2).map_or("", |body| body.as_str());
            diagnostics.record(Stage::MathBlocks, body);
            registry.hold(buffer, format!("<math>{body}</math>"))
        })
        .into_owned()
}

pub(super) fn collapse_escapes(buffer: &str) -> String {
    ESCAPE_SPAN.replace_all(buffer, "`${1}`").into_owned()
}

fn trim_enclosing_newlines(body: &str) -> &str {
    let body = body.strip_prefix('\n').unwrap_or(body);
    body.strip_suffix('\n').unwrap_or(body)
}
