//! Wikispaces markup to Markdown translation.
//!
//! The translator is a fixed sequence of [`Stage`]s that each rewrite the whole
//! document buffer. Order matters: verbatim spans are swapped out for
//! placeholders before any other rewrite runs, ordered lists are resolved
//! before headings, and code/math are only reformatted after the protected
//! spans are restored. Finished fences and math elements are held behind
//! placeholders again until escapes are collapsed.

mod attributes;
mod image;
mod inline;
mod links;
mod structure;
mod table;
mod verbatim;

pub use attributes::attribute;
pub use image::ImageTag;
pub use table::Alignment;
pub use verbatim::VerbatimRegistry;

pub const LOCATION_PLACEHOLDER: &str = "%s";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Link target template for `[[file:NAME]]`; `%s` is replaced by `NAME`.
    pub filelocation: String,
    /// Image source template for `[[image:NAME]]`; `%s` is replaced by `NAME`.
    pub imagelocation: String,
    /// Report intermediate matched fragments through `tracing`.
    pub debug: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            filelocation: LOCATION_PLACEHOLDER.to_string(),
            imagelocation: LOCATION_PLACEHOLDER.to_string(),
            debug: false,
        }
    }
}

impl TranslateOptions {
    /// Blank location templates fall back to the bare placeholder.
    pub fn normalized(mut self) -> Self {
        if self.filelocation.trim().is_empty() {
            self.filelocation = LOCATION_PLACEHOLDER.to_string();
        }
        if self.imagelocation.trim().is_empty() {
            self.imagelocation = LOCATION_PLACEHOLDER.to_string();
        }
        self
    }
}

pub fn fill_location(template: &str, name: &str) -> String {
    if template.is_empty() {
        return name.to_string();
    }
    template.replace(LOCATION_PLACEHOLDER, name)
}

/// Explicit sink for intermediate matches. Nothing is recorded unless a
/// callback is attached.
#[derive(Default)]
pub struct Diagnostics<'a> {
    sink: Option<&'a mut dyn FnMut(Stage, &str)>,
}

impl<'a> Diagnostics<'a> {
    pub fn silent() -> Self {
        Self { sink: None }
    }

    pub fn with_sink(sink: &'a mut dyn FnMut(Stage, &str)) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn record(&mut self, stage: Stage, fragment: &str) {
        if let Some(sink) = self.sink.as_mut() {
            sink(stage, fragment);
        }
    }
}

/// Per-call state threaded through every stage.
pub struct StageContext<'a> {
    options: TranslateOptions,
    page_name: Option<String>,
    registry: VerbatimRegistry,
    diagnostics: Diagnostics<'a>,
}

impl<'a> StageContext<'a> {
    pub fn new(
        options: &TranslateOptions,
        page_name: Option<&str>,
        diagnostics: Diagnostics<'a>,
    ) -> Self {
        Self {
            options: options.clone().normalized(),
            page_name: page_name.map(ToString::to_string),
            registry: VerbatimRegistry::default(),
            diagnostics,
        }
    }

    pub fn options(&self) -> &TranslateOptions {
        &self.options
    }

    pub fn page_name(&self) -> Option<&str> {
        self.page_name.as_deref()
    }

    pub fn registry(&self) -> &VerbatimRegistry {
        &self.registry
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ExtractVerbatim,
    RemoveMisc,
    UnorderedLists,
    OrderedLists,
    Headings,
    Italics,
    Images,
    FileLinks,
    ExternalLinks,
    Underline,
    Monospace,
    Variables,
    WikiLinks,
    Tables,
    RestoreVerbatim,
    CodeBlocks,
    MathBlocks,
    Escapes,
    RestoreFormatted,
}

impl Stage {
    pub const ALL: [Stage; 19] = [
        Self::ExtractVerbatim,
        Self::RemoveMisc,
        Self::UnorderedLists,
        Self::OrderedLists,
        Self::Headings,
        Self::Italics,
        Self::Images,
        Self::FileLinks,
        Self::ExternalLinks,
        Self::Underline,
        Self::Monospace,
        Self::Variables,
        Self::WikiLinks,
        Self::Tables,
        Self::RestoreVerbatim,
        Self::CodeBlocks,
        Self::MathBlocks,
        Self::Escapes,
        Self::RestoreFormatted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ExtractVerbatim => "extract-verbatim",
            Self::RemoveMisc => "remove-misc",
            Self::UnorderedLists => "unordered-lists",
            Self::OrderedLists => "ordered-lists",
            Self::Headings => "headings",
            Self::Italics => "italics",
            Self::Images => "images",
            Self::FileLinks => "file-links",
            Self::ExternalLinks => "external-links",
            Self::Underline => "underline",
            Self::Monospace => "monospace",
            Self::Variables => "variables",
            Self::WikiLinks => "wiki-links",
            Self::Tables => "tables",
            Self::RestoreVerbatim => "restore-verbatim",
            Self::CodeBlocks => "code-blocks",
            Self::MathBlocks => "math-blocks",
            Self::Escapes => "escapes",
            Self::RestoreFormatted => "restore-formatted",
        }
    }

    pub fn apply(self, buffer: &str, context: &mut StageContext<'_>) -> String {
        match self {
            Self::ExtractVerbatim => verbatim::extract_verbatim(buffer, context),
            Self::RemoveMisc => structure::remove_misc(buffer),
            Self::UnorderedLists => structure::convert_unordered_lists(buffer),
            Self::OrderedLists => structure::convert_ordered_lists(buffer),
            Self::Headings => structure::convert_headings(buffer),
            Self::Italics => inline::convert_italics(buffer),
            Self::Images => image::convert_images(buffer, context),
            Self::FileLinks => links::convert_file_links(buffer, &context.options.filelocation),
            Self::ExternalLinks => links::convert_external_links(buffer),
            Self::Underline => inline::convert_underline(buffer),
            Self::Monospace => inline::convert_monospace(buffer),
            Self::Variables => inline::substitute_variables(buffer, context.page_name()),
            Self::WikiLinks => links::convert_wiki_links(buffer),
            Self::Tables => table::convert_tables(buffer, context),
            Self::RestoreVerbatim => verbatim::restore_verbatim(buffer, context),
            Self::CodeBlocks => verbatim::convert_code_blocks(buffer, context),
            Self::MathBlocks => verbatim::convert_math_blocks(buffer, context),
            Self::Escapes => verbatim::collapse_escapes(buffer),
            Self::RestoreFormatted => verbatim::restore_verbatim(buffer, context),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Synthetic newlines added around the buffer so every construct sits
/// between line breaks. `restore` removes exactly what `pad` added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgePadding {
    leading: bool,
    trailing: bool,
}

impl EdgePadding {
    pub fn pad(text: &str) -> (String, Self) {
        let mut buffer = String::with_capacity(text.len() + 3);
        let leading = !text.starts_with('\n');
        if leading {
            buffer.push('\n');
        }
        buffer.push_str(text);
        let trailing = !buffer.ends_with("\n\n");
        if trailing {
            buffer.push_str("\n\n");
        }
        (buffer, Self { leading, trailing })
    }

    pub fn restore(self, mut buffer: String) -> String {
        if self.leading && buffer.starts_with('\n') {
            buffer.remove(0);
        }
        if self.trailing {
            for _ in 0..2 {
                if buffer.ends_with('\n') {
                    buffer.pop();
                }
            }
        }
        buffer
    }
}

pub fn translate(text: &str, options: &TranslateOptions) -> String {
    translate_page(text, None, options)
}

/// Translate a page whose file name feeds the `{$page}` variable.
pub fn translate_page(text: &str, page_name: Option<&str>, options: &TranslateOptions) -> String {
    if options.debug {
        let mut sink = |stage: Stage, fragment: &str| {
            tracing::debug!(stage = stage.name(), fragment, "matched fragment");
        };
        translate_with(text, page_name, options, Diagnostics::with_sink(&mut sink))
    } else {
        translate_with(text, page_name, options, Diagnostics::silent())
    }
}

pub fn translate_with(
    text: &str,
    page_name: Option<&str>,
    options: &TranslateOptions,
    diagnostics: Diagnostics<'_>,
) -> String {
    // A lone blank line pair is an empty page.
    if text == "\n\n" {
        return String::new();
    }

    let mut context = StageContext::new(options, page_name, diagnostics);
    let (mut buffer, padding) = EdgePadding::pad(text);
    for stage in Stage::ALL {
        buffer = stage.apply(&buffer, &mut context);
    }
    if !context.registry.unresolved().is_empty() {
        tracing::warn!(
            unresolved = context.registry.unresolved().len(),
            "verbatim placeholders were not found during restoration"
        );
    }
    padding.restore(buffer)
}
