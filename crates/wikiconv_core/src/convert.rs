use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use walkdir::WalkDir;

use crate::translate::{TranslateOptions, translate_page};

/// Markup plus the file it came from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub content: String,
    pub path: Option<PathBuf>,
}

impl SourceDocument {
    pub fn from_text(text: &str) -> Self {
        Self {
            content: normalize_line_endings(text),
            path: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self {
            content: normalize_line_endings(&content),
            path: Some(path.to_path_buf()),
        })
    }

    /// Load `argument` as a file when it names one, otherwise treat the
    /// argument itself as markup.
    pub fn load(argument: &str) -> Result<Self> {
        let path = Path::new(argument);
        if path.is_file() {
            return Self::from_path(path);
        }
        Ok(Self::from_text(argument))
    }

    pub fn page_name(&self) -> Option<&str> {
        self.path.as_deref()?.file_name()?.to_str()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub input_path: String,
    pub output_path: String,
    pub input_bytes: usize,
    pub output_bytes: usize,
}

pub fn convert_document(document: &SourceDocument, options: &TranslateOptions) -> String {
    translate_page(&document.content, document.page_name(), options)
}

/// Sibling of `path` named `<file name><suffix>`.
pub fn output_path_for(path: &Path, suffix: &str) -> Result<PathBuf> {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        bail!("input path has no file name: {}", path.display());
    };
    Ok(path.with_file_name(format!("{file_name}{suffix}")))
}

pub fn convert_file(
    path: &Path,
    options: &TranslateOptions,
    suffix: &str,
) -> Result<ConvertReport> {
    let document = SourceDocument::from_path(path)?;
    let converted = convert_document(&document, options);
    let output_path = output_path_for(path, suffix)?;
    fs::write(&output_path, &converted)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    tracing::debug!(
        input = %path.display(),
        output = %output_path.display(),
        "converted page"
    );
    Ok(ConvertReport {
        input_path: normalize_path(path),
        output_path: normalize_path(&output_path),
        input_bytes: document.content.len(),
        output_bytes: converted.len(),
    })
}

/// Expand directories into their matching files. Explicit files are kept
/// whatever their extension; previously written outputs are skipped.
pub fn collect_inputs(
    paths: &[PathBuf],
    extensions: &[String],
    suffix: &str,
) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for path in paths {
        if path.is_file() {
            files.insert(path.clone());
            continue;
        }
        if !path.is_dir() {
            bail!("input not found: {}", path.display());
        }
        for entry in WalkDir::new(path).follow_links(false) {
            let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let candidate = entry.path();
            if is_converted_output(candidate, suffix) || !has_extension(candidate, extensions) {
                continue;
            }
            files.insert(candidate.to_path_buf());
        }
    }
    Ok(files.into_iter().collect())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            extensions
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(extension))
        })
}

fn is_converted_output(path: &Path, suffix: &str) -> bool {
    !suffix.is_empty()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(suffix))
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn extensions() -> Vec<String> {
        vec!["creole".to_string(), "wiki".to_string()]
    }

    #[test]
    fn from_text_normalizes_crlf_and_has_no_page_name() {
        let document = SourceDocument::from_text("a\r\nb\r\n");
        assert_eq!(document.content, "a\nb\n");
        assert_eq!(document.page_name(), None);
    }

    #[test]
    fn load_falls_back_to_literal_markup() {
        let document = SourceDocument::load("= Not a file =").expect("load");
        assert_eq!(document.content, "= Not a file =");
        assert!(document.path.is_none());
    }

    #[test]
    fn load_reads_existing_files() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("Home.creole");
        fs::write(&path, "x\r\n").expect("write page");
        let document = SourceDocument::load(path.to_str().expect("utf-8 path")).expect("load");
        assert_eq!(document.content, "x\n");
        assert_eq!(document.page_name(), Some("Home.creole"));
    }

    #[test]
    fn output_path_is_a_sibling_with_suffix() {
        let output = output_path_for(Path::new("/tmp/wiki/Home.creole"), "_markdown")
            .expect("output path");
        assert!(output.ends_with("wiki/Home.creole_markdown"));
        assert!(output_path_for(Path::new("/"), "_markdown").is_err());
    }

    #[test]
    fn convert_file_writes_sibling_output() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("Home.creole");
        fs::write(&path, "= Welcome =\nThis is {$page}.\n").expect("write page");

        let report = convert_file(&path, &TranslateOptions::default(), "_markdown")
            .expect("convert file");
        let written =
            fs::read_to_string(temp.path().join("Home.creole_markdown")).expect("read output");
        assert_eq!(written, "# Welcome\nThis is Home.creole.\n");
        assert_eq!(report.output_bytes, written.len());
        assert!(report.output_path.ends_with("Home.creole_markdown"));
    }

    #[test]
    fn collect_inputs_walks_directories_and_skips_outputs() {
        let temp = tempdir().expect("tempdir");
        let nested = temp.path().join("space").join("pages");
        fs::create_dir_all(&nested).expect("create dirs");
        fs::write(nested.join("B.creole"), "b").expect("write");
        fs::write(nested.join("A.wiki"), "a").expect("write");
        fs::write(nested.join("A.wiki_markdown"), "done").expect("write");
        fs::write(nested.join("notes.pdf"), "pdf").expect("write");
        let explicit = temp.path().join("explicit.txt");
        fs::write(&explicit, "c").expect("write");

        let files = collect_inputs(
            &[temp.path().join("space"), explicit.clone(), explicit.clone()],
            &extensions(),
            "_markdown",
        )
        .expect("collect inputs");
        assert_eq!(
            files,
            vec![explicit, nested.join("A.wiki"), nested.join("B.creole")]
        );
    }

    #[test]
    fn collect_inputs_rejects_missing_paths() {
        let temp = tempdir().expect("tempdir");
        let error = collect_inputs(&[temp.path().join("missing")], &extensions(), "_markdown")
            .expect_err("must fail");
        assert!(error.to_string().contains("input not found"));
    }
}
