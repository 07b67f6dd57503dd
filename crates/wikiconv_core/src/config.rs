use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::translate::{LOCATION_PLACEHOLDER, TranslateOptions};

pub const DEFAULT_CONFIG_FILE: &str = "wikiconv.toml";
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_markdown";
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["creole", "wiki", "txt"];

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ConvertConfig {
    #[serde(default)]
    pub convert: ConvertSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ConvertSection {
    pub filelocation: Option<String>,
    pub imagelocation: Option<String>,
    pub debug: Option<bool>,
    pub output_suffix: Option<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl ConvertConfig {
    /// Resolve the file link template: env WIKICONV_FILE_LOCATION > config > `%s`.
    pub fn filelocation(&self) -> String {
        resolve_location(
            env::var("WIKICONV_FILE_LOCATION").ok(),
            self.convert.filelocation.as_deref(),
        )
    }

    /// Resolve the image template: env WIKICONV_IMAGE_LOCATION > config > `%s`.
    pub fn imagelocation(&self) -> String {
        resolve_location(
            env::var("WIKICONV_IMAGE_LOCATION").ok(),
            self.convert.imagelocation.as_deref(),
        )
    }

    /// Resolve debug output: env WIKICONV_DEBUG > config > false.
    pub fn debug(&self) -> bool {
        env::var("WIKICONV_DEBUG")
            .ok()
            .and_then(|value| parse_flag(&value))
            .or(self.convert.debug)
            .unwrap_or(false)
    }

    pub fn output_suffix(&self) -> &str {
        self.convert
            .output_suffix
            .as_deref()
            .filter(|suffix| !suffix.is_empty())
            .unwrap_or(DEFAULT_OUTPUT_SUFFIX)
    }

    pub fn extensions(&self) -> Vec<String> {
        if self.convert.extensions.is_empty() {
            return DEFAULT_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect();
        }
        self.convert
            .extensions
            .iter()
            .map(|extension| extension.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }

    pub fn translate_options(&self) -> TranslateOptions {
        TranslateOptions {
            filelocation: self.filelocation(),
            imagelocation: self.imagelocation(),
            debug: self.debug(),
        }
    }
}

/// Load and parse a ConvertConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<ConvertConfig> {
    if !config_path.exists() {
        return Ok(ConvertConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: ConvertConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

/// `1`, `true`, `yes`, `on` and their negations, case-insensitive.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn resolve_location(env_value: Option<String>, configured: Option<&str>) -> String {
    if let Some(value) = env_value {
        let trimmed = value.trim().to_string();
        if !trimmed.is_empty() {
            return trimmed;
        }
    }
    configured
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(LOCATION_PLACEHOLDER)
        .to_string()
}
