use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;
use wikiconv_core::config::{ConvertConfig, DEFAULT_CONFIG_FILE, load_config};
use wikiconv_core::convert::{
    ConvertReport, SourceDocument, collect_inputs, convert_document, convert_file,
};
use wikiconv_core::translate::TranslateOptions;

#[derive(Debug, Parser)]
#[command(
    name = "wikiconv",
    version,
    about = "Convert Wikispaces markup pages to Markdown"
)]
struct Cli {
    /// Page files, directories of pages, or literal markup.
    #[arg(value_name = "INPUT")]
    inputs: Vec<String>,
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,
    #[arg(short, long, help = "Print intermediate matched fragments")]
    debug: bool,
    #[arg(
        short = 'F',
        long,
        value_name = "TEMPLATE",
        help = "File link location, %s is the file name"
    )]
    filelocation: Option<String>,
    #[arg(
        short = 'I',
        long,
        value_name = "TEMPLATE",
        help = "Image location, %s is the image name"
    )]
    imagelocation: Option<String>,
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, value_name = "SUFFIX", help = "Suffix appended to output file names")]
    suffix: Option<String>,
    #[arg(long, help = "Print converted pages instead of writing files")]
    stdout: bool,
    #[arg(long, help = "Print conversion reports as JSON")]
    json: bool,
}

#[derive(Debug, Clone)]
struct ResolvedSettings {
    config_path: PathBuf,
    options: TranslateOptions,
    suffix: String,
    extensions: Vec<String>,
}

impl ResolvedSettings {
    fn resolve(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let config: ConvertConfig = load_config(&config_path)?;
        let mut options = config.translate_options();
        if let Some(filelocation) = &cli.filelocation {
            options.filelocation = filelocation.clone();
        }
        if let Some(imagelocation) = &cli.imagelocation {
            options.imagelocation = imagelocation.clone();
        }
        options.debug |= cli.debug;
        Ok(Self {
            config_path,
            options: options.normalized(),
            suffix: cli
                .suffix
                .clone()
                .unwrap_or_else(|| config.output_suffix().to_string()),
            extensions: config.extensions(),
        })
    }

    fn diagnostics(&self) -> String {
        [
            format!("config: {}", normalize_path(&self.config_path)),
            format!("filelocation: {}", self.options.filelocation),
            format!("imagelocation: {}", self.options.imagelocation),
            format!("suffix: {}", self.suffix),
            format!("extensions: {}", self.extensions.join(",")),
        ]
        .join("\n")
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.inputs.is_empty() && cli.files.is_empty() {
        Cli::command().print_help()?;
        println!();
        bail!("no input given; pass a page file, a directory, or literal markup");
    }

    let settings = ResolvedSettings::resolve(&cli)?;
    init_tracing(settings.options.debug);
    if settings.options.debug {
        println!("[diagnostics]\n{}", settings.diagnostics());
    }

    let mut paths = cli.files.clone();
    for input in &cli.inputs {
        if Path::new(input).is_dir() {
            paths.push(PathBuf::from(input));
            continue;
        }
        let document = SourceDocument::load(input)?;
        match &document.path {
            Some(path) => paths.push(path.clone()),
            None => print!("{}", convert_document(&document, &settings.options)),
        }
    }
    if paths.is_empty() {
        return Ok(());
    }

    let files = collect_inputs(&paths, &settings.extensions, &settings.suffix)?;
    if cli.stdout {
        for file in &files {
            let document = SourceDocument::from_path(file)?;
            print!("{}", convert_document(&document, &settings.options));
        }
        return Ok(());
    }

    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        reports.push(convert_file(file, &settings.options, &settings.suffix)?);
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_reports(&reports);
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    // debug enables core debug output, otherwise use RUST_LOG or default to WARN
    let filter = if debug {
        EnvFilter::new("wikiconv_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_reports(reports: &[ConvertReport]) {
    println!("converted: {}", reports.len());
    for report in reports {
        println!("output: {}", report.output_path);
        println!("  input: {}", report.input_path);
        println!("  bytes: {} -> {}", report.input_bytes, report.output_bytes);
    }
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cli_accepts_original_flags() {
        let cli = Cli::try_parse_from([
            "wikiconv",
            "-d",
            "-F",
            "/files/%s",
            "-I",
            "/img/%s",
            "-f",
            "Home.creole",
            "page.wiki",
        ])
        .expect("parse cli");
        assert!(cli.debug);
        assert_eq!(cli.filelocation.as_deref(), Some("/files/%s"));
        assert_eq!(cli.imagelocation.as_deref(), Some("/img/%s"));
        assert_eq!(cli.files, vec![PathBuf::from("Home.creole")]);
        assert_eq!(cli.inputs, vec!["page.wiki".to_string()]);
    }

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::try_parse_from([
            "wikiconv",
            "--config",
            "/nonexistent/wikiconv.toml",
            "-F",
            "/files/%s",
            "--suffix",
            ".md",
            "x",
        ])
        .expect("parse cli");
        let settings = ResolvedSettings::resolve(&cli).expect("resolve settings");
        assert_eq!(settings.options.filelocation, "/files/%s");
        assert_eq!(settings.suffix, ".md");
        assert!(settings.diagnostics().contains("suffix: .md"));
    }

    #[test]
    fn config_debug_enables_debug_output_without_flag() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("wikiconv.toml");
        fs::write(&config_path, "[convert]\ndebug = true\n").expect("write config");
        let config_arg = config_path.to_str().expect("utf-8 path");

        let cli = Cli::try_parse_from(["wikiconv", "--config", config_arg, "x"])
            .expect("parse cli");
        assert!(!cli.debug);
        let settings = ResolvedSettings::resolve(&cli).expect("resolve settings");
        assert!(settings.options.debug);
    }
}
