//! formcheck - validate form templates from the command line
//!
//! Usage:
//!   formcheck validate templates/*.json
//!   formcheck record template.json values.json
//!   formcheck new rows

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hemo_forms::config::BuilderConfig;
use hemo_forms::records::{validate_record, RecordValues};
use hemo_forms::template::{
    empty_of, load_template_file, template_to_json, validate_template, TemplateFormat,
    TemplateType,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "formcheck")]
#[command(about = "Validate dynamic form templates and records")]
struct Cli {
    /// Builder config (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate template files and print their error maps
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,
    },

    /// Validate a record (JSON object) against a template
    Record {
        template: PathBuf,
        values: PathBuf,
        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,
    },

    /// Print an empty template as JSON
    New {
        #[arg(value_enum)]
        kind: KindArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Yaml,
    Auto,
}

impl From<FormatArg> for TemplateFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Json => TemplateFormat::Json,
            FormatArg::Yaml => TemplateFormat::Yaml,
            FormatArg::Auto => TemplateFormat::Auto,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Check,
    Rows,
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout carries the JSON results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hemo_forms=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BuilderConfig::load_from_file(path)
            .with_context(|| format!("Loading config {}", path.display()))?,
        None => BuilderConfig::default(),
    };

    match cli.command {
        Command::Validate { files, format } => validate(&files, format.into()),
        Command::Record {
            template,
            values,
            format,
        } => record(&template, &values, format.into()),
        Command::New { kind } => new_template(kind, &config),
    }
}

fn validate(files: &[PathBuf], format: TemplateFormat) -> Result<ExitCode> {
    let mut report = BTreeMap::new();
    let mut failed = false;

    for path in files {
        let template = load_template_file(path, format)
            .with_context(|| format!("Loading template {}", path.display()))?;
        let errs = validate_template(&template);
        if !errs.is_empty() {
            tracing::warn!(file = %path.display(), errors = %errs, "Template has errors");
            failed = true;
        }
        report.insert(path.display().to_string(), errs);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(exit_code(failed))
}

fn record(template: &Path, values: &Path, format: TemplateFormat) -> Result<ExitCode> {
    let template = load_template_file(template, format)
        .with_context(|| format!("Loading template {}", template.display()))?;
    let content = std::fs::read_to_string(values)
        .with_context(|| format!("Reading values {}", values.display()))?;
    let values: RecordValues = serde_json::from_str(&content)
        .with_context(|| format!("Parsing values {}", values.display()))?;

    let errs = validate_record(&template, &values);
    println!("{}", serde_json::to_string_pretty(&errs)?);
    Ok(exit_code(!errs.is_empty()))
}

fn new_template(kind: KindArg, config: &BuilderConfig) -> Result<ExitCode> {
    let template_type = match kind {
        KindArg::Check => TemplateType::Check,
        KindArg::Rows => TemplateType::Rows,
    };
    println!("{}", template_to_json(&empty_of(template_type, config))?);
    Ok(ExitCode::SUCCESS)
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
