//! Doclex command-line interface.
//!
//! ```text
//! doclex serve -H 0.0.0.0 -p 8000 -c doclex.toml
//! doclex extract --file contract.pdf --prompt "Extract the parties" --classes person,organization
//! doclex extract --text "John Smith visited New York." --prompt "People and places" --classes person,location --format json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use doclex::api::TEXT_INPUT_FILENAME;
use doclex::ocr::TesseractBackend;
use doclex::{
    ExtractionRequest, ExtractionResponse, ExtractionService, FileType, Settings, extract_text,
    parse_extraction_classes, validate_file,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "doclex", version, about = "Extract structured entities from documents with LLMs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Host address to bind to (defaults to the configured host)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Settings file (TOML, YAML or JSON); discovered `doclex.toml` otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Extract entities from a document or a piece of text
    #[command(group(ArgGroup::new("input").required(true).args(["file", "text"])))]
    Extract {
        /// Document to extract from
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Raw text to extract from
        #[arg(short, long)]
        text: Option<String>,

        /// What to extract, in plain language
        #[arg(long)]
        prompt: String,

        /// Entity classes (comma-separated)
        #[arg(long)]
        classes: String,

        /// Model id (defaults to the configured model)
        #[arg(short, long)]
        model: Option<String>,

        /// Parallel model calls per pass
        #[arg(short, long)]
        workers: Option<usize>,

        /// Extraction passes over the text
        #[arg(long)]
        passes: Option<usize>,

        /// Settings file (TOML, YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the HTML visualization to this path
        #[arg(long)]
        html: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env: {}", e);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, config } => {
            let settings = load_settings(config.as_deref())?;
            let host = host.unwrap_or_else(|| settings.host.clone());
            let port = port.unwrap_or(settings.port);

            doclex::api::serve_with_settings(host, port, settings)
                .await
                .context("API server stopped with an error")?;
        }

        Commands::Extract {
            file,
            text,
            prompt,
            classes,
            model,
            workers,
            passes,
            config,
            html,
            format,
        } => {
            let settings = Arc::new(load_settings(config.as_deref())?);

            let extraction_classes = parse_extraction_classes(&classes);
            if extraction_classes.is_empty() {
                bail!("At least one extraction class is required");
            }

            let started = Instant::now();
            let (filename, file_type, text) = match (file, text) {
                (Some(path), _) => read_document(&path, &settings).await?,
                (None, Some(text)) => {
                    if text.trim().is_empty() {
                        bail!("Text must not be empty");
                    }
                    (TEXT_INPUT_FILENAME.to_string(), FileType::Text, text)
                }
                (None, None) => bail!("Either --file or --text is required"),
            };

            let service = ExtractionService::from_settings(Arc::clone(&settings))?;
            let request = ExtractionRequest {
                model_id: model,
                max_workers: workers,
                extraction_passes: passes,
                ..ExtractionRequest::new(text, prompt, extraction_classes)
            };
            let (entities, metadata) = service.process(request).await?;

            let response = ExtractionResponse::success(
                filename,
                file_type.as_str(),
                entities,
                metadata,
                started.elapsed().as_secs_f64(),
            );

            if let Some(path) = html {
                match &response.visualization_html {
                    Some(page) => std::fs::write(&path, page)
                        .with_context(|| format!("Failed to write visualization to {}", path.display()))?,
                    None => tracing::warn!("No visualization was produced; {} not written", path.display()),
                }
            }

            match format {
                OutputFormat::Text => print!("{}", render_text(&response)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
            }
        }
    }

    Ok(())
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => {
            let mut settings = Settings::from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?;
            settings.apply_env();
            Ok(settings)
        }
        None => Ok(Settings::load()?),
    }
}

async fn read_document(path: &Path, settings: &Settings) -> Result<(String, FileType, String)> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    validate_file(&filename, &content, settings)?;
    let ocr = TesseractBackend::from_settings(settings);
    let extracted = extract_text(&filename, &content, &ocr).await?;

    Ok((filename, extracted.file_type, extracted.text))
}

fn render_text(response: &ExtractionResponse) -> String {
    let mut out = format!(
        "{} ({}, {} chars): {} entities via {} in {:.2}s\n",
        response.filename,
        response.file_type,
        response.text_length,
        response.entity_count,
        response.model_used,
        response.processing_time_seconds
    );

    for entity in &response.entities {
        out.push_str(&format!(
            "  [{}..{}] {}: {}",
            entity.start_char, entity.end_char, entity.extraction_class, entity.extraction_text
        ));
        if !entity.attributes.is_empty() {
            out.push_str(&format!(" {}", serde_json::Value::Object(entity.attributes.clone())));
        }
        out.push('\n');
    }

    out
}
