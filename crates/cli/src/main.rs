mod echo;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use pith_core::{ContentType, Readability, ReadabilityConfig, RegistryLoaderBuilder};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use echo::{
    format_size, print_article_details, print_banner, print_detail, print_info, print_step, print_success,
    print_timing, print_warning,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the extraction result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Html,
    Text,
    Markdown,
}

impl OutputFormat {
    /// Representation requested from the extractor for this format
    fn content_type(self) -> ContentType {
        match self {
            Self::Json | Self::Html => ContentType::Html,
            Self::Text => ContentType::Text,
            Self::Markdown => ContentType::Markdown,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(format!("Invalid format: {}. Valid options: json, html, text, markdown", s)),
        }
    }
}

/// Extract the article from a saved HTML page
#[derive(Parser, Debug)]
#[command(name = "pith")]
#[command(version, about = "Extract article content and metadata from saved HTML pages", long_about = None)]
struct Args {
    /// Local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// URL the page was retrieved from
    #[arg(short, long, value_name = "URL")]
    url: String,

    /// Output format (json, html, text, markdown)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Trust custom extractors without filling gaps from generic extraction
    #[arg(long)]
    no_fallback: bool,

    /// Directory of custom extractor definitions (default: ~/.config/pith/extractors)
    #[arg(long, value_name = "DIR")]
    extractors: Option<PathBuf>,

    /// Cancel extraction after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pith=debug,pith_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
        print_step(1, 4, &format!("Reading {}", if args.input == "-" { "stdin" } else { args.input.as_str() }));
    }

    let html = read_input(&args.input)?;

    if args.verbose {
        print_detail("Size", &format_size(html.len()));
        eprintln!();
        print_step(2, 4, "Loading custom extractors");
    }

    let mut loader = RegistryLoaderBuilder::new();
    if let Some(dir) = &args.extractors {
        if !dir.is_dir() {
            bail!("Extractor directory not found: {}", dir.display());
        }
        loader = loader.custom_dir(dir);
    }
    let registry = loader.build().load().context("Failed to load custom extractors")?;
    debug!(domains = registry.len(), "extractor registry loaded");

    if args.verbose {
        print_detail("Domains", &registry.len().to_string());
        eprintln!();
        print_step(3, 4, &format!("Extracting {}", args.url.bright_white().underline()));
    }

    let config = ReadabilityConfig::builder()
        .fallback(!args.no_fallback)
        .content_type(args.format.content_type())
        .build();
    let reader = Readability::with_registry(config, registry);

    let cancel = CancellationToken::new();
    if let Some(secs) = args.timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            token.cancel();
        });
    }

    let started = Instant::now();
    let article = reader.parse_html(&html, &args.url, &cancel).await.context("Extraction failed")?;
    cancel.cancel();

    if args.verbose {
        print_timing("Extraction", started.elapsed());
        print_article_details(&article);
        print_step(4, 4, &format!("Writing {:?} output", args.format));
    }

    let mut output = match args.format {
        OutputFormat::Json => article.to_json().context("Failed to serialize article")?,
        _ => match article.content {
            Some(content) => content,
            None => bail!("No content extracted"),
        },
    };
    if !output.ends_with('\n') {
        output.push('\n');
    }

    if article.word_count == 0 && args.verbose {
        print_warning("Extracted content is empty");
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => print!("{}", output),
    }

    Ok(())
}
