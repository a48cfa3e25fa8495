use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use pdf_table_entries::{
    DEFAULT_MATCH_THRESHOLD, HeaderClassifier, KeyColumn, OllamaClient, OllamaConfig,
    PdfDocument, Pipeline, PipelineOptions, RunReport, StaticClassifier, build_index,
    sample_headers,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2entries",
    version,
    about = "Split multi-table PDFs into per-record entries"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print each page's leading header row as JSON.
    Headers(InspectArgs),
    /// Print the per-page column index as JSON.
    Index(InspectArgs),
    /// Run the full pipeline and write entries plus a manifest.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Minimum cells required per candidate table row.
    #[arg(long, default_value_t = 2)]
    min_cols: usize,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for entries and manifest.json.
    #[arg(short, long)]
    output: PathBuf,

    /// JSON file with header patterns; skips the classifier model.
    #[arg(long)]
    patterns: Option<PathBuf>,

    /// Write raw entry JSON instead of model summaries.
    #[arg(long)]
    no_summarize: bool,

    /// Share of pattern tokens a page must contain to match.
    #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
    threshold: f32,

    /// Key column: `#N` for a 0-based position, otherwise a header name.
    #[arg(long, default_value = "#0")]
    key_column: KeyColumn,

    /// Minimum cells required per candidate table row.
    #[arg(long, default_value_t = 2)]
    min_cols: usize,

    /// Process page ranges in parallel.
    #[arg(long)]
    parallel: bool,

    /// Also write each reconstructed table as CSV.
    #[arg(long)]
    write_tables: bool,

    /// Ollama base URL (defaults to OLLAMA_URL or http://localhost:11434).
    #[arg(long)]
    ollama_url: Option<String>,

    /// Ollama model name (defaults to OLLAMA_MODEL or llama3).
    #[arg(long)]
    model: Option<String>,
}

fn open_document(input: &Path, min_cols: usize) -> Result<PdfDocument> {
    PdfDocument::open(input, min_cols)
        .with_context(|| format!("failed to open '{}'", input.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{json}");
    Ok(())
}

fn ollama_config(args: &RunArgs) -> Result<OllamaConfig> {
    let mut config = OllamaConfig::from_env()?;
    if let Some(url) = args.ollama_url.as_deref() {
        config = OllamaConfig::new(url, config.model)?;
    }
    if let Some(model) = &args.model {
        config.model.clone_from(model);
    }
    Ok(config)
}

fn log_report(report: &RunReport) {
    eprintln!(
        "wrote {} entries from {} range(s)",
        report.entries.len() - report.failed_entries,
        report.ranges.len()
    );
    for warning in &report.warnings {
        eprintln!("  - {:?}: {}", warning.code, warning.message);
    }
}

/// The model client also summarizes unless raw entries were requested.
fn summarizer<'a>(client: Option<&'a OllamaClient>, args: &RunArgs) -> Option<&'a OllamaClient> {
    client.filter(|_| !args.no_summarize)
}

fn run_pipeline(args: &RunArgs) -> Result<RunReport> {
    let options = PipelineOptions {
        match_threshold: args.threshold,
        key_column: args.key_column.clone(),
        min_cols: args.min_cols,
        parallel: args.parallel,
        write_tables: args.write_tables,
    };
    options.validate()?;

    let needs_model = args.patterns.is_none() || !args.no_summarize;
    let client = if needs_model {
        Some(OllamaClient::new(&ollama_config(args)?)?)
    } else {
        None
    };

    let static_classifier = args
        .patterns
        .as_deref()
        .map(|path| {
            StaticClassifier::from_file(path)
                .with_context(|| format!("failed to read patterns from '{}'", path.display()))
        })
        .transpose()?;
    let classifier: &dyn HeaderClassifier = match (&static_classifier, &client) {
        (Some(classifier), _) => classifier,
        (None, Some(client)) => client,
        (None, None) => return Err(anyhow!("no header classifier configured")),
    };

    let mut pipeline = Pipeline::new(options, classifier);
    if let Some(client) = summarizer(client.as_ref(), args) {
        pipeline = pipeline.with_summarizer(client);
    }

    let document = open_document(&args.input, args.min_cols)?;
    pipeline
        .run(&document, &args.output)
        .with_context(|| format!("failed to extract entries from '{}'", args.input.display()))
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Headers(args) => {
            let document = open_document(&args.input, args.min_cols)?;
            print_json(&sample_headers(&document))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Index(args) => {
            let document = open_document(&args.input, args.min_cols)?;
            print_json(&build_index(&document))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => {
            let report = run_pipeline(&args)?;
            log_report(&report);
            if report.failed_entries > 0 {
                Ok(ExitCode::from(2))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pdf_table_entries=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pdf_table_entries::{OllamaClient, OllamaConfig};

    use super::{Cli, Commands, RunArgs, summarizer};

    fn run_args(extra: &[&str]) -> RunArgs {
        let argv = ["pdf2entries", "run", "-i", "in.pdf", "-o", "out"]
            .into_iter()
            .chain(extra.iter().copied());
        match Cli::try_parse_from(argv).expect("arguments should parse").command {
            Commands::Run(args) => args,
            other => panic!("expected run command, got {other:?}"),
        }
    }

    #[test]
    fn no_summarize_leaves_the_client_out() {
        let config = OllamaConfig::new("http://127.0.0.1:11434", "llama3")
            .expect("config should parse");
        let client = OllamaClient::new(&config).expect("client should build");

        assert!(summarizer(Some(&client), &run_args(&[])).is_some());
        assert!(summarizer(Some(&client), &run_args(&["--no-summarize"])).is_none());
        assert!(summarizer(None, &run_args(&[])).is_none());
    }
}
