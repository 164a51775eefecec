use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use formscan::{
    DEFAULT_CONFIG_PATH, DEFAULT_DPI, DEFAULT_NAME_LABEL, DEFAULT_PAGE_CAP, ExportFormat,
    ExtractError, ExtractOptions, ExtractionReport, FormRecognizerClient, PdfiumRasterizer,
    ServiceConfig, extract_document, render_text_table, write_export,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "formscan",
    version,
    about = "Extract form fields from scanned PDFs into a spreadsheet"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze a PDF and write the extracted fields as a spreadsheet.
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path. Defaults to the format's standard file name.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file holding AZURE_ENDPOINT, AZURE_KEY and MODEL_ID.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Output format: xlsx or csv.
    #[arg(long, default_value = "xlsx")]
    format: String,

    /// Maximum number of pages sent to the extraction service.
    #[arg(long, default_value_t = DEFAULT_PAGE_CAP)]
    page_cap: usize,

    /// Label for the first (name) column.
    #[arg(long, default_value = DEFAULT_NAME_LABEL)]
    name_label: String,

    /// Rendering resolution for page images.
    #[arg(long, default_value_t = DEFAULT_DPI)]
    dpi: f32,

    /// CSV delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Seconds between polls of the analysis operation.
    #[arg(long, default_value_t = 1)]
    poll_secs: u64,

    /// Write a JSON run report to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Do not print the extracted table.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let format = ExportFormat::from_str(&args.format)
        .map_err(|error| anyhow!(error))
        .context("failed to parse --format")?;

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let options = ExtractOptions {
        page_cap: args.page_cap,
        name_label: args.name_label.clone(),
        dpi: args.dpi,
        format,
        delimiter: args.delimiter as u8,
        poll_interval: Duration::from_secs(args.poll_secs),
        ..ExtractOptions::default()
    };
    options.validate()?;
    Ok(options)
}

fn write_report(args: &ExtractArgs, report: &ExtractionReport) -> Result<()> {
    let Some(path) = &args.report else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to '{}'", path.display()))
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = parse_options(args)?;
    let config = ServiceConfig::load(&args.config)
        .with_context(|| format!("failed to load config from '{}'", args.config.display()))?;
    let pdf = std::fs::read(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;

    let rasterizer = PdfiumRasterizer::with_dpi(options.dpi)?;
    let extractor = FormRecognizerClient::new(&config, options.poll_interval, options.max_polls)?;
    let (table, report) = extract_document(&pdf, &config, &rasterizer, &extractor, &options)
        .with_context(|| format!("failed to extract fields from '{}'", args.input.display()))?;

    if !args.quiet {
        println!("{}", render_text_table(&table));
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(options.format.file_name()));
    write_export(&output, &table, options.format, options.delimiter)
        .with_context(|| format!("failed to write '{}'", output.display()))?;
    eprintln!(
        "wrote {} row(s) to '{}' ({})",
        report.row_count,
        output.display(),
        options.format.mime_type()
    );

    write_report(args, &report)?;
    Ok(report)
}

fn log_report(report: &ExtractionReport) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    for warning in &report.warnings {
        eprintln!(
            "  - {:?} page={:?}: {}",
            warning.code, warning.page, warning.message
        );
    }
}

fn is_no_data(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ExtractError>()
        .is_some_and(ExtractError::is_no_data)
}

fn main() -> ExitCode {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("formscan=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report);
                ExitCode::SUCCESS
            }
            Err(error) if is_no_data(&error) => {
                eprintln!("could not extract data from '{}'", args.input.display());
                ExitCode::from(2)
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
