use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use enroll_pdf_to_json::{
    ColumnMapping, ExtractOptions, ExtractionReport, Field, PageSelection, RecordStore,
    SearchTarget, discover_columns, extract_records, load_records, sample_records, save_records,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2json",
    version,
    about = "Extract enrollment records from PDFs into JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract records and write them as a JSON array.
    Extract(ExtractArgs),
    /// Print the header cells of the first tabular grid.
    Columns(ColumnsArgs),
    /// Look up one record by exact field value.
    Lookup(LookupArgs),
    /// Substring search across one field or all of them.
    Search(SearchArgs),
    /// Tally totals and per-branch / per-section counts.
    Stats(StatsArgs),
    /// Write the built-in sample dataset.
    Sample(SampleArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output JSON path.
    #[arg(short, long)]
    output: PathBuf,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Column mapping as inline JSON, e.g. '{"Rno":0,"CN":2}'.
    #[arg(long, conflicts_with = "mapping_file")]
    mapping: Option<String>,

    /// Column mapping read from a JSON file.
    #[arg(long)]
    mapping_file: Option<PathBuf>,

    /// Fall back to the default positional mapping when the supplied
    /// mapping is unusable, instead of failing.
    #[arg(long)]
    lenient_mapping: bool,

    /// Minimum cells required per candidate grid row.
    #[arg(long, default_value_t = 2)]
    min_cols: usize,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ColumnsArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,
}

#[derive(Debug, Args)]
struct LookupArgs {
    /// Record store JSON path.
    #[arg(short, long)]
    data: PathBuf,

    /// Field to match: Rno, Jno, CN, B or Sec.
    #[arg(long)]
    field: String,

    /// Exact value to match, case-insensitively.
    #[arg(long)]
    value: String,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Record store JSON path.
    #[arg(short, long)]
    data: PathBuf,

    /// Substring to search for.
    #[arg(short, long)]
    query: String,

    /// Restrict the search to one field; all five when omitted.
    #[arg(long)]
    field: Option<String>,
}

#[derive(Debug, Args)]
struct StatsArgs {
    /// Record store JSON path.
    #[arg(short, long)]
    data: PathBuf,
}

#[derive(Debug, Args)]
struct SampleArgs {
    /// Output JSON path.
    #[arg(short, long)]
    output: PathBuf,
}

fn parse_field(name: &str) -> Result<Field> {
    Field::from_str(name).map_err(|error| anyhow!("invalid field: {error}"))
}

fn resolve_mapping(args: &ExtractArgs) -> Result<Option<ColumnMapping>> {
    let raw = match (&args.mapping, &args.mapping_file) {
        (Some(inline), _) => Some(inline.clone()),
        (None, Some(path)) => Some(std::fs::read_to_string(path).with_context(|| {
            format!("failed to read mapping file '{}'", path.display())
        })?),
        (None, None) => None,
    };
    let Some(raw) = raw else {
        return Ok(None);
    };

    match ColumnMapping::from_json_str(&raw) {
        Ok(mapping) => Ok(Some(mapping)),
        Err(error) if args.lenient_mapping => {
            tracing::warn!("unusable column mapping, using default positions: {error}");
            Ok(None)
        }
        Err(error) => Err(anyhow!("{error}")),
    }
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    let mapping = resolve_mapping(args)?;

    Ok(ExtractOptions {
        pages,
        mapping,
        min_cols: args.min_cols,
    })
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?}: {}",
                warning.code, warning.page, warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExitCode> {
    let options = parse_options(args)?;
    let (records, report) = extract_records(&args.input, &options)
        .with_context(|| format!("failed to extract records from '{}'", args.input.display()))?;
    save_records(&args.output, &records)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;

    log_report(&report, args.verbose);
    println!(
        "extracted {} record(s) from {} table(s)",
        report.record_count, report.table_count
    );

    if report.record_count > 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}

fn run_columns(args: &ColumnsArgs) -> Result<ExitCode> {
    let columns = discover_columns(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    println!("{}", serde_json::to_string(&columns)?);
    Ok(ExitCode::SUCCESS)
}

fn load_store(path: &Path) -> Result<RecordStore> {
    let records = load_records(path)
        .with_context(|| format!("failed to load record store '{}'", path.display()))?;
    let store = RecordStore::new();
    store.load(records);
    Ok(store)
}

fn run_lookup(args: &LookupArgs) -> Result<ExitCode> {
    let store = load_store(&args.data)?;
    let field = parse_field(&args.field)?;

    match store.find_by_key(field, &args.value) {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("no record with {field} = '{}'", args.value);
            Ok(ExitCode::from(2))
        }
    }
}

fn run_search(args: &SearchArgs) -> Result<ExitCode> {
    let store = load_store(&args.data)?;
    let target = match args.field.as_deref() {
        Some(name) => SearchTarget::Field(parse_field(name)?),
        None => SearchTarget::All,
    };

    let hits = store.search(&args.query, target);
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(ExitCode::SUCCESS)
}

fn run_stats(args: &StatsArgs) -> Result<ExitCode> {
    let store = load_store(&args.data)?;
    println!("{}", serde_json::to_string_pretty(&store.stats())?);
    Ok(ExitCode::SUCCESS)
}

fn run_sample(args: &SampleArgs) -> Result<ExitCode> {
    let records = sample_records();
    save_records(&args.output, &records)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    println!("wrote {} sample record(s)", records.len());
    Ok(ExitCode::SUCCESS)
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Extract(args) => run_extract(&args),
        Commands::Columns(args) => run_columns(&args),
        Commands::Lookup(args) => run_lookup(&args),
        Commands::Search(args) => run_search(&args),
        Commands::Stats(args) => run_stats(&args),
        Commands::Sample(args) => run_sample(&args),
    }
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("enroll_pdf_to_json=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
