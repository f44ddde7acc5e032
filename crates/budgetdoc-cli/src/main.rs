//! budgetdoc CLI - Budget allocation report generator
//!
//! Reads a budget spreadsheet and writes a PDF section (and optionally a
//! workbook sheet) per director and month.

mod config;
mod diagnostics;

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use budgetdoc_core::format::format_amount;
use budgetdoc_core::{
    build_report, BudgetReport, ColumnResolver, Diagnostic, DiagnosticCode, DiagnosticEmitter,
    RawTable, Renderer, ReportProfile, Selection,
};
use budgetdoc_reader::{detect_format, read_bytes, Fingerprint};
use budgetdoc_render::{preview_table, ExcelRenderer, PdfRenderer, TextRenderer};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use diagnostics::{DiagnosticConfig, Emitter, ExitCode, JsonEmitter, TerminalEmitter};

const DEFAULT_PDF: &str = "programa_asignacion_presupuestal.pdf";

#[derive(Parser)]
#[command(name = "budgetdoc")]
#[command(author, version, about = "Budget allocation report generator", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Report profile (TOML): title lines, signatures, logo, column names
    #[arg(long, global = true, env = "BUDGETDOC_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the input's columns and report problems
    Check {
        /// Input spreadsheet (xlsx, xls, ods, csv)
        #[arg(value_name = "INPUT")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the first rows and the director/month units
    Preview {
        /// Input spreadsheet (xlsx, xls, ods, csv)
        #[arg(value_name = "INPUT")]
        file: PathBuf,

        /// Number of rows to show
        #[arg(short = 'n', long, default_value_t = 10)]
        rows: usize,
    },

    /// Generate the PDF report and/or the workbook
    Generate(GenerateArgs),

    /// Write the default report profile to a new file
    InitConfig {
        /// Profile file to create
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Input spreadsheet (xlsx, xls, ods, csv)
    #[arg(value_name = "INPUT")]
    file: PathBuf,

    /// PDF output path
    #[arg(long, value_name = "FILE")]
    pdf: Option<PathBuf>,

    /// Workbook output path
    #[arg(long, value_name = "FILE")]
    xlsx: Option<PathBuf>,

    /// PNG or JPEG logo for the PDF header (overrides the profile)
    #[arg(long, value_name = "FILE")]
    logo: Option<PathBuf>,

    /// Only this director (repeatable)
    #[arg(long = "director", value_name = "NAME")]
    directors: Vec<String>,

    /// Only this month, by number or name (repeatable)
    #[arg(long = "month", value_name = "MONTH")]
    months: Vec<String>,

    /// Treat warnings as errors; nothing is written when any occur
    #[arg(long)]
    strict: bool,

    /// Only show errors
    #[arg(short, long)]
    quiet: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl GenerateArgs {
    fn selection(&self) -> Selection {
        let selection = self
            .directors
            .iter()
            .fold(Selection::all(), |s, d| s.director(d.clone()));
        self.months.iter().fold(selection, |s, m| s.month(m.clone()))
    }

    /// Output paths; the default PDF when neither is given
    fn targets(&self) -> (Option<PathBuf>, Option<PathBuf>) {
        if self.pdf.is_none() && self.xlsx.is_none() {
            (Some(PathBuf::from(DEFAULT_PDF)), None)
        } else {
            (self.pdf.clone(), self.xlsx.clone())
        }
    }
}

fn main() -> process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code.into(),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::Failure.into()
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Check { file, format } => cmd_check(config, &file, format),
        Commands::Preview { file, rows } => cmd_preview(config, &file, rows),
        Commands::Generate(args) => cmd_generate(config, &args),
        Commands::InitConfig { file } => {
            config::write_default(&file)?;
            println!("Created: {}", file.display());
            Ok(ExitCode::Success)
        }
    }
}

// ============================================================================
// Shared steps
// ============================================================================

fn load_profile(path: Option<&Path>) -> Result<ReportProfile> {
    match path {
        Some(path) => Ok(config::load(path)?),
        None => Ok(ReportProfile::default()),
    }
}

fn column_resolver(profile: &ReportProfile) -> ColumnResolver {
    let (resolver, unknown) = profile.column_resolver();
    for label in unknown {
        warn!(label = %label, "ignoring [columns] entry for an unknown field");
    }
    resolver
}

/// Read and parse the input once, with its content fingerprint
fn load_input(path: &Path) -> Result<(RawTable, Fingerprint)> {
    let format = detect_format(path)?;
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let fingerprint = Fingerprint::of(&bytes);
    info!(path = %path.display(), bytes = bytes.len(), fingerprint = %fingerprint.short(), "reading input");
    let table =
        read_bytes(&bytes, format).with_context(|| format!("cannot load {}", path.display()))?;
    Ok((table, fingerprint))
}

fn make_emitter(format: OutputFormat, config: DiagnosticConfig, source: &Path) -> Emitter<io::Stderr> {
    match format {
        OutputFormat::Text => {
            Emitter::Terminal(TerminalEmitter::new(io::stderr(), config).with_source(source))
        }
        OutputFormat::Json => Emitter::Json(JsonEmitter::new(config).with_source(source)),
    }
}

/// Print the JSON document (if requested) and return the exit code
fn finish(emitter: &Emitter<io::Stderr>, format: OutputFormat, mut body: serde_json::Value) -> Result<ExitCode> {
    if format == OutputFormat::Json {
        body["diagnostics"] = emitter.to_json_value();
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    Ok(emitter.exit_code())
}

fn units_json(report: &BudgetReport) -> serde_json::Value {
    report
        .units
        .iter()
        .map(|u| {
            json!({
                "director": u.director,
                "month": u.month_label(),
                "year": u.year_label(),
                "records": u.records.len(),
                "total": u.totals.grand_total.to_string(),
            })
        })
        .collect()
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_check(config: Option<&Path>, file: &Path, format: OutputFormat) -> Result<ExitCode> {
    let profile = load_profile(config)?;
    let resolver = column_resolver(&profile);
    let (table, fingerprint) = load_input(file)?;

    let mut emitter = make_emitter(format, DiagnosticConfig::default(), file);
    let report = match build_report(&table, &resolver) {
        Ok((report, diagnostics)) => {
            for d in diagnostics {
                emitter.emit(d);
            }
            Some(report)
        }
        Err(err) => {
            emitter.emit(err.to_diagnostic(&table.headers));
            None
        }
    };

    let lookup = resolver.lookup(&table.headers);
    match format {
        OutputFormat::Text => {
            println!("{}: {} rows", file.display(), table.row_count());
            for (spec, column) in &lookup {
                let found = column.as_ref().map_or_else(
                    || "<missing>".to_string(),
                    |c| format!("{} (column {})", c.name, c.index + 1),
                );
                println!("  {:<18} {}", spec.field.label(), found);
            }
            if let Some(report) = &report {
                println!(
                    "{} report unit(s), {} row(s) left out",
                    report.units.len(),
                    report.dropped.len()
                );
            }
            Ok(emitter.exit_code())
        }
        OutputFormat::Json => {
            let columns: serde_json::Map<String, serde_json::Value> = lookup
                .iter()
                .map(|(spec, column)| {
                    let value = column.as_ref().map_or(serde_json::Value::Null, |c| {
                        json!({ "name": c.name, "index": c.index })
                    });
                    (spec.field.label().to_string(), value)
                })
                .collect();
            let body = json!({
                "file": file.display().to_string(),
                "fingerprint": fingerprint.to_string(),
                "rows": table.row_count(),
                "columns": columns,
                "units": report.as_ref().map_or(json!([]), units_json),
            });
            finish(&emitter, format, body)
        }
    }
}

fn cmd_preview(config: Option<&Path>, file: &Path, rows: usize) -> Result<ExitCode> {
    let profile = load_profile(config)?;
    let resolver = column_resolver(&profile);
    let (table, _) = load_input(file)?;

    print!("{}", preview_table(&table, rows));
    println!();

    let mut emitter = make_emitter(OutputFormat::Text, DiagnosticConfig::default(), file);
    match build_report(&table, &resolver) {
        Ok((report, diagnostics)) => {
            for d in diagnostics {
                emitter.emit(d);
            }
            print!("{}", TextRenderer::new().render(&report)?);
        }
        Err(err) => emitter.emit(err.to_diagnostic(&table.headers)),
    }
    Ok(emitter.exit_code())
}

fn cmd_generate(config: Option<&Path>, args: &GenerateArgs) -> Result<ExitCode> {
    let profile = load_profile(config)?;
    let resolver = column_resolver(&profile);
    let (table, fingerprint) = load_input(&args.file)?;

    let diagnostic_config = DiagnosticConfig {
        strict: args.strict,
        quiet: args.quiet,
    };
    let mut emitter = make_emitter(args.format, diagnostic_config, &args.file);
    let mut body = json!({
        "file": args.file.display().to_string(),
        "fingerprint": fingerprint.to_string(),
        "units": [],
        "outputs": [],
    });

    let (report, diagnostics) = match build_report(&table, &resolver) {
        Ok(built) => built,
        Err(err) => {
            emitter.emit(err.to_diagnostic(&table.headers));
            return finish(&emitter, args.format, body);
        }
    };
    for d in diagnostics {
        emitter.emit(d);
    }

    let selection = args.selection();
    let report = if selection.is_all() {
        report
    } else {
        let (selected, diagnostics) = report.select(&selection);
        for d in diagnostics {
            emitter.emit(d);
        }
        selected
    };
    body["units"] = units_json(&report);
    body["total"] = json!(report.grand_total().to_string());

    if report.is_empty() {
        emitter.emit(
            Diagnostic::new(
                DiagnosticCode::W003NoReportUnits,
                "no report units to render; nothing was written",
            )
            .with_hint("every row needs a Director and a Mes value"),
        );
        return finish(&emitter, args.format, body);
    }
    if emitter.has_errors() {
        return finish(&emitter, args.format, body);
    }

    // Render everything before writing anything
    let (pdf_path, xlsx_path) = args.targets();
    let mut outputs: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    if let Some(path) = pdf_path {
        let renderer = pdf_renderer(&profile, args.logo.as_deref());
        outputs.push((path, renderer.render(&report)?));
    }
    if let Some(path) = xlsx_path {
        outputs.push((path, ExcelRenderer::new().render(&report)?));
    }

    for (path, bytes) in &outputs {
        std::fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote output");
        if args.format == OutputFormat::Text && !args.quiet {
            println!(
                "Wrote {} ({} unit(s), total {})",
                path.display(),
                report.units.len(),
                format_amount(report.grand_total())
            );
        }
    }
    body["outputs"] = outputs
        .iter()
        .map(|(path, _)| json!(path.display().to_string()))
        .collect();

    finish(&emitter, args.format, body)
}

/// PDF renderer with the profile and, if readable, the logo
fn pdf_renderer(profile: &ReportProfile, logo: Option<&Path>) -> PdfRenderer {
    let renderer = PdfRenderer::new().with_profile(profile.clone());
    let Some(path) = logo.or(profile.logo.as_deref()) else {
        return renderer;
    };
    match renderer.clone().load_logo(path) {
        Ok(with_logo) => with_logo,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "logo not usable, rendering without it");
            renderer
        }
    }
}
