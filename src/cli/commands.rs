//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::{Path, PathBuf};

use unitgen_syntax::diagnostics::{self, CompileError, SyntaxReport};
use unitgen_syntax::{lexer, parser};

use crate::cases::{self, Namespace};
use crate::generate::{CaseGenerator, FixedGenerator, GenerateError, GeneratorConfig, OpenAiGenerator};
use crate::harness::{self, ExecutionOutcome, TargetModule};
use crate::runtime::ExecutionLimits;

use super::reporter::{BatchSummary, ConsoleReporter, OutcomeReporter};
use super::{CliError, CliResult, ExitCode};

/// Maximum source or case file size (100 MB)
///
/// Larger files are rejected before they are read.
const MAX_SOURCE_SIZE: u64 = 100 * 1024 * 1024;

// ============================================================================
// File helpers
// ============================================================================

/// Read a source or case file.
///
/// ## Errors
///
/// Returns an error if:
/// - The file cannot be read (I/O error)
/// - The file exceeds `MAX_SOURCE_SIZE` (100 MB)
pub fn read_source(path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(path)
        .map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "File '{}' is too large ({} bytes, max {} bytes)",
            path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(path).map_err(|e| CliError::failure(format!("Error reading file '{}': {}", path.display(), e)))
}

/// Write an export file, creating nothing but the file itself.
fn write_export(path: &Path, contents: &str, what: &str) -> CliResult<()> {
    fs::write(path, contents)
        .map_err(|e| CliError::failure(format!("Error writing {what} to '{}': {}", path.display(), e)))?;
    tracing::info!(path = %path.display(), what, "exported");
    Ok(())
}

fn syntax_failure(path: &Path, source: &str, errors: Vec<CompileError>) -> CliError {
    let report = SyntaxReport::new(&path.display().to_string(), source, errors);
    CliError::failure(diagnostics::render_report(&report).trim_end())
}

fn generate_failure(err: GenerateError) -> CliError {
    match err {
        GenerateError::MissingApiKey => {
            CliError::failure("Error: no API key configured (pass --api-key or set OPENAI_API_KEY)")
        }
        other => CliError::failure(format!("Error generating cases: {other}")),
    }
}

// ============================================================================
// Debug commands
// ============================================================================

/// Lex and display tokens.
pub fn lex_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let tokens = lexer::lex(&source).map_err(|errs| syntax_failure(path, &source, errs))?;

    for tok in &tokens {
        println!("{:?}", tok);
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse and display AST.
pub fn parse_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let tokens = lexer::lex(&source).map_err(|errs| syntax_failure(path, &source, errs))?;
    let module = parser::parse(&tokens).map_err(|errs| syntax_failure(path, &source, errs))?;

    println!("{:#?}", module);
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Session
// ============================================================================

/// Where a session's case text comes from.
#[derive(Debug, Clone)]
pub enum CaseSource {
    /// A case file written earlier (or by hand)
    File(PathBuf),
    /// The model endpoint
    Model(GeneratorConfig),
}

/// Options shared by `run` and `exec`.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub save_cases: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub limits: ExecutionLimits,
    pub verbose: bool,
    pub fail_on_error: bool,
}

/// Load the module, obtain cases, run them, then export what was asked for.
pub fn run_session(file: &Path, case_source: &CaseSource, options: &SessionOptions) -> CliResult<ExitCode> {
    let source = read_source(file)?;
    let module = load_module(file, &source, options.limits)?;

    let case_text = match case_source {
        CaseSource::File(path) => FixedGenerator(read_source(path)?).generate(&source),
        CaseSource::Model(config) => OpenAiGenerator::new(config.clone()).and_then(|g| g.generate(&source)),
    }
    .map_err(generate_failure)?;

    if let Some(path) = &options.save_cases {
        write_export(path, &case_text, "cases")?;
    }

    let mut reporter = ConsoleReporter::new(options.verbose);
    let (outcomes, summary) = execute_cases(&module, &case_text, &mut reporter);

    if let Some(path) = &options.report {
        write_export(path, &harness::report_text(&outcomes), "report")?;
    }

    if options.fail_on_error && summary.failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Load a module, rendering load errors with source snippets.
pub fn load_module(path: &Path, source: &str, limits: ExecutionLimits) -> CliResult<TargetModule> {
    TargetModule::from_source_at(path, source, limits)
        .map_err(|err| CliError::failure(diagnostics::render_report(&err).trim_end()))
}

/// Parse `case_text` and run it against `module`, feeding everything to `reporter`.
pub fn execute_cases(
    module: &TargetModule,
    case_text: &str,
    reporter: &mut dyn OutcomeReporter,
) -> (Vec<ExecutionOutcome>, BatchSummary) {
    let batch = cases::parse_cases(case_text, &Namespace::default());
    if batch.invocations().is_empty() {
        tracing::warn!(skipped = batch.skipped().len(), "no runnable cases in the case text");
    }

    reporter.on_batch_start(module.name(), batch.invocations().len());
    for skipped in batch.skipped() {
        reporter.on_skipped(skipped);
    }
    let outcomes = harness::run(batch.invocations(), module);
    for outcome in &outcomes {
        reporter.on_outcome(outcome);
    }
    let summary = BatchSummary::new(&outcomes, batch.skipped().len());
    reporter.on_batch_complete(&summary);
    (outcomes, summary)
}

// ============================================================================
// Single-step commands
// ============================================================================

/// Generate case text only; print it or write it to `output`.
pub fn generate_cases(file: &Path, config: GeneratorConfig, output: Option<&Path>) -> CliResult<ExitCode> {
    let source = read_source(file)?;
    let text = OpenAiGenerator::new(config)
        .and_then(|g| g.generate(&source))
        .map_err(generate_failure)?;

    match output {
        Some(path) => write_export(path, &text, "cases")?,
        None => println!("{}", text.trim_end()),
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse a case file and print the invocations it yields.
pub fn show_cases(path: &Path, verbose: bool) -> CliResult<ExitCode> {
    let text = read_source(path)?;
    let batch = cases::parse_cases(&text, &Namespace::default());

    for invocation in batch.invocations() {
        println!("{invocation}");
    }
    if verbose {
        for skipped in batch.skipped() {
            eprintln!("line {}: {} ({})", skipped.line_number, skipped.text.trim(), skipped.reason);
        }
    }
    eprintln!(
        "{} case(s) parsed, {} line(s) skipped",
        batch.invocations().len(),
        batch.skipped().len()
    );
    Ok(ExitCode::SUCCESS)
}
