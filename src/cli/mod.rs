//! CLI module for unitgen
//!
//! This module provides the command-line session driver.
//!
//! ## Commands
//!
//! - `run <file>` - Generate cases with the model (or read `--cases`), run them, report
//! - `generate <file>` - Generate case text only
//! - `exec <file> <cases>` - Run a case file, no network
//! - `cases <cases>` - Parse a case file and show the invocations
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//! - `reporter` - Outcome reporting (`OutcomeReporter`, `ConsoleReporter`)
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod reporter;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::generate::GeneratorConfig;
use crate::runtime::ExecutionLimits;
use crate::version::UNITGEN_VERSION;

use commands::{CaseSource, SessionOptions};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Generate unit test cases for a Python module with a language model, then run them
#[derive(Parser, Debug)]
#[command(name = "unitgen")]
#[command(version = UNITGEN_VERSION)]
#[command(about = "Generate unit test cases for a Python module with a language model, then run them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    // Debug/development flags
    /// Tokenize only (debug)
    #[arg(long = "lex", value_name = "FILE")]
    pub lex_file: Option<PathBuf>,

    /// Parse only (debug)
    #[arg(long = "parse", value_name = "FILE", conflicts_with = "lex_file")]
    pub parse_file: Option<PathBuf>,
}

/// Model endpoint settings.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Chat model to ask for cases (default: gpt-3.5-turbo)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,
    /// Base URL of an OpenAI-compatible API (default: https://api.openai.com/v1)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
    /// API key for the model endpoint
    #[arg(long, value_name = "KEY", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 60)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl ModelArgs {
    pub fn to_config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(api_key) = &self.api_key {
            config = config.with_api_key(api_key);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

/// Execution and reporting settings shared by `run` and `exec`.
#[derive(Args, Debug, Clone, Default)]
pub struct ExecArgs {
    /// Write the report (one line per case) to PATH
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
    /// Interpreter steps allowed per case (default: 10000000)
    #[arg(long, value_name = "N")]
    pub max_steps: Option<u64>,
    /// Nested calls allowed per case (default: 200)
    #[arg(long = "max-depth", value_name = "N")]
    pub max_depth: Option<usize>,
    /// Show skipped lines and captured output
    #[arg(short, long)]
    pub verbose: bool,
    /// Exit with status 1 when any case fails
    #[arg(long)]
    pub fail_on_error: bool,
}

impl ExecArgs {
    pub fn limits(&self) -> ExecutionLimits {
        let mut limits = ExecutionLimits::default();
        if let Some(steps) = self.max_steps {
            limits = limits.with_max_steps(steps);
        }
        if let Some(depth) = self.max_depth {
            limits = limits.with_max_call_depth(depth);
        }
        limits
    }

    fn session(&self, save_cases: Option<PathBuf>) -> SessionOptions {
        SessionOptions {
            save_cases,
            report: self.report.clone(),
            limits: self.limits(),
            verbose: self.verbose,
            fail_on_error: self.fail_on_error,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate cases for a module, run them and report
    Run {
        /// Module to test
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Read cases from a file instead of asking the model
        #[arg(long, value_name = "FILE")]
        cases: Option<PathBuf>,
        /// Write the case text to PATH
        #[arg(long, value_name = "PATH")]
        save_cases: Option<PathBuf>,
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        exec: ExecArgs,
    },

    /// Generate case text for a module without running it
    Generate {
        /// Module to generate cases for
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Write the case text to PATH instead of stdout
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Run a case file against a module (no network)
    Exec {
        /// Module to test
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Case file, one `name(args)` per line
        #[arg(value_name = "CASES")]
        cases: PathBuf,
        #[command(flatten)]
        exec: ExecArgs,
    },

    /// Parse a case file and show the invocations it yields
    Cases {
        /// Case file, one `name(args)` per line
        #[arg(value_name = "CASES")]
        cases: PathBuf,
        /// Show skipped lines with their reasons
        #[arg(short, long)]
        verbose: bool,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    // Handle debug flags first
    if let Some(file) = cli.lex_file {
        return commands::lex_file(&file);
    }
    if let Some(file) = cli.parse_file {
        return commands::parse_file(&file);
    }

    match cli.command {
        Some(Command::Run {
            file,
            cases,
            save_cases,
            model,
            exec,
        }) => {
            let source = match cases {
                Some(path) => CaseSource::File(path),
                None => CaseSource::Model(model.to_config()),
            };
            commands::run_session(&file, &source, &exec.session(save_cases))
        }
        Some(Command::Generate { file, output, model }) => {
            commands::generate_cases(&file, model.to_config(), output.as_deref())
        }
        Some(Command::Exec { file, cases, exec }) => {
            commands::run_session(&file, &CaseSource::File(cases), &exec.session(None))
        }
        Some(Command::Cases { cases, verbose }) => commands::show_cases(&cases, verbose),
        None => Err(CliError::failure(
            "Error: no command given (try `unitgen run <FILE>` or `unitgen --help`)",
        )),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::try_parse_from([
            "unitgen", "run", "calc.py", "--cases", "cases.txt", "--report", "out.txt", "--max-steps", "500", "-v",
        ])
        .unwrap();
        let Some(Command::Run { file, cases, exec, .. }) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(file, PathBuf::from("calc.py"));
        assert_eq!(cases, Some(PathBuf::from("cases.txt")));
        assert!(exec.verbose);
        assert_eq!(exec.report, Some(PathBuf::from("out.txt")));
        assert_eq!(exec.limits().max_steps, 500);
        assert_eq!(exec.limits().max_call_depth, ExecutionLimits::default().max_call_depth);
    }

    #[test]
    fn test_cli_parse_generate_model_args() {
        let cli = Cli::try_parse_from([
            "unitgen", "generate", "calc.py", "-o", "cases.txt", "--model", "gpt-4o-mini", "--api-key", "sk-x",
        ])
        .unwrap();
        let Some(Command::Generate { output, model, .. }) = cli.command else {
            panic!("Expected Generate command");
        };
        assert_eq!(output, Some(PathBuf::from("cases.txt")));
        let config = model.to_config();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.api_key.as_deref(), Some("sk-x"));
        assert_eq!(config.base_url, GeneratorConfig::default().base_url);
    }

    #[test]
    fn test_cli_parse_exec_and_cases() {
        let cli = Cli::try_parse_from(["unitgen", "exec", "calc.py", "cases.txt", "--fail-on-error"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Exec { exec: ExecArgs { fail_on_error: true, .. }, .. })));

        let cli = Cli::try_parse_from(["unitgen", "cases", "cases.txt", "-v"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Cases { verbose: true, .. })));
    }

    #[test]
    fn test_cli_parse_debug_flags() {
        let cli = Cli::try_parse_from(["unitgen", "--lex", "calc.py"]).unwrap();
        assert!(cli.lex_file.is_some());

        let cli = Cli::try_parse_from(["unitgen", "--parse", "calc.py"]).unwrap();
        assert!(cli.parse_file.is_some());

        assert!(Cli::try_parse_from(["unitgen", "--lex", "a.py", "--parse", "b.py"]).is_err());
    }

    #[test]
    fn test_no_command_is_an_error() {
        let cli = Cli::try_parse_from(["unitgen"]).unwrap();
        assert!(execute(cli).is_err());
    }
}
