//! Outcome reporting for the session driver.
//!
//! ## OutcomeReporter Trait
//!
//! Execution and presentation are separate: the session feeds skipped lines and outcomes to an
//! [`OutcomeReporter`], which decides how they look. [`ConsoleReporter`] is the default.

use std::io::{self, IsTerminal, Write};

use crate::cases::SkippedLine;
use crate::harness::ExecutionOutcome;

/// Receives a batch as it is processed.
pub trait OutcomeReporter {
    /// Called once the cases are parsed, before anything runs
    fn on_batch_start(&mut self, _module: &str, _cases: usize) {}

    /// Called for each case line that produced no invocation
    fn on_skipped(&mut self, skipped: &SkippedLine);

    /// Called for each executed invocation, in order
    fn on_outcome(&mut self, outcome: &ExecutionOutcome);

    /// Called after the last outcome
    fn on_batch_complete(&mut self, summary: &BatchSummary);
}

/// Counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn new(outcomes: &[ExecutionOutcome], skipped: usize) -> Self {
        let passed = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            passed,
            failed: outcomes.len() - passed,
            skipped,
        }
    }
}

/// Report lines on a writer (stdout by default), summary and skips on stderr.
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    verbose: bool,
    color: bool,
}

impl ConsoleReporter {
    /// Stdout, coloured when it is a terminal.
    pub fn new(verbose: bool) -> Self {
        let out = io::stdout();
        let color = out.is_terminal();
        Self { out, verbose, color }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W, verbose: bool, color: bool) -> Self {
        Self { out, verbose, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn line(&mut self, text: &str) {
        // Write errors (a closed pipe) are ignored.
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write> OutcomeReporter for ConsoleReporter<W> {
    fn on_batch_start(&mut self, module: &str, cases: usize) {
        if self.verbose {
            eprintln!("running {cases} case(s) against '{module}'");
        }
    }

    fn on_skipped(&mut self, skipped: &SkippedLine) {
        if self.verbose {
            let label = self.paint("33", "skipped");
            eprintln!("{label} line {}: {} ({})", skipped.line_number, skipped.text.trim(), skipped.reason);
        }
    }

    fn on_outcome(&mut self, outcome: &ExecutionOutcome) {
        let code = if outcome.is_success() { "32" } else { "31" };
        let line = self.paint(code, &outcome.report_line());
        self.line(&line);
        if self.verbose && !outcome.output().is_empty() {
            for printed in outcome.output().lines() {
                self.line(&format!("    | {printed}"));
            }
        }
    }

    fn on_batch_complete(&mut self, summary: &BatchSummary) {
        let text = format!(
            "{} passed, {} failed, {} skipped",
            summary.passed, summary.failed, summary.skipped
        );
        let text = if summary.failed > 0 { self.paint("31", &text) } else { self.paint("32", &text) };
        let _ = self.out.flush();
        eprintln!("{text}");
    }
}
