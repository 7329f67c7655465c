//! Per-invocation results and their report lines.

use std::fmt;

use crate::cases::ParsedInvocation;
use crate::runtime::Value;

/// Whether an invocation returned or raised.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    Success(Value),
    /// `str(exception)`, or the limit that was exceeded.
    Failure(String),
}

/// The result of running one [`ParsedInvocation`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    invocation: ParsedInvocation,
    status: OutcomeStatus,
    /// `str(value)` for a success, rendered while the module was still borrowed.
    rendered: String,
    output: String,
}

impl ExecutionOutcome {
    pub(crate) fn success(invocation: ParsedInvocation, value: Value, rendered: String, output: String) -> Self {
        Self {
            invocation,
            status: OutcomeStatus::Success(value),
            rendered,
            output,
        }
    }

    pub(crate) fn failure(invocation: ParsedInvocation, message: String, output: String) -> Self {
        Self {
            invocation,
            status: OutcomeStatus::Failure(message),
            rendered: String::new(),
            output,
        }
    }

    pub fn invocation(&self) -> &ParsedInvocation {
        &self.invocation
    }

    pub fn function_name(&self) -> &str {
        self.invocation.function_name()
    }

    pub fn arguments(&self) -> &[Value] {
        self.invocation.arguments()
    }

    pub fn status(&self) -> &OutcomeStatus {
        &self.status
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success(_))
    }

    /// Text the call printed.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// `name(args) = result` or `Error executing name(args): message`.
    pub fn report_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            OutcomeStatus::Success(_) => write!(f, "{} = {}", self.invocation, self.rendered),
            OutcomeStatus::Failure(message) => write!(f, "Error executing {}: {message}", self.invocation),
        }
    }
}

/// The report as exported: one line per outcome, newline-terminated.
pub fn report_text(outcomes: &[ExecutionOutcome]) -> String {
    outcomes.iter().map(|o| format!("{o}\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> ParsedInvocation {
        ParsedInvocation::new("greet", vec![Value::str("Bob"), Value::Int(2)]).unwrap()
    }

    #[test]
    fn test_report_lines() {
        let ok = ExecutionOutcome::success(invocation(), Value::str("hi"), "hi".to_string(), String::new());
        let err = ExecutionOutcome::failure(invocation(), "boom".to_string(), String::new());
        let text = report_text(&[ok, err]);
        assert!(text.ends_with('\n'));
        insta::assert_snapshot!(text.trim_end(), @r"
        greet('Bob', 2) = hi
        Error executing greet('Bob', 2): boom
        ");
    }

    #[test]
    fn test_accessors() {
        let err = ExecutionOutcome::failure(invocation(), "boom".to_string(), "printed\n".to_string());
        assert!(!err.is_success());
        assert_eq!(err.function_name(), "greet");
        assert_eq!(err.arguments().len(), 2);
        assert_eq!(err.output(), "printed\n");
        assert_eq!(err.status(), &OutcomeStatus::Failure("boom".to_string()));
    }
}
