//! Case generation: source text in, raw case text out.
//!
//! [`CaseGenerator`] is the seam between the session driver and whatever writes the cases. The text it
//! returns is untrusted; [`crate::cases`] decides which lines are usable.
//!
//! ## Notes
//! - [`OpenAiGenerator`] asks an OpenAI-compatible chat endpoint, blocking, with a request timeout.
//! - [`FixedGenerator`] returns text it was given (a case file, or a test fixture).
//! - Replies are passed on verbatim, code fences included; the case parser drops fence lines.
//!
//! ## See also
//! - [`prompt`] – the instruction template sent with the source
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod openai;
pub mod prompt;

use thiserror::Error;

pub use openai::{GeneratorConfig, OpenAiGenerator};

/// Why no case text was produced.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("request to the model endpoint failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned no content")]
    EmptyResponse,

    #[error("could not decode the model response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Produces newline-separated case lines for a module's source.
pub trait CaseGenerator {
    fn generate(&self, source: &str) -> Result<String, GenerateError>;
}

/// Returns the same text for every source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedGenerator(pub String);

impl CaseGenerator for FixedGenerator {
    fn generate(&self, _source: &str) -> Result<String, GenerateError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_generator_ignores_source() {
        let generator = FixedGenerator("add(1, 2)\n".to_string());
        assert_eq!(generator.generate("def add(a, b): ...").unwrap(), "add(1, 2)\n");
    }
}
