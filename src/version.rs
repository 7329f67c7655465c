//! unitgen version information.
//!
//! The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time so the CLI `--version` output and
//! the HTTP user agent agree.

/// The unitgen version string (for example, `0.1.0-alpha.4`).
pub const UNITGEN_VERSION: &str = env!("CARGO_PKG_VERSION");
