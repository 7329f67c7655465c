//! Define the reserved keyword vocabulary for target modules and case lines.
//!
//! This module is the single source of truth for reserved words: a stable identifier ([`KeywordId`]) plus a
//! const metadata table ([`KEYWORDS`]) that records canonical spellings and categories.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Some reserved words are also “word operators” (e.g. `and`). If you need operator precedence, use
//!   [`crate::lang::operators`].
//! - Keywords in [`KeywordCategory::Reserved`] are recognised so the parser can reject them with a clear
//!   message; the runtime does not implement them.
//!
//! ## Examples
//! ```rust
//! use unitgen_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("def"), Some(KeywordId::Def));
//! assert_eq!(keywords::as_str(KeywordId::Def), "def");
//! assert_eq!(keywords::from_str("Def"), None);
//! ```

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Control flow / statements
    If,
    Else,
    Elif,
    While,
    For,
    Break,
    Continue,
    Return,
    Pass,
    Raise,
    Try,
    Except,
    Finally,
    Assert,

    // Definitions / scoping
    Def,
    Class,
    Lambda,
    Global,

    // Imports
    Import,
    From,
    As,

    // Literals
    True,
    False,
    None,

    // Word operators
    And,
    Or,
    Not,
    In,
    Is,

    // Reserved, not executable
    With,
    Yield,
    Async,
    Await,
    Del,
    Nonlocal,
}

/// High-level grouping for diagnostics and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    ControlFlow,
    Definition,
    Import,
    Literal,
    Operator,
    /// Spelled like a keyword so it cannot be used as a name, but rejected by the parser.
    Reserved,
}

/// Metadata for a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
}

/// Registry of all keywords.
///
/// ## Notes
/// - The ordering is not semantically meaningful, but is grouped for readability.
pub const KEYWORDS: &[KeywordInfo] = &[
    // Control flow / statements
    info(KeywordId::If, "if", KeywordCategory::ControlFlow),
    info(KeywordId::Else, "else", KeywordCategory::ControlFlow),
    info(KeywordId::Elif, "elif", KeywordCategory::ControlFlow),
    info(KeywordId::While, "while", KeywordCategory::ControlFlow),
    info(KeywordId::For, "for", KeywordCategory::ControlFlow),
    info(KeywordId::Break, "break", KeywordCategory::ControlFlow),
    info(KeywordId::Continue, "continue", KeywordCategory::ControlFlow),
    info(KeywordId::Return, "return", KeywordCategory::ControlFlow),
    info(KeywordId::Pass, "pass", KeywordCategory::ControlFlow),
    info(KeywordId::Raise, "raise", KeywordCategory::ControlFlow),
    info(KeywordId::Try, "try", KeywordCategory::ControlFlow),
    info(KeywordId::Except, "except", KeywordCategory::ControlFlow),
    info(KeywordId::Finally, "finally", KeywordCategory::ControlFlow),
    info(KeywordId::Assert, "assert", KeywordCategory::ControlFlow),
    // Definitions / scoping
    info(KeywordId::Def, "def", KeywordCategory::Definition),
    info(KeywordId::Class, "class", KeywordCategory::Definition),
    info(KeywordId::Lambda, "lambda", KeywordCategory::Definition),
    info(KeywordId::Global, "global", KeywordCategory::Definition),
    // Imports
    info(KeywordId::Import, "import", KeywordCategory::Import),
    info(KeywordId::From, "from", KeywordCategory::Import),
    info(KeywordId::As, "as", KeywordCategory::Import),
    // Literals
    info(KeywordId::True, "True", KeywordCategory::Literal),
    info(KeywordId::False, "False", KeywordCategory::Literal),
    info(KeywordId::None, "None", KeywordCategory::Literal),
    // Word operators
    info(KeywordId::And, "and", KeywordCategory::Operator),
    info(KeywordId::Or, "or", KeywordCategory::Operator),
    info(KeywordId::Not, "not", KeywordCategory::Operator),
    info(KeywordId::In, "in", KeywordCategory::Operator),
    info(KeywordId::Is, "is", KeywordCategory::Operator),
    // Reserved
    info(KeywordId::With, "with", KeywordCategory::Reserved),
    info(KeywordId::Yield, "yield", KeywordCategory::Reserved),
    info(KeywordId::Async, "async", KeywordCategory::Reserved),
    info(KeywordId::Await, "await", KeywordCategory::Reserved),
    info(KeywordId::Del, "del", KeywordCategory::Reserved),
    info(KeywordId::Nonlocal, "nonlocal", KeywordCategory::Reserved),
];

/// Canonical spelling of a keyword.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Category of a keyword.
pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS.iter().find(|k| k.id == id).expect("keyword info missing")
}

/// Lookup by spelling.
///
/// ## Returns
/// - `Some(KeywordId)` if the spelling is reserved.
/// - `None` otherwise.
pub fn from_str(s: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == s).map(|k| k.id)
}

// --- helpers -----------------------------------------------------------------

const fn info(id: KeywordId, canonical: &'static str, category: KeywordCategory) -> KeywordInfo {
    KeywordInfo { id, canonical, category }
}
