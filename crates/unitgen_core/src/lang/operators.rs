//! Operator vocabulary.
//!
//! This module defines the canonical operator set (symbol operators like `+` and word operators like `and`)
//! along with precedence, associativity, and fixity.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Some operators are spelled using reserved words (e.g. `"and"`). Those entries have
//!   [`OperatorInfo::is_keyword_spelling`] set to `true`; the lexer emits them as keyword tokens.
//! - Precedence follows Python: `or` < `and` < `not` < comparisons < `+ -` < `* / // %` < unary `-` < `**`.
//!
//! ## Examples
//! ```rust
//! use unitgen_core::lang::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_str("//"), Some(OperatorId::SlashSlash));
//! assert!(operators::info_for(OperatorId::Star).precedence > operators::info_for(OperatorId::Plus).precedence);
//! ```

/// Define how operators associate when chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
    /// Comparisons chain (`a < b < c`) instead of associating.
    Chain,
}

/// Define whether an operator is infix (binary), prefix (unary), or an assignment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Infix,
    Prefix,
    Assignment,
}

/// Stable identifier for every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Arithmetic
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    SlashSlashEq,
    PercentEq,

    // Word operators
    And,
    Or,
    Not,
    In,
    Is,
}

/// Metadata for an operator.
///
/// ## Notes
/// - `precedence` is a relative ordering where higher binds tighter. Assignment forms use `0`.
/// - `Minus`/`Plus` are infix in this table; their prefix use binds at [`UNARY_PRECEDENCE`].
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spellings: &'static [&'static str],
    pub precedence: u8,
    pub associativity: Associativity,
    pub fixity: Fixity,
    pub is_keyword_spelling: bool,
}

/// Binding power of prefix `-` / `+` (between `*` and `**`).
pub const UNARY_PRECEDENCE: u8 = 70;

/// Registry of all operators.
pub const OPERATORS: &[OperatorInfo] = &[
    // Arithmetic
    op(OperatorId::Plus, &["+"], 50, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Minus, &["-"], 50, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Star, &["*"], 60, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::StarStar, &["**"], 80, Associativity::Right, Fixity::Infix, false),
    op(OperatorId::Slash, &["/"], 60, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::SlashSlash, &["//"], 60, Associativity::Left, Fixity::Infix, false),
    op(OperatorId::Percent, &["%"], 60, Associativity::Left, Fixity::Infix, false),
    // Comparison
    op(OperatorId::EqEq, &["=="], 40, Associativity::Chain, Fixity::Infix, false),
    op(OperatorId::NotEq, &["!="], 40, Associativity::Chain, Fixity::Infix, false),
    op(OperatorId::Lt, &["<"], 40, Associativity::Chain, Fixity::Infix, false),
    op(OperatorId::LtEq, &["<="], 40, Associativity::Chain, Fixity::Infix, false),
    op(OperatorId::Gt, &[">"], 40, Associativity::Chain, Fixity::Infix, false),
    op(OperatorId::GtEq, &[">="], 40, Associativity::Chain, Fixity::Infix, false),
    // Assignment
    op(OperatorId::Eq, &["="], 0, Associativity::Right, Fixity::Assignment, false),
    op(OperatorId::PlusEq, &["+="], 0, Associativity::Right, Fixity::Assignment, false),
    op(OperatorId::MinusEq, &["-="], 0, Associativity::Right, Fixity::Assignment, false),
    op(OperatorId::StarEq, &["*="], 0, Associativity::Right, Fixity::Assignment, false),
    op(OperatorId::SlashEq, &["/="], 0, Associativity::Right, Fixity::Assignment, false),
    op(OperatorId::SlashSlashEq, &["//="], 0, Associativity::Right, Fixity::Assignment, false),
    op(OperatorId::PercentEq, &["%="], 0, Associativity::Right, Fixity::Assignment, false),
    // Word operators (keyword spellings)
    op(OperatorId::Or, &["or"], 10, Associativity::Left, Fixity::Infix, true),
    op(OperatorId::And, &["and"], 20, Associativity::Left, Fixity::Infix, true),
    op(OperatorId::Not, &["not"], 30, Associativity::Right, Fixity::Prefix, true),
    op(OperatorId::In, &["in"], 40, Associativity::Chain, Fixity::Infix, true),
    op(OperatorId::Is, &["is"], 40, Associativity::Chain, Fixity::Infix, true),
];

/// Return the full metadata entry for an operator.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    OPERATORS.iter().find(|o| o.id == id).expect("operator info missing")
}

/// Return the primary spelling of an operator.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spellings.first().copied().unwrap_or("")
}

/// Resolve an operator spelling to its identifier.
pub fn from_str(spelling: &str) -> Option<OperatorId> {
    OPERATORS
        .iter()
        .find(|o| {
            let spellings: &[&str] = o.spellings;
            spellings.contains(&spelling)
        })
        .map(|o| o.id)
}

// --- helpers -----------------------------------------------------------------

const fn op(
    id: OperatorId,
    spellings: &'static [&'static str],
    precedence: u8,
    associativity: Associativity,
    fixity: Fixity,
    is_keyword_spelling: bool,
) -> OperatorInfo {
    OperatorInfo {
        id,
        spellings,
        precedence,
        associativity,
        fixity,
        is_keyword_spelling,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_precedence_ladder() {
        let p = |id| info_for(id).precedence;
        assert!(p(OperatorId::Or) < p(OperatorId::And));
        assert!(p(OperatorId::And) < p(OperatorId::Not));
        assert!(p(OperatorId::Not) < p(OperatorId::Lt));
        assert!(p(OperatorId::Lt) < p(OperatorId::Plus));
        assert!(p(OperatorId::Plus) < p(OperatorId::Star));
        assert!(p(OperatorId::Star) < UNARY_PRECEDENCE);
        assert!(UNARY_PRECEDENCE < p(OperatorId::StarStar));
    }

    #[test]
    fn test_keyword_spelled_operators_are_keywords() {
        use crate::lang::keywords;

        for o in OPERATORS.iter().filter(|o| o.is_keyword_spelling) {
            for sp in o.spellings {
                assert!(keywords::from_str(sp).is_some(), "{sp} should be a keyword");
            }
        }
    }
}
