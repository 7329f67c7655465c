//! Shareable metadata for `unitgen_core::lang` registries.
//!
//! The `unitgen_core::lang` module is a set of **registry-first** vocabularies: keywords, operators, builtin
//! functions, exception kinds, etc. This submodule provides the small, dependency-free metadata type and lookup
//! helper reused across all registries.
//!
//! ## Notes
//! - These types are intentionally lightweight and `Copy`-friendly so registries can live in `const` tables.
//! - Metadata is meant for tooling/diagnostics; enforcement of syntax rules still lives in the lexer/parser.

/// Shared metadata shape for “registry-first” vocabulary items.
///
/// Many vocabularies share the same core fields:
/// - stable identity (`id`)
/// - accepted spellings (`canonical` + `aliases`)
/// - documentation (`description`)
///
/// Registries that need extra per-item data (e.g. operator precedence, builtin arity) wrap this struct or
/// define their own info type.
#[derive(Debug, Clone, Copy)]
pub struct LangItemInfo<Id> {
    pub id: Id,
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
}

impl<Id> LangItemInfo<Id> {
    /// Return `true` if `spelling` is the canonical spelling or one of the aliases.
    pub fn matches(&self, spelling: &str) -> bool {
        self.canonical == spelling || self.aliases.contains(&spelling)
    }
}

/// Resolve a spelling against a registry table, preferring canonical spellings over aliases.
///
/// ## Examples
/// ```rust
/// use unitgen_core::lang::registry::{lookup, LangItemInfo};
///
/// const ITEMS: &[LangItemInfo<u8>] = &[
///     LangItemInfo { id: 1, canonical: "one", aliases: &["uno"], description: "1" },
/// ];
/// assert_eq!(lookup(ITEMS, "uno"), Some(1));
/// assert_eq!(lookup(ITEMS, "two"), None);
/// ```
pub fn lookup<Id: Copy>(items: &[LangItemInfo<Id>], spelling: &str) -> Option<Id> {
    items
        .iter()
        .find(|item| item.canonical == spelling)
        .or_else(|| items.iter().find(|item| item.matches(spelling)))
        .map(|item| item.id)
}
