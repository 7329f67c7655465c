//! Define shared string and sequence semantics (policy + pure helpers).
//!
//! This module holds **pure/deterministic** helpers used by both the argument evaluator and the module runtime
//! to avoid semantic drift between case literals and target code.
//!
//! ## Notes
//! - **Indexing model**: Unicode scalar indexing (Rust `char`), not bytes or grapheme clusters.
//! - **Negative indices**: supported (Python-style): `s[-1]` is the last element.
//! - **Slicing**: Python-like `start`, `end`, `step` (default `step = 1`), with negative indices and bounds
//!   clamping. The same index computation serves strings, lists and tuples.

/// Describe an index-out-of-range error message.
pub const INDEX_OUT_OF_RANGE_MSG: &str = "index out of range";
/// Describe a slice step-zero error message.
pub const SLICE_STEP_ZERO_MSG: &str = "slice step cannot be zero";

/// Represent sequence access errors produced by semantic-core helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    IndexOutOfRange,
    SliceStepZero,
}

impl SequenceError {
    /// Return the shared user-facing message for this error.
    pub fn message(self) -> &'static str {
        match self {
            SequenceError::IndexOutOfRange => INDEX_OUT_OF_RANGE_MSG,
            SequenceError::SliceStepZero => SLICE_STEP_ZERO_MSG,
        }
    }
}

/// Normalize an index (supports negatives). Returns `None` if out of range.
///
/// ## Examples
/// ```rust
/// use unitgen_core::strings::normalize_index;
///
/// assert_eq!(normalize_index(3, -1), Some(2));
/// assert_eq!(normalize_index(3, 3), None);
/// ```
pub fn normalize_index(len: usize, idx: i64) -> Option<usize> {
    let len_i = len as i64;
    let i = if idx < 0 { idx + len_i } else { idx };
    if i < 0 || i >= len_i { None } else { Some(i as usize) }
}

/// Compute the element positions selected by a Python-like slice.
///
/// ## Parameters
/// - `len`: Length of the sequence being sliced.
/// - `start`: Optional start index (inclusive).
/// - `end`: Optional end index (exclusive).
/// - `step`: Optional step; defaults to `1`. Negative steps slice backwards.
///
/// ## Returns
/// - `Ok(Vec<usize>)`: Positions in selection order.
/// - `Err(SequenceError::SliceStepZero)`: If `step == 0`.
pub fn slice_indices(
    len: usize,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<usize>, SequenceError> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(SequenceError::SliceStepZero);
    }

    let len = len as i64;
    let default_start = if step > 0 { 0 } else { len - 1 };
    let default_end = if step > 0 { len } else { -1 };

    let mut start_idx = start.unwrap_or(default_start);
    let mut end_idx = end.unwrap_or(default_end);

    if start.is_some() && start_idx < 0 {
        start_idx += len;
    }
    if end.is_some() && end_idx < 0 {
        end_idx += len;
    }

    if step > 0 {
        start_idx = start_idx.clamp(0, len);
        end_idx = end_idx.clamp(0, len);
    } else {
        start_idx = start_idx.clamp(-1, len - 1);
        end_idx = end_idx.clamp(-1, len - 1);
    }

    let mut out = Vec::new();
    let mut i = start_idx;
    if step > 0 {
        while i < end_idx {
            out.push(i as usize);
            i += step;
        }
    } else {
        while i > end_idx {
            out.push(i as usize);
            i += step;
        }
    }
    Ok(out)
}

/// Index a string by Unicode scalar index.
///
/// ## Returns
/// - `Ok(String)`: Single-character string (one Unicode scalar).
/// - `Err(SequenceError)`: If the index is out of range.
pub fn str_char_at(s: &str, idx: i64) -> Result<String, SequenceError> {
    let len = s.chars().count();
    normalize_index(len, idx)
        .and_then(|pos| s.chars().nth(pos))
        .map(|ch| ch.to_string())
        .ok_or(SequenceError::IndexOutOfRange)
}

/// Slice a string over Unicode scalars (Python-like semantics).
pub fn str_slice(s: &str, start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Result<String, SequenceError> {
    let chars: Vec<char> = s.chars().collect();
    let positions = slice_indices(chars.len(), start, end, step)?;
    Ok(positions.into_iter().filter_map(|i| chars.get(i)).collect())
}

/// Split a string Python-style.
///
/// ## Notes
/// - With `sep = None`, splits on runs of whitespace and drops empty parts (`str.split()`).
/// - With `sep = Some(..)`, splits on every occurrence and keeps empty parts (`str.split(sep)`).
pub fn str_split(s: &str, sep: Option<&str>) -> Vec<String> {
    match sep {
        Some(sep) => s.split(sep).map(|p| p.to_string()).collect(),
        None => s.split_whitespace().map(|p| p.to_string()).collect(),
    }
}

/// Title-case a string (`str.title()`): first letter of each alphabetic run upper, the rest lower.
pub fn str_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Capitalize a string (`str.capitalize()`): first scalar upper, the rest lower.
pub fn str_capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Render a string the way Python's `repr(str)` does.
///
/// ## Notes
/// - Single quotes are used unless the string contains `'` and no `"`.
/// - Backslash, the chosen quote, and control characters are escaped.
///
/// ## Examples
/// ```rust
/// use unitgen_core::strings::str_repr;
///
/// assert_eq!(str_repr("abc"), "'abc'");
/// assert_eq!(str_repr("it's"), "\"it's\"");
/// assert_eq!(str_repr("a\nb"), "'a\\nb'");
/// ```
pub fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_indices_forward_and_backward() {
        assert_eq!(slice_indices(5, Some(1), Some(3), None).unwrap(), vec![1, 2]);
        assert_eq!(slice_indices(5, None, None, Some(-1)).unwrap(), vec![4, 3, 2, 1, 0]);
        assert_eq!(slice_indices(5, Some(-2), None, None).unwrap(), vec![3, 4]);
        assert_eq!(slice_indices(5, None, None, Some(2)).unwrap(), vec![0, 2, 4]);
        assert_eq!(slice_indices(3, Some(10), None, None).unwrap(), Vec::<usize>::new());
        assert_eq!(slice_indices(3, None, None, Some(0)), Err(SequenceError::SliceStepZero));
    }

    #[test]
    fn test_str_char_at_negative() {
        assert_eq!(str_char_at("héllo", 1).unwrap(), "é");
        assert_eq!(str_char_at("abc", -1).unwrap(), "c");
        assert_eq!(str_char_at("abc", 3), Err(SequenceError::IndexOutOfRange));
    }

    #[test]
    fn test_str_slice_reverse() {
        assert_eq!(str_slice("hello", None, None, Some(-1)).unwrap(), "olleh");
        assert_eq!(str_slice("hello", Some(1), Some(-1), None).unwrap(), "ell");
    }

    #[test]
    fn test_str_split_modes() {
        assert_eq!(str_split("  a  b ", None), vec!["a", "b"]);
        assert_eq!(str_split("a,,b", Some(",")), vec!["a", "", "b"]);
    }

    #[test]
    fn test_title_and_capitalize() {
        assert_eq!(str_title("hello wORLD"), "Hello World");
        assert_eq!(str_capitalize("hELLO"), "Hello");
        assert_eq!(str_capitalize(""), "");
    }

    #[test]
    fn test_str_repr_quoting() {
        assert_eq!(str_repr(""), "''");
        assert_eq!(str_repr("both ' and \""), "'both \\' and \"'");
        assert_eq!(str_repr("tab\there"), "'tab\\there'");
    }
}
