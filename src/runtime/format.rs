//! String formatting: the format-spec mini-language, `str.format` templates and printf-style `%`.
//!
//! Three entry points share one spec model ([`FormatSpec`]):
//! - [`format_value`]: `f"{x:>8.2f}"` and `format(x, spec)`
//! - [`parse_template`] / [`render_template`]: `"{} {name!r:^5}".format(...)`
//! - [`percent_format`]: `"%s=%.2f" % (k, v)`
//!
//! ## Notes
//! - Supported spec grammar: `[[fill]align][sign][#][0][width][,|_][.precision][type]` with types
//!   `s d n x X o b c e E f F g G %`.
//! - The caller supplies `str(value)` as `text`; this module never runs target code itself.

use unitgen_core::errors::ErrorKind;
use unitgen_core::format_float_repr;

use num_traits::{Signed, ToPrimitive};

use super::bigint;
use super::error::Exception;
use super::math::float_to_int;
use super::value::Value;

// ============================================================================
// Format specs
// ============================================================================

/// A parsed format specification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<char>,
    pub sign: Option<char>,
    pub alternate: bool,
    pub zero: bool,
    pub width: Option<usize>,
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub ty: Option<char>,
}

fn invalid_spec() -> Exception {
    Exception::value_error("Invalid format specifier")
}

/// Parse a spec such as `>10.3f`.
pub fn parse_spec(spec: &str) -> Result<FormatSpec, Exception> {
    let chars: Vec<char> = spec.chars().collect();
    let mut out = FormatSpec::default();
    let mut i = 0;
    let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');

    if chars.len() >= 2 && is_align(chars[1]) {
        out.fill = Some(chars[0]);
        out.align = Some(chars[1]);
        i = 2;
    } else if chars.first().copied().is_some_and(is_align) {
        out.align = Some(chars[0]);
        i = 1;
    }
    if let Some(&c @ ('+' | '-' | ' ')) = chars.get(i) {
        out.sign = Some(c);
        i += 1;
    }
    if chars.get(i) == Some(&'#') {
        out.alternate = true;
        i += 1;
    }
    if chars.get(i) == Some(&'0') {
        out.zero = true;
        i += 1;
    }
    let width_start = i;
    while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }
    if i > width_start {
        out.width = Some(digits(&chars[width_start..i])?);
    }
    if let Some(&c @ (',' | '_')) = chars.get(i) {
        out.grouping = Some(c);
        i += 1;
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i == start {
            return Err(Exception::value_error("Format specifier missing precision"));
        }
        out.precision = Some(digits(&chars[start..i])?);
    }
    if let Some(&c) = chars.get(i) {
        out.ty = Some(c);
        i += 1;
    }
    if i != chars.len() {
        return Err(invalid_spec());
    }
    Ok(out)
}

fn digits(chars: &[char]) -> Result<usize, Exception> {
    chars
        .iter()
        .collect::<String>()
        .parse()
        .map_err(|_| Exception::value_error("Too many decimal digits in format string"))
}

/// Format `value` under `spec`; `text` is `str(value)`, used for non-numeric values.
pub fn format_value(value: &Value, spec: &str, text: &str) -> Result<String, Exception> {
    if spec.is_empty() {
        return Ok(text.to_string());
    }
    apply_spec(value, &parse_spec(spec)?, text)
}

fn unknown_code(ty: char, value: &Value) -> Exception {
    Exception::value_error(format!(
        "Unknown format code '{ty}' for object of type '{}'",
        value.type_name()
    ))
}

fn apply_spec(value: &Value, spec: &FormatSpec, text: &str) -> Result<String, Exception> {
    let numeric = match value {
        Value::Bool(_) if spec.ty.is_none() => None,
        Value::Int(_) | Value::BigInt(_) | Value::Bool(_) => Some(format_int(value, spec)?),
        Value::Float(f) => Some(format_float(*f, spec, value)?),
        _ => None,
    };

    let Some((sign, body)) = numeric else {
        if let Some(ty) = spec.ty.filter(|t| *t != 's') {
            return Err(unknown_code(ty, value));
        }
        if spec.sign.is_some() {
            return Err(Exception::value_error("Sign not allowed in string format specifier"));
        }
        let truncated: String = match spec.precision {
            Some(p) => text.chars().take(p).collect(),
            None => text.to_string(),
        };
        return Ok(pad(&truncated, "", spec, '<'));
    };
    Ok(pad(&body, &sign, spec, '>'))
}

/// Returns `(sign, digits)` so padding can place fill between them for `=` alignment.
fn format_int(value: &Value, spec: &FormatSpec) -> Result<(String, String), Exception> {
    let n = value.as_bigint().unwrap_or_default();
    let ty = spec.ty.unwrap_or('d');
    if matches!(ty, 'e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') {
        return format_float(bigint::to_f64(&n)?, spec, value);
    }
    if spec.precision.is_some() {
        return Err(Exception::value_error("Precision not allowed in integer format specifier"));
    }
    let magnitude = n.magnitude();
    let (prefix, digits) = match ty {
        'd' | 'n' => ("", magnitude.to_string()),
        'x' => ("0x", format!("{magnitude:x}")),
        'X' => ("0X", format!("{magnitude:X}")),
        'o' => ("0o", format!("{magnitude:o}")),
        'b' => ("0b", format!("{magnitude:b}")),
        'c' => {
            let c = n
                .to_u32()
                .and_then(char::from_u32)
                .ok_or_else(|| Exception::new(ErrorKind::OverflowError, "%c arg not in range(0x110000)"))?;
            return Ok((String::new(), c.to_string()));
        }
        other => return Err(unknown_code(other, value)),
    };
    let digits = match (spec.grouping, ty) {
        (Some(sep), 'd' | 'n') => group(&digits, sep, 3),
        (Some('_'), _) => group(&digits, '_', 4),
        _ => digits,
    };
    let prefix = if spec.alternate { prefix } else { "" };
    Ok((sign_for(n.is_negative(), spec.sign), format!("{prefix}{digits}")))
}

fn format_float(f: f64, spec: &FormatSpec, value: &Value) -> Result<(String, String), Exception> {
    let negative = f.is_sign_negative();
    let magnitude = f.abs();
    let ty = spec.ty;
    let body = if !magnitude.is_finite() {
        let word = if magnitude.is_nan() { "nan" } else { "inf" };
        if matches!(ty, Some('E' | 'F' | 'G')) {
            word.to_uppercase()
        } else {
            word.to_string()
        }
    } else {
        match ty {
            None if spec.precision.is_none() => format_float_repr(magnitude),
            None => general(magnitude, spec.precision.unwrap_or(6), spec.alternate, true),
            Some('f' | 'F') => format!("{:.*}", spec.precision.unwrap_or(6), magnitude),
            Some('e') => exponent(magnitude, spec.precision.unwrap_or(6)),
            Some('E') => exponent(magnitude, spec.precision.unwrap_or(6)).to_uppercase(),
            Some('g') => general(magnitude, spec.precision.unwrap_or(6), spec.alternate, false),
            Some('G') => general(magnitude, spec.precision.unwrap_or(6), spec.alternate, false).to_uppercase(),
            Some('%') => format!("{:.*}%", spec.precision.unwrap_or(6), magnitude * 100.0),
            Some(other) => return Err(unknown_code(other, value)),
        }
    };
    let body = match spec.grouping {
        Some(sep) => group_float(&body, sep),
        None => body,
    };
    Ok((sign_for(negative && !f.is_nan(), spec.sign), body))
}

fn sign_for(negative: bool, sign: Option<char>) -> String {
    match (negative, sign) {
        (true, _) => "-".to_string(),
        (false, Some('+')) => "+".to_string(),
        (false, Some(' ')) => " ".to_string(),
        _ => String::new(),
    }
}

/// Python `e` formatting: mantissa with `precision` digits, exponent with a sign and at least two digits.
fn exponent(f: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, f);
    let (mantissa, exp) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let exp_sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{exp_sign}{:02}", exp.abs())
}

/// Python `g` formatting (and the no-type form when `keep_point` is set).
fn general(f: f64, precision: usize, alternate: bool, keep_point: bool) -> String {
    let p = precision.max(1);
    if f == 0.0 {
        return if keep_point { "0.0".to_string() } else { "0".to_string() };
    }
    let sci = format!("{:.*e}", p - 1, f);
    let exp: i32 = sci.split_once('e').and_then(|(_, e)| e.parse().ok()).unwrap_or(0);
    if exp >= -4 && exp < p as i32 {
        let decimals = (p as i32 - 1 - exp).max(0) as usize;
        let fixed = format!("{:.*}", decimals, f);
        if alternate {
            return fixed;
        }
        let trimmed = strip_zeros(&fixed);
        if keep_point && !trimmed.contains('.') {
            format!("{trimmed}.0")
        } else {
            trimmed
        }
    } else {
        let formatted = exponent(f, p - 1);
        if alternate {
            return formatted;
        }
        match formatted.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{exp}", strip_zeros(mantissa)),
            None => formatted,
        }
    }
}

fn strip_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

fn group(digits: &str, sep: char, every: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(digits.len() + digits.len() / every);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % every == 0 {
            out.push(sep);
        }
        out.push(*c);
    }
    out
}

fn group_float(body: &str, sep: char) -> String {
    let split = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
    let (int_part, rest) = body.split_at(split);
    format!("{}{rest}", group(int_part, sep, 3))
}

/// Pad `sign + body` to the spec width. `default_align` is `>` for numbers, `<` for strings.
fn pad(body: &str, sign: &str, spec: &FormatSpec, default_align: char) -> String {
    let (fill, align) = match (spec.fill, spec.align, spec.zero) {
        (fill, Some(align), _) => (fill.unwrap_or(' '), align),
        (_, None, true) if default_align == '>' => ('0', '='),
        (_, None, true) => ('0', default_align),
        (_, None, false) => (' ', default_align),
    };
    let len = sign.chars().count() + body.chars().count();
    let width = spec.width.unwrap_or(0);
    if len >= width {
        return format!("{sign}{body}");
    }
    let padding = width - len;
    let fill_str = |n: usize| fill.to_string().repeat(n);
    match align {
        '<' => format!("{sign}{body}{}", fill_str(padding)),
        '^' => format!(
            "{}{sign}{body}{}",
            fill_str(padding / 2),
            fill_str(padding - padding / 2)
        ),
        '=' => format!("{sign}{}{body}", fill_str(padding)),
        _ => format!("{}{sign}{body}", fill_str(padding)),
    }
}

// ============================================================================
// str.format templates
// ============================================================================

/// Which argument a replacement field refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKey {
    /// `{}`
    Auto,
    /// `{0}`
    Index(usize),
    /// `{name}`
    Name(String),
}

/// Piece of a `str.format` template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Field {
        key: FieldKey,
        conversion: Option<char>,
        spec: String,
    },
}

/// Split a `str.format` template into literal text and replacement fields.
pub fn parse_template(template: &str) -> Result<Vec<TemplatePart>, Exception> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(Exception::value_error("Single '}' encountered in format string")),
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    field.push(c);
                }
                if !closed {
                    return Err(Exception::value_error("expected '}' before end of string"));
                }
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(parse_field(&field)?);
            }
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }
    Ok(parts)
}

fn parse_field(field: &str) -> Result<TemplatePart, Exception> {
    let (head, spec) = match field.split_once(':') {
        Some((head, spec)) => (head, spec.to_string()),
        None => (field, String::new()),
    };
    let (name, conversion) = match head.split_once('!') {
        Some((name, conv)) => {
            let mut conv_chars = conv.chars();
            match (conv_chars.next(), conv_chars.next()) {
                (Some(c @ ('r' | 's' | 'a')), None) => (name, Some(c)),
                _ => {
                    return Err(Exception::value_error(
                        "Unknown conversion specifier in format string",
                    ));
                }
            }
        }
        None => (head, None),
    };
    let key = if name.is_empty() {
        FieldKey::Auto
    } else if let Ok(index) = name.parse::<usize>() {
        FieldKey::Index(index)
    } else {
        FieldKey::Name(name.to_string())
    };
    Ok(TemplatePart::Field { key, conversion, spec })
}

/// Render parsed template parts against positional and keyword arguments.
///
/// `render_field` receives the argument, the conversion and the spec, and produces the field text; the
/// interpreter passes a closure that honours `__str__`/`__repr__`.
pub fn render_template<E: From<Exception>>(
    parts: &[TemplatePart],
    args: &[Value],
    kwargs: &[(String, Value)],
    render_field: &mut dyn FnMut(&Value, Option<char>, &str) -> Result<String, E>,
) -> Result<String, E> {
    let mut out = String::new();
    let mut next_auto = 0usize;
    let mut used_manual = false;
    let mut used_auto = false;

    for part in parts {
        let (key, conversion, spec) = match part {
            TemplatePart::Literal(text) => {
                out.push_str(text);
                continue;
            }
            TemplatePart::Field { key, conversion, spec } => (key, *conversion, spec),
        };
        let value = match key {
            FieldKey::Auto => {
                if used_manual {
                    return Err(Exception::value_error(
                        "cannot switch from manual field specification to automatic field numbering",
                    )
                    .into());
                }
                used_auto = true;
                let index = next_auto;
                next_auto += 1;
                positional(args, index)?
            }
            FieldKey::Index(index) => {
                if used_auto {
                    return Err(Exception::value_error(
                        "cannot switch from automatic field numbering to manual field specification",
                    )
                    .into());
                }
                used_manual = true;
                positional(args, *index)?
            }
            FieldKey::Name(name) => kwargs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Exception::key_error(&Value::str(name)))?,
        };
        out.push_str(&render_field(&value, conversion, spec)?);
    }
    Ok(out)
}

fn positional(args: &[Value], index: usize) -> Result<Value, Exception> {
    args.get(index).cloned().ok_or_else(|| {
        Exception::index_error(format!(
            "Replacement index {index} out of range for positional args tuple"
        ))
    })
}

// ============================================================================
// printf-style formatting
// ============================================================================

/// `template % args` for `str` templates.
///
/// `args` is a tuple of positional values, a dict for `%(name)s` lookups, or a single value.
pub fn percent_format(template: &str, args: &Value) -> Result<String, Exception> {
    let positional: Vec<Value> = match args {
        Value::Tuple(items) => items.to_vec(),
        Value::Dict(_) => Vec::new(),
        other => vec![other.clone()],
    };
    let mapping = match args {
        Value::Dict(d) => Some(d),
        _ => None,
    };

    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut next = 0usize;
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let directive_start = i;
        i += 1;

        let mut key = None;
        if chars.get(i) == Some(&'(') {
            let close = chars[i..]
                .iter()
                .position(|c| *c == ')')
                .ok_or_else(|| Exception::value_error("incomplete format key"))?;
            key = Some(chars[i + 1..i + close].iter().collect::<String>());
            i += close + 1;
        }

        let mut spec = FormatSpec::default();
        while let Some(&flag @ ('-' | '+' | ' ' | '0' | '#')) = chars.get(i) {
            match flag {
                '-' => spec.align = Some('<'),
                '0' => spec.zero = true,
                '#' => spec.alternate = true,
                sign => spec.sign = Some(sign),
            }
            i += 1;
        }
        let width_start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i > width_start {
            spec.width = Some(digits(&chars[width_start..i])?);
        }
        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            spec.precision = Some(if i > start { digits(&chars[start..i])? } else { 0 });
        }

        let Some(&conversion) = chars.get(i) else {
            return Err(Exception::value_error("incomplete format"));
        };
        i += 1;
        if conversion == '%' {
            out.push('%');
            continue;
        }

        let value = match (&key, mapping) {
            (Some(name), Some(d)) => d
                .borrow()
                .get(&Value::str(name))?
                .ok_or_else(|| Exception::key_error(&Value::str(name)))?,
            (Some(_), None) => return Err(Exception::type_error("format requires a mapping")),
            (None, _) => {
                let value = positional
                    .get(next)
                    .cloned()
                    .ok_or_else(|| Exception::type_error("not enough arguments for format string"))?;
                next += 1;
                value
            }
        };
        out.push_str(&percent_directive(&value, conversion, spec, directive_start)?);
    }

    if mapping.is_none() && next < positional.len() {
        return Err(Exception::type_error(
            "not all arguments converted during string formatting",
        ));
    }
    Ok(out)
}

fn percent_directive(value: &Value, conversion: char, mut spec: FormatSpec, index: usize) -> Result<String, Exception> {
    if spec.zero && spec.align.is_some() {
        spec.zero = false;
    }
    match conversion {
        's' => {
            spec.sign = None;
            apply_spec(&Value::None, &spec, &value.to_str())
        }
        'r' | 'a' => {
            spec.sign = None;
            apply_spec(&Value::None, &spec, &value.repr())
        }
        'd' | 'i' | 'u' | 'x' | 'X' | 'o' | 'c' => {
            let n = match value {
                Value::Float(f) if conversion != 'c' => float_to_int(f.trunc())?,
                Value::Bool(b) => Value::Int(*b as i64),
                v if v.is_int() => v.clone(),
                other => {
                    return Err(Exception::type_error(format!(
                        "%{conversion} format: a real number is required, not {}",
                        other.type_name()
                    )));
                }
            };
            spec.ty = Some(match conversion {
                'i' | 'u' => 'd',
                c => c,
            });
            spec.precision = None;
            apply_spec(&n, &spec, "")
        }
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
            let Some(f) = value.as_float() else {
                return Err(Exception::type_error(format!(
                    "must be real number, not {}",
                    value.type_name()
                )));
            };
            spec.ty = Some(conversion);
            apply_spec(&Value::Float(f), &spec, "")
        }
        other => Err(Exception::value_error(format!(
            "unsupported format character '{other}' ({:#x}) at index {}",
            other as u32,
            index + 1
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: Value, spec: &str) -> String {
        let text = value.to_str();
        format_value(&value, spec, &text).unwrap()
    }

    #[test]
    fn test_parse_spec_fields() {
        let spec = parse_spec("*^+#010,.3f").unwrap();
        assert_eq!(spec.fill, Some('*'));
        assert_eq!(spec.align, Some('^'));
        assert_eq!(spec.sign, Some('+'));
        assert!(spec.alternate && spec.zero);
        assert_eq!(spec.width, Some(10));
        assert_eq!(spec.grouping, Some(','));
        assert_eq!(spec.precision, Some(3));
        assert_eq!(spec.ty, Some('f'));
        assert!(parse_spec("10.f").is_err());
    }

    #[test]
    fn test_float_formats() {
        assert_eq!(fmt(Value::Float(3.14159), ".2f"), "3.14");
        assert_eq!(fmt(Value::Float(1234.5), "e"), "1.234500e+03");
        assert_eq!(fmt(Value::Float(0.25), ".1%"), "25.0%");
        assert_eq!(fmt(Value::Float(1234567.0), ",.1f"), "1,234,567.0");
        assert_eq!(fmt(Value::Float(0.0001), "g"), "0.0001");
        assert_eq!(fmt(Value::Float(1e20), "g"), "1e+20");
        assert_eq!(fmt(Value::Float(3.0), ".2"), "3.0");
        assert_eq!(fmt(Value::Float(-2.5), "+"), "-2.5");
    }

    #[test]
    fn test_int_formats() {
        assert_eq!(fmt(Value::Int(42), "05d"), "00042");
        assert_eq!(fmt(Value::Int(-42), "06"), "-00042");
        assert_eq!(fmt(Value::Int(255), "#x"), "0xff");
        assert_eq!(fmt(Value::Int(5), "b"), "101");
        assert_eq!(fmt(Value::Int(1234567), ","), "1,234,567");
        assert_eq!(fmt(Value::Int(7), "+d"), "+7");
        assert_eq!(fmt(Value::Int(3), ".2f"), "3.00");
    }

    #[test]
    fn test_wide_int_formats() {
        let wide = bigint::parse_digits("18446744073709551616", 10).unwrap();
        assert_eq!(fmt(wide.clone(), ","), "18,446,744,073,709,551,616");
        assert_eq!(fmt(wide.clone(), "#x"), "0x10000000000000000");
        assert_eq!(fmt(wide.clone(), ".3e"), "1.845e+19");
        let negative = crate::runtime::ops::unary_op(unitgen_syntax::ast::UnaryOp::Neg, &wide).unwrap();
        assert_eq!(fmt(negative, "+d"), "-18446744073709551616");
    }

    #[test]
    fn test_string_alignment_and_precision() {
        assert_eq!(fmt(Value::str("ab"), ">5"), "   ab");
        assert_eq!(fmt(Value::str("ab"), "*^6"), "**ab**");
        assert_eq!(fmt(Value::str("abcdef"), ".3"), "abc");
        assert_eq!(fmt(Value::Bool(true), ">6"), "  True");
        let err = format_value(&Value::str("x"), "d", "x").unwrap_err();
        assert_eq!(err.message(), "Unknown format code 'd' for object of type 'str'");
    }

    #[test]
    fn test_template_parsing() {
        let parts = parse_template("{} and {name!r:>4} {{x}}").unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(
            parts[2],
            TemplatePart::Field {
                key: FieldKey::Name("name".to_string()),
                conversion: Some('r'),
                spec: ">4".to_string(),
            }
        );
        assert_eq!(parts[3], TemplatePart::Literal(" {x}".to_string()));
        assert!(parse_template("oops }").is_err());
        assert!(parse_template("{0").is_err());
    }

    #[test]
    fn test_render_template_numbering() {
        let parts = parse_template("{1}-{0}").unwrap();
        let args = [Value::Int(1), Value::Int(2)];
        let mut plain = |v: &Value, _: Option<char>, _: &str| Ok::<_, Exception>(v.to_str());
        assert_eq!(render_template(&parts, &args, &[], &mut plain).unwrap(), "2-1");

        let mixed = parse_template("{}{0}").unwrap();
        assert!(render_template(&mixed, &args, &[], &mut plain).is_err());
        let missing = parse_template("{5}").unwrap();
        assert!(render_template(&missing, &args, &[], &mut plain).is_err());
    }

    #[test]
    fn test_percent_format() {
        let args = Value::tuple(vec![Value::str("pi"), Value::Float(std::f64::consts::PI)]);
        assert_eq!(percent_format("%s=%.2f", &args).unwrap(), "pi=3.14");
        assert_eq!(percent_format("%5d|%-4s|", &Value::tuple(vec![Value::Int(42), Value::str("a")])).unwrap(), "   42|a   |");
        assert_eq!(percent_format("100%%", &Value::tuple(vec![])).unwrap(), "100%");
        assert_eq!(
            percent_format("%d %d", &Value::Int(1)).unwrap_err().message(),
            "not enough arguments for format string"
        );
        assert_eq!(
            percent_format("%d", &Value::tuple(vec![Value::Int(1), Value::Int(2)])).unwrap_err().message(),
            "not all arguments converted during string formatting"
        );
    }
}
