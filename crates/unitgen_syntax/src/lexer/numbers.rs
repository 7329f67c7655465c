//! Number scanning for the lexer
//!
//! Handles decimal, hex (`0x`), octal (`0o`) and binary (`0b`) integers and floating-point literals.
//! Underscore separators are accepted between digits. Integers that do not fit in 64 bits are kept as digit
//! strings for the runtime to widen.

use super::Lexer;
use super::tokens::TokenKind;

impl<'a> Lexer<'a> {
    pub(super) fn scan_number(&mut self, start: usize, first: char) {
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance(); // consume radix marker
                self.scan_radix_int(start, radix);
                return;
            }
        }

        let mut value = String::new();
        let mut is_float = false;

        if first == '.' {
            is_float = true;
            value.push_str("0.");
        } else {
            value.push(first);
        }

        // Integer (or fraction, after a leading `.`) digits
        self.scan_digits(&mut value);

        // Decimal part
        if !is_float && self.peek() == Some('.') {
            // `1.5` and `1.` are floats; `1..` and `1.real` are not scanned as part of the number
            let next = self.peek_next();
            if next.is_none_or(|c| c.is_ascii_digit() || !(c.is_ascii_alphabetic() || c == '_' || c == '.')) {
                is_float = true;
                value.push('.');
                self.advance(); // consume .
                self.scan_digits(&mut value);
            }
        }

        // Exponent part: only when digits actually follow
        if matches!(self.peek(), Some('e' | 'E')) {
            let next = self.peek_next();
            let has_digits = match next {
                Some('+' | '-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if has_digits {
                is_float = true;
                value.push('e');
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    value.push(sign);
                    self.advance();
                }
                self.scan_digits(&mut value);
            }
        }

        if is_float {
            match value.parse::<f64>() {
                Ok(f) => self.add_token(TokenKind::Float(f), start),
                Err(_) => self.error(format!("Invalid float literal: {}", value), start),
            }
        } else {
            if value.len() > 1 && value.starts_with('0') && value.chars().any(|c| c != '0') {
                self.error(
                    "Leading zeros in decimal integer literals are not permitted; use an 0o prefix for octal integers",
                    start,
                );
                return;
            }
            match value.parse::<i64>() {
                Ok(i) => self.add_token(TokenKind::Int(i), start),
                Err(_) => self.add_token(TokenKind::BigInt { digits: value, radix: 10 }, start),
            }
        }
    }

    fn scan_digits(&mut self, value: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else if c == '_' && self.peek_next().is_some_and(|n| n.is_ascii_digit()) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_radix_int(&mut self, start: usize, radix: u32) {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c == '_' {
                self.advance();
            } else if c.is_ascii_alphanumeric() {
                digits.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if digits.is_empty() {
            self.error("Invalid integer literal: missing digits after radix prefix", start);
            return;
        }
        match i64::from_str_radix(&digits, radix) {
            Ok(i) => self.add_token(TokenKind::Int(i), start),
            Err(e) if matches!(e.kind(), std::num::IntErrorKind::PosOverflow) => {
                self.add_token(TokenKind::BigInt { digits, radix }, start);
            }
            Err(_) => {
                let message = format!("Invalid digit in base-{} literal: {}", radix, &self.source[start..self.current_pos]);
                self.error(message, start);
            }
        }
    }
}
