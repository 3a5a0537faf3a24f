// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use docsql_type::{Fragment, Value, err, error::diagnostic::ast};

use crate::token::{
	Literal, Token, TokenKind,
	cursor::Cursor,
};

/// Scan a numeric literal. The cursor sits on a digit, or on a dot
/// directly followed by a digit.
pub(crate) fn scan_number(cursor: &mut Cursor) -> crate::Result<Token> {
	let line = cursor.line();
	let column = cursor.column();
	let mut lexeme = String::new();

	while let Some(ch) = cursor.advance_if(|c| c.is_ascii_digit()) {
		lexeme.push(ch);
	}
	if cursor.peek() == Some('.') && cursor.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
		lexeme.push(cursor.advance().unwrap());
		while let Some(ch) = cursor.advance_if(|c| c.is_ascii_digit()) {
			lexeme.push(ch);
		}
	} else if cursor.peek() == Some('.') && lexeme.is_empty() {
		// Leading-dot literal like `.5`
		lexeme.push(cursor.advance().unwrap());
		while let Some(ch) = cursor.advance_if(|c| c.is_ascii_digit()) {
			lexeme.push(ch);
		}
	}
	if cursor.peek().is_some_and(|c| c == 'e' || c == 'E') {
		let exponent_digit = |offset| cursor.peek_ahead(offset).is_some_and(|c: char| c.is_ascii_digit());
		let signed = cursor.peek_ahead(1).is_some_and(|c| c == '+' || c == '-');
		if exponent_digit(1) || (signed && exponent_digit(2)) {
			lexeme.push(cursor.advance().unwrap());
			if signed {
				lexeme.push(cursor.advance().unwrap());
			}
			while let Some(ch) = cursor.advance_if(|c| c.is_ascii_digit()) {
				lexeme.push(ch);
			}
		}
	}

	let fragment = Fragment::statement(lexeme.clone(), line, column);
	if number_value(&lexeme).is_none() {
		return err!(ast::number_out_of_range(fragment));
	}
	Ok(Token {
		kind: TokenKind::Literal(Literal::Number),
		fragment,
	})
}

/// Parse a scanned numeric lexeme into a value: integer first, falling
/// back to float. `None` when the text fits neither.
pub fn number_value(text: &str) -> Option<Value> {
	if !text.contains(['.', 'e', 'E']) {
		if let Ok(value) = text.parse::<i64>() {
			return Some(Value::Int(value));
		}
	}
	match text.parse::<f64>() {
		Ok(value) if value.is_finite() => Some(Value::Float(value)),
		_ => None,
	}
}

/// Scan a single-quoted string literal with `''` as the escape for a
/// literal quote. The token's fragment holds the decoded content.
pub(crate) fn scan_string(cursor: &mut Cursor) -> crate::Result<Token> {
	let line = cursor.line();
	let column = cursor.column();
	cursor.advance(); // opening quote
	let mut content = String::new();

	loop {
		match cursor.advance() {
			Some('\'') => {
				if cursor.peek() == Some('\'') {
					cursor.advance();
					content.push('\'');
				} else {
					break;
				}
			}
			Some(ch) => content.push(ch),
			None => {
				return err!(ast::unterminated_string(Fragment::statement(content, line, column)));
			}
		}
	}

	Ok(Token {
		kind: TokenKind::Literal(Literal::Text),
		fragment: Fragment::statement(content, line, column),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn number(input: &str) -> crate::Result<Token> {
		scan_number(&mut Cursor::new(input))
	}

	#[test]
	fn test_scan_integer() {
		let token = number("42").unwrap();
		assert_eq!(token.kind, TokenKind::Literal(Literal::Number));
		assert_eq!(token.text(), "42");
	}

	#[test]
	fn test_scan_float() {
		assert_eq!(number("3.25").unwrap().text(), "3.25");
		assert_eq!(number(".5").unwrap().text(), ".5");
		assert_eq!(number("1e10").unwrap().text(), "1e10");
		assert_eq!(number("2.5E-3").unwrap().text(), "2.5E-3");
	}

	#[test]
	fn test_scan_number_stops_at_member_dot() {
		// `1.x` is the number 1 followed by `.x`, not a float
		let mut cursor = Cursor::new("1.x");
		let token = scan_number(&mut cursor).unwrap();
		assert_eq!(token.text(), "1");
		assert_eq!(cursor.peek(), Some('.'));
	}

	#[test]
	fn test_number_value() {
		assert_eq!(number_value("42"), Some(Value::Int(42)));
		assert_eq!(number_value("3.5"), Some(Value::Float(3.5)));
		// Too large for i64, falls back to float
		assert_eq!(number_value("9223372036854775808"), Some(Value::Float(9.223372036854776e18)));
		assert_eq!(number_value("1e400"), None);
	}

	#[test]
	fn test_integer_overflow_falls_back_to_float() {
		let token = number("99999999999999999999").unwrap();
		assert_eq!(token.kind, TokenKind::Literal(Literal::Number));
	}

	#[test]
	fn test_scan_string() {
		let token = scan_string(&mut Cursor::new("'hello'")).unwrap();
		assert_eq!(token.kind, TokenKind::Literal(Literal::Text));
		assert_eq!(token.text(), "hello");
	}

	#[test]
	fn test_scan_string_quote_escape() {
		let token = scan_string(&mut Cursor::new("'it''s'")).unwrap();
		assert_eq!(token.text(), "it's");
	}

	#[test]
	fn test_unterminated_string() {
		let err = scan_string(&mut Cursor::new("'oops")).unwrap_err();
		assert_eq!(err.diagnostic().code, "AST_002");
	}
}
