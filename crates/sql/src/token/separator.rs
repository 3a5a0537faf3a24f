// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use docsql_type::Fragment;

use crate::token::{
	Separator, Token, TokenKind,
	cursor::Cursor,
};

/// Scan a separator. The cursor sits on `,` or `;`.
pub(crate) fn scan_separator(cursor: &mut Cursor) -> Token {
	let line = cursor.line();
	let column = cursor.column();
	let (separator, lexeme) = match cursor.advance().unwrap() {
		',' => (Separator::Comma, ","),
		_ => (Separator::Semicolon, ";"),
	};
	Token {
		kind: TokenKind::Separator(separator),
		fragment: Fragment::statement(lexeme, line, column),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_scan_comma() {
		let token = scan_separator(&mut Cursor::new(", x"));
		assert_eq!(token.kind, TokenKind::Separator(Separator::Comma));
	}

	#[test]
	fn test_scan_semicolon() {
		let token = scan_separator(&mut Cursor::new(";"));
		assert_eq!(token.kind, TokenKind::Separator(Separator::Semicolon));
	}
}
