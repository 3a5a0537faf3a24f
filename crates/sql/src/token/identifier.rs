// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use docsql_type::{Fragment, err, error::diagnostic::ast};

use crate::token::{
	Literal, Token, TokenKind,
	cursor::Cursor,
	keyword::lookup_keyword,
};

/// Scan a bare word: keyword, boolean/null literal, or identifier.
/// Keywords match case-insensitively; identifiers keep their exact
/// spelling.
pub(crate) fn scan_word(cursor: &mut Cursor) -> Token {
	let line = cursor.line();
	let column = cursor.column();
	let mut lexeme = String::new();

	while let Some(ch) = cursor.advance_if(|c| c.is_ascii_alphanumeric() || c == '_') {
		lexeme.push(ch);
	}

	let kind = match lookup_keyword(&lexeme) {
		Some(keyword) => TokenKind::Keyword(keyword),
		None => match lexeme.to_ascii_lowercase().as_str() {
			"true" => TokenKind::Literal(Literal::True),
			"false" => TokenKind::Literal(Literal::False),
			"null" => TokenKind::Literal(Literal::Null),
			_ => TokenKind::Identifier,
		},
	};
	Token {
		kind,
		fragment: Fragment::statement(lexeme, line, column),
	}
}

/// Scan a quoted identifier (`"name"` or `` `name` ``). Quoting lets a
/// reserved word act as an identifier; the fragment holds the inner
/// text.
pub(crate) fn scan_quoted_identifier(cursor: &mut Cursor) -> crate::Result<Token> {
	let line = cursor.line();
	let column = cursor.column();
	let quote = cursor.advance().unwrap();
	let closing = if quote == '`' {
		'`'
	} else {
		'"'
	};
	let mut content = String::new();

	loop {
		match cursor.advance() {
			Some(ch) if ch == closing => break,
			Some(ch) => content.push(ch),
			None => {
				return err!(ast::unterminated_string(Fragment::statement(content, line, column)));
			}
		}
	}

	Ok(Token {
		kind: TokenKind::Identifier,
		fragment: Fragment::statement(content, line, column),
	})
}
