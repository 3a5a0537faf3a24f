// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

pub mod cursor;
pub mod identifier;
pub mod keyword;
pub mod literal;
pub mod operator;
pub mod separator;
pub mod token;

use docsql_type::{Fragment, err, error::diagnostic::ast};
pub use keyword::Keyword;
pub use token::{Literal, Operator, Separator, Token, TokenKind};

use crate::token::{
	cursor::Cursor,
	identifier::{scan_quoted_identifier, scan_word},
	literal::{scan_number, scan_string},
	operator::scan_operator,
	separator::scan_separator,
};

/// Tokenize the source statement. One left-to-right scan with
/// character-class dispatch; whitespace and comments are dropped.
pub fn tokenize(input: &str) -> crate::Result<Vec<Token>> {
	let mut cursor = Cursor::new(input);
	let mut tokens = Vec::with_capacity((input.len() / 6).max(8));

	loop {
		skip_trivia(&mut cursor)?;
		let Some(ch) = cursor.peek() else {
			break;
		};

		let token = match ch {
			'\'' => scan_string(&mut cursor)?,
			'"' | '`' => scan_quoted_identifier(&mut cursor)?,
			'0'..='9' => scan_number(&mut cursor)?,
			// Dot starts a literal only when a digit follows;
			// otherwise it is the member operator
			'.' => {
				if cursor.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
					scan_number(&mut cursor)?
				} else {
					scan_operator(&mut cursor)?
				}
			}
			'a'..='z' | 'A'..='Z' | '_' => scan_word(&mut cursor),
			',' | ';' => scan_separator(&mut cursor),
			_ => scan_operator(&mut cursor)?,
		};
		tokens.push(token);
	}

	Ok(tokens)
}

/// Skip whitespace, `--` line comments, and `/* */` block comments.
fn skip_trivia(cursor: &mut Cursor) -> crate::Result<()> {
	loop {
		if cursor.advance_if(|c| c.is_whitespace()).is_some() {
			continue;
		}
		if cursor.peek() == Some('-') && cursor.peek_ahead(1) == Some('-') {
			while cursor.peek().is_some_and(|c| c != '\n') {
				cursor.advance();
			}
			continue;
		}
		if cursor.peek() == Some('/') && cursor.peek_ahead(1) == Some('*') {
			let line = cursor.line();
			let column = cursor.column();
			cursor.advance();
			cursor.advance();
			loop {
				if cursor.is_eof() {
					return err!(ast::unterminated_block_comment(Fragment::statement(
						"/*", line, column
					)));
				}
				if cursor.peek() == Some('*') && cursor.peek_ahead(1) == Some('/') {
					cursor.advance();
					cursor.advance();
					break;
				}
				cursor.advance();
			}
			continue;
		}
		return Ok(());
	}
}
