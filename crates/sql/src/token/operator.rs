// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use docsql_type::{Fragment, err, error::diagnostic::ast};

use crate::token::{
	Operator, Token, TokenKind,
	cursor::Cursor,
};

/// Scan a punctuation operator. The cursor sits on the first character.
pub(crate) fn scan_operator(cursor: &mut Cursor) -> crate::Result<Token> {
	let line = cursor.line();
	let column = cursor.column();
	let first = cursor.advance().unwrap();

	let (operator, lexeme) = match first {
		'+' => (Operator::Plus, "+"),
		'-' => (Operator::Minus, "-"),
		'*' => (Operator::Asterisk, "*"),
		'/' => (Operator::Slash, "/"),
		'%' => (Operator::Percent, "%"),
		'(' => (Operator::OpenParen, "("),
		')' => (Operator::CloseParen, ")"),
		'.' => (Operator::Dot, "."),
		'=' => (Operator::Equal, "="),
		'<' => match cursor.peek() {
			Some('=') => {
				cursor.advance();
				(Operator::LeftAngleEqual, "<=")
			}
			Some('>') => {
				cursor.advance();
				(Operator::BangEqual, "<>")
			}
			_ => (Operator::LeftAngle, "<"),
		},
		'>' => {
			if cursor.advance_if(|c| c == '=').is_some() {
				(Operator::RightAngleEqual, ">=")
			} else {
				(Operator::RightAngle, ">")
			}
		}
		'!' => {
			if cursor.advance_if(|c| c == '=').is_some() {
				(Operator::BangEqual, "!=")
			} else {
				return err!(ast::unexpected_character(Fragment::statement("!", line, column)));
			}
		}
		'|' => {
			if cursor.advance_if(|c| c == '|').is_some() {
				(Operator::Concat, "||")
			} else {
				return err!(ast::unexpected_character(Fragment::statement("|", line, column)));
			}
		}
		other => {
			return err!(ast::unexpected_character(Fragment::statement(other.to_string(), line, column)));
		}
	};

	Ok(Token {
		kind: TokenKind::Operator(operator),
		fragment: Fragment::statement(lexeme, line, column),
	})
}
