// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

mod expr;
mod from;
mod query;
mod select;

use docsql_type::{Fragment, error::diagnostic::ast, return_error};

use crate::{
	ast::{AstQuery, Identifier},
	token::{Keyword, Operator, Separator, Token, TokenKind},
};

/// Binding strength of infix constructs, weakest first. The parser
/// climbs: an expression at precedence `p` only consumes operators that
/// bind tighter than `p`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub(crate) enum Precedence {
	None,
	Or,
	And,
	Comparison,
	Term,
	Factor,
}

const fn operator_precedence(operator: Operator) -> Precedence {
	use Operator::*;
	use Precedence::*;

	match operator {
		Equal | BangEqual | LeftAngle | LeftAngleEqual | RightAngle | RightAngleEqual => Comparison,
		Plus | Minus | Concat => Term,
		Asterisk | Slash | Percent => Factor,
		_ => None,
	}
}

/// Parse a token stream into a query. The statement may end with one
/// optional semicolon; anything after it is an error.
pub fn parse(tokens: Vec<Token>) -> crate::Result<AstQuery> {
	let mut parser = Parser::new(tokens);
	let query = parser.parse_query()?;
	parser.consume_if(TokenKind::Separator(Separator::Semicolon))?;
	if !parser.is_eof() {
		return_error!(ast::trailing_tokens(parser.current()?.fragment.clone()));
	}
	Ok(query)
}

pub(crate) struct Parser {
	tokens: Vec<Token>,
	position: usize,
}

impl Parser {
	pub(crate) fn new(tokens: Vec<Token>) -> Self {
		Self {
			tokens,
			position: 0,
		}
	}

	pub(crate) fn advance(&mut self) -> crate::Result<Token> {
		if self.position >= self.tokens.len() {
			return Err(docsql_type::Error(ast::unexpected_eof()));
		}
		let token = self.tokens[self.position].clone();
		self.position += 1;
		Ok(token)
	}

	pub(crate) fn current(&self) -> crate::Result<&Token> {
		if self.position >= self.tokens.len() {
			return Err(docsql_type::Error(ast::unexpected_eof()));
		}
		Ok(&self.tokens[self.position])
	}

	pub(crate) fn peek_ahead(&self, offset: usize) -> Option<&Token> {
		self.tokens.get(self.position + offset)
	}

	pub(crate) fn is_eof(&self) -> bool {
		self.position >= self.tokens.len()
	}

	pub(crate) fn current_is(&self, expected: TokenKind) -> bool {
		self.tokens.get(self.position).is_some_and(|t| t.kind == expected)
	}

	pub(crate) fn current_is_keyword(&self, keyword: Keyword) -> bool {
		self.current_is(TokenKind::Keyword(keyword))
	}

	pub(crate) fn consume(&mut self, expected: TokenKind, description: &str) -> crate::Result<Token> {
		let got = self.current()?;
		if got.kind == expected {
			self.advance()
		} else {
			err_unexpected(description, got.fragment.clone())
		}
	}

	pub(crate) fn consume_keyword(&mut self, keyword: Keyword) -> crate::Result<Token> {
		self.consume(TokenKind::Keyword(keyword), keyword.as_str())
	}

	pub(crate) fn consume_operator(&mut self, operator: Operator) -> crate::Result<Token> {
		self.consume(TokenKind::Operator(operator), operator.as_str())
	}

	pub(crate) fn consume_if(&mut self, expected: TokenKind) -> crate::Result<Option<Token>> {
		if self.current_is(expected) {
			Ok(Some(self.advance()?))
		} else {
			Ok(None)
		}
	}

	pub(crate) fn consume_if_keyword(&mut self, keyword: Keyword) -> crate::Result<Option<Token>> {
		self.consume_if(TokenKind::Keyword(keyword))
	}

	pub(crate) fn consume_identifier(&mut self) -> crate::Result<Identifier> {
		let got = self.current()?;
		if got.kind == TokenKind::Identifier {
			let token = self.advance()?;
			Ok(Identifier {
				name: token.text().to_string(),
				fragment: token.fragment,
			})
		} else {
			Err(docsql_type::Error(ast::expected_identifier(got.fragment.clone())))
		}
	}

	/// Binding strength of the construct starting at the current token,
	/// `None` when the current token cannot continue an expression.
	pub(crate) fn current_precedence(&self) -> Precedence {
		let Some(token) = self.tokens.get(self.position) else {
			return Precedence::None;
		};
		match token.kind {
			TokenKind::Operator(operator) => operator_precedence(operator),
			TokenKind::Keyword(Keyword::And) => Precedence::And,
			TokenKind::Keyword(Keyword::Or) => Precedence::Or,
			TokenKind::Keyword(Keyword::Between | Keyword::In | Keyword::Like | Keyword::Is) => {
				Precedence::Comparison
			}
			// NOT continues an expression only as `NOT BETWEEN`,
			// `NOT IN`, `NOT LIKE`
			TokenKind::Keyword(Keyword::Not) => match self.peek_ahead(1).map(|t| t.kind) {
				Some(TokenKind::Keyword(Keyword::Between | Keyword::In | Keyword::Like)) => {
					Precedence::Comparison
				}
				_ => Precedence::None,
			},
			_ => Precedence::None,
		}
	}
}

pub(crate) fn err_unexpected<T>(expected: &str, fragment: Fragment) -> crate::Result<T> {
	Err(docsql_type::Error(ast::unexpected_token(expected, fragment)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::token::tokenize;

	fn parse_sql(sql: &str) -> crate::Result<AstQuery> {
		parse(tokenize(sql).unwrap())
	}

	#[test]
	fn test_parse_minimal_select() {
		let query = parse_sql("SELECT a FROM t").unwrap();
		assert_eq!(query.select.items.len(), 1);
		assert!(query.select.from.is_some());
		assert!(query.unions.is_empty());
	}

	#[test]
	fn test_parse_trailing_semicolon() {
		assert!(parse_sql("SELECT a FROM t;").is_ok());
	}

	#[test]
	fn test_parse_trailing_tokens_rejected() {
		let err = parse_sql("SELECT a FROM t; SELECT b FROM t").unwrap_err();
		assert_eq!(err.diagnostic().code, "AST_011");
	}

	#[test]
	fn test_parse_empty_input() {
		let err = parse_sql("").unwrap_err();
		assert_eq!(err.diagnostic().code, "AST_005");
	}
}
