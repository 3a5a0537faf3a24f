// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use crate::{
	ast::{AstTableRef, JoinType},
	ast::parse::{Parser, Precedence},
	token::{Keyword, Operator, TokenKind},
};

impl Parser {
	/// Parse the FROM clause body: a primary table reference followed
	/// by any number of joins, left-associative.
	pub(crate) fn parse_table_ref(&mut self) -> crate::Result<AstTableRef> {
		let mut left = self.parse_table_primary()?;

		loop {
			let Some(join_type) = self.peek_join_type() else {
				break;
			};
			let fragment = self.consume_join_keywords(join_type)?;
			let right = self.parse_table_primary()?;
			let on = if self.consume_if_keyword(Keyword::On)?.is_some() {
				Some(self.parse_expr(Precedence::None)?)
			} else {
				None
			};
			left = AstTableRef::Join {
				left: Box::new(left),
				right: Box::new(right),
				join_type,
				on,
				fragment,
			};
		}
		Ok(left)
	}

	fn peek_join_type(&self) -> Option<JoinType> {
		let keyword = match self.current().ok()?.kind {
			TokenKind::Keyword(keyword) => keyword,
			_ => return None,
		};
		match keyword {
			Keyword::Join | Keyword::Inner => Some(JoinType::Inner),
			Keyword::Left => Some(JoinType::Left),
			Keyword::Right => Some(JoinType::Right),
			Keyword::Full => Some(JoinType::Full),
			Keyword::Cross => Some(JoinType::Cross),
			_ => None,
		}
	}

	/// Consume the keywords of a join head and return the JOIN
	/// keyword's fragment.
	fn consume_join_keywords(&mut self, join_type: JoinType) -> crate::Result<docsql_type::Fragment> {
		match join_type {
			JoinType::Inner => {
				self.consume_if_keyword(Keyword::Inner)?;
			}
			JoinType::Left => {
				self.consume_keyword(Keyword::Left)?;
				self.consume_if_keyword(Keyword::Outer)?;
			}
			JoinType::Right => {
				self.consume_keyword(Keyword::Right)?;
				self.consume_if_keyword(Keyword::Outer)?;
			}
			JoinType::Full => {
				self.consume_keyword(Keyword::Full)?;
				self.consume_if_keyword(Keyword::Outer)?;
			}
			JoinType::Cross => {
				self.consume_keyword(Keyword::Cross)?;
			}
		}
		Ok(self.consume_keyword(Keyword::Join)?.fragment)
	}

	fn parse_table_primary(&mut self) -> crate::Result<AstTableRef> {
		if self.current_is(TokenKind::Operator(Operator::OpenParen)) {
			let fragment = self.advance()?.fragment;
			let query = self.parse_query()?;
			self.consume_operator(Operator::CloseParen)?;
			self.consume_if_keyword(Keyword::As)?;
			let alias = self.consume_identifier()?;
			return Ok(AstTableRef::Derived {
				query: Box::new(query),
				alias,
				fragment,
			});
		}

		let name = self.consume_identifier()?;
		let alias = if self.consume_if_keyword(Keyword::As)?.is_some() {
			Some(self.consume_identifier()?)
		} else if self.current_is(TokenKind::Identifier) {
			Some(self.consume_identifier()?)
		} else {
			None
		};
		Ok(AstTableRef::Collection {
			name,
			alias,
		})
	}
}
