// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use docsql_type::{err, error::diagnostic::ast};

use crate::{
	ast::{AstSelect, AstSelectItem},
	ast::parse::{Parser, Precedence},
	token::{Keyword, Operator, Separator, TokenKind},
};

impl Parser {
	pub(crate) fn parse_select(&mut self) -> crate::Result<AstSelect> {
		let fragment = self.consume_keyword(Keyword::Select)?.fragment;
		let distinct = self.consume_if_keyword(Keyword::Distinct)?.is_some();

		// `SELECT FROM t` reports the missing list at the FROM token
		if self.current_is_keyword(Keyword::From) {
			return err!(ast::missing_select_list(self.current()?.fragment.clone()));
		}

		let mut items = vec![self.parse_select_item()?];
		while self.consume_if(TokenKind::Separator(Separator::Comma))?.is_some() {
			items.push(self.parse_select_item()?);
		}

		let from = if self.consume_if_keyword(Keyword::From)?.is_some() {
			Some(self.parse_table_ref()?)
		} else {
			None
		};

		let filter = if self.consume_if_keyword(Keyword::Where)?.is_some() {
			Some(self.parse_expr(Precedence::None)?)
		} else {
			None
		};

		let mut group_by = Vec::new();
		if self.consume_if_keyword(Keyword::Group)?.is_some() {
			self.consume_keyword(Keyword::By)?;
			group_by.push(self.parse_expr(Precedence::None)?);
			while self.consume_if(TokenKind::Separator(Separator::Comma))?.is_some() {
				group_by.push(self.parse_expr(Precedence::None)?);
			}
		}

		let having = if self.consume_if_keyword(Keyword::Having)?.is_some() {
			Some(self.parse_expr(Precedence::None)?)
		} else {
			None
		};

		Ok(AstSelect {
			distinct,
			items,
			from,
			filter,
			group_by,
			having,
			fragment,
		})
	}

	fn parse_select_item(&mut self) -> crate::Result<AstSelectItem> {
		if self.current_is(TokenKind::Operator(Operator::Asterisk)) {
			let star = self.advance()?;
			return Ok(AstSelectItem::Wildcard(star.fragment));
		}

		let expr = self.parse_expr(Precedence::None)?;
		let alias = if self.consume_if_keyword(Keyword::As)?.is_some() {
			Some(self.consume_identifier()?)
		} else if self.current_is(TokenKind::Identifier) {
			Some(self.consume_identifier()?)
		} else {
			None
		};
		Ok(AstSelectItem::Expr {
			expr,
			alias,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::token::tokenize;

	fn select(sql: &str) -> crate::Result<AstSelect> {
		let mut parser = Parser::new(tokenize(sql).unwrap());
		parser.parse_select()
	}

	#[test]
	fn test_select_list() {
		let parsed = select("SELECT a, b + 1 AS c, total t FROM orders").unwrap();
		assert_eq!(parsed.items.len(), 3);
		let AstSelectItem::Expr {
			alias,
			..
		} = &parsed.items[1]
		else {
			panic!("expected expression item");
		};
		assert_eq!(alias.as_ref().unwrap().name, "c");
		let AstSelectItem::Expr {
			alias,
			..
		} = &parsed.items[2]
		else {
			panic!("expected expression item");
		};
		assert_eq!(alias.as_ref().unwrap().name, "t");
	}

	#[test]
	fn test_select_wildcard() {
		let parsed = select("SELECT * FROM t").unwrap();
		assert!(matches!(parsed.items[0], AstSelectItem::Wildcard(_)));
	}

	#[test]
	fn test_select_distinct() {
		assert!(select("SELECT DISTINCT a FROM t").unwrap().distinct);
		assert!(!select("SELECT a FROM t").unwrap().distinct);
	}

	#[test]
	fn test_missing_select_list_points_at_from() {
		let err = select("SELECT FROM t").unwrap_err();
		let diagnostic = err.diagnostic();
		assert_eq!(diagnostic.code, "AST_009");
		assert_eq!(diagnostic.fragment.text(), "FROM");
		assert_eq!(diagnostic.fragment.column(), Some(8));
	}

	#[test]
	fn test_trailing_comma_rejected() {
		let err = select("SELECT a, FROM t").unwrap_err();
		assert_eq!(err.diagnostic().code, "AST_008");
	}

	#[test]
	fn test_full_clause_order() {
		let parsed = select("SELECT a FROM t WHERE b = 1 GROUP BY a HAVING COUNT(*) > 2").unwrap();
		assert!(parsed.filter.is_some());
		assert_eq!(parsed.group_by.len(), 1);
		assert!(parsed.having.is_some());
	}

	#[test]
	fn test_select_without_from_parses() {
		// Accepted by the grammar; the binder rejects it
		let parsed = select("SELECT 1").unwrap();
		assert!(parsed.from.is_none());
	}
}
