// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use docsql_type::{Value, err, error::diagnostic::ast};

use crate::{
	ast::{AstLimit, AstQuery, AstUnion},
	ast::parse::Parser,
	token::{Keyword, Literal, TokenKind, literal::number_value},
};

impl Parser {
	/// Parse a full query: select block, UNION branches, then the
	/// trailing ORDER BY / LIMIT that apply to the whole result.
	pub(crate) fn parse_query(&mut self) -> crate::Result<AstQuery> {
		let select = self.parse_select()?;

		let mut unions = Vec::new();
		while let Some(token) = self.consume_if_keyword(Keyword::Union)? {
			let all = self.consume_if_keyword(Keyword::All)?.is_some();
			unions.push(AstUnion {
				all,
				select: self.parse_select()?,
				fragment: token.fragment,
			});
		}

		let mut order_by = Vec::new();
		if self.consume_if_keyword(Keyword::Order)?.is_some() {
			self.consume_keyword(Keyword::By)?;
			order_by = self.parse_order_specs()?;
		}

		let limit = if let Some(token) = self.consume_if_keyword(Keyword::Limit)? {
			let limit = self.parse_integer()?;
			let offset = if self.consume_if_keyword(Keyword::Offset)?.is_some() {
				Some(self.parse_integer()?)
			} else {
				None
			};
			Some(AstLimit {
				limit,
				offset,
				fragment: token.fragment,
			})
		} else {
			None
		};

		Ok(AstQuery {
			select,
			unions,
			order_by,
			limit,
		})
	}

	fn parse_integer(&mut self) -> crate::Result<i64> {
		let token = self.consume(TokenKind::Literal(Literal::Number), "an integer literal")?;
		match number_value(token.text()) {
			Some(Value::Int(value)) => Ok(value),
			_ => err!(ast::unexpected_token("an integer literal", token.fragment)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ast::parse::parse, token::tokenize};

	fn query(sql: &str) -> crate::Result<AstQuery> {
		parse(tokenize(sql).unwrap())
	}

	#[test]
	fn test_union_chain() {
		let parsed = query("SELECT a FROM t UNION SELECT a FROM u UNION ALL SELECT a FROM v").unwrap();
		assert_eq!(parsed.unions.len(), 2);
		assert!(!parsed.unions[0].all);
		assert!(parsed.unions[1].all);
	}

	#[test]
	fn test_order_by_and_limit() {
		let parsed = query("SELECT a FROM t ORDER BY a DESC, b LIMIT 10 OFFSET 5").unwrap();
		assert_eq!(parsed.order_by.len(), 2);
		assert!(parsed.order_by[0].descending);
		assert!(!parsed.order_by[1].descending);
		let limit = parsed.limit.unwrap();
		assert_eq!(limit.limit, 10);
		assert_eq!(limit.offset, Some(5));
	}

	#[test]
	fn test_limit_requires_integer() {
		let err = query("SELECT a FROM t LIMIT 2.5").unwrap_err();
		assert_eq!(err.diagnostic().code, "AST_006");
	}

	#[test]
	fn test_order_by_applies_after_union() {
		let parsed = query("SELECT a FROM t UNION SELECT a FROM u ORDER BY a").unwrap();
		assert_eq!(parsed.unions.len(), 1);
		assert_eq!(parsed.order_by.len(), 1);
	}
}
