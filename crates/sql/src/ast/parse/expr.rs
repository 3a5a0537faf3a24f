// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use docsql_type::{FieldType, Value, err, error::diagnostic::ast, return_error};

use crate::{
	ast::{AstExpr, AstOrderSpec, BinaryOperator, Identifier, UnaryOperator},
	ast::parse::{Parser, Precedence, err_unexpected},
	token::{Keyword, Literal, Operator, Separator, TokenKind, literal::number_value},
};

impl Parser {
	/// Precedence-climbing expression parser.
	pub(crate) fn parse_expr(&mut self, precedence: Precedence) -> crate::Result<AstExpr> {
		let mut left = self.parse_primary()?;

		while !self.is_eof() {
			let current = self.current_precedence();
			if precedence >= current {
				break;
			}
			left = self.parse_infix(left)?;
			// Comparisons are non-associative: `a < b < c` is a
			// dedicated error, not a parse of `(a < b) < c`
			if current == Precedence::Comparison && self.current_precedence() == Precedence::Comparison {
				return_error!(ast::chained_comparison(self.current()?.fragment.clone()));
			}
		}
		Ok(left)
	}

	fn parse_infix(&mut self, left: AstExpr) -> crate::Result<AstExpr> {
		let token = self.current()?.clone();
		match token.kind {
			TokenKind::Operator(operator) => self.parse_binary(left, operator),
			TokenKind::Keyword(Keyword::And) => self.parse_logical(left, BinaryOperator::And, Precedence::And),
			TokenKind::Keyword(Keyword::Or) => self.parse_logical(left, BinaryOperator::Or, Precedence::Or),
			TokenKind::Keyword(Keyword::Between) => self.parse_between(left, false),
			TokenKind::Keyword(Keyword::In) => self.parse_in(left, false),
			TokenKind::Keyword(Keyword::Like) => self.parse_like(left, false),
			TokenKind::Keyword(Keyword::Is) => self.parse_is(left),
			TokenKind::Keyword(Keyword::Not) => {
				self.advance()?;
				match self.current()?.kind {
					TokenKind::Keyword(Keyword::Between) => self.parse_between(left, true),
					TokenKind::Keyword(Keyword::In) => self.parse_in(left, true),
					TokenKind::Keyword(Keyword::Like) => self.parse_like(left, true),
					_ => err_unexpected("BETWEEN, IN or LIKE", self.current()?.fragment.clone()),
				}
			}
			_ => err_unexpected("an operator", token.fragment),
		}
	}

	fn parse_binary(&mut self, left: AstExpr, operator: Operator) -> crate::Result<AstExpr> {
		let token = self.advance()?;
		let (op, precedence) = match operator {
			Operator::Plus => (BinaryOperator::Add, Precedence::Term),
			Operator::Minus => (BinaryOperator::Subtract, Precedence::Term),
			Operator::Concat => (BinaryOperator::Concat, Precedence::Term),
			Operator::Asterisk => (BinaryOperator::Multiply, Precedence::Factor),
			Operator::Slash => (BinaryOperator::Divide, Precedence::Factor),
			Operator::Percent => (BinaryOperator::Modulo, Precedence::Factor),
			Operator::Equal => (BinaryOperator::Equal, Precedence::Comparison),
			Operator::BangEqual => (BinaryOperator::NotEqual, Precedence::Comparison),
			Operator::LeftAngle => (BinaryOperator::LessThan, Precedence::Comparison),
			Operator::LeftAngleEqual => (BinaryOperator::LessThanEqual, Precedence::Comparison),
			Operator::RightAngle => (BinaryOperator::GreaterThan, Precedence::Comparison),
			Operator::RightAngleEqual => (BinaryOperator::GreaterThanEqual, Precedence::Comparison),
			_ => return err_unexpected("an operator", token.fragment),
		};
		let right = self.parse_expr(precedence)?;
		Ok(AstExpr::Binary {
			op,
			left: Box::new(left),
			right: Box::new(right),
			fragment: token.fragment,
		})
	}

	fn parse_logical(
		&mut self,
		left: AstExpr,
		op: BinaryOperator,
		precedence: Precedence,
	) -> crate::Result<AstExpr> {
		let token = self.advance()?;
		let right = self.parse_expr(precedence)?;
		Ok(AstExpr::Binary {
			op,
			left: Box::new(left),
			right: Box::new(right),
			fragment: token.fragment,
		})
	}

	fn parse_between(&mut self, expr: AstExpr, negated: bool) -> crate::Result<AstExpr> {
		let token = self.consume_keyword(Keyword::Between)?;
		// The bounds parse above AND so the separating AND is not
		// swallowed
		let low = self.parse_expr(Precedence::And)?;
		self.consume_keyword(Keyword::And)?;
		let high = self.parse_expr(Precedence::And)?;
		Ok(AstExpr::Between {
			expr: Box::new(expr),
			low: Box::new(low),
			high: Box::new(high),
			negated,
			fragment: token.fragment,
		})
	}

	fn parse_in(&mut self, expr: AstExpr, negated: bool) -> crate::Result<AstExpr> {
		let token = self.consume_keyword(Keyword::In)?;
		self.consume_operator(Operator::OpenParen)?;
		if self.current_is_keyword(Keyword::Select) {
			return err!(ast::unsupported_construct(
				"a subquery in IN",
				self.current()?.fragment.clone()
			));
		}
		let mut list = vec![self.parse_expr(Precedence::None)?];
		while self.consume_if(TokenKind::Separator(Separator::Comma))?.is_some() {
			list.push(self.parse_expr(Precedence::None)?);
		}
		self.consume_operator(Operator::CloseParen)?;
		Ok(AstExpr::InList {
			expr: Box::new(expr),
			list,
			negated,
			fragment: token.fragment,
		})
	}

	fn parse_like(&mut self, expr: AstExpr, negated: bool) -> crate::Result<AstExpr> {
		let token = self.consume_keyword(Keyword::Like)?;
		let pattern = self.parse_expr(Precedence::Comparison)?;
		Ok(AstExpr::Like {
			expr: Box::new(expr),
			pattern: Box::new(pattern),
			negated,
			fragment: token.fragment,
		})
	}

	fn parse_is(&mut self, expr: AstExpr) -> crate::Result<AstExpr> {
		let token = self.consume_keyword(Keyword::Is)?;
		let negated = self.consume_if_keyword(Keyword::Not)?.is_some();
		self.consume(TokenKind::Literal(Literal::Null), "NULL")?;
		Ok(AstExpr::IsNull {
			expr: Box::new(expr),
			negated,
			fragment: token.fragment,
		})
	}

	fn parse_primary(&mut self) -> crate::Result<AstExpr> {
		let token = self.current()?.clone();
		match token.kind {
			TokenKind::Literal(literal) => self.parse_literal(literal),
			TokenKind::Identifier => self.parse_reference(),
			TokenKind::Operator(Operator::Minus) => {
				self.advance()?;
				let expr = self.parse_expr(Precedence::Factor)?;
				Ok(AstExpr::Unary {
					op: UnaryOperator::Negate,
					expr: Box::new(expr),
					fragment: token.fragment,
				})
			}
			TokenKind::Keyword(Keyword::Not) => {
				self.advance()?;
				let expr = self.parse_expr(Precedence::And)?;
				Ok(AstExpr::Unary {
					op: UnaryOperator::Not,
					expr: Box::new(expr),
					fragment: token.fragment,
				})
			}
			TokenKind::Operator(Operator::OpenParen) => {
				self.advance()?;
				if self.current_is_keyword(Keyword::Select) {
					return err!(ast::unsupported_construct(
						"a scalar subquery",
						self.current()?.fragment.clone()
					));
				}
				let expr = self.parse_expr(Precedence::None)?;
				self.consume_operator(Operator::CloseParen)?;
				Ok(expr)
			}
			TokenKind::Keyword(Keyword::Case) => self.parse_case(),
			TokenKind::Keyword(Keyword::Cast) => self.parse_cast(),
			_ => Err(docsql_type::Error(ast::expected_expression(token.fragment))),
		}
	}

	fn parse_literal(&mut self, literal: Literal) -> crate::Result<AstExpr> {
		let token = self.advance()?;
		let value = match literal {
			Literal::Number => match number_value(token.text()) {
				Some(value) => value,
				None => return err!(ast::number_out_of_range(token.fragment)),
			},
			Literal::Text => Value::Utf8(token.text().to_string()),
			Literal::True => Value::Boolean(true),
			Literal::False => Value::Boolean(false),
			Literal::Null => Value::Null,
		};
		Ok(AstExpr::Literal {
			value,
			fragment: token.fragment,
		})
	}

	/// Column reference, function call, or window function.
	fn parse_reference(&mut self) -> crate::Result<AstExpr> {
		let first = self.consume_identifier()?;

		if self.current_is(TokenKind::Operator(Operator::OpenParen)) {
			return self.parse_call(first);
		}

		let mut path = vec![first];
		while self.consume_if(TokenKind::Operator(Operator::Dot))?.is_some() {
			path.push(self.consume_identifier()?);
		}
		Ok(AstExpr::Column {
			path,
		})
	}

	fn parse_call(&mut self, name: Identifier) -> crate::Result<AstExpr> {
		self.consume_operator(Operator::OpenParen)?;
		let mut args = Vec::new();
		if self.current_is(TokenKind::Operator(Operator::Asterisk)) {
			let star = self.advance()?;
			args.push(AstExpr::Star(star.fragment));
		} else if !self.current_is(TokenKind::Operator(Operator::CloseParen)) {
			args.push(self.parse_expr(Precedence::None)?);
			while self.consume_if(TokenKind::Separator(Separator::Comma))?.is_some() {
				args.push(self.parse_expr(Precedence::None)?);
			}
		}
		self.consume_operator(Operator::CloseParen)?;

		if self.consume_if_keyword(Keyword::Over)?.is_some() {
			return self.parse_window(name, args);
		}
		Ok(AstExpr::Function {
			name,
			args,
		})
	}

	fn parse_window(&mut self, name: Identifier, args: Vec<AstExpr>) -> crate::Result<AstExpr> {
		self.consume_operator(Operator::OpenParen)?;
		let mut partition_by = Vec::new();
		if self.consume_if_keyword(Keyword::Partition)?.is_some() {
			self.consume_keyword(Keyword::By)?;
			partition_by.push(self.parse_expr(Precedence::None)?);
			while self.consume_if(TokenKind::Separator(Separator::Comma))?.is_some() {
				partition_by.push(self.parse_expr(Precedence::None)?);
			}
		}
		let mut order_by = Vec::new();
		if self.consume_if_keyword(Keyword::Order)?.is_some() {
			self.consume_keyword(Keyword::By)?;
			order_by = self.parse_order_specs()?;
		}
		self.consume_operator(Operator::CloseParen)?;
		Ok(AstExpr::Window {
			name,
			args,
			partition_by,
			order_by,
		})
	}

	pub(crate) fn parse_order_specs(&mut self) -> crate::Result<Vec<AstOrderSpec>> {
		let mut specs = vec![self.parse_order_spec()?];
		while self.consume_if(TokenKind::Separator(Separator::Comma))?.is_some() {
			specs.push(self.parse_order_spec()?);
		}
		Ok(specs)
	}

	fn parse_order_spec(&mut self) -> crate::Result<AstOrderSpec> {
		let expr = self.parse_expr(Precedence::None)?;
		let descending = if self.consume_if_keyword(Keyword::Desc)?.is_some() {
			true
		} else {
			self.consume_if_keyword(Keyword::Asc)?;
			false
		};
		Ok(AstOrderSpec {
			expr,
			descending,
		})
	}

	fn parse_case(&mut self) -> crate::Result<AstExpr> {
		let token = self.consume_keyword(Keyword::Case)?;
		let operand = if self.current_is_keyword(Keyword::When) {
			None
		} else {
			Some(Box::new(self.parse_expr(Precedence::None)?))
		};

		let mut branches = Vec::new();
		while self.consume_if_keyword(Keyword::When)?.is_some() {
			let guard = self.parse_expr(Precedence::None)?;
			self.consume_keyword(Keyword::Then)?;
			let result = self.parse_expr(Precedence::None)?;
			branches.push((guard, result));
		}
		if branches.is_empty() {
			return err_unexpected("WHEN", self.current()?.fragment.clone());
		}

		let else_expr = if self.consume_if_keyword(Keyword::Else)?.is_some() {
			Some(Box::new(self.parse_expr(Precedence::None)?))
		} else {
			None
		};
		self.consume_keyword(Keyword::End)?;

		Ok(AstExpr::Case {
			operand,
			branches,
			else_expr,
			fragment: token.fragment,
		})
	}

	fn parse_cast(&mut self) -> crate::Result<AstExpr> {
		let token = self.consume_keyword(Keyword::Cast)?;
		self.consume_operator(Operator::OpenParen)?;
		let expr = self.parse_expr(Precedence::None)?;
		self.consume_keyword(Keyword::As)?;
		let target = self.parse_type_name()?;
		self.consume_operator(Operator::CloseParen)?;
		Ok(AstExpr::Cast {
			expr: Box::new(expr),
			target,
			fragment: token.fragment,
		})
	}

	fn parse_type_name(&mut self) -> crate::Result<FieldType> {
		let name = self.consume_identifier()?;
		match name.name.to_ascii_lowercase().as_str() {
			"bool" | "boolean" => Ok(FieldType::Boolean),
			"int" | "integer" | "bigint" => Ok(FieldType::Int),
			"float" | "double" | "real" => Ok(FieldType::Float),
			"string" | "text" | "varchar" => Ok(FieldType::Utf8),
			_ => err_unexpected("a type name", name.fragment),
		}
	}
}
