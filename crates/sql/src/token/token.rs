// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use docsql_type::Fragment;

use crate::token::keyword::Keyword;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
	Number,
	Text,
	True,
	False,
	Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
	Plus,
	Minus,
	Asterisk,
	Slash,
	Percent,
	Equal,
	/// `!=` and its `<>` alias.
	BangEqual,
	LeftAngle,
	LeftAngleEqual,
	RightAngle,
	RightAngleEqual,
	/// `||` string concatenation.
	Concat,
	OpenParen,
	CloseParen,
	Dot,
}

impl Operator {
	pub const fn as_str(&self) -> &'static str {
		match self {
			Operator::Plus => "+",
			Operator::Minus => "-",
			Operator::Asterisk => "*",
			Operator::Slash => "/",
			Operator::Percent => "%",
			Operator::Equal => "=",
			Operator::BangEqual => "!=",
			Operator::LeftAngle => "<",
			Operator::LeftAngleEqual => "<=",
			Operator::RightAngle => ">",
			Operator::RightAngleEqual => ">=",
			Operator::Concat => "||",
			Operator::OpenParen => "(",
			Operator::CloseParen => ")",
			Operator::Dot => ".",
		}
	}

	pub fn is_comparison(&self) -> bool {
		matches!(
			self,
			Operator::Equal
				| Operator::BangEqual
				| Operator::LeftAngle
				| Operator::LeftAngleEqual
				| Operator::RightAngle
				| Operator::RightAngleEqual
		)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
	Comma,
	Semicolon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	Keyword(Keyword),
	Identifier,
	Literal(Literal),
	Operator(Operator),
	Separator(Separator),
}

/// One token of the source statement. The fragment carries the lexeme
/// (without quotes for strings and quoted identifiers) and its position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
	pub kind: TokenKind,
	pub fragment: Fragment,
}

impl Token {
	pub fn text(&self) -> &str {
		self.fragment.text()
	}

	pub fn is_keyword(&self, keyword: Keyword) -> bool {
		self.kind == TokenKind::Keyword(keyword)
	}

	pub fn is_operator(&self, operator: Operator) -> bool {
		self.kind == TokenKind::Operator(operator)
	}

	pub fn is_separator(&self, separator: Separator) -> bool {
		self.kind == TokenKind::Separator(separator)
	}
}
