// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! The abstract syntax tree. A closed sum type per syntactic category;
//! every stage downstream dispatches with exhaustive matches.

pub mod parse;

use docsql_type::{FieldType, Fragment, Value};

/// A (possibly quoted) identifier with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
	pub name: String,
	pub fragment: Fragment,
}

/// A full query: one select block, optional UNION branches, and the
/// trailing ORDER BY / LIMIT that apply to the whole result.
#[derive(Debug, Clone, PartialEq)]
pub struct AstQuery {
	pub select: AstSelect,
	pub unions: Vec<AstUnion>,
	pub order_by: Vec<AstOrderSpec>,
	pub limit: Option<AstLimit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstUnion {
	/// UNION ALL keeps duplicates.
	pub all: bool,
	pub select: AstSelect,
	pub fragment: Fragment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstSelect {
	pub distinct: bool,
	pub items: Vec<AstSelectItem>,
	pub from: Option<AstTableRef>,
	pub filter: Option<AstExpr>,
	pub group_by: Vec<AstExpr>,
	pub having: Option<AstExpr>,
	/// The SELECT keyword.
	pub fragment: Fragment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstSelectItem {
	/// `*`
	Wildcard(Fragment),
	Expr {
		expr: AstExpr,
		alias: Option<Identifier>,
	},
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstTableRef {
	Collection {
		name: Identifier,
		alias: Option<Identifier>,
	},
	/// `(query) AS alias`
	Derived {
		query: Box<AstQuery>,
		alias: Identifier,
		fragment: Fragment,
	},
	Join {
		left: Box<AstTableRef>,
		right: Box<AstTableRef>,
		join_type: JoinType,
		on: Option<AstExpr>,
		/// The JOIN keyword.
		fragment: Fragment,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
	Inner,
	Left,
	Right,
	Full,
	Cross,
}

impl JoinType {
	pub const fn as_str(&self) -> &'static str {
		match self {
			JoinType::Inner => "INNER",
			JoinType::Left => "LEFT",
			JoinType::Right => "RIGHT",
			JoinType::Full => "FULL",
			JoinType::Cross => "CROSS",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstOrderSpec {
	pub expr: AstExpr,
	pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstLimit {
	pub limit: i64,
	pub offset: Option<i64>,
	pub fragment: Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
	Negate,
	Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
	Add,
	Subtract,
	Multiply,
	Divide,
	Modulo,
	Equal,
	NotEqual,
	LessThan,
	LessThanEqual,
	GreaterThan,
	GreaterThanEqual,
	And,
	Or,
	Concat,
}

impl BinaryOperator {
	pub const fn as_str(&self) -> &'static str {
		match self {
			BinaryOperator::Add => "+",
			BinaryOperator::Subtract => "-",
			BinaryOperator::Multiply => "*",
			BinaryOperator::Divide => "/",
			BinaryOperator::Modulo => "%",
			BinaryOperator::Equal => "=",
			BinaryOperator::NotEqual => "!=",
			BinaryOperator::LessThan => "<",
			BinaryOperator::LessThanEqual => "<=",
			BinaryOperator::GreaterThan => ">",
			BinaryOperator::GreaterThanEqual => ">=",
			BinaryOperator::And => "AND",
			BinaryOperator::Or => "OR",
			BinaryOperator::Concat => "||",
		}
	}

	pub fn is_comparison(&self) -> bool {
		matches!(
			self,
			BinaryOperator::Equal
				| BinaryOperator::NotEqual
				| BinaryOperator::LessThan
				| BinaryOperator::LessThanEqual
				| BinaryOperator::GreaterThan
				| BinaryOperator::GreaterThanEqual
		)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstExpr {
	Literal {
		value: Value,
		fragment: Fragment,
	},
	/// Possibly-dotted column reference; one identifier per segment.
	Column {
		path: Vec<Identifier>,
	},
	/// `*` as a function argument (`COUNT(*)`).
	Star(Fragment),
	Unary {
		op: UnaryOperator,
		expr: Box<AstExpr>,
		fragment: Fragment,
	},
	Binary {
		op: BinaryOperator,
		left: Box<AstExpr>,
		right: Box<AstExpr>,
		fragment: Fragment,
	},
	Between {
		expr: Box<AstExpr>,
		low: Box<AstExpr>,
		high: Box<AstExpr>,
		negated: bool,
		fragment: Fragment,
	},
	InList {
		expr: Box<AstExpr>,
		list: Vec<AstExpr>,
		negated: bool,
		fragment: Fragment,
	},
	Like {
		expr: Box<AstExpr>,
		pattern: Box<AstExpr>,
		negated: bool,
		fragment: Fragment,
	},
	IsNull {
		expr: Box<AstExpr>,
		negated: bool,
		fragment: Fragment,
	},
	Function {
		name: Identifier,
		args: Vec<AstExpr>,
	},
	/// `fn(...) OVER ([PARTITION BY ...] [ORDER BY ...])`. Accepted by
	/// the grammar; no pipeline translation exists.
	Window {
		name: Identifier,
		args: Vec<AstExpr>,
		partition_by: Vec<AstExpr>,
		order_by: Vec<AstOrderSpec>,
	},
	Case {
		operand: Option<Box<AstExpr>>,
		branches: Vec<(AstExpr, AstExpr)>,
		else_expr: Option<Box<AstExpr>>,
		fragment: Fragment,
	},
	Cast {
		expr: Box<AstExpr>,
		target: FieldType,
		fragment: Fragment,
	},
}

impl AstExpr {
	/// Best source position for diagnostics about this expression.
	pub fn fragment(&self) -> &Fragment {
		match self {
			AstExpr::Literal {
				fragment,
				..
			} => fragment,
			AstExpr::Column {
				path,
			} => &path[0].fragment,
			AstExpr::Star(fragment) => fragment,
			AstExpr::Unary {
				fragment,
				..
			} => fragment,
			AstExpr::Binary {
				fragment,
				..
			} => fragment,
			AstExpr::Between {
				fragment,
				..
			} => fragment,
			AstExpr::InList {
				fragment,
				..
			} => fragment,
			AstExpr::Like {
				fragment,
				..
			} => fragment,
			AstExpr::IsNull {
				fragment,
				..
			} => fragment,
			AstExpr::Function {
				name,
				..
			} => &name.fragment,
			AstExpr::Window {
				name,
				..
			} => &name.fragment,
			AstExpr::Case {
				fragment,
				..
			} => fragment,
			AstExpr::Cast {
				fragment,
				..
			} => fragment,
		}
	}
}
