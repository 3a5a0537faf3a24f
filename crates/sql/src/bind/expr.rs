// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! The semantically annotated expression tree. Every node carries its
//! inferred static type; column references are resolved to a source
//! index plus a field path.

use docsql_type::{FieldType, Fragment, Value};

use crate::ast::{BinaryOperator, UnaryOperator};

#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
	Literal(Value),
	/// Field of a scope source: index into the select block's sources
	/// plus the path within that source's schema.
	FieldRef {
		source: usize,
		path: Vec<String>,
		ty: FieldType,
		fragment: Fragment,
	},
	/// Grouping key of the enclosing GroupAggregate.
	GroupKeyRef {
		index: usize,
		ty: FieldType,
	},
	/// Aggregate result of the enclosing GroupAggregate.
	AggregateRef {
		index: usize,
		ty: FieldType,
	},
	Unary {
		op: UnaryOperator,
		expr: Box<BoundExpr>,
		ty: FieldType,
	},
	Binary {
		op: BinaryOperator,
		left: Box<BoundExpr>,
		right: Box<BoundExpr>,
		ty: FieldType,
	},
	Between {
		expr: Box<BoundExpr>,
		low: Box<BoundExpr>,
		high: Box<BoundExpr>,
		negated: bool,
	},
	InList {
		expr: Box<BoundExpr>,
		list: Vec<BoundExpr>,
		negated: bool,
	},
	Like {
		expr: Box<BoundExpr>,
		pattern: Box<BoundExpr>,
		negated: bool,
	},
	IsNull {
		expr: Box<BoundExpr>,
		negated: bool,
	},
	Call {
		function: ScalarFunction,
		args: Vec<BoundExpr>,
		ty: FieldType,
	},
	Case {
		operand: Option<Box<BoundExpr>>,
		branches: Vec<(BoundExpr, BoundExpr)>,
		else_expr: Option<Box<BoundExpr>>,
		ty: FieldType,
	},
	Cast {
		expr: Box<BoundExpr>,
		target: FieldType,
	},
	/// Window function call; accepted by the binder, rejected when the
	/// plan is lowered.
	Window {
		name: String,
		fragment: Fragment,
	},
}

impl BoundExpr {
	pub fn ty(&self) -> FieldType {
		match self {
			BoundExpr::Literal(value) => value.field_type(),
			BoundExpr::FieldRef {
				ty,
				..
			} => ty.clone(),
			BoundExpr::GroupKeyRef {
				ty,
				..
			} => ty.clone(),
			BoundExpr::AggregateRef {
				ty,
				..
			} => ty.clone(),
			BoundExpr::Unary {
				ty,
				..
			} => ty.clone(),
			BoundExpr::Binary {
				ty,
				..
			} => ty.clone(),
			BoundExpr::Between {
				..
			} => FieldType::Boolean,
			BoundExpr::InList {
				..
			} => FieldType::Boolean,
			BoundExpr::Like {
				..
			} => FieldType::Boolean,
			BoundExpr::IsNull {
				..
			} => FieldType::Boolean,
			BoundExpr::Call {
				ty,
				..
			} => ty.clone(),
			BoundExpr::Case {
				ty,
				..
			} => ty.clone(),
			BoundExpr::Cast {
				target,
				..
			} => target.clone(),
			BoundExpr::Window {
				..
			} => FieldType::Any,
		}
	}
}

/// Structural equality ignoring source fragments; used to match select
/// and ORDER BY expressions against GROUP BY keys and output columns.
pub fn same_expr(a: &BoundExpr, b: &BoundExpr) -> bool {
	use BoundExpr::*;

	match (a, b) {
		(Literal(x), Literal(y)) => x == y,
		(
			FieldRef {
				source: sa,
				path: pa,
				..
			},
			FieldRef {
				source: sb,
				path: pb,
				..
			},
		) => sa == sb && pa == pb,
		(
			GroupKeyRef {
				index: ia,
				..
			},
			GroupKeyRef {
				index: ib,
				..
			},
		) => ia == ib,
		(
			AggregateRef {
				index: ia,
				..
			},
			AggregateRef {
				index: ib,
				..
			},
		) => ia == ib,
		(
			Unary {
				op: oa,
				expr: ea,
				..
			},
			Unary {
				op: ob,
				expr: eb,
				..
			},
		) => oa == ob && same_expr(ea, eb),
		(
			Binary {
				op: oa,
				left: la,
				right: ra,
				..
			},
			Binary {
				op: ob,
				left: lb,
				right: rb,
				..
			},
		) => oa == ob && same_expr(la, lb) && same_expr(ra, rb),
		(
			Cast {
				expr: ea,
				target: ta,
			},
			Cast {
				expr: eb,
				target: tb,
			},
		) => ta == tb && same_expr(ea, eb),
		(
			Call {
				function: fa,
				args: aa,
				..
			},
			Call {
				function: fb,
				args: ab,
				..
			},
		) => fa == fb && aa.len() == ab.len() && aa.iter().zip(ab).all(|(x, y)| same_expr(x, y)),
		_ => false,
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunction {
	Upper,
	Lower,
	Abs,
	Coalesce,
}

impl ScalarFunction {
	pub fn from_name(name: &str) -> Option<Self> {
		match name.to_ascii_lowercase().as_str() {
			"upper" => Some(ScalarFunction::Upper),
			"lower" => Some(ScalarFunction::Lower),
			"abs" => Some(ScalarFunction::Abs),
			"coalesce" => Some(ScalarFunction::Coalesce),
			_ => None,
		}
	}

	pub const fn as_str(&self) -> &'static str {
		match self {
			ScalarFunction::Upper => "UPPER",
			ScalarFunction::Lower => "LOWER",
			ScalarFunction::Abs => "ABS",
			ScalarFunction::Coalesce => "COALESCE",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
	Count,
	Sum,
	Avg,
	Min,
	Max,
}

impl AggregateFunction {
	pub fn from_name(name: &str) -> Option<Self> {
		match name.to_ascii_lowercase().as_str() {
			"count" => Some(AggregateFunction::Count),
			"sum" => Some(AggregateFunction::Sum),
			"avg" => Some(AggregateFunction::Avg),
			"min" => Some(AggregateFunction::Min),
			"max" => Some(AggregateFunction::Max),
			_ => None,
		}
	}

	pub const fn as_str(&self) -> &'static str {
		match self {
			AggregateFunction::Count => "COUNT",
			AggregateFunction::Sum => "SUM",
			AggregateFunction::Avg => "AVG",
			AggregateFunction::Min => "MIN",
			AggregateFunction::Max => "MAX",
		}
	}
}

/// One hoisted aggregate call. `arg` is `None` for `COUNT(*)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundAggregate {
	pub function: AggregateFunction,
	pub arg: Option<BoundExpr>,
	pub ty: FieldType,
	pub fragment: Fragment,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn field(source: usize, name: &str) -> BoundExpr {
		BoundExpr::FieldRef {
			source,
			path: vec![name.to_string()],
			ty: FieldType::Int,
			fragment: Fragment::statement(name, 1, 1),
		}
	}

	#[test]
	fn test_same_expr_ignores_fragments() {
		let a = field(0, "x");
		let b = BoundExpr::FieldRef {
			source: 0,
			path: vec!["x".to_string()],
			ty: FieldType::Int,
			fragment: Fragment::statement("x", 9, 9),
		};
		assert!(same_expr(&a, &b));
	}

	#[test]
	fn test_same_expr_distinguishes_sources_and_paths() {
		assert!(!same_expr(&field(0, "x"), &field(1, "x")));
		assert!(!same_expr(&field(0, "x"), &field(0, "y")));
	}

	#[test]
	fn test_same_expr_recurses() {
		let sum = |l: BoundExpr, r: BoundExpr| BoundExpr::Binary {
			op: BinaryOperator::Add,
			left: Box::new(l),
			right: Box::new(r),
			ty: FieldType::Int,
		};
		assert!(same_expr(&sum(field(0, "a"), field(0, "b")), &sum(field(0, "a"), field(0, "b"))));
		assert!(!same_expr(&sum(field(0, "a"), field(0, "b")), &sum(field(0, "b"), field(0, "a"))));
	}

	#[test]
	fn test_function_lookup() {
		assert_eq!(ScalarFunction::from_name("Upper"), Some(ScalarFunction::Upper));
		assert_eq!(AggregateFunction::from_name("COUNT"), Some(AggregateFunction::Count));
		assert_eq!(ScalarFunction::from_name("nope"), None);
		assert_eq!(AggregateFunction::from_name("median"), None);
	}
}
