// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! Constant folding. Evaluates literal subexpressions at compile time
//! and simplifies boolean connectives with literal operands. Folding is
//! conservative: anything that would error or change runtime semantics
//! (division by zero, integer overflow, null operands) is left alone.

use docsql_type::Value;

use crate::{
	ast::{BinaryOperator, UnaryOperator},
	bind::BoundExpr,
	plan::logical::{FilterNode, GroupNode, JoinNode, LogicalPlan, ProjectNode},
};

pub fn apply(plan: LogicalPlan, changed: &mut bool) -> LogicalPlan {
	let plan = plan.map_inputs(&mut |child| apply(child, changed));
	match plan {
		LogicalPlan::Filter(filter) => {
			let predicate = fold_expr(filter.predicate, changed);
			// A predicate folded to TRUE filters nothing
			if predicate == BoundExpr::Literal(Value::Boolean(true)) {
				*changed = true;
				return *filter.input;
			}
			LogicalPlan::Filter(FilterNode {
				input: filter.input,
				predicate,
			})
		}
		LogicalPlan::Project(project) => LogicalPlan::Project(ProjectNode {
			input: project.input,
			columns: project
				.columns
				.into_iter()
				.map(|(name, expr, ty)| (name, fold_expr(expr, changed), ty))
				.collect(),
		}),
		LogicalPlan::Join(join) => LogicalPlan::Join(JoinNode {
			on: join.on.map(|on| fold_expr(on, changed)),
			..join
		}),
		LogicalPlan::GroupAggregate(group) => LogicalPlan::GroupAggregate(GroupNode {
			input: group.input,
			keys: group.keys.into_iter().map(|key| fold_expr(key, changed)).collect(),
			aggregates: group
				.aggregates
				.into_iter()
				.map(|mut aggregate| {
					aggregate.arg = aggregate.arg.map(|arg| fold_expr(arg, changed));
					aggregate
				})
				.collect(),
		}),
		other => other,
	}
}

pub fn fold_expr(expr: BoundExpr, changed: &mut bool) -> BoundExpr {
	match expr {
		BoundExpr::Unary {
			op,
			expr: operand,
			ty,
		} => {
			let operand = fold_expr(*operand, changed);
			if let BoundExpr::Literal(value) = &operand {
				if let Some(folded) = eval_unary(op, value) {
					*changed = true;
					return BoundExpr::Literal(folded);
				}
			}
			BoundExpr::Unary {
				op,
				expr: Box::new(operand),
				ty,
			}
		}
		BoundExpr::Binary {
			op,
			left,
			right,
			ty,
		} => {
			let left = fold_expr(*left, changed);
			let right = fold_expr(*right, changed);

			if matches!(op, BinaryOperator::And | BinaryOperator::Or) {
				if let Some(simplified) = simplify_logical(op, &left, &right) {
					*changed = true;
					return simplified;
				}
			}
			if let (BoundExpr::Literal(l), BoundExpr::Literal(r)) = (&left, &right) {
				if let Some(folded) = eval_binary(op, l, r) {
					*changed = true;
					return BoundExpr::Literal(folded);
				}
			}
			BoundExpr::Binary {
				op,
				left: Box::new(left),
				right: Box::new(right),
				ty,
			}
		}
		BoundExpr::Between {
			expr,
			low,
			high,
			negated,
		} => BoundExpr::Between {
			expr: Box::new(fold_expr(*expr, changed)),
			low: Box::new(fold_expr(*low, changed)),
			high: Box::new(fold_expr(*high, changed)),
			negated,
		},
		BoundExpr::InList {
			expr,
			list,
			negated,
		} => BoundExpr::InList {
			expr: Box::new(fold_expr(*expr, changed)),
			list: list.into_iter().map(|element| fold_expr(element, changed)).collect(),
			negated,
		},
		BoundExpr::Like {
			expr,
			pattern,
			negated,
		} => BoundExpr::Like {
			expr: Box::new(fold_expr(*expr, changed)),
			pattern: Box::new(fold_expr(*pattern, changed)),
			negated,
		},
		BoundExpr::IsNull {
			expr,
			negated,
		} => BoundExpr::IsNull {
			expr: Box::new(fold_expr(*expr, changed)),
			negated,
		},
		BoundExpr::Call {
			function,
			args,
			ty,
		} => BoundExpr::Call {
			function,
			args: args.into_iter().map(|arg| fold_expr(arg, changed)).collect(),
			ty,
		},
		BoundExpr::Case {
			operand,
			branches,
			else_expr,
			ty,
		} => BoundExpr::Case {
			operand: operand.map(|operand| Box::new(fold_expr(*operand, changed))),
			branches: branches
				.into_iter()
				.map(|(guard, result)| (fold_expr(guard, changed), fold_expr(result, changed)))
				.collect(),
			else_expr: else_expr.map(|else_expr| Box::new(fold_expr(*else_expr, changed))),
			ty,
		},
		BoundExpr::Cast {
			expr,
			target,
		} => BoundExpr::Cast {
			expr: Box::new(fold_expr(*expr, changed)),
			target,
		},
		leaf => leaf,
	}
}

fn eval_unary(op: UnaryOperator, value: &Value) -> Option<Value> {
	match (op, value) {
		(UnaryOperator::Negate, Value::Int(v)) => v.checked_neg().map(Value::Int),
		(UnaryOperator::Negate, Value::Float(v)) => Some(Value::Float(-v)),
		(UnaryOperator::Not, Value::Boolean(v)) => Some(Value::Boolean(!v)),
		_ => None,
	}
}

/// AND/OR identity and absorption with one literal operand.
fn simplify_logical(op: BinaryOperator, left: &BoundExpr, right: &BoundExpr) -> Option<BoundExpr> {
	let literal = |expr: &BoundExpr| match expr {
		BoundExpr::Literal(Value::Boolean(v)) => Some(*v),
		_ => None,
	};
	match (op, literal(left), literal(right)) {
		(BinaryOperator::And, Some(true), _) => Some(right.clone()),
		(BinaryOperator::And, _, Some(true)) => Some(left.clone()),
		(BinaryOperator::And, Some(false), _) | (BinaryOperator::And, _, Some(false)) => {
			Some(BoundExpr::Literal(Value::Boolean(false)))
		}
		(BinaryOperator::Or, Some(false), _) => Some(right.clone()),
		(BinaryOperator::Or, _, Some(false)) => Some(left.clone()),
		(BinaryOperator::Or, Some(true), _) | (BinaryOperator::Or, _, Some(true)) => {
			Some(BoundExpr::Literal(Value::Boolean(true)))
		}
		_ => None,
	}
}

fn eval_binary(op: BinaryOperator, left: &Value, right: &Value) -> Option<Value> {
	use BinaryOperator::*;

	match op {
		Add | Subtract | Multiply | Divide | Modulo => eval_arithmetic(op, left, right),
		Equal | NotEqual | LessThan | LessThanEqual | GreaterThan | GreaterThanEqual => {
			eval_comparison(op, left, right)
		}
		Concat => match (left, right) {
			(Value::Utf8(l), Value::Utf8(r)) => Some(Value::Utf8(format!("{}{}", l, r))),
			_ => None,
		},
		// Handled by simplify_logical
		And | Or => None,
	}
}

fn eval_arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> Option<Value> {
	use BinaryOperator::*;

	match (left, right) {
		(Value::Int(l), Value::Int(r)) => match op {
			Add => l.checked_add(*r).map(Value::Int),
			Subtract => l.checked_sub(*r).map(Value::Int),
			Multiply => l.checked_mul(*r).map(Value::Int),
			Divide => l.checked_div(*r).map(Value::Int),
			Modulo => l.checked_rem(*r).map(Value::Int),
			_ => None,
		},
		(Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
			let l = as_float(left)?;
			let r = as_float(right)?;
			let result = match op {
				Add => l + r,
				Subtract => l - r,
				Multiply => l * r,
				Divide => l / r,
				Modulo => l % r,
				_ => return None,
			};
			result.is_finite().then_some(Value::Float(result))
		}
		_ => None,
	}
}

fn eval_comparison(op: BinaryOperator, left: &Value, right: &Value) -> Option<Value> {
	use BinaryOperator::*;
	use std::cmp::Ordering;

	let ordering = match (left, right) {
		(Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
			as_float(left)?.partial_cmp(&as_float(right)?)?
		}
		(Value::Utf8(l), Value::Utf8(r)) => l.cmp(r),
		(Value::Boolean(l), Value::Boolean(r)) => l.cmp(r),
		// NULL comparisons keep their runtime semantics
		_ => return None,
	};
	let result = match op {
		Equal => ordering == Ordering::Equal,
		NotEqual => ordering != Ordering::Equal,
		LessThan => ordering == Ordering::Less,
		LessThanEqual => ordering != Ordering::Greater,
		GreaterThan => ordering == Ordering::Greater,
		GreaterThanEqual => ordering != Ordering::Less,
		_ => return None,
	};
	Some(Value::Boolean(result))
}

fn as_float(value: &Value) -> Option<f64> {
	match value {
		Value::Int(v) => Some(*v as f64),
		Value::Float(v) => Some(*v),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use docsql_type::FieldType;

	fn int(v: i64) -> BoundExpr {
		BoundExpr::Literal(Value::Int(v))
	}

	fn binary(op: BinaryOperator, left: BoundExpr, right: BoundExpr, ty: FieldType) -> BoundExpr {
		BoundExpr::Binary {
			op,
			left: Box::new(left),
			right: Box::new(right),
			ty,
		}
	}

	fn field() -> BoundExpr {
		BoundExpr::FieldRef {
			source: 0,
			path: vec!["a".to_string()],
			ty: FieldType::Int,
			fragment: docsql_type::Fragment::None,
		}
	}

	#[test]
	fn test_fold_arithmetic() {
		let mut changed = false;
		let folded = fold_expr(binary(BinaryOperator::Add, int(1), int(2), FieldType::Int), &mut changed);
		assert_eq!(folded, int(3));
		assert!(changed);
	}

	#[test]
	fn test_fold_nested() {
		let mut changed = false;
		let inner = binary(BinaryOperator::Multiply, int(2), int(3), FieldType::Int);
		let outer = binary(BinaryOperator::Add, inner, int(4), FieldType::Int);
		assert_eq!(fold_expr(outer, &mut changed), int(10));
	}

	#[test]
	fn test_skip_division_by_zero() {
		let mut changed = false;
		let expr = binary(BinaryOperator::Divide, int(1), int(0), FieldType::Int);
		let folded = fold_expr(expr.clone(), &mut changed);
		assert_eq!(folded, expr);
		assert!(!changed);
	}

	#[test]
	fn test_skip_overflow() {
		let mut changed = false;
		let expr = binary(BinaryOperator::Add, int(i64::MAX), int(1), FieldType::Int);
		assert_eq!(fold_expr(expr.clone(), &mut changed), expr);
	}

	#[test]
	fn test_fold_comparison() {
		let mut changed = false;
		let expr = binary(BinaryOperator::LessThan, int(1), int(2), FieldType::Boolean);
		assert_eq!(fold_expr(expr, &mut changed), BoundExpr::Literal(Value::Boolean(true)));
	}

	#[test]
	fn test_skip_null_comparison() {
		let mut changed = false;
		let expr = binary(
			BinaryOperator::Equal,
			BoundExpr::Literal(Value::Null),
			int(1),
			FieldType::Boolean,
		);
		assert_eq!(fold_expr(expr.clone(), &mut changed), expr);
	}

	#[test]
	fn test_and_identity() {
		let mut changed = false;
		let truth = BoundExpr::Literal(Value::Boolean(true));
		let guard = binary(BinaryOperator::GreaterThan, field(), int(0), FieldType::Boolean);
		let expr = binary(BinaryOperator::And, truth, guard.clone(), FieldType::Boolean);
		assert_eq!(fold_expr(expr, &mut changed), guard);
	}

	#[test]
	fn test_or_absorption() {
		let mut changed = false;
		let truth = BoundExpr::Literal(Value::Boolean(true));
		let guard = binary(BinaryOperator::GreaterThan, field(), int(0), FieldType::Boolean);
		let expr = binary(BinaryOperator::Or, guard, truth.clone(), FieldType::Boolean);
		assert_eq!(fold_expr(expr, &mut changed), truth);
	}

	#[test]
	fn test_fold_concat() {
		let mut changed = false;
		let expr = binary(
			BinaryOperator::Concat,
			BoundExpr::Literal(Value::Utf8("ab".into())),
			BoundExpr::Literal(Value::Utf8("cd".into())),
			FieldType::Utf8,
		);
		assert_eq!(fold_expr(expr, &mut changed), BoundExpr::Literal(Value::Utf8("abcd".into())));
	}

	#[test]
	fn test_fold_unary() {
		let mut changed = false;
		let expr = BoundExpr::Unary {
			op: UnaryOperator::Negate,
			expr: Box::new(int(5)),
			ty: FieldType::Int,
		};
		assert_eq!(fold_expr(expr, &mut changed), int(-5));
	}
}
