// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! Lowering of bound expressions into aggregation expression documents.
//!
//! Every expression is emitted in `$expr` form; field references become
//! `$`-paths resolved through an [`ExprContext`], which knows how each
//! source of the select block is reachable at the current point of the
//! pipeline (root document, unwound lookup field, or `let` variable of a
//! lookup sub-pipeline).

use docsql_type::{FieldType, Value as SqlValue, err, error::diagnostic::lower, internal_error};
use indexmap::IndexMap;
use serde_json::{Value, json};

use crate::{
	ast::{BinaryOperator, UnaryOperator},
	bind::{AggregateFunction, BoundAggregate, BoundExpr, ScalarFunction},
};

/// How a source's fields are addressed at the current pipeline position.
#[derive(Debug, Clone)]
pub(crate) enum FieldAccess {
	/// Fields live under this path prefix of the current document; the
	/// prefix is empty for root sources and `"alias."` after a lookup.
	Prefix(String),
	/// Fields were captured as `let` variables of an enclosing lookup;
	/// maps each captured path to its `$$var` reference.
	Variables(IndexMap<Vec<String>, String>),
}

#[derive(Debug, Clone)]
pub(crate) struct ExprContext {
	sources: IndexMap<usize, FieldAccess>,
}

impl ExprContext {
	pub(crate) fn empty() -> Self {
		Self {
			sources: IndexMap::new(),
		}
	}

	pub(crate) fn root(source: usize) -> Self {
		let mut context = Self::empty();
		context.set(source, FieldAccess::Prefix(String::new()));
		context
	}

	pub(crate) fn set(&mut self, source: usize, access: FieldAccess) {
		self.sources.insert(source, access);
	}

	pub(crate) fn get(&self, source: usize) -> Option<&FieldAccess> {
		self.sources.get(&source)
	}

	pub(crate) fn sources(&self) -> impl Iterator<Item = (usize, &FieldAccess)> {
		self.sources.iter().map(|(source, access)| (*source, access))
	}

	pub(crate) fn contains(&self, source: usize) -> bool {
		self.sources.contains_key(&source)
	}

	/// The `$`-path of a field of `source`, if that source is addressed
	/// by prefix here.
	pub(crate) fn field_path(&self, source: usize, path: &[String]) -> Option<String> {
		match self.get(source)? {
			FieldAccess::Prefix(prefix) => Some(format!("${}{}", prefix, path.join("."))),
			FieldAccess::Variables(_) => None,
		}
	}
}

pub(crate) fn lower_expr(expr: &BoundExpr, context: &ExprContext) -> crate::Result<Value> {
	match expr {
		BoundExpr::Literal(value) => Ok(lower_literal(value)),
		BoundExpr::FieldRef {
			source,
			path,
			..
		} => match context.get(*source) {
			Some(FieldAccess::Prefix(prefix)) => Ok(json!(format!("${}{}", prefix, path.join(".")))),
			Some(FieldAccess::Variables(variables)) => match variables.get(path) {
				Some(variable) => Ok(json!(variable)),
				None => Err(internal_error!("field path `{}` not captured as a lookup variable", path.join("."))),
			},
			None => Err(internal_error!("source {} unreachable at this pipeline position", source)),
		},
		BoundExpr::GroupKeyRef {
			index,
			..
		} => Ok(json!(format!("$k{}", index))),
		BoundExpr::AggregateRef {
			index,
			..
		} => Ok(json!(format!("$agg{}", index))),
		BoundExpr::Unary {
			op,
			expr,
			..
		} => {
			let operand = lower_expr(expr, context)?;
			Ok(match op {
				UnaryOperator::Negate => json!({"$multiply": [-1, operand]}),
				UnaryOperator::Not => json!({"$not": [operand]}),
			})
		}
		BoundExpr::Binary {
			op,
			left,
			right,
			ty,
		} => {
			let left = lower_expr(left, context)?;
			let right = lower_expr(right, context)?;
			Ok(lower_binary(*op, left, right, ty))
		}
		BoundExpr::Between {
			expr,
			low,
			high,
			negated,
		} => {
			let operand = lower_expr(expr, context)?;
			let low = lower_expr(low, context)?;
			let high = lower_expr(high, context)?;
			let range = json!({"$and": [{"$gte": [operand, low]}, {"$lte": [operand, high]}]});
			Ok(negate_if(*negated, range))
		}
		BoundExpr::InList {
			expr,
			list,
			negated,
		} => {
			let operand = lower_expr(expr, context)?;
			let elements =
				list.iter().map(|element| lower_expr(element, context)).collect::<crate::Result<Vec<_>>>()?;
			Ok(negate_if(*negated, json!({"$in": [operand, elements]})))
		}
		BoundExpr::Like {
			expr,
			pattern,
			negated,
		} => {
			let operand = lower_expr(expr, context)?;
			let BoundExpr::Literal(SqlValue::Utf8(pattern)) = &**pattern else {
				return err!(lower::unsupported_construct(
					"LIKE with a computed pattern",
					docsql_type::Fragment::None,
				));
			};
			let matched = json!({"$regexMatch": {"input": operand, "regex": like_regex(pattern)}});
			Ok(negate_if(*negated, matched))
		}
		BoundExpr::IsNull {
			expr,
			negated,
		} => {
			// `$lte null` is true for null and for missing fields
			let operand = lower_expr(expr, context)?;
			Ok(if *negated {
				json!({"$gt": [operand, Value::Null]})
			} else {
				json!({"$lte": [operand, Value::Null]})
			})
		}
		BoundExpr::Call {
			function,
			args,
			..
		} => lower_call(*function, args, context),
		BoundExpr::Case {
			operand,
			branches,
			else_expr,
			..
		} => {
			let operand = operand.as_ref().map(|operand| lower_expr(operand, context)).transpose()?;
			let mut cases = Vec::with_capacity(branches.len());
			for (guard, result) in branches {
				let guard = lower_expr(guard, context)?;
				let case = match &operand {
					Some(operand) => json!({"$eq": [operand, guard]}),
					None => guard,
				};
				cases.push(json!({"case": case, "then": lower_expr(result, context)?}));
			}
			let default = match else_expr {
				Some(else_expr) => lower_expr(else_expr, context)?,
				None => Value::Null,
			};
			Ok(json!({"$switch": {"branches": cases, "default": default}}))
		}
		BoundExpr::Cast {
			expr,
			target,
		} => {
			let input = lower_expr(expr, context)?;
			Ok(json!({"$convert": {"input": input, "to": convert_target(target)?}}))
		}
		BoundExpr::Window {
			fragment,
			..
		} => err!(lower::unsupported_window_function(fragment.clone())),
	}
}

fn lower_literal(value: &SqlValue) -> Value {
	match value {
		SqlValue::Null => Value::Null,
		SqlValue::Boolean(v) => json!(v),
		SqlValue::Int(v) => json!(v),
		SqlValue::Float(v) => json!(v),
		// Escaped; a bare string would be read as a field path
		SqlValue::Utf8(v) => json!({ "$literal": v }),
	}
}

fn lower_binary(op: BinaryOperator, left: Value, right: Value, ty: &FieldType) -> Value {
	use BinaryOperator::*;

	// Integer division truncates; $divide alone would produce a double
	if op == Divide && *ty == FieldType::Int {
		return json!({"$toLong": {"$trunc": {"$divide": [left, right]}}});
	}
	let operator = match op {
		Add => "$add",
		Subtract => "$subtract",
		Multiply => "$multiply",
		Divide => "$divide",
		Modulo => "$mod",
		Equal => "$eq",
		NotEqual => "$ne",
		LessThan => "$lt",
		LessThanEqual => "$lte",
		GreaterThan => "$gt",
		GreaterThanEqual => "$gte",
		And => "$and",
		Or => "$or",
		Concat => "$concat",
	};
	operator_doc(operator, json!([left, right]))
}

/// A one-key operator document with a computed key.
pub(crate) fn operator_doc(operator: &str, body: Value) -> Value {
	let mut document = serde_json::Map::with_capacity(1);
	document.insert(operator.to_string(), body);
	Value::Object(document)
}

fn lower_call(function: ScalarFunction, args: &[BoundExpr], context: &ExprContext) -> crate::Result<Value> {
	let lowered = args.iter().map(|arg| lower_expr(arg, context)).collect::<crate::Result<Vec<_>>>()?;
	Ok(match function {
		ScalarFunction::Upper => json!({"$toUpper": lowered[0]}),
		ScalarFunction::Lower => json!({"$toLower": lowered[0]}),
		ScalarFunction::Abs => json!({"$abs": lowered[0]}),
		// Right-nested $ifNull pairs; the two-argument form is portable
		ScalarFunction::Coalesce => {
			let mut iter = lowered.into_iter().rev();
			let last = iter.next().unwrap_or(Value::Null);
			iter.fold(last, |acc, arg| json!({"$ifNull": [arg, acc]}))
		}
	})
}

pub(crate) fn lower_aggregate(aggregate: &BoundAggregate, context: &ExprContext) -> crate::Result<Value> {
	let arg = aggregate.arg.as_ref().map(|arg| lower_expr(arg, context)).transpose()?;
	Ok(match (aggregate.function, arg) {
		(AggregateFunction::Count, None) => json!({"$sum": 1}),
		// COUNT(x) counts documents where x is neither null nor missing
		(AggregateFunction::Count, Some(arg)) => json!({"$sum": {"$cond": [{"$gt": [arg, Value::Null]}, 1, 0]}}),
		(AggregateFunction::Sum, Some(arg)) => json!({"$sum": arg}),
		(AggregateFunction::Avg, Some(arg)) => json!({"$avg": arg}),
		(AggregateFunction::Min, Some(arg)) => json!({"$min": arg}),
		(AggregateFunction::Max, Some(arg)) => json!({"$max": arg}),
		(function, None) => {
			return Err(internal_error!("aggregate {} lowered without an argument", function.as_str()));
		}
	})
}

fn convert_target(target: &FieldType) -> crate::Result<&'static str> {
	match target {
		FieldType::Boolean => Ok("bool"),
		FieldType::Int => Ok("long"),
		FieldType::Float => Ok("double"),
		FieldType::Utf8 => Ok("string"),
		_ => Err(internal_error!("cast target `{}` survived binding", target)),
	}
}

fn negate_if(negated: bool, value: Value) -> Value {
	if negated {
		json!({ "$not": [value] })
	} else {
		value
	}
}

/// Translate a LIKE pattern into an anchored regular expression.
/// `%` matches any run, `_` any single character; everything else is
/// literal.
pub(crate) fn like_regex(pattern: &str) -> String {
	let mut regex = String::with_capacity(pattern.len() + 2);
	regex.push('^');
	for c in pattern.chars() {
		match c {
			'%' => regex.push_str(".*"),
			'_' => regex.push('.'),
			'.' | '^' | '$' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '\\' => {
				regex.push('\\');
				regex.push(c);
			}
			other => regex.push(other),
		}
	}
	regex.push('$');
	regex
}
