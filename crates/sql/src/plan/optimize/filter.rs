// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! Merge stacked filters into one conjunctive predicate. The inner
//! filter ran first, so it becomes the left operand.

use docsql_type::FieldType;

use crate::{
	ast::BinaryOperator,
	bind::BoundExpr,
	plan::logical::{FilterNode, LogicalPlan},
};

pub fn apply(plan: LogicalPlan, changed: &mut bool) -> LogicalPlan {
	let plan = plan.map_inputs(&mut |child| apply(child, changed));
	match plan {
		LogicalPlan::Filter(outer) => match *outer.input {
			LogicalPlan::Filter(inner) => {
				*changed = true;
				LogicalPlan::Filter(FilterNode {
					input: inner.input,
					predicate: BoundExpr::Binary {
						op: BinaryOperator::And,
						left: Box::new(inner.predicate),
						right: Box::new(outer.predicate),
						ty: FieldType::Boolean,
					},
				})
			}
			input => LogicalPlan::Filter(FilterNode {
				input: Box::new(input),
				predicate: outer.predicate,
			}),
		},
		other => other,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use docsql_type::{Fragment, Value};
	use indexmap::IndexMap;

	use crate::plan::logical::{ScanInput, ScanNode};

	fn scan() -> LogicalPlan {
		let mut fields = IndexMap::new();
		fields.insert("a".to_string(), FieldType::Int);
		LogicalPlan::Scan(ScanNode {
			alias: "t".to_string(),
			source: 0,
			input: ScanInput::Collection("t".to_string()),
			fields,
		})
	}

	fn predicate(value: i64) -> BoundExpr {
		BoundExpr::Binary {
			op: BinaryOperator::Equal,
			left: Box::new(BoundExpr::FieldRef {
				source: 0,
				path: vec!["a".to_string()],
				ty: FieldType::Int,
				fragment: Fragment::None,
			}),
			right: Box::new(BoundExpr::Literal(Value::Int(value))),
			ty: FieldType::Boolean,
		}
	}

	#[test]
	fn test_stacked_filters_merge() {
		let stacked = LogicalPlan::Filter(FilterNode {
			input: Box::new(LogicalPlan::Filter(FilterNode {
				input: Box::new(scan()),
				predicate: predicate(1),
			})),
			predicate: predicate(2),
		});

		let mut changed = false;
		let merged = apply(stacked, &mut changed);
		assert!(changed);

		let LogicalPlan::Filter(filter) = merged else {
			panic!("expected single filter");
		};
		assert!(matches!(*filter.input, LogicalPlan::Scan(_)));
		let BoundExpr::Binary {
			op: BinaryOperator::And,
			left,
			..
		} = filter.predicate
		else {
			panic!("expected conjunction");
		};
		assert_eq!(*left, predicate(1));
	}

	#[test]
	fn test_single_filter_untouched() {
		let single = LogicalPlan::Filter(FilterNode {
			input: Box::new(scan()),
			predicate: predicate(1),
		});
		let mut changed = false;
		let result = apply(single.clone(), &mut changed);
		assert!(!changed);
		assert_eq!(result, single);
	}
}
