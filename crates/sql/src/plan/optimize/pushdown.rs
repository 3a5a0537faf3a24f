// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! Predicate pushdown. A filter above an inner or cross join is split
//! into its conjuncts; conjuncts touching only one side move below the
//! join so the lookup sub-pipeline filters early. Outer joins are left
//! alone, pushing below them changes null-extension semantics.

use docsql_type::FieldType;

use crate::{
	ast::{BinaryOperator, JoinType},
	bind::BoundExpr,
	plan::logical::{FilterNode, JoinNode, LogicalPlan, visit_field_refs},
};

pub fn apply(plan: LogicalPlan, changed: &mut bool) -> LogicalPlan {
	let plan = plan.map_inputs(&mut |child| apply(child, changed));
	match plan {
		LogicalPlan::Filter(filter) => match *filter.input {
			LogicalPlan::Join(join) if matches!(join.join_type, JoinType::Inner | JoinType::Cross) => {
				push_through_join(filter.predicate, join, changed)
			}
			input => LogicalPlan::Filter(FilterNode {
				input: Box::new(input),
				predicate: filter.predicate,
			}),
		},
		other => other,
	}
}

fn push_through_join(predicate: BoundExpr, join: JoinNode, changed: &mut bool) -> LogicalPlan {
	let left_sources = source_set(&join.left);
	let right_sources = source_set(&join.right);

	let mut conjuncts = Vec::new();
	split_and(predicate, &mut conjuncts);

	let mut left_parts = Vec::new();
	let mut right_parts = Vec::new();
	let mut kept = Vec::new();
	for conjunct in conjuncts {
		let mut sources = Vec::new();
		visit_field_refs(&conjunct, &mut |source, _| {
			if !sources.contains(&source) {
				sources.push(source);
			}
		});
		if !sources.is_empty() && sources.iter().all(|s| left_sources.contains(s)) {
			left_parts.push(conjunct);
		} else if !sources.is_empty() && sources.iter().all(|s| right_sources.contains(s)) {
			right_parts.push(conjunct);
		} else {
			kept.push(conjunct);
		}
	}

	if left_parts.is_empty() && right_parts.is_empty() {
		// Nothing moved; reassemble the original shape
		let predicate = and_all(kept);
		return LogicalPlan::Filter(FilterNode {
			input: Box::new(LogicalPlan::Join(join)),
			predicate,
		});
	}
	*changed = true;

	let left = wrap_filter(*join.left, left_parts);
	let right = wrap_filter(*join.right, right_parts);
	let joined = LogicalPlan::Join(JoinNode {
		left: Box::new(left),
		right: Box::new(right),
		..join
	});
	if kept.is_empty() {
		joined
	} else {
		LogicalPlan::Filter(FilterNode {
			input: Box::new(joined),
			predicate: and_all(kept),
		})
	}
}

fn wrap_filter(plan: LogicalPlan, conjuncts: Vec<BoundExpr>) -> LogicalPlan {
	if conjuncts.is_empty() {
		plan
	} else {
		LogicalPlan::Filter(FilterNode {
			input: Box::new(plan),
			predicate: and_all(conjuncts),
		})
	}
}

fn split_and(expr: BoundExpr, out: &mut Vec<BoundExpr>) {
	match expr {
		BoundExpr::Binary {
			op: BinaryOperator::And,
			left,
			right,
			..
		} => {
			split_and(*left, out);
			split_and(*right, out);
		}
		other => out.push(other),
	}
}

fn and_all(mut conjuncts: Vec<BoundExpr>) -> BoundExpr {
	let first = conjuncts.remove(0);
	conjuncts.into_iter().fold(first, |acc, conjunct| BoundExpr::Binary {
		op: BinaryOperator::And,
		left: Box::new(acc),
		right: Box::new(conjunct),
		ty: FieldType::Boolean,
	})
}

fn source_set(plan: &LogicalPlan) -> Vec<usize> {
	plan.output_schema().into_iter().filter_map(|column| column.source).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ast::parse::parse, bind::bind, plan::algebrize, token::tokenize};
	use docsql_catalog::Catalog;

	fn plan(sql: &str) -> LogicalPlan {
		let catalog = Catalog::build(
			r#"{"collections": [
				{"name": "t", "fields": [
					{"name": "a", "type": "int"},
					{"name": "b", "type": "int"}]},
				{"name": "u", "fields": [
					{"name": "t_id", "type": "int"},
					{"name": "c", "type": "int"}]}]}"#,
		)
		.unwrap();
		algebrize(bind(&parse(tokenize(sql).unwrap()).unwrap(), &catalog).unwrap()).unwrap()
	}

	#[test]
	fn test_single_side_conjuncts_move_below_join() {
		let mut changed = false;
		let optimized =
			apply(plan("SELECT t.a FROM t JOIN u ON t.a = u.t_id WHERE t.b = 1 AND u.c = 2"), &mut changed);
		assert!(changed);

		let LogicalPlan::Project(project) = optimized else {
			panic!("expected project at root");
		};
		let LogicalPlan::Join(join) = *project.input else {
			panic!("expected join directly below project");
		};
		assert!(matches!(*join.left, LogicalPlan::Filter(_)));
		assert!(matches!(*join.right, LogicalPlan::Filter(_)));
	}

	#[test]
	fn test_cross_side_conjunct_stays_above() {
		let mut changed = false;
		let optimized = apply(plan("SELECT t.a FROM t JOIN u ON t.a = u.t_id WHERE t.b = u.c"), &mut changed);
		assert!(!changed);

		let LogicalPlan::Project(project) = optimized else {
			panic!("expected project at root");
		};
		assert!(matches!(*project.input, LogicalPlan::Filter(_)));
	}

	#[test]
	fn test_left_join_is_not_pushed() {
		let mut changed = false;
		let optimized = apply(plan("SELECT t.a FROM t LEFT JOIN u ON t.a = u.t_id WHERE u.c = 2"), &mut changed);
		assert!(!changed);

		let LogicalPlan::Project(project) = optimized else {
			panic!("expected project at root");
		};
		assert!(matches!(*project.input, LogicalPlan::Filter(_)));
	}
}
