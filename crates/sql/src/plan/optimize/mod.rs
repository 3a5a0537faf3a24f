// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! Rule-based plan rewriting. Each rule is a standalone pass over the
//! tree; the driver runs them to a fixed point with a hard pass cap so
//! a misbehaving rule pair cannot loop forever. Every rule preserves
//! the root output schema.

pub mod filter;
pub mod fold;
pub mod project;
pub mod pushdown;

use tracing::debug;

use crate::plan::logical::LogicalPlan;

const MAX_PASSES: usize = 8;

pub fn optimize(plan: LogicalPlan) -> LogicalPlan {
	let mut plan = plan;
	for pass in 0..MAX_PASSES {
		let mut changed = false;
		plan = fold::apply(plan, &mut changed);
		plan = pushdown::apply(plan, &mut changed);
		plan = filter::apply(plan, &mut changed);
		plan = project::apply(plan, &mut changed);
		if !changed {
			debug!(passes = pass + 1, "optimizer reached fixed point");
			break;
		}
	}
	plan
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ast::parse::parse, bind::bind, plan::algebrize, token::tokenize};
	use docsql_catalog::Catalog;

	fn catalog() -> Catalog {
		Catalog::build(
			r#"{"collections": [
				{"name": "t", "fields": [
					{"name": "a", "type": "int"},
					{"name": "b", "type": "int"}]},
				{"name": "u", "fields": [
					{"name": "a", "type": "int"},
					{"name": "t_id", "type": "int"}]}]}"#,
		)
		.unwrap()
	}

	fn plan(sql: &str) -> LogicalPlan {
		let catalog = catalog();
		algebrize(bind(&parse(tokenize(sql).unwrap()).unwrap(), &catalog).unwrap()).unwrap()
	}

	#[test]
	fn test_optimize_preserves_root_schema() {
		for sql in [
			"SELECT a, b AS total FROM t",
			"SELECT a FROM t WHERE 1 = 1",
			"SELECT t.a FROM t JOIN u ON t.a = u.t_id WHERE t.b = 1 AND u.a = 2",
			"SELECT a, SUM(b) AS s FROM t GROUP BY a HAVING SUM(b) > 0",
		] {
			let before = plan(sql);
			let schema_before: Vec<_> =
				before.output_schema().into_iter().map(|c| (c.name, c.ty)).collect();
			let after = optimize(before);
			let schema_after: Vec<_> =
				after.output_schema().into_iter().map(|c| (c.name, c.ty)).collect();
			assert_eq!(schema_before, schema_after, "schema changed for `{}`", sql);
		}
	}

	#[test]
	fn test_optimize_is_idempotent() {
		for sql in [
			"SELECT a FROM t WHERE 1 = 1 AND b = 1",
			"SELECT t.a FROM t JOIN u ON t.a = u.t_id WHERE t.b = 1",
			"SELECT a FROM t WHERE b = 1 + 2 ORDER BY a LIMIT 3",
		] {
			let once = optimize(plan(sql));
			let twice = optimize(once.clone());
			assert_eq!(once, twice, "not idempotent for `{}`", sql);
		}
	}

	#[test]
	fn test_true_filter_disappears() {
		let optimized = optimize(plan("SELECT a FROM t WHERE 1 = 1"));
		let LogicalPlan::Project(project) = optimized else {
			panic!("expected project at root");
		};
		assert!(matches!(*project.input, LogicalPlan::Scan(_)));
	}
}
