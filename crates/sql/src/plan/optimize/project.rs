// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! Remove projections that forward their input unchanged.
//!
//! A projection is only redundant when its input already produces
//! exactly the projected fields: collection scans carry `_id` and any
//! undeclared fields, so a projection above them still narrows the
//! document and must stay. The root projection always stays, it defines
//! the query's output schema.

use crate::{
	bind::BoundExpr,
	plan::logical::{LogicalPlan, ProjectNode, ScanInput},
};

pub fn apply(plan: LogicalPlan, changed: &mut bool) -> LogicalPlan {
	// Children only; the root projection is exempt
	plan.map_inputs(&mut |child| eliminate(child, changed))
}

fn eliminate(plan: LogicalPlan, changed: &mut bool) -> LogicalPlan {
	let plan = plan.map_inputs(&mut |child| eliminate(child, changed));
	match plan {
		LogicalPlan::Project(project) if is_identity(&project) && has_exact_schema(&project.input) => {
			*changed = true;
			*project.input
		}
		other => other,
	}
}

fn is_identity(project: &ProjectNode) -> bool {
	let schema = project.input.output_schema();
	if schema.len() != project.columns.len() {
		return false;
	}
	project.columns.iter().zip(&schema).all(|((name, expr, _), column)| {
		matches!(expr, BoundExpr::FieldRef { source, path, .. }
			if Some(*source) == column.source && path.len() == 1 && path[0] == column.name && name == &column.name)
	})
}

/// Whether the operator's documents contain exactly its schema fields.
fn has_exact_schema(plan: &LogicalPlan) -> bool {
	match plan {
		LogicalPlan::Project(_) | LogicalPlan::GroupAggregate(_) => true,
		LogicalPlan::Scan(scan) => match &scan.input {
			ScanInput::Collection(_) => false,
			ScanInput::Derived(inner) => has_exact_schema(inner),
		},
		LogicalPlan::Filter(filter) => has_exact_schema(&filter.input),
		LogicalPlan::Distinct(distinct) => has_exact_schema(&distinct.input),
		LogicalPlan::Sort(sort) => has_exact_schema(&sort.input),
		LogicalPlan::Limit(limit) => has_exact_schema(&limit.input),
		LogicalPlan::Union(union) => has_exact_schema(&union.input) && has_exact_schema(&union.branch),
		// A lookup merges two documents; exactness is not tracked
		LogicalPlan::Join(_) => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use docsql_type::{FieldType, Fragment};
	use indexmap::IndexMap;

	use crate::plan::logical::ScanNode;

	fn scan(derived: bool) -> LogicalPlan {
		let mut fields = IndexMap::new();
		fields.insert("a".to_string(), FieldType::Int);
		let input = if derived {
			ScanInput::Derived(Box::new(LogicalPlan::Project(ProjectNode {
				input: Box::new(scan(false)),
				columns: vec![(
					"a".to_string(),
					BoundExpr::FieldRef {
						source: 0,
						path: vec!["a".to_string()],
						ty: FieldType::Int,
						fragment: Fragment::None,
					},
					FieldType::Int,
				)],
			})))
		} else {
			ScanInput::Collection("t".to_string())
		};
		LogicalPlan::Scan(ScanNode {
			alias: "t".to_string(),
			source: 0,
			input,
			fields,
		})
	}

	fn identity_project(input: LogicalPlan) -> LogicalPlan {
		LogicalPlan::Project(ProjectNode {
			input: Box::new(input),
			columns: vec![(
				"a".to_string(),
				BoundExpr::FieldRef {
					source: 0,
					path: vec!["a".to_string()],
					ty: FieldType::Int,
					fragment: Fragment::None,
				},
				FieldType::Int,
			)],
		})
	}

	#[test]
	fn test_root_projection_survives() {
		let root = identity_project(scan(true));
		let mut changed = false;
		let result = apply(root.clone(), &mut changed);
		assert!(!changed);
		assert_eq!(result, root);
	}

	#[test]
	fn test_nested_identity_over_derived_scan_is_removed() {
		// Root project over an identity project over an exact derived
		// scan; the middle one goes
		let root = identity_project(identity_project(scan(true)));
		let mut changed = false;
		let LogicalPlan::Project(project) = apply(root, &mut changed) else {
			panic!("expected project at root");
		};
		assert!(changed);
		assert!(matches!(*project.input, LogicalPlan::Scan(_)));
	}

	#[test]
	fn test_identity_over_collection_scan_stays() {
		// A collection scan still carries _id and undeclared fields
		let root = identity_project(identity_project(scan(false)));
		let mut changed = false;
		let LogicalPlan::Project(project) = apply(root, &mut changed) else {
			panic!("expected project at root");
		};
		assert!(!changed);
		assert!(matches!(*project.input, LogicalPlan::Project(_)));
	}
}
