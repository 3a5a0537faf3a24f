// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! The logical operator tree and the algebrizer that builds it from a
//! bound query.
//!
//! Operators nest in a fixed order per select block: scan and joins at
//! the bottom, then the WHERE filter, grouping, the HAVING filter, the
//! projection, dedup, and finally sort and limit on top of any union
//! chain. Every node can report its output schema; the root projection
//! defines the schema of the whole query and is never rewritten away.

use docsql_type::{FieldType, Fragment, internal_error};
use indexmap::IndexMap;

use crate::{
	ast::JoinType,
	bind::{BoundAggregate, BoundExpr, BoundFrom, BoundQuery, BoundSelect, BoundSortKey, BoundSource, BoundSourceInput},
};

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
	Scan(ScanNode),
	Filter(FilterNode),
	Project(ProjectNode),
	Join(JoinNode),
	GroupAggregate(GroupNode),
	Distinct(DistinctNode),
	Sort(SortNode),
	Limit(LimitNode),
	Union(UnionNode),
}

/// One output column of an operator. `source` is the select block's
/// source index for columns that still belong to a scanned source;
/// computed columns have none.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
	pub source: Option<usize>,
	pub name: String,
	pub ty: FieldType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanNode {
	pub alias: String,
	/// Source index within the enclosing select block.
	pub source: usize,
	pub input: ScanInput,
	pub fields: IndexMap<String, FieldType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanInput {
	Collection(String),
	Derived(Box<LogicalPlan>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
	pub input: Box<LogicalPlan>,
	pub predicate: BoundExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectNode {
	pub input: Box<LogicalPlan>,
	pub columns: Vec<(String, BoundExpr, FieldType)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinNode {
	pub left: Box<LogicalPlan>,
	pub right: Box<LogicalPlan>,
	pub join_type: JoinType,
	pub on: Option<BoundExpr>,
	pub fragment: Fragment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
	pub input: Box<LogicalPlan>,
	pub keys: Vec<BoundExpr>,
	pub aggregates: Vec<BoundAggregate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistinctNode {
	pub input: Box<LogicalPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortNode {
	pub input: Box<LogicalPlan>,
	pub keys: Vec<BoundSortKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimitNode {
	pub input: Box<LogicalPlan>,
	pub limit: i64,
	pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionNode {
	pub input: Box<LogicalPlan>,
	pub branch: Box<LogicalPlan>,
	pub all: bool,
	pub fragment: Fragment,
}

impl LogicalPlan {
	pub fn output_schema(&self) -> Vec<Column> {
		match self {
			LogicalPlan::Scan(scan) => scan
				.fields
				.iter()
				.map(|(name, ty)| Column {
					source: Some(scan.source),
					name: name.clone(),
					ty: ty.clone(),
				})
				.collect(),
			LogicalPlan::Filter(filter) => filter.input.output_schema(),
			LogicalPlan::Project(project) => project
				.columns
				.iter()
				.map(|(name, _, ty)| Column {
					source: None,
					name: name.clone(),
					ty: ty.clone(),
				})
				.collect(),
			LogicalPlan::Join(join) => {
				let mut schema = join.left.output_schema();
				schema.extend(join.right.output_schema());
				schema
			}
			LogicalPlan::GroupAggregate(group) => {
				let mut schema: Vec<Column> = group
					.keys
					.iter()
					.enumerate()
					.map(|(index, key)| Column {
						source: None,
						name: format!("k{}", index),
						ty: key.ty(),
					})
					.collect();
				schema.extend(group.aggregates.iter().enumerate().map(|(index, aggregate)| Column {
					source: None,
					name: format!("agg{}", index),
					ty: aggregate.ty.clone(),
				}));
				schema
			}
			LogicalPlan::Distinct(distinct) => distinct.input.output_schema(),
			LogicalPlan::Sort(sort) => sort.input.output_schema(),
			LogicalPlan::Limit(limit) => limit.input.output_schema(),
			LogicalPlan::Union(union) => union.input.output_schema(),
		}
	}

	/// Apply `f` to every direct input of this node.
	pub fn map_inputs(self, f: &mut impl FnMut(LogicalPlan) -> LogicalPlan) -> LogicalPlan {
		match self {
			LogicalPlan::Scan(scan) => LogicalPlan::Scan(ScanNode {
				input: match scan.input {
					ScanInput::Collection(name) => ScanInput::Collection(name),
					ScanInput::Derived(plan) => ScanInput::Derived(Box::new(f(*plan))),
				},
				..scan
			}),
			LogicalPlan::Filter(filter) => LogicalPlan::Filter(FilterNode {
				input: Box::new(f(*filter.input)),
				..filter
			}),
			LogicalPlan::Project(project) => LogicalPlan::Project(ProjectNode {
				input: Box::new(f(*project.input)),
				..project
			}),
			LogicalPlan::Join(join) => LogicalPlan::Join(JoinNode {
				left: Box::new(f(*join.left)),
				right: Box::new(f(*join.right)),
				..join
			}),
			LogicalPlan::GroupAggregate(group) => LogicalPlan::GroupAggregate(GroupNode {
				input: Box::new(f(*group.input)),
				..group
			}),
			LogicalPlan::Distinct(distinct) => LogicalPlan::Distinct(DistinctNode {
				input: Box::new(f(*distinct.input)),
			}),
			LogicalPlan::Sort(sort) => LogicalPlan::Sort(SortNode {
				input: Box::new(f(*sort.input)),
				..sort
			}),
			LogicalPlan::Limit(limit) => LogicalPlan::Limit(LimitNode {
				input: Box::new(f(*limit.input)),
				..limit
			}),
			LogicalPlan::Union(union) => LogicalPlan::Union(UnionNode {
				input: Box::new(f(*union.input)),
				branch: Box::new(f(*union.branch)),
				..union
			}),
		}
	}

	/// Whether this subtree contains a union, including inside derived
	/// scans. Joins cannot take such inputs.
	pub fn contains_union(&self) -> bool {
		match self {
			LogicalPlan::Union(_) => true,
			LogicalPlan::Scan(scan) => match &scan.input {
				ScanInput::Collection(_) => false,
				ScanInput::Derived(plan) => plan.contains_union(),
			},
			LogicalPlan::Filter(filter) => filter.input.contains_union(),
			LogicalPlan::Project(project) => project.input.contains_union(),
			LogicalPlan::Join(join) => join.left.contains_union() || join.right.contains_union(),
			LogicalPlan::GroupAggregate(group) => group.input.contains_union(),
			LogicalPlan::Distinct(distinct) => distinct.input.contains_union(),
			LogicalPlan::Sort(sort) => sort.input.contains_union(),
			LogicalPlan::Limit(limit) => limit.input.contains_union(),
		}
	}
}

/// Turn a bound query into a logical operator tree.
pub fn algebrize(query: BoundQuery) -> crate::Result<LogicalPlan> {
	let mut plan = algebrize_select(query.select)?;

	for branch in query.unions {
		let all = branch.all;
		let fragment = branch.fragment;
		let branch_plan = algebrize_select(branch.select)?;
		plan = LogicalPlan::Union(UnionNode {
			input: Box::new(plan),
			branch: Box::new(branch_plan),
			all,
			fragment,
		});
		if !all {
			plan = LogicalPlan::Distinct(DistinctNode {
				input: Box::new(plan),
			});
		}
	}

	if !query.order_by.is_empty() {
		plan = LogicalPlan::Sort(SortNode {
			input: Box::new(plan),
			keys: query.order_by,
		});
	}
	if let Some(limit) = query.limit {
		plan = LogicalPlan::Limit(LimitNode {
			input: Box::new(plan),
			limit: limit.limit,
			offset: limit.offset,
		});
	}
	Ok(plan)
}

fn algebrize_select(select: BoundSelect) -> crate::Result<LogicalPlan> {
	let BoundSelect {
		sources,
		from,
		filter,
		group_by,
		aggregates,
		having,
		distinct,
		columns,
	} = select;

	let mut sources: Vec<Option<BoundSource>> = sources.into_iter().map(Some).collect();
	let mut plan = algebrize_from(from, &mut sources)?;

	if let Some(predicate) = filter {
		check_references(&predicate, &plan, "WHERE predicate")?;
		plan = LogicalPlan::Filter(FilterNode {
			input: Box::new(plan),
			predicate,
		});
	}

	if !group_by.is_empty() || !aggregates.is_empty() || having.is_some() {
		for key in &group_by {
			check_references(key, &plan, "grouping key")?;
		}
		plan = LogicalPlan::GroupAggregate(GroupNode {
			input: Box::new(plan),
			keys: group_by,
			aggregates,
		});
		if let Some(predicate) = having {
			plan = LogicalPlan::Filter(FilterNode {
				input: Box::new(plan),
				predicate,
			});
		}
	}

	for column in &columns {
		check_references(&column.expr, &plan, "output column")?;
	}
	plan = LogicalPlan::Project(ProjectNode {
		input: Box::new(plan),
		columns: columns.into_iter().map(|c| (c.name, c.expr, c.ty)).collect(),
	});

	if distinct {
		plan = LogicalPlan::Distinct(DistinctNode {
			input: Box::new(plan),
		});
	}
	Ok(plan)
}

fn algebrize_from(from: BoundFrom, sources: &mut Vec<Option<BoundSource>>) -> crate::Result<LogicalPlan> {
	match from {
		BoundFrom::Source(index) => {
			let Some(source) = sources.get_mut(index).and_then(Option::take) else {
				return Err(internal_error!("source {} missing or used twice in FROM", index));
			};
			let input = match source.input {
				BoundSourceInput::Collection(name) => ScanInput::Collection(name),
				BoundSourceInput::Derived(query) => ScanInput::Derived(Box::new(algebrize(*query)?)),
			};
			Ok(LogicalPlan::Scan(ScanNode {
				alias: source.alias,
				source: index,
				input,
				fields: source.fields,
			}))
		}
		BoundFrom::Join {
			left,
			right,
			join_type,
			on,
			fragment,
		} => {
			let left = algebrize_from(*left, sources)?;
			let right = algebrize_from(*right, sources)?;
			Ok(LogicalPlan::Join(JoinNode {
				left: Box::new(left),
				right: Box::new(right),
				join_type,
				on,
				fragment,
			}))
		}
	}
}

/// Every field reference of an operator's expression must be a source
/// the input subtree provides. Violations are compiler bugs.
fn check_references(expr: &BoundExpr, input: &LogicalPlan, context: &str) -> crate::Result<()> {
	let schema = input.output_schema();
	let mut missing = None;
	visit_field_refs(expr, &mut |source, path| {
		if missing.is_none() && !schema.iter().any(|column| column.source == Some(source)) {
			missing = Some((source, path.join(".")));
		}
	});
	if let Some((source, path)) = missing {
		return Err(internal_error!("{} references source {} (`{}`) absent from its input", context, source, path));
	}
	Ok(())
}

/// Walk every `FieldRef` in an expression tree.
pub fn visit_field_refs(expr: &BoundExpr, f: &mut impl FnMut(usize, &[String])) {
	match expr {
		BoundExpr::FieldRef {
			source,
			path,
			..
		} => f(*source, path),
		BoundExpr::Literal(_)
		| BoundExpr::GroupKeyRef {
			..
		}
		| BoundExpr::AggregateRef {
			..
		}
		| BoundExpr::Window {
			..
		} => {}
		BoundExpr::Unary {
			expr,
			..
		} => visit_field_refs(expr, f),
		BoundExpr::Binary {
			left,
			right,
			..
		} => {
			visit_field_refs(left, f);
			visit_field_refs(right, f);
		}
		BoundExpr::Between {
			expr,
			low,
			high,
			..
		} => {
			visit_field_refs(expr, f);
			visit_field_refs(low, f);
			visit_field_refs(high, f);
		}
		BoundExpr::InList {
			expr,
			list,
			..
		} => {
			visit_field_refs(expr, f);
			for element in list {
				visit_field_refs(element, f);
			}
		}
		BoundExpr::Like {
			expr,
			pattern,
			..
		} => {
			visit_field_refs(expr, f);
			visit_field_refs(pattern, f);
		}
		BoundExpr::IsNull {
			expr,
			..
		} => visit_field_refs(expr, f),
		BoundExpr::Call {
			args,
			..
		} => {
			for arg in args {
				visit_field_refs(arg, f);
			}
		}
		BoundExpr::Case {
			operand,
			branches,
			else_expr,
			..
		} => {
			if let Some(operand) = operand {
				visit_field_refs(operand, f);
			}
			for (guard, result) in branches {
				visit_field_refs(guard, f);
				visit_field_refs(result, f);
			}
			if let Some(else_expr) = else_expr {
				visit_field_refs(else_expr, f);
			}
		}
		BoundExpr::Cast {
			expr,
			..
		} => visit_field_refs(expr, f),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ast::parse::parse, bind::bind, token::tokenize};
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
	fn test_project_over_filter_over_scan() {
		let LogicalPlan::Project(project) = plan("SELECT a FROM t WHERE b = 1") else {
			panic!("expected project at root");
		};
		let LogicalPlan::Filter(filter) = *project.input else {
			panic!("expected filter below project");
		};
		assert!(matches!(*filter.input, LogicalPlan::Scan(_)));
	}

	#[test]
	fn test_root_schema_names() {
		let plan = plan("SELECT a, b AS total FROM t");
		let names: Vec<String> = plan.output_schema().into_iter().map(|c| c.name).collect();
		assert_eq!(names, ["a", "total"]);
	}

	#[test]
	fn test_group_sits_between_filters() {
		let LogicalPlan::Project(project) = plan("SELECT a FROM t WHERE b = 1 GROUP BY a HAVING COUNT(*) > 1")
		else {
			panic!("expected project at root");
		};
		let LogicalPlan::Filter(having) = *project.input else {
			panic!("expected having filter");
		};
		let LogicalPlan::GroupAggregate(group) = *having.input else {
			panic!("expected group below having");
		};
		assert!(matches!(*group.input, LogicalPlan::Filter(_)));
	}

	#[test]
	fn test_union_wraps_in_distinct() {
		let root = plan("SELECT a FROM t UNION SELECT a FROM u");
		assert!(matches!(root, LogicalPlan::Distinct(_)));

		let root = plan("SELECT a FROM t UNION ALL SELECT a FROM u");
		assert!(matches!(root, LogicalPlan::Union(_)));
	}

	#[test]
	fn test_sort_and_limit_above_project() {
		let LogicalPlan::Limit(limit) = plan("SELECT a FROM t ORDER BY a LIMIT 10 OFFSET 5") else {
			panic!("expected limit at root");
		};
		assert_eq!(limit.limit, 10);
		assert_eq!(limit.offset, Some(5));
		let LogicalPlan::Sort(sort) = *limit.input else {
			panic!("expected sort below limit");
		};
		assert_eq!(sort.keys[0].column, 0);
	}

	#[test]
	fn test_join_schema_concatenates() {
		let LogicalPlan::Project(project) = plan("SELECT t.a FROM t JOIN u ON t.a = u.t_id") else {
			panic!("expected project at root");
		};
		let schema = project.input.output_schema();
		let names: Vec<String> = schema.iter().map(|c| c.name.clone()).collect();
		assert_eq!(names, ["a", "b", "a", "t_id"]);
		assert_eq!(schema[0].source, Some(0));
		assert_eq!(schema[3].source, Some(1));
	}

	#[test]
	fn test_distinct_above_project() {
		let root = plan("SELECT DISTINCT a FROM t");
		let LogicalPlan::Distinct(distinct) = root else {
			panic!("expected distinct at root");
		};
		assert!(matches!(*distinct.input, LogicalPlan::Project(_)));
	}

	#[test]
	fn test_derived_scan_nests_plan() {
		let LogicalPlan::Project(project) = plan("SELECT x.a FROM (SELECT a FROM t) AS x") else {
			panic!("expected project at root");
		};
		let LogicalPlan::Scan(scan) = *project.input else {
			panic!("expected scan below project");
		};
		assert!(matches!(scan.input, ScanInput::Derived(_)));
	}

	#[test]
	fn test_contains_union_sees_through_derived() {
		let root = plan("SELECT x.a FROM (SELECT a FROM t UNION ALL SELECT a FROM u) AS x");
		assert!(root.contains_union());
	}
}
