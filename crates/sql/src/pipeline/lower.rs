// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! Lowering of the logical plan into pipeline stages.
//!
//! Each operator appends stages to the pipeline of its input and hands
//! the next operator an [`ExprContext`] describing where the sources'
//! fields now live. Joins become `$lookup` with a correlated
//! sub-pipeline plus `$unwind`; grouping becomes `$group` with
//! positional key and aggregate names plus a flattening `$project`.

use docsql_type::{Value as SqlValue, err, error::diagnostic::lower as diagnostic, internal_error};
use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use crate::{
	ast::JoinType,
	bind::BoundExpr,
	pipeline::{
		Stage, Translation,
		expr::{ExprContext, FieldAccess, lower_aggregate, lower_expr},
	},
	plan::logical::{
		DistinctNode, GroupNode, JoinNode, LimitNode, LogicalPlan, ProjectNode, ScanInput, ScanNode, SortNode,
		UnionNode, visit_field_refs,
	},
};

/// Emit the pipeline for an optimized plan.
pub fn lower(plan: &LogicalPlan) -> crate::Result<Translation> {
	let lowered = lower_plan(plan)?;
	Ok(Translation {
		collection: lowered.collection,
		pipeline: lowered.stages,
	})
}

struct Lowered {
	collection: String,
	stages: Vec<Stage>,
	context: ExprContext,
}

fn lower_plan(plan: &LogicalPlan) -> crate::Result<Lowered> {
	match plan {
		LogicalPlan::Scan(scan) => lower_scan(scan),
		LogicalPlan::Filter(filter) => {
			let mut input = lower_plan(&filter.input)?;
			let predicate = lower_expr(&filter.predicate, &input.context)?;
			input.stages.push(Stage::Match(json!({"$expr": predicate})));
			Ok(input)
		}
		LogicalPlan::Project(project) => lower_project(project),
		LogicalPlan::Join(join) => lower_join(join),
		LogicalPlan::GroupAggregate(group) => lower_group(group),
		LogicalPlan::Distinct(distinct) => lower_distinct(distinct),
		LogicalPlan::Sort(sort) => lower_sort(sort),
		LogicalPlan::Limit(limit) => lower_limit(limit),
		LogicalPlan::Union(union) => lower_union(union),
	}
}

fn lower_scan(scan: &ScanNode) -> crate::Result<Lowered> {
	match &scan.input {
		ScanInput::Collection(name) => Ok(Lowered {
			collection: name.clone(),
			stages: Vec::new(),
			context: ExprContext::root(scan.source),
		}),
		ScanInput::Derived(inner) => {
			let translation = lower(inner)?;
			Ok(Lowered {
				collection: translation.collection,
				stages: translation.pipeline,
				context: ExprContext::root(scan.source),
			})
		}
	}
}

fn lower_project(project: &ProjectNode) -> crate::Result<Lowered> {
	let mut input = lower_plan(&project.input)?;

	let mut document = Map::new();
	document.insert("_id".to_string(), json!(0));
	for (name, expr, _) in &project.columns {
		let value = match expr {
			// A field projected under its own name is a plain inclusion
			BoundExpr::FieldRef {
				source,
				path,
				..
			} if input.context.field_path(*source, path).as_deref() == Some(format!("${}", name).as_str()) => {
				json!(1)
			}
			// Bare constants would toggle inclusion instead of assigning
			BoundExpr::Literal(value) => json!({"$literal": raw_literal(value)}),
			expr => lower_expr(expr, &input.context)?,
		};
		document.insert(name.clone(), value);
	}
	input.stages.push(Stage::Project(Value::Object(document)));
	input.context = ExprContext::empty();
	Ok(input)
}

fn raw_literal(value: &SqlValue) -> Value {
	match value {
		SqlValue::Null => Value::Null,
		SqlValue::Boolean(v) => json!(v),
		SqlValue::Int(v) => json!(v),
		SqlValue::Float(v) => json!(v),
		SqlValue::Utf8(v) => json!(v),
	}
}

fn lower_group(group: &GroupNode) -> crate::Result<Lowered> {
	let mut input = lower_plan(&group.input)?;

	let id = if group.keys.is_empty() {
		// Global aggregate, one output document
		Value::Null
	} else {
		let mut id = Map::new();
		for (index, key) in group.keys.iter().enumerate() {
			id.insert(format!("k{}", index), lower_expr(key, &input.context)?);
		}
		Value::Object(id)
	};
	let mut body = Map::new();
	body.insert("_id".to_string(), id);
	for (index, aggregate) in group.aggregates.iter().enumerate() {
		body.insert(format!("agg{}", index), lower_aggregate(aggregate, &input.context)?);
	}
	input.stages.push(Stage::Group(Value::Object(body)));

	// Flatten the keys back to the root so later stages address them
	// uniformly
	let mut flatten = Map::new();
	flatten.insert("_id".to_string(), json!(0));
	for index in 0..group.keys.len() {
		flatten.insert(format!("k{}", index), json!(format!("$_id.k{}", index)));
	}
	for index in 0..group.aggregates.len() {
		flatten.insert(format!("agg{}", index), json!(1));
	}
	input.stages.push(Stage::Project(Value::Object(flatten)));
	input.context = ExprContext::empty();
	Ok(input)
}

fn lower_distinct(distinct: &DistinctNode) -> crate::Result<Lowered> {
	let schema = distinct.input.output_schema();
	let mut input = lower_plan(&distinct.input)?;

	let mut id = Map::new();
	for column in &schema {
		id.insert(column.name.clone(), json!(format!("${}", column.name)));
	}
	let mut body = Map::new();
	body.insert("_id".to_string(), Value::Object(id));
	input.stages.push(Stage::Group(Value::Object(body)));

	let mut restore = Map::new();
	restore.insert("_id".to_string(), json!(0));
	for column in &schema {
		restore.insert(column.name.clone(), json!(format!("$_id.{}", column.name)));
	}
	input.stages.push(Stage::Project(Value::Object(restore)));
	input.context = ExprContext::empty();
	Ok(input)
}

fn lower_sort(sort: &SortNode) -> crate::Result<Lowered> {
	let schema = sort.input.output_schema();
	let mut input = lower_plan(&sort.input)?;

	let mut document = Map::new();
	for key in &sort.keys {
		let Some(column) = schema.get(key.column) else {
			return Err(internal_error!("sort key {} exceeds the input schema", key.column));
		};
		document.insert(column.name.clone(), json!(if key.descending { -1 } else { 1 }));
	}
	input.stages.push(Stage::Sort(Value::Object(document)));
	Ok(input)
}

fn lower_limit(limit: &LimitNode) -> crate::Result<Lowered> {
	let mut input = lower_plan(&limit.input)?;
	if let Some(offset) = limit.offset {
		input.stages.push(Stage::Skip(offset));
	}
	input.stages.push(Stage::Limit(limit.limit));
	Ok(input)
}

fn lower_union(union: &UnionNode) -> crate::Result<Lowered> {
	let mut input = lower_plan(&union.input)?;
	let branch = lower(&union.branch)?;

	let mut body = Map::new();
	body.insert("coll".to_string(), json!(branch.collection));
	body.insert("pipeline".to_string(), Value::Array(branch.pipeline.iter().map(Stage::to_value).collect()));
	input.stages.push(Stage::UnionWith(Value::Object(body)));
	input.context = ExprContext::empty();
	Ok(input)
}

fn lower_join(join: &JoinNode) -> crate::Result<Lowered> {
	if matches!(join.join_type, JoinType::Right | JoinType::Full) {
		return err!(diagnostic::unsupported_join(join.join_type.as_str(), join.fragment.clone()));
	}
	if join.left.contains_union() || join.right.contains_union() {
		return err!(diagnostic::unsupported_union_position(join.fragment.clone()));
	}
	let Some(alias) = join_target_alias(&join.right) else {
		return err!(diagnostic::unsupported_construct(
			"a nested join on the right-hand side of a join",
			join.fragment.clone(),
		));
	};
	let alias = alias.to_string();

	let left = lower_plan(&join.left)?;
	let right = lower_plan(&join.right)?;
	let mut right_stages = right.stages;

	let mut let_bindings = Map::new();
	if let Some(on) = &join.on {
		// Left-hand fields the condition needs become lookup variables
		let mut references: Vec<(usize, Vec<String>)> = Vec::new();
		visit_field_refs(on, &mut |source, path| {
			if left.context.contains(source) {
				references.push((source, path.to_vec()));
			}
		});
		let mut captured: IndexMap<(usize, Vec<String>), String> = IndexMap::new();
		for (source, path) in references {
			if captured.contains_key(&(source, path.clone())) {
				continue;
			}
			let Some(field) = left.context.field_path(source, &path) else {
				return Err(internal_error!("join input field is not prefix-addressed"));
			};
			let variable = format!("l{}", captured.len());
			let_bindings.insert(variable.clone(), json!(field));
			captured.insert((source, path), format!("$${}", variable));
		}

		let mut on_context = ExprContext::empty();
		for (source, _) in left.context.sources() {
			let variables: IndexMap<Vec<String>, String> = captured
				.iter()
				.filter(|((captured_source, _), _)| *captured_source == source)
				.map(|((_, path), variable)| (path.clone(), variable.clone()))
				.collect();
			on_context.set(source, FieldAccess::Variables(variables));
		}
		for (source, access) in right.context.sources() {
			on_context.set(source, access.clone());
		}
		let predicate = lower_expr(on, &on_context)?;
		right_stages.push(Stage::Match(json!({"$expr": predicate})));
	}

	let mut lookup = Map::new();
	lookup.insert("from".to_string(), json!(right.collection));
	if !let_bindings.is_empty() {
		lookup.insert("let".to_string(), Value::Object(let_bindings));
	}
	lookup.insert("pipeline".to_string(), Value::Array(right_stages.iter().map(Stage::to_value).collect()));
	lookup.insert("as".to_string(), json!(alias));

	let mut stages = left.stages;
	stages.push(Stage::Lookup(Value::Object(lookup)));
	let unwind = if join.join_type == JoinType::Left {
		json!({"path": format!("${}", alias), "preserveNullAndEmptyArrays": true})
	} else {
		json!({"path": format!("${}", alias)})
	};
	stages.push(Stage::Unwind(unwind));

	// The unwound documents carry the right source under the alias field
	let mut context = left.context;
	for (source, access) in right.context.sources() {
		let FieldAccess::Prefix(prefix) = access else {
			return Err(internal_error!("join input field is not prefix-addressed"));
		};
		context.set(source, FieldAccess::Prefix(format!("{}.{}", alias, prefix)));
	}

	Ok(Lowered {
		collection: left.collection,
		stages,
		context,
	})
}

/// The field the lookup result unwinds into; the right-hand side must
/// bottom out in a single scan.
fn join_target_alias(plan: &LogicalPlan) -> Option<&str> {
	match plan {
		LogicalPlan::Scan(scan) => Some(&scan.alias),
		LogicalPlan::Filter(filter) => join_target_alias(&filter.input),
		_ => None,
	}
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
					{"name": "b", "type": "int"},
					{"name": "name", "type": "string"}]},
				{"name": "u", "fields": [
					{"name": "t_id", "type": "int"},
					{"name": "c", "type": "int"}]}]}"#,
		)
		.unwrap()
	}

	fn translate(sql: &str) -> crate::Result<Translation> {
		let catalog = catalog();
		let plan = algebrize(bind(&parse(tokenize(sql)?)?, &catalog)?)?;
		lower(&plan)
	}

	fn stage_values(translation: &Translation) -> Vec<Value> {
		translation.pipeline.iter().map(Stage::to_value).collect()
	}

	#[test]
	fn test_filter_and_projection() {
		let translation = translate("SELECT a FROM t WHERE b = 1").unwrap();
		assert_eq!(translation.collection, "t");
		assert_eq!(
			stage_values(&translation),
			vec![
				json!({"$match": {"$expr": {"$eq": ["$b", 1]}}}),
				json!({"$project": {"_id": 0, "a": 1}}),
			]
		);
	}

	#[test]
	fn test_group_by_with_sum() {
		let translation = translate("SELECT a, SUM(b) AS s FROM t GROUP BY a").unwrap();
		assert_eq!(
			stage_values(&translation),
			vec![
				json!({"$group": {"_id": {"k0": "$a"}, "agg0": {"$sum": "$b"}}}),
				json!({"$project": {"_id": 0, "k0": "$_id.k0", "agg0": 1}}),
				json!({"$project": {"_id": 0, "a": "$k0", "s": "$agg0"}}),
			]
		);
	}

	#[test]
	fn test_global_aggregate_groups_on_null() {
		let translation = translate("SELECT COUNT(*) AS n FROM t").unwrap();
		assert_eq!(
			stage_values(&translation)[0],
			json!({"$group": {"_id": null, "agg0": {"$sum": 1}}})
		);
	}

	#[test]
	fn test_inner_join_becomes_lookup_and_unwind() {
		let translation = translate("SELECT t.a, u.c FROM t JOIN u ON t.a = u.t_id").unwrap();
		assert_eq!(translation.collection, "t");
		assert_eq!(
			stage_values(&translation),
			vec![
				json!({"$lookup": {
					"from": "u",
					"let": {"l0": "$a"},
					"pipeline": [{"$match": {"$expr": {"$eq": ["$$l0", "$t_id"]}}}],
					"as": "u"
				}}),
				json!({"$unwind": {"path": "$u"}}),
				json!({"$project": {"_id": 0, "a": 1, "c": "$u.c"}}),
			]
		);
	}

	#[test]
	fn test_left_join_preserves_unmatched() {
		let translation = translate("SELECT t.a FROM t LEFT JOIN u ON t.a = u.t_id").unwrap();
		assert_eq!(
			stage_values(&translation)[1],
			json!({"$unwind": {"path": "$u", "preserveNullAndEmptyArrays": true}})
		);
	}

	#[test]
	fn test_right_and_full_joins_are_rejected() {
		let err = translate("SELECT t.a FROM t RIGHT JOIN u ON t.a = u.t_id").unwrap_err();
		assert_eq!(err.diagnostic().code, "LOWER_001");
		assert_eq!(err.diagnostic().kind, docsql_type::ErrorKind::LoweringUnsupported);

		let err = translate("SELECT t.a FROM t FULL OUTER JOIN u ON t.a = u.t_id").unwrap_err();
		assert_eq!(err.diagnostic().code, "LOWER_001");
	}

	#[test]
	fn test_window_function_fails_cleanly() {
		let err = translate("SELECT ROW_NUMBER() OVER (PARTITION BY a) FROM t").unwrap_err();
		assert_eq!(err.diagnostic().code, "LOWER_002");
	}

	#[test]
	fn test_union_all_becomes_union_with() {
		let translation = translate("SELECT a FROM t UNION ALL SELECT t_id AS a FROM u").unwrap();
		assert_eq!(
			stage_values(&translation),
			vec![
				json!({"$project": {"_id": 0, "a": 1}}),
				json!({"$unionWith": {
					"coll": "u",
					"pipeline": [{"$project": {"_id": 0, "a": "$t_id"}}]
				}}),
			]
		);
	}

	#[test]
	fn test_union_as_join_input_is_rejected() {
		let err = translate(
			"SELECT x.a FROM (SELECT a FROM t UNION ALL SELECT t_id AS a FROM u) AS x JOIN u ON x.a = u.t_id",
		)
		.unwrap_err();
		assert_eq!(err.diagnostic().code, "LOWER_003");
	}

	#[test]
	fn test_sort_skip_limit_order() {
		let translation = translate("SELECT a FROM t ORDER BY a DESC LIMIT 10 OFFSET 5").unwrap();
		let stages = stage_values(&translation);
		let tail = &stages[stages.len() - 3..];
		assert_eq!(tail[0], json!({"$sort": {"a": -1}}));
		assert_eq!(tail[1], json!({"$skip": 5}));
		assert_eq!(tail[2], json!({"$limit": 10}));
	}

	#[test]
	fn test_distinct_dedupes_and_restores_names() {
		let translation = translate("SELECT DISTINCT a, b FROM t").unwrap();
		let stages = stage_values(&translation);
		assert_eq!(stages[1], json!({"$group": {"_id": {"a": "$a", "b": "$b"}}}));
		assert_eq!(stages[2], json!({"$project": {"_id": 0, "a": "$_id.a", "b": "$_id.b"}}));
	}

	#[test]
	fn test_derived_table_inlines_sub_pipeline() {
		let translation = translate("SELECT x.a FROM (SELECT a FROM t WHERE b = 1) AS x").unwrap();
		assert_eq!(translation.collection, "t");
		assert_eq!(stage_values(&translation)[0], json!({"$match": {"$expr": {"$eq": ["$b", 1]}}}));
	}

	#[test]
	fn test_output_is_deterministic() {
		let sql = "SELECT t.a, u.c FROM t JOIN u ON t.a = u.t_id WHERE t.b = 1 ORDER BY a LIMIT 2";
		let first = translate(sql).unwrap().pipeline_json();
		let second = translate(sql).unwrap().pipeline_json();
		assert_eq!(first, second);
	}

	#[test]
	fn test_literal_column_is_escaped() {
		let translation = translate("SELECT 1 AS one, a FROM t").unwrap();
		let last = stage_values(&translation).pop().unwrap();
		assert_eq!(last, json!({"$project": {"_id": 0, "one": {"$literal": 1}, "a": 1}}));
	}
}
