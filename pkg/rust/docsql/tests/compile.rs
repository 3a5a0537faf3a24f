// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! End-to-end compilation tests against the public facade.

use docsql::{Catalog, ErrorKind, compile, compile_with_catalog};
use serde_json::{Value, json};

const SCHEMA: &str = r#"{"collections": [
	{"name": "t", "fields": [
		{"name": "a", "type": "int"},
		{"name": "b", "type": "int"},
		{"name": "name", "type": "string"}]},
	{"name": "u", "fields": [
		{"name": "t_id", "type": "int"},
		{"name": "c", "type": "int"}]}]}"#;

fn pipeline(sql: &str) -> (String, Value) {
	let compilation = compile(sql, SCHEMA).expect(sql);
	let stages = serde_json::from_str(&compilation.pipeline).expect("pipeline must be valid JSON");
	(compilation.collection, stages)
}

#[test]
fn test_filter_and_projection() {
	let (collection, stages) = pipeline("SELECT a FROM t WHERE b = 1");
	assert_eq!(collection, "t");
	assert_eq!(
		stages,
		json!([
			{"$match": {"$expr": {"$eq": ["$b", 1]}}},
			{"$project": {"_id": 0, "a": 1}},
		])
	);
}

#[test]
fn test_unknown_column_is_a_resolution_error() {
	let error = compile("SELECT a FROM t WHERE c = 1", SCHEMA).unwrap_err();
	assert_eq!(error.kind, ErrorKind::Resolution);
	assert_eq!(error.code, "BIND_002");
	assert_eq!(error.line, Some(1));
	assert_eq!(error.column, Some(23));
}

#[test]
fn test_group_by_with_aggregate() {
	let (_, stages) = pipeline("SELECT a, SUM(b) AS total FROM t GROUP BY a");
	assert_eq!(
		stages,
		json!([
			{"$group": {"_id": {"k0": "$a"}, "agg0": {"$sum": "$b"}}},
			{"$project": {"_id": 0, "k0": "$_id.k0", "agg0": 1}},
			{"$project": {"_id": 0, "a": "$k0", "total": "$agg0"}},
		])
	);
}

#[test]
fn test_missing_select_list_points_at_from() {
	let error = compile("SELECT FROM t", SCHEMA).unwrap_err();
	assert_eq!(error.kind, ErrorKind::Syntax);
	assert_eq!(error.code, "AST_009");
	assert_eq!(error.line, Some(1));
	assert_eq!(error.column, Some(8));
}

#[test]
fn test_window_function_fails_without_crashing() {
	let error = compile("SELECT ROW_NUMBER() OVER (PARTITION BY a) FROM t", SCHEMA).unwrap_err();
	assert_eq!(error.kind, ErrorKind::LoweringUnsupported);
	assert_eq!(error.code, "LOWER_002");
}

#[test]
fn test_right_join_is_lowering_unsupported() {
	let error = compile("SELECT t.a FROM t RIGHT JOIN u ON t.a = u.t_id", SCHEMA).unwrap_err();
	assert_eq!(error.kind, ErrorKind::LoweringUnsupported);
	assert_eq!(error.code, "LOWER_001");
}

#[test]
fn test_join_compiles_to_lookup() {
	let (collection, stages) = pipeline("SELECT t.a, u.c FROM t JOIN u ON t.a = u.t_id");
	assert_eq!(collection, "t");
	let Value::Array(stages) = stages else {
		panic!("expected stage array");
	};
	assert!(stages[0].get("$lookup").is_some());
	assert!(stages[1].get("$unwind").is_some());
}

#[test]
fn test_malformed_schema_is_a_schema_error() {
	let error = compile("SELECT a FROM t", "{not json").unwrap_err();
	assert_eq!(error.kind, ErrorKind::Schema);
	assert_eq!(error.code, "SCHEMA_001");
}

#[test]
fn test_unknown_collection() {
	let error = compile("SELECT a FROM missing", SCHEMA).unwrap_err();
	assert_eq!(error.kind, ErrorKind::Resolution);
	assert_eq!(error.code, "BIND_001");
}

#[test]
fn test_type_error_carries_position() {
	let error = compile("SELECT a FROM t WHERE name > 1", SCHEMA).unwrap_err();
	assert_eq!(error.kind, ErrorKind::Type);
	assert_eq!(error.code, "BIND_006");
	assert_eq!(error.line, Some(1));
}

#[test]
fn test_output_is_byte_identical_across_runs() {
	let sql = "SELECT t.a, u.c FROM t JOIN u ON t.a = u.t_id WHERE t.b > 0 ORDER BY a DESC LIMIT 5";
	let first = compile(sql, SCHEMA).unwrap();
	let second = compile(sql, SCHEMA).unwrap();
	assert_eq!(first.pipeline, second.pipeline);
}

#[test]
fn test_pipeline_is_never_empty() {
	for sql in ["SELECT a FROM t", "SELECT * FROM t", "SELECT a FROM t LIMIT 1"] {
		let (_, stages) = pipeline(sql);
		let Value::Array(stages) = stages else {
			panic!("expected stage array");
		};
		assert!(!stages.is_empty(), "empty pipeline for `{}`", sql);
	}
}

#[test]
fn test_catalog_reuse_across_statements() {
	let catalog = Catalog::build(SCHEMA).unwrap();
	assert!(compile_with_catalog("SELECT a FROM t", &catalog).is_ok());
	assert!(compile_with_catalog("SELECT c FROM u", &catalog).is_ok());
	assert_eq!(compile_with_catalog("SELECT x FROM t", &catalog).unwrap_err().code, "BIND_002");
}

#[test]
fn test_multiline_statement_positions() {
	let error = compile("SELECT a\nFROM t\nWHERE missing = 1", SCHEMA).unwrap_err();
	assert_eq!(error.line, Some(3));
	assert_eq!(error.column, Some(7));
}

#[test]
fn test_error_display_is_actionable() {
	let error = compile("SELECT a FROM t WHERE c = 1", SCHEMA).unwrap_err();
	let rendered = error.to_string();
	assert!(rendered.contains("resolution error"), "got `{}`", rendered);
	assert!(rendered.contains("`c`"), "got `{}`", rendered);
}
