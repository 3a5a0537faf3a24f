// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! Public entry point of the compiler.
//!
//! [`compile`] takes one SQL statement and a JSON schema description and
//! returns the target collection plus the aggregation pipeline as JSON.
//! Callers that compile many statements against the same schema can
//! build the [`Catalog`] once and use [`compile_with_catalog`].
//!
//! ```
//! let schema = r#"{"collections": [{"name": "users", "fields": [
//!     {"name": "age", "type": "int"},
//!     {"name": "name", "type": "string"}]}]}"#;
//!
//! let compilation = docsql::compile("SELECT name FROM users WHERE age >= 18", schema).unwrap();
//! assert_eq!(compilation.collection, "users");
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};

use thiserror::Error;
use tracing::error;

pub use docsql_catalog::Catalog;
pub use docsql_type::ErrorKind;

/// A successfully compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
	/// Collection the pipeline must be run against.
	pub collection: String,
	/// The aggregation pipeline as a JSON array.
	pub pipeline: String,
}

/// A failed compilation. Carries the stable diagnostic code, the error
/// taxonomy kind, and the statement position when one is known.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct CompileError {
	pub kind: ErrorKind,
	/// Stable code such as `BIND_002`.
	pub code: String,
	pub message: String,
	pub help: Option<String>,
	/// 1-based line within the statement.
	pub line: Option<u32>,
	/// 1-based column within the line.
	pub column: Option<u32>,
}

impl From<docsql_type::Error> for CompileError {
	fn from(error: docsql_type::Error) -> Self {
		let diagnostic = error.diagnostic();
		Self {
			kind: diagnostic.kind,
			code: diagnostic.code.clone(),
			message: diagnostic.message.clone(),
			help: diagnostic.help.clone(),
			line: diagnostic.fragment.line(),
			column: diagnostic.fragment.column(),
		}
	}
}

/// Compile one SQL statement against a JSON schema description.
pub fn compile(sql: &str, schema: &str) -> Result<Compilation, CompileError> {
	let catalog = Catalog::build(schema).map_err(CompileError::from)?;
	compile_with_catalog(sql, &catalog)
}

/// Compile one SQL statement against an already built catalog.
///
/// Compiler panics are caught and surfaced as [`ErrorKind::Internal`]
/// errors; no input may crash the caller.
pub fn compile_with_catalog(sql: &str, catalog: &Catalog) -> Result<Compilation, CompileError> {
	let outcome = catch_unwind(AssertUnwindSafe(|| docsql_sql::compile(sql, catalog)));
	match outcome {
		Ok(Ok(translation)) => Ok(Compilation {
			pipeline: translation.pipeline_json(),
			collection: translation.collection,
		}),
		Ok(Err(compile_error)) => Err(compile_error.into()),
		Err(panic) => {
			let detail = panic
				.downcast_ref::<String>()
				.map(String::as_str)
				.or_else(|| panic.downcast_ref::<&str>().copied())
				.unwrap_or("unknown panic");
			error!(detail, "compiler panicked");
			Err(CompileError {
				kind: ErrorKind::Internal,
				code: "INTERNAL_001".to_string(),
				message: format!("compiler panicked: {}", detail),
				help: Some("this is a compiler bug - please report this issue".to_string()),
				line: None,
				column: None,
			})
		}
	}
}
