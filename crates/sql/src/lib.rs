// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! SQL frontend and pipeline backend of the compiler.
//!
//! A statement moves through fixed stages: [`token::tokenize`] produces
//! positioned tokens, [`ast::parse::parse`] builds the syntax tree,
//! [`bind::bind`] resolves it against the catalog, [`plan::algebrize`]
//! turns the bound query into a logical operator tree,
//! [`plan::optimize`] rewrites that tree, and [`pipeline::lower`] emits
//! the aggregation pipeline. [`compile`] runs them all.

pub mod ast;
pub mod bind;
pub mod pipeline;
pub mod plan;
pub mod token;

use docsql_catalog::Catalog;
use tracing::debug;

pub use crate::pipeline::Translation;

pub type Result<T> = docsql_type::Result<T>;

/// Compile one SQL statement into an aggregation pipeline.
pub fn compile(sql: &str, catalog: &Catalog) -> Result<Translation> {
	let tokens = token::tokenize(sql)?;
	debug!(tokens = tokens.len(), "tokenized statement");

	let query = ast::parse::parse(tokens)?;
	let bound = bind::bind(&query, catalog)?;
	debug!(columns = bound.select.columns.len(), "bound statement");

	let plan = plan::algebrize(bound)?;
	let plan = plan::optimize(plan);
	debug!("optimized logical plan");

	let translation = pipeline::lower(&plan)?;
	debug!(collection = %translation.collection, stages = translation.pipeline.len(), "lowered to pipeline");
	Ok(translation)
}
