// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! The aggregation pipeline output model. A [`Translation`] names the
//! collection the pipeline runs against and the ordered list of stages;
//! serializing it yields the exact JSON handed to the driver. Stage
//! bodies are built in emission order and serialized without reordering,
//! so equal inputs always produce byte-identical output.

pub(crate) mod expr;
mod lower;

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

pub use lower::lower;

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
	Match(Value),
	Project(Value),
	Group(Value),
	Sort(Value),
	Skip(i64),
	Limit(i64),
	Lookup(Value),
	Unwind(Value),
	UnionWith(Value),
}

impl Stage {
	pub const fn name(&self) -> &'static str {
		match self {
			Stage::Match(_) => "$match",
			Stage::Project(_) => "$project",
			Stage::Group(_) => "$group",
			Stage::Sort(_) => "$sort",
			Stage::Skip(_) => "$skip",
			Stage::Limit(_) => "$limit",
			Stage::Lookup(_) => "$lookup",
			Stage::Unwind(_) => "$unwind",
			Stage::UnionWith(_) => "$unionWith",
		}
	}

	pub fn body(&self) -> Value {
		match self {
			Stage::Match(body)
			| Stage::Project(body)
			| Stage::Group(body)
			| Stage::Sort(body)
			| Stage::Lookup(body)
			| Stage::Unwind(body)
			| Stage::UnionWith(body) => body.clone(),
			Stage::Skip(count) | Stage::Limit(count) => json!(count),
		}
	}

	pub fn to_value(&self) -> Value {
		let mut document = serde_json::Map::with_capacity(1);
		document.insert(self.name().to_string(), self.body());
		Value::Object(document)
	}
}

impl Serialize for Stage {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.to_value().serialize(serializer)
	}
}

/// The compiled form of one statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
	/// Collection the pipeline is run against.
	pub collection: String,
	pub pipeline: Vec<Stage>,
}

impl Translation {
	/// The pipeline as a JSON array, ready for the driver.
	pub fn pipeline_json(&self) -> String {
		Value::Array(self.pipeline.iter().map(Stage::to_value).collect()).to_string()
	}
}
