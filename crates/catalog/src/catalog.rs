// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use docsql_type::{FieldType, error::diagnostic::schema, return_error};
use indexmap::IndexMap;

use crate::schema::{SchemaDescription, resolve_fields};

/// All collections visible to one compilation, resolved and validated.
/// Built once, then read-only.
#[derive(Debug, Clone)]
pub struct Catalog {
	collections: IndexMap<String, Collection>,
}

#[derive(Debug, Clone)]
pub struct Collection {
	name: String,
	fields: IndexMap<String, FieldType>,
}

impl Catalog {
	/// Build a catalog from the JSON schema description.
	pub fn build(description: &str) -> crate::Result<Self> {
		let description: SchemaDescription = serde_json::from_str(description)
			.map_err(|error| docsql_type::Error(schema::invalid_description(error.to_string())))?;
		Self::from_description(description)
	}

	pub fn from_description(description: SchemaDescription) -> crate::Result<Self> {
		let mut collections = IndexMap::with_capacity(description.collections.len());
		for collection in description.collections {
			if collection.name.is_empty() {
				return_error!(schema::empty_collection_name());
			}
			let fields = resolve_fields(&collection.name, &collection.fields)?;
			let name = collection.name.clone();
			if collections.insert(name, Collection { name: collection.name.clone(), fields }).is_some() {
				return_error!(schema::duplicate_collection(&collection.name));
			}
		}
		Ok(Self { collections })
	}

	/// Collection lookup is exact and case-sensitive.
	pub fn collection(&self, name: &str) -> Option<&Collection> {
		self.collections.get(name)
	}

	pub fn collections(&self) -> impl Iterator<Item = &Collection> {
		self.collections.values()
	}
}

impl Collection {
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Top-level fields in declaration order.
	pub fn fields(&self) -> &IndexMap<String, FieldType> {
		&self.fields
	}

	pub fn field(&self, name: &str) -> Option<&FieldType> {
		self.fields.get(name)
	}

	/// Resolve a dotted path against the declared fields; see
	/// [`lookup_path`].
	pub fn lookup_field(&self, path: &[&str]) -> Option<FieldType> {
		lookup_path(&self.fields, path)
	}
}

/// Resolve a dotted path against a field map using document-database
/// path semantics: each segment descends into a document, through an
/// array of documents, and everything under an `any` field is `any`.
pub fn lookup_path(fields: &IndexMap<String, FieldType>, path: &[&str]) -> Option<FieldType> {
	let (first, rest) = path.split_first()?;
	let mut current = fields.get(*first)?.clone();
	for segment in rest {
		current = descend(&current, segment)?;
	}
	Some(current)
}

fn descend(ty: &FieldType, segment: &str) -> Option<FieldType> {
	match ty {
		FieldType::Document(fields) => fields.get(segment).cloned(),
		FieldType::Array(item) => descend(item, segment),
		FieldType::Any => Some(FieldType::Any),
		_ => None,
	}
}
