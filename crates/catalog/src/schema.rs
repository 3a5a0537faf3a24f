// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! Serde model of the schema description supplied by the caller.
//!
//! ```json
//! {"collections": [{"name": "orders", "fields": [
//!     {"name": "id", "type": "int"},
//!     {"name": "customer", "type": "document", "fields": [
//!         {"name": "name", "type": "string"}]},
//!     {"name": "tags", "type": "array", "items": {"type": "string"}}]}]}
//! ```

use docsql_type::{FieldType, error::diagnostic::schema, return_error};
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDescription {
	pub collections: Vec<CollectionDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionDescription {
	pub name: String,
	#[serde(default)]
	pub fields: Vec<FieldDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescription {
	pub name: String,
	#[serde(flatten)]
	pub ty: TypeDescription,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeDescription {
	#[serde(rename = "type")]
	pub kind: TypeKind,
	/// Nested fields, only meaningful for `document`.
	#[serde(default)]
	pub fields: Vec<FieldDescription>,
	/// Item type, only meaningful for `array`; items default to `any`.
	#[serde(default)]
	pub items: Option<Box<TypeDescription>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
	Bool,
	Int,
	Float,
	String,
	Document,
	Array,
	Any,
}

impl TypeDescription {
	/// Resolve the description into a [`FieldType`], validating nested
	/// documents along the way. `collection` only feeds diagnostics.
	pub(crate) fn resolve(&self, collection: &str) -> crate::Result<FieldType> {
		Ok(match self.kind {
			TypeKind::Bool => FieldType::Boolean,
			TypeKind::Int => FieldType::Int,
			TypeKind::Float => FieldType::Float,
			TypeKind::String => FieldType::Utf8,
			TypeKind::Any => FieldType::Any,
			TypeKind::Document => FieldType::Document(resolve_fields(collection, &self.fields)?),
			TypeKind::Array => {
				let item = match &self.items {
					Some(items) => items.resolve(collection)?,
					None => FieldType::Any,
				};
				FieldType::Array(Box::new(item))
			}
		})
	}
}

pub(crate) fn resolve_fields(
	collection: &str,
	fields: &[FieldDescription],
) -> crate::Result<IndexMap<String, FieldType>> {
	let mut resolved = IndexMap::with_capacity(fields.len());
	for field in fields {
		if field.name.is_empty() {
			return_error!(schema::empty_field_name(collection));
		}
		let ty = field.ty.resolve(collection)?;
		if resolved.insert(field.name.clone(), ty).is_some() {
			return_error!(schema::duplicate_field(collection, &field.name));
		}
	}
	Ok(resolved)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_deserialize_scalar_fields() {
		let description: SchemaDescription = serde_json::from_str(
			r#"{"collections": [{"name": "t", "fields": [
				{"name": "a", "type": "int"},
				{"name": "b", "type": "string"}]}]}"#,
		)
		.unwrap();
		assert_eq!(description.collections.len(), 1);
		assert_eq!(description.collections[0].fields.len(), 2);
		assert_eq!(description.collections[0].fields[0].ty.kind, TypeKind::Int);
	}

	#[test]
	fn test_deserialize_nested_document() {
		let description: SchemaDescription = serde_json::from_str(
			r#"{"collections": [{"name": "t", "fields": [
				{"name": "addr", "type": "document", "fields": [
					{"name": "city", "type": "string"}]}]}]}"#,
		)
		.unwrap();
		let field = &description.collections[0].fields[0];
		assert_eq!(field.ty.kind, TypeKind::Document);
		assert_eq!(field.ty.fields[0].name, "city");
	}

	#[test]
	fn test_resolve_array_items_default_any() {
		let ty = TypeDescription {
			kind: TypeKind::Array,
			fields: vec![],
			items: None,
		};
		assert_eq!(ty.resolve("t").unwrap(), FieldType::Array(Box::new(FieldType::Any)));
	}

	#[test]
	fn test_resolve_rejects_duplicate_nested_field() {
		let description: SchemaDescription = serde_json::from_str(
			r#"{"collections": [{"name": "t", "fields": [
				{"name": "addr", "type": "document", "fields": [
					{"name": "city", "type": "string"},
					{"name": "city", "type": "int"}]}]}]}"#,
		)
		.unwrap();
		let field = &description.collections[0].fields[0];
		let err = field.ty.resolve("t").unwrap_err();
		assert_eq!(err.diagnostic().code, "SCHEMA_004");
	}
}
