// SPDX-License-Identifier: MIT
// Copyright (c) 2025 DocSQL

pub mod promote;

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declared type of a collection field or the inferred static type of an
/// expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
	Boolean,
	Int,
	Float,
	Utf8,
	/// Homogeneous array, `any` items when the element type is unknown.
	Array(Box<FieldType>),
	/// Nested document with ordered fields.
	Document(IndexMap<String, FieldType>),
	/// Unknown or schemaless; compatible with everything.
	Any,
}

impl FieldType {
	pub fn is_numeric(&self) -> bool {
		matches!(self, FieldType::Int | FieldType::Float | FieldType::Any)
	}

	pub fn is_any(&self) -> bool {
		matches!(self, FieldType::Any)
	}
}

impl Display for FieldType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			FieldType::Boolean => f.write_str("bool"),
			FieldType::Int => f.write_str("int"),
			FieldType::Float => f.write_str("float"),
			FieldType::Utf8 => f.write_str("string"),
			FieldType::Array(item) => write!(f, "array<{}>", item),
			FieldType::Document(_) => f.write_str("document"),
			FieldType::Any => f.write_str("any"),
		}
	}
}

/// A literal value appearing in a query. `Null` deliberately carries no
/// type; it is `any` for coercion purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	Null,
	Boolean(bool),
	Int(i64),
	Float(f64),
	Utf8(String),
}

impl Value {
	pub fn field_type(&self) -> FieldType {
		match self {
			Value::Null => FieldType::Any,
			Value::Boolean(_) => FieldType::Boolean,
			Value::Int(_) => FieldType::Int,
			Value::Float(_) => FieldType::Float,
			Value::Utf8(_) => FieldType::Utf8,
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("null"),
			Value::Boolean(v) => write!(f, "{}", v),
			Value::Int(v) => write!(f, "{}", v),
			Value::Float(v) => write!(f, "{}", v),
			Value::Utf8(v) => write!(f, "\"{}\"", v),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_field_type_display() {
		assert_eq!(FieldType::Boolean.to_string(), "bool");
		assert_eq!(FieldType::Int.to_string(), "int");
		assert_eq!(FieldType::Float.to_string(), "float");
		assert_eq!(FieldType::Utf8.to_string(), "string");
		assert_eq!(FieldType::Array(Box::new(FieldType::Int)).to_string(), "array<int>");
		assert_eq!(FieldType::Any.to_string(), "any");
	}

	#[test]
	fn test_value_field_type() {
		assert_eq!(Value::Null.field_type(), FieldType::Any);
		assert_eq!(Value::Boolean(true).field_type(), FieldType::Boolean);
		assert_eq!(Value::Int(42).field_type(), FieldType::Int);
		assert_eq!(Value::Float(3.25).field_type(), FieldType::Float);
		assert_eq!(Value::Utf8("x".into()).field_type(), FieldType::Utf8);
	}

	#[test]
	fn test_is_numeric() {
		assert!(FieldType::Int.is_numeric());
		assert!(FieldType::Float.is_numeric());
		assert!(FieldType::Any.is_numeric());
		assert!(!FieldType::Utf8.is_numeric());
		assert!(!FieldType::Boolean.is_numeric());
	}
}
