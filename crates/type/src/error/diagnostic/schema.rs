// SPDX-License-Identifier: MIT
// Copyright (c) 2025 DocSQL

//! Diagnostics raised while building the schema catalog.

use crate::{
	error::diagnostic::{Diagnostic, ErrorKind},
	fragment::Fragment,
};

/// The schema description is not structurally valid.
pub fn invalid_description(detail: String) -> Diagnostic {
	Diagnostic {
		code: "SCHEMA_001".to_string(),
		kind: ErrorKind::Schema,
		message: format!("invalid schema description: {}", detail),
		fragment: Fragment::None,
		label: None,
		help: Some("the schema must map collection names to ordered field lists".to_string()),
		notes: vec![],
	}
}

pub fn empty_collection_name() -> Diagnostic {
	Diagnostic {
		code: "SCHEMA_002".to_string(),
		kind: ErrorKind::Schema,
		message: "collection with empty name".to_string(),
		fragment: Fragment::None,
		label: None,
		help: Some("every collection needs a non-empty name".to_string()),
		notes: vec![],
	}
}

pub fn empty_field_name(collection: &str) -> Diagnostic {
	Diagnostic {
		code: "SCHEMA_003".to_string(),
		kind: ErrorKind::Schema,
		message: format!("collection `{}` declares a field with an empty name", collection),
		fragment: Fragment::None,
		label: None,
		help: None,
		notes: vec![],
	}
}

pub fn duplicate_field(collection: &str, field: &str) -> Diagnostic {
	Diagnostic {
		code: "SCHEMA_004".to_string(),
		kind: ErrorKind::Schema,
		message: format!("duplicate field `{}` in collection `{}`", field, collection),
		fragment: Fragment::None,
		label: None,
		help: Some("field names must be unique within a collection".to_string()),
		notes: vec![],
	}
}

pub fn duplicate_collection(collection: &str) -> Diagnostic {
	Diagnostic {
		code: "SCHEMA_005".to_string(),
		kind: ErrorKind::Schema,
		message: format!("collection `{}` declared more than once", collection),
		fragment: Fragment::None,
		label: None,
		help: None,
		notes: vec![],
	}
}
