// SPDX-License-Identifier: MIT
// Copyright (c) 2025 DocSQL

//! Diagnostics raised while lowering a logical plan into pipeline
//! stages. These are recoverable "no translation exists" conditions,
//! never crashes.

use crate::{
	error::diagnostic::{Diagnostic, ErrorKind},
	fragment::Fragment,
};

pub fn unsupported_join(join_type: &str, fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "LOWER_001".to_string(),
		kind: ErrorKind::LoweringUnsupported,
		message: format!("{} JOIN has no pipeline translation", join_type),
		fragment,
		label: Some("cannot lower this join".to_string()),
		help: Some("rewrite the query with an INNER or LEFT join".to_string()),
		notes: vec![],
	}
}

pub fn unsupported_window_function(fragment: Fragment) -> Diagnostic {
	let name = fragment.text().to_string();
	Diagnostic {
		code: "LOWER_002".to_string(),
		kind: ErrorKind::LoweringUnsupported,
		message: format!("window function `{}` has no pipeline translation", name),
		fragment,
		label: Some("cannot lower this window function".to_string()),
		help: None,
		notes: vec![],
	}
}

/// A UNION nested where the target pipeline only accepts a plain
/// collection (the right-hand side of a join).
pub fn unsupported_union_position(fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "LOWER_003".to_string(),
		kind: ErrorKind::LoweringUnsupported,
		message: "UNION cannot appear as a join input".to_string(),
		fragment,
		label: None,
		help: Some("materialize the union as its own query".to_string()),
		notes: vec![],
	}
}

pub fn unsupported_construct(what: &str, fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "LOWER_004".to_string(),
		kind: ErrorKind::LoweringUnsupported,
		message: format!("{} has no pipeline translation", what),
		fragment,
		label: None,
		help: None,
		notes: vec![],
	}
}
