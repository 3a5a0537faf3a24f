// SPDX-License-Identifier: MIT
// Copyright (c) 2025 DocSQL

//! Diagnostics raised while resolving identifiers and typing
//! expressions.

use crate::{
	error::diagnostic::{Diagnostic, ErrorKind},
	fragment::Fragment,
};

pub fn collection_not_found(fragment: Fragment) -> Diagnostic {
	let name = fragment.text().to_string();
	Diagnostic {
		code: "BIND_001".to_string(),
		kind: ErrorKind::Resolution,
		message: format!("collection `{}` does not exist", name),
		fragment,
		label: Some("unknown collection".to_string()),
		help: Some("check the schema description for the available collections".to_string()),
		notes: vec![],
	}
}

pub fn column_not_found(fragment: Fragment) -> Diagnostic {
	let name = fragment.text().to_string();
	Diagnostic {
		code: "BIND_002".to_string(),
		kind: ErrorKind::Resolution,
		message: format!("column `{}` does not exist in the current scope", name),
		fragment,
		label: Some("unknown column".to_string()),
		help: Some("check for typos or qualify the column with its source alias".to_string()),
		notes: vec![],
	}
}

pub fn ambiguous_column(fragment: Fragment, sources: &[String]) -> Diagnostic {
	let name = fragment.text().to_string();
	Diagnostic {
		code: "BIND_003".to_string(),
		kind: ErrorKind::Resolution,
		message: format!("column `{}` is ambiguous, found in: {}", name, sources.join(", ")),
		fragment,
		label: Some("ambiguous reference".to_string()),
		help: Some("qualify the column with a source alias".to_string()),
		notes: vec![],
	}
}

pub fn unknown_source_alias(fragment: Fragment) -> Diagnostic {
	let name = fragment.text().to_string();
	Diagnostic {
		code: "BIND_004".to_string(),
		kind: ErrorKind::Resolution,
		message: format!("`{}` is not a source alias in the current scope", name),
		fragment,
		label: Some("unknown alias".to_string()),
		help: None,
		notes: vec![],
	}
}

pub fn unknown_function(fragment: Fragment) -> Diagnostic {
	let name = fragment.text().to_string();
	Diagnostic {
		code: "BIND_005".to_string(),
		kind: ErrorKind::Resolution,
		message: format!("function `{}` does not exist", name),
		fragment,
		label: Some("unknown function".to_string()),
		help: None,
		notes: vec![],
	}
}

/// Types that the requested operation cannot combine.
pub fn incompatible_types(operation: &str, left: &str, right: &str, fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "BIND_006".to_string(),
		kind: ErrorKind::Type,
		message: format!("cannot apply {} to `{}` and `{}`", operation, left, right),
		fragment,
		label: Some("incompatible types".to_string()),
		help: Some("cast one side explicitly if the comparison is intended".to_string()),
		notes: vec![],
	}
}

/// Operand of the wrong type for a single-operand position.
pub fn expected_type(context: &str, expected: &str, found: &str, fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "BIND_007".to_string(),
		kind: ErrorKind::Type,
		message: format!("{} requires {}, found `{}`", context, expected, found),
		fragment,
		label: Some(format!("has type `{}`", found)),
		help: None,
		notes: vec![],
	}
}

pub fn invalid_cast(from: &str, to: &str, fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "BIND_008".to_string(),
		kind: ErrorKind::Type,
		message: format!("cannot cast `{}` to `{}`", from, to),
		fragment,
		label: Some("invalid cast".to_string()),
		help: None,
		notes: vec![],
	}
}

pub fn nested_aggregate(fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "BIND_009".to_string(),
		kind: ErrorKind::Type,
		message: "aggregate functions cannot be nested".to_string(),
		fragment,
		label: Some("nested aggregate".to_string()),
		help: None,
		notes: vec![],
	}
}

/// Aggregate in a clause that is evaluated per document.
pub fn aggregate_not_allowed(clause: &str, fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "BIND_010".to_string(),
		kind: ErrorKind::Type,
		message: format!("aggregate functions are not allowed in {}", clause),
		fragment,
		label: Some("aggregate not allowed here".to_string()),
		help: Some("move the condition to HAVING".to_string()),
		notes: vec![],
	}
}

/// Plain column in a grouped query that is neither a grouping key nor
/// inside an aggregate.
pub fn column_not_grouped(fragment: Fragment) -> Diagnostic {
	let name = fragment.text().to_string();
	Diagnostic {
		code: "BIND_011".to_string(),
		kind: ErrorKind::Type,
		message: format!("column `{}` must appear in GROUP BY or inside an aggregate function", name),
		fragment,
		label: Some("not a grouping key".to_string()),
		help: None,
		notes: vec![],
	}
}

pub fn select_without_from(fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "BIND_012".to_string(),
		kind: ErrorKind::UnsupportedSyntax,
		message: "SELECT without FROM is not supported".to_string(),
		fragment,
		label: None,
		help: Some("query a collection with FROM".to_string()),
		notes: vec![],
	}
}

/// UNION branches whose output schemas do not line up.
pub fn union_schema_mismatch(detail: String, fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "BIND_013".to_string(),
		kind: ErrorKind::Type,
		message: format!("UNION branches are incompatible: {}", detail),
		fragment,
		label: None,
		help: Some("both branches must produce the same column names and compatible types".to_string()),
		notes: vec![],
	}
}

pub fn wrong_argument_count(function: &str, expected: &str, actual: usize, fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "BIND_014".to_string(),
		kind: ErrorKind::Type,
		message: format!("function `{}` expects {} argument(s), got {}", function, expected, actual),
		fragment,
		label: None,
		help: None,
		notes: vec![],
	}
}

pub fn duplicate_output_column(name: &str, fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "BIND_015".to_string(),
		kind: ErrorKind::Resolution,
		message: format!("output column `{}` is defined more than once", name),
		fragment,
		label: Some("duplicate output column".to_string()),
		help: Some("rename one of the columns with AS".to_string()),
		notes: vec![],
	}
}

/// ORDER BY keys must name or repeat an output column of the select
/// list; sorting happens after projection.
pub fn order_by_not_in_select(fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "BIND_016".to_string(),
		kind: ErrorKind::Resolution,
		message: "ORDER BY expression does not appear in the select list".to_string(),
		fragment,
		label: Some("not an output column".to_string()),
		help: Some("add the expression to the select list or order by one of its columns".to_string()),
		notes: vec![],
	}
}

pub fn duplicate_source_alias(fragment: Fragment) -> Diagnostic {
	let name = fragment.text().to_string();
	Diagnostic {
		code: "BIND_017".to_string(),
		kind: ErrorKind::Resolution,
		message: format!("source alias `{}` is used more than once", name),
		fragment,
		label: Some("duplicate alias".to_string()),
		help: Some("give each joined source a distinct alias".to_string()),
		notes: vec![],
	}
}
