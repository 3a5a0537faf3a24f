// SPDX-License-Identifier: MIT
// Copyright (c) 2025 DocSQL

//! Diagnostics raised by the tokenizer and parser.

use crate::{
	error::diagnostic::{Diagnostic, ErrorKind},
	fragment::Fragment,
};

/// Character the tokenizer cannot start any token from.
pub fn unexpected_character(fragment: Fragment) -> Diagnostic {
	let value = fragment.text().to_string();
	Diagnostic {
		code: "AST_001".to_string(),
		kind: ErrorKind::Syntax,
		message: format!("unexpected character `{}`", value),
		fragment,
		label: Some("cannot start a token here".to_string()),
		help: None,
		notes: vec![],
	}
}

/// String literal or quoted identifier without a closing quote.
pub fn unterminated_string(fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "AST_002".to_string(),
		kind: ErrorKind::Syntax,
		message: "unterminated string literal".to_string(),
		fragment,
		label: Some("string starts here".to_string()),
		help: Some("close the literal with a matching quote".to_string()),
		notes: vec![],
	}
}

/// `/*` without a matching `*/`.
pub fn unterminated_block_comment(fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "AST_003".to_string(),
		kind: ErrorKind::Syntax,
		message: "unterminated block comment".to_string(),
		fragment,
		label: Some("comment starts here".to_string()),
		help: Some("close the comment with `*/`".to_string()),
		notes: vec![],
	}
}

/// Numeric literal that fits in neither an int nor a float.
pub fn number_out_of_range(fragment: Fragment) -> Diagnostic {
	let value = fragment.text().to_string();
	Diagnostic {
		code: "AST_004".to_string(),
		kind: ErrorKind::Syntax,
		message: format!("numeric literal `{}` out of range", value),
		fragment,
		label: Some("does not fit a 64-bit number".to_string()),
		help: None,
		notes: vec![],
	}
}

/// Statement ended where the parser expected more input.
pub fn unexpected_eof() -> Diagnostic {
	Diagnostic {
		code: "AST_005".to_string(),
		kind: ErrorKind::Syntax,
		message: "unexpected end of input".to_string(),
		fragment: Fragment::None,
		label: None,
		help: Some("complete the statement".to_string()),
		notes: vec![],
	}
}

/// Parser found something other than the token it required.
pub fn unexpected_token(expected: &str, fragment: Fragment) -> Diagnostic {
	let found = fragment.text().to_string();
	Diagnostic {
		code: "AST_006".to_string(),
		kind: ErrorKind::Syntax,
		message: format!("expected {}, found `{}`", expected, found),
		fragment,
		label: Some(format!("found `{}`", found)),
		help: None,
		notes: vec![],
	}
}

pub fn expected_identifier(fragment: Fragment) -> Diagnostic {
	let found = fragment.text().to_string();
	Diagnostic {
		code: "AST_007".to_string(),
		kind: ErrorKind::Syntax,
		message: format!("expected identifier, found `{}`", found),
		fragment,
		label: Some(format!("found `{}`", found)),
		help: None,
		notes: vec![],
	}
}

pub fn expected_expression(fragment: Fragment) -> Diagnostic {
	let found = fragment.text().to_string();
	Diagnostic {
		code: "AST_008".to_string(),
		kind: ErrorKind::Syntax,
		message: format!("expected expression, found `{}`", found),
		fragment,
		label: Some(format!("found `{}`", found)),
		help: None,
		notes: vec![],
	}
}

/// `SELECT FROM ...` — the select list is missing; the diagnostic points
/// at the token found where the list should begin.
pub fn missing_select_list(fragment: Fragment) -> Diagnostic {
	let found = fragment.text().to_string();
	Diagnostic {
		code: "AST_009".to_string(),
		kind: ErrorKind::Syntax,
		message: format!("expected select list, found `{}`", found),
		fragment,
		label: Some("select list must appear before this".to_string()),
		help: Some("list at least one column or expression after SELECT".to_string()),
		notes: vec![],
	}
}

/// Comparisons are non-associative in this dialect.
pub fn chained_comparison(fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "AST_010".to_string(),
		kind: ErrorKind::Syntax,
		message: "comparison operators cannot be chained".to_string(),
		fragment,
		label: Some("second comparison starts here".to_string()),
		help: Some("split the chain with AND, e.g. `a < b AND b < c`".to_string()),
		notes: vec![],
	}
}

/// Input continues after a complete statement.
pub fn trailing_tokens(fragment: Fragment) -> Diagnostic {
	let found = fragment.text().to_string();
	Diagnostic {
		code: "AST_011".to_string(),
		kind: ErrorKind::Syntax,
		message: format!("unexpected input after statement: `{}`", found),
		fragment,
		label: Some("statement already complete".to_string()),
		help: None,
		notes: vec![],
	}
}

/// Well-formed SQL the dialect does not accept. Distinct from plain
/// syntax errors so callers can tell malformed input apart from input
/// that is valid SQL but outside the supported surface.
pub fn unsupported_construct(what: &str, fragment: Fragment) -> Diagnostic {
	Diagnostic {
		code: "AST_012".to_string(),
		kind: ErrorKind::UnsupportedSyntax,
		message: format!("{} is not supported", what),
		fragment,
		label: Some("not supported here".to_string()),
		help: None,
		notes: vec![],
	}
}
