// SPDX-License-Identifier: MIT
// Copyright (c) 2025 DocSQL

pub mod ast;
pub mod bind;
pub mod lower;
pub mod schema;

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::fragment::Fragment;

/// The error taxonomy of the compiler. Every diagnostic carries exactly
/// one kind; the facade exposes it unchanged so callers can distinguish
/// malformed input from valid-but-unsupported input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
	/// Malformed SQL.
	Syntax,
	/// Valid SQL the dialect does not accept.
	UnsupportedSyntax,
	/// Malformed or inconsistent schema description.
	Schema,
	/// Unresolved or ambiguous identifier.
	Resolution,
	/// Incompatible types.
	Type,
	/// A construct with no pipeline translation.
	LoweringUnsupported,
	/// Invariant violation inside the compiler.
	Internal,
}

impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ErrorKind::Syntax => f.write_str("syntax error"),
			ErrorKind::UnsupportedSyntax => f.write_str("unsupported syntax"),
			ErrorKind::Schema => f.write_str("schema error"),
			ErrorKind::Resolution => f.write_str("resolution error"),
			ErrorKind::Type => f.write_str("type error"),
			ErrorKind::LoweringUnsupported => f.write_str("lowering unsupported"),
			ErrorKind::Internal => f.write_str("internal error"),
		}
	}
}

/// A structured, self-contained description of a compilation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
	/// Stable code, e.g. `BIND_002`.
	pub code: String,
	pub kind: ErrorKind,
	pub message: String,
	/// Offending piece of the source statement, if known.
	pub fragment: Fragment,
	/// Short label describing the fragment.
	pub label: Option<String>,
	pub help: Option<String>,
	pub notes: Vec<String>,
}

pub trait IntoDiagnostic {
	fn into_diagnostic(self) -> Diagnostic;
}

/// Diagnostic for internal invariant violations; see `internal_error!`.
pub fn internal(message: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "INTERNAL_001".to_string(),
		kind: ErrorKind::Internal,
		message: message.into(),
		fragment: Fragment::None,
		label: None,
		help: Some("this is a compiler bug - please report this issue".to_string()),
		notes: vec![],
	}
}
