// SPDX-License-Identifier: MIT
// Copyright (c) 2025 DocSQL

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// A piece of the source statement: the lexeme text plus its 1-based
/// line and column. Diagnostics carry fragments so errors can point at
/// the offending span; `None` marks positions that have no source
/// counterpart (schema errors, internal errors).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Fragment {
	#[default]
	None,
	Statement {
		text: String,
		line: u32,
		column: u32,
	},
}

impl Fragment {
	pub fn statement(text: impl Into<String>, line: u32, column: u32) -> Self {
		Fragment::Statement {
			text: text.into(),
			line,
			column,
		}
	}

	pub fn text(&self) -> &str {
		match self {
			Fragment::None => "",
			Fragment::Statement {
				text,
				..
			} => text,
		}
	}

	pub fn line(&self) -> Option<u32> {
		match self {
			Fragment::None => None,
			Fragment::Statement {
				line,
				..
			} => Some(*line),
		}
	}

	pub fn column(&self) -> Option<u32> {
		match self {
			Fragment::None => None,
			Fragment::Statement {
				column,
				..
			} => Some(*column),
		}
	}

	pub fn is_none(&self) -> bool {
		matches!(self, Fragment::None)
	}
}

impl Display for Fragment {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Fragment::None => Ok(()),
			Fragment::Statement {
				text,
				line,
				column,
			} => {
				write!(f, "`{}` at line {}, column {}", text, line, column)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_statement_accessors() {
		let fragment = Fragment::statement("WHERE", 2, 14);
		assert_eq!(fragment.text(), "WHERE");
		assert_eq!(fragment.line(), Some(2));
		assert_eq!(fragment.column(), Some(14));
		assert!(!fragment.is_none());
	}

	#[test]
	fn test_none_accessors() {
		let fragment = Fragment::None;
		assert_eq!(fragment.text(), "");
		assert_eq!(fragment.line(), None);
		assert_eq!(fragment.column(), None);
		assert!(fragment.is_none());
	}

	#[test]
	fn test_display() {
		assert_eq!(Fragment::statement("SUM", 1, 8).to_string(), "`SUM` at line 1, column 8");
		assert_eq!(Fragment::None.to_string(), "");
	}
}
