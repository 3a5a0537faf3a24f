// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! Keyword definitions.

use std::{collections::HashMap, sync::LazyLock};

macro_rules! keyword {
	( $( $variant:ident => $string:literal ),* $(,)? ) => {
		/// SQL keywords. Matching is case-insensitive.
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
		pub enum Keyword {
			$( $variant ),*
		}

		impl Keyword {
			/// Canonical (uppercase) spelling.
			pub const fn as_str(&self) -> &'static str {
				match self {
					$( Keyword::$variant => $string ),*
				}
			}
		}

		/// Map from lowercase keyword strings to Keyword variants.
		pub static KEYWORD_MAP: LazyLock<HashMap<String, Keyword>> = LazyLock::new(|| {
			let mut map = HashMap::new();
			$( map.insert($string.to_ascii_lowercase(), Keyword::$variant); )*
			map
		});
	};
}

keyword! {
	// Query clauses
	Select   => "SELECT",
	Distinct => "DISTINCT",
	From     => "FROM",
	Where    => "WHERE",
	Group    => "GROUP",
	By       => "BY",
	Having   => "HAVING",
	Order    => "ORDER",
	Asc      => "ASC",
	Desc     => "DESC",
	Limit    => "LIMIT",
	Offset   => "OFFSET",
	Union    => "UNION",
	All      => "ALL",
	As       => "AS",

	// Joins
	Join     => "JOIN",
	Inner    => "INNER",
	Left     => "LEFT",
	Right    => "RIGHT",
	Full     => "FULL",
	Outer    => "OUTER",
	Cross    => "CROSS",
	On       => "ON",

	// Predicates
	And      => "AND",
	Or       => "OR",
	Not      => "NOT",
	Between  => "BETWEEN",
	In       => "IN",
	Like     => "LIKE",
	Is       => "IS",

	// Expressions
	Case     => "CASE",
	When     => "WHEN",
	Then     => "THEN",
	Else     => "ELSE",
	End      => "END",
	Cast     => "CAST",
	Over     => "OVER",
	Partition => "PARTITION",
}

/// Try to match an identifier string to a keyword (case-insensitive).
pub fn lookup_keyword(s: &str) -> Option<Keyword> {
	if s.chars().all(|c| c.is_ascii_lowercase()) {
		KEYWORD_MAP.get(s).copied()
	} else {
		let lower = s.to_ascii_lowercase();
		KEYWORD_MAP.get(lower.as_str()).copied()
	}
}
