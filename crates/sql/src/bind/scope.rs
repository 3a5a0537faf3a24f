// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

use docsql_type::{FieldType, Fragment, err, error::diagnostic::bind};
use docsql_catalog::lookup_path;
use indexmap::IndexMap;

use crate::{ast::Identifier, bind::expr::BoundExpr};

/// Name resolution scope of one select block: the sources its FROM
/// clause brings into view. A derived table's inner block gets its own
/// scope, so inner names shadow outer ones by construction.
pub(crate) struct Scope {
	pub sources: Vec<ScopeSource>,
}

pub(crate) struct ScopeSource {
	pub alias: String,
	pub fields: IndexMap<String, FieldType>,
}

impl Scope {
	/// Resolve a dotted reference. The first segment is tried as a
	/// source alias; otherwise the whole path resolves as a field path
	/// against every source, and matching more than one is ambiguous.
	pub(crate) fn resolve(&self, path: &[Identifier]) -> crate::Result<BoundExpr> {
		let fragment = joined_fragment(path);

		if path.len() > 1 {
			if let Some(source) = self.sources.iter().position(|s| s.alias == path[0].name) {
				let rest: Vec<&str> = path[1..].iter().map(|p| p.name.as_str()).collect();
				let Some(ty) = lookup_path(&self.sources[source].fields, &rest) else {
					return err!(bind::column_not_found(fragment));
				};
				return Ok(BoundExpr::FieldRef {
					source,
					path: rest.iter().map(|s| s.to_string()).collect(),
					ty,
					fragment,
				});
			}
		}

		let segments: Vec<&str> = path.iter().map(|p| p.name.as_str()).collect();
		let mut matches = self
			.sources
			.iter()
			.enumerate()
			.filter_map(|(index, source)| lookup_path(&source.fields, &segments).map(|ty| (index, ty)));

		let Some((source, ty)) = matches.next() else {
			return err!(bind::column_not_found(fragment));
		};
		if matches.next().is_some() {
			let aliases: Vec<String> = self
				.sources
				.iter()
				.filter(|s| lookup_path(&s.fields, &segments).is_some())
				.map(|s| s.alias.clone())
				.collect();
			return err!(bind::ambiguous_column(fragment, &aliases));
		}

		Ok(BoundExpr::FieldRef {
			source,
			path: segments.iter().map(|s| s.to_string()).collect(),
			ty,
			fragment,
		})
	}
}

/// Fragment spanning a dotted path, positioned at its first segment.
fn joined_fragment(path: &[Identifier]) -> Fragment {
	let text = path.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(".");
	match (path[0].fragment.line(), path[0].fragment.column()) {
		(Some(line), Some(column)) => Fragment::statement(text, line, column),
		_ => Fragment::statement(text, 1, 1),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn identifier(name: &str) -> Identifier {
		Identifier {
			name: name.to_string(),
			fragment: Fragment::statement(name, 1, 1),
		}
	}

	fn scope() -> Scope {
		let mut orders = IndexMap::new();
		orders.insert("id".to_string(), FieldType::Int);
		orders.insert("customer".to_string(), {
			let mut inner = IndexMap::new();
			inner.insert("name".to_string(), FieldType::Utf8);
			FieldType::Document(inner)
		});
		let mut items = IndexMap::new();
		items.insert("id".to_string(), FieldType::Int);
		items.insert("sku".to_string(), FieldType::Utf8);
		Scope {
			sources: vec![
				ScopeSource {
					alias: "o".to_string(),
					fields: orders,
				},
				ScopeSource {
					alias: "i".to_string(),
					fields: items,
				},
			],
		}
	}

	#[test]
	fn test_resolve_qualified() {
		let scope = scope();
		let BoundExpr::FieldRef {
			source,
			path,
			ty,
			..
		} = scope.resolve(&[identifier("i"), identifier("sku")]).unwrap()
		else {
			panic!("expected field ref");
		};
		assert_eq!(source, 1);
		assert_eq!(path, ["sku"]);
		assert_eq!(ty, FieldType::Utf8);
	}

	#[test]
	fn test_resolve_unqualified_unique() {
		let scope = scope();
		let BoundExpr::FieldRef {
			source,
			..
		} = scope.resolve(&[identifier("sku")]).unwrap()
		else {
			panic!("expected field ref");
		};
		assert_eq!(source, 1);
	}

	#[test]
	fn test_resolve_ambiguous() {
		let err = scope().resolve(&[identifier("id")]).unwrap_err();
		assert_eq!(err.diagnostic().code, "BIND_003");
		assert!(err.diagnostic().message.contains("o, i"));
	}

	#[test]
	fn test_resolve_nested_document_path() {
		let scope = scope();
		let bound = scope.resolve(&[identifier("o"), identifier("customer"), identifier("name")]).unwrap();
		let BoundExpr::FieldRef {
			source,
			path,
			ty,
			..
		} = bound
		else {
			panic!("expected field ref");
		};
		assert_eq!(source, 0);
		assert_eq!(path, ["customer", "name"]);
		assert_eq!(ty, FieldType::Utf8);
	}

	#[test]
	fn test_resolve_not_found() {
		let err = scope().resolve(&[identifier("missing")]).unwrap_err();
		assert_eq!(err.diagnostic().code, "BIND_002");
	}

	#[test]
	fn test_alias_match_with_missing_field() {
		let err = scope().resolve(&[identifier("o"), identifier("missing")]).unwrap_err();
		assert_eq!(err.diagnostic().code, "BIND_002");
		assert!(err.diagnostic().message.contains("o.missing"));
	}

	#[test]
	fn test_unqualified_dotted_path() {
		// No source is aliased `customer`, so the whole path is a
		// field path
		let scope = scope();
		let bound = scope.resolve(&[identifier("customer"), identifier("name")]).unwrap();
		assert!(matches!(bound, BoundExpr::FieldRef { source: 0, .. }));
	}
}
