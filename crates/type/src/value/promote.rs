// SPDX-License-Identifier: MIT
// Copyright (c) 2025 DocSQL

//! The fixed promotion and coercion table of the dialect.
//!
//! These rules are deliberately enumerated rather than inferred: the
//! binder consults only this module when typing expressions, so the
//! whole coercion policy of the compiler is auditable in one place.

use crate::value::FieldType;

/// Result type of an arithmetic operation, `None` when the operands are
/// not arithmetic-compatible.
///
/// int ⊕ int stays int; a float operand contaminates to float; `any`
/// absorbs because the runtime value may be either.
pub fn arithmetic_result(left: &FieldType, right: &FieldType) -> Option<FieldType> {
	use FieldType::*;

	match (left, right) {
		(Any, other) | (other, Any) if other.is_numeric() => Some(Any),
		(Any, Any) => Some(Any),
		(Int, Int) => Some(Int),
		(Int, Float) | (Float, Int) | (Float, Float) => Some(Float),
		_ => None,
	}
}

/// Whether two types may be compared with `=`, `<`, `BETWEEN`, `IN`, ...
///
/// Numeric types compare with each other, every scalar type compares
/// with itself, and `any` compares with everything. Documents and
/// arrays only ever compare against `any`; ordering them is not part of
/// the dialect.
pub fn comparable(left: &FieldType, right: &FieldType) -> bool {
	use FieldType::*;

	match (left, right) {
		(Any, _) | (_, Any) => true,
		(Int | Float, Int | Float) => true,
		(Boolean, Boolean) => true,
		(Utf8, Utf8) => true,
		(Array(_), Array(_)) | (Document(_), Document(_)) => false,
		_ => false,
	}
}

/// Whether a type is acceptable where the dialect requires a boolean
/// condition (WHERE, HAVING, AND/OR/NOT operands, CASE guards).
pub fn boolean_compatible(ty: &FieldType) -> bool {
	matches!(ty, FieldType::Boolean | FieldType::Any)
}

/// Valid targets of an explicit CAST and whether `from` converts to
/// `to`. Casts move freely between the scalar kinds; documents and
/// arrays cannot be cast.
pub fn castable(from: &FieldType, to: &FieldType) -> bool {
	use FieldType::*;

	let scalar = |ty: &FieldType| matches!(ty, Boolean | Int | Float | Utf8);
	(from.is_any() || scalar(from)) && scalar(to)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::value::FieldType::*;

	#[test]
	fn test_arithmetic_int_int() {
		assert_eq!(arithmetic_result(&Int, &Int), Some(Int));
	}

	#[test]
	fn test_arithmetic_float_contaminates() {
		assert_eq!(arithmetic_result(&Int, &Float), Some(Float));
		assert_eq!(arithmetic_result(&Float, &Int), Some(Float));
		assert_eq!(arithmetic_result(&Float, &Float), Some(Float));
	}

	#[test]
	fn test_arithmetic_any_absorbs() {
		assert_eq!(arithmetic_result(&Any, &Int), Some(Any));
		assert_eq!(arithmetic_result(&Float, &Any), Some(Any));
		assert_eq!(arithmetic_result(&Any, &Any), Some(Any));
	}

	#[test]
	fn test_arithmetic_rejects_non_numeric() {
		assert_eq!(arithmetic_result(&Utf8, &Int), None);
		assert_eq!(arithmetic_result(&Boolean, &Boolean), None);
		assert_eq!(arithmetic_result(&Utf8, &Any), None);
	}

	#[test]
	fn test_comparable_numeric_mix() {
		assert!(comparable(&Int, &Float));
		assert!(comparable(&Float, &Int));
	}

	#[test]
	fn test_comparable_identical_scalars() {
		assert!(comparable(&Boolean, &Boolean));
		assert!(comparable(&Utf8, &Utf8));
	}

	#[test]
	fn test_comparable_any() {
		assert!(comparable(&Any, &Document(Default::default())));
		assert!(comparable(&Array(Box::new(Int)), &Any));
	}

	#[test]
	fn test_incomparable() {
		assert!(!comparable(&Int, &Utf8));
		assert!(!comparable(&Boolean, &Int));
		assert!(!comparable(&Array(Box::new(Int)), &Array(Box::new(Int))));
		assert!(!comparable(&Document(Default::default()), &Document(Default::default())));
	}

	#[test]
	fn test_boolean_compatible() {
		assert!(boolean_compatible(&Boolean));
		assert!(boolean_compatible(&Any));
		assert!(!boolean_compatible(&Int));
		assert!(!boolean_compatible(&Utf8));
	}

	#[test]
	fn test_castable() {
		assert!(castable(&Int, &Utf8));
		assert!(castable(&Utf8, &Float));
		assert!(castable(&Boolean, &Int));
		assert!(castable(&Any, &Int));
		assert!(!castable(&Document(Default::default()), &Utf8));
		assert!(!castable(&Int, &Array(Box::new(Int))));
	}
}
