// SPDX-License-Identifier: MIT
// Copyright (c) 2025 DocSQL

pub mod diagnostic;

use std::fmt::{self, Display, Formatter};

use crate::error::diagnostic::Diagnostic;

/// The unified error of the compiler: every stage failure is a
/// [`Diagnostic`] wrapped in this newtype.
#[derive(Debug, Clone, PartialEq)]
pub struct Error(pub Diagnostic);

impl Error {
	pub fn diagnostic(&self) -> &Diagnostic {
		&self.0
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let diagnostic = &self.0;
		write!(f, "{}: {}", diagnostic.kind, diagnostic.message)?;
		if let (Some(line), Some(column)) = (diagnostic.fragment.line(), diagnostic.fragment.column()) {
			write!(f, " (line {}, column {})", line, column)?;
		}
		if let Some(help) = &diagnostic.help {
			write!(f, "; help: {}", help)?;
		}
		Ok(())
	}
}

impl std::error::Error for Error {}

/// Produce an `Err(Error)` from a diagnostic.
#[macro_export]
macro_rules! err {
	($diagnostic:expr) => {
		Err($crate::Error($diagnostic))
	};
}

/// Return early with an `Error` built from a diagnostic.
#[macro_export]
macro_rules! return_error {
	($diagnostic:expr) => {
		return Err($crate::Error($diagnostic))
	};
}

/// Build an [`Error`] for an internal invariant violation. These must
/// never surface from well-formed compiler stages; they exist so broken
/// invariants fail loudly in testing instead of corrupting output.
#[macro_export]
macro_rules! internal_error {
	($($arg:tt)*) => {
		$crate::Error($crate::error::diagnostic::internal(format!($($arg)*)))
	};
}

#[cfg(test)]
mod tests {
	use crate::{
		Fragment,
		error::diagnostic::{Diagnostic, ErrorKind},
	};

	#[test]
	fn test_display_with_position() {
		let error = crate::Error(Diagnostic {
			code: "AST_005".to_string(),
			kind: ErrorKind::Syntax,
			message: "unexpected token".to_string(),
			fragment: Fragment::statement("??", 3, 7),
			label: None,
			help: Some("check syntax".to_string()),
			notes: vec![],
		});
		assert_eq!(error.to_string(), "syntax error: unexpected token (line 3, column 7); help: check syntax");
	}

	#[test]
	fn test_display_without_position() {
		let error = internal_error!("column {} missing from child schema", "a");
		assert_eq!(error.to_string(), "internal error: column a missing from child schema");
	}

	#[test]
	fn test_err_macro() {
		let result: crate::Result<()> = err!(crate::error::diagnostic::internal("boom".to_string()));
		assert!(result.is_err());
	}
}
