// SPDX-License-Identifier: MIT
// Copyright (c) 2025 DocSQL

//! Shared foundation of the compiler: field types, literal values, the
//! numeric promotion table, source fragments, and the diagnostic system
//! every stage reports through.

pub mod error;
pub mod fragment;
pub mod value;

pub use error::{
	Error,
	diagnostic::{Diagnostic, ErrorKind, IntoDiagnostic},
};
pub use fragment::Fragment;
pub use value::{FieldType, Value};

pub type Result<T> = std::result::Result<T, Error>;
