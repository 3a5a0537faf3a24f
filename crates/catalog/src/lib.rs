// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! The schema catalog: an immutable, per-compilation view of the
//! collections a query may reference.
//!
//! The catalog is built once from the caller-supplied schema
//! description and is read-only afterwards; later compilation stages
//! only ever look fields up.

pub mod catalog;
pub mod schema;

pub use catalog::{Catalog, Collection, lookup_path};
pub use schema::SchemaDescription;

pub type Result<T> = docsql_type::Result<T>;
