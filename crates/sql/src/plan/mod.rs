// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

pub mod logical;
pub mod optimize;

pub use logical::{
	Column, DistinctNode, FilterNode, GroupNode, JoinNode, LimitNode, LogicalPlan, ProjectNode, ScanInput, ScanNode,
	SortNode, UnionNode, algebrize,
};
pub use optimize::optimize;
