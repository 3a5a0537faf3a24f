// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 DocSQL

//! The binder resolves the AST against the catalog: every column
//! reference becomes a source index plus field path, every expression
//! gets a static type, and aggregate calls are hoisted into the bound
//! query's aggregate list.

pub mod expr;
pub(crate) mod scope;

use docsql_catalog::Catalog;
use docsql_type::{
	FieldType, Fragment, err,
	error::diagnostic::{ast, bind},
	value::promote,
};
use indexmap::IndexMap;

pub use crate::bind::expr::{AggregateFunction, BoundAggregate, BoundExpr, ScalarFunction, same_expr};
use crate::{
	ast::{
		AstExpr, AstOrderSpec, AstQuery, AstSelect, AstSelectItem, AstTableRef, BinaryOperator, JoinType,
		UnaryOperator,
	},
	bind::scope::{Scope, ScopeSource},
};

#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
	pub select: BoundSelect,
	pub unions: Vec<BoundUnion>,
	pub order_by: Vec<BoundSortKey>,
	pub limit: Option<BoundLimit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundUnion {
	pub all: bool,
	pub select: BoundSelect,
	pub fragment: Fragment,
}

/// Sort key: index of an output column of the select list.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSortKey {
	pub column: usize,
	pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundLimit {
	pub limit: i64,
	pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundSelect {
	pub sources: Vec<BoundSource>,
	pub from: BoundFrom,
	pub filter: Option<BoundExpr>,
	pub group_by: Vec<BoundExpr>,
	pub aggregates: Vec<BoundAggregate>,
	pub having: Option<BoundExpr>,
	pub distinct: bool,
	pub columns: Vec<BoundColumn>,
}

impl BoundSelect {
	/// A grouped select runs through a GroupAggregate; its output
	/// expressions reference group keys and aggregate results.
	pub fn is_grouped(&self) -> bool {
		!self.group_by.is_empty() || !self.aggregates.is_empty()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundSource {
	pub alias: String,
	pub input: BoundSourceInput,
	pub fields: IndexMap<String, FieldType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundSourceInput {
	Collection(String),
	Derived(Box<BoundQuery>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundFrom {
	Source(usize),
	Join {
		left: Box<BoundFrom>,
		right: Box<BoundFrom>,
		join_type: JoinType,
		on: Option<BoundExpr>,
		fragment: Fragment,
	},
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundColumn {
	pub name: String,
	pub expr: BoundExpr,
	pub ty: FieldType,
}

/// Resolve and type a parsed query against the catalog.
pub fn bind(query: &AstQuery, catalog: &Catalog) -> crate::Result<BoundQuery> {
	bind_query(query, catalog)
}

fn bind_query(query: &AstQuery, catalog: &Catalog) -> crate::Result<BoundQuery> {
	let mut binder = SelectBinder::new(catalog);
	let select = binder.bind_select(&query.select)?;

	let mut unions = Vec::with_capacity(query.unions.len());
	for branch in &query.unions {
		let bound = SelectBinder::new(catalog).bind_select(&branch.select)?;
		check_union_compatible(&select, &bound, &branch.fragment)?;
		unions.push(BoundUnion {
			all: branch.all,
			select: bound,
			fragment: branch.fragment.clone(),
		});
	}

	let order_by = binder.bind_order_by(&query.order_by, &select, !unions.is_empty())?;
	let limit = query.limit.as_ref().map(|l| BoundLimit {
		limit: l.limit,
		offset: l.offset,
	});

	Ok(BoundQuery {
		select,
		unions,
		order_by,
		limit,
	})
}

fn check_union_compatible(left: &BoundSelect, right: &BoundSelect, fragment: &Fragment) -> crate::Result<()> {
	if left.columns.len() != right.columns.len() {
		return err!(bind::union_schema_mismatch(
			format!("one branch has {} columns, the other {}", left.columns.len(), right.columns.len()),
			fragment.clone(),
		));
	}
	for (a, b) in left.columns.iter().zip(&right.columns) {
		if a.name != b.name {
			return err!(bind::union_schema_mismatch(
				format!("column `{}` does not line up with `{}`", a.name, b.name),
				fragment.clone(),
			));
		}
		if !promote::comparable(&a.ty, &b.ty) {
			return err!(bind::union_schema_mismatch(
				format!("column `{}` has type `{}` in one branch and `{}` in the other", a.name, a.ty, b.ty),
				fragment.clone(),
			));
		}
	}
	Ok(())
}

/// Aggregate placement policy for the clause being bound.
#[derive(Clone, Copy)]
struct ExprCtx<'c> {
	clause: &'c str,
	aggregates_allowed: bool,
	in_aggregate: bool,
}

impl<'c> ExprCtx<'c> {
	fn scalar(clause: &'c str) -> Self {
		Self {
			clause,
			aggregates_allowed: false,
			in_aggregate: false,
		}
	}

	fn with_aggregates(clause: &'c str) -> Self {
		Self {
			clause,
			aggregates_allowed: true,
			in_aggregate: false,
		}
	}

	fn inside_aggregate(self) -> Self {
		Self {
			in_aggregate: true,
			..self
		}
	}
}

struct SelectBinder<'a> {
	catalog: &'a Catalog,
	scope: Scope,
	sources: Vec<BoundSource>,
	aggregates: Vec<BoundAggregate>,
}

impl<'a> SelectBinder<'a> {
	fn new(catalog: &'a Catalog) -> Self {
		Self {
			catalog,
			scope: Scope {
				sources: Vec::new(),
			},
			sources: Vec::new(),
			aggregates: Vec::new(),
		}
	}

	fn bind_select(&mut self, select: &AstSelect) -> crate::Result<BoundSelect> {
		let Some(from_ast) = &select.from else {
			return err!(bind::select_without_from(select.fragment.clone()));
		};

		// Sources first, then the scope, then the ON predicates which
		// see the full scope
		let skeleton = self.collect_sources(from_ast)?;
		self.scope = Scope {
			sources: self
				.sources
				.iter()
				.map(|s| ScopeSource {
					alias: s.alias.clone(),
					fields: s.fields.clone(),
				})
				.collect(),
		};
		let from = self.bind_from(skeleton)?;

		let filter = match &select.filter {
			Some(expr) => Some(self.bind_condition(expr, "WHERE")?),
			None => None,
		};

		let mut group_by = Vec::with_capacity(select.group_by.len());
		for key in &select.group_by {
			group_by.push(self.bind_expr(key, ExprCtx::scalar("GROUP BY"))?);
		}

		let mut columns = Vec::new();
		for (position, item) in select.items.iter().enumerate() {
			match item {
				AstSelectItem::Wildcard(_) => columns.extend(self.expand_wildcard()),
				AstSelectItem::Expr {
					expr,
					alias,
				} => {
					let bound = self.bind_expr(expr, ExprCtx::with_aggregates("the select list"))?;
					let name = match alias {
						Some(alias) => alias.name.clone(),
						None => default_column_name(expr, position),
					};
					let ty = bound.ty();
					columns.push(BoundColumn {
						name,
						expr: bound,
						ty,
					});
				}
			}
		}

		let having = match &select.having {
			Some(expr) => {
				let bound = self.bind_expr(expr, ExprCtx::with_aggregates("HAVING"))?;
				self.require_boolean(&bound, "HAVING", expr.fragment())?;
				Some(bound)
			}
			None => None,
		};

		let grouped = !group_by.is_empty() || !self.aggregates.is_empty() || having.is_some();
		let (columns, having) = if grouped {
			let mut grouped_columns = Vec::with_capacity(columns.len());
			for column in columns {
				grouped_columns.push(BoundColumn {
					expr: apply_grouping(column.expr, &group_by)?,
					..column
				});
			}
			let having = match having {
				Some(expr) => Some(apply_grouping(expr, &group_by)?),
				None => None,
			};
			(grouped_columns, having)
		} else {
			(columns, having)
		};

		check_duplicate_columns(&columns, &select.fragment)?;

		Ok(BoundSelect {
			sources: self.sources.clone(),
			from,
			filter,
			group_by,
			aggregates: self.aggregates.clone(),
			having,
			distinct: select.distinct,
			columns,
		})
	}

	fn collect_sources<'t>(&mut self, table: &'t AstTableRef) -> crate::Result<FromSkeleton<'t>> {
		match table {
			AstTableRef::Collection {
				name,
				alias,
			} => {
				let Some(collection) = self.catalog.collection(&name.name) else {
					return err!(bind::collection_not_found(name.fragment.clone()));
				};
				let (alias_name, alias_fragment) = match alias {
					Some(alias) => (alias.name.clone(), &alias.fragment),
					None => (name.name.clone(), &name.fragment),
				};
				let index = self.push_source(
					BoundSource {
						alias: alias_name,
						input: BoundSourceInput::Collection(name.name.clone()),
						fields: collection.fields().clone(),
					},
					alias_fragment,
				)?;
				Ok(FromSkeleton::Source(index))
			}
			AstTableRef::Derived {
				query,
				alias,
				..
			} => {
				let bound = bind_query(query, self.catalog)?;
				let fields = bound
					.select
					.columns
					.iter()
					.map(|c| (c.name.clone(), c.ty.clone()))
					.collect::<IndexMap<_, _>>();
				let index = self.push_source(
					BoundSource {
						alias: alias.name.clone(),
						input: BoundSourceInput::Derived(Box::new(bound)),
						fields,
					},
					&alias.fragment,
				)?;
				Ok(FromSkeleton::Source(index))
			}
			AstTableRef::Join {
				left,
				right,
				join_type,
				on,
				fragment,
			} => {
				let left = self.collect_sources(left)?;
				let right = self.collect_sources(right)?;
				Ok(FromSkeleton::Join {
					left: Box::new(left),
					right: Box::new(right),
					join_type: *join_type,
					on: on.as_ref(),
					fragment,
				})
			}
		}
	}

	fn push_source(&mut self, source: BoundSource, fragment: &Fragment) -> crate::Result<usize> {
		if self.sources.iter().any(|s| s.alias == source.alias) {
			return err!(bind::duplicate_source_alias(fragment.clone()));
		}
		self.sources.push(source);
		Ok(self.sources.len() - 1)
	}

	fn bind_from(&mut self, skeleton: FromSkeleton<'_>) -> crate::Result<BoundFrom> {
		match skeleton {
			FromSkeleton::Source(index) => Ok(BoundFrom::Source(index)),
			FromSkeleton::Join {
				left,
				right,
				join_type,
				on,
				fragment,
			} => {
				let left = self.bind_from(*left)?;
				let right = self.bind_from(*right)?;
				let on = match on {
					Some(expr) => Some(self.bind_condition(expr, "ON")?),
					None => None,
				};
				Ok(BoundFrom::Join {
					left: Box::new(left),
					right: Box::new(right),
					join_type,
					on,
					fragment: fragment.clone(),
				})
			}
		}
	}

	fn bind_condition(&mut self, expr: &AstExpr, clause: &str) -> crate::Result<BoundExpr> {
		let bound = self.bind_expr(expr, ExprCtx::scalar(clause))?;
		self.require_boolean(&bound, clause, expr.fragment())?;
		Ok(bound)
	}

	fn require_boolean(&self, bound: &BoundExpr, clause: &str, fragment: &Fragment) -> crate::Result<()> {
		let ty = bound.ty();
		if promote::boolean_compatible(&ty) {
			Ok(())
		} else {
			err!(bind::expected_type(clause, "a boolean condition", &ty.to_string(), fragment.clone()))
		}
	}

	fn expand_wildcard(&self) -> Vec<BoundColumn> {
		let single = self.sources.len() == 1;
		let mut counts: IndexMap<&str, usize> = IndexMap::new();
		for source in &self.sources {
			for name in source.fields.keys() {
				*counts.entry(name.as_str()).or_default() += 1;
			}
		}

		let mut columns = Vec::new();
		for (index, source) in self.sources.iter().enumerate() {
			for (name, ty) in &source.fields {
				let output = if single || counts[name.as_str()] == 1 {
					name.clone()
				} else {
					format!("{}_{}", source.alias, name)
				};
				columns.push(BoundColumn {
					name: output,
					expr: BoundExpr::FieldRef {
						source: index,
						path: vec![name.clone()],
						ty: ty.clone(),
						fragment: Fragment::None,
					},
					ty: ty.clone(),
				});
			}
		}
		columns
	}

	fn bind_order_by(
		&mut self,
		specs: &[AstOrderSpec],
		select: &BoundSelect,
		has_unions: bool,
	) -> crate::Result<Vec<BoundSortKey>> {
		let mut keys = Vec::with_capacity(specs.len());
		for spec in specs {
			// An output column name always wins
			if let AstExpr::Column {
				path,
			} = &spec.expr
			{
				if path.len() == 1 {
					if let Some(column) = select.columns.iter().position(|c| c.name == path[0].name) {
						keys.push(BoundSortKey {
							column,
							descending: spec.descending,
						});
						continue;
					}
				}
			}
			// After a UNION only output column names can be sorted on
			if has_unions {
				return err!(bind::order_by_not_in_select(spec.expr.fragment().clone()));
			}
			let bound = self.bind_expr(&spec.expr, ExprCtx::with_aggregates("ORDER BY"))?;
			let bound = if select.is_grouped() {
				apply_grouping(bound, &select.group_by)?
			} else {
				bound
			};
			let Some(column) = select.columns.iter().position(|c| same_expr(&c.expr, &bound)) else {
				return err!(bind::order_by_not_in_select(spec.expr.fragment().clone()));
			};
			keys.push(BoundSortKey {
				column,
				descending: spec.descending,
			});
		}
		Ok(keys)
	}

	fn bind_expr(&mut self, expr: &AstExpr, ctx: ExprCtx<'_>) -> crate::Result<BoundExpr> {
		match expr {
			AstExpr::Literal {
				value,
				..
			} => Ok(BoundExpr::Literal(value.clone())),
			AstExpr::Column {
				path,
			} => self.scope.resolve(path),
			AstExpr::Star(fragment) => err!(ast::expected_expression(fragment.clone())),
			AstExpr::Unary {
				op,
				expr: operand,
				fragment,
			} => self.bind_unary(*op, operand, fragment, ctx),
			AstExpr::Binary {
				op,
				left,
				right,
				fragment,
			} => self.bind_binary(*op, left, right, fragment, ctx),
			AstExpr::Between {
				expr: operand,
				low,
				high,
				negated,
				fragment,
			} => {
				let operand = self.bind_expr(operand, ctx)?;
				let low = self.bind_expr(low, ctx)?;
				let high = self.bind_expr(high, ctx)?;
				for bound in [&low, &high] {
					if !promote::comparable(&operand.ty(), &bound.ty()) {
						return err!(bind::incompatible_types(
							"BETWEEN",
							&operand.ty().to_string(),
							&bound.ty().to_string(),
							fragment.clone(),
						));
					}
				}
				Ok(BoundExpr::Between {
					expr: Box::new(operand),
					low: Box::new(low),
					high: Box::new(high),
					negated: *negated,
				})
			}
			AstExpr::InList {
				expr: operand,
				list,
				negated,
				fragment,
			} => {
				let operand = self.bind_expr(operand, ctx)?;
				let mut bound_list = Vec::with_capacity(list.len());
				for element in list {
					let bound = self.bind_expr(element, ctx)?;
					if !promote::comparable(&operand.ty(), &bound.ty()) {
						return err!(bind::incompatible_types(
							"IN",
							&operand.ty().to_string(),
							&bound.ty().to_string(),
							fragment.clone(),
						));
					}
					bound_list.push(bound);
				}
				Ok(BoundExpr::InList {
					expr: Box::new(operand),
					list: bound_list,
					negated: *negated,
				})
			}
			AstExpr::Like {
				expr: operand,
				pattern,
				negated,
				..
			} => {
				let bound_operand = self.bind_expr(operand, ctx)?;
				let bound_pattern = self.bind_expr(pattern, ctx)?;
				for (bound, source) in [(&bound_operand, &**operand), (&bound_pattern, &**pattern)] {
					let ty = bound.ty();
					if !matches!(ty, FieldType::Utf8 | FieldType::Any) {
						return err!(bind::expected_type(
							"LIKE",
							"strings",
							&ty.to_string(),
							source.fragment().clone(),
						));
					}
				}
				Ok(BoundExpr::Like {
					expr: Box::new(bound_operand),
					pattern: Box::new(bound_pattern),
					negated: *negated,
				})
			}
			AstExpr::IsNull {
				expr: operand,
				negated,
				..
			} => Ok(BoundExpr::IsNull {
				expr: Box::new(self.bind_expr(operand, ctx)?),
				negated: *negated,
			}),
			AstExpr::Function {
				name,
				args,
			} => self.bind_function(name, args, ctx),
			AstExpr::Window {
				name,
				args,
				partition_by,
				order_by,
			} => {
				// Resolution errors inside the window still surface
				// even though lowering will reject the call itself
				for arg in args.iter().chain(partition_by) {
					if !matches!(arg, AstExpr::Star(_)) {
						self.bind_expr(arg, ctx)?;
					}
				}
				for spec in order_by {
					self.bind_expr(&spec.expr, ctx)?;
				}
				Ok(BoundExpr::Window {
					name: name.name.clone(),
					fragment: name.fragment.clone(),
				})
			}
			AstExpr::Case {
				operand,
				branches,
				else_expr,
				fragment,
			} => self.bind_case(operand.as_deref(), branches, else_expr.as_deref(), fragment, ctx),
			AstExpr::Cast {
				expr: operand,
				target,
				fragment,
			} => {
				let bound = self.bind_expr(operand, ctx)?;
				let from = bound.ty();
				if !promote::castable(&from, target) {
					return err!(bind::invalid_cast(
						&from.to_string(),
						&target.to_string(),
						fragment.clone()
					));
				}
				Ok(BoundExpr::Cast {
					expr: Box::new(bound),
					target: target.clone(),
				})
			}
		}
	}

	fn bind_unary(
		&mut self,
		op: UnaryOperator,
		operand: &AstExpr,
		fragment: &Fragment,
		ctx: ExprCtx<'_>,
	) -> crate::Result<BoundExpr> {
		let bound = self.bind_expr(operand, ctx)?;
		let ty = bound.ty();
		let result = match op {
			UnaryOperator::Negate => {
				if !ty.is_numeric() {
					return err!(bind::expected_type(
						"unary `-`",
						"a number",
						&ty.to_string(),
						fragment.clone()
					));
				}
				ty
			}
			UnaryOperator::Not => {
				if !promote::boolean_compatible(&ty) {
					return err!(bind::expected_type(
						"NOT",
						"a boolean operand",
						&ty.to_string(),
						fragment.clone()
					));
				}
				FieldType::Boolean
			}
		};
		Ok(BoundExpr::Unary {
			op,
			expr: Box::new(bound),
			ty: result,
		})
	}

	fn bind_binary(
		&mut self,
		op: BinaryOperator,
		left: &AstExpr,
		right: &AstExpr,
		fragment: &Fragment,
		ctx: ExprCtx<'_>,
	) -> crate::Result<BoundExpr> {
		let bound_left = self.bind_expr(left, ctx)?;
		let bound_right = self.bind_expr(right, ctx)?;
		let (lty, rty) = (bound_left.ty(), bound_right.ty());

		let ty = match op {
			BinaryOperator::Add
			| BinaryOperator::Subtract
			| BinaryOperator::Multiply
			| BinaryOperator::Divide
			| BinaryOperator::Modulo => match promote::arithmetic_result(&lty, &rty) {
				Some(ty) => ty,
				None => {
					return err!(bind::incompatible_types(
						op.as_str(),
						&lty.to_string(),
						&rty.to_string(),
						fragment.clone(),
					));
				}
			},
			BinaryOperator::Concat => {
				for (ty, side) in [(&lty, left), (&rty, right)] {
					if !matches!(ty, FieldType::Utf8 | FieldType::Any) {
						return err!(bind::expected_type(
							"||",
							"strings",
							&ty.to_string(),
							side.fragment().clone(),
						));
					}
				}
				FieldType::Utf8
			}
			BinaryOperator::And | BinaryOperator::Or => {
				for (ty, side) in [(&lty, left), (&rty, right)] {
					if !promote::boolean_compatible(ty) {
						return err!(bind::expected_type(
							op.as_str(),
							"a boolean operand",
							&ty.to_string(),
							side.fragment().clone(),
						));
					}
				}
				FieldType::Boolean
			}
			_ => {
				// Comparison operators
				if !promote::comparable(&lty, &rty) {
					return err!(bind::incompatible_types(
						op.as_str(),
						&lty.to_string(),
						&rty.to_string(),
						fragment.clone(),
					));
				}
				FieldType::Boolean
			}
		};

		Ok(BoundExpr::Binary {
			op,
			left: Box::new(bound_left),
			right: Box::new(bound_right),
			ty,
		})
	}

	fn bind_function(
		&mut self,
		name: &crate::ast::Identifier,
		args: &[AstExpr],
		ctx: ExprCtx<'_>,
	) -> crate::Result<BoundExpr> {
		if let Some(function) = AggregateFunction::from_name(&name.name) {
			return self.bind_aggregate(function, name, args, ctx);
		}
		let Some(function) = ScalarFunction::from_name(&name.name) else {
			return err!(bind::unknown_function(name.fragment.clone()));
		};

		let mut bound_args = Vec::with_capacity(args.len());
		for arg in args {
			bound_args.push(self.bind_expr(arg, ctx)?);
		}

		let ty = match function {
			ScalarFunction::Upper | ScalarFunction::Lower => {
				self.check_arg_count(function.as_str(), "1", args, 1, &name.fragment)?;
				let ty = bound_args[0].ty();
				if !matches!(ty, FieldType::Utf8 | FieldType::Any) {
					return err!(bind::expected_type(
						function.as_str(),
						"a string argument",
						&ty.to_string(),
						args[0].fragment().clone(),
					));
				}
				FieldType::Utf8
			}
			ScalarFunction::Abs => {
				self.check_arg_count(function.as_str(), "1", args, 1, &name.fragment)?;
				let ty = bound_args[0].ty();
				if !ty.is_numeric() {
					return err!(bind::expected_type(
						function.as_str(),
						"a numeric argument",
						&ty.to_string(),
						args[0].fragment().clone(),
					));
				}
				ty
			}
			ScalarFunction::Coalesce => {
				if args.is_empty() {
					return err!(bind::wrong_argument_count(
						function.as_str(),
						"at least 1",
						0,
						name.fragment.clone(),
					));
				}
				let mut unified = FieldType::Any;
				for (bound, source) in bound_args.iter().zip(args) {
					let ty = bound.ty();
					if unified.is_any() {
						unified = ty;
					} else if ty.is_any() || unified == ty {
						// Keeps the already unified type
					} else if unified.is_numeric() && ty.is_numeric() {
						unified = FieldType::Float;
					} else {
						return err!(bind::incompatible_types(
							function.as_str(),
							&unified.to_string(),
							&ty.to_string(),
							source.fragment().clone(),
						));
					}
				}
				unified
			}
		};

		Ok(BoundExpr::Call {
			function,
			args: bound_args,
			ty,
		})
	}

	fn bind_aggregate(
		&mut self,
		function: AggregateFunction,
		name: &crate::ast::Identifier,
		args: &[AstExpr],
		ctx: ExprCtx<'_>,
	) -> crate::Result<BoundExpr> {
		if ctx.in_aggregate {
			return err!(bind::nested_aggregate(name.fragment.clone()));
		}
		if !ctx.aggregates_allowed {
			return err!(bind::aggregate_not_allowed(ctx.clause, name.fragment.clone()));
		}
		self.check_arg_count(function.as_str(), "1", args, 1, &name.fragment)?;

		let arg = match &args[0] {
			AstExpr::Star(fragment) => {
				if function != AggregateFunction::Count {
					return err!(bind::expected_type(
						function.as_str(),
						"an expression argument",
						"*",
						fragment.clone(),
					));
				}
				None
			}
			expr => Some(self.bind_expr(expr, ctx.inside_aggregate())?),
		};

		let ty = match function {
			AggregateFunction::Count => FieldType::Int,
			AggregateFunction::Sum => {
				let ty = arg.as_ref().map(BoundExpr::ty).unwrap_or(FieldType::Any);
				if !ty.is_numeric() {
					return err!(bind::expected_type(
						function.as_str(),
						"a numeric argument",
						&ty.to_string(),
						args[0].fragment().clone(),
					));
				}
				ty
			}
			AggregateFunction::Avg => {
				let ty = arg.as_ref().map(BoundExpr::ty).unwrap_or(FieldType::Any);
				if !ty.is_numeric() {
					return err!(bind::expected_type(
						function.as_str(),
						"a numeric argument",
						&ty.to_string(),
						args[0].fragment().clone(),
					));
				}
				FieldType::Float
			}
			AggregateFunction::Min | AggregateFunction::Max => {
				let ty = arg.as_ref().map(BoundExpr::ty).unwrap_or(FieldType::Any);
				if !ty.is_numeric() && !matches!(ty, FieldType::Utf8) {
					return err!(bind::expected_type(
						function.as_str(),
						"a numeric or string argument",
						&ty.to_string(),
						args[0].fragment().clone(),
					));
				}
				ty
			}
		};

		// Identical aggregate calls share one accumulator
		let existing = self.aggregates.iter().position(|a| {
			a.function == function
				&& match (&a.arg, &arg) {
					(None, None) => true,
					(Some(x), Some(y)) => same_expr(x, y),
					_ => false,
				}
		});
		let index = match existing {
			Some(index) => index,
			None => {
				self.aggregates.push(BoundAggregate {
					function,
					arg,
					ty: ty.clone(),
					fragment: name.fragment.clone(),
				});
				self.aggregates.len() - 1
			}
		};

		Ok(BoundExpr::AggregateRef {
			index,
			ty,
		})
	}

	fn check_arg_count(
		&self,
		function: &str,
		expected: &str,
		args: &[AstExpr],
		count: usize,
		fragment: &Fragment,
	) -> crate::Result<()> {
		if args.len() == count {
			Ok(())
		} else {
			err!(bind::wrong_argument_count(function, expected, args.len(), fragment.clone()))
		}
	}

	fn bind_case(
		&mut self,
		operand: Option<&AstExpr>,
		branches: &[(AstExpr, AstExpr)],
		else_expr: Option<&AstExpr>,
		fragment: &Fragment,
		ctx: ExprCtx<'_>,
	) -> crate::Result<BoundExpr> {
		let bound_operand = match operand {
			Some(expr) => Some(Box::new(self.bind_expr(expr, ctx)?)),
			None => None,
		};

		let mut bound_branches = Vec::with_capacity(branches.len());
		let mut result_ty: Option<FieldType> = None;
		for (guard, result) in branches {
			let bound_guard = self.bind_expr(guard, ctx)?;
			match &bound_operand {
				Some(operand_expr) => {
					if !promote::comparable(&operand_expr.ty(), &bound_guard.ty()) {
						return err!(bind::incompatible_types(
							"CASE",
							&operand_expr.ty().to_string(),
							&bound_guard.ty().to_string(),
							guard.fragment().clone(),
						));
					}
				}
				None => {
					if !promote::boolean_compatible(&bound_guard.ty()) {
						return err!(bind::expected_type(
							"CASE WHEN",
							"a boolean condition",
							&bound_guard.ty().to_string(),
							guard.fragment().clone(),
						));
					}
				}
			}
			let bound_result = self.bind_expr(result, ctx)?;
			result_ty = Some(unify_case_type(result_ty, bound_result.ty(), result.fragment())?);
			bound_branches.push((bound_guard, bound_result));
		}

		let bound_else = match else_expr {
			Some(expr) => {
				let bound = self.bind_expr(expr, ctx)?;
				result_ty = Some(unify_case_type(result_ty, bound.ty(), expr.fragment())?);
				Some(Box::new(bound))
			}
			None => None,
		};

		let ty = match result_ty {
			Some(ty) => ty,
			None => return Err(docsql_type::internal_error!("CASE without branches at {}", fragment)),
		};
		Ok(BoundExpr::Case {
			operand: bound_operand,
			branches: bound_branches,
			else_expr: bound_else,
			ty,
		})
	}
}

fn unify_case_type(current: Option<FieldType>, next: FieldType, fragment: &Fragment) -> crate::Result<FieldType> {
	let Some(current) = current else {
		return Ok(next);
	};
	if current == next || next.is_any() {
		Ok(current)
	} else if current.is_any() {
		Ok(next)
	} else if current.is_numeric() && next.is_numeric() {
		Ok(FieldType::Float)
	} else {
		err!(bind::incompatible_types("CASE branches", &current.to_string(), &next.to_string(), fragment.clone()))
	}
}

enum FromSkeleton<'t> {
	Source(usize),
	Join {
		left: Box<FromSkeleton<'t>>,
		right: Box<FromSkeleton<'t>>,
		join_type: JoinType,
		on: Option<&'t AstExpr>,
		fragment: &'t Fragment,
	},
}

fn default_column_name(expr: &AstExpr, position: usize) -> String {
	match expr {
		AstExpr::Column {
			path,
		} => path.last().map(|p| p.name.clone()).unwrap_or_else(|| format!("_{}", position + 1)),
		_ => format!("_{}", position + 1),
	}
}

fn check_duplicate_columns(columns: &[BoundColumn], fragment: &Fragment) -> crate::Result<()> {
	for (index, column) in columns.iter().enumerate() {
		if columns[..index].iter().any(|c| c.name == column.name) {
			return err!(bind::duplicate_output_column(&column.name, fragment.clone()));
		}
	}
	Ok(())
}

/// In a grouped select, replace subtrees that match a grouping key with
/// key references and reject any remaining bare field reference.
fn apply_grouping(expr: BoundExpr, keys: &[BoundExpr]) -> crate::Result<BoundExpr> {
	if let Some(index) = keys.iter().position(|key| same_expr(key, &expr)) {
		let ty = expr.ty();
		return Ok(BoundExpr::GroupKeyRef {
			index,
			ty,
		});
	}

	Ok(match expr {
		BoundExpr::FieldRef {
			fragment,
			..
		} => return err!(bind::column_not_grouped(fragment)),
		BoundExpr::Unary {
			op,
			expr,
			ty,
		} => BoundExpr::Unary {
			op,
			expr: Box::new(apply_grouping(*expr, keys)?),
			ty,
		},
		BoundExpr::Binary {
			op,
			left,
			right,
			ty,
		} => BoundExpr::Binary {
			op,
			left: Box::new(apply_grouping(*left, keys)?),
			right: Box::new(apply_grouping(*right, keys)?),
			ty,
		},
		BoundExpr::Between {
			expr,
			low,
			high,
			negated,
		} => BoundExpr::Between {
			expr: Box::new(apply_grouping(*expr, keys)?),
			low: Box::new(apply_grouping(*low, keys)?),
			high: Box::new(apply_grouping(*high, keys)?),
			negated,
		},
		BoundExpr::InList {
			expr,
			list,
			negated,
		} => BoundExpr::InList {
			expr: Box::new(apply_grouping(*expr, keys)?),
			list: list.into_iter().map(|e| apply_grouping(e, keys)).collect::<crate::Result<_>>()?,
			negated,
		},
		BoundExpr::Like {
			expr,
			pattern,
			negated,
		} => BoundExpr::Like {
			expr: Box::new(apply_grouping(*expr, keys)?),
			pattern: Box::new(apply_grouping(*pattern, keys)?),
			negated,
		},
		BoundExpr::IsNull {
			expr,
			negated,
		} => BoundExpr::IsNull {
			expr: Box::new(apply_grouping(*expr, keys)?),
			negated,
		},
		BoundExpr::Call {
			function,
			args,
			ty,
		} => BoundExpr::Call {
			function,
			args: args.into_iter().map(|e| apply_grouping(e, keys)).collect::<crate::Result<_>>()?,
			ty,
		},
		BoundExpr::Case {
			operand,
			branches,
			else_expr,
			ty,
		} => BoundExpr::Case {
			operand: match operand {
				Some(expr) => Some(Box::new(apply_grouping(*expr, keys)?)),
				None => None,
			},
			branches: branches
				.into_iter()
				.map(|(guard, result)| Ok((apply_grouping(guard, keys)?, apply_grouping(result, keys)?)))
				.collect::<crate::Result<_>>()?,
			else_expr: match else_expr {
				Some(expr) => Some(Box::new(apply_grouping(*expr, keys)?)),
				None => None,
			},
			ty,
		},
		BoundExpr::Cast {
			expr,
			target,
		} => BoundExpr::Cast {
			expr: Box::new(apply_grouping(*expr, keys)?),
			target,
		},
		passthrough @ (BoundExpr::Literal(_)
		| BoundExpr::GroupKeyRef {
			..
		}
		| BoundExpr::AggregateRef {
			..
		}
		| BoundExpr::Window {
			..
		}) => passthrough,
	})
}
