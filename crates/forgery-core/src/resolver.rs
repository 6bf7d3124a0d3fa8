//! On-demand field resolution.
//!
//! Fields are evaluated in first-touch order: assembly walks the output
//! fields in declaration order, and a lazy resolver may pull any other field
//! (output or transient) through [`FieldContext::get`] before assembly reaches
//! it. Declaration order only fixes the key order of the assembled record.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::context::{Begin, BuildContext, Evaluation, FieldContext};
use crate::error::{FactoryError, FactoryResult};
use crate::spec::ResolverFn;
use crate::value::Record;

/// Resolves `field` within `ctx`, evaluating its spec at most once.
///
/// `waiter` is the field whose resolver is asking; assembly passes `None`.
pub(crate) fn resolve_field(
	ctx: Arc<BuildContext>,
	waiter: Option<String>,
	field: String,
) -> BoxFuture<'static, FactoryResult<Option<Value>>> {
	async move {
		let (evaluation, _guard) = match ctx.begin(waiter.as_deref(), &field)? {
			Begin::Cached(value) => {
				tracing::trace!(factory = ctx.factory(), seq = ctx.seq(), field = %field, "cache hit");
				return Ok(value);
			}
			Begin::Literal(value) => {
				tracing::trace!(factory = ctx.factory(), seq = ctx.seq(), field = %field, "literal");
				return Ok(value);
			}
			Begin::Wait { evaluation, guard } => (evaluation, guard),
		};

		evaluation.await
	}
	.boxed()
}

/// Runs a lazy resolver once and caches its outcome.
pub(crate) fn evaluate(ctx: Arc<BuildContext>, field: String, resolver: ResolverFn) -> Evaluation {
	async move {
		tracing::trace!(factory = ctx.factory(), seq = ctx.seq(), field = %field, "evaluating resolver");
		let field_ctx = FieldContext::new(Arc::clone(&ctx), field.clone());
		let result = resolver(field_ctx)
			.await
			.map_err(|e| FactoryError::from_resolver(&field, e));
		ctx.complete(&field, &result);
		result
	}
	.boxed()
}

/// Resolves every output field and assembles the record.
///
/// Any failure recorded during the build aborts it, even one a resolver
/// caught; the first recorded failure is returned and no partial record.
pub(crate) async fn assemble<'a, I>(ctx: Arc<BuildContext>, fields: I) -> FactoryResult<Record>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut record = Record::new();
	for field in fields {
		match resolve_field(Arc::clone(&ctx), None, field.to_string()).await {
			Ok(value) => {
				record.insert(field, value);
			}
			Err(error) => return Err(ctx.first_failure().unwrap_or(error)),
		}
	}
	match ctx.first_failure() {
		Some(error) => Err(error),
		None => Ok(record),
	}
}
