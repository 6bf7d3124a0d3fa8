//! Field specifications.
//!
//! A [`FieldSpec`] says how one field's value is produced: either a literal
//! (possibly undefined) or a lazy resolver evaluated against the build's
//! [`FieldContext`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::context::FieldContext;
use crate::value::IntoFieldValue;

/// Type-erased lazy resolver.
pub type ResolverFn =
	Arc<dyn Fn(FieldContext) -> BoxFuture<'static, anyhow::Result<Option<Value>>> + Send + Sync>;

/// How a single field's value is produced.
#[derive(Clone)]
pub enum FieldSpec {
	/// A fixed value. `None` is the undefined literal.
	Literal(Option<Value>),
	/// A resolver invoked at most once per build.
	Lazy(ResolverFn),
}

impl FieldSpec {
	/// Literal spec.
	pub fn value(value: impl IntoFieldValue) -> Self {
		Self::Literal(value.into_field_value())
	}

	/// The undefined literal.
	pub fn undefined() -> Self {
		Self::Literal(None)
	}

	/// Lazy spec backed by an async resolver.
	///
	/// # Example
	///
	/// ```
	/// use forgery_core::FieldSpec;
	///
	/// let full_name = FieldSpec::lazy(|ctx| async move {
	/// 	let first = ctx.get("firstName").await?;
	/// 	let last = ctx.get("lastName").await?;
	/// 	Ok(format!(
	/// 		"{} {}",
	/// 		first.and_then(|v| v.as_str().map(String::from)).unwrap_or_default(),
	/// 		last.and_then(|v| v.as_str().map(String::from)).unwrap_or_default(),
	/// 	))
	/// });
	/// assert!(full_name.is_lazy());
	/// ```
	pub fn lazy<F, Fut, T>(resolver: F) -> Self
	where
		F: Fn(FieldContext) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
		T: IntoFieldValue,
	{
		Self::Lazy(Arc::new(move |ctx| {
			resolver(ctx)
				.map(|result| result.map(IntoFieldValue::into_field_value))
				.boxed()
		}))
	}

	/// Lazy spec computed synchronously from the sequence number.
	pub fn sequence<F, T>(f: F) -> Self
	where
		F: Fn(u64) -> T + Send + Sync + 'static,
		T: IntoFieldValue,
	{
		let f = Arc::new(f);
		Self::Lazy(Arc::new(move |ctx| {
			let value = f(ctx.seq()).into_field_value();
			futures::future::ready(Ok(value)).boxed()
		}))
	}

	/// Returns true for [`FieldSpec::Lazy`].
	pub fn is_lazy(&self) -> bool {
		matches!(self, Self::Lazy(_))
	}

	/// Returns the literal value, if this is a literal spec.
	pub fn as_literal(&self) -> Option<&Option<Value>> {
		match self {
			Self::Literal(value) => Some(value),
			Self::Lazy(_) => None,
		}
	}
}

impl fmt::Debug for FieldSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
			Self::Lazy(_) => f.write_str("Lazy(..)"),
		}
	}
}

impl From<Value> for FieldSpec {
	fn from(value: Value) -> Self {
		Self::Literal(Some(value))
	}
}

impl From<Option<Value>> for FieldSpec {
	fn from(value: Option<Value>) -> Self {
		Self::Literal(value)
	}
}

impl From<&str> for FieldSpec {
	fn from(value: &str) -> Self {
		Self::value(value)
	}
}

impl From<String> for FieldSpec {
	fn from(value: String) -> Self {
		Self::value(value)
	}
}

macro_rules! impl_from_scalar {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for FieldSpec {
				fn from(value: $ty) -> Self {
					Self::value(value)
				}
			}
		)*
	};
}

impl_from_scalar!(bool, i32, i64, u32, u64, usize, f64, Vec<Value>, Map<String, Value>);
