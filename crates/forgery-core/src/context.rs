//! Per-build resolution state.
//!
//! A `BuildContext` lives for exactly one build. It carries the sequence
//! number, the effective specs and the resolution cache. Resolvers only see
//! the narrower [`FieldContext`].
//!
//! A field being evaluated is cached as a weak handle to its shared
//! evaluation, so concurrent readers await one run of the resolver. Every
//! reader that waits on another field records a wait edge; a wait that would
//! close a loop of edges is a circular dependency.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared, WeakShared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ConfigurationError, FactoryError, FactoryResult};
use crate::resolver::{evaluate, resolve_field};
use crate::spec::FieldSpec;

/// One run of a lazy resolver, shared by every reader of the field.
pub(crate) type Evaluation = BoxFuture<'static, FactoryResult<Option<Value>>>;

/// Resolution state of one field within a build.
enum CacheEntry {
	/// Being evaluated; dead once every reader has been dropped.
	Pending(WeakShared<Evaluation>),
	/// Resolved; later reads return a clone.
	Resolved(Option<Value>),
	/// Resolution failed; later reads replay the error.
	Failed(FactoryError),
}

impl fmt::Debug for CacheEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pending(_) => f.write_str("Pending"),
			Self::Resolved(value) => f.debug_tuple("Resolved").field(value).finish(),
			Self::Failed(error) => f.debug_tuple("Failed").field(error).finish(),
		}
	}
}

#[derive(Debug, Default)]
struct ResolutionState {
	cache: HashMap<String, CacheEntry>,
	/// Fields each in-progress resolver is currently waiting on.
	waiting: HashMap<String, Vec<String>>,
	/// Failures in the order they were recorded.
	failures: Vec<FactoryError>,
}

impl ResolutionState {
	/// Chain of wait edges leading from `start` to `target`, both included.
	fn wait_path(&self, start: &str, target: &str) -> Option<Vec<String>> {
		let mut path = vec![start.to_string()];
		let mut seen = HashSet::new();
		self.reaches(start, target, &mut path, &mut seen).then_some(path)
	}

	fn reaches(
		&self,
		node: &str,
		target: &str,
		path: &mut Vec<String>,
		seen: &mut HashSet<String>,
	) -> bool {
		if node == target {
			return true;
		}
		if !seen.insert(node.to_string()) {
			return false;
		}
		for next in self.waiting.get(node).into_iter().flatten() {
			path.push(next.clone());
			if self.reaches(next, target, path, seen) {
				return true;
			}
			path.pop();
		}
		false
	}
}

/// Outcome of [`BuildContext::begin`].
pub(crate) enum Begin {
	/// Field was already resolved in this build.
	Cached(Option<Value>),
	/// Field is a literal; it is now cached.
	Literal(Option<Value>),
	/// Field is being evaluated; await the shared run.
	Wait {
		evaluation: Shared<Evaluation>,
		guard: Option<ResolutionGuard>,
	},
}

/// State of one `build` call.
#[derive(Debug)]
pub(crate) struct BuildContext {
	factory: String,
	seq: u64,
	specs: HashMap<String, FieldSpec>,
	state: Mutex<ResolutionState>,
}

impl BuildContext {
	pub(crate) fn new(factory: impl Into<String>, seq: u64, specs: HashMap<String, FieldSpec>) -> Self {
		Self {
			factory: factory.into(),
			seq,
			specs,
			state: Mutex::new(ResolutionState::default()),
		}
	}

	pub(crate) fn factory(&self) -> &str {
		&self.factory
	}

	pub(crate) fn seq(&self) -> u64 {
		self.seq
	}

	/// Looks up `field` on behalf of `waiter`, starting its evaluation on a miss.
	///
	/// `waiter` is the field whose resolver asked, or `None` for assembly.
	pub(crate) fn begin(self: &Arc<Self>, waiter: Option<&str>, field: &str) -> FactoryResult<Begin> {
		let spec = self.specs.get(field).ok_or_else(|| {
			FactoryError::from(ConfigurationError::UnknownField {
				factory: self.factory.clone(),
				field: field.to_string(),
			})
		})?;

		let mut state = self.state.lock();
		let in_flight = match state.cache.get(field) {
			Some(CacheEntry::Resolved(value)) => return Ok(Begin::Cached(value.clone())),
			Some(CacheEntry::Failed(error)) => return Err(error.clone()),
			Some(CacheEntry::Pending(weak)) => weak.upgrade(),
			None => None,
		};

		let evaluation = match in_flight {
			Some(evaluation) => {
				if let Some(path) = waiter.and_then(|waiter| state.wait_path(field, waiter)) {
					let error = FactoryError::CircularDependency {
						field: field.to_string(),
						path: format!("{} -> {}", path.join(" -> "), field),
					};
					state.failures.push(error.clone());
					// Unlock first: dropping the last handle drops the evaluation's guards.
					drop(state);
					drop(evaluation);
					return Err(error);
				}
				evaluation
			}
			None => match spec {
				FieldSpec::Literal(value) => {
					state
						.cache
						.insert(field.to_string(), CacheEntry::Resolved(value.clone()));
					return Ok(Begin::Literal(value.clone()));
				}
				FieldSpec::Lazy(resolver) => {
					let evaluation =
						evaluate(Arc::clone(self), field.to_string(), Arc::clone(resolver)).shared();
					if let Some(weak) = evaluation.downgrade() {
						state.cache.insert(field.to_string(), CacheEntry::Pending(weak));
					}
					evaluation
				}
			},
		};

		let guard = waiter.map(|waiter| {
			state
				.waiting
				.entry(waiter.to_string())
				.or_default()
				.push(field.to_string());
			ResolutionGuard {
				ctx: Arc::clone(self),
				waiter: waiter.to_string(),
				field: field.to_string(),
			}
		});
		Ok(Begin::Wait { evaluation, guard })
	}

	/// Caches the outcome of an evaluation.
	pub(crate) fn complete(&self, field: &str, result: &FactoryResult<Option<Value>>) {
		let mut state = self.state.lock();
		let entry = match result {
			Ok(value) => CacheEntry::Resolved(value.clone()),
			Err(error) => {
				state.failures.push(error.clone());
				CacheEntry::Failed(error.clone())
			}
		};
		state.cache.insert(field.to_string(), entry);
	}

	/// First failure recorded in this build, caught by a reader or not.
	pub(crate) fn first_failure(&self) -> Option<FactoryError> {
		self.state.lock().failures.first().cloned()
	}
}

/// RAII wait edge from one field's resolver to another field.
///
/// Dropping it removes the edge, whether the wait finished or was abandoned.
pub(crate) struct ResolutionGuard {
	ctx: Arc<BuildContext>,
	waiter: String,
	field: String,
}

impl Drop for ResolutionGuard {
	fn drop(&mut self) {
		let mut state = self.ctx.state.lock();
		if let Some(edges) = state.waiting.get_mut(&self.waiter) {
			if let Some(pos) = edges.iter().rposition(|f| *f == self.field) {
				edges.remove(pos);
			}
			if edges.is_empty() {
				state.waiting.remove(&self.waiter);
			}
		}
	}
}

/// What a lazy resolver receives.
///
/// Cheap to clone; every clone refers to the same build.
#[derive(Debug, Clone)]
pub struct FieldContext {
	build: Arc<BuildContext>,
	field: String,
}

impl FieldContext {
	pub(crate) fn new(build: Arc<BuildContext>, field: String) -> Self {
		Self { build, field }
	}

	/// Sequence number of the current build.
	pub fn seq(&self) -> u64 {
		self.build.seq()
	}

	/// Name of the field being resolved.
	pub fn field(&self) -> &str {
		&self.field
	}

	/// Name of the factory being built.
	pub fn factory(&self) -> &str {
		self.build.factory()
	}

	/// Resolves another field of the same build.
	///
	/// Each field is evaluated at most once per build; `None` means the field
	/// resolved to undefined. Several `get` calls may be awaited at once, and
	/// readers of a field that is still being evaluated share its result.
	///
	/// # Errors
	///
	/// Fails with [`FactoryError::CircularDependency`] if `field` is, directly
	/// or through other fields, waiting on the current one. Fails with a
	/// configuration error if the factory does not declare it, and with
	/// whatever error its own resolver produced.
	pub async fn get(&self, field: &str) -> FactoryResult<Option<Value>> {
		resolve_field(
			Arc::clone(&self.build),
			Some(self.field.clone()),
			field.to_string(),
		)
		.await
	}

	/// Resolves another field and deserializes it.
	pub async fn get_as<T: DeserializeOwned>(&self, field: &str) -> FactoryResult<Option<T>> {
		match self.get(field).await? {
			Some(value) => serde_json::from_value(value)
				.map(Some)
				.map_err(|e| FactoryError::Deserialize(format!("field '{}': {}", field, e))),
			None => Ok(None),
		}
	}
}
