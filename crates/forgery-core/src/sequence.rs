//! Sequence counters.
//!
//! Each factory definition owns a [`FactoryId`]; the [`SequenceRegistry`]
//! maps those ids to monotonic counters. Definitions share the process-wide
//! registry unless they are given their own, so [`reset_all_sequences`]
//! resets every default-bound factory in one step.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

static NEXT_FACTORY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide sequence registry.
static GLOBAL_SEQUENCES: Lazy<Arc<SequenceRegistry>> =
	Lazy::new(|| Arc::new(SequenceRegistry::new()));

/// Identity of a factory definition, used as the sequence counter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactoryId(u64);

impl FactoryId {
	/// Allocates a new, never reused id.
	pub fn next() -> Self {
		Self(NEXT_FACTORY_ID.fetch_add(1, Ordering::Relaxed))
	}

	/// Raw numeric value.
	pub fn as_u64(&self) -> u64 {
		self.0
	}
}

impl fmt::Display for FactoryId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "factory#{}", self.0)
	}
}

/// Table of per-factory sequence counters.
///
/// All operations take the same lock, so `next`, `reset` and `reset_all`
/// are atomic with respect to each other.
#[derive(Debug, Default)]
pub struct SequenceRegistry {
	counters: Mutex<HashMap<FactoryId, u64>>,
}

impl SequenceRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the process-wide registry.
	pub fn global() -> Arc<SequenceRegistry> {
		Arc::clone(&GLOBAL_SEQUENCES)
	}

	/// Returns the sequence number for the next build of `id` and advances the
	/// counter. The first call for an id yields 0.
	pub fn next(&self, id: FactoryId) -> u64 {
		let mut counters = self.counters.lock();
		let counter = counters.entry(id).or_insert(0);
		let seq = *counter;
		*counter += 1;
		seq
	}

	/// Reserves `count` consecutive sequence numbers for `id` in one step and
	/// returns the first.
	pub fn reserve(&self, id: FactoryId, count: u64) -> u64 {
		let mut counters = self.counters.lock();
		let counter = counters.entry(id).or_insert(0);
		let first = *counter;
		*counter += count;
		first
	}

	/// Returns the number the next build of `id` would receive, without advancing.
	pub fn peek(&self, id: FactoryId) -> u64 {
		self.counters.lock().get(&id).copied().unwrap_or(0)
	}

	/// Resets the counter of `id` to 0.
	pub fn reset(&self, id: FactoryId) {
		if let Some(counter) = self.counters.lock().get_mut(&id) {
			*counter = 0;
		}
		tracing::debug!(factory = %id, "sequence reset");
	}

	/// Resets every registered counter to 0.
	pub fn reset_all(&self) {
		let mut counters = self.counters.lock();
		for counter in counters.values_mut() {
			*counter = 0;
		}
		tracing::debug!(count = counters.len(), "all sequences reset");
	}

	/// Number of factories that have drawn at least one sequence number.
	pub fn len(&self) -> usize {
		self.counters.lock().len()
	}

	/// Returns true if no counter has been created yet.
	pub fn is_empty(&self) -> bool {
		self.counters.lock().is_empty()
	}
}

/// Advances the process-wide counter of `id`.
pub fn next_sequence(id: FactoryId) -> u64 {
	GLOBAL_SEQUENCES.next(id)
}

/// Resets the process-wide counter of `id`.
pub fn reset_sequence(id: FactoryId) {
	GLOBAL_SEQUENCES.reset(id);
}

/// Resets every process-wide counter.
pub fn reset_all_sequences() {
	GLOBAL_SEQUENCES.reset_all();
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_first_call_yields_zero() {
		let registry = SequenceRegistry::new();
		let id = FactoryId::next();

		assert_eq!(registry.next(id), 0);
		assert_eq!(registry.next(id), 1);
		assert_eq!(registry.next(id), 2);
		assert_eq!(registry.peek(id), 3);
	}

	#[rstest]
	fn test_reset_only_affects_one_factory() {
		let registry = SequenceRegistry::new();
		let a = FactoryId::next();
		let b = FactoryId::next();
		registry.next(a);
		registry.next(a);
		registry.next(b);

		registry.reset(a);

		assert_eq!(registry.next(a), 0);
		assert_eq!(registry.next(b), 1);
	}

	#[rstest]
	fn test_reset_all() {
		let registry = SequenceRegistry::new();
		let a = FactoryId::next();
		let b = FactoryId::next();
		registry.next(a);
		registry.next(b);
		registry.next(b);

		registry.reset_all();

		assert_eq!(registry.next(a), 0);
		assert_eq!(registry.next(b), 0);
		assert_eq!(registry.len(), 2);
	}

	#[rstest]
	fn test_reserve_hands_out_consecutive_block() {
		let registry = SequenceRegistry::new();
		let id = FactoryId::next();
		registry.next(id);

		assert_eq!(registry.reserve(id, 5), 1);
		assert_eq!(registry.next(id), 6);
	}

	#[rstest]
	fn test_reset_unknown_factory_is_noop() {
		let registry = SequenceRegistry::new();
		registry.reset(FactoryId::next());
		assert!(registry.is_empty());
	}

	#[rstest]
	fn test_factory_ids_are_unique() {
		let a = FactoryId::next();
		let b = FactoryId::next();
		assert_ne!(a, b);
		assert_eq!(format!("{a}"), format!("factory#{}", a.as_u64()));
	}
}
