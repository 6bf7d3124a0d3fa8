//! List builds.

use futures::future::try_join_all;

use crate::error::FactoryResult;
use crate::factory::Factory;
use crate::traits::Overrides;
use crate::value::Record;

/// Builds `count` independent records from one factory handle.
///
/// Every record gets its own sequence number and its own build context; all
/// of them share the same overrides. The first failing element aborts the
/// whole list.
#[derive(Debug)]
pub struct ListBuilder<'a> {
	factory: &'a Factory,
	count: usize,
	overrides: Option<Overrides>,
	concurrent: bool,
}

impl<'a> ListBuilder<'a> {
	pub(crate) fn new(factory: &'a Factory, count: usize) -> Self {
		Self {
			factory,
			count,
			overrides: None,
			concurrent: false,
		}
	}

	/// Applies `overrides` to every element.
	pub fn overrides(mut self, overrides: Overrides) -> Self {
		self.overrides = Some(overrides);
		self
	}

	/// Drives the element builds concurrently.
	///
	/// All sequence numbers are reserved in one step before any element
	/// starts, so element `i` always receives `first + i`.
	pub fn concurrent(mut self) -> Self {
		self.concurrent = true;
		self
	}

	/// Builds the records, in sequence order.
	pub async fn build(self) -> FactoryResult<Vec<Record>> {
		let overrides = self.overrides.as_ref();
		tracing::debug!(
			factory = self.factory.name(),
			count = self.count,
			concurrent = self.concurrent,
			"building list"
		);

		if self.concurrent {
			let first = self
				.factory
				.definition()
				.sequences()
				.reserve(self.factory.id(), self.count as u64);
			let builds = (0..self.count as u64).map(|i| self.factory.build_at(first + i, overrides));
			return try_join_all(builds).await;
		}

		let mut records = Vec::with_capacity(self.count);
		for _ in 0..self.count {
			let seq = self.factory.allocate_seq();
			records.push(self.factory.build_at(seq, overrides).await?);
		}
		Ok(records)
	}
}
