//! The factory handle.
//!
//! A [`Factory`] pairs a shared [`FactoryDefinition`] with a trait selection.
//! Handles are cheap to clone; selecting a trait returns a new handle and
//! leaves the original untouched.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::context::BuildContext;
use crate::definition::FactoryDefinition;
use crate::error::FactoryResult;
use crate::list::ListBuilder;
use crate::resolver;
use crate::sequence::FactoryId;
use crate::traits::{Overrides, TraitStack};
use crate::value::Record;

/// Handle used by tests to produce records.
///
/// # Example
///
/// ```
/// use forgery_core::{FactoryDefinition, FieldSpec, Overrides};
/// use serde_json::json;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let users = FactoryDefinition::builder("User")
/// 	.field("id", FieldSpec::sequence(|n| n + 1))
/// 	.field("name", "Komata")
/// 	.build()
/// 	.unwrap();
///
/// let user = users.build_with(&Overrides::new().set("name", "Mikami")).await.unwrap();
/// assert_eq!(user.get("name"), Some(&json!("Mikami")));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Factory {
	definition: Arc<FactoryDefinition>,
	traits: TraitStack,
}

impl Factory {
	pub(crate) fn new(definition: Arc<FactoryDefinition>) -> Self {
		Self {
			definition,
			traits: TraitStack::new(),
		}
	}

	/// Shared definition.
	pub fn definition(&self) -> &Arc<FactoryDefinition> {
		&self.definition
	}

	/// Factory name.
	pub fn name(&self) -> &str {
		self.definition.name()
	}

	/// Identity used for the sequence counter.
	pub fn id(&self) -> FactoryId {
		self.definition.id()
	}

	/// Output field names in declaration order.
	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.definition.fields()
	}

	/// Transient field names in declaration order.
	pub fn transient_fields(&self) -> impl Iterator<Item = &str> {
		self.definition.transient_fields()
	}

	/// Declared trait names, sorted.
	pub fn trait_names(&self) -> Vec<&str> {
		self.definition.trait_names()
	}

	/// Traits selected on this handle, in selection order.
	pub fn selected_traits(&self) -> &[String] {
		self.traits.names()
	}

	/// Returns a handle with `name` appended to the trait selection.
	///
	/// # Errors
	///
	/// Returns a configuration error if the factory does not declare `name`.
	pub fn use_trait(&self, name: &str) -> FactoryResult<Factory> {
		Ok(Self {
			definition: Arc::clone(&self.definition),
			traits: self.traits.with(&self.definition, name)?,
		})
	}

	/// Selects several traits in order.
	pub fn with_traits<I, S>(&self, names: I) -> FactoryResult<Factory>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		names
			.into_iter()
			.try_fold(self.clone(), |factory, name| factory.use_trait(name.as_ref()))
	}

	/// Builds one record from defaults and selected traits.
	pub async fn build(&self) -> FactoryResult<Record> {
		let seq = self.allocate_seq();
		self.build_at(seq, None).await
	}

	/// Builds one record with call-level overrides.
	pub async fn build_with(&self, overrides: &Overrides) -> FactoryResult<Record> {
		let seq = self.allocate_seq();
		self.build_at(seq, Some(overrides)).await
	}

	/// Builds one record and deserializes it into `T`.
	pub async fn build_as<T: DeserializeOwned>(&self) -> FactoryResult<T> {
		self.build().await?.deserialize()
	}

	/// Builds one record with overrides and deserializes it into `T`.
	pub async fn build_with_as<T: DeserializeOwned>(&self, overrides: &Overrides) -> FactoryResult<T> {
		self.build_with(overrides).await?.deserialize()
	}

	/// Builds `count` records, one sequence number each.
	pub async fn build_list(&self, count: usize) -> FactoryResult<Vec<Record>> {
		self.list(count).build().await
	}

	/// Builds `count` records sharing the same overrides.
	pub async fn build_list_with(&self, count: usize, overrides: &Overrides) -> FactoryResult<Vec<Record>> {
		self.list(count).overrides(overrides.clone()).build().await
	}

	/// Builds `count` records and deserializes each into `T`.
	pub async fn build_list_as<T: DeserializeOwned>(&self, count: usize) -> FactoryResult<Vec<T>> {
		self.build_list(count)
			.await?
			.into_iter()
			.map(Record::deserialize)
			.collect()
	}

	/// Starts a configurable list build.
	pub fn list(&self, count: usize) -> ListBuilder<'_> {
		ListBuilder::new(self, count)
	}

	/// Resets this factory's sequence counter to 0.
	pub fn reset_sequence(&self) {
		self.definition.sequences().reset(self.id());
	}

	/// Sequence number the next build will receive.
	pub fn peek_sequence(&self) -> u64 {
		self.definition.sequences().peek(self.id())
	}

	pub(crate) fn allocate_seq(&self) -> u64 {
		self.definition.sequences().next(self.id())
	}

	/// Builds one record with an already allocated sequence number.
	pub(crate) async fn build_at(&self, seq: u64, overrides: Option<&Overrides>) -> FactoryResult<Record> {
		let specs = self.traits.effective_specs(&self.definition, overrides)?;
		let ctx = Arc::new(BuildContext::new(self.name(), seq, specs));
		tracing::debug!(
			factory = self.name(),
			seq,
			traits = ?self.traits.names(),
			overrides = overrides.map_or(0, Overrides::len),
			"building record"
		);

		match resolver::assemble(ctx, self.fields()).await {
			Ok(record) => {
				tracing::debug!(factory = self.name(), seq, "record built");
				Ok(record)
			}
			Err(error) => {
				tracing::warn!(factory = self.name(), seq, %error, "build failed");
				Err(error)
			}
		}
	}
}
