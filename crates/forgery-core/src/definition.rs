//! Factory definitions and traits.
//!
//! A [`FactoryDefinition`] is immutable once built and shared by every
//! [`Factory`] handle derived from it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{ConfigurationError, FactoryResult};
use crate::factory::Factory;
use crate::sequence::{FactoryId, SequenceRegistry};
use crate::spec::FieldSpec;

/// A named, reusable partial overlay of a factory's field specs.
#[derive(Debug, Clone)]
pub struct Trait {
	name: String,
	overlay: IndexMap<String, FieldSpec>,
}

impl Trait {
	/// Creates an empty trait.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			overlay: IndexMap::new(),
		}
	}

	/// Adds or replaces the overlay for `field`.
	pub fn field(mut self, field: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
		self.overlay.insert(field.into(), spec.into());
		self
	}

	/// Trait name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Overlay for `field`, if the trait sets it.
	pub fn get(&self, field: &str) -> Option<&FieldSpec> {
		self.overlay.get(field)
	}

	/// All overlaid fields in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
		self.overlay.iter().map(|(k, v)| (k.as_str(), v))
	}
}

/// Immutable description of one factory.
#[derive(Debug)]
pub struct FactoryDefinition {
	id: FactoryId,
	name: String,
	output: Vec<String>,
	transient: Vec<String>,
	defaults: HashMap<String, FieldSpec>,
	traits: HashMap<String, Trait>,
	sequences: Arc<SequenceRegistry>,
}

impl FactoryDefinition {
	/// Starts a new definition.
	///
	/// # Example
	///
	/// ```
	/// use forgery_core::{FactoryDefinition, FieldSpec, Trait};
	///
	/// let factory = FactoryDefinition::builder("Image")
	/// 	.field("id", FieldSpec::sequence(|n| format!("Image-{n}")))
	/// 	.field("width", 100)
	/// 	.field("height", 100)
	/// 	.with_trait(Trait::new("large").field("width", 256).field("height", 256))
	/// 	.build()
	/// 	.unwrap();
	///
	/// assert_eq!(factory.fields().collect::<Vec<_>>(), vec!["id", "width", "height"]);
	/// ```
	pub fn builder(name: impl Into<String>) -> FactoryDefinitionBuilder {
		FactoryDefinitionBuilder::new(name)
	}

	/// Identity used as the sequence counter key.
	pub fn id(&self) -> FactoryId {
		self.id
	}

	/// Factory name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Output field names in declaration order.
	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.output.iter().map(String::as_str)
	}

	/// Transient field names in declaration order.
	pub fn transient_fields(&self) -> impl Iterator<Item = &str> {
		self.transient.iter().map(String::as_str)
	}

	/// Returns true if `field` is declared, as output or transient.
	pub fn is_declared(&self, field: &str) -> bool {
		self.defaults.contains_key(field)
	}

	/// Returns true if `field` is a transient field.
	pub fn is_transient(&self, field: &str) -> bool {
		self.transient.iter().any(|f| f == field)
	}

	/// Default spec of `field`.
	pub fn default_spec(&self, field: &str) -> Option<&FieldSpec> {
		self.defaults.get(field)
	}

	/// All default specs, output and transient.
	pub(crate) fn defaults(&self) -> &HashMap<String, FieldSpec> {
		&self.defaults
	}

	/// Trait declared under `name`.
	pub fn get_trait(&self, name: &str) -> Option<&Trait> {
		self.traits.get(name)
	}

	/// Declared trait names, sorted.
	pub fn trait_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.traits.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	/// Registry holding this factory's sequence counter.
	pub fn sequences(&self) -> &Arc<SequenceRegistry> {
		&self.sequences
	}

	pub(crate) fn unknown_field(&self, field: &str) -> ConfigurationError {
		ConfigurationError::UnknownField {
			factory: self.name.clone(),
			field: field.to_string(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
	Output,
	Transient,
}

/// Fluent builder for [`FactoryDefinition`].
///
/// Validation is deferred to [`build`](Self::build) so the chain stays infallible.
#[derive(Debug)]
pub struct FactoryDefinitionBuilder {
	name: String,
	fields: IndexMap<String, (FieldKind, FieldSpec)>,
	duplicates: Vec<String>,
	undeclared: Vec<String>,
	traits: Vec<Trait>,
	sequences: Option<Arc<SequenceRegistry>>,
}

impl FactoryDefinitionBuilder {
	fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			fields: IndexMap::new(),
			duplicates: Vec::new(),
			undeclared: Vec::new(),
			traits: Vec::new(),
			sequences: None,
		}
	}

	fn declare(mut self, field: String, kind: FieldKind, spec: FieldSpec) -> Self {
		if self.fields.contains_key(&field) {
			self.duplicates.push(field);
		} else {
			self.fields.insert(field, (kind, spec));
		}
		self
	}

	/// Declares an output field with its default spec.
	pub fn field(self, field: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
		self.declare(field.into(), FieldKind::Output, spec.into())
	}

	/// Declares a transient field: resolvable through `get`, never in the output.
	pub fn transient(self, field: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
		self.declare(field.into(), FieldKind::Transient, spec.into())
	}

	/// Replaces the default spec of an already declared field, keeping its
	/// position and kind. Replacing an undeclared field fails at build time.
	pub fn override_default(mut self, field: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
		let field = field.into();
		match self.fields.get_mut(&field) {
			Some((_, existing)) => *existing = spec.into(),
			None => self.undeclared.push(field),
		}
		self
	}

	/// Declares a trait. A later trait with the same name replaces an earlier one.
	pub fn with_trait(mut self, t: Trait) -> Self {
		self.traits.retain(|existing| existing.name != t.name);
		self.traits.push(t);
		self
	}

	/// Binds the factory to a specific sequence registry instead of the
	/// process-wide one.
	pub fn sequences(mut self, registry: Arc<SequenceRegistry>) -> Self {
		self.sequences = Some(registry);
		self
	}

	/// Validates the definition and returns the root factory handle.
	///
	/// # Errors
	///
	/// Returns a configuration error if a field is declared twice, or if a
	/// trait or default override names an undeclared field.
	pub fn build(self) -> FactoryResult<Factory> {
		Ok(Factory::new(Arc::new(self.into_definition()?)))
	}

	pub(crate) fn into_definition(self) -> FactoryResult<FactoryDefinition> {
		if let Some(field) = self.duplicates.into_iter().next() {
			return Err(ConfigurationError::DuplicateField {
				factory: self.name,
				field,
			}
			.into());
		}

		if let Some(field) = self.undeclared.into_iter().next() {
			return Err(ConfigurationError::UnknownField {
				factory: self.name,
				field,
			}
			.into());
		}

		let declared: HashSet<&str> = self.fields.keys().map(String::as_str).collect();
		for t in &self.traits {
			if let Some((field, _)) = t.iter().find(|(field, _)| !declared.contains(field)) {
				return Err(ConfigurationError::UnknownField {
					factory: self.name.clone(),
					field: field.to_string(),
				}
				.into());
			}
		}

		let mut output = Vec::new();
		let mut transient = Vec::new();
		let mut defaults = HashMap::with_capacity(self.fields.len());
		for (field, (kind, spec)) in self.fields {
			match kind {
				FieldKind::Output => output.push(field.clone()),
				FieldKind::Transient => transient.push(field.clone()),
			}
			defaults.insert(field, spec);
		}

		let definition = FactoryDefinition {
			id: FactoryId::next(),
			name: self.name,
			output,
			transient,
			defaults,
			traits: self
				.traits
				.into_iter()
				.map(|t| (t.name.clone(), t))
				.collect(),
			sequences: self.sequences.unwrap_or_else(SequenceRegistry::global),
		};
		tracing::debug!(
			factory = %definition.name,
			id = %definition.id,
			fields = definition.output.len(),
			transient = definition.transient.len(),
			traits = definition.traits.len(),
			"factory defined"
		);
		Ok(definition)
	}
}
