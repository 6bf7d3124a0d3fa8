//! Trait selection and override precedence.
//!
//! The effective spec of a field is, highest precedence first:
//!
//! 1. the call-level override, when its key is present (an explicit
//!    undefined counts as present),
//! 2. the overlay of the most recently selected trait that sets the field,
//! 3. the factory default.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use crate::definition::FactoryDefinition;
use crate::error::{ConfigurationError, FactoryResult};
use crate::spec::FieldSpec;

/// Call-level field overrides.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	specs: IndexMap<String, FieldSpec>,
}

impl Overrides {
	/// Creates an empty override map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Overrides `field` with `spec`.
	pub fn set(mut self, field: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
		self.specs.insert(field.into(), spec.into());
		self
	}

	/// Overrides `field` with the undefined literal.
	pub fn undefined(self, field: impl Into<String>) -> Self {
		self.set(field, FieldSpec::undefined())
	}

	/// Builds overrides from a JSON object. Every key becomes a literal override.
	///
	/// Returns `None` if `value` is not an object.
	pub fn from_json(value: Value) -> Option<Self> {
		match value {
			Value::Object(map) => Some(Self {
				specs: map
					.into_iter()
					.map(|(k, v)| (k, FieldSpec::from(v)))
					.collect(),
			}),
			_ => None,
		}
	}

	/// Returns true if `field` is overridden.
	pub fn contains(&self, field: &str) -> bool {
		self.specs.contains_key(field)
	}

	/// Number of overridden fields.
	pub fn len(&self) -> usize {
		self.specs.len()
	}

	/// Returns true if nothing is overridden.
	pub fn is_empty(&self) -> bool {
		self.specs.is_empty()
	}

	/// Iterates over overridden fields.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
		self.specs.iter().map(|(k, v)| (k.as_str(), v))
	}
}

impl<K: Into<String>, S: Into<FieldSpec>> FromIterator<(K, S)> for Overrides {
	fn from_iter<I: IntoIterator<Item = (K, S)>>(iter: I) -> Self {
		Self {
			specs: iter
				.into_iter()
				.map(|(k, s)| (k.into(), s.into()))
				.collect(),
		}
	}
}

/// Ordered list of selected trait names.
///
/// Selecting the same trait twice is legal; each selection is appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraitStack {
	selected: Vec<String>,
}

impl TraitStack {
	/// Creates an empty selection.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a new stack with `name` appended, leaving `self` untouched.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::UnknownTrait`] if the definition does not
	/// declare `name`.
	pub fn with(&self, definition: &FactoryDefinition, name: &str) -> FactoryResult<Self> {
		if definition.get_trait(name).is_none() {
			return Err(ConfigurationError::UnknownTrait {
				factory: definition.name().to_string(),
				name: name.to_string(),
			}
			.into());
		}
		let mut selected = self.selected.clone();
		selected.push(name.to_string());
		Ok(Self { selected })
	}

	/// Selected names in selection order.
	pub fn names(&self) -> &[String] {
		&self.selected
	}

	/// Returns true if no trait is selected.
	pub fn is_empty(&self) -> bool {
		self.selected.is_empty()
	}

	/// Computes the effective spec of every declared field.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::UnknownField`] if `overrides` names a field
	/// the definition does not declare.
	pub fn effective_specs(
		&self,
		definition: &FactoryDefinition,
		overrides: Option<&Overrides>,
	) -> FactoryResult<HashMap<String, FieldSpec>> {
		let mut specs = definition.defaults().clone();

		for name in &self.selected {
			// Selection is validated in `with`.
			let Some(t) = definition.get_trait(name) else {
				continue;
			};
			for (field, spec) in t.iter() {
				specs.insert(field.to_string(), spec.clone());
			}
		}

		if let Some(overrides) = overrides {
			for (field, spec) in overrides.iter() {
				if !definition.is_declared(field) {
					return Err(definition.unknown_field(field).into());
				}
				specs.insert(field.to_string(), spec.clone());
			}
		}

		Ok(specs)
	}
}
