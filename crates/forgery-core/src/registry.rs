//! Named factory registry.
//!
//! Lets one factory's resolver build records of another factory without
//! holding a handle to it, and gives config-loaded factories a home.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::{FactoryError, FactoryResult};
use crate::factory::Factory;

static FACTORY_REGISTRY: Lazy<RwLock<HashMap<String, Factory>>> =
	Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers `factory` under its own name, replacing any earlier entry.
///
/// ```
/// use forgery_core::{FactoryDefinition, registry};
///
/// let tags = FactoryDefinition::builder("Tag").field("label", "news").build().unwrap();
/// registry::register_factory(tags);
/// assert!(registry::has_factory("Tag"));
/// # registry::clear_factories();
/// ```
pub fn register_factory(factory: Factory) {
	register_factory_as(factory.name().to_string(), factory);
}

/// Registers `factory` under an explicit name.
pub fn register_factory_as(name: impl Into<String>, factory: Factory) {
	let name = name.into();
	tracing::debug!(name = %name, factory = factory.name(), "registering factory");
	FACTORY_REGISTRY.write().insert(name, factory);
}

/// Returns the factory registered under `name`.
///
/// # Errors
///
/// Returns [`FactoryError::FactoryNotFound`] if nothing is registered.
pub fn get_factory(name: &str) -> FactoryResult<Factory> {
	FACTORY_REGISTRY
		.read()
		.get(name)
		.cloned()
		.ok_or_else(|| FactoryError::FactoryNotFound(name.to_string()))
}

/// Checks if a factory is registered under `name`.
pub fn has_factory(name: &str) -> bool {
	FACTORY_REGISTRY.read().contains_key(name)
}

/// Returns all registered names, sorted.
pub fn factory_names() -> Vec<String> {
	let mut names: Vec<String> = FACTORY_REGISTRY.read().keys().cloned().collect();
	names.sort_unstable();
	names
}

/// Removes the factory registered under `name`.
pub fn unregister_factory(name: &str) -> Option<Factory> {
	FACTORY_REGISTRY.write().remove(name)
}

/// Clears all registered factories.
///
/// This is primarily useful for testing.
pub fn clear_factories() {
	FACTORY_REGISTRY.write().clear();
}

/// Returns the number of registered factories.
pub fn factory_count() -> usize {
	FACTORY_REGISTRY.read().len()
}

/// Factory registry handle for scoped operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct FactoryRegistry;

impl FactoryRegistry {
	/// Creates a new registry handle.
	pub fn new() -> Self {
		Self
	}

	/// Registers `factory` under its own name.
	pub fn register(&self, factory: Factory) {
		register_factory(factory);
	}

	/// Gets a factory by name.
	pub fn get(&self, name: &str) -> FactoryResult<Factory> {
		get_factory(name)
	}

	/// Checks if a factory is registered.
	pub fn contains(&self, name: &str) -> bool {
		has_factory(name)
	}

	/// Returns all registered names.
	pub fn names(&self) -> Vec<String> {
		factory_names()
	}

	/// Returns the number of registered factories.
	pub fn len(&self) -> usize {
		factory_count()
	}

	/// Checks if the registry is empty.
	pub fn is_empty(&self) -> bool {
		factory_count() == 0
	}

	/// Clears all registered factories.
	pub fn clear(&self) {
		clear_factories();
	}
}
