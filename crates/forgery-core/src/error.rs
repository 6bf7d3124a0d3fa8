//! Error types for the factory engine.
//!
//! Every error is `Clone`: a field that failed once inside a build is replayed
//! to every later `get` of that field without re-running its resolver.

use std::sync::Arc;

use thiserror::Error;

/// Boxed error carried by [`FactoryError::Resolver`].
pub type BoxError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors caused by an inconsistent factory definition, trait selection or
/// override map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
	/// A trait, override or `get` call referenced a field the factory does not declare.
	#[error("factory '{factory}' has no field named '{field}'")]
	UnknownField {
		/// Factory name.
		factory: String,
		/// Offending field name.
		field: String,
	},

	/// A trait was selected that the factory does not declare.
	#[error("factory '{factory}' has no trait named '{name}'")]
	UnknownTrait {
		/// Factory name.
		factory: String,
		/// Offending trait name.
		name: String,
	},

	/// The same field was declared twice (as output or transient).
	#[error("factory '{factory}' declares field '{field}' more than once")]
	DuplicateField {
		/// Factory name.
		factory: String,
		/// Duplicated field name.
		field: String,
	},

	/// A declarative field spec in a config file could not be interpreted.
	#[error("invalid directive for field '{field}': {message}")]
	InvalidDirective {
		/// Field the directive belongs to.
		field: String,
		/// Why the directive was rejected.
		message: String,
	},
}

/// Errors that can occur while defining factories or building records.
#[derive(Debug, Clone, Error)]
pub enum FactoryError {
	/// Definition, trait selection or override referenced something undeclared.
	#[error("Configuration error: {0}")]
	Configuration(#[from] ConfigurationError),

	/// A field's resolver chain re-entered a field that is still being resolved.
	#[error("Circular dependency detected: {field}\n  Path: {path}")]
	CircularDependency {
		/// Field that was re-entered.
		field: String,
		/// Resolution path (format: a -> b -> a).
		path: String,
	},

	/// A resolver returned an error.
	#[error("Resolver for field '{field}' failed: {source}")]
	Resolver {
		/// Field whose resolver failed.
		field: String,
		/// Original error.
		#[source]
		source: BoxError,
	},

	/// A built record could not be mapped onto the requested type.
	#[error("Deserialize error: {0}")]
	Deserialize(String),

	/// Factory configuration content could not be parsed.
	#[error("Parse error: {0}")]
	Parse(String),

	/// Factory configuration file not found.
	#[error("Config file not found: {0}")]
	FileNotFound(String),

	/// Unsupported config file extension.
	#[error("Unsupported file extension: {0}")]
	UnsupportedExtension(String),

	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(Arc<std::io::Error>),

	/// No factory is registered under the given name.
	#[error("Factory not found: {0}")]
	FactoryNotFound(String),
}

impl FactoryError {
	/// Wraps the error returned by a lazy resolver.
	///
	/// Errors that already are a [`FactoryError`] (typically a `?` on
	/// [`FieldContext::get`](crate::context::FieldContext::get)) pass through
	/// unchanged so cycles and configuration problems keep their own variant.
	pub(crate) fn from_resolver(field: &str, error: anyhow::Error) -> Self {
		match error.downcast::<FactoryError>() {
			Ok(inner) => inner,
			Err(other) => {
				let boxed: Box<dyn std::error::Error + Send + Sync + 'static> = other.into();
				FactoryError::Resolver {
					field: field.to_string(),
					source: Arc::from(boxed),
				}
			}
		}
	}

	/// Returns true for [`FactoryError::CircularDependency`].
	pub fn is_circular(&self) -> bool {
		matches!(self, Self::CircularDependency { .. })
	}

	/// Returns true for [`FactoryError::Configuration`].
	pub fn is_configuration(&self) -> bool {
		matches!(self, Self::Configuration(_))
	}
}

impl From<std::io::Error> for FactoryError {
	fn from(error: std::io::Error) -> Self {
		Self::Io(Arc::new(error))
	}
}

impl From<serde_json::Error> for FactoryError {
	fn from(error: serde_json::Error) -> Self {
		Self::Parse(error.to_string())
	}
}

#[cfg(feature = "yaml")]
impl From<serde_yaml::Error> for FactoryError {
	fn from(error: serde_yaml::Error) -> Self {
		Self::Parse(error.to_string())
	}
}

/// Result type alias for factory operations.
pub type FactoryResult<T> = Result<T, FactoryError>;
