//! Field-resolution engine for forgery test-data factories.
//!
//! A factory produces plain records for tests. Each field of a factory has a
//! default [`FieldSpec`]: a literal value, or a lazy resolver that may read
//! the build's sequence number and other fields of the same record.
//!
//! # Features
//!
//! - `json` - JSON factory configs (enabled by default)
//! - `yaml` - YAML factory configs
//! - `full` - All features enabled
//!
//! # Quick Start
//!
//! ```
//! use forgery_core::{FactoryDefinition, FieldSpec, Overrides, Trait};
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let users = FactoryDefinition::builder("User")
//! 	.field("id", FieldSpec::sequence(|n| format!("User-{n}")))
//! 	.field("firstName", "Komata")
//! 	.field("lastName", "Mikami")
//! 	.field(
//! 		"fullName",
//! 		FieldSpec::lazy(|ctx| async move {
//! 			let first: Option<String> = ctx.get_as("firstName").await?;
//! 			let last: Option<String> = ctx.get_as("lastName").await?;
//! 			Ok(format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default()))
//! 		}),
//! 	)
//! 	.with_trait(Trait::new("anonymous").field("lastName", FieldSpec::undefined()))
//! 	.build()
//! 	.unwrap();
//!
//! let user = users.build().await.unwrap();
//! assert_eq!(user.get("fullName"), Some(&json!("Komata Mikami")));
//!
//! let user = users
//! 	.build_with(&Overrides::new().set("firstName", "Taro"))
//! 	.await
//! 	.unwrap();
//! assert_eq!(user.get("fullName"), Some(&json!("Taro Mikami")));
//!
//! let user = users.use_trait("anonymous").unwrap().build().await.unwrap();
//! assert!(user.is_undefined("lastName"));
//! # });
//! ```
//!
//! # Architecture
//!
//! - [`FactoryDefinition`] - immutable field declarations, defaults and traits
//! - [`Factory`] - cheap handle carrying a trait selection
//! - [`TraitStack`] / [`Overrides`] - effective-spec merge
//!   (defaults, then traits in selection order, then overrides)
//! - [`FieldContext`] - what a lazy resolver sees: `seq()` and `get()`
//! - [`SequenceRegistry`] - per-factory counters, process-wide by default
//! - [`config`] - declarative factories from JSON or YAML
//! - [`registry`] - named factories for cross-factory builds
//!
//! Within one build every field resolves at most once. A resolver that
//! re-enters a field still being resolved fails with
//! [`FactoryError::CircularDependency`].

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod context;
pub mod definition;
pub mod error;
pub mod factory;
pub mod list;
pub mod prelude;
pub mod registry;
mod resolver;
pub mod sequence;
pub mod spec;
pub mod template;
pub mod traits;
pub mod value;

// Re-export commonly used types at crate root
pub use config::{ConfigFormat, ConfigParser, FactoryConfig};
pub use context::FieldContext;
pub use definition::{FactoryDefinition, FactoryDefinitionBuilder, Trait};
pub use error::{ConfigurationError, FactoryError, FactoryResult};
pub use factory::Factory;
pub use list::ListBuilder;
pub use registry::{FactoryRegistry, get_factory, register_factory};
pub use sequence::{FactoryId, SequenceRegistry, reset_all_sequences};
pub use spec::FieldSpec;
pub use template::{Template, TemplateError};
pub use traits::{Overrides, TraitStack};
pub use value::{IntoFieldValue, Record};
