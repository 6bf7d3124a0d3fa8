//! Convenience re-exports for common usage.
//!
//! ```
//! use forgery_core::prelude::*;
//!
//! let tags = FactoryDefinition::builder("Tag")
//! 	.field("label", FieldSpec::sequence_template("tag-{n}").unwrap())
//! 	.build()
//! 	.unwrap();
//! assert_eq!(tags.name(), "Tag");
//! ```

// Error types
pub use crate::error::{ConfigurationError, FactoryError, FactoryResult};

// Definition types
pub use crate::definition::{FactoryDefinition, FactoryDefinitionBuilder, Trait};
pub use crate::spec::FieldSpec;
pub use crate::template::Template;

// Build types
pub use crate::context::FieldContext;
pub use crate::factory::Factory;
pub use crate::list::ListBuilder;
pub use crate::traits::Overrides;
pub use crate::value::{IntoFieldValue, Record};

// Sequences
pub use crate::sequence::{SequenceRegistry, reset_all_sequences};

// Config and registry
pub use crate::config::{ConfigFormat, ConfigParser, FactoryConfig};
pub use crate::registry::{FactoryRegistry, get_factory, has_factory, register_factory};
