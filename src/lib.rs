//! # Forgery
//!
//! Declarative test-data factories with lazy, cross-field resolution.
//!
//! This crate is a thin facade over [`forgery_core`]. Depend on `forgery`
//! and import the prelude:
//!
//! ```
//! use forgery::prelude::*;
//!
//! let posts = FactoryDefinition::builder("Post")
//! 	.field("id", FieldSpec::sequence(|n| n + 1))
//! 	.field("title", FieldSpec::template("Post #{n}").unwrap())
//! 	.field("draft", false)
//! 	.with_trait(Trait::new("draft").field("draft", true))
//! 	.build()
//! 	.unwrap();
//!
//! assert_eq!(posts.fields().collect::<Vec<_>>(), vec!["id", "title", "draft"]);
//! assert_eq!(posts.trait_names(), vec!["draft"]);
//! ```
//!
//! ## Feature Flags
//!
//! - `json` (default) - JSON factory configs
//! - `yaml` - YAML factory configs (via `serde_yaml`)
//! - `full` - All features enabled

#![warn(missing_docs)]

pub use forgery_core::*;

/// Convenience re-exports for common usage.
pub mod prelude {
	pub use forgery_core::prelude::*;
}
