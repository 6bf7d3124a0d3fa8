//! Declarative factory definitions.
//!
//! A config describes a factory with plain data:
//!
//! ```json
//! {
//!   "name": "User",
//!   "defaultFields": {
//!     "id": { "$sequence": "user-{n}" },
//!     "firstName": "Komata",
//!     "lastName": "Mikami",
//!     "fullName": { "$template": "{firstName} {lastName}" },
//!     "nickname": { "$undefined": true }
//!   },
//!   "transientFields": { "domain": "example.com" },
//!   "traits": {
//!     "anonymous": { "firstName": { "$undefined": true } }
//!   }
//! }
//! ```
//!
//! Values are literals unless they are an object with a single `$` key:
//!
//! - `{"$sequence": "..."}` – template that may only use `{n}`
//! - `{"$template": "..."}` – template over `{n}` and other fields
//! - `{"$undefined": true}` – the undefined literal
//! - `{"$literal": <any>}` – the wrapped value verbatim

mod format;
mod parser;

pub use format::ConfigFormat;
pub use parser::ConfigParser;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::{FactoryDefinition, FactoryDefinitionBuilder, Trait};
use crate::error::{ConfigurationError, FactoryError, FactoryResult};
use crate::factory::Factory;
use crate::spec::FieldSpec;

/// Serializable factory configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FactoryConfig {
	/// Factory name.
	pub name: String,

	/// Output fields and their default specs, in declaration order.
	pub default_fields: IndexMap<String, Value>,

	/// Transient fields and their default specs.
	#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
	pub transient_fields: IndexMap<String, Value>,

	/// Trait overlays by trait name.
	#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
	pub traits: IndexMap<String, IndexMap<String, Value>>,
}

impl FactoryConfig {
	/// Converts the config into a definition builder.
	///
	/// Code can then swap declarative defaults for lazy resolvers with
	/// [`FactoryDefinitionBuilder::override_default`] before building.
	///
	/// # Errors
	///
	/// Returns an error if the name is empty or a directive is malformed.
	pub fn into_builder(self) -> FactoryResult<FactoryDefinitionBuilder> {
		if self.name.trim().is_empty() {
			return Err(FactoryError::Parse(
				"factory name must not be empty".to_string(),
			));
		}

		let mut builder = FactoryDefinition::builder(self.name);
		for (field, raw) in self.default_fields {
			let spec = field_spec(&field, raw)?;
			builder = builder.field(field, spec);
		}
		for (field, raw) in self.transient_fields {
			let spec = field_spec(&field, raw)?;
			builder = builder.transient(field, spec);
		}
		for (name, overlay) in self.traits {
			let mut t = Trait::new(name);
			for (field, raw) in overlay {
				let spec = field_spec(&field, raw)?;
				t = t.field(field, spec);
			}
			builder = builder.with_trait(t);
		}
		Ok(builder)
	}

	/// Builds the root factory handle.
	pub fn into_factory(self) -> FactoryResult<Factory> {
		self.into_builder()?.build()
	}
}

/// Interprets one config value as a [`FieldSpec`].
pub fn field_spec(field: &str, raw: Value) -> FactoryResult<FieldSpec> {
	let directive = match &raw {
		Value::Object(map) if map.len() == 1 => map
			.iter()
			.next()
			.filter(|(key, _)| key.starts_with('$'))
			.map(|(key, arg)| (key.clone(), arg.clone())),
		_ => None,
	};

	match directive {
		Some((key, arg)) => directive_spec(field, &key, arg),
		None => Ok(FieldSpec::from(raw)),
	}
}

fn directive_spec(field: &str, key: &str, arg: Value) -> FactoryResult<FieldSpec> {
	let invalid = |message: String| -> FactoryError {
		ConfigurationError::InvalidDirective {
			field: field.to_string(),
			message,
		}
		.into()
	};

	match key {
		"$literal" => Ok(FieldSpec::from(arg)),
		"$undefined" => match arg {
			Value::Bool(true) => Ok(FieldSpec::undefined()),
			other => Err(invalid(format!("$undefined expects true, got {other}"))),
		},
		"$sequence" | "$template" => {
			let Value::String(source) = arg else {
				return Err(invalid(format!("{key} expects a string")));
			};
			let spec = if key == "$sequence" {
				FieldSpec::sequence_template(&source)
			} else {
				FieldSpec::template(&source)
			};
			spec.map_err(|e| invalid(e.to_string()))
		}
		other => Err(invalid(format!("unknown directive {other}"))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sequence::SequenceRegistry;
	use rstest::rstest;
	use serde_json::json;
	use std::sync::Arc;

	const USER: &str = r#"{
		"name": "User",
		"defaultFields": {
			"id": {"$sequence": "user-{n}"},
			"email": {"$template": "{handle}@{domain}"},
			"handle": "komata",
			"profile": {"$literal": {"$undefined": true}},
			"nickname": {"$undefined": true}
		},
		"transientFields": {"domain": "example.com"},
		"traits": {"corporate": {"domain": "corp.test"}}
	}"#;

	fn config() -> FactoryConfig {
		serde_json::from_str(USER).unwrap()
	}

	#[rstest]
	fn test_literal_passthrough() {
		let spec = field_spec("a", json!({"plain": 1, "$x": 2})).unwrap();
		assert_eq!(spec.as_literal(), Some(&Some(json!({"plain": 1, "$x": 2}))));

		let spec = field_spec("a", json!({"plain": 1})).unwrap();
		assert!(!spec.is_lazy());
	}

	#[rstest]
	#[case(json!({"$sequence": "{n}-{name}"}))]
	#[case(json!({"$template": 3}))]
	#[case(json!({"$undefined": false}))]
	#[case(json!({"$random": "x"}))]
	#[case(json!({"$template": "{"}))]
	fn test_invalid_directives(#[case] raw: Value) {
		assert!(matches!(
			field_spec("f", raw),
			Err(FactoryError::Configuration(
				ConfigurationError::InvalidDirective { .. }
			))
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_config_builds_factory() {
		let factory = config()
			.into_builder()
			.unwrap()
			.sequences(Arc::new(SequenceRegistry::new()))
			.build()
			.unwrap();

		let record = factory.build().await.unwrap();
		assert_eq!(
			record.keys().collect::<Vec<_>>(),
			vec!["id", "email", "handle", "profile", "nickname"]
		);
		assert_eq!(record.get("id"), Some(&json!("user-0")));
		assert_eq!(record.get("email"), Some(&json!("komata@example.com")));
		assert_eq!(record.get("profile"), Some(&json!({"$undefined": true})));
		assert!(record.is_undefined("nickname"));
		assert!(!record.contains_key("domain"));

		let record = factory.use_trait("corporate").unwrap().build().await.unwrap();
		assert_eq!(record.get("email"), Some(&json!("komata@corp.test")));
	}

	#[rstest]
	fn test_unknown_option_rejected() {
		let result = serde_json::from_str::<FactoryConfig>(
			r#"{"name": "User", "defaultFields": {}, "defaults": {}}"#,
		);
		assert!(result.is_err());
	}

	#[rstest]
	fn test_empty_name_rejected() {
		let config = FactoryConfig {
			name: " ".to_string(),
			default_fields: IndexMap::new(),
			transient_fields: IndexMap::new(),
			traits: IndexMap::new(),
		};
		assert!(matches!(config.into_builder(), Err(FactoryError::Parse(_))));
	}
}
