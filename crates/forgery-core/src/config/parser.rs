//! Factory config parsing.
//!
//! A config file holds either one factory object or an array of them.

use std::path::Path;

use super::{ConfigFormat, FactoryConfig};
use crate::error::{FactoryError, FactoryResult};
use crate::factory::Factory;

/// Parser for factory config files.
///
/// Supports JSON and YAML (YAML requires the `yaml` feature).
#[derive(Debug, Default)]
pub struct ConfigParser;

impl ConfigParser {
	/// Creates a new parser.
	pub fn new() -> Self {
		Self
	}

	/// Parses a config file, detecting the format from its extension.
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - The file extension is not recognized
	/// - The file does not exist or cannot be read
	/// - The content is not a valid factory config
	pub fn parse_file(&self, path: &Path) -> FactoryResult<Vec<FactoryConfig>> {
		let format = ConfigFormat::from_path(path).ok_or_else(|| {
			FactoryError::UnsupportedExtension(
				path.extension()
					.and_then(|e| e.to_str())
					.unwrap_or("(none)")
					.to_string(),
			)
		})?;

		let content = std::fs::read_to_string(path).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				FactoryError::FileNotFound(path.display().to_string())
			} else {
				FactoryError::from(e)
			}
		})?;

		let configs = self.parse_str(&content, format)?;
		tracing::debug!(
			path = %path.display(),
			%format,
			factories = configs.len(),
			"parsed factory config"
		);
		Ok(configs)
	}

	/// Parses config content in the given format.
	pub fn parse_str(&self, content: &str, format: ConfigFormat) -> FactoryResult<Vec<FactoryConfig>> {
		match format {
			ConfigFormat::Json => self.parse_json(content),
			ConfigFormat::Yaml => self.parse_yaml(content),
		}
	}

	/// Parses and builds every factory in `path`.
	pub fn load_file(&self, path: &Path) -> FactoryResult<Vec<Factory>> {
		self.parse_file(path)?
			.into_iter()
			.map(FactoryConfig::into_factory)
			.collect()
	}

	/// Parses several files, concatenating their factories in order.
	pub fn parse_files(&self, paths: &[&Path]) -> FactoryResult<Vec<FactoryConfig>> {
		let mut all = Vec::new();
		for path in paths {
			all.extend(self.parse_file(path)?);
		}
		Ok(all)
	}

	fn parse_json(&self, content: &str) -> FactoryResult<Vec<FactoryConfig>> {
		// Deserialize straight into the target type; going through
		// `serde_json::Value` would sort the field maps.
		match content.trim_start().chars().next() {
			Some('[') => Ok(serde_json::from_str(content)?),
			Some('{') => Ok(vec![serde_json::from_str(content)?]),
			_ => Err(FactoryError::Parse(
				"Expected array or object".to_string(),
			)),
		}
	}

	#[cfg(feature = "yaml")]
	fn parse_yaml(&self, content: &str) -> FactoryResult<Vec<FactoryConfig>> {
		let value: serde_yaml::Value = serde_yaml::from_str(content)?;

		match value {
			serde_yaml::Value::Sequence(items) => items
				.into_iter()
				.enumerate()
				.map(|(idx, item)| {
					serde_yaml::from_value(item).map_err(|e| {
						FactoryError::Parse(format!("Invalid factory at index {}: {}", idx, e))
					})
				})
				.collect(),
			serde_yaml::Value::Mapping(_) => Ok(vec![serde_yaml::from_value(value)?]),
			_ => Err(FactoryError::Parse(
				"Expected sequence or mapping".to_string(),
			)),
		}
	}

	#[cfg(not(feature = "yaml"))]
	fn parse_yaml(&self, _content: &str) -> FactoryResult<Vec<FactoryConfig>> {
		Err(FactoryError::UnsupportedExtension(
			"YAML support requires the 'yaml' feature".to_string(),
		))
	}
}
