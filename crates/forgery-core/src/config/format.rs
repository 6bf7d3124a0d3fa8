//! Config file formats.

use std::fmt;
use std::path::Path;

/// Supported factory config formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ConfigFormat {
	/// JSON (default).
	#[default]
	Json,

	/// YAML (requires the `yaml` feature).
	Yaml,
}

impl ConfigFormat {
	/// Determines the format from a file extension.
	///
	/// ```
	/// # use forgery_core::config::ConfigFormat;
	/// assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
	/// assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
	/// assert_eq!(ConfigFormat::from_extension("toml"), None);
	/// ```
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"json" => Some(Self::Json),
			"yaml" | "yml" => Some(Self::Yaml),
			_ => None,
		}
	}

	/// Determines the format from a file path.
	pub fn from_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}

	/// Default file extension.
	pub fn extension(&self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Yaml => "yaml",
		}
	}
}

impl fmt::Display for ConfigFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Json => write!(f, "JSON"),
			Self::Yaml => write!(f, "YAML"),
		}
	}
}
