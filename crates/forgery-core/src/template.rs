//! String templates for declarative lazy fields.
//!
//! `{n}` expands to the build's sequence number and `{field}` to the resolved
//! value of another field of the same build. `{{` and `}}` are literal braces.
//! An undefined field renders as the empty string; strings render without
//! quotes; every other value renders as JSON.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::context::FieldContext;
use crate::error::FactoryResult;
use crate::spec::FieldSpec;

/// Placeholder that expands to the sequence number.
pub const SEQUENCE_PLACEHOLDER: &str = "n";

/// Template syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
	/// `{` without a matching `}`.
	#[error("unclosed placeholder starting at byte {0}")]
	Unclosed(usize),
	/// `}` without a preceding `{`.
	#[error("unmatched '}}' at byte {0}")]
	UnmatchedClose(usize),
	/// `{}`.
	#[error("empty placeholder at byte {0}")]
	EmptyPlaceholder(usize),
	/// A field placeholder in a template restricted to `{n}`.
	#[error("only {{n}} is allowed here, found {{{0}}}")]
	FieldNotAllowed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Text(String),
	Seq,
	Field(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
	source: String,
	segments: Vec<Segment>,
}

impl Template {
	/// Parses `source`.
	pub fn parse(source: &str) -> Result<Self, TemplateError> {
		let mut segments = Vec::new();
		let mut text = String::new();
		let mut chars = source.char_indices().peekable();

		while let Some((pos, c)) = chars.next() {
			match c {
				'{' if matches!(chars.peek(), Some((_, '{'))) => {
					chars.next();
					text.push('{');
				}
				'}' if matches!(chars.peek(), Some((_, '}'))) => {
					chars.next();
					text.push('}');
				}
				'{' => {
					let mut name = String::new();
					let mut closed = false;
					for (_, c) in chars.by_ref() {
						if c == '}' {
							closed = true;
							break;
						}
						name.push(c);
					}
					if !closed {
						return Err(TemplateError::Unclosed(pos));
					}
					let name = name.trim();
					if name.is_empty() {
						return Err(TemplateError::EmptyPlaceholder(pos));
					}
					if !text.is_empty() {
						segments.push(Segment::Text(std::mem::take(&mut text)));
					}
					segments.push(if name == SEQUENCE_PLACEHOLDER {
						Segment::Seq
					} else {
						Segment::Field(name.to_string())
					});
				}
				'}' => return Err(TemplateError::UnmatchedClose(pos)),
				c => text.push(c),
			}
		}
		if !text.is_empty() {
			segments.push(Segment::Text(text));
		}

		Ok(Self {
			source: source.to_string(),
			segments,
		})
	}

	/// Original template text.
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Fields referenced by the template, in order of appearance.
	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(|s| match s {
			Segment::Field(name) => Some(name.as_str()),
			_ => None,
		})
	}

	/// Renders against the current build.
	pub async fn render(&self, ctx: &FieldContext) -> FactoryResult<String> {
		let mut out = String::new();
		for segment in &self.segments {
			match segment {
				Segment::Text(text) => out.push_str(text),
				Segment::Seq => out.push_str(&ctx.seq().to_string()),
				Segment::Field(name) => {
					if let Some(value) = ctx.get(name).await? {
						push_value(&mut out, &value);
					}
				}
			}
		}
		Ok(out)
	}
}

fn push_value(out: &mut String, value: &Value) {
	match value {
		Value::String(s) => out.push_str(s),
		other => out.push_str(&other.to_string()),
	}
}

impl fmt::Display for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

impl From<Template> for FieldSpec {
	fn from(template: Template) -> Self {
		let template = Arc::new(template);
		FieldSpec::lazy(move |ctx| {
			let template = Arc::clone(&template);
			async move { Ok(template.render(&ctx).await?) }
		})
	}
}

impl FieldSpec {
	/// Lazy spec rendering `source` as a [`Template`].
	pub fn template(source: &str) -> Result<Self, TemplateError> {
		Template::parse(source).map(Self::from)
	}

	/// Lazy spec rendering a template that only uses `{n}`.
	///
	/// ```
	/// use forgery_core::FieldSpec;
	///
	/// assert!(FieldSpec::sequence_template("user-{n}").is_ok());
	/// assert!(FieldSpec::sequence_template("user-{name}").is_err());
	/// ```
	pub fn sequence_template(source: &str) -> Result<Self, TemplateError> {
		let template = Template::parse(source)?;
		if let Some(field) = template.fields().next() {
			return Err(TemplateError::FieldNotAllowed(field.to_string()));
		}
		Ok(Self::from(template))
	}
}
