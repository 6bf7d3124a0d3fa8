//! Field values and the produced [`Record`].
//!
//! A resolved field is an `Option<Value>`: `None` is "undefined", which is
//! distinct from JSON `null` (`Some(Value::Null)`).

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::{FactoryError, FactoryResult};

/// Conversion into a resolved field value.
///
/// Implemented for the scalar types fixtures usually carry, for
/// [`serde_json::Value`] and for `Option<Value>` (where `None` means undefined).
pub trait IntoFieldValue {
	/// Converts `self` into a field value.
	fn into_field_value(self) -> Option<Value>;
}

impl IntoFieldValue for Value {
	fn into_field_value(self) -> Option<Value> {
		Some(self)
	}
}

impl IntoFieldValue for Option<Value> {
	fn into_field_value(self) -> Option<Value> {
		self
	}
}

impl IntoFieldValue for String {
	fn into_field_value(self) -> Option<Value> {
		Some(Value::String(self))
	}
}

impl IntoFieldValue for &str {
	fn into_field_value(self) -> Option<Value> {
		Some(Value::String(self.to_string()))
	}
}

macro_rules! impl_into_field_value {
	($($ty:ty),* $(,)?) => {
		$(
			impl IntoFieldValue for $ty {
				fn into_field_value(self) -> Option<Value> {
					Some(Value::from(self))
				}
			}
		)*
	};
}

impl_into_field_value!(bool, i32, i64, u32, u64, usize, f64, Vec<Value>, Map<String, Value>);

/// An assembled factory output.
///
/// Keys appear in the declaration order of the factory's output fields.
/// Transient fields never appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
	fields: IndexMap<String, Option<Value>>,
}

impl Record {
	/// Creates an empty record.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the value of `field`, or `None` if it is missing or undefined.
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.fields.get(field).and_then(Option::as_ref)
	}

	/// Returns a mutable reference to the value of `field`.
	pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
		self.fields.get_mut(field).and_then(Option::as_mut)
	}

	/// Sets `field`, keeping its position if it already exists.
	pub fn insert(&mut self, field: impl Into<String>, value: impl IntoFieldValue) {
		self.fields.insert(field.into(), value.into_field_value());
	}

	/// Returns true if the record has the key, defined or not.
	pub fn contains_key(&self, field: &str) -> bool {
		self.fields.contains_key(field)
	}

	/// Returns true if the key is present and its value is undefined.
	pub fn is_undefined(&self, field: &str) -> bool {
		matches!(self.fields.get(field), Some(None))
	}

	/// Field names in declaration order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	/// Iterates over `(field, value)` pairs in declaration order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
		self.fields.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
	}

	/// Number of keys, including undefined ones.
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	/// Returns true if the record has no keys.
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// Converts into a JSON object. Undefined fields are omitted.
	pub fn into_json(self) -> Value {
		let object: Map<String, Value> = self
			.fields
			.into_iter()
			.filter_map(|(k, v)| v.map(|v| (k, v)))
			.collect();
		Value::Object(object)
	}

	/// Deserializes the record into a typed model.
	pub fn deserialize<T: DeserializeOwned>(self) -> FactoryResult<T> {
		serde_json::from_value(self.into_json()).map_err(|e| FactoryError::Deserialize(e.to_string()))
	}
}

impl Serialize for Record {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let defined = self.fields.values().filter(|v| v.is_some()).count();
		let mut map = serializer.serialize_map(Some(defined))?;
		for (key, value) in &self.fields {
			if let Some(value) = value {
				map.serialize_entry(key, value)?;
			}
		}
		map.end()
	}
}

impl FromIterator<(String, Option<Value>)> for Record {
	fn from_iter<I: IntoIterator<Item = (String, Option<Value>)>>(iter: I) -> Self {
		Self {
			fields: iter.into_iter().collect(),
		}
	}
}

impl IntoIterator for Record {
	type Item = (String, Option<Value>);
	type IntoIter = indexmap::map::IntoIter<String, Option<Value>>;

	fn into_iter(self) -> Self::IntoIter {
		self.fields.into_iter()
	}
}
