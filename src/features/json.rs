//! Support for loading value maps from JSON data.

use crate::{Map, Value};

/// Parse a value map from JSON data.
///
/// The document must be a JSON object.
/// Entries keep the order they have in the document.
pub fn values_from_slice(data: &[u8]) -> Result<Map, Error> {
	into_map(serde_json::from_slice(data)?)
}

/// Parse a value map from JSON data.
///
/// The document must be a JSON object.
/// Entries keep the order they have in the document.
pub fn values_from_str(data: &str) -> Result<Map, Error> {
	into_map(serde_json::from_str(data)?)
}

fn into_map(value: Value) -> Result<Map, Error> {
	match value {
		Value::Map(map) => Ok(map),
		other => Err(Error::NotAMap(other.type_name())),
	}
}

/// Error for loading a value map from JSON.
#[derive(Debug)]
pub enum Error {
	/// An error occurred while parsing JSON.
	Json(serde_json::Error),

	/// The document is not an object.
	NotAMap(&'static str),
}

impl From<serde_json::Error> for Error {
	#[inline]
	fn from(other: serde_json::Error) -> Self {
		Self::Json(other)
	}
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Json(e) => std::fmt::Display::fmt(e, f),
			Self::NotAMap(type_name) => write!(f, "expected a JSON object, found a {type_name}"),
		}
	}
}
