//! Support for loading value maps from TOML data.

use crate::{Map, Value};

/// Parse a value map from TOML data.
///
/// The input must be valid UTF-8.
pub fn values_from_slice(data: &[u8]) -> Result<Map, Error> {
	values_from_str(std::str::from_utf8(data)?)
}

/// Parse a value map from TOML data.
///
/// Tables become maps and arrays become lists.
/// Without the `preserve-order` feature, table entries are sorted by key.
pub fn values_from_str(data: &str) -> Result<Map, Error> {
	match toml::from_str(data)? {
		Value::Map(map) => Ok(map),
		other => Err(Error::NotAMap(other.type_name())),
	}
}

/// Error for loading a value map from TOML.
#[derive(Debug)]
pub enum Error {
	/// The input contains invalid UTF-8.
	InvalidUtf8(std::str::Utf8Error),

	/// An error occurred while parsing TOML.
	Toml(toml::de::Error),

	/// The document is not a table.
	NotAMap(&'static str),
}

impl From<std::str::Utf8Error> for Error {
	#[inline]
	fn from(other: std::str::Utf8Error) -> Self {
		Self::InvalidUtf8(other)
	}
}

impl From<toml::de::Error> for Error {
	#[inline]
	fn from(other: toml::de::Error) -> Self {
		Self::Toml(other)
	}
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidUtf8(e) => std::fmt::Display::fmt(e, f),
			Self::Toml(e) => std::fmt::Display::fmt(e, f),
			Self::NotAMap(type_name) => write!(f, "expected a TOML table, found a {type_name}"),
		}
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use crate::Template;
	use assert2::{assert, let_assert};

	#[test]
	fn test_render_with_toml_values() {
		let_assert!(Ok(values) = values_from_str(concat!(
			"name = \"prep\"\n",
			"ratio = 0.5\n",
			"[limits]\n",
			"low = 1\n",
		)));
		let_assert!(Ok(template) = Template::compile("{{name}} {{ratio * 2}} {{limits.low}}"));
		let_assert!(Ok(output) = template.render(&values));
		assert!(output == "prep 1.0 1");
	}

	#[test]
	fn test_invalid_input() {
		let_assert!(Err(Error::InvalidUtf8(_)) = values_from_slice(b"a = \"\xff\""));
		let_assert!(Err(Error::Toml(_)) = values_from_str("a = "));
	}
}
