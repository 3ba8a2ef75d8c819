//! Support for loading value maps from YAML data.

use crate::{Map, Value};

/// Parse a value map from YAML data.
pub fn values_from_slice(data: &[u8]) -> Result<Map, Error> {
	into_map(serde_yaml::from_slice(data)?)
}

/// Parse a value map from YAML data.
///
/// The document must be a mapping with string keys.
/// Entries keep the order they have in the document.
pub fn values_from_str(data: &str) -> Result<Map, Error> {
	into_map(serde_yaml::from_str(data)?)
}

fn into_map(value: Value) -> Result<Map, Error> {
	match value {
		Value::Map(map) => Ok(map),
		other => Err(Error::NotAMap(other.type_name())),
	}
}

/// Error for loading a value map from YAML.
#[derive(Debug)]
pub enum Error {
	/// An error occurred while parsing YAML.
	Yaml(serde_yaml::Error),

	/// The document is not a mapping.
	NotAMap(&'static str),
}

impl From<serde_yaml::Error> for Error {
	#[inline]
	fn from(other: serde_yaml::Error) -> Self {
		Self::Yaml(other)
	}
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Yaml(e) => std::fmt::Display::fmt(e, f),
			Self::NotAMap(type_name) => write!(f, "expected a YAML mapping, found a {type_name}"),
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
	fn test_render_with_yaml_values() {
		let_assert!(Ok(values) = values_from_str(concat!(
			"zeta: last\n",
			"alpha: [1, 2]\n",
			"missing: ~\n",
		)));
		let keys: Vec<_> = values.keys().map(String::as_str).collect();
		assert!(keys == ["zeta", "alpha", "missing"]);
		let_assert!(Ok(template) = Template::compile("{{zeta}} {{alpha}} {{missing}}"));
		let_assert!(Ok(output) = template.render(&values));
		assert!(output == "last [1, 2] None");
	}

	#[test]
	fn test_not_a_map() {
		let_assert!(Err(Error::NotAMap("str")) = values_from_str("just text"));
	}
}
