//! Runtime values seen by template expressions.

use std::fmt::Write;

use indexmap::IndexMap;

/// An ordered map from names to values.
///
/// Iteration order is insertion order, which is also the order used by `for` loops in templates.
pub type Map = IndexMap<String, Value>;

/// A value that can be bound to a name, computed by an expression or written to the output.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// The absence of a value.
	None,

	/// A boolean.
	Bool(bool),

	/// A signed integer.
	Int(i64),

	/// A floating point number.
	Float(f64),

	/// A string.
	Str(String),

	/// A list of values.
	List(Vec<Value>),

	/// A tuple of values.
	Tuple(Vec<Value>),

	/// An ordered map with string keys.
	Map(Map),
}

impl Value {
	/// Get the name of the type of the value, as shown in error messages.
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::None => "NoneType",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::Str(_) => "str",
			Self::List(_) => "list",
			Self::Tuple(_) => "tuple",
			Self::Map(_) => "dict",
		}
	}

	/// Check if the value counts as true in a condition.
	///
	/// `None`, `False`, zero and empty strings or collections are false, everything else is true.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::None => false,
			Self::Bool(x) => *x,
			Self::Int(x) => *x != 0,
			Self::Float(x) => *x != 0.0,
			Self::Str(x) => !x.is_empty(),
			Self::List(x) | Self::Tuple(x) => !x.is_empty(),
			Self::Map(x) => !x.is_empty(),
		}
	}

	/// Get a displayable representation of the value that quotes strings.
	///
	/// This is the form used for elements of collections.
	pub fn repr(&self) -> Repr<'_> {
		Repr(self)
	}
}

/// Displays a value with strings quoted, see [`Value::repr()`].
#[derive(Debug, Clone, Copy)]
pub struct Repr<'a>(&'a Value);

impl std::fmt::Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Str(x) => f.write_str(x),
			other => write_repr(f, other),
		}
	}
}

impl std::fmt::Display for Repr<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write_repr(f, self.0)
	}
}

fn write_repr(f: &mut std::fmt::Formatter<'_>, value: &Value) -> std::fmt::Result {
	match value {
		Value::None => f.write_str("None"),
		Value::Bool(true) => f.write_str("True"),
		Value::Bool(false) => f.write_str("False"),
		Value::Int(x) => write!(f, "{x}"),
		Value::Float(x) => write_float(f, *x),
		Value::Str(x) => write_quoted(f, x),
		Value::List(items) => {
			f.write_char('[')?;
			write_items(f, items)?;
			f.write_char(']')
		},
		Value::Tuple(items) => {
			f.write_char('(')?;
			write_items(f, items)?;
			if items.len() == 1 {
				f.write_char(',')?;
			}
			f.write_char(')')
		},
		Value::Map(map) => {
			f.write_char('{')?;
			for (i, (key, value)) in map.iter().enumerate() {
				if i > 0 {
					f.write_str(", ")?;
				}
				write_quoted(f, key)?;
				f.write_str(": ")?;
				write_repr(f, value)?;
			}
			f.write_char('}')
		},
	}
}

fn write_items(f: &mut std::fmt::Formatter<'_>, items: &[Value]) -> std::fmt::Result {
	for (i, item) in items.iter().enumerate() {
		if i > 0 {
			f.write_str(", ")?;
		}
		write_repr(f, item)?;
	}
	Ok(())
}

/// Floats with an integral value keep a trailing `.0` so they can be told apart from integers.
fn write_float(f: &mut std::fmt::Formatter<'_>, value: f64) -> std::fmt::Result {
	if value.is_nan() {
		f.write_str("nan")
	} else if value.is_infinite() {
		f.write_str(if value > 0.0 { "inf" } else { "-inf" })
	} else if value.fract() == 0.0 && value.abs() < 1e16 {
		write!(f, "{value:.1}")
	} else {
		write!(f, "{value}")
	}
}

fn write_quoted(f: &mut std::fmt::Formatter<'_>, value: &str) -> std::fmt::Result {
	let quote = if value.contains('\'') && !value.contains('"') { '"' } else { '\'' };
	f.write_char(quote)?;
	for c in value.chars() {
		match c {
			'\\' => f.write_str("\\\\")?,
			'\n' => f.write_str("\\n")?,
			'\r' => f.write_str("\\r")?,
			'\t' => f.write_str("\\t")?,
			c if c == quote => {
				f.write_char('\\')?;
				f.write_char(c)?;
			},
			c => f.write_char(c)?,
		}
	}
	f.write_char(quote)
}

impl From<bool> for Value {
	fn from(other: bool) -> Self {
		Self::Bool(other)
	}
}

impl From<i64> for Value {
	fn from(other: i64) -> Self {
		Self::Int(other)
	}
}

impl From<i32> for Value {
	fn from(other: i32) -> Self {
		Self::Int(other.into())
	}
}

impl From<u32> for Value {
	fn from(other: u32) -> Self {
		Self::Int(other.into())
	}
}

impl From<usize> for Value {
	fn from(other: usize) -> Self {
		match i64::try_from(other) {
			Ok(x) => Self::Int(x),
			Err(_) => Self::Float(other as f64),
		}
	}
}

impl From<f64> for Value {
	fn from(other: f64) -> Self {
		Self::Float(other)
	}
}

impl From<f32> for Value {
	fn from(other: f32) -> Self {
		Self::Float(other.into())
	}
}

impl From<&str> for Value {
	fn from(other: &str) -> Self {
		Self::Str(other.to_owned())
	}
}

impl From<&String> for Value {
	fn from(other: &String) -> Self {
		Self::Str(other.clone())
	}
}

impl From<String> for Value {
	fn from(other: String) -> Self {
		Self::Str(other)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(other: Vec<T>) -> Self {
		Self::List(other.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(other: Option<T>) -> Self {
		match other {
			Some(x) => x.into(),
			None => Self::None,
		}
	}
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
	fn from((a, b): (A, B)) -> Self {
		Self::Tuple(vec![a.into(), b.into()])
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

impl From<Map> for Value {
	fn from(other: Map) -> Self {
		Self::Map(other)
	}
}

impl<V: Into<Value>> From<std::collections::BTreeMap<String, V>> for Value {
	fn from(other: std::collections::BTreeMap<String, V>) -> Self {
		other.into_iter().collect()
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, check};

	#[test]
	fn test_display() {
		check!(Value::None.to_string() == "None");
		check!(Value::Bool(true).to_string() == "True");
		check!(Value::Int(-42).to_string() == "-42");
		check!(Value::Float(1.0).to_string() == "1.0");
		check!(Value::Float(0.25).to_string() == "0.25");
		check!(Value::Float(f64::INFINITY).to_string() == "inf");
		check!(Value::from("plain").to_string() == "plain");
	}

	#[test]
	fn test_display_collections() {
		let list = Value::from(vec![Value::Int(1), Value::from("a"), Value::None]);
		check!(list.to_string() == "[1, 'a', None]");
		check!(Value::Tuple(vec![Value::Int(1)]).to_string() == "(1,)");
		check!(Value::Tuple(vec![]).to_string() == "()");

		let map: Value = [("k", 1), ("it's", 2)].into_iter().collect();
		check!(map.to_string() == r#"{'k': 1, "it's": 2}"#);
	}

	#[test]
	fn test_repr_escapes() {
		check!(Value::from("a\nb").repr().to_string() == r"'a\nb'");
		check!(Value::from(r"back\slash").repr().to_string() == r"'back\\slash'");
		check!(Value::from("both ' and \"").repr().to_string() == r#"'both \' and "'"#);
	}

	#[test]
	fn test_truthiness() {
		assert!(!Value::None.is_truthy());
		assert!(!Value::Int(0).is_truthy());
		assert!(!Value::from("").is_truthy());
		assert!(!Value::List(vec![]).is_truthy());
		assert!(Value::Float(0.5).is_truthy());
		assert!(Value::from("x").is_truthy());
		assert!(Value::Tuple(vec![Value::None]).is_truthy());
	}
}
