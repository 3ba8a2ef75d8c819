use serde::{
	de::{Error, MapAccess, SeqAccess, Visitor},
	Deserialize,
	Deserializer,
};

use crate::{Map, Template, Value};

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
	type Value = Value;

	fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
		formatter.write_str("a value")
	}

	fn visit_bool<E: Error>(self, v: bool) -> Result<Self::Value, E> {
		Ok(Value::Bool(v))
	}

	fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
		Ok(Value::Int(v))
	}

	fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
		i64::try_from(v)
			.map(Value::Int)
			.map_err(|_| E::custom(format_args!("integer {v} does not fit in 64 bits")))
	}

	fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
		Ok(Value::Float(v))
	}

	fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
		Ok(Value::Str(v.to_owned()))
	}

	fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
		Ok(Value::Str(v))
	}

	fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
		Ok(Value::None)
	}

	fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
		Ok(Value::None)
	}

	fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
		Value::deserialize(deserializer)
	}

	fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
		let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
		while let Some(item) = seq.next_element()? {
			items.push(item);
		}
		Ok(Value::List(items))
	}

	fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
		let mut entries = Map::with_capacity(map.size_hint().unwrap_or(0));
		while let Some((key, value)) = map.next_entry::<String, Value>()? {
			entries.insert(key, value);
		}
		Ok(Value::Map(entries))
	}
}

/// Deserialize a value from any self-describing format.
///
/// Sequences become lists and maps become ordered maps with string keys.
impl<'de> Deserialize<'de> for Value {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		deserializer.deserialize_any(ValueVisitor)
	}
}

struct TemplateVisitor;

impl<'de> Visitor<'de> for TemplateVisitor {
	type Value = Template;

	fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
		formatter.write_str("a template string")
	}

	fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
		self.visit_string(v.to_owned())
	}

	fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
		Template::compile(v).map_err(E::custom)
	}
}

/// Deserialize and compile a template from a string.
impl<'de> Deserialize<'de> for Template {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		deserializer.deserialize_string(TemplateVisitor)
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, check, let_assert};

	#[test]
	fn test_deserialize_value() {
		let_assert!(Ok(value) = serde_json::from_str::<Value>(r#"{"b": [1, 2.5, "x"], "a": null, "c": true}"#));
		let_assert!(Value::Map(map) = value);
		let keys: Vec<_> = map.keys().map(String::as_str).collect();
		check!(keys == ["b", "a", "c"]);
		check!(map["b"] == Value::from(vec![Value::Int(1), Value::Float(2.5), Value::from("x")]));
		check!(map["a"] == Value::None);
		check!(map["c"] == Value::Bool(true));
	}

	#[test]
	fn test_deserialize_tokens() {
		use serde_test::{assert_de_tokens, Token};

		let value = Value::from_iter([("a", Value::Int(-1)), ("b", Value::from(vec![Value::None, Value::from("x")]))]);
		assert_de_tokens(&value, &[
			Token::Map { len: Some(2) },
			Token::Str("a"),
			Token::I8(-1),
			Token::Str("b"),
			Token::Seq { len: Some(2) },
			Token::Unit,
			Token::String("x"),
			Token::SeqEnd,
			Token::MapEnd,
		]);
		assert_de_tokens(&Value::Int(7), &[Token::Some, Token::U8(7)]);
	}

	#[test]
	fn test_deserialize_large_integer() {
		assert!(serde_json::from_str::<Value>("18446744073709551615").is_err());
	}

	#[test]
	fn test_deserialize_template() {
		#[derive(serde::Deserialize)]
		struct Config {
			greeting: Template,
		}

		let_assert!(Ok(config) = serde_yaml::from_str::<Config>("greeting: 'Hello {{name}}!'"));
		let_assert!(Ok(output) = config.greeting.render(&[("name", "you")]));
		assert!(output == "Hello you!");

		let_assert!(Err(e) = serde_yaml::from_str::<Config>("greeting: '{{if x:}}'"));
		assert!(e.to_string().contains("endif"));
	}
}
