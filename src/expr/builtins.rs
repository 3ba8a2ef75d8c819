//! Builtin functions and methods available to expressions.

use std::cmp::Ordering;

use super::eval::{attribute_error, check_sequence_len, equals, iterate, order, overflow};
use crate::error::RunError;
use crate::value::Value;

/// Call a builtin function by name.
///
/// Returns `None` if there is no builtin with the given name.
pub(super) fn call_function(name: &str, args: Vec<Value>) -> Option<Result<Value, RunError>> {
	let result = match name {
		"len" => len(args),
		"str" => optional_argument(name, args).map(|x| Value::Str(x.map(|x| x.to_string()).unwrap_or_default())),
		"repr" => single_argument(name, args).map(|x| Value::Str(x.repr().to_string())),
		"int" => single_argument(name, args).and_then(to_int),
		"float" => single_argument(name, args).and_then(to_float),
		"bool" => optional_argument(name, args).map(|x| Value::Bool(x.is_some_and(|x| x.is_truthy()))),
		"range" => range(args),
		"abs" => single_argument(name, args).and_then(abs),
		"min" => extreme(name, args, Ordering::Less),
		"max" => extreme(name, args, Ordering::Greater),
		"sorted" => single_argument(name, args).and_then(iterate).and_then(sorted).map(Value::List),
		"enumerate" => enumerate(args),
		"list" => optional_argument(name, args).and_then(|x| match x {
			Some(x) => iterate(x).map(Value::List),
			None => Ok(Value::List(Vec::new())),
		}),
		_ => return None,
	};
	Some(result)
}

/// Call a method on a value.
pub(super) fn call_method(value: Value, name: &str, args: Vec<Value>) -> Result<Value, RunError> {
	match value {
		Value::Str(text) => string_method(text, name, args),
		Value::Map(map) => match name {
			"keys" => {
				no_arguments(name, &args)?;
				Ok(Value::List(map.into_keys().map(Value::Str).collect()))
			},
			"values" => {
				no_arguments(name, &args)?;
				Ok(Value::List(map.into_values().collect()))
			},
			"items" => {
				no_arguments(name, &args)?;
				iterate(Value::Map(map)).map(Value::List)
			},
			"get" => {
				check_arity(name, &args, 1, 2)?;
				let mut args = args.into_iter();
				let key = args.next().unwrap_or(Value::None);
				let default = args.next().unwrap_or(Value::None);
				match key {
					Value::Str(key) => Ok(map.get(key.as_str()).cloned().unwrap_or(default)),
					_ => Ok(default),
				}
			},
			_ => Err(attribute_error(&Value::Map(map), name)),
		},
		Value::List(items) | Value::Tuple(items) if name == "index" || name == "count" => {
			let needle = single_argument(name, args)?;
			if name == "count" {
				let count = items.iter().filter(|x| equals(x, &needle)).count();
				return Ok(Value::from(count));
			}
			items
				.iter()
				.position(|x| equals(x, &needle))
				.map(Value::from)
				.ok_or_else(|| RunError::Value(format!("{} is not in sequence", needle.repr())))
		},
		other => Err(attribute_error(&other, name)),
	}
}

fn check_arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), RunError> {
	if (min..=max).contains(&args.len()) {
		return Ok(());
	}
	let expected = if min == max {
		format!("exactly {min}")
	} else if args.len() < min {
		format!("at least {min}")
	} else {
		format!("at most {max}")
	};
	let plural = if min == max && min == 1 { "argument" } else { "arguments" };
	Err(RunError::Type(format!("{name}() takes {expected} {plural} ({} given)", args.len())))
}

fn no_arguments(name: &str, args: &[Value]) -> Result<(), RunError> {
	check_arity(name, args, 0, 0)
}

fn single_argument(name: &str, args: Vec<Value>) -> Result<Value, RunError> {
	check_arity(name, &args, 1, 1)?;
	Ok(args.into_iter().next().unwrap_or(Value::None))
}

fn optional_argument(name: &str, args: Vec<Value>) -> Result<Option<Value>, RunError> {
	check_arity(name, &args, 0, 1)?;
	Ok(args.into_iter().next())
}

fn expect_str(function: &str, value: Value) -> Result<String, RunError> {
	match value {
		Value::Str(x) => Ok(x),
		other => Err(RunError::Type(format!("{function}() argument must be str, not {}", other.type_name()))),
	}
}

fn expect_int(function: &str, value: &Value) -> Result<i64, RunError> {
	match value {
		Value::Int(x) => Ok(*x),
		Value::Bool(x) => Ok(i64::from(*x)),
		other => Err(RunError::Type(format!(
			"{function}() argument must be an integer, not {}",
			other.type_name()
		))),
	}
}

fn len(args: Vec<Value>) -> Result<Value, RunError> {
	let len = match single_argument("len", args)? {
		Value::Str(x) => x.chars().count(),
		Value::List(x) | Value::Tuple(x) => x.len(),
		Value::Map(x) => x.len(),
		other => return Err(RunError::Type(format!("object of type '{}' has no len()", other.type_name()))),
	};
	Ok(Value::from(len))
}

fn to_int(value: Value) -> Result<Value, RunError> {
	match value {
		Value::Int(x) => Ok(Value::Int(x)),
		Value::Bool(x) => Ok(Value::Int(i64::from(x))),
		Value::Float(x) if x.is_finite() && x.trunc().abs() < 9.2e18 => Ok(Value::Int(x.trunc() as i64)),
		Value::Float(x) => Err(RunError::Value(format!("cannot convert float {} to integer", Value::Float(x)))),
		Value::Str(text) => text
			.trim()
			.replace('_', "")
			.parse()
			.map(Value::Int)
			.map_err(|_| RunError::Value(format!("invalid literal for int() with base 10: {}", Value::Str(text).repr()))),
		other => Err(RunError::Type(format!(
			"int() argument must be a string or a number, not '{}'",
			other.type_name()
		))),
	}
}

fn to_float(value: Value) -> Result<Value, RunError> {
	match value {
		Value::Int(x) => Ok(Value::Float(x as f64)),
		Value::Bool(x) => Ok(Value::Float(if x { 1.0 } else { 0.0 })),
		Value::Float(x) => Ok(Value::Float(x)),
		Value::Str(text) => text
			.trim()
			.parse()
			.map(Value::Float)
			.map_err(|_| RunError::Value(format!("could not convert string to float: {}", Value::Str(text).repr()))),
		other => Err(RunError::Type(format!(
			"float() argument must be a string or a number, not '{}'",
			other.type_name()
		))),
	}
}

fn abs(value: Value) -> Result<Value, RunError> {
	match value {
		Value::Int(x) => x.checked_abs().map(Value::Int).ok_or_else(|| RunError::Value("integer overflow".into())),
		Value::Bool(x) => Ok(Value::Int(i64::from(x))),
		Value::Float(x) => Ok(Value::Float(x.abs())),
		other => Err(RunError::Type(format!("bad operand type for abs(): '{}'", other.type_name()))),
	}
}

fn range(args: Vec<Value>) -> Result<Value, RunError> {
	check_arity("range", &args, 1, 3)?;
	let args = args.iter().map(|x| expect_int("range", x)).collect::<Result<Vec<_>, _>>()?;
	let (start, stop, step) = match args[..] {
		[stop] => (0, stop, 1),
		[start, stop] => (start, stop, 1),
		[start, stop, step] => (start, stop, step),
		_ => (0, 0, 1),
	};
	if step == 0 {
		return Err(RunError::Value("range() arg 3 must not be zero".into()));
	}

	let span = if step > 0 {
		i128::from(stop) - i128::from(start)
	} else {
		i128::from(start) - i128::from(stop)
	};
	let len = if span <= 0 { 0 } else { (span - 1) / i128::from(step).abs() + 1 };
	check_sequence_len(usize::try_from(len).ok())?;

	let mut items = Vec::with_capacity(len as usize);
	let mut current = start;
	while (step > 0 && current < stop) || (step < 0 && current > stop) {
		items.push(Value::Int(current));
		current = match current.checked_add(step) {
			Some(x) => x,
			None => break,
		};
	}
	Ok(Value::List(items))
}

/// Find the smallest (`Ordering::Less`) or largest (`Ordering::Greater`) item.
fn extreme(name: &str, args: Vec<Value>, wanted: Ordering) -> Result<Value, RunError> {
	let items = match args.len() {
		0 => return Err(RunError::Type(format!("{name} expected at least 1 argument, got 0"))),
		1 => iterate(args.into_iter().next().unwrap_or(Value::None))?,
		_ => args,
	};
	let symbol = if wanted == Ordering::Less { "<" } else { ">" };
	let mut items = items.into_iter();
	let mut best = items.next().ok_or_else(|| RunError::Value(format!("{name}() arg is an empty sequence")))?;
	for item in items {
		if order(&item, &best, symbol)? == Some(wanted) {
			best = item;
		}
	}
	Ok(best)
}

/// Sort values with a stable insertion sort.
///
/// Comparisons can fail for mixed types, so the standard library sort can not be used directly.
fn sorted(items: Vec<Value>) -> Result<Vec<Value>, RunError> {
	let mut result: Vec<Value> = Vec::with_capacity(items.len());
	for item in items {
		let mut index = result.len();
		while index > 0 && order(&item, &result[index - 1], "<")? == Some(Ordering::Less) {
			index -= 1;
		}
		result.insert(index, item);
	}
	Ok(result)
}

fn enumerate(args: Vec<Value>) -> Result<Value, RunError> {
	check_arity("enumerate", &args, 1, 2)?;
	let mut args = args.into_iter();
	let items = iterate(args.next().unwrap_or(Value::None))?;
	let start = match args.next() {
		Some(x) => expect_int("enumerate", &x)?,
		None => 0,
	};
	let mut result = Vec::with_capacity(items.len());
	let mut index = Some(start);
	for item in items {
		let current = index.ok_or_else(overflow)?;
		result.push(Value::Tuple(vec![Value::Int(current), item]));
		index = current.checked_add(1);
	}
	Ok(Value::List(result))
}

fn string_method(text: String, name: &str, args: Vec<Value>) -> Result<Value, RunError> {
	match name {
		"upper" => {
			no_arguments(name, &args)?;
			Ok(Value::Str(text.to_uppercase()))
		},
		"lower" => {
			no_arguments(name, &args)?;
			Ok(Value::Str(text.to_lowercase()))
		},
		"strip" | "lstrip" | "rstrip" => {
			let chars = match optional_argument(name, args)? {
				None | Some(Value::None) => None,
				Some(x) => Some(expect_str(name, x)?),
			};
			let matches = |c: char| match &chars {
				Some(chars) => chars.contains(c),
				None => c.is_whitespace(),
			};
			let stripped = match name {
				"lstrip" => text.trim_start_matches(matches),
				"rstrip" => text.trim_end_matches(matches),
				_ => text.trim_matches(matches),
			};
			Ok(Value::Str(stripped.to_owned()))
		},
		"title" => {
			no_arguments(name, &args)?;
			let mut result = String::with_capacity(text.len());
			let mut in_word = false;
			for c in text.chars() {
				if c.is_alphabetic() {
					if in_word {
						result.extend(c.to_lowercase());
					} else {
						result.extend(c.to_uppercase());
					}
					in_word = true;
				} else {
					result.push(c);
					in_word = false;
				}
			}
			Ok(Value::Str(result))
		},
		"capitalize" => {
			no_arguments(name, &args)?;
			let mut chars = text.chars();
			let result = match chars.next() {
				Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
				None => String::new(),
			};
			Ok(Value::Str(result))
		},
		"replace" => {
			check_arity(name, &args, 2, 2)?;
			let mut args = args.into_iter();
			let old = expect_str(name, args.next().unwrap_or(Value::None))?;
			let new = expect_str(name, args.next().unwrap_or(Value::None))?;
			Ok(Value::Str(text.replace(&old, &new)))
		},
		"split" => {
			let parts: Vec<Value> = match optional_argument(name, args)? {
				None | Some(Value::None) => text.split_whitespace().map(Value::from).collect(),
				Some(separator) => {
					let separator = expect_str(name, separator)?;
					if separator.is_empty() {
						return Err(RunError::Value("empty separator".into()));
					}
					text.split(separator.as_str()).map(Value::from).collect()
				},
			};
			Ok(Value::List(parts))
		},
		"join" => {
			let items = iterate(single_argument(name, args)?)?;
			let mut parts = Vec::with_capacity(items.len());
			for (index, item) in items.into_iter().enumerate() {
				match item {
					Value::Str(x) => parts.push(x),
					other => {
						return Err(RunError::Type(format!(
							"sequence item {index}: expected str instance, {} found",
							other.type_name()
						)))
					},
				}
			}
			Ok(Value::Str(parts.join(&text)))
		},
		"startswith" | "endswith" => {
			let candidates = match single_argument(name, args)? {
				Value::Tuple(items) => items.into_iter().map(|x| expect_str(name, x)).collect::<Result<Vec<_>, _>>()?,
				other => vec![expect_str(name, other)?],
			};
			let found = candidates.iter().any(|x| {
				if name == "startswith" {
					text.starts_with(x.as_str())
				} else {
					text.ends_with(x.as_str())
				}
			});
			Ok(Value::Bool(found))
		},
		_ => Err(attribute_error(&Value::Str(text), name)),
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use crate::expr::{parse_expression, Scope};
	use crate::error::RunError;
	use crate::Value;
	use assert2::{assert, check, let_assert};

	fn eval(source: &str) -> Result<Value, RunError> {
		let mut scope = Scope::new();
		scope.bind("d", [("b", 2), ("a", 1)].into_iter().collect());
		let_assert!(Ok(expr) = parse_expression(source));
		expr.eval(&scope)
	}

	fn text(source: &str) -> String {
		let_assert!(Ok(value) = eval(source));
		value.to_string()
	}

	#[test]
	fn test_functions() {
		check!(text("len('héllo')") == "5");
		check!(text("len(d)") == "2");
		check!(text("str(1.5) + str()") == "1.5");
		check!(text("repr('a')") == "'a'");
		check!(text("int(' 42 ') + int(2.9) + int(True)") == "45");
		check!(text("float('2.5')") == "2.5");
		check!(text("bool([])") == "False");
		check!(text("range(3)") == "[0, 1, 2]");
		check!(text("range(5, 0, -2)") == "[5, 3, 1]");
		check!(text("abs(-3)") == "3");
		check!(text("min(3, 1, 2)") == "1");
		check!(text("max([3, 1, 2])") == "3");
		check!(text("sorted(['b', 'c', 'a'])") == "['a', 'b', 'c']");
		check!(text("enumerate('ab', 1)") == "[(1, 'a'), (2, 'b')]");
		check!(text("list(d)") == "[('b', 2), ('a', 1)]");
	}

	#[test]
	fn test_range_limits() {
		let_assert!(Err(RunError::Value(_)) = eval("range(9223372036854775807)"));
		let_assert!(Err(RunError::Value(_)) = eval("range(-9223372036854775807 - 1, 9223372036854775807)"));
		check!(text("range(9223372036854775806, 9223372036854775807)") == "[9223372036854775806]");
		check!(text("range(9223372036854775807, 0)") == "[]");
		check!(text("range(0, 10, 4)") == "[0, 4, 8]");
		check!(text("range(10, 0, -4)") == "[10, 6, 2]");
	}

	#[test]
	fn test_enumerate_overflow() {
		let_assert!(Err(RunError::Value(message)) = eval("enumerate([1, 2], 9223372036854775807)"));
		check!(message == "integer overflow");
		check!(text("enumerate([1], 9223372036854775807)") == "[(9223372036854775807, 1)]");
		check!(text("enumerate([], 9223372036854775807)") == "[]");
	}

	#[test]
	fn test_function_errors() {
		let_assert!(Err(RunError::Value(_)) = eval("int('x')"));
		let_assert!(Err(RunError::Value(_)) = eval("range(1, 2, 0)"));
		let_assert!(Err(RunError::Value(_)) = eval("max([])"));
		let_assert!(Err(RunError::Type(message)) = eval("len(1, 2)"));
		assert!(message == "len() takes exactly 1 argument (2 given)");
		let_assert!(Err(RunError::Type(_)) = eval("sorted([1, 'a'])"));
	}

	#[test]
	fn test_string_methods() {
		check!(text("'abc'.upper()") == "ABC");
		check!(text("'  x  '.strip() + '|'") == "x|");
		check!(text("'xxaxx'.lstrip('x')") == "axx");
		check!(text("'hello world'.title()") == "Hello World");
		check!(text("'hELLO'.capitalize()") == "Hello");
		check!(text("'a-b'.replace('-', '+')") == "a+b");
		check!(text("' a  b '.split()") == "['a', 'b']");
		check!(text("'a,b'.split(',')") == "['a', 'b']");
		check!(text("', '.join(['x', 'y'])") == "x, y");
		check!(text("'file.txt'.endswith(('.md', '.txt'))") == "True");
		let_assert!(Err(RunError::Attribute { .. }) = eval("'a'.nosuchmethod()"));
		let_assert!(Err(RunError::Type(_)) = eval("''.join([1])"));
	}

	#[test]
	fn test_map_and_list_methods() {
		check!(text("d.keys()") == "['b', 'a']");
		check!(text("d.values()") == "[2, 1]");
		check!(text("d.items()") == "[('b', 2), ('a', 1)]");
		check!(text("d.get('a')") == "1");
		check!(text("d.get('z', 0)") == "0");
		check!(text("[1, 2, 1].count(1)") == "2");
		check!(text("(5, 6).index(6)") == "1");
		let_assert!(Err(RunError::Value(_)) = eval("[1].index(2)"));
		let_assert!(Err(RunError::Type(_)) = eval("d.b()"));
	}
}
