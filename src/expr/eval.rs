use std::cmp::Ordering;

use super::builtins;
use super::{BinaryOp, CompareOp, Expr, Stmt, Target, UnaryOp};
use crate::error::RunError;
use crate::value::{Map, Value};

/// The names visible to expressions while a template runs.
///
/// Assignments in `script` blocks and `for` loop bindings are written to the scope.
/// There is a single flat scope per run: names bound inside a loop stay visible after it.
#[derive(Debug, Clone, Default)]
pub struct Scope {
	vars: Map,
}

impl Scope {
	/// Create an empty scope.
	pub fn new() -> Self {
		Self::default()
	}

	/// Bind a name to a value, replacing any previous binding.
	pub fn bind(&mut self, name: impl Into<String>, value: Value) {
		self.vars.insert(name.into(), value);
	}

	/// Look up the value bound to a name.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.vars.get(name)
	}

	/// Check if a name is bound.
	pub fn contains(&self, name: &str) -> bool {
		self.vars.contains_key(name)
	}
}

impl Expr {
	/// Evaluate the expression in a scope.
	pub fn eval(&self, scope: &Scope) -> Result<Value, RunError> {
		match self {
			Self::Literal(value) => Ok(value.clone()),
			Self::Name(name) => scope.get(name).cloned().ok_or_else(|| RunError::UndefinedName(name.clone())),
			Self::List(items) => Ok(Value::List(eval_all(items, scope)?)),
			Self::Tuple(items) => Ok(Value::Tuple(eval_all(items, scope)?)),
			Self::Dict(entries) => {
				let mut map = Map::with_capacity(entries.len());
				for (key, value) in entries {
					let key = match key.eval(scope)? {
						Value::Str(key) => key,
						other => return Err(RunError::Type(format!("dict keys must be str, not {}", other.type_name()))),
					};
					map.insert(key, value.eval(scope)?);
				}
				Ok(Value::Map(map))
			},
			Self::Attribute(value, name) => {
				let value = value.eval(scope)?;
				match &value {
					Value::Map(map) => map.get(name).cloned().ok_or_else(|| attribute_error(&value, name)),
					other => Err(attribute_error(other, name)),
				}
			},
			Self::Index(value, index) => {
				let value = value.eval(scope)?;
				let index = index.eval(scope)?;
				get_item(&value, &index)
			},
			Self::Slice(value, lower, upper) => {
				let value = value.eval(scope)?;
				let lower = eval_optional(lower.as_deref(), scope)?;
				let upper = eval_optional(upper.as_deref(), scope)?;
				slice(&value, &lower, &upper)
			},
			Self::Call(function, args) => call(function, args, scope),
			Self::Unary(op, value) => unary(*op, value.eval(scope)?),
			Self::Binary(op, left, right) => {
				let left = left.eval(scope)?;
				let right = right.eval(scope)?;
				binary(*op, &left, &right)
			},
			Self::Not(value) => Ok(Value::Bool(!value.eval(scope)?.is_truthy())),
			Self::And(left, right) => {
				let left = left.eval(scope)?;
				if !left.is_truthy() {
					return Ok(left);
				}
				right.eval(scope)
			},
			Self::Or(left, right) => {
				let left = left.eval(scope)?;
				if left.is_truthy() {
					return Ok(left);
				}
				right.eval(scope)
			},
			Self::Compare(first, rest) => {
				let mut left = first.eval(scope)?;
				for (op, right) in rest {
					let right = right.eval(scope)?;
					if !compare(*op, &left, &right)? {
						return Ok(Value::Bool(false));
					}
					left = right;
				}
				Ok(Value::Bool(true))
			},
			Self::Conditional { condition, then, otherwise } => {
				if condition.eval(scope)?.is_truthy() {
					then.eval(scope)
				} else {
					otherwise.eval(scope)
				}
			},
		}
	}
}

impl Stmt {
	/// Execute the statement, updating the scope.
	pub fn exec(&self, scope: &mut Scope) -> Result<(), RunError> {
		match self {
			Self::Expr(expr) => {
				expr.eval(scope)?;
			},
			Self::Assign(target, value) => {
				let value = value.eval(scope)?;
				target.assign(scope, value)?;
			},
			Self::AugAssign(name, op, value) => {
				let current = scope.get(name).ok_or_else(|| RunError::UndefinedName(name.clone()))?;
				let value = binary(*op, current, &value.eval(scope)?)?;
				scope.bind(name.as_str(), value);
			},
			Self::Pass => (),
		}
		Ok(())
	}
}

impl Target {
	/// Bind a value to the target, unpacking it if the target is a tuple.
	pub fn assign(&self, scope: &mut Scope, value: Value) -> Result<(), RunError> {
		match self {
			Self::Name(name) => {
				scope.bind(name.as_str(), value);
				Ok(())
			},
			Self::Tuple(targets) => {
				let items = iterate(value)?;
				match items.len().cmp(&targets.len()) {
					Ordering::Less => Err(RunError::Value(format!(
						"not enough values to unpack (expected {}, got {})",
						targets.len(),
						items.len()
					))),
					Ordering::Greater => Err(RunError::Value(format!("too many values to unpack (expected {})", targets.len()))),
					Ordering::Equal => {
						for (target, item) in targets.iter().zip(items) {
							target.assign(scope, item)?;
						}
						Ok(())
					},
				}
			},
		}
	}
}

fn eval_all(exprs: &[Expr], scope: &Scope) -> Result<Vec<Value>, RunError> {
	exprs.iter().map(|x| x.eval(scope)).collect()
}

fn eval_optional(expr: Option<&Expr>, scope: &Scope) -> Result<Value, RunError> {
	match expr {
		Some(expr) => expr.eval(scope),
		None => Ok(Value::None),
	}
}

fn call(function: &Expr, args: &[Expr], scope: &Scope) -> Result<Value, RunError> {
	match function {
		Expr::Name(name) if !scope.contains(name) => {
			let args = eval_all(args, scope)?;
			builtins::call_function(name, args).unwrap_or_else(|| Err(RunError::UndefinedName(name.clone())))
		},
		Expr::Attribute(value, name) => {
			let value = value.eval(scope)?;
			if let Value::Map(map) = &value {
				if let Some(member) = map.get(name) {
					return Err(not_callable(member));
				}
			}
			let args = eval_all(args, scope)?;
			builtins::call_method(value, name, args)
		},
		other => Err(not_callable(&other.eval(scope)?)),
	}
}

fn not_callable(value: &Value) -> RunError {
	RunError::Type(format!("'{}' object is not callable", value.type_name()))
}

pub(super) fn attribute_error(value: &Value, name: &str) -> RunError {
	RunError::Attribute {
		type_name: value.type_name(),
		name: name.to_owned(),
	}
}

/// A numeric view of a value: booleans count as integers.
#[derive(Debug, Clone, Copy)]
enum Number {
	Int(i64),
	Float(f64),
}

impl Number {
	fn of(value: &Value) -> Option<Self> {
		match value {
			Value::Bool(x) => Some(Self::Int(i64::from(*x))),
			Value::Int(x) => Some(Self::Int(*x)),
			Value::Float(x) => Some(Self::Float(*x)),
			_ => None,
		}
	}

	fn as_float(self) -> f64 {
		match self {
			Self::Int(x) => x as f64,
			Self::Float(x) => x,
		}
	}
}

pub(super) fn overflow() -> RunError {
	RunError::Value("integer overflow".into())
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, RunError> {
	let number = Number::of(&value).ok_or_else(|| {
		let symbol = match op {
			UnaryOp::Negate => '-',
			UnaryOp::Plus => '+',
		};
		RunError::Type(format!("bad operand type for unary {symbol}: '{}'", value.type_name()))
	})?;
	match (op, number) {
		(UnaryOp::Negate, Number::Int(x)) => x.checked_neg().map(Value::Int).ok_or_else(overflow),
		(UnaryOp::Negate, Number::Float(x)) => Ok(Value::Float(-x)),
		(UnaryOp::Plus, Number::Int(x)) => Ok(Value::Int(x)),
		(UnaryOp::Plus, Number::Float(x)) => Ok(Value::Float(x)),
	}
}

fn operator_symbol(op: BinaryOp) -> &'static str {
	match op {
		BinaryOp::Add => "+",
		BinaryOp::Subtract => "-",
		BinaryOp::Multiply => "*",
		BinaryOp::Divide => "/",
		BinaryOp::FloorDivide => "//",
		BinaryOp::Remainder => "%",
	}
}

/// Apply a binary arithmetic operator.
pub(super) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RunError> {
	if let (Some(a), Some(b)) = (Number::of(left), Number::of(right)) {
		return arithmetic(op, a, b);
	}

	match (op, left, right) {
		(BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
		(BinaryOp::Add, Value::List(a), Value::List(b)) => Ok(Value::List(a.iter().chain(b).cloned().collect())),
		(BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple(a.iter().chain(b).cloned().collect())),
		(BinaryOp::Multiply, sequence, count) | (BinaryOp::Multiply, count, sequence) if is_repeatable(sequence) && is_count(count) => {
			let count = match Number::of(count) {
				Some(Number::Int(x)) => usize::try_from(x).unwrap_or(0),
				_ => 0,
			};
			repeat(sequence, count)
		},
		_ => Err(RunError::Type(format!(
			"unsupported operand type(s) for {}: '{}' and '{}'",
			operator_symbol(op),
			left.type_name(),
			right.type_name()
		))),
	}
}

fn is_repeatable(value: &Value) -> bool {
	matches!(value, Value::Str(_) | Value::List(_) | Value::Tuple(_))
}

fn is_count(value: &Value) -> bool {
	matches!(value, Value::Int(_) | Value::Bool(_))
}

fn repeat(sequence: &Value, count: usize) -> Result<Value, RunError> {
	match sequence {
		Value::Str(x) => {
			check_sequence_len(x.len().checked_mul(count))?;
			Ok(Value::Str(x.repeat(count)))
		},
		Value::List(x) => Ok(Value::List(repeat_items(x, count)?)),
		Value::Tuple(x) => Ok(Value::Tuple(repeat_items(x, count)?)),
		other => Err(RunError::Type(format!("can't multiply sequence of type '{}'", other.type_name()))),
	}
}

/// The maximum length of a sequence built by repetition or `range()`.
///
/// For strings, the length is counted in bytes.
pub(super) const MAX_SEQUENCE_LEN: usize = 1 << 24;

/// Check the length of a sequence that is about to be built.
///
/// `None` means the length overflowed.
pub(super) fn check_sequence_len(len: Option<usize>) -> Result<(), RunError> {
	match len {
		Some(x) if x <= MAX_SEQUENCE_LEN => Ok(()),
		_ => Err(RunError::Value(format!("sequence would be longer than {MAX_SEQUENCE_LEN} items"))),
	}
}

fn repeat_items(items: &[Value], count: usize) -> Result<Vec<Value>, RunError> {
	check_sequence_len(items.len().checked_mul(count))?;
	if items.is_empty() {
		return Ok(Vec::new());
	}
	let mut result = Vec::with_capacity(items.len() * count);
	for _ in 0..count {
		result.extend_from_slice(items);
	}
	Ok(result)
}

fn arithmetic(op: BinaryOp, a: Number, b: Number) -> Result<Value, RunError> {
	use Number::Int;
	match (op, a, b) {
		(BinaryOp::Add, Int(a), Int(b)) => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
		(BinaryOp::Subtract, Int(a), Int(b)) => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
		(BinaryOp::Multiply, Int(a), Int(b)) => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
		(BinaryOp::FloorDivide, Int(a), Int(b)) => {
			if b == 0 {
				return Err(RunError::ZeroDivision);
			}
			let quotient = a.checked_div(b).ok_or_else(overflow)?;
			if a % b != 0 && (a < 0) != (b < 0) {
				Ok(Value::Int(quotient - 1))
			} else {
				Ok(Value::Int(quotient))
			}
		},
		(BinaryOp::Remainder, Int(a), Int(b)) => {
			if b == 0 {
				return Err(RunError::ZeroDivision);
			}
			let remainder = a.checked_rem(b).unwrap_or(0);
			if remainder != 0 && (remainder < 0) != (b < 0) {
				Ok(Value::Int(remainder + b))
			} else {
				Ok(Value::Int(remainder))
			}
		},
		(op, a, b) => {
			let (a, b) = (a.as_float(), b.as_float());
			match op {
				BinaryOp::Add => Ok(Value::Float(a + b)),
				BinaryOp::Subtract => Ok(Value::Float(a - b)),
				BinaryOp::Multiply => Ok(Value::Float(a * b)),
				BinaryOp::Divide if b == 0.0 => Err(RunError::ZeroDivision),
				BinaryOp::Divide => Ok(Value::Float(a / b)),
				BinaryOp::FloorDivide if b == 0.0 => Err(RunError::ZeroDivision),
				BinaryOp::FloorDivide => Ok(Value::Float((a / b).floor())),
				BinaryOp::Remainder if b == 0.0 => Err(RunError::ZeroDivision),
				BinaryOp::Remainder => {
					let remainder = a % b;
					if remainder != 0.0 && (remainder < 0.0) != (b < 0.0) {
						Ok(Value::Float(remainder + b))
					} else {
						Ok(Value::Float(remainder))
					}
				},
			}
		},
	}
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, RunError> {
	match op {
		CompareOp::Equal => Ok(equals(left, right)),
		CompareOp::NotEqual => Ok(!equals(left, right)),
		CompareOp::Less => Ok(order(left, right, "<")? == Some(Ordering::Less)),
		CompareOp::LessEqual => Ok(matches!(order(left, right, "<=")?, Some(Ordering::Less | Ordering::Equal))),
		CompareOp::Greater => Ok(order(left, right, ">")? == Some(Ordering::Greater)),
		CompareOp::GreaterEqual => Ok(matches!(order(left, right, ">=")?, Some(Ordering::Greater | Ordering::Equal))),
		CompareOp::In => contains(right, left),
		CompareOp::NotIn => Ok(!contains(right, left)?),
		CompareOp::Is => Ok(identical(left, right)),
		CompareOp::IsNot => Ok(!identical(left, right)),
	}
}

/// Identity is only meaningful for the singletons `None`, `True` and `False`.
fn identical(left: &Value, right: &Value) -> bool {
	match (left, right) {
		(Value::None, Value::None) => true,
		(Value::Bool(a), Value::Bool(b)) => a == b,
		_ => false,
	}
}

/// Check two values for equality, treating numbers of different types as comparable.
pub(super) fn equals(left: &Value, right: &Value) -> bool {
	if let (Some(a), Some(b)) = (Number::of(left), Number::of(right)) {
		return match (a, b) {
			(Number::Int(a), Number::Int(b)) => a == b,
			(a, b) => a.as_float() == b.as_float(),
		};
	}
	match (left, right) {
		(Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
			a.len() == b.len() && a.iter().zip(b).all(|(a, b)| equals(a, b))
		},
		(Value::Map(a), Value::Map(b)) => {
			a.len() == b.len() && a.iter().all(|(key, a)| b.get(key).is_some_and(|b| equals(a, b)))
		},
		(a, b) => a == b,
	}
}

/// Order two values.
///
/// Returns `None` for unordered floats (NaN).
pub(super) fn order(left: &Value, right: &Value, symbol: &str) -> Result<Option<Ordering>, RunError> {
	if let (Some(a), Some(b)) = (Number::of(left), Number::of(right)) {
		return Ok(match (a, b) {
			(Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
			(a, b) => a.as_float().partial_cmp(&b.as_float()),
		});
	}
	match (left, right) {
		(Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
		(Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
			for (a, b) in a.iter().zip(b) {
				if !equals(a, b) {
					return order(a, b, symbol);
				}
			}
			Ok(Some(a.len().cmp(&b.len())))
		},
		_ => Err(RunError::Type(format!(
			"'{symbol}' not supported between instances of '{}' and '{}'",
			left.type_name(),
			right.type_name()
		))),
	}
}

fn contains(container: &Value, item: &Value) -> Result<bool, RunError> {
	match (container, item) {
		(Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_str())),
		(Value::Str(_), other) => Err(RunError::Type(format!(
			"'in <string>' requires string as left operand, not {}",
			other.type_name()
		))),
		(Value::List(items) | Value::Tuple(items), item) => Ok(items.iter().any(|x| equals(x, item))),
		(Value::Map(map), Value::Str(key)) => Ok(map.contains_key(key.as_str())),
		(Value::Map(_), _) => Ok(false),
		(other, _) => Err(RunError::Type(format!("argument of type '{}' is not iterable", other.type_name()))),
	}
}

/// Collect the items produced by iterating over a value.
///
/// Strings yield their characters and maps yield `(key, value)` tuples.
pub(crate) fn iterate(value: Value) -> Result<Vec<Value>, RunError> {
	match value {
		Value::List(items) | Value::Tuple(items) => Ok(items),
		Value::Str(text) => Ok(text.chars().map(|c| Value::Str(c.to_string())).collect()),
		Value::Map(map) => Ok(map.into_iter().map(|(key, value)| Value::Tuple(vec![Value::Str(key), value])).collect()),
		other => Err(RunError::Type(format!("'{}' object is not iterable", other.type_name()))),
	}
}

/// Resolve a possibly negative index against a length.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
	let len = i64::try_from(len).ok()?;
	let index = if index < 0 { index + len } else { index };
	if (0..len).contains(&index) {
		usize::try_from(index).ok()
	} else {
		None
	}
}

fn integer_index(value: &Value, index: &Value) -> Result<i64, RunError> {
	match index {
		Value::Int(x) => Ok(*x),
		Value::Bool(x) => Ok(i64::from(*x)),
		other => Err(RunError::Type(format!(
			"{} indices must be integers, not {}",
			value.type_name(),
			other.type_name()
		))),
	}
}

pub(super) fn get_item(value: &Value, index: &Value) -> Result<Value, RunError> {
	match value {
		Value::List(items) | Value::Tuple(items) => {
			let position = integer_index(value, index)?;
			resolve_index(position, items.len())
				.map(|i| items[i].clone())
				.ok_or_else(|| RunError::Index(format!("{} index out of range", value.type_name())))
		},
		Value::Str(text) => {
			let position = integer_index(value, index)?;
			let len = text.chars().count();
			resolve_index(position, len)
				.and_then(|i| text.chars().nth(i))
				.map(|c| Value::Str(c.to_string()))
				.ok_or_else(|| RunError::Index("string index out of range".into()))
		},
		Value::Map(map) => match index {
			Value::Str(key) => map.get(key.as_str()).cloned().ok_or_else(|| RunError::Key(key.clone())),
			other => Err(RunError::Key(other.repr().to_string())),
		},
		other => Err(RunError::Type(format!("'{}' object is not subscriptable", other.type_name()))),
	}
}

/// Clamp a slice bound to `0..=len`, resolving negative bounds from the end.
fn slice_bound(bound: &Value, len: usize, default: usize) -> Result<usize, RunError> {
	let bound = match bound {
		Value::None => return Ok(default),
		Value::Int(x) => *x,
		Value::Bool(x) => i64::from(*x),
		other => return Err(RunError::Type(format!("slice indices must be integers or None, not {}", other.type_name()))),
	};
	let len_signed = i64::try_from(len).unwrap_or(i64::MAX);
	let resolved = if bound < 0 { (bound + len_signed).max(0) } else { bound.min(len_signed) };
	Ok(usize::try_from(resolved).unwrap_or(0))
}

fn slice(value: &Value, lower: &Value, upper: &Value) -> Result<Value, RunError> {
	let range = |len| -> Result<std::ops::Range<usize>, RunError> {
		let start = slice_bound(lower, len, 0)?;
		let end = slice_bound(upper, len, len)?.max(start);
		Ok(start..end)
	};
	match value {
		Value::List(items) => Ok(Value::List(items[range(items.len())?].to_vec())),
		Value::Tuple(items) => Ok(Value::Tuple(items[range(items.len())?].to_vec())),
		Value::Str(text) => {
			let range = range(text.chars().count())?;
			Ok(Value::Str(text.chars().skip(range.start).take(range.len()).collect()))
		},
		other => Err(RunError::Type(format!("'{}' object is not subscriptable", other.type_name()))),
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use crate::expr::{parse_expression, parse_statements};
	use assert2::{assert, check, let_assert};

	fn eval(source: &str) -> Result<Value, RunError> {
		let mut scope = Scope::new();
		scope.bind("n", Value::Int(7));
		scope.bind("name", Value::from("world"));
		scope.bind("items", Value::from(vec![1, 2, 3]));
		scope.bind("d", [("a", 1), ("b", 2)].into_iter().collect());
		let_assert!(Ok(expr) = parse_expression(source));
		expr.eval(&scope)
	}

	fn value(source: &str) -> Value {
		let_assert!(Ok(value) = eval(source));
		value
	}

	#[test]
	fn test_arithmetic() {
		check!(value("1 + 2 * 3") == Value::Int(7));
		check!(value("7 / 2") == Value::Float(3.5));
		check!(value("-7 // 2") == Value::Int(-4));
		check!(value("-7 % 3") == Value::Int(2));
		check!(value("7 % -3") == Value::Int(-2));
		check!(value("1 + 0.5") == Value::Float(1.5));
		check!(value("True + 1") == Value::Int(2));
		check!(value("'ab' * 2") == Value::from("abab"));
		check!(value("[0] * 3") == Value::from(vec![0, 0, 0]));
		check!(value("'x' + name") == Value::from("xworld"));
		let_assert!(Err(RunError::ZeroDivision) = eval("n / 0"));
		let_assert!(Err(RunError::ZeroDivision) = eval("n % 0"));
		let_assert!(Err(RunError::Type(_)) = eval("'a' + 1"));
		let_assert!(Err(RunError::Value(_)) = eval("9223372036854775807 + 1"));
	}

	#[test]
	fn test_huge_repetition_is_an_error() {
		let_assert!(Err(RunError::Value(_)) = eval("'ab' * 9223372036854775807"));
		let_assert!(Err(RunError::Value(_)) = eval("9223372036854775807 * [1]"));
		let_assert!(Err(RunError::Value(_)) = eval("(1, 2) * 16777216"));
		check!(value("'' * 9223372036854775807") == Value::from(""));
		check!(value("[] * 9223372036854775807") == Value::List(Vec::new()));
		check!(value("'ab' * 2") == Value::from("abab"));
		check!(value("'ab' * -1") == Value::from(""));
	}

	#[test]
	fn test_comparisons() {
		check!(value("1 < n <= 7") == Value::Bool(true));
		check!(value("1 < n < 3") == Value::Bool(false));
		check!(value("1 == 1.0") == Value::Bool(true));
		check!(value("'a' < 'b'") == Value::Bool(true));
		check!(value("[1, 2] < [1, 3]") == Value::Bool(true));
		check!(value("2 in items") == Value::Bool(true));
		check!(value("'a' in d") == Value::Bool(true));
		check!(value("'z' not in d") == Value::Bool(true));
		check!(value("'orl' in name") == Value::Bool(true));
		check!(value("None is None") == Value::Bool(true));
		check!(value("n is not None") == Value::Bool(true));
		let_assert!(Err(RunError::Type(_)) = eval("1 < 'a'"));
	}

	#[test]
	fn test_boolean_operators() {
		check!(value("0 or 'x'") == Value::from("x"));
		check!(value("0 and undefined") == Value::Int(0));
		check!(value("not items") == Value::Bool(false));
		check!(value("'yes' if n > 5 else 'no'") == Value::from("yes"));
	}

	#[test]
	fn test_indexing() {
		check!(value("items[0]") == Value::Int(1));
		check!(value("items[-1]") == Value::Int(3));
		check!(value("items[1:]") == Value::from(vec![2, 3]));
		check!(value("items[:-1]") == Value::from(vec![1, 2]));
		check!(value("items[5:]") == Value::List(vec![]));
		check!(value("name[1:3]") == Value::from("or"));
		check!(value("name[-1]") == Value::from("d"));
		check!(value("d['b']") == Value::Int(2));
		check!(value("d.a") == Value::Int(1));
		let_assert!(Err(RunError::Index(_)) = eval("items[3]"));
		let_assert!(Err(RunError::Key(key)) = eval("d['c']"));
		assert!(key == "c");
		let_assert!(Err(RunError::Attribute { name, .. }) = eval("d.c"));
		assert!(name == "c");
		let_assert!(Err(RunError::Type(_)) = eval("n[0]"));
	}

	#[test]
	fn test_undefined_name() {
		let_assert!(Err(RunError::UndefinedName(name)) = eval("missing + 1"));
		assert!(name == "missing");
		let_assert!(Err(RunError::UndefinedName(name)) = eval("nosuchfunction(1)"));
		assert!(name == "nosuchfunction");
	}

	#[test]
	fn test_displays() {
		check!(value("{'k': n}") == Value::from_iter([("k", 7)]));
		check!(value("(1,)") == Value::Tuple(vec![Value::Int(1)]));
		let_assert!(Err(RunError::Type(_)) = eval("{1: 2}"));
	}

	#[test]
	fn test_statements() {
		let mut scope = Scope::new();
		let_assert!(Ok(statements) = parse_statements("x = 1\nx += 2\na, b = 'yz'\ntotal = 0\nfor_ = x * 2"));
		for statement in &statements {
			let_assert!(Ok(()) = statement.exec(&mut scope));
		}
		check!(scope.get("x") == Some(&Value::Int(3)));
		check!(scope.get("a") == Some(&Value::from("y")));
		check!(scope.get("b") == Some(&Value::from("z")));
		check!(scope.get("for_") == Some(&Value::Int(6)));
	}

	#[test]
	fn test_unpack_mismatch() {
		let mut scope = Scope::new();
		let target = Target::Tuple(vec![Target::Name("a".into()), Target::Name("b".into())]);
		let_assert!(Err(RunError::Value(message)) = target.assign(&mut scope, Value::from(vec![1, 2, 3])));
		assert!(message == "too many values to unpack (expected 2)");
		let_assert!(Err(RunError::Value(_)) = target.assign(&mut scope, Value::from(vec![1])));
		let_assert!(Err(RunError::Type(_)) = target.assign(&mut scope, Value::Int(1)));
	}

	#[test]
	fn test_iterate_map() {
		let map: Value = [("a", 1), ("b", 2)].into_iter().collect();
		let_assert!(Ok(items) = iterate(map));
		assert!(items == [
			Value::Tuple(vec![Value::from("a"), Value::Int(1)]),
			Value::Tuple(vec![Value::from("b"), Value::Int(2)]),
		]);
	}
}
