//! The embedded expression language used inside directives.
//!
//! Expressions are a small Python-flavoured language:
//! literals (`1`, `2.5`, `'text'`, `True`, `None`, `[..]`, `(..)`, `{k: v}`),
//! names, attribute access, indexing and slicing, calls to builtins and methods,
//! arithmetic, comparisons, `and`/`or`/`not` and `x if cond else y`.
//!
//! Raw `script` blocks contain statements: assignments, augmented assignments,
//! expression statements and `pass`, separated by newlines or semicolons.
//!
//! Parsing an expression is how the template compiler checks that directive code is valid.
//! Evaluation happens later, when a template runs.

mod builtins;
mod eval;
mod lex;
mod parse;

pub use eval::Scope;
pub(crate) use eval::iterate;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	/// A literal value.
	Literal(crate::Value),

	/// A name to look up in the scope.
	Name(String),

	/// A list display: `[a, b]`.
	List(Vec<Expr>),

	/// A tuple display: `(a, b)` or `a, b`.
	Tuple(Vec<Expr>),

	/// A dictionary display: `{k: v}`.
	Dict(Vec<(Expr, Expr)>),

	/// Attribute access: `value.name`.
	Attribute(Box<Expr>, String),

	/// Indexing: `value[index]`.
	Index(Box<Expr>, Box<Expr>),

	/// Slicing: `value[lower:upper]`.
	Slice(Box<Expr>, Option<Box<Expr>>, Option<Box<Expr>>),

	/// A call: `function(args)` or `value.method(args)`.
	Call(Box<Expr>, Vec<Expr>),

	/// A unary arithmetic operation.
	Unary(UnaryOp, Box<Expr>),

	/// A binary arithmetic operation.
	Binary(BinaryOp, Box<Expr>, Box<Expr>),

	/// Boolean negation.
	Not(Box<Expr>),

	/// Short-circuiting `and`.
	And(Box<Expr>, Box<Expr>),

	/// Short-circuiting `or`.
	Or(Box<Expr>, Box<Expr>),

	/// A (possibly chained) comparison: `a < b <= c`.
	Compare(Box<Expr>, Vec<(CompareOp, Expr)>),

	/// A conditional expression: `then if condition else otherwise`.
	Conditional {
		/// The condition.
		condition: Box<Expr>,
		/// The value if the condition is true.
		then: Box<Expr>,
		/// The value if the condition is false.
		otherwise: Box<Expr>,
	},
}

/// A unary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	/// `-x`
	Negate,
	/// `+x`
	Plus,
}

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	/// `+`
	Add,
	/// `-`
	Subtract,
	/// `*`
	Multiply,
	/// `/`
	Divide,
	/// `//`
	FloorDivide,
	/// `%`
	Remainder,
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
	/// `==`
	Equal,
	/// `!=`
	NotEqual,
	/// `<`
	Less,
	/// `<=`
	LessEqual,
	/// `>`
	Greater,
	/// `>=`
	GreaterEqual,
	/// `in`
	In,
	/// `not in`
	NotIn,
	/// `is`
	Is,
	/// `is not`
	IsNot,
}

/// The target of an assignment or a `for` loop binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
	/// A single name.
	Name(String),

	/// A tuple of targets that a value is unpacked into.
	Tuple(Vec<Target>),
}

/// A statement from a raw `script` block.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
	/// An expression evaluated for its side effects (if any).
	Expr(Expr),

	/// `target = value`
	Assign(Target, Expr),

	/// `name += value` and friends.
	AugAssign(String, BinaryOp, Expr),

	/// `pass`
	Pass,
}

/// The header of a `for` loop: `target in iterable`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForHeader {
	/// The names bound on each iteration.
	pub target: Target,

	/// The expression that produces the items.
	pub iterable: Expr,
}

/// The source of an expression could not be parsed.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct SyntaxError {
	/// The byte offset within the expression text where the error occurs.
	pub position: usize,

	/// A human readable description of the problem.
	pub message: String,
}

impl std::error::Error for SyntaxError {}

impl std::fmt::Display for SyntaxError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{} (at offset {})", self.message, self.position)
	}
}

/// Parse a single expression.
pub fn parse_expression(source: &str) -> Result<Expr, SyntaxError> {
	let tokens = lex::tokenize(source, false)?;
	parse::Parser::new(tokens).parse_expression()
}

/// Parse a sequence of statements, as found in a raw `script` block.
pub fn parse_statements(source: &str) -> Result<Vec<Stmt>, SyntaxError> {
	let tokens = lex::tokenize(source, true)?;
	parse::Parser::new(tokens).parse_statements()
}

/// Parse the header of a `for` loop: `binding in iterable`.
pub fn parse_for_header(source: &str) -> Result<ForHeader, SyntaxError> {
	let tokens = lex::tokenize(source, false)?;
	parse::Parser::new(tokens).parse_for_header()
}

/// Check if a name is a simple identifier that can be bound in a scope.
///
/// Identifiers consist of ASCII letters, digits and underscores, do not start with a digit and are not keywords.
pub fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !lex::is_keyword(name)
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, check, let_assert};

	#[test]
	fn test_is_identifier() {
		check!(is_identifier("name"));
		check!(is_identifier("_private2"));
		check!(!is_identifier("2fast"));
		check!(!is_identifier("a.b"));
		check!(!is_identifier("f()"));
		check!(!is_identifier("for"));
		check!(!is_identifier(""));
	}

	#[test]
	fn test_syntax_errors() {
		let_assert!(Err(e) = parse_expression("a +"));
		assert!(e.position == 3);
		let_assert!(Err(_) = parse_expression("(a, b"));
		let_assert!(Err(_) = parse_expression("a b"));
		let_assert!(Err(_) = parse_expression(""));
		let_assert!(Err(_) = parse_statements("1 = a"));
		let_assert!(Err(_) = parse_for_header("x on items"));
	}

	#[test]
	fn test_for_header() {
		let_assert!(Ok(header) = parse_for_header("(k, v) in items"));
		assert!(header.target == Target::Tuple(vec![Target::Name("k".into()), Target::Name("v".into())]));
		assert!(header.iterable == Expr::Name("items".into()));

		let_assert!(Ok(header) = parse_for_header("k, v in d.items()"));
		assert!(header.target == Target::Tuple(vec![Target::Name("k".into()), Target::Name("v".into())]));

		let_assert!(Ok(header) = parse_for_header("x in a if a else b"));
		assert!(header.target == Target::Name("x".into()));
		let_assert!(Expr::Conditional { .. } = header.iterable);
	}

	#[test]
	fn test_statements() {
		let_assert!(Ok(statements) = parse_statements("x = 1\n# comment\n\ny += 2; pass\nf(x)"));
		assert!(statements.len() == 4);
		let_assert!(Stmt::Assign(Target::Name(name), _) = &statements[0]);
		assert!(name == "x");
		let_assert!(Stmt::AugAssign(name, BinaryOp::Add, _) = &statements[1]);
		assert!(name == "y");
		assert!(statements[2] == Stmt::Pass);
		let_assert!(Stmt::Expr(Expr::Call(..)) = &statements[3]);
	}

	#[test]
	fn test_statements_span_brackets() {
		let_assert!(Ok(statements) = parse_statements("a = [\n  1,\n  2,\n]\nb = a"));
		assert!(statements.len() == 2);
	}
}
