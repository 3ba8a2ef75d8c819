use super::lex::{self, Punct, Spanned, Token};
use super::{BinaryOp, CompareOp, Expr, ForHeader, Stmt, SyntaxError, Target, UnaryOp};
use crate::Value;

/// Recursive descent parser over a token list.
///
/// The token list must end with [`Token::Eof`].
pub(super) struct Parser {
	tokens: Vec<Spanned>,
	finger: usize,
}

impl Parser {
	pub fn new(tokens: Vec<Spanned>) -> Self {
		Self { tokens, finger: 0 }
	}

	/// Parse a complete source consisting of a single expression.
	pub fn parse_expression(mut self) -> Result<Expr, SyntaxError> {
		let expr = self.expression_list()?;
		self.expect_end()?;
		Ok(expr)
	}

	/// Parse a complete source consisting of statements.
	pub fn parse_statements(mut self) -> Result<Vec<Stmt>, SyntaxError> {
		let mut statements = Vec::new();
		loop {
			while matches!(self.peek(), Token::Newline | Token::Punct(Punct::Semicolon)) {
				self.advance();
			}
			if self.peek() == &Token::Eof {
				return Ok(statements);
			}
			statements.push(self.statement()?);
			match self.peek() {
				Token::Newline | Token::Punct(Punct::Semicolon) | Token::Eof => (),
				_ => return Err(self.unexpected("end of statement")),
			}
		}
	}

	/// Parse a complete `for` loop header.
	pub fn parse_for_header(mut self) -> Result<ForHeader, SyntaxError> {
		let target = self.target_list()?;
		if !self.eat_keyword("in") {
			return Err(self.unexpected("'in'"));
		}
		let iterable = self.expression_list()?;
		self.expect_end()?;
		Ok(ForHeader { target, iterable })
	}

	fn statement(&mut self) -> Result<Stmt, SyntaxError> {
		if self.eat_keyword("pass") {
			return Ok(Stmt::Pass);
		}

		let position = self.position();
		let expr = self.expression_list()?;
		let op = match self.peek() {
			Token::Punct(Punct::Assign) => None,
			Token::Punct(Punct::PlusAssign) => Some(BinaryOp::Add),
			Token::Punct(Punct::MinusAssign) => Some(BinaryOp::Subtract),
			Token::Punct(Punct::StarAssign) => Some(BinaryOp::Multiply),
			_ => return Ok(Stmt::Expr(expr)),
		};
		self.advance();
		let value = self.expression_list()?;

		match op {
			None => {
				let target = to_target(expr).ok_or_else(|| SyntaxError {
					position,
					message: "cannot assign to expression".into(),
				})?;
				Ok(Stmt::Assign(target, value))
			},
			Some(op) => match expr {
				Expr::Name(name) => Ok(Stmt::AugAssign(name, op, value)),
				_ => Err(SyntaxError {
					position,
					message: "augmented assignment requires a name".into(),
				}),
			},
		}
	}

	/// Parse `a, b, c` into a tuple, or a single expression if there is no comma.
	fn expression_list(&mut self) -> Result<Expr, SyntaxError> {
		let first = self.expression()?;
		if self.peek() != &Token::Punct(Punct::Comma) {
			return Ok(first);
		}
		let mut items = vec![first];
		while self.eat_punct(Punct::Comma) {
			if !self.is_expression_start() {
				break;
			}
			items.push(self.expression()?);
		}
		Ok(Expr::Tuple(items))
	}

	fn expression(&mut self) -> Result<Expr, SyntaxError> {
		let then = self.or_test()?;
		if !self.eat_keyword("if") {
			return Ok(then);
		}
		let condition = self.or_test()?;
		if !self.eat_keyword("else") {
			return Err(self.unexpected("'else'"));
		}
		let otherwise = self.expression()?;
		Ok(Expr::Conditional {
			condition: Box::new(condition),
			then: Box::new(then),
			otherwise: Box::new(otherwise),
		})
	}

	fn or_test(&mut self) -> Result<Expr, SyntaxError> {
		let mut left = self.and_test()?;
		while self.eat_keyword("or") {
			let right = self.and_test()?;
			left = Expr::Or(Box::new(left), Box::new(right));
		}
		Ok(left)
	}

	fn and_test(&mut self) -> Result<Expr, SyntaxError> {
		let mut left = self.not_test()?;
		while self.eat_keyword("and") {
			let right = self.not_test()?;
			left = Expr::And(Box::new(left), Box::new(right));
		}
		Ok(left)
	}

	fn not_test(&mut self) -> Result<Expr, SyntaxError> {
		if self.eat_keyword("not") {
			let operand = self.not_test()?;
			return Ok(Expr::Not(Box::new(operand)));
		}
		self.comparison()
	}

	fn comparison(&mut self) -> Result<Expr, SyntaxError> {
		let first = self.arithmetic(1)?;
		let mut rest = Vec::new();
		while let Some(op) = self.compare_op() {
			rest.push((op, self.arithmetic(1)?));
		}
		if rest.is_empty() {
			Ok(first)
		} else {
			Ok(Expr::Compare(Box::new(first), rest))
		}
	}

	/// Consume a comparison operator, if there is one.
	fn compare_op(&mut self) -> Option<CompareOp> {
		let is_name = |token: &Token, name: &str| matches!(token, Token::Name(x) if x == name);
		let (op, len) = match self.peek() {
			Token::Punct(Punct::Equal) => (CompareOp::Equal, 1),
			Token::Punct(Punct::NotEqual) => (CompareOp::NotEqual, 1),
			Token::Punct(Punct::Less) => (CompareOp::Less, 1),
			Token::Punct(Punct::LessEqual) => (CompareOp::LessEqual, 1),
			Token::Punct(Punct::Greater) => (CompareOp::Greater, 1),
			Token::Punct(Punct::GreaterEqual) => (CompareOp::GreaterEqual, 1),
			x if is_name(x, "in") => (CompareOp::In, 1),
			x if is_name(x, "is") && is_name(self.peek_at(1), "not") => (CompareOp::IsNot, 2),
			x if is_name(x, "is") => (CompareOp::Is, 1),
			x if is_name(x, "not") && is_name(self.peek_at(1), "in") => (CompareOp::NotIn, 2),
			_ => return None,
		};
		for _ in 0..len {
			self.advance();
		}
		Some(op)
	}

	/// Parse binary arithmetic with precedence climbing.
	fn arithmetic(&mut self, min_precedence: u8) -> Result<Expr, SyntaxError> {
		let mut left = self.unary()?;
		while let Some((op, precedence)) = self.binary_op() {
			if precedence < min_precedence {
				break;
			}
			self.advance();
			let right = self.arithmetic(precedence + 1)?;
			left = Expr::Binary(op, Box::new(left), Box::new(right));
		}
		Ok(left)
	}

	fn binary_op(&self) -> Option<(BinaryOp, u8)> {
		match self.peek() {
			Token::Punct(Punct::Plus) => Some((BinaryOp::Add, 1)),
			Token::Punct(Punct::Minus) => Some((BinaryOp::Subtract, 1)),
			Token::Punct(Punct::Star) => Some((BinaryOp::Multiply, 2)),
			Token::Punct(Punct::Slash) => Some((BinaryOp::Divide, 2)),
			Token::Punct(Punct::DoubleSlash) => Some((BinaryOp::FloorDivide, 2)),
			Token::Punct(Punct::Percent) => Some((BinaryOp::Remainder, 2)),
			_ => None,
		}
	}

	fn unary(&mut self) -> Result<Expr, SyntaxError> {
		let op = match self.peek() {
			Token::Punct(Punct::Minus) => UnaryOp::Negate,
			Token::Punct(Punct::Plus) => UnaryOp::Plus,
			_ => return self.postfix(),
		};
		self.advance();
		let operand = self.unary()?;
		Ok(Expr::Unary(op, Box::new(operand)))
	}

	fn postfix(&mut self) -> Result<Expr, SyntaxError> {
		let mut expr = self.primary()?;
		loop {
			if self.eat_punct(Punct::Dot) {
				let Token::Name(name) = self.peek().clone() else {
					return Err(self.unexpected("an attribute name"));
				};
				self.advance();
				expr = Expr::Attribute(Box::new(expr), name);
			} else if self.eat_punct(Punct::LeftParen) {
				let args = self.sequence(Punct::RightParen)?;
				expr = Expr::Call(Box::new(expr), args);
			} else if self.eat_punct(Punct::LeftBracket) {
				expr = self.subscript(expr)?;
			} else {
				return Ok(expr);
			}
		}
	}

	/// Parse the inside of `value[...]`, after the opening bracket.
	fn subscript(&mut self, value: Expr) -> Result<Expr, SyntaxError> {
		let lower = if self.peek() == &Token::Punct(Punct::Colon) {
			None
		} else {
			Some(Box::new(self.expression_list()?))
		};
		if !self.eat_punct(Punct::Colon) {
			self.expect_punct(Punct::RightBracket, "']'")?;
			// Only a missing lower bound can be `None` here, and that requires a colon.
			let index = lower.ok_or_else(|| self.unexpected("an index"))?;
			return Ok(Expr::Index(Box::new(value), index));
		}
		let upper = if self.peek() == &Token::Punct(Punct::RightBracket) {
			None
		} else {
			Some(Box::new(self.expression()?))
		};
		self.expect_punct(Punct::RightBracket, "']'")?;
		Ok(Expr::Slice(Box::new(value), lower, upper))
	}

	fn primary(&mut self) -> Result<Expr, SyntaxError> {
		match self.peek().clone() {
			Token::Int(x) => {
				self.advance();
				Ok(Expr::Literal(Value::Int(x)))
			},
			Token::Float(x) => {
				self.advance();
				Ok(Expr::Literal(Value::Float(x)))
			},
			Token::Str(mut x) => {
				self.advance();
				// Adjacent string literals are concatenated.
				while let Token::Str(next) = self.peek() {
					x.push_str(next);
					self.advance();
				}
				Ok(Expr::Literal(Value::Str(x)))
			},
			Token::Name(name) => match name.as_str() {
				"True" => {
					self.advance();
					Ok(Expr::Literal(Value::Bool(true)))
				},
				"False" => {
					self.advance();
					Ok(Expr::Literal(Value::Bool(false)))
				},
				"None" => {
					self.advance();
					Ok(Expr::Literal(Value::None))
				},
				x if lex::is_keyword(x) => Err(self.unexpected("an expression")),
				_ => {
					self.advance();
					Ok(Expr::Name(name))
				},
			},
			Token::Punct(Punct::LeftParen) => {
				self.advance();
				if self.eat_punct(Punct::RightParen) {
					return Ok(Expr::Tuple(Vec::new()));
				}
				let first = self.expression()?;
				if self.eat_punct(Punct::RightParen) {
					return Ok(first);
				}
				self.expect_punct(Punct::Comma, "',' or ')'")?;
				let mut items = vec![first];
				items.extend(self.sequence(Punct::RightParen)?);
				Ok(Expr::Tuple(items))
			},
			Token::Punct(Punct::LeftBracket) => {
				self.advance();
				Ok(Expr::List(self.sequence(Punct::RightBracket)?))
			},
			Token::Punct(Punct::LeftBrace) => {
				self.advance();
				self.dict()
			},
			_ => Err(self.unexpected("an expression")),
		}
	}

	/// Parse comma separated expressions up to and including the closing punctuation.
	///
	/// A trailing comma is allowed.
	fn sequence(&mut self, close: Punct) -> Result<Vec<Expr>, SyntaxError> {
		let mut items = Vec::new();
		loop {
			if self.eat_punct(close) {
				return Ok(items);
			}
			items.push(self.expression()?);
			if !self.eat_punct(Punct::Comma) {
				self.expect_punct(close, "',' or a closing bracket")?;
				return Ok(items);
			}
		}
	}

	/// Parse the entries of a dictionary display, after the opening brace.
	fn dict(&mut self) -> Result<Expr, SyntaxError> {
		let mut entries = Vec::new();
		loop {
			if self.eat_punct(Punct::RightBrace) {
				return Ok(Expr::Dict(entries));
			}
			let key = self.expression()?;
			self.expect_punct(Punct::Colon, "':'")?;
			let value = self.expression()?;
			entries.push((key, value));
			if !self.eat_punct(Punct::Comma) {
				self.expect_punct(Punct::RightBrace, "',' or '}'")?;
				return Ok(Expr::Dict(entries));
			}
		}
	}

	/// Parse the binding of a `for` loop: a name or a tuple of (possibly nested) names.
	fn target_list(&mut self) -> Result<Target, SyntaxError> {
		let first = self.target()?;
		if self.peek() != &Token::Punct(Punct::Comma) {
			return Ok(first);
		}
		let mut items = vec![first];
		while self.eat_punct(Punct::Comma) {
			if self.peek() == &Token::Name("in".into()) {
				break;
			}
			items.push(self.target()?);
		}
		Ok(Target::Tuple(items))
	}

	fn target(&mut self) -> Result<Target, SyntaxError> {
		let close = match self.peek().clone() {
			Token::Name(name) if !lex::is_keyword(&name) => {
				self.advance();
				return Ok(Target::Name(name));
			},
			Token::Punct(Punct::LeftParen) => Punct::RightParen,
			Token::Punct(Punct::LeftBracket) => Punct::RightBracket,
			_ => return Err(self.unexpected("a name")),
		};
		self.advance();
		let mut items = Vec::new();
		loop {
			if self.eat_punct(close) {
				return Ok(Target::Tuple(items));
			}
			items.push(self.target()?);
			if !self.eat_punct(Punct::Comma) {
				self.expect_punct(close, "',' or a closing bracket")?;
				return Ok(Target::Tuple(items));
			}
		}
	}

	fn is_expression_start(&self) -> bool {
		match self.peek() {
			Token::Int(_) | Token::Float(_) | Token::Str(_) => true,
			Token::Name(x) => !lex::is_keyword(x) || matches!(x.as_str(), "True" | "False" | "None" | "not"),
			Token::Punct(p) => matches!(p, Punct::LeftParen | Punct::LeftBracket | Punct::LeftBrace | Punct::Minus | Punct::Plus),
			Token::Newline | Token::Eof => false,
		}
	}

	fn peek(&self) -> &Token {
		self.peek_at(0)
	}

	fn peek_at(&self, offset: usize) -> &Token {
		let index = (self.finger + offset).min(self.tokens.len() - 1);
		&self.tokens[index].token
	}

	fn position(&self) -> usize {
		self.tokens[self.finger.min(self.tokens.len() - 1)].position
	}

	fn advance(&mut self) {
		if self.finger < self.tokens.len() - 1 {
			self.finger += 1;
		}
	}

	fn eat_punct(&mut self, punct: Punct) -> bool {
		if self.peek() == &Token::Punct(punct) {
			self.advance();
			true
		} else {
			false
		}
	}

	fn eat_keyword(&mut self, keyword: &str) -> bool {
		match self.peek() {
			Token::Name(x) if x == keyword => {
				self.advance();
				true
			},
			_ => false,
		}
	}

	fn expect_punct(&mut self, punct: Punct, expected: &str) -> Result<(), SyntaxError> {
		if self.eat_punct(punct) {
			Ok(())
		} else {
			Err(self.unexpected(expected))
		}
	}

	fn expect_end(&self) -> Result<(), SyntaxError> {
		match self.peek() {
			Token::Eof => Ok(()),
			_ => Err(self.unexpected("end of expression")),
		}
	}

	fn unexpected(&self, expected: &str) -> SyntaxError {
		let found = match self.peek() {
			Token::Name(x) => format!("{x:?}"),
			Token::Int(x) => x.to_string(),
			Token::Float(x) => x.to_string(),
			Token::Str(_) => "a string".to_owned(),
			Token::Punct(x) => format!("{x:?}"),
			Token::Newline => "end of line".to_owned(),
			Token::Eof => "end of input".to_owned(),
		};
		SyntaxError {
			position: self.position(),
			message: format!("expected {expected}, found {found}"),
		}
	}
}

/// Convert a parsed expression into an assignment target, if it is one.
fn to_target(expr: Expr) -> Option<Target> {
	match expr {
		Expr::Name(name) => Some(Target::Name(name)),
		Expr::Tuple(items) | Expr::List(items) => {
			items.into_iter().map(to_target).collect::<Option<Vec<_>>>().map(Target::Tuple)
		},
		_ => None,
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::super::{parse_expression, parse_statements};
	use super::*;
	use assert2::{assert, let_assert};

	fn name(x: &str) -> Box<Expr> {
		Box::new(Expr::Name(x.into()))
	}

	fn int(x: i64) -> Box<Expr> {
		Box::new(Expr::Literal(Value::Int(x)))
	}

	#[test]
	fn test_precedence() {
		let_assert!(Ok(expr) = parse_expression("1 + 2 * 3"));
		assert!(expr == Expr::Binary(BinaryOp::Add, int(1), Box::new(Expr::Binary(BinaryOp::Multiply, int(2), int(3)))));

		let_assert!(Ok(expr) = parse_expression("1 - 2 - 3"));
		assert!(expr == Expr::Binary(BinaryOp::Subtract, Box::new(Expr::Binary(BinaryOp::Subtract, int(1), int(2))), int(3)));

		let_assert!(Ok(expr) = parse_expression("not a and b"));
		assert!(expr == Expr::And(Box::new(Expr::Not(name("a"))), name("b")));
	}

	#[test]
	fn test_comparisons() {
		let_assert!(Ok(expr) = parse_expression("a < b <= c"));
		assert!(expr == Expr::Compare(name("a"), vec![(CompareOp::Less, Expr::Name("b".into())), (CompareOp::LessEqual, Expr::Name("c".into()))]));

		let_assert!(Ok(expr) = parse_expression("a not in b"));
		assert!(expr == Expr::Compare(name("a"), vec![(CompareOp::NotIn, Expr::Name("b".into()))]));

		let_assert!(Ok(expr) = parse_expression("a is not None"));
		assert!(expr == Expr::Compare(name("a"), vec![(CompareOp::IsNot, Expr::Literal(Value::None))]));
	}

	#[test]
	fn test_postfix() {
		let_assert!(Ok(expr) = parse_expression("d.get('k', 1)[0]"));
		let_assert!(Expr::Index(call, _) = expr);
		let_assert!(Expr::Call(method, args) = *call);
		assert!(args.len() == 2);
		assert!(*method == Expr::Attribute(name("d"), "get".into()));

		let_assert!(Ok(Expr::Slice(_, None, Some(_))) = parse_expression("s[:3]"));
		let_assert!(Ok(Expr::Slice(_, Some(_), None)) = parse_expression("s[1:]"));
		let_assert!(Ok(Expr::Slice(_, None, None)) = parse_expression("s[:]"));
	}

	#[test]
	fn test_displays() {
		let_assert!(Ok(Expr::Tuple(items)) = parse_expression("(1,)"));
		assert!(items.len() == 1);
		let_assert!(Ok(Expr::Tuple(items)) = parse_expression("1, 2"));
		assert!(items.len() == 2);
		let_assert!(Ok(Expr::List(items)) = parse_expression("[1, 2, 3,]"));
		assert!(items.len() == 3);
		let_assert!(Ok(Expr::Dict(entries)) = parse_expression("{'a': 1, 'b': 2}"));
		assert!(entries.len() == 2);
		let_assert!(Ok(Expr::Literal(Value::Str(x))) = parse_expression("'a' \"b\""));
		assert!(x == "ab");
	}

	#[test]
	fn test_keywords_are_not_names() {
		let_assert!(Err(_) = parse_expression("if"));
		let_assert!(Err(_) = parse_expression("a and"));
		let_assert!(Err(_) = parse_statements("for = 1"));
	}

	#[test]
	fn test_tuple_assignment() {
		let_assert!(Ok(statements) = parse_statements("a, (b, c) = 1, (2, 3)"));
		let_assert!(Stmt::Assign(Target::Tuple(targets), Expr::Tuple(_)) = &statements[0]);
		assert!(targets[1] == Target::Tuple(vec![Target::Name("b".into()), Target::Name("c".into())]));
	}
}
