use super::SyntaxError;

/// A single token of expression source.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
	Name(String),
	Int(i64),
	Float(f64),
	Str(String),
	Punct(Punct),
	/// End of a logical line, only produced for statement sources.
	Newline,
	Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Punct {
	LeftParen,
	RightParen,
	LeftBracket,
	RightBracket,
	LeftBrace,
	RightBrace,
	Comma,
	Colon,
	Semicolon,
	Dot,
	Plus,
	Minus,
	Star,
	Slash,
	DoubleSlash,
	Percent,
	Assign,
	PlusAssign,
	MinusAssign,
	StarAssign,
	Equal,
	NotEqual,
	Less,
	LessEqual,
	Greater,
	GreaterEqual,
}

/// A token with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Spanned {
	pub token: Token,
	pub position: usize,
}

const KEYWORDS: &[&str] = &[
	"and", "as", "assert", "break", "class", "continue", "def", "del", "elif", "else", "for", "from", "global",
	"if", "import", "in", "is", "lambda", "not", "or", "pass", "return", "while", "with", "yield",
	"True", "False", "None",
];

pub(super) fn is_keyword(name: &str) -> bool {
	KEYWORDS.contains(&name)
}

/// Split expression source into tokens.
///
/// If `newlines` is true, line breaks outside of brackets produce [`Token::Newline`].
/// Otherwise they are treated as whitespace.
/// The returned tokens always end with [`Token::Eof`].
pub(super) fn tokenize(source: &str, newlines: bool) -> Result<Vec<Spanned>, SyntaxError> {
	let mut lexer = Lexer {
		source,
		finger: 0,
		depth: 0,
		newlines,
		tokens: Vec::new(),
	};
	lexer.run()?;
	Ok(lexer.tokens)
}

struct Lexer<'a> {
	source: &'a str,
	finger: usize,
	depth: usize,
	newlines: bool,
	tokens: Vec<Spanned>,
}

impl Lexer<'_> {
	fn run(&mut self) -> Result<(), SyntaxError> {
		let bytes = self.source.as_bytes();
		while self.finger < bytes.len() {
			let start = self.finger;
			match bytes[start] {
				b' ' | b'\t' | b'\r' | b'\x0c' => self.finger += 1,
				b'\n' => {
					self.finger += 1;
					if self.newlines && self.depth == 0 {
						self.push(Token::Newline, start);
					}
				},
				b'\\' if bytes.get(start + 1) == Some(&b'\n') => self.finger += 2,
				b'#' => {
					self.finger = match memchr::memchr(b'\n', &bytes[start..]) {
						Some(x) => start + x,
						None => bytes.len(),
					};
				},
				b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.name(start),
				b'0'..=b'9' => self.number(start)?,
				b'.' if bytes.get(start + 1).is_some_and(u8::is_ascii_digit) => self.number(start)?,
				b'\'' | b'"' => self.string(start)?,
				_ => self.punct(start)?,
			}
		}
		self.push(Token::Eof, bytes.len());
		Ok(())
	}

	fn push(&mut self, token: Token, position: usize) {
		self.tokens.push(Spanned { token, position });
	}

	fn name(&mut self, start: usize) {
		let bytes = self.source.as_bytes();
		let end = bytes[start..]
			.iter()
			.position(|&c| !c.is_ascii_alphanumeric() && c != b'_')
			.map_or(bytes.len(), |x| start + x);
		self.finger = end;
		self.push(Token::Name(self.source[start..end].to_owned()), start);
	}

	fn number(&mut self, start: usize) -> Result<(), SyntaxError> {
		let bytes = self.source.as_bytes();
		let mut end = start;
		let mut is_float = false;
		while end < bytes.len() && bytes[end].is_ascii_digit() {
			end += 1;
		}
		if end < bytes.len() && bytes[end] == b'.' && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
			is_float = true;
			end += 1;
			while end < bytes.len() && bytes[end].is_ascii_digit() {
				end += 1;
			}
		}
		if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
			let mut exponent = end + 1;
			if exponent < bytes.len() && (bytes[exponent] == b'+' || bytes[exponent] == b'-') {
				exponent += 1;
			}
			if exponent < bytes.len() && bytes[exponent].is_ascii_digit() {
				is_float = true;
				end = exponent;
				while end < bytes.len() && bytes[end].is_ascii_digit() {
					end += 1;
				}
			}
		}
		if end < bytes.len() && (bytes[end].is_ascii_alphabetic() || bytes[end] == b'_') {
			return Err(SyntaxError {
				position: end,
				message: "invalid numeric literal".into(),
			});
		}

		let text = &self.source[start..end];
		let token = if is_float {
			Token::Float(text.parse().map_err(|_| SyntaxError {
				position: start,
				message: format!("invalid float literal: {text}"),
			})?)
		} else {
			Token::Int(text.parse().map_err(|_| SyntaxError {
				position: start,
				message: format!("integer literal too large: {text}"),
			})?)
		};
		self.finger = end;
		self.push(token, start);
		Ok(())
	}

	fn string(&mut self, start: usize) -> Result<(), SyntaxError> {
		let quote = self.source.as_bytes()[start] as char;
		let mut value = String::new();
		let mut chars = self.source[start + 1..].char_indices();
		loop {
			let Some((offset, c)) = chars.next() else {
				return Err(SyntaxError {
					position: start,
					message: "unterminated string literal".into(),
				});
			};
			match c {
				c if c == quote => {
					self.finger = start + 1 + offset + 1;
					break;
				},
				'\n' => {
					return Err(SyntaxError {
						position: start,
						message: "unterminated string literal".into(),
					});
				},
				'\\' => match chars.next() {
					Some((_, 'n')) => value.push('\n'),
					Some((_, 't')) => value.push('\t'),
					Some((_, 'r')) => value.push('\r'),
					Some((_, '0')) => value.push('\0'),
					Some((_, '\\')) => value.push('\\'),
					Some((_, '\'')) => value.push('\''),
					Some((_, '"')) => value.push('"'),
					Some((_, '\n')) => (),
					// Unknown escape sequences are kept as they are.
					Some((_, other)) => {
						value.push('\\');
						value.push(other);
					},
					None => {
						return Err(SyntaxError {
							position: start,
							message: "unterminated string literal".into(),
						});
					},
				},
				c => value.push(c),
			}
		}
		self.push(Token::Str(value), start);
		Ok(())
	}

	fn punct(&mut self, start: usize) -> Result<(), SyntaxError> {
		use Punct::*;
		let bytes = self.source.as_bytes();
		let next = bytes.get(start + 1).copied();
		let (punct, len) = match (bytes[start], next) {
			(b'/', Some(b'/')) => (DoubleSlash, 2),
			(b'+', Some(b'=')) => (PlusAssign, 2),
			(b'-', Some(b'=')) => (MinusAssign, 2),
			(b'*', Some(b'=')) => (StarAssign, 2),
			(b'=', Some(b'=')) => (Equal, 2),
			(b'!', Some(b'=')) => (NotEqual, 2),
			(b'<', Some(b'=')) => (LessEqual, 2),
			(b'>', Some(b'=')) => (GreaterEqual, 2),
			(b'(', _) => (LeftParen, 1),
			(b')', _) => (RightParen, 1),
			(b'[', _) => (LeftBracket, 1),
			(b']', _) => (RightBracket, 1),
			(b'{', _) => (LeftBrace, 1),
			(b'}', _) => (RightBrace, 1),
			(b',', _) => (Comma, 1),
			(b':', _) => (Colon, 1),
			(b';', _) => (Semicolon, 1),
			(b'.', _) => (Dot, 1),
			(b'+', _) => (Plus, 1),
			(b'-', _) => (Minus, 1),
			(b'*', _) => (Star, 1),
			(b'/', _) => (Slash, 1),
			(b'%', _) => (Percent, 1),
			(b'=', _) => (Assign, 1),
			(b'<', _) => (Less, 1),
			(b'>', _) => (Greater, 1),
			_ => {
				let character = self.source[start..].chars().next().unwrap_or('\0');
				return Err(SyntaxError {
					position: start,
					message: format!("unexpected character: {character:?}"),
				});
			},
		};

		match punct {
			LeftParen | LeftBracket | LeftBrace => self.depth += 1,
			RightParen | RightBracket | RightBrace => self.depth = self.depth.saturating_sub(1),
			_ => (),
		}
		self.finger = start + len;
		self.push(Token::Punct(punct), start);
		Ok(())
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, let_assert};

	fn tokens(source: &str, newlines: bool) -> Vec<Token> {
		let_assert!(Ok(tokens) = tokenize(source, newlines));
		tokens.into_iter().map(|x| x.token).collect()
	}

	#[test]
	fn test_numbers() {
		assert!(tokens("12 3.5 1e3 .5", false) == [Token::Int(12), Token::Float(3.5), Token::Float(1000.0), Token::Float(0.5), Token::Eof]);
		let_assert!(Err(e) = tokenize("12abc", false));
		assert!(e.position == 2);
		let_assert!(Err(_) = tokenize("99999999999999999999", false));
	}

	#[test]
	fn test_strings() {
		assert!(tokens(r#"'it\'s' "a\tb" '10%'"#, false) == [
			Token::Str("it's".into()),
			Token::Str("a\tb".into()),
			Token::Str("10%".into()),
			Token::Eof,
		]);
		let_assert!(Err(e) = tokenize("x + 'open", false));
		assert!(e.position == 4);
	}

	#[test]
	fn test_newlines() {
		assert!(tokens("a\nb", false) == [Token::Name("a".into()), Token::Name("b".into()), Token::Eof]);
		assert!(tokens("a # note\nb", true) == [Token::Name("a".into()), Token::Newline, Token::Name("b".into()), Token::Eof]);
		assert!(tokens("(a,\nb)", true) == [
			Token::Punct(Punct::LeftParen),
			Token::Name("a".into()),
			Token::Punct(Punct::Comma),
			Token::Name("b".into()),
			Token::Punct(Punct::RightParen),
			Token::Eof,
		]);
	}

	#[test]
	fn test_operators() {
		assert!(tokens("a//b<=c", false) == [
			Token::Name("a".into()),
			Token::Punct(Punct::DoubleSlash),
			Token::Name("b".into()),
			Token::Punct(Punct::LessEqual),
			Token::Name("c".into()),
			Token::Eof,
		]);
		let_assert!(Err(_) = tokenize("a ? b", false));
	}
}
