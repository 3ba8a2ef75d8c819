use crate::error::{self, CodeContext, ParseError};
use crate::escape::{self, CLOSE, OPEN};
use crate::expr::SyntaxError;

/// The keywords that introduce or close a block directive.
pub const KEYWORDS: [&str; 12] = [
	"if", "elif", "else", "endif",
	"while", "endwhile",
	"for", "endfor",
	"script", "endscript",
	"eval", "endeval",
];

/// Check if a word is a block directive keyword.
pub fn is_keyword(word: &str) -> bool {
	KEYWORDS.contains(&word)
}

/// A position in the template source.
///
/// A cursor only moves forward.
/// It is `Copy`, so looking ahead is done on a copy that is only committed when the lookahead succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
	/// The byte offset in the source.
	pub position: usize,

	/// The line number of the byte offset, starting at 1.
	pub line: usize,
}

impl Cursor {
	/// A cursor at the start of the source.
	pub fn start() -> Self {
		Self { position: 0, line: 1 }
	}

	/// Move the cursor forward to `position`, counting the newlines that are skipped.
	pub fn advance_to(self, source: &str, position: usize) -> Self {
		debug_assert!(position >= self.position);
		let skipped = &source.as_bytes()[self.position..position];
		Self {
			position,
			line: self.line + memchr::memchr_iter(b'\n', skipped).count(),
		}
	}
}

/// A single `{{...}}` directive read from the source.
#[derive(Debug, Clone)]
pub struct Directive<'a> {
	/// The cursor at the opening delimiter.
	pub start: Cursor,

	/// The raw text between the delimiters.
	pub raw: &'a str,

	/// The text between the delimiters with surrounding whitespace removed and escapes replaced.
	pub text: String,

	/// The cursor just after the closing delimiter.
	pub next: Cursor,
}

impl Directive<'_> {
	/// The length of the whole directive in the source, including the delimiters.
	pub fn source_len(&self) -> usize {
		self.next.position - self.start.position
	}

	/// The first word of the directive, with a trailing colon removed.
	pub fn keyword(&self) -> &str {
		keyword_of(&self.text)
	}

	/// Everything after the keyword, with a trailing colon removed.
	pub fn argument(&self) -> &str {
		let keyword = self.keyword();
		let text = self.text.strip_suffix(':').unwrap_or(&self.text);
		text.get(keyword.len()..).unwrap_or("").trim()
	}

	/// Create an error for a directive with an invalid form.
	pub fn malformed(&self, message: impl Into<String>) -> ParseError {
		error::MalformedDirective {
			position: self.start.position,
			len: self.source_len(),
			line: self.start.line,
			message: message.into(),
		}
		.into()
	}

	/// Create an error for embedded code of the directive that failed to parse.
	pub fn bad_expression(&self, context: CodeContext, code: &str, error: SyntaxError) -> ParseError {
		error::BadExpression {
			position: self.start.position,
			len: self.source_len(),
			line: self.start.line,
			context,
			code: code.into(),
			message: error.to_string(),
		}
		.into()
	}

	/// Require that the directive consists of the keyword alone.
	pub fn expect_bare(&self) -> Result<(), ParseError> {
		if self.argument().is_empty() {
			Ok(())
		} else {
			Err(self.malformed(format!("'{}' does not take an argument: {:?}", self.keyword(), self.text)))
		}
	}
}

/// Get the first whitespace delimited word of directive text, with a trailing colon removed.
pub fn keyword_of(text: &str) -> &str {
	let text = text.trim();
	let text = text.strip_suffix(':').unwrap_or(text);
	text.split_whitespace().next().unwrap_or("")
}

/// Read the directive that starts at the cursor.
///
/// The cursor must be positioned at an opening delimiter.
pub fn read<'a>(source: &'a str, cursor: Cursor) -> Result<Directive<'a>, ParseError> {
	if !source[cursor.position..].starts_with(OPEN) {
		return Err(error::MalformedDirective {
			position: cursor.position,
			len: source.len().min(cursor.position + OPEN.len()) - cursor.position,
			line: cursor.line,
			message: "expected the start of a directive".into(),
		}
		.into());
	}

	let inner_start = cursor.position + OPEN.len();
	let inner_end = memchr::memmem::find(&source.as_bytes()[inner_start..], CLOSE.as_bytes())
		.map(|x| inner_start + x)
		.ok_or(error::UnterminatedDirective {
			position: cursor.position,
			line: cursor.line,
		})?;

	let raw = &source[inner_start..inner_end];
	let text = escape::unescape(raw.trim()).into_owned();
	let next = cursor.advance_to(source, inner_end + CLOSE.len());
	Ok(Directive {
		start: cursor,
		raw,
		text,
		next,
	})
}
