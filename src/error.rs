//! Module containing error details.

use std::path::PathBuf;

/// An error that can occur while compiling, loading or running a template.
#[derive(Debug)]
pub enum Error {
	/// The template source could not be parsed.
	Parse(ParseError),

	/// The parsed template failed validation as a whole.
	Composition(CompositionError),

	/// Running the template failed.
	Run(RunError),

	/// Reading a template source or writing a generated artifact failed.
	Io(IoError),

	/// A template was not found in any directory of the search path.
	NotFound(NotFound),
}

impl From<ParseError> for Error {
	#[inline]
	fn from(other: ParseError) -> Self {
		Self::Parse(other)
	}
}

impl From<CompositionError> for Error {
	#[inline]
	fn from(other: CompositionError) -> Self {
		Self::Composition(other)
	}
}

impl From<RunError> for Error {
	#[inline]
	fn from(other: RunError) -> Self {
		Self::Run(other)
	}
}

impl From<IoError> for Error {
	#[inline]
	fn from(other: IoError) -> Self {
		Self::Io(other)
	}
}

impl From<NotFound> for Error {
	#[inline]
	fn from(other: NotFound) -> Self {
		Self::NotFound(other)
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Parse(e) => Some(e),
			Self::Composition(e) => Some(e),
			Self::Run(e) => Some(e),
			Self::Io(e) => Some(&e.error),
			Self::NotFound(_) => None,
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Parse(e) => e.fmt(f),
			Self::Composition(e) => e.fmt(f),
			Self::Run(e) => e.fmt(f),
			Self::Io(e) => e.fmt(f),
			Self::NotFound(e) => e.fmt(f),
		}
	}
}

/// An error that can occur while parsing a template.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub enum ParseError {
	/// A directive was opened with `{{` but never closed with `}}`.
	UnterminatedDirective(UnterminatedDirective),

	/// A block directive was never closed by its end keyword.
	UnterminatedBlock(UnterminatedBlock),

	/// A block was closed by the wrong end keyword.
	MismatchedClose(MismatchedClose),

	/// Embedded code failed to parse.
	BadExpression(BadExpression),

	/// The lines of a raw `script` or `eval` block do not share the same indentation.
	InconsistentIndent(InconsistentIndent),

	/// A directive keyword appeared at top level where it has no meaning.
	UnknownDirective(UnknownDirective),

	/// A directive has an invalid form.
	MalformedDirective(MalformedDirective),
}

impl From<UnterminatedDirective> for ParseError {
	fn from(other: UnterminatedDirective) -> Self {
		Self::UnterminatedDirective(other)
	}
}

impl From<UnterminatedBlock> for ParseError {
	fn from(other: UnterminatedBlock) -> Self {
		Self::UnterminatedBlock(other)
	}
}

impl From<MismatchedClose> for ParseError {
	fn from(other: MismatchedClose) -> Self {
		Self::MismatchedClose(other)
	}
}

impl From<BadExpression> for ParseError {
	fn from(other: BadExpression) -> Self {
		Self::BadExpression(other)
	}
}

impl From<InconsistentIndent> for ParseError {
	fn from(other: InconsistentIndent) -> Self {
		Self::InconsistentIndent(other)
	}
}

impl From<UnknownDirective> for ParseError {
	fn from(other: UnknownDirective) -> Self {
		Self::UnknownDirective(other)
	}
}

impl From<MalformedDirective> for ParseError {
	fn from(other: MalformedDirective) -> Self {
		Self::MalformedDirective(other)
	}
}

impl std::error::Error for ParseError {}

impl std::fmt::Display for ParseError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::UnterminatedDirective(e) => e.fmt(f),
			Self::UnterminatedBlock(e) => e.fmt(f),
			Self::MismatchedClose(e) => e.fmt(f),
			Self::BadExpression(e) => e.fmt(f),
			Self::InconsistentIndent(e) => e.fmt(f),
			Self::UnknownDirective(e) => e.fmt(f),
			Self::MalformedDirective(e) => e.fmt(f),
		}
	}
}

/// A directive was opened with `{{` but never closed with `}}`.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct UnterminatedDirective {
	/// The byte offset of the opening `{{` in the source.
	pub position: usize,

	/// The line number of the opening `{{`, starting at 1.
	pub line: usize,
}

impl std::error::Error for UnterminatedDirective {}

impl std::fmt::Display for UnterminatedDirective {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Unterminated directive on line {}: missing closing '}}}}'", self.line)
	}
}

/// A block directive was never closed by its end keyword.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct UnterminatedBlock {
	/// The byte offset of the directive that opened the block.
	pub position: usize,

	/// The length of the directive that opened the block.
	pub len: usize,

	/// The line number of the directive that opened the block.
	pub line: usize,

	/// The keyword that opened the block.
	pub keyword: &'static str,
}

impl std::error::Error for UnterminatedBlock {}

impl std::fmt::Display for UnterminatedBlock {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Unterminated '{}' block opened on line {}: missing '{{{{end{}}}}}'", self.keyword, self.line, self.keyword)
	}
}

/// A block was closed by the wrong end keyword.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct MismatchedClose {
	/// The byte offset of the offending directive.
	pub position: usize,

	/// The length of the offending directive.
	pub len: usize,

	/// The line number of the offending directive.
	pub line: usize,

	/// The keyword that was expected.
	pub expected: &'static str,

	/// The keyword that was found instead.
	pub found: String,
}

impl std::error::Error for MismatchedClose {}

impl std::fmt::Display for MismatchedClose {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Mismatched close on line {}: expected '{}', found '{}'", self.line, self.expected, self.found)
	}
}

/// The place where a piece of embedded code was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeContext {
	/// An inline substitution: `{{expr}}`.
	Substitution,

	/// The condition of an `if`, `elif` or `while`.
	Condition,

	/// The header of a `for` loop.
	Loop,

	/// The body of a raw `script` block.
	Script,

	/// The body of a raw `eval` block.
	Eval,
}

impl CodeContext {
	fn description(self) -> &'static str {
		match self {
			Self::Substitution => "substitution",
			Self::Condition => "condition",
			Self::Loop => "loop header",
			Self::Script => "script",
			Self::Eval => "eval expression",
		}
	}
}

/// Embedded code failed to parse.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct BadExpression {
	/// The byte offset of the directive containing the code.
	pub position: usize,

	/// The length of the directive containing the code.
	pub len: usize,

	/// The line number of the directive containing the code.
	pub line: usize,

	/// Where the code was found.
	pub context: CodeContext,

	/// The code, after unescaping.
	pub code: String,

	/// The error reported by the expression parser.
	pub message: String,
}

impl std::error::Error for BadExpression {}

impl std::fmt::Display for BadExpression {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Bad {} on line {}: {:?}: {}", self.context.description(), self.line, self.code, self.message)
	}
}

/// The lines of a raw `script` or `eval` block do not share the same indentation.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct InconsistentIndent {
	/// The byte offset of the start of the offending line.
	pub position: usize,

	/// The line number of the offending line.
	pub line: usize,

	/// The indentation established by the first non-blank line.
	pub expected: String,

	/// The indentation found on the offending line.
	pub found: String,
}

impl std::error::Error for InconsistentIndent {}

impl std::fmt::Display for InconsistentIndent {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Inconsistent indentation on line {}: expected {:?}, found {:?}", self.line, self.expected, self.found)
	}
}

/// A directive keyword appeared at top level where it has no meaning.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct UnknownDirective {
	/// The byte offset of the directive.
	pub position: usize,

	/// The length of the directive.
	pub len: usize,

	/// The line number of the directive.
	pub line: usize,

	/// The keyword of the directive.
	pub keyword: String,
}

impl std::error::Error for UnknownDirective {}

impl std::fmt::Display for UnknownDirective {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Unknown directive on line {}: '{}' outside of a matching block", self.line, self.keyword)
	}
}

/// A directive has an invalid form.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct MalformedDirective {
	/// The byte offset of the directive.
	pub position: usize,

	/// The length of the directive.
	pub len: usize,

	/// The line number of the directive.
	pub line: usize,

	/// A human readable description of the problem.
	pub message: String,
}

impl std::error::Error for MalformedDirective {}

impl std::fmt::Display for MalformedDirective {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Malformed directive on line {}: {}", self.line, self.message)
	}
}

impl ParseError {
	/// Get the line number in the source that contains the error, starting at 1.
	pub fn line(&self) -> usize {
		match self {
			Self::UnterminatedDirective(e) => e.line,
			Self::UnterminatedBlock(e) => e.line,
			Self::MismatchedClose(e) => e.line,
			Self::BadExpression(e) => e.line,
			Self::InconsistentIndent(e) => e.line,
			Self::UnknownDirective(e) => e.line,
			Self::MalformedDirective(e) => e.line,
		}
	}

	/// Get the range in the source text that contains the error.
	pub fn source_range(&self) -> std::ops::Range<usize> {
		let (start, len) = match &self {
			Self::UnterminatedDirective(e) => (e.position, 2),
			Self::UnterminatedBlock(e) => (e.position, e.len),
			Self::MismatchedClose(e) => (e.position, e.len),
			Self::BadExpression(e) => (e.position, e.len),
			Self::InconsistentIndent(e) => (e.position, e.found.len().max(1)),
			Self::UnknownDirective(e) => (e.position, e.len),
			Self::MalformedDirective(e) => (e.position, e.len),
		};
		std::ops::Range {
			start,
			end: start + len,
		}
	}

	/// Get the line of source that contains the error.
	///
	/// # Panics
	/// May panic if the source text is not the original source that contains the error.
	pub fn source_line<'a>(&self, source: &'a str) -> &'a str {
		let position = self.source_range().start;
		let start = line_start(source, position);
		let end = line_end(source, position);
		&source[start..end]
	}

	/// Write source highlighting for the error location.
	///
	/// The highlighting ends with a newline.
	/// The underline stops at the end of the line that contains the start of the error.
	///
	/// Note: this function doesn't print anything if the source line exceeds 60 characters in width.
	/// For more control over this behaviour, consider using [`Self::source_range()`] and [`Self::source_line()`] instead.
	pub fn write_source_highlighting(&self, f: &mut impl std::fmt::Write, source: &str) -> std::fmt::Result {
		use unicode_width::UnicodeWidthStr;

		let range = self.source_range();
		let line = self.source_line(source);
		if line.width() > 60 {
			return Ok(());
		}
		let start = line_start(source, range.start);
		let relative = range.start - start..(range.end - start).min(line.len());
		write!(f, "  {}\n  ", line)?;
		write_underline(f, line, relative)?;
		writeln!(f)
	}

	/// Get source highlighting for the error location as a string.
	///
	/// The highlighting ends with a newline.
	pub fn source_highlighting(&self, source: &str) -> String {
		let mut output = String::new();
		// Writing to a `String` can not fail.
		let _ = self.write_source_highlighting(&mut output, source);
		output
	}
}

fn line_start(source: &str, position: usize) -> usize {
	match source.as_bytes()[..position].iter().rposition(|&c| c == b'\n' || c == b'\r') {
		Some(line_end) => line_end + 1,
		None => 0,
	}
}

fn line_end(source: &str, position: usize) -> usize {
	match source.as_bytes()[position..].iter().position(|&c| c == b'\n' || c == b'\r') {
		Some(line_end) => position + line_end,
		None => source.len(),
	}
}

fn write_underline(f: &mut impl std::fmt::Write, line: &str, range: std::ops::Range<usize>) -> std::fmt::Result {
	use unicode_width::UnicodeWidthStr;
	let spaces = line[..range.start].width();
	let carets = line[range].width().max(1);
	write!(f, "{}", " ".repeat(spaces))?;
	write!(f, "{}", "^".repeat(carets))?;
	Ok(())
}

/// The parsed template failed validation as a whole.
///
/// Every piece of a template is validated while parsing,
/// so this indicates a defect in the compiler rather than in the template.
#[derive(Debug, Clone)]
pub struct CompositionError {
	/// A description of the problem.
	pub message: String,

	/// The full generated listing of the template, for diagnosis.
	pub listing: String,
}

impl std::error::Error for CompositionError {}

impl std::fmt::Display for CompositionError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Internal error: compiled template failed validation: {}\n{}", self.message, self.listing)
	}
}

/// An error raised while running a template.
///
/// Errors from embedded expressions and scripts end the run.
#[derive(Debug)]
pub enum RunError {
	/// A name was used that is not bound.
	UndefinedName(String),

	/// An operation was applied to a value of the wrong type.
	Type(String),

	/// An operation received a value of the right type but an invalid value.
	Value(String),

	/// A sequence index is out of range.
	Index(String),

	/// A key is missing from a map.
	Key(String),

	/// A value has no attribute or method with the given name.
	Attribute {
		/// The type of the value.
		type_name: &'static str,
		/// The name of the attribute.
		name: String,
	},

	/// Division or remainder by zero.
	ZeroDivision,

	/// Both a writer and an output sink were supplied.
	OutputConflict,

	/// Writing to the writer failed.
	Write(std::fmt::Error),

	/// Writing to the output sink failed.
	Io(std::io::Error),
}

impl From<std::fmt::Error> for RunError {
	fn from(other: std::fmt::Error) -> Self {
		Self::Write(other)
	}
}

impl From<std::io::Error> for RunError {
	fn from(other: std::io::Error) -> Self {
		Self::Io(other)
	}
}

impl std::error::Error for RunError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Write(e) => Some(e),
			Self::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl std::fmt::Display for RunError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::UndefinedName(name) => write!(f, "Name is not defined: {name}"),
			Self::Type(message) => write!(f, "Type error: {message}"),
			Self::Value(message) => write!(f, "Value error: {message}"),
			Self::Index(message) => write!(f, "Index error: {message}"),
			Self::Key(key) => write!(f, "Key error: {key:?}"),
			Self::Attribute { type_name, name } => write!(f, "Attribute error: '{type_name}' object has no attribute '{name}'"),
			Self::ZeroDivision => write!(f, "Division by zero"),
			Self::OutputConflict => write!(f, "Do not supply both a writer and an output sink"),
			Self::Write(e) => write!(f, "Failed to write output: {e}"),
			Self::Io(e) => write!(f, "Failed to write output: {e}"),
		}
	}
}

/// Reading a template source or writing a generated artifact failed.
#[derive(Debug)]
pub struct IoError {
	/// The path that was being read or written.
	pub path: PathBuf,

	/// The underlying I/O error.
	pub error: std::io::Error,
}

impl std::fmt::Display for IoError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Failed to access {}: {}", self.path.display(), self.error)
	}
}

/// A template was not found in any directory of the search path.
#[derive(Debug, Clone)]
pub struct NotFound {
	/// The name of the template.
	pub name: String,

	/// The paths that were tried.
	pub searched: Vec<PathBuf>,
}

impl std::fmt::Display for NotFound {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "No source found for template {:?}", self.name)?;
		if !self.searched.is_empty() {
			write!(f, " (tried")?;
			for path in &self.searched {
				write!(f, " {}", path.display())?;
			}
			write!(f, ")")?;
		}
		Ok(())
	}
}
