use std::fmt::Write;

use indexmap::IndexMap;

use super::directive::{self, Cursor};
use super::Code;
use crate::error::{CodeContext, ParseError};
use crate::escape::{self, OPEN};
use crate::expr::{self, Expr};

/// The substitution key of a literal `%` in template text.
pub const PERCENT_KEY: &str = "#percent#";

/// A piece of a scanned segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
	/// Literal text, with escapes already replaced.
	Text(String),

	/// A placeholder for an entry in the substitution table.
	Slot(String),
}

/// The value that fills a placeholder.
#[derive(Debug, Clone)]
pub enum Slot {
	/// A literal `%` from the template text.
	Percent,

	/// An inline expression.
	Expr(Code<Expr>),
}

/// The substitutions of one segment, keyed by sanitized expression text.
///
/// An expression that appears more than once is registered once.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionTable {
	entries: IndexMap<String, Slot>,
}

impl SubstitutionTable {
	/// Register a slot under a key, unless the key is already present.
	pub fn register(&mut self, key: &str, slot: Slot) {
		if !self.entries.contains_key(key) {
			self.entries.insert(key.to_owned(), slot);
		}
	}

	/// Look up the slot for a key.
	pub fn get(&self, key: &str) -> Option<&Slot> {
		self.entries.get(key)
	}

	/// Iterate over all entries in registration order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot)> {
		self.entries.iter().map(|(key, slot)| (key.as_str(), slot))
	}

	/// Get the number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Check if the table has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// The literal text and placeholders between two block directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
	/// The pieces of the segment in source order.
	pub pieces: Vec<Piece>,
}

impl Segment {
	/// Check if the segment contains any placeholders.
	pub fn has_slots(&self) -> bool {
		self.pieces.iter().any(|x| matches!(x, Piece::Slot(_)))
	}

	/// Check if the segment produces no output at all.
	pub fn is_empty(&self) -> bool {
		self.pieces.is_empty()
	}

	/// Get the literal text of a segment without placeholders.
	pub fn text(&self) -> String {
		let mut text = String::new();
		for piece in &self.pieces {
			if let Piece::Text(x) = piece {
				text.push_str(x);
			}
		}
		text
	}

	fn push_text(&mut self, text: &str) {
		if text.is_empty() {
			return;
		}
		match self.pieces.last_mut() {
			Some(Piece::Text(last)) => last.push_str(text),
			_ => self.pieces.push(Piece::Text(text.to_owned())),
		}
	}
}

/// Make expression text usable as a substitution key.
///
/// Characters with a meaning in substitution formats are replaced:
/// `%` by `#P#`, parentheses by `#[#` and `#]#` and whitespace by `#w` followed by the character code and `#`.
/// A literal `#` becomes `#H#`, so different expressions never share a key.
pub fn sanitize(text: &str) -> String {
	let mut key = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'#' => key.push_str("#H#"),
			'%' => key.push_str("#P#"),
			'(' => key.push_str("#[#"),
			')' => key.push_str("#]#"),
			c if c.is_whitespace() => {
				let _ = write!(key, "#w{}#", u32::from(c));
			},
			c => key.push(c),
		}
	}
	key
}

/// Scan literal text and inline substitutions from the cursor up to the next block directive.
///
/// Returns the scanned segment and the cursor where scanning stopped:
/// either the end of the source, or the opening delimiter of a block directive.
/// The block directive itself is not consumed.
pub fn scan(source: &str, start: Cursor, table: &mut SubstitutionTable) -> Result<(Segment, Cursor), ParseError> {
	let mut segment = Segment::default();
	let mut cursor = start;
	loop {
		let rest = &source.as_bytes()[cursor.position..];
		let percent = memchr::memchr(b'%', rest);
		let open = memchr::memmem::find(rest, OPEN.as_bytes());
		let stop = match (percent, open) {
			(Some(a), Some(b)) => cursor.position + a.min(b),
			(Some(a), None) | (None, Some(a)) => cursor.position + a,
			(None, None) => {
				segment.push_text(&escape::unescape(&source[cursor.position..]));
				return Ok((segment, cursor.advance_to(source, source.len())));
			},
		};

		segment.push_text(&escape::unescape(&source[cursor.position..stop]));
		cursor = cursor.advance_to(source, stop);

		if source.as_bytes()[stop] == b'%' {
			table.register(PERCENT_KEY, Slot::Percent);
			segment.pieces.push(Piece::Slot(PERCENT_KEY.into()));
			cursor = cursor.advance_to(source, stop + 1);
			continue;
		}

		// Peek at the directive: block keywords end the segment without consuming anything.
		let directive = directive::read(source, cursor)?;
		if directive::is_keyword(directive.keyword()) {
			return Ok((segment, cursor));
		}

		let parsed = expr::parse_expression(&directive.text)
			.map_err(|e| directive.bad_expression(CodeContext::Substitution, &directive.text, e))?;
		let key = sanitize(&directive.text);
		table.register(&key, Slot::Expr(Code {
			text: directive.text.clone(),
			parsed,
			position: directive.start.position,
			line: directive.start.line,
		}));
		segment.pieces.push(Piece::Slot(key));
		cursor = directive.next;
	}
}
