//! Delimiters and escape sequences of the template syntax.
//!
//! Templates use `{{` and `}}` to delimit directives.
//! To write the delimiters literally, use `{${` and `}$}`.
//! A literal `$` that would otherwise form an escape is written as `$$`.

use std::borrow::Cow;

/// The opening delimiter of a directive.
pub const OPEN: &str = "{{";

/// The closing delimiter of a directive.
pub const CLOSE: &str = "}}";

/// The escape character.
pub const MARKER: char = '$';

/// Escape sequences and their replacements, in the order they are applied.
pub const ESCAPES: [(&str, &str); 3] = [
	("{${", "{{"),
	("}$}", "}}"),
	("$$", "$"),
];

/// Replace escape sequences with the text they stand for.
///
/// The sequences are replaced one after another in the order of [`ESCAPES`],
/// each over the result of the previous replacement.
/// For example, `{$${` becomes `{${` and stays that way.
///
/// Text without any `$` is returned as-is without allocating.
pub fn unescape(text: &str) -> Cow<'_, str> {
	if memchr::memchr(MARKER as u8, text.as_bytes()).is_none() {
		return Cow::Borrowed(text);
	}
	let mut result = text.to_owned();
	for (escaped, plain) in ESCAPES {
		if result.contains(escaped) {
			result = result.replace(escaped, plain);
		}
	}
	Cow::Owned(result)
}
