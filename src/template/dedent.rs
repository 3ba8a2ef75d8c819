use super::directive::Cursor;
use crate::error::{self, ParseError};

/// Remove the common indentation from the lines of a raw code block.
///
/// Leading blank lines are dropped.
/// The first remaining line sets the indentation that every other non-blank line must start with.
/// Blank lines become empty.
///
/// Tabs and spaces are not interchangeable: the indentation must match exactly.
/// `origin` is the position of `text` in the template source, used for error reporting.
pub fn dedent(text: &str, origin: Cursor) -> Result<String, ParseError> {
	let mut lines = Vec::new();
	let mut offset = 0;
	for (index, line) in text.split('\n').enumerate() {
		lines.push((index, offset, line));
		offset += line.len() + 1;
	}

	let first = match lines.iter().position(|(_, _, line)| !line.trim().is_empty()) {
		Some(x) => x,
		None => return Ok(String::new()),
	};
	let indent = leading_whitespace(lines[first].2);

	let mut output = Vec::with_capacity(lines.len() - first);
	for &(index, offset, line) in &lines[first..] {
		if line.trim().is_empty() {
			output.push("");
			continue;
		}
		match line.strip_prefix(indent) {
			Some(rest) => output.push(rest),
			None => {
				return Err(error::InconsistentIndent {
					position: origin.position + offset,
					line: origin.line + index,
					expected: indent.to_owned(),
					found: leading_whitespace(line).to_owned(),
				}
				.into());
			},
		}
	}
	Ok(output.join("\n"))
}

fn leading_whitespace(line: &str) -> &str {
	let end = line.find(|c: char| !c.is_whitespace()).unwrap_or(line.len());
	&line[..end]
}
