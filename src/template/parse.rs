use super::dedent::dedent;
use super::directive::{self, Cursor, Directive};
use super::scan::{self, Segment, SubstitutionTable};
use super::{Branch, Code, Node};
use crate::error::{self, CodeContext, ParseError};
use crate::escape::{self, CLOSE, OPEN};
use crate::expr::{self, Expr};

/// Parse a complete template source into nodes.
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
	let (nodes, _) = parse_block(source, Cursor::start(), None)?;
	Ok(nodes)
}

/// The directive that opened the block being parsed.
#[derive(Debug, Clone, Copy)]
struct Opening {
	position: usize,
	len: usize,
	line: usize,
	keyword: &'static str,
}

impl Opening {
	fn new(directive: &Directive, keyword: &'static str) -> Self {
		Self {
			position: directive.start.position,
			len: directive.source_len(),
			line: directive.start.line,
			keyword,
		}
	}

	fn unterminated(&self) -> ParseError {
		error::UnterminatedBlock {
			position: self.position,
			len: self.len,
			line: self.line,
			keyword: self.keyword,
		}
		.into()
	}
}

/// Parse nodes until the end of the source or until a directive that belongs to an enclosing block.
///
/// At top level (`opening` is `None`), parsing continues until the end of the source.
/// Inside a block, parsing stops at the first directive that does not open a new construct.
/// The returned cursor points at that directive, which is left for the caller to read.
fn parse_block(source: &str, start: Cursor, opening: Option<Opening>) -> Result<(Vec<Node>, Cursor), ParseError> {
	let mut nodes = Vec::new();
	let mut cursor = start;
	loop {
		let mut table = SubstitutionTable::default();
		let (segment, next) = scan::scan(source, cursor, &mut table)?;
		push_segment(&mut nodes, segment, table);
		cursor = next;

		if cursor.position >= source.len() {
			return match opening {
				None => Ok((nodes, cursor)),
				Some(opening) => Err(opening.unterminated()),
			};
		}

		let directive = directive::read(source, cursor)?;
		log::trace!("line {}: {:?} directive", directive.start.line, directive.keyword());
		let (node, next) = match directive.keyword() {
			"if" => parse_if(source, &directive)?,
			"while" => parse_while(source, &directive)?,
			"for" => parse_for(source, &directive)?,
			"script" => parse_raw(source, &directive, "script")?,
			"eval" => parse_raw(source, &directive, "eval")?,
			keyword => match opening {
				Some(_) => return Ok((nodes, cursor)),
				None => {
					return Err(error::UnknownDirective {
						position: directive.start.position,
						len: directive.source_len(),
						line: directive.start.line,
						keyword: keyword.to_owned(),
					}
					.into())
				},
			},
		};
		nodes.push(node);
		cursor = next;
	}
}

fn push_segment(nodes: &mut Vec<Node>, segment: Segment, table: SubstitutionTable) {
	if segment.is_empty() {
		return;
	}
	if segment.has_slots() {
		nodes.push(Node::Substitute { segment, table });
	} else {
		nodes.push(Node::Literal(segment.text()));
	}
}

/// Read the directive that closes a block body.
///
/// `cursor` must be the cursor returned by [`parse_block()`] for the body.
fn read_close<'a>(source: &'a str, cursor: Cursor, opening: Opening) -> Result<Directive<'a>, ParseError> {
	if cursor.position >= source.len() {
		return Err(opening.unterminated());
	}
	directive::read(source, cursor)
}

/// Require that a close directive has the expected keyword and nothing else.
fn expect_close(directive: &Directive, expected: &'static str) -> Result<(), ParseError> {
	if directive.keyword() != expected {
		return Err(error::MismatchedClose {
			position: directive.start.position,
			len: directive.source_len(),
			line: directive.start.line,
			expected,
			found: directive.keyword().to_owned(),
		}
		.into());
	}
	directive.expect_bare()
}

fn parse_condition(directive: &Directive) -> Result<Code<Expr>, ParseError> {
	let text = directive.argument();
	let parsed = expr::parse_expression(text)
		.map_err(|e| directive.bad_expression(CodeContext::Condition, text, e))?;
	Ok(Code {
		text: text.to_owned(),
		parsed,
		position: directive.start.position,
		line: directive.start.line,
	})
}

fn parse_if(source: &str, directive: &Directive) -> Result<(Node, Cursor), ParseError> {
	let opening = Opening::new(directive, "if");
	let mut branches = Vec::new();
	let mut condition = parse_condition(directive)?;
	let mut cursor = directive.next;
	loop {
		let (body, next) = parse_block(source, cursor, Some(opening))?;
		branches.push(Branch { condition, body });

		let close = read_close(source, next, opening)?;
		log::trace!("line {}: {:?} directive", close.start.line, close.keyword());
		match close.keyword() {
			"elif" => {
				condition = parse_condition(&close)?;
				cursor = close.next;
			},
			"else" => {
				close.expect_bare()?;
				let (body, next) = parse_block(source, close.next, Some(opening))?;
				let end = read_close(source, next, opening)?;
				expect_close(&end, "endif")?;
				let node = Node::If {
					branches,
					otherwise: Some(body),
				};
				return Ok((node, end.next));
			},
			_ => {
				expect_close(&close, "endif")?;
				let node = Node::If {
					branches,
					otherwise: None,
				};
				return Ok((node, close.next));
			},
		}
	}
}

fn parse_while(source: &str, directive: &Directive) -> Result<(Node, Cursor), ParseError> {
	let opening = Opening::new(directive, "while");
	let condition = parse_condition(directive)?;
	let (body, next) = parse_block(source, directive.next, Some(opening))?;
	let close = read_close(source, next, opening)?;
	expect_close(&close, "endwhile")?;
	Ok((Node::While { condition, body }, close.next))
}

fn parse_for(source: &str, directive: &Directive) -> Result<(Node, Cursor), ParseError> {
	let opening = Opening::new(directive, "for");
	let text = directive.argument();
	let parsed = expr::parse_for_header(text)
		.map_err(|e| directive.bad_expression(CodeContext::Loop, text, e))?;
	let header = Code {
		text: text.to_owned(),
		parsed,
		position: directive.start.position,
		line: directive.start.line,
	};
	let (body, next) = parse_block(source, directive.next, Some(opening))?;
	let close = read_close(source, next, opening)?;
	expect_close(&close, "endfor")?;
	Ok((Node::For { header, body }, close.next))
}

/// Parse a raw `script` or `eval` block.
///
/// The body is not scanned for directives: it extends up to the first occurrence of the exact end tag,
/// even if that occurrence is inside a string literal of the code.
fn parse_raw(source: &str, directive: &Directive, keyword: &'static str) -> Result<(Node, Cursor), ParseError> {
	directive.expect_bare()?;
	let end_tag = format!("{OPEN}end{keyword}{CLOSE}");
	let body_start = directive.next;
	let end = memchr::memmem::find(&source.as_bytes()[body_start.position..], end_tag.as_bytes())
		.map(|x| body_start.position + x)
		.ok_or_else(|| Opening::new(directive, keyword).unterminated())?;

	let code = dedent(&source[body_start.position..end], body_start)?;
	let code = escape::unescape(&code).into_owned();
	let next = body_start.advance_to(source, end + end_tag.len());
	let node = if keyword == "script" {
		let parsed = expr::parse_statements(&code)
			.map_err(|e| directive.bad_expression(CodeContext::Script, &code, e))?;
		Node::Script(Code {
			text: code,
			parsed,
			position: directive.start.position,
			line: directive.start.line,
		})
	} else {
		let parsed = expr::parse_expression(&code)
			.map_err(|e| directive.bad_expression(CodeContext::Eval, &code, e))?;
		Node::Eval(Code {
			text: code,
			parsed,
			position: directive.start.position,
			line: directive.start.line,
		})
	};
	Ok((node, next))
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use crate::expr::{Stmt, Target};
	use assert2::{assert, check, let_assert};

	#[test]
	fn test_literal_only() {
		let_assert!(Ok(nodes) = parse("just text\n"));
		assert!(nodes.len() == 1);
		let_assert!(Node::Literal(text) = &nodes[0]);
		assert!(text == "just text\n");

		let_assert!(Ok(nodes) = parse(""));
		assert!(nodes.is_empty());
	}

	#[test]
	fn test_if_chain() {
		let_assert!(Ok(nodes) = parse("{{if a:}}A{{elif b}}B{{elif c:}}{{else:}}D{{endif}}!"));
		assert!(nodes.len() == 2);
		let_assert!(Node::If { branches, otherwise: Some(otherwise) } = &nodes[0]);
		assert!(branches.len() == 3);
		assert!(branches[0].condition.text == "a");
		assert!(branches[1].condition.text == "b");
		assert!(branches[2].body.is_empty());
		assert!(otherwise.len() == 1);
		let_assert!(Node::Literal(text) = &nodes[1]);
		assert!(text == "!");
	}

	#[test]
	fn test_for_header() {
		let_assert!(Ok(nodes) = parse("{{for (k, v) in items.items():}}x{{endfor}}"));
		let_assert!(Node::For { header, body } = &nodes[0]);
		assert!(header.text == "(k, v) in items.items()");
		let_assert!(Target::Tuple(names) = &header.parsed.target);
		assert!(names.len() == 2);
		assert!(body.len() == 1);
	}

	#[test]
	fn test_script_body_is_raw() {
		let source = "{{script}}\n    x = '{{'\n    y = 2\n{{endscript}}after";
		let_assert!(Ok(nodes) = parse(source));
		let_assert!(Node::Script(code) = &nodes[0]);
		assert!(code.text == "x = '{{'\ny = 2\n");
		assert!(code.parsed.len() == 2);
		let_assert!(Stmt::Assign(..) = &code.parsed[0]);
		let_assert!(Node::Literal(text) = &nodes[1]);
		assert!(text == "after");
	}

	#[test]
	fn test_script_end_tag_found_inside_string() {
		// The end tag is found by plain text search, so it can not appear inside the script.
		let source = "{{script}}x = '{{endscript}}'{{endscript}}";
		let_assert!(Err(ParseError::BadExpression(e)) = parse(source));
		assert!(e.context == CodeContext::Script);
	}

	#[test]
	fn test_unterminated_blocks() {
		let_assert!(Err(ParseError::UnterminatedBlock(e)) = parse("a\n{{if x:}}b"));
		assert!(e.keyword == "if");
		assert!(e.line == 2);
		let_assert!(Err(ParseError::UnterminatedBlock(e)) = parse("{{for x in y:}}{{if x:}}{{endif}}"));
		assert!(e.keyword == "for");
		let_assert!(Err(ParseError::UnterminatedBlock(e)) = parse("{{script}}x = 1"));
		assert!(e.keyword == "script");
		let_assert!(Err(ParseError::UnterminatedBlock(e)) = parse("{{if a:}}{{else:}}"));
		assert!(e.keyword == "if");
	}

	#[test]
	fn test_mismatched_close() {
		let_assert!(Err(ParseError::MismatchedClose(e)) = parse("{{while x:}}{{endfor}}"));
		assert!(e.expected == "endwhile");
		assert!(e.found == "endfor");
		let_assert!(Err(ParseError::MismatchedClose(e)) = parse("{{if x:}}{{else:}}{{elif y:}}{{endif}}"));
		assert!(e.expected == "endif");
		assert!(e.found == "elif");
		let_assert!(Err(ParseError::MismatchedClose(_)) = parse("{{for x in y:}}{{endeval}}"));
	}

	#[test]
	fn test_unknown_directive_at_top_level() {
		let_assert!(Err(ParseError::UnknownDirective(e)) = parse("text {{endif}}"));
		assert!(e.keyword == "endif");
		assert!(e.position == 5);
		let_assert!(Err(ParseError::UnknownDirective(e)) = parse("{{else:}}"));
		assert!(e.keyword == "else");
	}

	#[test]
	fn test_malformed_directives() {
		let_assert!(Err(ParseError::MalformedDirective(_)) = parse("{{if a:}}{{else b:}}{{endif}}"));
		let_assert!(Err(ParseError::MalformedDirective(_)) = parse("{{if a:}}{{endif a}}"));
		let_assert!(Err(ParseError::MalformedDirective(_)) = parse("{{script foo}}{{endscript}}"));
	}

	#[test]
	fn test_bad_expressions() {
		let_assert!(Err(ParseError::BadExpression(e)) = parse("{{if a ==:}}{{endif}}"));
		check!(e.context == CodeContext::Condition);
		let_assert!(Err(ParseError::BadExpression(e)) = parse("{{for 1 in x:}}{{endfor}}"));
		check!(e.context == CodeContext::Loop);
		let_assert!(Err(ParseError::BadExpression(e)) = parse("{{eval}}x ={{endeval}}"));
		check!(e.context == CodeContext::Eval);
	}

	#[test]
	fn test_inconsistent_indent() {
		let source = "{{script}}\n    x = 1\n  y = 2\n{{endscript}}";
		let_assert!(Err(ParseError::InconsistentIndent(e)) = parse(source));
		assert!(e.line == 3);
		assert!(e.expected == "    ");
		assert!(e.found == "  ");
	}
}
