use std::fmt::Write;

use super::scan::{Piece, Slot};
use super::Node;
use crate::Value;

/// Lower compiled nodes to an indented procedural listing.
///
/// Every nested body is indented by one tab relative to its header.
/// Empty bodies are written as `pass`.
pub fn listing(nodes: &[Node]) -> String {
	let mut output = String::new();
	// Writing to a `String` can not fail.
	let _ = write_nodes(&mut output, nodes, 0);
	output
}

fn write_line(output: &mut String, depth: usize, line: impl std::fmt::Display) -> std::fmt::Result {
	for _ in 0..depth {
		output.push('\t');
	}
	writeln!(output, "{line}")
}

fn write_body(output: &mut String, nodes: &[Node], depth: usize) -> std::fmt::Result {
	if nodes.is_empty() {
		write_line(output, depth, "pass")
	} else {
		write_nodes(output, nodes, depth)
	}
}

fn write_nodes(output: &mut String, nodes: &[Node], depth: usize) -> std::fmt::Result {
	for node in nodes {
		match node {
			Node::Literal(text) => {
				write_line(output, depth, format_args!("write({})", Value::from(text.as_str()).repr()))?;
			},
			Node::Substitute { segment, table } => {
				let mut format = String::new();
				for piece in &segment.pieces {
					match piece {
						Piece::Text(text) => format.push_str(text),
						Piece::Slot(key) => write!(format, "%({key})s")?,
					}
				}
				let mut entries = String::new();
				for (i, (key, slot)) in table.iter().enumerate() {
					if i > 0 {
						entries.push_str(", ");
					}
					let value = match slot {
						Slot::Percent => "'%'",
						Slot::Expr(code) => code.text.as_str(),
					};
					write!(entries, "{}: {}", Value::from(key).repr(), value)?;
				}
				write_line(output, depth, format_args!("write({} % {{{}}})", Value::from(format).repr(), entries))?;
			},
			Node::If { branches, otherwise } => {
				for (i, branch) in branches.iter().enumerate() {
					let keyword = if i == 0 { "if" } else { "elif" };
					write_line(output, depth, format_args!("{keyword} {}:", branch.condition.text))?;
					write_body(output, &branch.body, depth + 1)?;
				}
				if let Some(body) = otherwise {
					write_line(output, depth, "else:")?;
					write_body(output, body, depth + 1)?;
				}
			},
			Node::While { condition, body } => {
				write_line(output, depth, format_args!("while {}:", condition.text))?;
				write_body(output, body, depth + 1)?;
			},
			Node::For { header, body } => {
				write_line(output, depth, format_args!("for {}:", header.text))?;
				write_body(output, body, depth + 1)?;
			},
			Node::Script(code) => {
				let lines: Vec<&str> = code.text.lines().filter(|x| !x.trim().is_empty()).collect();
				if lines.is_empty() {
					write_line(output, depth, "pass")?;
				}
				for line in lines {
					write_line(output, depth, line)?;
				}
			},
			Node::Eval(code) => {
				let lines: Vec<&str> = code.text.lines().filter(|x| !x.trim().is_empty()).collect();
				match lines[..] {
					[] => write_line(output, depth, "write(str())")?,
					[line] => write_line(output, depth, format_args!("write(str({line}))"))?,
					[first, ref rest @ ..] => {
						write_line(output, depth, format_args!("write(str({first}"))?;
						for line in rest {
							write_line(output, depth + 1, line)?;
						}
						write_line(output, depth, "))")?;
					},
				}
			},
		}
	}
	Ok(())
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use crate::Template;
	use assert2::{assert, let_assert};

	#[test]
	fn test_listing() {
		let source = concat!(
			"Hi {{name}}, 100%\n",
			"{{if a:}}{{for x in xs:}}{{x}}{{endfor}}{{elif b:}}{{else:}}no{{endif}}",
			"{{script}}\n  y = 1\n\n  z = 2\n{{endscript}}",
			"{{eval}}y +\n z{{endeval}}",
		);
		let_assert!(Ok(template) = Template::compile(source));
		assert!(template.listing() == concat!(
			"write('Hi %(name)s, 100%(#percent#)s\\n' % {'name': name, '#percent#': '%'})\n",
			"if a:\n",
			"\tfor x in xs:\n",
			"\t\twrite('%(x)s' % {'x': x})\n",
			"elif b:\n",
			"\tpass\n",
			"else:\n",
			"\twrite('no')\n",
			"y = 1\n",
			"z = 2\n",
			"write(str(y +\n",
			"\t z\n",
			"))\n",
		));
	}

	#[test]
	fn test_eval_text_is_kept() {
		let_assert!(Ok(template) = Template::compile("{{eval}}'a  b'{{endeval}}"));
		assert!(template.listing() == "write(str('a  b'))\n");
	}
}
