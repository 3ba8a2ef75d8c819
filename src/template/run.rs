use std::io::Write as _;

use super::scan::{Piece, Slot};
use super::Node;
use crate::error::RunError;
use crate::expr::{self, Scope};
use crate::ValueMap;

/// The destination of the output of a template run.
#[derive(Default)]
pub enum Output<'a> {
	/// Write to the standard output of the process.
	#[default]
	Stdout,

	/// Write to a text writer, such as a [`String`].
	Writer(&'a mut dyn std::fmt::Write),

	/// Write to a byte sink, such as a file.
	Sink(&'a mut dyn std::io::Write),
}

impl std::fmt::Debug for Output<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Stdout => f.write_str("Stdout"),
			Self::Writer(_) => f.write_str("Writer(..)"),
			Self::Sink(_) => f.write_str("Sink(..)"),
		}
	}
}

impl<'a> Output<'a> {
	/// Select the output from an optional writer and an optional sink.
	///
	/// Without either, output goes to standard output.
	/// Supplying both is an error.
	pub fn select(
		writer: Option<&'a mut dyn std::fmt::Write>,
		sink: Option<&'a mut dyn std::io::Write>,
	) -> Result<Self, RunError> {
		match (writer, sink) {
			(Some(_), Some(_)) => Err(RunError::OutputConflict),
			(Some(writer), None) => Ok(Self::Writer(writer)),
			(None, Some(sink)) => Ok(Self::Sink(sink)),
			(None, None) => Ok(Self::Stdout),
		}
	}

	fn write(&mut self, text: &str) -> Result<(), RunError> {
		match self {
			Self::Stdout => std::io::stdout().lock().write_all(text.as_bytes())?,
			Self::Writer(writer) => writer.write_str(text)?,
			Self::Sink(sink) => sink.write_all(text.as_bytes())?,
		}
		Ok(())
	}

	fn flush(&mut self) -> Result<(), RunError> {
		match self {
			Self::Stdout => std::io::stdout().lock().flush()?,
			Self::Writer(_) => (),
			Self::Sink(sink) => sink.flush()?,
		}
		Ok(())
	}
}

/// Bind the entries of a value map in a new scope.
///
/// Keys that are not identifiers are skipped, so they can never be mistaken for code.
fn bind_values<M: ValueMap + ?Sized>(values: &M) -> Scope {
	let mut scope = Scope::new();
	values.visit_entries(&mut |key, value| {
		if expr::is_identifier(key) {
			scope.bind(key, value);
		} else {
			log::debug!("skipping value with key {key:?}: not an identifier");
		}
	});
	scope
}

/// Run compiled nodes with a value map.
pub fn run<M: ValueMap + ?Sized>(nodes: &[Node], values: &M, output: Output<'_>) -> Result<(), RunError> {
	let mut runner = Runner {
		scope: bind_values(values),
		output,
	};
	let result = runner.run_nodes(nodes);
	// Flush what was written, even if the run failed.
	let flushed = runner.output.flush();
	result.and(flushed)
}

struct Runner<'a> {
	scope: Scope,
	output: Output<'a>,
}

impl Runner<'_> {
	fn run_nodes(&mut self, nodes: &[Node]) -> Result<(), RunError> {
		for node in nodes {
			self.run_node(node)?;
		}
		Ok(())
	}

	fn run_node(&mut self, node: &Node) -> Result<(), RunError> {
		match node {
			Node::Literal(text) => self.output.write(text),
			Node::Substitute { segment, table } => {
				// Evaluate all substitutions first, so a failing expression writes nothing of the segment.
				let mut values = Vec::with_capacity(table.len());
				for (key, slot) in table.iter() {
					let value = match slot {
						Slot::Percent => String::from("%"),
						Slot::Expr(code) => code.parsed.eval(&self.scope)?.to_string(),
					};
					values.push((key, value));
				}

				let mut text = String::new();
				for piece in &segment.pieces {
					match piece {
						Piece::Text(x) => text.push_str(x),
						Piece::Slot(key) => {
							if let Some((_, value)) = values.iter().find(|(x, _)| *x == key.as_str()) {
								text.push_str(value);
							}
						},
					}
				}
				self.output.write(&text)
			},
			Node::If { branches, otherwise } => {
				for branch in branches {
					if branch.condition.parsed.eval(&self.scope)?.is_truthy() {
						return self.run_nodes(&branch.body);
					}
				}
				match otherwise {
					Some(body) => self.run_nodes(body),
					None => Ok(()),
				}
			},
			Node::While { condition, body } => {
				while condition.parsed.eval(&self.scope)?.is_truthy() {
					self.run_nodes(body)?;
				}
				Ok(())
			},
			Node::For { header, body } => {
				let items = expr::iterate(header.parsed.iterable.eval(&self.scope)?)?;
				for item in items {
					header.parsed.target.assign(&mut self.scope, item)?;
					self.run_nodes(body)?;
				}
				Ok(())
			},
			Node::Script(code) => {
				for statement in &code.parsed {
					statement.exec(&mut self.scope)?;
				}
				Ok(())
			},
			Node::Eval(code) => {
				let value = code.parsed.eval(&self.scope)?;
				self.output.write(&value.to_string())
			},
		}
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use crate::{Template, Value};
	use assert2::{assert, let_assert};

	#[test]
	fn test_select_output() {
		let mut text = String::new();
		let mut bytes: Vec<u8> = Vec::new();
		let_assert!(Err(RunError::OutputConflict) = Output::select(Some(&mut text), Some(&mut bytes)));
		let_assert!(Ok(Output::Writer(_)) = Output::select(Some(&mut text), None));
		let_assert!(Ok(Output::Sink(_)) = Output::select(None, Some(&mut bytes)));
		let_assert!(Ok(Output::Stdout) = Output::select(None, None));
	}

	#[test]
	fn test_run_to_sink() {
		let_assert!(Ok(template) = Template::compile("{{for i in range(3):}}{{i}}{{endfor}}"));
		let mut bytes = Vec::new();
		let_assert!(Ok(()) = template.run(&[("unused", 1)], Output::Sink(&mut bytes)));
		assert!(bytes == b"012");
	}

	#[test]
	fn test_loop_binding_stays_visible() {
		let_assert!(Ok(template) = Template::compile("{{for x in items:}}{{endfor}}{{x}}"));
		let_assert!(Ok(output) = template.render(&[("items", Value::from(vec!["a", "b"]))]));
		assert!(output == "b");
	}

	#[test]
	fn test_partial_output_on_error() {
		let_assert!(Ok(template) = Template::compile("one {{if 1 / zero:}}two{{endif}}"));
		let mut output = String::new();
		let_assert!(Err(RunError::ZeroDivision) = template.run(&[("zero", 0)], Output::Writer(&mut output)));
		assert!(output == "one ");
	}
}
