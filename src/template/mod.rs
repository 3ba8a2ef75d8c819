use crate::error::{CompositionError, Error, ParseError, RunError};
use crate::expr::{Expr, ForHeader, Stmt};
use crate::ValueMap;

mod dedent;
mod directive;
mod listing;
mod parse;
mod run;
mod scan;

pub use run::Output;
pub use scan::{sanitize, Piece, Segment, Slot, SubstitutionTable, PERCENT_KEY};

/// A piece of embedded code together with its parsed form and its location in the template source.
#[derive(Debug, Clone)]
pub struct Code<T> {
	/// The code, after unescaping.
	pub text: String,

	/// The parsed code.
	pub parsed: T,

	/// The byte offset of the directive containing the code.
	pub position: usize,

	/// The line number of the directive containing the code.
	pub line: usize,
}

/// A node of a compiled template.
#[derive(Debug, Clone)]
pub enum Node {
	/// Literal text, written as-is.
	Literal(String),

	/// Literal text with inline substitutions.
	Substitute {
		/// The text and placeholders.
		segment: Segment,

		/// The values for the placeholders.
		table: SubstitutionTable,
	},

	/// A conditional with one or more `if`/`elif` branches and an optional `else` body.
	If {
		/// The branches in source order.
		branches: Vec<Branch>,

		/// The body of the `else` branch, if any.
		otherwise: Option<Vec<Node>>,
	},

	/// A `while` loop.
	While {
		/// The loop condition.
		condition: Code<Expr>,

		/// The loop body.
		body: Vec<Node>,
	},

	/// A `for` loop.
	For {
		/// The loop binding and the iterable.
		header: Code<ForHeader>,

		/// The loop body.
		body: Vec<Node>,
	},

	/// A raw `script` block.
	Script(Code<Vec<Stmt>>),

	/// A raw `eval` block: the value of the expression is written to the output.
	Eval(Code<Expr>),
}

/// A branch of a conditional.
#[derive(Debug, Clone)]
pub struct Branch {
	/// The condition of the branch.
	pub condition: Code<Expr>,

	/// The nodes to run if the condition holds.
	pub body: Vec<Node>,
}

/// A compiled template.
///
/// Compile the template once and run it as often as needed with different values.
///
/// Templates contain literal text, inline substitutions and block directives:
/// * `{{expr}}` is replaced by the text form of the expression.
/// * `{{if cond:}}`, `{{elif cond:}}`, `{{else:}}` and `{{endif}}` select text conditionally.
/// * `{{while cond:}}` and `{{endwhile}}` repeat text while a condition holds.
/// * `{{for x in items:}}` and `{{endfor}}` repeat text for every item.
/// * `{{script}}` and `{{endscript}}` enclose statements to run.
/// * `{{eval}}` and `{{endeval}}` enclose an expression whose value is written to the output.
///
/// The colon after a directive is optional.
/// Use `{${` and `}$}` to write literal delimiters and `$$` to write a literal `$`.
#[derive(Clone)]
pub struct Template {
	source: String,
	nodes: Vec<Node>,
}

impl std::fmt::Debug for Template {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Template").field(&self.source).finish()
	}
}

impl Template {
	/// Parse a template from source text.
	///
	/// All embedded code is checked for syntax errors.
	/// Unlike [`Self::compile()`], the result is not validated as a whole.
	pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
		let source = source.into();
		let nodes = parse::parse(&source)?;
		Ok(Self { source, nodes })
	}

	/// Compile a template from source text.
	///
	/// This parses the template and validates the result.
	pub fn compile(source: impl Into<String>) -> Result<Self, Error> {
		let template = Self::parse(source)?;
		if let Err(message) = template.validate() {
			return Err(CompositionError {
				message,
				listing: template.listing(),
			}
			.into());
		}
		Ok(template)
	}

	/// Get the original source text.
	#[inline]
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Get the compiled nodes.
	#[inline]
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Run the template with the given values.
	///
	/// Every entry of `values` whose key is a valid identifier is bound as a name for the embedded code.
	/// Other entries are skipped.
	///
	/// Errors raised by embedded code end the run and are returned unmodified.
	/// Output written before the error remains written.
	pub fn run<M>(&self, values: &M, output: Output<'_>) -> Result<(), RunError>
	where
		M: ValueMap + ?Sized,
	{
		run::run(&self.nodes, values, output)
	}

	/// Run the template and collect the output in a string.
	pub fn render<M>(&self, values: &M) -> Result<String, RunError>
	where
		M: ValueMap + ?Sized,
	{
		let mut output = String::with_capacity(self.source.len());
		self.run(values, Output::Writer(&mut output))?;
		Ok(output)
	}

	/// Get a readable listing of the compiled template.
	///
	/// The listing shows the structure of the template as indented procedural code.
	pub fn listing(&self) -> String {
		listing::listing(&self.nodes)
	}

	/// Check the structural invariants of the compiled nodes.
	pub(crate) fn validate(&self) -> Result<(), String> {
		validate_nodes(&self.nodes)
	}
}

fn validate_nodes(nodes: &[Node]) -> Result<(), String> {
	for node in nodes {
		match node {
			Node::Literal(_) | Node::Script(_) | Node::Eval(_) => (),
			Node::Substitute { segment, table } => {
				for piece in &segment.pieces {
					if let Piece::Slot(key) = piece {
						if table.get(key).is_none() {
							return Err(format!("placeholder {key:?} has no substitution"));
						}
					}
				}
			},
			Node::If { branches, otherwise } => {
				if branches.is_empty() {
					return Err("conditional without branches".into());
				}
				for branch in branches {
					validate_nodes(&branch.body)?;
				}
				if let Some(body) = otherwise {
					validate_nodes(body)?;
				}
			},
			Node::While { body, .. } | Node::For { body, .. } => validate_nodes(body)?,
		}
	}
	Ok(())
}
