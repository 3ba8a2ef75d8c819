//! Text templates with inline expressions and block directives.
//!
//! # Features
//!
//! * Literal text passes through byte for byte.
//! * Inline substitution: `"Hello {{name.title()}}!"`
//! * Conditions and loops: `{{if ...:}}`, `{{elif ...:}}`, `{{else:}}`, `{{endif}}`, `{{while ...:}}`, `{{for x in ...:}}`.
//! * Raw code blocks: `{{script}}...{{endscript}}` runs statements, `{{eval}}...{{endeval}}` writes the value of an expression.
//! * All embedded code is checked when the template is compiled, with errors pointing into the template source.
//! * Compiled templates are cached by a [`ModuleBuilder`] and only compiled again when their source changes.
//! * Load the values for a template from JSON, TOML or YAML (optional, requires the `json`, `toml` or `yaml` feature).
//!
//! # Examples
//!
//! The [`render()`] function compiles and runs a template in one go.
//! The values can be any [`ValueMap`], such as a [`HashMap`][std::collections::HashMap] or a slice of key-value pairs.
//!
//! ```
//! # fn main() -> Result<(), prep::Error> {
//! # use std::collections::HashMap;
//! let mut values = HashMap::new();
//! values.insert("name", "world");
//! assert_eq!(prep::render("Hello {{name}}!", &values)?, "Hello world!");
//! # Ok(())
//! # }
//! ```
//!
//! Block directives nest, and the colon after a directive is optional.
//!
//! ```
//! # fn main() -> Result<(), prep::Error> {
//! use prep::Value;
//!
//! let template = prep::compile(concat!(
//!   "{{for i, item in enumerate(items):}}",
//!   "{{if i:}}, {{endif}}{{item.upper()}}",
//!   "{{endfor}}",
//! ))?;
//! let items = Value::from(vec!["a", "b", "c"]);
//! assert_eq!(template.render(&[("items", items)])?, "A, B, C");
//! # Ok(())
//! # }
//! ```
//!
//! Mistakes in a template are reported with the location in the source.
//!
//! ```
//! let error = prep::compile("{{if x:}}\n{{for y in z:}}\n{{endif}}").unwrap_err();
//! assert_eq!(error.to_string(), "Mismatched close on line 3: expected 'endfor', found 'endif'");
//! ```
//!
//! Use `{${` and `}$}` to write literal delimiters:
//!
//! ```
//! # fn main() -> Result<(), prep::Error> {
//! assert_eq!(prep::render("{${not a directive}$}", &prep::NoValues)?, "{{not a directive}}");
//! # Ok(())
//! # }
//! ```

#![cfg_attr(feature = "doc-cfg", feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations)]

pub mod error;
pub use error::Error;

pub mod escape;
pub mod expr;

mod map;
pub use map::*;

mod value;
pub use value::{Map, Repr, Value};

mod template;
pub use template::*;

pub mod module;
pub use module::{Module, ModuleBuilder};

mod features;
#[allow(unused_imports)] // Will be unused if all features are disabled.
pub use features::*;

/// Compile a template from source text.
///
/// This is a shorthand for [`Template::compile()`].
pub fn compile(source: impl Into<String>) -> Result<Template, Error> {
	Template::compile(source)
}

/// Compile a template and run it with the given values, collecting the output in a string.
///
/// If you need to run the same template more than once, compile it with [`compile()`] and call [`Template::render()`] instead.
pub fn render<M>(source: &str, values: &M) -> Result<String, Error>
where
	M: ValueMap + ?Sized,
{
	let template = Template::compile(source)?;
	Ok(template.render(values)?)
}
