//! Load a template module from a directory and run it.
//!
//! Usage: `render-module <directory> <name> [values.json]`
//!
//! The values file, if given, must contain a JSON object.
//! The compiled listing is written next to the template as `<name>.generated`.
use std::process::ExitCode;

use prep::{Error, Map, ModuleBuilder};

fn main() -> ExitCode {
	let args: Vec<String> = std::env::args().skip(1).collect();
	if !(2..=3).contains(&args.len()) {
		eprintln!("usage: render-module <directory> <name> [values.json]");
		return ExitCode::FAILURE;
	}

	let values = match args.get(2) {
		None => Map::new(),
		Some(path) => match load_values(path) {
			Ok(x) => x,
			Err(e) => {
				eprintln!("failed to load values from {path}: {e}");
				return ExitCode::FAILURE;
			},
		},
	};

	let builder = ModuleBuilder::new();
	let module = match builder.get_module_in(&args[0], &args[1]) {
		Ok(x) => x,
		Err(Error::Parse(e)) => {
			eprintln!("{e}");
			if let Ok(source) = std::fs::read_to_string(std::path::Path::new(&args[0]).join(format!("{}.prep", args[1]))) {
				// Positions refer to the cleaned source the module was compiled from.
				eprint!("{}", e.source_highlighting(&prep::module::clean_source(&source)));
			}
			return ExitCode::FAILURE;
		},
		Err(e) => {
			eprintln!("{e}");
			return ExitCode::FAILURE;
		},
	};

	if let Err(e) = module.run(&values, None, None) {
		eprintln!("\n{}: {e}", module.name());
		return ExitCode::FAILURE;
	}
	ExitCode::SUCCESS
}

fn load_values(path: &str) -> Result<Map, Box<dyn std::error::Error>> {
	let data = std::fs::read(path)?;
	Ok(prep::json::values_from_slice(&data)?)
}
