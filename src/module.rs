//! Loading, caching and persisting compiled templates.
//!
//! A [`ModuleBuilder`] finds template sources in a search path,
//! compiles them into [`Module`]s and caches the result.
//! A cached module is reused as long as the fingerprint of its source stays the same.
//!
//! ```
//! # fn main() -> Result<(), prep::Error> {
//! use prep::module::{MemoryStorage, ModuleBuilder};
//!
//! let storage = MemoryStorage::new();
//! storage.insert("templates/greeting.prep", "Hello {{name}}!");
//!
//! let builder = ModuleBuilder::with_storage(storage);
//! let module = builder.get_module_in("templates", "greeting")?;
//! assert_eq!(module.render(&[("name", "world")])?, "Hello world!");
//!
//! // The second lookup is served from the cache.
//! builder.get_module("greeting")?;
//! assert_eq!(builder.compilations(), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest, Sha256};

use crate::error::{Error, IoError, NotFound, RunError};
use crate::template::{Output, Template};
use crate::ValueMap;

/// A tag mixed into every fingerprint.
///
/// Changing the tag invalidates all persisted artifacts.
pub const FORMAT_VERSION: &str = "prep-format-1";

/// The default extension of template source files.
pub const DEFAULT_EXTENSION: &str = ".prep";

/// The extension of persisted artifacts.
pub const ARTIFACT_EXTENSION: &str = ".generated";

const FINGERPRINT_PREFIX: &str = "# fingerprint: ";
const SOURCE_LEN_PREFIX: &str = "# source bytes: ";

/// Compute the fingerprint of template source text.
///
/// The fingerprint is the hex encoded SHA-256 digest of the source followed by [`FORMAT_VERSION`].
pub fn fingerprint(source: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(source.as_bytes());
	hasher.update(FORMAT_VERSION.as_bytes());
	hex::encode(hasher.finalize())
}

/// Strip trailing whitespace, including carriage returns, from every line.
pub fn clean_source(source: &str) -> String {
	source.split('\n').map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// A compiled template together with the fingerprint of its source.
#[derive(Debug, Clone)]
pub struct Module {
	name: String,
	fingerprint: String,
	template: Template,
}

impl Module {
	/// Compile a module directly from source text.
	///
	/// The module is not cached and no artifact is persisted.
	pub fn from_source(name: impl Into<String>, source: impl Into<String>) -> Result<Self, Error> {
		let source = source.into();
		let fingerprint = fingerprint(&source);
		let template = Template::compile(source)?;
		Ok(Self {
			name: name.into(),
			fingerprint,
			template,
		})
	}

	/// Get the name of the module.
	#[inline]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Get the fingerprint of the source the module was compiled from.
	#[inline]
	pub fn fingerprint(&self) -> &str {
		&self.fingerprint
	}

	/// Get the compiled template.
	#[inline]
	pub fn template(&self) -> &Template {
		&self.template
	}

	/// Run the module.
	///
	/// Output goes to `writer` or `sink` if one is given, or to standard output otherwise.
	/// Giving both is an error.
	pub fn run<'a, M>(
		&self,
		values: &M,
		writer: Option<&'a mut dyn std::fmt::Write>,
		sink: Option<&'a mut dyn std::io::Write>,
	) -> Result<(), RunError>
	where
		M: ValueMap + ?Sized,
	{
		let output = Output::select(writer, sink)?;
		self.template.run(values, output)
	}

	/// Run the module and collect the output in a string.
	pub fn render<M>(&self, values: &M) -> Result<String, RunError>
	where
		M: ValueMap + ?Sized,
	{
		self.template.render(values)
	}
}

/// The I/O boundary of a [`ModuleBuilder`].
pub trait Storage {
	/// Read a text file.
	///
	/// Returns `Ok(None)` if the file does not exist.
	fn read(&self, path: &Path) -> std::io::Result<Option<String>>;

	/// Write a text file, replacing it if it exists.
	fn write(&self, path: &Path, contents: &str) -> std::io::Result<()>;
}

/// Storage backed by the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
	fn read(&self, path: &Path) -> std::io::Result<Option<String>> {
		match std::fs::read_to_string(path) {
			Ok(x) => Ok(Some(x)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e),
		}
	}

	fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
		std::fs::write(path, contents)
	}
}

/// Storage that keeps files in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
	files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryStorage {
	/// Create an empty storage.
	pub fn new() -> Self {
		Self::default()
	}

	/// Add or replace a file.
	pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
		self.files().insert(path.into(), contents.into());
	}

	/// Get the contents of a file.
	pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
		self.files().get(path.as_ref()).cloned()
	}

	fn files(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, String>> {
		self.files.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl Storage for MemoryStorage {
	fn read(&self, path: &Path) -> std::io::Result<Option<String>> {
		Ok(self.get(path))
	}

	fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
		self.insert(path, contents);
		Ok(())
	}
}

impl<T: Storage + ?Sized> Storage for &'_ T {
	fn read(&self, path: &Path) -> std::io::Result<Option<String>> {
		T::read(self, path)
	}

	fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
		T::write(self, path, contents)
	}
}

impl<T: Storage + ?Sized> Storage for Arc<T> {
	fn read(&self, path: &Path) -> std::io::Result<Option<String>> {
		T::read(self, path)
	}

	fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
		T::write(self, path, contents)
	}
}

#[derive(Debug, Default)]
struct State {
	search_path: Vec<PathBuf>,
	modules: HashMap<PathBuf, Arc<Module>>,
}

/// Finds, compiles and caches template modules.
///
/// Sources are looked up as `<directory>/<name><extension>` in the directories of the search path.
/// A directory is added to the search path the first time [`Self::get_module_in()`] is called with it.
///
/// Every lookup reads the source again and compares its fingerprint with the cached module.
/// Only a changed source is compiled again.
///
/// When persistence is enabled, every compiled module is written to `<directory>/<name>.generated`:
/// a header with the fingerprint, the compiled source and the listing of the module.
/// A later builder restores the module from the artifact instead of compiling it,
/// as long as the recorded fingerprint matches the source.
/// If the source file is missing, the artifact is used as it is.
///
/// Lookups are serialized by a lock, so a builder can be shared between threads.
#[derive(Debug)]
pub struct ModuleBuilder<S = FsStorage> {
	storage: S,
	extension: String,
	persist: bool,
	clean_source: bool,
	state: Mutex<State>,
	compilations: AtomicUsize,
	restorations: AtomicUsize,
}

impl ModuleBuilder<FsStorage> {
	/// Create a builder that reads and writes the file system.
	pub fn new() -> Self {
		Self::with_storage(FsStorage)
	}
}

impl Default for ModuleBuilder<FsStorage> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: Storage> ModuleBuilder<S> {
	/// Create a builder that uses the given storage.
	pub fn with_storage(storage: S) -> Self {
		Self {
			storage,
			extension: DEFAULT_EXTENSION.into(),
			persist: true,
			clean_source: true,
			state: Mutex::new(State::default()),
			compilations: AtomicUsize::new(0),
			restorations: AtomicUsize::new(0),
		}
	}

	/// Set the extension of template source files (default: `.prep`).
	#[must_use]
	pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
		self.extension = extension.into();
		self
	}

	/// Enable or disable writing artifacts (default: enabled).
	#[must_use]
	pub fn with_persist(mut self, persist: bool) -> Self {
		self.persist = persist;
		self
	}

	/// Enable or disable stripping trailing whitespace from source lines before compiling (default: enabled).
	#[must_use]
	pub fn with_clean_source(mut self, clean_source: bool) -> Self {
		self.clean_source = clean_source;
		self
	}

	/// Get the storage of the builder.
	pub fn storage(&self) -> &S {
		&self.storage
	}

	/// Get the directories of the search path, in search order.
	pub fn search_path(&self) -> Vec<PathBuf> {
		self.lock().search_path.clone()
	}

	/// Get the number of times a template has been compiled by this builder.
	///
	/// Modules restored from a persisted artifact are not counted.
	pub fn compilations(&self) -> usize {
		self.compilations.load(Ordering::Relaxed)
	}

	/// Get the number of modules this builder restored from persisted artifacts.
	pub fn restorations(&self) -> usize {
		self.restorations.load(Ordering::Relaxed)
	}

	/// Get a module by name from the directories of the search path.
	///
	/// The directories are tried in the order they were added.
	pub fn get_module(&self, name: &str) -> Result<Arc<Module>, Error> {
		let mut state = self.lock();
		let mut searched = Vec::new();
		for directory in state.search_path.clone() {
			let path = self.source_path(&directory, name);
			if let Some(module) = self.lookup(&mut state, &directory, name, &path)? {
				return Ok(module);
			}
			searched.push(path);
		}
		Err(NotFound {
			name: name.into(),
			searched,
		}
		.into())
	}

	/// Get a module by name from a specific directory.
	///
	/// The directory is added to the search path if it is not in it yet.
	pub fn get_module_in(&self, directory: impl AsRef<Path>, name: &str) -> Result<Arc<Module>, Error> {
		let directory = directory.as_ref();
		let mut state = self.lock();
		if !state.search_path.iter().any(|x| x == directory) {
			log::debug!("adding {} to the template search path", directory.display());
			state.search_path.push(directory.to_owned());
		}

		let path = self.source_path(directory, name);
		match self.lookup(&mut state, directory, name, &path)? {
			Some(module) => Ok(module),
			None => Err(NotFound {
				name: name.into(),
				searched: vec![path],
			}
			.into()),
		}
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn source_path(&self, directory: &Path, name: &str) -> PathBuf {
		directory.join(format!("{name}{}", self.extension))
	}

	fn artifact_path(&self, directory: &Path, name: &str) -> PathBuf {
		directory.join(format!("{name}{ARTIFACT_EXTENSION}"))
	}

	fn read(&self, path: &Path) -> Result<Option<String>, Error> {
		self.storage.read(path).map_err(|error| {
			IoError {
				path: path.to_owned(),
				error,
			}
			.into()
		})
	}

	/// Find a module in one directory.
	///
	/// Without a source file, a module can still be restored from its artifact.
	fn lookup(&self, state: &mut State, directory: &Path, name: &str, path: &Path) -> Result<Option<Arc<Module>>, Error> {
		if let Some(source) = self.read(path)? {
			return self.load(state, directory, name, path, source).map(Some);
		}
		if !self.persist {
			return Ok(None);
		}

		let artifact_path = self.artifact_path(directory, name);
		let artifact = match self.read(&artifact_path)? {
			Some(x) => x,
			None => return Ok(None),
		};
		let recorded = match Artifact::parse(&artifact) {
			Some(x) => x,
			None => return Ok(None),
		};
		if let Some(module) = state.modules.get(path) {
			if module.fingerprint == recorded.fingerprint {
				log::debug!("cache hit for {} without source", path.display());
				return Ok(Some(module.clone()));
			}
		}
		log::debug!("source {} is missing, using artifact {}", path.display(), artifact_path.display());
		let module = match self.restore(name, &artifact_path, &recorded) {
			Some(x) => Arc::new(x),
			None => return Ok(None),
		};
		state.modules.insert(path.to_owned(), module.clone());
		Ok(Some(module))
	}

	fn load(&self, state: &mut State, directory: &Path, name: &str, path: &Path, source: String) -> Result<Arc<Module>, Error> {
		let fingerprint = fingerprint(&source);
		if let Some(module) = state.modules.get(path) {
			if module.fingerprint == fingerprint {
				log::debug!("cache hit for {}", path.display());
				return Ok(module.clone());
			}
			log::debug!("source of {} changed", path.display());
		} else {
			log::debug!("cache miss for {}", path.display());
		}

		if let Some(module) = self.restore_fresh(directory, name, &fingerprint)? {
			let module = Arc::new(module);
			state.modules.insert(path.to_owned(), module.clone());
			return Ok(module);
		}

		log::debug!("compiling {}", path.display());
		let source = if self.clean_source { clean_source(&source) } else { source };
		self.compilations.fetch_add(1, Ordering::Relaxed);
		let template = Template::compile(source)?;
		let module = Arc::new(Module {
			name: name.into(),
			fingerprint,
			template,
		});

		if self.persist {
			self.persist_artifact(directory, path, &module)?;
		}
		state.modules.insert(path.to_owned(), module.clone());
		Ok(module)
	}

	/// Restore a module from its artifact if the artifact records the given fingerprint.
	fn restore_fresh(&self, directory: &Path, name: &str, fingerprint: &str) -> Result<Option<Module>, Error> {
		if !self.persist {
			return Ok(None);
		}
		let path = self.artifact_path(directory, name);
		let artifact = match self.read(&path)? {
			Some(x) => x,
			None => return Ok(None),
		};
		match Artifact::parse(&artifact) {
			Some(recorded) if recorded.fingerprint == fingerprint => Ok(self.restore(name, &path, &recorded)),
			_ => {
				log::debug!("artifact {} is stale", path.display());
				Ok(None)
			},
		}
	}

	fn restore(&self, name: &str, path: &Path, recorded: &Artifact) -> Option<Module> {
		let source = recorded.source?;
		match Template::compile(source) {
			Ok(template) => {
				log::debug!("restored {} from artifact {}", name, path.display());
				self.restorations.fetch_add(1, Ordering::Relaxed);
				Some(Module {
					name: name.into(),
					fingerprint: recorded.fingerprint.into(),
					template,
				})
			},
			Err(e) => {
				log::debug!("artifact {} is damaged: {e}", path.display());
				None
			},
		}
	}

	fn persist_artifact(&self, directory: &Path, source_path: &Path, module: &Module) -> Result<(), Error> {
		let path = self.artifact_path(directory, &module.name);
		let source = module.template.source();
		let contents = format!(
			"# Generated from {} by prep. Do not edit.\n{FINGERPRINT_PREFIX}{}\n{SOURCE_LEN_PREFIX}{}\n{source}\n{}",
			source_path.display(),
			module.fingerprint,
			source.len(),
			module.template.listing(),
		);
		log::debug!("writing artifact {}", path.display());
		self.storage.write(&path, &contents).map_err(|error| IoError {
			path: path.clone(),
			error,
		})?;
		Ok(())
	}
}

/// The header and recorded source of a persisted artifact.
///
/// An artifact starts with `#` header lines.
/// The last header line gives the length in bytes of the compiled source that follows it.
/// The listing of the module comes after the source.
#[derive(Debug)]
struct Artifact<'a> {
	fingerprint: &'a str,
	source: Option<&'a str>,
}

impl<'a> Artifact<'a> {
	fn parse(artifact: &'a str) -> Option<Self> {
		let mut fingerprint = None;
		let mut source = None;
		let mut offset = 0;
		for line in artifact.split_inclusive('\n') {
			if !line.starts_with('#') {
				break;
			}
			offset += line.len();
			let line = line.trim_end();
			if let Some(x) = line.strip_prefix(FINGERPRINT_PREFIX) {
				fingerprint = Some(x.trim());
			} else if let Some(x) = line.strip_prefix(SOURCE_LEN_PREFIX) {
				source = x.trim().parse::<usize>().ok()
					.and_then(|len| artifact.get(offset..offset.checked_add(len)?));
				break;
			}
		}
		Some(Self {
			fingerprint: fingerprint?,
			source,
		})
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use crate::Value;
	use assert2::{assert, check, let_assert};

	fn recorded_fingerprint(artifact: &str) -> Option<&str> {
		Artifact::parse(artifact).map(|x| x.fingerprint)
	}

	fn builder() -> ModuleBuilder<MemoryStorage> {
		let storage = MemoryStorage::new();
		storage.insert("site/page.prep", "Hello {{name}}!");
		ModuleBuilder::with_storage(storage)
	}

	#[test]
	fn test_fingerprint() {
		check!(fingerprint("a").len() == 64);
		check!(fingerprint("a") == fingerprint("a"));
		check!(fingerprint("a") != fingerprint("b"));
	}

	#[test]
	fn test_clean_source() {
		check!(clean_source("a  \r\nb\t\n  c") == "a\nb\n  c");
	}

	#[test]
	fn test_cache_hit_skips_compilation() {
		let builder = builder();
		let_assert!(Ok(first) = builder.get_module_in("site", "page"));
		let_assert!(Ok(second) = builder.get_module_in("site", "page"));
		let_assert!(Ok(third) = builder.get_module("page"));
		assert!(builder.compilations() == 1);
		assert!(Arc::ptr_eq(&first, &second));
		assert!(Arc::ptr_eq(&first, &third));
		assert!(builder.search_path() == [PathBuf::from("site")]);
	}

	#[test]
	fn test_changed_source_is_compiled_again() {
		let builder = builder();
		let_assert!(Ok(first) = builder.get_module_in("site", "page"));
		builder.storage().insert("site/page.prep", "Hello {{name}}?");
		let_assert!(Ok(second) = builder.get_module("page"));
		assert!(builder.compilations() == 2);
		assert!(first.fingerprint() != second.fingerprint());
		let_assert!(Ok(output) = second.render(&[("name", "you")]));
		assert!(output == "Hello you?");
	}

	#[test]
	fn test_artifact_is_persisted() {
		let builder = builder();
		let_assert!(Ok(module) = builder.get_module_in("site", "page"));
		let_assert!(Some(artifact) = builder.storage().get("site/page.generated"));
		assert!(recorded_fingerprint(&artifact) == Some(module.fingerprint()));
		assert!(artifact.ends_with(&module.template().listing()));
	}

	#[test]
	fn test_artifact_is_restored_by_another_builder() {
		let storage = Arc::new(MemoryStorage::new());
		storage.insert("site/page.prep", "# {{title}}\n{{for x in xs:}}-{{x}}{{endfor}}\n");
		let first = ModuleBuilder::with_storage(storage.clone());
		let_assert!(Ok(compiled) = first.get_module_in("site", "page"));
		assert!(first.compilations() == 1);
		assert!(first.restorations() == 0);

		let second = ModuleBuilder::with_storage(storage.clone());
		let_assert!(Ok(restored) = second.get_module_in("site", "page"));
		assert!(second.compilations() == 0);
		assert!(second.restorations() == 1);
		assert!(restored.fingerprint() == compiled.fingerprint());
		assert!(restored.template().source() == compiled.template().source());
		let values = [("title", Value::from("T")), ("xs", Value::from(vec![1, 2]))];
		let_assert!(Ok(output) = restored.render(&values));
		assert!(output == "# T\n-1-2\n");

		let_assert!(Ok(_) = second.get_module("page"));
		assert!(second.restorations() == 1);
	}

	#[test]
	fn test_stale_artifact_is_replaced() {
		let storage = Arc::new(MemoryStorage::new());
		storage.insert("site/page.prep", "text");
		let_assert!(Ok(_) = ModuleBuilder::with_storage(storage.clone()).get_module_in("site", "page"));

		storage.insert("site/page.prep", "new text");
		let builder = ModuleBuilder::with_storage(storage.clone());
		let_assert!(Ok(module) = builder.get_module_in("site", "page"));
		assert!(builder.compilations() == 1);
		assert!(builder.restorations() == 0);
		assert!(module.render(&crate::NoValues).ok().as_deref() == Some("new text"));
		let_assert!(Some(artifact) = storage.get("site/page.generated"));
		assert!(recorded_fingerprint(&artifact) == Some(fingerprint("new text").as_str()));
	}

	#[test]
	fn test_damaged_artifact_is_rewritten() {
		let storage = Arc::new(MemoryStorage::new());
		storage.insert("site/page.prep", "text");
		let damaged = format!("{FINGERPRINT_PREFIX}{}\n{SOURCE_LEN_PREFIX}4\n{{{{if\n", fingerprint("text"));
		storage.insert("site/page.generated", damaged.as_str());

		let builder = ModuleBuilder::with_storage(storage.clone());
		let_assert!(Ok(module) = builder.get_module_in("site", "page"));
		assert!(builder.compilations() == 1);
		assert!(module.render(&crate::NoValues).ok().as_deref() == Some("text"));
		let_assert!(Some(artifact) = storage.get("site/page.generated"));
		assert!(artifact != damaged);
		let_assert!(Some(recorded) = Artifact::parse(&artifact));
		assert!(recorded.source == Some("text"));
	}

	#[test]
	fn test_artifact_without_source_file() {
		let storage = Arc::new(MemoryStorage::new());
		storage.insert("site/page.prep", "Hello {{name}}!");
		let_assert!(Ok(_) = ModuleBuilder::with_storage(storage.clone()).get_module_in("site", "page"));
		let_assert!(Some(artifact) = storage.get("site/page.generated"));

		let other = Arc::new(MemoryStorage::new());
		other.insert("site/page.generated", artifact);
		let builder = ModuleBuilder::with_storage(other);
		let_assert!(Ok(module) = builder.get_module_in("site", "page"));
		assert!(builder.compilations() == 0);
		let_assert!(Ok(output) = module.render(&[("name", "you")]));
		assert!(output == "Hello you!");

		let builder = builder.with_persist(false);
		let_assert!(Err(Error::NotFound(_)) = builder.get_module_in("elsewhere", "page"));
	}

	#[test]
	fn test_concurrent_lookups_compile_once() {
		let builder = builder();
		std::thread::scope(|scope| {
			for _ in 0..8 {
				scope.spawn(|| {
					let_assert!(Ok(module) = builder.get_module_in("site", "page"));
					assert!(module.name() == "page");
				});
			}
		});
		assert!(builder.compilations() == 1);
		assert!(builder.search_path().len() == 1);
	}

	#[test]
	fn test_artifact_parse() {
		let artifact = format!("# header\n{FINGERPRINT_PREFIX}abc\n{SOURCE_LEN_PREFIX}5\n# x\ny\nlisting\n");
		let_assert!(Some(recorded) = Artifact::parse(&artifact));
		check!(recorded.fingerprint == "abc");
		check!(recorded.source == Some("# x\ny"));

		let_assert!(Some(recorded) = Artifact::parse("# fingerprint: abc\nlisting"));
		check!(recorded.source.is_none());
		check!(Artifact::parse("listing").is_none());
		let_assert!(Some(recorded) = Artifact::parse("# fingerprint: abc\n# source bytes: 99\nshort"));
		check!(recorded.source.is_none());
	}

	#[test]
	fn test_persistence_can_be_disabled() {
		let builder = builder().with_persist(false);
		let_assert!(Ok(_) = builder.get_module_in("site", "page"));
		assert!(builder.storage().get("site/page.generated").is_none());
	}

	#[test]
	fn test_source_cleaning() {
		let storage = MemoryStorage::new();
		storage.insert("t/x.tpl", "a  \r\nb");
		let builder = ModuleBuilder::with_storage(storage).with_extension(".tpl");
		let_assert!(Ok(module) = builder.get_module_in("t", "x"));
		assert!(module.render(&crate::NoValues).ok().as_deref() == Some("a\nb"));

		let storage = MemoryStorage::new();
		storage.insert("t/x.prep", "a  \r\nb");
		let builder = ModuleBuilder::with_storage(storage).with_clean_source(false);
		let_assert!(Ok(module) = builder.get_module_in("t", "x"));
		assert!(module.render(&crate::NoValues).ok().as_deref() == Some("a  \r\nb"));
	}

	#[test]
	fn test_not_found() {
		let builder = builder();
		let_assert!(Err(Error::NotFound(e)) = builder.get_module("page"));
		assert!(e.searched.is_empty());
		let_assert!(Err(Error::NotFound(e)) = builder.get_module_in("site", "missing"));
		assert!(e.searched == [PathBuf::from("site/missing.prep")]);
		let_assert!(Err(Error::NotFound(e)) = builder.get_module("missing"));
		assert!(e.searched.len() == 1);
	}

	#[test]
	fn test_compile_errors_are_reported() {
		let storage = MemoryStorage::new();
		storage.insert("t/bad.prep", "{{if x:}}");
		let builder = ModuleBuilder::with_storage(storage);
		let_assert!(Err(Error::Parse(_)) = builder.get_module_in("t", "bad"));
		assert!(builder.storage().get("t/bad.generated").is_none());
	}

	#[test]
	fn test_file_system_storage() {
		let_assert!(Ok(dir) = tempfile::tempdir());
		let_assert!(Ok(()) = std::fs::write(dir.path().join("list.prep"), "{{for x in xs:}}[{{x}}]{{endfor}}\n"));

		let builder = ModuleBuilder::new();
		let_assert!(Ok(module) = builder.get_module_in(dir.path(), "list"));
		let_assert!(Ok(output) = module.render(&[("xs", vec![1, 2])]));
		assert!(output == "[1][2]\n");

		let_assert!(Ok(artifact) = std::fs::read_to_string(dir.path().join("list.generated")));
		assert!(recorded_fingerprint(&artifact) == Some(module.fingerprint()));
		assert!(artifact.contains("for x in xs:\n"));

		let_assert!(Ok(Some(_)) = FsStorage.read(&dir.path().join("list.prep")));
		let_assert!(Ok(None) = FsStorage.read(&dir.path().join("missing.prep")));
	}

	#[test]
	fn test_from_source() {
		let_assert!(Ok(module) = Module::from_source("inline", "{{a}}{{b}}"));
		assert!(module.name() == "inline");
		assert!(module.fingerprint() == fingerprint("{{a}}{{b}}"));
		let_assert!(Ok(output) = module.render(&[("a", 1), ("b", 2)]));
		assert!(output == "12");
	}

	#[test]
	fn test_run_output_selection() {
		let_assert!(Ok(module) = Module::from_source("inline", "x"));
		let mut text = String::new();
		let mut bytes: Vec<u8> = Vec::new();
		let_assert!(Err(RunError::OutputConflict) = module.run(&crate::NoValues, Some(&mut text), Some(&mut bytes)));
		let_assert!(Ok(()) = module.run(&crate::NoValues, None, Some(&mut bytes)));
		assert!(bytes == b"x");
		let_assert!(Ok(()) = module.run(&crate::NoValues, Some(&mut text), None));
		assert!(text == "x");
	}
}
