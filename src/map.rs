//! Maps that supply the values a template is run with.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use indexmap::IndexMap;

use crate::Value;

/// Trait for types that can be used as the value map of a template run.
///
/// Every entry is bound as a name before the template runs.
/// Keys that are not valid identifiers are skipped.
pub trait ValueMap {
	/// Call `visit` for every entry of the map, in iteration order.
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value));
}

/// Allow using key-value [`slice`]s as [`ValueMap`]s.
///
/// # Example
/// ```rust
/// # use prep::Template;
/// let template = Template::compile("{{first_name}} {{last_name}}")?;
/// let contact_info = [("first_name", "John"), ("last_name", "Doe")];
/// assert_eq!(template.render(&contact_info[..])?, "John Doe");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
impl<K, V> ValueMap for [(K, V)]
where
	K: Borrow<str>,
	V: Clone + Into<Value>,
{
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value)) {
		for (key, value) in self {
			visit(key.borrow(), value.clone().into());
		}
	}
}

/// Allow using key-value [`arrays`](`array`) as [`ValueMap`]s.
impl<K, V, const N: usize> ValueMap for [(K, V); N]
where
	K: Borrow<str>,
	V: Clone + Into<Value>,
{
	#[inline(always)]
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value)) {
		ValueMap::visit_entries(self.as_slice(), visit)
	}
}

/// Allow using key-value [`Vec`]s as [`ValueMap`]s.
impl<K, V> ValueMap for Vec<(K, V)>
where
	K: Borrow<str>,
	V: Clone + Into<Value>,
{
	#[inline(always)]
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value)) {
		ValueMap::visit_entries(self.as_slice(), visit)
	}
}

impl<K, V> ValueMap for BTreeMap<K, V>
where
	K: Borrow<str>,
	V: Clone + Into<Value>,
{
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value)) {
		for (key, value) in self {
			visit(key.borrow(), value.clone().into());
		}
	}
}

/// Note that a [`HashMap`] has no defined iteration order.
impl<K, V, S> ValueMap for HashMap<K, V, S>
where
	K: Borrow<str>,
	V: Clone + Into<Value>,
	S: BuildHasher,
{
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value)) {
		for (key, value) in self {
			visit(key.borrow(), value.clone().into());
		}
	}
}

impl<K, V, S> ValueMap for IndexMap<K, V, S>
where
	K: Borrow<str>,
	V: Clone + Into<Value>,
	S: BuildHasher,
{
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value)) {
		for (key, value) in self {
			visit(key.borrow(), value.clone().into());
		}
	}
}

impl<T> ValueMap for &'_ T
where
	T: ?Sized + ValueMap,
{
	#[inline(always)]
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value)) {
		T::visit_entries(self, visit)
	}
}

impl<T> ValueMap for std::boxed::Box<T>
where
	T: ?Sized + ValueMap,
{
	#[inline(always)]
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value)) {
		T::visit_entries(self, visit)
	}
}

impl<T> ValueMap for std::rc::Rc<T>
where
	T: ?Sized + ValueMap,
{
	#[inline(always)]
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value)) {
		T::visit_entries(self, visit)
	}
}

impl<T> ValueMap for std::sync::Arc<T>
where
	T: ?Sized + ValueMap,
{
	#[inline(always)]
	fn visit_entries(&self, visit: &mut dyn FnMut(&str, Value)) {
		T::visit_entries(self, visit)
	}
}

/// A map without any values.
#[derive(Debug)]
pub struct NoValues;

impl ValueMap for NoValues {
	#[inline]
	fn visit_entries(&self, _visit: &mut dyn FnMut(&str, Value)) {}
}
