use std::collections::BTreeMap;

use crate::access;
use crate::error::AccessError;
use crate::value::{Access, Slot, Value};

/// A root value: either a host object lent for the run, or one the
/// environment owns (script variables).
enum Resource<'a> {
    Borrowed(&'a mut dyn Access),
    Owned(Box<dyn Access + 'a>),
}

impl Resource<'_> {
    fn slot(&mut self) -> Slot<'_> {
        match self {
            Resource::Borrowed(value) => value.slot(),
            Resource::Owned(value) => value.slot(),
        }
    }
}

/// Root names a script can address, mapped to the values behind them.
///
/// Root names are case-sensitive; everything below the root is matched
/// case-insensitively by the accessor. Borrowed resources are mutated in
/// place, so changes stay visible to the host once the environment is gone.
#[derive(Default)]
pub struct Environment<'a> {
    resources: BTreeMap<String, Resource<'a>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment {
            resources: BTreeMap::new(),
        }
    }

    /// Lend a host object to the environment under `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: &'a mut dyn Access) {
        self.resources
            .insert(name.into(), Resource::Borrowed(value));
    }

    /// Move a value into the environment under `name`.
    pub fn insert_owned(&mut self, name: impl Into<String>, value: impl Access + 'a) {
        self.resources
            .insert(name.into(), Resource::Owned(Box::new(value)));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.resources.remove(name).is_some()
    }

    /// Root names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn slot(&mut self, name: &str) -> Option<Slot<'_>> {
        self.resources.get_mut(name).map(Resource::slot)
    }

    /// Read a dotted path whose first segment names a resource.
    pub fn read(&mut self, path: &str) -> Result<Value, AccessError> {
        let segments = access::split_path(path);
        let (root, rest) = self.root(&segments)?;
        access::read(root, rest)
    }

    pub fn write(&mut self, path: &str, value: &str) -> Result<(), AccessError> {
        let segments = access::split_path(path);
        let (root, rest) = self.root(&segments)?;
        access::write(root, rest, value)
    }

    pub fn clear(&mut self, path: &str) -> Result<(), AccessError> {
        let segments = access::split_path(path);
        let (root, rest) = self.root(&segments)?;
        access::clear(root, rest)
    }

    fn root<'s, 'p>(
        &'s mut self,
        segments: &'p [&'p str],
    ) -> Result<(Slot<'s>, &'p [&'p str]), AccessError> {
        let (name, rest) = segments
            .split_first()
            .ok_or_else(|| AccessError::UnknownResource(String::new()))?;
        match self.resources.get_mut(*name) {
            Some(resource) => Ok((resource.slot(), rest)),
            None => Err(AccessError::UnknownResource(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn owned_variables_read_back() {
        let mut env = Environment::new();
        env.insert_owned("greeting", "hello".to_string());
        assert_eq!(env.read("greeting").unwrap(), Value::Str("hello".into()));
        env.write("greeting", "bye").unwrap();
        assert_eq!(env.read("greeting").unwrap().to_string(), "bye");
    }

    #[test]
    fn borrowed_values_are_mutated_in_place() {
        let mut count: i64 = 1;
        {
            let mut env = Environment::new();
            env.insert("count", &mut count);
            env.write("count", "5").unwrap();
        }
        assert_eq!(count, 5);
    }

    #[test]
    fn names_lists_borrowed_and_owned_roots() {
        let mut count: i64 = 0;
        let mut env = Environment::new();
        env.insert("count", &mut count);
        env.insert_owned("alpha", String::new());
        assert_eq!(env.names(), vec!["alpha", "count"]);
        assert!(env.remove("alpha"));
        assert_eq!(env.names(), vec!["count"]);
    }

    #[test]
    fn root_names_are_case_sensitive() {
        let mut env = Environment::new();
        env.insert_owned("Name", String::new());
        assert_eq!(
            env.read("name").unwrap_err(),
            AccessError::UnknownResource("name".into())
        );
        assert!(env.contains("Name"));
        assert_eq!(env.names(), vec!["Name"]);
    }
}
