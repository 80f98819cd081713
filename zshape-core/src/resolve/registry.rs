use std::{collections::HashMap, sync::Arc};

use super::{NativeEntry, TypeHandle};
use crate::{FromDynamic, Reflect};

/// Resolves full type names the resolver's own registry does not know.
pub trait TypeNameResolver: Send + Sync {
    /// The type named `full_name`, if known.
    fn resolve_type_name(&self, full_name: &str) -> Option<TypeHandle>;
}

impl<F> TypeNameResolver for F
where
    F: Fn(&str) -> Option<TypeHandle> + Send + Sync,
{
    fn resolve_type_name(&self, full_name: &str) -> Option<TypeHandle> {
        self(full_name)
    }
}

/// The native types a resolver can instantiate, by full name.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    entries: HashMap<String, Arc<NativeEntry>>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its full name.
    pub fn register<T: Reflect + FromDynamic>(&mut self) -> &mut Self {
        let entry = NativeEntry::of::<T>();
        let name = entry.native_type().full_name();
        trace!("Registered native type `{}`", name);
        self.entries.insert(name, Arc::new(entry));

        self
    }

    /// Builder variant of [`TypeRegistry::register`].
    pub fn with<T: Reflect + FromDynamic>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// The entry registered under `full_name`.
    pub fn get(&self, full_name: &str) -> Option<&Arc<NativeEntry>> {
        self.entries.get(full_name)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TypeNameResolver for TypeRegistry {
    fn resolve_type_name(&self, full_name: &str) -> Option<TypeHandle> {
        self.get(full_name).cloned().map(TypeHandle::Native)
    }
}
