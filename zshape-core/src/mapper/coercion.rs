use core::fmt;
use std::{collections::HashMap, sync::Arc};

use crate::{Result, Scalar};

type Coercion = Arc<dyn Fn(&Scalar) -> Result<Scalar> + Send + Sync>;

/// Custom scalar conversions, keyed by the full name of the target type.
///
/// A coercion runs before the built-in conversions; whatever it returns is then converted to the
/// target's scalar kind as usual.
#[derive(Clone, Default)]
pub struct CoercionTable {
    coercions: HashMap<String, Coercion>,
}

impl CoercionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a coercion for values converted to `type_name`.
    pub fn with<F>(mut self, type_name: impl Into<String>, coercion: F) -> Self
    where
        F: Fn(&Scalar) -> Result<Scalar> + Send + Sync + 'static,
    {
        self.insert(type_name, coercion);
        self
    }

    /// Add a coercion for values converted to `type_name`, replacing any previous one.
    pub fn insert<F>(&mut self, type_name: impl Into<String>, coercion: F)
    where
        F: Fn(&Scalar) -> Result<Scalar> + Send + Sync + 'static,
    {
        self.coercions.insert(type_name.into(), Arc::new(coercion));
    }

    /// Apply the coercion registered for `type_name`, if any.
    pub fn apply(&self, type_name: &str, scalar: &Scalar) -> Option<Result<Scalar>> {
        self.coercions.get(type_name).map(|coercion| coercion(scalar))
    }

    /// Whether no coercions are registered.
    pub fn is_empty(&self) -> bool {
        self.coercions.is_empty()
    }
}

impl fmt::Debug for CoercionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.coercions.keys()).finish()
    }
}
