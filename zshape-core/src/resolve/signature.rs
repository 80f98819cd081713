use std::collections::HashMap;

use parking_lot::Mutex;

use super::TypeHandle;

/// What makes two shapes resolve to the same synthesized type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ShapeSignature {
    /// A named shape: its full name and ordered, resolved property types.
    Named {
        full_name: String,
        properties: Vec<(String, TypeHandle)>,
    },
    /// The generic definition of anonymous shapes: ordered property names only.
    AnonymousDefinition { names: Vec<String> },
    /// An anonymous definition closed over resolved property types.
    AnonymousClosed {
        names: Vec<String>,
        arguments: Vec<TypeHandle>,
    },
}

/// Resolved shapes of one resolver.
#[derive(Debug, Default)]
pub(crate) struct ShapeCache {
    entries: Mutex<HashMap<ShapeSignature, TypeHandle>>,
}

impl ShapeCache {
    /// The handle cached under `signature`, or the one `build` creates.
    ///
    /// `build` runs without the lock held. If another thread inserted a handle for the same
    /// signature in the meantime, that one is returned and the new one is dropped.
    pub(crate) fn get_or_insert_with(
        &self,
        signature: ShapeSignature,
        build: impl FnOnce() -> TypeHandle,
    ) -> TypeHandle {
        if let Some(handle) = self.entries.lock().get(&signature) {
            trace!("Shape cache hit for `{}`", handle.full_name());
            return handle.clone();
        }

        let built = build();
        self.entries
            .lock()
            .entry(signature)
            .or_insert_with(|| {
                debug!("Synthesized type `{}`", built.full_name());
                built
            })
            .clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
