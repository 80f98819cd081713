use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use super::MappingPolicy;
use crate::{NativeKey, NativeProperty, NativeType};

/// Per-type cache of [`MappingPolicy::properties_for_mapping`] results.
#[derive(Debug, Default)]
pub(crate) struct PropertyCache {
    entries: Mutex<HashMap<NativeKey, Arc<[NativeProperty]>>>,
}

impl PropertyCache {
    pub(crate) fn get_or_compute(
        &self,
        ty: &NativeType,
        policy: &dyn MappingPolicy,
    ) -> Arc<[NativeProperty]> {
        if let Some(properties) = self.entries.lock().get(&ty.key()) {
            return properties.clone();
        }

        // The policy is user code: never call it with the lock held.
        let computed: Arc<[NativeProperty]> = policy.properties_for_mapping(ty).into();
        trace!(
            "Computed {} mapped properties for `{}`",
            computed.len(),
            ty.full_name()
        );

        self.entries
            .lock()
            .entry(ty.key())
            .or_insert(computed)
            .clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
