use core::fmt::Debug;

use crate::{NativeProperty, NativeType};

/// Decides which members of a native type get mapped, and how.
///
/// Results of [`MappingPolicy::properties_for_mapping`] are cached per native type by the
/// [`ObjectMapper`](crate::ObjectMapper) owning the policy, so they must not vary over time.
pub trait MappingPolicy: Debug + Send + Sync {
    /// The properties of `ty` to map, in mapping order.
    fn properties_for_mapping(&self, ty: &NativeType) -> Vec<NativeProperty> {
        ty.properties().to_vec()
    }

    /// Whether a collection-like `ty` maps to a record of its named members instead of an array.
    fn should_map_to_dynamic_object(&self, ty: &NativeType) -> bool {
        let _ = ty;
        false
    }
}

/// Maps every declared property in declaration order and every collection to an array.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPolicy;

impl MappingPolicy for DefaultPolicy {}
