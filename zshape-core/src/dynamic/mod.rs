//! The dynamic value model: instance data independent of any native type.

mod dynamic_value;
pub use dynamic_value::DynamicValue;
mod property;
pub use property::Property;
mod property_set;
pub use property_set::PropertySet;
mod value;
pub use value::Value;
