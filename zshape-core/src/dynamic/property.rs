use super::Value;

/// A named value.
///
/// The single property of a wrapped [`DynamicValue`](super::DynamicValue) has an empty name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Property {
    name: String,
    value: Value,
}

impl Property {
    /// Create a property.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create the unnamed property of a wrapped value.
    pub fn unnamed(value: impl Into<Value>) -> Self {
        Self::new(String::new(), value)
    }

    /// The name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the unnamed property of a wrapped value.
    pub fn is_unnamed(&self) -> bool {
        self.name.is_empty()
    }

    /// The value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The value, mutably.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Replace the value.
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    /// Split into name and value.
    pub fn into_parts(self) -> (String, Value) {
        (self.name, self.value)
    }
}
