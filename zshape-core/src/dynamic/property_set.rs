use core::ops::Index;

use indexmap::IndexMap;

use super::{Property, Value};
use crate::{Error, Result};

/// Ordered properties with unique (case-sensitive) names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertySet {
    properties: Vec<Property>,
}

impl PropertySet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a property.
    ///
    /// Fails with [`Error::PropertyNameCollision`] if the name is taken.
    pub fn insert(&mut self, property: Property) -> Result<()> {
        if self.contains(property.name()) {
            return Err(Error::PropertyNameCollision {
                name: property.name().into(),
            });
        }
        self.properties.push(property);

        Ok(())
    }

    /// Replace the value of an existing property or append a new one.
    ///
    /// Returns the replaced value, if any. Use [`PropertySet::insert`] to reject existing names.
    pub fn replace(&mut self, name: &str, value: impl Into<Value>) -> Option<Value> {
        match self.get_mut(name) {
            Some(property) => Some(core::mem::replace(property.value_mut(), value.into())),
            None => {
                self.properties.push(Property::new(name, value));
                None
            }
        }
    }

    /// The property named `name`.
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// The property named `name`, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name() == name)
    }

    /// The value of the property named `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(Property::value)
    }

    /// The property at `index`.
    pub fn at(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }

    /// The position of the property named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name() == name)
    }

    /// Whether a property named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove and return the property named `name`, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let index = self.position(name)?;

        Some(self.properties.remove(index))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate in order.
    pub fn iter(&self) -> core::slice::Iter<'_, Property> {
        self.properties.iter()
    }

    /// Property names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(Property::name)
    }
}

impl Index<usize> for PropertySet {
    type Output = Property;

    fn index(&self, index: usize) -> &Property {
        &self.properties[index]
    }
}

impl Index<&str> for PropertySet {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        match self.value(name) {
            Some(value) => value,
            None => panic!("no property named `{name}`"),
        }
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = &'a Property;
    type IntoIter = core::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for PropertySet {
    type Item = Property;
    type IntoIter = std::vec::IntoIter<Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

impl From<IndexMap<String, Value>> for PropertySet {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self {
            properties: map
                .into_iter()
                .map(|(name, value)| Property::new(name, value))
                .collect(),
        }
    }
}

impl From<PropertySet> for IndexMap<String, Value> {
    fn from(set: PropertySet) -> Self {
        set.properties.into_iter().map(Property::into_parts).collect()
    }
}

impl TryFrom<Vec<(String, Value)>> for PropertySet {
    type Error = Error;

    fn try_from(pairs: Vec<(String, Value)>) -> Result<Self> {
        let mut set = Self::new();
        for (name, value) in pairs {
            set.insert(Property::new(name, value))?;
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut set = PropertySet::new();
        set.insert(Property::new("Id", 1)).unwrap();
        set.insert(Property::new("id", 2)).unwrap();

        let err = set.insert(Property::new("Id", 3)).unwrap_err();
        assert_eq!(err, Error::PropertyNameCollision { name: "Id".into() });
        assert_eq!(set.len(), 2);
        assert_eq!(set["Id"], Value::from(1));
    }

    #[test]
    fn replace_returns_the_previous_value() {
        let mut set = PropertySet::new();
        assert_eq!(set.replace("Id", 1), None);
        assert_eq!(set.replace("Id", 2), Some(Value::from(1)));
        assert_eq!(set.replace("Name", "Widget"), None);

        assert_eq!(set.len(), 2);
        assert_eq!(set.names().collect::<Vec<_>>(), ["Id", "Name"]);
        assert_eq!(set["Id"], Value::from(2));
    }

    #[test]
    fn remove_returns_the_untouched_property() {
        let mut set = PropertySet::try_from(vec![
            ("Id".to_string(), Value::from(1)),
            ("Name".to_string(), Value::from("Widget")),
            ("Price".to_string(), Value::from(9.99)),
        ])
        .unwrap();

        let removed = set.remove("Name").unwrap();
        assert_eq!(removed, Property::new("Name", "Widget"));
        assert_eq!(set.names().collect::<Vec<_>>(), ["Id", "Price"]);
        assert_eq!(set[1].name(), "Price");
        assert!(set.remove("Name").is_none());
    }

    #[test]
    fn index_map_conversions_keep_order() {
        let mut map = IndexMap::new();
        map.insert("b".to_string(), Value::from(true));
        map.insert("a".to_string(), Value::Null);

        let set = PropertySet::from(map.clone());
        assert_eq!(set.names().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(IndexMap::from(set), map);

        let err = PropertySet::try_from(vec![
            ("a".to_string(), Value::Null),
            ("a".to_string(), Value::Null),
        ])
        .unwrap_err();
        assert_eq!(err, Error::PropertyNameCollision { name: "a".into() });
    }
}
