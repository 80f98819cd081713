//! Conversion between native values and dynamic values.

use core::fmt;
use std::{any::Any, collections::HashMap, sync::Arc};

use crate::{
    reflect::{address, scalar_native_type},
    Describer, DynamicValue, Error, FromDynamic, NativeKey, NativeKind, NativeProperty,
    NativeType, Property, PropertySet, Reflect, Reflected, Result, ScalarKind, SynthesizedRecord,
    TypeDescriptor, TypeEdges, TypeHandle, TypeHeader, TypeResolver, Value,
};

mod cache;
use cache::PropertyCache;
mod coercion;
pub use coercion::CoercionTable;
mod context;
pub use context::MapContext;
mod policy;
pub use policy::{DefaultPolicy, MappingPolicy};

/// How a mapped value gets annotated with its type.
#[derive(Debug, Clone)]
pub enum TypeHint {
    /// Annotate with the descriptor of the value's native type.
    Annotate,
    /// Leave the value unannotated.
    Omit,
    /// Annotate with the given descriptor.
    Use(TypeDescriptor),
}

/// A dynamic value turned back into something typed.
pub enum Materialized {
    /// An instance of a registered native type.
    Native(Box<dyn Any>),
    /// An instance of a synthesized type.
    Synthesized(SynthesizedRecord),
    /// A scalar, array or untyped value.
    Value(Value),
}

impl Materialized {
    /// The native instance, if it is a `T`.
    pub fn downcast<T: 'static>(self) -> Option<T> {
        match self {
            Materialized::Native(native) => native.downcast::<T>().ok().map(|b| *b),
            _ => None,
        }
    }

    /// The synthesized instance.
    pub fn into_synthesized(self) -> Option<SynthesizedRecord> {
        match self {
            Materialized::Synthesized(record) => Some(record),
            _ => None,
        }
    }
}

impl fmt::Debug for Materialized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Materialized::Native(_) => f.write_str("Native(..)"),
            Materialized::Synthesized(record) => {
                f.debug_tuple("Synthesized").field(record).finish()
            }
            Materialized::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// Maps native object graphs to dynamic values and back.
///
/// Cheap to share between threads; the only mutable state is the per-type property cache.
pub struct ObjectMapper {
    policy: Arc<dyn MappingPolicy>,
    properties: PropertyCache,
    coercions: CoercionTable,
}

impl ObjectMapper {
    /// A mapper with the [`DefaultPolicy`] and no coercions.
    pub fn new() -> Self {
        Self::with_policy(DefaultPolicy)
    }

    /// A mapper with a custom policy.
    pub fn with_policy(policy: impl MappingPolicy + 'static) -> Self {
        Self {
            policy: Arc::new(policy),
            properties: PropertyCache::default(),
            coercions: CoercionTable::new(),
        }
    }

    /// Use `coercions` when converting scalars.
    pub fn with_coercions(mut self, coercions: CoercionTable) -> Self {
        self.coercions = coercions;
        self
    }

    /// The policy.
    pub fn policy(&self) -> &dyn MappingPolicy {
        &*self.policy
    }

    /// The coercion table.
    pub fn coercions(&self) -> &CoercionTable {
        &self.coercions
    }

    /// The properties of `ty` the policy maps, cached per type.
    pub fn mapped_properties(&self, ty: &NativeType) -> Arc<[NativeProperty]> {
        self.properties.get_or_compute(ty, &*self.policy)
    }

    /// Number of types with cached property lists.
    pub fn cached_types(&self) -> usize {
        self.properties.len()
    }

    /// Map `object` to a dynamic value annotated with descriptors of its native types.
    pub fn to_dynamic(&self, object: &dyn Reflect) -> Result<DynamicValue> {
        self.to_dynamic_with(object, &|_| TypeHint::Annotate)
    }

    /// Map `object`, choosing the annotation of every mapped native type with `hints`.
    pub fn to_dynamic_with(
        &self,
        object: &dyn Reflect,
        hints: &dyn Fn(&NativeType) -> TypeHint,
    ) -> Result<DynamicValue> {
        let mut walker = ToDynamic {
            mapper: self,
            hints,
            describer: Describer::new(),
            records: HashMap::new(),
            in_progress: Vec::new(),
        };
        let value = walker.root(object)?;
        debug!(
            "Mapped object graph with {} records to a dynamic value",
            walker.records.len()
        );

        Ok(value)
    }

    /// Build a `T` from `value`.
    pub fn from_dynamic<T: FromDynamic>(&self, value: &DynamicValue) -> Result<T> {
        T::from_dynamic_value(value, &mut MapContext::new(self))
    }

    /// Build an instance of the type `value` is annotated with, as resolved by `resolver`.
    ///
    /// Unannotated records become instances of a synthesized anonymous type.
    pub fn materialize(
        &self,
        value: &DynamicValue,
        resolver: &TypeResolver,
    ) -> Result<Materialized> {
        let handle = match value.ty() {
            Some(ty) => resolver.resolve(ty)?,
            None => resolver.resolve_untyped(value)?,
        };

        self.materialize_as(value, &handle)
    }

    /// Build an instance of `handle` from `value`.
    pub fn materialize_as(&self, value: &DynamicValue, handle: &TypeHandle) -> Result<Materialized> {
        let mut cx = MapContext::new(self);
        match handle {
            TypeHandle::Native(entry) => entry.build(value, &mut cx).map(Materialized::Native),
            // Maps describe no properties, so a synthesized type could not hold their entries.
            TypeHandle::Synthesized(_) | TypeHandle::Closed(_)
                if handle.property_names().is_empty()
                    && value.properties().is_some_and(|p| !p.is_empty()) =>
            {
                debug!(
                    "`{}` declares no properties, keeping the dynamic value",
                    handle.full_name()
                );
                Ok(Materialized::Value(Value::Dynamic(Arc::new(value.clone()))))
            }
            TypeHandle::Synthesized(_) | TypeHandle::Closed(_) => {
                SynthesizedRecord::from_dynamic(handle.clone(), value, &mut cx)
                    .map(Materialized::Synthesized)
            }
            TypeHandle::Scalar(kind) => {
                let wrapped = value.wrapped_value().unwrap_or(&Value::Null);
                cx.scalar(wrapped, &scalar_native_type(*kind))
                    .map(|scalar| Materialized::Value(Value::Scalar(scalar)))
            }
            TypeHandle::Array(_) | TypeHandle::Object => Ok(Materialized::Value(
                match value.wrapped_value() {
                    Some(wrapped) => wrapped.clone(),
                    None if value.is_null() => Value::Null,
                    None => Value::Dynamic(Arc::new(value.clone())),
                },
            )),
        }
    }

    fn maps_to_record(&self, native: &NativeType) -> bool {
        native.is_sequence() && self.policy.should_map_to_dynamic_object(native)
    }
}

impl Default for ObjectMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMapper")
            .field("policy", &self.policy)
            .field("coercions", &self.coercions)
            .finish_non_exhaustive()
    }
}

type RecordKey = (usize, NativeKey);

/// One `to_dynamic` call.
struct ToDynamic<'a> {
    mapper: &'a ObjectMapper,
    hints: &'a dyn Fn(&NativeType) -> TypeHint,
    describer: Describer,
    records: HashMap<RecordKey, Arc<DynamicValue>>,
    in_progress: Vec<RecordKey>,
}

impl ToDynamic<'_> {
    fn root(&mut self, object: &dyn Reflect) -> Result<DynamicValue> {
        match object.reflect() {
            Reflected::Null => Ok(DynamicValue::null()),
            Reflected::Transparent(inner) => self.root(inner),
            Reflected::Dynamic(value) => Ok(Arc::unwrap_or_clone(value)),
            Reflected::Scalar(scalar) => {
                let native = object.runtime_type();
                self.annotate(DynamicValue::wrapped(scalar), &native, None)
            }
            Reflected::Sequence(items) => {
                let native = object.runtime_type();
                if self.mapper.maps_to_record(&native) {
                    return self.record(object, native).map(Arc::unwrap_or_clone);
                }
                self.sequence(&native, items)
            }
            Reflected::Record(_) => {
                let native = object.runtime_type();
                self.record(object, native).map(Arc::unwrap_or_clone)
            }
        }
    }

    /// A property value.
    fn value(&mut self, object: &dyn Reflect) -> Result<Value> {
        match object.reflect() {
            Reflected::Null => Ok(Value::Null),
            Reflected::Scalar(scalar) => Ok(Value::Scalar(scalar)),
            Reflected::Transparent(inner) => self.value(inner),
            Reflected::Dynamic(value) => Ok(Value::Dynamic(value)),
            Reflected::Sequence(items) => {
                let native = object.runtime_type();
                if self.mapper.maps_to_record(&native) {
                    return self.record(object, native).map(Value::Dynamic);
                }
                self.elements(&native, items).map(|(items, _)| Value::Array(items))
            }
            Reflected::Record(_) => {
                let native = object.runtime_type();
                self.record(object, native).map(Value::Dynamic)
            }
        }
    }

    /// An array element. Nested collections become wrapped dynamic values.
    fn element(&mut self, object: &dyn Reflect) -> Result<Value> {
        match object.reflect() {
            Reflected::Transparent(inner) => self.element(inner),
            Reflected::Sequence(items) => {
                let native = object.runtime_type();
                if self.mapper.maps_to_record(&native) {
                    return self.record(object, native).map(Value::Dynamic);
                }
                self.sequence(&native, items).map(Value::from)
            }
            _ => self.value(object),
        }
    }

    fn sequence(&mut self, native: &NativeType, items: Vec<&dyn Reflect>) -> Result<DynamicValue> {
        let (items, widened) = self.elements(native, items)?;

        self.annotate(DynamicValue::wrapped(Value::Array(items)), native, widened)
    }

    /// Map the elements, widening heterogeneous scalars to their common kind.
    fn elements(
        &mut self,
        native: &NativeType,
        items: Vec<&dyn Reflect>,
    ) -> Result<(Vec<Value>, Option<ScalarKind>)> {
        let mut values = items
            .into_iter()
            .map(|item| self.element(item))
            .collect::<Result<Vec<_>>>()?;

        let heterogeneous = native
            .element_type()
            .map_or(true, |element| matches!(element.get().kind(), NativeKind::Object));
        if !heterogeneous {
            return Ok((values, None));
        }
        let Some(common) = common_scalar_kind(&values) else {
            return Ok((values, None));
        };
        for value in &mut values {
            if let Value::Scalar(scalar) = value {
                *scalar = scalar.convert_to(common)?;
            }
        }
        trace!("Widened {} elements to `{}`", values.len(), common);

        Ok((values, Some(common)))
    }

    fn record(&mut self, object: &dyn Reflect, native: NativeType) -> Result<Arc<DynamicValue>> {
        let key = (address(object), native.key());
        if let Some(value) = self.records.get(&key) {
            return Ok(value.clone());
        }
        if self.in_progress.contains(&key) {
            return Err(Error::UnsupportedGraphCycle {
                at: native.full_name(),
            });
        }

        self.in_progress.push(key);
        let properties = self.properties(object, &native);
        self.in_progress.pop();
        let value = Arc::new(self.annotate(DynamicValue::from(properties?), &native, None)?);
        self.records.insert(key, value.clone());

        Ok(value)
    }

    fn properties(&mut self, object: &dyn Reflect, native: &NativeType) -> Result<PropertySet> {
        let reflected = object.reflect_properties();
        let mut set = PropertySet::new();

        // Open records (maps) declare no properties: take whatever the instance has.
        if native.properties().is_empty() {
            for (name, value) in reflected {
                set.insert(Property::new(name, self.value(value)?))?;
            }
            return Ok(set);
        }

        for property in self.mapper.mapped_properties(native).iter() {
            let found = reflected
                .iter()
                .find(|(name, _)| name.as_ref() == property.name());
            if let Some((_, value)) = found {
                set.insert(Property::new(property.name(), self.value(*value)?))?;
            }
        }

        Ok(set)
    }

    fn annotate(
        &mut self,
        value: DynamicValue,
        native: &NativeType,
        widened: Option<ScalarKind>,
    ) -> Result<DynamicValue> {
        let ty = match (self.hints)(native) {
            TypeHint::Omit => return Ok(value),
            TypeHint::Use(ty) => ty,
            TypeHint::Annotate => match widened {
                Some(kind) => self.widened_array(native, kind)?,
                None => self.describer.describe(native, true),
            },
        };

        Ok(value.with_type(ty))
    }

    fn widened_array(&mut self, native: &NativeType, kind: ScalarKind) -> Result<TypeDescriptor> {
        let element = self.describer.describe(&scalar_native_type(kind), false);
        let mut header = TypeHeader::new(native.name()).array();
        header.namespace = native.namespace().map(Into::into);

        self.describer
            .graph()
            .define(header, TypeEdges::new().generic_argument(element))
    }
}

fn common_scalar_kind(values: &[Value]) -> Option<ScalarKind> {
    let mut kinds = values.iter().map(|value| value.as_scalar().map(|s| s.kind()));
    let first = kinds.next()??;
    kinds.try_fold(first, |common, kind| common.common_supertype(kind?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    use crate::{NativeTypeRef, Scalar};

    #[derive(Debug, Default, PartialEq)]
    struct Entity {
        id: i32,
        name: String,
        price: f64,
    }

    impl Reflect for Entity {
        fn native_type() -> NativeType {
            NativeType::record::<Self>("Entity")
                .with_namespace("shop")
                .with_properties(vec![
                    NativeProperty::new("Id", NativeTypeRef::of::<i32>()),
                    NativeProperty::new("Name", NativeTypeRef::of::<String>()),
                    NativeProperty::new("Price", NativeTypeRef::of::<f64>()),
                ])
        }

        fn runtime_type(&self) -> NativeType {
            Self::native_type()
        }

        fn reflect(&self) -> Reflected<'_> {
            Reflected::Record(vec![
                (Cow::Borrowed("Id"), &self.id as &dyn Reflect),
                (Cow::Borrowed("Name"), &self.name as &dyn Reflect),
                (Cow::Borrowed("Price"), &self.price as &dyn Reflect),
            ])
        }
    }

    impl FromDynamic for Entity {
        fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self> {
            cx.record(value)
        }

        fn from_dynamic_value(value: &DynamicValue, cx: &mut MapContext<'_>) -> Result<Self> {
            cx.record_from(value)
        }
    }

    impl crate::Record for Entity {
        fn set_property(
            &mut self,
            name: &str,
            value: &Value,
            cx: &mut MapContext<'_>,
        ) -> Result<bool> {
            match name {
                "Id" => self.id = FromDynamic::from_dynamic(value, cx)?,
                "Name" => self.name = FromDynamic::from_dynamic(value, cx)?,
                "Price" => self.price = FromDynamic::from_dynamic(value, cx)?,
                _ => return Ok(false),
            }
            Ok(true)
        }
    }

    fn widget() -> Entity {
        Entity {
            id: 1,
            name: "Widget".into(),
            price: 9.99,
        }
    }

    #[test_log::test]
    fn records_map_in_declaration_order() {
        let mapper = ObjectMapper::new();
        let dynamic = mapper.to_dynamic(&widget()).unwrap();

        let properties = dynamic.properties().unwrap();
        assert_eq!(properties.names().collect::<Vec<_>>(), ["Id", "Name", "Price"]);
        assert_eq!(dynamic.ty().unwrap().full_name(), "shop::Entity");
        assert_eq!(mapper.from_dynamic::<Entity>(&dynamic).unwrap(), widget());
        assert_eq!(mapper.cached_types(), 1);
    }

    #[test]
    fn missing_properties_keep_defaults() {
        let mapper = ObjectMapper::new();
        let dynamic = DynamicValue::record().with_property("Name", "Gadget").unwrap();

        let entity = mapper.from_dynamic::<Entity>(&dynamic).unwrap();
        assert_eq!(entity.id, 0);
        assert_eq!(entity.name, "Gadget");
    }

    #[test]
    fn unconvertible_scalars_fail() {
        let mapper = ObjectMapper::new();
        let dynamic = DynamicValue::record().with_property("Id", "many").unwrap();

        let err = mapper.from_dynamic::<Entity>(&dynamic).unwrap_err();
        assert_eq!(
            err,
            Error::ScalarConversion {
                from: "String".into(),
                to: "i32".into()
            }
        );
    }

    #[test]
    fn coercions_run_first() {
        let coercions = CoercionTable::new().with("i32", |scalar| match scalar {
            Scalar::String(s) if s == "many" => Ok(Scalar::I32(1000)),
            other => Ok(other.clone()),
        });
        let mapper = ObjectMapper::new().with_coercions(coercions);
        let dynamic = DynamicValue::record().with_property("Id", "many").unwrap();

        assert_eq!(mapper.from_dynamic::<Entity>(&dynamic).unwrap().id, 1000);
    }

    #[test]
    fn heterogeneous_arrays_widen() {
        let mapper = ObjectMapper::new();
        let mixed = vec![Value::from(1i8), Value::from(300i32), Value::from(2i64)];
        let dynamic = mapper.to_dynamic(&mixed).unwrap();

        assert_eq!(
            dynamic.wrapped_value(),
            Some(&Value::Array(vec![1i64.into(), 300i64.into(), 2i64.into()]))
        );
        let ty = dynamic.ty().unwrap();
        assert!(ty.is_array());
        assert_eq!(ty.element_type().unwrap().name(), "i64");

        let floats = vec![Value::from(1u8), Value::from(0.5f32)];
        let dynamic = mapper.to_dynamic(&floats).unwrap();
        assert_eq!(
            dynamic.wrapped_value(),
            Some(&Value::Array(vec![1.0f64.into(), 0.5f64.into()]))
        );

        let objects = vec![Value::from(1), Value::from("one")];
        let dynamic = mapper.to_dynamic(&objects).unwrap();
        assert_eq!(dynamic.ty().unwrap().full_name(), "Vec<Object>");
    }

    #[test]
    fn shared_instances_map_to_one_value() {
        let shared = Arc::new(widget());
        let pair = vec![shared.clone(), shared];
        let mapper = ObjectMapper::new();
        let dynamic = mapper.to_dynamic(&pair).unwrap();

        let items = dynamic.wrapped_value().unwrap().as_array().unwrap();
        assert!(items[0].ptr_eq(&items[1]));

        let back: Vec<Arc<Entity>> = mapper.from_dynamic(&dynamic).unwrap();
        assert!(Arc::ptr_eq(&back[0], &back[1]));
        assert_eq!(*back[0], widget());
    }

    #[test]
    fn hints_choose_annotations() {
        let mapper = ObjectMapper::new();
        let dynamic = mapper
            .to_dynamic_with(&widget(), &|native| match native.scalar_kind() {
                Some(_) => TypeHint::Omit,
                None => TypeHint::Annotate,
            })
            .unwrap();
        assert!(dynamic.ty().is_some());

        let dynamic = mapper.to_dynamic_with(&5u8, &|_| TypeHint::Omit).unwrap();
        assert!(dynamic.ty().is_none());
    }

    #[derive(Debug)]
    struct Indexed;

    impl MappingPolicy for Indexed {
        fn should_map_to_dynamic_object(&self, ty: &NativeType) -> bool {
            ty.name() == "VecDeque"
        }
    }

    #[test]
    fn collections_can_map_to_records() {
        let mapper = ObjectMapper::with_policy(Indexed);
        let queue = std::collections::VecDeque::from([7u8, 8]);
        let dynamic = mapper.to_dynamic(&queue).unwrap();

        assert!(dynamic.is_record());
        assert_eq!(dynamic.get("1"), Some(&Value::from(8u8)));
        let back: std::collections::VecDeque<u8> = mapper.from_dynamic(&dynamic).unwrap();
        assert_eq!(back, queue);
    }

    #[test]
    fn unregistered_maps_keep_their_entries() {
        let mapper = ObjectMapper::new();
        let map = std::collections::BTreeMap::from([("a".to_owned(), 1), ("b".to_owned(), 2)]);
        let dynamic = mapper.to_dynamic(&map).unwrap();
        assert!(dynamic.ty().unwrap().properties().is_empty());

        let materialized = mapper.materialize(&dynamic, &TypeResolver::new()).unwrap();
        let Materialized::Value(Value::Dynamic(value)) = materialized else {
            panic!("expected the dynamic value, got {materialized:?}");
        };
        assert_eq!(value.get("a"), Some(&Value::from(1)));
        assert_eq!(value.get("b"), Some(&Value::from(2)));
    }

    #[test]
    fn every_scalar_kind_round_trips() {
        fn round_trip<T>(mapper: &ObjectMapper, value: T) -> ScalarKind
        where
            T: Reflect + FromDynamic + PartialEq + fmt::Debug,
        {
            let dynamic = mapper.to_dynamic(&value).unwrap();
            assert_eq!(mapper.from_dynamic::<T>(&dynamic).unwrap(), value);
            dynamic
                .wrapped_value()
                .and_then(Value::as_scalar)
                .map(Scalar::kind)
                .unwrap()
        }

        let mapper = ObjectMapper::new();
        let kinds = [
            round_trip(&mapper, true),
            round_trip(&mapper, i8::MIN),
            round_trip(&mapper, i16::MIN),
            round_trip(&mapper, i32::MIN),
            round_trip(&mapper, i64::MIN),
            round_trip(&mapper, i128::MIN),
            round_trip(&mapper, u8::MAX),
            round_trip(&mapper, u16::MAX),
            round_trip(&mapper, u32::MAX),
            round_trip(&mapper, u64::MAX),
            round_trip(&mapper, u128::MAX),
            round_trip(&mapper, 0.1f32),
            round_trip(&mapper, f64::MIN_POSITIVE),
            round_trip(&mapper, '\u{1F980}'),
            round_trip(&mapper, String::from("Widget")),
            round_trip(&mapper, crate::Bytes(vec![0, 0x7f, 0xff])),
        ];
        assert_eq!(kinds, ScalarKind::ALL);
    }
}
