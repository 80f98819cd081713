//! Types from other crates that map to `String` scalars.

use std::any::TypeId;

use super::{FromDynamic, Reflect, Reflected};
use crate::{
    Error, MapContext, NativeKey, NativeKind, NativeType, Result, Scalar, ScalarKind, Value,
};

macro_rules! reflect_as_string {
    ($ty:ty, $namespace:literal, $name:literal, $to:expr, $from:expr) => {
        impl Reflect for $ty {
            fn native_type() -> NativeType {
                NativeType::new(
                    NativeKey::Rust(TypeId::of::<$ty>()),
                    $name,
                    NativeKind::Scalar(ScalarKind::String),
                )
                .with_namespace($namespace)
            }

            fn runtime_type(&self) -> NativeType {
                Self::native_type()
            }

            fn reflect(&self) -> Reflected<'_> {
                let to: fn(&$ty) -> String = $to;
                Reflected::Scalar(Scalar::String(to(self)))
            }
        }

        impl FromDynamic for $ty {
            fn from_dynamic(value: &Value, cx: &mut MapContext<'_>) -> Result<Self> {
                let from: fn(&str) -> Option<$ty> = $from;
                let fail = || Error::ScalarConversion {
                    from: ScalarKind::String.name().into(),
                    to: concat!($namespace, "::", $name).into(),
                };
                match cx.scalar(value, &Self::native_type())? {
                    Scalar::String(s) => from(&s).ok_or_else(fail),
                    _ => Err(fail()),
                }
            }
        }
    };
}

#[cfg(feature = "uuid")]
reflect_as_string!(
    uuid::Uuid,
    "uuid",
    "Uuid",
    |v| v.to_string(),
    |s| s.parse().ok()
);

#[cfg(feature = "chrono")]
reflect_as_string!(
    chrono::NaiveDate,
    "chrono",
    "NaiveDate",
    |v| v.format("%Y-%m-%d").to_string(),
    |s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
);

#[cfg(feature = "chrono")]
reflect_as_string!(
    chrono::NaiveDateTime,
    "chrono",
    "NaiveDateTime",
    |v| v.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
    |s| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
);

#[cfg(feature = "chrono")]
reflect_as_string!(
    chrono::DateTime<chrono::Utc>,
    "chrono",
    "DateTime",
    |v| v.to_rfc3339(),
    |s| chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|v| v.with_timezone(&chrono::Utc))
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectMapper;

    #[cfg(feature = "uuid")]
    #[test]
    fn uuid_round_trips_as_string() {
        let id = uuid::Uuid::from_u128(0x1234);
        let mapper = ObjectMapper::new();
        let dynamic = mapper.to_dynamic(&id).unwrap();
        assert!(matches!(
            dynamic.wrapped_value(),
            Some(Value::Scalar(Scalar::String(_)))
        ));
        assert_eq!(mapper.from_dynamic::<uuid::Uuid>(&dynamic).unwrap(), id);
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn chrono_round_trips_as_string() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let mapper = ObjectMapper::new();
        let dynamic = mapper.to_dynamic(&date).unwrap();
        assert_eq!(
            dynamic.wrapped_value(),
            Some(&Value::from("2024-02-29"))
        );
        assert_eq!(mapper.from_dynamic::<chrono::NaiveDate>(&dynamic).unwrap(), date);

        let bad = Value::from("yesterday");
        let mut cx = MapContext::new(&mapper);
        assert!(chrono::NaiveDate::from_dynamic(&bad, &mut cx).is_err());
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn chrono_timestamps_round_trip() {
        let mapper = ObjectMapper::new();
        let naive = chrono::NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_milli_opt(23, 59, 58, 125)
            .unwrap();
        let dynamic = mapper.to_dynamic(&naive).unwrap();
        assert_eq!(
            dynamic.wrapped_value(),
            Some(&Value::from("2024-02-29T23:59:58.125"))
        );
        assert_eq!(
            mapper.from_dynamic::<chrono::NaiveDateTime>(&dynamic).unwrap(),
            naive
        );

        let utc = naive.and_utc();
        let dynamic = mapper.to_dynamic(&utc).unwrap();
        assert!(matches!(
            dynamic.wrapped_value(),
            Some(Value::Scalar(Scalar::String(_)))
        ));
        assert_eq!(
            mapper
                .from_dynamic::<chrono::DateTime<chrono::Utc>>(&dynamic)
                .unwrap(),
            utc
        );
    }
}
