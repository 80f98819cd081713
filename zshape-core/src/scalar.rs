//! Scalar values: the leaves of every dynamic value.

use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The kind of a [`Scalar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// `bool`.
    #[serde(rename = "bool")]
    Bool,
    /// `i8`.
    #[serde(rename = "i8")]
    I8,
    /// `i16`.
    #[serde(rename = "i16")]
    I16,
    /// `i32`.
    #[serde(rename = "i32")]
    I32,
    /// `i64`.
    #[serde(rename = "i64")]
    I64,
    /// `i128`.
    #[serde(rename = "i128")]
    I128,
    /// `u8`.
    #[serde(rename = "u8")]
    U8,
    /// `u16`.
    #[serde(rename = "u16")]
    U16,
    /// `u32`.
    #[serde(rename = "u32")]
    U32,
    /// `u64`.
    #[serde(rename = "u64")]
    U64,
    /// `u128`.
    #[serde(rename = "u128")]
    U128,
    /// `f32`.
    #[serde(rename = "f32")]
    F32,
    /// `f64`.
    #[serde(rename = "f64")]
    F64,
    /// `char`.
    #[serde(rename = "char")]
    Char,
    /// UTF-8 string.
    String,
    /// Byte sequence.
    Bytes,
}

impl ScalarKind {
    /// All scalar kinds.
    pub const ALL: [ScalarKind; 16] = [
        ScalarKind::Bool,
        ScalarKind::I8,
        ScalarKind::I16,
        ScalarKind::I32,
        ScalarKind::I64,
        ScalarKind::I128,
        ScalarKind::U8,
        ScalarKind::U16,
        ScalarKind::U32,
        ScalarKind::U64,
        ScalarKind::U128,
        ScalarKind::F32,
        ScalarKind::F64,
        ScalarKind::Char,
        ScalarKind::String,
        ScalarKind::Bytes,
    ];

    /// The type name of this kind, as used in type descriptors and wire tags.
    pub const fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::I128 => "i128",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::U128 => "u128",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::String => "String",
            ScalarKind::Bytes => "Bytes",
        }
    }

    /// The kind with the given type name, if any.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The value a freshly constructed field of this kind holds.
    pub fn default_value(self) -> Scalar {
        match self {
            ScalarKind::Bool => Scalar::Bool(false),
            ScalarKind::I8 => Scalar::I8(0),
            ScalarKind::I16 => Scalar::I16(0),
            ScalarKind::I32 => Scalar::I32(0),
            ScalarKind::I64 => Scalar::I64(0),
            ScalarKind::I128 => Scalar::I128(0),
            ScalarKind::U8 => Scalar::U8(0),
            ScalarKind::U16 => Scalar::U16(0),
            ScalarKind::U32 => Scalar::U32(0),
            ScalarKind::U64 => Scalar::U64(0),
            ScalarKind::U128 => Scalar::U128(0),
            ScalarKind::F32 => Scalar::F32(0.0),
            ScalarKind::F64 => Scalar::F64(0.0),
            ScalarKind::Char => Scalar::Char('\0'),
            ScalarKind::String => Scalar::String(String::new()),
            ScalarKind::Bytes => Scalar::Bytes(Vec::new()),
        }
    }

    /// Whether this is a signed integer kind.
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 | ScalarKind::I64 | ScalarKind::I128
        )
    }

    /// Whether this is an unsigned integer kind.
    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 | ScalarKind::U64 | ScalarKind::U128
        )
    }

    /// Whether this is a floating point kind.
    pub const fn is_float(self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F64)
    }

    /// Whether this is any numeric kind.
    pub const fn is_numeric(self) -> bool {
        self.is_signed() || self.is_unsigned() || self.is_float()
    }

    /// The narrowest kind both `self` and `other` widen to, if any.
    ///
    /// Integers of the same signedness widen to the larger one and floats widen to the larger one.
    /// A signed and an unsigned integer widen to the smallest signed kind holding both, if there is
    /// one. Any other mix of numbers widens to `f64`. Non-numeric kinds only match themselves.
    pub fn common_supertype(self, other: ScalarKind) -> Option<ScalarKind> {
        if self == other {
            return Some(self);
        }
        let widest = |a: ScalarKind, b: ScalarKind| {
            if a.rank() >= b.rank() {
                a
            } else {
                b
            }
        };
        if (self.is_signed() && other.is_signed())
            || (self.is_unsigned() && other.is_unsigned())
            || (self.is_float() && other.is_float())
        {
            Some(widest(self, other))
        } else if let Some(signed) = self.signed_supertype(other) {
            Some(signed)
        } else if self.is_numeric() && other.is_numeric() {
            Some(ScalarKind::F64)
        } else {
            None
        }
    }

    fn signed_supertype(self, other: ScalarKind) -> Option<ScalarKind> {
        let (signed, unsigned) = match (self.is_signed(), other.is_signed()) {
            (true, false) if other.is_unsigned() => (self, other),
            (false, true) if self.is_unsigned() => (other, self),
            _ => return None,
        };
        match signed.rank().max(unsigned.rank() + 1) {
            2 => Some(ScalarKind::I16),
            3 => Some(ScalarKind::I32),
            4 => Some(ScalarKind::I64),
            5 => Some(ScalarKind::I128),
            _ => None,
        }
    }

    fn rank(self) -> u8 {
        match self {
            ScalarKind::I8 | ScalarKind::U8 => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 => 3,
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 => 4,
            ScalarKind::I128 | ScalarKind::U128 => 5,
            _ => 0,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::ScalarConversion {
            from: s.into(),
            to: "scalar".into(),
        })
    }
}

/// A primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `bool`.
    Bool(bool),
    /// `i8`.
    I8(i8),
    /// `i16`.
    I16(i16),
    /// `i32`.
    I32(i32),
    /// `i64`.
    I64(i64),
    /// `i128`.
    I128(i128),
    /// `u8`.
    U8(u8),
    /// `u16`.
    U16(u16),
    /// `u32`.
    U32(u32),
    /// `u64`.
    U64(u64),
    /// `u128`.
    U128(u128),
    /// `f32`.
    F32(f32),
    /// `f64`.
    F64(f64),
    /// `char`.
    Char(char),
    /// UTF-8 string.
    String(String),
    /// Byte sequence.
    Bytes(Vec<u8>),
}

impl Scalar {
    /// The kind of this value.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::I8(_) => ScalarKind::I8,
            Scalar::I16(_) => ScalarKind::I16,
            Scalar::I32(_) => ScalarKind::I32,
            Scalar::I64(_) => ScalarKind::I64,
            Scalar::I128(_) => ScalarKind::I128,
            Scalar::U8(_) => ScalarKind::U8,
            Scalar::U16(_) => ScalarKind::U16,
            Scalar::U32(_) => ScalarKind::U32,
            Scalar::U64(_) => ScalarKind::U64,
            Scalar::U128(_) => ScalarKind::U128,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F64(_) => ScalarKind::F64,
            Scalar::Char(_) => ScalarKind::Char,
            Scalar::String(_) => ScalarKind::String,
            Scalar::Bytes(_) => ScalarKind::Bytes,
        }
    }

    /// Convert this value to `target`.
    ///
    /// Numeric conversions are checked: out-of-range values and floats with a fractional part
    /// do not convert to integers. A `String` parses into numbers, `bool` and `char`, a `char`
    /// becomes a one-character `String` and back.
    pub fn convert_to(&self, target: ScalarKind) -> Result<Scalar> {
        let source = self.kind();
        if source == target {
            return Ok(self.clone());
        }
        let fail = || Error::ScalarConversion {
            from: source.name().into(),
            to: target.name().into(),
        };

        match (self, target) {
            (Scalar::Char(c), ScalarKind::String) => Ok(Scalar::String(c.to_string())),
            (Scalar::String(s), ScalarKind::Char) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Scalar::Char(c)),
                    _ => Err(fail()),
                }
            }
            (Scalar::String(s), ScalarKind::Bool) => s.parse().map(Scalar::Bool).map_err(|_| fail()),
            (Scalar::String(s), target) if target.is_numeric() => {
                parse_numeric(s, target).ok_or_else(fail)
            }
            (_, ScalarKind::F32) if source.is_numeric() => {
                self.as_f64().map(|v| Scalar::F32(v as f32)).ok_or_else(fail)
            }
            (_, ScalarKind::F64) if source.is_numeric() => {
                self.as_f64().map(Scalar::F64).ok_or_else(fail)
            }
            (_, target) if source.is_numeric() && target.is_numeric() => {
                let wide = self.as_i128().ok_or_else(fail)?;
                from_i128(wide, target).ok_or_else(fail)
            }
            _ => Err(fail()),
        }
    }

    /// Integer view of a numeric value; `None` for non-integral floats and non-numerics.
    fn as_i128(&self) -> Option<i128> {
        match *self {
            Scalar::I8(v) => Some(v.into()),
            Scalar::I16(v) => Some(v.into()),
            Scalar::I32(v) => Some(v.into()),
            Scalar::I64(v) => Some(v.into()),
            Scalar::I128(v) => Some(v),
            Scalar::U8(v) => Some(v.into()),
            Scalar::U16(v) => Some(v.into()),
            Scalar::U32(v) => Some(v.into()),
            Scalar::U64(v) => Some(v.into()),
            Scalar::U128(v) => i128::try_from(v).ok(),
            Scalar::F32(v) => float_to_i128(v.into()),
            Scalar::F64(v) => float_to_i128(v),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Scalar::F32(v) => Some(v.into()),
            Scalar::F64(v) => Some(v),
            Scalar::U128(v) => Some(v as f64),
            _ => self.as_i128().map(|v| v as f64),
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(v: $ty) -> Self {
                    Scalar::$variant(v)
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    Vec<u8> => Bytes,
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.into())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::I128(v) => write!(f, "{v}"),
            Scalar::U8(v) => write!(f, "{v}"),
            Scalar::U16(v) => write!(f, "{v}"),
            Scalar::U32(v) => write!(f, "{v}"),
            Scalar::U64(v) => write!(f, "{v}"),
            Scalar::U128(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Char(v) => write!(f, "{v}"),
            Scalar::String(v) => f.write_str(v),
            Scalar::Bytes(v) => write!(f, "{v:?}"),
        }
    }
}

fn float_to_i128(v: f64) -> Option<i128> {
    // Bounds are exact powers of two, so the comparison does not round.
    if v.fract() != 0.0 || !(-1.7014118346046923e38..1.7014118346046923e38).contains(&v) {
        return None;
    }
    Some(v as i128)
}

fn from_i128(v: i128, target: ScalarKind) -> Option<Scalar> {
    Some(match target {
        ScalarKind::I8 => Scalar::I8(v.try_into().ok()?),
        ScalarKind::I16 => Scalar::I16(v.try_into().ok()?),
        ScalarKind::I32 => Scalar::I32(v.try_into().ok()?),
        ScalarKind::I64 => Scalar::I64(v.try_into().ok()?),
        ScalarKind::I128 => Scalar::I128(v),
        ScalarKind::U8 => Scalar::U8(v.try_into().ok()?),
        ScalarKind::U16 => Scalar::U16(v.try_into().ok()?),
        ScalarKind::U32 => Scalar::U32(v.try_into().ok()?),
        ScalarKind::U64 => Scalar::U64(v.try_into().ok()?),
        ScalarKind::U128 => Scalar::U128(v.try_into().ok()?),
        _ => return None,
    })
}

fn parse_numeric(s: &str, target: ScalarKind) -> Option<Scalar> {
    let s = s.trim();
    Some(match target {
        ScalarKind::I8 => Scalar::I8(s.parse().ok()?),
        ScalarKind::I16 => Scalar::I16(s.parse().ok()?),
        ScalarKind::I32 => Scalar::I32(s.parse().ok()?),
        ScalarKind::I64 => Scalar::I64(s.parse().ok()?),
        ScalarKind::I128 => Scalar::I128(s.parse().ok()?),
        ScalarKind::U8 => Scalar::U8(s.parse().ok()?),
        ScalarKind::U16 => Scalar::U16(s.parse().ok()?),
        ScalarKind::U32 => Scalar::U32(s.parse().ok()?),
        ScalarKind::U64 => Scalar::U64(s.parse().ok()?),
        ScalarKind::U128 => Scalar::U128(s.parse().ok()?),
        ScalarKind::F32 => Scalar::F32(s.parse().ok()?),
        ScalarKind::F64 => Scalar::F64(s.parse().ok()?),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in ScalarKind::ALL {
            assert_eq!(ScalarKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.default_value().kind(), kind);
        }
        assert_eq!(ScalarKind::from_name("Entity"), None);
        assert_eq!(
            serde_json::to_string(&ScalarKind::I32).unwrap(),
            r#""i32""#
        );
    }

    #[test]
    fn numeric_conversions_are_checked() {
        assert_eq!(
            Scalar::I64(42).convert_to(ScalarKind::U8).unwrap(),
            Scalar::U8(42)
        );
        assert_eq!(
            Scalar::F64(3.0).convert_to(ScalarKind::I32).unwrap(),
            Scalar::I32(3)
        );
        assert_eq!(
            Scalar::I32(7).convert_to(ScalarKind::F64).unwrap(),
            Scalar::F64(7.0)
        );

        let err = Scalar::I64(300).convert_to(ScalarKind::U8).unwrap_err();
        assert_eq!(
            err,
            Error::ScalarConversion {
                from: "i64".into(),
                to: "u8".into()
            }
        );
        assert!(Scalar::F64(2.5).convert_to(ScalarKind::I64).is_err());
        assert!(Scalar::I32(-1).convert_to(ScalarKind::U32).is_err());
    }

    #[test]
    fn text_conversions() {
        assert_eq!(
            Scalar::String("12".into()).convert_to(ScalarKind::U16).unwrap(),
            Scalar::U16(12)
        );
        assert_eq!(
            Scalar::Char('x').convert_to(ScalarKind::String).unwrap(),
            Scalar::String("x".into())
        );
        assert_eq!(
            Scalar::String("y".into()).convert_to(ScalarKind::Char).unwrap(),
            Scalar::Char('y')
        );
        assert!(Scalar::String("yz".into())
            .convert_to(ScalarKind::Char)
            .is_err());
        assert!(Scalar::Bool(true).convert_to(ScalarKind::I32).is_err());
        assert!(Scalar::Bytes(vec![1]).convert_to(ScalarKind::String).is_err());
    }

    #[test]
    fn common_supertypes() {
        use ScalarKind::*;
        assert_eq!(I8.common_supertype(I64), Some(I64));
        assert_eq!(U32.common_supertype(U16), Some(U32));
        assert_eq!(I32.common_supertype(F32), Some(F64));
        assert_eq!(U8.common_supertype(I8), Some(I16));
        assert_eq!(I8.common_supertype(U32), Some(I64));
        assert_eq!(I64.common_supertype(U16), Some(I64));
        assert_eq!(U64.common_supertype(I32), Some(I128));
        assert_eq!(I8.common_supertype(U128), Some(F64));
        assert_eq!(U8.common_supertype(F32), Some(F64));
        assert_eq!(String.common_supertype(Char), None);
        assert_eq!(Bool.common_supertype(Bool), Some(Bool));
    }
}
