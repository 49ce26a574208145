//! This module includes a high level abstraction over a DICOM data element's value.

use crate::header::{EmptyObject, Tag};
use itertools::Itertools;
use num_traits::NumCast;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// An aggregation of one or more elements in a value.
pub type C<T> = SmallVec<[T; 2]>;

/// Representation of a full DICOM value, which may be either primitive or
/// a sequence of nested DICOM objects.
///
/// `I` is the complex type for nested data set items.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<I = EmptyObject> {
    /// Primitive value.
    Primitive(PrimitiveValue),
    /// A complex sequence of items.
    Sequence(C<I>),
}

impl<I> Value<I> {
    /// Construct a DICOM sequence value from a list of items.
    pub fn new_sequence<T>(items: T) -> Self
    where
        T: Into<C<I>>,
    {
        Value::Sequence(items.into())
    }

    /// Obtain the number of individual values.
    /// In a primitive, this is the number of individual elements in the value.
    /// In a sequence, this is the number of items.
    pub fn multiplicity(&self) -> u32 {
        match self {
            Value::Primitive(v) => v.multiplicity(),
            Value::Sequence(items) => items.len() as u32,
        }
    }

    /// Gets a reference to the primitive value.
    pub fn primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Value::Primitive(v) => Some(v),
            Value::Sequence(_) => None,
        }
    }

    /// Gets a reference to the items of a sequence value.
    pub fn items(&self) -> Option<&[I]> {
        match self {
            Value::Sequence(items) => Some(items),
            Value::Primitive(_) => None,
        }
    }

    /// Gets mutable access to the items of a sequence value.
    pub fn items_mut(&mut self) -> Option<&mut C<I>> {
        match self {
            Value::Sequence(items) => Some(items),
            Value::Primitive(_) => None,
        }
    }

    /// Retrieve the value as a single clean string,
    /// with no trailing whitespace.
    pub fn to_str(&self) -> Result<Cow<str>, CastValueError> {
        match self {
            Value::Primitive(prim) => Ok(prim.to_str()),
            Value::Sequence(_) => Err(CastValueError {
                requested: "string",
                got: ValueType::Item,
            }),
        }
    }

    /// Retrieve and convert the primitive value into an integer.
    pub fn to_int<T>(&self) -> Result<T, ConvertValueError>
    where
        T: NumCast,
        T: FromStr<Err = std::num::ParseIntError>,
    {
        match self {
            Value::Primitive(v) => v.to_int::<T>(),
            Value::Sequence(_) => Err(ConvertValueError {
                requested: "integer",
                original: ValueType::Item,
                cause: None,
            }),
        }
    }
}

impl<I> From<PrimitiveValue> for Value<I> {
    fn from(v: PrimitiveValue) -> Self {
        Value::Primitive(v)
    }
}

/// An enum representing a primitive value from a DICOM element.
/// The result of decoding an element's data value
/// may be one of the enumerated types
/// depending on its content and value representation.
///
/// Multiple elements are contained in a [`smallvec`] vector,
/// conveniently aliased to the type [`C`].
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    /// No data. Usually employed for zero-lengthed values.
    Empty,

    /// A sequence of strings.
    /// Used for AE, AS, PN, SH, CS, LO, UI, UC,
    /// as well as IS, DS, DA, DT and TM in their textual form.
    Strs(C<String>),

    /// A single string.
    /// Used for ST, LT, UT and UR, which are never multi-valued.
    Str(String),

    /// A sequence of attribute tags.
    /// Used specifically for AT.
    Tags(C<Tag>),

    /// The value is a sequence of bytes.
    /// Used for OB and UN.
    U8(C<u8>),

    /// A sequence of signed 16-bit integers.
    /// Used for SS.
    I16(C<i16>),

    /// A sequence of unsigned 16-bit integers.
    /// Used for US and OW.
    U16(C<u16>),

    /// A sequence of signed 32-bit integers.
    /// Used for SL.
    I32(C<i32>),

    /// A sequence of unsigned 32-bit integers.
    /// Used for UL and OL.
    U32(C<u32>),

    /// A sequence of signed 64-bit integers.
    /// Used for SV.
    I64(C<i64>),

    /// A sequence of unsigned 64-bit integers.
    /// Used for UV and OV.
    U64(C<u64>),

    /// The value is a sequence of 32-bit floating point numbers.
    /// Used for OF and FL.
    F32(C<f32>),

    /// The value is a sequence of 64-bit floating point numbers.
    /// Used for OD and FD.
    F64(C<f64>),
}

/// Construct a DICOM value.
///
/// # Example
///
/// ```
/// # use dcmnet_core::{dicom_value, PrimitiveValue};
/// let v = dicom_value!(U16, [256, 0, 16]);
/// assert_eq!(v.multiplicity(), 3);
/// let s = dicom_value!(Strs, ["ORIGINAL", "PRIMARY"]);
/// assert_eq!(s.to_str(), "ORIGINAL\\PRIMARY");
/// ```
#[macro_export]
macro_rules! dicom_value {
    () => {
        $crate::value::PrimitiveValue::Empty
    };
    (Str, $elem: expr) => {
        $crate::value::PrimitiveValue::Str(String::from($elem))
    };
    (Strs, [ $($elem: expr),+ $(,)* ]) => {
        $crate::value::PrimitiveValue::Strs($crate::smallvec::smallvec![$(String::from($elem),)*])
    };
    ($typ: ident, [ $($elem: expr),* $(,)* ]) => {
        $crate::value::PrimitiveValue::$typ($crate::smallvec::smallvec![$($elem,)*])
    };
    ($typ: ident, $elem: expr) => {
        $crate::value::PrimitiveValue::$typ($crate::value::C::from_elem($elem, 1))
    };
}

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        PrimitiveValue::Str(value)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::Str(value.to_owned())
    }
}

impl From<u16> for PrimitiveValue {
    fn from(value: u16) -> Self {
        PrimitiveValue::new_u16(value)
    }
}

impl From<u32> for PrimitiveValue {
    fn from(value: u32) -> Self {
        PrimitiveValue::new_u32(value)
    }
}

impl From<Vec<u8>> for PrimitiveValue {
    fn from(value: Vec<u8>) -> Self {
        PrimitiveValue::U8(C::from_vec(value))
    }
}

impl PrimitiveValue {
    /// Create a single unsigned 16-bit value.
    pub fn new_u16(value: u16) -> Self {
        PrimitiveValue::U16(C::from_elem(value, 1))
    }

    /// Create a single unsigned 32-bit value.
    pub fn new_u32(value: u32) -> Self {
        PrimitiveValue::U32(C::from_elem(value, 1))
    }

    /// Obtain the number of individual elements. This number may not
    /// match the DICOM value multiplicity in some value representations.
    pub fn multiplicity(&self) -> u32 {
        use self::PrimitiveValue::*;
        match self {
            Empty => 0,
            Str(_) => 1,
            Strs(c) => c.len() as u32,
            Tags(c) => c.len() as u32,
            U8(c) => c.len() as u32,
            I16(c) => c.len() as u32,
            U16(c) => c.len() as u32,
            I32(c) => c.len() as u32,
            U32(c) => c.len() as u32,
            I64(c) => c.len() as u32,
            U64(c) => c.len() as u32,
            F32(c) => c.len() as u32,
            F64(c) => c.len() as u32,
        }
    }

    /// Retrieve the specific type of this value.
    pub fn value_type(&self) -> ValueType {
        use self::PrimitiveValue::*;
        match self {
            Empty => ValueType::Empty,
            Str(_) => ValueType::Str,
            Strs(_) => ValueType::Strs,
            Tags(_) => ValueType::Tags,
            U8(_) => ValueType::U8,
            I16(_) => ValueType::I16,
            U16(_) => ValueType::U16,
            I32(_) => ValueType::I32,
            U32(_) => ValueType::U32,
            I64(_) => ValueType::I64,
            U64(_) => ValueType::U64,
            F32(_) => ValueType::F32,
            F64(_) => ValueType::F64,
        }
    }

    /// Determine the minimum number of bytes that this value would need to
    /// occupy in a DICOM file, without compression and without the header.
    /// As mandated by the standard, it is always even.
    pub fn calculate_byte_len(&self) -> usize {
        let len = self.raw_byte_len();
        (len + 1) & !1
    }

    /// The number of bytes of the value before even padding.
    pub fn raw_byte_len(&self) -> usize {
        use self::PrimitiveValue::*;
        match self {
            Empty => 0,
            U8(c) => c.len(),
            I16(c) => c.len() * 2,
            U16(c) => c.len() * 2,
            U32(c) => c.len() * 4,
            I32(c) => c.len() * 4,
            U64(c) => c.len() * 8,
            I64(c) => c.len() * 8,
            F32(c) => c.len() * 4,
            F64(c) => c.len() * 8,
            Tags(c) => c.len() * 4,
            Str(s) => s.len(),
            Strs(c) if c.is_empty() => 0,
            Strs(c) => c.iter().map(|s| s.len()).sum::<usize>() + c.len() - 1,
        }
    }

    /// Convert the primitive value into a string representation.
    ///
    /// String values are trimmed of trailing padding,
    /// and multiple values are joined together with a backslash (`'\\'`).
    pub fn to_str(&self) -> Cow<str> {
        match self {
            PrimitiveValue::Empty => Cow::from(""),
            PrimitiveValue::Str(value) => Cow::from(trim_padding(value)),
            PrimitiveValue::Strs(values) => {
                if values.len() == 1 {
                    Cow::from(trim_padding(&values[0]))
                } else {
                    Cow::from(values.iter().map(|s| trim_padding(s)).join("\\"))
                }
            }
            prim => Cow::from(prim.to_string()),
        }
    }

    /// Retrieve the inner strings of a textual value.
    ///
    /// An error is returned if the variant is not textual.
    pub fn strings(&self) -> Result<&[String], CastValueError> {
        match self {
            PrimitiveValue::Strs(c) => Ok(c),
            PrimitiveValue::Str(s) => Ok(std::slice::from_ref(s)),
            value => Err(CastValueError {
                requested: "strings",
                got: value.value_type(),
            }),
        }
    }

    /// Retrieve the first unsigned 16-bit number of this value, if it has that type.
    pub fn uint16(&self) -> Result<u16, CastValueError> {
        match self {
            PrimitiveValue::U16(c) if !c.is_empty() => Ok(c[0]),
            value => Err(CastValueError {
                requested: "uint16",
                got: value.value_type(),
            }),
        }
    }

    /// Retrieve the first unsigned 32-bit number of this value, if it has that type.
    pub fn uint32(&self) -> Result<u32, CastValueError> {
        match self {
            PrimitiveValue::U32(c) if !c.is_empty() => Ok(c[0]),
            value => Err(CastValueError {
                requested: "uint32",
                got: value.value_type(),
            }),
        }
    }

    /// Retrieve and convert the first value into an integer.
    ///
    /// Textual values are trimmed and parsed as a decimal number,
    /// binary numbers are converted if they fit in the target type.
    pub fn to_int<T>(&self) -> Result<T, ConvertValueError>
    where
        T: NumCast,
        T: FromStr<Err = std::num::ParseIntError>,
    {
        let fail = |cause: Option<InvalidValueReadError>| ConvertValueError {
            requested: "integer",
            original: self.value_type(),
            cause,
        };
        let cast = |n: Option<T>| n.ok_or_else(|| fail(Some(InvalidValueReadError::NarrowConvert)));
        match self {
            PrimitiveValue::Str(s) => s
                .trim_matches(|c| c == ' ' || c == '\0')
                .parse()
                .map_err(|e| fail(Some(InvalidValueReadError::ParseInteger(e)))),
            PrimitiveValue::Strs(c) if !c.is_empty() => c[0]
                .trim_matches(|c| c == ' ' || c == '\0')
                .parse()
                .map_err(|e| fail(Some(InvalidValueReadError::ParseInteger(e)))),
            PrimitiveValue::U8(c) if !c.is_empty() => cast(T::from(c[0])),
            PrimitiveValue::I16(c) if !c.is_empty() => cast(T::from(c[0])),
            PrimitiveValue::U16(c) if !c.is_empty() => cast(T::from(c[0])),
            PrimitiveValue::I32(c) if !c.is_empty() => cast(T::from(c[0])),
            PrimitiveValue::U32(c) if !c.is_empty() => cast(T::from(c[0])),
            PrimitiveValue::I64(c) if !c.is_empty() => cast(T::from(c[0])),
            PrimitiveValue::U64(c) if !c.is_empty() => cast(T::from(c[0])),
            _ => Err(fail(None)),
        }
    }
}

fn trim_padding(s: &str) -> &str {
    s.trim_end_matches([' ', '\0'])
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn seq<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
            write!(f, "{}", values.iter().join("\\"))
        }

        match self {
            PrimitiveValue::Empty => Ok(()),
            PrimitiveValue::Str(s) => f.write_str(s),
            PrimitiveValue::Strs(c) => seq(f, c),
            PrimitiveValue::Tags(c) => seq(f, c),
            PrimitiveValue::U8(c) => seq(f, c),
            PrimitiveValue::I16(c) => seq(f, c),
            PrimitiveValue::U16(c) => seq(f, c),
            PrimitiveValue::I32(c) => seq(f, c),
            PrimitiveValue::U32(c) => seq(f, c),
            PrimitiveValue::I64(c) => seq(f, c),
            PrimitiveValue::U64(c) => seq(f, c),
            PrimitiveValue::F32(c) => seq(f, c),
            PrimitiveValue::F64(c) => seq(f, c),
        }
    }
}

/// An enum representing an abstraction of a DICOM element's data value type.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ValueType {
    /// No data. Used for any value of length 0.
    Empty,
    /// An item. Used for elements in a SQ, regardless of content.
    Item,
    /// A sequence of strings.
    Strs,
    /// A single string.
    Str,
    /// A sequence of attribute tags.
    Tags,
    /// A sequence of unsigned 8-bit integers.
    U8,
    /// A sequence of signed 16-bit integers.
    I16,
    /// A sequence of unsigned 16-bit integers.
    U16,
    /// A sequence of signed 32-bit integers.
    I32,
    /// A sequence of unsigned 32-bit integers.
    U32,
    /// A sequence of signed 64-bit integers.
    I64,
    /// A sequence of unsigned 64-bit integers.
    U64,
    /// A sequence of 32-bit floating point numbers.
    F32,
    /// A sequence of 64-bit floating point numbers.
    F64,
}

/// An error type for an attempt of accessing a value
/// in one internal representation as another.
#[derive(Debug, Clone, PartialEq)]
pub struct CastValueError {
    /// The value format requested
    pub requested: &'static str,
    /// The value's actual representation
    pub got: ValueType,
}

impl fmt::Display for CastValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "bad value cast: requested {} but value is {:?}",
            self.requested, self.got
        )
    }
}

impl std::error::Error for CastValueError {}

/// Triggered when a value reading attempt fails.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum InvalidValueReadError {
    /// The value cannot be parsed to an integer.
    ParseInteger(std::num::ParseIntError),
    /// The value does not fit in the requested integer type.
    NarrowConvert,
}

impl fmt::Display for InvalidValueReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidValueReadError::ParseInteger(e) => write!(f, "invalid integer: {}", e),
            InvalidValueReadError::NarrowConvert => f.write_str("integer out of range"),
        }
    }
}

impl std::error::Error for InvalidValueReadError {}

/// An error type for a failed attempt at converting a value
/// into another representation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertValueError {
    /// The value format requested
    pub requested: &'static str,
    /// The value's original representation
    pub original: ValueType,
    /// The reason why the conversion was unsuccessful,
    /// or none if a conversion from the given original representation
    /// is not possible
    pub cause: Option<InvalidValueReadError>,
}

impl fmt::Display for ConvertValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "could not convert {:?} to a {}",
            self.original, self.requested
        )?;
        if let Some(cause) = &self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConvertValueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|e| e as _)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dicom_value;

    #[test]
    fn byte_len_is_even() {
        assert_eq!(dicom_value!(Str, "ABC").calculate_byte_len(), 4);
        assert_eq!(dicom_value!(Strs, ["A", "BC"]).calculate_byte_len(), 4);
        assert_eq!(dicom_value!(Strs, ["AB", "CD"]).calculate_byte_len(), 6);
        assert_eq!(dicom_value!(U8, [1, 2, 3]).calculate_byte_len(), 4);
        assert_eq!(dicom_value!(U16, [1, 2, 3]).calculate_byte_len(), 6);
        assert_eq!(PrimitiveValue::Empty.calculate_byte_len(), 0);
    }

    #[test]
    fn to_str_trims_padding() {
        assert_eq!(dicom_value!(Str, "1.2.3\0").to_str(), "1.2.3");
        assert_eq!(dicom_value!(Strs, ["DERIVED ", "PRIMARY"]).to_str(), "DERIVED\\PRIMARY");
        assert_eq!(dicom_value!(F32, [1.5, 2.0]).to_str(), "1.5\\2");
    }

    #[test]
    fn to_int_from_text_and_binary() {
        assert_eq!(dicom_value!(Strs, [" 42 "]).to_int::<i32>(), Ok(42));
        assert_eq!(dicom_value!(U16, [0xFF00]).to_int::<u32>(), Ok(0xFF00));
        assert!(dicom_value!(I32, [-1]).to_int::<u16>().is_err());
        assert!(PrimitiveValue::Empty.to_int::<u16>().is_err());
    }

    #[test]
    fn cast_to_wrong_type_fails() {
        let v = dicom_value!(U32, [7]);
        assert_eq!(v.uint32(), Ok(7));
        assert_eq!(
            v.uint16(),
            Err(CastValueError {
                requested: "uint16",
                got: ValueType::U32,
            })
        );
    }
}
