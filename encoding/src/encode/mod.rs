//! This module contains all DICOM data element encoding logic.
use byteordered::Endianness;
use dcmnet_core::{DataElementHeader, PrimitiveValue, Tag, VR};
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::{self, Write};

pub mod basic;
pub mod explicit_be;
pub mod explicit_le;
pub mod implicit_le;
pub mod value;

pub use self::basic::BasicEncoder;
pub use self::value::write_value;

/// Module-level error type:
/// for errors which may occur while encoding DICOM data.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to write tag"))]
    WriteTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write element header"))]
    WriteHeader {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write item header"))]
    WriteItemHeader {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write item delimiter"))]
    WriteItemDelimiter {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write sequence delimiter"))]
    WriteSequenceDelimiter {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write {} value", vr))]
    WriteValue {
        vr: VR,
        backtrace: Backtrace,
        source: io::Error,
    },
    /// A textual value exceeds the maximum length of its value representation.
    #[snafu(display("Value exceeds max length: {} bytes in {} (at most {})", len, vr, max))]
    ValueTooLong {
        vr: VR,
        len: usize,
        max: u32,
        backtrace: Backtrace,
    },
    /// The value is too long for the 16-bit length field of its header.
    #[snafu(display("Length {} of {} does not fit the 16-bit length field of {}", len, tag, vr))]
    LengthOverflow {
        tag: Tag,
        vr: VR,
        len: u32,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Type trait for an encoder of basic data properties.
/// Unlike `Encode` (and similar to `BasicDecode`), this trait is not object
/// safe because it's better to just provide a dynamic implementation.
pub trait BasicEncode {
    /// Retrieve the encoder's endianness.
    fn endianness(&self) -> Endianness;

    /// Encode an unsigned short value to the given writer.
    fn encode_us<W: Write>(&self, to: W, value: u16) -> io::Result<()>;

    /// Encode an unsigned long value to the given writer.
    fn encode_ul<W: Write>(&self, to: W, value: u32) -> io::Result<()>;

    /// Encode an unsigned very long value to the given writer.
    fn encode_uv<W: Write>(&self, to: W, value: u64) -> io::Result<()>;

    /// Encode a signed short value to the given writer.
    fn encode_ss<W: Write>(&self, to: W, value: i16) -> io::Result<()>;

    /// Encode a signed long value to the given writer.
    fn encode_sl<W: Write>(&self, to: W, value: i32) -> io::Result<()>;

    /// Encode a signed very long value to the given writer.
    fn encode_sv<W: Write>(&self, to: W, value: i64) -> io::Result<()>;

    /// Encode a single precision float value to the given writer.
    fn encode_fl<W: Write>(&self, to: W, value: f32) -> io::Result<()>;

    /// Encode a double precision float value to the given writer.
    fn encode_fd<W: Write>(&self, to: W, value: f64) -> io::Result<()>;

    /// Encode a DICOM attribute tag to the given writer.
    fn encode_tag<W: Write>(&self, mut to: W, tag: Tag) -> io::Result<()> {
        self.encode_us(&mut to, tag.group())?;
        self.encode_us(to, tag.element())
    }
}

impl<'a, T: ?Sized> BasicEncode for &'a T
where
    T: BasicEncode,
{
    fn endianness(&self) -> Endianness {
        (**self).endianness()
    }

    fn encode_us<W: Write>(&self, to: W, value: u16) -> io::Result<()> {
        (**self).encode_us(to, value)
    }

    fn encode_ul<W: Write>(&self, to: W, value: u32) -> io::Result<()> {
        (**self).encode_ul(to, value)
    }

    fn encode_uv<W: Write>(&self, to: W, value: u64) -> io::Result<()> {
        (**self).encode_uv(to, value)
    }

    fn encode_ss<W: Write>(&self, to: W, value: i16) -> io::Result<()> {
        (**self).encode_ss(to, value)
    }

    fn encode_sl<W: Write>(&self, to: W, value: i32) -> io::Result<()> {
        (**self).encode_sl(to, value)
    }

    fn encode_sv<W: Write>(&self, to: W, value: i64) -> io::Result<()> {
        (**self).encode_sv(to, value)
    }

    fn encode_fl<W: Write>(&self, to: W, value: f32) -> io::Result<()> {
        (**self).encode_fl(to, value)
    }

    fn encode_fd<W: Write>(&self, to: W, value: f64) -> io::Result<()> {
        (**self).encode_fd(to, value)
    }
}

/// Type trait for a data element encoder.
pub trait Encode {
    /// The basic encoder for binary values in this transfer syntax.
    type Basic: BasicEncode;

    /// Retrieve the basic encoder for binary values.
    fn basic(&self) -> &Self::Basic;

    /// Encode and write a DICOM attribute tag.
    fn encode_tag<W>(&self, to: &mut W, tag: Tag) -> Result<()>
    where
        W: ?Sized + Write,
    {
        self.basic().encode_tag(to, tag).context(WriteTagSnafu)
    }

    /// Encode and write a data element header to the given destination.
    /// Returns the number of bytes effectively written on success.
    fn encode_element_header<W>(&self, to: &mut W, de: DataElementHeader) -> Result<usize>
    where
        W: ?Sized + Write;

    /// Encode and write a DICOM sequence item header to the given destination.
    fn encode_item_header<W>(&self, to: &mut W, len: u32) -> Result<()>
    where
        W: ?Sized + Write,
    {
        let basic = self.basic();
        basic
            .encode_tag(&mut *to, Tag(0xFFFE, 0xE000))
            .and_then(|_| basic.encode_ul(&mut *to, len))
            .context(WriteItemHeaderSnafu)
    }

    /// Encode and write a DICOM sequence item delimiter to the given destination.
    fn encode_item_delimiter<W>(&self, to: &mut W) -> Result<()>
    where
        W: ?Sized + Write,
    {
        let basic = self.basic();
        basic
            .encode_tag(&mut *to, Tag(0xFFFE, 0xE00D))
            .and_then(|_| basic.encode_ul(&mut *to, 0))
            .context(WriteItemDelimiterSnafu)
    }

    /// Encode and write a DICOM sequence delimiter to the given destination.
    fn encode_sequence_delimiter<W>(&self, to: &mut W) -> Result<()>
    where
        W: ?Sized + Write,
    {
        let basic = self.basic();
        basic
            .encode_tag(&mut *to, Tag(0xFFFE, 0xE0DD))
            .and_then(|_| basic.encode_ul(&mut *to, 0))
            .context(WriteSequenceDelimiterSnafu)
    }

    /// Encode and write a primitive value of the given representation,
    /// including its trailing padding.
    /// Returns the number of bytes written, which is always even.
    fn encode_primitive<W>(&self, to: &mut W, vr: VR, value: &PrimitiveValue) -> Result<usize>
    where
        W: ?Sized + Write,
    {
        write_value(to, vr, value, self.basic())
    }
}

impl<'a, T: ?Sized> Encode for &'a T
where
    T: Encode,
{
    type Basic = T::Basic;

    fn basic(&self) -> &Self::Basic {
        (**self).basic()
    }

    fn encode_element_header<W>(&self, to: &mut W, de: DataElementHeader) -> Result<usize>
    where
        W: ?Sized + Write,
    {
        (**self).encode_element_header(to, de)
    }
}
