//! This module contains all DICOM data element decoding logic.

use byteordered::Endianness;
use dcmnet_core::header::{DataElementHeader, SequenceItemHeader, SequenceItemHeaderError};
use dcmnet_core::{Tag, VR};
use snafu::{Backtrace, Snafu};
use std::io::{self, Read};

pub mod basic;
pub mod explicit_be;
pub mod explicit_le;
pub mod implicit_le;
pub mod value;

pub use self::basic::BasicDecoder;
pub use self::value::read_value;

/// Module-level error type:
/// for errors which may occur while decoding DICOM data.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to read the beginning (tag) of the header"))]
    ReadHeaderTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the item header"))]
    ReadItemHeader {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's item length field"))]
    ReadItemLength {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's tag field"))]
    ReadTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's reserved bytes"))]
    ReadReserved {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's element length field"))]
    ReadLength {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's value representation"))]
    ReadVr {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Bad sequence item header"))]
    BadSequenceHeader { source: SequenceItemHeaderError },
    #[snafu(display("Failed to read {} value data of {} bytes", vr, len))]
    ReadValueData {
        vr: VR,
        len: u32,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Cannot read a primitive value of undefined length for {}", tag))]
    UndefinedValueLength { tag: Tag, backtrace: Backtrace },
    #[snafu(display("Element {} is a sequence, not a primitive value", tag))]
    NonPrimitiveValue { tag: Tag, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Type trait for reading and decoding basic data values from a data source.
///
/// This trait aims to provide methods for reading binary numbers based on the
/// source's endianness.
pub trait BasicDecode {
    /// Retrieve the source's endianness, as expected by this decoder.
    fn endianness(&self) -> Endianness;

    /// Decode an unsigned short value from the given source.
    fn decode_us<S>(&self, source: S) -> io::Result<u16>
    where
        S: Read;

    /// Decode an unsigned long value from the given source.
    fn decode_ul<S>(&self, source: S) -> io::Result<u32>
    where
        S: Read;

    /// Decode an unsigned very long value from the given source.
    fn decode_uv<S>(&self, source: S) -> io::Result<u64>
    where
        S: Read;

    /// Decode a signed short value from the given source.
    fn decode_ss<S>(&self, source: S) -> io::Result<i16>
    where
        S: Read;

    /// Decode a signed long value from the given source.
    fn decode_sl<S>(&self, source: S) -> io::Result<i32>
    where
        S: Read;

    /// Decode a signed very long value from the given source.
    fn decode_sv<S>(&self, source: S) -> io::Result<i64>
    where
        S: Read;

    /// Decode a single precision float value from the given source.
    fn decode_fl<S>(&self, source: S) -> io::Result<f32>
    where
        S: Read;

    /// Decode a double precision float value from the given source.
    fn decode_fd<S>(&self, source: S) -> io::Result<f64>
    where
        S: Read;

    /// Decode a DICOM attribute tag from the given source.
    fn decode_tag<S>(&self, mut source: S) -> io::Result<Tag>
    where
        S: Read,
    {
        let g = self.decode_us(&mut source)?;
        let e = self.decode_us(source)?;
        Ok(Tag(g, e))
    }
}

impl<'a, T: ?Sized> BasicDecode for &'a T
where
    T: BasicDecode,
{
    fn endianness(&self) -> Endianness {
        (**self).endianness()
    }

    fn decode_us<S: Read>(&self, source: S) -> io::Result<u16> {
        (**self).decode_us(source)
    }

    fn decode_ul<S: Read>(&self, source: S) -> io::Result<u32> {
        (**self).decode_ul(source)
    }

    fn decode_uv<S: Read>(&self, source: S) -> io::Result<u64> {
        (**self).decode_uv(source)
    }

    fn decode_ss<S: Read>(&self, source: S) -> io::Result<i16> {
        (**self).decode_ss(source)
    }

    fn decode_sl<S: Read>(&self, source: S) -> io::Result<i32> {
        (**self).decode_sl(source)
    }

    fn decode_sv<S: Read>(&self, source: S) -> io::Result<i64> {
        (**self).decode_sv(source)
    }

    fn decode_fl<S: Read>(&self, source: S) -> io::Result<f32> {
        (**self).decode_fl(source)
    }

    fn decode_fd<S: Read>(&self, source: S) -> io::Result<f64> {
        (**self).decode_fd(source)
    }
}

/** Type trait for reading and decoding DICOM data elements.
 *
 * The specific behaviour of decoding, even when abstracted from the original source,
 * may depend on the transfer syntax.
 */
pub trait Decode {
    /// The basic decoder for binary values in this transfer syntax.
    type Basic: BasicDecode;

    /// Retrieve the basic decoder for binary values.
    fn basic(&self) -> &Self::Basic;

    /** Fetch and decode the next data element header from the given source.
     * This method returns only the header of the element. At the end of this operation, the source
     * will be pointing at the element's value data, which should be read or skipped as necessary.
     *
     * Decoding an item or sequence delimiter is considered valid, and so should be properly handled
     * by the decoder. The value representation in this case should be `UN`.
     *
     * Returns the expected header and the exact number of bytes read from the source.
     */
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read;

    /** Fetch and decode the next sequence item head from the given source. It is a separate method
     * because value representation is always implicit when reading item headers and delimiters.
     * This method returns only the header of the item. At the end of this operation, the source
     * will be pointing at the beginning of the item's data, which should be traversed if necessary.
     */
    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read;

    /// Decode a DICOM attribute tag from the given source.
    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read;
}

impl<'a, T: ?Sized> Decode for &'a T
where
    T: Decode,
{
    type Basic = T::Basic;

    fn basic(&self) -> &Self::Basic {
        (**self).basic()
    }

    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        (**self).decode_header(source)
    }

    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read,
    {
        (**self).decode_item_header(source)
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        (**self).decode_tag(source)
    }
}

/// Read the 4-byte length following a tag in group FFFE,
/// and build the corresponding item header.
pub(crate) fn item_header_from<B, S>(basic: &B, tag: Tag, source: &mut S) -> Result<SequenceItemHeader>
where
    B: BasicDecode,
    S: ?Sized + Read,
{
    use snafu::ResultExt;
    let len = basic.decode_ul(source).context(ReadItemLengthSnafu)?;
    SequenceItemHeader::new(tag, dcmnet_core::Length(len)).context(BadSequenceHeaderSnafu)
}
