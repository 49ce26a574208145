//! This module provides implementations for primitive decoders of data, which
//! may be in either Little Endian or Big Endian.

use super::BasicDecode;
use byteordered::{ByteOrdered, Endianness};
use std::io::{Read, Result};

/// A basic decoder of DICOM primitive elements in little endian.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct LittleEndianBasicDecoder;

/// A basic decoder of DICOM primitive elements in big endian.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct BigEndianBasicDecoder;

macro_rules! impl_basic_decode {
    ($t: ty, $endianness: expr, $ctor: ident) => {
        impl BasicDecode for $t {
            fn endianness(&self) -> Endianness {
                $endianness
            }

            fn decode_us<S: Read>(&self, source: S) -> Result<u16> {
                ByteOrdered::$ctor(source).read_u16()
            }

            fn decode_ul<S: Read>(&self, source: S) -> Result<u32> {
                ByteOrdered::$ctor(source).read_u32()
            }

            fn decode_uv<S: Read>(&self, source: S) -> Result<u64> {
                ByteOrdered::$ctor(source).read_u64()
            }

            fn decode_ss<S: Read>(&self, source: S) -> Result<i16> {
                ByteOrdered::$ctor(source).read_i16()
            }

            fn decode_sl<S: Read>(&self, source: S) -> Result<i32> {
                ByteOrdered::$ctor(source).read_i32()
            }

            fn decode_sv<S: Read>(&self, source: S) -> Result<i64> {
                ByteOrdered::$ctor(source).read_i64()
            }

            fn decode_fl<S: Read>(&self, source: S) -> Result<f32> {
                ByteOrdered::$ctor(source).read_f32()
            }

            fn decode_fd<S: Read>(&self, source: S) -> Result<f64> {
                ByteOrdered::$ctor(source).read_f64()
            }
        }
    };
}

impl_basic_decode!(LittleEndianBasicDecoder, Endianness::Little, le);
impl_basic_decode!(BigEndianBasicDecoder, Endianness::Big, be);

/// A basic decoder with support for both Little Endian an Big Endian
/// encoding, decided at run-time. Since only two values are possible,
/// this enum may become more efficient than the use of a trait object.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BasicDecoder {
    /// Decode in Little Endian
    LE(LittleEndianBasicDecoder),
    /// Decode in Big Endian
    BE(BigEndianBasicDecoder),
}

use self::BasicDecoder::{BE, LE};

impl BasicDecoder {
    /// Create a basic decoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        match endianness {
            Endianness::Little => LE(LittleEndianBasicDecoder),
            Endianness::Big => BE(BigEndianBasicDecoder),
        }
    }
}

impl From<Endianness> for BasicDecoder {
    fn from(endianness: Endianness) -> Self {
        BasicDecoder::new(endianness)
    }
}

macro_rules! for_both {
    ($s: expr, |$e: ident| $f: expr) => {
        match *$s {
            LE(ref $e) => $f,
            BE(ref $e) => $f,
        }
    };
}

impl BasicDecode for BasicDecoder {
    fn endianness(&self) -> Endianness {
        match *self {
            LE(_) => Endianness::Little,
            BE(_) => Endianness::Big,
        }
    }

    fn decode_us<S: Read>(&self, source: S) -> Result<u16> {
        for_both!(self, |e| e.decode_us(source))
    }

    fn decode_ul<S: Read>(&self, source: S) -> Result<u32> {
        for_both!(self, |e| e.decode_ul(source))
    }

    fn decode_uv<S: Read>(&self, source: S) -> Result<u64> {
        for_both!(self, |e| e.decode_uv(source))
    }

    fn decode_ss<S: Read>(&self, source: S) -> Result<i16> {
        for_both!(self, |e| e.decode_ss(source))
    }

    fn decode_sl<S: Read>(&self, source: S) -> Result<i32> {
        for_both!(self, |e| e.decode_sl(source))
    }

    fn decode_sv<S: Read>(&self, source: S) -> Result<i64> {
        for_both!(self, |e| e.decode_sv(source))
    }

    fn decode_fl<S: Read>(&self, source: S) -> Result<f32> {
        for_both!(self, |e| e.decode_fl(source))
    }

    fn decode_fd<S: Read>(&self, source: S) -> Result<f64> {
        for_both!(self, |e| e.decode_fd(source))
    }
}
