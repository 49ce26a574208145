//! This module provides implementations for basic encoders: little endian and big endian.

use super::BasicEncode;
use byteordered::{ByteOrdered, Endianness};
use std::io::{Result, Write};

/// A basic encoder of primitive elements in little endian.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LittleEndianBasicEncoder;

/// A basic encoder of primitive elements in big endian.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BigEndianBasicEncoder;

macro_rules! impl_basic_encode {
    ($t: ty, $endianness: expr, $ctor: ident) => {
        impl BasicEncode for $t {
            fn endianness(&self) -> Endianness {
                $endianness
            }

            fn encode_us<W: Write>(&self, to: W, value: u16) -> Result<()> {
                ByteOrdered::$ctor(to).write_u16(value)
            }

            fn encode_ul<W: Write>(&self, to: W, value: u32) -> Result<()> {
                ByteOrdered::$ctor(to).write_u32(value)
            }

            fn encode_uv<W: Write>(&self, to: W, value: u64) -> Result<()> {
                ByteOrdered::$ctor(to).write_u64(value)
            }

            fn encode_ss<W: Write>(&self, to: W, value: i16) -> Result<()> {
                ByteOrdered::$ctor(to).write_i16(value)
            }

            fn encode_sl<W: Write>(&self, to: W, value: i32) -> Result<()> {
                ByteOrdered::$ctor(to).write_i32(value)
            }

            fn encode_sv<W: Write>(&self, to: W, value: i64) -> Result<()> {
                ByteOrdered::$ctor(to).write_i64(value)
            }

            fn encode_fl<W: Write>(&self, to: W, value: f32) -> Result<()> {
                ByteOrdered::$ctor(to).write_f32(value)
            }

            fn encode_fd<W: Write>(&self, to: W, value: f64) -> Result<()> {
                ByteOrdered::$ctor(to).write_f64(value)
            }
        }
    };
}

impl_basic_encode!(LittleEndianBasicEncoder, Endianness::Little, le);
impl_basic_encode!(BigEndianBasicEncoder, Endianness::Big, be);

/// A basic encoder with support for both Little Endian an Big Endian
/// encoding, decided at run-time. Since only two values are possible,
/// this enum may become more efficient than the use of a trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicEncoder {
    /// Encode in Little Endian
    LE(LittleEndianBasicEncoder),
    /// Encode in Big Endian
    BE(BigEndianBasicEncoder),
}

use self::BasicEncoder::{BE, LE};

impl BasicEncoder {
    /// Create a basic encoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        match endianness {
            Endianness::Little => LE(LittleEndianBasicEncoder),
            Endianness::Big => BE(BigEndianBasicEncoder),
        }
    }
}

impl From<Endianness> for BasicEncoder {
    fn from(endianness: Endianness) -> Self {
        BasicEncoder::new(endianness)
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

impl BasicEncode for BasicEncoder {
    fn endianness(&self) -> Endianness {
        match *self {
            LE(_) => Endianness::Little,
            BE(_) => Endianness::Big,
        }
    }

    fn encode_us<W: Write>(&self, to: W, value: u16) -> Result<()> {
        for_both!(self, |e| e.encode_us(to, value))
    }

    fn encode_ul<W: Write>(&self, to: W, value: u32) -> Result<()> {
        for_both!(self, |e| e.encode_ul(to, value))
    }

    fn encode_uv<W: Write>(&self, to: W, value: u64) -> Result<()> {
        for_both!(self, |e| e.encode_uv(to, value))
    }

    fn encode_ss<W: Write>(&self, to: W, value: i16) -> Result<()> {
        for_both!(self, |e| e.encode_ss(to, value))
    }

    fn encode_sl<W: Write>(&self, to: W, value: i32) -> Result<()> {
        for_both!(self, |e| e.encode_sl(to, value))
    }

    fn encode_sv<W: Write>(&self, to: W, value: i64) -> Result<()> {
        for_both!(self, |e| e.encode_sv(to, value))
    }

    fn encode_fl<W: Write>(&self, to: W, value: f32) -> Result<()> {
        for_both!(self, |e| e.encode_fl(to, value))
    }

    fn encode_fd<W: Write>(&self, to: W, value: f64) -> Result<()> {
        for_both!(self, |e| e.encode_fd(to, value))
    }
}
