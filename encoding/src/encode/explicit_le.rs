//! Explicit VR Little Endian syntax transfer implementation

use crate::encode::basic::LittleEndianBasicEncoder;
use crate::encode::{BasicEncode, Encode, LengthOverflowSnafu, Result, WriteHeaderSnafu};
use dcmnet_core::header::{DataElementHeader, Header};
use snafu::{ensure, ResultExt};
use std::io::Write;

/// A concrete encoder for the transfer syntax ExplicitVRLittleEndian
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRLittleEndianEncoder {
    basic: LittleEndianBasicEncoder,
}

impl Encode for ExplicitVRLittleEndianEncoder {
    type Basic = LittleEndianBasicEncoder;

    fn basic(&self) -> &Self::Basic {
        &self.basic
    }

    fn encode_element_header<W>(&self, to: &mut W, de: DataElementHeader) -> Result<usize>
    where
        W: ?Sized + Write,
    {
        encode_explicit_header(&self.basic, to, de)
    }
}

/// Encode an explicit VR element header with the given byte order.
pub(crate) fn encode_explicit_header<B, W>(
    basic: &B,
    to: &mut W,
    de: DataElementHeader,
) -> Result<usize>
where
    B: BasicEncode,
    W: ?Sized + Write,
{
    let tag = de.tag();
    if tag.group() == 0xFFFE {
        // item headers and delimiters do not have VR or reserved field
        basic
            .encode_tag(&mut *to, tag)
            .and_then(|_| basic.encode_ul(&mut *to, de.len.0))
            .context(WriteHeaderSnafu)?;
        return Ok(8);
    }

    if de.vr.has_long_explicit_length() {
        basic
            .encode_tag(&mut *to, tag)
            .and_then(|_| to.write_all(&de.vr.to_bytes()))
            .and_then(|_| to.write_all(&[0, 0]))
            .and_then(|_| basic.encode_ul(&mut *to, de.len.0))
            .context(WriteHeaderSnafu)?;
        Ok(12)
    } else {
        ensure!(
            de.len.0 <= u32::from(u16::MAX),
            LengthOverflowSnafu {
                tag,
                vr: de.vr,
                len: de.len.0,
            }
        );
        basic
            .encode_tag(&mut *to, tag)
            .and_then(|_| to.write_all(&de.vr.to_bytes()))
            .and_then(|_| basic.encode_us(&mut *to, de.len.0 as u16))
            .context(WriteHeaderSnafu)?;
        Ok(8)
    }
}
