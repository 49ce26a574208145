//! Implicit VR Little Endian syntax transfer implementation

use crate::encode::basic::LittleEndianBasicEncoder;
use crate::encode::{BasicEncode, Encode, Result, WriteHeaderSnafu};
use dcmnet_core::header::{DataElementHeader, Header};
use snafu::ResultExt;
use std::io::Write;

/// A concrete encoder for the transfer syntax ImplicitVRLittleEndian
#[derive(Debug, Default, Clone)]
pub struct ImplicitVRLittleEndianEncoder {
    basic: LittleEndianBasicEncoder,
}

impl Encode for ImplicitVRLittleEndianEncoder {
    type Basic = LittleEndianBasicEncoder;

    fn basic(&self) -> &Self::Basic {
        &self.basic
    }

    fn encode_element_header<W>(&self, to: &mut W, de: DataElementHeader) -> Result<usize>
    where
        W: ?Sized + Write,
    {
        self.basic
            .encode_tag(&mut *to, de.tag())
            .and_then(|_| self.basic.encode_ul(&mut *to, de.len.0))
            .context(WriteHeaderSnafu)?;
        Ok(8)
    }
}
