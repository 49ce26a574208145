//! Explicit VR Big Endian syntax transfer implementation

use crate::encode::basic::BigEndianBasicEncoder;
use crate::encode::explicit_le::encode_explicit_header;
use crate::encode::{Encode, Result};
use dcmnet_core::header::DataElementHeader;
use std::io::Write;

/// A concrete encoder for the transfer syntax ExplicitVRBigEndian
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRBigEndianEncoder {
    basic: BigEndianBasicEncoder,
}

impl Encode for ExplicitVRBigEndianEncoder {
    type Basic = BigEndianBasicEncoder;

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
