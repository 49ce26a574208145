//! Explicit VR Big Endian syntax transfer implementation.

use crate::decode::basic::BigEndianBasicDecoder;
use crate::decode::explicit_le::decode_explicit_header;
use crate::decode::{item_header_from, BasicDecode, Decode, ReadItemHeaderSnafu, ReadTagSnafu, Result};
use dcmnet_core::header::{DataElementHeader, SequenceItemHeader};
use dcmnet_core::Tag;
use snafu::ResultExt;
use std::io::Read;

/// A data element decoder for the Explicit VR Big Endian transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRBigEndianDecoder {
    basic: BigEndianBasicDecoder,
}

impl Decode for ExplicitVRBigEndianDecoder {
    type Basic = BigEndianBasicDecoder;

    fn basic(&self) -> &Self::Basic {
        &self.basic
    }

    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        decode_explicit_header(&self.basic, source)
    }

    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read,
    {
        let tag = self.basic.decode_tag(&mut *source).context(ReadItemHeaderSnafu)?;
        item_header_from(&self.basic, tag, source)
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        self.basic.decode_tag(source).context(ReadTagSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::ExplicitVRBigEndianDecoder;
    use crate::decode::Decode;
    use dcmnet_core::header::{HasLength, Header, Length, SequenceItemHeader};
    use dcmnet_core::{Tag, VR};
    use std::io::Cursor;

    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x00, 0x28, 0x00, 0x10,     // (0028,0010) (BE) Rows
            b'U', b'S',             // VR: US
            0x00, 0x02,             // Length: 2 bytes (BE)
                0x02, 0x00,         // 512
        0x7F, 0xE0, 0x00, 0x10,     // (7FE0,0010) (BE) Pixel Data
            b'O', b'W',             // VR: OW
            0x00, 0x00,             // Reserved
            0x00, 0x00, 0x00, 0x04, // Length: 4 bytes (BE)
                0x00, 0x01, 0x00, 0x02,
        0xFF, 0xFE, 0xE0, 0x00,     // Item
            0x00, 0x00, 0x00, 0x0A, // Length: 10 bytes (BE)
    ];

    #[test]
    fn decode_data_elements() {
        let dec = ExplicitVRBigEndianDecoder::default();
        let mut cursor = Cursor::new(RAW);

        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x0028, 0x0010));
        assert_eq!(elem.vr(), VR::US);
        assert_eq!(elem.length(), Length(2));
        assert_eq!(bytes_read, 8);
        cursor.set_position(cursor.position() + 2);

        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x7FE0, 0x0010));
        assert_eq!(elem.vr(), VR::OW);
        assert_eq!(elem.length(), Length(4));
        assert_eq!(bytes_read, 12);
        cursor.set_position(cursor.position() + 4);

        assert_eq!(
            dec.decode_item_header(&mut cursor).unwrap(),
            SequenceItemHeader::Item { len: Length(10) }
        );
    }
}
