//! Explicit VR Little Endian syntax transfer implementation

use crate::decode::basic::LittleEndianBasicDecoder;
use crate::decode::{
    item_header_from, BasicDecode, Decode, ReadHeaderTagSnafu, ReadItemHeaderSnafu,
    ReadLengthSnafu, ReadReservedSnafu, ReadTagSnafu, ReadVrSnafu, Result,
};
use dcmnet_core::header::{DataElementHeader, Length, SequenceItemHeader};
use dcmnet_core::{Tag, VR};
use snafu::ResultExt;
use std::io::Read;

/// A data element decoder for the Explicit VR Little Endian transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRLittleEndianDecoder {
    basic: LittleEndianBasicDecoder,
}

impl Decode for ExplicitVRLittleEndianDecoder {
    type Basic = LittleEndianBasicDecoder;

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

/// Decode an explicit VR element header with the given byte order.
pub(crate) fn decode_explicit_header<B, S>(
    basic: &B,
    source: &mut S,
) -> Result<(DataElementHeader, usize)>
where
    B: BasicDecode,
    S: ?Sized + Read,
{
    // retrieve tag
    let tag = basic.decode_tag(&mut *source).context(ReadHeaderTagSnafu)?;

    if tag.group() == 0xFFFE {
        // item delimiters do not have VR or reserved field
        let len = basic.decode_ul(&mut *source).context(ReadLengthSnafu)?;
        return Ok((DataElementHeader::new(tag, VR::UN, Length(len)), 8));
    }

    // retrieve explicit VR
    let mut buf = [0u8; 2];
    source.read_exact(&mut buf).context(ReadVrSnafu)?;
    let vr = VR::from_binary(buf).unwrap_or_else(|| {
        tracing::warn!(
            "Unrecognized value representation {:02X}{:02X} at {}, reading as UN",
            buf[0],
            buf[1],
            tag
        );
        VR::UN
    });

    // retrieve data length
    if vr.has_long_explicit_length() {
        // 2 reserved bytes, then 4 bytes for data length
        source.read_exact(&mut buf).context(ReadReservedSnafu)?;
        let len = Length(basic.decode_ul(&mut *source).context(ReadLengthSnafu)?);
        // UN of undefined length holds an implicit VR sequence,
        // except for encapsulated pixel data
        let vr = if vr == VR::UN && len.is_undefined() && tag != Tag(0x7FE0, 0x0010) {
            VR::SQ
        } else {
            vr
        };
        Ok((DataElementHeader::new(tag, vr, len), 12))
    } else {
        let len = basic.decode_us(&mut *source).context(ReadLengthSnafu)?;
        Ok((DataElementHeader::new(tag, vr, Length(u32::from(len))), 8))
    }
}

#[cfg(test)]
mod tests {
    use super::ExplicitVRLittleEndianDecoder;
    use crate::decode::Decode;
    use dcmnet_core::header::{HasLength, Header, Length, SequenceItemHeader};
    use dcmnet_core::{Tag, VR};
    use std::io::{Cursor, Read};

    // manually crafting some DICOM data elements
    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x02, 0x00, 0x02, 0x00,     // (0002,0002) (LE) Media Storage SOP Class UID
            b'U', b'I',             // VR: UI (UID)
            0x1A, 0x00,             // Length: 26 bytes (LE)
                // UID: 1.2.840.10008.5.1.4.1.1.1
                b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0', b'0', b'0', b'8', b'.',
                b'5', b'.', b'1', b'.', b'4', b'.', b'1', b'.', b'1', b'.', b'1',
                0x00,               // Padding to make length even
        0x02, 0x00, 0x10, 0x00,     // (0002,0010) (LE) Transfer Syntax UID
            b'U', b'I',             // VR: UI (UID)
            0x14, 0x00,             // Length: 20 bytes (LE)
                // UID: 1.2.840.10008.1.2.1 (ExplicitVRLittleEndian)
                b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0', b'0', b'0', b'8', b'.',
                b'1', b'.', b'2', b'.', b'1',
                0x00,               // Padding to make length even
        0x08, 0x00, 0x1B, 0x04,     // (0008,041B) (LE) RecordKey
            b'O', b'B',             // VR: OB (Other Byte)
            0x00, 0x00,             // Reserved, always 0
            0x02, 0x00, 0x00, 0x00, // Length: 2 bytes (LE)
                0x12, 0x34,
    ];

    #[test]
    fn decode_data_elements() {
        let dec = ExplicitVRLittleEndianDecoder::default();
        let mut cursor = Cursor::new(RAW);
        {
            let (elem, bytes_read) = dec
                .decode_header(&mut cursor)
                .expect("should find an element");
            assert_eq!(elem.tag(), Tag(2, 2));
            assert_eq!(elem.vr(), VR::UI);
            assert_eq!(elem.length(), Length(26));
            assert_eq!(bytes_read, 8);
            // skip value
            cursor.set_position(cursor.position() + 26);
        }
        {
            let (elem, bytes_read) = dec
                .decode_header(&mut cursor)
                .expect("should find an element");
            assert_eq!(elem.tag(), Tag(2, 16));
            assert_eq!(elem.vr(), VR::UI);
            assert_eq!(elem.length(), Length(20));
            assert_eq!(bytes_read, 8);
            cursor.set_position(cursor.position() + 20);
        }
        {
            let (elem, bytes_read) = dec
                .decode_header(&mut cursor)
                .expect("should find an element");
            assert_eq!(elem.tag(), Tag(0x0008, 0x041B));
            assert_eq!(elem.vr(), VR::OB);
            assert_eq!(elem.length(), Length(2));
            assert_eq!(bytes_read, 12);
            let mut value = [0u8; 2];
            cursor.read_exact(&mut value).unwrap();
            assert_eq!(value, [0x12, 0x34]);
        }
    }

    #[test]
    fn unknown_vr_reads_as_un() {
        #[rustfmt::skip]
        let raw: &[u8] = &[
            0x09, 0x00, 0x10, 0x10, // (0009,1010)
            b'Z', b'Z',             // unknown VR
            0x00, 0x00,             // reserved
            0x02, 0x00, 0x00, 0x00, // Length: 2
            0xAB, 0xCD,
        ];
        let dec = ExplicitVRLittleEndianDecoder::default();
        let mut cursor = Cursor::new(raw);
        let (header, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(header.vr(), VR::UN);
        assert_eq!(header.length(), Length(2));
        assert_eq!(bytes_read, 12);
    }

    #[rustfmt::skip]
    const RAW_SEQUENCE_ITEMS: &[u8] = &[
        0x08, 0x00, 0x3F, 0x10, // (0008,103F) SeriesDescriptionCodeSequence
        b'S', b'Q',             // VR: SQ
        0x00, 0x00,             // reserved
        0xFF, 0xFF, 0xFF, 0xFF, // length: undefined
        // -- 12 --
        0xFE, 0xFF, 0x00, 0xE0, // item start tag
        0xFF, 0xFF, 0xFF, 0xFF, // item length: undefined
        // -- 20 --
        0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00, // item end
        // -- 28 --
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00, // sequence end
    ];

    #[test]
    fn decode_items() {
        let dec = ExplicitVRLittleEndianDecoder::default();
        let mut cursor = Cursor::new(RAW_SEQUENCE_ITEMS);
        {
            let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
            assert_eq!(elem.tag(), Tag(0x0008, 0x103F));
            assert_eq!(elem.vr(), VR::SQ);
            assert!(elem.length().is_undefined());
            assert_eq!(bytes_read, 12);
        }
        assert!(matches!(
            dec.decode_item_header(&mut cursor).unwrap(),
            SequenceItemHeader::Item { len } if len.is_undefined()
        ));
        assert_eq!(
            dec.decode_item_header(&mut cursor).unwrap(),
            SequenceItemHeader::ItemDelimiter
        );
        // a delimiter read as a regular header carries no VR
        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0xFFFE, 0xE0DD));
        assert_eq!(elem.vr(), VR::UN);
        assert_eq!(bytes_read, 8);
    }
}
