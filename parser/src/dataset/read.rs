//! This module contains a mid-level abstraction for reading DICOM content
//! sequentially.
//!
//! The rest of the crate is used to obtain DICOM element headers and values.
//! At this level, headers and values are treated as tokens which can be used
//! to form a syntax tree of a full data set.
use crate::dataset::{DataToken, SeqTokenType};
use dcmnet_core::dictionary::DataDictionary;
use dcmnet_core::header::{DataElementHeader, HasLength, Header, Length, SequenceItemHeader};
use dcmnet_core::{Tag, VR};
use dcmnet_encoding::decode::{self, Decode};
use dcmnet_encoding::transfer_syntax::{SyntaxDecoder, TransferSyntax};
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::{ErrorKind, Read};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not read element header at {}", position))]
    ReadHeader {
        position: u64,
        #[snafu(backtrace)]
        source: decode::Error,
    },
    #[snafu(display("Could not read item header at {}", position))]
    ReadItemHeader {
        position: u64,
        #[snafu(backtrace)]
        source: decode::Error,
    },
    #[snafu(display("Could not read value of {} at {}", tag, position))]
    ReadValue {
        tag: Tag,
        position: u64,
        #[snafu(backtrace)]
        source: decode::Error,
    },
    #[snafu(display("Data set ended inside a sequence or item at {}", position))]
    PrematureEnd { position: u64, backtrace: Backtrace },
    #[snafu(display("Unexpected item header outside a sequence at {}", position))]
    UnexpectedItemHeader { position: u64, backtrace: Backtrace },
    #[snafu(display(
        "Inconsistent sequence end: expected end at {} bytes but read {}",
        end_of_sequence,
        bytes_read
    ))]
    InconsistentSequenceEnd {
        end_of_sequence: u64,
        bytes_read: u64,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An open sequence or item, as tracked by the reader.
#[derive(Debug)]
struct SeqToken {
    /// Whether it is the start of a sequence or the start of an item.
    typ: SeqTokenType,
    /// The length of the value, as indicated by the starting element,
    /// can be unknown.
    len: Length,
    /// Whether this sequence holds encapsulated pixel data fragments.
    pixel_data: bool,
    /// The number of bytes the reader had consumed
    /// when the sequence or item started.
    base_offset: u64,
}

/// A higher-level reader for retrieving structure in a DICOM data set from an
/// arbitrary data source.
///
/// The reader is an iterator of [`DataToken`]s.
/// Iteration stops on the first error,
/// or when the source ends cleanly in between elements.
#[derive(Debug)]
pub struct DataSetReader<S, D = SyntaxDecoder> {
    source: S,
    decoder: D,
    /// the number of bytes consumed from the source
    position: u64,
    /// the open sequences and items, innermost last
    seq_delimiters: Vec<SeqToken>,
    /// fuse the iteration process if true
    hard_break: bool,
    /// whether a check for a sequence or item delimitation is pending
    delimiter_check_pending: bool,
    /// the header of a primitive element whose value comes next
    last_header: Option<DataElementHeader>,
}

impl<S> DataSetReader<S> {
    /// Create a new data set reader for the given transfer syntax,
    /// resolving implicit value representations with the standard dictionary.
    pub fn new_with_ts(source: S, ts: &TransferSyntax) -> Self {
        DataSetReader::new(source, ts.decoder())
    }
}

impl<S, Dict> DataSetReader<S, SyntaxDecoder<Dict>>
where
    Dict: DataDictionary,
{
    /// Create a new data set reader for the given transfer syntax,
    /// resolving implicit value representations with the given dictionary.
    pub fn new_with_ts_dict(source: S, ts: &TransferSyntax, dict: Dict) -> Self {
        DataSetReader::new(source, ts.decoder_with_dict(dict))
    }
}

impl<S, D> DataSetReader<S, D> {
    /// Create a new data set reader with the given element decoder.
    pub fn new(source: S, decoder: D) -> Self {
        DataSetReader {
            source,
            decoder,
            position: 0,
            seq_delimiters: Vec::new(),
            hard_break: false,
            delimiter_check_pending: false,
            last_header: None,
        }
    }

    /// Retrieve the number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Recover the inner source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S, D> Iterator for DataSetReader<S, D>
where
    S: Read,
    D: Decode,
{
    type Item = Result<DataToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.hard_break {
            return None;
        }

        // item or sequence ends of defined length are detected by position
        if self.delimiter_check_pending {
            match self.update_seq_delimiters() {
                Err(e) => {
                    self.hard_break = true;
                    return Some(Err(e));
                }
                Ok(Some(token)) => return Some(Ok(token)),
                Ok(None) => { /* no-op */ }
            }
        }

        if let Some(header) = self.last_header.take() {
            return Some(self.read_value(&header));
        }

        loop {
            let in_sequence = matches!(
                self.seq_delimiters.last(),
                Some(SeqToken {
                    typ: SeqTokenType::Sequence,
                    ..
                })
            );

            let token = if in_sequence {
                self.next_in_sequence()
            } else {
                self.next_element()
            };

            match token {
                Ok(Some(token)) => return Some(Ok(token)),
                // skipped a stray delimiter
                Ok(None) if !self.hard_break => continue,
                Ok(None) => return None,
                Err(e) => {
                    self.hard_break = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<S, D> DataSetReader<S, D>
where
    S: Read,
    D: Decode,
{
    /// Read what comes next inside a sequence:
    /// an item header or the sequence delimiter.
    fn next_in_sequence(&mut self) -> Result<Option<DataToken>> {
        let position = self.position;
        let header = match self.decoder.decode_item_header(&mut self.source) {
            Ok(header) => header,
            Err(decode::Error::ReadItemHeader { source, .. })
                if source.kind() == ErrorKind::UnexpectedEof =>
            {
                return PrematureEndSnafu { position }.fail();
            }
            Err(e) => return Err(e).context(ReadItemHeaderSnafu { position }),
        };
        self.position += 8;

        match header {
            SequenceItemHeader::Item { len } => {
                let pixel_data = self
                    .seq_delimiters
                    .last()
                    .map(|t| t.pixel_data)
                    .unwrap_or(false);
                self.push_sequence_token(SeqTokenType::Item, len, pixel_data);
                if pixel_data {
                    // fragments are raw bytes, read as a single value
                    self.last_header = Some(DataElementHeader::new(Tag(0xFFFE, 0xE000), VR::OB, len));
                } else {
                    self.delimiter_check_pending = true;
                }
                Ok(Some(DataToken::ItemStart { len }))
            }
            SequenceItemHeader::SequenceDelimiter => {
                self.seq_delimiters.pop();
                self.delimiter_check_pending = true;
                Ok(Some(DataToken::SequenceEnd))
            }
            SequenceItemHeader::ItemDelimiter => {
                tracing::warn!("Ignoring stray item delimiter at {} in sequence", position);
                Ok(None)
            }
        }
    }

    /// Read what comes next inside an item or at the top level:
    /// an element header or the item delimiter.
    ///
    /// Returns `Ok(None)` and fuses the reader
    /// if the source ended at the top level.
    fn next_element(&mut self) -> Result<Option<DataToken>> {
        let position = self.position;
        let (header, bytes_read) = match self.decoder.decode_header(&mut self.source) {
            Ok(header) => header,
            Err(decode::Error::ReadHeaderTag { source, .. })
                if source.kind() == ErrorKind::UnexpectedEof && self.seq_delimiters.is_empty() =>
            {
                // the data set ended
                self.hard_break = true;
                return Ok(None);
            }
            Err(decode::Error::ReadHeaderTag { source, .. })
                if source.kind() == ErrorKind::UnexpectedEof =>
            {
                return PrematureEndSnafu { position }.fail();
            }
            Err(e) => return Err(e).context(ReadHeaderSnafu { position }),
        };
        self.position += bytes_read as u64;

        match header.tag() {
            Tag(0xFFFE, 0xE00D) => {
                if let Some(SeqToken {
                    typ: SeqTokenType::Item,
                    ..
                }) = self.seq_delimiters.last()
                {
                    self.seq_delimiters.pop();
                    self.delimiter_check_pending = true;
                    Ok(Some(DataToken::ItemEnd))
                } else {
                    tracing::warn!("Ignoring stray item delimiter at {}", position);
                    Ok(None)
                }
            }
            Tag(0xFFFE, 0xE0DD) => {
                tracing::warn!("Ignoring stray sequence delimiter at {}", position);
                Ok(None)
            }
            Tag(0xFFFE, 0xE000) => UnexpectedItemHeaderSnafu { position }.fail(),
            tag if header.vr() == VR::SQ => {
                self.push_sequence_token(SeqTokenType::Sequence, header.length(), false);
                self.delimiter_check_pending = true;
                Ok(Some(DataToken::SequenceStart {
                    tag,
                    len: header.length(),
                }))
            }
            tag if header.length().is_undefined() => {
                // encapsulated pixel data
                self.push_sequence_token(SeqTokenType::Sequence, header.length(), true);
                Ok(Some(DataToken::SequenceStart {
                    tag,
                    len: header.length(),
                }))
            }
            _ => {
                self.last_header = Some(header);
                Ok(Some(DataToken::ElementHeader(header)))
            }
        }
    }

    fn read_value(&mut self, header: &DataElementHeader) -> Result<DataToken> {
        let position = self.position;
        let value = decode::read_value(&mut self.source, header, self.decoder.basic())
            .context(ReadValueSnafu {
                tag: header.tag(),
                position,
            });
        match value {
            Ok(value) => {
                self.position += u64::from(header.length().get().unwrap_or(0));
                self.delimiter_check_pending = true;
                Ok(DataToken::PrimitiveValue(value))
            }
            Err(e) => {
                self.hard_break = true;
                Err(e)
            }
        }
    }

    /// Check whether the innermost sequence or item of defined length
    /// has reached its end, popping it if so.
    ///
    /// Only one container is closed per call,
    /// so that each end is reported as its own token.
    fn update_seq_delimiters(&mut self) -> Result<Option<DataToken>> {
        if let Some(sd) = self.seq_delimiters.last() {
            if let Some(len) = sd.len.get() {
                let end_of_sequence = sd.base_offset + u64::from(len);
                let bytes_read = self.position;
                match end_of_sequence.cmp(&bytes_read) {
                    std::cmp::Ordering::Equal => {
                        let token = match sd.typ {
                            SeqTokenType::Sequence => DataToken::SequenceEnd,
                            SeqTokenType::Item => DataToken::ItemEnd,
                        };
                        self.seq_delimiters.pop();
                        // the parent may end at the same position
                        return Ok(Some(token));
                    }
                    std::cmp::Ordering::Less => {
                        return InconsistentSequenceEndSnafu {
                            end_of_sequence,
                            bytes_read,
                        }
                        .fail();
                    }
                    std::cmp::Ordering::Greater => { /* continue reading */ }
                }
            }
        }
        self.delimiter_check_pending = false;
        Ok(None)
    }

    fn push_sequence_token(&mut self, typ: SeqTokenType, len: Length, pixel_data: bool) {
        self.seq_delimiters.push(SeqToken {
            typ,
            len,
            pixel_data,
            base_offset: self.position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSetReader, DataToken, Error};
    use dcmnet_core::dictionary::StubDataDictionary;
    use dcmnet_core::header::{DataElementHeader, Length};
    use dcmnet_core::value::PrimitiveValue;
    use dcmnet_core::{dicom_value, Tag, VR};
    use dcmnet_encoding::transfer_syntax::{
        TransferSyntax, EXPLICIT_VR_BIG_ENDIAN, EXPLICIT_VR_LITTLE_ENDIAN,
        IMPLICIT_VR_LITTLE_ENDIAN,
    };

    fn validate_dataset_reader<I>(data: &[u8], ts: &TransferSyntax, ground_truth: I)
    where
        I: IntoIterator<Item = DataToken>,
    {
        let mut dset_reader = DataSetReader::new_with_ts(data, ts);

        let iter = (&mut dset_reader).into_iter();
        let mut ground_truth = ground_truth.into_iter();

        while let Some(gt_token) = ground_truth.next() {
            let token = iter
                .next()
                .expect("expecting more tokens from reader")
                .expect("should fetch the next token without an error");
            assert_eq!(
                token, gt_token,
                "Got token {:2?} ; but expected {:2?}",
                token, gt_token
            );
        }

        let extra: Vec<_> = iter.collect();
        assert_eq!(
            extra.len(), // we have already read all of them
            0,
            "extraneous tokens remaining: {:?}",
            extra,
        );
        assert_eq!(
            dset_reader.position(),
            data.len() as u64,
            "Reader position did not match end of data",
        );
    }

    fn header(tag: (u16, u16), vr: VR, len: u32) -> DataToken {
        DataToken::ElementHeader(DataElementHeader::new(tag, vr, Length(len)))
    }

    #[test]
    fn read_sequence_explicit() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x18, 0x00, 0x11, 0x60, // sequence tag: (0018,6011) SequenceOfUltrasoundRegions
            b'S', b'Q', // VR
            0x00, 0x00, // reserved
            0x2e, 0x00, 0x00, 0x00, // length: 28 + 18 = 46 (#= 2)
            // -- 12 --
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0x14, 0x00, 0x00, 0x00, // item length: 20 (#= 2)
            // -- 20 --
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00, // (0018, 6012) RegionSpatialformat, len = 2, value = 1
            // -- 30 --
            0x18, 0x00, 0x14, 0x60, b'U', b'S', 0x02, 0x00, 0x02, 0x00, // (0018, 6014) RegionDataType, len = 2, value = 2
            // -- 40 --
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0x0a, 0x00, 0x00, 0x00, // item length: 10 (#= 1)
            // -- 48 --
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x04, 0x00, // (0018, 6012) RegionSpatialformat, len = 2, value = 4
            // -- 58 --
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, // (0020,4000) ImageComments, len = 4
            b'T', b'E', b'S', b'T', // value = "TEST"
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0018, 0x6011),
                len: Length(46),
            },
            DataToken::ItemStart { len: Length(20) },
            header((0x0018, 0x6012), VR::US, 2),
            DataToken::PrimitiveValue(dicom_value!(U16, [1])),
            header((0x0018, 0x6014), VR::US, 2),
            DataToken::PrimitiveValue(dicom_value!(U16, [2])),
            DataToken::ItemEnd,
            DataToken::ItemStart { len: Length(10) },
            header((0x0018, 0x6012), VR::US, 2),
            DataToken::PrimitiveValue(dicom_value!(U16, [4])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            header((0x0020, 0x4000), VR::LT, 4),
            DataToken::PrimitiveValue(PrimitiveValue::Str("TEST".into())),
        ];

        validate_dataset_reader(DATA, &EXPLICIT_VR_LITTLE_ENDIAN, ground_truth);
    }

    #[test]
    fn read_sequence_explicit_2() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            // SequenceStart: (0008,2218) ; len = 54 (#=3)
            0x08, 0x00, 0x18, 0x22, b'S', b'Q', 0x00, 0x00, 0x36, 0x00, 0x00, 0x00,
            // -- 12, --
            // ItemStart: len = 46
            0xfe, 0xff, 0x00, 0xe0, 0x2e, 0x00, 0x00, 0x00,
            // -- 20, --
            // ElementHeader: (0008,0100) CodeValue; len = 8
            0x08, 0x00, 0x00, 0x01, b'S', b'H', 0x08, 0x00, // PrimitiveValue
            0x54, 0x2d, 0x44, 0x31, 0x32, 0x31, 0x33, b' ',
            // -- 36, --
            // ElementHeader: (0008,0102) CodingSchemeDesignator; len = 4
            0x08, 0x00, 0x02, 0x01, b'S', b'H', 0x04, 0x00, // PrimitiveValue
            0x53, 0x52, 0x54, b' ',
            // -- 48, --
            // (0008,0104) CodeMeaning; len = 10
            0x08, 0x00, 0x04, 0x01, b'L', b'O', 0x0a, 0x00, // PrimitiveValue
            0x4a, 0x61, 0x77, b' ', 0x72, 0x65, 0x67, 0x69, 0x6f, 0x6e,
            // -- 66 --
            // SequenceStart: (0040,0555) AcquisitionContextSequence; len = 0
            0x40, 0x00, 0x55, 0x05, b'S', b'Q', 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // ElementHeader: (2050,0020) PresentationLUTShape; len = 8
            0x50, 0x20, 0x20, 0x00, b'C', b'S', 0x08, 0x00, // PrimitiveValue
            b'I', b'D', b'E', b'N', b'T', b'I', b'T', b'Y',
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x2218),
                len: Length(54),
            },
            DataToken::ItemStart { len: Length(46) },
            header((0x0008, 0x0100), VR::SH, 8),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["T-D1213"])),
            header((0x0008, 0x0102), VR::SH, 4),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["SRT"])),
            header((0x0008, 0x0104), VR::LO, 10),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["Jaw region"])),
            // item and sequence end at the same position
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::SequenceStart {
                tag: Tag(0x0040, 0x0555),
                len: Length(0),
            },
            DataToken::SequenceEnd,
            header((0x2050, 0x0020), VR::CS, 8),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["IDENTITY"])),
        ];

        validate_dataset_reader(DATA, &EXPLICIT_VR_LITTLE_ENDIAN, ground_truth);
    }

    /// Gracefully ignore a stray item end tag in the data set.
    #[test]
    fn ignore_trailing_item_delimitation_item() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, // (0020,4000) ImageComments, len = 4
            b'T', b'E', b'S', b'T', // value = "TEST"
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00, // item end
        ];

        let ground_truth = vec![
            header((0x0020, 0x4000), VR::LT, 4),
            DataToken::PrimitiveValue(PrimitiveValue::Str("TEST".into())),
            // no item end
        ];

        validate_dataset_reader(DATA, &EXPLICIT_VR_LITTLE_ENDIAN, ground_truth);
    }

    #[test]
    fn read_sequence_implicit() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x18, 0x00, 0x11, 0x60, // sequence tag: (0018,6011) SequenceOfUltrasoundRegions
            0xff, 0xff, 0xff, 0xff, // length: undefined
            // -- 8 --
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0xff, 0xff, 0xff, 0xff, // item length: undefined
            // -- 16 --
            0x18, 0x00, 0x12, 0x60, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00, // (0018, 6012) RegionSpatialformat, len = 2, value = 1
            // -- 26 --
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00, // item end
            // -- 34 --
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0xff, 0xff, 0xff, 0xff, // item length: undefined
            // -- 42 --
            0x18, 0x00, 0x12, 0x60, 0x02, 0x00, 0x00, 0x00, 0x04, 0x00, // (0018, 6012) RegionSpatialformat, len = 2, value = 4
            // -- 52 --
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00, // item end
            // -- 60 --
            0xfe, 0xff, 0xdd, 0xe0, 0x00, 0x00, 0x00, 0x00, // sequence end
            // -- 68 --
            0x20, 0x00, 0x00, 0x40, 0x04, 0x00, 0x00, 0x00, // (0020,4000) ImageComments, len = 4
            b'T', b'E', b'S', b'T', // value = "TEST"
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0018, 0x6011),
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            header((0x0018, 0x6012), VR::US, 2),
            DataToken::PrimitiveValue(dicom_value!(U16, [1])),
            DataToken::ItemEnd,
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            header((0x0018, 0x6012), VR::US, 2),
            DataToken::PrimitiveValue(dicom_value!(U16, [4])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            header((0x0020, 0x4000), VR::LT, 4),
            DataToken::PrimitiveValue(PrimitiveValue::Str("TEST".into())),
        ];

        validate_dataset_reader(DATA, &IMPLICIT_VR_LITTLE_ENDIAN, ground_truth);
    }

    #[test]
    fn read_implicit_len_sequence_implicit_vr_unknown() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x33, 0x55, 0x33, 0x55, // sequence tag: (5533,5533) «private, unknown attribute»
            0xff, 0xff, 0xff, 0xff, // length: undefined
            // -- 8 --
            0xfe, 0xff, 0x00, 0xe0, // item begin
            0xff, 0xff, 0xff, 0xff, // length: undefined
            // -- 16 --
            0xfe, 0xff, 0x0d, 0xe0, // item end
            0x00, 0x00, 0x00, 0x00, // length is always zero
            // -- 24 --
            0xfe, 0xff, 0xdd, 0xe0,
            0x00, 0x00, 0x00, 0x00, // sequence end
            // -- 32 --
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x5533, 0x5533),
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
        ];

        let mut reader = DataSetReader::new_with_ts_dict(
            DATA,
            &IMPLICIT_VR_LITTLE_ENDIAN,
            StubDataDictionary,
        );
        let tokens: Vec<_> = (&mut reader).collect::<Result<_, _>>().unwrap();
        assert_eq!(tokens, ground_truth);
        assert_eq!(reader.position(), DATA.len() as u64);
    }

    #[test]
    fn read_sequence_big_endian() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x00, 0x08, 0x11, 0x40, // (0008,1140) ReferencedImageSequence
            b'S', b'Q', 0x00, 0x00,
            0x00, 0x00, 0x00, 0x12, // length: 18
            // -- 12 --
            0xff, 0xfe, 0xe0, 0x00, // item start tag
            0x00, 0x00, 0x00, 0x0a, // item length: 10
            // -- 20 --
            0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x02, 0x00, // (0028,0010) Rows, len = 2, value = 512
            // -- 30 --
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x1140),
                len: Length(18),
            },
            DataToken::ItemStart { len: Length(10) },
            header((0x0028, 0x0010), VR::US, 2),
            DataToken::PrimitiveValue(dicom_value!(U16, [512])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
        ];

        validate_dataset_reader(DATA, &EXPLICIT_VR_BIG_ENDIAN, ground_truth);
    }

    #[test]
    fn read_encapsulated_pixeldata() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0xe0, 0x7f, 0x10, 0x00, // (7FE0, 0010) PixelData
            b'O', b'B', // VR
            0x00, 0x00, // reserved
            0xff, 0xff, 0xff, 0xff, // length: undefined
            // -- 12 -- Basic offset table
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0x00, 0x00, 0x00, 0x00, // item length: 0
            // -- 20 -- First fragment of pixel data
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0x04, 0x00, 0x00, 0x00, // item length: 4
            // -- 28 -- Compressed Fragment
            0x99, 0x99, 0x99, 0x99,
            // -- 32 -- End of pixel data
            0xfe, 0xff, 0xdd, 0xe0, // sequence end tag
            0x00, 0x00, 0x00, 0x00,
            // -- 40 -- padding
            0xfc, 0xff, 0xfc, 0xff, // (fffc,fffc) DataSetTrailingPadding
            b'O', b'B', // VR
            0x00, 0x00, // reserved
            0x08, 0x00, 0x00, 0x00, // length: 8
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x7fe0, 0x0010),
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart { len: Length(0) },
            DataToken::PrimitiveValue(PrimitiveValue::Empty),
            DataToken::ItemEnd,
            DataToken::ItemStart { len: Length(4) },
            DataToken::PrimitiveValue(dicom_value!(U8, [0x99, 0x99, 0x99, 0x99])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            header((0xfffc, 0xfffc), VR::OB, 8),
            DataToken::PrimitiveValue(dicom_value!(U8, [0, 0, 0, 0, 0, 0, 0, 0])),
        ];

        validate_dataset_reader(DATA, &EXPLICIT_VR_LITTLE_ENDIAN, ground_truth);
    }

    #[test]
    fn inconsistent_item_length_is_an_error() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x18, 0x00, 0x11, 0x60, b'S', b'Q', 0x00, 0x00,
            0xff, 0xff, 0xff, 0xff, // length: undefined
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0x04, 0x00, 0x00, 0x00, // item length: 4, shorter than its content
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00,
        ];

        let mut reader = DataSetReader::new_with_ts(DATA, &EXPLICIT_VR_LITTLE_ENDIAN);
        let result: Result<Vec<_>, _> = (&mut reader).collect();
        assert!(matches!(
            result,
            Err(Error::InconsistentSequenceEnd {
                end_of_sequence: 24,
                bytes_read: 30,
                ..
            })
        ));
        // the reader is fused after an error
        assert!(reader.next().is_none());
    }

    #[test]
    fn truncated_value_is_an_error() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x08, 0x00, // (0020,4000) ImageComments, len = 8
            b'T', b'E', b'S', b'T', // only 4 bytes
        ];

        let mut reader = DataSetReader::new_with_ts(DATA, &EXPLICIT_VR_LITTLE_ENDIAN);
        assert!(matches!(reader.next(), Some(Ok(DataToken::ElementHeader(_)))));
        assert!(matches!(reader.next(), Some(Err(Error::ReadValue { .. }))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn undefined_length_un_is_a_sequence() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x09, 0x00, 0x10, 0x10, // (0009,1010) private
            b'U', b'N', 0x00, 0x00,
            0xff, 0xff, 0xff, 0xff, // length: undefined
            // -- 12 --
            0xfe, 0xff, 0x00, 0xe0, 0xff, 0xff, 0xff, 0xff, // item start
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00, // item end
            0xfe, 0xff, 0xdd, 0xe0, 0x00, 0x00, 0x00, 0x00, // sequence end
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0009, 0x1010),
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
        ];

        validate_dataset_reader(DATA, &EXPLICIT_VR_LITTLE_ENDIAN, ground_truth);
    }

    #[test]
    fn source_ending_inside_item_is_premature() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x18, 0x00, 0x11, 0x60, b'S', b'Q', 0x00, 0x00,
            0xff, 0xff, 0xff, 0xff, // length: undefined
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0xff, 0xff, 0xff, 0xff, // item length: undefined
        ];

        let mut reader = DataSetReader::new_with_ts(DATA, &EXPLICIT_VR_LITTLE_ENDIAN);
        let result: Result<Vec<_>, _> = (&mut reader).collect();
        assert!(matches!(
            result,
            Err(Error::PrematureEnd { position: 20, .. })
        ));

        // also between items
        let mut reader = DataSetReader::new_with_ts(&DATA[..12], &EXPLICIT_VR_LITTLE_ENDIAN);
        let result: Result<Vec<_>, _> = (&mut reader).collect();
        assert!(matches!(
            result,
            Err(Error::PrematureEnd { position: 12, .. })
        ));
    }

    #[test]
    fn empty_source_yields_nothing() {
        let mut reader = DataSetReader::new_with_ts(&[][..], &IMPLICIT_VR_LITTLE_ENDIAN);
        assert!(reader.next().is_none());
        assert_eq!(reader.position(), 0);
    }
}
