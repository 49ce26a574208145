//! A stateful printer of data set tokens.
//!
//! Sequences and items are always written with undefined length,
//! closed by their respective delimiters,
//! whereas primitive values are measured before their header is written.
use crate::dataset::{DataToken, SeqTokenType};
use dcmnet_core::header::{DataElementHeader, Length};
use dcmnet_core::{Tag, VR};
use dcmnet_encoding::encode::{self, Encode};
use dcmnet_encoding::transfer_syntax::{SyntaxEncoder, TransferSyntax};
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::Write;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not encode data set token"))]
    EncodeToken {
        #[snafu(backtrace)]
        source: encode::Error,
    },
    #[snafu(display("Could not write value data"))]
    WriteValueData {
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Unexpected token {}", token))]
    UnexpectedToken {
        token: DataToken,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A token representing a sequence or item start.
#[derive(Debug)]
struct SeqToken {
    /// Whether it is the start of a sequence or the start of an item.
    typ: SeqTokenType,
    /// Whether the sequence holds encapsulated pixel data fragments.
    pixel_data: bool,
}

/// A stateful device for printing a DICOM data set in sequential order.
/// This is analogous to the `DataSetReader` type for converting data
/// set tokens to bytes.
#[derive(Debug)]
pub struct DataSetWriter<W, E = SyntaxEncoder> {
    to: W,
    encoder: E,
    seq_tokens: Vec<SeqToken>,
    /// the header of the primitive value expected next
    pending_header: Option<DataElementHeader>,
}

impl<W> DataSetWriter<W>
where
    W: Write,
{
    /// Create a data set writer for the given transfer syntax.
    pub fn with_ts(to: W, ts: &TransferSyntax) -> Self {
        DataSetWriter::new(to, ts.encoder())
    }
}

impl<W, E> DataSetWriter<W, E> {
    /// Create a data set writer with the given element encoder.
    pub fn new(to: W, encoder: E) -> Self {
        DataSetWriter {
            to,
            encoder,
            seq_tokens: Vec::new(),
            pending_header: None,
        }
    }

    /// Recover the inner writer.
    pub fn into_inner(self) -> W {
        self.to
    }
}

impl<W, E> DataSetWriter<W, E>
where
    W: Write,
    E: Encode,
{
    /// Feed the given sequence of tokens which are part of the same data set.
    pub fn write_sequence<I>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = DataToken>,
    {
        for token in tokens {
            self.write(token)?;
        }

        Ok(())
    }

    /// Feed the given data set token for writing the data set.
    pub fn write(&mut self, token: DataToken) -> Result<()> {
        match token {
            DataToken::ElementHeader(header) if self.pending_header.is_none() => {
                self.pending_header = Some(header);
                Ok(())
            }
            DataToken::PrimitiveValue(value) => {
                if let Some(header) = self.pending_header.take() {
                    let data = self.encode_value(header.vr, &value)?;
                    let header = DataElementHeader::new(header.tag, header.vr, Length(data.len() as u32));
                    self.encoder
                        .encode_element_header(&mut self.to, header)
                        .context(EncodeTokenSnafu)?;
                    self.to.write_all(&data).context(WriteValueDataSnafu)
                } else if self.in_pixel_data_item() {
                    let data = self.encode_value(VR::OB, &value)?;
                    self.encoder
                        .encode_item_header(&mut self.to, data.len() as u32)
                        .context(EncodeTokenSnafu)?;
                    self.to.write_all(&data).context(WriteValueDataSnafu)
                } else {
                    UnexpectedTokenSnafu {
                        token: DataToken::PrimitiveValue(value),
                    }
                    .fail()
                }
            }
            DataToken::SequenceStart { tag, .. } if self.pending_header.is_none() => {
                let pixel_data = tag == Tag(0x7FE0, 0x0010);
                let vr = if pixel_data { VR::OB } else { VR::SQ };
                self.encoder
                    .encode_element_header(
                        &mut self.to,
                        DataElementHeader::new(tag, vr, Length::UNDEFINED),
                    )
                    .context(EncodeTokenSnafu)?;
                self.seq_tokens.push(SeqToken {
                    typ: SeqTokenType::Sequence,
                    pixel_data,
                });
                Ok(())
            }
            DataToken::ItemStart { .. } if self.in_sequence() => {
                let pixel_data = self.seq_tokens.last().map(|t| t.pixel_data).unwrap_or(false);
                // fragment headers are written along with their value
                if !pixel_data {
                    self.encoder
                        .encode_item_header(&mut self.to, Length::UNDEFINED.0)
                        .context(EncodeTokenSnafu)?;
                }
                self.seq_tokens.push(SeqToken {
                    typ: SeqTokenType::Item,
                    pixel_data,
                });
                Ok(())
            }
            DataToken::ItemEnd if self.in_item() => {
                if let Some(SeqToken {
                    pixel_data: false, ..
                }) = self.seq_tokens.pop()
                {
                    self.encoder
                        .encode_item_delimiter(&mut self.to)
                        .context(EncodeTokenSnafu)?;
                }
                Ok(())
            }
            DataToken::SequenceEnd if self.in_sequence() => {
                self.seq_tokens.pop();
                self.encoder
                    .encode_sequence_delimiter(&mut self.to)
                    .context(EncodeTokenSnafu)
            }
            token => UnexpectedTokenSnafu { token }.fail(),
        }
    }

    fn encode_value(&self, vr: VR, value: &dcmnet_core::PrimitiveValue) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(value.calculate_byte_len());
        self.encoder
            .encode_primitive(&mut data, vr, value)
            .context(EncodeTokenSnafu)?;
        Ok(data)
    }

    fn in_sequence(&self) -> bool {
        self.pending_header.is_none()
            && matches!(
                self.seq_tokens.last(),
                Some(SeqToken {
                    typ: SeqTokenType::Sequence,
                    ..
                })
            )
    }

    fn in_item(&self) -> bool {
        self.pending_header.is_none()
            && matches!(
                self.seq_tokens.last(),
                Some(SeqToken {
                    typ: SeqTokenType::Item,
                    ..
                })
            )
    }

    fn in_pixel_data_item(&self) -> bool {
        matches!(
            self.seq_tokens.last(),
            Some(SeqToken {
                typ: SeqTokenType::Item,
                pixel_data: true,
            })
        )
    }
}
