//! P-Data fragmentation and reassembly.
//!
//! Commands and data sets exchanged over an association
//! are split into presentation data values (PDVs)
//! which must fit the maximum PDU length admitted by the receiving node.
use std::collections::VecDeque;
use std::io::{Read, Write};

use tracing::warn;

use crate::pdu::{read_pdu, PDataValue, PDataValueType, Pdu, MAXIMUM_PDU_SIZE, PDU_HEADER_SIZE};

/// Size of the P-DATA-TF PDU header plus the header of its single PDV item:
/// PDU type, reserved byte, PDU length, item length,
/// presentation context ID and message control header.
const PDATA_HEADER_SIZE: usize = 12;

/// The maximum number of data bytes which fit in a single PDV
/// of a P-DATA-TF PDU with the given maximum PDU length.
///
/// The PDV item length (4 bytes), the presentation context ID
/// and the message control header are accounted for.
pub fn calculate_max_data_len_single(pdu_len: u32) -> u32 {
    pdu_len.saturating_sub(PDU_HEADER_SIZE).max(1)
}

/// An iterator of P-DATA-TF PDUs over a byte slice.
///
/// Each PDU carries exactly one presentation data value
/// with no more data than the given maximum PDU length admits.
/// The last fragment is flagged as such.
/// An empty payload yields exactly one empty last fragment.
///
/// # Example
///
/// ```
/// # use dcmnet_ul::association::PDataFragments;
/// # use dcmnet_ul::pdu::{Pdu, PDataValueType};
/// let data = vec![0x55; 10_000];
/// let fragments: Vec<Pdu> = PDataFragments::new(&data, 1, PDataValueType::Data, 4096).collect();
/// assert_eq!(fragments.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct PDataFragments<'a> {
    data: &'a [u8],
    presentation_context_id: u8,
    value_type: PDataValueType,
    max_data_len: usize,
    done: bool,
}

impl<'a> PDataFragments<'a> {
    /// Prepare the fragments of the given payload.
    ///
    /// `max_pdu_length` is the maximum PDU length admitted by the receiver.
    /// A value of zero stands for no limit,
    /// in which case the maximum PDU size of the standard is used.
    pub fn new(
        data: &'a [u8],
        presentation_context_id: u8,
        value_type: PDataValueType,
        max_pdu_length: u32,
    ) -> Self {
        let max_pdu_length = if max_pdu_length == 0 {
            MAXIMUM_PDU_SIZE
        } else {
            max_pdu_length
        };
        PDataFragments {
            data,
            presentation_context_id,
            value_type,
            max_data_len: calculate_max_data_len_single(max_pdu_length) as usize,
            done: false,
        }
    }
}

impl Iterator for PDataFragments<'_> {
    type Item = Pdu;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let len = self.data.len().min(self.max_data_len);
        let (chunk, rest) = self.data.split_at(len);
        self.data = rest;
        let is_last = rest.is_empty();
        self.done = is_last;

        Some(Pdu::PData {
            data: vec![PDataValue {
                presentation_context_id: self.presentation_context_id,
                value_type: self.value_type,
                is_last,
                data: chunk.to_vec(),
            }],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let n = ((self.data.len() + self.max_data_len - 1) / self.max_data_len).max(1);
        (n, Some(n))
    }
}

impl ExactSizeIterator for PDataFragments<'_> {}

impl std::iter::FusedIterator for PDataFragments<'_> {}

/// Patch the P-Data PDU header in the buffer before sending.
fn setup_pdata_header(buffer: &mut [u8], is_last: bool) {
    let data_len = (buffer.len() - PDATA_HEADER_SIZE) as u32;

    // PDU length: item length field + context id + control header + data
    buffer[2..6].copy_from_slice(&(data_len + 6).to_be_bytes());
    // PDV item length: context id + control header + data
    buffer[6..10].copy_from_slice(&(data_len + 2).to_be_bytes());

    let control = buffer[11] & 0x01;
    buffer[11] = if is_last { control | 0x02 } else { control };
}

/// A P-Data value writer.
///
/// Using this as a [standard writer](std::io::Write)
/// will automatically split the incoming bytes
/// into separate PDUs if they do not fit in a single one.
/// Dropping the writer sends the last fragment,
/// but calling [`finish`](Self::finish) is preferred
/// so that errors are not ignored.
#[must_use]
pub struct PDataWriter<W: Write> {
    buffer: Vec<u8>,
    stream: W,
    max_data_len: usize,
    finished: bool,
}

impl<W> PDataWriter<W>
where
    W: Write,
{
    /// Construct a new P-Data value writer.
    ///
    /// `max_pdu_length` is the maximum value of the PDU-length property
    /// admitted by the receiving node.
    pub fn new(
        stream: W,
        presentation_context_id: u8,
        value_type: PDataValueType,
        max_pdu_length: u32,
    ) -> Self {
        let max_data_len = calculate_max_data_len_single(max_pdu_length) as usize;
        let mut buffer = Vec::with_capacity(max_data_len + PDATA_HEADER_SIZE);
        let control = match value_type {
            PDataValueType::Command => 0x01,
            PDataValueType::Data => 0x00,
        };
        #[rustfmt::skip]
        buffer.extend([
            // PDU-type + reserved byte
            0x04, 0x00,
            // PDU length, filled in before sending
            0xFF, 0xFF, 0xFF, 0xFF,
            // PDV item length, filled in before sending
            0xFF, 0xFF, 0xFF, 0xFF,
            presentation_context_id,
            control,
        ]);

        PDataWriter {
            buffer,
            stream,
            max_data_len,
            finished: false,
        }
    }

    /// Declare to have finished sending P-Data fragments,
    /// thus emitting the last P-Data fragment PDU.
    pub fn finish(mut self) -> std::io::Result<()> {
        self.finish_impl()
    }

    fn finish_impl(&mut self) -> std::io::Result<()> {
        if !self.finished {
            self.finished = true;
            setup_pdata_header(&mut self.buffer, true);
            self.stream.write_all(&self.buffer)?;
            self.stream.flush()?;
        }
        Ok(())
    }

    /// Send the full buffer as a non-last fragment.
    fn dispatch_pdu(&mut self) -> std::io::Result<()> {
        setup_pdata_header(&mut self.buffer, false);
        self.stream.write_all(&self.buffer)?;
        self.buffer.truncate(PDATA_HEADER_SIZE);
        Ok(())
    }
}

impl<W> Write for PDataWriter<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let total_len = self.max_data_len + PDATA_HEADER_SIZE;
        // only dispatch a full buffer once more data arrives,
        // so that the last fragment is never empty unless there was no data
        if self.buffer.len() == total_len && !buf.is_empty() {
            self.dispatch_pdu()?;
        }
        let n = buf.len().min(total_len - self.buffer.len());
        self.buffer.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

impl<W> Drop for PDataWriter<W>
where
    W: Write,
{
    fn drop(&mut self) {
        let _ = self.finish_impl();
    }
}

/// A P-Data value reader.
///
/// Using this as a [standard reader](std::io::Read)
/// will provide all incoming bytes,
/// even if they reside in separate PDUs,
/// until the last fragment is received.
#[must_use]
pub struct PDataReader<R> {
    buffer: VecDeque<u8>,
    stream: R,
    presentation_context_id: Option<u8>,
    max_pdu_length: u32,
    last_pdu: bool,
}

impl<R> PDataReader<R>
where
    R: Read,
{
    /// Create a reader of P-Data fragments from the given stream.
    ///
    /// `max_pdu_length` is the maximum PDU length admitted by this node.
    pub fn new(stream: R, max_pdu_length: u32) -> Self {
        PDataReader {
            buffer: VecDeque::new(),
            stream,
            presentation_context_id: None,
            max_pdu_length,
            last_pdu: false,
        }
    }

    /// The presentation context of the fragments received so far.
    pub fn presentation_context_id(&self) -> Option<u8> {
        self.presentation_context_id
    }

    /// Declare no intention to read more PDUs from the remote node.
    ///
    /// Attempting to read more bytes
    /// will only consume the inner buffer.
    pub fn stop_receiving(&mut self) {
        self.last_pdu = true;
    }

    fn receive_pdu(&mut self) -> std::io::Result<()> {
        let pdu = read_pdu(&mut self.stream, self.max_pdu_length, false)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        match pdu {
            Pdu::PData { data } => {
                for pdv in data {
                    match self.presentation_context_id {
                        None => self.presentation_context_id = Some(pdv.presentation_context_id),
                        Some(id) if id != pdv.presentation_context_id => {
                            warn!(
                                "Received P-Data value of presentation context {}, but should be {}",
                                pdv.presentation_context_id, id
                            );
                        }
                        Some(_) => {}
                    }
                    self.buffer.extend(pdv.data);
                    self.last_pdu = pdv.is_last;
                }
                Ok(())
            }
            pdu => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Unexpected PDU {}", pdu.short_description()),
            )),
        }
    }
}

impl<R> Read for PDataReader<R>
where
    R: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.buffer.is_empty() {
            if self.last_pdu {
                return Ok(0);
            }
            self.receive_pdu()?;
        }
        Read::read(&mut self.buffer, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::{write_pdu, MINIMUM_PDU_SIZE};
    use std::io::Read;

    fn read_all_pdus(mut bytes: &[u8]) -> Vec<Pdu> {
        let mut pdus = Vec::new();
        while !bytes.is_empty() {
            pdus.push(read_pdu(&mut bytes, MINIMUM_PDU_SIZE, true).unwrap());
        }
        pdus
    }

    fn pdv(pdu: &Pdu) -> &PDataValue {
        match pdu {
            Pdu::PData { data } if data.len() == 1 => &data[0],
            pdu => panic!("unexpected PDU {:?}", pdu),
        }
    }

    #[test]
    fn fragments_are_bounded_and_ordered() {
        let data: Vec<u8> = (0..10_000u32).map(|i| i as u8).collect();
        let fragments: Vec<_> =
            PDataFragments::new(&data, 3, PDataValueType::Data, MINIMUM_PDU_SIZE).collect();

        let max = (MINIMUM_PDU_SIZE - 6) as usize;
        assert_eq!(fragments.len(), (data.len() + max - 1) / max);

        let mut joined = Vec::new();
        for (i, fragment) in fragments.iter().enumerate() {
            let value = pdv(fragment);
            assert!(value.data.len() <= max);
            assert_eq!(value.presentation_context_id, 3);
            assert_eq!(value.value_type, PDataValueType::Data);
            assert_eq!(value.is_last, i == fragments.len() - 1);
            joined.extend_from_slice(&value.data);

            // every encoded PDU fits the maximum PDU length
            let mut bytes = Vec::new();
            write_pdu(&mut bytes, fragment).unwrap();
            assert!(bytes.len() - 6 <= MINIMUM_PDU_SIZE as usize);
        }
        assert_eq!(joined, data);
    }

    #[test]
    fn exact_multiple_does_not_emit_empty_fragment() {
        let data = vec![7u8; 2 * (MINIMUM_PDU_SIZE as usize - 6)];
        let fragments = PDataFragments::new(&data, 1, PDataValueType::Data, MINIMUM_PDU_SIZE);
        assert_eq!(fragments.len(), 2);
        let fragments: Vec<_> = fragments.collect();
        assert!(pdv(&fragments[1]).is_last);
        assert_eq!(pdv(&fragments[1]).data.len(), MINIMUM_PDU_SIZE as usize - 6);
    }

    #[test]
    fn empty_payload_yields_one_last_fragment() {
        let mut fragments = PDataFragments::new(&[], 1, PDataValueType::Command, 16_384);
        let first = fragments.next().unwrap();
        assert_eq!(
            pdv(&first),
            &PDataValue {
                presentation_context_id: 1,
                value_type: PDataValueType::Command,
                is_last: true,
                data: vec![],
            }
        );
        assert_eq!(fragments.next(), None);
        assert_eq!(fragments.next(), None);
    }

    #[test]
    fn writer_splits_into_pdus() {
        let mut bytes = Vec::new();
        {
            let mut writer =
                PDataWriter::new(&mut bytes, 1, PDataValueType::Data, MINIMUM_PDU_SIZE);
            writer.write_all(&[0x55; 9000]).unwrap();
            writer.finish().unwrap();
        }

        let pdus = read_all_pdus(&bytes);
        let sizes: Vec<_> = pdus.iter().map(|p| pdv(p).data.len()).collect();
        assert_eq!(sizes, [4090, 4090, 820]);
        let last: Vec<_> = pdus.iter().map(|p| pdv(p).is_last).collect();
        assert_eq!(last, [false, false, true]);
    }

    #[test]
    fn writer_sends_last_fragment_on_drop() {
        let mut bytes = Vec::new();
        {
            let mut writer =
                PDataWriter::new(&mut bytes, 5, PDataValueType::Command, MINIMUM_PDU_SIZE);
            writer.write_all(&[1, 2, 3, 4]).unwrap();
        }
        let pdus = read_all_pdus(&bytes);
        assert_eq!(
            pdus,
            vec![Pdu::PData {
                data: vec![PDataValue {
                    presentation_context_id: 5,
                    value_type: PDataValueType::Command,
                    is_last: true,
                    data: vec![1, 2, 3, 4],
                }]
            }]
        );
    }

    #[test]
    fn reader_reassembles_fragments() {
        let data: Vec<u8> = (0..9000u32).map(|i| (i % 251) as u8).collect();
        let mut bytes = Vec::new();
        for pdu in PDataFragments::new(&data, 1, PDataValueType::Data, MINIMUM_PDU_SIZE) {
            write_pdu(&mut bytes, &pdu).unwrap();
        }
        // anything after the last fragment is left untouched
        write_pdu(&mut bytes, &Pdu::ReleaseRQ).unwrap();

        let mut source = &bytes[..];
        let mut reader = PDataReader::new(&mut source, MINIMUM_PDU_SIZE);
        let mut received = Vec::new();
        reader.read_to_end(&mut received).unwrap();
        assert_eq!(reader.presentation_context_id(), Some(1));
        assert_eq!(received, data);

        assert_eq!(
            read_pdu(&mut source, MINIMUM_PDU_SIZE, true).unwrap(),
            Pdu::ReleaseRQ
        );
    }

    #[test]
    fn reader_fails_on_other_pdus() {
        let mut bytes = Vec::new();
        write_pdu(&mut bytes, &Pdu::ReleaseRQ).unwrap();
        let mut reader = PDataReader::new(&bytes[..], MINIMUM_PDU_SIZE);
        let mut received = Vec::new();
        assert!(reader.read_to_end(&mut received).is_err());
    }
}
