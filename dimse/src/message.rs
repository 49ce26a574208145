//! DIMSE messages as exchanged over an association,
//! and their mapping into P-Data PDUs.
use dcmnet_encoding::transfer_syntax::{self, IMPLICIT_VR_LITTLE_ENDIAN};
use dcmnet_encoding::TransferSyntax;
use dcmnet_object::InMemDicomObject;
use dcmnet_ul::association::PDataFragments;
use dcmnet_ul::pdu::{PDataValue, PDataValueType, Pdu};
use snafu::{OptionExt, ResultExt};
use tracing::debug;

use crate::command::CommandMessage;
use crate::{ReadDataSetSnafu, Result, UnsupportedTransferSyntaxSnafu, WriteDataSetSnafu};

/// Whether a message is a command set or a data set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Command,
    DataSet,
}

impl From<PDataValueType> for MessageType {
    fn from(value_type: PDataValueType) -> Self {
        match value_type {
            PDataValueType::Command => MessageType::Command,
            PDataValueType::Data => MessageType::DataSet,
        }
    }
}

impl From<MessageType> for PDataValueType {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Command => PDataValueType::Command,
            MessageType::DataSet => PDataValueType::Data,
        }
    }
}

/// A data set following a command,
/// together with the transfer syntax it is encoded with.
///
/// The transfer syntax is resolved against the built-in registry,
/// so every encode sees one consistent syntax
/// for the whole tree of elements, nested sequences included.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSetMessage {
    object: InMemDicomObject,
    ts: &'static TransferSyntax,
}

impl DataSetMessage {
    /// Create a data set message to be encoded in the given transfer syntax.
    pub fn new(object: InMemDicomObject, ts: &'static TransferSyntax) -> Self {
        DataSetMessage { object, ts }
    }

    /// Create a data set message by the UID of its transfer syntax.
    pub fn with_ts_uid(object: InMemDicomObject, ts_uid: &str) -> Result<Self> {
        Ok(DataSetMessage {
            object,
            ts: lookup_ts(ts_uid)?,
        })
    }

    /// Change the transfer syntax used by subsequent encodes.
    ///
    /// On failure, the current transfer syntax is kept.
    pub fn set_transfer_syntax(&mut self, ts_uid: &str) -> Result<()> {
        self.ts = lookup_ts(ts_uid)?;
        Ok(())
    }

    pub fn transfer_syntax(&self) -> &'static TransferSyntax {
        self.ts
    }

    pub fn object(&self) -> &InMemDicomObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut InMemDicomObject {
        &mut self.object
    }

    pub fn into_inner(self) -> InMemDicomObject {
        self.object
    }

    /// Encode the data set in its current transfer syntax.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.object
            .write_dataset_with_ts(&mut out, self.ts)
            .context(WriteDataSetSnafu)?;
        Ok(out)
    }

    /// Decode a data set in the given transfer syntax.
    pub fn decode(bytes: &[u8], ts: &'static TransferSyntax) -> Result<Self> {
        let object = InMemDicomObject::read_dataset_with_ts(bytes, ts).context(ReadDataSetSnafu)?;
        Ok(DataSetMessage { object, ts })
    }
}

fn lookup_ts(uid: &str) -> Result<&'static TransferSyntax> {
    transfer_syntax::get(uid).context(UnsupportedTransferSyntaxSnafu {
        uid: transfer_syntax::trim_uid(uid),
    })
}

/// Either kind of DIMSE message.
#[derive(Debug, Clone, PartialEq)]
pub enum DicomMessage {
    Command(CommandMessage),
    DataSet(DataSetMessage),
}

impl DicomMessage {
    /// Decode a message of the given type.
    ///
    /// Command sets are always decoded in Implicit VR Little Endian,
    /// regardless of `ts`.
    pub fn read(bytes: &[u8], message_type: MessageType, ts: &'static TransferSyntax) -> Result<Self> {
        match message_type {
            MessageType::Command => CommandMessage::decode(bytes).map(DicomMessage::Command),
            MessageType::DataSet => DataSetMessage::decode(bytes, ts).map(DicomMessage::DataSet),
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            DicomMessage::Command(_) => MessageType::Command,
            DicomMessage::DataSet(_) => MessageType::DataSet,
        }
    }

    /// The transfer syntax in which this message is encoded.
    pub fn transfer_syntax(&self) -> &'static TransferSyntax {
        match self {
            DicomMessage::Command(_) => &IMPLICIT_VR_LITTLE_ENDIAN,
            DicomMessage::DataSet(d) => d.transfer_syntax(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            DicomMessage::Command(c) => c.encode(),
            DicomMessage::DataSet(d) => d.encode(),
        }
    }
}

impl From<CommandMessage> for DicomMessage {
    fn from(command: CommandMessage) -> Self {
        DicomMessage::Command(command)
    }
}

impl From<DataSetMessage> for DicomMessage {
    fn from(data_set: DataSetMessage) -> Self {
        DicomMessage::DataSet(data_set)
    }
}

/// Encode a command and fragment it into P-Data PDUs
/// bounded by the peer's maximum PDU length.
pub fn command_pdus(
    command: &CommandMessage,
    presentation_context_id: u8,
    max_pdu_length: u32,
) -> Result<Vec<Pdu>> {
    let bytes = command.encode()?;
    debug!(
        "{} encoded in {} bytes for presentation context {}",
        command.kind(),
        bytes.len(),
        presentation_context_id
    );
    Ok(PDataFragments::new(
        &bytes,
        presentation_context_id,
        PDataValueType::Command,
        max_pdu_length,
    )
    .collect())
}

/// Fragment an encoded data set into P-Data PDUs
/// bounded by the peer's maximum PDU length.
///
/// The fragments are produced lazily.
pub fn data_pdus(data: &[u8], presentation_context_id: u8, max_pdu_length: u32) -> PDataFragments<'_> {
    PDataFragments::new(
        data,
        presentation_context_id,
        PDataValueType::Data,
        max_pdu_length,
    )
}

/// Produce every PDU of a command and its optional data set,
/// the command always ahead of the data set.
pub fn message_pdus(
    command: &CommandMessage,
    data: Option<&[u8]>,
    presentation_context_id: u8,
    max_pdu_length: u32,
) -> Result<Vec<Pdu>> {
    let mut pdus = command_pdus(command, presentation_context_id, max_pdu_length)?;
    if let Some(data) = data {
        pdus.extend(data_pdus(data, presentation_context_id, max_pdu_length));
    }
    Ok(pdus)
}

/// A complete message payload, reassembled from P-Data values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledMessage {
    pub presentation_context_id: u8,
    pub message_type: MessageType,
    pub data: Vec<u8>,
}

/// Reassembles P-Data values into message payloads.
///
/// Command and data set fragments are accumulated separately,
/// so a payload is complete once its last fragment arrives.
#[derive(Debug, Default)]
pub struct PDataAssembler {
    command: Vec<u8>,
    data: Vec<u8>,
}

impl PDataAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one P-Data value,
    /// obtaining the complete payload if it was the last fragment.
    pub fn push(&mut self, pdv: PDataValue) -> Option<AssembledMessage> {
        let message_type = MessageType::from(pdv.value_type);
        let buffer = match message_type {
            MessageType::Command => &mut self.command,
            MessageType::DataSet => &mut self.data,
        };
        if buffer.is_empty() {
            *buffer = pdv.data;
        } else {
            buffer.extend_from_slice(&pdv.data);
        }

        if pdv.is_last {
            Some(AssembledMessage {
                presentation_context_id: pdv.presentation_context_id,
                message_type,
                data: std::mem::take(buffer),
            })
        } else {
            None
        }
    }

    /// Whether no partial payload is pending.
    pub fn is_empty(&self) -> bool {
        self.command.is_empty() && self.data.is_empty()
    }
}
