//! PDU reader module
use crate::pdu::*;
use byteordered::byteorder::{BigEndian, ReadBytesExt};
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{Cursor, ErrorKind, Read};

/// The default maximum PDU size
pub const DEFAULT_MAX_PDU: u32 = 16_384;

/// The minimum PDU size,
/// as specified by the standard
pub const MINIMUM_PDU_SIZE: u32 = 4_096;

/// The maximum PDU size,
/// as specified by the standard
pub const MAXIMUM_PDU_SIZE: u32 = 131_072;

/// The length of the PDU header in bytes,
/// comprising the PDU type (1 byte),
/// reserved byte (1 byte),
/// and PDU length (4 bytes).
pub const PDU_HEADER_SIZE: u32 = 6;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Invalid max PDU length {}", max_pdu_length))]
    InvalidMaxPdu {
        max_pdu_length: u32,
        backtrace: Backtrace,
    },

    #[snafu(display("No PDU available"))]
    NoPduAvailable { backtrace: Backtrace },

    #[snafu(display("Could not read PDU"))]
    ReadPdu {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not read PDU field `{}`", field))]
    ReadPduField {
        field: &'static str,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid item length {} (must be >=2)", length))]
    InvalidItemLength { length: u32, backtrace: Backtrace },

    #[snafu(display(
        "Incoming pdu was too large: length {}, maximum is {}",
        pdu_length,
        max_pdu_length
    ))]
    PduTooLarge {
        pdu_length: u32,
        max_pdu_length: u32,
        backtrace: Backtrace,
    },

    #[snafu(display("PDU contained an unexpected item {:?}", var_item))]
    InvalidPduVariable {
        var_item: PduVariableItem,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid reject result, source or reason"))]
    InvalidRejectSourceOrReason { backtrace: Backtrace },

    #[snafu(display("Invalid abort source or reason"))]
    InvalidAbortSourceOrReason { backtrace: Backtrace },

    #[snafu(display("Invalid presentation context result reason {}", code))]
    InvalidPresentationContextResultReason { code: u8, backtrace: Backtrace },

    #[snafu(display("Unknown presentation context sub-item type {:#04x}", item_type))]
    UnknownPresentationContextSubItem { item_type: u8, backtrace: Backtrace },

    #[snafu(display("Missing application context name"))]
    MissingApplicationContextName { backtrace: Backtrace },

    #[snafu(display("Missing abstract syntax"))]
    MissingAbstractSyntax { backtrace: Backtrace },

    #[snafu(display("Missing transfer syntax"))]
    MissingTransferSyntax { backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Read a single PDU from the given byte source.
///
/// `max_pdu_length` is the maximum PDU length that this node admits,
/// which must be within the bounds established by the standard.
/// In strict mode, larger PDUs are rejected;
/// otherwise they are accepted with a warning
/// for as long as they fit the absolute maximum.
///
/// Returns [`Error::NoPduAvailable`]
/// if the source ends before the first byte of a PDU.
pub fn read_pdu<R>(reader: &mut R, max_pdu_length: u32, strict: bool) -> Result<Pdu>
where
    R: Read,
{
    ensure!(
        (MINIMUM_PDU_SIZE..=MAXIMUM_PDU_SIZE).contains(&max_pdu_length),
        InvalidMaxPduSnafu { max_pdu_length }
    );

    // a clean end of stream here means that the peer closed the connection
    // between PDUs, which is not an error per se
    let mut header = [0; 2];
    if let Err(e) = reader.read_exact(&mut header) {
        ensure!(e.kind() != ErrorKind::UnexpectedEof, NoPduAvailableSnafu);
        return Err(e).context(ReadPduFieldSnafu { field: "PDU-type" });
    }

    let pdu_type = header[0];
    let pdu_length = reader
        .read_u32::<BigEndian>()
        .context(ReadPduFieldSnafu { field: "PDU-length" })?;

    check_pdu_length(pdu_length, max_pdu_length, strict)?;

    let bytes = read_n(reader, pdu_length as usize).context(ReadPduSnafu)?;
    parse_pdu_body(pdu_type, bytes)
}

/// Read a single PDU from the given asynchronous byte source.
///
/// See [`read_pdu`] for the semantics of each parameter.
#[cfg(feature = "async")]
pub async fn read_pdu_async<R>(reader: &mut R, max_pdu_length: u32, strict: bool) -> Result<Pdu>
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    ensure!(
        (MINIMUM_PDU_SIZE..=MAXIMUM_PDU_SIZE).contains(&max_pdu_length),
        InvalidMaxPduSnafu { max_pdu_length }
    );

    let mut header = [0; PDU_HEADER_SIZE as usize];
    let mut read = 0;
    while read < header.len() {
        let n = reader
            .read(&mut header[read..])
            .await
            .context(ReadPduFieldSnafu { field: "PDU-type" })?;
        if n == 0 {
            ensure!(read > 0, NoPduAvailableSnafu);
            return Err(std::io::Error::from(ErrorKind::UnexpectedEof))
                .context(ReadPduFieldSnafu { field: "PDU-length" });
        }
        read += n;
    }

    let pdu_type = header[0];
    let pdu_length = u32::from_be_bytes([header[2], header[3], header[4], header[5]]);
    check_pdu_length(pdu_length, max_pdu_length, strict)?;

    let mut bytes = vec![0; pdu_length as usize];
    reader.read_exact(&mut bytes).await.context(ReadPduSnafu)?;
    parse_pdu_body(pdu_type, bytes)
}

fn check_pdu_length(pdu_length: u32, max_pdu_length: u32, strict: bool) -> Result<()> {
    if strict {
        ensure!(
            pdu_length <= max_pdu_length,
            PduTooLargeSnafu {
                pdu_length,
                max_pdu_length
            }
        );
    } else if pdu_length > max_pdu_length {
        ensure!(
            pdu_length <= MAXIMUM_PDU_SIZE,
            PduTooLargeSnafu {
                pdu_length,
                max_pdu_length: MAXIMUM_PDU_SIZE
            }
        );
        tracing::warn!(
            "Incoming pdu was too large: length {}, maximum is {}",
            pdu_length,
            max_pdu_length
        );
    }
    Ok(())
}

/// Interpret the bytes following the PDU header.
fn parse_pdu_body(pdu_type: u8, bytes: Vec<u8>) -> Result<Pdu> {
    let mut cursor = Cursor::new(bytes);

    match pdu_type {
        0x01 => {
            // A-ASSOCIATE-RQ
            let fields = read_association_fields(&mut cursor)?;
            let mut application_context_name = None;
            let mut presentation_contexts = vec![];
            let mut user_variables = vec![];

            while has_remaining(&cursor) {
                match read_pdu_variable(&mut cursor)? {
                    PduVariableItem::ApplicationContext(val) => {
                        application_context_name = Some(val);
                    }
                    PduVariableItem::PresentationContextProposed(val) => {
                        presentation_contexts.push(val);
                    }
                    PduVariableItem::UserVariables(val) => {
                        user_variables = val;
                    }
                    PduVariableItem::Unknown(item_type) => {
                        tracing::warn!("Ignoring unknown A-ASSOCIATE-RQ item {:#04x}", item_type);
                    }
                    var_item => {
                        return InvalidPduVariableSnafu { var_item }.fail();
                    }
                }
            }

            Ok(Pdu::AssociationRQ(AssociationRQ {
                protocol_version: fields.protocol_version,
                calling_ae_title: fields.calling_ae_title,
                called_ae_title: fields.called_ae_title,
                application_context_name: application_context_name
                    .context(MissingApplicationContextNameSnafu)?,
                presentation_contexts,
                user_variables,
            }))
        }
        0x02 => {
            // A-ASSOCIATE-AC
            let fields = read_association_fields(&mut cursor)?;
            let mut application_context_name = None;
            let mut presentation_contexts = vec![];
            let mut user_variables = vec![];

            while has_remaining(&cursor) {
                match read_pdu_variable(&mut cursor)? {
                    PduVariableItem::ApplicationContext(val) => {
                        application_context_name = Some(val);
                    }
                    PduVariableItem::PresentationContextResult(val) => {
                        presentation_contexts.push(val);
                    }
                    PduVariableItem::UserVariables(val) => {
                        user_variables = val;
                    }
                    PduVariableItem::Unknown(item_type) => {
                        tracing::warn!("Ignoring unknown A-ASSOCIATE-AC item {:#04x}", item_type);
                    }
                    var_item => {
                        return InvalidPduVariableSnafu { var_item }.fail();
                    }
                }
            }

            Ok(Pdu::AssociationAC(AssociationAC {
                protocol_version: fields.protocol_version,
                calling_ae_title: fields.calling_ae_title,
                called_ae_title: fields.called_ae_title,
                application_context_name: application_context_name
                    .context(MissingApplicationContextNameSnafu)?,
                presentation_contexts,
                user_variables,
            }))
        }
        0x03 => {
            // A-ASSOCIATE-RJ: reserved, result, source, reason/diag.
            let mut fields = [0u8; 4];
            cursor
                .read_exact(&mut fields)
                .context(ReadPduFieldSnafu {
                    field: "Result/Source/Reason",
                })?;
            let result =
                AssociationRJResult::from_code(fields[1]).context(InvalidRejectSourceOrReasonSnafu)?;
            let source = AssociationRJSource::from_codes(fields[2], fields[3])
                .context(InvalidRejectSourceOrReasonSnafu)?;
            Ok(Pdu::AssociationRJ(AssociationRJ { result, source }))
        }
        0x04 => {
            // P-DATA-TF: one or more presentation data value items
            let mut values = vec![];
            while has_remaining(&cursor) {
                let item_length = cursor
                    .read_u32::<BigEndian>()
                    .context(ReadPduFieldSnafu {
                        field: "Item-length",
                    })?;
                ensure!(
                    item_length >= 2,
                    InvalidItemLengthSnafu {
                        length: item_length
                    }
                );

                let presentation_context_id = cursor.read_u8().context(ReadPduFieldSnafu {
                    field: "Presentation-context-ID",
                })?;
                let header = cursor.read_u8().context(ReadPduFieldSnafu {
                    field: "Message Control Header",
                })?;
                let value_type = if header & 0x01 != 0 {
                    PDataValueType::Command
                } else {
                    PDataValueType::Data
                };
                let is_last = header & 0x02 != 0;

                let data =
                    read_n(&mut cursor, (item_length - 2) as usize).context(ReadPduFieldSnafu {
                        field: "Presentation-data-value",
                    })?;

                values.push(PDataValue {
                    presentation_context_id,
                    value_type,
                    is_last,
                    data,
                });
            }
            Ok(Pdu::PData { data: values })
        }
        // release PDUs only carry 4 reserved bytes, not tested on reception
        0x05 => Ok(Pdu::ReleaseRQ),
        0x06 => Ok(Pdu::ReleaseRP),
        0x07 => {
            // A-ABORT: 2 reserved bytes, source, reason/diag.
            let mut fields = [0u8; 4];
            cursor
                .read_exact(&mut fields)
                .context(ReadPduFieldSnafu {
                    field: "Source/Reason",
                })?;
            let source = AbortRQSource::from_codes(fields[2], fields[3])
                .context(InvalidAbortSourceOrReasonSnafu)?;
            Ok(Pdu::AbortRQ { source })
        }
        _ => Ok(Pdu::Unknown {
            pdu_type,
            data: cursor.into_inner(),
        }),
    }
}

/// The fixed fields at the start of an A-ASSOCIATE-RQ or -AC PDU.
struct AssociationFields {
    protocol_version: u16,
    called_ae_title: String,
    calling_ae_title: String,
}

fn read_association_fields(cursor: &mut Cursor<Vec<u8>>) -> Result<AssociationFields> {
    let protocol_version = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Protocol-version",
    })?;

    // 2 reserved bytes
    cursor
        .read_u16::<BigEndian>()
        .context(ReadPduFieldSnafu { field: "Reserved" })?;

    let mut ae_bytes = [0; 16];
    cursor.read_exact(&mut ae_bytes).context(ReadPduFieldSnafu {
        field: "Called-AE-title",
    })?;
    let called_ae_title = decode_text(&ae_bytes);

    cursor.read_exact(&mut ae_bytes).context(ReadPduFieldSnafu {
        field: "Calling-AE-title",
    })?;
    let calling_ae_title = decode_text(&ae_bytes);

    // 32 reserved bytes
    let mut reserved = [0; 32];
    cursor
        .read_exact(&mut reserved)
        .context(ReadPduFieldSnafu { field: "Reserved" })?;

    Ok(AssociationFields {
        protocol_version,
        called_ae_title,
        calling_ae_title,
    })
}

/// Decode an AE title or UID,
/// removing the non-significant padding.
fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

fn has_remaining(cursor: &Cursor<Vec<u8>>) -> bool {
    cursor.position() < cursor.get_ref().len() as u64
}

fn read_n<R>(reader: &mut R, bytes_to_read: usize) -> std::io::Result<Vec<u8>>
where
    R: Read,
{
    let mut result = vec![0; bytes_to_read];
    reader.read_exact(&mut result)?;
    Ok(result)
}

/// Read an item header: type, reserved byte, and 16-bit length.
fn read_item_header<R>(reader: &mut R) -> Result<(u8, u16)>
where
    R: Read,
{
    let item_type = reader
        .read_u8()
        .context(ReadPduFieldSnafu { field: "Item-type" })?;
    reader
        .read_u8()
        .context(ReadPduFieldSnafu { field: "Reserved" })?;
    let item_length = reader.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Item-length",
    })?;
    Ok((item_type, item_length))
}

fn read_pdu_variable<R>(reader: &mut R) -> Result<PduVariableItem>
where
    R: Read,
{
    let (item_type, item_length) = read_item_header(reader)?;
    let bytes = read_n(reader, item_length as usize).context(ReadPduFieldSnafu {
        field: "Item-data",
    })?;
    let mut cursor = Cursor::new(bytes);

    match item_type {
        0x10 => Ok(PduVariableItem::ApplicationContext(decode_text(
            cursor.get_ref(),
        ))),
        0x20 => {
            // presentation context (proposed):
            // id, 3 reserved bytes, then abstract and transfer syntax sub-items
            let mut fields = [0u8; 4];
            cursor.read_exact(&mut fields).context(ReadPduFieldSnafu {
                field: "Presentation-context-ID",
            })?;

            let mut abstract_syntax = None;
            let mut transfer_syntaxes = vec![];
            while has_remaining(&cursor) {
                let (sub_item_type, sub_item_length) = read_item_header(&mut cursor)?;
                let data = read_n(&mut cursor, sub_item_length as usize).context(
                    ReadPduFieldSnafu {
                        field: "Syntax-name",
                    },
                )?;
                match sub_item_type {
                    0x30 => abstract_syntax = Some(decode_text(&data)),
                    0x40 => transfer_syntaxes.push(decode_text(&data)),
                    item_type => {
                        return UnknownPresentationContextSubItemSnafu { item_type }.fail()
                    }
                }
            }
            ensure!(!transfer_syntaxes.is_empty(), MissingTransferSyntaxSnafu);

            Ok(PduVariableItem::PresentationContextProposed(
                PresentationContextProposed {
                    id: fields[0],
                    abstract_syntax: abstract_syntax.context(MissingAbstractSyntaxSnafu)?,
                    transfer_syntaxes,
                },
            ))
        }
        0x21 => {
            // presentation context (result):
            // id, reserved, result/reason, reserved, then one transfer syntax sub-item
            let mut fields = [0u8; 4];
            cursor.read_exact(&mut fields).context(ReadPduFieldSnafu {
                field: "Presentation-context-ID",
            })?;
            let reason = PresentationContextResultReason::from_code(fields[2])
                .context(InvalidPresentationContextResultReasonSnafu { code: fields[2] })?;

            let mut transfer_syntax = None;
            while has_remaining(&cursor) {
                let (sub_item_type, sub_item_length) = read_item_header(&mut cursor)?;
                let data = read_n(&mut cursor, sub_item_length as usize).context(
                    ReadPduFieldSnafu {
                        field: "Transfer-syntax-name",
                    },
                )?;
                match sub_item_type {
                    0x40 if transfer_syntax.is_none() => {
                        transfer_syntax = Some(decode_text(&data))
                    }
                    0x40 => {
                        tracing::warn!(
                            "Ignoring extra transfer syntax in presentation context {}",
                            fields[0]
                        );
                    }
                    item_type => {
                        return UnknownPresentationContextSubItemSnafu { item_type }.fail()
                    }
                }
            }

            // the transfer syntax is not significant on rejection
            let transfer_syntax = match (transfer_syntax, reason) {
                (Some(ts), _) => ts,
                (None, PresentationContextResultReason::Acceptance) => {
                    return MissingTransferSyntaxSnafu.fail()
                }
                (None, _) => String::new(),
            };

            Ok(PduVariableItem::PresentationContextResult(
                PresentationContextResult {
                    id: fields[0],
                    reason,
                    transfer_syntax,
                },
            ))
        }
        0x50 => {
            // user information
            let mut user_variables = vec![];
            while has_remaining(&cursor) {
                let (sub_item_type, sub_item_length) = read_item_header(&mut cursor)?;
                let data = read_n(&mut cursor, sub_item_length as usize).context(
                    ReadPduFieldSnafu {
                        field: "User-data",
                    },
                )?;
                user_variables.push(match sub_item_type {
                    0x51 if data.len() == 4 => UserVariableItem::MaxLength(u32::from_be_bytes([
                        data[0], data[1], data[2], data[3],
                    ])),
                    0x52 => UserVariableItem::ImplementationClassUID(decode_text(&data)),
                    0x55 => UserVariableItem::ImplementationVersionName(decode_text(&data)),
                    _ => UserVariableItem::Unknown(sub_item_type, data),
                });
            }
            Ok(PduVariableItem::UserVariables(user_variables))
        }
        _ => Ok(PduVariableItem::Unknown(item_type)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    #[rustfmt::skip]
    static RELEASE_RQ: &[u8] = &[
        0x05, 0x00, // PDU-type, reserved
        0x00, 0x00, 0x00, 0x04, // PDU-length
        0x00, 0x00, 0x00, 0x00, // reserved
    ];

    #[rustfmt::skip]
    static P_DATA: &[u8] = &[
        0x04, 0x00, // PDU-type, reserved
        0x00, 0x00, 0x00, 0x0C, // PDU-length
        0x00, 0x00, 0x00, 0x08, // item length
        0x01, // presentation context id
        0x03, // command, last fragment
        0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01,
    ];

    #[rustfmt::skip]
    static ASSOCIATE_RJ: &[u8] = &[
        0x03, 0x00, // PDU-type, reserved
        0x00, 0x00, 0x00, 0x04, // PDU-length
        0x00, // reserved
        0x01, // result: permanent
        0x01, // source: service user
        0x07, // reason: called AE title not recognized
    ];

    #[test]
    fn can_read_release_rq() {
        let pdu = read_pdu(&mut &RELEASE_RQ[..], DEFAULT_MAX_PDU, true).unwrap();
        assert_eq!(pdu, Pdu::ReleaseRQ);
    }

    #[test]
    fn can_read_p_data() {
        let pdu = read_pdu(&mut &P_DATA[..], DEFAULT_MAX_PDU, true).unwrap();
        assert_eq!(
            pdu,
            Pdu::PData {
                data: vec![PDataValue {
                    presentation_context_id: 1,
                    value_type: PDataValueType::Command,
                    is_last: true,
                    data: vec![0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01],
                }]
            }
        );
    }

    #[test]
    fn can_read_association_rj() {
        let pdu = read_pdu(&mut &ASSOCIATE_RJ[..], DEFAULT_MAX_PDU, true).unwrap();
        assert_eq!(
            pdu,
            Pdu::AssociationRJ(AssociationRJ {
                result: AssociationRJResult::Permanent,
                source: AssociationRJSource::ServiceUser(
                    AssociationRJServiceUserReason::CalledAeTitleNotRecognized
                ),
            })
        );
    }

    #[test]
    fn empty_source_has_no_pdu() {
        let res = read_pdu(&mut &[][..], DEFAULT_MAX_PDU, true);
        assert_matches!(res, Err(Error::NoPduAvailable { .. }));
    }

    #[test]
    fn truncated_pdu_is_an_error() {
        let res = read_pdu(&mut &P_DATA[..10], DEFAULT_MAX_PDU, true);
        assert_matches!(res, Err(Error::ReadPdu { .. }));
    }

    #[test]
    fn rejects_invalid_max_pdu() {
        let res = read_pdu(&mut &RELEASE_RQ[..], 1024, true);
        assert_matches!(res, Err(Error::InvalidMaxPdu { .. }));
    }

    #[test]
    fn pdu_too_large_depends_on_strict_mode() {
        let mut data = vec![0x04, 0x00];
        let pdu_length = MINIMUM_PDU_SIZE + 6;
        data.extend_from_slice(&pdu_length.to_be_bytes());
        data.extend_from_slice(&(pdu_length - 4).to_be_bytes());
        data.extend_from_slice(&[0x01, 0x00]);
        data.resize(data.len() + pdu_length as usize - 6, 0x55);

        let res = read_pdu(&mut &data[..], MINIMUM_PDU_SIZE, true);
        assert_matches!(res, Err(Error::PduTooLarge { .. }));

        let pdu = read_pdu(&mut &data[..], MINIMUM_PDU_SIZE, false).unwrap();
        match pdu {
            Pdu::PData { data } => {
                assert_eq!(data.len(), 1);
                assert_eq!(data[0].data.len(), pdu_length as usize - 6);
                assert!(!data[0].is_last);
            }
            pdu => panic!("unexpected PDU {:?}", pdu),
        }
    }

    #[test]
    fn unknown_pdu_type_is_kept() {
        let data = [0x0A, 0x00, 0x00, 0x00, 0x00, 0x02, 0x12, 0x34];
        let pdu = read_pdu(&mut &data[..], DEFAULT_MAX_PDU, true).unwrap();
        assert_eq!(
            pdu,
            Pdu::Unknown {
                pdu_type: 0x0A,
                data: vec![0x12, 0x34]
            }
        );
    }
}
