//! PDU writer module
use crate::pdu::*;
use snafu::{ensure, Backtrace, ResultExt, Snafu};
use std::io::Write;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not write PDU"))]
    WritePdu {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Field `{}` is too long ({} bytes)", field, length))]
    FieldTooLong {
        field: &'static str,
        length: usize,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Write a single PDU to the given writer.
///
/// The PDU is assembled in memory first,
/// so that its length is known before anything is written.
pub fn write_pdu<W>(writer: &mut W, pdu: &Pdu) -> Result<()>
where
    W: ?Sized + Write,
{
    let body = encode_pdu_body(pdu)?;
    ensure!(
        body.len() <= u32::MAX as usize,
        FieldTooLongSnafu {
            field: "PDU-length",
            length: body.len(),
        }
    );

    let mut header = [0u8; PDU_HEADER_SIZE as usize];
    header[0] = pdu.pdu_type();
    header[2..].copy_from_slice(&(body.len() as u32).to_be_bytes());
    writer.write_all(&header).context(WritePduSnafu)?;
    writer.write_all(&body).context(WritePduSnafu)
}

fn encode_pdu_body(pdu: &Pdu) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match pdu {
        Pdu::AssociationRQ(AssociationRQ {
            protocol_version,
            calling_ae_title,
            called_ae_title,
            application_context_name,
            presentation_contexts,
            user_variables,
        }) => {
            put_association_fields(&mut out, *protocol_version, called_ae_title, calling_ae_title)?;
            put_text_item(&mut out, 0x10, "Application-context-name", application_context_name)?;
            for pc in presentation_contexts {
                put_item(&mut out, 0x20, "Presentation-context", |item| {
                    item.extend_from_slice(&[pc.id, 0, 0, 0]);
                    put_text_item(item, 0x30, "Abstract-syntax-name", &pc.abstract_syntax)?;
                    for ts in &pc.transfer_syntaxes {
                        put_text_item(item, 0x40, "Transfer-syntax-name", ts)?;
                    }
                    Ok(())
                })?;
            }
            put_user_variables(&mut out, user_variables)?;
        }
        Pdu::AssociationAC(AssociationAC {
            protocol_version,
            calling_ae_title,
            called_ae_title,
            application_context_name,
            presentation_contexts,
            user_variables,
        }) => {
            put_association_fields(&mut out, *protocol_version, called_ae_title, calling_ae_title)?;
            put_text_item(&mut out, 0x10, "Application-context-name", application_context_name)?;
            for pc in presentation_contexts {
                put_item(&mut out, 0x21, "Presentation-context", |item| {
                    item.extend_from_slice(&[pc.id, 0, pc.reason.code(), 0]);
                    put_text_item(item, 0x40, "Transfer-syntax-name", &pc.transfer_syntax)
                })?;
            }
            put_user_variables(&mut out, user_variables)?;
        }
        Pdu::AssociationRJ(AssociationRJ { result, source }) => {
            let (source, reason) = source.codes();
            out.extend_from_slice(&[0, result.code(), source, reason]);
        }
        Pdu::PData { data } => {
            for pdv in data {
                let item_length = pdv.data.len() + 2;
                ensure!(
                    item_length <= u32::MAX as usize,
                    FieldTooLongSnafu {
                        field: "Presentation-data-value",
                        length: pdv.data.len(),
                    }
                );
                out.extend_from_slice(&(item_length as u32).to_be_bytes());
                out.push(pdv.presentation_context_id);
                out.push(pdv.control_header());
                out.extend_from_slice(&pdv.data);
            }
        }
        Pdu::ReleaseRQ | Pdu::ReleaseRP => {
            out.extend_from_slice(&[0; 4]);
        }
        Pdu::AbortRQ { source } => {
            let (source, reason) = source.codes();
            out.extend_from_slice(&[0, 0, source, reason]);
        }
        Pdu::Unknown { data, .. } => {
            out.extend_from_slice(data);
        }
    }
    Ok(out)
}

/// Protocol version, reserved bytes, AE titles and the 32 reserved bytes
/// which open an A-ASSOCIATE-RQ or -AC PDU.
fn put_association_fields(
    out: &mut Vec<u8>,
    protocol_version: u16,
    called_ae_title: &str,
    calling_ae_title: &str,
) -> Result<()> {
    out.extend_from_slice(&protocol_version.to_be_bytes());
    out.extend_from_slice(&[0; 2]);
    put_ae_title(out, "Called-AE-title", called_ae_title)?;
    put_ae_title(out, "Calling-AE-title", calling_ae_title)?;
    out.extend_from_slice(&[0; 32]);
    Ok(())
}

/// AE titles always take 16 bytes, padded with trailing spaces.
fn put_ae_title(out: &mut Vec<u8>, field: &'static str, ae_title: &str) -> Result<()> {
    let bytes = ae_title.as_bytes();
    ensure!(
        bytes.len() <= 16,
        FieldTooLongSnafu {
            field,
            length: bytes.len(),
        }
    );
    out.extend_from_slice(bytes);
    out.extend(std::iter::repeat(b' ').take(16 - bytes.len()));
    Ok(())
}

/// Write an item with a 16-bit length, built by the given function.
fn put_item<F>(out: &mut Vec<u8>, item_type: u8, field: &'static str, build: F) -> Result<()>
where
    F: FnOnce(&mut Vec<u8>) -> Result<()>,
{
    let mut item = Vec::new();
    build(&mut item)?;
    ensure!(
        item.len() <= u16::MAX as usize,
        FieldTooLongSnafu {
            field,
            length: item.len(),
        }
    );
    out.push(item_type);
    out.push(0);
    out.extend_from_slice(&(item.len() as u16).to_be_bytes());
    out.extend_from_slice(&item);
    Ok(())
}

fn put_text_item(out: &mut Vec<u8>, item_type: u8, field: &'static str, text: &str) -> Result<()> {
    put_item(out, item_type, field, |item| {
        item.extend_from_slice(text.as_bytes());
        Ok(())
    })
}

fn put_user_variables(out: &mut Vec<u8>, user_variables: &[UserVariableItem]) -> Result<()> {
    put_item(out, 0x50, "User-information", |item| {
        for var in user_variables {
            match var {
                UserVariableItem::MaxLength(len) => {
                    put_item(item, 0x51, "Maximum-length-received", |sub| {
                        sub.extend_from_slice(&len.to_be_bytes());
                        Ok(())
                    })?;
                }
                UserVariableItem::ImplementationClassUID(uid) => {
                    put_text_item(item, 0x52, "Implementation-class-uid", uid)?;
                }
                UserVariableItem::ImplementationVersionName(name) => {
                    put_text_item(item, 0x55, "Implementation-version-name", name)?;
                }
                UserVariableItem::Unknown(item_type, data) => {
                    put_item(item, *item_type, "User-data", |sub| {
                        sub.extend_from_slice(data);
                        Ok(())
                    })?;
                }
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::reader::read_pdu;
    use matches::assert_matches;

    fn round_trip(pdu: &Pdu) -> Pdu {
        let mut bytes = Vec::new();
        write_pdu(&mut bytes, pdu).unwrap();
        read_pdu(&mut &bytes[..], DEFAULT_MAX_PDU, true).unwrap()
    }

    #[test]
    fn writes_release_rp() {
        let mut bytes = Vec::new();
        write_pdu(&mut bytes, &Pdu::ReleaseRP).unwrap();
        assert_eq!(bytes, [0x06, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn writes_abort() {
        let mut bytes = Vec::new();
        let pdu = Pdu::AbortRQ {
            source: AbortRQSource::ServiceProvider(AbortRQServiceProviderReason::UnexpectedPdu),
        };
        write_pdu(&mut bytes, &pdu).unwrap();
        #[rustfmt::skip]
        let expected = [
            0x07, 0x00, 0x00, 0x00, 0x00, 0x04,
            0x00, 0x00, // reserved
            0x02, // service provider
            0x02, // unexpected PDU
        ];
        assert_eq!(bytes, expected);
        assert_eq!(round_trip(&pdu), pdu);
    }

    #[test]
    fn association_rq_layout() {
        let pdu = Pdu::AssociationRQ(AssociationRQ {
            protocol_version: 1,
            calling_ae_title: "STORE-SCU".to_string(),
            called_ae_title: "ANY-SCP".to_string(),
            application_context_name: APPLICATION_CONTEXT_NAME.to_string(),
            presentation_contexts: vec![PresentationContextProposed {
                id: 1,
                abstract_syntax: "1.2.840.10008.1.1".to_string(),
                transfer_syntaxes: vec!["1.2.840.10008.1.2".to_string()],
            }],
            user_variables: vec![
                UserVariableItem::MaxLength(16_384),
                UserVariableItem::ImplementationClassUID("2.25.1".to_string()),
                UserVariableItem::Unknown(0x58, vec![1, 2, 3]),
            ],
        });
        let mut bytes = Vec::new();
        write_pdu(&mut bytes, &pdu).unwrap();

        assert_eq!(bytes[0], 0x01);
        let pdu_length = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        assert_eq!(pdu_length as usize, bytes.len() - 6);
        // protocol version
        assert_eq!(&bytes[6..8], &[0x00, 0x01]);
        // AE titles padded with spaces
        assert_eq!(&bytes[10..26], b"ANY-SCP         ");
        assert_eq!(&bytes[26..42], b"STORE-SCU       ");
        // application context item right after the reserved bytes
        assert_eq!(bytes[74], 0x10);
        assert_eq!(&bytes[76..78], &[0x00, 21]);

        assert_eq!(round_trip(&pdu), pdu);
    }

    #[test]
    fn association_ac_round_trip() {
        let pdu = Pdu::AssociationAC(AssociationAC {
            protocol_version: 1,
            calling_ae_title: "STORE-SCU".to_string(),
            called_ae_title: "STORE-SCP".to_string(),
            application_context_name: APPLICATION_CONTEXT_NAME.to_string(),
            presentation_contexts: vec![
                PresentationContextResult {
                    id: 1,
                    reason: PresentationContextResultReason::Acceptance,
                    transfer_syntax: "1.2.840.10008.1.2.1".to_string(),
                },
                PresentationContextResult {
                    id: 3,
                    reason: PresentationContextResultReason::AbstractSyntaxNotSupported,
                    transfer_syntax: "1.2.840.10008.1.2".to_string(),
                },
            ],
            user_variables: vec![
                UserVariableItem::MaxLength(0),
                UserVariableItem::ImplementationVersionName("DCMNET".to_string()),
            ],
        });
        assert_eq!(round_trip(&pdu), pdu);
    }

    #[test]
    fn p_data_with_several_values() {
        let pdu = Pdu::PData {
            data: vec![
                PDataValue {
                    presentation_context_id: 1,
                    value_type: PDataValueType::Command,
                    is_last: true,
                    data: vec![1; 10],
                },
                PDataValue {
                    presentation_context_id: 1,
                    value_type: PDataValueType::Data,
                    is_last: false,
                    data: vec![],
                },
            ],
        };
        let mut bytes = Vec::new();
        write_pdu(&mut bytes, &pdu).unwrap();
        assert_eq!(bytes.len(), 6 + (4 + 2 + 10) + (4 + 2));
        assert_eq!(round_trip(&pdu), pdu);
    }

    #[test]
    fn ae_title_too_long() {
        let pdu = Pdu::AssociationRQ(AssociationRQ {
            protocol_version: 1,
            calling_ae_title: "A-VERY-LONG-AE-TITLE".to_string(),
            called_ae_title: "ANY-SCP".to_string(),
            application_context_name: APPLICATION_CONTEXT_NAME.to_string(),
            presentation_contexts: vec![],
            user_variables: vec![],
        });
        let res = write_pdu(&mut Vec::<u8>::new(), &pdu);
        assert_matches!(
            res,
            Err(Error::FieldTooLong {
                field: "Calling-AE-title",
                ..
            })
        );
    }
}
