//! Service class provider side of server-role peers.
//!
//! Every association accepted on the listener of a server-role peer
//! is served by [`serve_association`],
//! which answers C-STORE requests through a [`StoreServiceProvider`].
use dcmnet_dimse::{
    message_pdus, AssembledMessage, CommandField, CommandMessage, MessageType, PDataAssembler,
    Status,
};
use dcmnet_ul::association::AsyncServerAssociation;
use dcmnet_ul::pdu::PresentationContextNegotiated;
use dcmnet_ul::Pdu;
use snafu::ResultExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    AbortedSnafu, ClosedSnafu, MessageSnafu, ReceiveMessageSnafu, Result, SendMessageSnafu,
    UnexpectedPduSnafu,
};

/// An incoming C-STORE request, with its data set still encoded.
#[derive(Debug, Clone, Copy)]
pub struct StoreRequest<'a> {
    /// the AE title of the requesting node
    pub calling_ae_title: &'a str,
    pub sop_class_uid: &'a str,
    pub sop_instance_uid: &'a str,
    /// the transfer syntax of the presentation context used
    pub transfer_syntax: &'a str,
    /// the encoded data set
    pub data: &'a [u8],
}

/// Handler of incoming C-STORE requests.
pub trait StoreServiceProvider: Send + Sync {
    /// Process a store request, returning the status of the response.
    fn store(&self, request: StoreRequest<'_>) -> Status;
}

/// A store provider which acknowledges every instance
/// without keeping it.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AcknowledgeStore;

impl StoreServiceProvider for AcknowledgeStore {
    fn store(&self, request: StoreRequest<'_>) -> Status {
        info!(
            "Received instance {} ({}, {} bytes) from {}",
            request.sop_instance_uid,
            request.sop_class_uid,
            request.data.len(),
            request.calling_ae_title
        );
        Status::SUCCESS
    }
}

impl<F> StoreServiceProvider for F
where
    F: Fn(StoreRequest<'_>) -> Status + Send + Sync,
{
    fn store(&self, request: StoreRequest<'_>) -> Status {
        self(request)
    }
}

/// Serve an accepted association until it is released, aborted,
/// or closed through the `closed` signal.
pub(crate) async fn serve_association(
    mut association: AsyncServerAssociation,
    provider: &dyn StoreServiceProvider,
    mut closed: watch::Receiver<bool>,
) -> Result<()> {
    info!("New association from {}", association.client_ae_title());
    debug!(
        "Presentation contexts: {:?}",
        association.presentation_contexts()
    );

    let mut assembler = PDataAssembler::new();
    let mut pending: Option<CommandMessage> = None;

    loop {
        let pdu = tokio::select! {
            pdu = association.receive() => pdu.context(ReceiveMessageSnafu)?,
            _ = closed.changed() => {
                let _ = association.abort().await;
                return ClosedSnafu.fail();
            }
        };
        match pdu {
            Pdu::PData { data } => {
                for pdv in data {
                    if let Some(message) = assembler.push(pdv) {
                        if let Some((response, pc_id)) =
                            handle_message(&association, provider, &mut pending, message)?
                        {
                            send_response(&mut association, &response, pc_id).await?;
                        }
                    }
                }
            }
            Pdu::ReleaseRQ => {
                association
                    .send(&Pdu::ReleaseRP)
                    .await
                    .context(SendMessageSnafu)?;
                info!("Released association with {}", association.client_ae_title());
                let _ = association.close().await;
                return Ok(());
            }
            Pdu::AbortRQ { source } => {
                warn!("Association aborted by peer: {:?}", source);
                return AbortedSnafu.fail();
            }
            pdu => {
                let _ = association.abort().await;
                return UnexpectedPduSnafu { pdu }.fail();
            }
        }
    }
}

/// Process a reassembled message,
/// producing the response to send back if one is due.
fn handle_message(
    association: &AsyncServerAssociation,
    provider: &dyn StoreServiceProvider,
    pending: &mut Option<CommandMessage>,
    message: AssembledMessage,
) -> Result<Option<(CommandMessage, u8)>> {
    let AssembledMessage {
        presentation_context_id: pc_id,
        message_type,
        data,
    } = message;

    match message_type {
        MessageType::Command => {
            let command = CommandMessage::decode(&data).context(MessageSnafu)?;
            debug!("Received {} on presentation context {}", command.kind(), pc_id);
            if command.data_set_present() {
                *pending = Some(command);
                return Ok(None);
            }
            Ok(respond_without_data(&command).map(|rsp| (rsp, pc_id)))
        }
        MessageType::DataSet => {
            let Some(command) = pending.take() else {
                warn!("Ignoring data set without a preceding command");
                return Ok(None);
            };
            if command.kind() != CommandField::CStoreRq {
                return Ok(respond_without_data(&command).map(|rsp| (rsp, pc_id)));
            }

            let sop_class_uid = command.affected_sop_class_uid().unwrap_or_default();
            let sop_instance_uid = command.affected_sop_instance_uid().unwrap_or_default();
            let transfer_syntax = context_transfer_syntax(association.presentation_contexts(), pc_id);
            let status = provider.store(StoreRequest {
                calling_ae_title: association.client_ae_title(),
                sop_class_uid,
                sop_instance_uid: &sop_instance_uid,
                transfer_syntax,
                data: &data,
            });
            let message_id = command.message_id().unwrap_or_default();
            Ok(Some((
                CommandMessage::c_store_rsp(message_id, sop_class_uid, &sop_instance_uid, status),
                pc_id,
            )))
        }
    }
}

/// Build the response to a command which this provider does not serve.
fn respond_without_data(command: &CommandMessage) -> Option<CommandMessage> {
    let message_id = command.message_id()?;
    let sop_class_uid = command.affected_sop_class_uid().unwrap_or_default();
    let status = Status::UNABLE_TO_PROCESS;
    let response = match command.kind() {
        CommandField::CStoreRq => CommandMessage::c_store_rsp(
            message_id,
            sop_class_uid,
            &command.affected_sop_instance_uid().unwrap_or_default(),
            status,
        ),
        CommandField::CFindRq => CommandMessage::c_find_rsp(message_id, sop_class_uid, status),
        CommandField::CGetRq => CommandMessage::c_get_rsp(message_id, sop_class_uid, status),
        CommandField::CMoveRq => CommandMessage::c_move_rsp(message_id, sop_class_uid, status),
        kind => {
            debug!("Ignoring {}", kind);
            return None;
        }
    };
    warn!("Unable to process {}, answering with {}", command.kind(), status);
    Some(response)
}

fn context_transfer_syntax(contexts: &[PresentationContextNegotiated], pc_id: u8) -> &str {
    contexts
        .iter()
        .find(|pc| pc.id == pc_id)
        .map(|pc| pc.transfer_syntax.as_str())
        .unwrap_or_default()
}

async fn send_response(
    association: &mut AsyncServerAssociation,
    response: &CommandMessage,
    pc_id: u8,
) -> Result<()> {
    let pdus = message_pdus(response, None, pc_id, association.requestor_max_pdu_length())
        .context(MessageSnafu)?;
    for pdu in &pdus {
        association.send(pdu).await.context(SendMessageSnafu)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmnet_dimse::{Priority, SubOperations};

    #[test]
    fn unsupported_requests_fail_with_unable_to_process() {
        let rq = CommandMessage::c_find_rq(4, Priority::Medium, "1.2.840.10008.5.1.4.1.2.2.1");
        let rsp = respond_without_data(&rq).unwrap();
        assert_eq!(rsp.kind(), CommandField::CFindRsp);
        assert_eq!(rsp.message_id_being_responded_to(), Some(4));
        assert_eq!(rsp.status(), Some(Status(0xC000)));
        assert!(!rsp.data_set_present());

        let rq = CommandMessage::c_move_rq(5, Priority::Low, "1.2.3", "DEST");
        let rsp = respond_without_data(&rq).unwrap();
        assert_eq!(rsp.kind(), CommandField::CMoveRsp);
        assert_eq!(rsp.sub_operations(), SubOperations::default());
    }

    #[test]
    fn cancel_and_responses_are_ignored() {
        assert!(respond_without_data(&CommandMessage::c_cancel_rq(4)).is_none());
        let rsp = CommandMessage::c_store_rsp(1, "1.2.3", "4.5.6", Status::SUCCESS);
        assert!(respond_without_data(&rsp).is_none());
    }

    #[test]
    fn closures_are_providers() {
        let provider = |request: StoreRequest<'_>| {
            if request.data.is_empty() {
                Status(0xA700)
            } else {
                Status::SUCCESS
            }
        };
        let request = StoreRequest {
            calling_ae_title: "SCU",
            sop_class_uid: "1.2.3",
            sop_instance_uid: "4.5.6",
            transfer_syntax: "1.2.840.10008.1.2",
            data: &[],
        };
        assert_eq!(provider.store(request), Status(0xA700));
        assert_eq!(AcknowledgeStore.store(request), Status::SUCCESS);
    }
}
