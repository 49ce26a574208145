//! Sending batches between two nodes over loopback.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dcmnet_core::VR;
use dcmnet_dictionary_std::{tags, uids};
use dcmnet_dimse::{message_pdus, CommandMessage, MessageType, PDataAssembler, Status};
use dcmnet_node::{
    AssociateOptions, Connection, ConnectionOptions, Error, PeerOptions, StoreError,
    StoreRequest, StoreSource,
};
use dcmnet_object::{FileMetaTableBuilder, InMemDicomObject};
use dcmnet_ul::{Pdu, ServerAssociationOptions};
use matches::assert_matches;

const SCP_AE_TITLE: &str = "STORE-SCP";

fn dicom_file(sop_instance_uid: &str) -> Vec<u8> {
    let meta = FileMetaTableBuilder::new()
        .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
        .media_storage_sop_class_uid(uids::CT_IMAGE_STORAGE)
        .media_storage_sop_instance_uid(sop_instance_uid)
        .build()
        .unwrap();
    let mut obj = InMemDicomObject::new_empty();
    obj.put_str(tags::SOP_CLASS_UID, VR::UI, uids::CT_IMAGE_STORAGE);
    obj.put_str(tags::SOP_INSTANCE_UID, VR::UI, sop_instance_uid);
    obj.put_str(tags::PATIENT_NAME, VR::PN, "Doe^John");
    obj.put_u16(tags::ROWS, VR::US, 512);

    let mut out = vec![0; 128];
    obj.with_meta(meta).write_all(&mut out).unwrap();
    out
}

/// Start a storage provider node on a free port,
/// recording the instance UIDs received and answering with `status`.
fn spawn_scp(
    status: impl Fn(&str) -> Status + Send + Sync + 'static,
) -> (Connection, u16, Arc<Mutex<Vec<String>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let scp = Connection::new(ConnectionOptions::new());
    let log = Arc::clone(&received);
    let added = scp.add_peer(
        PeerOptions::new(SCP_AE_TITLE, "127.0.0.1", 0)
            .server(true)
            .provider(move |request: StoreRequest<'_>| {
                assert!(!request.data.is_empty());
                assert_eq!(request.transfer_syntax, uids::EXPLICIT_VR_LITTLE_ENDIAN);
                log.lock()
                    .unwrap()
                    .push(request.sop_instance_uid.to_string());
                status(request.sop_instance_uid)
            }),
    );
    assert!(added);
    let port = scp.listen_addr(SCP_AE_TITLE).unwrap().port();
    (scp, port, received)
}

fn scu(port: u16) -> Connection {
    let scu = Connection::new(
        ConnectionOptions::new()
            .calling_ae_title("STORE-SCU")
            .connection_timeout(Duration::from_secs(5)),
    );
    assert!(scu.add_peer(PeerOptions::new(SCP_AE_TITLE, "127.0.0.1", port).default_peer(true)));
    scu
}

async fn wait_all_closed(connection: &Connection) {
    for _ in 0..100 {
        if connection.all_closed() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("sockets still open: {:?}", connection.select_peer(SCP_AE_TITLE));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreadable_file_does_not_stop_batch() {
    let (scp, port, received) = spawn_scp(|_| Status::SUCCESS);
    let scu = scu(port);

    let dir = tempfile::tempdir().unwrap();
    let files = [
        ("1.dcm", dicom_file("2.25.1")),
        ("2.dcm", b"NOT A DICOM FILE AT ALL".repeat(10)),
        ("3.dcm", dicom_file("2.25.3")),
    ];
    let mut sources = Vec::new();
    for (name, data) in &files {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        sources.push(StoreSource::file(path));
    }

    let outcomes = scu.store_instances(sources).collect().await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_matches!(outcomes[0].result, Ok(status) if status.is_success());
    assert_matches!(outcomes[1].result, Err(StoreError::ReadMeta { .. }));
    assert_matches!(outcomes[2].result, Ok(status) if status.is_success());
    assert!(outcomes[1].source.to_string().ends_with("2.dcm"));

    assert_eq!(*received.lock().unwrap(), vec!["2.25.1", "2.25.3"]);
    assert!(scu.all_closed());
    wait_all_closed(&scp).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failure_status_is_reported_per_instance() {
    let (scp, port, received) = spawn_scp(|uid| {
        if uid == "2.25.20" {
            Status(0xA700)
        } else {
            Status::SUCCESS
        }
    });
    let scu = scu(port);

    let outcomes = scu
        .store_instances(vec![
            StoreSource::buffer("first", dicom_file("2.25.10")),
            StoreSource::buffer("second", dicom_file("2.25.20")),
            StoreSource::buffer("third", dicom_file("2.25.30")),
        ])
        .collect()
        .await
        .unwrap();

    assert_matches!(outcomes[0].result, Ok(_));
    assert_matches!(
        outcomes[1].result,
        Err(StoreError::Failed { status, .. }) if status == Status(0xA700)
    );
    assert_matches!(outcomes[2].result, Ok(_));
    assert_eq!(received.lock().unwrap().len(), 3);
    wait_all_closed(&scp).await;
}

#[tokio::test]
async fn unknown_peer_fails_before_connecting() {
    let scu = Connection::new(ConnectionOptions::new().calling_ae_title("STORE-SCU"));
    let handle = scu.store_instances_with(
        vec![StoreSource::buffer("only", dicom_file("2.25.1"))],
        AssociateOptions::new().host_ae("NOBODY"),
    );
    assert_matches!(handle.finish().await, Err(Error::UnknownPeer { .. }));
    assert!(scu.all_closed());
}

#[tokio::test]
async fn empty_batch_needs_no_association() {
    let scu = Connection::new(ConnectionOptions::new());
    let outcomes = scu.store_instances(Vec::new()).collect().await.unwrap();
    assert!(outcomes.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reset_closes_listener_and_sockets() {
    let (scp, port, _) = spawn_scp(|_| Status::SUCCESS);
    let scu = scu(port);

    let association = scu
        .associate(
            AssociateOptions::new()
                .with_context(uids::CT_IMAGE_STORAGE, [uids::EXPLICIT_VR_LITTLE_ENDIAN]),
        )
        .await
        .unwrap();
    assert_eq!(association.peer_ae_title(), SCP_AE_TITLE);
    assert_eq!(association.presentation_contexts().len(), 1);
    assert_eq!(
        scu.select_peer(SCP_AE_TITLE).unwrap().sockets,
        vec![association.socket_id()]
    );
    assert!(!scu.all_closed());

    scp.reset();
    assert!(scp.all_closed());
    assert_eq!(scp.listen_addr(SCP_AE_TITLE), None);
    assert_matches!(scp.select_peer(SCP_AE_TITLE), Err(Error::UnknownPeer { .. }));

    drop(association);
    assert!(scu.all_closed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_transfer_syntax_fails_whole_batch() {
    let (scp, port, received) = spawn_scp(|_| Status::SUCCESS);
    let scu = scu(port);

    let meta = FileMetaTableBuilder::new()
        .transfer_syntax("")
        .media_storage_sop_class_uid(uids::SECONDARY_CAPTURE_IMAGE_STORAGE)
        .media_storage_sop_instance_uid("2.25.2")
        .build()
        .unwrap();
    let mut no_syntax = vec![0; 128];
    meta.write(&mut no_syntax).unwrap();

    let handle = scu.store_instances(vec![
        StoreSource::buffer("first", dicom_file("2.25.1")),
        StoreSource::buffer("second", no_syntax),
    ]);
    // an association attempt would have failed otherwise
    assert_matches!(handle.collect().await, Err(Error::NoTransferSyntax { .. }));
    assert!(received.lock().unwrap().is_empty());
    assert!(scu.all_closed());
    assert!(scp.all_closed());
}

/// Serve one association by hand,
/// checking that nothing arrives while a store request is unanswered.
async fn serve_one_at_a_time(listener: tokio::net::TcpListener) -> Vec<String> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut association = ServerAssociationOptions::new()
        .ae_title(SCP_AE_TITLE)
        .with_abstract_syntax(uids::CT_IMAGE_STORAGE)
        .establish_async(stream)
        .await
        .unwrap();
    let max_pdu_length = association.requestor_max_pdu_length();

    let mut assembler = PDataAssembler::new();
    let mut command = None;
    let mut received = Vec::new();
    loop {
        match association.receive().await.unwrap() {
            Pdu::PData { data } => {
                for pdv in data {
                    let Some(message) = assembler.push(pdv) else {
                        continue;
                    };
                    if message.message_type == MessageType::Command {
                        command = Some(CommandMessage::decode(&message.data).unwrap());
                        continue;
                    }
                    let request = command.take().unwrap();
                    let uid = request.affected_sop_instance_uid().unwrap();

                    let next =
                        tokio::time::timeout(Duration::from_millis(300), association.receive())
                            .await;
                    assert!(next.is_err(), "got {:?} before answering {}", next, uid);

                    let response = CommandMessage::c_store_rsp(
                        request.message_id().unwrap(),
                        uids::CT_IMAGE_STORAGE,
                        &uid,
                        Status::SUCCESS,
                    );
                    let pdus = message_pdus(
                        &response,
                        None,
                        message.presentation_context_id,
                        max_pdu_length,
                    )
                    .unwrap();
                    for pdu in &pdus {
                        association.send(pdu).await.unwrap();
                    }
                    received.push(uid);
                }
            }
            Pdu::ReleaseRQ => {
                association.send(&Pdu::ReleaseRP).await.unwrap();
                return received;
            }
            pdu => panic!("unexpected PDU {:?}", pdu),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn next_request_waits_for_response() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let scp = tokio::spawn(serve_one_at_a_time(listener));
    let scu = scu(port);

    let outcomes = scu
        .store_instances(vec![
            StoreSource::buffer("first", dicom_file("2.25.1")),
            StoreSource::buffer("second", dicom_file("2.25.2")),
            StoreSource::buffer("third", dicom_file("2.25.3")),
        ])
        .collect()
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 3);
    for outcome in &outcomes {
        assert_matches!(outcome.result, Ok(status) if status.is_success());
    }
    assert_eq!(scp.await.unwrap(), vec!["2.25.1", "2.25.2", "2.25.3"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn listener_stops_after_first_disconnect() {
    let scp = Connection::new(ConnectionOptions::new());
    assert!(scp.add_peer(
        PeerOptions::new(SCP_AE_TITLE, "127.0.0.1", 0)
            .server(true)
            .close_on_disconnect(true)
    ));
    let port = scp.listen_addr(SCP_AE_TITLE).unwrap().port();
    let scu = scu(port);

    let outcomes = scu
        .store_instances(vec![StoreSource::buffer("only", dicom_file("2.25.1"))])
        .collect()
        .await
        .unwrap();
    assert_matches!(outcomes[0].result, Ok(_));

    tokio::time::timeout(Duration::from_secs(5), scp.stopped_listening(SCP_AE_TITLE))
        .await
        .unwrap();
    assert_eq!(scp.listen_addr(SCP_AE_TITLE), None);
    // not listening anymore, so this returns at once
    scp.stopped_listening(SCP_AE_TITLE).await;
}
