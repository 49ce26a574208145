use dcmnet_ul::{
    association::client::ClientAssociationOptions,
    pdu::{
        AssociationRJResult, AssociationRJServiceUserReason, AssociationRJSource, PDataValue,
        PDataValueType, PresentationContextResultReason,
    },
    Pdu, ServerAssociationOptions,
};
use rstest::rstest;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::JoinHandle;

type Result<T, E = Box<dyn std::error::Error + Send + Sync + 'static>> =
    std::result::Result<T, E>;

static SCU_AE_TITLE: &str = "STORE-SCU";
static SCP_AE_TITLE: &str = "STORE-SCP";

const IMPLICIT_VR_LE: &str = "1.2.840.10008.1.2";
const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";
const JPEG_BASELINE: &str = "1.2.840.10008.1.2.4.50";
const VERIFICATION: &str = "1.2.840.10008.1.1";
const SECONDARY_CAPTURE: &str = "1.2.840.10008.5.1.4.1.1.7";

/// Run an acceptor for a single connection,
/// echoing every P-Data PDU back until released.
fn spawn_scp(
    options: ServerAssociationOptions<'static, impl dcmnet_ul::association::AccessControl + Send + 'static>,
) -> Result<(JoinHandle<Result<Vec<Pdu>>>, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;

    let handle = std::thread::spawn(move || -> Result<Vec<Pdu>> {
        let (stream, _addr) = listener.accept()?;
        let mut association = options.establish(stream)?;
        let mut received = Vec::new();
        loop {
            let pdu = association.receive()?;
            match pdu {
                Pdu::PData { .. } => {
                    association.send(&pdu)?;
                    received.push(pdu);
                }
                Pdu::ReleaseRQ => {
                    association.send(&Pdu::ReleaseRP)?;
                    break;
                }
                pdu => {
                    received.push(pdu);
                    break;
                }
            }
        }
        Ok(received)
    });

    Ok((handle, addr))
}

fn scp_options() -> ServerAssociationOptions<'static, dcmnet_ul::association::AcceptCalledAeTitle> {
    ServerAssociationOptions::new()
        .accept_called_ae_title()
        .ae_title(SCP_AE_TITLE)
        .with_abstract_syntax(VERIFICATION)
        .with_abstract_syntax(SECONDARY_CAPTURE)
}

#[test]
fn scu_scp_negotiation_and_release() -> Result<()> {
    let (scp_handle, scp_addr) = spawn_scp(scp_options())?;

    let association = ClientAssociationOptions::new()
        .calling_ae_title(SCU_AE_TITLE)
        .called_ae_title(SCP_AE_TITLE)
        .with_presentation_context(SECONDARY_CAPTURE, vec![JPEG_BASELINE, EXPLICIT_VR_LE])
        .with_presentation_context("1.2.3.4.5.6", vec![IMPLICIT_VR_LE])
        .with_abstract_syntax(VERIFICATION)
        .establish(scp_addr)?;

    let contexts = association.presentation_contexts();
    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[0].id, 1);
    assert_eq!(contexts[0].abstract_syntax, SECONDARY_CAPTURE);
    assert_eq!(contexts[0].transfer_syntax, EXPLICIT_VR_LE);
    assert_eq!(contexts[0].reason, PresentationContextResultReason::Acceptance);
    assert_eq!(contexts[1].id, 5);
    assert_eq!(contexts[1].abstract_syntax, VERIFICATION);
    assert_eq!(association.peer_ae_title(), SCP_AE_TITLE);

    association.release()?;

    let received = scp_handle.join().expect("SCP panicked")?;
    assert!(received.is_empty());
    Ok(())
}

#[test]
fn called_ae_title_in_address() -> Result<()> {
    let (scp_handle, scp_addr) = spawn_scp(scp_options())?;

    let association = ClientAssociationOptions::new()
        .with_abstract_syntax(VERIFICATION)
        .establish_with(&format!("{}@{}", SCP_AE_TITLE, scp_addr))?;
    association.release()?;

    scp_handle.join().expect("SCP panicked")?;
    Ok(())
}

#[test]
fn scp_rejects_unknown_called_ae_title() -> Result<()> {
    let (scp_handle, scp_addr) = spawn_scp(scp_options())?;

    let res = ClientAssociationOptions::new()
        .called_ae_title("SOMEONE-ELSE")
        .with_abstract_syntax(VERIFICATION)
        .establish(scp_addr);

    match res {
        Err(dcmnet_ul::association::Error::Rejected { association_rj, .. }) => {
            assert_eq!(association_rj.result, AssociationRJResult::Permanent);
            assert_eq!(
                association_rj.source,
                AssociationRJSource::ServiceUser(
                    AssociationRJServiceUserReason::CalledAeTitleNotRecognized
                )
            );
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("association should have been rejected"),
    }

    let scp_result = scp_handle.join().expect("SCP panicked");
    assert!(scp_result.is_err());
    Ok(())
}

#[test]
fn no_accepted_presentation_context_fails() -> Result<()> {
    let (scp_handle, scp_addr) = spawn_scp(scp_options())?;

    let res = ClientAssociationOptions::new()
        .called_ae_title(SCP_AE_TITLE)
        .with_presentation_context(SECONDARY_CAPTURE, vec![JPEG_BASELINE])
        .establish(scp_addr);

    assert!(matches!(
        res,
        Err(dcmnet_ul::association::Error::NoAcceptedPresentationContexts { .. })
    ));

    // the acceptor receives the abort
    let received = scp_handle.join().expect("SCP panicked")?;
    assert!(matches!(received.as_slice(), [Pdu::AbortRQ { .. }]));
    Ok(())
}

#[test]
fn promiscuous_scp_accepts_any_abstract_syntax() -> Result<()> {
    let (scp_handle, scp_addr) =
        spawn_scp(ServerAssociationOptions::new().promiscuous(true))?;

    let association = ClientAssociationOptions::new()
        .with_abstract_syntax("1.2.3.4.5.6.7")
        .establish(scp_addr)?;
    assert_eq!(association.presentation_contexts()[0].abstract_syntax, "1.2.3.4.5.6.7");
    association.release()?;

    scp_handle.join().expect("SCP panicked")?;
    Ok(())
}

#[test]
fn pdata_round_trip() -> Result<()> {
    let (scp_handle, scp_addr) = spawn_scp(scp_options())?;

    let mut association = ClientAssociationOptions::new()
        .called_ae_title(SCP_AE_TITLE)
        .with_abstract_syntax(SECONDARY_CAPTURE)
        .establish(scp_addr)?;

    let pc_id = association.presentation_contexts()[0].id;
    association.send(&Pdu::PData {
        data: vec![PDataValue {
            presentation_context_id: pc_id,
            value_type: PDataValueType::Command,
            is_last: true,
            data: vec![0x55; 64],
        }],
    })?;
    match association.receive()? {
        Pdu::PData { data } => {
            assert_eq!(data.len(), 1);
            assert_eq!(data[0].value_type, PDataValueType::Command);
            assert_eq!(data[0].data, vec![0x55; 64]);
        }
        pdu => panic!("unexpected PDU {:?}", pdu),
    }

    association.release()?;
    let received = scp_handle.join().expect("SCP panicked")?;
    assert_eq!(received.len(), 1);
    Ok(())
}

#[rstest]
#[case(0)]
#[case(100)]
#[case(16_378)]
#[case(40_000)]
fn pdata_writer_over_the_wire(#[case] size: usize) -> Result<()> {
    let (scp_handle, scp_addr) = spawn_scp(scp_options())?;

    let mut association = ClientAssociationOptions::new()
        .called_ae_title(SCP_AE_TITLE)
        .with_abstract_syntax(SECONDARY_CAPTURE)
        .establish(scp_addr)?;
    let pc_id = association.presentation_contexts()[0].id;

    let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    {
        let mut writer = association.send_pdata(pc_id);
        writer.write_all(&payload)?;
        writer.finish()?;
    }

    // the acceptor echoes every fragment back
    let mut echoed = Vec::new();
    {
        let mut reader = association.receive_pdata();
        reader.read_to_end(&mut echoed)?;
        assert_eq!(reader.presentation_context_id(), Some(pc_id));
    }
    assert_eq!(echoed, payload);

    association.release()?;
    let received = scp_handle.join().expect("SCP panicked")?;
    let expected_fragments = std::cmp::max(1, (size + 16_377) / 16_378);
    assert_eq!(received.len(), expected_fragments);
    Ok(())
}
