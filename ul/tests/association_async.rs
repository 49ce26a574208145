#![cfg(feature = "async")]

use dcmnet_ul::{
    association::{client::ClientAssociationOptions, PDataFragments},
    pdu::{PDataValueType, MINIMUM_PDU_SIZE},
    Pdu, ServerAssociationOptions,
};
use std::net::SocketAddr;

type Result<T, E = Box<dyn std::error::Error + Send + Sync + 'static>> =
    std::result::Result<T, E>;

static SCP_AE_TITLE: &str = "ASYNC-SCP";
const SECONDARY_CAPTURE: &str = "1.2.840.10008.5.1.4.1.1.7";
const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";

async fn spawn_scp() -> Result<(tokio::task::JoinHandle<Result<usize>>, SocketAddr)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let options = ServerAssociationOptions::new()
        .accept_called_ae_title()
        .ae_title(SCP_AE_TITLE)
        .with_abstract_syntax(SECONDARY_CAPTURE)
        .max_pdu_length(MINIMUM_PDU_SIZE);

    let handle = tokio::spawn(async move {
        let (stream, _addr) = listener.accept().await?;
        let mut association = options.establish_async(stream).await?;
        assert_eq!(association.client_ae_title(), "ASYNC-SCU");

        let mut data_len = 0;
        loop {
            match association.receive().await? {
                Pdu::PData { data } => {
                    data_len += data.iter().map(|pdv| pdv.data.len()).sum::<usize>();
                }
                Pdu::ReleaseRQ => {
                    association.send(&Pdu::ReleaseRP).await?;
                    break;
                }
                pdu => panic!("unexpected PDU {:?}", pdu),
            }
        }
        Ok::<_, Box<dyn std::error::Error + Send + Sync>>(data_len)
    });
    Ok((handle, addr))
}

#[tokio::test(flavor = "multi_thread")]
async fn async_scu_scp_exchange() -> Result<()> {
    let (scp_handle, scp_addr) = spawn_scp().await?;

    let mut association = ClientAssociationOptions::new()
        .calling_ae_title("ASYNC-SCU")
        .with_presentation_context(SECONDARY_CAPTURE, vec![EXPLICIT_VR_LE])
        .establish_with_async(&format!("{}@{}", SCP_AE_TITLE, scp_addr))
        .await?;

    assert_eq!(association.acceptor_max_pdu_length(), MINIMUM_PDU_SIZE);
    let pc = &association.presentation_contexts()[0];
    assert_eq!(pc.transfer_syntax, EXPLICIT_VR_LE);
    let pc_id = pc.id;

    // fragments must respect the acceptor's smaller maximum
    let payload = vec![0xAB; 10_000];
    let fragments: Vec<_> = PDataFragments::new(
        &payload,
        pc_id,
        PDataValueType::Data,
        association.acceptor_max_pdu_length(),
    )
    .collect();
    assert_eq!(fragments.len(), 3);
    for pdu in &fragments {
        association.send(pdu).await?;
    }
    association.release().await?;

    let received = scp_handle.await??;
    assert_eq!(received, payload.len());
    Ok(())
}

#[tokio::test]
async fn async_rejection_by_ae_title() -> Result<()> {
    let (scp_handle, scp_addr) = spawn_scp().await?;

    let res = ClientAssociationOptions::new()
        .calling_ae_title("ASYNC-SCU")
        .called_ae_title("WRONG-SCP")
        .with_abstract_syntax(SECONDARY_CAPTURE)
        .establish_async(scp_addr)
        .await;
    assert!(matches!(
        res,
        Err(dcmnet_ul::association::Error::Rejected { .. })
    ));
    assert!(scp_handle.await?.is_err());
    Ok(())
}
