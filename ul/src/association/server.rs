//! Association acceptor module
//!
//! The module provides an abstraction for a DICOM association
//! in which this application entity listens to incoming association requests.
//! See [`ServerAssociationOptions`]
//! for details and examples on how to create an association.
use std::{borrow::Cow, io::Write, net::TcpStream, time::Duration};

use dcmnet_encoding::transfer_syntax;
use snafu::{ensure, ResultExt};
use tracing::debug;

use crate::pdu::{
    read_pdu, write_pdu, AbortRQServiceProviderReason, AbortRQSource, AssociationAC,
    AssociationRJ, AssociationRJResult, AssociationRJServiceProviderAcseReason,
    AssociationRJServiceUserReason, AssociationRJSource, AssociationRQ, PDataValueType, Pdu,
    PresentationContextNegotiated, PresentationContextResult, PresentationContextResultReason,
    APPLICATION_CONTEXT_NAME, DEFAULT_MAX_PDU, MAXIMUM_PDU_SIZE, MINIMUM_PDU_SIZE,
    PDU_HEADER_SIZE,
};

use super::{
    local_user_variables, peer_max_pdu_length,
    pdata::{PDataReader, PDataWriter},
    trim_uid, AbortedSnafu, Error, InvalidMaxPduSnafu, MissingAbstractSyntaxSnafu,
    ReceivePduSnafu, RejectedSnafu, Result, SendPduSnafu, SendTooLongPduSnafu, SetTimeoutSnafu,
    UnexpectedPduSnafu, UnknownPduSnafu, WireSendSnafu,
};

/// Common interface for application entity access control policies.
///
/// Existing implementations include [`AcceptAny`] and [`AcceptCalledAeTitle`],
/// but users are free to implement their own.
pub trait AccessControl {
    /// Obtain the decision of whether to accept an incoming association request
    /// based on the recorded application entity titles.
    ///
    /// Returns Ok(()) if the requester node should be given clearance.
    /// Otherwise, a concrete association RJ service user reason is given.
    fn check_access(
        &self,
        this_ae_title: &str,
        calling_ae_title: &str,
        called_ae_title: &str,
    ) -> Result<(), AssociationRJServiceUserReason>;
}

/// An access control rule that accepts any incoming association request.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct AcceptAny;

impl AccessControl for AcceptAny {
    fn check_access(
        &self,
        _this_ae_title: &str,
        _calling_ae_title: &str,
        _called_ae_title: &str,
    ) -> Result<(), AssociationRJServiceUserReason> {
        Ok(())
    }
}

/// An access control rule that accepts association requests
/// that match the called AE title with the node's AE title.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct AcceptCalledAeTitle;

impl AccessControl for AcceptCalledAeTitle {
    fn check_access(
        &self,
        this_ae_title: &str,
        _calling_ae_title: &str,
        called_ae_title: &str,
    ) -> Result<(), AssociationRJServiceUserReason> {
        if this_ae_title == called_ae_title {
            Ok(())
        } else {
            Err(AssociationRJServiceUserReason::CalledAeTitleNotRecognized)
        }
    }
}

/// A DICOM association builder for an acceptor DICOM node,
/// often taking the role of a service class provider (SCP).
///
/// This is the standard way of negotiating and establishing
/// an association with a requesting node.
/// The outcome is a [`ServerAssociation`].
/// Unlike the [`ClientAssociationOptions`],
/// a value of this type can be reused for multiple connections.
///
/// [`ClientAssociationOptions`]: crate::association::ClientAssociationOptions
///
/// The SCP accepts every transfer syntax known to the encoding crate,
/// unless one or more transfer syntaxes are explicitly indicated
/// through calls to [`with_transfer_syntax`](Self::with_transfer_syntax).
/// For each proposed presentation context,
/// the first proposed transfer syntax which is admitted wins.
///
/// # Example
///
/// ```no_run
/// # use std::net::TcpListener;
/// # use dcmnet_ul::association::server::ServerAssociationOptions;
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// # let tcp_listener: TcpListener = unimplemented!();
/// let scp_options = ServerAssociationOptions::new()
///    .with_abstract_syntax("1.2.840.10008.1.1")
///    .with_transfer_syntax("1.2.840.10008.1.2.1");
///
/// let (stream, _address) = tcp_listener.accept()?;
/// scp_options.establish(stream)?;
/// # Ok(())
/// # }
/// ```
///
/// The SCP can be configured to accept only associations
/// addressed to its own AE title:
///
/// ```
/// # use dcmnet_ul::association::server::ServerAssociationOptions;
/// let scp_options = ServerAssociationOptions::new()
///     .accept_called_ae_title()
///     .ae_title("STORE-SCP")
///     .with_abstract_syntax("1.2.840.10008.5.1.4.1.1.7");
/// ```
#[derive(Debug, Clone)]
pub struct ServerAssociationOptions<'a, A> {
    /// the application entity access control policy
    ae_access_control: A,
    /// the AE title of this DICOM node
    ae_title: Cow<'a, str>,
    /// the requested application context name
    application_context_name: Cow<'a, str>,
    /// the list of requested abstract syntaxes
    abstract_syntax_uids: Vec<Cow<'a, str>>,
    /// the list of requested transfer syntaxes
    transfer_syntax_uids: Vec<Cow<'a, str>>,
    /// the expected protocol version
    protocol_version: u16,
    /// the maximum PDU length
    max_pdu_length: u32,
    /// whether to receive PDUs in strict mode
    strict: bool,
    /// whether to accept unknown abstract syntaxes
    promiscuous: bool,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl Default for ServerAssociationOptions<'_, AcceptAny> {
    fn default() -> Self {
        ServerAssociationOptions {
            ae_access_control: AcceptAny,
            ae_title: "THIS-SCP".into(),
            application_context_name: APPLICATION_CONTEXT_NAME.into(),
            abstract_syntax_uids: Vec::new(),
            transfer_syntax_uids: Vec::new(),
            protocol_version: 1,
            max_pdu_length: DEFAULT_MAX_PDU,
            strict: true,
            promiscuous: false,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl ServerAssociationOptions<'_, AcceptAny> {
    /// Create a new set of options for establishing an association.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'a, A> ServerAssociationOptions<'a, A>
where
    A: AccessControl,
{
    /// Change the access control policy to accept any association
    /// regardless of the specified AE titles.
    ///
    /// This is the default behavior when the options are first created.
    pub fn accept_any(self) -> ServerAssociationOptions<'a, AcceptAny> {
        self.ae_access_control(AcceptAny)
    }

    /// Change the access control policy to accept an association
    /// if the called AE title matches this node's AE title.
    ///
    /// The default is to accept any requesting node
    /// regardless of the specified AE titles.
    pub fn accept_called_ae_title(self) -> ServerAssociationOptions<'a, AcceptCalledAeTitle> {
        self.ae_access_control(AcceptCalledAeTitle)
    }

    /// Change the access control policy.
    ///
    /// The default is to accept any requesting node
    /// regardless of the specified AE titles.
    pub fn ae_access_control<P>(self, access_control: P) -> ServerAssociationOptions<'a, P>
    where
        P: AccessControl,
    {
        let ServerAssociationOptions {
            ae_title,
            application_context_name,
            abstract_syntax_uids,
            transfer_syntax_uids,
            protocol_version,
            max_pdu_length,
            strict,
            promiscuous,
            read_timeout,
            write_timeout,
            ae_access_control: _,
        } = self;

        ServerAssociationOptions {
            ae_access_control: access_control,
            ae_title,
            application_context_name,
            abstract_syntax_uids,
            transfer_syntax_uids,
            protocol_version,
            max_pdu_length,
            strict,
            promiscuous,
            read_timeout,
            write_timeout,
        }
    }

    /// Define the application entity title referring to this DICOM node.
    ///
    /// The default is `THIS-SCP`.
    pub fn ae_title<T>(mut self, ae_title: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.ae_title = ae_title.into();
        self
    }

    /// Include this abstract syntax
    /// in the list of proposed presentation contexts.
    pub fn with_abstract_syntax<T>(mut self, abstract_syntax_uid: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.abstract_syntax_uids
            .push(trim_owned(abstract_syntax_uid.into()));
        self
    }

    /// Include this transfer syntax in each proposed presentation context.
    pub fn with_transfer_syntax<T>(mut self, transfer_syntax_uid: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.transfer_syntax_uids
            .push(trim_owned(transfer_syntax_uid.into()));
        self
    }

    /// Override the maximum expected PDU length.
    pub fn max_pdu_length(mut self, value: u32) -> Self {
        self.max_pdu_length = value;
        self
    }

    /// Override strict mode:
    /// whether receiving PDUs must not
    /// surpass the negotiated maximum PDU length.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Override promiscuous mode:
    /// whether to accept unknown abstract syntaxes.
    pub fn promiscuous(mut self, promiscuous: bool) -> Self {
        self.promiscuous = promiscuous;
        self
    }

    /// Set the read timeout of the underlying TCP socket.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the write timeout of the underlying TCP socket.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Negotiate an association with the given TCP stream.
    pub fn establish(&self, mut socket: TcpStream) -> Result<ServerAssociation> {
        self.check_options()?;

        socket
            .set_read_timeout(self.read_timeout)
            .context(SetTimeoutSnafu)?;
        socket
            .set_write_timeout(self.write_timeout)
            .context(SetTimeoutSnafu)?;

        let msg = read_pdu(&mut socket, self.max_pdu_length, self.strict).context(ReceivePduSnafu)?;
        let mut buffer: Vec<u8> = Vec::with_capacity(self.max_pdu_length as usize);

        match self.process_association_rq(msg) {
            Ok((pdu, negotiated)) => {
                write_pdu(&mut buffer, &pdu).context(SendPduSnafu)?;
                socket.write_all(&buffer).context(WireSendSnafu)?;
                Ok(ServerAssociation {
                    presentation_contexts: negotiated.presentation_contexts,
                    requestor_max_pdu_length: negotiated.requestor_max_pdu_length,
                    acceptor_max_pdu_length: self.max_pdu_length,
                    socket,
                    client_ae_title: negotiated.client_ae_title,
                    buffer,
                    strict: self.strict,
                })
            }
            Err((pdu, err)) => {
                // the reply is best effort, the negotiation error prevails
                if write_pdu(&mut buffer, &pdu).is_ok() {
                    let _ = socket.write_all(&buffer);
                }
                let _ = socket.shutdown(std::net::Shutdown::Both);
                Err(err)
            }
        }
    }

    fn check_options(&self) -> Result<()> {
        ensure!(
            !self.abstract_syntax_uids.is_empty() || self.promiscuous,
            MissingAbstractSyntaxSnafu
        );
        ensure!(
            (MINIMUM_PDU_SIZE..=MAXIMUM_PDU_SIZE).contains(&self.max_pdu_length),
            InvalidMaxPduSnafu {
                max_pdu_length: self.max_pdu_length
            }
        );
        Ok(())
    }

    /// Process an association request PDU,
    /// producing the reply PDU to send back.
    ///
    /// On failure, the reply PDU is still provided,
    /// usually a rejection or an abort.
    fn process_association_rq(
        &self,
        msg: Pdu,
    ) -> std::result::Result<(Pdu, Negotiated), (Pdu, Error)> {
        match msg {
            Pdu::AssociationRQ(AssociationRQ {
                protocol_version,
                calling_ae_title,
                called_ae_title,
                application_context_name,
                presentation_contexts,
                user_variables,
            }) => {
                if protocol_version != self.protocol_version {
                    return Err(reject(AssociationRJSource::ServiceProviderAcse(
                        AssociationRJServiceProviderAcseReason::ProtocolVersionNotSupported,
                    )));
                }

                if trim_uid(&application_context_name) != self.application_context_name {
                    return Err(reject(AssociationRJSource::ServiceUser(
                        AssociationRJServiceUserReason::ApplicationContextNameNotSupported,
                    )));
                }

                self.ae_access_control
                    .check_access(&self.ae_title, &calling_ae_title, &called_ae_title)
                    .map_err(|reason| reject(AssociationRJSource::ServiceUser(reason)))?;

                let requestor_max_pdu_length = peer_max_pdu_length(&user_variables);

                let presentation_contexts: Vec<_> = presentation_contexts
                    .into_iter()
                    .map(|pc| {
                        let abstract_syntax = trim_uid(&pc.abstract_syntax).to_string();
                        if !self.promiscuous
                            && !self
                                .abstract_syntax_uids
                                .iter()
                                .any(|uid| uid == &abstract_syntax)
                        {
                            return PresentationContextNegotiated {
                                id: pc.id,
                                reason: PresentationContextResultReason::AbstractSyntaxNotSupported,
                                abstract_syntax,
                                transfer_syntax: transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN
                                    .uid()
                                    .to_string(),
                            };
                        }

                        let (transfer_syntax, reason) = match self.choose_ts(&pc.transfer_syntaxes) {
                            Some(ts) => (ts.to_string(), PresentationContextResultReason::Acceptance),
                            None => (
                                transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN.uid().to_string(),
                                PresentationContextResultReason::TransferSyntaxesNotSupported,
                            ),
                        };

                        PresentationContextNegotiated {
                            id: pc.id,
                            reason,
                            abstract_syntax,
                            transfer_syntax,
                        }
                    })
                    .collect();

                debug!(
                    "Association request from {} negotiated: {:?}",
                    calling_ae_title, presentation_contexts
                );

                let pdu = Pdu::AssociationAC(AssociationAC {
                    protocol_version: self.protocol_version,
                    calling_ae_title: calling_ae_title.clone(),
                    called_ae_title,
                    application_context_name: self.application_context_name.to_string(),
                    presentation_contexts: presentation_contexts
                        .iter()
                        .map(|pc| PresentationContextResult {
                            id: pc.id,
                            reason: pc.reason,
                            transfer_syntax: pc.transfer_syntax.clone(),
                        })
                        .collect(),
                    user_variables: local_user_variables(self.max_pdu_length),
                });

                Ok((
                    pdu,
                    Negotiated {
                        presentation_contexts: presentation_contexts
                            .into_iter()
                            .filter(PresentationContextNegotiated::is_accepted)
                            .collect(),
                        requestor_max_pdu_length,
                        client_ae_title: calling_ae_title,
                    },
                ))
            }
            Pdu::ReleaseRQ => Err((Pdu::ReleaseRP, AbortedSnafu.build())),
            pdu @ Pdu::Unknown { .. } => Err((
                Pdu::AbortRQ {
                    source: AbortRQSource::ServiceProvider(
                        AbortRQServiceProviderReason::UnrecognizedPdu,
                    ),
                },
                UnknownPduSnafu { pdu: Box::new(pdu) }.build(),
            )),
            pdu => Err((
                Pdu::AbortRQ {
                    source: AbortRQSource::ServiceProvider(
                        AbortRQServiceProviderReason::UnexpectedPdu,
                    ),
                },
                UnexpectedPduSnafu { pdu: Box::new(pdu) }.build(),
            )),
        }
    }

    /// Choose the first proposed transfer syntax which is
    /// on the options' list of transfer syntaxes (when not empty)
    /// and known to the encoding crate.
    fn choose_ts<'t>(&self, proposed: &'t [String]) -> Option<&'t str> {
        proposed.iter().map(|ts| trim_uid(ts)).find(|ts| {
            (self.transfer_syntax_uids.is_empty()
                || self.transfer_syntax_uids.iter().any(|uid| uid == ts))
                && transfer_syntax::get(ts).is_some()
        })
    }
}

/// The outcome of a successful negotiation.
#[derive(Debug)]
struct Negotiated {
    presentation_contexts: Vec<PresentationContextNegotiated>,
    requestor_max_pdu_length: u32,
    client_ae_title: String,
}

fn reject(source: AssociationRJSource) -> (Pdu, Error) {
    let association_rj = AssociationRJ {
        result: AssociationRJResult::Permanent,
        source,
    };
    (
        Pdu::AssociationRJ(association_rj.clone()),
        RejectedSnafu { association_rj }.build(),
    )
}

fn trim_owned(uid: Cow<'_, str>) -> Cow<'_, str> {
    match uid {
        Cow::Borrowed(s) => Cow::Borrowed(trim_uid(s)),
        Cow::Owned(s) => Cow::Owned(trim_uid(&s).to_string()),
    }
}

/// A DICOM upper level association from the perspective
/// of an accepting application entity.
///
/// The most common operations of an established association are
/// [`send`](Self::send)
/// and [`receive`](Self::receive).
/// Sending large P-Data fragments may be easier through the P-Data sender
/// abstraction (see [`send_pdata`](Self::send_pdata)).
///
/// When the value falls out of scope,
/// the program will shut down the underlying TCP connection.
#[derive(Debug)]
pub struct ServerAssociation {
    /// The accepted presentation contexts
    presentation_contexts: Vec<PresentationContextNegotiated>,
    /// The maximum PDU length that the remote application entity accepts
    requestor_max_pdu_length: u32,
    /// The maximum PDU length that this application entity is expecting to receive
    acceptor_max_pdu_length: u32,
    /// The TCP stream to the other DICOM node
    socket: TcpStream,
    /// The application entity title of the other DICOM node
    client_ae_title: String,
    /// Buffer to assemble PDU before sending it on wire
    buffer: Vec<u8>,
    /// whether to receive PDUs in strict mode
    strict: bool,
}

impl ServerAssociation {
    /// Obtain a view of the accepted presentation contexts.
    pub fn presentation_contexts(&self) -> &[PresentationContextNegotiated] {
        &self.presentation_contexts
    }

    /// Obtain the remote DICOM node's application entity title.
    pub fn client_ae_title(&self) -> &str {
        &self.client_ae_title
    }

    /// Retrieve the maximum PDU length
    /// admitted by the association requestor.
    pub fn requestor_max_pdu_length(&self) -> u32 {
        self.requestor_max_pdu_length
    }

    /// Retrieve the maximum PDU length
    /// that this application entity is expecting to receive.
    pub fn acceptor_max_pdu_length(&self) -> u32 {
        self.acceptor_max_pdu_length
    }

    /// Send a PDU message to the other intervenient.
    pub fn send(&mut self, msg: &Pdu) -> Result<()> {
        self.buffer.clear();
        write_pdu(&mut self.buffer, msg).context(SendPduSnafu)?;
        ensure!(
            self.buffer.len() <= (self.requestor_max_pdu_length + PDU_HEADER_SIZE) as usize,
            SendTooLongPduSnafu {
                length: self.buffer.len(),
            }
        );
        self.socket.write_all(&self.buffer).context(WireSendSnafu)
    }

    /// Read a PDU message from the other intervenient.
    pub fn receive(&mut self) -> Result<Pdu> {
        read_pdu(&mut self.socket, self.acceptor_max_pdu_length, self.strict)
            .context(ReceivePduSnafu)
    }

    /// Send a provider initiated abort message
    /// and shut down the TCP connection,
    /// terminating the association.
    pub fn abort(mut self) -> Result<()> {
        let pdu = Pdu::AbortRQ {
            source: AbortRQSource::ServiceProvider(
                AbortRQServiceProviderReason::ReasonNotSpecified,
            ),
        };
        let out = self.send(&pdu);
        let _ = self.socket.shutdown(std::net::Shutdown::Both);
        out
    }

    /// Prepare a P-Data writer for sending
    /// one or more data item PDUs.
    pub fn send_pdata(&mut self, presentation_context_id: u8) -> PDataWriter<&mut TcpStream> {
        PDataWriter::new(
            &mut self.socket,
            presentation_context_id,
            PDataValueType::Data,
            self.requestor_max_pdu_length,
        )
    }

    /// Prepare a P-Data reader for receiving
    /// one or more data item PDUs.
    pub fn receive_pdata(&mut self) -> PDataReader<&mut TcpStream> {
        PDataReader::new(&mut self.socket, self.acceptor_max_pdu_length)
    }

    /// Obtain access to the inner TCP stream
    /// connected to the association requestor.
    pub fn inner_stream(&mut self) -> &mut TcpStream {
        &mut self.socket
    }
}

impl Drop for ServerAssociation {
    fn drop(&mut self) {
        let _ = self.socket.shutdown(std::net::Shutdown::Both);
    }
}

#[cfg(feature = "async")]
pub use self::non_blocking::AsyncServerAssociation;

#[cfg(feature = "async")]
mod non_blocking {
    use super::*;
    use crate::pdu::read_pdu_async;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    impl<A> ServerAssociationOptions<'_, A>
    where
        A: AccessControl,
    {
        /// Negotiate an association with the given Tokio TCP stream.
        ///
        /// The read timeout, if defined,
        /// bounds the wait for the association request.
        pub async fn establish_async(&self, mut socket: TcpStream) -> Result<AsyncServerAssociation> {
            self.check_options()?;

            let read = read_pdu_async(&mut socket, self.max_pdu_length, self.strict);
            let msg = match self.read_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, read).await {
                    Ok(msg) => msg,
                    Err(_) => {
                        let _ = socket.shutdown().await;
                        return AbortedSnafu.fail();
                    }
                },
                None => read.await,
            }
            .context(ReceivePduSnafu)?;

            let mut buffer: Vec<u8> = Vec::with_capacity(self.max_pdu_length as usize);
            match self.process_association_rq(msg) {
                Ok((pdu, negotiated)) => {
                    write_pdu(&mut buffer, &pdu).context(SendPduSnafu)?;
                    socket.write_all(&buffer).await.context(WireSendSnafu)?;
                    Ok(AsyncServerAssociation {
                        presentation_contexts: negotiated.presentation_contexts,
                        requestor_max_pdu_length: negotiated.requestor_max_pdu_length,
                        acceptor_max_pdu_length: self.max_pdu_length,
                        socket,
                        client_ae_title: negotiated.client_ae_title,
                        buffer,
                        strict: self.strict,
                    })
                }
                Err((pdu, err)) => {
                    if write_pdu(&mut buffer, &pdu).is_ok() {
                        let _ = socket.write_all(&buffer).await;
                    }
                    let _ = socket.shutdown().await;
                    Err(err)
                }
            }
        }
    }

    /// An asynchronous DICOM upper level association
    /// from the perspective of an accepting application entity.
    #[derive(Debug)]
    pub struct AsyncServerAssociation {
        presentation_contexts: Vec<PresentationContextNegotiated>,
        requestor_max_pdu_length: u32,
        acceptor_max_pdu_length: u32,
        socket: TcpStream,
        client_ae_title: String,
        buffer: Vec<u8>,
        strict: bool,
    }

    impl AsyncServerAssociation {
        /// Obtain a view of the accepted presentation contexts.
        pub fn presentation_contexts(&self) -> &[PresentationContextNegotiated] {
            &self.presentation_contexts
        }

        /// Obtain the remote DICOM node's application entity title.
        pub fn client_ae_title(&self) -> &str {
            &self.client_ae_title
        }

        /// Retrieve the maximum PDU length
        /// admitted by the association requestor.
        pub fn requestor_max_pdu_length(&self) -> u32 {
            self.requestor_max_pdu_length
        }

        /// Retrieve the maximum PDU length
        /// that this application entity is expecting to receive.
        pub fn acceptor_max_pdu_length(&self) -> u32 {
            self.acceptor_max_pdu_length
        }

        /// Send a PDU message to the other intervenient.
        pub async fn send(&mut self, msg: &Pdu) -> Result<()> {
            self.buffer.clear();
            write_pdu(&mut self.buffer, msg).context(SendPduSnafu)?;
            ensure!(
                self.buffer.len() <= (self.requestor_max_pdu_length + PDU_HEADER_SIZE) as usize,
                SendTooLongPduSnafu {
                    length: self.buffer.len(),
                }
            );
            self.socket
                .write_all(&self.buffer)
                .await
                .context(WireSendSnafu)
        }

        /// Read a PDU message from the other intervenient.
        pub async fn receive(&mut self) -> Result<Pdu> {
            read_pdu_async(&mut self.socket, self.acceptor_max_pdu_length, self.strict)
                .await
                .context(ReceivePduSnafu)
        }

        /// Send a provider initiated abort message
        /// and shut down the TCP connection.
        pub async fn abort(mut self) -> Result<()> {
            let pdu = Pdu::AbortRQ {
                source: AbortRQSource::ServiceProvider(
                    AbortRQServiceProviderReason::ReasonNotSpecified,
                ),
            };
            let out = self.send(&pdu).await;
            let _ = self.socket.shutdown().await;
            out
        }

        /// Shut down the TCP connection without further messages.
        pub async fn close(mut self) -> std::io::Result<()> {
            self.socket.shutdown().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::{PresentationContextProposed, UserVariableItem};

    fn association_rq(called_ae_title: &str, contexts: Vec<(u8, &str, Vec<&str>)>) -> Pdu {
        Pdu::AssociationRQ(AssociationRQ {
            protocol_version: 1,
            calling_ae_title: "STORE-SCU".to_string(),
            called_ae_title: called_ae_title.to_string(),
            application_context_name: APPLICATION_CONTEXT_NAME.to_string(),
            presentation_contexts: contexts
                .into_iter()
                .map(|(id, abstract_syntax, transfer_syntaxes)| PresentationContextProposed {
                    id,
                    abstract_syntax: abstract_syntax.to_string(),
                    transfer_syntaxes: transfer_syntaxes.into_iter().map(String::from).collect(),
                })
                .collect(),
            user_variables: vec![UserVariableItem::MaxLength(0)],
        })
    }

    #[test]
    fn negotiates_first_supported_transfer_syntax() {
        let options = ServerAssociationOptions::new()
            .with_abstract_syntax("1.2.840.10008.5.1.4.1.1.7")
            .with_abstract_syntax("1.2.840.10008.1.1");

        let rq = association_rq(
            "ANY-SCP",
            vec![
                (
                    1,
                    "1.2.840.10008.5.1.4.1.1.7",
                    // JPEG baseline is unknown to the encoding crate
                    vec!["1.2.840.10008.1.2.4.50", "1.2.840.10008.1.2.1", "1.2.840.10008.1.2"],
                ),
                (3, "1.2.840.10008.5.1.4.1.1.2", vec!["1.2.840.10008.1.2"]),
                (5, "1.2.840.10008.1.1", vec!["1.2.840.10008.1.2.4.50"]),
            ],
        );

        let (reply, negotiated) = options.process_association_rq(rq).unwrap();
        let ac = match reply {
            Pdu::AssociationAC(ac) => ac,
            pdu => panic!("unexpected reply {:?}", pdu),
        };
        let results: Vec<_> = ac
            .presentation_contexts
            .iter()
            .map(|pc| (pc.id, pc.reason, pc.transfer_syntax.as_str()))
            .collect();
        assert_eq!(
            results,
            vec![
                (1, PresentationContextResultReason::Acceptance, "1.2.840.10008.1.2.1"),
                (3, PresentationContextResultReason::AbstractSyntaxNotSupported, "1.2.840.10008.1.2"),
                (5, PresentationContextResultReason::TransferSyntaxesNotSupported, "1.2.840.10008.1.2"),
            ]
        );
        assert_eq!(negotiated.presentation_contexts.len(), 1);
        assert_eq!(negotiated.requestor_max_pdu_length, MAXIMUM_PDU_SIZE);
        assert_eq!(negotiated.client_ae_title, "STORE-SCU");
    }

    #[test]
    fn restricts_to_configured_transfer_syntaxes() {
        let options = ServerAssociationOptions::new()
            .with_abstract_syntax("1.2.840.10008.1.1")
            .with_transfer_syntax("1.2.840.10008.1.2");
        let rq = association_rq(
            "ANY-SCP",
            vec![(1, "1.2.840.10008.1.1", vec!["1.2.840.10008.1.2.1", "1.2.840.10008.1.2"])],
        );
        let (_, negotiated) = options.process_association_rq(rq).unwrap();
        assert_eq!(
            negotiated.presentation_contexts[0].transfer_syntax,
            "1.2.840.10008.1.2"
        );
    }

    #[test]
    fn promiscuous_accepts_unknown_abstract_syntax() {
        let options = ServerAssociationOptions::new().promiscuous(true);
        let rq = association_rq(
            "ANY-SCP",
            vec![(1, "1.2.3.4.5.6", vec!["1.2.840.10008.1.2"])],
        );
        let (_, negotiated) = options.process_association_rq(rq).unwrap();
        assert_eq!(negotiated.presentation_contexts.len(), 1);
        assert_eq!(negotiated.presentation_contexts[0].abstract_syntax, "1.2.3.4.5.6");
    }

    #[test]
    fn rejects_unknown_called_ae_title() {
        let options = ServerAssociationOptions::new()
            .accept_called_ae_title()
            .ae_title("STORE-SCP")
            .with_abstract_syntax("1.2.840.10008.1.1");
        let rq = association_rq("OTHER-SCP", vec![(1, "1.2.840.10008.1.1", vec!["1.2.840.10008.1.2"])]);
        match options.process_association_rq(rq) {
            Err((Pdu::AssociationRJ(rj), Error::Rejected { .. })) => {
                assert_eq!(rj.result, AssociationRJResult::Permanent);
                assert_eq!(
                    rj.source,
                    AssociationRJSource::ServiceUser(
                        AssociationRJServiceUserReason::CalledAeTitleNotRecognized
                    )
                );
            }
            Err((pdu, e)) => panic!("unexpected outcome {:?}, {}", pdu, e),
            Ok(_) => panic!("association should be rejected"),
        }
    }

    #[test]
    fn rejects_protocol_version_mismatch() {
        let options = ServerAssociationOptions::new().with_abstract_syntax("1.2.840.10008.1.1");
        let mut rq = association_rq("ANY-SCP", vec![(1, "1.2.840.10008.1.1", vec!["1.2.840.10008.1.2"])]);
        if let Pdu::AssociationRQ(rq) = &mut rq {
            rq.protocol_version = 2;
        }
        let (reply, _) = options.process_association_rq(rq).unwrap_err();
        assert!(matches!(
            reply,
            Pdu::AssociationRJ(AssociationRJ {
                source: AssociationRJSource::ServiceProviderAcse(
                    AssociationRJServiceProviderAcseReason::ProtocolVersionNotSupported
                ),
                ..
            })
        ));
    }

    #[test]
    fn release_during_negotiation_is_answered() {
        let options = ServerAssociationOptions::new().with_abstract_syntax("1.2.840.10008.1.1");
        let (reply, err) = options.process_association_rq(Pdu::ReleaseRQ).unwrap_err();
        assert_eq!(reply, Pdu::ReleaseRP);
        assert!(matches!(err, Error::Aborted { .. }));

        let (reply, err) = options
            .process_association_rq(Pdu::Unknown {
                pdu_type: 0x99,
                data: vec![],
            })
            .unwrap_err();
        assert_eq!(
            reply,
            Pdu::AbortRQ {
                source: AbortRQSource::ServiceProvider(AbortRQServiceProviderReason::UnrecognizedPdu)
            }
        );
        assert!(matches!(err, Error::UnknownPdu { .. }));
    }

    #[test]
    fn options_need_abstract_syntaxes() {
        let options = ServerAssociationOptions::new();
        assert!(matches!(
            options.check_options(),
            Err(Error::MissingAbstractSyntax { .. })
        ));
        assert!(options.promiscuous(true).check_options().is_ok());
    }
}
