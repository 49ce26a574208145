//! Association requester module
//!
//! The module provides an abstraction for a DICOM association
//! in which this application entity is the one requesting the association.
//! See [`ClientAssociationOptions`]
//! for details and examples on how to create an association.
use std::{
    borrow::Cow,
    io::Write,
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use snafu::{ensure, ResultExt};
use tracing::{debug, warn};

use crate::{
    pdu::{
        read_pdu, write_pdu, AbortRQSource, AssociationAC, AssociationRQ, PDataValueType, Pdu,
        PresentationContextNegotiated, PresentationContextProposed,
        PresentationContextResultReason, APPLICATION_CONTEXT_NAME, DEFAULT_MAX_PDU,
        MAXIMUM_PDU_SIZE, MINIMUM_PDU_SIZE, PDU_HEADER_SIZE,
    },
    AeAddr,
};

use super::{
    local_user_variables, peer_max_pdu_length,
    pdata::{PDataReader, PDataWriter},
    trim_uid, ConnectSnafu, Error, InvalidMaxPduSnafu, MissingAbstractSyntaxSnafu,
    NoAcceptedPresentationContextsSnafu, ProtocolVersionMismatchSnafu, ReceivePduSnafu,
    RejectedSnafu, Result, SendPduSnafu, SendTooLongPduSnafu, SetTimeoutSnafu,
    UnexpectedPduSnafu, UnknownPduSnafu, WireSendSnafu,
};

/// A DICOM association builder for a client node.
/// The final outcome is a [`ClientAssociation`].
///
/// This is the standard way of requesting and establishing
/// an association with another DICOM node,
/// that one usually taking the role of a service class provider (SCP).
///
/// # Example
///
/// ```no_run
/// # use dcmnet_ul::association::client::ClientAssociationOptions;
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let association = ClientAssociationOptions::new()
///    .with_presentation_context("1.2.840.10008.1.1", vec!["1.2.840.10008.1.2.1", "1.2.840.10008.1.2"])
///    .establish("129.168.0.5:104")?;
/// # Ok(())
/// # }
/// ```
///
/// At least one presentation context must be specified,
/// using the method [`with_presentation_context`](Self::with_presentation_context)
/// and supplying both an abstract syntax and list of transfer syntaxes.
/// Presentation context identifiers are assigned in order of inclusion,
/// as the odd numbers 1, 3, 5, and so on.
///
/// A helper method [`with_abstract_syntax`](Self::with_abstract_syntax) will
/// include by default the transfer syntaxes
/// _Explicit VR Little Endian_ and _Implicit VR Little Endian_
/// in the resulting presentation context.
#[derive(Debug, Clone)]
pub struct ClientAssociationOptions<'a> {
    /// the calling AE title
    calling_ae_title: Cow<'a, str>,
    /// the called AE title
    called_ae_title: Option<Cow<'a, str>>,
    /// the requested application context name
    application_context_name: Cow<'a, str>,
    /// the list of requested presentation contexts
    presentation_contexts: Vec<(Cow<'a, str>, Vec<Cow<'a, str>>)>,
    /// the expected protocol version
    protocol_version: u16,
    /// the maximum PDU length requested for receiving PDUs
    max_pdu_length: u32,
    /// whether to receive PDUs in strict mode
    strict: bool,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    connection_timeout: Option<Duration>,
}

impl Default for ClientAssociationOptions<'_> {
    fn default() -> Self {
        ClientAssociationOptions {
            calling_ae_title: "THIS-SCU".into(),
            called_ae_title: None,
            application_context_name: APPLICATION_CONTEXT_NAME.into(),
            presentation_contexts: Vec::new(),
            protocol_version: 1,
            max_pdu_length: DEFAULT_MAX_PDU,
            strict: true,
            read_timeout: None,
            write_timeout: None,
            connection_timeout: None,
        }
    }
}

impl<'a> ClientAssociationOptions<'a> {
    /// Create a new set of options for establishing an association.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define the calling application entity title for the association,
    /// which refers to this DICOM node.
    ///
    /// The default is `THIS-SCU`.
    pub fn calling_ae_title<T>(mut self, calling_ae_title: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.calling_ae_title = calling_ae_title.into();
        self
    }

    /// Define the called application entity title for the association,
    /// which refers to the target DICOM node.
    ///
    /// The default is `ANY-SCP`.
    /// Passing an empty string resets the AE title to the default
    /// (or to the one passed via [`establish_with`](Self::establish_with)).
    pub fn called_ae_title<T>(mut self, called_ae_title: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        let cae = called_ae_title.into();
        self.called_ae_title = if cae.is_empty() { None } else { Some(cae) };
        self
    }

    /// Include this presentation context
    /// in the list of proposed presentation contexts.
    pub fn with_presentation_context<T>(
        mut self,
        abstract_syntax_uid: T,
        transfer_syntax_uids: Vec<T>,
    ) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        let transfer_syntaxes = transfer_syntax_uids
            .into_iter()
            .map(|t| trim_cow_uid(t.into()))
            .collect();
        self.presentation_contexts
            .push((trim_cow_uid(abstract_syntax_uid.into()), transfer_syntaxes));
        self
    }

    /// Helper to add this abstract syntax
    /// with the default transfer syntaxes
    /// to the list of proposed presentation contexts.
    pub fn with_abstract_syntax<T>(self, abstract_syntax_uid: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        let default_transfer_syntaxes: Vec<Cow<'a, str>> =
            vec!["1.2.840.10008.1.2.1".into(), "1.2.840.10008.1.2".into()];
        self.with_presentation_context(abstract_syntax_uid.into(), default_transfer_syntaxes)
    }

    /// Override the maximum PDU length
    /// that this application entity will admit.
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

    /// Set the timeout for establishing the TCP connection.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    /// Initiate the TCP connection to the given address
    /// and request a new DICOM association,
    /// negotiating the presentation contexts in the process.
    pub fn establish<A: ToSocketAddrs>(self, address: A) -> Result<ClientAssociation> {
        self.establish_impl(AeAddr::new_socket_addr(address))
    }

    /// Initiate the TCP connection to the given address
    /// and request a new DICOM association,
    /// negotiating the presentation contexts in the process.
    ///
    /// The address may include the called AE title
    /// (see [`AeAddr`] for the syntax),
    /// which is overridden by any `called_ae_title` option
    /// previously defined.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use dcmnet_ul::association::client::ClientAssociationOptions;
    /// # fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let association = ClientAssociationOptions::new()
    ///     .with_abstract_syntax("1.2.840.10008.1.1")
    ///     // called AE title in address
    ///     .establish_with("MY-STORAGE@10.0.0.100:104")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn establish_with(self, ae_address: &str) -> Result<ClientAssociation> {
        match ae_address.parse::<AeAddr<String>>() {
            Ok(ae_address) => self.establish_impl(ae_address),
            Err(_) => self.establish_impl(AeAddr::new_socket_addr(ae_address)),
        }
    }

    fn establish_impl<T>(self, ae_address: AeAddr<T>) -> Result<ClientAssociation>
    where
        T: ToSocketAddrs,
    {
        let (request, proposed) = self.build_request(ae_address.ae_title())?;

        let mut socket = match self.connection_timeout {
            Some(timeout) => connect_timeout(&ae_address, timeout)?,
            None => TcpStream::connect(&ae_address).context(ConnectSnafu)?,
        };
        socket
            .set_read_timeout(self.read_timeout)
            .context(SetTimeoutSnafu)?;
        socket
            .set_write_timeout(self.write_timeout)
            .context(SetTimeoutSnafu)?;

        let mut buffer: Vec<u8> = Vec::with_capacity(self.max_pdu_length as usize);
        write_pdu(&mut buffer, &request).context(SendPduSnafu)?;
        socket.write_all(&buffer).context(WireSendSnafu)?;
        buffer.clear();

        let response =
            read_pdu(&mut socket, MAXIMUM_PDU_SIZE, self.strict).context(ReceivePduSnafu)?;

        match self.process_response(response, proposed) {
            Ok(negotiated) => Ok(ClientAssociation {
                presentation_contexts: negotiated.presentation_contexts,
                requestor_max_pdu_length: self.max_pdu_length,
                acceptor_max_pdu_length: negotiated.acceptor_max_pdu_length,
                peer_ae_title: negotiated.peer_ae_title,
                socket,
                buffer,
                strict: self.strict,
                closed: false,
            }),
            Err((abort, e)) => {
                if abort {
                    let _ = write_pdu(&mut buffer, &abort_pdu());
                    let _ = socket.write_all(&buffer);
                }
                let _ = socket.shutdown(std::net::Shutdown::Both);
                Err(e)
            }
        }
    }

    /// Build the association request PDU,
    /// also returning the proposed presentation contexts.
    fn build_request(
        &self,
        address_ae_title: Option<&str>,
    ) -> Result<(Pdu, Vec<PresentationContextProposed>)> {
        // the presentation contexts represent intent
        // and may not be omitted by the user
        ensure!(
            !self.presentation_contexts.is_empty(),
            MissingAbstractSyntaxSnafu
        );
        ensure!(
            (MINIMUM_PDU_SIZE..=MAXIMUM_PDU_SIZE).contains(&self.max_pdu_length),
            InvalidMaxPduSnafu {
                max_pdu_length: self.max_pdu_length
            }
        );

        let called_ae_title: &str = match (&self.called_ae_title, address_ae_title) {
            (Some(aec), Some(_)) => {
                warn!(
                    "Option `called_ae_title` overrides the AE title to `{}`",
                    aec
                );
                aec
            }
            (Some(aec), None) => aec,
            (None, Some(aec)) => aec,
            (None, None) => "ANY-SCP",
        };

        let proposed: Vec<_> = self
            .presentation_contexts
            .iter()
            .enumerate()
            .map(|(i, (abstract_syntax, transfer_syntaxes))| PresentationContextProposed {
                id: (2 * i + 1) as u8,
                abstract_syntax: abstract_syntax.to_string(),
                transfer_syntaxes: transfer_syntaxes.iter().map(|ts| ts.to_string()).collect(),
            })
            .collect();

        let request = Pdu::AssociationRQ(AssociationRQ {
            protocol_version: self.protocol_version,
            calling_ae_title: self.calling_ae_title.to_string(),
            called_ae_title: called_ae_title.to_string(),
            application_context_name: self.application_context_name.to_string(),
            presentation_contexts: proposed.clone(),
            user_variables: local_user_variables(self.max_pdu_length),
        });
        Ok((request, proposed))
    }

    /// Interpret the response of the association acceptor.
    ///
    /// On failure, the flag says whether an abort should be sent.
    fn process_response(
        &self,
        response: Pdu,
        proposed: Vec<PresentationContextProposed>,
    ) -> std::result::Result<Negotiated, (bool, Error)> {
        match response {
            Pdu::AssociationAC(AssociationAC {
                protocol_version,
                called_ae_title,
                presentation_contexts,
                user_variables,
                ..
            }) => {
                if protocol_version != self.protocol_version {
                    return Err((
                        true,
                        ProtocolVersionMismatchSnafu {
                            expected: self.protocol_version,
                            got: protocol_version,
                        }
                        .build(),
                    ));
                }

                let acceptor_max_pdu_length = peer_max_pdu_length(&user_variables);

                let presentation_contexts: Vec<_> = presentation_contexts
                    .into_iter()
                    .filter(|pc| pc.reason == PresentationContextResultReason::Acceptance)
                    .filter_map(|pc| {
                        let abstract_syntax = proposed
                            .iter()
                            .find(|p| p.id == pc.id)
                            .map(|p| p.abstract_syntax.clone());
                        if abstract_syntax.is_none() {
                            warn!("Ignoring unknown presentation context {} in response", pc.id);
                        }
                        Some(PresentationContextNegotiated {
                            id: pc.id,
                            reason: pc.reason,
                            abstract_syntax: abstract_syntax?,
                            transfer_syntax: trim_uid(&pc.transfer_syntax).to_string(),
                        })
                    })
                    .collect();

                if presentation_contexts.is_empty() {
                    return Err((true, NoAcceptedPresentationContextsSnafu.build()));
                }

                debug!(
                    "Association accepted by {} with {} presentation context(s), max PDU length {}",
                    called_ae_title,
                    presentation_contexts.len(),
                    acceptor_max_pdu_length
                );

                Ok(Negotiated {
                    presentation_contexts,
                    acceptor_max_pdu_length,
                    peer_ae_title: called_ae_title,
                })
            }
            Pdu::AssociationRJ(association_rj) => {
                Err((false, RejectedSnafu { association_rj }.build()))
            }
            pdu @ Pdu::Unknown { .. } => Err((
                true,
                UnknownPduSnafu { pdu: Box::new(pdu) }.build(),
            )),
            pdu => Err((
                true,
                UnexpectedPduSnafu { pdu: Box::new(pdu) }.build(),
            )),
        }
    }
}

/// The outcome of a successful negotiation.
struct Negotiated {
    presentation_contexts: Vec<PresentationContextNegotiated>,
    acceptor_max_pdu_length: u32,
    peer_ae_title: String,
}

fn trim_cow_uid(uid: Cow<'_, str>) -> Cow<'_, str> {
    match uid {
        Cow::Borrowed(s) => Cow::Borrowed(trim_uid(s)),
        Cow::Owned(s) => Cow::Owned(trim_uid(&s).to_string()),
    }
}

fn abort_pdu() -> Pdu {
    Pdu::AbortRQ {
        source: AbortRQSource::ServiceUser,
    }
}

fn connect_timeout<A: ToSocketAddrs>(address: &A, timeout: Duration) -> Result<TcpStream> {
    let mut last_error = None;
    for addr in address.to_socket_addrs().context(ConnectSnafu)? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(socket) => return Ok(socket),
            Err(e) => last_error = Some(e),
        }
    }
    let e = last_error.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "no socket address to connect to",
        )
    });
    Err(e).context(ConnectSnafu)
}

/// A DICOM upper level association from the perspective
/// of a requesting application entity.
///
/// The most common operations of an established association are
/// [`send`](Self::send)
/// and [`receive`](Self::receive).
/// Sending large P-Data fragments may be easier through the P-Data sender
/// abstraction (see [`send_pdata`](Self::send_pdata)).
///
/// When the value falls out of scope,
/// the program will automatically try to gracefully release the association
/// through a standard A-RELEASE message exchange,
/// then shut down the underlying TCP connection.
#[derive(Debug)]
pub struct ClientAssociation {
    /// The presentation contexts accorded with the acceptor application entity,
    /// without the rejected ones.
    presentation_contexts: Vec<PresentationContextNegotiated>,
    /// The maximum PDU length that this application entity is expecting to receive
    requestor_max_pdu_length: u32,
    /// The maximum PDU length that the remote application entity accepts
    acceptor_max_pdu_length: u32,
    /// The AE title of the remote application entity
    peer_ae_title: String,
    /// The TCP stream to the other DICOM node
    socket: TcpStream,
    /// Buffer to assemble PDU before sending it on wire
    buffer: Vec<u8>,
    /// whether to receive PDUs in strict mode
    strict: bool,
    /// whether the association was already released or aborted
    closed: bool,
}

impl ClientAssociation {
    /// Retrieve the list of accepted presentation contexts.
    pub fn presentation_contexts(&self) -> &[PresentationContextNegotiated] {
        &self.presentation_contexts
    }

    /// Retrieve the maximum PDU length
    /// admitted by the association acceptor.
    pub fn acceptor_max_pdu_length(&self) -> u32 {
        self.acceptor_max_pdu_length
    }

    /// Retrieve the maximum PDU length
    /// that this application entity is expecting to receive.
    pub fn requestor_max_pdu_length(&self) -> u32 {
        self.requestor_max_pdu_length
    }

    /// Retrieve the AE title of the association acceptor.
    pub fn peer_ae_title(&self) -> &str {
        &self.peer_ae_title
    }

    /// Send a PDU message to the other intervenient.
    pub fn send(&mut self, msg: &Pdu) -> Result<()> {
        self.buffer.clear();
        write_pdu(&mut self.buffer, msg).context(SendPduSnafu)?;
        ensure!(
            self.buffer.len() <= (self.acceptor_max_pdu_length + PDU_HEADER_SIZE) as usize,
            SendTooLongPduSnafu {
                length: self.buffer.len(),
            }
        );
        self.socket.write_all(&self.buffer).context(WireSendSnafu)
    }

    /// Read a PDU message from the other intervenient.
    pub fn receive(&mut self) -> Result<Pdu> {
        read_pdu(&mut self.socket, self.requestor_max_pdu_length, self.strict)
            .context(ReceivePduSnafu)
    }

    /// Gracefully terminate the association by exchanging release messages
    /// and then shutting down the TCP connection.
    pub fn release(mut self) -> Result<()> {
        let out = self.release_impl();
        let _ = self.socket.shutdown(std::net::Shutdown::Both);
        out
    }

    /// Send an abort message and shut down the TCP connection,
    /// terminating the association.
    pub fn abort(mut self) -> Result<()> {
        self.closed = true;
        let out = self.send(&abort_pdu());
        let _ = self.socket.shutdown(std::net::Shutdown::Both);
        out
    }

    /// Obtain access to the inner TCP stream
    /// connected to the association acceptor.
    ///
    /// Reading and writing should be done with care
    /// to avoid inconsistencies in the association state.
    pub fn inner_stream(&mut self) -> &mut TcpStream {
        &mut self.socket
    }

    /// Prepare a P-Data writer for sending a data set,
    /// which automatically splits the data into separate PDUs if necessary.
    pub fn send_pdata(&mut self, presentation_context_id: u8) -> PDataWriter<&mut TcpStream> {
        PDataWriter::new(
            &mut self.socket,
            presentation_context_id,
            PDataValueType::Data,
            self.acceptor_max_pdu_length,
        )
    }

    /// Prepare a P-Data reader for receiving
    /// one or more data item PDUs.
    pub fn receive_pdata(&mut self) -> PDataReader<&mut TcpStream> {
        PDataReader::new(&mut self.socket, self.requestor_max_pdu_length)
    }

    /// Try to send a release request and receive a release response.
    fn release_impl(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.send(&Pdu::ReleaseRQ)?;
        match self.receive()? {
            Pdu::ReleaseRP => Ok(()),
            pdu @ Pdu::Unknown { .. } => UnknownPduSnafu { pdu: Box::new(pdu) }.fail(),
            pdu => UnexpectedPduSnafu { pdu: Box::new(pdu) }.fail(),
        }
    }
}

/// Automatically release the association and shut down the connection.
impl Drop for ClientAssociation {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.release_impl();
            let _ = self.socket.shutdown(std::net::Shutdown::Both);
        }
    }
}

#[cfg(feature = "async")]
pub use self::non_blocking::AsyncClientAssociation;

#[cfg(feature = "async")]
mod non_blocking {
    use super::*;
    use crate::pdu::read_pdu_async;
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpStream, ToSocketAddrs};

    impl ClientAssociationOptions<'_> {
        /// Initiate the TCP connection to the given address
        /// and request a new DICOM association asynchronously.
        ///
        /// The read and write timeouts are applied
        /// to each PDU exchange of the association.
        pub async fn establish_async<A: ToSocketAddrs>(
            self,
            address: A,
        ) -> Result<AsyncClientAssociation> {
            self.establish_async_impl(None, address).await
        }

        /// Initiate the TCP connection to the given address
        /// and request a new DICOM association asynchronously.
        ///
        /// The address may include the called AE title,
        /// as in [`establish_with`](Self::establish_with).
        pub async fn establish_with_async(
            self,
            ae_address: &str,
        ) -> Result<AsyncClientAssociation> {
            match ae_address.parse::<AeAddr<String>>() {
                Ok(ae_address) => {
                    let (ae_title, socket_addr) = ae_address.into_parts();
                    self.establish_async_impl(ae_title.as_deref(), socket_addr)
                        .await
                }
                Err(_) => self.establish_async_impl(None, ae_address).await,
            }
        }

        async fn establish_async_impl<A: ToSocketAddrs>(
            self,
            address_ae_title: Option<&str>,
            address: A,
        ) -> Result<AsyncClientAssociation> {
            let (request, proposed) = self.build_request(address_ae_title)?;

            let mut socket = match self.connection_timeout {
                Some(timeout) => tokio::time::timeout(timeout, TcpStream::connect(address))
                    .await
                    .context(super::super::ConnectTimeoutSnafu)?
                    .context(ConnectSnafu)?,
                None => TcpStream::connect(address).await.context(ConnectSnafu)?,
            };

            let mut buffer: Vec<u8> = Vec::with_capacity(self.max_pdu_length as usize);
            write_pdu(&mut buffer, &request).context(SendPduSnafu)?;
            socket.write_all(&buffer).await.context(WireSendSnafu)?;
            buffer.clear();

            let response = read_pdu_async(&mut socket, MAXIMUM_PDU_SIZE, self.strict)
                .await
                .context(ReceivePduSnafu)?;

            match self.process_response(response, proposed) {
                Ok(negotiated) => Ok(AsyncClientAssociation {
                    presentation_contexts: negotiated.presentation_contexts,
                    requestor_max_pdu_length: self.max_pdu_length,
                    acceptor_max_pdu_length: negotiated.acceptor_max_pdu_length,
                    peer_ae_title: negotiated.peer_ae_title,
                    socket,
                    buffer,
                    strict: self.strict,
                }),
                Err((abort, e)) => {
                    if abort {
                        let _ = write_pdu(&mut buffer, &abort_pdu());
                        let _ = socket.write_all(&buffer).await;
                    }
                    let _ = socket.shutdown().await;
                    Err(e)
                }
            }
        }
    }

    /// An asynchronous DICOM upper level association
    /// from the perspective of a requesting application entity.
    ///
    /// Unlike [`ClientAssociation`],
    /// dropping this value does not release the association:
    /// [`release`](Self::release) should be called explicitly.
    #[derive(Debug)]
    pub struct AsyncClientAssociation {
        presentation_contexts: Vec<PresentationContextNegotiated>,
        requestor_max_pdu_length: u32,
        acceptor_max_pdu_length: u32,
        peer_ae_title: String,
        socket: TcpStream,
        buffer: Vec<u8>,
        strict: bool,
    }

    impl AsyncClientAssociation {
        /// Retrieve the list of accepted presentation contexts.
        pub fn presentation_contexts(&self) -> &[PresentationContextNegotiated] {
            &self.presentation_contexts
        }

        /// Retrieve the maximum PDU length
        /// admitted by the association acceptor.
        pub fn acceptor_max_pdu_length(&self) -> u32 {
            self.acceptor_max_pdu_length
        }

        /// Retrieve the maximum PDU length
        /// that this application entity is expecting to receive.
        pub fn requestor_max_pdu_length(&self) -> u32 {
            self.requestor_max_pdu_length
        }

        /// Retrieve the AE title of the association acceptor.
        pub fn peer_ae_title(&self) -> &str {
            &self.peer_ae_title
        }

        /// Send a PDU message to the other intervenient.
        pub async fn send(&mut self, msg: &Pdu) -> Result<()> {
            self.buffer.clear();
            write_pdu(&mut self.buffer, msg).context(SendPduSnafu)?;
            ensure!(
                self.buffer.len() <= (self.acceptor_max_pdu_length + PDU_HEADER_SIZE) as usize,
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
            read_pdu_async(&mut self.socket, self.requestor_max_pdu_length, self.strict)
                .await
                .context(ReceivePduSnafu)
        }

        /// Gracefully terminate the association by exchanging release messages
        /// and then shutting down the TCP connection.
        pub async fn release(mut self) -> Result<()> {
            let out = self.release_impl().await;
            let _ = self.socket.shutdown().await;
            out
        }

        /// Send an abort message and shut down the TCP connection.
        pub async fn abort(mut self) -> Result<()> {
            let out = self.send(&abort_pdu()).await;
            let _ = self.socket.shutdown().await;
            out
        }

        /// The local socket address of the connection.
        pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
            self.socket.local_addr()
        }

        async fn release_impl(&mut self) -> Result<()> {
            self.send(&Pdu::ReleaseRQ).await?;
            match self.receive().await? {
                Pdu::ReleaseRP => Ok(()),
                pdu @ Pdu::Unknown { .. } => UnknownPduSnafu { pdu: Box::new(pdu) }.fail(),
                pdu => UnexpectedPduSnafu { pdu: Box::new(pdu) }.fail(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::PresentationContextResult;

    #[test]
    fn presentation_context_ids_are_odd() {
        let options = ClientAssociationOptions::new()
            .with_abstract_syntax("1.2.840.10008.1.1")
            .with_presentation_context("1.2.840.10008.5.1.4.1.1.2\0", vec!["1.2.840.10008.1.2"])
            .with_abstract_syntax("1.2.840.10008.5.1.4.1.1.7");
        let (request, proposed) = options.build_request(None).unwrap();

        let ids: Vec<_> = proposed.iter().map(|pc| pc.id).collect();
        assert_eq!(ids, [1, 3, 5]);
        assert_eq!(proposed[1].abstract_syntax, "1.2.840.10008.5.1.4.1.1.2");
        match request {
            Pdu::AssociationRQ(rq) => {
                assert_eq!(rq.called_ae_title, "ANY-SCP");
                assert_eq!(rq.calling_ae_title, "THIS-SCU");
                assert_eq!(rq.presentation_contexts, proposed);
            }
            pdu => panic!("unexpected PDU {:?}", pdu),
        }
    }

    #[test]
    fn called_ae_title_precedence() {
        let options = ClientAssociationOptions::new().with_abstract_syntax("1.2.840.10008.1.1");
        let (request, _) = options.build_request(Some("STORAGE")).unwrap();
        assert!(matches!(request, Pdu::AssociationRQ(rq) if rq.called_ae_title == "STORAGE"));

        let options = options.called_ae_title("OVERRIDE");
        let (request, _) = options.build_request(Some("STORAGE")).unwrap();
        assert!(matches!(request, Pdu::AssociationRQ(rq) if rq.called_ae_title == "OVERRIDE"));
    }

    #[test]
    fn missing_presentation_contexts_is_fatal() {
        let res = ClientAssociationOptions::new().build_request(None);
        assert!(matches!(res, Err(Error::MissingAbstractSyntax { .. })));
    }

    #[test]
    fn invalid_max_pdu_is_fatal() {
        let res = ClientAssociationOptions::new()
            .with_abstract_syntax("1.2.840.10008.1.1")
            .max_pdu_length(1_000)
            .build_request(None);
        assert!(matches!(res, Err(Error::InvalidMaxPdu { .. })));
    }

    #[test]
    fn response_keeps_only_accepted_contexts() {
        let options = ClientAssociationOptions::new()
            .with_abstract_syntax("1.2.840.10008.1.1")
            .with_abstract_syntax("1.2.840.10008.5.1.4.1.1.7");
        let (_, proposed) = options.build_request(None).unwrap();

        let response = Pdu::AssociationAC(AssociationAC {
            protocol_version: 1,
            calling_ae_title: "THIS-SCU".to_string(),
            called_ae_title: "STORE-SCP".to_string(),
            application_context_name: APPLICATION_CONTEXT_NAME.to_string(),
            presentation_contexts: vec![
                PresentationContextResult {
                    id: 1,
                    reason: PresentationContextResultReason::AbstractSyntaxNotSupported,
                    transfer_syntax: "1.2.840.10008.1.2".to_string(),
                },
                PresentationContextResult {
                    id: 3,
                    reason: PresentationContextResultReason::Acceptance,
                    transfer_syntax: "1.2.840.10008.1.2.1".to_string(),
                },
            ],
            user_variables: vec![],
        });
        let negotiated = options.process_response(response, proposed).ok().unwrap();
        assert_eq!(negotiated.acceptor_max_pdu_length, DEFAULT_MAX_PDU);
        assert_eq!(negotiated.peer_ae_title, "STORE-SCP");
        assert_eq!(
            negotiated.presentation_contexts,
            vec![PresentationContextNegotiated {
                id: 3,
                reason: PresentationContextResultReason::Acceptance,
                abstract_syntax: "1.2.840.10008.5.1.4.1.1.7".to_string(),
                transfer_syntax: "1.2.840.10008.1.2.1".to_string(),
            }]
        );
    }

    #[test]
    fn response_without_accepted_contexts_aborts() {
        let options = ClientAssociationOptions::new().with_abstract_syntax("1.2.840.10008.1.1");
        let (_, proposed) = options.build_request(None).unwrap();
        let response = Pdu::AssociationAC(AssociationAC {
            protocol_version: 1,
            calling_ae_title: "THIS-SCU".to_string(),
            called_ae_title: "ANY-SCP".to_string(),
            application_context_name: APPLICATION_CONTEXT_NAME.to_string(),
            presentation_contexts: vec![PresentationContextResult {
                id: 1,
                reason: PresentationContextResultReason::TransferSyntaxesNotSupported,
                transfer_syntax: String::new(),
            }],
            user_variables: vec![],
        });
        match options.process_response(response, proposed) {
            Err((true, Error::NoAcceptedPresentationContexts { .. })) => {}
            Err((_, e)) => panic!("unexpected error {}", e),
            Ok(_) => panic!("association should not be accepted"),
        }
    }
}
