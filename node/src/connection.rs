//! The connection manager.
//!
//! A [`Connection`] owns the registry of peers known to this node,
//! the sockets open with each of them,
//! and the listeners of server-role peers.
//! Its lifecycle is explicit:
//! create it, register peers, associate or serve,
//! and finally [`reset`](Connection::reset) or drop it.
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use dcmnet_dictionary_std::uids;
use dcmnet_dimse::{
    command_pdus, data_pdus, CommandField, CommandMessage, MessageType, PDataAssembler,
};
use dcmnet_ul::association::{AcceptAny, AsyncClientAssociation};
use dcmnet_ul::pdu::{PresentationContextNegotiated, DEFAULT_MAX_PDU};
use dcmnet_ul::{ClientAssociationOptions, Pdu, ServerAssociationOptions};
use snafu::{ensure, OptionExt, ResultExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::peer::{PeerInfo, PeerOptions, Role};
use crate::provider::{serve_association, StoreServiceProvider};
use crate::store::{self, StoreHandle, StoreSource};
use crate::{
    AbortedSnafu, AssociateSnafu, ClosedSnafu, Error, MessageSnafu, MissingAbstractSyntaxSnafu,
    MissingPeerSnafu, MissingSourceSnafu, ReceiveMessageSnafu, ReleaseSnafu, Result,
    SendMessageSnafu, UnexpectedPduSnafu, UnexpectedResponseSnafu, UnknownPeerSnafu,
};

/// Options shared by every association of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// the maximum PDU length admitted by this node
    pub max_pdu_length: u32,
    /// whether to reject incoming PDUs larger than admitted
    pub strict: bool,
    /// the calling AE title used when no source AE title is given
    /// and no default server-role peer exists
    pub calling_ae_title: Option<String>,
    /// the time limit for establishing outbound TCP connections
    pub connection_timeout: Option<Duration>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        ConnectionOptions {
            max_pdu_length: DEFAULT_MAX_PDU,
            strict: true,
            calling_ae_title: None,
            connection_timeout: None,
        }
    }
}

impl ConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_pdu_length(mut self, max_pdu_length: u32) -> Self {
        self.max_pdu_length = max_pdu_length;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn calling_ae_title(mut self, ae_title: impl Into<String>) -> Self {
        self.calling_ae_title = Some(ae_title.into());
        self
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }
}

/// Options for requesting an association through a [`Connection`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssociateOptions {
    /// the called peer, or the default peer if absent
    pub host_ae: Option<String>,
    /// the calling AE title,
    /// or the default server-role peer if absent
    pub source_ae: Option<String>,
    /// the proposed abstract syntaxes, each with its transfer syntaxes
    pub contexts: Vec<(String, Vec<String>)>,
}

impl AssociateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_ae(mut self, ae_title: impl Into<String>) -> Self {
        self.host_ae = Some(ae_title.into());
        self
    }

    pub fn source_ae(mut self, ae_title: impl Into<String>) -> Self {
        self.source_ae = Some(ae_title.into());
        self
    }

    /// Propose an abstract syntax with the given transfer syntaxes.
    pub fn with_context<I, T>(mut self, abstract_syntax: impl Into<String>, transfer_syntaxes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.contexts.push((
            abstract_syntax.into(),
            transfer_syntaxes.into_iter().map(Into::into).collect(),
        ));
        self
    }
}

/// The connection manager of a DICOM node.
///
/// Cloning a connection yields another handle to the same registry.
/// Server-role peers require a Tokio runtime to be registered,
/// and so do associations and store batches.
#[derive(Debug, Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

#[derive(Debug)]
pub(crate) struct Inner {
    options: ConnectionOptions,
    registry: Mutex<Registry>,
    next_socket_id: AtomicU64,
}

#[derive(Debug, Default)]
struct Registry {
    peers: HashMap<String, PeerEntry>,
    default_peer: Option<String>,
    default_server: Option<String>,
}

#[derive(Debug)]
struct PeerEntry {
    host: String,
    port: u16,
    role: Role,
    /// close signals of the open sockets, by socket id
    sockets: HashMap<u64, watch::Sender<bool>>,
    server: Option<ServerEntry>,
}

#[derive(Debug)]
struct ServerEntry {
    listen_addr: SocketAddr,
    task: JoinHandle<()>,
    /// dropped once the server stops listening
    listening: watch::Sender<()>,
}

impl PeerEntry {
    fn info(&self, ae_title: &str) -> PeerInfo {
        let mut sockets: Vec<_> = self.sockets.keys().copied().collect();
        sockets.sort_unstable();
        PeerInfo {
            ae_title: ae_title.to_string(),
            host: self.host.clone(),
            port: self.port,
            role: self.role,
            sockets,
            listen_addr: self.server.as_ref().map(|s| s.listen_addr),
        }
    }

    /// Signal every open socket to close and stop listening.
    fn close(&mut self) {
        for (_, closed) in self.sockets.drain() {
            let _ = closed.send(true);
        }
        self.stop_server();
    }

    fn stop_server(&mut self) {
        if let Some(server) = self.server.take() {
            server.task.abort();
        }
    }
}

impl Connection {
    /// Create a connection manager with no peers.
    pub fn new(options: ConnectionOptions) -> Self {
        Connection {
            inner: Arc::new(Inner {
                options,
                registry: Mutex::new(Registry::default()),
                next_socket_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.inner.options
    }

    /// Register a peer, replacing any peer with the same AE title.
    ///
    /// Returns `false` without registering anything
    /// if the AE title, host or port is missing.
    /// Registering a server-role peer also starts listening on its address,
    /// which requires a Tokio runtime;
    /// failing to listen is reported as `false` as well.
    pub fn add_peer(&self, options: PeerOptions) -> bool {
        if !options.is_complete() {
            warn!("Incomplete peer registration: {:?}", options);
            return false;
        }
        let port = options.port.unwrap_or_default();

        let server = match options.role {
            Role::Server => match self.listen(&options) {
                Some(server) => Some(server),
                None => return false,
            },
            Role::Client => None,
        };

        let mut registry = self.inner.lock();
        let entry = PeerEntry {
            host: options.host.clone(),
            port,
            role: options.role,
            sockets: HashMap::new(),
            server,
        };
        if let Some(mut previous) = registry.peers.insert(options.ae_title.clone(), entry) {
            previous.close();
        }
        if options.default {
            match options.role {
                Role::Server => registry.default_server = Some(options.ae_title),
                Role::Client => registry.default_peer = Some(options.ae_title),
            }
        }
        true
    }

    /// Bind the listener of a server-role peer and start accepting.
    fn listen(&self, options: &PeerOptions) -> Option<ServerEntry> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Cannot serve {} outside of a runtime: {}", options.ae_title, e);
                return None;
            }
        };
        let port = options.port.unwrap_or_default();
        let listener = std::net::TcpListener::bind((options.host.as_str(), port))
            .and_then(|listener| {
                listener.set_nonblocking(true)?;
                Ok(listener)
            })
            .and_then(|listener| {
                let _guard = runtime.enter();
                tokio::net::TcpListener::from_std(listener)
            });
        let listener = match listener {
            Ok(listener) => listener,
            Err(e) => {
                warn!(
                    "Could not listen on {}:{} for {}: {}",
                    options.host, port, options.ae_title, e
                );
                return None;
            }
        };
        let listen_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("Could not obtain listening address: {}", e);
                return None;
            }
        };
        info!("{} listening on: tcp://{}", options.ae_title, listen_addr);

        let server_options = ServerAssociationOptions::new()
            .ae_title(options.ae_title.clone())
            .max_pdu_length(self.inner.options.max_pdu_length)
            .strict(self.inner.options.strict)
            .promiscuous(options.promiscuous);
        let server_options = uids::STORAGE_SOP_CLASSES
            .iter()
            .fold(server_options, |o, uid| o.with_abstract_syntax(*uid));

        let service = Arc::new(Service {
            ae_title: options.ae_title.clone(),
            options: server_options,
            provider: options.provider.clone(),
            close_on_disconnect: options.close_on_disconnect,
        });
        let task = runtime.spawn(accept_loop(listener, Arc::downgrade(&self.inner), service));
        let (listening, _) = watch::channel(());
        Some(ServerEntry {
            listen_addr,
            task,
            listening,
        })
    }

    /// Look up a registered peer.
    pub fn select_peer(&self, ae_title: &str) -> Result<PeerInfo> {
        let registry = self.inner.lock();
        registry
            .peers
            .get(ae_title)
            .map(|entry| entry.info(ae_title))
            .context(UnknownPeerSnafu { ae_title })
    }

    /// The AE title of the default client-role peer.
    pub fn default_peer(&self) -> Option<String> {
        self.inner.lock().default_peer.clone()
    }

    /// The AE title of the default server-role peer.
    pub fn default_server(&self) -> Option<String> {
        self.inner.lock().default_server.clone()
    }

    /// The bound address of a server-role peer.
    pub fn listen_addr(&self, ae_title: &str) -> Option<SocketAddr> {
        let registry = self.inner.lock();
        registry
            .peers
            .get(ae_title)
            .and_then(|entry| entry.server.as_ref())
            .map(|server| server.listen_addr)
    }

    /// Wait until a server-role peer stops listening,
    /// be it after its first connection closes, a reset,
    /// or its replacement by another registration.
    ///
    /// Returns immediately if the peer is not listening.
    pub async fn stopped_listening(&self, ae_title: &str) {
        let listening = self
            .inner
            .lock()
            .peers
            .get(ae_title)
            .and_then(|entry| entry.server.as_ref())
            .map(|server| server.listening.subscribe());
        if let Some(mut listening) = listening {
            while listening.changed().await.is_ok() {}
        }
    }

    /// Whether no socket is open with any peer.
    pub fn all_closed(&self) -> bool {
        self.inner
            .lock()
            .peers
            .values()
            .all(|entry| entry.sockets.is_empty())
    }

    /// Forget every peer,
    /// closing their sockets and listeners and clearing the defaults.
    pub fn reset(&self) {
        self.inner.reset();
    }

    /// Request an association with a registered peer.
    ///
    /// The peer and source AE titles fall back to the defaults,
    /// and the source further falls back to the calling AE title
    /// of the connection options.
    /// These and the presentation contexts are checked
    /// before any socket is opened.
    pub async fn associate(&self, options: AssociateOptions) -> Result<Association> {
        let (host_ae, source_ae) = {
            let registry = self.inner.lock();
            let host_ae = options
                .host_ae
                .or_else(|| registry.default_peer.clone())
                .context(MissingPeerSnafu)?;
            let source_ae = options
                .source_ae
                .or_else(|| registry.default_server.clone())
                .or_else(|| self.inner.options.calling_ae_title.clone())
                .context(MissingSourceSnafu)?;
            (host_ae, source_ae)
        };
        let peer = self.select_peer(&host_ae)?;
        ensure!(!options.contexts.is_empty(), MissingAbstractSyntaxSnafu);

        info!(
            "Requesting association from {} to {} ({}:{})",
            source_ae, host_ae, peer.host, peer.port
        );
        let mut client_options = ClientAssociationOptions::new()
            .calling_ae_title(source_ae)
            .called_ae_title(host_ae.clone())
            .max_pdu_length(self.inner.options.max_pdu_length)
            .strict(self.inner.options.strict);
        if let Some(timeout) = self.inner.options.connection_timeout {
            client_options = client_options.connection_timeout(timeout);
        }
        for (abstract_syntax, transfer_syntaxes) in options.contexts {
            client_options =
                client_options.with_presentation_context(abstract_syntax, transfer_syntaxes);
        }

        let association = client_options
            .establish_async((peer.host.clone(), peer.port))
            .await
            .context(AssociateSnafu)?;
        debug!(
            "Negotiated presentation contexts: {:?}",
            association.presentation_contexts()
        );

        match self.inner.register_socket(&host_ae) {
            Some((socket_id, closed)) => Ok(Association {
                inner: association,
                socket: SocketRegistration {
                    connection: Arc::downgrade(&self.inner),
                    peer_ae_title: host_ae,
                    socket_id,
                },
                closed,
                next_message_id: 1,
            }),
            None => {
                let _ = association.abort().await;
                UnknownPeerSnafu { ae_title: host_ae }.fail()
            }
        }
    }

    /// Send a batch of DICOM files or buffers to the default peer
    /// over a single association.
    ///
    /// Must be called within a Tokio runtime.
    pub fn store_instances(&self, sources: Vec<StoreSource>) -> StoreHandle {
        self.store_instances_with(sources, AssociateOptions::new())
    }

    /// Send a batch of DICOM files or buffers over a single association,
    /// with the peer and source AE titles taken from the given options.
    ///
    /// The presentation contexts are derived from the files,
    /// so any contexts in `options` are replaced.
    /// Must be called within a Tokio runtime.
    pub fn store_instances_with(
        &self,
        sources: Vec<StoreSource>,
        options: AssociateOptions,
    ) -> StoreHandle {
        store::spawn_store(self.clone(), sources, options)
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset(&self) {
        let mut registry = self.lock();
        for (_, mut entry) in registry.peers.drain() {
            entry.close();
        }
        registry.default_peer = None;
        registry.default_server = None;
    }

    /// Record a new socket with the given peer,
    /// returning its identifier and close signal.
    fn register_socket(&self, ae_title: &str) -> Option<(u64, watch::Receiver<bool>)> {
        let mut registry = self.lock();
        let entry = registry.peers.get_mut(ae_title)?;
        let socket_id = self.next_socket_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(false);
        entry.sockets.insert(socket_id, tx);
        debug!("Socket {} open with {}", socket_id, ae_title);
        Some((socket_id, rx))
    }

    fn remove_socket(&self, ae_title: &str, socket_id: u64) {
        let mut registry = self.lock();
        if let Some(entry) = registry.peers.get_mut(ae_title) {
            if entry.sockets.remove(&socket_id).is_some() {
                debug!("Socket {} with {} closed", socket_id, ae_title);
            }
        }
    }

    fn stop_server(&self, ae_title: &str) {
        let mut registry = self.lock();
        if let Some(entry) = registry.peers.get_mut(ae_title) {
            info!("{} no longer listening", ae_title);
            entry.stop_server();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.reset();
    }
}

/// What a server-role peer needs to serve its connections.
struct Service {
    ae_title: String,
    options: ServerAssociationOptions<'static, AcceptAny>,
    provider: Arc<dyn StoreServiceProvider>,
    close_on_disconnect: bool,
}

async fn accept_loop(listener: tokio::net::TcpListener, connection: Weak<Inner>, service: Arc<Service>) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Could not accept connection: {}", e);
                continue;
            }
        };
        debug!("Incoming connection from {}", addr);

        let Some(inner) = connection.upgrade() else {
            return;
        };
        let Some((socket_id, closed)) = inner.register_socket(&service.ae_title) else {
            return;
        };
        drop(inner);

        let connection = connection.clone();
        let service = service.clone();
        tokio::spawn(async move {
            let served = match service.options.establish_async(stream).await {
                Ok(association) => {
                    serve_association(association, service.provider.as_ref(), closed).await
                }
                Err(source) => Err(Error::Associate { source }),
            };
            if let Err(e) = served {
                warn!("Association with {} ended: {}", addr, snafu::Report::from_error(e));
            }
            if let Some(inner) = connection.upgrade() {
                inner.remove_socket(&service.ae_title, socket_id);
                if service.close_on_disconnect {
                    inner.stop_server(&service.ae_title);
                }
            }
        });
    }
}

/// An association requested through a [`Connection`].
///
/// The socket stays registered with its peer
/// until the association is released, aborted, or dropped.
#[derive(Debug)]
pub struct Association {
    inner: AsyncClientAssociation,
    socket: SocketRegistration,
    closed: watch::Receiver<bool>,
    next_message_id: u16,
}

/// Keeps a socket registered with its peer until dropped.
#[derive(Debug)]
struct SocketRegistration {
    connection: Weak<Inner>,
    peer_ae_title: String,
    socket_id: u64,
}

impl SocketRegistration {
    fn remove(&mut self) {
        if let Some(inner) = self.connection.upgrade() {
            inner.remove_socket(&self.peer_ae_title, self.socket_id);
        }
        self.connection = Weak::new();
    }
}

impl Drop for SocketRegistration {
    fn drop(&mut self) {
        self.remove();
    }
}

impl Association {
    /// The accepted presentation contexts.
    pub fn presentation_contexts(&self) -> &[PresentationContextNegotiated] {
        self.inner.presentation_contexts()
    }

    /// The accepted presentation context for the given abstract syntax
    /// and transfer syntax.
    pub fn find_context(
        &self,
        abstract_syntax: &str,
        transfer_syntax: &str,
    ) -> Option<&PresentationContextNegotiated> {
        self.presentation_contexts()
            .iter()
            .find(|pc| pc.abstract_syntax == abstract_syntax && pc.transfer_syntax == transfer_syntax)
    }

    /// The maximum PDU length admitted by the peer.
    pub fn acceptor_max_pdu_length(&self) -> u32 {
        self.inner.acceptor_max_pdu_length()
    }

    pub fn peer_ae_title(&self) -> &str {
        &self.socket.peer_ae_title
    }

    pub fn socket_id(&self) -> u64 {
        self.socket.socket_id
    }

    /// Obtain a fresh message ID for the next request.
    pub fn next_message_id(&mut self) -> u16 {
        let id = self.next_message_id;
        self.next_message_id = self.next_message_id.wrapping_add(1).max(1);
        id
    }

    /// Send a PDU to the peer.
    pub async fn send(&mut self, pdu: &Pdu) -> Result<()> {
        ensure!(!*self.closed.borrow(), ClosedSnafu);
        self.inner.send(pdu).await.context(SendMessageSnafu)
    }

    /// Receive the next PDU from the peer,
    /// unless the connection manager closes the socket first.
    pub async fn receive(&mut self) -> Result<Pdu> {
        ensure!(!*self.closed.borrow(), ClosedSnafu);
        tokio::select! {
            pdu = self.inner.receive() => pdu.context(ReceiveMessageSnafu),
            _ = self.closed.changed() => ClosedSnafu.fail(),
        }
    }

    /// Send a command and its optional data set,
    /// and wait for the final response to it.
    ///
    /// The data set is expected to be encoded already
    /// in the transfer syntax of the presentation context.
    /// Pending responses are skipped.
    pub async fn request(
        &mut self,
        presentation_context_id: u8,
        command: &CommandMessage,
        data: Option<&[u8]>,
    ) -> Result<CommandMessage> {
        let max_pdu_length = self.acceptor_max_pdu_length();
        let pdus = command_pdus(command, presentation_context_id, max_pdu_length)
            .context(MessageSnafu)?;
        for pdu in &pdus {
            self.send(pdu).await?;
        }
        if let Some(data) = data {
            for pdu in data_pdus(data, presentation_context_id, max_pdu_length) {
                self.send(&pdu).await?;
            }
        }

        let message_id = command.message_id().unwrap_or_default();
        let mut assembler = PDataAssembler::new();
        loop {
            match self.receive().await? {
                Pdu::PData { data } => {
                    for pdv in data {
                        let Some(message) = assembler.push(pdv) else {
                            continue;
                        };
                        if message.message_type != MessageType::Command {
                            debug!("Skipping data set of {} bytes", message.data.len());
                            continue;
                        }
                        let response = CommandMessage::decode(&message.data).context(MessageSnafu)?;
                        check_response(command.kind(), message_id, &response)?;
                        match response.status() {
                            Some(status) if status.is_pending() => {
                                debug!("Pending response to message {}", message_id);
                            }
                            _ => return Ok(response),
                        }
                    }
                }
                Pdu::AbortRQ { .. } => {
                    self.socket.remove();
                    return AbortedSnafu.fail();
                }
                pdu => return UnexpectedPduSnafu { pdu }.fail(),
            }
        }
    }

    /// Gracefully release the association.
    pub async fn release(self) -> Result<()> {
        let Association { inner, socket, .. } = self;
        let released = inner.release().await.context(ReleaseSnafu);
        drop(socket);
        released
    }

    /// Abort the association.
    pub async fn abort(self) -> Result<()> {
        let Association { inner, socket, .. } = self;
        let aborted = inner.abort().await.context(SendMessageSnafu);
        drop(socket);
        aborted
    }
}

fn check_response(request: CommandField, message_id: u16, response: &CommandMessage) -> Result<()> {
    let matches_request = request.response() == Some(response.kind())
        && response.message_id_being_responded_to() == Some(message_id);
    ensure!(
        matches_request,
        UnexpectedResponseSnafu {
            kind: response.kind(),
            message_id,
        }
    );
    Ok(())
}
