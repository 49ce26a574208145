//! This crate provides the connection manager of a DICOM network node,
//! built on top of the upper layer and message service crates.
//!
//! A [`Connection`] owns a registry of peer application entities.
//! Client-role peers are targets of outbound associations,
//! while server-role peers make the connection listen on their address
//! and answer C-STORE requests through a [`StoreServiceProvider`].
//!
//! - The [`connection`] module
//!   contains the connection manager and its associations.
//! - The [`peer`] module
//!   describes how peers are registered.
//! - The [`provider`] module
//!   serves incoming associations of server-role peers.
//! - The [`store`] module
//!   sends a batch of DICOM files or buffers over one association,
//!   reporting the outcome of each one.
//!
//! # Example
//!
//! ```no_run
//! # use dcmnet_node::{Connection, ConnectionOptions, PeerOptions, StoreSource};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = Connection::new(
//!     ConnectionOptions::new().calling_ae_title("STORE-SCU"),
//! );
//! connection.add_peer(
//!     PeerOptions::new("STORE-SCP", "127.0.0.1", 11111).default_peer(true),
//! );
//!
//! let mut handle = connection.store_instances(vec![
//!     StoreSource::file("image1.dcm"),
//!     StoreSource::file("image2.dcm"),
//! ]);
//! while let Some(outcome) = handle.next_outcome().await {
//!     match outcome.result {
//!         Ok(status) => println!("{}: stored ({})", outcome.source, status),
//!         Err(e) => println!("{}: {}", outcome.source, e),
//!     }
//! }
//! handle.finish().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod peer;
pub mod provider;
pub mod store;

use dcmnet_ul::Pdu;
use snafu::{Backtrace, Snafu};

pub use connection::{AssociateOptions, Association, Connection, ConnectionOptions};
pub use peer::{PeerInfo, PeerOptions, Role};
pub use provider::{AcknowledgeStore, StoreRequest, StoreServiceProvider};
pub use store::{StoreError, StoreHandle, StoreOutcome, StoreSource};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("no such peer `{}`", ae_title))]
    UnknownPeer {
        ae_title: String,
        backtrace: Backtrace,
    },

    /// no peer given and no default peer registered
    MissingPeer { backtrace: Backtrace },

    /// no source AE title given and no default server or calling AE title set
    MissingSource { backtrace: Backtrace },

    /// presentation contexts must be specified
    MissingAbstractSyntax { backtrace: Backtrace },

    /// could not establish association
    Associate {
        #[snafu(backtrace)]
        source: dcmnet_ul::association::Error,
    },

    /// could not send message to peer
    SendMessage {
        #[snafu(backtrace)]
        source: dcmnet_ul::association::Error,
    },

    /// could not receive message from peer
    ReceiveMessage {
        #[snafu(backtrace)]
        source: dcmnet_ul::association::Error,
    },

    /// could not release association
    Release {
        #[snafu(backtrace)]
        source: dcmnet_ul::association::Error,
    },

    /// could not encode or decode message
    Message {
        #[snafu(backtrace)]
        source: dcmnet_dimse::Error,
    },

    #[snafu(display("unexpected PDU from peer `{}`", pdu.short_description()))]
    UnexpectedPdu { pdu: Box<Pdu>, backtrace: Backtrace },

    #[snafu(display("unexpected {} in response to message {}", kind, message_id))]
    UnexpectedResponse {
        kind: dcmnet_dimse::CommandField,
        message_id: u16,
        backtrace: Backtrace,
    },

    /// association aborted by peer
    Aborted { backtrace: Backtrace },

    /// association closed by the connection manager
    Closed { backtrace: Backtrace },

    #[snafu(display("no transfer syntax for SOP class `{}`", sop_class_uid))]
    NoTransferSyntax {
        sop_class_uid: String,
        backtrace: Backtrace,
    },

    /// store task was interrupted
    StoreTask {
        source: tokio::task::JoinError,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
