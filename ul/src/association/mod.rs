//! DICOM association module
//!
//! This module contains utilities for establishing associations
//! between DICOM nodes via TCP/IP.
//!
//! As an association requester, often as a service class user (SCU),
//! a new association can be started
//! via the [`ClientAssociationOptions`] type.
//! The minimum required properties are the proposed abstract syntaxes
//! and the TCP socket address to the target node.
//!
//! As an association acceptor,
//! usually taking the role of a service class provider (SCP),
//! a newly accepted [TCP stream](std::net::TcpStream) can be passed to
//! a previously prepared [`ServerAssociationOptions`].
//!
//! With the `async` feature,
//! both sides can also be established over Tokio TCP streams.
pub mod client;
pub mod server;

mod pdata;

pub use client::{ClientAssociation, ClientAssociationOptions};
#[cfg(feature = "async")]
pub use client::AsyncClientAssociation;
pub use pdata::{calculate_max_data_len_single, PDataFragments, PDataReader, PDataWriter};
pub use server::{
    AcceptAny, AcceptCalledAeTitle, AccessControl, ServerAssociation, ServerAssociationOptions,
};
#[cfg(feature = "async")]
pub use server::AsyncServerAssociation;

use snafu::{Backtrace, Snafu};

use crate::pdu::{self, AssociationRJ, Pdu, UserVariableItem, DEFAULT_MAX_PDU, MAXIMUM_PDU_SIZE};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// missing abstract syntax to begin negotiation
    MissingAbstractSyntax { backtrace: Backtrace },

    #[snafu(display("invalid maximum PDU length {}", max_pdu_length))]
    InvalidMaxPdu {
        max_pdu_length: u32,
        backtrace: Backtrace,
    },

    /// could not connect to peer
    Connect {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// timed out while connecting to peer
    #[cfg(feature = "async")]
    ConnectTimeout {
        source: tokio::time::error::Elapsed,
        backtrace: Backtrace,
    },

    /// could not set socket timeouts
    SetTimeout {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// failed to encode PDU message
    #[non_exhaustive]
    SendPdu {
        #[snafu(backtrace)]
        source: pdu::writer::Error,
    },

    /// failed to send PDU message on wire
    #[non_exhaustive]
    WireSend {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// failed to receive PDU message
    #[non_exhaustive]
    ReceivePdu {
        #[snafu(backtrace)]
        source: pdu::reader::Error,
    },

    #[snafu(display("unexpected PDU from peer `{}`", pdu.short_description()))]
    #[non_exhaustive]
    UnexpectedPdu {
        /// the PDU obtained from the peer
        pdu: Box<Pdu>,
    },

    #[snafu(display("unknown PDU from peer `{}`", pdu.short_description()))]
    #[non_exhaustive]
    UnknownPdu {
        /// the PDU obtained from the peer, of variant Unknown
        pdu: Box<Pdu>,
    },

    #[snafu(display("protocol version mismatch: expected {}, got {}", expected, got))]
    ProtocolVersionMismatch {
        expected: u16,
        got: u16,
        backtrace: Backtrace,
    },

    #[snafu(display("association rejected: {}", association_rj.source))]
    Rejected {
        association_rj: AssociationRJ,
        backtrace: Backtrace,
    },

    /// association aborted
    Aborted { backtrace: Backtrace },

    /// no presentation contexts accepted by the acceptor
    NoAcceptedPresentationContexts { backtrace: Backtrace },

    #[snafu(display(
        "PDU is too large ({} bytes) to be sent to the remote application entity",
        length
    ))]
    #[non_exhaustive]
    SendTooLongPdu { length: usize, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Obtain the maximum PDU length announced by the peer.
///
/// A missing item means the default length,
/// and zero means no limit, bounded to the maximum of the standard.
pub(crate) fn peer_max_pdu_length(user_variables: &[UserVariableItem]) -> u32 {
    match pdu::max_length_of(user_variables) {
        None => DEFAULT_MAX_PDU,
        Some(0) => MAXIMUM_PDU_SIZE,
        Some(len) => len,
    }
}

/// The user information sub-items this node sends in every negotiation.
pub(crate) fn local_user_variables(max_pdu_length: u32) -> Vec<UserVariableItem> {
    vec![
        UserVariableItem::MaxLength(max_pdu_length),
        UserVariableItem::ImplementationClassUID(crate::IMPLEMENTATION_CLASS_UID.to_string()),
        UserVariableItem::ImplementationVersionName(crate::IMPLEMENTATION_VERSION_NAME.to_string()),
    ]
}

/// Trim trailing whitespace and null characters from a UID.
pub(crate) fn trim_uid(uid: &str) -> &str {
    uid.trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_max_pdu_length_defaults() {
        assert_eq!(peer_max_pdu_length(&[]), DEFAULT_MAX_PDU);
        assert_eq!(
            peer_max_pdu_length(&[UserVariableItem::MaxLength(0)]),
            MAXIMUM_PDU_SIZE
        );
        assert_eq!(
            peer_max_pdu_length(&[
                UserVariableItem::ImplementationVersionName("X".to_string()),
                UserVariableItem::MaxLength(32_768),
            ]),
            32_768
        );
    }

    #[test]
    fn trims_uid_padding() {
        assert_eq!(trim_uid("1.2.840.10008.1.2\0"), "1.2.840.10008.1.2");
        assert_eq!(trim_uid("1.2.840.10008.1.2.1 "), "1.2.840.10008.1.2.1");
    }
}
