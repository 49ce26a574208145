//! This crates contains the types and methods needed to interact
//! with DICOM nodes through the upper layer protocol.
//!
//! It is the base for the message layer and the connection manager,
//! enabling the creation of concrete service class users (SCUs)
//! and service class providers (SCPs).
//!
//! - The [`address`] module
//!   provides an abstraction for working with compound addresses
//!   referring to application entities in a network.
//! - The [`pdu`] module
//!   provides data structures representing _protocol data units_,
//!   along with their reader and writer.
//! - The [`association`] module
//!   comprises abstractions for establishing and negotiating associations
//!   between application entities via the upper layer protocol by TCP,
//!   as well as P-Data fragmentation.
//!
//! ## Features
//! * `async`: Enables Tokio based association requesters and acceptors.
//!   See [`ClientAssociationOptions`] and [`ServerAssociationOptions`] for details

pub mod address;
pub mod association;
pub mod pdu;

/// The implementation class UID of this networking stack,
/// sent in every association negotiation.
pub const IMPLEMENTATION_CLASS_UID: &str = "2.25.262263880453744217309934426130474216107";

/// The implementation version name of this networking stack.
pub const IMPLEMENTATION_VERSION_NAME: &str = "DCMNET 0.3";

// re-exports

pub use address::{AeAddr, FullAeAddr};
pub use association::client::{ClientAssociation, ClientAssociationOptions};
pub use association::server::{ServerAssociation, ServerAssociationOptions};
pub use pdu::read_pdu;
pub use pdu::write_pdu;
pub use pdu::Pdu;
