//! This crate implements the DICOM message service element (DIMSE) layer:
//! the command messages and data sets exchanged over an association.
//!
//! - The [`command`] module
//!   contains the command kinds (C-STORE, C-FIND, C-GET, C-MOVE, C-CANCEL),
//!   their fixed fields and the assembly of command sets,
//!   always encoded in Implicit VR Little Endian.
//! - The [`status`] module
//!   classifies the status codes of DIMSE responses.
//! - The [`message`] module
//!   pairs data sets with their transfer syntax,
//!   and maps messages into P-Data PDUs and back.
//!
//! # Example
//!
//! ```
//! # use dcmnet_dimse::{CommandMessage, CommandField, Priority};
//! let cmd = CommandMessage::c_store_rq(
//!     1,
//!     Priority::Medium,
//!     "1.2.840.10008.5.1.4.1.1.7",
//!     "1.2.888.123",
//! );
//! let bytes = cmd.encode()?;
//! let decoded = CommandMessage::decode(&bytes)?;
//! assert_eq!(decoded.kind(), CommandField::CStoreRq);
//! assert_eq!(decoded.message_id(), Some(1));
//! # Ok::<(), dcmnet_dimse::Error>(())
//! ```

pub mod command;
pub mod message;
pub mod status;

use snafu::{Backtrace, Snafu};

pub use command::{
    CommandField, CommandHeader, CommandMessage, Priority, SubOperations, DATA_SET_ABSENT,
    DATA_SET_PRESENT,
};
pub use message::{
    command_pdus, data_pdus, message_pdus, AssembledMessage, DataSetMessage, DicomMessage,
    MessageType, PDataAssembler,
};
pub use status::{Status, StatusClass};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("unsupported command field {:#06x}", code))]
    UnsupportedCommand { code: u16, backtrace: Backtrace },

    #[snafu(display("missing command field {}", name))]
    MissingField {
        name: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("invalid value in command field {}", name))]
    InvalidField {
        name: &'static str,
        source: dcmnet_core::value::ConvertValueError,
        backtrace: Backtrace,
    },

    #[snafu(display("invalid text in command field {}", name))]
    InvalidText {
        name: &'static str,
        source: dcmnet_core::value::CastValueError,
        backtrace: Backtrace,
    },

    /// could not read command set
    ReadCommand {
        #[snafu(backtrace)]
        source: dcmnet_object::ReadError,
    },

    /// could not write command set
    WriteCommand {
        #[snafu(backtrace)]
        source: dcmnet_object::WriteError,
    },

    /// could not read data set
    ReadDataSet {
        #[snafu(backtrace)]
        source: dcmnet_object::ReadError,
    },

    /// could not write data set
    WriteDataSet {
        #[snafu(backtrace)]
        source: dcmnet_object::WriteError,
    },

    #[snafu(display("unsupported transfer syntax `{}`", uid))]
    UnsupportedTransferSyntax { uid: String, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
