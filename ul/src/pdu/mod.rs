//! Protocol Data Unit module
//!
//! This module comprises the data structures representing
//! the protocol data units (PDUs) of the DICOM upper layer,
//! as well as readers and writers of PDUs from arbitrary byte sources.
pub mod reader;
pub mod writer;

use std::fmt::Display;

pub use reader::{
    read_pdu, DEFAULT_MAX_PDU, MAXIMUM_PDU_SIZE, MINIMUM_PDU_SIZE, PDU_HEADER_SIZE,
};
#[cfg(feature = "async")]
pub use reader::read_pdu_async;
pub use writer::write_pdu;

/// The application context name of every DICOM association.
pub const APPLICATION_CONTEXT_NAME: &str = "1.2.840.10008.3.1.1.1";

/// A presentation context as proposed by the association requester.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PresentationContextProposed {
    /// the presentation context identifier, an odd number
    pub id: u8,
    /// the abstract syntax UID
    pub abstract_syntax: String,
    /// the transfer syntax UIDs, in order of preference
    pub transfer_syntaxes: Vec<String>,
}

/// The outcome of a presentation context in an association response.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PresentationContextResult {
    pub id: u8,
    pub reason: PresentationContextResultReason,
    pub transfer_syntax: String,
}

/// A presentation context after negotiation,
/// retaining the abstract syntax from the proposal.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PresentationContextNegotiated {
    pub id: u8,
    pub reason: PresentationContextResultReason,
    pub abstract_syntax: String,
    pub transfer_syntax: String,
}

impl PresentationContextNegotiated {
    /// Whether the presentation context was accepted by the acceptor.
    pub fn is_accepted(&self) -> bool {
        self.reason == PresentationContextResultReason::Acceptance
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PresentationContextResultReason {
    Acceptance = 0,
    UserRejection = 1,
    NoReason = 2,
    AbstractSyntaxNotSupported = 3,
    TransferSyntaxesNotSupported = 4,
}

impl PresentationContextResultReason {
    pub fn from_code(code: u8) -> Option<Self> {
        use PresentationContextResultReason::*;
        Some(match code {
            0 => Acceptance,
            1 => UserRejection,
            2 => NoReason,
            3 => AbstractSyntaxNotSupported,
            4 => TransferSyntaxesNotSupported,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Display for PresentationContextResultReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PresentationContextResultReason::Acceptance => "acceptance",
            PresentationContextResultReason::UserRejection => "user rejection",
            PresentationContextResultReason::NoReason => "no reason",
            PresentationContextResultReason::AbstractSyntaxNotSupported => {
                "abstract syntax not supported"
            }
            PresentationContextResultReason::TransferSyntaxesNotSupported => {
                "transfer syntaxes not supported"
            }
        })
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssociationRJResult {
    Permanent = 1,
    Transient = 2,
}

impl AssociationRJResult {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(AssociationRJResult::Permanent),
            2 => Some(AssociationRJResult::Transient),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// The source of an association rejection, along with its reason.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssociationRJSource {
    ServiceUser(AssociationRJServiceUserReason),
    ServiceProviderAcse(AssociationRJServiceProviderAcseReason),
    ServiceProviderPresentation(AssociationRJServiceProviderPresentationReason),
}

impl AssociationRJSource {
    /// Interpret the source and reason/diagnostic fields
    /// of an A-ASSOCIATE-RJ PDU.
    pub fn from_codes(source: u8, reason: u8) -> Option<Self> {
        use AssociationRJServiceProviderAcseReason as Acse;
        use AssociationRJServiceProviderPresentationReason as Presentation;
        use AssociationRJServiceUserReason as User;

        Some(match (source, reason) {
            (1, 1) => AssociationRJSource::ServiceUser(User::NoReasonGiven),
            (1, 2) => AssociationRJSource::ServiceUser(User::ApplicationContextNameNotSupported),
            (1, 3) => AssociationRJSource::ServiceUser(User::CallingAeTitleNotRecognized),
            (1, 7) => AssociationRJSource::ServiceUser(User::CalledAeTitleNotRecognized),
            (1, 4..=6) | (1, 8..=10) => AssociationRJSource::ServiceUser(User::Reserved(reason)),
            (2, 1) => AssociationRJSource::ServiceProviderAcse(Acse::NoReasonGiven),
            (2, 2) => AssociationRJSource::ServiceProviderAcse(Acse::ProtocolVersionNotSupported),
            (3, 1) => {
                AssociationRJSource::ServiceProviderPresentation(Presentation::TemporaryCongestion)
            }
            (3, 2) => {
                AssociationRJSource::ServiceProviderPresentation(Presentation::LocalLimitExceeded)
            }
            (3, 0) | (3, 3..=7) => {
                AssociationRJSource::ServiceProviderPresentation(Presentation::Reserved(reason))
            }
            _ => return None,
        })
    }

    /// The source and reason/diagnostic codes of this rejection.
    pub fn codes(self) -> (u8, u8) {
        use AssociationRJServiceProviderAcseReason as Acse;
        use AssociationRJServiceProviderPresentationReason as Presentation;
        use AssociationRJServiceUserReason as User;

        match self {
            AssociationRJSource::ServiceUser(reason) => (
                1,
                match reason {
                    User::NoReasonGiven => 1,
                    User::ApplicationContextNameNotSupported => 2,
                    User::CallingAeTitleNotRecognized => 3,
                    User::CalledAeTitleNotRecognized => 7,
                    User::Reserved(code) => code,
                },
            ),
            AssociationRJSource::ServiceProviderAcse(reason) => (
                2,
                match reason {
                    Acse::NoReasonGiven => 1,
                    Acse::ProtocolVersionNotSupported => 2,
                },
            ),
            AssociationRJSource::ServiceProviderPresentation(reason) => (
                3,
                match reason {
                    Presentation::TemporaryCongestion => 1,
                    Presentation::LocalLimitExceeded => 2,
                    Presentation::Reserved(code) => code,
                },
            ),
        }
    }
}

impl Display for AssociationRJSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationRJSource::ServiceUser(r) => Display::fmt(r, f),
            AssociationRJSource::ServiceProviderAcse(r) => Display::fmt(r, f),
            AssociationRJSource::ServiceProviderPresentation(r) => Display::fmt(r, f),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssociationRJServiceUserReason {
    NoReasonGiven,
    ApplicationContextNameNotSupported,
    CallingAeTitleNotRecognized,
    CalledAeTitleNotRecognized,
    Reserved(u8),
}

impl Display for AssociationRJServiceUserReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationRJServiceUserReason::NoReasonGiven => f.write_str("no reason given"),
            AssociationRJServiceUserReason::ApplicationContextNameNotSupported => {
                f.write_str("application context name not supported")
            }
            AssociationRJServiceUserReason::CallingAeTitleNotRecognized => {
                f.write_str("calling AE title not recognized")
            }
            AssociationRJServiceUserReason::CalledAeTitleNotRecognized => {
                f.write_str("called AE title not recognized")
            }
            AssociationRJServiceUserReason::Reserved(code) => write!(f, "reserved code {}", code),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssociationRJServiceProviderAcseReason {
    NoReasonGiven,
    ProtocolVersionNotSupported,
}

impl Display for AssociationRJServiceProviderAcseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationRJServiceProviderAcseReason::NoReasonGiven => {
                f.write_str("no reason given")
            }
            AssociationRJServiceProviderAcseReason::ProtocolVersionNotSupported => {
                f.write_str("protocol version not supported")
            }
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssociationRJServiceProviderPresentationReason {
    TemporaryCongestion,
    LocalLimitExceeded,
    Reserved(u8),
}

impl Display for AssociationRJServiceProviderPresentationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationRJServiceProviderPresentationReason::TemporaryCongestion => {
                f.write_str("temporary congestion")
            }
            AssociationRJServiceProviderPresentationReason::LocalLimitExceeded => {
                f.write_str("local limit exceeded")
            }
            AssociationRJServiceProviderPresentationReason::Reserved(code) => {
                write!(f, "reserved code {}", code)
            }
        }
    }
}

/// A presentation data value: one fragment of a command or data set.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PDataValue {
    pub presentation_context_id: u8,
    pub value_type: PDataValueType,
    /// whether this is the last fragment of the command or data set
    pub is_last: bool,
    pub data: Vec<u8>,
}

impl PDataValue {
    /// The message control header byte of this value.
    pub fn control_header(&self) -> u8 {
        let mut header = 0;
        if self.value_type == PDataValueType::Command {
            header |= 0x01;
        }
        if self.is_last {
            header |= 0x02;
        }
        header
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PDataValueType {
    Command,
    Data,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AbortRQSource {
    ServiceUser,
    ServiceProvider(AbortRQServiceProviderReason),
    Reserved,
}

impl AbortRQSource {
    pub fn from_codes(source: u8, reason: u8) -> Option<Self> {
        use AbortRQServiceProviderReason::*;
        Some(match (source, reason) {
            (0, _) => AbortRQSource::ServiceUser,
            (1, _) => AbortRQSource::Reserved,
            (2, 0) => AbortRQSource::ServiceProvider(ReasonNotSpecified),
            (2, 1) => AbortRQSource::ServiceProvider(UnrecognizedPdu),
            (2, 2) => AbortRQSource::ServiceProvider(UnexpectedPdu),
            (2, 3) => AbortRQSource::ServiceProvider(Reserved),
            (2, 4) => AbortRQSource::ServiceProvider(UnrecognizedPduParameter),
            (2, 5) => AbortRQSource::ServiceProvider(UnexpectedPduParameter),
            (2, 6) => AbortRQSource::ServiceProvider(InvalidPduParameter),
            _ => return None,
        })
    }

    pub fn codes(self) -> (u8, u8) {
        match self {
            AbortRQSource::ServiceUser => (0, 0),
            AbortRQSource::Reserved => (1, 0),
            AbortRQSource::ServiceProvider(reason) => (2, reason as u8),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AbortRQServiceProviderReason {
    ReasonNotSpecified = 0,
    UnrecognizedPdu = 1,
    UnexpectedPdu = 2,
    Reserved = 3,
    UnrecognizedPduParameter = 4,
    UnexpectedPduParameter = 5,
    InvalidPduParameter = 6,
}

impl Display for AbortRQServiceProviderReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AbortRQServiceProviderReason::ReasonNotSpecified => "reason not specified",
            AbortRQServiceProviderReason::UnrecognizedPdu => "unrecognized PDU",
            AbortRQServiceProviderReason::UnexpectedPdu => "unexpected PDU",
            AbortRQServiceProviderReason::Reserved => "reserved code",
            AbortRQServiceProviderReason::UnrecognizedPduParameter => "unrecognized PDU parameter",
            AbortRQServiceProviderReason::UnexpectedPduParameter => "unexpected PDU parameter",
            AbortRQServiceProviderReason::InvalidPduParameter => "invalid PDU parameter",
        })
    }
}

/// A variable item of an association PDU.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum PduVariableItem {
    Unknown(u8),
    ApplicationContext(String),
    PresentationContextProposed(PresentationContextProposed),
    PresentationContextResult(PresentationContextResult),
    UserVariables(Vec<UserVariableItem>),
}

/// A sub-item of the user information item.
///
/// Sub-items other than the ones recognized here
/// are kept as raw bytes along with their item type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum UserVariableItem {
    Unknown(u8, Vec<u8>),
    MaxLength(u32),
    ImplementationClassUID(String),
    ImplementationVersionName(String),
}

/// A protocol data unit of the DICOM upper layer.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Pdu {
    /// A PDU of an unrecognized type, kept as raw bytes
    Unknown { pdu_type: u8, data: Vec<u8> },
    /// A-ASSOCIATE-RQ
    AssociationRQ(AssociationRQ),
    /// A-ASSOCIATE-AC
    AssociationAC(AssociationAC),
    /// A-ASSOCIATE-RJ
    AssociationRJ(AssociationRJ),
    /// P-DATA-TF
    PData { data: Vec<PDataValue> },
    /// A-RELEASE-RQ
    ReleaseRQ,
    /// A-RELEASE-RP
    ReleaseRP,
    /// A-ABORT
    AbortRQ { source: AbortRQSource },
}

impl Pdu {
    /// The PDU type code on the wire.
    pub fn pdu_type(&self) -> u8 {
        match self {
            Pdu::Unknown { pdu_type, .. } => *pdu_type,
            Pdu::AssociationRQ(_) => 0x01,
            Pdu::AssociationAC(_) => 0x02,
            Pdu::AssociationRJ(_) => 0x03,
            Pdu::PData { .. } => 0x04,
            Pdu::ReleaseRQ => 0x05,
            Pdu::ReleaseRP => 0x06,
            Pdu::AbortRQ { .. } => 0x07,
        }
    }

    /// Provide a short description of the PDU,
    /// which does not dump the contents of P-Data values.
    pub fn short_description(&self) -> impl Display + '_ {
        PduShortDescription(self)
    }
}

struct PduShortDescription<'a>(&'a Pdu);

impl Display for PduShortDescription<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Pdu::Unknown { pdu_type, data } => {
                write!(f, "Unknown {{pdu_type: {}, data: {} bytes }}", pdu_type, data.len())
            }
            Pdu::PData { data } => {
                f.write_str("PData [")?;
                for (i, pdv) in data.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "({:?}, {} bytes)", pdv.value_type, pdv.data.len())?;
                }
                f.write_str("]")
            }
            pdu => std::fmt::Debug::fmt(pdu, f),
        }
    }
}

/// A-ASSOCIATE-RQ contents.
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct AssociationRQ {
    pub protocol_version: u16,
    pub calling_ae_title: String,
    pub called_ae_title: String,
    pub application_context_name: String,
    pub presentation_contexts: Vec<PresentationContextProposed>,
    pub user_variables: Vec<UserVariableItem>,
}

impl From<AssociationRQ> for Pdu {
    fn from(value: AssociationRQ) -> Self {
        Pdu::AssociationRQ(value)
    }
}

/// A-ASSOCIATE-AC contents.
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct AssociationAC {
    pub protocol_version: u16,
    pub calling_ae_title: String,
    pub called_ae_title: String,
    pub application_context_name: String,
    pub presentation_contexts: Vec<PresentationContextResult>,
    pub user_variables: Vec<UserVariableItem>,
}

impl From<AssociationAC> for Pdu {
    fn from(value: AssociationAC) -> Self {
        Pdu::AssociationAC(value)
    }
}

/// A-ASSOCIATE-RJ contents.
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct AssociationRJ {
    pub result: AssociationRJResult,
    pub source: AssociationRJSource,
}

impl From<AssociationRJ> for Pdu {
    fn from(value: AssociationRJ) -> Self {
        Pdu::AssociationRJ(value)
    }
}

/// Find the maximum length sub-item among user variables.
pub(crate) fn max_length_of(user_variables: &[UserVariableItem]) -> Option<u32> {
    user_variables.iter().find_map(|item| match item {
        UserVariableItem::MaxLength(len) => Some(*len),
        _ => None,
    })
}
