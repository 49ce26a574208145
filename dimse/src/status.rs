//! DIMSE response status codes and their classification.
use std::fmt;

/// The broad category of a DIMSE response status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Success,
    Pending,
    Warning,
    Failure,
    Cancel,
    /// A code outside of every known category
    Unknown,
}

/// A DIMSE response status code, as found in the _Status_ (0000,0900) field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Status(pub u16);

impl Status {
    pub const SUCCESS: Status = Status(0x0000);
    pub const PENDING: Status = Status(0xFF00);
    /// Pending, with one or more optional keys not supported
    pub const PENDING_WARNING: Status = Status(0xFF01);
    pub const CANCEL: Status = Status(0xFE00);
    pub const WARNING: Status = Status(0x0001);
    /// Failure: unable to process
    pub const UNABLE_TO_PROCESS: Status = Status(0xC000);

    pub fn code(self) -> u16 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 == 0x0000
    }

    pub fn is_pending(self) -> bool {
        self.0 == 0xFF00 || self.0 == 0xFF01
    }

    pub fn is_warning(self) -> bool {
        self.0 == 0x0001 || self.0 >> 12 == 0xB
    }

    pub fn is_failure(self) -> bool {
        matches!(self.0 >> 12, 0xA | 0xC) || self.0 >> 8 == 0x01
    }

    pub fn is_cancel(self) -> bool {
        self.0 == 0xFE00
    }

    /// Whether no further responses are expected
    /// for the request which this status answers.
    pub fn is_final(self) -> bool {
        self.is_success() || self.is_failure() || self.is_cancel()
    }

    pub fn class(self) -> StatusClass {
        if self.is_success() {
            StatusClass::Success
        } else if self.is_pending() {
            StatusClass::Pending
        } else if self.is_cancel() {
            StatusClass::Cancel
        } else if self.is_warning() {
            StatusClass::Warning
        } else if self.is_failure() {
            StatusClass::Failure
        } else {
            StatusClass::Unknown
        }
    }
}

impl From<u16> for Status {
    fn from(code: u16) -> Self {
        Status(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}H", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x0000, StatusClass::Success, true)]
    #[case(0xFF00, StatusClass::Pending, false)]
    #[case(0xFF01, StatusClass::Pending, false)]
    #[case(0xFE00, StatusClass::Cancel, true)]
    #[case(0x0001, StatusClass::Warning, false)]
    #[case(0xB000, StatusClass::Warning, false)]
    #[case(0xB007, StatusClass::Warning, false)]
    #[case(0xA700, StatusClass::Failure, true)]
    #[case(0xA900, StatusClass::Failure, true)]
    #[case(0xC000, StatusClass::Failure, true)]
    #[case(0xC211, StatusClass::Failure, true)]
    #[case(0x0105, StatusClass::Failure, true)]
    #[case(0x0122, StatusClass::Failure, true)]
    #[case(0x0210, StatusClass::Unknown, false)]
    fn classify_status(#[case] code: u16, #[case] class: StatusClass, #[case] is_final: bool) {
        let status = Status(code);
        assert_eq!(status.class(), class);
        assert_eq!(status.is_final(), is_final);
    }

    #[test]
    fn success_is_not_failure() {
        assert!(Status::SUCCESS.is_success());
        assert!(!Status::SUCCESS.is_failure());
        assert!(!Status::SUCCESS.is_warning());
        assert!(Status::UNABLE_TO_PROCESS.is_failure());
    }

    #[test]
    fn display_hex() {
        assert_eq!(Status::UNABLE_TO_PROCESS.to_string(), "C000H");
        assert_eq!(Status(0x0001).to_string(), "0001H");
    }
}
