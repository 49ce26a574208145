//! This crate implements the standard DICOM dictionary and constants
//! needed by the dcmnet networking stack.
//!
//! ## Run-time dictionary
//!
//! - [`data_element`]: Contains information about the DICOM attributes
//!   of the command group, the file meta group,
//!   and the common patient, study, series and image attributes.
//!   The dictionary is provided as a singleton
//!   behind the unit type [`StandardDataDictionary`].
//!
//! ## Constants
//!
//! The following modules contain constant declarations,
//! which perform an equivalent mapping at compile time,
//! thus without incurring a look-up cost:
//!
//! - [`tags`], which map an attribute alias to a DICOM tag
//! - [`uids`], for normative DICOM unique identifiers
pub mod data_element;
pub mod tags;
pub mod uids;

pub use data_element::{StandardDataDictionary, StandardDataDictionaryRegistry};
