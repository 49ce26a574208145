#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]
//! DICOM encoding and decoding primitives.
//!
//! This crate provides interfaces and implementations for reading and writing
//! the header and value of DICOM data elements,
//! for each of the three native transfer syntaxes:
//!
//! - Implicit VR Little Endian, where the value representation
//!   is resolved through a data dictionary;
//! - Explicit VR Little Endian;
//! - Explicit VR Big Endian.
//!
//! The [`transfer_syntax`] module binds a transfer syntax UID
//! to its element codecs.
//! Higher level abstractions for reading and writing whole data sets
//! can be found in the `dcmnet-parser` crate.
pub mod decode;
pub mod encode;
pub mod transfer_syntax;

pub use byteordered::Endianness;
pub use decode::Decode;
pub use encode::Encode;
pub use transfer_syntax::TransferSyntax;
