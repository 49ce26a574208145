//! This crate provides interfaces and data structures for reading and writing
//! DICOM data sets as streams of tokens.
//!
//! - [`DataSetReader`] turns a byte source into a sequence of [`DataToken`]s,
//!   following the framing of a given transfer syntax;
//! - [`DataSetWriter`] does the opposite,
//!   printing tokens to a byte sink.
//!
//! For the time being, all APIs are based on synchronous I/O.
pub mod dataset;

pub use dataset::read::DataSetReader;
pub use dataset::write::DataSetWriter;
pub use dataset::DataToken;
