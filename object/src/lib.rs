#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]
//! This crate contains a high-level abstraction for reading and manipulating
//! DICOM objects.
//! At this level, objects are comparable to a dictionary of elements,
//! in which some of them can have DICOM objects themselves.
//!
//! - [`InMemDicomObject`] is a data set fully contained in memory,
//!   read from and written to any byte source in a given transfer syntax;
//! - [`FileMetaTable`] is the file meta group
//!   found after the preamble of a DICOM file;
//! - [`RawDicomFile`] pairs a file meta group with the undecoded data set,
//!   which is the representation used when forwarding files over the network.
//!
//! # Examples
//!
//! Loading a file and reading some attributes by their standard alias:
//!
//! ```no_run
//! use dcmnet_object::open_file;
//! # fn foo() -> Result<(), Box<dyn std::error::Error>> {
//! let obj = open_file("0001.dcm")?;
//! let patient_name = obj.element_by_name("PatientName")?.to_str()?;
//! let modality = obj.element_by_name("Modality")?.to_str()?;
//! # Ok(())
//! # }
//! ```
pub mod file;
pub mod mem;
pub mod meta;
pub mod tokens;

pub use crate::file::{
    from_reader, open_file, open_meta, open_raw, read_meta, OpenFileOptions, RawDicomFile,
    ReadPreamble,
};
pub use crate::mem::{InMemDicomObject, InMemElement};
pub use crate::meta::{FileMetaTable, FileMetaTableBuilder};
pub use dcmnet_core::Tag;
pub use dcmnet_dictionary_std::StandardDataDictionary;

use dcmnet_encoding::TransferSyntax;
use snafu::{Backtrace, ResultExt, Snafu};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// The current implementation class UID generically referring to dcmnet.
///
/// Automatically generated as per the standard, part 5, section B.2.
pub const IMPLEMENTATION_CLASS_UID: &str = "2.25.262263880453744217309934426130474216107";

/// The current implementation version name generically referring to dcmnet.
pub const IMPLEMENTATION_VERSION_NAME: &str = "DCMNET 0.3";

/// The default implementation of a root DICOM object.
pub type DefaultDicomObject<D = StandardDataDictionary> = FileDicomObject<InMemDicomObject<D>>;

/// An error which may occur when loading a DICOM object
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ReadError {
    #[snafu(display("Could not open file '{}'", filename.display()))]
    OpenFile {
        filename: std::path::PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Could not read from file '{}'", filename.display()))]
    ReadFile {
        filename: std::path::PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },
    /// Could not read preamble bytes
    #[snafu(display("Could not read preamble bytes"))]
    ReadPreambleBytes {
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Could not parse meta group data set"))]
    ParseMetaDataSet {
        #[snafu(backtrace)]
        source: meta::Error,
    },
    #[snafu(display("Could not read data set token"))]
    ReadToken {
        #[snafu(backtrace)]
        source: dcmnet_parser::dataset::read::Error,
    },
    #[snafu(display("Could not read data set bytes"))]
    ReadDataSet {
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Missing element value after header token"))]
    MissingElementValue { backtrace: Backtrace },
    #[snafu(display("Unsupported transfer syntax `{}`", uid))]
    ReadUnsupportedTransferSyntax { uid: String, backtrace: Backtrace },
    #[snafu(display("Unexpected token {}", token))]
    UnexpectedToken {
        token: Box<dcmnet_parser::DataToken>,
        backtrace: Backtrace,
    },
    /// Encapsulated pixel data cannot be held in an in-memory object,
    /// use [`RawDicomFile`] to forward such data sets untouched.
    #[snafu(display("Encapsulated pixel data is not supported in memory"))]
    EncapsulatedPixelData { backtrace: Backtrace },
    #[snafu(display("Premature data set end"))]
    PrematureEnd { backtrace: Backtrace },
}

/// An error which may occur when writing a DICOM object
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum WriteError {
    #[snafu(display("Could not write to file '{}'", filename.display()))]
    WriteFile {
        filename: std::path::PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Could not write object preamble"))]
    WritePreamble {
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("Could not print meta group data set"))]
    PrintMetaDataSet {
        #[snafu(backtrace)]
        source: meta::Error,
    },
    #[snafu(display("Could not print data set"))]
    PrintDataSet {
        #[snafu(backtrace)]
        source: dcmnet_parser::dataset::write::Error,
    },
    #[snafu(display("Unsupported transfer syntax `{}`", uid))]
    WriteUnsupportedTransferSyntax { uid: String, backtrace: Backtrace },
}

/// An error which may occur when looking up a DICOM object's attributes.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum AccessError {
    #[snafu(display("No such data element with tag {}", tag))]
    NoSuchDataElementTag { tag: Tag, backtrace: Backtrace },
}

/// An error which may occur when looking up a DICOM object's attributes
/// by a keyword (or alias) instead of by tag.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum AccessByNameError {
    #[snafu(display("No such data element {} (with tag {})", alias, tag))]
    NoSuchDataElementAlias {
        tag: Tag,
        alias: String,
        backtrace: Backtrace,
    },

    /// Could not resolve attribute name from the data dictionary
    #[snafu(display("Unknown data attribute named `{}`", name))]
    UnknownAttribute { name: String, backtrace: Backtrace },
}

pub type Result<T, E = ReadError> = std::result::Result<T, E>;

/// A root DICOM object retrieved from a standard DICOM file,
/// containing additional information from the file meta group
/// in a separate table value.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDicomObject<O> {
    meta: FileMetaTable,
    obj: O,
}

impl<O> FileDicomObject<O> {
    /// Create a file object from its parts.
    pub fn new(meta: FileMetaTable, obj: O) -> Self {
        FileDicomObject { meta, obj }
    }

    /// Retrieve the processed meta header table.
    pub fn meta(&self) -> &FileMetaTable {
        &self.meta
    }

    /// Retrieve the inner DICOM object structure, discarding the meta table.
    pub fn into_inner(self) -> O {
        self.obj
    }
}

impl<D> FileDicomObject<InMemDicomObject<D>>
where
    D: dcmnet_core::DataDictionary + Clone,
{
    /// Write the entire object as a DICOM file
    /// into the given file path.
    /// Preamble, magic code, and file meta group will be included
    /// before the inner object.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WriteError> {
        let path = path.as_ref();
        let file = File::create(path).context(WriteFileSnafu { filename: path })?;
        let mut to = BufWriter::new(file);

        // write preamble
        to.write_all(&[0_u8; 128][..])
            .context(WriteFileSnafu { filename: path })?;

        self.write_all(&mut to)?;

        to.flush().context(WriteFileSnafu { filename: path })
    }

    /// Write the entire object as a DICOM file
    /// into the given writer.
    /// Magic code and file meta group will be included
    /// before the inner object, but the preamble is left out.
    pub fn write_all<W: Write>(&self, mut to: W) -> Result<(), WriteError> {
        self.meta.write(&mut to).context(PrintMetaDataSetSnafu)?;

        let ts = self.meta.transfer_syntax_descriptor().ok_or_else(|| {
            WriteUnsupportedTransferSyntaxSnafu {
                uid: self.meta.transfer_syntax(),
            }
            .build()
        })?;
        self.obj.write_dataset_with_ts(to, ts)
    }

    /// Retrieve the transfer syntax descriptor of the file,
    /// if it is supported.
    pub fn transfer_syntax(&self) -> Option<&'static TransferSyntax> {
        self.meta.transfer_syntax_descriptor()
    }
}

impl<O> std::ops::Deref for FileDicomObject<O> {
    type Target = O;

    fn deref(&self) -> &Self::Target {
        &self.obj
    }
}

impl<O> std::ops::DerefMut for FileDicomObject<O> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.obj
    }
}

#[cfg(test)]
mod tests {
    use crate::{FileMetaTableBuilder, InMemDicomObject};
    use dcmnet_core::{DataElement, PrimitiveValue, Tag, VR};

    #[test]
    fn smoke_test() {
        const FILE_NAME: &str = ".smoke-test.dcm";

        let meta = FileMetaTableBuilder::new()
            .transfer_syntax(dcmnet_dictionary_std::uids::EXPLICIT_VR_LITTLE_ENDIAN)
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.1")
            .media_storage_sop_instance_uid("1.2.3.456")
            .implementation_class_uid("1.2.345.6.7890.1.234")
            .build()
            .unwrap();
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(
            Tag(0x0010, 0x0010),
            VR::PN,
            PrimitiveValue::from("Doe^John"),
        ));
        let obj = obj.with_meta(meta);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        obj.write_to_file(&path).unwrap();

        let obj2 = crate::open_file(&path).unwrap();
        assert_eq!(obj2.meta(), obj.meta());
        assert_eq!(
            obj2.element(Tag(0x0010, 0x0010)).unwrap().to_str().unwrap(),
            "Doe^John"
        );
    }
}
