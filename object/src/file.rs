use dcmnet_core::DataDictionary;
use dcmnet_dictionary_std::StandardDataDictionary;
use dcmnet_encoding::TransferSyntax;
use snafu::{OptionExt, ResultExt};

use crate::meta::FileMetaTable;
use crate::{
    DefaultDicomObject, FileDicomObject, InMemDicomObject, OpenFileSnafu, ParseMetaDataSetSnafu,
    ReadDataSetSnafu, ReadPreambleBytesSnafu, ReadUnsupportedTransferSyntaxSnafu, Result,
};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const DICM_MAGIC_CODE: &[u8; 4] = b"DICM";

/// Create a DICOM object by reading from a byte source.
///
/// The preamble is detected automatically:
/// the source may start either with the 128-byte preamble
/// or directly with the magic code.
pub fn from_reader<F>(file: F) -> Result<DefaultDicomObject>
where
    F: Read,
{
    OpenFileOptions::new().from_reader(file)
}

/// Create a DICOM object by reading from a file.
///
/// This function assumes the standard file encoding structure: 128-byte
/// preamble, file meta group, and the rest of the data set.
/// Files without a preamble are also accepted.
pub fn open_file<P>(path: P) -> Result<DefaultDicomObject>
where
    P: AsRef<Path>,
{
    OpenFileOptions::new().open_file(path)
}

/// Read only the preamble, magic code and file meta group from a byte source,
/// leaving the source at the start of the data set.
pub fn read_meta<R>(mut reader: R, read_preamble: ReadPreamble) -> Result<FileMetaTable>
where
    R: Read,
{
    if skip_preamble(&mut reader, read_preamble)? {
        // the magic code was already consumed
        let mut source = (&DICM_MAGIC_CODE[..]).chain(&mut reader);
        FileMetaTable::from_reader(&mut source).context(ParseMetaDataSetSnafu)
    } else {
        FileMetaTable::from_reader(&mut reader).context(ParseMetaDataSetSnafu)
    }
}

/// Read only the preamble, magic code and file meta group
/// of the file at the given path.
///
/// The main data set is not read.
pub fn open_meta<P>(path: P) -> Result<FileMetaTable>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).context(OpenFileSnafu { filename: path })?;
    read_meta(BufReader::new(file), ReadPreamble::Auto)
}

/// Read a DICOM file with its data set kept undecoded.
pub fn open_raw<P>(path: P) -> Result<RawDicomFile>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).context(OpenFileSnafu { filename: path })?;
    RawDicomFile::from_reader(BufReader::new(file), ReadPreamble::Auto)
}

/// Consume the preamble as configured,
/// returning whether the magic code was consumed along with it.
fn skip_preamble<R>(reader: &mut R, read_preamble: ReadPreamble) -> Result<bool>
where
    R: Read,
{
    match read_preamble {
        ReadPreamble::Never => Ok(false),
        ReadPreamble::Always => {
            let mut buf = [0u8; 128];
            reader
                .read_exact(&mut buf)
                .context(ReadPreambleBytesSnafu)?;
            Ok(false)
        }
        ReadPreamble::Auto => {
            let mut buf = [0u8; 128];
            reader
                .read_exact(&mut buf[..4])
                .context(ReadPreambleBytesSnafu)?;
            if &buf[..4] == DICM_MAGIC_CODE {
                return Ok(true);
            }
            reader
                .read_exact(&mut buf[4..])
                .context(ReadPreambleBytesSnafu)?;
            Ok(false)
        }
    }
}

/// A builder type for opening a DICOM file with additional options.
///
/// # Example
///
/// ```no_run
/// # use dcmnet_object::{OpenFileOptions, ReadPreamble};
/// let file = OpenFileOptions::new()
///     .read_preamble(ReadPreamble::Always)
///     .open_file("path/to/file.dcm")?;
/// # Result::<(), Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default, Clone)]
#[non_exhaustive]
pub struct OpenFileOptions<D = StandardDataDictionary> {
    data_dictionary: D,
    read_preamble: ReadPreamble,
}

impl OpenFileOptions {
    pub fn new() -> Self {
        OpenFileOptions::default()
    }
}

impl<D> OpenFileOptions<D> {
    /// Set whether to read the 128-byte DICOM file preamble.
    pub fn read_preamble(mut self, option: ReadPreamble) -> Self {
        self.read_preamble = option;
        self
    }

    /// Set the data element dictionary to use when reading the file.
    pub fn dictionary<Di>(self, dict: Di) -> OpenFileOptions<Di>
    where
        Di: DataDictionary,
        Di: Clone,
    {
        OpenFileOptions {
            data_dictionary: dict,
            read_preamble: self.read_preamble,
        }
    }

    /// Open the file at the given path.
    pub fn open_file<P>(self, path: P) -> Result<DefaultDicomObject<D>>
    where
        P: AsRef<Path>,
        D: DataDictionary,
        D: Clone,
    {
        let path = path.as_ref();
        let file = File::open(path).context(OpenFileSnafu { filename: path })?;
        self.from_reader(BufReader::new(file))
    }

    /// Obtain a DICOM object by reading from a byte source.
    ///
    /// The source is read to the end.
    pub fn from_reader<R>(self, mut from: R) -> Result<DefaultDicomObject<D>>
    where
        R: Read,
        D: DataDictionary,
        D: Clone,
    {
        let meta = read_meta(&mut from, self.read_preamble)?;
        let ts = meta_transfer_syntax(&meta)?;
        let obj = InMemDicomObject::read_dataset_with_dict_ts(from, self.data_dictionary, ts)?;
        Ok(FileDicomObject::new(meta, obj))
    }
}

fn meta_transfer_syntax(meta: &FileMetaTable) -> Result<&'static TransferSyntax> {
    meta.transfer_syntax_descriptor()
        .context(ReadUnsupportedTransferSyntaxSnafu {
            uid: meta.transfer_syntax(),
        })
}

/// An enumerate of supported options for
/// whether to read the 128-byte DICOM file preamble.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ReadPreamble {
    /// Detect the preamble from the first bytes of the source:
    /// when they are the magic code, there is no preamble.
    #[default]
    Auto,
    /// Never read the preamble,
    /// thus assuming that the original source does not have it.
    Never,
    /// Always read the preamble first,
    /// thus assuming that the original source always has it.
    Always,
}

/// A DICOM file whose main data set is kept as raw bytes,
/// in the transfer syntax declared by its file meta group.
///
/// This is the representation used to forward stored instances,
/// as the data set does not need to be decoded for that.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDicomFile {
    /// the file meta group
    pub meta: FileMetaTable,
    /// the encoded data set which follows the file meta group
    pub dataset: Vec<u8>,
}

impl RawDicomFile {
    /// Read the file meta group and the remaining bytes of the given source.
    pub fn from_reader<R>(mut reader: R, read_preamble: ReadPreamble) -> Result<Self>
    where
        R: Read,
    {
        let meta = read_meta(&mut reader, read_preamble)?;
        let mut dataset = Vec::new();
        reader
            .read_to_end(&mut dataset)
            .context(ReadDataSetSnafu)?;
        Ok(RawDicomFile { meta, dataset })
    }

    /// The transfer syntax UID of the data set, without padding.
    pub fn transfer_syntax(&self) -> &str {
        self.meta.transfer_syntax()
    }

    /// Decode the data set into an in-memory object.
    ///
    /// Fails if the transfer syntax is not supported natively.
    pub fn decode(&self) -> Result<InMemDicomObject> {
        let ts = meta_transfer_syntax(&self.meta)?;
        InMemDicomObject::read_dataset_with_ts(&self.dataset[..], ts)
    }
}

#[cfg(test)]
mod tests {
    use super::{read_meta, RawDicomFile, ReadPreamble};
    use crate::{FileMetaTableBuilder, InMemDicomObject, ReadError};
    use dcmnet_core::VR;
    use dcmnet_dictionary_std::{tags, uids};
    use dcmnet_encoding::transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN;

    fn sample_file(preamble: bool) -> Vec<u8> {
        let meta = FileMetaTableBuilder::new()
            .transfer_syntax(uids::IMPLICIT_VR_LITTLE_ENDIAN)
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("2.25.99")
            .build()
            .unwrap();
        let mut obj = InMemDicomObject::new_empty();
        obj.put_str(tags::SOP_INSTANCE_UID, VR::UI, "2.25.99");
        obj.put_str(tags::PATIENT_NAME, VR::PN, "Doe^Jane");

        let mut out = Vec::new();
        if preamble {
            out.extend_from_slice(&[0u8; 128]);
        }
        obj.with_meta(meta).write_all(&mut out).unwrap();
        out
    }

    #[test]
    fn read_preamble_auto_detects_both_layouts() {
        for preamble in [true, false] {
            let data = sample_file(preamble);
            let obj = crate::from_reader(&data[..]).unwrap();
            assert_eq!(obj.meta().media_storage_sop_instance_uid(), "2.25.99");
            assert_eq!(
                obj.element(tags::PATIENT_NAME).unwrap().to_str().unwrap(),
                "Doe^Jane"
            );
        }
    }

    #[test]
    fn read_preamble_explicit_options() {
        let with = sample_file(true);
        let without = sample_file(false);
        assert!(read_meta(&with[..], ReadPreamble::Always).is_ok());
        assert!(read_meta(&without[..], ReadPreamble::Never).is_ok());
        assert!(matches!(
            read_meta(&with[..], ReadPreamble::Never),
            Err(ReadError::ParseMetaDataSet { .. })
        ));
    }

    #[test]
    fn raw_file_keeps_data_set_bytes() {
        let data = sample_file(true);
        let raw = RawDicomFile::from_reader(&data[..], ReadPreamble::Auto).unwrap();
        assert_eq!(raw.transfer_syntax(), IMPLICIT_VR_LITTLE_ENDIAN.uid());

        let obj = raw.decode().unwrap();
        let mut expected = Vec::new();
        obj.write_dataset_with_ts(&mut expected, &IMPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();
        assert_eq!(raw.dataset, expected);
        assert!(data.ends_with(&raw.dataset));
    }

    #[test]
    fn unsupported_transfer_syntax_is_reported() {
        let meta = FileMetaTableBuilder::new()
            // JPEG baseline
            .transfer_syntax("1.2.840.10008.1.2.4.50")
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("2.25.100")
            .build()
            .unwrap();
        let mut data = Vec::new();
        meta.write(&mut data).unwrap();

        // raw reading does not care about the transfer syntax
        let raw = RawDicomFile::from_reader(&data[..], ReadPreamble::Auto).unwrap();
        assert!(raw.dataset.is_empty());

        let err = crate::from_reader(&data[..]).unwrap_err();
        assert!(matches!(
            err,
            ReadError::ReadUnsupportedTransferSyntax { .. }
        ));
    }
}
