//! Module containing data structures and readers of DICOM file meta information tables.
use crate::{IMPLEMENTATION_CLASS_UID, IMPLEMENTATION_VERSION_NAME};
use byteordered::ByteOrdered;
use dcmnet_core::header::{HasLength, Header};
use dcmnet_core::value::PrimitiveValue;
use dcmnet_core::{dicom_value, DataElement, Length, Tag, VR};
use dcmnet_encoding::decode::explicit_le::ExplicitVRLittleEndianDecoder;
use dcmnet_encoding::decode::{self, Decode};
use dcmnet_encoding::transfer_syntax::{self, EXPLICIT_VR_LITTLE_ENDIAN};
use dcmnet_encoding::TransferSyntax;
use dcmnet_parser::dataset::{DataSetWriter, DataToken};
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{Read, Write};

const DICM_MAGIC_CODE: [u8; 4] = [b'D', b'I', b'C', b'M'];

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The file meta group parser could not read
    /// the magic code `DICM` from its source.
    #[snafu(display("Could not start reading DICOM data"))]
    ReadMagicCode {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// The file meta group parser could not fetch
    /// the value of a data element from its source.
    #[snafu(display("Could not read data value"))]
    ReadValueData {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// Invalid DICOM data, detected from checking the `DICM` code.
    #[snafu(display("Invalid DICOM data: not a DICOM file"))]
    NotDicom { backtrace: Backtrace },

    /// An issue occurred while decoding the next data element
    /// in the file meta data set.
    #[snafu(display("Could not decode data element"))]
    DecodeElement {
        #[snafu(backtrace)]
        source: decode::Error,
    },

    /// A data element with an unexpected tag was retrieved:
    /// the parser was expecting another tag first,
    /// or at least one that is part of the the file meta group.
    #[snafu(display("Unexpected data element tagged {}", tag))]
    UnexpectedTag { tag: Tag, backtrace: Backtrace },

    /// A required file meta data element is missing.
    #[snafu(display("Missing data element `{}`", alias))]
    MissingElement {
        alias: &'static str,
        backtrace: Backtrace,
    },

    /// The value length of a data elements in the file meta group
    /// was unexpected.
    #[snafu(display("Unexpected length {} for data element tagged {}", length, tag))]
    UnexpectedDataValueLength {
        tag: Tag,
        length: Length,
        backtrace: Backtrace,
    },

    /// The value length of a data element is undefined,
    /// but knowing the length is required in its context.
    #[snafu(display("Undefined value length for data element tagged {}", tag))]
    UndefinedValueLength { tag: Tag, backtrace: Backtrace },

    /// The file meta group data set could not be written.
    #[snafu(display("Could not write file meta group data set"))]
    WriteSet {
        #[snafu(backtrace)]
        source: dcmnet_parser::dataset::write::Error,
    },

    /// The magic code or group length could not be written.
    #[snafu(display("Could not write file meta group"))]
    WriteMeta {
        backtrace: Backtrace,
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// DICOM File Meta Information Table.
///
/// This data type contains the relevant parts of the file meta information table, as
/// specified in [1].
///
/// String fields are kept with the padding found in the source,
/// use the accessor methods for the trimmed values.
///
/// [1]: http://dicom.nema.org/medical/dicom/current/output/chtml/part06/chapter_7.html
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetaTable {
    /// File Meta Information Group Length
    pub information_group_length: u32,
    /// File Meta Information Version
    pub information_version: [u8; 2],
    /// Media Storage SOP Class UID
    pub media_storage_sop_class_uid: String,
    /// Media Storage SOP Instance UID
    pub media_storage_sop_instance_uid: String,
    /// Transfer Syntax UID
    pub transfer_syntax: String,
    /// Implementation Class UID
    pub implementation_class_uid: String,

    /// Implementation Version Name
    pub implementation_version_name: Option<String>,
    /// Source Application Entity Title
    pub source_application_entity_title: Option<String>,
}

/// Utility function for reading the body of the DICOM element as a string.
fn read_str_body<S>(source: &mut S, len: u32) -> Result<String>
where
    S: Read,
{
    let mut v = vec![0; len as usize];
    source.read_exact(&mut v).context(ReadValueDataSnafu)?;
    Ok(String::from_utf8_lossy(&v).into_owned())
}

impl FileMetaTable {
    /// Read the magic code `DICM` and the file meta group from the given source.
    ///
    /// Exactly the number of bytes announced by the group length element
    /// are consumed after it,
    /// leaving the source at the start of the main data set.
    pub fn from_reader<R: Read>(file: R) -> Result<Self> {
        FileMetaTable::read_from(file)
    }

    fn read_from<S: Read>(mut file: S) -> Result<Self> {
        let mut buff: [u8; 4] = [0; 4];
        {
            // check magic code
            file.read_exact(&mut buff).context(ReadMagicCodeSnafu)?;

            ensure!(buff == DICM_MAGIC_CODE, NotDicomSnafu);
        }

        let decoder = ExplicitVRLittleEndianDecoder::default();

        let builder = FileMetaTableBuilder::new();

        let group_length: u32 = {
            let (elem, _bytes_read) = decoder
                .decode_header(&mut file)
                .context(DecodeElementSnafu)?;
            ensure!(
                elem.tag() == (0x0002, 0x0000),
                UnexpectedTagSnafu { tag: elem.tag() }
            );
            ensure!(
                elem.length() == Length(4),
                UnexpectedDataValueLengthSnafu {
                    tag: elem.tag(),
                    length: elem.length(),
                }
            );
            ByteOrdered::le(&mut file)
                .read_u32()
                .context(ReadValueDataSnafu)?
        };

        let mut group_length_remaining = group_length;

        let mut builder = builder.group_length(group_length);

        // Fetch the remaining data elements of the group
        while group_length_remaining > 0 {
            let (elem, bytes_read) = decoder
                .decode_header(&mut file)
                .context(DecodeElementSnafu)?;
            let elem_len = elem
                .length()
                .get()
                .context(UndefinedValueLengthSnafu { tag: elem.tag() })?;
            group_length_remaining = group_length_remaining
                .checked_sub(bytes_read as u32 + elem_len)
                .context(UnexpectedDataValueLengthSnafu {
                    tag: elem.tag(),
                    length: elem.length(),
                })?;

            builder = match elem.tag() {
                Tag(0x0002, 0x0001) => {
                    // Implementation Version
                    ensure!(
                        elem.length() == Length(2),
                        UnexpectedDataValueLengthSnafu {
                            tag: elem.tag(),
                            length: elem.length(),
                        }
                    );
                    let mut hbuf = [0u8; 2];
                    file.read_exact(&mut hbuf[..]).context(ReadValueDataSnafu)?;
                    builder.information_version(hbuf)
                }
                // Media Storage SOP Class UID
                Tag(0x0002, 0x0002) => {
                    builder.media_storage_sop_class_uid(read_str_body(&mut file, elem_len)?)
                }
                // Media Storage SOP Instance UID
                Tag(0x0002, 0x0003) => {
                    builder.media_storage_sop_instance_uid(read_str_body(&mut file, elem_len)?)
                }
                // Transfer Syntax
                Tag(0x0002, 0x0010) => {
                    builder.transfer_syntax(read_str_body(&mut file, elem_len)?)
                }
                // Implementation Class UID
                Tag(0x0002, 0x0012) => {
                    builder.implementation_class_uid(read_str_body(&mut file, elem_len)?)
                }
                // Implementation Version Name
                Tag(0x0002, 0x0013) => {
                    builder.implementation_version_name(read_str_body(&mut file, elem_len)?)
                }
                // Source Application Entity Title
                Tag(0x0002, 0x0016) => {
                    builder.source_application_entity_title(read_str_body(&mut file, elem_len)?)
                }
                tag => {
                    // not kept, but the value must still be consumed
                    tracing::debug!("Skipping file meta element {} ({} bytes)", tag, elem_len);
                    std::io::copy(
                        &mut (&mut file).take(u64::from(elem_len)),
                        &mut std::io::sink(),
                    )
                    .context(ReadValueDataSnafu)?;
                    builder
                }
            }
        }

        builder.build()
    }

    /// The transfer syntax UID, without trailing padding.
    pub fn transfer_syntax(&self) -> &str {
        transfer_syntax::trim_uid(&self.transfer_syntax)
    }

    /// The transfer syntax descriptor,
    /// if it is one of the transfer syntaxes natively supported.
    pub fn transfer_syntax_descriptor(&self) -> Option<&'static TransferSyntax> {
        transfer_syntax::get(&self.transfer_syntax)
    }

    /// The media storage SOP class UID, without trailing padding.
    pub fn media_storage_sop_class_uid(&self) -> &str {
        transfer_syntax::trim_uid(&self.media_storage_sop_class_uid)
    }

    /// The media storage SOP instance UID, without trailing padding.
    pub fn media_storage_sop_instance_uid(&self) -> &str {
        transfer_syntax::trim_uid(&self.media_storage_sop_instance_uid)
    }

    /// Create an iterator over the defined data elements
    /// of the file meta group, group length included.
    pub fn to_element_iter(&self) -> impl Iterator<Item = DataElement> + '_ {
        let mut elems = vec![
            // file information group length
            DataElement::new(
                Tag(0x0002, 0x0000),
                VR::UL,
                PrimitiveValue::from(self.information_group_length),
            ),
            DataElement::new(
                Tag(0x0002, 0x0001),
                VR::OB,
                dicom_value!(
                    U8,
                    [self.information_version[0], self.information_version[1]]
                ),
            ),
            DataElement::new(
                Tag(0x0002, 0x0002),
                VR::UI,
                PrimitiveValue::from(self.media_storage_sop_class_uid.as_str()),
            ),
            DataElement::new(
                Tag(0x0002, 0x0003),
                VR::UI,
                PrimitiveValue::from(self.media_storage_sop_instance_uid.as_str()),
            ),
            DataElement::new(
                Tag(0x0002, 0x0010),
                VR::UI,
                PrimitiveValue::from(self.transfer_syntax.as_str()),
            ),
            DataElement::new(
                Tag(0x0002, 0x0012),
                VR::UI,
                PrimitiveValue::from(self.implementation_class_uid.as_str()),
            ),
        ];
        if let Some(v) = &self.implementation_version_name {
            elems.push(DataElement::new(
                Tag(0x0002, 0x0013),
                VR::SH,
                PrimitiveValue::from(v.as_str()),
            ));
        }
        if let Some(v) = &self.source_application_entity_title {
            elems.push(DataElement::new(
                Tag(0x0002, 0x0016),
                VR::AE,
                PrimitiveValue::from(v.as_str()),
            ));
        }

        elems.into_iter()
    }

    /// Write the magic code and the file meta group to the given writer.
    ///
    /// The group length is recalculated from the elements being written,
    /// regardless of the value recorded in the table.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let mut body = Vec::with_capacity(self.information_group_length as usize);
        {
            let mut dset = DataSetWriter::with_ts(&mut body, &EXPLICIT_VR_LITTLE_ENDIAN);
            dset.write_sequence(
                self.to_element_iter()
                    .skip(1)
                    .flat_map(|elem| {
                        let (header, value) = elem.into_parts();
                        let value = value.primitive().cloned().unwrap_or(PrimitiveValue::Empty);
                        [DataToken::ElementHeader(header), DataToken::PrimitiveValue(value)]
                    }),
            )
            .context(WriteSetSnafu)?;
        }

        writer.write_all(&DICM_MAGIC_CODE).context(WriteMetaSnafu)?;
        // (0002,0000) UL 4
        #[rustfmt::skip]
        let group_length_header: [u8; 8] = [
            0x02, 0x00, 0x00, 0x00,
            b'U', b'L', 0x04, 0x00,
        ];
        writer
            .write_all(&group_length_header)
            .context(WriteMetaSnafu)?;
        ByteOrdered::le(&mut writer)
            .write_u32(body.len() as u32)
            .context(WriteMetaSnafu)?;
        writer.write_all(&body).context(WriteMetaSnafu)
    }
}

/// A builder for DICOM meta information tables.
#[derive(Debug, Default, Clone)]
pub struct FileMetaTableBuilder {
    /// File Meta Information Group Length (UL)
    information_group_length: Option<u32>,
    /// File Meta Information Version (OB)
    information_version: Option<[u8; 2]>,
    /// Media Storage SOP Class UID (UI)
    media_storage_sop_class_uid: Option<String>,
    /// Media Storage SOP Instance UID (UI)
    media_storage_sop_instance_uid: Option<String>,
    /// Transfer Syntax UID (UI)
    transfer_syntax: Option<String>,
    /// Implementation Class UID (UI)
    implementation_class_uid: Option<String>,

    /// Implementation Version Name (SH)
    implementation_version_name: Option<String>,
    /// Source Application Entity Title (AE)
    source_application_entity_title: Option<String>,
}

/// Ensure that the string is even lengthed, by adding a trailing character
/// if not.
#[inline]
fn padded<T>(s: T, pad: char) -> String
where
    T: Into<String>,
{
    let mut s = s.into();
    if s.len() % 2 == 1 {
        s.push(pad);
    }
    s
}

/// Ensure that the string is even lengthed with trailing '\0's.
fn ui_padded<T>(s: T) -> String
where
    T: Into<String>,
{
    padded(s, '\0')
}

/// Ensure that the string is even lengthed with trailing spaces.
fn txt_padded<T>(s: T) -> String
where
    T: Into<String>,
{
    padded(s, ' ')
}

impl FileMetaTableBuilder {
    /// Create a new, empty builder.
    pub fn new() -> FileMetaTableBuilder {
        FileMetaTableBuilder::default()
    }

    /// Define the meta information group length.
    pub fn group_length(mut self, value: u32) -> FileMetaTableBuilder {
        self.information_group_length = Some(value);
        self
    }

    /// Define the meta information version.
    pub fn information_version(mut self, value: [u8; 2]) -> FileMetaTableBuilder {
        self.information_version = Some(value);
        self
    }

    /// Define the media storage SOP class UID.
    pub fn media_storage_sop_class_uid<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.media_storage_sop_class_uid = Some(ui_padded(value));
        self
    }

    /// Define the media storage SOP instance UID.
    pub fn media_storage_sop_instance_uid<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.media_storage_sop_instance_uid = Some(ui_padded(value));
        self
    }

    /// Define the transfer syntax UID.
    pub fn transfer_syntax<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.transfer_syntax = Some(ui_padded(value));
        self
    }

    /// Define the implementation class UID.
    pub fn implementation_class_uid<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.implementation_class_uid = Some(ui_padded(value));
        self
    }

    /// Define the implementation version name.
    pub fn implementation_version_name<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.implementation_version_name = Some(txt_padded(value));
        self
    }

    /// Define the source application entity title.
    pub fn source_application_entity_title<T>(mut self, value: T) -> FileMetaTableBuilder
    where
        T: Into<String>,
    {
        self.source_application_entity_title = Some(txt_padded(value));
        self
    }

    /// Build the table.
    ///
    /// The implementation class UID and version name
    /// default to the ones of this crate when not defined,
    /// and the information version defaults to `[0, 1]`.
    pub fn build(self) -> Result<FileMetaTable> {
        let information_version = self.information_version.unwrap_or([0, 1]);
        let media_storage_sop_class_uid =
            self.media_storage_sop_class_uid
                .context(MissingElementSnafu {
                    alias: "MediaStorageSOPClassUID",
                })?;
        let media_storage_sop_instance_uid =
            self.media_storage_sop_instance_uid
                .context(MissingElementSnafu {
                    alias: "MediaStorageSOPInstanceUID",
                })?;
        let transfer_syntax = self.transfer_syntax.context(MissingElementSnafu {
            alias: "TransferSyntax",
        })?;
        let (implementation_class_uid, implementation_version_name) =
            match self.implementation_class_uid {
                Some(uid) => (uid, self.implementation_version_name),
                None => (
                    ui_padded(IMPLEMENTATION_CLASS_UID),
                    self.implementation_version_name
                        .or_else(|| Some(txt_padded(IMPLEMENTATION_VERSION_NAME))),
                ),
            };

        fn dicom_len<T: AsRef<str>>(x: T) -> u32 {
            let o = x.as_ref().len() as u32;
            if o % 2 == 1 {
                o + 1
            } else {
                o
            }
        }

        let information_group_length = match self.information_group_length {
            Some(e) => e,
            None => {
                // determine the expected meta group size based on the given fields.
                // FileMetaInformationGroupLength is not included here
                14 + 8
                    + dicom_len(&media_storage_sop_class_uid)
                    + 8
                    + dicom_len(&media_storage_sop_instance_uid)
                    + 8
                    + dicom_len(&transfer_syntax)
                    + 8
                    + dicom_len(&implementation_class_uid)
                    + implementation_version_name
                        .as_ref()
                        .map(|s| 8 + dicom_len(s))
                        .unwrap_or(0)
                    + self
                        .source_application_entity_title
                        .as_ref()
                        .map(|s| 8 + dicom_len(s))
                        .unwrap_or(0)
            }
        };

        Ok(FileMetaTable {
            information_group_length,
            information_version,
            media_storage_sop_class_uid,
            media_storage_sop_instance_uid,
            transfer_syntax,
            implementation_class_uid,
            implementation_version_name,
            source_application_entity_title: self.source_application_entity_title,
        })
    }
}
