//! This module contains the implementation for an in-memory DICOM object.

use smallvec::SmallVec;
use snafu::{OptionExt, ResultExt};
use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::meta::FileMetaTable;
use crate::tokens::InMemObjectTokens;
use crate::{
    AccessByNameError, AccessError, EncapsulatedPixelDataSnafu, FileDicomObject,
    MissingElementValueSnafu, NoSuchDataElementAliasSnafu, NoSuchDataElementTagSnafu,
    PrematureEndSnafu, PrintDataSetSnafu, ReadTokenSnafu, Result, UnexpectedTokenSnafu,
    UnknownAttributeSnafu, WriteError,
};
use dcmnet_core::dictionary::{DataDictionary, DictionaryEntry};
use dcmnet_core::header::{HasLength, Header};
use dcmnet_core::value::{PrimitiveValue, Value, C};
use dcmnet_core::{DataElement, Length, Tag, VR};
use dcmnet_dictionary_std::{tags, StandardDataDictionary};
use dcmnet_encoding::TransferSyntax;
use dcmnet_parser::dataset::{read::Error as ParserError, DataSetReader, DataSetWriter, DataToken};

/// A full in-memory DICOM data element.
pub type InMemElement<D = StandardDataDictionary> = DataElement<InMemDicomObject<D>>;

type ParserResult<T> = std::result::Result<T, ParserError>;

/// Unwrap a parsed token,
/// telling apart a data set which ended too soon.
fn read_token(token: ParserResult<DataToken>) -> Result<DataToken> {
    match token {
        Ok(token) => Ok(token),
        Err(ParserError::PrematureEnd { .. }) => PrematureEndSnafu.fail(),
        Err(e) => Err(e).context(ReadTokenSnafu),
    }
}

/** A DICOM object that is fully contained in memory.
 *
 * Elements are kept in ascending tag order,
 * which is also the order in which they are encoded.
 */
#[derive(Debug, Clone)]
pub struct InMemDicomObject<D = StandardDataDictionary> {
    /// the element map
    entries: BTreeMap<Tag, InMemElement<D>>,
    /// the data dictionary
    dict: D,
    /// The length of the DICOM object in bytes.
    /// It is usually undefined, unless it is part of an item
    /// in a sequence with a specified length in its item header.
    len: Length,
}

impl<D> PartialEq for InMemDicomObject<D> {
    // This implementation ignores the data dictionary.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<D> HasLength for InMemDicomObject<D> {
    fn length(&self) -> Length {
        self.len
    }
}

impl InMemDicomObject<StandardDataDictionary> {
    /// Create a new empty DICOM object.
    pub fn new_empty() -> Self {
        InMemDicomObject {
            entries: BTreeMap::new(),
            dict: StandardDataDictionary,
            len: Length::UNDEFINED,
        }
    }

    /// Construct a DICOM object from a non-fallible source of structured elements.
    pub fn from_element_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = InMemElement<StandardDataDictionary>>,
    {
        Self::from_iter_with_dict(iter, StandardDataDictionary)
    }

    /// Read an object from a source,
    /// using the given transfer syntax
    /// and the standard data dictionary.
    ///
    /// The source is read to the end,
    /// as no file meta group or preamble is expected.
    pub fn read_dataset_with_ts<S>(from: S, ts: &TransferSyntax) -> Result<Self>
    where
        S: Read,
    {
        Self::read_dataset_with_dict_ts(from, StandardDataDictionary, ts)
    }
}

impl<D> InMemDicomObject<D>
where
    D: DataDictionary,
    D: Clone,
{
    /// Create a new empty object, using the given dictionary for name lookup.
    pub fn new_empty_with_dict(dict: D) -> Self {
        InMemDicomObject {
            entries: BTreeMap::new(),
            dict,
            len: Length::UNDEFINED,
        }
    }

    /// Construct a DICOM object from a non-fallible source of structured elements.
    pub fn from_iter_with_dict<I>(iter: I, dict: D) -> Self
    where
        I: IntoIterator<Item = InMemElement<D>>,
    {
        let entries = iter.into_iter().map(|e| (e.tag(), e)).collect();
        InMemDicomObject {
            entries,
            dict,
            len: Length::UNDEFINED,
        }
    }

    /// Read an object from a source,
    /// using the given data dictionary and transfer syntax.
    ///
    /// The dictionary is also used to resolve the value representation
    /// of elements in implicit VR transfer syntaxes.
    pub fn read_dataset_with_dict_ts<S>(from: S, dict: D, ts: &TransferSyntax) -> Result<Self>
    where
        S: Read,
    {
        let mut dataset = DataSetReader::new_with_ts_dict(from, ts, dict.clone());
        InMemDicomObject::build_object(&mut dataset, dict, false, Length::UNDEFINED)
    }

    /// Retrieve a particular DICOM element by its tag.
    pub fn element(&self, tag: Tag) -> Result<&InMemElement<D>, AccessError> {
        self.entries
            .get(&tag)
            .context(NoSuchDataElementTagSnafu { tag })
    }

    /// Retrieve a particular DICOM element by its tag,
    /// or `None` if it is not present.
    pub fn element_opt(&self, tag: Tag) -> Option<&InMemElement<D>> {
        self.entries.get(&tag)
    }

    /// Retrieve a particular DICOM element by its keyword.
    pub fn element_by_name(&self, name: &str) -> Result<&InMemElement<D>, AccessByNameError> {
        let tag = self.lookup_name(name)?;
        self.entries
            .get(&tag)
            .with_context(|| NoSuchDataElementAliasSnafu {
                tag,
                alias: name.to_string(),
            })
    }

    /// Create a new element for the attribute with the given keyword,
    /// taking the value representation from the data dictionary.
    ///
    /// The element is not inserted into the object.
    pub fn new_element<T>(&self, name: &str, value: T) -> Result<InMemElement<D>, AccessByNameError>
    where
        T: Into<PrimitiveValue>,
    {
        let entry = self
            .dict
            .get_by_name(name)
            .context(UnknownAttributeSnafu { name })?;
        Ok(DataElement::new(entry.tag(), entry.vr(), value.into()))
    }

    /// Insert a data element to the object, replacing (and returning) any
    /// previous element of the same attribute.
    pub fn put(&mut self, elt: InMemElement<D>) -> Option<InMemElement<D>> {
        self.entries.insert(elt.tag(), elt)
    }

    /// Insert a textual element.
    ///
    /// Multi-valued text representations are split on `\`
    /// into their individual values.
    pub fn put_str(&mut self, tag: Tag, vr: VR, value: &str) -> Option<InMemElement<D>> {
        let value = if vr.is_multi_valued_text() {
            PrimitiveValue::Strs(value.split('\\').map(str::to_owned).collect())
        } else {
            PrimitiveValue::Str(value.to_owned())
        };
        self.put(DataElement::new(tag, vr, value))
    }

    /// Insert a single unsigned 16-bit value of the given representation.
    pub fn put_u16(&mut self, tag: Tag, vr: VR, value: u16) -> Option<InMemElement<D>> {
        self.put(DataElement::new(tag, vr, PrimitiveValue::from(value)))
    }

    /// Insert a single unsigned 32-bit value of the given representation.
    pub fn put_u32(&mut self, tag: Tag, vr: VR, value: u32) -> Option<InMemElement<D>> {
        self.put(DataElement::new(tag, vr, PrimitiveValue::from(value)))
    }

    /// Removes a DICOM element by its tag,
    /// reporting whether it was present.
    pub fn remove_element(&mut self, tag: Tag) -> bool {
        self.entries.remove(&tag).is_some()
    }

    /// Removes and returns a particular DICOM element by its tag.
    pub fn take_element(&mut self, tag: Tag) -> Result<InMemElement<D>, AccessError> {
        self.entries
            .remove(&tag)
            .context(NoSuchDataElementTagSnafu { tag })
    }

    /// Obtain an iterator over the elements of this object,
    /// in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = &InMemElement<D>> + '_ {
        self.entries.values()
    }

    /// The number of elements at the root of this object.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this object has no elements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write this object's data set into the given writer,
    /// with the given transfer syntax,
    /// without preamble, magic code, nor file meta group.
    pub fn write_dataset_with_ts<W>(&self, to: W, ts: &TransferSyntax) -> Result<(), WriteError>
    where
        W: Write,
    {
        let mut dset_writer = DataSetWriter::with_ts(to, ts);
        dset_writer
            .write_sequence(InMemObjectTokens::new(self))
            .context(PrintDataSetSnafu)
    }

    /// Calculate the number of bytes this object's data set
    /// occupies when encoded in the given transfer syntax.
    pub fn encoded_len_with_ts(&self, ts: &TransferSyntax) -> Result<u64, WriteError> {
        let mut counter = ByteCounter::default();
        self.write_dataset_with_ts(&mut counter, ts)?;
        Ok(counter.0)
    }

    /// Pair this object with a file meta group,
    /// making it a file object.
    pub fn with_meta(self, meta: FileMetaTable) -> FileDicomObject<Self> {
        FileDicomObject::new(meta, self)
    }

    // private methods

    /// Build an object by consuming a data set parser.
    fn build_object<I: ?Sized>(
        dataset: &mut I,
        dict: D,
        in_item: bool,
        len: Length,
    ) -> Result<Self>
    where
        I: Iterator<Item = ParserResult<DataToken>>,
    {
        let mut entries: BTreeMap<Tag, InMemElement<D>> = BTreeMap::new();
        // perform a structured parsing of incoming tokens
        while let Some(token) = dataset.next() {
            let elem = match read_token(token)? {
                DataToken::ElementHeader(header) => {
                    // fetch respective value, place it in the entries
                    let next_token = dataset.next().context(MissingElementValueSnafu)?;
                    match read_token(next_token)? {
                        DataToken::PrimitiveValue(v) => InMemElement::new_with_len(
                            header.tag,
                            header.vr,
                            header.len,
                            Value::Primitive(v),
                        ),
                        token => {
                            return UnexpectedTokenSnafu {
                                token: Box::new(token),
                            }
                            .fail();
                        }
                    }
                }
                DataToken::SequenceStart { tag, .. } if tag == tags::PIXEL_DATA => {
                    return EncapsulatedPixelDataSnafu.fail();
                }
                DataToken::SequenceStart { tag, len } => {
                    // delegate sequence building to another function
                    let items = Self::build_sequence(&mut *dataset, &dict)?;
                    DataElement::new_with_len(tag, VR::SQ, len, Value::new_sequence(items))
                }
                DataToken::ItemEnd if in_item => {
                    // end of item, leave now
                    return Ok(InMemDicomObject { entries, dict, len });
                }
                // a bare value within an item is an encapsulated fragment
                DataToken::PrimitiveValue(_) if in_item => {
                    return EncapsulatedPixelDataSnafu.fail();
                }
                token => {
                    return UnexpectedTokenSnafu {
                        token: Box::new(token),
                    }
                    .fail()
                }
            };
            entries.insert(elem.tag(), elem);
        }

        if in_item {
            // iterator fully consumed without an item end
            return PrematureEndSnafu.fail();
        }

        Ok(InMemDicomObject { entries, dict, len })
    }

    /// Build a DICOM sequence by consuming a data set parser.
    fn build_sequence<I: ?Sized>(dataset: &mut I, dict: &D) -> Result<C<InMemDicomObject<D>>>
    where
        I: Iterator<Item = ParserResult<DataToken>>,
    {
        let mut items: C<_> = SmallVec::new();
        while let Some(token) = dataset.next() {
            match read_token(token)? {
                DataToken::ItemStart { len } => {
                    items.push(Self::build_object(&mut *dataset, dict.clone(), true, len)?);
                }
                DataToken::SequenceEnd => {
                    return Ok(items);
                }
                token => {
                    return UnexpectedTokenSnafu {
                        token: Box::new(token),
                    }
                    .fail()
                }
            };
        }

        // iterator fully consumed without a sequence delimiter
        PrematureEndSnafu.fail()
    }

    fn lookup_name(&self, name: &str) -> Result<Tag, AccessByNameError> {
        self.dict
            .get_by_name(name)
            .context(UnknownAttributeSnafu { name })
            .map(|e| e.tag())
    }
}

/// A writer which discards the data while counting the bytes written.
#[derive(Debug, Default)]
struct ByteCounter(u64);

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0 += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a, D> IntoIterator for &'a InMemDicomObject<D> {
    type Item = &'a InMemElement<D>;
    type IntoIter = ::std::collections::btree_map::Values<'a, Tag, InMemElement<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl<D> IntoIterator for InMemDicomObject<D> {
    type Item = InMemElement<D>;
    type IntoIter = Iter<D>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.entries.into_iter(),
        }
    }
}

/// Base iterator type for an in-memory DICOM object.
#[derive(Debug)]
pub struct Iter<D> {
    inner: ::std::collections::btree_map::IntoIter<Tag, InMemElement<D>>,
}

impl<D> Iterator for Iter<D> {
    type Item = InMemElement<D>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|x| x.1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn count(self) -> usize {
        self.inner.count()
    }
}

impl<D> Extend<InMemElement<D>> for InMemDicomObject<D> {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = InMemElement<D>>,
    {
        self.entries.extend(iter.into_iter().map(|e| (e.tag(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccessByNameError, ReadError};
    use dcmnet_core::dicom_value;
    use dcmnet_core::dictionary::StubDataDictionary;
    use dcmnet_encoding::transfer_syntax::{
        EXPLICIT_VR_BIG_ENDIAN, EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN,
    };

    fn sample_object() -> InMemDicomObject {
        let mut obj = InMemDicomObject::new_empty();
        obj.put_str(tags::PATIENT_NAME, VR::PN, "Doe^John");
        obj.put_str(tags::SOP_CLASS_UID, VR::UI, "1.2.840.10008.5.1.4.1.1.7");
        obj.put_str(tags::MODALITY, VR::CS, "OT");
        obj.put_u16(Tag(0x0028, 0x0010), VR::US, 512);
        obj.put(DataElement::new(
            tags::REFERENCED_IMAGE_SEQUENCE,
            VR::SQ,
            Value::new_sequence(vec![InMemDicomObject::from_element_iter(
                [
                    DataElement::new(
                        tags::REFERENCED_SOP_CLASS_UID,
                        VR::UI,
                        dicom_value!(Strs, ["1.2.840.10008.5.1.4.1.1.2"]),
                    ),
                    DataElement::new(
                        tags::REFERENCED_SOP_INSTANCE_UID,
                        VR::UI,
                        dicom_value!(Strs, ["2.25.12345"]),
                    ),
                ]
            )]),
        ));
        obj
    }

    #[test]
    fn inmem_object_elements_in_tag_order() {
        let obj = sample_object();
        let order: Vec<Tag> = obj.iter().map(|e| e.tag()).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert_eq!(obj.len(), 5);
        assert!(!obj.is_empty());
    }

    #[test]
    fn inmem_object_put_replaces() {
        let mut obj = InMemDicomObject::new_empty();
        assert!(obj.put_str(tags::MODALITY, VR::CS, "CT").is_none());
        let old = obj.put_str(tags::MODALITY, VR::CS, "MR").unwrap();
        assert_eq!(old.to_str().unwrap(), "CT");
        assert_eq!(obj.element(tags::MODALITY).unwrap().to_str().unwrap(), "MR");
        assert_eq!(obj.len(), 1);
    }

    #[test]
    fn inmem_object_multi_valued_put_str() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put_str(tags::IMAGE_TYPE, VR::CS, "ORIGINAL\\PRIMARY");
        let elem = obj.element(tags::IMAGE_TYPE).unwrap();
        assert_eq!(elem.value().multiplicity(), 2);
        assert_eq!(elem.to_str().unwrap(), "ORIGINAL\\PRIMARY");
    }

    #[test]
    fn inmem_object_access_by_name() {
        let obj = sample_object();
        assert_eq!(
            obj.element_by_name("PatientName").unwrap().to_str().unwrap(),
            "Doe^John"
        );
        assert!(matches!(
            obj.element_by_name("StudyDescription"),
            Err(AccessByNameError::NoSuchDataElementAlias { .. })
        ));
        assert!(matches!(
            obj.element_by_name("NotAnAttribute"),
            Err(AccessByNameError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn inmem_object_new_element_uses_dictionary_vr() {
        let obj = InMemDicomObject::new_empty();
        let elem = obj.new_element("Modality", "CT").unwrap();
        assert_eq!(elem.tag(), tags::MODALITY);
        assert_eq!(elem.vr(), VR::CS);

        assert!(matches!(
            obj.new_element("NoSuchKeyword", "x"),
            Err(AccessByNameError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn inmem_object_remove_and_take() {
        let mut obj = sample_object();
        assert!(obj.remove_element(tags::MODALITY));
        assert!(!obj.remove_element(tags::MODALITY));
        let elem = obj.take_element(tags::PATIENT_NAME).unwrap();
        assert_eq!(elem.to_str().unwrap(), "Doe^John");
        assert!(obj.take_element(tags::PATIENT_NAME).is_err());
        assert!(obj.element_opt(tags::PATIENT_NAME).is_none());
    }

    #[test]
    fn inmem_object_write_explicit_le() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put_str(tags::PATIENT_NAME, VR::PN, "Doe^John");
        obj.put_u16(Tag(0x0028, 0x0010), VR::US, 512);

        let mut out = Vec::new();
        obj.write_dataset_with_ts(&mut out, &EXPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();

        #[rustfmt::skip]
        let gt: &[u8] = &[
            // (0010,0010) PN 8 "Doe^John"
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00,
            b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n',
            // (0028,0010) US 2 512
            0x28, 0x00, 0x10, 0x00, b'U', b'S', 0x02, 0x00, 0x00, 0x02,
        ];
        assert_eq!(out, gt);
        assert_eq!(
            obj.encoded_len_with_ts(&EXPLICIT_VR_LITTLE_ENDIAN).unwrap(),
            gt.len() as u64
        );
    }

    #[test]
    fn inmem_object_odd_value_is_padded() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put_str(tags::SOP_CLASS_UID, VR::UI, "1.2.3");
        let mut out = Vec::new();
        obj.write_dataset_with_ts(&mut out, &IMPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();

        #[rustfmt::skip]
        let gt: &[u8] = &[
            // (0008,0016) len 6 "1.2.3\0"
            0x08, 0x00, 0x16, 0x00, 0x06, 0x00, 0x00, 0x00,
            b'1', b'.', b'2', b'.', b'3', 0x00,
        ];
        assert_eq!(out, gt);
    }

    #[test]
    fn inmem_object_survives_every_transfer_syntax() {
        let obj = sample_object();
        for ts in [
            &IMPLICIT_VR_LITTLE_ENDIAN,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            &EXPLICIT_VR_BIG_ENDIAN,
        ] {
            let mut out = Vec::new();
            obj.write_dataset_with_ts(&mut out, ts).unwrap();
            let back = InMemDicomObject::read_dataset_with_ts(&out[..], ts).unwrap();
            assert_eq!(back, obj, "in {}", ts);

            let items = back
                .element(tags::REFERENCED_IMAGE_SEQUENCE)
                .unwrap()
                .items()
                .unwrap();
            assert_eq!(items.len(), 1);
            assert_eq!(
                items[0]
                    .element(tags::REFERENCED_SOP_INSTANCE_UID)
                    .unwrap()
                    .to_str()
                    .unwrap(),
                "2.25.12345"
            );
        }
    }

    #[test]
    fn implicit_unknown_tags_read_as_un_with_stub_dict() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put_str(tags::MODALITY, VR::CS, "OT");
        let mut out = Vec::new();
        obj.write_dataset_with_ts(&mut out, &IMPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();

        let back = InMemDicomObject::read_dataset_with_dict_ts(
            &out[..],
            StubDataDictionary,
            &IMPLICIT_VR_LITTLE_ENDIAN,
        )
        .unwrap();
        let elem = back.element(tags::MODALITY).unwrap();
        assert_eq!(elem.vr(), VR::UN);
        assert_eq!(elem.value().primitive(), Some(&dicom_value!(U8, [b'O', b'T'])));
    }

    #[test]
    fn encapsulated_pixel_data_is_rejected() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // (7FE0,0010) OB undefined length
            0xe0, 0x7f, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xff, 0xff, 0xff, 0xff,
            // empty offset table
            0xfe, 0xff, 0x00, 0xe0, 0x00, 0x00, 0x00, 0x00,
            // sequence delimiter
            0xfe, 0xff, 0xdd, 0xe0, 0x00, 0x00, 0x00, 0x00,
        ];
        let err = InMemDicomObject::read_dataset_with_ts(data, &EXPLICIT_VR_LITTLE_ENDIAN)
            .unwrap_err();
        assert!(matches!(err, ReadError::EncapsulatedPixelData { .. }));
    }

    #[test]
    fn undefined_length_un_reads_as_sequence() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // (0009,1010) UN undefined length
            0x09, 0x00, 0x10, 0x10, b'U', b'N', 0x00, 0x00, 0xff, 0xff, 0xff, 0xff,
            // item, undefined length
            0xfe, 0xff, 0x00, 0xe0, 0xff, 0xff, 0xff, 0xff,
            // item delimiter
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00,
            // sequence delimiter
            0xfe, 0xff, 0xdd, 0xe0, 0x00, 0x00, 0x00, 0x00,
            // (0010,0010) PN "Doe^"
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'o', b'e', b'^',
        ];
        let obj = InMemDicomObject::read_dataset_with_ts(data, &EXPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();
        let elem = obj.element(Tag(0x0009, 0x1010)).unwrap();
        assert_eq!(elem.vr(), VR::SQ);
        assert_eq!(elem.items().unwrap().len(), 1);
        assert_eq!(
            obj.element(tags::PATIENT_NAME).unwrap().to_str().unwrap(),
            "Doe^"
        );
    }

    #[test]
    fn unterminated_sequence_is_premature_end() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // (0008,1140) SQ undefined length
            0x08, 0x00, 0x40, 0x11, b'S', b'Q', 0x00, 0x00, 0xff, 0xff, 0xff, 0xff,
            // item, undefined length
            0xfe, 0xff, 0x00, 0xe0, 0xff, 0xff, 0xff, 0xff,
        ];
        let err = InMemDicomObject::read_dataset_with_ts(data, &EXPLICIT_VR_LITTLE_ENDIAN)
            .unwrap_err();
        assert!(matches!(err, ReadError::PrematureEnd { .. }));
    }
}
