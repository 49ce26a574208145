//! Implicit VR Little Endian syntax transfer implementation

use crate::decode::basic::LittleEndianBasicDecoder;
use crate::decode::{
    item_header_from, BasicDecode, Decode, ReadHeaderTagSnafu, ReadItemHeaderSnafu,
    ReadLengthSnafu, ReadTagSnafu, Result,
};
use dcmnet_core::dictionary::{DataDictionary, DictionaryEntry};
use dcmnet_core::header::{DataElementHeader, Length, SequenceItemHeader};
use dcmnet_core::{Tag, VR};
use dcmnet_dictionary_std::StandardDataDictionary;
use snafu::ResultExt;
use std::fmt;
use std::io::Read;

/// An ImplicitVRLittleEndianDecoder which uses the standard data dictionary.
pub type StandardImplicitVRLittleEndianDecoder =
    ImplicitVRLittleEndianDecoder<StandardDataDictionary>;

/// A data element decoder for the Implicit VR Little Endian transfer syntax.
/// This type contains a reference to an attribute dictionary for resolving
/// value representations.
#[derive(Clone)]
pub struct ImplicitVRLittleEndianDecoder<D> {
    dict: D,
    basic: LittleEndianBasicDecoder,
}

impl<D> fmt::Debug for ImplicitVRLittleEndianDecoder<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ImplicitVRLittleEndianDecoder")
            .field("dict", &"«omitted»")
            .field("basic", &self.basic)
            .finish()
    }
}

impl ImplicitVRLittleEndianDecoder<StandardDataDictionary> {
    /// Retrieve this decoder using the standard data dictionary.
    pub fn with_std_dict() -> Self {
        ImplicitVRLittleEndianDecoder {
            dict: StandardDataDictionary,
            basic: LittleEndianBasicDecoder,
        }
    }
}

impl Default for ImplicitVRLittleEndianDecoder<StandardDataDictionary> {
    fn default() -> Self {
        ImplicitVRLittleEndianDecoder::with_std_dict()
    }
}

impl<D> ImplicitVRLittleEndianDecoder<D>
where
    D: DataDictionary,
{
    /// Retrieve this decoder using a custom data dictionary.
    pub fn with_dict(dictionary: D) -> Self {
        ImplicitVRLittleEndianDecoder {
            dict: dictionary,
            basic: LittleEndianBasicDecoder,
        }
    }

    /// Resolve the value representation of an element
    /// from its tag and declared length.
    ///
    /// Tags missing from the dictionary degrade gracefully:
    /// an undefined length implies a sequence,
    /// pixel data is read as OW,
    /// and anything else becomes UN.
    pub fn resolve_vr(&self, tag: Tag, len: Length) -> VR {
        if tag == Tag(0x7FE0, 0x0010) {
            return VR::OW;
        }
        match self.dict.get_by_tag(tag).map(|entry| entry.vr()) {
            Some(VR::UN) | None if len.is_undefined() => VR::SQ,
            Some(vr) => vr,
            None => VR::UN,
        }
    }
}

impl<D> Decode for ImplicitVRLittleEndianDecoder<D>
where
    D: DataDictionary,
{
    type Basic = LittleEndianBasicDecoder;

    fn basic(&self) -> &Self::Basic {
        &self.basic
    }

    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        // retrieve tag
        let tag = self
            .basic
            .decode_tag(&mut *source)
            .context(ReadHeaderTagSnafu)?;

        let len = Length(self.basic.decode_ul(&mut *source).context(ReadLengthSnafu)?);

        if tag.group() == 0xFFFE {
            return Ok((DataElementHeader::new(tag, VR::UN, len), 8));
        }

        let vr = self.resolve_vr(tag, len);
        Ok((DataElementHeader::new(tag, vr, len), 8))
    }

    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read,
    {
        let tag = self
            .basic
            .decode_tag(&mut *source)
            .context(ReadItemHeaderSnafu)?;
        item_header_from(&self.basic, tag, source)
    }

    #[inline]
    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        self.basic.decode_tag(source).context(ReadTagSnafu)
    }
}
