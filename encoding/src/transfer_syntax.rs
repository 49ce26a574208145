//! Module containing the transfer syntax descriptors
//! which this crate can encode and decode natively.
//!
//! A [`TransferSyntax`] binds a UID to its byte order
//! and to whether the value representation is explicit,
//! and yields the matching element codecs.

use crate::decode::basic::BasicDecoder;
use crate::decode::explicit_be::ExplicitVRBigEndianDecoder;
use crate::decode::explicit_le::ExplicitVRLittleEndianDecoder;
use crate::decode::implicit_le::ImplicitVRLittleEndianDecoder;
use crate::decode::{self, Decode};
use crate::encode::basic::BasicEncoder;
use crate::encode::explicit_be::ExplicitVRBigEndianEncoder;
use crate::encode::explicit_le::ExplicitVRLittleEndianEncoder;
use crate::encode::implicit_le::ImplicitVRLittleEndianEncoder;
use crate::encode::{self, Encode};
use byteordered::Endianness;
use dcmnet_core::dictionary::DataDictionary;
use dcmnet_core::header::{DataElementHeader, SequenceItemHeader};
use dcmnet_core::Tag;
use dcmnet_dictionary_std::StandardDataDictionary;
use std::fmt;
use std::io::{Read, Write};

/// A DICOM transfer syntax specifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TransferSyntax {
    /// The unique identifier of the transfer syntax.
    uid: &'static str,
    /// The name of the transfer syntax.
    name: &'static str,
    /// The byte order of data.
    byte_order: Endianness,
    /// Whether the transfer syntax mandates an explicit value representation,
    /// or the VR is implicit.
    explicit_vr: bool,
}

/// Implicit VR Little Endian: Default Transfer Syntax for DICOM
pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2",
    "Implicit VR Little Endian",
    Endianness::Little,
    false,
);

/// Explicit VR Little Endian
pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1",
    "Explicit VR Little Endian",
    Endianness::Little,
    true,
);

/// Explicit VR Big Endian
pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.2",
    "Explicit VR Big Endian",
    Endianness::Big,
    true,
);

static ENTRIES: [TransferSyntax; 3] = [
    IMPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_BIG_ENDIAN,
];

/// Retrieve the transfer syntax identified by the given UID.
///
/// Trailing null characters and spaces in the UID are ignored.
pub fn get(uid: &str) -> Option<&'static TransferSyntax> {
    let uid = trim_uid(uid);
    ENTRIES.iter().find(|ts| ts.uid == uid)
}

/// Retrieve all transfer syntaxes known to this crate.
pub fn entries() -> &'static [TransferSyntax] {
    &ENTRIES
}

/// Remove trailing padding from a UID.
pub fn trim_uid(uid: &str) -> &str {
    uid.trim_end_matches(['\0', ' '])
}

impl TransferSyntax {
    /// Create a new transfer syntax descriptor.
    pub const fn new(
        uid: &'static str,
        name: &'static str,
        byte_order: Endianness,
        explicit_vr: bool,
    ) -> Self {
        TransferSyntax {
            uid,
            name,
            byte_order,
            explicit_vr,
        }
    }

    /// Obtain this transfer syntax' unique identifier.
    pub const fn uid(&self) -> &'static str {
        self.uid
    }

    /// Obtain the name of this transfer syntax.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Obtain this transfer syntax' expected endianness.
    pub const fn endianness(&self) -> Endianness {
        self.byte_order
    }

    /// Whether the value representation is explicit in element headers.
    pub const fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    /// Retrieve the basic decoder of binary values in this transfer syntax.
    pub fn basic_decoder(&self) -> BasicDecoder {
        BasicDecoder::new(self.byte_order)
    }

    /// Retrieve the basic encoder of binary values in this transfer syntax.
    pub fn basic_encoder(&self) -> BasicEncoder {
        BasicEncoder::new(self.byte_order)
    }

    /// Retrieve the element decoder for this transfer syntax,
    /// resolving implicit value representations with the standard dictionary.
    pub fn decoder(&self) -> SyntaxDecoder {
        self.decoder_with_dict(StandardDataDictionary)
    }

    /// Retrieve the element decoder for this transfer syntax,
    /// resolving implicit value representations with the given dictionary.
    pub fn decoder_with_dict<D>(&self, dict: D) -> SyntaxDecoder<D>
    where
        D: DataDictionary,
    {
        let inner = match (self.byte_order, self.explicit_vr) {
            (Endianness::Little, false) => {
                DecoderKind::ImplicitVRLittleEndian(ImplicitVRLittleEndianDecoder::with_dict(dict))
            }
            (Endianness::Little, true) => {
                DecoderKind::ExplicitVRLittleEndian(ExplicitVRLittleEndianDecoder::default())
            }
            (Endianness::Big, _) => {
                DecoderKind::ExplicitVRBigEndian(ExplicitVRBigEndianDecoder::default())
            }
        };
        SyntaxDecoder {
            basic: self.basic_decoder(),
            inner,
        }
    }

    /// Retrieve the element encoder for this transfer syntax.
    pub fn encoder(&self) -> SyntaxEncoder {
        let inner = match (self.byte_order, self.explicit_vr) {
            (Endianness::Little, false) => {
                EncoderKind::ImplicitVRLittleEndian(ImplicitVRLittleEndianEncoder::default())
            }
            (Endianness::Little, true) => {
                EncoderKind::ExplicitVRLittleEndian(ExplicitVRLittleEndianEncoder::default())
            }
            (Endianness::Big, _) => {
                EncoderKind::ExplicitVRBigEndian(ExplicitVRBigEndianEncoder::default())
            }
        };
        SyntaxEncoder {
            basic: self.basic_encoder(),
            inner,
        }
    }
}

impl fmt::Display for TransferSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uid)
    }
}

#[derive(Debug, Clone)]
enum DecoderKind<D> {
    ImplicitVRLittleEndian(ImplicitVRLittleEndianDecoder<D>),
    ExplicitVRLittleEndian(ExplicitVRLittleEndianDecoder),
    ExplicitVRBigEndian(ExplicitVRBigEndianDecoder),
}

/// An element decoder for one of the native transfer syntaxes,
/// chosen at run-time.
#[derive(Debug, Clone)]
pub struct SyntaxDecoder<D = StandardDataDictionary> {
    basic: BasicDecoder,
    inner: DecoderKind<D>,
}

macro_rules! for_each_decoder {
    ($s: expr, |$e: ident| $f: expr) => {
        match $s {
            DecoderKind::ImplicitVRLittleEndian($e) => $f,
            DecoderKind::ExplicitVRLittleEndian($e) => $f,
            DecoderKind::ExplicitVRBigEndian($e) => $f,
        }
    };
}

impl<D> Decode for SyntaxDecoder<D>
where
    D: DataDictionary,
{
    type Basic = BasicDecoder;

    fn basic(&self) -> &Self::Basic {
        &self.basic
    }

    fn decode_header<S>(&self, source: &mut S) -> decode::Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        for_each_decoder!(&self.inner, |d| d.decode_header(source))
    }

    fn decode_item_header<S>(&self, source: &mut S) -> decode::Result<SequenceItemHeader>
    where
        S: ?Sized + Read,
    {
        for_each_decoder!(&self.inner, |d| d.decode_item_header(source))
    }

    fn decode_tag<S>(&self, source: &mut S) -> decode::Result<Tag>
    where
        S: ?Sized + Read,
    {
        for_each_decoder!(&self.inner, |d| d.decode_tag(source))
    }
}

#[derive(Debug, Clone)]
enum EncoderKind {
    ImplicitVRLittleEndian(ImplicitVRLittleEndianEncoder),
    ExplicitVRLittleEndian(ExplicitVRLittleEndianEncoder),
    ExplicitVRBigEndian(ExplicitVRBigEndianEncoder),
}

/// An element encoder for one of the native transfer syntaxes,
/// chosen at run-time.
#[derive(Debug, Clone)]
pub struct SyntaxEncoder {
    basic: BasicEncoder,
    inner: EncoderKind,
}

impl Encode for SyntaxEncoder {
    type Basic = BasicEncoder;

    fn basic(&self) -> &Self::Basic {
        &self.basic
    }

    fn encode_element_header<W>(&self, to: &mut W, de: DataElementHeader) -> encode::Result<usize>
    where
        W: ?Sized + Write,
    {
        match &self.inner {
            EncoderKind::ImplicitVRLittleEndian(e) => e.encode_element_header(to, de),
            EncoderKind::ExplicitVRLittleEndian(e) => e.encode_element_header(to, de),
            EncoderKind::ExplicitVRBigEndian(e) => e.encode_element_header(to, de),
        }
    }
}
