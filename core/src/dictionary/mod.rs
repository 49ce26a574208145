//! This module contains the concept of a DICOM data dictionary.
//!
//! The standard data dictionary is available in the `dcmnet-dictionary-std` crate.

mod stub;

use crate::header::{Tag, VR};
use std::fmt::Debug;

pub use self::stub::StubDataDictionary;

/// The value multiplicity of a DICOM attribute,
/// as expected by the data dictionary.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ValueMultiplicity {
    /// Exactly one value (1)
    One,
    /// Exactly two values (2)
    Two,
    /// Exactly three values (3)
    Three,
    /// Exactly four values (4)
    Four,
    /// Exactly sixteen values (16)
    Sixteen,
    /// One or more values (1-n)
    Unbounded,
}

impl ValueMultiplicity {
    /// Check whether the given number of values
    /// is admitted by this multiplicity.
    pub fn admits(self, count: u32) -> bool {
        match self {
            ValueMultiplicity::One => count == 1,
            ValueMultiplicity::Two => count == 2,
            ValueMultiplicity::Three => count == 3,
            ValueMultiplicity::Four => count == 4,
            ValueMultiplicity::Sixteen => count == 16,
            ValueMultiplicity::Unbounded => count >= 1,
        }
    }
}

/// Type trait for a dictionary of DICOM attributes. Attribute dictionaries provide the
/// means to convert a tag to an alias and vice versa, as well as a form of retrieving
/// additional information about the attribute.
///
/// The methods herein have no generic parameters, so as to enable being
/// used as a trait object.
pub trait DataDictionary: Debug {
    /// The type of the dictionary entry.
    type Entry: DictionaryEntry;

    /// Fetch an entry by its usual alias (e.g. "PatientName" or "SOPInstanceUID").
    /// Aliases are case sensitive and not separated by spaces.
    fn get_by_name(&self, name: &str) -> Option<&Self::Entry>;

    /// Fetch an entry by its tag.
    fn get_by_tag(&self, tag: Tag) -> Option<&Self::Entry>;
}

impl<D: DataDictionary + ?Sized> DataDictionary for &D {
    type Entry = D::Entry;

    fn get_by_name(&self, name: &str) -> Option<&Self::Entry> {
        (**self).get_by_name(name)
    }

    fn get_by_tag(&self, tag: Tag) -> Option<&Self::Entry> {
        (**self).get_by_tag(tag)
    }
}

/// The dictionary entry data type, representing a DICOM attribute.
pub trait DictionaryEntry {
    /// The attribute tag.
    fn tag(&self) -> Tag;
    /// The alias of the attribute, with no spaces, usually in UpperCamelCase.
    fn alias(&self) -> &str;
    /// The _typical_  value representation of the attribute.
    fn vr(&self) -> VR;
    /// The expected value multiplicity.
    fn vm(&self) -> ValueMultiplicity;
}

/// A data type for a dictionary entry with a string slice for its alias.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DictionaryEntryRef<'a> {
    /// The attribute tag
    pub tag: Tag,
    /// The alias of the attribute, with no spaces, usually InCapitalizedCamelCase
    pub alias: &'a str,
    /// The _typical_  value representation of the attribute
    pub vr: VR,
    /// The expected value multiplicity
    pub vm: ValueMultiplicity,
}

impl<'a> DictionaryEntry for DictionaryEntryRef<'a> {
    fn tag(&self) -> Tag {
        self.tag
    }
    fn alias(&self) -> &str {
        self.alias
    }
    fn vr(&self) -> VR {
        self.vr
    }
    fn vm(&self) -> ValueMultiplicity {
        self.vm
    }
}

#[cfg(test)]
mod tests {
    use super::ValueMultiplicity;

    #[test]
    fn multiplicity_admits() {
        assert!(ValueMultiplicity::One.admits(1));
        assert!(!ValueMultiplicity::One.admits(2));
        assert!(ValueMultiplicity::Unbounded.admits(7));
        assert!(!ValueMultiplicity::Unbounded.admits(0));
        assert!(ValueMultiplicity::Three.admits(3));
    }
}
