//! Data element dictionary implementation

use crate::tags::ENTRIES;
use dcmnet_core::dictionary::{
    DataDictionary, DictionaryEntryRef, ValueMultiplicity,
};
use dcmnet_core::header::Tag;
use dcmnet_core::VR;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static DICT: Lazy<StandardDataDictionaryRegistry> = Lazy::new(init_dictionary);

/// Retrieve a singleton instance of the standard dictionary registry.
///
/// Note that one does not generally have to call this
/// unless when retrieving the underlying registry is important.
/// The unit type [`StandardDataDictionary`]
/// already provides a lazy loaded singleton implementing the necessary traits.
#[inline]
pub fn registry() -> &'static StandardDataDictionaryRegistry {
    &DICT
}

/// The data struct actually containing the standard dictionary.
///
/// This structure is made opaque via the unit type [`StandardDataDictionary`],
/// which provides a lazy loaded singleton.
#[derive(Debug)]
pub struct StandardDataDictionaryRegistry {
    /// mapping: name → entry
    by_name: HashMap<&'static str, &'static DictionaryEntryRef<'static>>,
    /// mapping: tag → entry
    by_tag: HashMap<Tag, &'static DictionaryEntryRef<'static>>,
}

impl StandardDataDictionaryRegistry {
    fn new() -> StandardDataDictionaryRegistry {
        StandardDataDictionaryRegistry {
            by_name: HashMap::with_capacity(ENTRIES.len()),
            by_tag: HashMap::with_capacity(ENTRIES.len()),
        }
    }

    /// record the given dictionary entry reference
    fn index(&mut self, entry: &'static DictionaryEntryRef<'static>) -> &mut Self {
        self.by_name.insert(entry.alias, entry);
        self.by_tag.insert(entry.tag, entry);
        self
    }

    /// The number of indexed entries.
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

/// Generic Group Length dictionary entry.
static GROUP_LENGTH_ENTRY: DictionaryEntryRef<'static> = DictionaryEntryRef {
    tag: Tag(0x0000, 0x0000),
    alias: "GenericGroupLength",
    vr: VR::UL,
    vm: ValueMultiplicity::One,
};

/// Generic Private Creator dictionary entry.
static PRIVATE_CREATOR_ENTRY: DictionaryEntryRef<'static> = DictionaryEntryRef {
    tag: Tag(0x0009, 0x0010),
    alias: "PrivateCreator",
    vr: VR::LO,
    vm: ValueMultiplicity::One,
};

/// A data element dictionary which consults
/// the library's global DICOM attribute registry.
///
/// This is the type which would generally be used
/// whenever a data element dictionary is needed,
/// such as when resolving attributes by name.
///
/// The dictionary index is automatically initialized upon the first use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StandardDataDictionary;

impl StandardDataDictionary {
    fn indexed_tag(tag: Tag) -> Option<&'static DictionaryEntryRef<'static>> {
        registry().by_tag.get(&tag).copied().or_else(|| {
            // check for private creator
            if tag.0 & 1 == 1 && (0x0010..=0x00FF).contains(&tag.1) {
                return Some(&PRIVATE_CREATOR_ENTRY);
            }
            // check for group length
            if tag.is_group_length() {
                return Some(&GROUP_LENGTH_ENTRY);
            }
            None
        })
    }
}

impl DataDictionary for StandardDataDictionary {
    type Entry = DictionaryEntryRef<'static>;

    fn get_by_name(&self, name: &str) -> Option<&DictionaryEntryRef<'static>> {
        registry().by_name.get(name).copied()
    }

    fn get_by_tag(&self, tag: Tag) -> Option<&DictionaryEntryRef<'static>> {
        StandardDataDictionary::indexed_tag(tag)
    }
}

fn init_dictionary() -> StandardDataDictionaryRegistry {
    let mut d = StandardDataDictionaryRegistry::new();
    for entry in ENTRIES {
        d.index(entry);
    }
    d
}
