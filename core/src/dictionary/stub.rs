//! This module contains a stub dictionary.

use super::{DataDictionary, DictionaryEntryRef};
use crate::header::Tag;

/// An empty attribute dictionary. Every lookup misses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StubDataDictionary;

impl DataDictionary for StubDataDictionary {
    type Entry = DictionaryEntryRef<'static>;

    fn get_by_name(&self, _: &str) -> Option<&DictionaryEntryRef<'static>> {
        None
    }

    fn get_by_tag(&self, _: Tag) -> Option<&DictionaryEntryRef<'static>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::StubDataDictionary;
    use crate::dictionary::DataDictionary;
    use crate::header::Tag;

    #[test]
    fn stub_knows_nothing() {
        let dict = StubDataDictionary;
        assert!(dict.get_by_name("PatientName").is_none());
        assert!(dict.get_by_tag(Tag(0x0010, 0x0010)).is_none());
    }
}
