//! Conversion of DICOM objects into tokens.
use crate::mem::{InMemDicomObject, InMemElement};
use dcmnet_core::header::Header;
use dcmnet_core::value::Value;
use dcmnet_core::{Length, Tag};
use dcmnet_parser::dataset::DataToken;
use std::collections::btree_map::Values;
use std::collections::VecDeque;

/// A stream of tokens from a DICOM object.
///
/// Elements are expanded one at a time,
/// sequences being always delimited regardless of their recorded length.
#[derive(Debug)]
pub struct InMemObjectTokens<'a, D> {
    /// tokens of the current element yet to be yielded
    tokens_pending: VecDeque<DataToken>,
    /// the iterator of data elements in order.
    elem_iter: Values<'a, Tag, InMemElement<D>>,
}

impl<'a, D> InMemObjectTokens<'a, D> {
    /// Create a token stream over the given object.
    pub fn new(obj: &'a InMemDicomObject<D>) -> Self {
        InMemObjectTokens {
            tokens_pending: VecDeque::new(),
            elem_iter: obj.into_iter(),
        }
    }
}

impl<'a, D> Iterator for InMemObjectTokens<'a, D> {
    type Item = DataToken;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // consume pending tokens first
            if let Some(token) = self.tokens_pending.pop_front() {
                return Some(token);
            }

            // otherwise, expand the next element
            let elem = self.elem_iter.next()?;
            element_tokens(elem, &mut self.tokens_pending);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // at least 2 tokens per element left
        (
            self.tokens_pending.len() + self.elem_iter.len() * 2,
            None,
        )
    }
}

/// Expand a single element into its tokens, items included.
fn element_tokens<D>(elem: &InMemElement<D>, out: &mut VecDeque<DataToken>) {
    match elem.value() {
        Value::Primitive(value) => {
            out.push_back(DataToken::ElementHeader(*elem.header()));
            out.push_back(DataToken::PrimitiveValue(value.clone()));
        }
        Value::Sequence(items) => {
            out.push_back(DataToken::SequenceStart {
                tag: elem.tag(),
                len: Length::UNDEFINED,
            });
            for item in items {
                out.push_back(DataToken::ItemStart {
                    len: Length::UNDEFINED,
                });
                for inner in item {
                    element_tokens(inner, out);
                }
                out.push_back(DataToken::ItemEnd);
            }
            out.push_back(DataToken::SequenceEnd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InMemObjectTokens;
    use crate::mem::InMemDicomObject;
    use dcmnet_core::header::DataElementHeader;
    use dcmnet_core::value::Value;
    use dcmnet_core::{dicom_value, DataElement, Length, Tag, VR};
    use dcmnet_parser::dataset::DataToken;

    #[test]
    fn inmem_object_into_tokens() {
        let item = InMemDicomObject::from_element_iter([DataElement::new(
            Tag(0x0018, 0x6012),
            VR::US,
            dicom_value!(U16, [1]),
        )]);
        let obj = InMemDicomObject::from_element_iter([
            DataElement::new(
                Tag(0x0018, 0x6011),
                VR::SQ,
                Value::new_sequence(vec![item]),
            ),
            DataElement::new(Tag(0x0010, 0x0010), VR::PN, dicom_value!(Strs, ["Doe^John"])),
        ]);

        let tokens: Vec<_> = InMemObjectTokens::new(&obj).collect();
        let gt = vec![
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0x0010, 0x0010),
                VR::PN,
                Length(8),
            )),
            DataToken::PrimitiveValue(dicom_value!(Strs, ["Doe^John"])),
            DataToken::SequenceStart {
                tag: Tag(0x0018, 0x6011),
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0x0018, 0x6012),
                VR::US,
                Length(2),
            )),
            DataToken::PrimitiveValue(dicom_value!(U16, [1])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
        ];
        assert_eq!(tokens, gt);
    }
}
