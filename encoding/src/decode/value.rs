//! Reading of primitive values, as described by their element header.
//!
//! Reads are tolerant: a declared length which does not fit
//! a whole number of binary units is logged,
//! and the trailing remainder is dropped.

use crate::decode::{
    BasicDecode, NonPrimitiveValueSnafu, ReadValueDataSnafu, Result, UndefinedValueLengthSnafu,
};
use dcmnet_core::header::{DataElementHeader, Header};
use dcmnet_core::value::{PrimitiveValue, C};
use dcmnet_core::{Tag, VR};
use snafu::{ensure, ResultExt};
use std::io::Read;

/// Read the value of a primitive data element from the given source,
/// which must be positioned right after the element's header.
///
/// Exactly `header.len` bytes are consumed.
pub fn read_value<S, B>(source: &mut S, header: &DataElementHeader, basic: &B) -> Result<PrimitiveValue>
where
    S: ?Sized + Read,
    B: BasicDecode,
{
    let tag = header.tag();
    let vr = header.vr();
    ensure!(vr != VR::SQ, NonPrimitiveValueSnafu { tag });
    let len = header.len.get().ok_or_else(|| UndefinedValueLengthSnafu { tag }.build())?;

    let mut buf = vec![0u8; len as usize];
    source
        .read_exact(&mut buf)
        .context(ReadValueDataSnafu { vr, len })?;

    if buf.is_empty() {
        return Ok(PrimitiveValue::Empty);
    }

    Ok(parse_value(tag, vr, &buf, basic))
}

/// Interpret the given value bytes according to the value representation.
pub fn parse_value<B>(tag: Tag, vr: VR, data: &[u8], basic: &B) -> PrimitiveValue
where
    B: BasicDecode,
{
    if data.is_empty() {
        return PrimitiveValue::Empty;
    }

    match vr {
        VR::AE
        | VR::AS
        | VR::CS
        | VR::DA
        | VR::DS
        | VR::DT
        | VR::IS
        | VR::LO
        | VR::PN
        | VR::SH
        | VR::TM
        | VR::UC
        | VR::UI => {
            let text = String::from_utf8_lossy(data);
            let values: C<String> = trim_padding(&text)
                .split('\\')
                .map(|s| trim_padding(s).to_owned())
                .collect();
            PrimitiveValue::Strs(values)
        }
        VR::LT | VR::ST | VR::UT | VR::UR => {
            let text = String::from_utf8_lossy(data);
            PrimitiveValue::Str(trim_padding(&text).to_owned())
        }
        VR::OB | VR::UN | VR::SQ => PrimitiveValue::U8(C::from_slice(data)),
        VR::AT => PrimitiveValue::Tags(units(tag, vr, data, 4, |c| basic.decode_tag(c))),
        VR::US | VR::OW => PrimitiveValue::U16(units(tag, vr, data, 2, |c| basic.decode_us(c))),
        VR::SS => PrimitiveValue::I16(units(tag, vr, data, 2, |c| basic.decode_ss(c))),
        VR::UL | VR::OL => PrimitiveValue::U32(units(tag, vr, data, 4, |c| basic.decode_ul(c))),
        VR::SL => PrimitiveValue::I32(units(tag, vr, data, 4, |c| basic.decode_sl(c))),
        VR::UV | VR::OV => PrimitiveValue::U64(units(tag, vr, data, 8, |c| basic.decode_uv(c))),
        VR::SV => PrimitiveValue::I64(units(tag, vr, data, 8, |c| basic.decode_sv(c))),
        VR::FL | VR::OF => PrimitiveValue::F32(units(tag, vr, data, 4, |c| basic.decode_fl(c))),
        VR::FD | VR::OD => PrimitiveValue::F64(units(tag, vr, data, 8, |c| basic.decode_fd(c))),
    }
}

/// Decode the data as a sequence of fixed-size numbers.
fn units<T, F>(tag: Tag, vr: VR, data: &[u8], unit: usize, mut f: F) -> C<T>
where
    F: FnMut(&[u8]) -> std::io::Result<T>,
{
    let remainder = data.len() % unit;
    if remainder != 0 {
        tracing::warn!(
            "Value length {} of {} ({}) is not a multiple of {}, ignoring the last {} bytes",
            data.len(),
            tag,
            vr,
            unit,
            remainder
        );
    }
    data.chunks_exact(unit)
        .filter_map(|chunk| f(chunk).ok())
        .collect()
}

fn trim_padding(s: &str) -> &str {
    s.trim_end_matches([' ', '\0'])
}
