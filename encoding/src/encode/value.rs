//! Writing of primitive values.

use crate::encode::{BasicEncode, Result, ValueTooLongSnafu, WriteValueSnafu};
use dcmnet_core::value::PrimitiveValue;
use dcmnet_core::VR;
use snafu::{ensure, ResultExt};
use std::io::{self, Write};

/// Check that every textual value fits the maximum length
/// of its value representation.
pub fn check_max_length(vr: VR, value: &PrimitiveValue) -> Result<()> {
    let max = match vr.max_length() {
        Some(max) if vr.is_text() => max,
        _ => return Ok(()),
    };
    let check = |s: &str| -> Result<()> {
        ensure!(
            s.len() <= max as usize,
            ValueTooLongSnafu {
                vr,
                len: s.len(),
                max,
            }
        );
        Ok(())
    };
    match value {
        PrimitiveValue::Str(s) => check(s),
        PrimitiveValue::Strs(values) => values.iter().try_for_each(|s| check(s)),
        _ => Ok(()),
    }
}

/// Write a primitive value of the given representation,
/// followed by one padding byte if its length is odd.
///
/// Returns the exact number of bytes written,
/// which is always even.
pub fn write_value<W, B>(to: &mut W, vr: VR, value: &PrimitiveValue, basic: &B) -> Result<usize>
where
    W: ?Sized + Write,
    B: BasicEncode,
{
    check_max_length(vr, value)?;
    let len = write_raw(&mut *to, value, basic).context(WriteValueSnafu { vr })?;
    if len % 2 == 1 {
        to.write_all(&[vr.padding()])
            .context(WriteValueSnafu { vr })?;
        Ok(len + 1)
    } else {
        Ok(len)
    }
}

fn write_raw<W, B>(mut to: W, value: &PrimitiveValue, basic: &B) -> io::Result<usize>
where
    W: Write,
    B: BasicEncode,
{
    use PrimitiveValue::*;
    match value {
        Empty => Ok(0),
        Str(s) => {
            to.write_all(s.as_bytes())?;
            Ok(s.len())
        }
        Strs(values) => {
            let mut len = 0;
            for (i, s) in values.iter().enumerate() {
                if i > 0 {
                    to.write_all(b"\\")?;
                    len += 1;
                }
                to.write_all(s.as_bytes())?;
                len += s.len();
            }
            Ok(len)
        }
        Tags(values) => {
            for tag in values {
                basic.encode_tag(&mut to, *tag)?;
            }
            Ok(values.len() * 4)
        }
        U8(values) => {
            to.write_all(values)?;
            Ok(values.len())
        }
        I16(values) => {
            for v in values {
                basic.encode_ss(&mut to, *v)?;
            }
            Ok(values.len() * 2)
        }
        U16(values) => {
            for v in values {
                basic.encode_us(&mut to, *v)?;
            }
            Ok(values.len() * 2)
        }
        I32(values) => {
            for v in values {
                basic.encode_sl(&mut to, *v)?;
            }
            Ok(values.len() * 4)
        }
        U32(values) => {
            for v in values {
                basic.encode_ul(&mut to, *v)?;
            }
            Ok(values.len() * 4)
        }
        I64(values) => {
            for v in values {
                basic.encode_sv(&mut to, *v)?;
            }
            Ok(values.len() * 8)
        }
        U64(values) => {
            for v in values {
                basic.encode_uv(&mut to, *v)?;
            }
            Ok(values.len() * 8)
        }
        F32(values) => {
            for v in values {
                basic.encode_fl(&mut to, *v)?;
            }
            Ok(values.len() * 4)
        }
        F64(values) => {
            for v in values {
                basic.encode_fd(&mut to, *v)?;
            }
            Ok(values.len() * 8)
        }
    }
}
