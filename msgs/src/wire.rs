//! Field encodings shared by both message directions.

use std::io::{self, Cursor, Write};

use anyhow::{bail, Context};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use session::Classification;

pub(crate) type Reader<'a> = Cursor<&'a [u8]>;

/// Writes `len`, `type` and the payload of one frame.
pub(crate) fn write_frame(wtr: &mut impl Write, msg_type: u32, payload: &[u8]) -> io::Result<()> {
    wtr.write_u32::<LittleEndian>(4 + payload.len() as u32)?;
    wtr.write_u32::<LittleEndian>(msg_type)?;
    wtr.write_all(payload)
}

pub(crate) fn read_u32(rdr: &mut Reader, field: &'static str) -> anyhow::Result<u32> {
    rdr.read_u32::<LittleEndian>().context(field)
}

pub(crate) fn read_f32(rdr: &mut Reader, field: &'static str) -> anyhow::Result<f32> {
    rdr.read_f32::<LittleEndian>().context(field)
}

pub(crate) fn write_bool(wtr: &mut impl Write, value: bool) -> io::Result<()> {
    wtr.write_u8(value as u8)
}

pub(crate) fn read_bool(rdr: &mut Reader, field: &'static str) -> anyhow::Result<bool> {
    match rdr.read_u8().context(field)? {
        0 => Ok(false),
        1 => Ok(true),
        other => bail!("invalid {field} flag: {other}"),
    }
}

pub(crate) fn write_f32_vec(wtr: &mut impl Write, values: &[f32]) -> io::Result<()> {
    wtr.write_u32::<LittleEndian>(values.len() as u32)?;
    for value in values {
        wtr.write_f32::<LittleEndian>(*value)?;
    }
    Ok(())
}

pub(crate) fn read_f32_vec(rdr: &mut Reader, field: &'static str) -> anyhow::Result<Vec<f32>> {
    let count = read_u32(rdr, field)? as usize;
    ensure_remaining(rdr, count, 4, field)?;
    (0..count).map(|_| read_f32(rdr, field)).collect()
}

pub(crate) fn classification_code(classification: Classification) -> u8 {
    match classification {
        Classification::Exact => 0,
        Classification::Close => 1,
        Classification::Far => 2,
    }
}

pub(crate) fn classification_from_code(code: u8) -> anyhow::Result<Classification> {
    match code {
        0 => Ok(Classification::Exact),
        1 => Ok(Classification::Close),
        2 => Ok(Classification::Far),
        other => bail!("unsupported classification code: {other}"),
    }
}

pub(crate) fn write_classifications(wtr: &mut impl Write, values: &[Classification]) -> io::Result<()> {
    wtr.write_u32::<LittleEndian>(values.len() as u32)?;
    for value in values {
        wtr.write_u8(classification_code(*value))?;
    }
    Ok(())
}

pub(crate) fn read_classifications(rdr: &mut Reader) -> anyhow::Result<Vec<Classification>> {
    let count = read_u32(rdr, "classification count")? as usize;
    ensure_remaining(rdr, count, 1, "classification")?;
    (0..count)
        .map(|_| classification_from_code(rdr.read_u8().context("classification")?))
        .collect()
}

/// Guards allocations against a count field larger than the frame.
fn ensure_remaining(rdr: &Reader, count: usize, element_size: usize, field: &'static str) -> anyhow::Result<()> {
    let remaining = rdr.get_ref().len().saturating_sub(rdr.position() as usize);
    if count.saturating_mul(element_size) > remaining {
        bail!("{field}: {count} elements announced, {remaining} bytes left");
    }
    Ok(())
}

/// Fails on bytes trailing a fully decoded message.
pub(crate) fn ensure_consumed(rdr: &Reader, msg: &'static str) -> anyhow::Result<()> {
    let trailing = rdr.get_ref().len().saturating_sub(rdr.position() as usize);
    if trailing != 0 {
        bail!("{trailing} trailing bytes after {msg}");
    }
    Ok(())
}
