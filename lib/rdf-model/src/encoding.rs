//! Self-delimiting byte encodings shared by [`crate::node`] and
//! [`crate::statement`] (spec §4.C, §4.D). A leading schema-version byte
//! (`1`) precedes every encoded value so the format can evolve; an unknown
//! version fails the decode with `InvalidEncoding` rather than guessing.

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: u8 = 1;

pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

pub fn read_varint(input: &[u8], pos: &mut usize) -> Result<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;
    loop {
        let byte = *input
            .get(*pos)
            .ok_or_else(|| Error::invalid_encoding("truncated varint"))?;
        *pos += 1;
        result |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
        if shift > 63 {
            return Err(Error::invalid_encoding("varint too long"));
        }
    }
    Ok(result)
}

pub fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    write_varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

pub fn read_len_prefixed<'a>(input: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let len = read_varint(input, pos)? as usize;
    let end = pos
        .checked_add(len)
        .ok_or_else(|| Error::invalid_encoding("length overflow"))?;
    let slice = input
        .get(*pos..end)
        .ok_or_else(|| Error::invalid_encoding("truncated payload"))?;
    *pos = end;
    Ok(slice)
}

pub fn check_version(input: &[u8], pos: &mut usize) -> Result<()> {
    let version = *input
        .get(*pos)
        .ok_or_else(|| Error::invalid_encoding("missing schema version byte"))?;
    *pos += 1;
    if version != SCHEMA_VERSION {
        return Err(Error::invalid_encoding(format!(
            "unsupported schema version {version}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_round_trips() {
        for value in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
            let mut buf = Vec::new();
            write_varint(&mut buf, value);
            let mut pos = 0;
            assert_eq!(read_varint(&buf, &mut pos).unwrap(), value);
            assert_eq!(pos, buf.len());
        }
    }
}
