// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical little-endian wire helpers.

use crate::error::{KernelError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Upper bound on any length prefix we accept.
pub const MAX_SIZE: u64 = 0x0200_0000;

pub fn write_compact_size(buf: &mut Vec<u8>, n: u64) {
    if n < 253 {
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(253);
        buf.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(254);
        buf.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        buf.push(255);
        buf.extend_from_slice(&n.to_le_bytes());
    }
}

/// Reads a compact size, rejecting non-minimal encodings and values above `MAX_SIZE`.
pub fn read_compact_size(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    let tag = cursor.read_u8()?;
    let (n, min) = match tag {
        253 => (cursor.read_u16::<LittleEndian>()? as u64, 253),
        254 => (cursor.read_u32::<LittleEndian>()? as u64, 0x1_0000),
        255 => (cursor.read_u64::<LittleEndian>()?, 0x1_0000_0000),
        small => return Ok(small as u64),
    };
    if n < min {
        return Err(KernelError::NonCanonicalCompactSize(n));
    }
    if n > MAX_SIZE {
        return Err(KernelError::OversizedField { limit: MAX_SIZE, found: n });
    }
    Ok(n)
}

pub fn write_bytes_with_size(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_compact_size(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

pub fn read_bytes_with_size(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let len = read_compact_size(cursor)?;
    let remaining = remaining(cursor) as u64;
    if len > remaining {
        return Err(KernelError::OversizedField { limit: remaining, found: len });
    }
    let mut bytes = vec![0u8; len as usize];
    cursor.read_exact(&mut bytes)?;
    Ok(bytes)
}

pub fn read_array<const N: usize>(cursor: &mut Cursor<&[u8]>) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    cursor.read_exact(&mut bytes)?;
    Ok(bytes)
}

pub fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    let len = cursor.get_ref().len() as u64;
    len.saturating_sub(cursor.position()) as usize
}

/// Fails when a decoder stopped before the end of its input.
pub fn ensure_consumed(cursor: &Cursor<&[u8]>) -> Result<()> {
    match remaining(cursor) {
        0 => Ok(()),
        n => Err(KernelError::TrailingBytes(n)),
    }
}
