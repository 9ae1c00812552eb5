// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Streaming hasher with canonical integer encodings.

use crate::codec::write_compact_size;
use crate::types::Hash256;

pub struct HashWriter {
    hasher: blake3::Hasher,
}

impl Default for HashWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl HashWriter {
    pub fn new() -> Self {
        Self { hasher: blake3::Hasher::new() }
    }

    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update(bytes);
        self
    }

    pub fn write_u32(&mut self, val: u32) -> &mut Self {
        self.write(&val.to_le_bytes())
    }

    pub fn write_u64(&mut self, val: u64) -> &mut Self {
        self.write(&val.to_le_bytes())
    }

    pub fn write_i64(&mut self, val: i64) -> &mut Self {
        self.write(&val.to_le_bytes())
    }

    pub fn write_compact_size(&mut self, n: u64) -> &mut Self {
        let mut buf = Vec::with_capacity(9);
        write_compact_size(&mut buf, n);
        self.write(&buf)
    }

    pub fn write_bytes_with_size(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_compact_size(bytes.len() as u64);
        self.write(bytes)
    }

    pub fn finalize(&self) -> Hash256 {
        Hash256(*self.hasher.finalize().as_bytes())
    }
}
