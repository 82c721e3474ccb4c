//! Table-driven CRC-32 (ISO-HDLC / PKZIP) checksum
//!
//! The checksum can be fused with a copy: [`compute`] reads a stream in blocks,
//! updates the checksum and forwards every block to an optional sink. The ZIP
//! writer uses this to checksum and compress an entry in a single pass.

use std::io::{self, Read, Write};

/// Reflected form of the CRC-32 polynomial 0x04C11DB7
const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Block size used by [`compute`]
const BLOCK_SIZE: usize = 8 * 1024;

static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// Incremental CRC-32 hasher
#[derive(Debug, Clone)]
pub struct Crc32 {
    state: u32,
    amount: u64,
}

impl Crc32 {
    pub fn new() -> Self {
        Self {
            state: 0xFFFF_FFFF,
            amount: 0,
        }
    }

    /// Feed bytes into the running checksum
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.state;
        for &byte in data {
            crc = TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
        }
        self.state = crc;
        self.amount += data.len() as u64;
    }

    /// Total number of bytes hashed so far
    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn finalize(&self) -> u32 {
        !self.state
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksum a byte slice in one call
pub fn checksum(data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(data);
    crc.finalize()
}

/// Checksum `input` to exhaustion, copying each block to `output` if one is given.
///
/// Returns the final CRC and the number of bytes read.
pub fn compute<R, W>(input: &mut R, mut output: Option<&mut W>) -> io::Result<(u32, u64)>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut crc = Crc32::new();
    let mut block = vec![0u8; BLOCK_SIZE];

    loop {
        let read = match input.read(&mut block) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        crc.update(&block[..read]);
        if let Some(sink) = output.as_deref_mut() {
            sink.write_all(&block[..read])?;
        }
    }

    Ok((crc.finalize(), crc.amount()))
}
