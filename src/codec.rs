//! DEFLATE collaborator used to compress entries on save and inflate them on extraction

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::fmt;
use std::io::{self, Read, Write};

/// Write half of a codec: raw bytes in, compressed bytes collected in memory
pub trait DeflateSink: Write {
    /// Flush the final block and hand back the compressed bytes
    fn finish(self: Box<Self>) -> io::Result<Vec<u8>>;
}

/// A raw DEFLATE (method 8) compressor/decompressor
pub trait DeflateCodec: fmt::Debug + Send + Sync {
    /// Start a new in-memory compression stream
    fn encoder(&self) -> Box<dyn DeflateSink>;

    /// Inflate `compressed`
    fn decoder<'a>(&self, compressed: &'a [u8]) -> Box<dyn Read + 'a>;
}

/// flate2-backed codec
#[derive(Debug, Clone, Copy)]
pub struct FlateCodec {
    level: u32,
}

impl FlateCodec {
    /// Codec with a compression level between 0 and 9
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for FlateCodec {
    fn default() -> Self {
        Self::new(6)
    }
}

struct FlateSink {
    encoder: DeflateEncoder<Vec<u8>>,
}

impl Write for FlateSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encoder.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl DeflateSink for FlateSink {
    fn finish(self: Box<Self>) -> io::Result<Vec<u8>> {
        self.encoder.finish()
    }
}

impl DeflateCodec for FlateCodec {
    fn encoder(&self) -> Box<dyn DeflateSink> {
        Box::new(FlateSink {
            encoder: DeflateEncoder::new(Vec::new(), Compression::new(self.level)),
        })
    }

    fn decoder<'a>(&self, compressed: &'a [u8]) -> Box<dyn Read + 'a> {
        Box::new(DeflateDecoder::new(compressed))
    }
}
