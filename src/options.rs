//! Archive-wide settings

use crate::codec::{DeflateCodec, FlateCodec};
use crate::dos_time::DaylightSaving;
use std::sync::Arc;

/// Settings shared by every entry of a [`ZipArchive`](crate::ZipArchive)
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub(crate) codec: Option<Arc<dyn DeflateCodec>>,
    pub(crate) trim_volume_from_fully_qualified_paths: bool,
    pub(crate) daylight_saving: DaylightSaving,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            codec: Some(Arc::new(FlateCodec::default())),
            trim_volume_from_fully_qualified_paths: true,
            daylight_saving: DaylightSaving::default(),
        }
    }
}

impl ArchiveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the built-in flate2 codec at `level` (0-9, default 6)
    pub fn compression_level(mut self, level: u32) -> Self {
        self.codec = Some(Arc::new(FlateCodec::new(level)));
        self
    }

    /// Replace the DEFLATE codec. `None` leaves the archive without a
    /// compressor, so `save()` and inflating extractions fail.
    pub fn codec(mut self, codec: Option<Arc<dyn DeflateCodec>>) -> Self {
        self.codec = codec;
        self
    }

    /// Strip `C:\` style volume prefixes (and leading slashes) from entry names
    pub fn trim_volume_from_fully_qualified_paths(mut self, trim: bool) -> Self {
        self.trim_volume_from_fully_qualified_paths = trim;
        self
    }

    pub fn daylight_saving(mut self, policy: DaylightSaving) -> Self {
        self.daylight_saving = policy;
        self
    }

    pub(crate) fn codec_ref(&self) -> Option<&dyn DeflateCodec> {
        self.codec.as_deref()
    }
}
