use crate::dataset::CompressionType;

/// Default target page size: 2 MiB
pub const DEFAULT_PAGE_SIZE_HINT: usize = 2 * 1024 * 1024;

/// Configuration for a streams section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamsConfig {
    /// Compression applied to label columns. The integer columns are always
    /// delta-encoded and uncompressed.
    pub label_compression: CompressionType,
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            label_compression: CompressionType::Zstd { level: 3 },
        }
    }
}

impl StreamsConfig {
    /// Configuration optimized for maximum compression (slower encode)
    pub fn max_compression() -> Self {
        Self {
            label_compression: CompressionType::Zstd { level: 19 },
        }
    }

    /// Configuration optimized for fast encoding (larger sections)
    pub fn fast() -> Self {
        Self {
            label_compression: CompressionType::None,
        }
    }

    /// Balanced configuration (default)
    pub fn balanced() -> Self {
        Self::default()
    }
}
