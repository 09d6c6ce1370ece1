//! Configuration for the persistence writer.

use std::path::PathBuf;
use std::str::FromStr;

use obs_dataset::{BYTES_PER_MB, DEFAULT_TARGET_MB};
use serde::{Deserialize, Serialize};
use tracing::warn;
use zarrs::array::codec::bytes_to_bytes::blosc::BloscCompressor;

/// Configuration for the persistence writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Local directory for processed artifacts. Zarr stores bound for
    /// object storage are staged here too.
    pub processed_dir: PathBuf,

    /// Byte budget for one Zarr chunk, in megabytes.
    pub target_chunk_mb: usize,

    /// Blosc compressor for Zarr arrays.
    pub zarr_compression: ZarrCompression,

    /// Compression level (1-9).
    pub zarr_compression_level: u8,

    /// Byte shuffle ahead of compression.
    pub zarr_shuffle: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            processed_dir: PathBuf::from("data/processed"),
            target_chunk_mb: DEFAULT_TARGET_MB,
            zarr_compression: ZarrCompression::Zstd,
            zarr_compression_level: 1,
            zarr_shuffle: true,
        }
    }
}

impl WriterConfig {
    pub fn new(processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
            ..Self::default()
        }
    }

    /// Apply environment overrides on top of `self`.
    pub fn with_env(mut self) -> Self {
        if let Ok(val) = std::env::var("TARGET_CHUNK_MB") {
            if let Ok(size) = val.parse() {
                self.target_chunk_mb = size;
            }
        }

        if let Ok(val) = std::env::var("ZARR_COMPRESSION") {
            match val.parse() {
                Ok(compression) => self.zarr_compression = compression,
                Err(e) => warn!(error = %e, "Ignoring ZARR_COMPRESSION"),
            }
        }

        if let Ok(val) = std::env::var("ZARR_COMPRESSION_LEVEL") {
            if let Ok(level) = val.parse() {
                self.zarr_compression_level = level;
            }
        }

        if let Ok(val) = std::env::var("ZARR_SHUFFLE") {
            self.zarr_shuffle = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.target_chunk_mb == 0 {
            return Err("target_chunk_mb must be > 0".to_string());
        }

        if self.zarr_compression_level == 0 || self.zarr_compression_level > 9 {
            return Err("zarr_compression_level must be 1-9".to_string());
        }

        Ok(())
    }

    /// Chunk budget in bytes.
    pub fn target_chunk_bytes(&self) -> usize {
        self.target_chunk_mb * BYTES_PER_MB
    }
}

/// Blosc compressor applied to every Zarr array, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZarrCompression {
    None,
    Lz4,
    #[default]
    Zstd,
}

impl ZarrCompression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }

    /// Blosc inner compressor, `None` when arrays are stored raw.
    pub fn blosc_compressor(&self) -> Option<BloscCompressor> {
        match self {
            Self::None => None,
            Self::Lz4 => Some(BloscCompressor::LZ4),
            Self::Zstd => Some(BloscCompressor::Zstd),
        }
    }
}

impl FromStr for ZarrCompression {
    type Err = String;

    /// Case-insensitive; a `blosc_` prefix is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.strip_prefix("blosc_").unwrap_or(&lower) {
            "none" => Ok(Self::None),
            "lz4" => Ok(Self::Lz4),
            "zstd" => Ok(Self::Zstd),
            _ => Err(format!("unknown Zarr compression '{}'", s)),
        }
    }
}

impl std::fmt::Display for ZarrCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
