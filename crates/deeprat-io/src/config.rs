//! Decode configuration.
//!
//! Every decode call takes an immutable [`DecodeConfig`]. The same struct
//! covers both decoders: the flat decoder reads `use_raster_strategy` and
//! `reverse_scanlines`, the deep decoder reads `reverse_scanlines` and the
//! four sample flags. `raw` also selects luminance-only channel mapping when
//! a decoder is opened.
//!
//! # Example
//!
//! ```rust
//! use deeprat_io::DecodeConfig;
//!
//! let config = DecodeConfig::default()
//!     .with_discrete(true)
//!     .with_premult(true);
//! assert!(config.use_raster_strategy);
//! assert!(config.reverse_scanlines);
//!
//! let yaml = "raw: true\ncomposite: true\n";
//! let parsed = DecodeConfig::from_yaml_str(yaml).unwrap();
//! assert!(parsed.raw && parsed.composite);
//! assert!(parsed.reverse_scanlines);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::IoResult;

/// Options for one decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Load whole planes once and index them (raster) instead of reading
    /// one scanline per plane per row (scanline).
    pub use_raster_strategy: bool,
    /// Source stores rows bottom-up; flip row indices before reading.
    pub reverse_scanlines: bool,
    /// Use the stored alpha and back depth, with no derivation. Stored
    /// values are still uncomposited when `composite` is off.
    pub raw: bool,
    /// Front and back depth are equal for every sample. Always on for
    /// sources with a color plane.
    pub discrete: bool,
    /// Multiply color channels by the derived alpha.
    pub premult: bool,
    /// Samples are already front-to-back accumulated; when `false` the
    /// decoder uncomposites them first.
    pub composite: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            use_raster_strategy: true,
            reverse_scanlines: true,
            raw: false,
            discrete: false,
            premult: false,
            composite: false,
        }
    }
}

impl DecodeConfig {
    /// Sets the flat buffer strategy.
    pub fn with_raster_strategy(mut self, raster: bool) -> Self {
        self.use_raster_strategy = raster;
        self
    }

    /// Sets the vertical flip.
    pub fn with_reverse_scanlines(mut self, reverse: bool) -> Self {
        self.reverse_scanlines = reverse;
        self
    }

    /// Sets raw sample mode.
    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Sets discrete depth mode.
    pub fn with_discrete(mut self, discrete: bool) -> Self {
        self.discrete = discrete;
        self
    }

    /// Sets color premultiplication.
    pub fn with_premult(mut self, premult: bool) -> Self {
        self.premult = premult;
        self
    }

    /// Sets accumulated (composited) input mode.
    pub fn with_composite(mut self, composite: bool) -> Self {
        self.composite = composite;
        self
    }

    /// Luminance planes map to red only, without green/blue expansion.
    #[inline]
    pub fn luminance_only(&self) -> bool {
        self.raw
    }

    /// Maps a requested row to the row index presented to the source.
    #[inline]
    pub fn source_row(&self, row: u32, height: u32) -> u32 {
        if self.reverse_scanlines {
            height - row - 1
        } else {
            row
        }
    }

    /// Parses a configuration from YAML. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> IoResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

/// How a decode call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeStatus {
    /// Every requested pixel was written.
    #[default]
    Complete,
    /// The host aborted; output is partial but every written value is valid.
    Cancelled,
}

impl DecodeStatus {
    /// Returns `true` if the decode was aborted.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DecodeConfig::default();
        assert!(config.use_raster_strategy);
        assert!(config.reverse_scanlines);
        assert!(!config.raw);
        assert!(!config.discrete);
        assert!(!config.premult);
        assert!(!config.composite);
    }

    #[test]
    fn test_source_row() {
        let flipped = DecodeConfig::default();
        assert_eq!(flipped.source_row(0, 10), 9);
        assert_eq!(flipped.source_row(9, 10), 0);

        let straight = flipped.with_reverse_scanlines(false);
        assert_eq!(straight.source_row(3, 10), 3);
    }

    #[test]
    fn test_luminance_only_follows_raw() {
        assert!(!DecodeConfig::default().luminance_only());
        assert!(DecodeConfig::default().with_raw(true).luminance_only());
    }

    #[test]
    fn test_yaml_partial() {
        let config = DecodeConfig::from_yaml_str("use_raster_strategy: false\n").unwrap();
        assert!(!config.use_raster_strategy);
        assert!(config.reverse_scanlines);
    }

    #[test]
    fn test_yaml_invalid() {
        let err = DecodeConfig::from_yaml_str("raw: [1, 2]").unwrap_err();
        assert!(matches!(err, crate::IoError::Config(_)));
    }
}
