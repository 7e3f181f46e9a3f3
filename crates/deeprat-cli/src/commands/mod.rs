//! CLI command implementations

pub mod deep;
pub mod flat;
pub mod info;

use std::path::Path;

use anyhow::{Context, Result};
use deeprat_core::Rect;
use deeprat_io::source::SourceDesc;
use deeprat_io::{ChannelMapOptions, DecodeConfig};

use crate::DecodeArgs;

/// Load a source description from path
pub fn load_desc(path: &Path) -> Result<SourceDesc> {
    SourceDesc::load(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Build the decode config: file first, then command-line flags on top.
pub fn decode_config(args: &DecodeArgs) -> Result<DecodeConfig> {
    let mut config = match &args.config {
        Some(path) => DecodeConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => DecodeConfig::default(),
    };
    if args.scanline {
        config.use_raster_strategy = false;
    }
    if args.no_reverse {
        config.reverse_scanlines = false;
    }
    config.raw |= args.raw;
    config.discrete |= args.discrete;
    config.premult |= args.premult;
    config.composite |= args.composite;
    Ok(config)
}

/// Channel map options matching a decode config.
pub fn map_options(config: &DecodeConfig) -> ChannelMapOptions {
    ChannelMapOptions::default().with_luminance_only(config.luminance_only())
}

/// Requested box, or the whole image.
pub fn region(args: &DecodeArgs, width: u32, height: u32) -> Rect {
    args.rect.unwrap_or(Rect::from_size(width, height))
}

/// Format a float list for text output
pub fn format_values(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format!("{:.6}", v))
        .collect::<Vec<_>>()
        .join(" ")
}
