//! Summary of an opened source.

use std::fmt;

use deeprat_core::{ChannelSet, PlaneInfo};
use serde::Serialize;

use crate::channel_map::ChannelMap;

/// Whether a source holds one sample or a sample list per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// One sample per pixel.
    Flat,
    /// Zero or more depth-ordered samples per pixel.
    Deep,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => f.write_str("flat"),
            Self::Deep => f.write_str("deep"),
        }
    }
}

/// What a decoder reports about its source after opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Total components across all planes.
    pub depth: usize,
    /// Channels the source can provide.
    pub channels: ChannelSet,
    /// Flat or deep.
    pub kind: SourceKind,
}

impl SourceInfo {
    pub(crate) fn new(
        (width, height): (u32, u32),
        planes: &[PlaneInfo],
        map: &ChannelMap,
        kind: SourceKind,
    ) -> Self {
        let mut channels = map.mapped_channels();
        if kind == SourceKind::Deep {
            channels.extend(map.derived().iter().cloned());
        }
        Self {
            width,
            height,
            depth: planes.iter().map(PlaneInfo::component_count).sum(),
            channels,
            kind,
        }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{}, {} components, channels: {}",
            self.kind, self.width, self.height, self.depth, self.channels
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChannelMapOptions;
    use deeprat_core::{BitDepth, Channel};

    #[test]
    fn test_deep_info_includes_derived() {
        let planes = [
            PlaneInfo::new("C", ["r", "g", "b", "a"], BitDepth::F16),
            PlaneInfo::new("Pz", ["r"], BitDepth::F32),
        ];
        let map = ChannelMap::build(&planes, ChannelMapOptions::default());

        let flat = SourceInfo::new((4, 2), &planes, &map, SourceKind::Flat);
        assert_eq!(flat.depth, 5);
        assert!(flat.channels.contains(&Channel::Z));
        assert!(!flat.channels.contains(&Channel::DeepFront));

        let deep = SourceInfo::new((4, 2), &planes, &map, SourceKind::Deep);
        assert!(deep.channels.contains(&Channel::DeepBack));
        assert_eq!(deep.to_string().split(',').next(), Some("deep 4x2"));
    }
}
