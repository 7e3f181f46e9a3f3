//! Stored plane descriptions.
//!
//! A planar source groups its stored scalars into named planes: a
//! 4-component `C` plane for color and alpha, a 1-component `Pz` plane for
//! depth, an `Of` plane for accumulated opacity, and so on. Each plane has
//! its own sample width; the decoders normalize everything to `f32`, so the
//! [`BitDepth`] only matters to sources and to memory estimates.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the plane that marks a deep shadow/camera map.
pub const DEPTH_COMPLEXITY_PLANE: &str = "Depth-Complexity";

/// Per-plane stored sample width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitDepth {
    /// 8-bit unsigned integer, normalized to [0, 1].
    U8,
    /// 16-bit unsigned integer, normalized to [0, 1].
    U16,
    /// 16-bit half-precision float.
    F16,
    /// 32-bit single-precision float.
    #[default]
    F32,
}

impl BitDepth {
    /// Number of bits per stored component.
    #[inline]
    pub const fn bits(&self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 | Self::F16 => 16,
            Self::F32 => 32,
        }
    }

    /// Whether this is a floating-point format.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }
}

/// Description of one stored plane.
///
/// # Example
///
/// ```rust
/// use deeprat_core::{BitDepth, PlaneInfo};
///
/// let color = PlaneInfo::new("C", ["r", "g", "b", "a"], BitDepth::F16);
/// assert_eq!(color.component_count(), 4);
/// assert_eq!(color.component_name(3), "a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneInfo {
    /// Plane name (`C`, `Pz`, `Of`, ...).
    pub name: String,
    /// Ordered component names. An empty string stands for an unnamed component.
    pub components: Vec<String>,
    /// Stored sample width.
    #[serde(default)]
    pub bit_depth: BitDepth,
}

impl PlaneInfo {
    /// Creates a plane description.
    pub fn new<I, S>(name: impl Into<String>, components: I, bit_depth: BitDepth) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            components: components.into_iter().map(Into::into).collect(),
            bit_depth,
        }
    }

    /// Number of interleaved components per pixel (or per sample).
    #[inline]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Raw name of component `index`, empty when unnamed or out of range.
    #[inline]
    pub fn component_name(&self, index: usize) -> &str {
        self.components.get(index).map(String::as_str).unwrap_or("")
    }

    /// Returns `true` if this plane marks a deep shadow/camera map.
    #[inline]
    pub fn is_depth_complexity(&self) -> bool {
        self.name == DEPTH_COMPLEXITY_PLANE
    }

    /// Checks that the plane can be addressed by the decoders.
    pub fn validate(&self) -> Result<()> {
        if self.components.is_empty() {
            return Err(Error::invalid_plane(&self.name, "plane has no components"));
        }
        Ok(())
    }
}
