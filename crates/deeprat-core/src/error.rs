//! Error types for deeprat-core operations.
//!
//! The [`Error`] enum covers the geometry and layout failures that can be
//! detected without touching pixel data:
//! - Region boxes that fall outside a source's resolution
//! - Pixel coordinates outside the image
//! - Malformed plane descriptions
//! - Unparseable `x,y,w,h` box strings
//!
//! # Usage
//!
//! ```rust
//! use deeprat_core::{Error, Rect, Result};
//!
//! fn check(rect: Rect, width: u32, height: u32) -> Result<()> {
//!     if !Rect::from_size(width, height).contains_rect(&rect) {
//!         return Err(Error::invalid_region(rect, width, height));
//!     }
//!     Ok(())
//! }
//! # assert!(check(Rect::new(0, 0, 4, 4), 2, 2).is_err());
//! ```

use thiserror::Error;

use crate::rect::Rect;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while describing or addressing a planar source.
#[derive(Debug, Error)]
pub enum Error {
    /// Pixel coordinates are outside image bounds.
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was out of bounds
        x: u32,
        /// Y coordinate that was out of bounds
        y: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Requested region extends beyond image bounds.
    ///
    /// Returned by the decoders before any pixel work begins.
    #[error("region ({rx}, {ry}, {rw}x{rh}) exceeds image bounds {width}x{height}")]
    InvalidRegion {
        /// Region X origin
        rx: u32,
        /// Region Y origin
        ry: u32,
        /// Region width
        rw: u32,
        /// Region height
        rh: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// A plane description is unusable (no components, bad index).
    #[error("invalid plane '{name}': {reason}")]
    InvalidPlane {
        /// Plane name
        name: String,
        /// Why the plane was rejected
        reason: String,
    },

    /// A box string (`"x,y,w,h"`) could not be parsed.
    #[error("invalid box '{input}': {reason}")]
    InvalidBox {
        /// The text that was parsed
        input: String,
        /// What was wrong with it
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidRegion`] error for `rect` inside a
    /// `width`x`height` image.
    #[inline]
    pub fn invalid_region(rect: Rect, width: u32, height: u32) -> Self {
        Self::InvalidRegion {
            rx: rect.x,
            ry: rect.y,
            rw: rect.width,
            rh: rect.height,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidPlane`] error.
    #[inline]
    pub fn invalid_plane(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPlane {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidBox`] error.
    #[inline]
    pub fn invalid_box(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBox {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. } | Self::InvalidRegion { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds() {
        let err = Error::out_of_bounds(100, 50, 80, 60);
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("80x60"));
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_invalid_region() {
        let err = Error::invalid_region(Rect::new(8, 8, 4, 4), 10, 10);
        let msg = err.to_string();
        assert!(msg.contains("(8, 8, 4x4)"));
        assert!(msg.contains("10x10"));
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_invalid_plane() {
        let err = Error::invalid_plane("Pz", "no components");
        assert!(err.to_string().contains("'Pz'"));
        assert!(!err.is_bounds_error());
    }
}
