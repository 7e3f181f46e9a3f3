//! # deeprat-core
//!
//! Core types for decoding planar, variable-sample-count images.
//!
//! This crate provides the foundational types used by the rest of deeprat:
//!
//! - [`Rect`] - Pixel-coordinate boxes for region decodes
//! - [`Channel`], [`ChannelSet`] - Logical output channels requested by a host
//! - [`PlaneInfo`], [`BitDepth`] - Stored plane descriptions
//! - [`Error`] - Geometry and layout errors
//!
//! ## Crate Structure
//!
//! ```text
//! deeprat-core (this crate)
//!    ^
//!    |
//!    +-- deeprat-io (sources, channel map, flat/deep decoders)
//!          ^
//!          +-- deeprat-cli (inspection/decode binary)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod channel;
pub mod error;
pub mod plane;
pub mod rect;

pub use channel::{Channel, ChannelSet};
pub use error::{Error, Result};
pub use plane::{BitDepth, PlaneInfo, DEPTH_COMPLEXITY_PLANE};
pub use rect::Rect;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use deeprat_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::channel::{Channel, ChannelSet};
    pub use crate::error::{Error, Result};
    pub use crate::plane::{BitDepth, PlaneInfo};
    pub use crate::rect::Rect;
}
