//! # deeprat-io
//!
//! Deep-pixel decoding and channel remapping for planar image sources.
//!
//! A source stores its pixels as named planes of interleaved components
//! (`C` for color and alpha, `Pz` for depth, `Of` for accumulated opacity).
//! This crate maps those components to logical channels and decodes boxes
//! of pixels into caller-chosen channel sets:
//!
//! - [`ChannelMap`] - Plane/component to logical channel lookup, built once
//! - [`FlatDecoder`] - One value per channel per pixel, raster or scanline
//! - [`DeepDecoder`] - Per-pixel sample lists with alpha derivation,
//!   premultiplication and uncompositing
//! - [`source`] - The [`PlanarSource`] / [`DeepSource`] traits and in-memory
//!   implementations
//!
//! # Quick Start
//!
//! ```rust
//! use deeprat_core::{ChannelSet, Rect};
//! use deeprat_io::{ChannelMapOptions, DecodeConfig, DeepDecoder, MemoryDeepSource};
//!
//! let yaml = r#"
//! width: 1
//! height: 1
//! deep: true
//! planes:
//!   - { name: Pz, components: [r] }
//!   - { name: Of, components: [r] }
//! pixels:
//!   - x: 0
//!     y: 0
//!     planes:
//!       Pz: [2.0, 3.0]
//!       Of: [1.0, 0.0]
//! "#;
//! let source = MemoryDeepSource::from_yaml_str(yaml).unwrap();
//! let decoder = DeepDecoder::open(source, ChannelMapOptions::default()).unwrap();
//!
//! let channels: ChannelSet = "z,a".parse().unwrap();
//! let config = DecodeConfig::default().with_discrete(true);
//! let region = decoder
//!     .decode_region(Rect::from_size(1, 1), &channels, &config, &enough::Unstoppable)
//!     .unwrap();
//! assert_eq!(region.sample(0, 0), [0.5, 1.0]);
//! ```
//!
//! # Cancellation
//!
//! Every decode call takes a `&dyn enough::Stop`. Pass
//! [`enough::Unstoppable`] or an [`AbortFlag`]. A cancelled call is not an
//! error; the returned region carries [`DecodeStatus::Cancelled`] and every
//! value written before the abort.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod abort;
pub mod channel_map;
pub mod config;
pub mod deep;
pub mod error;
pub mod flat;
pub mod info;
pub mod source;

pub use abort::AbortFlag;
pub use channel_map::{AliasGroup, ChannelMap, ChannelMapOptions, PlaneComponent, Shadowed};
pub use config::{DecodeConfig, DecodeStatus};
pub use deep::{Accumulation, DeepDecoder, DeepRegion};
pub use error::{IoError, IoResult};
pub use flat::{FlatDecoder, FlatRegion};
pub use info::{SourceInfo, SourceKind};
pub use source::{
    DeepPixelDesc, DeepSource, MemoryDeepSource, MemorySource, PlanarSource, ReadCounter,
    ReadStats, SourceDesc,
};
