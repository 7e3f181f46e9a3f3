//! Flat (one sample per pixel) decoder.
//!
//! [`FlatDecoder`] turns planar source data into one value per requested
//! channel per pixel. Two buffer strategies are available, selected per call
//! through [`DecodeConfig::use_raster_strategy`]:
//!
//! - **Raster**: every plane is loaded once, on first use, into a buffer that
//!   all later calls index without taking the source lock.
//! - **Scanline**: each row reads one scanline per needed plane into a
//!   scratch buffer sized for the widest plane, under the source lock.
//!
//! Requested channels that alias the same stored component are decoded once
//! and copied. Channels with no stored component are zero-filled.
//!
//! # Example
//!
//! ```rust
//! use deeprat_core::{BitDepth, ChannelSet, PlaneInfo, Rect};
//! use deeprat_io::{ChannelMapOptions, DecodeConfig, FlatDecoder, MemorySource};
//!
//! let color = PlaneInfo::new("C", ["r", "g", "b", "a"], BitDepth::F32);
//! let data = vec![
//!     0.1, 0.2, 0.3, 1.0, // row 0
//!     0.4, 0.5, 0.6, 1.0, // row 1
//! ];
//! let source = MemorySource::new(1, 2, vec![(color, data)]).unwrap();
//! let decoder = FlatDecoder::open(source, ChannelMapOptions::default()).unwrap();
//!
//! let channels: ChannelSet = "r,a".parse().unwrap();
//! let config = DecodeConfig::default();
//! let region = decoder
//!     .decode_region(Rect::from_size(1, 2), &channels, &config, &enough::Unstoppable)
//!     .unwrap();
//!
//! // Rows are flipped by default: output row 0 is stored row 1.
//! assert_eq!(region.pixel(0, 0), [0.4, 1.0]);
//! ```

use std::sync::{Mutex, MutexGuard, OnceLock};

use deeprat_core::{Channel, ChannelSet, Error, PlaneInfo, Rect};
use enough::Stop;
use smallvec::SmallVec;

use tracing::{debug, trace, warn};

use crate::channel_map::{AliasGroup, ChannelMap, ChannelMapOptions};
use crate::config::{DecodeConfig, DecodeStatus};
use crate::info::{SourceInfo, SourceKind};
use crate::source::PlanarSource;
use crate::{IoError, IoResult};

/// Source handle plus the scanline scratch buffer, guarded together.
#[derive(Debug)]
struct SourceState<S> {
    source: S,
    scratch: Vec<f32>,
}

/// Read plan for one requested channel set.
#[derive(Debug, Clone)]
struct RowPlan {
    /// Backed groups, sorted by plane so each plane is read once per row.
    groups: Vec<AliasGroup>,
    /// Output slots with no stored component.
    missing: SmallVec<[usize; 4]>,
}

impl RowPlan {
    fn new(map: &ChannelMap, channels: &ChannelSet) -> Self {
        let mut groups = map.alias_groups(channels);
        groups.sort_by_key(|g| g.pair.plane);
        let missing = channels
            .iter()
            .enumerate()
            .filter(|(_, c)| map.get(c).is_none())
            .map(|(slot, _)| slot)
            .collect();
        Self { groups, missing }
    }

    fn warn_missing(&self, map: &ChannelMap, channels: &ChannelSet) {
        for &slot in &self.missing {
            let channel = &channels.as_slice()[slot];
            if map.is_derived(channel) {
                warn!(%channel, "derived channel has no flat source data, filling with zeros");
            } else {
                warn!(%channel, "missing channel, filling with zeros");
            }
        }
    }
}

/// Decoded flat region, pixel-interleaved and row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRegion {
    /// Decoded box, in output coordinates.
    pub rect: Rect,
    /// Channel order of each pixel.
    pub channels: ChannelSet,
    /// `rect.area() * channels.len()` values.
    pub data: Vec<f32>,
    /// Rows fully decoded before the call returned.
    pub rows_done: u32,
    /// How the call finished.
    pub status: DecodeStatus,
}

impl FlatRegion {
    fn empty(rect: Rect, channels: &ChannelSet) -> Self {
        Self {
            rect,
            channels: channels.clone(),
            data: vec![0.0; rect.area() as usize * channels.len()],
            rows_done: 0,
            status: DecodeStatus::Complete,
        }
    }

    /// Values of the pixel at `(x, y)` relative to the region origin.
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let n = self.channels.len();
        let idx = (y as usize * self.rect.width as usize + x as usize) * n;
        &self.data[idx..idx + n]
    }

    /// Value of `channel` at `(x, y)` relative to the region origin.
    pub fn value(&self, x: u32, y: u32, channel: &Channel) -> Option<f32> {
        self.channels.index_of(channel).map(|i| self.pixel(x, y)[i])
    }

    /// Returns `true` if every row was decoded.
    pub fn is_complete(&self) -> bool {
        self.status == DecodeStatus::Complete
    }
}

/// Flat decoder over a [`PlanarSource`].
///
/// `FlatDecoder` is `Sync`: several threads may decode disjoint regions
/// concurrently. The source is only touched under its mutex; raster
/// buffers are shared read-only once populated.
#[derive(Debug)]
pub struct FlatDecoder<S: PlanarSource> {
    state: Mutex<SourceState<S>>,
    raster: OnceLock<Vec<Vec<f32>>>,
    planes: Vec<PlaneInfo>,
    width: u32,
    height: u32,
    map: ChannelMap,
    info: SourceInfo,
}

impl<S: PlanarSource> FlatDecoder<S> {
    /// Opens a decoder, building the channel map.
    ///
    /// # Errors
    ///
    /// - [`IoError::NoChannels`] if the source has no planes
    /// - [`IoError::DeepSourceUnsupported`] for deep shadow/camera maps
    /// - [`IoError::Open`] for a zero resolution
    pub fn open(source: S, options: ChannelMapOptions) -> IoResult<Self> {
        let planes = source.planes().to_vec();
        if planes.is_empty() {
            return Err(IoError::NoChannels);
        }
        if let Some(plane) = planes.iter().find(|p| p.is_depth_complexity()) {
            return Err(IoError::DeepSourceUnsupported(plane.name.clone()));
        }
        for plane in &planes {
            plane.validate()?;
        }
        let (width, height) = source.resolution();
        if width == 0 || height == 0 {
            return Err(IoError::Open(format!("zero resolution {width}x{height}")));
        }

        let map = ChannelMap::build(&planes, options);
        let info = SourceInfo::new((width, height), &planes, &map, SourceKind::Flat);
        let scratch = vec![0.0; source.max_row_len()];

        debug!(width, height, planes = planes.len(), depth = info.depth, "flat decoder opened");

        Ok(Self {
            state: Mutex::new(SourceState { source, scratch }),
            raster: OnceLock::new(),
            planes,
            width,
            height,
            map,
            info,
        })
    }

    /// Source summary.
    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    /// Channel map built at open.
    pub fn channel_map(&self) -> &ChannelMap {
        &self.map
    }

    /// Stored planes.
    pub fn planes(&self) -> &[PlaneInfo] {
        &self.planes
    }

    /// Returns `true` once raster buffers have been populated.
    pub fn is_raster_loaded(&self) -> bool {
        self.raster.get().is_some()
    }

    fn lock_state(&self) -> IoResult<MutexGuard<'_, SourceState<S>>> {
        self.state
            .lock()
            .map_err(|_| IoError::Source("source lock poisoned".into()))
    }

    /// Raster buffers, loading every plane on first use.
    fn raster(&self) -> IoResult<&[Vec<f32>]> {
        if let Some(buffers) = self.raster.get() {
            return Ok(buffers.as_slice());
        }
        let mut state = self.lock_state()?;
        if let Some(buffers) = self.raster.get() {
            return Ok(buffers.as_slice());
        }

        debug!(planes = self.planes.len(), "populating raster buffers");
        let mut buffers = Vec::with_capacity(self.planes.len());
        for (p, plane) in self.planes.iter().enumerate() {
            let data = state.source.read_full_plane(p)?;
            let expected = self.width as usize * self.height as usize * plane.component_count();
            if data.len() < expected {
                return Err(IoError::Source(format!(
                    "plane '{}' returned {} values, expected {}",
                    plane.name,
                    data.len(),
                    expected
                )));
            }
            buffers.push(data);
        }
        Ok(self.raster.get_or_init(|| buffers).as_slice())
    }

    fn check_row(&self, y: u32, x: u32, right: u32) -> IoResult<()> {
        if y >= self.height || x > right || right > self.width {
            return Err(Error::invalid_region(Rect::row(y, x, right), self.width, self.height).into());
        }
        Ok(())
    }

    /// Decodes columns `x..right` of output row `y`.
    ///
    /// `out` holds one destination slice per requested channel, each at
    /// least `right - x` long. On cancellation the channels written so far
    /// are left intact and [`DecodeStatus::Cancelled`] is returned.
    #[allow(clippy::too_many_arguments)]
    pub fn decode_row(
        &self,
        y: u32,
        x: u32,
        right: u32,
        channels: &ChannelSet,
        config: &DecodeConfig,
        stop: &dyn Stop,
        out: &mut [&mut [f32]],
    ) -> IoResult<DecodeStatus> {
        self.check_row(y, x, right)?;
        if out.len() != channels.len() {
            return Err(IoError::Source(format!(
                "{} destination rows for {} channels",
                out.len(),
                channels.len()
            )));
        }
        let n = (right - x) as usize;
        if let Some(short) = out.iter().find(|o| o.len() < n) {
            return Err(IoError::Source(format!(
                "destination row holds {} values, need {}",
                short.len(),
                n
            )));
        }

        let plan = RowPlan::new(&self.map, channels);
        plan.warn_missing(&self.map, channels);
        self.decode_planned(&plan, y, x, right, config, stop, out)
    }

    #[allow(clippy::too_many_arguments)]
    fn decode_planned(
        &self,
        plan: &RowPlan,
        y: u32,
        x: u32,
        right: u32,
        config: &DecodeConfig,
        stop: &dyn Stop,
        out: &mut [&mut [f32]],
    ) -> IoResult<DecodeStatus> {
        let n = (right - x) as usize;
        let row = config.source_row(y, self.height);
        trace!(y, row, x, right, raster = config.use_raster_strategy, "decode row");

        for &slot in &plan.missing {
            out[slot][..n].fill(0.0);
        }

        if config.use_raster_strategy {
            let buffers = self.raster()?;
            for group in &plan.groups {
                if stop.check().is_err() {
                    return Ok(DecodeStatus::Cancelled);
                }
                let cpp = self.planes[group.pair.plane].component_count();
                let base = row as usize * self.width as usize * cpp;
                let buf = &buffers[group.pair.plane];
                let dst = &mut out[group.slots[0]][..n];
                for (i, col) in (x as usize..right as usize).enumerate() {
                    dst[i] = buf[base + col * cpp + group.pair.component];
                }
                if copy_aliases(group, n, stop, out) == DecodeStatus::Cancelled {
                    return Ok(DecodeStatus::Cancelled);
                }
            }
        } else {
            let mut guard = self.lock_state()?;
            let state = &mut *guard;
            let mut loaded: Option<usize> = None;
            for group in &plan.groups {
                if stop.check().is_err() {
                    return Ok(DecodeStatus::Cancelled);
                }
                let plane = group.pair.plane;
                let cpp = self.planes[plane].component_count();
                if loaded != Some(plane) {
                    state.source.read_scanline(row, plane, &mut state.scratch)?;
                    loaded = Some(plane);
                }
                let dst = &mut out[group.slots[0]][..n];
                for (i, col) in (x as usize..right as usize).enumerate() {
                    dst[i] = state.scratch[col * cpp + group.pair.component];
                }
                if copy_aliases(group, n, stop, out) == DecodeStatus::Cancelled {
                    return Ok(DecodeStatus::Cancelled);
                }
            }
        }

        Ok(DecodeStatus::Complete)
    }

    /// Decodes a box in output coordinates.
    ///
    /// # Errors
    ///
    /// [`deeprat_core::Error::InvalidRegion`] (wrapped) if the box is not
    /// inside the source, before any pixel work.
    pub fn decode_region(
        &self,
        rect: Rect,
        channels: &ChannelSet,
        config: &DecodeConfig,
        stop: &dyn Stop,
    ) -> IoResult<FlatRegion> {
        if !Rect::from_size(self.width, self.height).contains_rect(&rect) {
            return Err(Error::invalid_region(rect, self.width, self.height).into());
        }

        let mut region = FlatRegion::empty(rect, channels);
        if rect.is_empty() || channels.is_empty() {
            region.rows_done = rect.height;
            return Ok(region);
        }

        let plan = RowPlan::new(&self.map, channels);
        plan.warn_missing(&self.map, channels);
        debug!(%rect, channels = channels.len(), groups = plan.groups.len(), "flat decode");

        let n = rect.width as usize;
        let nch = channels.len();
        let mut rows: Vec<Vec<f32>> = vec![vec![0.0; n]; nch];

        for (i, y) in rect.rows().enumerate() {
            if stop.check().is_err() {
                region.status = DecodeStatus::Cancelled;
                break;
            }
            // A cancelled row must not carry values over from the previous one.
            for values in rows.iter_mut() {
                values.fill(0.0);
            }
            let status = {
                let mut slices: SmallVec<[&mut [f32]; 8]> =
                    rows.iter_mut().map(|r| r.as_mut_slice()).collect();
                self.decode_planned(&plan, y, rect.x, rect.right(), config, stop, &mut slices)?
            };

            let row_start = i * n * nch;
            for (c, values) in rows.iter().enumerate() {
                for (col, &v) in values.iter().enumerate() {
                    region.data[row_start + col * nch + c] = v;
                }
            }
            if status == DecodeStatus::Cancelled {
                region.status = DecodeStatus::Cancelled;
                break;
            }
            region.rows_done += 1;
        }

        if region.status.is_cancelled() {
            debug!(rows_done = region.rows_done, "flat decode cancelled");
        }
        Ok(region)
    }
}

/// Copies the first slot of `group` into its aliases.
fn copy_aliases(group: &AliasGroup, n: usize, stop: &dyn Stop, out: &mut [&mut [f32]]) -> DecodeStatus {
    let first = group.slots[0];
    for &slot in &group.slots[1..] {
        if stop.check().is_err() {
            return DecodeStatus::Cancelled;
        }
        let (head, tail) = out.split_at_mut(slot);
        tail[0][..n].copy_from_slice(&head[first][..n]);
    }
    DecodeStatus::Complete
}
